//! rollbook - fixed-width student record files
//!
//! A single-user record manager persisting student records as an array of
//! fixed-size structs in a flat binary file.

pub mod cli;
pub mod crash_point;
pub mod observability;
pub mod store;
