//! Student record types and the fixed-width on-disk layout
//!
//! Every record occupies exactly [`RECORD_WIDTH`] bytes:
//!
//! ```text
//! +------------------+  offset 0
//! | id               | (50 bytes, NUL-terminated, NUL-padded)
//! +------------------+  offset 50
//! | name             | (50 bytes)
//! +------------------+  offset 100
//! | email            | (50 bytes)
//! +------------------+  offset 150
//! | course           | (50 bytes)
//! +------------------+  offset 200
//! | grade            | (f32 LE)
//! +------------------+  offset 204
//! ```
//!
//! 200 is already a multiple of the float's alignment, so this matches the
//! native C struct layout with no padding. Bytes following a terminator are
//! ignored on read and written as zero.

use std::borrow::Cow;
use std::fmt;
use std::io;

use serde::{Serialize, Serializer};

/// Width of one text field on disk, terminator included
pub const FIELD_WIDTH: usize = 50;

/// Usable bytes in a text field
pub const FIELD_CAPACITY: usize = FIELD_WIDTH - 1;

/// Byte offset of the grade within a record
pub const GRADE_OFFSET: usize = FIELD_WIDTH * 4;

/// Total width of one serialized record
pub const RECORD_WIDTH: usize = GRADE_OFFSET + 4;

/// A text value that fits a fixed-width field.
///
/// Holds raw bytes: stored text is not required to be valid UTF-8.
/// Construction truncates at the first NUL and at [`FIELD_CAPACITY`] bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldText(Vec<u8>);

impl FieldText {
    /// Build a field value from raw bytes, truncating on a byte boundary
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let end = bytes
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(bytes.len())
            .min(FIELD_CAPACITY);
        Self(bytes[..end].to_vec())
    }

    /// Raw content without the terminator
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Lossy UTF-8 view for display
    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }

    fn encode_into(&self, slot: &mut [u8]) {
        debug_assert_eq!(slot.len(), FIELD_WIDTH);
        slot[..self.0.len()].copy_from_slice(&self.0);
    }

    fn decode_from(slot: &[u8], field: &'static str) -> io::Result<Self> {
        match slot.iter().position(|&b| b == 0) {
            Some(end) => Ok(Self(slot[..end].to_vec())),
            None => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Field '{}' has no terminator within {} bytes", field, FIELD_WIDTH),
            )),
        }
    }
}

impl From<&str> for FieldText {
    fn from(value: &str) -> Self {
        Self::from_bytes(value.as_bytes())
    }
}

impl From<String> for FieldText {
    fn from(value: String) -> Self {
        Self::from_bytes(value.as_bytes())
    }
}

impl AsRef<[u8]> for FieldText {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl PartialEq<str> for FieldText {
    fn eq(&self, other: &str) -> bool {
        self.0 == other.as_bytes()
    }
}

impl PartialEq<&str> for FieldText {
    fn eq(&self, other: &&str) -> bool {
        self.0 == other.as_bytes()
    }
}

impl fmt::Display for FieldText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

impl Serialize for FieldText {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string_lossy())
    }
}

/// The mutable part of a record: everything except the key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordFields {
    pub name: FieldText,
    pub email: FieldText,
    pub course: FieldText,
    pub grade: f32,
}

impl RecordFields {
    pub fn new(
        name: impl Into<FieldText>,
        email: impl Into<FieldText>,
        course: impl Into<FieldText>,
        grade: f32,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            course: course.into(),
            grade,
        }
    }
}

/// One student record as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentRecord {
    /// Unique key across the store
    pub id: FieldText,
    pub name: FieldText,
    pub email: FieldText,
    pub course: FieldText,
    pub grade: f32,
}

impl StudentRecord {
    pub fn new(
        id: impl Into<FieldText>,
        name: impl Into<FieldText>,
        email: impl Into<FieldText>,
        course: impl Into<FieldText>,
        grade: f32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            course: course.into(),
            grade,
        }
    }

    /// Build a record from a key and its mutable fields
    pub fn from_fields(id: impl Into<FieldText>, fields: RecordFields) -> Self {
        Self {
            id: id.into(),
            name: fields.name,
            email: fields.email,
            course: fields.course,
            grade: fields.grade,
        }
    }

    /// Replace every field except the id
    pub fn apply(&mut self, fields: RecordFields) {
        self.name = fields.name;
        self.email = fields.email;
        self.course = fields.course;
        self.grade = fields.grade;
    }

    /// Whether this record's key equals `id`, byte for byte
    pub fn has_id(&self, id: &[u8]) -> bool {
        self.id.as_bytes() == id
    }

    /// Serialize to the fixed-width layout.
    pub fn encode(&self) -> [u8; RECORD_WIDTH] {
        let mut buf = [0u8; RECORD_WIDTH];
        let fields = [&self.id, &self.name, &self.email, &self.course];
        for (i, field) in fields.into_iter().enumerate() {
            field.encode_into(&mut buf[i * FIELD_WIDTH..(i + 1) * FIELD_WIDTH]);
        }
        buf[GRADE_OFFSET..].copy_from_slice(&self.grade.to_le_bytes());
        buf
    }

    /// Deserialize from the fixed-width layout.
    ///
    /// Fails with `InvalidData` when a text field carries no terminator.
    pub fn decode(buf: &[u8; RECORD_WIDTH]) -> io::Result<Self> {
        let grade = f32::from_le_bytes([
            buf[GRADE_OFFSET],
            buf[GRADE_OFFSET + 1],
            buf[GRADE_OFFSET + 2],
            buf[GRADE_OFFSET + 3],
        ]);

        Ok(Self {
            id: FieldText::decode_from(field_slot(buf, 0), "id")?,
            name: FieldText::decode_from(field_slot(buf, 1), "name")?,
            email: FieldText::decode_from(field_slot(buf, 2), "email")?,
            course: FieldText::decode_from(field_slot(buf, 3), "course")?,
            grade,
        })
    }
}

fn field_slot(buf: &[u8; RECORD_WIDTH], index: usize) -> &[u8] {
    &buf[index * FIELD_WIDTH..(index + 1) * FIELD_WIDTH]
}
