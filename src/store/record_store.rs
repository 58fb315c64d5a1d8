//! File-backed student record store
//!
//! A store is a flat file of fixed-width records with no header, no count and
//! no index. Every operation re-reads the file; nothing is cached between
//! calls and no path is remembered beyond the handle the caller holds.
//!
//! - `initialize`: replace the file with an empty one
//! - `append`: full-scan uniqueness check, then write at end of file
//! - `list` / `find`: sequential scan in file order
//! - `update`: rewrite one record at its original offset
//! - `delete`: copy all other records to a sibling file, rename over
//!
//! The uniqueness scan and the append use separate handles. Another process
//! writing the same file between them can introduce a duplicate; the store
//! assumes exclusive single-process access.

use std::fs::OpenOptions;
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::errors::{StoreError, StoreResult};
use super::reader::{check_store_size, corruption, RecordReader};
use super::record::{FieldText, RecordFields, StudentRecord};
use super::replace::Replacement;
use crate::crash_point::{maybe_crash, points};
use crate::observability::{log_event_with_fields, Event};

/// Write behaviour shared by every mutating operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    /// fsync data (and the directory after renames) before returning
    pub sync_writes: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self { sync_writes: true }
    }
}

/// Size summary of a store file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub records: u64,
    pub bytes: u64,
}

/// Handle naming one store file.
///
/// Holds only the path and options; no file stays open between calls.
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
    options: StoreOptions,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_options(path, StoreOptions::default())
    }

    pub fn with_options(path: impl Into<PathBuf>, options: StoreOptions) -> Self {
        Self {
            path: path.into(),
            options,
        }
    }

    /// Returns the store file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the path is non-empty and names an existing file.
    ///
    /// Drivers check this before calling anything but `initialize`.
    pub fn exists(&self) -> bool {
        !self.path.as_os_str().is_empty() && self.path.is_file()
    }

    /// Creates or truncates the store to zero records.
    ///
    /// An empty sibling file is renamed over the path, so a failure never
    /// damages an existing store.
    ///
    /// # Errors
    ///
    /// `StorageUnavailable` if the file cannot be created or renamed into place.
    pub fn initialize(&self) -> StoreResult<()> {
        let unavailable = |e| {
            StoreError::storage_unavailable(
                format!("Could not create store file: {}", self.path.display()),
                e,
            )
        };

        let mut replacement = Replacement::create(&self.path).map_err(unavailable)?;
        replacement
            .seal(self.options.sync_writes)
            .map_err(unavailable)?;
        maybe_crash(points::INITIALIZE_BEFORE_RENAME);
        replacement
            .commit(self.options.sync_writes)
            .map_err(unavailable)?;

        log_event_with_fields(Event::StoreInitialized, &[("path", self.path_str().as_str())]);
        Ok(())
    }

    /// Appends a record after checking that its id is not taken.
    ///
    /// # Returns
    ///
    /// The byte offset of the new record, equal to the previous file size.
    ///
    /// # Errors
    ///
    /// - `InvalidRecord` if the id is empty
    /// - `DuplicateKey` if any record already carries the id; nothing is written
    /// - `StorageUnavailable` if the store cannot be opened or written
    /// - `CorruptStore` if the existing file is not a whole number of records
    pub fn append(&self, record: &StudentRecord) -> StoreResult<u64> {
        if record.id.is_empty() {
            return Err(StoreError::invalid_record("Student ID must not be empty"));
        }

        let id = record.id.to_string_lossy();
        {
            let mut reader = RecordReader::open(&self.path)?;
            if reader.find(record.id.as_bytes())?.is_some() {
                log_event_with_fields(
                    Event::DuplicateRejected,
                    &[("id", &*id), ("path", self.path_str().as_str())],
                );
                return Err(StoreError::duplicate_key(&id));
            }
        }

        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                StoreError::storage_unavailable(
                    format!("Could not open store for writing: {}", self.path.display()),
                    e,
                )
            })?;

        let offset = file
            .metadata()
            .map_err(|e| StoreError::storage_unavailable("Failed to read store metadata", e))?
            .len();
        check_store_size(&self.path, offset)?;

        maybe_crash(points::APPEND_BEFORE_WRITE);

        let written = file.write_all(&record.encode()).and_then(|_| {
            if self.options.sync_writes {
                file.sync_all()
            } else {
                Ok(())
            }
        });
        if let Err(e) = written {
            // Drop any partial record so the size stays a multiple of the width
            let _ = file.set_len(offset);
            return Err(StoreError::storage_unavailable(
                format!("Failed to append record {}", id),
                e,
            ));
        }

        log_event_with_fields(
            Event::RecordAppended,
            &[
                ("id", &*id),
                ("offset", offset.to_string().as_str()),
                ("path", self.path_str().as_str()),
            ],
        );
        Ok(offset)
    }

    /// Lazily iterates all records in file order.
    ///
    /// Each call re-opens the file, so a new iterator always reflects the
    /// current on-disk content.
    pub fn list(&self) -> StoreResult<RecordReader> {
        RecordReader::open(&self.path)
    }

    /// Returns the first record whose id equals `id`.
    ///
    /// # Errors
    ///
    /// `NotFound` after a full scan without a match.
    pub fn find(&self, id: impl AsRef<[u8]>) -> StoreResult<StudentRecord> {
        let key = FieldText::from_bytes(id.as_ref());
        let id = key.as_bytes();
        let mut reader = RecordReader::open(&self.path)?;
        match reader.find(id)? {
            Some((_, record)) => Ok(record),
            None => Err(self.not_found(id)),
        }
    }

    /// Replaces every field but the id of the first record matching `id`,
    /// rewriting it at its original offset.
    ///
    /// # Returns
    ///
    /// The record as written.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no record matches; the file is not written
    /// - `UpdateFailed` if the write-back does not complete
    /// - `StorageUnavailable` if the store cannot be opened
    pub fn update(&self, id: impl AsRef<[u8]>, fields: RecordFields) -> StoreResult<StudentRecord> {
        let key = FieldText::from_bytes(id.as_ref());
        let id = key.as_bytes();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&self.path)
            .map_err(|e| {
                StoreError::storage_unavailable(
                    format!("Could not open store for update: {}", self.path.display()),
                    e,
                )
            })?;

        let mut reader = RecordReader::from_file(&self.path, file)?;
        let Some((offset, mut record)) = reader.find(id)? else {
            return Err(self.not_found(id));
        };
        record.apply(fields);

        let mut file = reader.into_inner();

        maybe_crash(points::UPDATE_BEFORE_WRITE);

        file.seek(SeekFrom::Start(offset))
            .and_then(|_| file.write_all(&record.encode()))
            .and_then(|_| {
                if self.options.sync_writes {
                    file.sync_data()
                } else {
                    Ok(())
                }
            })
            .map_err(|e| StoreError::update_failed(offset, e))?;

        log_event_with_fields(
            Event::RecordUpdated,
            &[
                ("id", &*record.id.to_string_lossy()),
                ("offset", offset.to_string().as_str()),
                ("path", self.path_str().as_str()),
            ],
        );
        Ok(record)
    }

    /// Removes the first record matching `id` and compacts the file.
    ///
    /// The surviving records are copied byte for byte, in order, to a sibling
    /// file that is then renamed over the store. The store itself is only
    /// touched by that rename.
    ///
    /// # Returns
    ///
    /// The removed record.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no record matches; the replacement is discarded
    /// - `StorageUnavailable` if the store cannot be opened or renamed over
    /// - `TempStorageUnavailable` if the replacement cannot be created or written
    pub fn delete(&self, id: impl AsRef<[u8]>) -> StoreResult<StudentRecord> {
        let key = FieldText::from_bytes(id.as_ref());
        let id = key.as_bytes();
        let mut reader = RecordReader::open(&self.path)?;

        let temp_unavailable = |e| {
            StoreError::temp_storage_unavailable(
                format!("Could not create replacement for {}", self.path.display()),
                e,
            )
        };
        let mut replacement = Replacement::create(&self.path).map_err(temp_unavailable)?;

        let mut removed = None;
        while let Some((offset, raw)) = reader.read_next_raw()? {
            if removed.is_none() {
                let record = StudentRecord::decode(&raw)
                    .map_err(|e| corruption(&self.path, offset, e.to_string()))?;
                if record.has_id(id) {
                    removed = Some(record);
                    continue;
                }
            }
            replacement.write_all(&raw).map_err(temp_unavailable)?;
        }
        drop(reader);

        let Some(removed) = removed else {
            replacement.discard();
            return Err(self.not_found(id));
        };

        replacement
            .seal(self.options.sync_writes)
            .map_err(temp_unavailable)?;
        maybe_crash(points::DELETE_BEFORE_RENAME);
        replacement.commit(self.options.sync_writes).map_err(|e| {
            StoreError::storage_unavailable(
                format!("Could not replace store file: {}", self.path.display()),
                e,
            )
        })?;

        log_event_with_fields(
            Event::RecordDeleted,
            &[
                ("id", &*removed.id.to_string_lossy()),
                ("path", self.path_str().as_str()),
            ],
        );
        Ok(removed)
    }

    /// Number of records, derived from the file size.
    pub fn count(&self) -> StoreResult<u64> {
        Ok(self.stats()?.records)
    }

    /// Record count and byte size of the store file.
    pub fn stats(&self) -> StoreResult<StoreStats> {
        let reader = RecordReader::open(&self.path)?;

        Ok(StoreStats {
            records: reader.record_count(),
            bytes: reader.file_size(),
        })
    }

    fn not_found(&self, id: &[u8]) -> StoreError {
        let id = String::from_utf8_lossy(id);
        log_event_with_fields(
            Event::RecordNotFound,
            &[("id", &*id), ("path", self.path_str().as_str())],
        );
        StoreError::not_found(&id)
    }

    fn path_str(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::replace::{inject_fault, Fault};
    use crate::store::{StoreErrorCode, RECORD_WIDTH};
    use std::fs;
    use tempfile::TempDir;

    fn new_store(temp_dir: &TempDir) -> RecordStore {
        let store = RecordStore::with_options(
            temp_dir.path().join("class.bin"),
            StoreOptions { sync_writes: false },
        );
        store.initialize().unwrap();
        store
    }

    fn student(id: &str, grade: f32) -> StudentRecord {
        StudentRecord::new(id, format!("Name {}", id), format!("{}@x.com", id), "CS1", grade)
    }

    fn ids(store: &RecordStore) -> Vec<String> {
        store
            .list()
            .unwrap()
            .map(|r| r.unwrap().id.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_initialize_creates_empty_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = new_store(&temp_dir);
        assert!(store.exists());
        assert_eq!(fs::metadata(store.path()).unwrap().len(), 0);
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_initialize_truncates_existing_store() {
        let temp_dir = TempDir::new().unwrap();
        let store = new_store(&temp_dir);
        store.append(&student("S1", 3.0)).unwrap();

        store.initialize().unwrap();
        assert!(ids(&store).is_empty());
    }

    #[test]
    fn test_initialize_in_missing_directory_fails_cleanly() {
        let temp_dir = TempDir::new().unwrap();
        let store = RecordStore::new(temp_dir.path().join("missing").join("class.bin"));
        let err = store.initialize().unwrap_err();
        assert_eq!(err.code(), StoreErrorCode::StorageUnavailable);
        assert!(!store.exists());
    }

    #[test]
    fn test_exists_rejects_empty_path_and_directories() {
        let temp_dir = TempDir::new().unwrap();
        assert!(!RecordStore::new("").exists());
        assert!(!RecordStore::new(temp_dir.path()).exists());
    }

    #[test]
    fn test_append_returns_previous_size() {
        let temp_dir = TempDir::new().unwrap();
        let store = new_store(&temp_dir);
        assert_eq!(store.append(&student("S1", 3.0)).unwrap(), 0);
        assert_eq!(
            store.append(&student("S2", 3.1)).unwrap(),
            RECORD_WIDTH as u64
        );
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_append_rejects_empty_id() {
        let temp_dir = TempDir::new().unwrap();
        let store = new_store(&temp_dir);
        let err = store.append(&student("", 1.0)).unwrap_err();
        assert_eq!(err.code(), StoreErrorCode::InvalidRecord);
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_append_duplicate_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let store = new_store(&temp_dir);
        store.append(&student("S1", 3.0)).unwrap();
        let before = fs::read(store.path()).unwrap();

        let err = store.append(&student("S1", 1.0)).unwrap_err();
        assert_eq!(err.code(), StoreErrorCode::DuplicateKey);
        assert_eq!(fs::read(store.path()).unwrap(), before);
    }

    #[test]
    fn test_append_to_missing_store_fails() {
        let temp_dir = TempDir::new().unwrap();
        let store = RecordStore::new(temp_dir.path().join("never_created.bin"));
        let err = store.append(&student("S1", 3.0)).unwrap_err();
        assert_eq!(err.code(), StoreErrorCode::StorageUnavailable);
        assert!(!store.exists());
    }

    #[test]
    fn test_find_returns_appended_record() {
        let temp_dir = TempDir::new().unwrap();
        let store = new_store(&temp_dir);
        let record = student("S7", 2.25);
        store.append(&record).unwrap();

        assert_eq!(store.find("S7").unwrap(), record);
        assert!(store.find("S8").unwrap_err().is_not_found());
    }

    #[test]
    fn test_update_rewrites_in_place() {
        let temp_dir = TempDir::new().unwrap();
        let store = new_store(&temp_dir);
        store.append(&student("S1", 3.0)).unwrap();
        store.append(&student("S2", 3.1)).unwrap();
        store.append(&student("S3", 3.2)).unwrap();
        let before = fs::read(store.path()).unwrap();

        let updated = store
            .update("S2", RecordFields::new("Bea", "bea@x.com", "MATH", 4.0))
            .unwrap();
        assert_eq!(updated.id, "S2");

        let after = fs::read(store.path()).unwrap();
        assert_eq!(after.len(), before.len());
        let w = RECORD_WIDTH;
        assert_eq!(&after[..w], &before[..w]);
        assert_eq!(&after[2 * w..], &before[2 * w..]);
        assert_eq!(store.find("S2").unwrap(), updated);
    }

    #[test]
    fn test_update_missing_id_leaves_file_unchanged() {
        let temp_dir = TempDir::new().unwrap();
        let store = new_store(&temp_dir);
        store.append(&student("S1", 3.0)).unwrap();
        let before = fs::read(store.path()).unwrap();

        let err = store
            .update("S9", RecordFields::new("X", "x", "x", 0.0))
            .unwrap_err();
        assert_eq!(err.code(), StoreErrorCode::NotFound);
        assert_eq!(fs::read(store.path()).unwrap(), before);
    }

    #[test]
    fn test_delete_preserves_order_of_survivors() {
        let temp_dir = TempDir::new().unwrap();
        let store = new_store(&temp_dir);
        for (i, id) in ["S1", "S2", "S3", "S4"].iter().enumerate() {
            store.append(&student(id, i as f32)).unwrap();
        }

        let removed = store.delete("S2").unwrap();
        assert_eq!(removed.id, "S2");
        assert_eq!(ids(&store), vec!["S1", "S3", "S4"]);
        assert!(store.find("S2").unwrap_err().is_not_found());
    }

    #[test]
    fn test_delete_missing_id_keeps_content_and_cleans_up() {
        let temp_dir = TempDir::new().unwrap();
        let store = new_store(&temp_dir);
        store.append(&student("S1", 3.0)).unwrap();
        let before = fs::read(store.path()).unwrap();

        let err = store.delete("nobody").unwrap_err();
        assert_eq!(err.code(), StoreErrorCode::NotFound);
        assert_eq!(fs::read(store.path()).unwrap(), before);
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_delete_replacement_create_failure_keeps_store() {
        let temp_dir = TempDir::new().unwrap();
        let store = new_store(&temp_dir);
        store.append(&student("S1", 3.0)).unwrap();
        store.append(&student("S2", 3.5)).unwrap();
        let before = fs::read(store.path()).unwrap();

        inject_fault(Fault::Create);
        let err = store.delete("S1").unwrap_err();

        assert_eq!(err.code(), StoreErrorCode::TempStorageUnavailable);
        assert_eq!(fs::read(store.path()).unwrap(), before);
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 1);
        assert_eq!(ids(&store), vec!["S1", "S2"]);
    }

    #[test]
    fn test_delete_replacement_write_failure_keeps_store() {
        let temp_dir = TempDir::new().unwrap();
        let store = new_store(&temp_dir);
        store.append(&student("S1", 3.0)).unwrap();
        store.append(&student("S2", 3.5)).unwrap();
        let before = fs::read(store.path()).unwrap();

        inject_fault(Fault::Write);
        let err = store.delete("S1").unwrap_err();

        assert_eq!(err.code(), StoreErrorCode::TempStorageUnavailable);
        assert_eq!(fs::read(store.path()).unwrap(), before);
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_initialize_replacement_failure_keeps_records() {
        let temp_dir = TempDir::new().unwrap();
        let store = new_store(&temp_dir);
        store.append(&student("S1", 3.0)).unwrap();

        inject_fault(Fault::Create);
        let err = store.initialize().unwrap_err();

        assert_eq!(err.code(), StoreErrorCode::StorageUnavailable);
        assert_eq!(ids(&store), vec!["S1"]);
    }

    #[test]
    fn test_long_id_found_by_untruncated_key() {
        let temp_dir = TempDir::new().unwrap();
        let store = new_store(&temp_dir);
        let long = "X".repeat(60);
        store.append(&student(&long, 3.0)).unwrap();

        assert_eq!(store.find(&long).unwrap().id.len(), 49);
        store
            .update(&long, RecordFields::new("n", "e", "c", 1.0))
            .unwrap();
        assert_eq!(store.delete(&long).unwrap().name, "n");
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_delete_only_removes_first_match() {
        let temp_dir = TempDir::new().unwrap();
        let store = new_store(&temp_dir);
        let mut bytes = Vec::new();
        let mut first = student("D", 1.0);
        first.name = "first".into();
        let mut second = student("D", 2.0);
        second.name = "second".into();
        bytes.extend_from_slice(&first.encode());
        bytes.extend_from_slice(&second.encode());
        fs::write(store.path(), bytes).unwrap();

        assert_eq!(store.delete("D").unwrap().name, "first");
        assert_eq!(store.find("D").unwrap().name, "second");
    }

    #[test]
    fn test_delete_copies_survivor_bytes_verbatim() {
        let temp_dir = TempDir::new().unwrap();
        let store = new_store(&temp_dir);
        let mut survivor = student("S1", 3.0).encode();
        // stale bytes after the name terminator, as left by a C writer
        survivor[90] = 0x5A;
        let mut bytes = survivor.to_vec();
        bytes.extend_from_slice(&student("S2", 3.0).encode());
        fs::write(store.path(), bytes).unwrap();

        store.delete("S2").unwrap();
        assert_eq!(fs::read(store.path()).unwrap(), survivor.to_vec());
    }

    #[test]
    fn test_stats_on_corrupt_size() {
        let temp_dir = TempDir::new().unwrap();
        let store = new_store(&temp_dir);
        fs::write(store.path(), [0u8; 5]).unwrap();
        assert_eq!(store.stats().unwrap_err().code(), StoreErrorCode::CorruptStore);
    }
}
