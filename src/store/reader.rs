//! Sequential record reader
//!
//! Reads fixed-width records in file order. Opening validates that the file
//! size is a whole number of records; a trailing partial record is corruption.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use super::errors::{StoreError, StoreResult};
use super::record::{FieldText, StudentRecord, RECORD_WIDTH};
use crate::observability::{log_event_with_fields, Event};

/// Lazy, finite iterator over the records of one store file.
///
/// Re-opening always reflects the current on-disk order.
#[derive(Debug)]
pub struct RecordReader {
    /// Path to the store file
    store_path: PathBuf,
    /// Buffered reader
    reader: BufReader<File>,
    /// Byte offset of the next record
    current_offset: u64,
    /// File size at open time
    file_size: u64,
    /// Set after an error so iteration ends
    halted: bool,
}

impl RecordReader {
    /// Opens the store file for reading.
    ///
    /// # Errors
    ///
    /// - `StorageUnavailable` if the file cannot be opened
    /// - `CorruptStore` if its size is not a multiple of the record width
    pub fn open(store_path: &Path) -> StoreResult<Self> {
        let file = File::open(store_path).map_err(|e| {
            StoreError::storage_unavailable(
                format!("Failed to open store file: {}", store_path.display()),
                e,
            )
        })?;
        Self::from_file(store_path, file)
    }

    /// Wraps an already opened handle, validating its size.
    pub(crate) fn from_file(store_path: &Path, file: File) -> StoreResult<Self> {
        let file_size = file
            .metadata()
            .map_err(|e| StoreError::storage_unavailable("Failed to read store metadata", e))?
            .len();

        check_store_size(store_path, file_size)?;

        Ok(Self {
            store_path: store_path.to_path_buf(),
            reader: BufReader::new(file),
            current_offset: 0,
            file_size,
            halted: false,
        })
    }

    /// Returns the file size observed at open time.
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Number of records in the file.
    pub fn record_count(&self) -> u64 {
        self.file_size / RECORD_WIDTH as u64
    }

    /// Returns whether there are more records to read.
    pub fn has_more(&self) -> bool {
        !self.halted && self.current_offset < self.file_size
    }

    /// Reads the next record's raw bytes along with its offset.
    ///
    /// Bytes after each field terminator are returned untouched.
    pub fn read_next_raw(&mut self) -> StoreResult<Option<(u64, [u8; RECORD_WIDTH])>> {
        if !self.has_more() {
            return Ok(None);
        }

        let offset = self.current_offset;
        let mut buf = [0u8; RECORD_WIDTH];
        if let Err(e) = self.reader.read_exact(&mut buf) {
            self.halted = true;
            return Err(StoreError::storage_unavailable(
                format!("Failed to read record at byte offset {}", offset),
                e,
            ));
        }
        self.current_offset += RECORD_WIDTH as u64;

        Ok(Some((offset, buf)))
    }

    /// Reads and decodes the next record along with its offset.
    pub fn read_next_with_offset(&mut self) -> StoreResult<Option<(u64, StudentRecord)>> {
        let Some((offset, buf)) = self.read_next_raw()? else {
            return Ok(None);
        };

        match StudentRecord::decode(&buf) {
            Ok(record) => Ok(Some((offset, record))),
            Err(e) => {
                self.halted = true;
                Err(corruption(&self.store_path, offset, e.to_string()))
            }
        }
    }

    /// Reads the next record.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(record))` if a record was read
    /// - `Ok(None)` at end of file
    pub fn read_next(&mut self) -> StoreResult<Option<StudentRecord>> {
        Ok(self.read_next_with_offset()?.map(|(_, record)| record))
    }

    /// Scans forward for the first record whose id equals `id`.
    ///
    /// `id` is cut to field capacity first, the same way stored ids are.
    /// Stops at the first match; reads to end of file otherwise.
    pub fn find(&mut self, id: &[u8]) -> StoreResult<Option<(u64, StudentRecord)>> {
        let key = FieldText::from_bytes(id);
        while let Some((offset, record)) = self.read_next_with_offset()? {
            if record.has_id(key.as_bytes()) {
                return Ok(Some((offset, record)));
            }
        }
        Ok(None)
    }

    /// Gives back the underlying handle. Buffered but unread bytes are lost.
    pub(crate) fn into_inner(self) -> File {
        self.reader.into_inner()
    }
}

impl Iterator for RecordReader {
    type Item = StoreResult<StudentRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_next().transpose()
    }
}

/// Fails with `CorruptStore` unless `file_size` is a whole number of records
pub(crate) fn check_store_size(store_path: &Path, file_size: u64) -> StoreResult<()> {
    let width = RECORD_WIDTH as u64;
    if file_size % width != 0 {
        return Err(corruption(
            store_path,
            file_size - file_size % width,
            format!(
                "Store size {} is not a multiple of the record width {}",
                file_size, width
            ),
        ));
    }
    Ok(())
}

/// Build a `CorruptStore` error and log it
pub(crate) fn corruption(store_path: &Path, offset: u64, reason: String) -> StoreError {
    log_event_with_fields(
        Event::StoreCorruption,
        &[
            ("offset", offset.to_string().as_str()),
            ("path", store_path.display().to_string().as_str()),
            ("reason", reason.as_str()),
        ],
    );
    StoreError::corruption_at_offset(offset, reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreErrorCode;
    use std::fs;
    use tempfile::TempDir;

    fn write_records(path: &Path, records: &[StudentRecord]) {
        let mut bytes = Vec::new();
        for record in records {
            bytes.extend_from_slice(&record.encode());
        }
        fs::write(path, bytes).unwrap();
    }

    fn sample(id: &str) -> StudentRecord {
        StudentRecord::new(id, "Name", "n@x.com", "CS1", 3.0)
    }

    #[test]
    fn test_missing_file_is_storage_unavailable() {
        let temp_dir = TempDir::new().unwrap();
        let err = RecordReader::open(&temp_dir.path().join("absent.bin")).unwrap_err();
        assert_eq!(err.code(), StoreErrorCode::StorageUnavailable);
    }

    #[test]
    fn test_empty_store_yields_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("empty.bin");
        fs::write(&path, b"").unwrap();

        let mut reader = RecordReader::open(&path).unwrap();
        assert_eq!(reader.record_count(), 0);
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_reads_in_file_order_with_offsets() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.bin");
        write_records(&path, &[sample("S1"), sample("S2"), sample("S3")]);

        let mut reader = RecordReader::open(&path).unwrap();
        assert_eq!(reader.record_count(), 3);

        let (o1, r1) = reader.read_next_with_offset().unwrap().unwrap();
        let (o2, r2) = reader.read_next_with_offset().unwrap().unwrap();
        assert_eq!((o1, o2), (0, RECORD_WIDTH as u64));
        assert_eq!(r1.id, "S1");
        assert_eq!(r2.id, "S2");

        let rest: Vec<_> = reader.map(|r| r.unwrap().id).collect();
        assert_eq!(rest, vec![FieldText::from("S3")]);
    }

    #[test]
    fn test_find_stops_at_first_match() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.bin");
        let mut first = sample("S2");
        first.name = "First".into();
        let mut second = sample("S2");
        second.name = "Second".into();
        write_records(&path, &[sample("S1"), first, second]);

        let mut reader = RecordReader::open(&path).unwrap();
        let (offset, record) = reader.find(b"S2").unwrap().unwrap();
        assert_eq!(offset, RECORD_WIDTH as u64);
        assert_eq!(record.name, "First");
        assert!(reader.has_more());
    }

    #[test]
    fn test_find_is_case_sensitive() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.bin");
        write_records(&path, &[sample("abc")]);

        let mut reader = RecordReader::open(&path).unwrap();
        assert!(reader.find(b"ABC").unwrap().is_none());
        assert!(!reader.has_more());
    }

    #[test]
    fn test_find_truncates_key_like_stored_ids() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.bin");
        let long = "K".repeat(60);
        write_records(&path, &[sample(&long)]);

        let mut reader = RecordReader::open(&path).unwrap();
        let (offset, record) = reader.find(long.as_bytes()).unwrap().unwrap();
        assert_eq!(offset, 0);
        assert_eq!(record.id.len(), 49);
    }

    #[test]
    fn test_partial_trailing_record_is_corruption() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.bin");
        let mut bytes = sample("S1").encode().to_vec();
        bytes.extend_from_slice(&[0u8; 10]);
        fs::write(&path, bytes).unwrap();

        let err = RecordReader::open(&path).unwrap_err();
        assert_eq!(err.code(), StoreErrorCode::CorruptStore);
        assert!(err.to_string().contains("byte_offset: 204"));
    }

    #[test]
    fn test_unterminated_field_halts_iteration() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.bin");
        let mut bytes = sample("S1").encode().to_vec();
        bytes.extend_from_slice(&[b'Z'; RECORD_WIDTH]);
        fs::write(&path, bytes).unwrap();

        let mut reader = RecordReader::open(&path).unwrap();
        assert!(reader.next().unwrap().is_ok());
        let err = reader.next().unwrap().unwrap_err();
        assert!(err.is_fatal());
        assert!(reader.next().is_none());
    }
}
