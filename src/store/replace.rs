//! Whole-file replacement via a sibling temp file and rename
//!
//! Pattern:
//! 1. Write the new content to a temp file in the target's directory
//! 2. Flush, optionally fsync, and close it
//! 3. Rename it over the target (atomic on POSIX)
//! 4. fsync the directory so the rename is durable
//!
//! Until step 3 the target is never opened for writing. A replacement that is
//! dropped without being committed removes its temp file.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use uuid::Uuid;

#[derive(Debug)]
pub(crate) struct Replacement {
    target: PathBuf,
    temp_path: PathBuf,
    writer: Option<BufWriter<File>>,
    committed: bool,
}

impl Replacement {
    /// Create an empty temp file next to `target`.
    pub(crate) fn create(target: &Path) -> io::Result<Self> {
        #[cfg(test)]
        take_fault(Fault::Create)?;

        let temp_path = temp_path_for(target);

        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)?;

        // Keep the store's permissions across the swap
        if let Ok(metadata) = fs::metadata(target) {
            let _ = fs::set_permissions(&temp_path, metadata.permissions());
        }

        Ok(Self {
            target: target.to_path_buf(),
            temp_path,
            writer: Some(BufWriter::new(file)),
            committed: false,
        })
    }

    #[cfg(test)]
    pub(crate) fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Append bytes to the replacement content.
    pub(crate) fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        #[cfg(test)]
        take_fault(Fault::Write)?;

        match self.writer.as_mut() {
            Some(writer) => writer.write_all(bytes),
            None => Err(io::Error::new(
                io::ErrorKind::Other,
                "replacement already sealed",
            )),
        }
    }

    /// Flush, optionally fsync, and close the temp file.
    pub(crate) fn seal(&mut self, sync: bool) -> io::Result<()> {
        if let Some(writer) = self.writer.take() {
            let file = writer.into_inner().map_err(|e| e.into_error())?;
            if sync {
                file.sync_all()?;
            }
        }
        Ok(())
    }

    /// Rename the sealed temp file over the target.
    pub(crate) fn commit(mut self, sync: bool) -> io::Result<()> {
        self.seal(sync)?;

        fs::rename(&self.temp_path, &self.target)?;
        self.committed = true;

        if sync {
            if let Ok(dir) = File::open(parent_dir(&self.target)) {
                let _ = dir.sync_all();
            }
        }

        Ok(())
    }

    /// Drop the replacement and remove its temp file.
    pub(crate) fn discard(self) {}
}

impl Drop for Replacement {
    fn drop(&mut self) {
        if !self.committed {
            self.writer.take();
            let _ = fs::remove_file(&self.temp_path);
        }
    }
}

/// I/O failures a test can schedule for the next replacement on this thread
#[cfg(test)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Fault {
    Create,
    Write,
}

#[cfg(test)]
thread_local! {
    static PENDING_FAULT: std::cell::Cell<Option<Fault>> = std::cell::Cell::new(None);
}

#[cfg(test)]
pub(crate) fn inject_fault(fault: Fault) {
    PENDING_FAULT.with(|pending| pending.set(Some(fault)));
}

#[cfg(test)]
fn take_fault(fault: Fault) -> io::Result<()> {
    PENDING_FAULT.with(|pending| {
        if pending.get() == Some(fault) {
            pending.set(None);
            Err(io::Error::new(io::ErrorKind::Other, "injected replacement fault"))
        } else {
            Ok(())
        }
    })
}

fn parent_dir(target: &Path) -> &Path {
    match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn temp_path_for(target: &Path) -> PathBuf {
    let file_name = target
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "store".to_string());
    parent_dir(target).join(format!(".{}.{}.tmp", file_name, Uuid::new_v4().simple()))
}
