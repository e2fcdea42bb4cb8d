//! Filesystem adapters.
//!
//! Implements [`FileSystem`] two ways:
//!
//! - [`FlashFs`]: `std::fs` under a root directory.  On the board the root
//!   is the SPIFFS mount point; on the host any directory works.
//! - [`MemFs`]: in-memory simulation backend for tests and host runs.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;

use crate::app::ports::{FileSystem, StorageError};

// ── Flash (std::fs) ───────────────────────────────────────────

pub struct FlashFs {
    root: PathBuf,
}

impl FlashFs {
    /// Absolute queue/config paths like `/outbox.txt` resolve under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

impl FileSystem for FlashFs {
    fn exists(&self, path: &str) -> bool {
        self.resolve(path).exists()
    }

    fn open_read(&self, path: &str) -> Result<Box<dyn io::Read + '_>, StorageError> {
        let file = File::open(self.resolve(path))?;
        Ok(Box::new(io::BufReader::new(file)))
    }

    fn append(&mut self, path: &str, data: &[u8]) -> Result<(), StorageError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.resolve(path))?;
        file.write_all(data)?;
        file.sync_data()?;
        Ok(())
    }

    fn write(&mut self, path: &str, data: &[u8]) -> Result<(), StorageError> {
        let mut file = File::create(self.resolve(path))?;
        file.write_all(data)?;
        file.sync_all()?;
        Ok(())
    }

    /// SPIFFS refuses to rename onto an existing name, so the target is
    /// removed first there; the queue's recovery promotes an orphaned
    /// temp file if power is lost between the two calls.
    fn rename(&mut self, from: &str, to: &str) -> Result<(), StorageError> {
        #[cfg(target_os = "espidf")]
        self.remove(to)?;
        fs::rename(self.resolve(from), self.resolve(to))?;
        Ok(())
    }

    fn remove(&mut self, path: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.resolve(path)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ── In-memory simulation ─────────────────────────────────────

/// Files as byte vectors keyed by path.
#[derive(Debug, Default, Clone)]
pub struct MemFs {
    files: HashMap<String, Vec<u8>>,
}

impl MemFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw contents of `path`, for assertions.
    pub fn contents(&self, path: &str) -> Option<&[u8]> {
        self.files.get(path).map(Vec::as_slice)
    }

    /// Overwrite `path` directly, bypassing the port (test setup).
    pub fn put(&mut self, path: &str, data: &[u8]) {
        self.files.insert(path.to_owned(), data.to_vec());
    }
}

impl FileSystem for MemFs {
    fn exists(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    fn open_read(&self, path: &str) -> Result<Box<dyn io::Read + '_>, StorageError> {
        let data = self.files.get(path).ok_or(StorageError::NotFound)?;
        Ok(Box::new(data.as_slice()))
    }

    fn append(&mut self, path: &str, data: &[u8]) -> Result<(), StorageError> {
        self.files
            .entry(path.to_owned())
            .or_default()
            .extend_from_slice(data);
        Ok(())
    }

    fn write(&mut self, path: &str, data: &[u8]) -> Result<(), StorageError> {
        self.files.insert(path.to_owned(), data.to_vec());
        Ok(())
    }

    fn rename(&mut self, from: &str, to: &str) -> Result<(), StorageError> {
        let data = self.files.remove(from).ok_or(StorageError::NotFound)?;
        self.files.insert(to.to_owned(), data);
        Ok(())
    }

    fn remove(&mut self, path: &str) -> Result<(), StorageError> {
        self.files.remove(path);
        Ok(())
    }
}
