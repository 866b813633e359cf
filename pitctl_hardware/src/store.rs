//! File-backed session store used by every backend that has a filesystem.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use crate::error::HwError;
use pitctl_traits::SessionStore;

type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// One session file on the local filesystem. The parent directory is created
/// on the first append.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn append(&mut self, bytes: &[u8]) -> Result<(), BoxedError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(HwError::Storage)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(HwError::Storage)?;
        file.write_all(bytes).map_err(HwError::Storage)?;
        Ok(())
    }

    fn read_all(&mut self) -> Result<Option<Vec<u8>>, BoxedError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Box::new(HwError::Storage(e))),
        }
    }

    fn remove(&mut self) -> Result<(), BoxedError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Box::new(HwError::Storage(e))),
        }
    }
}
