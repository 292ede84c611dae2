//! JSON file medium.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::error::StoreError;
use crate::medium::StorageMedium;

/// A medium persisted as one JSON object of `physical key -> record`.
///
/// The file is read on every operation, so any number of handles on the same
/// path observe each other's writes. Writes go through a temp file and a
/// rename.
#[derive(Debug, Clone)]
pub struct FileMedium {
    path: PathBuf,
    backup_enabled: bool,
}

impl FileMedium {
    /// Binds the file at `path`. The file is created on first write.
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            backup_enabled: false,
        }
    }

    /// Copies the previous file to `<path>.bak` before each overwrite.
    pub fn with_backup(mut self, enabled: bool) -> Self {
        self.backup_enabled = enabled;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&contents)
            .map_err(|e| StoreError::Io(io::Error::new(ErrorKind::InvalidData, e)))
    }

    fn save(&self, data: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if self.backup_enabled && self.path.exists() {
            fs::copy(&self.path, self.path.with_extension("bak"))?;
        }

        let json = serde_json::to_string_pretty(data)?;
        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, json)?;
        fs::rename(&temp_path, &self.path)?;
        trace!(path = %self.path.display(), records = data.len(), "saved file medium");
        Ok(())
    }

    fn update<F>(&self, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut BTreeMap<String, String>) -> bool,
    {
        let mut data = self.load()?;
        if f(&mut data) {
            self.save(&data)?;
        }
        Ok(())
    }
}

impl StorageMedium for FileMedium {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.load()?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.update(|data| {
            data.insert(key.to_string(), value.to_string());
            true
        })
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        self.update(|data| data.remove(key).is_some())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.update(|data| {
            let had_records = !data.is_empty();
            data.clear();
            had_records
        })
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.load()?.into_keys().collect())
    }
}
