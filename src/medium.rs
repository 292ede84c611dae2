//! Storage media: the raw string key-value layer under a store.
//!
//! A medium is shared by every store bound to it. Stores only ever see it
//! through [`StorageMedium`], so a real browser storage area, a JSON file and
//! the in-memory fallback are interchangeable.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use serde::Deserialize;
use tracing::debug;

use crate::error::StoreError;

/// Ordered string key-value storage with enumerable keys.
pub trait StorageMedium {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removing an absent key is a no-op.
    fn remove_item(&self, key: &str) -> Result<(), StoreError>;

    /// Empties the whole medium, across every namespace.
    fn clear(&self) -> Result<(), StoreError>;

    /// Every physical key currently present, in the medium's own order.
    fn keys(&self) -> Result<Vec<String>, StoreError>;
}

/// Which persistent area a store prefers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageArea {
    /// Long-lived storage (`localStorage` in a browser).
    #[default]
    Local,
    /// Storage scoped to the session (`sessionStorage` in a browser).
    Session,
}

impl fmt::Display for StorageArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Session => write!(f, "session"),
        }
    }
}

/// Map-backed medium. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryMedium {
    data: Arc<Mutex<BTreeMap<String, String>>>,
}

static SHARED_LOCAL: OnceLock<MemoryMedium> = OnceLock::new();
static SHARED_SESSION: OnceLock<MemoryMedium> = OnceLock::new();

impl MemoryMedium {
    /// Creates an isolated, empty medium.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide fallback medium for `area`.
    ///
    /// There is one map per area, shared by every store in the process, just
    /// as a browser storage area is shared by every script on a page.
    pub fn shared(area: StorageArea) -> Self {
        let cell = match area {
            StorageArea::Local => &SHARED_LOCAL,
            StorageArea::Session => &SHARED_SESSION,
        };
        cell.get_or_init(MemoryMedium::new).clone()
    }

    /// Number of records across all namespaces.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Values are plain strings, so a poisoned map is still consistent.
    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StorageMedium for MemoryMedium {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.lock().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        self.lock().remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.lock().clear();
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.lock().keys().cloned().collect())
    }
}

/// Binds the real medium for `area`, falling back to the shared in-memory
/// medium when it cannot be used.
pub fn resolve_medium(area: StorageArea) -> Box<dyn StorageMedium> {
    match real_medium(area) {
        Ok(medium) => medium,
        Err(e) => {
            debug!(%area, error = %e, "falling back to in-memory storage medium");
            Box::new(MemoryMedium::shared(area))
        }
    }
}

#[cfg(feature = "wasm")]
fn real_medium(area: StorageArea) -> Result<Box<dyn StorageMedium>, StoreError> {
    crate::wasm::WebMedium::open(area).map(|medium| Box::new(medium) as Box<dyn StorageMedium>)
}

#[cfg(not(feature = "wasm"))]
fn real_medium(area: StorageArea) -> Result<Box<dyn StorageMedium>, StoreError> {
    Err(StoreError::MediumUnavailable(format!(
        "no {area} web storage without a browser host"
    )))
}
