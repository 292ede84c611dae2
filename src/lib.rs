//! # nskv
//!
//! Namespaced key-value persistence over a shared string storage medium,
//! with per-entry TTL and optional at-rest obfuscation.
//!
//! Many stores can share one medium. Each store only reads and writes
//! physical keys of the form `<namespace>::<key>`, so stores with different
//! namespaces never see each other's data, and stores with the same namespace
//! see each other's writes.
//!
//! Available media:
//!
//! - [`MemoryMedium`]: process-wide in-memory map, the fallback when no real
//!   medium is available.
//! - [`FileMedium`]: a JSON file.
//! - `WebMedium` (feature `wasm`): browser `localStorage`/`sessionStorage`.
//!
//! ```rust
//! use nskv::{StoreOptions, create_store};
//!
//! let cache = create_store("doc-cache", StoreOptions::new().with_auto_cleanup(true));
//! cache.set_with_ttl("greeting", "hello", 60.0).unwrap();
//! assert!(cache.has("greeting"));
//!
//! let all: std::collections::HashMap<String, String> = cache.get_all();
//! assert_eq!(all["greeting"], "hello");
//! ```

pub mod clock;
pub mod config;
pub mod entry;
pub mod error;
pub mod file;
pub mod medium;
pub mod namespace;
pub mod obfuscate;
pub mod store;

#[cfg(feature = "wasm")]
pub mod wasm;


pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Diagnostic, DiagnosticSink, ResolvedConfig, SilentSink, StoreOptions, TracingSink};
pub use error::StoreError;
pub use file::FileMedium;
pub use medium::{MemoryMedium, StorageArea, StorageMedium, resolve_medium};
pub use obfuscate::{Obfuscator, XorObfuscator};
pub use store::{Store, StoreBuilder};

#[cfg(feature = "wasm")]
pub use wasm::{NsStoreWasm, WebMedium};

/// Creates a store bound to the medium selected by `options.storage`,
/// falling back to the shared in-memory medium when the real one is
/// unavailable.
pub fn create_store(namespace: &str, options: StoreOptions) -> Store {
    Store::builder(namespace).options(options).build()
}

#[cfg(doctest)]
#[doc = include_str!("../README.md")]
struct ReadmeDoctests;
