//! The namespaced store.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::{Diagnostic, DiagnosticSink, ResolvedConfig, StoreOptions, TracingSink};
use crate::entry::{Entry, expiry_after};
use crate::error::StoreError;
use crate::medium::{StorageMedium, resolve_medium};
use crate::namespace;
use crate::obfuscate::{Obfuscator, XorObfuscator};

/// A key-value store scoped to one namespace of a shared storage medium.
///
/// Values are stored as JSON and must implement serde's traits. Entries may
/// carry a TTL; expired entries read as absent and, with auto-cleanup
/// enabled, are deleted when noticed.
///
/// Reads never fail: a missing, expired, corrupt or mistyped record all read
/// as `None`.
///
/// ```rust
/// use nskv::{MemoryMedium, Store, StoreOptions};
///
/// let store = Store::builder("app")
///     .options(StoreOptions::new().with_auto_cleanup(true))
///     .medium(MemoryMedium::new())
///     .build();
///
/// store.set("user", "alice").unwrap();
/// assert_eq!(store.get::<String>("user").as_deref(), Some("alice"));
/// ```
pub struct Store {
    namespace: String,
    config: ResolvedConfig,
    medium: Box<dyn StorageMedium>,
    obfuscator: Box<dyn Obfuscator>,
    clock: Box<dyn Clock>,
    diagnostics: Vec<Diagnostic>,
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("namespace", &self.namespace)
            .field("config", &self.config)
            .field("diagnostics", &self.diagnostics)
            .finish_non_exhaustive()
    }
}

/// What a physical record turned out to hold.
enum Record {
    Absent,
    Malformed,
    Present(Entry),
}

impl Store {
    pub fn builder(namespace: impl Into<String>) -> StoreBuilder {
        StoreBuilder::new(namespace)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    /// Diagnostics raised while this store was built.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Stores a value that never expires.
    pub fn set<T: Serialize>(&self, key: &str, value: T) -> Result<(), StoreError> {
        self.write(key, value, None)
    }

    /// Stores a value that expires `ttl_secs` seconds from now.
    ///
    /// A zero TTL expires as soon as the clock moves past the current
    /// millisecond; a negative TTL is already expired.
    pub fn set_with_ttl<T: Serialize>(
        &self,
        key: &str,
        value: T,
        ttl_secs: f64,
    ) -> Result<(), StoreError> {
        let expiry = expiry_after(self.clock.now_millis(), ttl_secs);
        self.write(key, value, expiry)
    }

    /// Retrieves the value for a key if it exists and hasn't expired.
    ///
    /// A stored JSON `null` reads as `None`. Corrupt records are left in
    /// place; expired ones are removed only with auto-cleanup enabled.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let physical = namespace::to_physical(&self.namespace, key);
        let entry = match self.load(&physical) {
            Record::Present(entry) => entry,
            Record::Absent | Record::Malformed => return None,
        };

        if entry.is_expired(self.clock.now_millis()) {
            if self.config.auto_cleanup {
                debug!(namespace = %self.namespace, key, "removing expired entry");
                self.discard(&physical);
            }
            return None;
        }
        if entry.value.is_null() {
            return None;
        }

        serde_json::from_value(entry.value)
            .inspect_err(|e| debug!(namespace = %self.namespace, key, error = %e, "value type mismatch"))
            .ok()
    }

    /// Removes a key. Removing an absent key is not an error.
    pub fn remove(&self, key: &str) -> Result<(), StoreError> {
        let physical = namespace::to_physical(&self.namespace, key);
        self.medium.remove_item(&physical)
    }

    /// Removes every key in this namespace and nothing else.
    pub fn clear(&self) -> Result<(), StoreError> {
        // Snapshot first: removal may reorder the medium's keys.
        let physical_keys = self.physical_keys()?;
        trace!(namespace = %self.namespace, count = physical_keys.len(), "clearing namespace");
        for physical in physical_keys {
            self.medium.remove_item(&physical)?;
        }
        Ok(())
    }

    /// Same as `get(key).is_some()`, including its expiry side effects.
    pub fn has(&self, key: &str) -> bool {
        self.get::<serde_json::Value>(key).is_some()
    }

    /// Every key with a record in this namespace, expired or not.
    pub fn keys(&self) -> Vec<String> {
        self.read_physical_keys()
            .iter()
            .filter_map(|physical| namespace::to_logical(&self.namespace, physical))
            .map(str::to_string)
            .collect()
    }

    /// Every live value in this namespace.
    ///
    /// With auto-cleanup enabled a full cleanup pass runs first.
    pub fn get_all<T: DeserializeOwned>(&self) -> HashMap<String, T> {
        if self.config.auto_cleanup {
            self.cleanup();
        }
        self.keys()
            .into_iter()
            .filter_map(|key| {
                let value = self.get(&key)?;
                Some((key, value))
            })
            .collect()
    }

    /// Runs a cleanup pass when auto-cleanup is enabled and returns how many
    /// records it removed. Already called once by [`StoreBuilder::build`].
    pub fn init(&self) -> usize {
        if self.config.auto_cleanup {
            self.cleanup()
        } else {
            0
        }
    }

    /// Removes expired and malformed records from this namespace.
    fn cleanup(&self) -> usize {
        let now = self.clock.now_millis();
        let mut removed = 0;
        for physical in self.read_physical_keys() {
            let stale = match self.load(&physical) {
                Record::Absent => false,
                Record::Malformed => true,
                Record::Present(entry) => entry.is_expired(now),
            };
            if stale {
                self.discard(&physical);
                removed += 1;
            }
        }
        debug!(namespace = %self.namespace, removed, "cleanup pass finished");
        removed
    }

    fn write<T: Serialize>(
        &self,
        key: &str,
        value: T,
        expiry: Option<i64>,
    ) -> Result<(), StoreError> {
        let entry = Entry::new(serde_json::to_value(value)?, expiry);
        let record = self.seal(entry.encode()?);
        let physical = namespace::to_physical(&self.namespace, key);
        trace!(namespace = %self.namespace, key, ?expiry, "writing entry");
        self.medium.set_item(&physical, &record)
    }

    fn load(&self, physical: &str) -> Record {
        let raw = match self.medium.get_item(physical) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Record::Absent,
            Err(e) => {
                warn!(key = physical, error = %e, "storage medium read failed");
                return Record::Absent;
            }
        };

        match self.unseal(raw).and_then(|plain| Entry::decode(&plain)) {
            Ok(entry) => Record::Present(entry),
            Err(e) => {
                debug!(key = physical, error = %e, "malformed record");
                Record::Malformed
            }
        }
    }

    fn discard(&self, physical: &str) {
        if let Err(e) = self.medium.remove_item(physical) {
            warn!(key = physical, error = %e, "storage medium remove failed");
        }
    }

    fn physical_keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self
            .medium
            .keys()?
            .into_iter()
            .filter(|physical| namespace::is_in_namespace(&self.namespace, physical))
            .collect())
    }

    fn read_physical_keys(&self) -> Vec<String> {
        self.physical_keys().unwrap_or_else(|e| {
            warn!(namespace = %self.namespace, error = %e, "storage medium enumeration failed");
            Vec::new()
        })
    }

    fn seal(&self, plain: String) -> String {
        match self.config.obfuscation_secret() {
            Some(secret) => self.obfuscator.apply(&plain, secret),
            None => plain,
        }
    }

    fn unseal(&self, raw: String) -> Result<String, StoreError> {
        match self.config.obfuscation_secret() {
            Some(secret) => self.obfuscator.invert(&raw, secret),
            None => Ok(raw),
        }
    }
}

/// Assembles a [`Store`] from options and optional collaborators.
///
/// Anything not supplied gets a default: the medium resolved from the
/// storage area, [`XorObfuscator`], [`SystemClock`] and [`TracingSink`].
pub struct StoreBuilder {
    namespace: String,
    options: StoreOptions,
    medium: Option<Box<dyn StorageMedium>>,
    obfuscator: Box<dyn Obfuscator>,
    clock: Box<dyn Clock>,
    sink: Box<dyn DiagnosticSink>,
}

impl StoreBuilder {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            options: StoreOptions::default(),
            medium: None,
            obfuscator: Box::new(XorObfuscator),
            clock: Box::new(SystemClock),
            sink: Box::new(TracingSink),
        }
    }

    pub fn options(mut self, options: StoreOptions) -> Self {
        self.options = options;
        self
    }

    /// Uses `medium` instead of resolving one from the storage area.
    pub fn medium(mut self, medium: impl StorageMedium + 'static) -> Self {
        self.medium = Some(Box::new(medium));
        self
    }

    pub fn obfuscator(mut self, obfuscator: impl Obfuscator + 'static) -> Self {
        self.obfuscator = Box::new(obfuscator);
        self
    }

    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn diagnostic_sink(mut self, sink: impl DiagnosticSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Resolves the configuration, reports diagnostics, binds the medium and
    /// runs the initial cleanup pass when auto-cleanup is enabled.
    pub fn build(self) -> Store {
        let (config, diagnostics) = ResolvedConfig::resolve(&self.options);
        for diagnostic in &diagnostics {
            self.sink.emit(diagnostic);
        }

        let medium = self
            .medium
            .unwrap_or_else(|| resolve_medium(config.storage));

        let store = Store {
            namespace: self.namespace,
            config,
            medium,
            obfuscator: self.obfuscator,
            clock: self.clock,
            diagnostics,
        };
        store.init();
        store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::medium::MemoryMedium;
    use serde_json::json;

    fn store_with(options: StoreOptions) -> (Store, MemoryMedium, ManualClock) {
        let medium = MemoryMedium::new();
        let clock = ManualClock::new(1_000_000);
        let store = Store::builder("test")
            .options(options)
            .medium(medium.clone())
            .clock(clock.clone())
            .build();
        (store, medium, clock)
    }

    #[test]
    fn test_physical_layout() {
        let (store, medium, clock) = store_with(StoreOptions::new());
        store.set("plain", 7).unwrap();
        store.set_with_ttl("ttl", "x", 2.0).unwrap();

        assert_eq!(
            medium.get_item("test::plain").unwrap().as_deref(),
            Some(r#"{"value":7}"#)
        );
        let expected = format!(r#"{{"value":"x","expiry":{}}}"#, clock.now_millis() + 2_000);
        assert_eq!(medium.get_item("test::ttl").unwrap(), Some(expected));
    }

    #[test]
    fn test_obfuscated_record_is_opaque() {
        let (store, medium, _) =
            store_with(StoreOptions::new().with_obfuscation(true).with_secret("k"));
        store.set("secret", "hidden").unwrap();

        let raw = medium.get_item("test::secret").unwrap().unwrap();
        assert!(!raw.contains("hidden"));
        assert_eq!(XorObfuscator.invert(&raw, "k").unwrap(), r#"{"value":"hidden"}"#);
        assert_eq!(store.get::<String>("secret").as_deref(), Some("hidden"));
    }

    #[test]
    fn test_get_keeps_malformed_record() {
        let (store, medium, _) = store_with(StoreOptions::new().with_auto_cleanup(true));
        medium.set_item("test::broken", "{not json").unwrap();

        assert_eq!(store.get::<serde_json::Value>("broken"), None);
        assert!(medium.get_item("test::broken").unwrap().is_some());
    }

    #[test]
    fn test_type_mismatch_reads_as_none() {
        let (store, medium, _) = store_with(StoreOptions::new());
        store.set("name", "alice").unwrap();

        assert_eq!(store.get::<u32>("name"), None);
        assert_eq!(store.get::<String>("name").as_deref(), Some("alice"));
        assert!(medium.get_item("test::name").unwrap().is_some());
    }

    #[test]
    fn test_null_reads_as_absent() {
        let (store, _, _) = store_with(StoreOptions::new());
        store.set("nothing", json!(null)).unwrap();

        assert_eq!(store.get::<serde_json::Value>("nothing"), None);
        assert!(!store.has("nothing"));
        assert_eq!(store.keys(), vec!["nothing"]);
        assert!(store.get_all::<serde_json::Value>().is_empty());
    }

    #[test]
    fn test_zero_and_negative_ttl() {
        let (store, _, clock) = store_with(StoreOptions::new());
        store.set_with_ttl("zero", 1, 0.0).unwrap();
        store.set_with_ttl("negative", 1, -5.0).unwrap();
        store.set_with_ttl("barely-negative", 1, -0.0005).unwrap();

        assert_eq!(store.get::<i32>("zero"), Some(1));
        assert_eq!(store.get::<i32>("negative"), None);
        assert_eq!(store.get::<i32>("barely-negative"), None);

        clock.advance(1);
        assert_eq!(store.get::<i32>("zero"), None);
    }

    #[test]
    fn test_fractional_expiry_from_other_writers() {
        let (store, medium, clock) = store_with(StoreOptions::new().with_auto_cleanup(true));
        clock.set(1_000);
        medium.set_item("test::k", r#"{"value":1,"expiry":5000.5}"#).unwrap();

        assert_eq!(store.init(), 0);
        assert_eq!(store.get::<i32>("k"), Some(1));

        clock.set(5_001);
        assert_eq!(store.get::<i32>("k"), None);
        assert_eq!(medium.get_item("test::k").unwrap(), None);
    }

    #[test]
    fn test_cleanup_removes_malformed_and_expired() {
        let (store, medium, clock) = store_with(StoreOptions::new().with_auto_cleanup(true));
        store.set("keep", 1).unwrap();
        store.set_with_ttl("expire", 2, 1.0).unwrap();
        medium.set_item("test::broken", "garbage").unwrap();
        medium.set_item("other::broken", "garbage").unwrap();

        clock.advance(1_001);
        assert_eq!(store.init(), 2);
        assert_eq!(store.keys(), vec!["keep"]);
        assert!(medium.get_item("other::broken").unwrap().is_some());
    }

    #[test]
    fn test_init_is_noop_without_auto_cleanup() {
        let (store, medium, _) = store_with(StoreOptions::new());
        medium.set_item("test::broken", "garbage").unwrap();
        assert_eq!(store.init(), 0);
        assert_eq!(store.keys(), vec!["broken"]);
    }

    #[test]
    fn test_accessors() {
        let (store, _, _) = store_with(StoreOptions::new().with_auto_cleanup(true));
        let debug = format!("{store:?}");
        assert!(debug.starts_with(r#"Store { namespace: "test", config: ResolvedConfig"#));
        assert!(debug.contains("auto_cleanup: true"));
        assert_eq!(store.namespace(), "test");
        assert!(store.config().auto_cleanup);
        assert!(store.diagnostics().is_empty());
    }
}
