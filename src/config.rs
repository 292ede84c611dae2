//! Store options and their resolution into a fixed per-store configuration.

use std::fmt;

use serde::Deserialize;
use tracing::warn;

use crate::error::StoreError;
use crate::medium::StorageArea;

/// Options accepted when creating a store.
///
/// Field names follow the camelCase option object used by browser callers,
/// so options can be parsed from JSON with [`StoreOptions::from_json`].
///
/// ```rust
/// use nskv::{StorageArea, StoreOptions};
///
/// let options = StoreOptions::from_json(r#"{"storage":"session","autoCleanup":true}"#).unwrap();
/// assert_eq!(options.storage, StorageArea::Session);
/// assert!(options.auto_cleanup);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoreOptions {
    /// Which storage area to bind.
    pub storage: StorageArea,
    /// Obfuscate records at rest. Needs a `secret` to take effect.
    pub obfuscate: bool,
    /// Deprecated alias for `obfuscate`. Setting it at all, even to `false`,
    /// produces a deprecation diagnostic.
    pub encrypt: Option<bool>,
    /// Key material for the obfuscator.
    pub secret: Option<String>,
    /// Remove expired and malformed records eagerly.
    pub auto_cleanup: bool,
}

impl StoreOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        serde_json::from_str(json).map_err(|e| StoreError::InvalidOptions(e.to_string()))
    }

    pub fn with_storage(mut self, storage: StorageArea) -> Self {
        self.storage = storage;
        self
    }

    pub fn with_obfuscation(mut self, enabled: bool) -> Self {
        self.obfuscate = enabled;
        self
    }

    #[deprecated(note = "use `with_obfuscation` instead")]
    pub fn with_encryption(mut self, enabled: bool) -> Self {
        self.encrypt = Some(enabled);
        self
    }

    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    pub fn with_auto_cleanup(mut self, enabled: bool) -> Self {
        self.auto_cleanup = enabled;
        self
    }
}

/// Advisory events raised while resolving options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A deprecated option was supplied.
    DeprecatedOption {
        option: &'static str,
        replacement: &'static str,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeprecatedOption {
                option,
                replacement,
            } => write!(
                f,
                "option `{option}` is deprecated, use `{replacement}` instead"
            ),
        }
    }
}

/// Receives diagnostics produced when a store is built.
pub trait DiagnosticSink {
    fn emit(&self, diagnostic: &Diagnostic);
}

/// Logs diagnostics as `tracing` warnings.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, diagnostic: &Diagnostic) {
        match diagnostic {
            Diagnostic::DeprecatedOption {
                option,
                replacement,
            } => warn!(option, replacement, "{diagnostic}"),
        }
    }
}

/// Discards diagnostics.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentSink;

impl DiagnosticSink for SilentSink {
    fn emit(&self, _diagnostic: &Diagnostic) {}
}

/// The normalized configuration a store runs with for its whole lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub storage: StorageArea,
    /// Obfuscation was requested through either option name.
    pub obfuscate: bool,
    pub secret: Option<String>,
    pub auto_cleanup: bool,
}

impl ResolvedConfig {
    /// Folds current and deprecated option names into one configuration.
    pub fn resolve(options: &StoreOptions) -> (Self, Vec<Diagnostic>) {
        let mut diagnostics = Vec::new();
        if options.encrypt.is_some() {
            diagnostics.push(Diagnostic::DeprecatedOption {
                option: "encrypt",
                replacement: "obfuscate",
            });
        }

        let config = Self {
            storage: options.storage,
            obfuscate: options.obfuscate || options.encrypt == Some(true),
            secret: options.secret.clone(),
            auto_cleanup: options.auto_cleanup,
        };
        (config, diagnostics)
    }

    /// The secret to obfuscate with, if obfuscation is both requested and
    /// possible. Without a secret records are stored plain.
    pub fn obfuscation_secret(&self) -> Option<&str> {
        if !self.obfuscate {
            return None;
        }
        self.secret.as_deref().filter(|secret| !secret.is_empty())
    }
}
