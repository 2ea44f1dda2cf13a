//! Static, validated registry of search backends.
//!
//! Built once at startup and read-only afterwards, so concurrent dispatches
//! share it without locking.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::config::BackendConfig;
use crate::error::DispatchError;

/// The set of configured backends in registration order.
#[derive(Debug, Clone, Default)]
pub struct BackendRegistry {
    backends: Vec<BackendConfig>,
}

#[derive(Deserialize)]
struct RegistryFile {
    #[serde(default)]
    backends: Vec<BackendConfig>,
}

impl BackendRegistry {
    /// Build a registry, validating every entry and rejecting duplicate names.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::RegistryUnreadable`] if any entry is invalid.
    pub fn new(backends: Vec<BackendConfig>) -> Result<Self, DispatchError> {
        let mut seen = HashSet::new();
        for backend in &backends {
            backend.validate()?;
            if !seen.insert(backend.name.as_str()) {
                return Err(DispatchError::RegistryUnreadable(format!(
                    "duplicate backend name: {}",
                    backend.name
                )));
            }
        }
        Ok(Self { backends })
    }

    /// Parse a registry from TOML containing `[[backends]]` tables.
    pub fn from_toml_str(source: &str) -> Result<Self, DispatchError> {
        let file: RegistryFile = toml::from_str(source)
            .map_err(|e| DispatchError::RegistryUnreadable(e.to_string()))?;
        Self::new(file.backends)
    }

    /// Read and parse a registry file.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::RegistryUnreadable`] if the file cannot be
    /// read, parsed, or validated.
    pub fn from_toml_file(path: &Path) -> Result<Self, DispatchError> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            DispatchError::RegistryUnreadable(format!("{}: {e}", path.display()))
        })?;
        Self::from_toml_str(&source)
    }

    /// Enabled backends sorted ascending by priority.
    ///
    /// The sort is stable, so equal priorities keep registration order.
    pub fn resolve(&self) -> Vec<BackendConfig> {
        let mut enabled: Vec<BackendConfig> =
            self.backends.iter().filter(|b| b.enabled).cloned().collect();
        enabled.sort_by_key(|b| b.priority);
        enabled
    }

    /// Every configured backend, enabled or not, in registration order.
    pub fn all(&self) -> &[BackendConfig] {
        &self.backends
    }

    pub fn get(&self, name: &str) -> Option<&BackendConfig> {
        self.backends.iter().find(|b| b.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}
