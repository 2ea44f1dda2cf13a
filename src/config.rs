//! Configuration types for the comparison service.
//!
//! Loaded from TOML. Every section defaults, so a partial file (or none at
//! all) yields a working configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use scholar_dispatch::backends::ads::DEFAULT_ADS_URL;
use scholar_dispatch::backends::semantic_scholar::DEFAULT_SEMANTIC_SCHOLAR_URL;
use scholar_dispatch::{BackendConfig, BackendRegistry};
use serde::{Deserialize, Serialize};

use crate::error::{CompareError, Result};

/// Backend name the ADS client is registered under.
pub const ADS_BACKEND: &str = "ads";
/// Backend name the Semantic Scholar client is registered under.
pub const SEMANTIC_SCHOLAR_BACKEND: &str = "semanticScholar";

/// Environment variable overriding the config directory.
pub const CONFIG_DIR_ENV: &str = "SEARCH_COMPARISONS_CONFIG_DIR";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Search backends, in any order; priority decides dispatch order.
    pub backends: Vec<BackendConfig>,
    /// ADS client settings.
    pub ads: AdsConfig,
    /// Semantic Scholar client settings.
    pub semantic_scholar: SemanticScholarConfig,
    /// Judgment repository settings.
    pub quepid: QuepidConfig,
    /// Dispatch result cache.
    pub cache: CacheConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backends: vec![
                BackendConfig::new(ADS_BACKEND, 1)
                    .with_timeout_seconds(15.0)
                    .with_min_results(5),
                BackendConfig::new(SEMANTIC_SCHOLAR_BACKEND, 3)
                    .with_timeout_seconds(15.0)
                    .with_min_results(5),
            ],
            ads: AdsConfig::default(),
            semantic_scholar: SemanticScholarConfig::default(),
            quepid: QuepidConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdsConfig {
    pub base_url: String,
    /// Rows requested per query.
    pub rows: usize,
}

impl Default for AdsConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_ADS_URL.to_owned(),
            rows: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SemanticScholarConfig {
    pub base_url: String,
    /// Papers requested per query.
    pub limit: usize,
}

impl Default for SemanticScholarConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SEMANTIC_SCHOLAR_URL.to_owned(),
            limit: 20,
        }
    }
}

/// Quepid API settings. The API key is supplied at runtime, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuepidConfig {
    /// API root, e.g. `https://app.quepid.com/api/`.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_seconds: f64,
}

impl Default for QuepidConfig {
    fn default() -> Self {
        Self {
            base_url: "https://app.quepid.com/api/".to_owned(),
            timeout_seconds: 30.0,
        }
    }
}

impl QuepidConfig {
    /// Saturates for values that do not fit a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout_seconds).unwrap_or(Duration::MAX)
    }
}

/// In-memory cache of dispatch results, keyed by normalised query and policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Entry lifetime in seconds.
    pub ttl_seconds: u64,
    pub max_entries: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_seconds: 3600,
            max_entries: 100,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CompareError::Config(e.to_string()))
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be read or parsed.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| CompareError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path:
    /// `$SEARCH_COMPARISONS_CONFIG_DIR/config.toml` when set, else
    /// `<platform config dir>/search-comparisons/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
            PathBuf::from(dir).join("config.toml")
        } else if let Some(config) = dirs::config_dir() {
            config.join("search-comparisons").join("config.toml")
        } else {
            PathBuf::from("/tmp/search-comparisons/config.toml")
        }
    }

    /// Build the backend registry described by this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CompareError::Dispatch`] if a backend entry is invalid or
    /// two entries share a name.
    pub fn registry(&self) -> Result<BackendRegistry> {
        Ok(BackendRegistry::new(self.backends.clone())?)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        self.registry()?;
        if self.ads.base_url.trim().is_empty() {
            return Err(CompareError::Config("ads.base_url must not be empty".into()));
        }
        if self.ads.rows == 0 {
            return Err(CompareError::Config("ads.rows must be at least 1".into()));
        }
        if self.semantic_scholar.base_url.trim().is_empty() {
            return Err(CompareError::Config(
                "semantic_scholar.base_url must not be empty".into(),
            ));
        }
        if self.semantic_scholar.limit == 0 {
            return Err(CompareError::Config(
                "semantic_scholar.limit must be at least 1".into(),
            ));
        }
        if self.quepid.base_url.trim().is_empty() {
            return Err(CompareError::Config("quepid.base_url must not be empty".into()));
        }
        if self.quepid.timeout_seconds <= 0.0
            || Duration::try_from_secs_f64(self.quepid.timeout_seconds).is_err()
        {
            return Err(CompareError::Config(format!(
                "quepid.timeout_seconds must be a positive duration, got {}",
                self.quepid.timeout_seconds
            )));
        }
        if self.cache.enabled && self.cache.max_entries == 0 {
            return Err(CompareError::Config(
                "cache.max_entries must be at least 1 when the cache is enabled".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        let order: Vec<String> = config
            .registry()
            .expect("registry")
            .resolve()
            .into_iter()
            .map(|b| b.name)
            .collect();
        assert_eq!(order, vec![ADS_BACKEND, SEMANTIC_SCHOLAR_BACKEND]);
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [quepid]
            base_url = "http://localhost:3000/api/"

            [cache]
            enabled = false
            "#,
        )
        .expect("parse");
        assert_eq!(config.quepid.base_url, "http://localhost:3000/api/");
        assert!((config.quepid.timeout_seconds - 30.0).abs() < f64::EPSILON);
        assert!(!config.cache.enabled);
        assert_eq!(config.backends.len(), 2);
        assert_eq!(config.ads.rows, 20);
    }

    #[test]
    fn backends_table_replaces_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [[backends]]
            name = "semanticScholar"
            priority = 1
            min_results = 3
            "#,
        )
        .expect("parse");
        assert_eq!(config.backends.len(), 1);
        assert_eq!(config.backends[0].min_results, 3);
        assert!(config.backends[0].enabled);
    }

    #[test]
    fn duplicate_backend_names_rejected() {
        let mut config = AppConfig::default();
        config.backends.push(BackendConfig::new(ADS_BACKEND, 9));
        assert!(matches!(config.validate(), Err(CompareError::Dispatch(_))));
    }

    #[test]
    fn zero_quepid_timeout_rejected() {
        let mut config = AppConfig::default();
        config.quepid.timeout_seconds = 0.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("quepid.timeout_seconds"));
    }

    #[test]
    fn overflowing_quepid_timeout_rejected() {
        let mut config = AppConfig::default();
        config.quepid.timeout_seconds = 1e20;
        assert!(matches!(config.validate(), Err(CompareError::Config(_))));
        assert_eq!(config.quepid.timeout(), Duration::MAX);
    }

    #[test]
    fn overflowing_backend_timeout_rejected() {
        let mut config = AppConfig::default();
        config.backends[0].timeout_seconds = 1e20;
        assert!(matches!(config.validate(), Err(CompareError::Dispatch(_))));
    }

    #[test]
    fn empty_cache_allowed_only_when_disabled() {
        let mut config = AppConfig::default();
        config.cache.max_entries = 0;
        assert!(config.validate().is_err());
        config.cache.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");
        let mut config = AppConfig::default();
        config.ads.rows = 50;
        config.backends[1].enabled = false;
        config.save_to_file(&path).expect("save");
        let loaded = AppConfig::from_file(&path).expect("load");
        assert_eq!(loaded, config);
    }

    #[test]
    fn load_or_default_without_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = AppConfig::load_or_default(&dir.path().join("absent.toml")).expect("load");
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn from_file_invalid_toml_returns_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "this is not valid toml {{{").expect("write");
        assert!(matches!(
            AppConfig::from_file(&path),
            Err(CompareError::Config(_))
        ));
    }

    #[test]
    fn default_config_path_ends_with_config_toml() {
        let path = AppConfig::default_config_path();
        assert!(path.to_string_lossy().ends_with("config.toml"));
    }
}
