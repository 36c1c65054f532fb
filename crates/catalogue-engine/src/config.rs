//! Engine configuration
//!
//! Everything that used to be ambient (local catalogue id, page sizes,
//! timeouts, per-kind id strategy) in one place. Loaded from TOML at
//! startup, falls back to defaults if no config file exists.

use catalogue_core::{Error, IdStrategy, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Top-level engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// The catalogue this deployment owns.
    pub catalogue: LocalCatalogueConfig,
    /// Approved-catalogue lookup.
    pub catalogues: LookupConfig,
    /// Per-call limits.
    pub engine: CallConfig,
    /// Persistent identifier minting.
    pub pid: PidConfig,
    /// Per-kind overrides keyed by kind name (e.g. `[kinds.service]`).
    pub kinds: BTreeMap<String, KindOverride>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalCatalogueConfig {
    /// Drafts and sources are pinned to this catalogue.
    pub local_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// Registry page size when walking the catalogue list.
    pub page_size: usize,
    /// Snapshot lifetime in seconds. 0 disables caching.
    pub cache_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CallConfig {
    /// Deadline applied to every registry and collaborator call.
    pub call_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PidConfig {
    /// Handle prefix minted PIDs live under.
    pub prefix: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KindOverride {
    pub strategy: Option<IdStrategy>,
    pub pid_registration: Option<bool>,
}

// ============================================================
// Defaults
// ============================================================

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            catalogue: LocalCatalogueConfig::default(),
            catalogues: LookupConfig::default(),
            engine: CallConfig::default(),
            pid: PidConfig::default(),
            kinds: BTreeMap::new(),
        }
    }
}

impl Default for LocalCatalogueConfig {
    fn default() -> Self {
        Self { local_id: "eosc".into() }
    }
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self { page_size: 1_000, cache_ttl_secs: 300 }
    }
}

impl Default for CallConfig {
    fn default() -> Self {
        Self { call_timeout_ms: 5_000 }
    }
}

impl Default for PidConfig {
    fn default() -> Self {
        Self { prefix: "21.T15999".into() }
    }
}

// ============================================================
// Loading
// ============================================================

impl EngineConfig {
    /// Load config from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match Self::parse(&content) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {} - using defaults", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => {
                tracing::info!("No config at {} - using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Parse and check a TOML document.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.catalogue.local_id.trim().is_empty() {
            return Err(Error::Config("catalogue.local_id must not be empty".into()));
        }
        if self.catalogue.local_id.contains('.') {
            return Err(Error::Config("catalogue.local_id must not contain '.'".into()));
        }
        if self.catalogues.page_size == 0 {
            return Err(Error::Config("catalogues.page_size must be positive".into()));
        }
        if self.engine.call_timeout_ms == 0 {
            return Err(Error::Config("engine.call_timeout_ms must be positive".into()));
        }
        Ok(())
    }

    /// Write the current config as TOML (for generating a default config file).
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }

    pub fn local_catalogue(&self) -> &str {
        &self.catalogue.local_id
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.engine.call_timeout_ms)
    }

    pub fn cache_ttl(&self) -> Option<Duration> {
        (self.catalogues.cache_ttl_secs > 0).then(|| Duration::from_secs(self.catalogues.cache_ttl_secs))
    }
}
