// crates/okr-gate-config/src/config.rs
// ============================================================================
// Module: OKR Gate Configuration
// Description: Configuration loading and validation for OKR Gate hosts.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: okr-gate-core, okr-gate-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Missing sections take defaults; present but invalid values fail closed
//! with [`ConfigError::Invalid`] naming the offending field.
//!
//! Resolution order for the file: explicit path, then the
//! `OKR_GATE_CONFIG` environment variable, then `./okr-gate.toml`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use okr_gate_core::AuthorizerConfig;
use okr_gate_core::ContextCache;
use okr_gate_core::DEFAULT_CACHE_MAX_ENTRIES;
use okr_gate_core::DEFAULT_CACHE_TTL_MS;
use okr_gate_core::DecisionLogSink;
use okr_gate_core::FileDecisionLog;
use okr_gate_core::InMemoryContextCache;
use okr_gate_core::NoopContextCache;
use okr_gate_core::NoopDecisionLog;
use okr_gate_core::StderrDecisionLog;
use okr_gate_store_sqlite::SqliteStoreConfig;
use okr_gate_store_sqlite::SqliteStoreMode;
use okr_gate_store_sqlite::SqliteSyncMode;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "okr-gate.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "OKR_GATE_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum context cache TTL in milliseconds.
pub(crate) const MAX_CACHE_TTL_MS: u64 = 600_000;
/// Maximum number of cached user contexts.
pub(crate) const MAX_CACHE_ENTRIES: usize = 1_000_000;
/// Default role store busy timeout in milliseconds.
const DEFAULT_STORE_BUSY_TIMEOUT_MS: u64 = 5_000;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// OKR Gate host configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OkrGateConfig {
    /// User context cache configuration.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Scope & role store configuration.
    #[serde(default)]
    pub role_store: RoleStoreConfig,
    /// Decision log configuration.
    #[serde(default)]
    pub decision_log: DecisionLogConfig,
}

impl OkrGateConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config = Self::from_toml_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses configuration text without validating it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the TOML is malformed.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.cache.validate()?;
        self.role_store.validate()?;
        self.decision_log.validate()?;
        Ok(())
    }

    /// Returns the authorizer behavior settings.
    #[must_use]
    pub const fn authorizer_config(&self) -> AuthorizerConfig {
        AuthorizerConfig {
            log_allows: self.decision_log.log_allows,
        }
    }
}

/// User context cache configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CacheConfig {
    /// Whether contexts are cached at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Context lifetime in milliseconds.
    #[serde(default = "default_cache_ttl_ms")]
    pub ttl_ms: u64,
    /// Maximum cached contexts.
    #[serde(default = "default_cache_max_entries")]
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_ms: DEFAULT_CACHE_TTL_MS,
            max_entries: DEFAULT_CACHE_MAX_ENTRIES,
        }
    }
}

impl CacheConfig {
    /// Validates cache limits.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.ttl_ms == 0 || self.ttl_ms > MAX_CACHE_TTL_MS {
            return Err(ConfigError::Invalid(format!(
                "cache.ttl_ms must be between 1 and {MAX_CACHE_TTL_MS}"
            )));
        }
        if self.max_entries == 0 || self.max_entries > MAX_CACHE_ENTRIES {
            return Err(ConfigError::Invalid(format!(
                "cache.max_entries must be between 1 and {MAX_CACHE_ENTRIES}"
            )));
        }
        Ok(())
    }

    /// Builds the configured context cache.
    #[must_use]
    pub fn build(&self) -> Arc<dyn ContextCache> {
        if self.enabled {
            Arc::new(InMemoryContextCache::new(self.ttl_ms, self.max_entries))
        } else {
            Arc::new(NoopContextCache)
        }
    }
}

/// Scope & role store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RoleStoreConfig {
    /// Store backend type.
    #[serde(rename = "type", default)]
    pub store_type: RoleStoreType,
    /// `SQLite` database path when using the sqlite backend.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_store_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` synchronous mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl Default for RoleStoreConfig {
    fn default() -> Self {
        Self {
            store_type: RoleStoreType::default(),
            path: None,
            busy_timeout_ms: default_store_busy_timeout_ms(),
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

impl RoleStoreConfig {
    /// Validates role store configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match self.store_type {
            RoleStoreType::Memory => {
                if self.path.is_some() {
                    return Err(ConfigError::Invalid(
                        "memory role_store must not set path".to_string(),
                    ));
                }
                Ok(())
            }
            RoleStoreType::Sqlite => {
                let path = self.path.as_ref().ok_or_else(|| {
                    ConfigError::Invalid("sqlite role_store requires path".to_string())
                })?;
                validate_field_path("role_store.path", path)
            }
        }
    }

    /// Returns the `SQLite` store settings for the sqlite backend.
    #[must_use]
    pub fn sqlite_config(&self) -> Option<SqliteStoreConfig> {
        match self.store_type {
            RoleStoreType::Memory => None,
            RoleStoreType::Sqlite => self.path.as_ref().map(|path| SqliteStoreConfig {
                path: path.clone(),
                busy_timeout_ms: self.busy_timeout_ms,
                journal_mode: self.journal_mode,
                sync_mode: self.sync_mode,
            }),
        }
    }
}

/// Role store backend type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RoleStoreType {
    /// Use the in-memory store.
    #[default]
    Memory,
    /// Use the `SQLite`-backed durable store.
    Sqlite,
}

/// Decision log configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DecisionLogConfig {
    /// Whether decision and role change events are emitted.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Optional JSON-lines file; stderr when unset.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Log allow decisions as well as denies.
    #[serde(default)]
    pub log_allows: bool,
}

impl Default for DecisionLogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
            log_allows: false,
        }
    }
}

impl DecisionLogConfig {
    /// Validates decision log configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.path {
            validate_field_path("decision_log.path", path)?;
        }
        Ok(())
    }

    /// Opens the configured decision log sink.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the log file cannot be opened.
    pub fn build_sink(&self) -> Result<Arc<dyn DecisionLogSink>, ConfigError> {
        if !self.enabled {
            return Ok(Arc::new(NoopDecisionLog));
        }
        match &self.path {
            Some(path) => {
                let sink =
                    FileDecisionLog::new(path).map_err(|err| ConfigError::Io(err.to_string()))?;
                Ok(Arc::new(sink))
            }
            None => Ok(Arc::new(StderrDecisionLog)),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns `true` for serde boolean defaults.
const fn default_true() -> bool {
    true
}

/// Returns the default context cache TTL.
const fn default_cache_ttl_ms() -> u64 {
    DEFAULT_CACHE_TTL_MS
}

/// Returns the default context cache capacity.
const fn default_cache_max_entries() -> usize {
    DEFAULT_CACHE_MAX_ENTRIES
}

/// Returns the default role store busy timeout.
const fn default_store_busy_timeout_ms() -> u64 {
    DEFAULT_STORE_BUSY_TIMEOUT_MS
}

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a configured file path field.
fn validate_field_path(field: &str, path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} component too long")));
        }
    }
    Ok(())
}
