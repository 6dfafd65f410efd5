//! Configuration loading helpers.

use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::dispatch::RemoteMode;

const ENV_PREFIX: &str = "KMERDHT__";

/// Errors returned by configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error while reading config files.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parse error.
    #[error("toml parse error: {0}")]
    Toml(#[from] toml::de::Error),
    /// Invalid value for a key.
    #[error("invalid value for {key}: {value}")]
    InvalidValue {
        /// Configuration key.
        key: String,
        /// Raw value string.
        value: String,
    },
    /// Unknown configuration key.
    #[error("unknown config key: {0}")]
    UnknownKey(String),
}

/// Runtime parameters for one distributed table.
///
/// Every rank must construct the table with identical values; construction
/// verifies this collectively.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Total slot count `N` across the cohort. Size generously: the table
    /// never resizes, and probe chains degrade as load factor approaches 1.
    pub total_slots: u64,
    /// Access path for slots owned by other ranks.
    pub remote_mode: RemoteMode,
    /// Cap on in-flight RPCs per rank during batched inserts. Bounds memory
    /// pressure on handler queues; a tuning knob, not a correctness one.
    pub max_inflight_rpcs: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            total_slots: 1 << 20,
            remote_mode: RemoteMode::default(),
            max_inflight_rpcs: 32,
        }
    }
}

impl TableConfig {
    /// Default configuration with an explicit slot count.
    pub fn with_slots(total_slots: u64) -> Self {
        Self {
            total_slots,
            ..Self::default()
        }
    }

    /// In-flight cap, never zero.
    pub(crate) fn inflight_cap(&self) -> usize {
        self.max_inflight_rpcs.max(1)
    }
}

/// Top-level configuration schema.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KmerDhtConfig {
    /// Table configuration.
    pub table: Option<TableConfigSpec>,
}

/// Overridable subset of [`TableConfig`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TableConfigSpec {
    /// Total slot count `N`.
    pub total_slots: Option<u64>,
    /// Access path for remote slots.
    pub remote_mode: Option<RemoteMode>,
    /// Cap on in-flight RPCs during batched inserts.
    pub max_inflight_rpcs: Option<usize>,
}

impl TableConfigSpec {
    fn apply_to(&self, config: &mut TableConfig) {
        if let Some(total_slots) = self.total_slots {
            config.total_slots = total_slots;
        }
        if let Some(remote_mode) = self.remote_mode {
            config.remote_mode = remote_mode;
        }
        if let Some(max_inflight_rpcs) = self.max_inflight_rpcs {
            config.max_inflight_rpcs = max_inflight_rpcs;
        }
    }
}

impl KmerDhtConfig {
    /// Load configuration from a TOML file.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Load configuration from the `KMERDHT_CONFIG` env var (if set), then
    /// apply `KMERDHT__section__field` overrides.
    pub fn load_from_env() -> Result<Self, ConfigError> {
        let mut config = match env::var("KMERDHT_CONFIG").ok() {
            Some(path) => Self::load_from_path(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply environment overrides in-place.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(env::vars())
    }

    fn apply_overrides(
        &mut self,
        vars: impl Iterator<Item = (String, String)>,
    ) -> Result<(), ConfigError> {
        for (key, value) in vars {
            if !key.starts_with(ENV_PREFIX) {
                continue;
            }
            let path = key[ENV_PREFIX.len()..].to_ascii_lowercase();
            let parts: Vec<&str> = path.split("__").collect();
            let value = value.trim().to_string();

            match parts.as_slice() {
                ["table", "total_slots"] => {
                    self.table_mut().total_slots = Some(parse_value(&key, &value)?);
                }
                ["table", "remote_mode"] => {
                    self.table_mut().remote_mode = Some(parse_value(&key, &value)?);
                }
                ["table", "max_inflight_rpcs"] => {
                    self.table_mut().max_inflight_rpcs = Some(parse_value(&key, &value)?);
                }
                _ => return Err(ConfigError::UnknownKey(key)),
            }
        }

        Ok(())
    }

    /// Build a `TableConfig` using defaults plus overrides.
    pub fn to_table_config(&self) -> TableConfig {
        let mut config = TableConfig::default();
        if let Some(table) = &self.table {
            table.apply_to(&mut config);
        }
        config
    }

    fn table_mut(&mut self) -> &mut TableConfigSpec {
        if self.table.is_none() {
            self.table = Some(TableConfigSpec::default());
        }
        self.table.as_mut().expect("table config")
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}
