//! Store configuration via `mixcell.toml`
//!
//! A default file is written on first use; edit it and reopen the store to
//! change settings.

use crate::error::{EngineError, Result};
use mixcell_concurrency::ReplicaId;
use mixcell_core::Limits;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Config file name placed next to the store's data.
pub const CONFIG_FILE_NAME: &str = "mixcell.toml";

/// Store configuration loaded from `mixcell.toml`.
///
/// # Example
///
/// ```toml
/// replica_id = "phone-1"
/// emit_change_records = true
///
/// [limits]
/// max_string_bytes = 16777216
/// max_binary_bytes = 16777216
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MixcellConfig {
    /// Replica name used to stamp writes. A random id is generated when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replica_id: Option<String>,
    /// Deliver change records to observers after each commit.
    #[serde(default = "default_emit_change_records")]
    pub emit_change_records: bool,
    /// Payload size limits for coercion and decode.
    #[serde(default)]
    pub limits: Limits,
}

fn default_emit_change_records() -> bool {
    true
}

impl Default for MixcellConfig {
    fn default() -> Self {
        Self {
            replica_id: None,
            emit_change_records: default_emit_change_records(),
            limits: Limits::default(),
        }
    }
}

impl MixcellConfig {
    /// Config with an explicit replica name
    pub fn for_replica(name: impl Into<String>) -> Self {
        Self {
            replica_id: Some(name.into()),
            ..Self::default()
        }
    }

    /// The configured replica id, or a fresh random one.
    pub fn resolve_replica_id(&self) -> ReplicaId {
        match &self.replica_id {
            Some(name) => ReplicaId::new(name.as_str()),
            None => ReplicaId::random(),
        }
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# mixcell store configuration
#
# Replica name used to stamp writes for sync. Leave unset to generate a
# random id each time the store is opened.
# replica_id = "device-1"

# Deliver change records to observers after each commit (default: true)
emit_change_records = true

# Payload size limits in bytes (default: 16 MiB each)
[limits]
max_string_bytes = 16777216
max_binary_bytes = 16777216
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            EngineError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: MixcellConfig = toml::from_str(&content).map_err(|e| {
            EngineError::Config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no store can run with.
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.replica_id {
            if name.trim().is_empty() {
                return Err(EngineError::Config("replica_id must not be empty".into()));
            }
        }
        Ok(())
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                EngineError::Config(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| EngineError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            EngineError::Config(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
