//! TOML configuration file support.
//!
//! Reader settings can be kept in a config file instead of being repeated on
//! every invocation:
//!
//! ```toml
//! # featstream.toml
//! [reader]
//! feature_files_path = "/data/prm"
//! feature_file_extension = ".prm"
//! byte_order = "big"
//! buffer_usage = "user"
//! buffer_size = 4096
//! historic_usage = "limited"
//! historic_size = 64
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use featstream::stream::HistoricUsage;
use featstream::{ByteOrderSetting, ReaderConfig};

/// Root configuration structure for featstream.toml files.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Settings used to open feature files.
    #[serde(default)]
    pub reader: ReaderConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse TOML configuration")?;
        config
            .reader
            .validate()
            .context("Invalid [reader] settings")?;
        Ok(config)
    }
}

/// Reader settings from an optional config file, with the command-line byte
/// order taking precedence
pub fn load_reader_config(
    path: Option<&Path>,
    byte_order: Option<ByteOrderSetting>,
) -> Result<ReaderConfig> {
    let mut reader = match path {
        Some(path) => Config::from_file(path)?.reader,
        None => ReaderConfig::default(),
    };
    if let Some(byte_order) = byte_order {
        reader.byte_order = byte_order;
    }
    Ok(reader)
}

/// Settings for a single forward pass; nothing is kept for re-reads
pub fn single_pass(reader: &ReaderConfig) -> ReaderConfig {
    reader.clone().with_historic(HistoricUsage::Disabled, 0)
}
