use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::cache::HistoricPolicy;
use super::FeatureError;
use crate::format::ByteOrderSetting;

/// Frames held by the buffer window when the size is left to the reader
pub const DEFAULT_BUFFER_SIZE: usize = 1024;

/// How the buffer window is sized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BufferUsage {
    /// Reader picks [`DEFAULT_BUFFER_SIZE`]
    #[default]
    Auto,
    /// Caller-supplied `buffer_size`
    User,
    /// Caller decodes into its own storage with
    /// [`FeatureFile::read_features_into`](super::FeatureFile::read_features_into);
    /// the internal window holds a single frame
    External,
}

/// How many already decoded frames are retained for re-reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoricUsage {
    /// Keep every frame from the start of the stream
    #[default]
    AllFeatures,
    /// Keep the last `historic_size` frames
    Limited,
    /// Keep nothing beyond the buffer window
    Disabled,
}

/// Configuration for opening feature files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Directory prefixed to file names
    pub feature_files_path: PathBuf,
    /// Extension appended to file names, including the dot
    pub feature_file_extension: String,
    /// Expected byte order
    pub byte_order: ByteOrderSetting,
    /// Buffer window sizing mode
    pub buffer_usage: BufferUsage,
    /// Buffer window size in frames, for [`BufferUsage::User`]
    pub buffer_size: usize,
    /// Historic window retention mode
    pub historic_usage: HistoricUsage,
    /// Historic window size in frames, for [`HistoricUsage::Limited`]
    pub historic_size: usize,
    /// Open files for reading and writing
    pub writable: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            feature_files_path: PathBuf::new(),
            feature_file_extension: String::new(),
            byte_order: ByteOrderSetting::Auto,
            buffer_usage: BufferUsage::Auto,
            buffer_size: 0,
            historic_usage: HistoricUsage::AllFeatures,
            historic_size: 0,
            writable: false,
        }
    }
}

impl ReaderConfig {
    /// Parse configuration keys from a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, FeatureError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| FeatureError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration keys from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, FeatureError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Set the expected byte order
    pub fn with_byte_order(mut self, byte_order: ByteOrderSetting) -> Self {
        self.byte_order = byte_order;
        self
    }

    /// Set the buffer window mode and size
    pub fn with_buffer(mut self, usage: BufferUsage, size: usize) -> Self {
        self.buffer_usage = usage;
        self.buffer_size = size;
        self
    }

    /// Set the historic window mode and size
    pub fn with_historic(mut self, usage: HistoricUsage, size: usize) -> Self {
        self.historic_usage = usage;
        self.historic_size = size;
        self
    }

    /// Set the directory searched for feature files
    pub fn with_feature_files_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.feature_files_path = path.into();
        self
    }

    /// Set the extension appended to file names
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.feature_file_extension = extension.into();
        self
    }

    /// Open files for writing as well as reading
    pub fn writable(mut self, writable: bool) -> Self {
        self.writable = writable;
        self
    }

    /// Reject sizes that leave a window without room
    pub fn validate(&self) -> Result<(), FeatureError> {
        if self.buffer_usage == BufferUsage::User && self.buffer_size == 0 {
            return Err(FeatureError::InvalidConfig(
                "buffer_usage = \"user\" requires buffer_size > 0".to_string(),
            ));
        }
        if self.historic_usage == HistoricUsage::Limited && self.historic_size == 0 {
            return Err(FeatureError::InvalidConfig(
                "historic_usage = \"limited\" requires historic_size > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Full path of the feature file called `name`
    pub fn resolve_path(&self, name: &str) -> PathBuf {
        self.feature_files_path
            .join(format!("{}{}", name, self.feature_file_extension))
    }

    /// Buffer window capacity in frames
    pub fn buffer_capacity(&self) -> usize {
        match self.buffer_usage {
            BufferUsage::Auto => DEFAULT_BUFFER_SIZE,
            BufferUsage::User => self.buffer_size.max(1),
            BufferUsage::External => 1,
        }
    }

    pub(crate) fn historic_policy(&self) -> HistoricPolicy {
        match self.historic_usage {
            HistoricUsage::AllFeatures => HistoricPolicy::All,
            HistoricUsage::Limited if self.historic_size > 0 => {
                HistoricPolicy::Limited(self.historic_size)
            }
            HistoricUsage::Limited | HistoricUsage::Disabled => HistoricPolicy::Disabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml = r#"
            feature_files_path = "/data/prm"
            feature_file_extension = ".prm"
            byte_order = "big"
            buffer_usage = "user"
            buffer_size = 64
            historic_usage = "limited"
            historic_size = 16
        "#;

        let config = ReaderConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.byte_order, ByteOrderSetting::Big);
        assert_eq!(config.buffer_capacity(), 64);
        assert_eq!(config.historic_policy(), HistoricPolicy::Limited(16));
        assert_eq!(
            config.resolve_path("spk01"),
            PathBuf::from("/data/prm/spk01.prm")
        );
        assert!(!config.writable);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = ReaderConfig::from_toml_str("").unwrap();
        assert_eq!(config, ReaderConfig::default());
        assert_eq!(config.buffer_capacity(), DEFAULT_BUFFER_SIZE);
        assert_eq!(config.historic_policy(), HistoricPolicy::All);
        assert_eq!(config.resolve_path("a"), PathBuf::from("a"));
    }

    #[test]
    fn test_invalid_sizes_rejected() {
        assert!(matches!(
            ReaderConfig::from_toml_str("buffer_usage = \"user\""),
            Err(FeatureError::InvalidConfig(_))
        ));
        assert!(matches!(
            ReaderConfig::from_toml_str("historic_usage = \"limited\""),
            Err(FeatureError::InvalidConfig(_))
        ));
        assert!(matches!(
            ReaderConfig::from_toml_str("byte_order = \"middle\""),
            Err(FeatureError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_external_buffer_keeps_one_frame() {
        let config = ReaderConfig::default().with_buffer(BufferUsage::External, 0);
        assert_eq!(config.buffer_capacity(), 1);
    }
}
