use std::path::PathBuf;

/// Errors that can occur while reading or writing feature streams
#[derive(Debug, thiserror::Error)]
pub enum FeatureError {
    /// The feature file does not exist
    #[error("Feature file not found: {}", path.display())]
    NotFound {
        /// Resolved path that was looked up
        path: PathBuf,
    },

    /// Header or source table failed validation
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// I/O error from the underlying medium
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Frame or source index outside the valid range
    #[error("Index {index} out of bounds (count {count})")]
    OutOfBounds {
        /// Requested index
        index: usize,
        /// Number of valid entries
        count: usize,
    },

    /// No source carries the requested name
    #[error("Source not found: {0}")]
    SourceNotFound(String),

    /// Write attempted on a stream opened for reading only
    #[error("Feature file opened read-only: {}", path.display())]
    ReadOnly {
        /// Path of the stream
        path: PathBuf,
    },

    /// Frame width does not match the stream
    #[error("Frame has {actual} coefficients, stream expects {expected}")]
    DimensionMismatch {
        /// Width of the stream
        expected: usize,
        /// Width of the offered frame
        actual: usize,
    },

    /// Reader configuration is unusable
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
