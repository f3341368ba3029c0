//! # Feature Streams
//!
//! A feature stream is a random-accessible, steppable sequence of fixed-width
//! frames, possibly split into several named sources. [`FeatureFile`] is the
//! file-backed implementation: it parses the header on first need, then
//! serves frames from two windows before touching the file:
//!
//! - the **historic window**, consulted first, retains frames already decoded
//!   (every frame, the most recent ones, or none, see [`HistoricUsage`])
//! - the **buffer window** holds the last run decoded ahead of the cursor
//!   (sized by [`BufferUsage`])
//!
//! Only when both miss is a new run of frames decoded. Header layout and frame
//! encoding are supplied by a [`FeatureCodec`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use featstream::stream::FeatureStream;
//! use featstream::{Feature, ReaderConfig, SPro4File, SourceRef};
//!
//! let mut file = SPro4File::with_path("session.prm", &ReaderConfig::default())?;
//! for source in 0..file.source_count()? {
//!     let first = file.first_feature_index_of_source(SourceRef::Index(source))?;
//!     let count = file.feature_count_of_source(SourceRef::Index(source))?;
//!     println!("{}: frames {}..{}", file.source_name(source)?, first, first + count);
//! }
//!
//! let mut feature = Feature::default();
//! while file.next_feature(&mut feature)? {
//!     // feed the model
//! }
//! # Ok::<(), featstream::FeatureError>(())
//! ```

mod cache;
mod codec;
mod config;
mod error;
mod file;


pub use cache::{CacheHit, CacheStats};
pub use codec::FeatureCodec;
pub use config::{BufferUsage, HistoricUsage, ReaderConfig, DEFAULT_BUFFER_SIZE};
pub use error::FeatureError;
pub use file::{FeatureFile, StreamStats};

use crate::feature::{Feature, FeatureFlags};
use crate::format::SourceRef;

/// Contract shared by every multi-source feature stream
pub trait FeatureStream {
    /// Number of frames in the stream
    fn feature_count(&mut self) -> Result<usize, FeatureError>;

    /// Coefficients per frame
    fn vect_size(&mut self) -> Result<usize, FeatureError>;

    /// Channel groups present in every frame
    fn feature_flags(&mut self) -> Result<FeatureFlags, FeatureError>;

    /// Frame rate in Hz
    fn sample_rate(&mut self) -> Result<f32, FeatureError>;

    /// Number of sources
    fn source_count(&mut self) -> Result<usize, FeatureError>;

    /// Number of frames of a source
    fn feature_count_of_source(&mut self, source: SourceRef<'_>) -> Result<usize, FeatureError>;

    /// Global index of the first frame of a source
    fn first_feature_index_of_source(&mut self, source: SourceRef<'_>)
        -> Result<usize, FeatureError>;

    /// Name of the source at `index`
    fn source_name(&mut self, index: usize) -> Result<&str, FeatureError>;

    /// Decode the frame at the cursor, then advance by `step`
    fn read_feature(&mut self, out: &mut Feature, step: usize) -> Result<bool, FeatureError>;

    /// Write a frame at the cursor, then advance by `step`
    fn write_feature(&mut self, feature: &Feature, step: usize) -> Result<bool, FeatureError>;

    /// Release the underlying resources
    fn close(&mut self);

    /// Sequential read, one frame at a time
    fn next_feature(&mut self, out: &mut Feature) -> Result<bool, FeatureError> {
        self.read_feature(out, 1)
    }
}

impl<C: FeatureCodec> FeatureStream for FeatureFile<C> {
    fn feature_count(&mut self) -> Result<usize, FeatureError> {
        FeatureFile::feature_count(self)
    }

    fn vect_size(&mut self) -> Result<usize, FeatureError> {
        FeatureFile::vect_size(self)
    }

    fn feature_flags(&mut self) -> Result<FeatureFlags, FeatureError> {
        FeatureFile::feature_flags(self)
    }

    fn sample_rate(&mut self) -> Result<f32, FeatureError> {
        FeatureFile::sample_rate(self)
    }

    fn source_count(&mut self) -> Result<usize, FeatureError> {
        FeatureFile::source_count(self)
    }

    fn feature_count_of_source(&mut self, source: SourceRef<'_>) -> Result<usize, FeatureError> {
        FeatureFile::feature_count_of_source(self, source)
    }

    fn first_feature_index_of_source(
        &mut self,
        source: SourceRef<'_>,
    ) -> Result<usize, FeatureError> {
        FeatureFile::first_feature_index_of_source(self, source)
    }

    fn source_name(&mut self, index: usize) -> Result<&str, FeatureError> {
        FeatureFile::source_name(self, index)
    }

    fn read_feature(&mut self, out: &mut Feature, step: usize) -> Result<bool, FeatureError> {
        FeatureFile::read_feature(self, out, step)
    }

    fn write_feature(&mut self, feature: &Feature, step: usize) -> Result<bool, FeatureError> {
        FeatureFile::write_feature(self, feature, step)
    }

    fn close(&mut self) {
        FeatureFile::close(self)
    }
}
