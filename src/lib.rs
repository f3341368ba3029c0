//! # featstream - Streaming Acoustic Feature Files
//!
//! `featstream` reads and writes binary files of per-frame acoustic feature
//! vectors (cepstral coefficients and their derivatives) for speaker
//! recognition pipelines. Frames are exposed as a random-accessible,
//! steppable sequence without holding the whole file in memory.
//!
//! ## Key Features
//!
//! - **Lazy Open**: a stream is built from a file name and a configuration;
//!   the header is parsed on first access and released on close.
//!
//! - **Two-Tier Cache**: a historic window retains frames already decoded for
//!   look-back reads, a buffer window holds the run decoded ahead of the
//!   cursor. The file is only touched when both miss.
//!
//! - **Multi-Source Streams**: several named recordings can be concatenated in
//!   one file and addressed by index or by name.
//!
//! - **Read and Write**: the same stream overwrites and appends frames, with
//!   written frames immediately readable from the cache.
//!
//! - **SPro4 Format**: bit-exact SPro 4 header and frames, with byte order
//!   detected from the header when not configured.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use featstream::{Feature, FeatureFlags, FormatSpec, ReaderConfig, SPro4File};
//!
//! // Write two frames of 13 coefficients plus energy
//! let spec = FormatSpec::new(14, FeatureFlags::ENERGY, 100.0);
//! let mut file = SPro4File::create("spk01.prm", spec, &ReaderConfig::default())?;
//! file.write_feature(&Feature::new(14), 1)?;
//! file.write_feature(&Feature::new(14), 1)?;
//! file.close();
//!
//! // Read them back
//! let config = ReaderConfig::default().with_extension(".prm");
//! let mut file = SPro4File::new("spk01", &config)?;
//! let mut feature = Feature::default();
//! while file.read_feature(&mut feature, 1)? {
//!     println!("{}", feature);
//! }
//! # Ok::<(), featstream::FeatureError>(())
//! ```
//!
//! ## Architecture
//!
//! - [`feature`]: frame record and qualifier flags
//! - [`format`]: format descriptor, byte order and source table
//! - [`io`]: byte-oriented line and frame access to the storage medium
//! - [`stream`]: stream contract, windowed reader, cache and configuration
//! - [`spro4`]: SPro4 header codec
//! - [`validator`]: structural checks on feature files

// Documentation lints - enforce complete documentation for publication
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

pub mod feature;
pub mod format;
pub mod io;
pub mod spro4;
pub mod stream;
pub mod validator;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::feature::{ChannelLayout, Feature, FeatureFlags};
    pub use crate::format::{
        ByteOrder, ByteOrderSetting, FormatDescriptor, FormatSpec, SourceRef, SourceSpan,
        SourceTable,
    };
    pub use crate::spro4::{SPro4, SPro4File};
    pub use crate::stream::{
        BufferUsage, FeatureError, FeatureFile, FeatureStream, HistoricUsage, ReaderConfig,
        StreamStats,
    };
    pub use crate::validator::{validate_feature_file, ValidationReport};
}

pub use feature::{Feature, FeatureFlags};
pub use format::{ByteOrder, ByteOrderSetting, FormatDescriptor, FormatSpec, SourceRef};
pub use spro4::SPro4File;
pub use stream::{FeatureError, FeatureStream, ReaderConfig};
