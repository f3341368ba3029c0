//! # SPro4 Feature Files
//!
//! Codec for the SPro 4 binary feature format: a 10-byte header (vector
//! width, qualifier flags, frame rate), optionally preceded by a text block,
//! followed by the frames as IEEE-754 single-precision values.
//!
//! ## Byte order detection
//!
//! With [`ByteOrderSetting::Auto`](crate::format::ByteOrderSetting::Auto) the
//! header is decoded in native order first. The reading is rejected when the
//! width is 0, the flags are negative or carry unknown bits, or the payload is
//! not a whole number of frames; the opposite order is then tried. This is a
//! plausibility heuristic and not a checksum. A header valid under both orders
//! is resolved to the native order with a warning, and the frame rate is not
//! part of the test.
//!
//! ## Example
//!
//! ```rust,no_run
//! use featstream::{Feature, FeatureFlags, FormatSpec, ReaderConfig, SPro4File};
//!
//! let spec = FormatSpec::new(13, FeatureFlags::ENERGY, 100.0);
//! let mut file = SPro4File::create("out.prm", spec, &ReaderConfig::default())?;
//! file.write_feature(&Feature::new(13), 1)?;
//! file.close();
//! # Ok::<(), featstream::FeatureError>(())
//! ```

mod header;

#[cfg(test)]
mod tests;

use std::io::{Read, Seek, Write};

pub use header::{BINARY_HEADER_SIZE, TEXT_HEADER_END, TEXT_HEADER_START};

use crate::format::{ByteOrderSetting, FormatDescriptor};
use crate::io::FrameFile;
use crate::stream::{FeatureCodec, FeatureError, FeatureFile};

/// SPro4 codec marker
#[derive(Debug, Clone, Copy, Default)]
pub struct SPro4;

impl FeatureCodec for SPro4 {
    const NAME: &'static str = "SPro4";

    fn read_header<S: Read + Seek>(
        file: &mut FrameFile<S>,
        byte_order: ByteOrderSetting,
        source_name: &str,
    ) -> Result<FormatDescriptor, FeatureError> {
        header::read_header(file, byte_order, source_name)
    }

    fn write_header<S: Write + Seek>(
        file: &mut FrameFile<S>,
        descriptor: &FormatDescriptor,
    ) -> Result<u64, FeatureError> {
        header::write_header(file, descriptor)
    }
}

/// Feature file in SPro4 format
pub type SPro4File = FeatureFile<SPro4>;
