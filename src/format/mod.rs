//! # Stream format descriptors
//!
//! A [`FormatDescriptor`] holds everything needed to address a frame inside a
//! feature file: vector width, flags, frame rate, frame count, header length,
//! byte order and the [`SourceTable`] splitting the frames into named
//! recordings. It is derived from the physical header on first access and is
//! never stored anywhere else.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::feature::FeatureFlags;

mod sources;

pub use sources::{SourceRef, SourceSpan, SourceTable};

/// Size in bytes of one stored coefficient
pub const COEFFICIENT_SIZE: usize = 4;

/// Byte order of the numeric fields of a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ByteOrder {
    /// Most significant byte first
    Big,
    /// Least significant byte first
    Little,
}

impl ByteOrder {
    /// Byte order of the running host
    pub const fn native() -> Self {
        if cfg!(target_endian = "big") {
            ByteOrder::Big
        } else {
            ByteOrder::Little
        }
    }

    /// The other byte order
    pub const fn opposite(self) -> Self {
        match self {
            ByteOrder::Big => ByteOrder::Little,
            ByteOrder::Little => ByteOrder::Big,
        }
    }
}

impl fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ByteOrder::Big => f.write_str("big-endian"),
            ByteOrder::Little => f.write_str("little-endian"),
        }
    }
}

/// Expected byte order when opening a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ByteOrderSetting {
    /// Detect from the header
    #[default]
    Auto,
    /// Force big-endian
    Big,
    /// Force little-endian
    Little,
}

impl ByteOrderSetting {
    /// The forced byte order, or `None` for detection
    pub fn forced(self) -> Option<ByteOrder> {
        match self {
            ByteOrderSetting::Auto => None,
            ByteOrderSetting::Big => Some(ByteOrder::Big),
            ByteOrderSetting::Little => Some(ByteOrder::Little),
        }
    }
}

impl From<ByteOrder> for ByteOrderSetting {
    fn from(order: ByteOrder) -> Self {
        match order {
            ByteOrder::Big => ByteOrderSetting::Big,
            ByteOrder::Little => ByteOrderSetting::Little,
        }
    }
}

/// Per-stream metadata parsed from the header
#[derive(Debug, Clone, PartialEq)]
pub struct FormatDescriptor {
    /// Coefficients per frame
    pub vect_size: usize,
    /// Channel groups present in each frame
    pub flags: FeatureFlags,
    /// Frame rate in Hz
    pub sample_rate: f32,
    /// Total number of frames
    pub feature_count: usize,
    /// Bytes before the first frame
    pub header_length: u64,
    /// Byte order of header fields and frames
    pub byte_order: ByteOrder,
    /// Named recordings inside the stream
    pub sources: SourceTable,
}

impl FormatDescriptor {
    /// Bytes per stored frame
    pub fn frame_byte_size(&self) -> usize {
        self.vect_size * COEFFICIENT_SIZE
    }

    /// Byte offset of frame `index`
    pub fn frame_offset(&self, index: usize) -> u64 {
        self.header_length + index as u64 * self.frame_byte_size() as u64
    }

    /// Index of the final frame, `None` for an empty stream
    pub fn last_feature_index(&self) -> Option<usize> {
        self.feature_count.checked_sub(1)
    }

    /// Account for frames appended past the current end
    pub(crate) fn extend(&mut self, frames: usize) {
        self.feature_count += frames;
        self.sources.extend(frames);
    }
}

impl fmt::Display for FormatDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} frames x {} coefficients [{}] at {} Hz, {}, {} source(s)",
            self.feature_count,
            self.vect_size,
            self.flags,
            self.sample_rate,
            self.byte_order,
            self.sources.len()
        )
    }
}

/// Layout of a file about to be created
#[derive(Debug, Clone, PartialEq)]
pub struct FormatSpec {
    /// Coefficients per frame
    pub vect_size: usize,
    /// Channel groups present in each frame
    pub flags: FeatureFlags,
    /// Frame rate in Hz
    pub sample_rate: f32,
    /// Byte order to write
    pub byte_order: ByteOrder,
    /// Declared `(name, frame count)` sources; empty for a single source
    /// named after the file
    pub sources: Vec<(String, usize)>,
}

impl FormatSpec {
    /// Single-source layout in native byte order
    pub fn new(vect_size: usize, flags: FeatureFlags, sample_rate: f32) -> Self {
        Self {
            vect_size,
            flags,
            sample_rate,
            byte_order: ByteOrder::native(),
            sources: Vec::new(),
        }
    }

    /// Set the byte order to write
    pub fn byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }

    /// Declare one more source of `count` frames
    pub fn source(mut self, name: impl Into<String>, count: usize) -> Self {
        self.sources.push((name.into(), count));
        self
    }
}
