//! Feature records and their descriptor flags
//!
//! A [`Feature`] is one decoded frame: a fixed-width vector of single-precision
//! coefficients plus the [`FeatureFlags`] of the stream it came from. The flags
//! use the SPro qualifier bits, so a frame written with energy and first-order
//! deltas carries `E` and `D`.

use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::stream::FeatureError;

bitflags! {
    /// SPro qualifier bits describing which channel groups a frame holds
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct FeatureFlags: u32 {
        /// Log-energy appended to the static coefficients (`E`)
        const ENERGY = 0x01;
        /// Mean normalized coefficients (`Z`)
        const MEAN_NORMALIZED = 0x02;
        /// Static energy removed, energy deltas kept (`N`)
        const NO_STATIC_ENERGY = 0x04;
        /// First-order derivatives (`D`)
        const DELTA = 0x08;
        /// Second-order derivatives (`A`)
        const ACCELERATION = 0x10;
        /// Variance normalized coefficients (`R`)
        const VARIANCE_NORMALIZED = 0x20;
    }
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self::empty()
    }
}

impl FeatureFlags {
    const QUALIFIERS: [(char, Self); 6] = [
        ('E', Self::ENERGY),
        ('Z', Self::MEAN_NORMALIZED),
        ('N', Self::NO_STATIC_ENERGY),
        ('D', Self::DELTA),
        ('A', Self::ACCELERATION),
        ('R', Self::VARIANCE_NORMALIZED),
    ];

    /// Whether the frame carries log-energy in the static block
    pub fn has_static_energy(self) -> bool {
        self.contains(Self::ENERGY) && !self.contains(Self::NO_STATIC_ENERGY)
    }

    /// Split a frame of `vect_size` values into its channel groups.
    ///
    /// Returns `None` when the width cannot be produced by these flags, e.g.
    /// `D` set on an odd-width frame without energy.
    pub fn channel_layout(self, vect_size: usize) -> Option<ChannelLayout> {
        let energy = usize::from(self.contains(Self::ENERGY));
        let static_energy = usize::from(self.has_static_energy());
        let delta = usize::from(self.contains(Self::DELTA));
        let acceleration = usize::from(self.contains(Self::ACCELERATION));

        // vect_size = n + static_energy + (n + energy) * (delta + acceleration)
        let fixed = static_energy + energy * (delta + acceleration);
        let remaining = vect_size.checked_sub(fixed)?;
        let blocks = 1 + delta + acceleration;
        if remaining % blocks != 0 {
            return None;
        }
        let coefficients = remaining / blocks;
        if coefficients + static_energy == 0 && delta + acceleration == 0 {
            return None;
        }

        Some(ChannelLayout {
            coefficients,
            static_energy: static_energy == 1,
            delta: (coefficients + energy) * delta,
            acceleration: (coefficients + energy) * acceleration,
        })
    }
}

impl fmt::Display for FeatureFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("-");
        }
        for (letter, flag) in Self::QUALIFIERS {
            if self.contains(flag) {
                write!(f, "{}", letter)?;
            }
        }
        Ok(())
    }
}

impl FromStr for FeatureFlags {
    type Err = FeatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s == "-" {
            return Ok(Self::empty());
        }
        let mut flags = Self::empty();
        for c in s.chars() {
            let (_, flag) = Self::QUALIFIERS
                .iter()
                .find(|(letter, _)| *letter == c)
                .ok_or_else(|| {
                    FeatureError::InvalidData(format!("unknown feature qualifier '{}'", c))
                })?;
            flags |= *flag;
        }
        Ok(flags)
    }
}

/// Widths of the channel groups inside one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChannelLayout {
    /// Static cepstral coefficients
    pub coefficients: usize,
    /// Whether static log-energy follows the coefficients
    pub static_energy: bool,
    /// Width of the first-order derivative block
    pub delta: usize,
    /// Width of the second-order derivative block
    pub acceleration: usize,
}

impl ChannelLayout {
    /// Total frame width described by this layout
    pub fn width(&self) -> usize {
        self.coefficients + usize::from(self.static_energy) + self.delta + self.acceleration
    }
}

/// One decoded frame
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Feature {
    data: Vec<f32>,
    flags: FeatureFlags,
}

impl Feature {
    /// A zeroed frame of `vect_size` coefficients
    pub fn new(vect_size: usize) -> Self {
        Self {
            data: vec![0.0; vect_size],
            flags: FeatureFlags::empty(),
        }
    }

    /// Wrap existing coefficient values
    pub fn from_values(values: Vec<f32>) -> Self {
        Self {
            data: values,
            flags: FeatureFlags::empty(),
        }
    }

    /// Builder-style flag assignment
    pub fn with_flags(mut self, flags: FeatureFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Number of coefficients in this frame
    pub fn vect_size(&self) -> usize {
        self.data.len()
    }

    /// Flags of the stream the frame belongs to
    pub fn flags(&self) -> FeatureFlags {
        self.flags
    }

    /// Replace the descriptor flags
    pub fn set_flags(&mut self, flags: FeatureFlags) {
        self.flags = flags;
    }

    /// Coefficient at `index`, if in range
    pub fn get(&self, index: usize) -> Option<f32> {
        self.data.get(index).copied()
    }

    /// Assign one coefficient; out-of-range indices are reported, not ignored
    pub fn set(&mut self, index: usize, value: f32) -> Result<(), FeatureError> {
        let count = self.data.len();
        let slot = self
            .data
            .get_mut(index)
            .ok_or(FeatureError::OutOfBounds { index, count })?;
        *slot = value;
        Ok(())
    }

    /// Coefficients as a slice
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Coefficients as a mutable slice
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Consume the frame, returning its coefficients
    pub fn into_values(self) -> Vec<f32> {
        self.data
    }

    /// Overwrite this frame with decoded values, reusing the allocation
    pub(crate) fn assign(&mut self, values: &[f32], flags: FeatureFlags) {
        self.data.clear();
        self.data.extend_from_slice(values);
        self.flags = flags;
    }
}

impl Index<usize> for Feature {
    type Output = f32;

    fn index(&self, index: usize) -> &f32 {
        &self.data[index]
    }
}

impl IndexMut<usize> for Feature {
    fn index_mut(&mut self, index: usize) -> &mut f32 {
        &mut self.data[index]
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.data.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_display_and_parse() {
        let flags = FeatureFlags::ENERGY | FeatureFlags::DELTA | FeatureFlags::ACCELERATION;
        assert_eq!(flags.to_string(), "EDA");
        assert_eq!("EDA".parse::<FeatureFlags>().unwrap(), flags);
        assert_eq!("-".parse::<FeatureFlags>().unwrap(), FeatureFlags::empty());
        assert_eq!(FeatureFlags::empty().to_string(), "-");
        assert!("EX".parse::<FeatureFlags>().is_err());
    }

    #[test]
    fn test_flags_from_bits_rejects_unknown() {
        assert_eq!(FeatureFlags::from_bits(0x09), Some(FeatureFlags::ENERGY | FeatureFlags::DELTA));
        assert_eq!(FeatureFlags::from_bits(0x40), None);
        assert_eq!(FeatureFlags::from_bits(0x0100_0000), None);
        assert_eq!(FeatureFlags::all().bits(), 0x3F);
    }

    #[test]
    fn test_flags_default_is_static_only() {
        let flags = FeatureFlags::default();
        assert!(flags.is_empty());
        assert!(!flags.has_static_energy());
        assert_eq!(flags.to_string(), "-");
    }

    #[test]
    fn test_channel_layout_static_only() {
        let layout = FeatureFlags::empty().channel_layout(12).unwrap();
        assert_eq!(layout.coefficients, 12);
        assert!(!layout.static_energy);
        assert_eq!(layout.delta, 0);
        assert_eq!(layout.width(), 12);
    }

    #[test]
    fn test_channel_layout_energy_deltas() {
        // 12 cepstra + E, deltas of both, accelerations of both: 13 * 3
        let flags = FeatureFlags::ENERGY | FeatureFlags::DELTA | FeatureFlags::ACCELERATION;
        let layout = flags.channel_layout(39).unwrap();
        assert_eq!(layout.coefficients, 12);
        assert!(layout.static_energy);
        assert_eq!(layout.delta, 13);
        assert_eq!(layout.acceleration, 13);
        assert_eq!(layout.width(), 39);
    }

    #[test]
    fn test_channel_layout_suppressed_static_energy() {
        // 12 cepstra, no static energy, 13 deltas
        let flags = FeatureFlags::ENERGY | FeatureFlags::NO_STATIC_ENERGY | FeatureFlags::DELTA;
        let layout = flags.channel_layout(25).unwrap();
        assert_eq!(layout.coefficients, 12);
        assert!(!layout.static_energy);
        assert_eq!(layout.delta, 13);
        assert!(flags.channel_layout(26).is_none());
    }

    #[test]
    fn test_feature_set_out_of_range() {
        let mut feature = Feature::new(2);
        feature.set(1, 3.5).unwrap();
        assert_eq!(feature[1], 3.5);
        assert!(matches!(
            feature.set(2, 1.0),
            Err(FeatureError::OutOfBounds { index: 2, count: 2 })
        ));
    }
}
