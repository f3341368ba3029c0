use std::io::{Read, Seek, Write};

use byteorder::{BigEndian, ByteOrder as _, LittleEndian};

use super::FeatureError;
use crate::format::{ByteOrder, ByteOrderSetting, FormatDescriptor};
use crate::io::FrameFile;

/// Header and frame encoding of one concrete file format
pub trait FeatureCodec {
    /// Format name used in logs and reports
    const NAME: &'static str;

    /// Parse the header at the start of `file` into a descriptor.
    ///
    /// `source_name` names the single source of files that do not declare
    /// their own source table.
    fn read_header<S: Read + Seek>(
        file: &mut FrameFile<S>,
        byte_order: ByteOrderSetting,
        source_name: &str,
    ) -> Result<FormatDescriptor, FeatureError>;

    /// Write the header for `descriptor` at the start of `file`, returning
    /// its length in bytes.
    fn write_header<S: Write + Seek>(
        file: &mut FrameFile<S>,
        descriptor: &FormatDescriptor,
    ) -> Result<u64, FeatureError>;

    /// Decode consecutive frames; `bytes.len()` must be `4 * out.len()`
    fn decode_frames(bytes: &[u8], byte_order: ByteOrder, out: &mut [f32]) {
        match byte_order {
            ByteOrder::Big => BigEndian::read_f32_into(bytes, out),
            ByteOrder::Little => LittleEndian::read_f32_into(bytes, out),
        }
    }

    /// Encode consecutive frames; `out.len()` must be `4 * values.len()`
    fn encode_frames(values: &[f32], byte_order: ByteOrder, out: &mut [u8]) {
        match byte_order {
            ByteOrder::Big => BigEndian::write_f32_into(values, out),
            ByteOrder::Little => LittleEndian::write_f32_into(values, out),
        }
    }
}
