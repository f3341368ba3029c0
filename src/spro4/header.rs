//! SPro4 header layout
//!
//! ```text
//! [<header>\n            optional text block, one `key = value` per line
//!  source = 0 spk01\n    multi-source declarations: start frame and name
//!  source = 412 spk02\n
//!  </header>\n]
//! u16  vector width      file byte order
//! i32  qualifier flags
//! f32  frame rate (Hz)
//! f32 * width * N        frames
//! ```
//!
//! The header carries no frame count; it is derived from the payload length.

use std::io::{Read, Seek, Write};

use byteorder::{BigEndian, LittleEndian};
use log::{debug, warn};

use crate::feature::FeatureFlags;
use crate::format::{ByteOrder, ByteOrderSetting, FormatDescriptor, SourceTable, COEFFICIENT_SIZE};
use crate::io::FrameFile;
use crate::stream::FeatureError;

/// First line of the optional text block
pub const TEXT_HEADER_START: &str = "<header>";
/// Last line of the optional text block
pub const TEXT_HEADER_END: &str = "</header>";
/// Bytes of the binary header fields
pub const BINARY_HEADER_SIZE: usize = 10;

const SOURCE_KEY: &str = "source";

/// Binary fields decoded under one byte order
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct BinaryHeader {
    pub vect_size: u16,
    pub flags: i32,
    pub sample_rate: f32,
}

impl BinaryHeader {
    pub(crate) fn decode(bytes: &[u8; BINARY_HEADER_SIZE], byte_order: ByteOrder) -> Self {
        match byte_order {
            ByteOrder::Big => Self::decode_with::<BigEndian>(bytes),
            ByteOrder::Little => Self::decode_with::<LittleEndian>(bytes),
        }
    }

    fn decode_with<B: byteorder::ByteOrder>(bytes: &[u8; BINARY_HEADER_SIZE]) -> Self {
        Self {
            vect_size: B::read_u16(&bytes[0..2]),
            flags: B::read_i32(&bytes[2..6]),
            sample_rate: B::read_f32(&bytes[6..10]),
        }
    }

    pub(crate) fn encode(&self, byte_order: ByteOrder) -> [u8; BINARY_HEADER_SIZE] {
        let mut bytes = [0u8; BINARY_HEADER_SIZE];
        match byte_order {
            ByteOrder::Big => self.encode_with::<BigEndian>(&mut bytes),
            ByteOrder::Little => self.encode_with::<LittleEndian>(&mut bytes),
        }
        bytes
    }

    fn encode_with<B: byteorder::ByteOrder>(&self, bytes: &mut [u8; BINARY_HEADER_SIZE]) {
        B::write_u16(&mut bytes[0..2], self.vect_size);
        B::write_i32(&mut bytes[2..6], self.flags);
        B::write_f32(&mut bytes[6..10], self.sample_rate);
    }

    /// Check the fields against the payload that follows them. This is a
    /// plausibility test, not a checksum: small widths can pass under both
    /// byte orders.
    pub(crate) fn plausible(&self, payload: u64) -> Result<FeatureFlags, String> {
        if self.vect_size == 0 {
            return Err("vector width is 0".to_string());
        }
        if self.flags < 0 {
            return Err(format!("negative flags {}", self.flags));
        }
        let flags = FeatureFlags::from_bits(self.flags as u32)
            .ok_or_else(|| format!("unknown flag bits {:#x}", self.flags))?;
        let frame_bytes = self.vect_size as u64 * COEFFICIENT_SIZE as u64;
        if payload % frame_bytes != 0 {
            return Err(format!(
                "payload of {} bytes is not a whole number of {}-byte frames",
                payload, frame_bytes
            ));
        }
        Ok(flags)
    }
}

/// Source declarations found in the text block
#[derive(Debug, Default)]
struct TextHeader {
    sources: Vec<(String, usize)>,
}

fn parse_source_line(value: &str) -> Result<(String, usize), FeatureError> {
    let (first, name) = value.split_once(char::is_whitespace).unwrap_or((value, ""));
    let first = first.parse::<usize>().map_err(|_| {
        FeatureError::InvalidData(format!("malformed source declaration '{}'", value))
    })?;
    // Names keep their inner spacing verbatim
    let name = name.trim_start();
    if name.is_empty() {
        return Err(FeatureError::InvalidData(format!(
            "source declaration '{}' has no name",
            value
        )));
    }
    Ok((name.to_string(), first))
}

fn read_text_header<S: Read + Seek>(file: &mut FrameFile<S>) -> Result<Option<TextHeader>, FeatureError> {
    let marker = TEXT_HEADER_START.len() + 1;
    let mut opening = vec![0u8; marker];
    if !file.read_raw(&mut opening)? || &opening[..marker - 1] != TEXT_HEADER_START.as_bytes() {
        file.seek(0)?;
        return Ok(None);
    }
    if !matches!(opening[marker - 1], b'\n' | b'\r') {
        file.seek(0)?;
        return Ok(None);
    }
    if opening[marker - 1] == b'\r' {
        // CRLF: consume the rest of the line
        file.seek(0)?;
        file.read_line()?;
    }

    let mut header = TextHeader::default();
    loop {
        let line = file.read_line()?.ok_or_else(|| {
            FeatureError::InvalidData(format!("text header is missing '{}'", TEXT_HEADER_END))
        })?;
        let line = line.trim();
        if line == TEXT_HEADER_END {
            return Ok(Some(header));
        }
        if let Some((key, value)) = line.split_once('=') {
            if key.trim() == SOURCE_KEY {
                header.sources.push(parse_source_line(value.trim())?);
            }
        }
    }
}

/// Parse the header at the start of `file`
pub(crate) fn read_header<S: Read + Seek>(
    file: &mut FrameFile<S>,
    setting: ByteOrderSetting,
    source_name: &str,
) -> Result<FormatDescriptor, FeatureError> {
    file.seek(0)?;
    let text = read_text_header(file)?;

    let mut raw = [0u8; BINARY_HEADER_SIZE];
    if !file.read_raw(&mut raw)? {
        return Err(FeatureError::InvalidData(format!(
            "truncated header: {} bytes, need at least {}",
            file.len(),
            file.position() + BINARY_HEADER_SIZE as u64
        )));
    }
    let header_length = file.position();
    let payload = file.len() - header_length;

    let (byte_order, binary, flags) = detect_byte_order(&raw, setting, payload)?;
    let vect_size = binary.vect_size as usize;
    let feature_count = (payload / (vect_size * COEFFICIENT_SIZE) as u64) as usize;

    let sources = match text {
        Some(text) if !text.sources.is_empty() => {
            // A stream closed before all of its sources were written keeps
            // their declarations; spans are clamped to the frames present.
            let declared_end = text.sources.iter().map(|(_, first)| *first).max().unwrap_or(0);
            if declared_end > feature_count {
                warn!(
                    "Sources declared up to frame {} but only {} frames written; trailing sources read as empty",
                    declared_end, feature_count
                );
            }
            SourceTable::from_starts(text.sources, declared_end.max(feature_count))?
                .with_total(feature_count)
        }
        _ => SourceTable::single(source_name, feature_count),
    };

    debug!(
        "SPro4 header: {} x {} [{}] at {} Hz, {}, {} source(s), header {} bytes",
        feature_count,
        vect_size,
        flags,
        binary.sample_rate,
        byte_order,
        sources.len(),
        header_length
    );

    Ok(FormatDescriptor {
        vect_size,
        flags,
        sample_rate: binary.sample_rate,
        feature_count,
        header_length,
        byte_order,
        sources,
    })
}

/// Pick the byte order of the binary fields. A forced order must be
/// plausible; `Auto` tries native first, then the opposite order.
pub(crate) fn detect_byte_order(
    raw: &[u8; BINARY_HEADER_SIZE],
    setting: ByteOrderSetting,
    payload: u64,
) -> Result<(ByteOrder, BinaryHeader, FeatureFlags), FeatureError> {
    if let Some(order) = setting.forced() {
        let binary = BinaryHeader::decode(raw, order);
        let flags = binary.plausible(payload).map_err(|reason| {
            FeatureError::InvalidData(format!("invalid {} header: {}", order, reason))
        })?;
        return Ok((order, binary, flags));
    }

    let first = ByteOrder::native();
    let second = first.opposite();
    let candidates = [first, second].map(|order| {
        let binary = BinaryHeader::decode(raw, order);
        (order, binary, binary.plausible(payload))
    });

    match candidates {
        [(order, binary, Ok(flags)), (other, _, second_result)] => {
            if second_result.is_ok() {
                warn!(
                    "Header is plausible as both {} and {}; keeping {}",
                    order, other, order
                );
            }
            Ok((order, binary, flags))
        }
        [(_, _, Err(_)), (order, binary, Ok(flags))] => Ok((order, binary, flags)),
        [(a, _, Err(ra)), (b, _, Err(rb))] => Err(FeatureError::InvalidData(format!(
            "header is implausible in both byte orders ({}: {}; {}: {})",
            a, ra, b, rb
        ))),
    }
}

/// Write the header for `descriptor`, returning its length
pub(crate) fn write_header<S: Write + Seek>(
    file: &mut FrameFile<S>,
    descriptor: &FormatDescriptor,
) -> Result<u64, FeatureError> {
    let vect_size = u16::try_from(descriptor.vect_size).map_err(|_| {
        FeatureError::InvalidData(format!(
            "vector width {} does not fit the header",
            descriptor.vect_size
        ))
    })?;

    let mut bytes = Vec::new();
    if descriptor.sources.is_multi_source() {
        bytes.extend_from_slice(TEXT_HEADER_START.as_bytes());
        bytes.push(b'\n');
        for (first, name) in descriptor.sources.declared_starts() {
            if name.trim() != name || name.contains('\n') {
                return Err(FeatureError::InvalidData(format!(
                    "source name {:?} cannot be stored in a text header",
                    name
                )));
            }
            bytes.extend_from_slice(format!("{} = {} {}\n", SOURCE_KEY, first, name).as_bytes());
        }
        bytes.extend_from_slice(TEXT_HEADER_END.as_bytes());
        bytes.push(b'\n');
    }

    let binary = BinaryHeader {
        vect_size,
        flags: descriptor.flags.bits() as i32,
        sample_rate: descriptor.sample_rate,
    };
    bytes.extend_from_slice(&binary.encode(descriptor.byte_order));

    file.seek(0)?;
    file.write_raw(&bytes)?;
    Ok(bytes.len() as u64)
}
