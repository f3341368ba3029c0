use std::path::Path;

use anyhow::Result;

use crate::format::{ByteOrderSetting, FormatDescriptor};
use crate::io::FrameFile;
use crate::spro4::SPro4;
use crate::stream::{FeatureCodec, FeatureError, ReaderConfig};

use super::{ValidationCheck, ValidationReport};

/// Step 1: file and header. Returns `None` when nothing further can be checked.
pub(crate) fn check_structure(
    path: &Path,
    config: &ReaderConfig,
    report: &mut ValidationReport,
) -> Result<Option<FormatDescriptor>> {
    if !path.is_file() {
        report.add_check(ValidationCheck::failed(
            "File exists",
            format!("No feature file at {}", path.display()),
        ));
        return Ok(None);
    }
    report.add_check(ValidationCheck::ok("File exists"));

    let mut file = FrameFile::open(path, false)?;
    let source_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let descriptor = match SPro4::read_header(&mut file, config.byte_order, &source_name) {
        Ok(descriptor) => descriptor,
        Err(FeatureError::InvalidData(msg)) => {
            report.add_check(ValidationCheck::failed("Header", msg));
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };
    report.add_check(ValidationCheck::ok("Header"));

    check_byte_order(&mut file, &descriptor, &source_name, report)?;

    if descriptor.feature_count == 0 {
        report.add_check(ValidationCheck::warning("Frames", "File holds no frames"));
    } else {
        report.add_check(ValidationCheck::ok("Frames"));
    }

    Ok(Some(descriptor))
}

/// Warn when the header would also decode under the other byte order
fn check_byte_order(
    file: &mut FrameFile,
    descriptor: &FormatDescriptor,
    source_name: &str,
    report: &mut ValidationReport,
) -> Result<()> {
    let other = descriptor.byte_order.opposite();
    match SPro4::read_header(file, ByteOrderSetting::from(other), source_name) {
        Ok(alternative) => report.add_check(ValidationCheck::warning(
            "Byte order",
            format!(
                "Header is also plausible as {} ({} x {}); detection is ambiguous",
                other, alternative.feature_count, alternative.vect_size
            ),
        )),
        Err(FeatureError::InvalidData(_)) => report.add_check(ValidationCheck::ok("Byte order")),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// Step 2: every declared source holds frames
pub(crate) fn check_sources(descriptor: &FormatDescriptor, report: &mut ValidationReport) {
    let truncated: Vec<String> = descriptor
        .sources
        .declared_starts()
        .filter(|(first, _)| *first > descriptor.feature_count)
        .map(|(first, name)| format!("{} (frame {})", name, first))
        .collect();
    if !truncated.is_empty() {
        report.add_check(ValidationCheck::warning(
            "Source table",
            format!(
                "Sources declared past the last of {} frames: {}",
                descriptor.feature_count,
                truncated.join(", ")
            ),
        ));
        return;
    }

    let empty: Vec<&str> = descriptor
        .sources
        .iter()
        .filter(|span| span.count == 0)
        .map(|span| span.name)
        .collect();
    if !empty.is_empty() && descriptor.feature_count > 0 {
        report.add_check(ValidationCheck::warning(
            "Source table",
            format!("Sources without frames: {}", empty.join(", ")),
        ));
    } else {
        report.add_check(ValidationCheck::ok("Source table"));
    }
}

/// Step 3: flags and vector width agree
pub(crate) fn check_flags(descriptor: &FormatDescriptor, report: &mut ValidationReport) {
    match descriptor.flags.channel_layout(descriptor.vect_size) {
        Some(_) => report.add_check(ValidationCheck::ok("Flags")),
        None => report.add_check(ValidationCheck::warning(
            "Flags",
            format!(
                "Qualifiers [{}] cannot produce {} coefficients per frame",
                descriptor.flags, descriptor.vect_size
            ),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::FeatureFlags;
    use crate::validator::CheckStatus;
    use crate::format::{ByteOrder, SourceTable};

    fn descriptor(vect_size: usize, flags: FeatureFlags, sources: SourceTable) -> FormatDescriptor {
        FormatDescriptor {
            vect_size,
            flags,
            sample_rate: 100.0,
            feature_count: sources.total(),
            header_length: 10,
            byte_order: ByteOrder::Little,
            sources,
        }
    }

    #[test]
    fn test_flags_layout_mismatch_warns() {
        let mut report = ValidationReport::new("x");
        let flags = FeatureFlags::ENERGY | FeatureFlags::DELTA;
        check_flags(&descriptor(3, flags, SourceTable::single("x", 1)), &mut report);
        check_flags(&descriptor(4, flags, SourceTable::single("x", 1)), &mut report);
        assert!(report.has_warnings());
        assert_eq!(report.summary().passed, 1);
    }

    #[test]
    fn test_empty_source_warns() {
        let mut report = ValidationReport::new("x");
        let sources = SourceTable::from_counts([("a", 2), ("b", 0), ("c", 1)]).unwrap();
        check_sources(&descriptor(2, FeatureFlags::empty(), sources), &mut report);
        assert_eq!(report.summary().warnings, 1);
    }

    #[test]
    fn test_sources_declared_past_frames_warn() {
        let mut report = ValidationReport::new("x");
        let sources = SourceTable::from_counts([("a", 3), ("b", 5)]).unwrap().with_total(2);
        check_sources(&descriptor(2, FeatureFlags::empty(), sources), &mut report);
        let summary = report.summary();
        assert_eq!(summary.warnings, 1);
        assert_eq!(summary.failed, 0);
        assert!(report.checks.iter().any(
            |check| matches!(&check.status, CheckStatus::Warning(message) if message.contains("b (frame 3)"))
        ));
    }

    #[test]
    fn test_complete_sources_pass() {
        let mut report = ValidationReport::new("x");
        let sources = SourceTable::from_counts([("a", 3), ("b", 5)]).unwrap();
        check_sources(&descriptor(2, FeatureFlags::empty(), sources), &mut report);
        assert_eq!(report.summary().passed, 1);
        assert!(!report.has_warnings());
    }
}
