use std::path::Path;

use anyhow::Result;

use crate::format::FormatDescriptor;
use crate::spro4::SPro4File;
use crate::stream::{BufferUsage, HistoricUsage, ReaderConfig, DEFAULT_BUFFER_SIZE};

use super::{ValidationCheck, ValidationReport};

/// Step 4: Data sanity validation
pub(crate) fn check_data_sanity(
    path: &Path,
    config: &ReaderConfig,
    descriptor: &FormatDescriptor,
    report: &mut ValidationReport,
) -> Result<()> {
    let rate = descriptor.sample_rate;
    if rate.is_finite() && rate > 0.0 {
        report.add_check(ValidationCheck::ok("Frame rate"));
    } else {
        report.add_check(ValidationCheck::warning(
            "Frame rate",
            format!("Frame rate {} Hz is not a positive number", rate),
        ));
    }

    // Stream through caller storage; nothing needs to stay cached
    let scan_config = config
        .clone()
        .with_buffer(BufferUsage::External, 0)
        .with_historic(HistoricUsage::Disabled, 0)
        .writable(false);
    let mut file = SPro4File::with_path(path, &scan_config)?;

    let vect_size = descriptor.vect_size;
    let mut storage = vec![0.0f32; DEFAULT_BUFFER_SIZE * vect_size];
    let mut first = 0usize;
    let mut non_finite = 0usize;
    let mut first_bad: Option<(usize, usize)> = None;
    loop {
        let frames = file.read_features_into(&mut storage)?;
        if frames == 0 {
            break;
        }
        for (i, value) in storage[..frames * vect_size].iter().enumerate() {
            if !value.is_finite() {
                non_finite += 1;
                first_bad.get_or_insert((first + i / vect_size, i % vect_size));
            }
        }
        first += frames;
    }

    match first_bad {
        None => report.add_check(ValidationCheck::ok("Finite coefficients")),
        Some((frame, coefficient)) => report.add_check(ValidationCheck::failed(
            "Finite coefficients",
            format!(
                "{} non-finite value(s), first at frame {} coefficient {}",
                non_finite, frame, coefficient
            ),
        )),
    }
    Ok(())
}
