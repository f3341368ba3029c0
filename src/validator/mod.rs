//! # Feature File Validation
//!
//! Structural and numeric checks on a feature file, collected into a
//! [`ValidationReport`] instead of stopping at the first problem.
//!
//! ## Validation Checklist
//!
//! 1. **Structure Check**: the file exists, the header parses under the
//!    configured byte order, whether the other byte order would also be
//!    accepted, the payload holds whole frames
//! 2. **Source Table**: sources partition the frame range without gaps
//! 3. **Flags**: the qualifier flags can produce the stored vector width
//! 4. **Data Sanity**: every coefficient is finite and the frame rate is
//!    positive
//!
//! ## Usage
//!
//! ```rust,no_run
//! use featstream::validator::validate_feature_file;
//! use featstream::ReaderConfig;
//! use std::path::Path;
//!
//! let report = validate_feature_file(Path::new("spk01.prm"), &ReaderConfig::default())?;
//! println!("{}", report);
//! # Ok::<(), anyhow::Error>(())
//! ```

use std::path::Path;

use anyhow::Result;

pub use report::{CheckStatus, ReportSummary, ValidationCheck, ValidationReport};

use crate::stream::ReaderConfig;

mod data;
mod report;
mod structure;

/// Main validation entry point
pub fn validate_feature_file(path: &Path, config: &ReaderConfig) -> Result<ValidationReport> {
    let mut report = ValidationReport::new(path.display().to_string());

    // 1. Structure Check
    let Some(descriptor) = structure::check_structure(path, config, &mut report)? else {
        return Ok(report);
    };

    // 2. Source Table
    structure::check_sources(&descriptor, &mut report);

    // 3. Flags
    structure::check_flags(&descriptor, &mut report);

    // 4. Data Sanity
    data::check_data_sanity(path, config, &descriptor, &mut report)?;

    Ok(report)
}
