use anyhow::Result;
use log::info;
use std::path::PathBuf;

use featstream::validator::validate_feature_file;
use featstream::ReaderConfig;

/// Validate feature file integrity
pub fn run(file: PathBuf, config: &ReaderConfig, json: bool) -> Result<()> {
    info!("Checking {}", file.display());

    match validate_feature_file(&file, config) {
        Ok(report) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                // Use colorized output if available
                #[cfg(feature = "colorized_output")]
                {
                    println!("{}", report.format_colored());
                }

                #[cfg(not(feature = "colorized_output"))]
                {
                    println!("{}", report);
                }
            }

            // Exit with error code if validation failed
            if report.has_failures() {
                std::process::exit(1);
            }

            Ok(())
        }
        Err(e) => {
            eprintln!("Validation error: {}", e);
            std::process::exit(1);
        }
    }
}
