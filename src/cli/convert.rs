use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;

use featstream::{ByteOrder, Feature, FormatSpec, ReaderConfig, SPro4File};

use super::config::single_pass;

/// Re-encode a feature file in another byte order
pub fn run(input: PathBuf, output: PathBuf, config: &ReaderConfig, to: ByteOrder) -> Result<()> {
    if input == output {
        anyhow::bail!("Input and output must be different files");
    }

    let config = single_pass(config);
    let mut reader = SPro4File::with_path(&input, &config)?;
    let descriptor = reader
        .descriptor()
        .with_context(|| format!("Failed to read header of {}", input.display()))?
        .clone();

    info!("Input:  {} ({})", input.display(), descriptor);
    info!("Output: {} ({})", output.display(), to);

    let mut spec = FormatSpec::new(descriptor.vect_size, descriptor.flags, descriptor.sample_rate)
        .byte_order(to);
    if descriptor.sources.is_multi_source() {
        for span in descriptor.sources.iter() {
            spec = spec.source(span.name, span.count);
        }
    }

    let mut writer = SPro4File::create(&output, spec, &config)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    let mut feature = Feature::default();
    while reader.read_feature(&mut feature, 1)? {
        writer.write_feature(&feature, 1)?;
    }

    let written = writer.feature_count()?;
    if let Some(stats) = writer.stats() {
        info!("Wrote {} frames: {}", written, stats.io);
    }
    writer.close();

    Ok(())
}
