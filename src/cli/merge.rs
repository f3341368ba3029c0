use anyhow::{Context, Result};
use log::{info, warn};
use std::path::PathBuf;

use featstream::{ByteOrder, Feature, FormatDescriptor, FormatSpec, ReaderConfig, SPro4File};

use super::config::single_pass;

/// Name of the sources an input contributes to the merged file
fn source_names(path: &std::path::Path, descriptor: &FormatDescriptor) -> Vec<(String, usize)> {
    if descriptor.sources.is_multi_source() {
        descriptor
            .sources
            .iter()
            .map(|span| (span.name.to_string(), span.count))
            .collect()
    } else {
        let stem = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        vec![(stem, descriptor.feature_count)]
    }
}

/// Concatenate feature files into one multi-source file
pub fn run(inputs: Vec<PathBuf>, output: PathBuf, config: &ReaderConfig, to: ByteOrder) -> Result<()> {
    if inputs.contains(&output) {
        anyhow::bail!("Output {} is also an input", output.display());
    }
    let config = single_pass(config);

    let mut readers = Vec::with_capacity(inputs.len());
    let mut sources = Vec::new();
    let mut reference: Option<FormatDescriptor> = None;
    for path in &inputs {
        let mut reader = SPro4File::with_path(path, &config)?;
        let descriptor = reader
            .descriptor()
            .with_context(|| format!("Failed to read header of {}", path.display()))?
            .clone();
        if let Some(first) = &reference {
            if descriptor.vect_size != first.vect_size || descriptor.flags != first.flags {
                anyhow::bail!(
                    "{} holds {} x [{}] frames, expected {} x [{}]",
                    path.display(),
                    descriptor.vect_size,
                    descriptor.flags,
                    first.vect_size,
                    first.flags
                );
            }
            if descriptor.sample_rate != first.sample_rate {
                warn!(
                    "{} is sampled at {} Hz, merged file keeps {} Hz",
                    path.display(),
                    descriptor.sample_rate,
                    first.sample_rate
                );
            }
        }
        info!("Input: {} ({})", path.display(), descriptor);
        sources.extend(source_names(path, &descriptor));
        reference.get_or_insert(descriptor);
        readers.push(reader);
    }

    let Some(reference) = reference else {
        anyhow::bail!("No input files");
    };
    let mut spec = FormatSpec::new(reference.vect_size, reference.flags, reference.sample_rate)
        .byte_order(to);
    for (name, count) in sources {
        spec = spec.source(name, count);
    }

    let mut writer = SPro4File::create(&output, spec, &config)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    let mut feature = Feature::default();
    for reader in &mut readers {
        while reader.read_feature(&mut feature, 1)? {
            writer.write_feature(&feature, 1)?;
        }
        reader.close();
    }

    info!(
        "Wrote {} frames in {} sources to {}",
        writer.feature_count()?,
        writer.source_count()?,
        output.display()
    );
    writer.close();

    Ok(())
}
