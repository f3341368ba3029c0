use anyhow::{Context, Result};
use log::info;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use featstream::{Feature, ReaderConfig, SPro4File, SourceRef};

/// Print frames of a feature file, one per line
pub fn run(
    file: PathBuf,
    config: &ReaderConfig,
    source: Option<String>,
    start: usize,
    count: Option<usize>,
) -> Result<()> {
    let mut stream = SPro4File::with_path(&file, config)?;
    let total = stream
        .feature_count()
        .with_context(|| format!("Failed to read header of {}", file.display()))?;

    let (first, available) = match &source {
        Some(name) => {
            let first = stream.first_feature_index_of_source(SourceRef::Name(name))?;
            let frames = stream.feature_count_of_source(SourceRef::Name(name))?;
            (first, frames)
        }
        None => (0, total),
    };
    if start > available {
        anyhow::bail!("Start frame {} is past the last frame ({})", start, available);
    }
    let count = count.unwrap_or(available - start).min(available - start);
    info!("Dumping frames {}..{}", first + start, first + start + count);

    stream.seek_feature(first + start)?;
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut feature = Feature::default();
    for index in first + start..first + start + count {
        if !stream.read_feature(&mut feature, 1)? {
            break;
        }
        let source_index = stream.source_of_feature(index)?.unwrap_or_default();
        write!(out, "{:8} {:>12}", index, stream.source_name(source_index)?)?;
        for value in feature.as_slice() {
            write!(out, " {:12.6}", value)?;
        }
        writeln!(out)?;
    }
    out.flush()?;

    Ok(())
}
