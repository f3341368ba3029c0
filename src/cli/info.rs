use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;

use featstream::feature::ChannelLayout;
use featstream::format::SourceSpan;
use featstream::{ByteOrder, ReaderConfig, SPro4File};

#[derive(Serialize)]
struct FileInfo<'a> {
    file: String,
    format: &'static str,
    byte_order: ByteOrder,
    vect_size: usize,
    flags: String,
    layout: Option<ChannelLayout>,
    sample_rate: f32,
    feature_count: usize,
    header_length: u64,
    duration_seconds: Option<f64>,
    sources: Vec<SourceSpan<'a>>,
}

/// Display information about a feature file
pub fn run(file: PathBuf, config: &ReaderConfig, json: bool) -> Result<()> {
    let mut stream = SPro4File::with_path(&file, config)?;
    let descriptor = stream
        .descriptor()
        .with_context(|| format!("Failed to read header of {}", file.display()))?;

    let duration_seconds = (descriptor.sample_rate > 0.0)
        .then(|| descriptor.feature_count as f64 / descriptor.sample_rate as f64);
    let info = FileInfo {
        file: file.display().to_string(),
        format: "SPro4",
        byte_order: descriptor.byte_order,
        vect_size: descriptor.vect_size,
        flags: descriptor.flags.to_string(),
        layout: descriptor.flags.channel_layout(descriptor.vect_size),
        sample_rate: descriptor.sample_rate,
        feature_count: descriptor.feature_count,
        header_length: descriptor.header_length,
        duration_seconds,
        sources: descriptor.sources.iter().collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("Feature File Information");
    println!("========================");
    println!("File: {}", info.file);
    println!();

    println!("Header:");
    println!("  Format: {}", info.format);
    println!("  Byte order: {}", info.byte_order);
    println!("  Header length: {} bytes", info.header_length);
    println!("  Vector size: {}", info.vect_size);
    println!("  Flags: {}", info.flags);
    match &info.layout {
        Some(layout) => println!(
            "  Layout: {} static{}, {} delta, {} acceleration",
            layout.coefficients,
            if layout.static_energy { " + energy" } else { "" },
            layout.delta,
            layout.acceleration
        ),
        None => println!("  Layout: flags do not match the vector size"),
    }
    println!("  Frame rate: {} Hz", info.sample_rate);
    println!("  Frames: {}", info.feature_count);
    if let Some(seconds) = info.duration_seconds {
        println!("  Duration: {:.2} s", seconds);
    }
    println!();

    println!("Sources:");
    for (i, span) in info.sources.iter().enumerate() {
        println!(
            "  {:3}. {} (frames {}..{}, {} frames)",
            i,
            span.name,
            span.first,
            span.end(),
            span.count
        );
    }

    Ok(())
}
