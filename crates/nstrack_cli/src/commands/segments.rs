//! Segments command implementation.

use super::load_config;
use nstrack_core::{discover_segments, snapshot_paths, SevDecoder};
use std::path::Path;

/// Runs the segments command.
pub fn run(run_dir: &Path, config: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config)?;
    let decoder = SevDecoder::from_config(&config);
    let segments = discover_segments(run_dir, &config.segment_prefix)?;

    println!("Run: {}", run_dir.display());
    println!();
    for segment in &segments {
        let snapshots = snapshot_paths(&segment.path, &decoder)?;
        let escapes = segment.path.join(&config.escape_file).is_file();
        println!(
            "  {:<12} {:>6} snapshots{}",
            segment.name,
            snapshots.len(),
            if escapes { ", escapes" } else { "" }
        );
    }
    println!();
    println!("{} segments", segments.len());

    Ok(())
}
