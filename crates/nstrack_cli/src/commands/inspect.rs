//! Inspect command implementation.

use super::{open_existing_store, OutputFormat, StoreAccess};
use nstrack_core::RunSummary;
use serde::Serialize;
use std::path::Path;

/// Store inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Store path.
    pub path: String,
    /// History log size in bytes.
    pub log_size: u64,
    /// Stored runs.
    pub runs: Vec<RunSummary>,
    /// Documents across all runs.
    pub total_documents: usize,
}

/// Runs the inspect command.
pub fn run(path: &Path, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let (store, log_size) = open_existing_store(path, StoreAccess::ReadOnly)?;
    let runs = store.runs();
    let result = InspectResult {
        path: path.display().to_string(),
        log_size,
        total_documents: runs.iter().map(|run| run.documents).sum(),
        runs,
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => print_text_output(&result),
    }
    Ok(())
}

fn print_text_output(result: &InspectResult) {
    println!("nstrack History Store");
    println!("=====================");
    println!();
    println!("Path:     {}", result.path);
    println!("Log size: {}", format_size(result.log_size));
    println!();
    println!("Runs:");
    if result.runs.is_empty() {
        println!("  (none)");
    }
    for run in &result.runs {
        println!("  {:<24} {:>8} histories", run.name, run.documents);
    }
    println!();
    println!("Total histories: {}", result.total_documents);
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} bytes")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes() {
        assert_eq!(format_size(12), "12 bytes");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }
}
