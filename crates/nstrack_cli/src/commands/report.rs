//! Report command implementation.

use super::{open_existing_store, type_codes, CliError, OutputFormat, StoreAccess};
use nstrack_core::{BinnedSummary, TypeCode, TypeSelector};
use serde::Serialize;
use std::path::Path;

/// Report output.
#[derive(Debug, Serialize)]
pub struct ReportResult {
    /// Runs combined into the summary.
    pub runs: Vec<String>,
    /// Type codes that were counted.
    pub types: Vec<TypeCode>,
    /// Histories loaded.
    pub histories: usize,
    /// The binned series.
    pub summary: BinnedSummary,
}

/// Runs the report command.
pub fn run(
    path: &Path,
    runs: &[String],
    bins: usize,
    types: &[i32],
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let (store, _) = open_existing_store(path, StoreAccess::ReadOnly)?;
    if let Some(missing) = runs.iter().find(|run| store.document_count(run) == 0) {
        return Err(CliError::UnknownRun(missing.clone()).into());
    }

    let types = type_codes(types, &[TypeCode::NEUTRON_STAR]);
    let selector = TypeSelector::new(types.iter().copied());
    let histories = store.load(runs)?;
    let summary = BinnedSummary::from_histories(&histories, &selector, bins)?;

    let result = ReportResult {
        runs: runs.to_vec(),
        types,
        histories: histories.len(),
        summary,
    };
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => print_text_output(&result),
    }
    Ok(())
}

fn print_text_output(result: &ReportResult) {
    let types: Vec<String> = result.types.iter().map(ToString::to_string).collect();
    println!("Runs:  {}", result.runs.join(", "));
    println!("Types: {}", types.join(", "));
    println!("Histories: {}", result.histories);
    println!();
    println!(
        "{:>12} {:>12} {:>10} {:>10} {:>10}",
        "from", "to", "singles", "binaries", "escapes"
    );

    let summary = &result.summary;
    for (bin, bounds) in summary.edges.windows(2).enumerate() {
        println!(
            "{:>12.3} {:>12.3} {:>10} {:>10} {:>10}",
            bounds[0], bounds[1], summary.singles[bin], summary.binaries[bin], summary.escapes[bin]
        );
    }
}
