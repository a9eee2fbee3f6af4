//! Clear command implementation.

use super::{open_existing_store, CliError, StoreAccess};
use std::path::Path;

/// Runs the clear command.
pub fn run(path: &Path, run: &str) -> Result<(), Box<dyn std::error::Error>> {
    let (store, _) = open_existing_store(path, StoreAccess::ReadWrite)?;
    if store.document_count(run) == 0 {
        return Err(CliError::UnknownRun(run.to_string()).into());
    }

    let dropped = store.clear(run)?;
    store.sync()?;
    println!("✓ Cleared {run} ({dropped} histories)");
    Ok(())
}
