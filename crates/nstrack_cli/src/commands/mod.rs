//! CLI command implementations.

pub mod clear;
pub mod ingest;
pub mod inspect;
pub mod report;
pub mod segments;

use nstrack_core::{HistoryStore, PipelineConfig, TypeCode, LOG_FILE_NAME};
use nstrack_storage::{FileBackend, StorageBackend};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised by the CLI itself rather than the core crate.
#[derive(Debug, Error)]
pub enum CliError {
    /// A command needs `--path` and none was given.
    #[error("store path required for {0}")]
    StorePathRequired(&'static str),

    /// `--path` does not hold a history store.
    #[error("no history store found at {0:?}")]
    NoStore(PathBuf),

    /// `--format` named an unknown format.
    #[error("unknown output format {0:?} (expected text or json)")]
    UnknownFormat(String),

    /// A named run is not in the store.
    #[error("run {0:?} is not stored")]
    UnknownRun(String),
}

/// How a command prints its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text.
    Text,
    /// Pretty-printed JSON on stdout.
    Json,
}

impl OutputFormat {
    /// Parses a `--format` value.
    pub fn parse(value: &str) -> Result<Self, CliError> {
        match value {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(CliError::UnknownFormat(other.to_string())),
        }
    }
}

/// Reads a JSON pipeline configuration, or the defaults when `path` is `None`.
pub fn load_config(path: Option<&Path>) -> Result<PipelineConfig, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(PipelineConfig::default());
    };
    let data = std::fs::read_to_string(path)?;
    let config: PipelineConfig = serde_json::from_str(&data)?;
    config.validate()?;
    Ok(config)
}

/// Converts `--type` values, keeping `fallback` when none were given.
pub fn type_codes(values: &[i32], fallback: &[TypeCode]) -> Vec<TypeCode> {
    if values.is_empty() {
        fallback.to_vec()
    } else {
        values.iter().copied().map(TypeCode::new).collect()
    }
}

/// How a command uses the store it opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreAccess {
    /// The log is never written, not even to drop a torn tail.
    ReadOnly,
    /// The command appends records.
    ReadWrite,
}

/// Opens an existing store without creating one.
///
/// Returns the store and the size of its log in bytes.
pub fn open_existing_store(
    path: &Path,
    access: StoreAccess,
) -> Result<(HistoryStore, u64), Box<dyn std::error::Error>> {
    let log = path.join(LOG_FILE_NAME);
    if !log.is_file() {
        return Err(CliError::NoStore(path.to_path_buf()).into());
    }
    let backend = Box::new(FileBackend::open(&log)?);
    let size = backend.size()?;
    let store = match access {
        StoreAccess::ReadOnly => HistoryStore::open_read_only(backend)?,
        StoreAccess::ReadWrite => HistoryStore::open(backend)?,
    };
    Ok((store, size))
}
