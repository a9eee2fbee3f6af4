//! Error types for nstrack core.

use crate::types::StarId;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur while reconstructing, storing or reporting runs.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] nstrack_storage::StorageError),

    /// CBOR codec error.
    #[error("codec error: {0}")]
    Codec(#[from] nstrack_codec::CodecError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A snapshot file lacks the leading time header.
    #[error("snapshot {path:?} has no time header: {message}")]
    MissingHeader {
        /// The snapshot file.
        path: PathBuf,
        /// What was wrong with the first line.
        message: String,
    },

    /// A snapshot file has no content at all.
    #[error("snapshot {path:?} is empty")]
    EmptyFile {
        /// The snapshot file.
        path: PathBuf,
    },

    /// A segment handed to the merger breaks an assembly guarantee.
    #[error("contract violation in segment {segment}: {message}")]
    ContractViolation {
        /// The offending segment.
        segment: String,
        /// Description of the violation.
        message: String,
    },

    /// Segments were supplied out of chronological order.
    #[error(
        "segment {segment} starts at {start} before previous segment {previous} at {previous_start}"
    )]
    OutOfOrderSegments {
        /// The previously merged segment.
        previous: String,
        /// Its start time.
        previous_start: f64,
        /// The segment that went backwards.
        segment: String,
        /// Its start time.
        start: f64,
    },

    /// The run directory does not exist.
    #[error("run directory not found: {path:?}")]
    RunNotFound {
        /// The missing directory.
        path: PathBuf,
    },

    /// The run directory holds no save segment.
    #[error("no segments matching {prefix:?} in {path:?}")]
    NoSegments {
        /// The run directory.
        path: PathBuf,
        /// Segment directory prefix that was searched for.
        prefix: String,
    },

    /// A record in the history log could not be parsed.
    #[error("history store corrupted at offset {offset}: {message}")]
    StoreCorruption {
        /// Byte offset of the bad record.
        offset: u64,
        /// Description of the corruption.
        message: String,
    },

    /// Checksum mismatch in the history log.
    #[error("checksum mismatch: expected {expected:08x}, got {actual:08x}")]
    ChecksumMismatch {
        /// Stored checksum.
        expected: u32,
        /// Computed checksum.
        actual: u32,
    },

    /// A record is too large for the history log framing.
    #[error("{what} of {len} bytes exceeds the log limit of {limit} bytes")]
    RecordTooLarge {
        /// Which part of the record overflowed.
        what: &'static str,
        /// Its size.
        len: usize,
        /// The largest size the framing allows.
        limit: usize,
    },

    /// A write was attempted on a store opened read-only.
    #[error("history store is open read-only")]
    ReadOnlyStore,

    /// Configuration rejected by validation.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Why the configuration is invalid.
        message: String,
    },

    /// An assembly worker thread panicked.
    #[error("assembly of segment {segment} panicked")]
    WorkerPanicked {
        /// The segment being assembled.
        segment: String,
    },
}

impl CoreError {
    /// Creates a missing header error.
    pub fn missing_header(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::MissingHeader {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a contract violation for an empty history.
    pub fn empty_history(segment: impl Into<String>, id: StarId) -> Self {
        Self::ContractViolation {
            segment: segment.into(),
            message: format!("{id} has no observations"),
        }
    }

    /// Creates a contract violation error.
    pub fn contract_violation(segment: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ContractViolation {
            segment: segment.into(),
            message: message.into(),
        }
    }

    /// Creates a store corruption error.
    pub fn store_corruption(offset: u64, message: impl Into<String>) -> Self {
        Self::StoreCorruption {
            offset,
            message: message.into(),
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}
