//! Persistent store of reconstructed star histories.
//!
//! The store is an append-only log of framed records (see [`record`]) on a
//! [`StorageBackend`]. Each stored history is one document record tagged
//! with its run name. Clearing a run appends a tombstone instead of
//! rewriting the log.
//!
//! On open the log is scanned once to build an in-memory index of where each
//! run's documents live. Records cut short by an interrupted write are
//! dropped from the end of the log. A record whose checksum does not match,
//! or whose length runs past a later valid record, is an error and the log
//! is left as it is.
//!
//! Storing is not idempotent: ingesting the same run twice keeps both copies.
//! Callers that want replacement call [`HistoryStore::clear`] first.

mod record;

use crate::error::{CoreError, CoreResult};
use crate::types::StarHistory;
use nstrack_codec::{Decode, Encode};
use nstrack_storage::{FileBackend, InMemoryBackend, StorageBackend};
use parking_lot::RwLock;
use record::{LogRecord, RecordKind};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// File name of the history log inside a store directory.
pub const LOG_FILE_NAME: &str = "histories.log";

/// A stored run and how many documents it holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Run name.
    pub name: String,
    /// Live documents.
    pub documents: usize,
}

/// Location of one document payload in the log.
#[derive(Debug, Clone, Copy)]
struct DocumentRef {
    offset: u64,
    len: usize,
}

struct StoreInner {
    backend: Box<dyn StorageBackend>,
    runs: BTreeMap<String, Vec<DocumentRef>>,
    read_only: bool,
}

/// Index built from the records of a log.
struct LogScan {
    runs: BTreeMap<String, Vec<DocumentRef>>,
    /// Length of the prefix made of complete records.
    valid: usize,
    records: usize,
}

/// Replays every complete record of `bytes`.
///
/// An incomplete record ends the scan only if no valid record follows it;
/// otherwise its length field was damaged and the log is corrupt.
fn scan_log(bytes: &[u8]) -> CoreResult<LogScan> {
    let mut runs: BTreeMap<String, Vec<DocumentRef>> = BTreeMap::new();
    let mut cursor = 0usize;
    let mut records = 0usize;

    while cursor < bytes.len() {
        let offset = cursor as u64;
        let Some((record, size)) = LogRecord::decode(&bytes[cursor..], offset)? else {
            if let Some(next) = record::next_valid_record(bytes, cursor + 1) {
                return Err(CoreError::store_corruption(
                    offset,
                    format!("record length overruns the log but a valid record starts at {next}"),
                ));
            }
            break;
        };
        match record.kind {
            RecordKind::Document => {
                let doc = DocumentRef {
                    offset: offset + record.payload_offset() as u64,
                    len: record.payload.len(),
                };
                runs.entry(record.run).or_default().push(doc);
            }
            RecordKind::Tombstone => {
                runs.remove(&record.run);
            }
        }
        cursor += size;
        records += 1;
    }

    Ok(LogScan {
        runs,
        valid: cursor,
        records,
    })
}

/// Append-only store of star histories grouped by run.
pub struct HistoryStore {
    inner: RwLock<StoreInner>,
}

impl HistoryStore {
    /// Opens a store over `backend`, scanning any existing records.
    ///
    /// A record cut short at the end of the log is truncated away.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::ChecksumMismatch`] or
    /// [`crate::CoreError::StoreCorruption`] for a damaged record, or a
    /// storage error. A damaged log is left untouched.
    pub fn open(mut backend: Box<dyn StorageBackend>) -> CoreResult<Self> {
        let bytes = backend.read_all()?;
        let scan = scan_log(&bytes)?;
        if scan.valid < bytes.len() {
            warn!(
                valid = scan.valid,
                size = bytes.len(),
                "dropping incomplete record at end of history log"
            );
            backend.truncate(scan.valid as u64)?;
        }
        Ok(Self::from_scan(backend, scan, false))
    }

    /// Opens a store over `backend` without ever writing to it.
    ///
    /// An incomplete trailing record is skipped but left in place, and
    /// [`Self::store`] and [`Self::clear`] fail with
    /// [`crate::CoreError::ReadOnlyStore`].
    ///
    /// # Errors
    ///
    /// See [`Self::open`].
    pub fn open_read_only(backend: Box<dyn StorageBackend>) -> CoreResult<Self> {
        let bytes = backend.read_all()?;
        let scan = scan_log(&bytes)?;
        if scan.valid < bytes.len() {
            warn!(
                valid = scan.valid,
                size = bytes.len(),
                "ignoring incomplete record at end of history log"
            );
        }
        Ok(Self::from_scan(backend, scan, true))
    }

    fn from_scan(backend: Box<dyn StorageBackend>, scan: LogScan, read_only: bool) -> Self {
        debug!(records = scan.records, runs = scan.runs.len(), read_only, "opened history store");
        Self {
            inner: RwLock::new(StoreInner {
                backend,
                runs: scan.runs,
                read_only,
            }),
        }
    }

    /// Opens or creates the store in directory `dir`.
    ///
    /// # Errors
    ///
    /// Fails if the log cannot be opened or locked, or see [`Self::open`].
    pub fn open_dir(dir: &Path) -> CoreResult<Self> {
        let backend = FileBackend::open_with_create_dirs(&dir.join(LOG_FILE_NAME))?;
        Self::open(Box::new(backend))
    }

    /// Creates an empty store that lives only in memory.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            inner: RwLock::new(StoreInner {
                backend: Box::new(InMemoryBackend::new()),
                runs: BTreeMap::new(),
                read_only: false,
            }),
        }
    }

    /// Appends one document per history under `run`.
    ///
    /// Returns the number of documents written. Histories already stored for
    /// `run` are kept, so calling this twice duplicates them.
    ///
    /// # Errors
    ///
    /// Fails if a history cannot be encoded or the write fails. Nothing is
    /// appended in the encoding case.
    pub fn store(&self, run: &str, histories: &[StarHistory]) -> CoreResult<usize> {
        let mut buf = Vec::new();
        let mut framed = Vec::with_capacity(histories.len());
        for history in histories {
            let record = LogRecord::document(run, history.encode()?);
            let start = buf.len();
            record.encode_into(&mut buf)?;
            framed.push((start + record.payload_offset(), record.payload.len()));
        }

        let mut inner = self.inner.write();
        if inner.read_only {
            return Err(CoreError::ReadOnlyStore);
        }
        let existing = inner.runs.get(run).map_or(0, Vec::len);
        if existing > 0 {
            warn!(run, existing, adding = histories.len(), "run already stored, documents will be duplicated");
        }
        if framed.is_empty() {
            return Ok(0);
        }

        let base = inner.backend.append(&buf)?;
        inner.backend.flush()?;

        let docs = inner.runs.entry(run.to_string()).or_default();
        docs.extend(framed.into_iter().map(|(offset, len)| DocumentRef {
            offset: base + offset as u64,
            len,
        }));

        info!(run, documents = histories.len(), "stored histories");
        Ok(histories.len())
    }

    /// Drops every document of `run`. Returns how many were dropped.
    ///
    /// # Errors
    ///
    /// Fails if the tombstone cannot be written.
    pub fn clear(&self, run: &str) -> CoreResult<usize> {
        let mut inner = self.inner.write();
        if inner.read_only {
            return Err(CoreError::ReadOnlyStore);
        }
        let Some(existing) = inner.runs.get(run).map(Vec::len) else {
            debug!(run, "nothing to clear");
            return Ok(0);
        };

        let mut buf = Vec::new();
        LogRecord::tombstone(run).encode_into(&mut buf)?;
        inner.backend.append(&buf)?;
        inner.backend.flush()?;
        inner.runs.remove(run);

        info!(run, dropped = existing, "cleared run");
        Ok(existing)
    }

    /// Lists stored runs by name.
    #[must_use]
    pub fn runs(&self) -> Vec<RunSummary> {
        self.inner
            .read()
            .runs
            .iter()
            .map(|(name, docs)| RunSummary {
                name: name.clone(),
                documents: docs.len(),
            })
            .collect()
    }

    /// Number of documents stored for `run`.
    #[must_use]
    pub fn document_count(&self, run: &str) -> usize {
        self.inner.read().runs.get(run).map_or(0, Vec::len)
    }

    /// Loads the histories of `runs` in the order they were stored.
    ///
    /// Unknown run names contribute nothing.
    ///
    /// # Errors
    ///
    /// Fails if a document cannot be read or decoded.
    pub fn load<S: AsRef<str>>(&self, runs: &[S]) -> CoreResult<Vec<StarHistory>> {
        let inner = self.inner.read();
        let mut docs: Vec<DocumentRef> = runs
            .iter()
            .filter_map(|run| inner.runs.get(run.as_ref()))
            .flatten()
            .copied()
            .collect();
        docs.sort_by_key(|doc| doc.offset);
        docs.dedup_by_key(|doc| doc.offset);

        docs.iter()
            .map(|doc| -> CoreResult<StarHistory> {
                let bytes = inner.backend.read_at(doc.offset, doc.len)?;
                Ok(StarHistory::decode(&bytes)?)
            })
            .collect()
    }

    /// Makes all written records durable.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the sync fails.
    pub fn sync(&self) -> CoreResult<()> {
        self.inner.write().backend.sync()?;
        Ok(())
    }
}
