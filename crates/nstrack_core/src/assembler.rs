//! Segment assembly.
//!
//! Turns the snapshot files of one save segment into one [`StarHistory`] per
//! retained star.

use crate::error::CoreResult;
use crate::escape::EscapeSource;
use crate::layout::snapshot_paths;
use crate::selector::Selector;
use crate::snapshot::{CatalogKind, Snapshot, SnapshotDecoder, StarRecord};
use crate::types::{EscapeEvent, Observation, Segment, StarHistory, StarId};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Counters collected while assembling one segment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssemblyStats {
    /// Snapshot files decoded.
    pub files_read: usize,
    /// Snapshot files skipped (missing header, empty, unreadable).
    pub files_skipped: usize,
    /// Rows skipped as malformed.
    pub records_skipped: usize,
    /// Distinct stars observed.
    pub stars_seen: usize,
    /// Stars kept by the selector.
    pub stars_retained: usize,
    /// Escape times attached to retained stars.
    pub escapes_attached: usize,
}

/// Builds [`Segment`]s from snapshot files.
pub struct SegmentAssembler<'a> {
    decoder: &'a dyn SnapshotDecoder,
    escapes: &'a dyn EscapeSource,
}

impl<'a> SegmentAssembler<'a> {
    /// Creates an assembler over a decoder and an escape source.
    pub fn new(decoder: &'a dyn SnapshotDecoder, escapes: &'a dyn EscapeSource) -> Self {
        Self { decoder, escapes }
    }

    /// Assembles the segment stored in `segment_dir`.
    ///
    /// Snapshot files are discovered with [`snapshot_paths`] and escapes are
    /// read from the same directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be listed or the escape source
    /// exists but cannot be read.
    pub fn assemble_dir(
        &self,
        name: &str,
        segment_dir: &Path,
        selector: &dyn Selector,
    ) -> CoreResult<(Segment, AssemblyStats)> {
        let paths = snapshot_paths(segment_dir, self.decoder)?;
        let escapes = self.escapes.load_escapes(segment_dir)?;
        Ok(self.assemble(name, &paths, selector, &escapes))
    }

    /// Assembles a segment from explicit snapshot paths and escape events.
    ///
    /// Files that cannot be decoded and rows that cannot be parsed are logged
    /// and skipped; assembly itself never fails.
    pub fn assemble(
        &self,
        name: &str,
        paths: &[PathBuf],
        selector: &dyn Selector,
        escapes: &[EscapeEvent],
    ) -> (Segment, AssemblyStats) {
        let mut stats = AssemblyStats::default();
        let mut builder = SegmentBuilder::default();

        for path in paths {
            match self.decoder.decode(path) {
                Ok(snapshot) => {
                    stats.files_read += 1;
                    stats.records_skipped += builder.push_snapshot(path, snapshot);
                }
                Err(err) => {
                    stats.files_skipped += 1;
                    warn!(segment = name, path = ?path, error = %err, "skipping snapshot");
                }
            }
        }

        stats.stars_seen = builder.histories.len();
        let start_time = builder.start_time;
        let mut histories = builder.finish(selector);
        stats.stars_retained = histories.len();
        stats.escapes_attached = attach_escapes(&mut histories, escapes);

        info!(
            segment = name,
            files = stats.files_read,
            skipped_files = stats.files_skipped,
            skipped_rows = stats.records_skipped,
            seen = stats.stars_seen,
            retained = stats.stars_retained,
            escapes = stats.escapes_attached,
            "assembled segment"
        );

        (Segment::new(name, start_time, histories), stats)
    }
}

#[derive(Default)]
struct SegmentBuilder {
    histories: HashMap<StarId, StarHistory>,
    start_time: Option<f64>,
}

impl SegmentBuilder {
    /// Adds every valid row of a snapshot; returns the number of rows skipped.
    fn push_snapshot(&mut self, path: &Path, snapshot: Snapshot) -> usize {
        self.start_time = Some(match self.start_time {
            Some(start) => start.min(snapshot.time),
            None => snapshot.time,
        });

        let binary = snapshot.kind == CatalogKind::Binary;
        let time = snapshot.time;
        let mut skipped = 0;

        for record in snapshot.records {
            match record {
                Ok(record) => self.push(time, binary, record),
                Err(malformed) => {
                    skipped += 1;
                    warn!(path = ?path, line = malformed.line, reason = %malformed.message, "skipping malformed record");
                }
            }
        }
        skipped
    }

    fn push(&mut self, time: f64, binary: bool, record: StarRecord) {
        let observation = Observation {
            time,
            type_code: record.type_code,
            attributes: record.attributes,
            binary,
            companion: record.companion,
        };
        match self.histories.get_mut(&record.id) {
            Some(history) => history.observations.push(observation),
            None => {
                self.histories
                    .insert(record.id, StarHistory::new(record.id, observation));
            }
        }
    }

    /// Applies the selector, sorts each history by time, orders by ID.
    fn finish(self, selector: &dyn Selector) -> Vec<StarHistory> {
        let mut retained: Vec<StarHistory> = self
            .histories
            .into_values()
            .filter(|history| selector.retains(history))
            .collect();

        for history in &mut retained {
            // stable: same-time rows keep decode order
            history
                .observations
                .sort_by(|a, b| a.time.total_cmp(&b.time));
        }
        retained.sort_by_key(|history| history.id);
        retained
    }
}

/// Sets `escape` on retained stars. The first event per ID wins.
fn attach_escapes(histories: &mut [StarHistory], escapes: &[EscapeEvent]) -> usize {
    let mut first_by_id: HashMap<StarId, f64> = HashMap::new();
    for event in escapes {
        match first_by_id.entry(event.id) {
            Entry::Vacant(slot) => {
                slot.insert(event.time);
            }
            Entry::Occupied(_) => debug!(id = %event.id, "ignoring repeated escape event"),
        }
    }

    let mut attached = 0;
    for history in histories.iter_mut() {
        if let Some(&time) = first_by_id.get(&history.id) {
            history.escape = Some(time);
            attached += 1;
        }
    }
    attached
}
