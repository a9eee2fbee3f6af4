//! On-disk layout of a run.
//!
//! ```text
//! N10K_r26_Z02_1/          <- run
//!   save01/                <- segment
//!     sev.83_0.000         <- snapshots
//!     bev.82_0.000
//!     esc.11               <- escapes
//!   save02/
//!     ...
//! ```
//!
//! Segments are merged in the order returned here, so the order must be
//! reproducible: ascending numeric suffix, with non-numeric suffixes last.

use crate::error::{CoreError, CoreResult};
use crate::snapshot::SnapshotDecoder;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};

/// A save-segment directory of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentDir {
    /// Directory name, e.g. `save03`.
    pub name: String,
    /// Full path of the directory.
    pub path: PathBuf,
}

/// Lists the segment directories of `run_dir` in merge order.
///
/// # Errors
///
/// Returns [`CoreError::RunNotFound`] if `run_dir` is not a directory and
/// [`CoreError::NoSegments`] if it holds no directory starting with `prefix`.
pub fn discover_segments(run_dir: &Path, prefix: &str) -> CoreResult<Vec<SegmentDir>> {
    if !run_dir.is_dir() {
        return Err(CoreError::RunNotFound {
            path: run_dir.to_path_buf(),
        });
    }

    let mut segments = Vec::new();
    for entry in std::fs::read_dir(run_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if name.starts_with(prefix) {
            segments.push(SegmentDir {
                path: entry.path(),
                name,
            });
        }
    }

    if segments.is_empty() {
        return Err(CoreError::NoSegments {
            path: run_dir.to_path_buf(),
            prefix: prefix.to_string(),
        });
    }

    segments.sort_by(|a, b| compare_segment_names(&a.name, &b.name, prefix));
    Ok(segments)
}

/// Lists the snapshot files of a segment in time order.
///
/// Files are ordered by the numeric suffix after their last `_`, then by
/// name, so a single and a binary catalog of the same instant keep a fixed
/// relative order.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be listed.
pub fn snapshot_paths(segment_dir: &Path, decoder: &dyn SnapshotDecoder) -> CoreResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(segment_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if decoder.accepts(&name) {
            files.push((snapshot_time(&name), name, entry.path()));
        }
    }

    files.sort_by(|(time_a, name_a, _), (time_b, name_b, _)| {
        compare_optional(time_a, time_b, f64::total_cmp).then_with(|| name_a.cmp(name_b))
    });
    Ok(files.into_iter().map(|(_, _, path)| path).collect())
}

fn compare_segment_names(a: &str, b: &str, prefix: &str) -> Ordering {
    let number = |name: &str| name.strip_prefix(prefix).and_then(|s| s.parse::<u64>().ok());
    compare_optional(&number(a), &number(b), u64::cmp).then_with(|| a.cmp(b))
}

/// `Some` sorts before `None`.
fn compare_optional<T>(a: &Option<T>, b: &Option<T>, cmp: impl Fn(&T, &T) -> Ordering) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => cmp(a, b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn snapshot_time(file_name: &str) -> Option<f64> {
    file_name
        .rsplit_once('_')
        .and_then(|(_, suffix)| suffix.parse::<f64>().ok())
        .filter(|time| time.is_finite())
}
