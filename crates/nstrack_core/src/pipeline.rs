//! End-to-end reconstruction of a run directory.
//!
//! Segments have no dependency on each other while they are assembled, so
//! they are assembled on scoped worker threads. Every worker is joined before
//! merging starts, and merging consumes the finished segments strictly in
//! run order.

use crate::assembler::{AssemblyStats, SegmentAssembler};
use crate::config::PipelineConfig;
use crate::error::{CoreError, CoreResult};
use crate::escape::{EscapeFile, EscapeSource};
use crate::layout::{discover_segments, SegmentDir};
use crate::merger::RunMerger;
use crate::selector::{Selector, TypeSelector};
use crate::snapshot::{SevDecoder, SnapshotDecoder};
use crate::types::{RunHistory, Segment};
use std::path::Path;
use std::thread;
use tracing::info;

/// What happened to one segment of a reconstructed run.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentSummary {
    /// Segment name.
    pub name: String,
    /// Earliest snapshot time of the segment.
    pub start_time: Option<f64>,
    /// Assembly counters.
    pub stats: AssemblyStats,
}

/// A merged run together with per-segment diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconstruction {
    /// The merged histories.
    pub run: RunHistory,
    /// One entry per segment, in merge order.
    pub segments: Vec<SegmentSummary>,
}

/// Reconstructs the run in `run_dir` with the decoders and selector described
/// by `config`.
///
/// # Errors
///
/// Fails if the configuration is invalid, the run directory is missing or has
/// no segments, a segment directory cannot be listed, or the merge rejects a
/// segment.
pub fn reconstruct_run(run_dir: &Path, config: &PipelineConfig) -> CoreResult<Reconstruction> {
    config.validate()?;
    let decoder = SevDecoder::from_config(config);
    let escapes = EscapeFile::new(config.escape_file.clone());
    let selector = TypeSelector::new(config.target_types.iter().copied());
    reconstruct_with(run_dir, config, &decoder, &escapes, &selector)
}

/// Like [`reconstruct_run`] with caller-supplied collaborators.
///
/// # Errors
///
/// See [`reconstruct_run`].
pub fn reconstruct_with(
    run_dir: &Path,
    config: &PipelineConfig,
    decoder: &dyn SnapshotDecoder,
    escapes: &dyn EscapeSource,
    selector: &dyn Selector,
) -> CoreResult<Reconstruction> {
    let dirs = discover_segments(run_dir, &config.segment_prefix)?;
    info!(run = ?run_dir, segments = dirs.len(), parallel = config.parallel_assembly, "reconstructing run");

    let assembler = SegmentAssembler::new(decoder, escapes);
    let assembled = if config.parallel_assembly && dirs.len() > 1 {
        assemble_parallel(&assembler, &dirs, selector, config.max_workers)?
    } else {
        dirs.iter()
            .map(|dir| assembler.assemble_dir(&dir.name, &dir.path, selector))
            .collect::<CoreResult<Vec<_>>>()?
    };

    let mut merger = RunMerger::new();
    let mut segments = Vec::with_capacity(assembled.len());
    for (segment, stats) in assembled {
        segments.push(SegmentSummary {
            name: segment.name.clone(),
            start_time: segment.start_time,
            stats,
        });
        merger.apply(segment)?;
    }

    let run = merger.finish();
    info!(run = ?run_dir, stars = run.len(), "run reconstructed");
    Ok(Reconstruction { run, segments })
}

/// Assembles `dirs` in batches of at most `max_workers` threads.
///
/// Results come back in the order of `dirs` regardless of which worker
/// finishes first.
fn assemble_parallel(
    assembler: &SegmentAssembler<'_>,
    dirs: &[SegmentDir],
    selector: &dyn Selector,
    max_workers: usize,
) -> CoreResult<Vec<(Segment, AssemblyStats)>> {
    let mut assembled = Vec::with_capacity(dirs.len());

    for batch in dirs.chunks(max_workers.max(1)) {
        let results: Vec<CoreResult<(Segment, AssemblyStats)>> = thread::scope(|scope| {
            let handles: Vec<_> = batch
                .iter()
                .map(|dir| {
                    scope.spawn(move || assembler.assemble_dir(&dir.name, &dir.path, selector))
                })
                .collect();

            handles
                .into_iter()
                .zip(batch)
                .map(|(handle, dir)| {
                    handle.join().unwrap_or_else(|_| {
                        Err(CoreError::WorkerPanicked {
                            segment: dir.name.clone(),
                        })
                    })
                })
                .collect()
        });

        for result in results {
            assembled.push(result?);
        }
    }

    Ok(assembled)
}
