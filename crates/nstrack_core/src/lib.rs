//! # nstrack Core
//!
//! Reconstruction of per-star histories from a star-cluster simulation that
//! was run as a sequence of checkpointed, restarted save segments.
//!
//! This crate provides:
//! - Snapshot decoding for the `sev`/`bev` text catalogs
//! - Segment assembly with type selection and escape attachment
//! - Run merging with truncate-and-replace overlap resolution
//! - A parallel reconstruction pipeline over a run directory
//! - An append-only history store and binned summaries for reporting
//!
//! ## Example
//!
//! ```rust
//! use nstrack_core::{merge, Observation, Segment, StarHistory, StarId, TypeCode};
//!
//! let ns = TypeCode::NEUTRON_STAR;
//! let history = |times: &[f64]| {
//!     StarHistory::from_observations(
//!         StarId::new(1),
//!         times.iter().map(|&t| Observation::single(t, ns)).collect(),
//!     )
//! };
//!
//! let run = merge([
//!     Segment::new("save01", Some(1.0), vec![history(&[1.0, 2.0, 3.0, 4.0, 5.0])]),
//!     Segment::new("save02", Some(3.0), vec![history(&[3.0, 3.5, 6.0])]),
//! ])
//! .unwrap();
//!
//! let times: Vec<f64> = run.get(StarId::new(1)).unwrap().times().collect();
//! assert_eq!(times, vec![1.0, 2.0, 3.0, 3.5, 6.0]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod assembler;
mod config;
mod error;
mod escape;
mod layout;
mod merger;
mod pipeline;
mod report;
mod selector;
mod snapshot;
mod store;
mod types;

pub use assembler::{AssemblyStats, SegmentAssembler};
pub use config::PipelineConfig;
pub use error::{CoreError, CoreResult};
pub use escape::{EscapeFile, EscapeSource};
pub use layout::{discover_segments, snapshot_paths, SegmentDir};
pub use merger::{merge, RunMerger};
pub use pipeline::{reconstruct_run, reconstruct_with, Reconstruction, SegmentSummary};
pub use report::{equal_width_edges, BinnedSummary, Histogram};
pub use selector::{Selector, TypeSelector};
pub use snapshot::{CatalogKind, MalformedRecord, SevDecoder, Snapshot, SnapshotDecoder, StarRecord};
pub use store::{HistoryStore, RunSummary, LOG_FILE_NAME};
pub use types::{Companion, EscapeEvent, Observation, RunHistory, Segment, StarHistory, StarId, TypeCode};

/// Crate version, as reported by `nstrack version`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
