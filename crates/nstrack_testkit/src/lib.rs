//! # nstrack Testkit
//!
//! Test utilities for nstrack.
//!
//! This crate provides:
//! - On-disk run fixtures in the `saveNN/sev.83_<time>` layout
//! - Property-based generators for histories and restarted runs
//! - A store harness that checks loads against what was stored
//!
//! ## Usage
//!
//! ```rust,no_run
//! use nstrack_testkit::prelude::*;
//! use nstrack_core::{reconstruct_run, PipelineConfig};
//!
//! let run = RunFixture::new("N10K");
//! run.segment("save01")
//!     .singles(0.0, &[(1, 13), (2, 1)])
//!     .singles(1.0, &[(1, 13), (2, 13)]);
//!
//! let reconstruction = reconstruct_run(run.path(), &PipelineConfig::default()).unwrap();
//! assert_eq!(reconstruction.run.len(), 2);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod integration;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::integration::*;
}

pub use fixtures::*;
pub use generators::*;
pub use integration::*;
