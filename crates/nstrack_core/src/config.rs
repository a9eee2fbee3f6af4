//! Pipeline configuration.

use crate::error::{CoreError, CoreResult};
use crate::types::TypeCode;
use serde::{Deserialize, Serialize};

/// Configuration for reconstructing a run from disk.
///
/// Every field has a default matching the NBODY-style layout
/// (`saveNN/sev.83_<time>`, `bev.82_<time>`, `esc.11`), so a JSON config file
/// only has to name what differs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Stars are retained if any observation has one of these types.
    pub target_types: Vec<TypeCode>,

    /// Directory-name prefix of save segments inside a run.
    pub segment_prefix: String,

    /// File-name prefix of single-star snapshots.
    pub single_prefix: String,

    /// File-name prefix of binary-star snapshots.
    pub binary_prefix: String,

    /// Name of the escape-event file inside a segment.
    pub escape_file: String,

    /// Lines skipped after the time header of a snapshot.
    pub header_lines: usize,

    /// First-column value that ends a snapshot's data rows.
    pub eof_sentinel: i64,

    /// Names given to the numeric columns after the ID and type columns of a
    /// single-star row.
    pub attribute_columns: Vec<String>,

    /// Names given to the numeric columns after the two ID and two type
    /// columns of a binary row. Both members receive these attributes.
    pub binary_attribute_columns: Vec<String>,

    /// Assemble segments on worker threads.
    pub parallel_assembly: bool,

    /// Upper bound on concurrent assembly workers.
    pub max_workers: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_types: vec![TypeCode::NEUTRON_STAR],
            segment_prefix: "save".to_string(),
            single_prefix: "sev.83_".to_string(),
            binary_prefix: "bev.82_".to_string(),
            escape_file: "esc.11".to_string(),
            header_lines: 2,
            eof_sentinel: -1000,
            attribute_columns: ["r", "mass", "log_l", "log_r", "log_teff"]
                .into_iter()
                .map(String::from)
                .collect(),
            binary_attribute_columns: ["ecc", "log_period", "semi"]
                .into_iter()
                .map(String::from)
                .collect(),
            parallel_assembly: true,
            max_workers: std::thread::available_parallelism().map_or(1, |n| n.get()),
        }
    }
}

impl PipelineConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the type codes that make a star interesting.
    #[must_use]
    pub fn target_types(mut self, types: Vec<TypeCode>) -> Self {
        self.target_types = types;
        self
    }

    /// Sets the save-segment directory prefix.
    #[must_use]
    pub fn segment_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.segment_prefix = prefix.into();
        self
    }

    /// Sets the names of the trailing attribute columns.
    #[must_use]
    pub fn attribute_columns(mut self, columns: Vec<String>) -> Self {
        self.attribute_columns = columns;
        self
    }

    /// Sets the escape file name.
    #[must_use]
    pub fn escape_file(mut self, name: impl Into<String>) -> Self {
        self.escape_file = name.into();
        self
    }

    /// Enables or disables threaded assembly.
    #[must_use]
    pub const fn parallel_assembly(mut self, value: bool) -> Self {
        self.parallel_assembly = value;
        self
    }

    /// Sets the maximum number of assembly workers.
    #[must_use]
    pub const fn max_workers(mut self, workers: usize) -> Self {
        self.max_workers = workers;
        self
    }

    /// Checks the configuration for values the pipeline cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] describing the first problem found.
    pub fn validate(&self) -> CoreResult<()> {
        if self.target_types.is_empty() {
            return Err(CoreError::invalid_config("target_types must not be empty"));
        }
        for (field, value) in [
            ("segment_prefix", &self.segment_prefix),
            ("single_prefix", &self.single_prefix),
            ("binary_prefix", &self.binary_prefix),
            ("escape_file", &self.escape_file),
        ] {
            if value.is_empty() {
                return Err(CoreError::invalid_config(format!("{field} must not be empty")));
            }
        }
        if self.single_prefix == self.binary_prefix {
            return Err(CoreError::invalid_config(
                "single_prefix and binary_prefix must differ",
            ));
        }
        if self.max_workers == 0 {
            return Err(CoreError::invalid_config("max_workers must be at least 1"));
        }
        Ok(())
    }
}
