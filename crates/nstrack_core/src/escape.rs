//! Escape events.
//!
//! Each save segment may carry an escape file listing stars that left the
//! cluster during that segment, one per row:
//!
//! ```text
//! # time   id    type
//!  812.5   4411  13
//! ```

use crate::error::CoreResult;
use crate::snapshot::parse_float;
use crate::types::{EscapeEvent, StarId, TypeCode};
use std::io::ErrorKind;
use std::path::Path;
use tracing::warn;

/// Source of escape events for a segment.
pub trait EscapeSource: Send + Sync {
    /// Loads the escape events recorded in `segment_dir`.
    ///
    /// An absent or empty source yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns an error only if the source exists but cannot be read.
    fn load_escapes(&self, segment_dir: &Path) -> CoreResult<Vec<EscapeEvent>>;
}

/// Reads escapes from a whitespace-column file inside the segment directory.
#[derive(Debug, Clone)]
pub struct EscapeFile {
    file_name: String,
}

impl EscapeFile {
    /// Reads `<segment_dir>/<file_name>`.
    #[must_use]
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
        }
    }

    /// The file name looked up in each segment.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

impl Default for EscapeFile {
    fn default() -> Self {
        Self::new("esc.11")
    }
}

impl EscapeSource for EscapeFile {
    fn load_escapes(&self, segment_dir: &Path) -> CoreResult<Vec<EscapeEvent>> {
        let path = segment_dir.join(&self.file_name);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut events = Vec::new();
        for (index, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match parse_escape_row(line) {
                Some(event) => events.push(event),
                None => warn!(path = ?path, line = index + 1, "skipping malformed escape row"),
            }
        }
        Ok(events)
    }
}

/// A fixed list of events, for callers that already hold them in memory.
impl EscapeSource for Vec<EscapeEvent> {
    fn load_escapes(&self, _segment_dir: &Path) -> CoreResult<Vec<EscapeEvent>> {
        Ok(self.clone())
    }
}

fn parse_escape_row(line: &str) -> Option<EscapeEvent> {
    let mut fields = line.split_whitespace();
    let time = parse_float(fields.next()?).filter(|t| t.is_finite())?;
    let id = fields.next()?.parse().ok()?;
    let type_code = fields.next()?.parse().ok()?;
    Some(EscapeEvent {
        id: StarId::new(id),
        time,
        type_code: TypeCode::new(type_code),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_is_empty() {
        let dir = tempdir().unwrap();
        assert!(EscapeFile::default().load_escapes(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn empty_file_is_empty() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("esc.11"), "").unwrap();
        assert!(EscapeFile::default().load_escapes(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn reads_rows_and_skips_noise() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("esc.11"),
            "# time id type\n 812.5 4411 13\n\nbroken row\n 900.0D0 12 1 extra\n",
        )
        .unwrap();

        let events = EscapeFile::default().load_escapes(dir.path()).unwrap();
        assert_eq!(
            events,
            vec![
                EscapeEvent {
                    id: StarId::new(4411),
                    time: 812.5,
                    type_code: TypeCode::NEUTRON_STAR,
                },
                EscapeEvent {
                    id: StarId::new(12),
                    time: 900.0,
                    type_code: TypeCode::new(1),
                },
            ]
        );
    }

    #[test]
    fn custom_file_name() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("escapes.dat"), "1.0 2 13\n").unwrap();
        let source = EscapeFile::new("escapes.dat");
        assert_eq!(source.file_name(), "escapes.dat");
        assert_eq!(source.load_escapes(dir.path()).unwrap().len(), 1);
    }
}
