//! On-disk run fixtures.
//!
//! Writes run directories in the layout the pipeline reads, so tests can
//! describe a run in a few lines instead of hand-writing snapshot files.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A run directory inside a temporary directory.
pub struct RunFixture {
    run_dir: PathBuf,
    _temp_dir: TempDir,
}

impl RunFixture {
    /// Creates an empty run directory called `name`.
    pub fn new(name: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let run_dir = temp_dir.path().join(name);
        std::fs::create_dir_all(&run_dir).expect("Failed to create run directory");
        Self {
            run_dir,
            _temp_dir: temp_dir,
        }
    }

    /// Path of the run directory.
    pub fn path(&self) -> &Path {
        &self.run_dir
    }

    /// Creates (or reuses) a segment directory.
    pub fn segment(&self, name: &str) -> SegmentWriter {
        let dir = self.run_dir.join(name);
        std::fs::create_dir_all(&dir).expect("Failed to create segment directory");
        SegmentWriter { dir }
    }
}

/// Writes snapshot and escape files into one segment directory.
pub struct SegmentWriter {
    dir: PathBuf,
}

impl SegmentWriter {
    /// Path of the segment directory.
    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Writes a single-star snapshot with `(id, type)` rows.
    pub fn singles(&self, time: f64, rows: &[(i64, i32)]) -> &Self {
        let rows: Vec<String> = rows.iter().map(|(id, code)| format!("{id} {code}")).collect();
        self.snapshot("sev.83_", time, &rows)
    }

    /// Writes a single-star snapshot with `(id, type, attributes)` rows.
    pub fn singles_with_attributes(&self, time: f64, rows: &[(i64, i32, &[f64])]) -> &Self {
        let rows: Vec<String> = rows
            .iter()
            .map(|(id, code, attributes)| {
                let mut row = format!("{id} {code}");
                for value in *attributes {
                    write!(row, " {value:e}").expect("writing to a String cannot fail");
                }
                row
            })
            .collect();
        self.snapshot("sev.83_", time, &rows)
    }

    /// Writes a binary snapshot with `(id1, id2, type1, type2)` rows.
    pub fn binaries(&self, time: f64, rows: &[(i64, i64, i32, i32)]) -> &Self {
        let rows: Vec<String> = rows
            .iter()
            .map(|(id1, id2, type1, type2)| format!("{id1} {id2} {type1} {type2}"))
            .collect();
        self.snapshot("bev.82_", time, &rows)
    }

    /// Writes the escape file with `(time, id, type)` rows.
    pub fn escapes(&self, rows: &[(f64, i64, i32)]) -> &Self {
        let mut text = String::from("# time id type\n");
        for (time, id, code) in rows {
            writeln!(text, "{time} {id} {code}").expect("writing to a String cannot fail");
        }
        self.raw("esc.11", &text)
    }

    /// Writes an arbitrary file into the segment.
    pub fn raw(&self, file_name: &str, text: &str) -> &Self {
        std::fs::write(self.dir.join(file_name), text).expect("Failed to write fixture file");
        self
    }

    fn snapshot(&self, prefix: &str, time: f64, rows: &[String]) -> &Self {
        self.raw(&format!("{prefix}{time:.3}"), &snapshot_text(time, rows))
    }
}

/// Renders a snapshot file: time header, two header lines, rows, sentinel.
pub fn snapshot_text(time: f64, rows: &[String]) -> String {
    let mut text = format!("{:>8} {time:>14.6}\n", rows.len());
    text.push_str("  header\n  header\n");
    for row in rows {
        text.push_str("  ");
        text.push_str(row);
        text.push('\n');
    }
    text.push_str(" -1000 0\n");
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_layout() {
        let run = RunFixture::new("N1K");
        run.segment("save01")
            .singles(0.0, &[(1, 13)])
            .binaries(0.0, &[(2, 3, 13, 1)])
            .escapes(&[(4.5, 1, 13)]);

        let save = run.path().join("save01");
        assert!(save.join("sev.83_0.000").is_file());
        assert!(save.join("bev.82_0.000").is_file());
        assert!(save.join("esc.11").is_file());
    }

    #[test]
    fn snapshot_header_carries_time() {
        let text = snapshot_text(12.5, &["1 13".to_string()]);
        let header: Vec<&str> = text.lines().next().unwrap().split_whitespace().collect();
        assert_eq!(header, vec!["1", "12.500000"]);
        assert!(text.ends_with("-1000 0\n"));
    }
}
