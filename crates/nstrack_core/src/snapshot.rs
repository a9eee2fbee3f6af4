//! Snapshot decoding.
//!
//! A snapshot is one text file written by the simulation at one timestep:
//!
//! ```text
//! <n>  <physical time>  ...          <- time header, second field
//! <header line>                      <- skipped (`header_lines`)
//! <header line>
//! <id> <type> [attributes...]        <- single catalog row
//! <id1> <id2> <type1> <type2> [...]  <- binary catalog row
//! -1000 ...                          <- sentinel, ends the data
//! ```
//!
//! A bad row is reported as a [`MalformedRecord`] next to the good ones; only
//! a missing header or an empty file fails the whole file.

use crate::config::PipelineConfig;
use crate::error::{CoreError, CoreResult};
use crate::types::{Companion, StarId, TypeCode};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Which catalog a snapshot file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogKind {
    /// One star per row.
    Single,
    /// One bound pair per row.
    Binary,
}

/// One star as reported by one snapshot row.
#[derive(Debug, Clone, PartialEq)]
pub struct StarRecord {
    /// The star.
    pub id: StarId,
    /// Its type at the snapshot time.
    pub type_code: TypeCode,
    /// Named numeric columns of the row.
    pub attributes: BTreeMap<String, f64>,
    /// The other member, for binary rows.
    pub companion: Option<Companion>,
}

/// A row that could not be parsed. Recoverable: the row is skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {message}")]
pub struct MalformedRecord {
    /// 1-based line number in the snapshot file.
    pub line: usize,
    /// What was wrong with the row.
    pub message: String,
}

/// A decoded snapshot file.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Physical time of the snapshot.
    pub time: f64,
    /// Which catalog the file belongs to.
    pub kind: CatalogKind,
    /// Parsed rows in file order; binary rows contribute two records.
    pub records: Vec<Result<StarRecord, MalformedRecord>>,
}

impl Snapshot {
    /// Iterates over the rows that parsed.
    pub fn valid_records(&self) -> impl Iterator<Item = &StarRecord> {
        self.records.iter().filter_map(|record| record.as_ref().ok())
    }

    /// Iterates over the rows that did not parse.
    pub fn malformed_records(&self) -> impl Iterator<Item = &MalformedRecord> {
        self.records.iter().filter_map(|record| record.as_ref().err())
    }
}

/// Turns a snapshot file into a [`Snapshot`].
pub trait SnapshotDecoder: Send + Sync {
    /// Decodes the file at `path`.
    ///
    /// # Errors
    ///
    /// Fails for the whole file with [`CoreError::MissingHeader`],
    /// [`CoreError::EmptyFile`] or an I/O error. Row-level problems are
    /// reported inside [`Snapshot::records`] instead.
    fn decode(&self, path: &Path) -> CoreResult<Snapshot>;

    /// Whether `file_name` is a snapshot this decoder understands.
    fn accepts(&self, file_name: &str) -> bool;
}

/// Decoder for the whitespace-column `sev`/`bev` text catalogs.
#[derive(Debug, Clone)]
pub struct SevDecoder {
    single_prefix: String,
    binary_prefix: String,
    header_lines: usize,
    eof_sentinel: i64,
    attribute_columns: Vec<String>,
    binary_attribute_columns: Vec<String>,
}

impl Default for SevDecoder {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

impl SevDecoder {
    /// Builds a decoder from the file-layout part of `config`.
    #[must_use]
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            single_prefix: config.single_prefix.clone(),
            binary_prefix: config.binary_prefix.clone(),
            header_lines: config.header_lines,
            eof_sentinel: config.eof_sentinel,
            attribute_columns: config.attribute_columns.clone(),
            binary_attribute_columns: config.binary_attribute_columns.clone(),
        }
    }

    /// Classifies a file by name. The longer prefix is tried first.
    #[must_use]
    pub fn catalog_kind(&self, file_name: &str) -> Option<CatalogKind> {
        let mut prefixes = [
            (self.single_prefix.as_str(), CatalogKind::Single),
            (self.binary_prefix.as_str(), CatalogKind::Binary),
        ];
        prefixes.sort_by_key(|(prefix, _)| std::cmp::Reverse(prefix.len()));
        prefixes
            .into_iter()
            .find(|(prefix, _)| file_name.starts_with(prefix))
            .map(|(_, kind)| kind)
    }

    /// Parses snapshot text. `path` is only used for error messages.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EmptyFile`] for blank text and
    /// [`CoreError::MissingHeader`] if the first line has no parsable time.
    pub fn parse(&self, kind: CatalogKind, path: &Path, text: &str) -> CoreResult<Snapshot> {
        if text.trim().is_empty() {
            return Err(CoreError::EmptyFile {
                path: path.to_path_buf(),
            });
        }

        let mut lines = text.lines().enumerate();
        let header = lines.next().map(|(_, line)| line).unwrap_or_default();
        let time = parse_header_time(header).map_err(|message| CoreError::missing_header(path, message))?;

        let mut records = Vec::new();
        for (index, line) in lines.skip(self.header_lines) {
            let fields: Vec<&str> = line.split_whitespace().collect();
            let Some(first) = fields.first() else {
                continue;
            };
            if first.parse::<i64>().ok() == Some(self.eof_sentinel) {
                break;
            }

            let line_number = index + 1;
            match kind {
                CatalogKind::Single => {
                    records.push(self.parse_single(&fields).map_err(|message| MalformedRecord {
                        line: line_number,
                        message,
                    }));
                }
                CatalogKind::Binary => match self.parse_binary(&fields) {
                    Ok((primary, secondary)) => {
                        records.push(Ok(primary));
                        records.push(Ok(secondary));
                    }
                    Err(message) => records.push(Err(MalformedRecord {
                        line: line_number,
                        message,
                    })),
                },
            }
        }

        Ok(Snapshot {
            time,
            kind,
            records,
        })
    }

    fn parse_single(&self, fields: &[&str]) -> Result<StarRecord, String> {
        if fields.len() < 2 {
            return Err(format!("expected at least 2 fields, found {}", fields.len()));
        }
        Ok(StarRecord {
            id: StarId::new(parse_int(fields[0], "id")?),
            type_code: TypeCode::new(parse_int(fields[1], "type")?),
            attributes: parse_attributes(&self.attribute_columns, &fields[2..])?,
            companion: None,
        })
    }

    fn parse_binary(&self, fields: &[&str]) -> Result<(StarRecord, StarRecord), String> {
        if fields.len() < 4 {
            return Err(format!("expected at least 4 fields, found {}", fields.len()));
        }
        let first_id = StarId::new(parse_int(fields[0], "id1")?);
        let second_id = StarId::new(parse_int(fields[1], "id2")?);
        let first_type = TypeCode::new(parse_int(fields[2], "type1")?);
        let second_type = TypeCode::new(parse_int(fields[3], "type2")?);
        let attributes = parse_attributes(&self.binary_attribute_columns, &fields[4..])?;

        let primary = StarRecord {
            id: first_id,
            type_code: first_type,
            attributes: attributes.clone(),
            companion: Some(Companion {
                id: second_id,
                type_code: second_type,
            }),
        };
        let secondary = StarRecord {
            id: second_id,
            type_code: second_type,
            attributes,
            companion: Some(Companion {
                id: first_id,
                type_code: first_type,
            }),
        };
        Ok((primary, secondary))
    }
}

impl SnapshotDecoder for SevDecoder {
    fn decode(&self, path: &Path) -> CoreResult<Snapshot> {
        // Invalid bytes become U+FFFD and fail only the row they sit in.
        let bytes = std::fs::read(path)?;
        let text = String::from_utf8_lossy(&bytes);
        let kind = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| self.catalog_kind(name))
            .unwrap_or(CatalogKind::Single);
        self.parse(kind, path, &text)
    }

    fn accepts(&self, file_name: &str) -> bool {
        self.catalog_kind(file_name).is_some()
    }
}

fn parse_header_time(header: &str) -> Result<f64, String> {
    let field = header
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| "expected physical time as second field".to_string())?;
    let time = parse_float(field).ok_or_else(|| format!("time field {field:?} is not a number"))?;
    if !time.is_finite() {
        return Err(format!("time field {field:?} is not finite"));
    }
    Ok(time)
}

fn parse_int<T: std::str::FromStr>(field: &str, name: &str) -> Result<T, String> {
    field
        .parse()
        .map_err(|_| format!("{name} field {field:?} is not an integer"))
}

/// Parses a float, accepting Fortran `D` exponents.
pub(crate) fn parse_float(field: &str) -> Option<f64> {
    if field.contains(['D', 'd']) {
        field.replace(['D', 'd'], "E").parse().ok()
    } else {
        field.parse().ok()
    }
}

fn parse_attributes(names: &[String], fields: &[&str]) -> Result<BTreeMap<String, f64>, String> {
    names
        .iter()
        .zip(fields)
        .map(|(name, field)| match parse_float(field) {
            Some(value) if value.is_finite() => Ok((name.clone(), value)),
            _ => Err(format!("{name} field {field:?} is not a finite number")),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn path() -> PathBuf {
        PathBuf::from("save01/sev.83_0.000")
    }

    #[test]
    fn invalid_utf8_fails_only_its_row() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("sev.83_1.000");
        std::fs::write(&file, b"3 1.0\nh\nh\n5 13\n6 1 \xff\xfe\n7 13\n-1000\n").unwrap();

        let snapshot = SevDecoder::default().decode(&file).unwrap();

        let ids: Vec<StarId> = snapshot.valid_records().map(|record| record.id).collect();
        assert_eq!(ids, vec![StarId::new(5), StarId::new(7)]);
        let malformed: Vec<usize> = snapshot.malformed_records().map(|record| record.line).collect();
        assert_eq!(malformed, vec![5]);
    }

    #[test]
    fn parses_single_catalog() {
        let text = "\
  10000   12.5   0.0
  header
  header
     1    1   0.25   0.8   -0.5
     2   13   1.10   1.4
 -1000    0
     3    1
";
        let snapshot = SevDecoder::default()
            .parse(CatalogKind::Single, &path(), text)
            .unwrap();

        assert_eq!(snapshot.time, 12.5);
        assert_eq!(snapshot.records.len(), 2);

        let first = snapshot.records[0].as_ref().unwrap();
        assert_eq!(first.id, StarId::new(1));
        assert_eq!(first.type_code, TypeCode::new(1));
        assert_eq!(first.attributes.get("r"), Some(&0.25));
        assert_eq!(first.attributes.get("log_l"), Some(&-0.5));
        assert_eq!(first.attributes.len(), 3);

        let second = snapshot.records[1].as_ref().unwrap();
        assert_eq!(second.type_code, TypeCode::NEUTRON_STAR);
        assert!(second.companion.is_none());
    }

    #[test]
    fn reads_to_end_without_sentinel() {
        let text = "1 3.0\nh\nh\n5 13\n6 1\n";
        let snapshot = SevDecoder::default()
            .parse(CatalogKind::Single, &path(), text)
            .unwrap();
        assert_eq!(snapshot.valid_records().count(), 2);
    }

    #[test]
    fn malformed_rows_are_reported_not_fatal() {
        let text = "1 3.0\nh\nh\n5 13\nx 1\n7\n8 1 abc\n9 1\n";
        let snapshot = SevDecoder::default()
            .parse(CatalogKind::Single, &path(), text)
            .unwrap();

        let ids: Vec<i64> = snapshot.valid_records().map(|r| r.id.as_i64()).collect();
        assert_eq!(ids, vec![5, 9]);

        let lines: Vec<usize> = snapshot.malformed_records().map(|m| m.line).collect();
        assert_eq!(lines, vec![5, 6, 7]);
    }

    #[test]
    fn parses_binary_catalog_into_pairs() {
        let text = "42 7.25\nh\nh\n 11 12 13 1 0.3 2.1\n-1000\n";
        let snapshot = SevDecoder::default()
            .parse(CatalogKind::Binary, &path(), text)
            .unwrap();

        let records: Vec<&StarRecord> = snapshot.valid_records().collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, StarId::new(11));
        assert_eq!(
            records[0].companion,
            Some(Companion {
                id: StarId::new(12),
                type_code: TypeCode::new(1)
            })
        );
        assert_eq!(records[1].id, StarId::new(12));
        assert_eq!(records[1].companion.as_ref().map(|c| c.id), Some(StarId::new(11)));
        assert_eq!(records[1].attributes.get("ecc"), Some(&0.3));
        assert_eq!(records[1].attributes.len(), 2);
        assert!(records[0].attributes.get("semi").is_none());
    }

    #[test]
    fn fortran_exponents() {
        assert_eq!(parse_float("1.5D+02"), Some(150.0));
        assert_eq!(parse_float("2.0d-1"), Some(0.2));
        assert_eq!(parse_float("abc"), None);
    }

    #[test]
    fn empty_file_is_fatal() {
        let result = SevDecoder::default().parse(CatalogKind::Single, &path(), "  \n\n");
        assert!(matches!(result, Err(CoreError::EmptyFile { .. })));
    }

    #[test]
    fn missing_time_is_fatal() {
        for text in ["10000\nh\nh\n1 1\n", "10000 time\n1 1\n", "1 nan\n"] {
            let result = SevDecoder::default().parse(CatalogKind::Single, &path(), text);
            assert!(
                matches!(result, Err(CoreError::MissingHeader { .. })),
                "{text:?}"
            );
        }
    }

    #[test]
    fn catalog_kind_by_prefix() {
        let decoder = SevDecoder::default();
        assert_eq!(decoder.catalog_kind("sev.83_12.000"), Some(CatalogKind::Single));
        assert_eq!(decoder.catalog_kind("bev.82_12.000"), Some(CatalogKind::Binary));
        assert_eq!(decoder.catalog_kind("esc.11"), None);
        assert!(!decoder.accepts("conf.3_12"));
    }

    #[test]
    fn decode_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("bev.82_1.000");
        std::fs::write(&file, "1 1.0\nh\nh\n3 4 13 13\n").unwrap();

        let snapshot = SevDecoder::default().decode(&file).unwrap();
        assert_eq!(snapshot.kind, CatalogKind::Binary);
        assert_eq!(snapshot.valid_records().count(), 2);
    }
}
