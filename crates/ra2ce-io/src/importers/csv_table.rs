//! Shared CSV plumbing for the input tables.
//!
//! Every table is read fully into memory with a known separator. Rows whose
//! field count does not match the header are skipped and recorded as errors
//! in the diagnostics, mirroring how the tables have always been loaded.

use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord};
use ra2ce_core::{ImportDiagnostics, Ra2ceError};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// A CSV file held in memory with a column-name index.
#[derive(Debug)]
pub struct CsvTable {
    path: PathBuf,
    columns: HashMap<String, usize>,
    records: Vec<(usize, StringRecord)>,
}

/// `;` when the header line contains one, `,` otherwise.
pub fn detect_separator(path: &Path) -> Result<u8> {
    let file = File::open(path).with_context(|| format!("opening '{}'", path.display()))?;
    let mut first_line = String::new();
    BufReader::new(file)
        .read_line(&mut first_line)
        .with_context(|| format!("reading header of '{}'", path.display()))?;
    Ok(if first_line.contains(';') { b';' } else { b',' })
}

impl CsvTable {
    pub fn read(path: &Path, separator: u8, diag: &mut ImportDiagnostics) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .delimiter(separator)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .with_context(|| format!("opening CSV '{}'", path.display()))?;

        let headers = reader
            .headers()
            .with_context(|| format!("reading CSV header of '{}'", path.display()))?
            .clone();
        let columns: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, name)| (name.to_string(), i))
            .collect();

        if columns.contains_key("geometry") {
            return Err(Ra2ceError::Config(format!(
                "the csv file '{}' should not have a geometry column",
                path.display()
            ))
            .into());
        }

        let mut records = Vec::new();
        for (i, record) in reader.records().enumerate() {
            // header is line 1
            let line = i + 2;
            match record {
                Ok(record) if record.len() == headers.len() => records.push((line, record)),
                Ok(record) => diag.skip_row(
                    "input",
                    &format!("expected {} fields, found {}", headers.len(), record.len()),
                    line,
                ),
                Err(e) => diag.skip_row("input", &e.to_string(), line),
            }
        }
        diag.stats.rows += records.len();

        Ok(Self {
            path: path.to_path_buf(),
            columns,
            records,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Fails with a configuration error naming every missing column.
    pub fn require(&self, required: &[&str]) -> Result<()> {
        let missing: Vec<&str> = required
            .iter()
            .copied()
            .filter(|name| !self.columns.contains_key(*name))
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        Err(Ra2ceError::Config(format!(
            "the csv file '{}' should have columns {} (missing {})",
            self.path.display(),
            required.join(", "),
            missing.join(", ")
        ))
        .into())
    }

    pub fn records(&self) -> impl Iterator<Item = (usize, &StringRecord)> {
        self.records.iter().map(|(line, record)| (*line, record))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Cell text; empty cells and `nan` read as `None`.
    pub fn get<'r>(&self, record: &'r StringRecord, column: &str) -> Option<&'r str> {
        let index = *self.columns.get(column)?;
        record
            .get(index)
            .map(str::trim)
            .filter(|value| !value.is_empty() && !value.eq_ignore_ascii_case("nan"))
    }

    pub fn get_f64(&self, record: &StringRecord, column: &str) -> Option<f64> {
        self.get(record, column)
            .and_then(|value| value.parse::<f64>().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_detect_separator_and_skip_bad_rows() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "region;weight\nnorth;2.0\nbroken\nsouth;0.5").unwrap();

        let separator = detect_separator(file.path()).unwrap();
        assert_eq!(separator, b';');

        let mut diag = ImportDiagnostics::new();
        let table = CsvTable::read(file.path(), separator, &mut diag).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(diag.stats.skipped_rows, 1);
        assert_eq!(diag.diagnostics.issues[0].line, Some(3));
    }

    #[test]
    fn test_require_names_missing_columns() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "trip_types;value_of_time\nbusiness;5").unwrap();

        let mut diag = ImportDiagnostics::new();
        let table = CsvTable::read(file.path(), b';', &mut diag).unwrap();
        let err = table
            .require(&["trip_types", "value_of_time", "occupants"])
            .unwrap_err();
        assert!(err.to_string().contains("occupants"));
        assert!(matches!(
            err.downcast_ref::<Ra2ceError>(),
            Some(Ra2ceError::Config(_))
        ));
    }

    #[test]
    fn test_geometry_column_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "link_id,geometry\n1,POINT (0 0)").unwrap();
        let mut diag = ImportDiagnostics::new();
        assert!(CsvTable::read(file.path(), b',', &mut diag).is_err());
    }
}
