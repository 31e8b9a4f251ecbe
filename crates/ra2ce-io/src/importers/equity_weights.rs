use super::csv_table::{detect_separator, CsvTable};
use anyhow::Result;
use ra2ce_core::inputs::EquityWeights;
use ra2ce_core::ImportDiagnostics;
use std::path::Path;
use tracing::warn;

/// Reads `region`/`weight` pairs; the separator is taken from the header line.
///
/// A missing file gives empty weights, which turns equity accounting off.
pub fn read_equity_weights(path: &Path, diag: &mut ImportDiagnostics) -> Result<EquityWeights> {
    if !path.exists() {
        warn!(path = %path.display(), "no equity weights file found, equity weighting disabled");
        return Ok(EquityWeights::new());
    }
    let separator = detect_separator(path)?;
    let table = CsvTable::read(path, separator, diag)?;
    table.require(&["region", "weight"])?;

    let mut weights = EquityWeights::new();
    for (line, record) in table.records() {
        match (table.get(record, "region"), table.get_f64(record, "weight")) {
            (Some(region), Some(weight)) => weights.insert(region, weight),
            _ => diag.skip_row("input", "equity row needs region and numeric weight", line),
        }
    }
    Ok(weights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_both_separators() {
        for content in ["region;weight\nnorth;2.0\nsouth;0.5", "region,weight\nnorth,2.0\nsouth,0.5"] {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            writeln!(file, "{content}").unwrap();
            let mut diag = ImportDiagnostics::new();
            let weights = read_equity_weights(file.path(), &mut diag).unwrap();
            assert_eq!(weights.len(), 2);
            assert_eq!(weights.weight(Some("north")), 2.0);
            assert_eq!(weights.weight(Some("east")), 1.0);
        }
    }

    #[test]
    fn test_missing_file_disables_equity() {
        let dir = tempfile::tempdir().unwrap();
        let mut diag = ImportDiagnostics::new();
        let weights = read_equity_weights(&dir.path().join("none.csv"), &mut diag).unwrap();
        assert!(weights.is_empty());
    }
}
