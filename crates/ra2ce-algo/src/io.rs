use anyhow::{Context, Result};
use polars::prelude::DataFrame;
use ra2ce_core::config::{AnalysisKind, AnalysisSection};
use ra2ce_io::{persist_dataframe, OutputFormats};
use std::path::{Path, PathBuf};
use tracing::debug;

/// One result table of an analysis.
#[derive(Debug, Clone)]
pub struct AnalysisOutput {
    /// Suffix of the file name, e.g. `link_traffic`; empty for the main table.
    pub table: &'static str,
    pub frame: DataFrame,
}

impl AnalysisOutput {
    pub fn main(frame: DataFrame) -> Self {
        Self { table: "", frame }
    }

    pub fn named(table: &'static str, frame: DataFrame) -> Self {
        Self { table, frame }
    }

    fn file_stem(&self, analysis: &str) -> String {
        if self.table.is_empty() {
            analysis.to_string()
        } else {
            format!("{analysis}_{}", self.table)
        }
    }
}

/// CSV unless the section asks for Parquet only.
pub fn output_formats(section: &AnalysisSection) -> OutputFormats {
    OutputFormats {
        csv: section.save_csv || !section.save_parquet,
        parquet: section.save_parquet,
    }
}

/// `<root>/<kind>`, e.g. `output/multi_link_losses`.
pub fn analysis_output_dir(root: &Path, kind: AnalysisKind) -> PathBuf {
    root.join(kind.as_str())
}

/// Writes every table of one analysis and returns the written paths.
pub fn write_outputs(
    root: &Path,
    section: &AnalysisSection,
    outputs: Vec<AnalysisOutput>,
) -> Result<Vec<PathBuf>> {
    let dir = analysis_output_dir(root, section.analysis);
    let formats = output_formats(section);
    let mut written = Vec::new();
    for mut output in outputs {
        let stem = output.file_stem(&section.name);
        let paths = persist_dataframe(&mut output.frame, &dir, &stem, formats)
            .with_context(|| format!("writing '{stem}' of analysis '{}'", section.name))?;
        debug!(
            analysis = %section.name,
            table = %stem,
            rows = output.frame.height(),
            "table written"
        );
        written.extend(paths);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{NamedFrom, Series};
    use tempfile::tempdir;

    #[test]
    fn test_output_formats_default_to_csv() {
        let mut section = AnalysisSection::new("a", AnalysisKind::SingleLinkRedundancy);
        section.save_csv = false;
        assert_eq!(
            output_formats(&section),
            OutputFormats {
                csv: true,
                parquet: false
            }
        );
        section.save_parquet = true;
        assert!(!output_formats(&section).csv);
    }

    #[test]
    fn test_tables_land_in_analysis_directory() {
        let dir = tempdir().unwrap();
        let section = AnalysisSection::new("slr", AnalysisKind::SingleLinkRedundancy);
        let frame = DataFrame::new(vec![Series::new("u", vec![1i64, 2])]).unwrap();
        let written = write_outputs(
            dir.path(),
            &section,
            vec![
                AnalysisOutput::main(frame.clone()),
                AnalysisOutput::named("summary", frame),
            ],
        )
        .unwrap();
        let expected = dir.path().join("single_link_redundancy");
        assert_eq!(
            written,
            vec![expected.join("slr.csv"), expected.join("slr_summary.csv")]
        );
        assert!(written.iter().all(|path| path.exists()));
    }
}
