use anyhow::{anyhow, Context, Result};
use polars::prelude::{CsvWriter, DataFrame, SerWriter};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// File formats written for one result table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputFormats {
    pub csv: bool,
    pub parquet: bool,
}

impl Default for OutputFormats {
    fn default() -> Self {
        Self {
            csv: true,
            parquet: false,
        }
    }
}

/// Writes `df` as `<dir>/<name>.csv` and/or `<dir>/<name>.parquet`.
/// Returns the written paths.
pub fn persist_dataframe(
    df: &mut DataFrame,
    dir: &Path,
    name: &str,
    formats: OutputFormats,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)
        .with_context(|| format!("creating output directory '{}'", dir.display()))?;
    let mut written = Vec::new();

    if formats.csv {
        let path = dir.join(format!("{name}.csv"));
        let mut file = File::create(&path)
            .with_context(|| format!("creating CSV output '{}'", path.display()))?;
        CsvWriter::new(&mut file)
            .finish(df)
            .with_context(|| format!("writing CSV to '{}'", path.display()))?;
        written.push(path);
    }

    if formats.parquet {
        written.push(write_parquet(df, &dir.join(format!("{name}.parquet")))?);
    }

    if written.is_empty() {
        return Err(anyhow!("no output format selected for '{name}'"));
    }
    Ok(written)
}

#[cfg(feature = "parquet")]
fn write_parquet(df: &mut DataFrame, path: &Path) -> Result<PathBuf> {
    use polars::prelude::ParquetWriter;

    let mut file = File::create(path)
        .with_context(|| format!("creating Parquet output '{}'", path.display()))?;
    ParquetWriter::new(&mut file)
        .finish(df)
        .with_context(|| format!("writing Parquet to '{}'", path.display()))?;
    Ok(path.to_path_buf())
}

#[cfg(not(feature = "parquet"))]
fn write_parquet(_df: &mut DataFrame, path: &Path) -> Result<PathBuf> {
    Err(anyhow!(
        "writing '{}' requires the 'parquet' feature",
        path.display()
    ))
}
