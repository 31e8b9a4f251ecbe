//! Origin/destination table reader: CSV, or feather (Arrow IPC) when the `ipc`
//! feature is enabled.

use super::csv_table::{detect_separator, CsvTable};
use anyhow::{anyhow, Context, Result};
use ra2ce_core::inputs::{OdRecord, OdTable};
use ra2ce_core::{ImportDiagnostics, OdId};
use std::path::Path;

const REQUIRED: [&str; 3] = ["o_id", "d_id", "values"];

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("nan") && !v.eq_ignore_ascii_case("none"))
        .map(str::to_string)
}

pub fn read_od_table(path: &Path, diag: &mut ImportDiagnostics) -> Result<OdTable> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let records = match extension.as_str() {
        "feather" | "arrow" | "ipc" => read_feather_records(path, diag)?,
        _ => read_csv_records(path, diag)?,
    };
    OdTable::new(records).with_context(|| format!("building OD table from '{}'", path.display()))
}

fn read_csv_records(path: &Path, diag: &mut ImportDiagnostics) -> Result<Vec<OdRecord>> {
    let separator = detect_separator(path)?;
    let table = CsvTable::read(path, separator, diag)?;
    table.require(&REQUIRED)?;

    let mut records = Vec::with_capacity(table.len());
    for (line, record) in table.records() {
        let values = table.get_f64(record, "values").unwrap_or_else(|| {
            diag.default_value("input", "OD values defaulted to 0", line);
            0.0
        });
        records.push(OdRecord {
            o_id: non_empty(table.get(record, "o_id")).map(OdId::new),
            d_id: non_empty(table.get(record, "d_id")).map(OdId::new),
            region: non_empty(table.get(record, "region")),
            values,
            category: non_empty(table.get(record, "category")),
        });
    }
    Ok(records)
}

#[cfg(feature = "ipc")]
fn read_feather_records(path: &Path, diag: &mut ImportDiagnostics) -> Result<Vec<OdRecord>> {
    use polars::prelude::{DataType, IpcReader, SerReader};
    use std::fs::File;

    let file = File::open(path).with_context(|| format!("opening OD table '{}'", path.display()))?;
    let df = IpcReader::new(file)
        .finish()
        .with_context(|| format!("reading Arrow IPC OD table '{}'", path.display()))?;

    let text_column = |name: &str| -> Result<Option<Vec<Option<String>>>> {
        let Ok(series) = df.column(name) else {
            return Ok(None);
        };
        let series = series
            .cast(&DataType::Utf8)
            .with_context(|| format!("casting OD column '{name}' to text"))?;
        let values = series
            .utf8()
            .with_context(|| format!("OD column '{name}' must be text"))?
            .into_iter()
            .map(non_empty)
            .collect();
        Ok(Some(values))
    };

    let missing: Vec<&str> = REQUIRED
        .iter()
        .copied()
        .filter(|name| df.column(name).is_err())
        .collect();
    if !missing.is_empty() {
        return Err(anyhow!(ra2ce_core::Ra2ceError::Config(format!(
            "OD table '{}' should have columns {} (missing {})",
            path.display(),
            REQUIRED.join(", "),
            missing.join(", ")
        ))));
    }

    let o_ids = text_column("o_id")?.unwrap_or_default();
    let d_ids = text_column("d_id")?.unwrap_or_default();
    let regions = text_column("region")?;
    let categories = text_column("category")?;
    let values = df
        .column("values")
        .context("missing 'values' column in OD table")?
        .cast(&DataType::Float64)
        .context("casting OD 'values' to float")?;
    let values = values.f64().context("OD 'values' must be numeric")?;

    let mut records = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        let value = values.get(row).filter(|v| !v.is_nan()).unwrap_or_else(|| {
            diag.default_value("input", "OD values defaulted to 0", row + 1);
            0.0
        });
        records.push(OdRecord {
            o_id: o_ids.get(row).cloned().flatten().map(OdId::new),
            d_id: d_ids.get(row).cloned().flatten().map(OdId::new),
            region: regions.as_ref().and_then(|r| r.get(row).cloned().flatten()),
            values: value,
            category: categories.as_ref().and_then(|c| c.get(row).cloned().flatten()),
        });
    }
    diag.stats.rows += records.len();
    Ok(records)
}

#[cfg(not(feature = "ipc"))]
fn read_feather_records(path: &Path, _diag: &mut ImportDiagnostics) -> Result<Vec<OdRecord>> {
    Err(anyhow!(
        "reading feather OD table '{}' requires the 'ipc' feature",
        path.display()
    ))
}
