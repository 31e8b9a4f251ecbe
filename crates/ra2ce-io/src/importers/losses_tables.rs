//! Readers for the three tables a losses analysis needs.
//!
//! | Table | Separator | Columns |
//! |-------|-----------|---------|
//! | resilience curves | `;` | `link_type_hazard_intensity`, `duration_steps`, `functionality_loss_ratio` |
//! | values of time | `;` | `trip_types`, `value_of_time`, `occupants` |
//! | traffic intensities | `,` | link id column, then `<part_of_day>_<purpose>` per day |

use super::csv_table::CsvTable;
use anyhow::{Context, Result};
use ra2ce_core::config::TripPurpose;
use ra2ce_core::inputs::traffic_intensities::parse_intensity_column;
use ra2ce_core::inputs::{
    parse_float_list, ResilienceCurve, ResilienceCurves, TimeValues, TrafficIntensities, TripValue,
};
use ra2ce_core::{ImportDiagnostics, LinkId};
use std::path::Path;
use tracing::{debug, warn};

pub fn read_resilience_curves(
    path: &Path,
    diag: &mut ImportDiagnostics,
) -> Result<ResilienceCurves> {
    let table = CsvTable::read(path, b';', diag)?;
    table.require(&[
        "link_type_hazard_intensity",
        "duration_steps",
        "functionality_loss_ratio",
    ])?;

    let mut curves = ResilienceCurves::new();
    for (line, record) in table.records() {
        let key = table
            .get(record, "link_type_hazard_intensity")
            .with_context(|| format!("line {line}: empty link_type_hazard_intensity"))?;
        let durations = parse_float_list(table.get(record, "duration_steps").unwrap_or("[]"))
            .with_context(|| format!("line {line}: duration_steps of '{key}'"))?;
        let ratios =
            parse_float_list(table.get(record, "functionality_loss_ratio").unwrap_or("[]"))
                .with_context(|| format!("line {line}: functionality_loss_ratio of '{key}'"))?;
        let curve = ResilienceCurve::new(durations, ratios)
            .with_context(|| format!("line {line}: resilience curve '{key}'"))?;
        curves
            .insert_keyed(key, curve)
            .with_context(|| format!("line {line}: resilience curve '{key}'"))?;
    }
    debug!(
        curves = curves.len(),
        path = %path.display(),
        "loaded resilience curves"
    );
    Ok(curves)
}

pub fn read_time_values(path: &Path, diag: &mut ImportDiagnostics) -> Result<TimeValues> {
    let table = CsvTable::read(path, b';', diag)?;
    table.require(&["trip_types", "value_of_time", "occupants"])?;

    let mut values = TimeValues::new();
    for (line, record) in table.records() {
        let Some(purpose) = table.get(record, "trip_types").and_then(TripPurpose::parse) else {
            diag.skip_row("input", "unknown trip type", line);
            continue;
        };
        let value_of_time = table.get_f64(record, "value_of_time").unwrap_or_else(|| {
            diag.default_value("input", "value_of_time defaulted to 0", line);
            0.0
        });
        let occupants = table.get_f64(record, "occupants").unwrap_or_else(|| {
            diag.default_value("input", "occupants defaulted to 1", line);
            1.0
        });
        values.insert(
            purpose,
            TripValue {
                value_of_time,
                occupants,
            },
        );
    }
    Ok(values)
}

/// Reads intensities keyed by `link_id_column`. Every recognised
/// `<part_of_day>_<purpose>` column is kept; totals and other columns are ignored.
pub fn read_traffic_intensities(
    path: &Path,
    link_id_column: &str,
    diag: &mut ImportDiagnostics,
) -> Result<TrafficIntensities> {
    let table = CsvTable::read(path, b',', diag)?;
    table.require(&[link_id_column]).with_context(|| {
        format!("traffic intensities and the network do not share the link id column '{link_id_column}'")
    })?;

    let columns: Vec<(String, _)> = table
        .column_names()
        .filter_map(|name| parse_intensity_column(name).map(|key| (name.to_string(), key)))
        .collect();
    if columns.is_empty() {
        warn!(path = %path.display(), "traffic intensities file has no <part_of_day>_<purpose> columns");
    }

    let mut intensities = TrafficIntensities::new();
    for (line, record) in table.records() {
        let Some(link) = table
            .get_f64(record, link_id_column)
            .filter(|id| id.fract() == 0.0)
            .map(|id| LinkId::new(id as i64))
        else {
            diag.skip_row("input", "link id is not an integer", line);
            continue;
        };
        for (name, (part, purpose)) in &columns {
            match table.get_f64(record, name) {
                Some(value) => intensities.insert(link, *part, *purpose, value),
                None => diag.default_value("input", &format!("empty {name} for link {link}"), line),
            }
        }
    }
    Ok(intensities)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ra2ce_core::config::PartOfDay;
    use ra2ce_core::RoadType;
    use std::io::Write;

    #[test]
    fn test_read_resilience_curves() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "link_type_hazard_intensity;duration_steps;functionality_loss_ratio\n\
             motorway_0.2-0.5;[3, 5];[1.0, 0.4]\n\
             motorway_0.5-1.2;[2, 4];[1.0, 0.3]"
        )
        .unwrap();

        let mut diag = ImportDiagnostics::new();
        let curves = read_resilience_curves(file.path(), &mut diag).unwrap();
        assert_eq!(curves.len(), 2);
        let (_, curve) = curves.lookup(RoadType::Motorway, 0.5).unwrap();
        assert_eq!(curve.duration_steps(), &[2.0, 4.0]);
    }

    #[test]
    fn test_resilience_curve_length_mismatch_fails() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "link_type_hazard_intensity;duration_steps;functionality_loss_ratio\n\
             motorway_0.2-0.5;[3, 5];[1.0]"
        )
        .unwrap();
        let mut diag = ImportDiagnostics::new();
        assert!(read_resilience_curves(file.path(), &mut diag).is_err());
    }

    #[test]
    fn test_read_time_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "trip_types;value_of_time;occupants\nbusiness;5;1\ncommute;2.5;2\nleisure;1;1"
        )
        .unwrap();
        let mut diag = ImportDiagnostics::new();
        let values = read_time_values(file.path(), &mut diag).unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values.get(TripPurpose::Commute).unwrap().occupants, 2.0);
        assert_eq!(diag.stats.skipped_rows, 1);
    }

    #[test]
    fn test_read_traffic_intensities() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "link_id,day_business,day_total,evening_freight\n1,240,300,12\n2,480,500,"
        )
        .unwrap();
        let mut diag = ImportDiagnostics::new();
        let intensities = read_traffic_intensities(file.path(), "link_id", &mut diag).unwrap();
        assert_eq!(intensities.len(), 2);
        assert_eq!(
            intensities.daily(LinkId::new(2), PartOfDay::Day, TripPurpose::Business),
            Some(480.0)
        );
        assert_eq!(
            intensities.daily(LinkId::new(2), PartOfDay::Evening, TripPurpose::Freight),
            None
        );
        assert_eq!(diag.stats.defaulted_values, 1);
    }

    #[test]
    fn test_wrong_link_id_column_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "rfid,day_business\n1,240").unwrap();
        let mut diag = ImportDiagnostics::new();
        let err = read_traffic_intensities(file.path(), "link_id", &mut diag).unwrap_err();
        assert!(err
            .chain()
            .any(|cause| cause.to_string().contains("link_id")));
    }
}
