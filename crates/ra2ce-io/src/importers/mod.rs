//! Readers for the RA2CE input files.
//!
//! Every reader collects recoverable problems (skipped rows, defaulted values)
//! in an [`ImportDiagnostics`](ra2ce_core::ImportDiagnostics) and fails only on
//! missing files, missing required columns or values that cannot be parsed.
//!
//! | Input | Separator | Reader |
//! |-------|-----------|--------|
//! | Road network (node-link JSON) | - | [`load_network_json`] |
//! | Resilience curves | `;` | [`read_resilience_curves`] |
//! | Values of time | `;` | [`read_time_values`] |
//! | Traffic intensities | `,` | [`read_traffic_intensities`] |
//! | OD table (CSV or feather) | auto | [`read_od_table`] |
//! | Equity weights | auto | [`read_equity_weights`] |

use anyhow::{bail, Result};
use ra2ce_core::config::NetworkSection;

pub mod csv_table;
pub mod equity_weights;
pub mod losses_tables;
pub mod network_json;
pub mod od_table;

pub use csv_table::{detect_separator, CsvTable};
pub use equity_weights::read_equity_weights;
pub use losses_tables::{read_resilience_curves, read_time_values, read_traffic_intensities};
pub use network_json::{load_network_json, value_to_attr, ImportResult};
pub use od_table::read_od_table;

/// Loads the network named by the section, picking the reader from the file extension.
pub fn load_network(section: &NetworkSection) -> Result<ImportResult> {
    let path = section.network_file.as_path();
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => load_network_json(path, section),
        Some(ext) => bail!(
            "unsupported network format '.{ext}' for '{}' (expected node-link .json)",
            path.display()
        ),
        None => bail!("network file '{}' has no extension", path.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_network_extension() {
        let section = NetworkSection::new("network.gpkg");
        let err = load_network(&section).unwrap_err();
        assert!(err.to_string().contains(".gpkg"));
    }
}
