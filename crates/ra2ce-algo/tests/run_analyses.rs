use polars::prelude::{CsvReader, DataType, SerReader};
use ra2ce_algo::manifest::load_run_manifest;
use ra2ce_algo::runner::run_from_path;
use std::fs;
use std::path::{Path, PathBuf};

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

/// Values of one CSV column, read back with polars.
fn csv_column(path: &Path, column: &str) -> Vec<f64> {
    let df = CsvReader::from_path(path)
        .unwrap()
        .has_header(true)
        .finish()
        .unwrap();
    df.column(column)
        .unwrap()
        .cast(&DataType::Float64)
        .unwrap()
        .f64()
        .unwrap()
        .into_iter()
        .map(|value| value.unwrap_or(f64::NAN))
        .collect()
}

/// Triangle 1-2-3; link 1 (1-2, 10 m) is flooded and detours over 1-3-2 (12 m).
fn fixture(dir: &Path) -> PathBuf {
    let network = write(
        dir,
        "network.json",
        r#"{"nodes": [{"id": 1, "od_id": "A_0"}, {"id": 2, "od_id": "B_0"}, {"id": 3}],
            "links": [
              {"source": 1, "target": 2, "rfid": 1, "length": 10.0, "highway": "motorway", "EV1_ma": 0.3},
              {"source": 1, "target": 3, "rfid": 2, "length": 5.0, "highway": "motorway", "EV1_ma": 0.0},
              {"source": 3, "target": 2, "rfid": 3, "length": 7.0, "highway": "motorway", "EV1_ma": 0.0}
            ]}"#,
    );
    let curves = write(
        dir,
        "resilience_curves.csv",
        "link_type_hazard_intensity;duration_steps;functionality_loss_ratio\n\
         motorway_0.2-0.5;[3.0, 5.0];[1.0, 0.4]\n",
    );
    let values = write(
        dir,
        "values_of_time.csv",
        "trip_types;value_of_time;occupants\nbusiness;5;1\n",
    );
    let intensities = write(
        dir,
        "traffic_intensities.csv",
        "rfid,day_business\n1,240\n2,240\n3,240\n",
    );
    let od_table = write(dir, "od_table.csv", "o_id,d_id,values\nA_0,,100\n,B_0,\n");
    let output = dir.join("output");

    let config = format!(
        r#"
network:
  network_file: {network}
origins_destinations:
  od_table_file: {od_table}
output_dir: {output}
threads: 2
analyses:
  - name: sll
    analysis: single_link_losses
    threshold: 0.1
    trip_purposes: [business]
    resilience_curves_file: {curves}
    traffic_intensities_file: {intensities}
    values_of_time_file: {values}
  - name: slr
    analysis: single_link_redundancy
  - name: mlr
    analysis: multi_link_redundancy
    threshold: 0.1
  - name: od
    analysis: optimal_route_origin_destination
    save_traffic: true
  - name: broken
    analysis: multi_link_losses
"#,
        network = network.display(),
        od_table = od_table.display(),
        output = output.display(),
        curves = curves.display(),
        intensities = intensities.display(),
        values = values.display(),
    );
    write(dir, "analyses.yaml", &config)
}

#[test]
fn run_writes_tables_and_isolates_failures() {
    let dir = tempfile::tempdir().unwrap();
    let config = fixture(dir.path());
    let summary = run_from_path(&config).unwrap();

    assert_eq!(summary.success, 4);
    assert_eq!(summary.failure, 1);
    let broken = summary
        .analyses
        .iter()
        .find(|record| record.name == "broken")
        .unwrap();
    assert!(broken
        .error
        .as_deref()
        .unwrap()
        .contains("values_of_time_file"));

    let output = dir.path().join("output");
    let losses = csv_column(
        &output.join("single_link_losses").join("sll.csv"),
        "vlh_EV1_ma_total",
    );
    assert_eq!(losses.len(), 3);
    assert!((losses[0] - 500.0).abs() < 1e-9);
    assert_eq!(losses[1], 0.0);

    let diff = csv_column(
        &output.join("multi_link_redundancy").join("mlr.csv"),
        "diff_length",
    );
    assert_eq!(diff, vec![2.0]);

    let traffic = csv_column(
        &output
            .join("optimal_route_origin_destination")
            .join("od_link_traffic.csv"),
        "traffic",
    );
    assert_eq!(traffic, vec![100.0]);

    let manifest = load_run_manifest(&summary.manifest_path).unwrap();
    assert_eq!(manifest.num_analyses, 5);
    assert_eq!(manifest.failure, 1);
}
