//! Analysis configuration.
//!
//! A run is described by one [`AnalysisConfig`]: where the network and the OD
//! inputs live, and a list of [`AnalysisSection`]s executed one after the other.
//! Every field has a default so partial files stay valid; analyses check the
//! fields they need when they are constructed.

use crate::error::{Ra2ceError, Ra2ceResult};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    SingleLinkRedundancy,
    MultiLinkRedundancy,
    SingleLinkLosses,
    MultiLinkLosses,
    OptimalRouteOriginDestination,
    MultiLinkOriginDestination,
    OptimalRouteOriginClosestDestination,
    MultiLinkOriginClosestDestination,
}

impl AnalysisKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisKind::SingleLinkRedundancy => "single_link_redundancy",
            AnalysisKind::MultiLinkRedundancy => "multi_link_redundancy",
            AnalysisKind::SingleLinkLosses => "single_link_losses",
            AnalysisKind::MultiLinkLosses => "multi_link_losses",
            AnalysisKind::OptimalRouteOriginDestination => "optimal_route_origin_destination",
            AnalysisKind::MultiLinkOriginDestination => "multi_link_origin_destination",
            AnalysisKind::OptimalRouteOriginClosestDestination => {
                "optimal_route_origin_closest_destination"
            }
            AnalysisKind::MultiLinkOriginClosestDestination => {
                "multi_link_origin_closest_destination"
            }
        }
    }
}

/// Edge attribute minimized by shortest-path searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weighing {
    #[default]
    Length,
    Time,
}

impl Weighing {
    /// Column name used in result tables (`length`, `alt_length`, `diff_length`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            Weighing::Length => "length",
            Weighing::Time => "time",
        }
    }
}

impl fmt::Display for Weighing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartOfDay {
    #[default]
    Day,
    Evening,
}

impl PartOfDay {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartOfDay::Day => "day",
            PartOfDay::Evening => "evening",
        }
    }

    pub fn parse(value: &str) -> Option<PartOfDay> {
        match value.trim().to_ascii_lowercase().as_str() {
            "day" => Some(PartOfDay::Day),
            "evening" => Some(PartOfDay::Evening),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripPurpose {
    Business,
    Commute,
    Freight,
    Other,
}

impl TripPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripPurpose::Business => "business",
            TripPurpose::Commute => "commute",
            TripPurpose::Freight => "freight",
            TripPurpose::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<TripPurpose> {
        match value.trim().to_ascii_lowercase().as_str() {
            "business" => Some(TripPurpose::Business),
            "commute" => Some(TripPurpose::Commute),
            "freight" => Some(TripPurpose::Freight),
            "other" => Some(TripPurpose::Other),
            _ => None,
        }
    }
}

impl fmt::Display for TripPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    #[default]
    Event,
    ReturnPeriod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCalculationMode {
    #[default]
    None,
    Default,
    CutFromYear,
    TriangleToNullYear,
}

/// Which aggregated hazard column of the overlay is read (`EV1_ma`, `EV1_max`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateWl {
    #[default]
    None,
    Max,
    Mean,
    Min,
}

impl AggregateWl {
    pub fn suffix(&self) -> &'static str {
        match self {
            AggregateWl::None => "ma",
            AggregateWl::Max => "max",
            AggregateWl::Mean => "mean",
            AggregateWl::Min => "min",
        }
    }

    /// Whether a hazard column belongs to this aggregation (`RP100_max` for `Max`).
    pub fn matches(&self, hazard_column: &str) -> bool {
        hazard_column
            .rsplit_once('_')
            .is_some_and(|(_, suffix)| suffix == self.suffix())
    }
}

fn default_hours_per_day() -> f64 {
    24.0
}

fn default_trip_purposes() -> Vec<TripPurpose> {
    vec![
        TripPurpose::Business,
        TripPurpose::Commute,
        TripPurpose::Freight,
        TripPurpose::Other,
    ]
}

fn default_duration_event() -> f64 {
    1.0
}

/// Settings of one analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSection {
    pub name: String,
    pub analysis: AnalysisKind,
    #[serde(default)]
    pub weighing: Weighing,
    /// Hazard intensity above which a link is disrupted.
    #[serde(default)]
    pub threshold: f64,
    /// Hazard intensity above which a destination node is unreachable.
    #[serde(default)]
    pub threshold_destinations: Option<f64>,
    #[serde(default)]
    pub production_loss_per_capita_per_hour: f64,
    #[serde(default)]
    pub part_of_day: PartOfDay,
    #[serde(default = "default_hours_per_day")]
    pub hours_per_day: f64,
    #[serde(default = "default_trip_purposes")]
    pub trip_purposes: Vec<TripPurpose>,
    #[serde(default)]
    pub resilience_curves_file: Option<PathBuf>,
    #[serde(default)]
    pub traffic_intensities_file: Option<PathBuf>,
    #[serde(default)]
    pub values_of_time_file: Option<PathBuf>,
    #[serde(default)]
    pub equity_weight_file: Option<PathBuf>,
    #[serde(default)]
    pub save_traffic: bool,
    #[serde(default)]
    pub event_type: EventType,
    #[serde(default)]
    pub risk_calculation_mode: RiskCalculationMode,
    #[serde(default)]
    pub risk_calculation_year: u32,
    #[serde(default)]
    pub aggregate_wl: AggregateWl,
    /// Duration of the disruption in hours (no-detour production loss).
    #[serde(default = "default_duration_event")]
    pub duration_event: f64,
    #[serde(default)]
    pub save_csv: bool,
    #[serde(default)]
    pub save_parquet: bool,
}

impl AnalysisSection {
    pub fn new(name: impl Into<String>, analysis: AnalysisKind) -> Self {
        Self {
            name: name.into(),
            analysis,
            weighing: Weighing::default(),
            threshold: 0.0,
            threshold_destinations: None,
            production_loss_per_capita_per_hour: 0.0,
            part_of_day: PartOfDay::default(),
            hours_per_day: default_hours_per_day(),
            trip_purposes: default_trip_purposes(),
            resilience_curves_file: None,
            traffic_intensities_file: None,
            values_of_time_file: None,
            equity_weight_file: None,
            save_traffic: false,
            event_type: EventType::default(),
            risk_calculation_mode: RiskCalculationMode::default(),
            risk_calculation_year: 0,
            aggregate_wl: AggregateWl::default(),
            duration_event: default_duration_event(),
            save_csv: true,
            save_parquet: false,
        }
    }

    /// The three input files every losses analysis needs.
    pub fn losses_files(&self) -> Ra2ceResult<(&Path, &Path, &Path)> {
        match (
            self.traffic_intensities_file.as_deref(),
            self.resilience_curves_file.as_deref(),
            self.values_of_time_file.as_deref(),
        ) {
            (Some(intensities), Some(curves), Some(values)) => Ok((intensities, curves, values)),
            _ => Err(Ra2ceError::Config(format!(
                "analysis '{}': traffic_intensities_file, resilience_curves_file and values_of_time_file should be given",
                self.name
            ))),
        }
    }
}

fn default_link_id_column() -> String {
    "rfid".to_string()
}

fn default_link_type_column() -> String {
    "highway".to_string()
}

/// Network file and column conventions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSection {
    pub network_file: PathBuf,
    #[serde(default)]
    pub directed: bool,
    /// Edge attribute holding the link id(s).
    #[serde(default = "default_link_id_column")]
    pub link_id_column: String,
    /// Edge attribute holding the road type(s).
    #[serde(default = "default_link_type_column")]
    pub link_type_column: String,
}

impl NetworkSection {
    pub fn new(network_file: impl Into<PathBuf>) -> Self {
        Self {
            network_file: network_file.into(),
            directed: false,
            link_id_column: default_link_id_column(),
            link_type_column: default_link_type_column(),
        }
    }
}

fn default_origin_out_fraction() -> f64 {
    1.0
}

fn default_origins_names() -> String {
    "A".to_string()
}

fn default_destinations_names() -> String {
    "B".to_string()
}

/// Origin/destination inputs shared by the OD analyses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OriginsDestinationsSection {
    #[serde(default)]
    pub od_table_file: Option<PathBuf>,
    #[serde(default = "default_origins_names")]
    pub origins_names: String,
    #[serde(default = "default_destinations_names")]
    pub destinations_names: String,
    /// Node attribute holding the number of people at an origin.
    #[serde(default)]
    pub origin_count: Option<String>,
    #[serde(default = "default_origin_out_fraction")]
    pub origin_out_fraction: f64,
    /// Node attribute splitting destinations into categories.
    #[serde(default)]
    pub category: Option<String>,
}

impl Default for OriginsDestinationsSection {
    fn default() -> Self {
        Self {
            od_table_file: None,
            origins_names: default_origins_names(),
            destinations_names: default_destinations_names(),
            origin_count: None,
            origin_out_fraction: default_origin_out_fraction(),
            category: None,
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

/// A complete run description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub network: NetworkSection,
    #[serde(default)]
    pub origins_destinations: OriginsDestinationsSection,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Worker threads for per-event parallelism; 0 picks the CPU count.
    #[serde(default)]
    pub threads: usize,
    #[serde(default)]
    pub analyses: Vec<AnalysisSection>,
}

pub fn load_config_from_path(path: &Path) -> Result<AnalysisConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading analysis config '{}'", path.display()))?;
    debug!(path = %path.display(), "loading analysis config");
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
            serde_yaml::from_str(&data).context("parsing analysis config yaml")
        }
        Some(ext) if ext.eq_ignore_ascii_case("json") => {
            serde_json::from_str(&data).context("parsing analysis config json")
        }
        Some(ext) if ext.eq_ignore_ascii_case("toml") => {
            toml::from_str(&data).context("parsing analysis config toml")
        }
        _ => serde_yaml::from_str(&data)
            .or_else(|_| serde_json::from_str(&data))
            .context("parsing analysis config"),
    }
}
