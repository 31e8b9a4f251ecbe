use crate::io::{write_outputs, AnalysisOutput};
use crate::losses::{multi_link_losses, single_link_losses, LossesInputs};
use crate::manifest::{write_run_manifest, AnalysisRecord, RunManifest};
use crate::od::{
    multi_link_od, multi_link_origin_closest_destination, optimal_route_od,
    origin_closest_destination, ClosestDestinationResult,
};
use crate::redundancy::{multi_link_redundancy, single_link_redundancy};
use crate::traffic::traffic_analysis;
use crate::weighing::WeighingAnalysis;
use anyhow::{Context, Result};
use chrono::Utc;
use ra2ce_core::config::{
    load_config_from_path, AnalysisConfig, AnalysisKind, AnalysisSection, Weighing,
};
use ra2ce_core::inputs::{EquityWeights, OdTable};
use ra2ce_core::{ImportDiagnostics, Ra2ceError, RoadNetwork};
use ra2ce_io::importers::{load_network, read_equity_weights, read_od_table};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Installs a `fmt` subscriber filtered by `RUST_LOG` (default `info`).
/// Calling it again is a no-op.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// Counts and manifest location of a finished run.
#[derive(Debug)]
pub struct RunSummary {
    pub success: usize,
    pub failure: usize,
    pub manifest_path: PathBuf,
    pub analyses: Vec<AnalysisRecord>,
}

/// Inputs shared by every analysis of a run.
struct RunContext<'a> {
    config: &'a AnalysisConfig,
    network: RoadNetwork,
    od_table: Option<OdTable>,
}

impl RunContext<'_> {
    fn require_od_table(&self, section: &AnalysisSection) -> Result<&OdTable> {
        self.od_table.as_ref().ok_or_else(|| {
            Ra2ceError::Config(format!(
                "analysis '{}' needs origins_destinations.od_table_file",
                section.name
            ))
            .into()
        })
    }
}

pub fn run_from_path(path: &Path) -> Result<RunSummary> {
    let config = load_config_from_path(path)?;
    run_analyses(&config)
}

/// Runs every configured analysis in parallel.
///
/// The network and OD table are loaded once; a failing analysis is logged
/// and recorded in `run_manifest.json` without stopping the others.
pub fn run_analyses(config: &AnalysisConfig) -> Result<RunSummary> {
    fs::create_dir_all(&config.output_dir).with_context(|| {
        format!("creating output directory '{}'", config.output_dir.display())
    })?;

    let imported = load_network(&config.network)?;
    info!(
        nodes = imported.network.node_count(),
        edges = imported.network.edge_count(),
        diagnostics = %imported.diagnostics.summary(),
        "network loaded"
    );
    let mut network = imported.network;
    if config
        .analyses
        .iter()
        .any(|section| section.weighing == Weighing::Time)
    {
        let time_weighing = WeighingAnalysis::for_network(Weighing::Time, &network);
        let timed = time_weighing.extend_graph(&mut network);
        info!(edges = timed.len(), "travel times added to the network");
    }

    let od_table = match &config.origins_destinations.od_table_file {
        Some(path) => {
            let mut diag = ImportDiagnostics::new();
            let table = read_od_table(path, &mut diag)?;
            info!(rows = table.len(), diagnostics = %diag.summary(), "OD table loaded");
            Some(table)
        }
        None => None,
    };

    let context = RunContext {
        config,
        network,
        od_table,
    };

    let thread_count = if config.threads == 0 {
        num_cpus::get()
    } else {
        config.threads
    };
    let pool = ThreadPoolBuilder::new()
        .num_threads(thread_count)
        .build()
        .context("building Rayon thread pool for analyses")?;

    let records: Vec<AnalysisRecord> = pool.install(|| {
        config
            .analyses
            .par_iter()
            .map(|section| run_recorded(&context, section))
            .collect()
    });

    let success = records.iter().filter(|record| record.is_ok()).count();
    let failure = records.len() - success;
    let manifest = RunManifest {
        created_at: Utc::now(),
        network: config.network.network_file.display().to_string(),
        num_analyses: records.len(),
        success,
        failure,
        analyses: records.clone(),
    };
    let manifest_path = config.output_dir.join("run_manifest.json");
    write_run_manifest(&manifest_path, &manifest)?;
    info!(success, failure, manifest = %manifest_path.display(), "run finished");
    Ok(RunSummary {
        success,
        failure,
        manifest_path,
        analyses: records,
    })
}

fn run_recorded(context: &RunContext<'_>, section: &AnalysisSection) -> AnalysisRecord {
    let started = Instant::now();
    info!(analysis = %section.name, kind = section.analysis.as_str(), "analysis started");
    let outcome = run_analysis(context, section)
        .and_then(|outputs| write_outputs(&context.config.output_dir, section, outputs));
    let (status, error, outputs) = match outcome {
        Ok(paths) => (
            "ok".to_string(),
            None,
            paths.iter().map(|p| p.display().to_string()).collect(),
        ),
        Err(err) => {
            let message = format!("{err:#}");
            error!(analysis = %section.name, error = %message, "analysis failed");
            ("error".to_string(), Some(message), Vec::new())
        }
    };
    AnalysisRecord {
        name: section.name.clone(),
        analysis: section.analysis.as_str().to_string(),
        status,
        error,
        outputs,
        seconds: started.elapsed().as_secs_f64(),
    }
}

fn run_analysis(
    context: &RunContext<'_>,
    section: &AnalysisSection,
) -> Result<Vec<AnalysisOutput>> {
    let network = &context.network;
    let od = &context.config.origins_destinations;
    let weighing = WeighingAnalysis::for_network(section.weighing, network);
    let hazards = network.hazard_columns(section.aggregate_wl);
    let needs_hazards = !matches!(
        section.analysis,
        AnalysisKind::SingleLinkRedundancy
            | AnalysisKind::OptimalRouteOriginDestination
            | AnalysisKind::OptimalRouteOriginClosestDestination
    );
    if needs_hazards && hazards.is_empty() {
        warn!(
            analysis = %section.name,
            aggregate = section.aggregate_wl.suffix(),
            "no hazard columns for this aggregation"
        );
    }

    let outputs = match section.analysis {
        AnalysisKind::SingleLinkRedundancy => {
            let result = single_link_redundancy(network, &weighing);
            vec![AnalysisOutput::main(result.to_dataframe()?)]
        }
        AnalysisKind::MultiLinkRedundancy => {
            let result = multi_link_redundancy(network, &weighing, &hazards, section.threshold);
            vec![
                AnalysisOutput::main(result.to_dataframe()?),
                AnalysisOutput::named("all_links", result.to_full_dataframe(network)?),
            ]
        }
        AnalysisKind::SingleLinkLosses | AnalysisKind::MultiLinkLosses => {
            let link_id_column = &context.config.network.link_id_column;
            let (inputs, diag) = LossesInputs::load(section, link_id_column)?;
            if diag.diagnostics.has_issues() {
                warn!(
                    analysis = %section.name,
                    diagnostics = %diag.summary(),
                    "losses inputs imported with issues"
                );
            }
            let result = if section.analysis == AnalysisKind::SingleLinkLosses {
                single_link_losses(network, section, &inputs, &weighing)?
            } else {
                multi_link_losses(network, section, &inputs, &weighing)?
            };
            vec![
                AnalysisOutput::main(result.to_dataframe()?),
                AnalysisOutput::named("per_event", result.to_long_dataframe()?),
            ]
        }
        AnalysisKind::OptimalRouteOriginDestination => {
            let result = optimal_route_od(network, od, context.od_table.as_ref(), &weighing);
            let mut outputs = vec![AnalysisOutput::main(result.to_dataframe()?)];
            if section.save_traffic {
                let table = context.require_od_table(section)?;
                let weights = load_equity_weights(section)?;
                let traffic = traffic_analysis(table, &od.destinations_names, weights.as_ref())
                    .optimal_route_od_link(&result.od_routes())
                    .with_context(|| format!("analysis '{}': traffic", section.name))?;
                outputs.push(AnalysisOutput::named("link_traffic", traffic.to_dataframe()?));
            }
            outputs
        }
        AnalysisKind::MultiLinkOriginDestination => {
            let result = multi_link_od(
                network,
                od,
                context.od_table.as_ref(),
                &weighing,
                &hazards,
                section.threshold,
            );
            vec![
                AnalysisOutput::main(result.to_dataframe()?),
                AnalysisOutput::named("impact", result.impact_dataframe()?),
                AnalysisOutput::named("pairs", result.pairs_dataframe()?),
            ]
        }
        AnalysisKind::OptimalRouteOriginClosestDestination => {
            let result =
                origin_closest_destination(network, od, context.od_table.as_ref(), &weighing);
            closest_outputs(&result, network)?
        }
        AnalysisKind::MultiLinkOriginClosestDestination => {
            let result = multi_link_origin_closest_destination(
                network,
                od,
                context.od_table.as_ref(),
                &weighing,
                &hazards,
                section.threshold,
                section.threshold_destinations,
            )
            .with_context(|| format!("analysis '{}'", section.name))?;
            closest_outputs(&result, network)?
        }
    };
    Ok(outputs)
}

fn closest_outputs(
    result: &ClosestDestinationResult,
    network: &RoadNetwork,
) -> Result<Vec<AnalysisOutput>> {
    Ok(vec![
        AnalysisOutput::named("origins", result.origins_dataframe()?),
        AnalysisOutput::named("edges", result.edges_dataframe(network)?),
        AnalysisOutput::named("destinations", result.destinations_dataframe()?),
        AnalysisOutput::named("summary", result.summary_dataframe()?),
    ])
}

fn load_equity_weights(section: &AnalysisSection) -> Result<Option<EquityWeights>> {
    let Some(path) = section.equity_weight_file.as_deref() else {
        return Ok(None);
    };
    let mut diag = ImportDiagnostics::new();
    let weights = read_equity_weights(path, &mut diag)
        .with_context(|| format!("analysis '{}': equity weights", section.name))?;
    info!(analysis = %section.name, regions = weights.len(), "equity weights loaded");
    Ok(Some(weights))
}
