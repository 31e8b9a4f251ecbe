//! Losses: vehicle loss hours of links disrupted by hazard events.
//!
//! A losses analysis runs the matching redundancy analysis first and then
//! prices every disrupted link with [`LossesEngine`]. Links an event leaves
//! alone get a zero loss, so each link appears once per event.
//!
//! ## Output columns
//!
//! | Column | Meaning |
//! |--------|---------|
//! | `vlh_<purpose>_<event>` | loss of one trip purpose |
//! | `vlh_<event>_total` | sum over trip purposes |
//! | `risk_vlh_total` | expected annual loss, return-period events only |

pub mod engine;
pub mod multi_link;
pub mod single_link;

pub use engine::{Detour, LinkLoss, LossesEngine};
pub use multi_link::multi_link_losses;
pub use single_link::single_link_losses;

use crate::risk::RiskIntegration;
use anyhow::{Context, Result};
use polars::prelude::{DataFrame, NamedFrom, Series};
use ra2ce_core::config::{AnalysisSection, EventType, TripPurpose};
use ra2ce_core::inputs::{ResilienceCurves, TimeValues, TrafficIntensities};
use ra2ce_core::{
    Diagnostics, EdgeIndex, EdgeView, HazardColumn, ImportDiagnostics, NodeId, Ra2ceError,
    Ra2ceResult, RoadNetwork,
};
use ra2ce_io::importers::{read_resilience_curves, read_time_values, read_traffic_intensities};
use tracing::{info, warn};

/// The three tables every losses analysis reads.
#[derive(Debug, Clone, Default)]
pub struct LossesInputs {
    pub intensities: TrafficIntensities,
    pub curves: ResilienceCurves,
    pub values: TimeValues,
}

impl LossesInputs {
    /// Reads the files named in the section. A missing file setting is a
    /// configuration error raised before any routing happens.
    pub fn load(
        section: &AnalysisSection,
        link_id_column: &str,
    ) -> Result<(Self, ImportDiagnostics)> {
        let (intensities_file, curves_file, values_file) = section.losses_files()?;
        let mut diag = ImportDiagnostics::new();
        let curves = read_resilience_curves(curves_file, &mut diag)
            .with_context(|| format!("analysis '{}': resilience curves", section.name))?;
        let values = read_time_values(values_file, &mut diag)
            .with_context(|| format!("analysis '{}': values of time", section.name))?;
        let intensities = read_traffic_intensities(intensities_file, link_id_column, &mut diag)
            .with_context(|| format!("analysis '{}': traffic intensities", section.name))?;
        info!(
            analysis = %section.name,
            curves = curves.len(),
            trip_types = values.len(),
            links = intensities.len(),
            diagnostics = %diag.summary(),
            "losses inputs loaded"
        );
        Ok((
            Self {
                intensities,
                curves,
                values,
            },
            diag,
        ))
    }
}

/// Prices every link for every event. `detour_of` returns `None` for links
/// the event leaves in place.
pub(crate) fn price_events<F>(
    network: &RoadNetwork,
    engine: &LossesEngine<'_>,
    hazards: &[String],
    detour_of: F,
) -> Ra2ceResult<LossesResult>
where
    F: Fn(&str, &EdgeView<'_>) -> Option<Detour>,
{
    let mut diagnostics = Diagnostics::new();
    let mut rows = Vec::with_capacity(hazards.len() * network.edge_count());
    for hazard in hazards {
        for view in network.edges() {
            let intensity = view.data.hazard(hazard);
            let loss = match (detour_of(hazard, &view), intensity) {
                (Some(detour), Some(value)) => {
                    Some(engine.link_loss(view.data, value, detour, &mut diagnostics)?)
                }
                _ => None,
            };
            let disrupted = loss.is_some();
            let (per_purpose, total) = match loss {
                Some(loss) => (loss.per_purpose, loss.total),
                None => (engine.no_loss(), 0.0),
            };
            rows.push(LossRow {
                edge: view.index,
                u: view.u,
                v: view.v,
                key: view.key,
                link_id: view.data.link_id_label(),
                hazard: hazard.clone(),
                intensity,
                disrupted,
                per_purpose,
                total,
            });
        }
    }
    if diagnostics.has_issues() {
        warn!(diagnostics = %diagnostics.summary(), "losses computed with issues");
    }
    Ok(LossesResult {
        purposes: engine.purposes().to_vec(),
        hazards: hazards.to_vec(),
        rows,
        risk: None,
        diagnostics,
    })
}

/// Adds `risk_vlh_total` for return-period events when a mode is set.
pub(crate) fn apply_risk(result: &mut LossesResult, section: &AnalysisSection) -> Ra2ceResult<()> {
    if section.event_type != EventType::ReturnPeriod {
        return Ok(());
    }
    if let Some(integration) =
        RiskIntegration::from_mode(section.risk_calculation_mode, section.risk_calculation_year)
    {
        result.integrate_risk(integration)?;
    }
    Ok(())
}

/// Loss of one link for one hazard event.
#[derive(Debug, Clone, PartialEq)]
pub struct LossRow {
    pub edge: EdgeIndex,
    pub u: NodeId,
    pub v: NodeId,
    pub key: usize,
    pub link_id: String,
    pub hazard: String,
    pub intensity: Option<f64>,
    /// Whether the event disrupted the link.
    pub disrupted: bool,
    /// Aligned with [`LossesResult::purposes`].
    pub per_purpose: Vec<f64>,
    pub total: f64,
}

/// Losses of every link for every hazard event, grouped by event.
#[derive(Debug, Clone)]
pub struct LossesResult {
    pub purposes: Vec<TripPurpose>,
    pub hazards: Vec<String>,
    pub rows: Vec<LossRow>,
    /// Expected annual loss per link, in the order of the first event's rows.
    pub risk: Option<Vec<f64>>,
    pub diagnostics: Diagnostics,
}

impl LossesResult {
    pub fn rows_for<'a>(&'a self, hazard: &'a str) -> impl Iterator<Item = &'a LossRow> + 'a {
        self.rows.iter().filter(move |row| row.hazard == hazard)
    }

    /// Sum of the totals of one event.
    pub fn event_total(&self, hazard: &str) -> f64 {
        self.rows_for(hazard).map(|row| row.total).sum()
    }

    pub fn disrupted_count(&self, hazard: &str) -> usize {
        self.rows_for(hazard).filter(|row| row.disrupted).count()
    }

    /// Integrates the per-link totals over the return periods of the events.
    pub fn integrate_risk(&mut self, integration: RiskIntegration) -> Ra2ceResult<()> {
        let periods: Vec<(usize, f64)> = self
            .hazards
            .iter()
            .enumerate()
            .filter_map(|(i, name)| {
                HazardColumn::parse(name)
                    .and_then(|column| column.return_period())
                    .map(|rp| (i, f64::from(rp)))
            })
            .collect();
        if periods.is_empty() {
            return Err(Ra2ceError::Config(
                "risk calculation needs return period hazard columns (RP<n>_<agg>)".to_string(),
            ));
        }

        let links = self.link_count();
        let mut risk = Vec::with_capacity(links);
        for link in 0..links {
            let samples: Vec<(f64, f64)> = periods
                .iter()
                .map(|(event, rp)| (*rp, self.rows[event * links + link].total))
                .collect();
            risk.push(integration.integrate(&samples)?);
        }
        self.risk = Some(risk);
        Ok(())
    }

    fn link_count(&self) -> usize {
        match self.hazards.first() {
            Some(first) => self.rows_for(first).count(),
            None => 0,
        }
    }

    pub fn summary(&self) -> String {
        let events: Vec<String> = self
            .hazards
            .iter()
            .map(|h| {
                format!(
                    "{h}: {} disrupted, total {:.2}",
                    self.disrupted_count(h),
                    self.event_total(h)
                )
            })
            .collect();
        format!("{} links; {}", self.link_count(), events.join("; "))
    }

    /// One row per link and event with `vlh_<purpose>` and `vlh_total`.
    pub fn to_long_dataframe(&self) -> Result<DataFrame> {
        let rows = &self.rows;
        let mut columns = vec![
            Series::new("u", rows.iter().map(|r| r.u.value()).collect::<Vec<_>>()),
            Series::new("v", rows.iter().map(|r| r.v.value()).collect::<Vec<_>>()),
            Series::new("key", rows.iter().map(|r| r.key as u64).collect::<Vec<_>>()),
            Series::new(
                "link_id",
                rows.iter().map(|r| r.link_id.clone()).collect::<Vec<_>>(),
            ),
            Series::new(
                "hazard",
                rows.iter().map(|r| r.hazard.clone()).collect::<Vec<_>>(),
            ),
            Series::new(
                "intensity",
                rows.iter().map(|r| r.intensity).collect::<Vec<_>>(),
            ),
        ];
        for (i, purpose) in self.purposes.iter().enumerate() {
            columns.push(Series::new(
                &format!("vlh_{purpose}"),
                rows.iter().map(|r| r.per_purpose[i]).collect::<Vec<_>>(),
            ));
        }
        columns.push(Series::new(
            "vlh_total",
            rows.iter().map(|r| r.total).collect::<Vec<_>>(),
        ));
        Ok(DataFrame::new(columns)?)
    }

    /// One row per link; loss columns per event, then `risk_vlh_total`.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let links = self.link_count();
        let first: Vec<&LossRow> = self.rows.iter().take(links).collect();
        let mut columns = vec![
            Series::new("u", first.iter().map(|r| r.u.value()).collect::<Vec<_>>()),
            Series::new("v", first.iter().map(|r| r.v.value()).collect::<Vec<_>>()),
            Series::new("key", first.iter().map(|r| r.key as u64).collect::<Vec<_>>()),
            Series::new(
                "link_id",
                first.iter().map(|r| r.link_id.clone()).collect::<Vec<_>>(),
            ),
        ];
        for (event, hazard) in self.hazards.iter().enumerate() {
            let rows = &self.rows[event * links..(event + 1) * links];
            for (i, purpose) in self.purposes.iter().enumerate() {
                columns.push(Series::new(
                    &format!("vlh_{purpose}_{hazard}"),
                    rows.iter().map(|r| r.per_purpose[i]).collect::<Vec<_>>(),
                ));
            }
            columns.push(Series::new(
                &format!("vlh_{hazard}_total"),
                rows.iter().map(|r| r.total).collect::<Vec<_>>(),
            ));
        }
        if let Some(risk) = &self.risk {
            columns.push(Series::new("risk_vlh_total", risk.clone()));
        }
        Ok(DataFrame::new(columns)?)
    }
}
