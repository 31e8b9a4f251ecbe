//! # ra2ce-algo: Network Criticality and Losses Analyses
//!
//! Redundancy, economic losses and origin-destination accessibility of a road
//! network under hazard events.
//!
//! ## Analyses
//!
//! | Analysis | Entry point | Output |
//! |----------|-------------|--------|
//! | Single link redundancy | [`single_link_redundancy`] | detour per link |
//! | Multi link redundancy | [`multi_link_redundancy`] | detour per disrupted link and event |
//! | Single link losses | [`single_link_losses`] | vehicle loss hours per link and event |
//! | Multi link losses | [`multi_link_losses`] | same, links fail together |
//! | Optimal route OD | [`od::optimal_route_od`] | route per origin-destination pair |
//! | Multi link OD | [`od::multi_link_od`] | routes and impact per event |
//! | Origin closest destination | [`od::origin_closest_destination`] | access and people per link |
//!
//! Return-period events can be collapsed into an expected annual loss with
//! [`RiskIntegration`]; OD routes feed the [`traffic`] attribution.
//!
//! ## Architecture
//!
//! Analyses never mutate the [`RoadNetwork`](ra2ce_core::RoadNetwork). Link
//! removal is an [`EdgeMask`](ra2ce_core::EdgeMask) per event, so events and
//! links run in parallel with rayon and share one network.
//!
//! Edge weights come from [`WeighingAnalysis`]: plain length, or travel time
//! with per road type average speeds where an edge has none.
//!
//! ## Example
//!
//! ```ignore
//! use ra2ce_algo::runner::{init_tracing, run_from_path};
//!
//! init_tracing();
//! let summary = run_from_path("analyses.yaml".as_ref())?;
//! println!("{} ok, {} failed", summary.success, summary.failure);
//! ```

pub mod io;
pub mod losses;
pub mod manifest;
pub mod od;
pub mod redundancy;
pub mod risk;
pub mod runner;
pub mod test_utils;
pub mod traffic;
pub mod weighing;

pub use losses::{multi_link_losses, single_link_losses, LossesEngine, LossesInputs, LossesResult};
pub use redundancy::{
    multi_link_redundancy, single_link_redundancy, MultiLinkRedundancyResult, RedundancyResult,
    RedundancyRow,
};
pub use risk::RiskIntegration;
pub use runner::{init_tracing, run_analyses, RunSummary};
pub use weighing::{AverageSpeeds, WeighingAnalysis};
