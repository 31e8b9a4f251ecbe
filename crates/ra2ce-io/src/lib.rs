//! # ra2ce-io: RA2CE input and output
//!
//! Reads the road network and the tabular inputs of the losses and
//! origin-destination analyses, and writes result tables.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ra2ce_core::config::NetworkSection;
//! use ra2ce_io::importers::load_network;
//!
//! fn main() -> anyhow::Result<()> {
//!     let result = load_network(&NetworkSection::new("static/output_graph/base_graph.json"))?;
//!     println!("edges: {}", result.network.edge_count());
//!     println!("{}", result.diagnostics.summary());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `ipc` (default): feather/Arrow IPC OD tables
//! - `parquet` (default): Parquet result tables
//!
//! ## Error Handling
//!
//! Readers return [`anyhow::Result`] with the file name in the context chain.
//! Missing required columns are raised as a
//! [`Ra2ceError::Config`](ra2ce_core::Ra2ceError::Config) inside the anyhow
//! error, so callers can `downcast_ref` when they need the class.

pub mod exporters;
pub mod importers;

pub use exporters::{persist_dataframe, save_network_json, OutputFormats};
pub use importers::{load_network, load_network_json, ImportResult};
