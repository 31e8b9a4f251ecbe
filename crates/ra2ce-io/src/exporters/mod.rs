//! Writers for result tables and networks.

pub mod network_json;
pub mod table;

pub use network_json::{network_to_json, save_network_json};
pub use table::{persist_dataframe, OutputFormats};
