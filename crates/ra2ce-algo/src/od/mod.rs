//! Origin-destination analyses on the road network.
//!
//! | Analysis | Entry point |
//! |----------|-------------|
//! | optimal route between every origin and destination | [`optimal_route_od`] |
//! | the same routes under each hazard, with an impact summary | [`multi_link_od`] |
//! | closest destination per origin (and category) | [`origin_closest_destination`] |
//! | closest destination under each hazard | [`multi_link_origin_closest_destination`] |
//!
//! Origins and destinations are the network nodes whose OD labels belong to
//! the configured group names (`A_0`, `B_3`, ...).

pub mod closest_destination;
pub mod multi_link_od;
pub mod optimal_route;

pub use closest_destination::{
    multi_link_origin_closest_destination, origin_closest_destination, AccessSummary,
    ClosestDestinationResult, ClosestRoute, ClosestRun, Reach, NO_HAZARD,
};
pub use multi_link_od::{multi_link_od, HazardImpact, IncreaseStats, MultiLinkOdResult, PairImpact};
pub use optimal_route::{find_routes, optimal_route_od, OdNodes, OdRouteRecord, OdRoutesResult};
