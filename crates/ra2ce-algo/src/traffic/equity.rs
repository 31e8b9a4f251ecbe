use super::analysis::{OdRecordRef, TrafficAnalysis};
use super::AccumulatedTraffic;
use ra2ce_core::inputs::{EquityWeights, OdTable};

/// Traffic with a prioritarian score: trips weighted by the equity weight of
/// the origin's region. Regions without a weight count as 1.
#[derive(Debug)]
pub struct EquityTraffic<'a> {
    od_table: &'a OdTable,
    destinations_names: &'a str,
    weights: &'a EquityWeights,
}

impl<'a> EquityTraffic<'a> {
    pub fn new(
        od_table: &'a OdTable,
        destinations_names: &'a str,
        weights: &'a EquityWeights,
    ) -> Self {
        Self {
            od_table,
            destinations_names,
            weights,
        }
    }
}

impl TrafficAnalysis for EquityTraffic<'_> {
    fn od_table(&self) -> &OdTable {
        self.od_table
    }

    fn destinations_names(&self) -> &str {
        self.destinations_names
    }

    fn has_prioritarian(&self) -> bool {
        true
    }

    fn contribution(&self, origin: &OdRecordRef<'_>, destination_count: f64) -> AccumulatedTraffic {
        let per_destination = origin.values / destination_count;
        AccumulatedTraffic::new(
            per_destination,
            1.0,
            per_destination * self.weights.weight(origin.region),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traffic::{traffic_analysis, OdRoute};
    use ra2ce_core::inputs::OdRecord;
    use ra2ce_core::NodeId;

    fn od_table() -> OdTable {
        OdTable::new(vec![
            OdRecord::origin("A_0", 100.0).with_region("north"),
            OdRecord::origin("A_1", 100.0).with_region("south"),
            OdRecord::destination("B_0"),
            OdRecord::destination("B_1"),
            OdRecord::destination("B_2"),
            OdRecord::destination("B_3"),
        ])
        .unwrap()
    }

    fn route(origin: &str) -> OdRoute {
        OdRoute {
            origin: origin.into(),
            destination: "B_0".into(),
            path: vec![NodeId::new(1), NodeId::new(2)],
        }
    }

    #[test]
    fn test_weighted_region() {
        let table = od_table();
        let weights: EquityWeights = [("north".to_string(), 2.0)].into_iter().collect();
        let analysis = traffic_analysis(&table, "B", Some(&weights));
        assert!(analysis.has_prioritarian());

        let traffic = analysis.optimal_route_od_link(&[route("A_0")]).unwrap();
        let link = traffic.get(NodeId::new(1), NodeId::new(2)).unwrap();
        assert_eq!(link.utilitarian, 25.0);
        assert_eq!(link.prioritarian, 50.0);
    }

    #[test]
    fn test_unweighted_region_counts_once() {
        let table = od_table();
        let weights: EquityWeights = [("north".to_string(), 2.0)].into_iter().collect();
        let analysis = EquityTraffic::new(&table, "B", &weights);
        let traffic = analysis.optimal_route_od_link(&[route("A_1")]).unwrap();
        let link = traffic.get(NodeId::new(1), NodeId::new(2)).unwrap();
        assert_eq!(link.prioritarian, 25.0);
        let df = traffic.to_dataframe().unwrap();
        assert!(df.column("traffic_prioritarian").is_ok());
    }

    #[test]
    fn test_factory_without_weights_is_utilitarian() {
        let table = od_table();
        let empty = EquityWeights::new();
        assert!(!traffic_analysis(&table, "B", Some(&empty)).has_prioritarian());
        assert!(!traffic_analysis(&table, "B", None).has_prioritarian());
    }
}
