use crate::error::{Ra2ceError, Ra2ceResult};
use crate::OdId;
use std::collections::{BTreeSet, HashMap};

/// One row of the origin/destination table. A row is either an origin or a destination.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OdRecord {
    pub o_id: Option<OdId>,
    pub d_id: Option<OdId>,
    pub region: Option<String>,
    /// Trips, people or any count attached to the location.
    pub values: f64,
    pub category: Option<String>,
}

impl OdRecord {
    pub fn origin(id: impl Into<String>, values: f64) -> Self {
        Self {
            o_id: Some(OdId::new(id)),
            values,
            ..Self::default()
        }
    }

    pub fn destination(id: impl Into<String>) -> Self {
        Self {
            d_id: Some(OdId::new(id)),
            ..Self::default()
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct OdTable {
    records: Vec<OdRecord>,
    origin_index: HashMap<OdId, usize>,
}

impl OdTable {
    /// Builds the table, rejecting repeated origin ids.
    pub fn new(records: Vec<OdRecord>) -> Ra2ceResult<Self> {
        let mut origin_index = HashMap::new();
        for (row, record) in records.iter().enumerate() {
            if let Some(o_id) = &record.o_id {
                if origin_index.insert(o_id.clone(), row).is_some() {
                    return Err(Ra2ceError::Parse(format!(
                        "origin id '{o_id}' appears more than once in the OD table"
                    )));
                }
            }
        }
        Ok(Self {
            records,
            origin_index,
        })
    }

    pub fn records(&self) -> &[OdRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn origin(&self, id: &OdId) -> Option<&OdRecord> {
        self.origin_index.get(id).map(|row| &self.records[*row])
    }

    /// Number of distinct non-null destination ids.
    pub fn destination_count(&self) -> usize {
        self.records
            .iter()
            .filter_map(|record| record.d_id.as_ref())
            .collect::<BTreeSet<_>>()
            .len()
    }

    pub fn destinations(&self) -> impl Iterator<Item = &OdRecord> {
        self.records.iter().filter(|record| record.d_id.is_some())
    }
}
