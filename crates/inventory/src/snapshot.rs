use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bloodbank_core::BloodGroup;

use crate::record::InventoryRecord;

/// Copy of the ledger's records, in group insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSnapshot {
    pub records: Vec<InventoryRecord>,
    pub taken_at: DateTime<Utc>,
}

impl LedgerSnapshot {
    pub fn new(records: Vec<InventoryRecord>, taken_at: DateTime<Utc>) -> Self {
        Self { records, taken_at }
    }

    pub fn get(&self, blood_group: BloodGroup) -> Option<&InventoryRecord> {
        self.records.iter().find(|r| r.blood_group == blood_group)
    }

    pub fn iter(&self) -> impl Iterator<Item = &InventoryRecord> {
        self.records.iter()
    }

    /// Total units held across all groups.
    pub fn total_units(&self) -> u64 {
        self.records.iter().map(|r| u64::from(r.quantity)).sum()
    }
}
