//! Low-stock detection, derived on demand from a ledger snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bloodbank_core::BloodGroup;

use crate::record::InventoryRecord;
use crate::snapshot::LedgerSnapshot;

/// Records with `quantity <= min_threshold`, lowest quantity first.
///
/// Ties keep the snapshot's group insertion order.
pub fn compute_low_stock(snapshot: &LedgerSnapshot) -> Vec<InventoryRecord> {
    let mut low: Vec<InventoryRecord> = snapshot
        .iter()
        .filter(|r| r.is_low_stock())
        .cloned()
        .collect();
    low.sort_by_key(|r| r.quantity);
    low
}

/// Operator-facing alert for one low-stock group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LowStockAlert {
    pub blood_group: BloodGroup,
    pub current_quantity: u32,
    pub min_threshold: u32,
    pub message: String,
    pub detected_at: DateTime<Utc>,
}

impl LowStockAlert {
    pub fn for_record(record: &InventoryRecord, detected_at: DateTime<Utc>) -> Self {
        Self {
            blood_group: record.blood_group,
            current_quantity: record.quantity,
            min_threshold: record.min_threshold,
            message: format!(
                "LOW INVENTORY ALERT: {} is below minimum threshold. Current quantity: {}",
                record.blood_group, record.quantity
            ),
            detected_at,
        }
    }
}

/// Alerts for every low-stock group, in the same order as `compute_low_stock`.
pub fn low_stock_alerts(snapshot: &LedgerSnapshot) -> Vec<LowStockAlert> {
    compute_low_stock(snapshot)
        .iter()
        .map(|r| LowStockAlert::for_record(r, snapshot.taken_at))
        .collect()
}
