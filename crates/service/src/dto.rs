//! Plain input records accepted by `BloodBank`.
//!
//! Blood groups, statuses and priorities arrive as text and are parsed here;
//! a malformed code is an `InvalidArgument`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bloodbank_core::{BloodGroup, DomainResult};
use bloodbank_inventory::{InventoryRecord, LowStockAlert, Transaction, TransactionKind};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeGroupRequest {
    pub blood_group: String,
    #[serde(default)]
    pub quantity: i64,
    pub min_threshold: Option<i64>,
}

/// Donation or request against one group.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockMovementRequest {
    pub blood_group: String,
    pub quantity: i64,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityRequest {
    pub blood_group: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRequest {
    pub blood_group: Option<String>,
    pub kind: Option<TransactionKind>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBloodRequestRequest {
    pub patient_name: String,
    pub blood_group: String,
    pub units_required: i64,
    pub hospital_name: String,
    pub priority: String,
    pub required_by: Option<DateTime<Utc>>,
    pub contact_number: String,
    pub remarks: Option<String>,
}

// -------------------------
// Response DTOs
// -------------------------

/// Result of an accepted donation or request, with the low-stock view
/// recomputed right after the mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockUpdate {
    pub record: InventoryRecord,
    pub transaction: Transaction,
    pub low_stock_alerts: Vec<LowStockAlert>,
}

pub fn parse_blood_group(code: &str) -> DomainResult<BloodGroup> {
    code.parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bloodbank_core::DomainError;

    #[test]
    fn deserializes_movement_with_optional_remarks() {
        let req: StockMovementRequest =
            serde_json::from_str(r#"{"bloodGroup":"AB-","quantity":4}"#).unwrap();
        assert_eq!(req.blood_group, "AB-");
        assert_eq!(req.quantity, 4);
        assert!(req.remarks.is_none());
    }

    #[test]
    fn history_request_accepts_kind_filter() {
        let req: HistoryRequest =
            serde_json::from_str(r#"{"kind":"REQUEST","limit":10}"#).unwrap();
        assert_eq!(req.kind, Some(TransactionKind::Request));
        assert_eq!(req.limit, Some(10));
    }

    #[test]
    fn unknown_code_is_invalid_argument() {
        assert!(matches!(
            parse_blood_group("Z+"),
            Err(DomainError::InvalidArgument(_))
        ));
    }
}
