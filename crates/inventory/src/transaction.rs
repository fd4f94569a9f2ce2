use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bloodbank_core::{BloodGroup, TransactionId};
use bloodbank_events::Event;

use crate::record::InventoryEvent;

/// What kind of stock movement a transaction records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    Donation,
    Request,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionKind::Donation => "DONATION",
            TransactionKind::Request => "REQUEST",
        }
    }

    /// Signed effect on stock for `units` of this kind.
    pub fn signed_delta(self, units: u32) -> i64 {
        match self {
            TransactionKind::Donation => i64::from(units),
            TransactionKind::Request => -i64::from(units),
        }
    }
}

impl core::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable record of one accepted donation or request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    pub blood_group: BloodGroup,
    pub quantity: u32,
    pub kind: TransactionKind,
    pub timestamp: DateTime<Utc>,
    pub remarks: Option<String>,
}

impl Transaction {
    /// The transaction an inventory event stands for, if it moves stock.
    pub fn from_event(event: &InventoryEvent) -> Option<Self> {
        let (id, blood_group, quantity, kind, remarks) = match event {
            InventoryEvent::GroupInitialized(_) => return None,
            InventoryEvent::DonationRecorded(e) => (
                e.transaction_id,
                e.blood_group,
                e.units,
                TransactionKind::Donation,
                &e.remarks,
            ),
            InventoryEvent::RequestRecorded(e) => (
                e.transaction_id,
                e.blood_group,
                e.units,
                TransactionKind::Request,
                &e.remarks,
            ),
        };
        Some(Self {
            id,
            blood_group,
            quantity,
            kind,
            timestamp: event.occurred_at(),
            remarks: Some(remarks.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{GroupInitialized, RequestRecorded};

    #[test]
    fn initialization_is_not_a_transaction() {
        let event = InventoryEvent::GroupInitialized(GroupInitialized {
            blood_group: BloodGroup::APos,
            quantity: 3,
            min_threshold: 1,
            occurred_at: Utc::now(),
        });
        assert!(Transaction::from_event(&event).is_none());
    }

    #[test]
    fn request_event_maps_to_request_transaction() {
        let id = TransactionId::new();
        let event = InventoryEvent::RequestRecorded(RequestRecorded {
            blood_group: BloodGroup::BNeg,
            transaction_id: id,
            units: 4,
            remarks: "surgery".to_string(),
            occurred_at: Utc::now(),
        });
        let tx = Transaction::from_event(&event).unwrap();
        assert_eq!(tx.id, id);
        assert_eq!(tx.kind, TransactionKind::Request);
        assert_eq!(tx.quantity, 4);
        assert_eq!(tx.kind.signed_delta(tx.quantity), -4);
    }

    #[test]
    fn kind_serializes_upper_case() {
        assert_eq!(
            serde_json::to_string(&TransactionKind::Donation).unwrap(),
            "\"DONATION\""
        );
    }
}
