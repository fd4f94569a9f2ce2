//! Availability predicate over a ledger snapshot.
//!
//! Advisory only: to act on the answer, use `InventoryLedger::apply_request`,
//! which repeats this check under the group lock.

use bloodbank_core::BloodGroup;

use crate::snapshot::LedgerSnapshot;

/// `true` iff `blood_group` has a record holding at least `units`.
pub fn can_fulfill(snapshot: &LedgerSnapshot, blood_group: BloodGroup, units: u32) -> bool {
    snapshot
        .get(blood_group)
        .is_some_and(|r| r.quantity >= units)
}
