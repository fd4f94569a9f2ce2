//! The authoritative per-group stock store.
//!
//! Each blood group's record lives behind its own mutex, so mutations of one
//! group are serialized while different groups proceed in parallel. Every
//! stock-moving mutation runs decide → apply → append entirely under that
//! mutex, which makes the availability check in `apply_request` and the
//! decrement a single indivisible step, and keeps per-group log order equal to
//! mutation order.

use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Utc};

use bloodbank_core::{
    Aggregate, AggregateRoot, BloodGroup, DomainError, DomainResult, TransactionId,
};
use bloodbank_events::Event;

use crate::availability;
use crate::log::{TransactionHistory, TransactionQuery, TransactionStore};
use crate::low_stock;
use crate::record::{
    GroupStock, InitializeGroup, InventoryCommand, InventoryRecord, RecordDonation, RecordRequest,
};
use crate::snapshot::LedgerSnapshot;
use crate::transaction::Transaction;

/// Outcome of an accepted donation or request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerReceipt {
    /// Record state right after the mutation.
    pub record: InventoryRecord,
    /// The transaction appended for it.
    pub transaction: Transaction,
}

#[derive(Debug)]
struct GroupSlot {
    blood_group: BloodGroup,
    stock: Mutex<GroupStock>,
}

/// Inventory ledger over an owned transaction store.
#[derive(Debug)]
pub struct InventoryLedger<L> {
    slots: RwLock<Vec<Arc<GroupSlot>>>,
    log: L,
}

fn slots_poisoned<T>(_: T) -> DomainError {
    DomainError::storage("inventory index lock poisoned")
}

fn record_poisoned<T>(_: T) -> DomainError {
    DomainError::storage("inventory record lock poisoned")
}

impl<L> InventoryLedger<L>
where
    L: TransactionStore,
{
    pub fn new(log: L) -> Self {
        Self {
            slots: RwLock::new(Vec::new()),
            log,
        }
    }

    pub fn log(&self) -> &L {
        &self.log
    }

    /// Create the record for `blood_group`.
    pub fn initialize(
        &self,
        blood_group: BloodGroup,
        quantity: i64,
        min_threshold: i64,
    ) -> DomainResult<InventoryRecord> {
        let mut slots = self.slots.write().map_err(slots_poisoned)?;
        if slots.iter().any(|s| s.blood_group == blood_group) {
            tracing::warn!(blood_group = %blood_group, "blood group already initialized");
            return Err(DomainError::DuplicateGroup(blood_group));
        }

        let mut stock = GroupStock::empty(blood_group);
        let events = stock.handle(&InventoryCommand::InitializeGroup(InitializeGroup {
            blood_group,
            quantity,
            min_threshold,
            occurred_at: Utc::now(),
        }))?;
        for e in &events {
            stock.apply(e);
            tracing::debug!(event_type = e.event_type(), version = stock.version(), "event applied");
        }
        let record = stock
            .record()
            .ok_or_else(|| DomainError::storage("initialized group produced no record"))?;

        slots.push(Arc::new(GroupSlot {
            blood_group,
            stock: Mutex::new(stock),
        }));

        tracing::info!(
            blood_group = %blood_group,
            quantity = record.quantity,
            min_threshold = record.min_threshold,
            "blood group initialized"
        );
        Ok(record)
    }

    /// Add `units` donated units to `blood_group`.
    pub fn apply_donation(
        &self,
        blood_group: BloodGroup,
        units: i64,
        remarks: Option<String>,
    ) -> DomainResult<LedgerReceipt> {
        self.execute(blood_group, |occurred_at| {
            InventoryCommand::RecordDonation(RecordDonation {
                blood_group,
                transaction_id: TransactionId::new(),
                units,
                remarks,
                occurred_at,
            })
        })
    }

    /// Check availability and deduct `units` from `blood_group` as one atomic step.
    ///
    /// Fails with `InsufficientStock` (state and log untouched) when the group
    /// holds fewer than `units`.
    pub fn apply_request(
        &self,
        blood_group: BloodGroup,
        units: i64,
        remarks: Option<String>,
    ) -> DomainResult<LedgerReceipt> {
        self.execute(blood_group, |occurred_at| {
            InventoryCommand::RecordRequest(RecordRequest {
                blood_group,
                transaction_id: TransactionId::new(),
                units,
                remarks,
                occurred_at,
            })
        })
    }

    pub fn query(&self, blood_group: BloodGroup) -> DomainResult<InventoryRecord> {
        let slot = self
            .slot(blood_group)?
            .ok_or(DomainError::UnknownGroup(blood_group))?;
        let stock = slot.stock.lock().map_err(record_poisoned)?;
        stock.record().ok_or(DomainError::UnknownGroup(blood_group))
    }

    /// All records in the order their groups were initialized.
    pub fn list_all(&self) -> DomainResult<Vec<InventoryRecord>> {
        let slots: Vec<Arc<GroupSlot>> = self.slots.read().map_err(slots_poisoned)?.clone();

        let mut records = Vec::with_capacity(slots.len());
        for slot in slots {
            let stock = slot.stock.lock().map_err(record_poisoned)?;
            if let Some(record) = stock.record() {
                records.push(record);
            }
        }
        Ok(records)
    }

    pub fn snapshot(&self) -> DomainResult<LedgerSnapshot> {
        Ok(LedgerSnapshot::new(self.list_all()?, Utc::now()))
    }

    /// Advisory availability check; see `apply_request` for the atomic form.
    pub fn can_fulfill(&self, blood_group: BloodGroup, units: u32) -> DomainResult<bool> {
        Ok(availability::can_fulfill(&self.snapshot()?, blood_group, units))
    }

    pub fn low_stock(&self) -> DomainResult<Vec<InventoryRecord>> {
        Ok(low_stock::compute_low_stock(&self.snapshot()?))
    }

    pub fn history(&self, query: TransactionQuery) -> DomainResult<TransactionHistory> {
        self.log.history(query)
    }

    /// End the ledger's lifecycle, handing back its final state and the log.
    pub fn teardown(self) -> DomainResult<(LedgerSnapshot, L)> {
        let snapshot = self.snapshot()?;
        tracing::info!(groups = snapshot.records.len(), "inventory ledger torn down");
        Ok((snapshot, self.log))
    }

    fn slot(&self, blood_group: BloodGroup) -> DomainResult<Option<Arc<GroupSlot>>> {
        let slots = self.slots.read().map_err(slots_poisoned)?;
        Ok(slots.iter().find(|s| s.blood_group == blood_group).cloned())
    }

    fn execute<F>(&self, blood_group: BloodGroup, build: F) -> DomainResult<LedgerReceipt>
    where
        F: FnOnce(DateTime<Utc>) -> InventoryCommand,
    {
        let slot = self
            .slot(blood_group)?
            .ok_or(DomainError::UnknownGroup(blood_group))?;
        let mut stock = slot.stock.lock().map_err(record_poisoned)?;

        // Stamp under the lock so per-group timestamps never run backwards.
        let now = Utc::now();
        let occurred_at = stock.last_updated().map_or(now, |last| now.max(last));
        let command = build(occurred_at);

        let events = stock.handle(&command).inspect_err(|err| match err {
            DomainError::InsufficientStock {
                requested, available, ..
            } => tracing::warn!(
                blood_group = %blood_group,
                requested,
                available,
                "request rejected: insufficient stock"
            ),
            other => tracing::debug!(blood_group = %blood_group, error = %other, "mutation rejected"),
        })?;

        let (event_type, transaction) = events
            .iter()
            .find_map(|e| Transaction::from_event(e).map(|tx| (e.event_type(), tx)))
            .ok_or_else(|| DomainError::storage("stock mutation produced no transaction"))?;

        let before = stock.clone();
        for e in &events {
            stock.apply(e);
        }
        if let Err(err) = self.log.append(transaction.clone()) {
            *stock = before;
            tracing::error!(blood_group = %blood_group, error = %err, "append failed; mutation rolled back");
            return Err(err);
        }

        let record = stock
            .record()
            .ok_or(DomainError::UnknownGroup(blood_group))?;
        tracing::info!(
            blood_group = %blood_group,
            kind = %transaction.kind,
            units = transaction.quantity,
            quantity = record.quantity,
            transaction_id = %transaction.id,
            event_type,
            version = stock.version(),
            "stock updated"
        );
        Ok(LedgerReceipt { record, transaction })
    }
}
