//! `BloodBank`: the owned store instance behind every caller-facing operation.
//!
//! Lifecycle is `new` (fresh ledger, log and request registry, seed groups
//! applied) → operate → `shutdown` (consumes the instance and returns its
//! final state). There is no process-wide shared state.

use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use serde::Serialize;

use bloodbank_core::{BloodGroup, DomainError, DomainResult, DonorId, RequestId};
use bloodbank_donors::{Donor, DonorContact, DonorRegistry, NewDonor};
use bloodbank_inventory::{
    InMemoryTransactionLog, InventoryLedger, InventoryRecord, LedgerReceipt, LedgerSnapshot,
    LowStockAlert, Transaction, TransactionQuery, TransactionStore, can_fulfill,
    compute_low_stock, low_stock_alerts,
};
use bloodbank_requests::{BloodRequest, NewBloodRequest, Priority, RequestRegistry, RequestStatus};

use crate::config::BloodBankConfig;
use crate::dto::{
    AvailabilityRequest, CreateBloodRequestRequest, HistoryRequest, InitializeGroupRequest,
    StockMovementRequest, StockUpdate, parse_blood_group,
};

/// Everything the bank held when it was shut down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShutdownReport {
    pub inventory: LedgerSnapshot,
    pub transactions: Vec<Transaction>,
    pub requests: Vec<BloodRequest>,
    pub donors: Vec<Donor>,
}

#[derive(Debug)]
pub struct BloodBank {
    config: BloodBankConfig,
    ledger: InventoryLedger<Arc<InMemoryTransactionLog>>,
    requests: RequestRegistry,
    donors: DonorRegistry,
}

impl BloodBank {
    /// Build a fresh bank and initialize the configured seed groups.
    pub fn new(config: BloodBankConfig) -> DomainResult<Self> {
        let bank = Self {
            ledger: InventoryLedger::new(Arc::new(InMemoryTransactionLog::new())),
            requests: RequestRegistry::new(),
            donors: DonorRegistry::new(),
            config,
        };

        for seed in bank.config.seed_groups.clone() {
            let min_threshold = seed
                .min_threshold
                .unwrap_or(bank.config.default_min_threshold);
            bank.ledger
                .initialize(seed.blood_group, seed.quantity, min_threshold)?;
        }

        tracing::info!(groups = bank.config.seed_groups.len(), "blood bank started");
        Ok(bank)
    }

    pub fn config(&self) -> &BloodBankConfig {
        &self.config
    }

    /// Initialize every blood group that has no record yet, at zero stock and
    /// the default threshold. Returns how many groups were created.
    pub fn ensure_all_groups(&self) -> DomainResult<usize> {
        let existing = self.ledger.list_all()?;
        let mut created = 0;
        for group in BloodGroup::ALL {
            if existing.iter().any(|r| r.blood_group == group) {
                continue;
            }
            match self
                .ledger
                .initialize(group, 0, self.config.default_min_threshold)
            {
                Ok(_) => created += 1,
                // Someone else initialized it in the meantime.
                Err(DomainError::DuplicateGroup(_)) => {}
                Err(err) => return Err(err),
            }
        }
        Ok(created)
    }

    // -------------------------
    // Inventory reads
    // -------------------------

    pub fn inventory(&self) -> DomainResult<Vec<InventoryRecord>> {
        self.ledger.list_all()
    }

    pub fn inventory_for(&self, blood_group: &str) -> DomainResult<InventoryRecord> {
        self.ledger.query(parse_blood_group(blood_group)?)
    }

    pub fn low_stock(&self) -> DomainResult<Vec<InventoryRecord>> {
        self.ledger.low_stock()
    }

    pub fn low_stock_alerts(&self) -> DomainResult<Vec<LowStockAlert>> {
        let alerts = low_stock_alerts(&self.ledger.snapshot()?);
        for alert in &alerts {
            tracing::warn!(
                blood_group = %alert.blood_group,
                quantity = alert.current_quantity,
                min_threshold = alert.min_threshold,
                "{}",
                alert.message
            );
        }
        Ok(alerts)
    }

    /// Transaction history, most-recent-first, with the configured page size
    /// when no limit is given.
    pub fn history(&self, request: HistoryRequest) -> DomainResult<Vec<Transaction>> {
        let blood_group = request
            .blood_group
            .as_deref()
            .map(parse_blood_group)
            .transpose()?;
        if let (Some(start), Some(end)) = (request.start, request.end) {
            if start > end {
                return Err(DomainError::invalid_argument(
                    "history start must not be after end",
                ));
            }
        }

        let query = TransactionQuery {
            blood_group,
            kind: request.kind,
            occurred_after: request.start,
            occurred_before: request.end,
            limit: Some(self.config.effective_history_limit(request.limit)),
        };
        Ok(self.ledger.history(query)?.to_vec())
    }

    // -------------------------
    // Inventory writes
    // -------------------------

    pub fn initialize_group(&self, request: InitializeGroupRequest) -> DomainResult<InventoryRecord> {
        let blood_group = parse_blood_group(&request.blood_group)?;
        let min_threshold = request
            .min_threshold
            .unwrap_or(self.config.default_min_threshold);
        self.ledger
            .initialize(blood_group, request.quantity, min_threshold)
    }

    pub fn record_donation(&self, request: StockMovementRequest) -> DomainResult<StockUpdate> {
        let blood_group = parse_blood_group(&request.blood_group)?;
        let receipt = self
            .ledger
            .apply_donation(blood_group, request.quantity, request.remarks)?;
        self.stock_update(receipt)
    }

    /// Advisory check; `record_request` re-checks atomically before deducting.
    pub fn check_availability(&self, request: AvailabilityRequest) -> DomainResult<bool> {
        let blood_group = parse_blood_group(&request.blood_group)?;
        if request.quantity <= 0 {
            return Err(DomainError::invalid_argument("quantity must be positive"));
        }
        // A group never holds more than `u32::MAX` units.
        let available = match u32::try_from(request.quantity) {
            Ok(units) => can_fulfill(&self.ledger.snapshot()?, blood_group, units),
            Err(_) => false,
        };
        tracing::debug!(blood_group = %blood_group, units = request.quantity, available, "availability checked");
        Ok(available)
    }

    /// Check availability and deduct in one step.
    pub fn record_request(&self, request: StockMovementRequest) -> DomainResult<StockUpdate> {
        let blood_group = parse_blood_group(&request.blood_group)?;
        let receipt = self
            .ledger
            .apply_request(blood_group, request.quantity, request.remarks)?;
        self.stock_update(receipt)
    }

    // -------------------------
    // Blood requests
    // -------------------------

    pub fn create_request(&self, request: CreateBloodRequestRequest) -> DomainResult<BloodRequest> {
        let blood_group = parse_blood_group(&request.blood_group)?;
        let priority: Priority = request.priority.parse()?;
        let required_by = request.required_by.unwrap_or_else(|| {
            Utc::now() + Duration::hours(self.config.default_required_by_hours)
        });

        self.requests.create(NewBloodRequest {
            patient_name: request.patient_name,
            blood_group,
            units_required: request.units_required,
            hospital_name: request.hospital_name,
            priority,
            required_by: Some(required_by),
            contact_number: request.contact_number,
            remarks: request.remarks,
        })
    }

    pub fn get_request(&self, request_id: &str) -> DomainResult<BloodRequest> {
        self.requests.get(request_id.parse()?)
    }

    /// Pure status transition; never touches stock.
    pub fn update_request_status(&self, request_id: &str, status: &str) -> DomainResult<BloodRequest> {
        let request_id: RequestId = request_id.parse()?;
        let status: RequestStatus = status.parse()?;
        self.requests.update_status(request_id, status)
    }

    /// Deduct a pending request's units from stock, then mark it fulfilled.
    ///
    /// Both steps happen under the registry lock with the transition validated
    /// first, so either the stock is deducted and the request is `FULFILLED`,
    /// or neither changes.
    pub fn fulfill_request(&self, request_id: &str) -> DomainResult<(BloodRequest, StockUpdate)> {
        let request_id: RequestId = request_id.parse()?;
        let (request, receipt) =
            self.requests
                .transition_with(request_id, RequestStatus::Fulfilled, |request| {
                    self.ledger.apply_request(
                        request.blood_group(),
                        i64::from(request.units_required()),
                        Some(format!(
                            "Fulfilled request {} for {}",
                            request_id,
                            request.hospital_name()
                        )),
                    )
                })?;
        Ok((request, self.stock_update(receipt)?))
    }

    pub fn requests(&self, status: Option<&str>, hospital_name: Option<&str>) -> DomainResult<Vec<BloodRequest>> {
        let status: Option<RequestStatus> = status.map(str::parse).transpose()?;
        let mut found = match status {
            Some(status) => self.requests.by_status(status)?,
            None => self.requests.list_all()?,
        };
        if let Some(hospital) = hospital_name {
            let hospital = hospital.trim();
            found.retain(|r| r.hospital_name().eq_ignore_ascii_case(hospital));
        }
        Ok(found)
    }

    pub fn pending_requests_by_priority(&self) -> DomainResult<Vec<BloodRequest>> {
        self.requests.pending_by_priority()
    }

    pub fn request_registry(&self) -> &RequestRegistry {
        &self.requests
    }

    // -------------------------
    // Donors
    // -------------------------

    pub fn register_donor(&self, donor: NewDonor, today: NaiveDate) -> DomainResult<Donor> {
        self.donors.register(donor, today, &self.config.eligibility)
    }

    pub fn get_donor(&self, donor_id: &str) -> DomainResult<Donor> {
        self.donors.get(donor_id.parse()?)
    }

    /// All donors in registration order, optionally restricted to one group.
    pub fn donors(&self, blood_group: Option<&str>) -> DomainResult<Vec<Donor>> {
        match blood_group {
            Some(code) => self.donors.by_blood_group(parse_blood_group(code)?),
            None => self.donors.list_all(),
        }
    }

    pub fn eligible_donors(&self) -> DomainResult<Vec<Donor>> {
        self.donors.eligible()
    }

    pub fn update_donor_contact(&self, donor_id: &str, contact: DonorContact) -> DomainResult<Donor> {
        self.donors.update_contact(donor_id.parse()?, contact)
    }

    pub fn set_donor_eligibility(&self, donor_id: &str, eligible: bool) -> DomainResult<Donor> {
        self.donors.set_eligible(donor_id.parse()?, eligible)
    }

    pub fn remove_donor(&self, donor_id: &str) -> DomainResult<Donor> {
        self.donors.remove(donor_id.parse()?)
    }

    /// Record a donation on a donor's behalf after checking their eligibility.
    ///
    /// The donor is only updated once the ledger has accepted the donation.
    pub fn record_donor_donation(&self, donor_id: &str, units: i64, today: NaiveDate) -> DomainResult<(Donor, StockUpdate)> {
        let donor_id: DonorId = donor_id.parse()?;
        let (donor, receipt) = self.donors.record_donation_with(
            donor_id,
            today,
            &self.config.eligibility,
            |donor| {
                self.ledger.apply_donation(
                    donor.blood_group(),
                    units,
                    Some(format!("Donation by donor {}", donor.name())),
                )
            },
        )?;
        Ok((donor, self.stock_update(receipt)?))
    }

    // -------------------------
    // Lifecycle
    // -------------------------

    pub fn shutdown(self) -> DomainResult<ShutdownReport> {
        let requests = self.requests.list_all()?;
        let donors = self.donors.list_all()?;
        let (inventory, log) = self.ledger.teardown()?;
        let transactions = log.history(TransactionQuery::all())?.to_vec();
        tracing::info!(
            groups = inventory.records.len(),
            transactions = transactions.len(),
            requests = requests.len(),
            donors = donors.len(),
            "blood bank shut down"
        );
        Ok(ShutdownReport {
            inventory,
            transactions,
            requests,
            donors,
        })
    }

    fn stock_update(&self, receipt: LedgerReceipt) -> DomainResult<StockUpdate> {
        let snapshot = self.ledger.snapshot()?;
        let low_stock_alerts = low_stock_alerts(&snapshot);
        if compute_low_stock(&snapshot)
            .iter()
            .any(|r| r.blood_group == receipt.record.blood_group)
        {
            tracing::warn!(
                blood_group = %receipt.record.blood_group,
                quantity = receipt.record.quantity,
                min_threshold = receipt.record.min_threshold,
                "blood group at or below minimum threshold"
            );
        }
        Ok(StockUpdate {
            record: receipt.record,
            transaction: receipt.transaction,
            low_stock_alerts,
        })
    }
}
