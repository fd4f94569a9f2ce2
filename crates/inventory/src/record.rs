use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bloodbank_core::{Aggregate, AggregateRoot, BloodGroup, DomainError, TransactionId};
use bloodbank_events::Event;

/// Current stock of one blood group, as seen by callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryRecord {
    pub blood_group: BloodGroup,
    pub quantity: u32,
    pub min_threshold: u32,
    pub last_updated: DateTime<Utc>,
}

impl InventoryRecord {
    /// Whether this group is at or below its alert threshold.
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.min_threshold
    }
}

/// Aggregate root: the stock held for a single blood group.
///
/// Quantities are unsigned, and every decrement is checked in `handle` before
/// it is applied, so a committed stock level can never go negative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupStock {
    blood_group: BloodGroup,
    quantity: u32,
    min_threshold: u32,
    last_updated: Option<DateTime<Utc>>,
    version: u64,
    initialized: bool,
}

impl GroupStock {
    /// Create an empty, not-yet-initialized instance for the given group.
    pub fn empty(blood_group: BloodGroup) -> Self {
        Self {
            blood_group,
            quantity: 0,
            min_threshold: 0,
            last_updated: None,
            version: 0,
            initialized: false,
        }
    }

    pub fn blood_group(&self) -> BloodGroup {
        self.blood_group
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn min_threshold(&self) -> u32 {
        self.min_threshold
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Caller-facing view; `None` until the group has been initialized.
    pub fn record(&self) -> Option<InventoryRecord> {
        let last_updated = self.last_updated?;
        if !self.initialized {
            return None;
        }
        Some(InventoryRecord {
            blood_group: self.blood_group,
            quantity: self.quantity,
            min_threshold: self.min_threshold,
            last_updated,
        })
    }
}

impl AggregateRoot for GroupStock {
    type Id = BloodGroup;

    fn id(&self) -> &Self::Id {
        &self.blood_group
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: InitializeGroup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitializeGroup {
    pub blood_group: BloodGroup,
    pub quantity: i64,
    pub min_threshold: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RecordDonation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordDonation {
    pub blood_group: BloodGroup,
    pub transaction_id: TransactionId,
    pub units: i64,
    pub remarks: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RecordRequest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRequest {
    pub blood_group: BloodGroup,
    pub transaction_id: TransactionId,
    pub units: i64,
    pub remarks: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryCommand {
    InitializeGroup(InitializeGroup),
    RecordDonation(RecordDonation),
    RecordRequest(RecordRequest),
}

/// Event: GroupInitialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupInitialized {
    pub blood_group: BloodGroup,
    pub quantity: u32,
    pub min_threshold: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Event: DonationRecorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonationRecorded {
    pub blood_group: BloodGroup,
    pub transaction_id: TransactionId,
    pub units: u32,
    pub remarks: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: RequestRecorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestRecorded {
    pub blood_group: BloodGroup,
    pub transaction_id: TransactionId,
    pub units: u32,
    pub remarks: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryEvent {
    GroupInitialized(GroupInitialized),
    DonationRecorded(DonationRecorded),
    RequestRecorded(RequestRecorded),
}

impl Event for InventoryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            InventoryEvent::GroupInitialized(_) => "inventory.group.initialized",
            InventoryEvent::DonationRecorded(_) => "inventory.donation.recorded",
            InventoryEvent::RequestRecorded(_) => "inventory.request.recorded",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            InventoryEvent::GroupInitialized(e) => e.occurred_at,
            InventoryEvent::DonationRecorded(e) => e.occurred_at,
            InventoryEvent::RequestRecorded(e) => e.occurred_at,
        }
    }
}

impl Aggregate for GroupStock {
    type Command = InventoryCommand;
    type Event = InventoryEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            InventoryEvent::GroupInitialized(e) => {
                self.blood_group = e.blood_group;
                self.quantity = e.quantity;
                self.min_threshold = e.min_threshold;
                self.last_updated = Some(e.occurred_at);
                self.initialized = true;
            }
            InventoryEvent::DonationRecorded(e) => {
                self.quantity = self.quantity.saturating_add(e.units);
                self.last_updated = Some(e.occurred_at);
            }
            InventoryEvent::RequestRecorded(e) => {
                self.quantity = self.quantity.saturating_sub(e.units);
                self.last_updated = Some(e.occurred_at);
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            InventoryCommand::InitializeGroup(cmd) => self.handle_initialize(cmd),
            InventoryCommand::RecordDonation(cmd) => self.handle_donation(cmd),
            InventoryCommand::RecordRequest(cmd) => self.handle_request(cmd),
        }
    }
}

fn non_negative(field: &str, value: i64) -> Result<u32, DomainError> {
    if value < 0 {
        return Err(DomainError::invalid_argument(format!(
            "{field} cannot be negative"
        )));
    }
    u32::try_from(value)
        .map_err(|_| DomainError::invalid_argument(format!("{field} is out of range")))
}

fn positive_units(units: i64) -> Result<u32, DomainError> {
    if units <= 0 {
        return Err(DomainError::invalid_argument("units must be positive"));
    }
    u32::try_from(units).map_err(|_| DomainError::invalid_argument("units is out of range"))
}

fn remarks_or_default(remarks: &Option<String>, kind: &str) -> String {
    match remarks.as_deref().map(str::trim) {
        Some(r) if !r.is_empty() => r.to_string(),
        _ => format!("Inventory updated via {kind}"),
    }
}

impl GroupStock {
    fn ensure_initialized(&self, blood_group: BloodGroup) -> Result<(), DomainError> {
        if !self.initialized || self.blood_group != blood_group {
            return Err(DomainError::UnknownGroup(blood_group));
        }
        Ok(())
    }

    fn handle_initialize(&self, cmd: &InitializeGroup) -> Result<Vec<InventoryEvent>, DomainError> {
        if self.initialized {
            return Err(DomainError::DuplicateGroup(cmd.blood_group));
        }
        let quantity = non_negative("quantity", cmd.quantity)?;
        let min_threshold = non_negative("min_threshold", cmd.min_threshold)?;

        Ok(vec![InventoryEvent::GroupInitialized(GroupInitialized {
            blood_group: cmd.blood_group,
            quantity,
            min_threshold,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_donation(&self, cmd: &RecordDonation) -> Result<Vec<InventoryEvent>, DomainError> {
        self.ensure_initialized(cmd.blood_group)?;
        let units = positive_units(cmd.units)?;

        if self.quantity.checked_add(units).is_none() {
            return Err(DomainError::invalid_argument("donation would overflow stock"));
        }

        Ok(vec![InventoryEvent::DonationRecorded(DonationRecorded {
            blood_group: cmd.blood_group,
            transaction_id: cmd.transaction_id,
            units,
            remarks: remarks_or_default(&cmd.remarks, "DONATION"),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_request(&self, cmd: &RecordRequest) -> Result<Vec<InventoryEvent>, DomainError> {
        self.ensure_initialized(cmd.blood_group)?;
        let units = positive_units(cmd.units)?;

        if units > self.quantity {
            return Err(DomainError::InsufficientStock {
                blood_group: cmd.blood_group,
                requested: units,
                available: self.quantity,
            });
        }

        Ok(vec![InventoryEvent::RequestRecorded(RequestRecorded {
            blood_group: cmd.blood_group,
            transaction_id: cmd.transaction_id,
            units,
            remarks: remarks_or_default(&cmd.remarks, "REQUEST"),
            occurred_at: cmd.occurred_at,
        })])
    }
}
