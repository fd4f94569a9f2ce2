use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use bloodbank_core::{Aggregate, AggregateRoot, BloodGroup, DomainError, RequestId};
use bloodbank_events::Event;

/// How far after creation a request is due when the caller gives no date.
pub const DEFAULT_REQUIRED_BY_HOURS: i64 = 24;

/// Request status lifecycle.
///
/// `Pending` is the only non-terminal state; it may move to `Fulfilled` or
/// `Cancelled`, and nothing leaves a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Pending,
    Fulfilled,
    Cancelled,
}

impl RequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Pending => "PENDING",
            RequestStatus::Fulfilled => "FULFILLED",
            RequestStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }

    pub fn can_transition_to(self, target: RequestStatus) -> bool {
        matches!(
            (self, target),
            (RequestStatus::Pending, RequestStatus::Fulfilled)
                | (RequestStatus::Pending, RequestStatus::Cancelled)
        )
    }
}

impl core::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for RequestStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(RequestStatus::Pending),
            "FULFILLED" => Ok(RequestStatus::Fulfilled),
            "CANCELLED" => Ok(RequestStatus::Cancelled),
            _ => Err(DomainError::invalid_argument(format!(
                "status must be one of: PENDING, FULFILLED, CANCELLED (got {s:?})"
            ))),
        }
    }
}

/// Request priority. Informational and for ordering only; it never affects
/// which transitions are legal. Declaration order is urgency order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl core::str::FromStr for Priority {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HIGH" => Ok(Priority::High),
            "MEDIUM" => Ok(Priority::Medium),
            "LOW" => Ok(Priority::Low),
            _ => Err(DomainError::invalid_argument(format!(
                "priority must be one of: HIGH, MEDIUM, LOW (got {s:?})"
            ))),
        }
    }
}

/// Aggregate root: a hospital's blood request.
///
/// Tracks the request only. Moving to `Fulfilled` does not touch stock; the
/// caller deducts units through the inventory ledger first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BloodRequest {
    id: RequestId,
    patient_name: String,
    blood_group: BloodGroup,
    units_required: u32,
    hospital_name: String,
    priority: Priority,
    status: RequestStatus,
    required_by: DateTime<Utc>,
    contact_number: String,
    remarks: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip)]
    version: u64,
    #[serde(skip)]
    created: bool,
}

impl BloodRequest {
    /// Create an empty, not-yet-created aggregate instance.
    pub fn empty(id: RequestId) -> Self {
        let epoch = DateTime::<Utc>::UNIX_EPOCH;
        Self {
            id,
            patient_name: String::new(),
            blood_group: BloodGroup::OPos,
            units_required: 0,
            hospital_name: String::new(),
            priority: Priority::Medium,
            status: RequestStatus::Pending,
            required_by: epoch,
            contact_number: String::new(),
            remarks: None,
            created_at: epoch,
            updated_at: epoch,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> RequestId {
        self.id
    }

    pub fn patient_name(&self) -> &str {
        &self.patient_name
    }

    pub fn blood_group(&self) -> BloodGroup {
        self.blood_group
    }

    pub fn units_required(&self) -> u32 {
        self.units_required
    }

    pub fn hospital_name(&self) -> &str {
        &self.hospital_name
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn status(&self) -> RequestStatus {
        self.status
    }

    pub fn required_by(&self) -> DateTime<Utc> {
        self.required_by
    }

    pub fn contact_number(&self) -> &str {
        &self.contact_number
    }

    pub fn remarks(&self) -> Option<&str> {
        self.remarks.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_created(&self) -> bool {
        self.created
    }
}

impl AggregateRoot for BloodRequest {
    type Id = RequestId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateRequest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRequest {
    pub request_id: RequestId,
    pub patient_name: String,
    pub blood_group: BloodGroup,
    pub units_required: i64,
    pub hospital_name: String,
    pub priority: Priority,
    pub required_by: Option<DateTime<Utc>>,
    pub contact_number: String,
    pub remarks: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateStatus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateStatus {
    pub request_id: RequestId,
    pub status: RequestStatus,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestCommand {
    CreateRequest(CreateRequest),
    UpdateStatus(UpdateStatus),
}

/// Event: RequestCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestCreated {
    pub request_id: RequestId,
    pub patient_name: String,
    pub blood_group: BloodGroup,
    pub units_required: u32,
    pub hospital_name: String,
    pub priority: Priority,
    pub required_by: DateTime<Utc>,
    pub contact_number: String,
    pub remarks: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: RequestFulfilled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestFulfilled {
    pub request_id: RequestId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: RequestCancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestCancelled {
    pub request_id: RequestId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestEvent {
    RequestCreated(RequestCreated),
    RequestFulfilled(RequestFulfilled),
    RequestCancelled(RequestCancelled),
}

impl Event for RequestEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RequestEvent::RequestCreated(_) => "requests.request.created",
            RequestEvent::RequestFulfilled(_) => "requests.request.fulfilled",
            RequestEvent::RequestCancelled(_) => "requests.request.cancelled",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            RequestEvent::RequestCreated(e) => e.occurred_at,
            RequestEvent::RequestFulfilled(e) => e.occurred_at,
            RequestEvent::RequestCancelled(e) => e.occurred_at,
        }
    }
}

impl Aggregate for BloodRequest {
    type Command = RequestCommand;
    type Event = RequestEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            RequestEvent::RequestCreated(e) => {
                self.id = e.request_id;
                self.patient_name = e.patient_name.clone();
                self.blood_group = e.blood_group;
                self.units_required = e.units_required;
                self.hospital_name = e.hospital_name.clone();
                self.priority = e.priority;
                self.status = RequestStatus::Pending;
                self.required_by = e.required_by;
                self.contact_number = e.contact_number.clone();
                self.remarks = e.remarks.clone();
                self.created_at = e.occurred_at;
                self.updated_at = e.occurred_at;
                self.created = true;
            }
            RequestEvent::RequestFulfilled(e) => {
                self.status = RequestStatus::Fulfilled;
                self.updated_at = e.occurred_at;
            }
            RequestEvent::RequestCancelled(e) => {
                self.status = RequestStatus::Cancelled;
                self.updated_at = e.occurred_at;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            RequestCommand::CreateRequest(cmd) => self.handle_create(cmd),
            RequestCommand::UpdateStatus(cmd) => self.handle_update_status(cmd),
        }
    }
}

fn required_text(field: &str, value: &str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::invalid_argument(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

fn valid_contact_number(value: &str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.len() != 10 || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DomainError::invalid_argument(
            "contact number must be exactly 10 digits",
        ));
    }
    Ok(trimmed.to_string())
}

impl BloodRequest {
    fn ensure_request_id(&self, request_id: RequestId) -> Result<(), DomainError> {
        if !self.created || self.id != request_id {
            return Err(DomainError::not_found(format!("blood request {request_id}")));
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateRequest) -> Result<Vec<RequestEvent>, DomainError> {
        if self.created {
            return Err(DomainError::invalid_argument(format!(
                "blood request {} already exists",
                cmd.request_id
            )));
        }

        let patient_name = required_text("patient name", &cmd.patient_name)?;
        let hospital_name = required_text("hospital name", &cmd.hospital_name)?;
        if cmd.units_required < 1 {
            return Err(DomainError::invalid_argument(
                "units required must be at least 1",
            ));
        }
        let units_required = u32::try_from(cmd.units_required)
            .map_err(|_| DomainError::invalid_argument("units required is out of range"))?;
        let contact_number = valid_contact_number(&cmd.contact_number)?;
        let required_by = cmd
            .required_by
            .unwrap_or(cmd.occurred_at + Duration::hours(DEFAULT_REQUIRED_BY_HOURS));

        Ok(vec![RequestEvent::RequestCreated(RequestCreated {
            request_id: cmd.request_id,
            patient_name,
            blood_group: cmd.blood_group,
            units_required,
            hospital_name,
            priority: cmd.priority,
            required_by,
            contact_number,
            remarks: cmd.remarks.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_update_status(&self, cmd: &UpdateStatus) -> Result<Vec<RequestEvent>, DomainError> {
        self.ensure_request_id(cmd.request_id)?;

        if !self.status.can_transition_to(cmd.status) {
            return Err(DomainError::invalid_transition(self.status, cmd.status));
        }

        let event = match cmd.status {
            RequestStatus::Fulfilled => RequestEvent::RequestFulfilled(RequestFulfilled {
                request_id: cmd.request_id,
                occurred_at: cmd.occurred_at,
            }),
            RequestStatus::Cancelled => RequestEvent::RequestCancelled(RequestCancelled {
                request_id: cmd.request_id,
                occurred_at: cmd.occurred_at,
            }),
            RequestStatus::Pending => {
                return Err(DomainError::invalid_transition(self.status, cmd.status));
            }
        };
        Ok(vec![event])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn create_cmd(request_id: RequestId) -> CreateRequest {
        CreateRequest {
            request_id,
            patient_name: "Jane Doe".to_string(),
            blood_group: BloodGroup::ONeg,
            units_required: 2,
            hospital_name: "City General".to_string(),
            priority: Priority::High,
            required_by: None,
            contact_number: "0123456789".to_string(),
            remarks: None,
            occurred_at: test_time(),
        }
    }

    fn created_request() -> BloodRequest {
        let id = RequestId::new();
        let mut request = BloodRequest::empty(id);
        let events = request
            .handle(&RequestCommand::CreateRequest(create_cmd(id)))
            .unwrap();
        for e in &events {
            request.apply(e);
        }
        request
    }

    fn transition(request: &mut BloodRequest, status: RequestStatus) -> Result<(), DomainError> {
        let events = request.handle(&RequestCommand::UpdateStatus(UpdateStatus {
            request_id: request.id_typed(),
            status,
            occurred_at: test_time(),
        }))?;
        for e in &events {
            request.apply(e);
        }
        Ok(())
    }

    #[test]
    fn creation_starts_pending_with_default_due_date() {
        let request = created_request();
        assert_eq!(request.status(), RequestStatus::Pending);
        assert_eq!(request.created_at(), request.updated_at());
        assert_eq!(
            request.required_by(),
            request.created_at() + Duration::hours(DEFAULT_REQUIRED_BY_HOURS)
        );
    }

    #[test]
    fn creation_validates_fields() {
        let id = RequestId::new();
        let request = BloodRequest::empty(id);

        let mut blank_patient = create_cmd(id);
        blank_patient.patient_name = "   ".to_string();
        let mut zero_units = create_cmd(id);
        zero_units.units_required = 0;
        let mut bad_contact = create_cmd(id);
        bad_contact.contact_number = "12345".to_string();
        let mut blank_hospital = create_cmd(id);
        blank_hospital.hospital_name = String::new();

        for cmd in [blank_patient, zero_units, bad_contact, blank_hospital] {
            let err = request
                .handle(&RequestCommand::CreateRequest(cmd))
                .unwrap_err();
            assert!(matches!(err, DomainError::InvalidArgument(_)), "{err:?}");
        }
    }

    #[test]
    fn pending_to_fulfilled_once_then_terminal() {
        let mut request = created_request();
        let created_at = request.created_at();
        transition(&mut request, RequestStatus::Fulfilled).unwrap();
        assert_eq!(request.status(), RequestStatus::Fulfilled);
        assert_eq!(request.created_at(), created_at);
        assert!(request.updated_at() >= created_at);

        for target in [
            RequestStatus::Fulfilled,
            RequestStatus::Cancelled,
            RequestStatus::Pending,
        ] {
            let err = transition(&mut request, target).unwrap_err();
            assert!(matches!(err, DomainError::InvalidTransition { .. }));
        }
        assert_eq!(request.status(), RequestStatus::Fulfilled);
    }

    #[test]
    fn cancelled_is_terminal() {
        let mut request = created_request();
        transition(&mut request, RequestStatus::Cancelled).unwrap();
        let err = transition(&mut request, RequestStatus::Fulfilled).unwrap_err();
        assert_eq!(
            err,
            DomainError::invalid_transition("CANCELLED", "FULFILLED")
        );
    }

    #[test]
    fn pending_to_pending_is_not_a_transition() {
        let mut request = created_request();
        assert!(matches!(
            transition(&mut request, RequestStatus::Pending),
            Err(DomainError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn priority_does_not_affect_legality() {
        for priority in [Priority::High, Priority::Medium, Priority::Low] {
            let id = RequestId::new();
            let mut request = BloodRequest::empty(id);
            let mut cmd = create_cmd(id);
            cmd.priority = priority;
            for e in &request.handle(&RequestCommand::CreateRequest(cmd)).unwrap() {
                request.apply(e);
            }
            transition(&mut request, RequestStatus::Cancelled).unwrap();
        }
    }

    #[test]
    fn status_and_priority_parse_case_insensitively() {
        assert_eq!("fulfilled".parse::<RequestStatus>().unwrap(), RequestStatus::Fulfilled);
        assert_eq!("Low".parse::<Priority>().unwrap(), Priority::Low);
        assert!("EMERGENCY".parse::<Priority>().is_err());
        assert!(Priority::High < Priority::Low);
    }
}
