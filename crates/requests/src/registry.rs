//! In-memory store of blood requests.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bloodbank_core::{Aggregate, AggregateRoot, BloodGroup, DomainError, DomainResult, RequestId};
use bloodbank_events::Event;

use crate::request::{BloodRequest, CreateRequest, Priority, RequestCommand, RequestStatus, UpdateStatus};

/// Caller-supplied fields for a new request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBloodRequest {
    pub patient_name: String,
    pub blood_group: BloodGroup,
    pub units_required: i64,
    pub hospital_name: String,
    pub priority: Priority,
    pub required_by: Option<DateTime<Utc>>,
    pub contact_number: String,
    pub remarks: Option<String>,
}

#[derive(Debug, Default)]
struct Inner {
    by_id: HashMap<RequestId, BloodRequest>,
    order: Vec<RequestId>,
}

impl Inner {
    fn ordered(&self) -> impl Iterator<Item = &BloodRequest> {
        self.order.iter().filter_map(|id| self.by_id.get(id))
    }
}

/// Owns every tracked request; status changes are serialized by one lock.
#[derive(Debug, Default)]
pub struct RequestRegistry {
    inner: RwLock<Inner>,
}

fn poisoned<T>(_: T) -> DomainError {
    DomainError::storage("request registry lock poisoned")
}

impl RequestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new request in `PENDING`.
    pub fn create(&self, new: NewBloodRequest) -> DomainResult<BloodRequest> {
        let request_id = RequestId::new();
        let mut request = BloodRequest::empty(request_id);
        let events = request.handle(&RequestCommand::CreateRequest(CreateRequest {
            request_id,
            patient_name: new.patient_name,
            blood_group: new.blood_group,
            units_required: new.units_required,
            hospital_name: new.hospital_name,
            priority: new.priority,
            required_by: new.required_by,
            contact_number: new.contact_number,
            remarks: new.remarks,
            occurred_at: Utc::now(),
        }))?;
        for e in &events {
            request.apply(e);
            tracing::debug!(request_id = %request_id, event_type = e.event_type(), "event applied");
        }

        let mut inner = self.inner.write().map_err(poisoned)?;
        inner.order.push(request_id);
        inner.by_id.insert(request_id, request.clone());

        tracing::info!(
            request_id = %request_id,
            blood_group = %request.blood_group(),
            units = request.units_required(),
            priority = ?request.priority(),
            "blood request created"
        );
        Ok(request)
    }

    pub fn get(&self, request_id: RequestId) -> DomainResult<BloodRequest> {
        let inner = self.inner.read().map_err(poisoned)?;
        inner
            .by_id
            .get(&request_id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("blood request {request_id}")))
    }

    pub fn update_status(&self, request_id: RequestId, status: RequestStatus) -> DomainResult<BloodRequest> {
        self.transition_with(request_id, status, |_| Ok(()))
            .map(|(request, ())| request)
    }

    /// Validate the transition, run `before_commit`, then commit the new status,
    /// all while holding the registry lock.
    ///
    /// If the transition is illegal `before_commit` never runs; if
    /// `before_commit` fails the status is left unchanged.
    pub fn transition_with<T, F>(
        &self,
        request_id: RequestId,
        status: RequestStatus,
        before_commit: F,
    ) -> DomainResult<(BloodRequest, T)>
    where
        F: FnOnce(&BloodRequest) -> DomainResult<T>,
    {
        let mut inner = self.inner.write().map_err(poisoned)?;
        let request = inner
            .by_id
            .get_mut(&request_id)
            .ok_or_else(|| DomainError::not_found(format!("blood request {request_id}")))?;

        let now = Utc::now();
        let events = request
            .handle(&RequestCommand::UpdateStatus(UpdateStatus {
                request_id,
                status,
                occurred_at: now.max(request.updated_at()),
            }))
            .inspect_err(|err| {
                tracing::warn!(request_id = %request_id, error = %err, "status change rejected")
            })?;

        let outcome = before_commit(&*request)?;
        for e in &events {
            request.apply(e);
            tracing::info!(
                request_id = %request_id,
                status = %request.status(),
                event_type = e.event_type(),
                version = request.version(),
                "blood request status updated"
            );
        }
        Ok((request.clone(), outcome))
    }

    /// All requests in creation order.
    pub fn list_all(&self) -> DomainResult<Vec<BloodRequest>> {
        self.filtered(|_| true)
    }

    pub fn by_status(&self, status: RequestStatus) -> DomainResult<Vec<BloodRequest>> {
        self.filtered(|r| r.status() == status)
    }

    /// Case-insensitive exact match on hospital name.
    pub fn by_hospital(&self, hospital_name: &str) -> DomainResult<Vec<BloodRequest>> {
        let wanted = hospital_name.trim();
        self.filtered(|r| r.hospital_name().eq_ignore_ascii_case(wanted))
    }

    /// Requests created within `[start, end]`.
    pub fn created_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> DomainResult<Vec<BloodRequest>> {
        self.filtered(|r| r.created_at() >= start && r.created_at() <= end)
    }

    /// Pending requests, most urgent priority first, then earliest due date.
    pub fn pending_by_priority(&self) -> DomainResult<Vec<BloodRequest>> {
        let mut pending = self.by_status(RequestStatus::Pending)?;
        pending.sort_by_key(|r| (r.priority(), r.required_by()));
        Ok(pending)
    }

    fn filtered<P>(&self, predicate: P) -> DomainResult<Vec<BloodRequest>>
    where
        P: Fn(&BloodRequest) -> bool,
    {
        let inner = self.inner.read().map_err(poisoned)?;
        Ok(inner.ordered().filter(|r| predicate(r)).cloned().collect())
    }
}
