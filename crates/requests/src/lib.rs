//! Blood request lifecycle.
//!
//! Requests are tracked independently of physical stock: creating or
//! fulfilling one never deducts units. Callers pair a fulfillment with an
//! inventory deduction themselves (see `RequestRegistry::transition_with`).

pub mod registry;
pub mod request;

pub use registry::{NewBloodRequest, RequestRegistry};
pub use request::{
    BloodRequest, CreateRequest, DEFAULT_REQUIRED_BY_HOURS, Priority, RequestCancelled,
    RequestCommand, RequestCreated, RequestEvent, RequestFulfilled, RequestStatus, UpdateStatus,
};
