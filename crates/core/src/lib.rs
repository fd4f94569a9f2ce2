//! `bloodbank-core`: domain building blocks shared by every crate.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod aggregate;
pub mod blood_group;
pub mod entity;
pub mod error;
pub mod id;

pub use aggregate::{Aggregate, AggregateRoot};
pub use blood_group::BloodGroup;
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{DonorId, RequestId, TransactionId};
