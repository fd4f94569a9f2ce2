//! Caller-facing blood bank service: configuration, input/output records and
//! the `BloodBank` facade over the inventory ledger, request registry and
//! donor rules.

pub mod bank;
pub mod config;
pub mod dto;
pub mod errors;

pub use bank::{BloodBank, ShutdownReport};
pub use config::{BloodBankConfig, MAX_HISTORY_LIMIT, SeedGroup};
pub use errors::ErrorResponse;
