//! Domain events shared by the inventory ledger and request lifecycle.

pub mod event;

pub use event::Event;
