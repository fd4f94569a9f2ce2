//! Blood inventory ledger.
//!
//! Business rules for per-group stock live in the `GroupStock` aggregate as
//! deterministic decide/apply logic; `InventoryLedger` owns the records and
//! serializes mutations per group; the transaction log is an append-only
//! store behind the `TransactionStore` trait. Availability and low-stock views
//! are pure functions over a `LedgerSnapshot`.

pub mod availability;
pub mod ledger;
pub mod log;
pub mod low_stock;
pub mod record;
pub mod snapshot;
pub mod transaction;

pub use availability::can_fulfill;
pub use ledger::{InventoryLedger, LedgerReceipt};
pub use log::{InMemoryTransactionLog, TransactionHistory, TransactionQuery, TransactionStore};
pub use low_stock::{LowStockAlert, compute_low_stock, low_stock_alerts};
pub use record::{
    DonationRecorded, GroupInitialized, GroupStock, InitializeGroup, InventoryCommand,
    InventoryEvent, InventoryRecord, RecordDonation, RecordRequest, RequestRecorded,
};
pub use snapshot::LedgerSnapshot;
pub use transaction::{Transaction, TransactionKind};
