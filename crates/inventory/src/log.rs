//! Append-only transaction history.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bloodbank_core::{BloodGroup, DomainError, DomainResult};

use crate::transaction::{Transaction, TransactionKind};

/// Filter criteria for history queries. All fields are optional and combine with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionQuery {
    pub blood_group: Option<BloodGroup>,
    pub kind: Option<TransactionKind>,
    /// Inclusive lower bound on `timestamp`.
    pub occurred_after: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `timestamp`.
    pub occurred_before: Option<DateTime<Utc>>,
    /// Maximum number of transactions yielded.
    pub limit: Option<usize>,
}

impl TransactionQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn for_group(blood_group: BloodGroup) -> Self {
        Self {
            blood_group: Some(blood_group),
            ..Self::default()
        }
    }

    pub fn with_kind(mut self, kind: TransactionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn between(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.occurred_after = Some(start);
        self.occurred_before = Some(end);
        self
    }

    pub fn matches(&self, tx: &Transaction) -> bool {
        self.blood_group.is_none_or(|g| g == tx.blood_group)
            && self.kind.is_none_or(|k| k == tx.kind)
            && self.occurred_after.is_none_or(|t| tx.timestamp >= t)
            && self.occurred_before.is_none_or(|t| tx.timestamp <= t)
    }
}

/// A point-in-time view of the log, most-recent-first.
///
/// Filtering and limiting happen lazily while iterating; `iter()` may be called
/// any number of times and always yields the same sequence.
#[derive(Debug, Clone)]
pub struct TransactionHistory {
    entries: Vec<Arc<Transaction>>,
    query: TransactionQuery,
}

impl TransactionHistory {
    pub fn iter(&self) -> impl Iterator<Item = &Transaction> + '_ {
        self.entries
            .iter()
            .map(|tx| tx.as_ref())
            .filter(|tx| self.query.matches(tx))
            .take(self.query.limit.unwrap_or(usize::MAX))
    }

    pub fn to_vec(&self) -> Vec<Transaction> {
        self.iter().cloned().collect()
    }

    pub fn query(&self) -> &TransactionQuery {
        &self.query
    }
}

impl<'a> IntoIterator for &'a TransactionHistory {
    type Item = &'a Transaction;
    type IntoIter = Box<dyn Iterator<Item = &'a Transaction> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

/// Append-only transaction storage.
///
/// There is deliberately no update or delete operation.
pub trait TransactionStore: Send + Sync {
    /// Append one well-formed transaction.
    fn append(&self, transaction: Transaction) -> DomainResult<()>;

    /// Snapshot the history matching `query`, most-recent-first.
    fn history(&self, query: TransactionQuery) -> DomainResult<TransactionHistory>;
}

impl<S> TransactionStore for Arc<S>
where
    S: TransactionStore + ?Sized,
{
    fn append(&self, transaction: Transaction) -> DomainResult<()> {
        (**self).append(transaction)
    }

    fn history(&self, query: TransactionQuery) -> DomainResult<TransactionHistory> {
        (**self).history(query)
    }
}

#[derive(Debug)]
struct LogEntry {
    sequence: u64,
    transaction: Arc<Transaction>,
}

/// In-memory append-only transaction log.
#[derive(Debug, Default)]
pub struct InMemoryTransactionLog {
    entries: RwLock<Vec<LogEntry>>,
}

impl InMemoryTransactionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of transactions ever appended.
    pub fn len(&self) -> DomainResult<usize> {
        self.entries
            .read()
            .map(|e| e.len())
            .map_err(|_| DomainError::storage("transaction log lock poisoned"))
    }

    pub fn is_empty(&self) -> DomainResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl TransactionStore for InMemoryTransactionLog {
    fn append(&self, transaction: Transaction) -> DomainResult<()> {
        if transaction.quantity == 0 {
            return Err(DomainError::invalid_argument(
                "transaction quantity must be positive",
            ));
        }

        let mut entries = self
            .entries
            .write()
            .map_err(|_| DomainError::storage("transaction log lock poisoned"))?;

        let sequence = entries.len() as u64 + 1;
        tracing::debug!(
            transaction_id = %transaction.id,
            blood_group = %transaction.blood_group,
            kind = %transaction.kind,
            quantity = transaction.quantity,
            sequence,
            "transaction appended"
        );
        entries.push(LogEntry {
            sequence,
            transaction: Arc::new(transaction),
        });
        Ok(())
    }

    fn history(&self, query: TransactionQuery) -> DomainResult<TransactionHistory> {
        let entries = self
            .entries
            .read()
            .map_err(|_| DomainError::storage("transaction log lock poisoned"))?;

        let mut ordered: Vec<(DateTime<Utc>, u64, Arc<Transaction>)> = entries
            .iter()
            .map(|e| (e.transaction.timestamp, e.sequence, Arc::clone(&e.transaction)))
            .collect();
        drop(entries);

        // Timestamp descending; insertion order breaks ties (later first).
        ordered.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.cmp(&a.1)));

        Ok(TransactionHistory {
            entries: ordered.into_iter().map(|(_, _, tx)| tx).collect(),
            query,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bloodbank_core::TransactionId;
    use chrono::Duration;

    fn tx(group: BloodGroup, kind: TransactionKind, quantity: u32, timestamp: DateTime<Utc>) -> Transaction {
        Transaction {
            id: TransactionId::new(),
            blood_group: group,
            quantity,
            kind,
            timestamp,
            remarks: None,
        }
    }

    #[test]
    fn zero_quantity_is_rejected_and_not_stored() {
        let log = InMemoryTransactionLog::new();
        let err = log
            .append(tx(BloodGroup::APos, TransactionKind::Donation, 0, Utc::now()))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidArgument(_)));
        assert!(log.is_empty().unwrap());
    }

    #[test]
    fn history_is_most_recent_first_with_insertion_tiebreak() {
        let log = InMemoryTransactionLog::new();
        let t0 = Utc::now();
        let first = tx(BloodGroup::APos, TransactionKind::Donation, 1, t0);
        let second = tx(BloodGroup::APos, TransactionKind::Donation, 2, t0);
        let older = tx(BloodGroup::APos, TransactionKind::Request, 3, t0 - Duration::seconds(5));
        log.append(first.clone()).unwrap();
        log.append(older.clone()).unwrap();
        log.append(second.clone()).unwrap();

        let ids: Vec<_> = log
            .history(TransactionQuery::all())
            .unwrap()
            .iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec![second.id, first.id, older.id]);
    }

    #[test]
    fn filters_and_limit_combine() {
        let log = InMemoryTransactionLog::new();
        let t0 = Utc::now();
        for i in 0..5 {
            log.append(tx(BloodGroup::ONeg, TransactionKind::Donation, i + 1, t0 + Duration::seconds(i64::from(i))))
                .unwrap();
            log.append(tx(BloodGroup::OPos, TransactionKind::Request, i + 1, t0 + Duration::seconds(i64::from(i))))
                .unwrap();
        }

        let history = log
            .history(
                TransactionQuery::for_group(BloodGroup::ONeg)
                    .with_kind(TransactionKind::Donation)
                    .with_limit(2),
            )
            .unwrap();
        let quantities: Vec<_> = history.iter().map(|t| t.quantity).collect();
        assert_eq!(quantities, vec![5, 4]);

        let none = log
            .history(TransactionQuery::for_group(BloodGroup::ONeg).with_kind(TransactionKind::Request))
            .unwrap();
        assert_eq!(none.iter().count(), 0);
    }

    #[test]
    fn date_range_is_inclusive() {
        let log = InMemoryTransactionLog::new();
        let t0 = Utc::now();
        for i in 0..4 {
            log.append(tx(BloodGroup::BPos, TransactionKind::Donation, 1, t0 + Duration::minutes(i)))
                .unwrap();
        }
        let history = log
            .history(TransactionQuery::all().between(t0 + Duration::minutes(1), t0 + Duration::minutes(2)))
            .unwrap();
        assert_eq!(history.iter().count(), 2);
    }

    #[test]
    fn history_is_restartable_and_isolated_from_later_appends() {
        let log = InMemoryTransactionLog::new();
        log.append(tx(BloodGroup::AbNeg, TransactionKind::Donation, 7, Utc::now()))
            .unwrap();
        let history = log.history(TransactionQuery::all()).unwrap();
        log.append(tx(BloodGroup::AbNeg, TransactionKind::Donation, 8, Utc::now()))
            .unwrap();

        assert_eq!(history.iter().count(), 1);
        assert_eq!(history.iter().count(), 1);
        assert_eq!((&history).into_iter().next().unwrap().quantity, 7);
        assert_eq!(log.len().unwrap(), 2);
    }
}
