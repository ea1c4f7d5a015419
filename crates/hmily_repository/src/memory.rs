//! In-memory repository for testing.

use crate::error::{Affected, RepositoryError, RepositoryResult};
use crate::record::{Record, Versioned};
use crate::repository::{HmilyRepository, OptimisticLock, RecordRepository, ROWS};
use crate::types::RecordKind;
use hmily_serializer::{CborSerializer, Serializer};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use tracing::warn;

/// A repository that keeps encoded records in memory.
///
/// Implements the same contracts as [`FileRepository`](crate::FileRepository)
/// and is suitable for:
/// - Unit tests of coordinator logic
/// - Ephemeral deployments that do not need recovery across restarts
///
/// Records are stored CBOR-encoded, so a stored record is isolated from later
/// changes to the caller's copy, exactly as with a persistent backend. The
/// optimistic lock always compares versions.
///
/// # Example
///
/// ```rust
/// use hmily_repository::{HmilyRepository, InMemoryRepository, Transaction};
///
/// let repo = InMemoryRepository::new("acct");
/// let mut tx = Transaction::new(1, "acct");
/// repo.create_hmily_transaction(&mut tx).unwrap();
/// assert_eq!(repo.find_by_trans_id(1), Some(tx));
/// ```
#[derive(Debug)]
pub struct InMemoryRepository {
    app_name: String,
    records: RwLock<BTreeMap<(RecordKind, u64), Vec<u8>>>,
}

impl InMemoryRepository {
    /// Creates an empty repository for `app_name`.
    #[must_use]
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            records: RwLock::new(BTreeMap::new()),
        }
    }

    /// Returns the number of stored records of `kind`.
    #[must_use]
    pub fn len(&self, kind: RecordKind) -> usize {
        self.records.read().keys().filter(|(k, _)| *k == kind).count()
    }

    /// Returns true if no records of any kind are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Clears all records.
    pub fn clear(&self) {
        self.records.write().clear();
    }

    fn decode<R: Record>(id: u64, bytes: &[u8]) -> Option<R> {
        match CborSerializer.deserialize(bytes) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(kind = %R::KIND, id, error = %e, "treating unreadable record as absent");
                None
            }
        }
    }

    fn decoded<R: Record>(records: &BTreeMap<(RecordKind, u64), Vec<u8>>) -> Vec<(u64, R)> {
        records
            .range((R::KIND, u64::MIN)..=(R::KIND, u64::MAX))
            .filter_map(|(&(_, id), bytes)| Self::decode::<R>(id, bytes).map(|r| (id, r)))
            .collect()
    }
}

impl<R: Record> RecordRepository<R> for InMemoryRepository {
    fn create(&self, record: &mut R) -> RepositoryResult<usize> {
        let mut records = self.records.write();
        let key = (R::KIND, record.id());

        let mut stamped = record.clone();
        match records.get(&key) {
            Some(bytes) => match Self::decode::<R>(key.1, bytes) {
                Some(stored) => stamped.mark_replacing(&stored),
                None => stamped.mark_updated(),
            },
            None => stamped.mark_created(),
        }
        records.insert(key, CborSerializer.serialize(&stamped)?);

        *record = stamped;
        Ok(ROWS)
    }

    fn find_by_id(&self, id: u64) -> Option<R> {
        let records = self.records.read();
        records
            .get(&(R::KIND, id))
            .and_then(|bytes| Self::decode(id, bytes))
    }

    fn list_by_filter(&self, filter: &mut dyn FnMut(&R) -> bool) -> Vec<R> {
        let records = self.records.read();
        Self::decoded::<R>(&records)
            .into_iter()
            .map(|(_, record)| record)
            .filter(|record| filter(record))
            .collect()
    }

    fn update_status(&self, id: u64, status: i32) -> Affected {
        let mut records = self.records.write();
        let key = (R::KIND, id);
        let Some(mut record) = records.get(&key).and_then(|b| Self::decode::<R>(id, b)) else {
            return Affected::Rows(0);
        };
        record.set_status(status);
        record.mark_updated();
        match CborSerializer.serialize(&record) {
            Ok(bytes) => {
                records.insert(key, bytes);
                Affected::Rows(ROWS)
            }
            Err(e) => Affected::Fault(RepositoryError::from(e)),
        }
    }

    fn remove(&self, id: u64) -> Affected {
        let removed = self.records.write().remove(&(R::KIND, id));
        Affected::Rows(usize::from(removed.is_some()))
    }

    fn remove_by_filter(&self, filter: &mut dyn FnMut(&R) -> bool) -> Affected {
        let mut records = self.records.write();
        let doomed: Vec<u64> = Self::decoded::<R>(&records)
            .into_iter()
            .filter(|(_, record)| filter(record))
            .map(|(id, _)| id)
            .collect();
        for id in &doomed {
            records.remove(&(R::KIND, *id));
        }
        Affected::Rows(doomed.len())
    }

    fn exists_by_filter(&self, filter: &mut dyn FnMut(&R) -> bool) -> bool {
        let records = self.records.read();
        records
            .range((R::KIND, u64::MIN)..=(R::KIND, u64::MAX))
            .filter_map(|(&(_, id), bytes)| Self::decode::<R>(id, bytes))
            .any(|record| filter(&record))
    }
}

impl<R: Versioned> OptimisticLock<R> for InMemoryRepository {
    fn update_with_optimistic_lock(&self, record: &mut R) -> Affected {
        let mut records = self.records.write();
        let key = (R::KIND, record.id());
        let Some(stored) = records.get(&key).and_then(|b| Self::decode::<R>(key.1, b)) else {
            return Affected::Rows(0);
        };
        if stored.version() != record.version() {
            return Affected::Stale {
                stored: stored.version(),
                presented: record.version(),
            };
        }

        let mut claimed = record.clone();
        claimed.mark_retried_over(&stored);
        match CborSerializer.serialize(&claimed) {
            Ok(bytes) => {
                records.insert(key, bytes);
                *record = claimed;
                Affected::Rows(ROWS)
            }
            Err(e) => Affected::Fault(e.into()),
        }
    }
}

impl HmilyRepository for InMemoryRepository {
    fn app_name(&self) -> &str {
        &self.app_name
    }
}
