//! Storage-agnostic repository contracts.
//!
//! [`RecordRepository`] is the per-record-kind contract every backend
//! implements; [`OptimisticLock`] adds the retry claim used by recovery for
//! versioned records. [`HmilyRepository`] is the coordinator-facing surface:
//! its operations have default bodies built on the generic contract, and a
//! backend that can do better (an indexed query, a conditional write) may
//! override any of them.
//!
//! # Failure model
//!
//! - `create` returns [`RepositoryResult`]: a failed primary write risks
//!   losing a transaction and is always propagated.
//! - Lookups and scans return plain values. Absent and unreadable records are
//!   indistinguishable to the caller; backends log and count the latter.
//! - Status updates, retry claims and deletes return [`Affected`]; a
//!   transient fault is reported in the value, not raised.

use crate::error::{Affected, RepositoryResult};
use crate::filter;
use crate::record::{Participant, ParticipantUndo, Record, Transaction, Versioned};
use crate::types::{HmilyAction, Timestamp};

/// Number of rows a successful single-record write reports.
pub const ROWS: usize = 1;

/// CRUD and filtered scans over one record kind.
pub trait RecordRepository<R: Record>: Send + Sync {
    /// Stores `record`.
    ///
    /// If no record with the same id exists, sets `create_time` and
    /// `update_time`. Otherwise the call is an update: it bumps `version`
    /// (for versioned records) and advances `update_time`. The stamped values
    /// are written back into `record`.
    ///
    /// Returns [`ROWS`].
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be serialized or written.
    fn create(&self, record: &mut R) -> RepositoryResult<usize>;

    /// Point lookup. Absent and unreadable records both yield `None`.
    fn find_by_id(&self, id: u64) -> Option<R>;

    /// Returns every readable record accepted by `filter`, in id order.
    fn list_by_filter(&self, filter: &mut dyn FnMut(&R) -> bool) -> Vec<R>;

    /// Sets the status of a stored record, bumping `version` and
    /// `update_time`. Zero rows if the record is absent or unreadable.
    fn update_status(&self, id: u64, status: i32) -> Affected;

    /// Deletes a record. Deleting an absent record is a zero-row success.
    fn remove(&self, id: u64) -> Affected;

    /// Deletes every readable record accepted by `filter`.
    fn remove_by_filter(&self, filter: &mut dyn FnMut(&R) -> bool) -> Affected;

    /// Returns true if any readable record is accepted by `filter`.
    ///
    /// Stops at the first match.
    fn exists_by_filter(&self, filter: &mut dyn FnMut(&R) -> bool) -> bool;
}

/// The retry claim recovery uses before re-driving a record.
pub trait OptimisticLock<R: Versioned>: RecordRepository<R> {
    /// Increments `version` and `retry`, advances `update_time` and rewrites
    /// the full record. The new values are written back into `record`.
    ///
    /// Zero rows if the record no longer exists. Backends with conditional
    /// writes should reject a stored version different from
    /// `record.version()` with [`Affected::Stale`].
    fn update_with_optimistic_lock(&self, record: &mut R) -> Affected;
}

/// The repository surface consumed by the transaction coordinator and its
/// recovery scanner.
pub trait HmilyRepository:
    OptimisticLock<Transaction>
    + OptimisticLock<Participant>
    + RecordRepository<ParticipantUndo>
    + Send
    + Sync
{
    /// Application whose records this repository scans.
    fn app_name(&self) -> &str;

    /// Stores a transaction; see [`RecordRepository::create`].
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn create_hmily_transaction(&self, transaction: &mut Transaction) -> RepositoryResult<usize> {
        <Self as RecordRepository<Transaction>>::create(self, transaction)
    }

    /// Claims a transaction for another recovery attempt.
    fn update_retry_by_lock(&self, transaction: &mut Transaction) -> Affected {
        <Self as OptimisticLock<Transaction>>::update_with_optimistic_lock(self, transaction)
    }

    /// Looks up a transaction.
    fn find_by_trans_id(&self, trans_id: u64) -> Option<Transaction> {
        <Self as RecordRepository<Transaction>>::find_by_id(self, trans_id)
    }

    /// Up to `limit` transactions of this application last updated before
    /// `cutoff`.
    fn list_limit_by_delay(&self, cutoff: Timestamp, limit: usize) -> Vec<Transaction> {
        let older = filter::older_than::<Transaction>(cutoff);
        let owned = filter::owned_by::<Transaction>(self.app_name());
        let mut pick = filter::limit(limit, move |t: &Transaction| older(t) && owned(t));
        <Self as RecordRepository<Transaction>>::list_by_filter(self, &mut pick)
    }

    /// Sets a transaction's status.
    fn update_hmily_transaction_status(&self, trans_id: u64, status: i32) -> Affected {
        <Self as RecordRepository<Transaction>>::update_status(self, trans_id, status)
    }

    /// Deletes a transaction.
    fn remove_hmily_transaction(&self, trans_id: u64) -> Affected {
        <Self as RecordRepository<Transaction>>::remove(self, trans_id)
    }

    /// Purges soft-deleted transactions last updated before `cutoff`.
    fn remove_hmily_transaction_by_date(&self, cutoff: Timestamp) -> Affected {
        let mut purge = filter::purgeable::<Transaction>(cutoff, HmilyAction::Delete.code());
        <Self as RecordRepository<Transaction>>::remove_by_filter(self, &mut purge)
    }

    /// Stores a participant; see [`RecordRepository::create`].
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn create_hmily_participant(&self, participant: &mut Participant) -> RepositoryResult<usize> {
        <Self as RecordRepository<Participant>>::create(self, participant)
    }

    /// Participants whose id or `participant_ref_id` equals `participant_id`.
    fn find_hmily_participant(&self, participant_id: u64) -> Vec<Participant> {
        <Self as RecordRepository<Participant>>::list_by_filter(self, &mut |p: &Participant| {
            p.participant_id == participant_id || p.participant_ref_id == Some(participant_id)
        })
    }

    /// Up to `limit` live participants of this application and protocol
    /// last updated before `cutoff`.
    fn list_hmily_participant(
        &self,
        cutoff: Timestamp,
        trans_type: &str,
        limit: usize,
    ) -> Vec<Participant> {
        let older = filter::older_than::<Participant>(cutoff);
        let owned = filter::owned_by::<Participant>(self.app_name());
        let mut pick = filter::limit(limit, move |p: &Participant| {
            older(p) && owned(p) && p.trans_type == trans_type && !HmilyAction::is_terminal(p.status)
        });
        <Self as RecordRepository<Participant>>::list_by_filter(self, &mut pick)
    }

    /// All participants of a transaction.
    fn list_hmily_participant_by_trans_id(&self, trans_id: u64) -> Vec<Participant> {
        <Self as RecordRepository<Participant>>::list_by_filter(self, &mut |p: &Participant| {
            p.trans_id == trans_id
        })
    }

    /// Returns true if the transaction has at least one participant.
    fn exist_hmily_participant_by_trans_id(&self, trans_id: u64) -> bool {
        <Self as RecordRepository<Participant>>::exists_by_filter(self, &mut |p: &Participant| {
            p.trans_id == trans_id
        })
    }

    /// Sets a participant's status.
    fn update_hmily_participant_status(&self, participant_id: u64, status: i32) -> Affected {
        <Self as RecordRepository<Participant>>::update_status(self, participant_id, status)
    }

    /// Deletes a participant. Its undo records are left in place.
    fn remove_hmily_participant(&self, participant_id: u64) -> Affected {
        <Self as RecordRepository<Participant>>::remove(self, participant_id)
    }

    /// Purges soft-deleted participants last updated before `cutoff`.
    fn remove_hmily_participant_by_date(&self, cutoff: Timestamp) -> Affected {
        let mut purge = filter::purgeable::<Participant>(cutoff, HmilyAction::Delete.code());
        <Self as RecordRepository<Participant>>::remove_by_filter(self, &mut purge)
    }

    /// Claims a participant for another recovery attempt.
    ///
    /// Returns true if the claim was written.
    fn lock_hmily_participant(&self, participant: &mut Participant) -> bool {
        <Self as OptimisticLock<Participant>>::update_with_optimistic_lock(self, participant)
            .is_applied()
    }

    /// Stores an undo record; see [`RecordRepository::create`].
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn create_hmily_participant_undo(&self, undo: &mut ParticipantUndo) -> RepositoryResult<usize> {
        <Self as RecordRepository<ParticipantUndo>>::create(self, undo)
    }

    /// All undo records of a participant.
    fn find_hmily_participant_undo_by_participant_id(
        &self,
        participant_id: u64,
    ) -> Vec<ParticipantUndo> {
        <Self as RecordRepository<ParticipantUndo>>::list_by_filter(
            self,
            &mut |u: &ParticipantUndo| u.participant_id == participant_id,
        )
    }

    /// Deletes an undo record.
    fn remove_hmily_participant_undo(&self, undo_id: u64) -> Affected {
        <Self as RecordRepository<ParticipantUndo>>::remove(self, undo_id)
    }

    /// Purges soft-deleted undo records last updated before `cutoff`.
    fn remove_hmily_participant_undo_by_date(&self, cutoff: Timestamp) -> Affected {
        let mut purge = filter::purgeable::<ParticipantUndo>(cutoff, HmilyAction::Delete.code());
        <Self as RecordRepository<ParticipantUndo>>::remove_by_filter(self, &mut purge)
    }

    /// Sets an undo record's status.
    fn update_hmily_participant_undo_status(&self, undo_id: u64, status: i32) -> Affected {
        <Self as RecordRepository<ParticipantUndo>>::update_status(self, undo_id, status)
    }
}
