//! Persisted record types.
//!
//! Three record kinds describe a distributed transaction:
//!
//! - [`Transaction`] - one per distributed transaction
//! - [`Participant`] - one per branch (a single resource's try/confirm/cancel)
//! - [`ParticipantUndo`] - compensation data for rolling back a branch
//!
//! References between records (`Participant::trans_id`,
//! `ParticipantUndo::participant_id`) are soft: the repository never checks
//! that the target exists and never cascades deletes.

use crate::types::{HmilyAction, RecordKind, Timestamp};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Common behavior of every persisted record.
pub trait Record: Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// The kind of this record; selects its storage location.
    const KIND: RecordKind;

    /// The unique identifier; also the file name of the record.
    fn id(&self) -> u64;

    /// Opaque lifecycle code.
    fn status(&self) -> i32;

    /// Sets the lifecycle code.
    fn set_status(&mut self, status: i32);

    /// When the record was first stored.
    fn create_time(&self) -> Timestamp;

    /// When the record was last mutated.
    fn update_time(&self) -> Timestamp;

    /// Sets the creation time.
    fn set_create_time(&mut self, time: Timestamp);

    /// Sets the last mutation time.
    fn set_update_time(&mut self, time: Timestamp);

    /// Increments the optimistic-concurrency counter, if the record has one.
    fn bump_version(&mut self) {}

    /// Sets the counter one past the larger of this record's and `stored`'s,
    /// if the record has one.
    fn bump_version_past(&mut self, _stored: &Self) {}

    /// Stamps a record that is stored for the first time.
    fn mark_created(&mut self) {
        let now = Timestamp::now();
        self.set_create_time(now);
        self.set_update_time(now);
    }

    /// Stamps a record that overwrites a stored one.
    fn mark_updated(&mut self) {
        self.bump_version();
        let next = self.update_time().advance();
        self.set_update_time(next);
    }

    /// Stamps a caller's copy that overwrites `stored`.
    ///
    /// The copy may be older than `stored`: the stored creation time is kept,
    /// and neither the version nor `update_time` moves backwards.
    fn mark_replacing(&mut self, stored: &Self) {
        self.set_create_time(stored.create_time());
        self.bump_version_past(stored);
        let next = self.update_time().max(stored.update_time()).advance();
        self.set_update_time(next);
    }
}

/// A record carrying an optimistic-concurrency counter and a retry count.
pub trait Versioned: Record {
    /// Owning application.
    fn app_name(&self) -> &str;

    /// Optimistic-concurrency counter.
    fn version(&self) -> u32;

    /// Number of recovery attempts.
    fn retry(&self) -> u32;

    /// Sets the recovery attempt count.
    fn set_retry(&mut self, retry: u32);

    /// Stamps a record that recovery claims for another attempt.
    fn mark_retried(&mut self) {
        let retry = self.retry().saturating_add(1);
        self.set_retry(retry);
        self.mark_updated();
    }

    /// Like [`Versioned::mark_retried`], for a claim that overwrites `stored`.
    fn mark_retried_over(&mut self, stored: &Self) {
        let retry = self.retry().max(stored.retry()).saturating_add(1);
        self.set_retry(retry);
        self.mark_replacing(stored);
    }
}

/// One distributed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Identity, assigned by the coordinator.
    pub trans_id: u64,
    /// Owning application; scopes recovery scans.
    pub app_name: String,
    /// Protocol of the transaction (`"TCC"`, `"TAC"`...).
    pub trans_type: String,
    /// Lifecycle code, see [`HmilyAction`].
    pub status: i32,
    /// Optimistic-concurrency counter.
    pub version: u32,
    /// Recovery attempts so far.
    pub retry: u32,
    /// First stored.
    pub create_time: Timestamp,
    /// Last mutated.
    pub update_time: Timestamp,
}

impl Transaction {
    /// Creates a TCC transaction in the `PreTry` state.
    #[must_use]
    pub fn new(trans_id: u64, app_name: impl Into<String>) -> Self {
        Self {
            trans_id,
            app_name: app_name.into(),
            trans_type: "TCC".to_string(),
            status: HmilyAction::PreTry.code(),
            version: 0,
            retry: 0,
            create_time: Timestamp::EPOCH,
            update_time: Timestamp::EPOCH,
        }
    }

    /// Sets the status.
    #[must_use]
    pub fn with_status(mut self, status: impl Into<i32>) -> Self {
        self.status = status.into();
        self
    }

    /// Sets the transaction protocol.
    #[must_use]
    pub fn with_trans_type(mut self, trans_type: impl Into<String>) -> Self {
        self.trans_type = trans_type.into();
        self
    }
}

impl Record for Transaction {
    const KIND: RecordKind = RecordKind::Transaction;

    fn id(&self) -> u64 {
        self.trans_id
    }

    fn status(&self) -> i32 {
        self.status
    }

    fn set_status(&mut self, status: i32) {
        self.status = status;
    }

    fn create_time(&self) -> Timestamp {
        self.create_time
    }

    fn update_time(&self) -> Timestamp {
        self.update_time
    }

    fn set_create_time(&mut self, time: Timestamp) {
        self.create_time = time;
    }

    fn set_update_time(&mut self, time: Timestamp) {
        self.update_time = time;
    }

    fn bump_version(&mut self) {
        self.version = self.version.saturating_add(1);
    }

    fn bump_version_past(&mut self, stored: &Self) {
        self.version = self.version.max(stored.version).saturating_add(1);
    }
}

impl Versioned for Transaction {
    fn app_name(&self) -> &str {
        &self.app_name
    }

    fn version(&self) -> u32 {
        self.version
    }

    fn retry(&self) -> u32 {
        self.retry
    }

    fn set_retry(&mut self, retry: u32) {
        self.retry = retry;
    }
}

/// A recorded method call used to drive confirm or cancel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    /// Fully qualified target type.
    pub target_class: String,
    /// Method to invoke.
    pub method_name: String,
    /// Parameter type names, in order.
    pub parameter_types: Vec<String>,
    /// Encoded arguments; opaque to the repository.
    pub args: Vec<u8>,
}

/// One branch of a distributed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Identity.
    pub participant_id: u64,
    /// Related participant, if any. Relation only, not ownership.
    pub participant_ref_id: Option<u64>,
    /// Owning transaction.
    pub trans_id: u64,
    /// Branch protocol (`"TCC"`, `"SAGA"`...).
    pub trans_type: String,
    /// Owning application.
    pub app_name: String,
    /// Lifecycle code, see [`HmilyAction`].
    pub status: i32,
    /// Role of the branch within the transaction.
    pub role: i32,
    /// Optimistic-concurrency counter.
    pub version: u32,
    /// Recovery attempts so far.
    pub retry: u32,
    /// Type hosting the try method.
    pub target_class: Option<String>,
    /// The try method.
    pub target_method: Option<String>,
    /// Name of the confirm method.
    pub confirm_method: Option<String>,
    /// Name of the cancel method.
    pub cancel_method: Option<String>,
    /// Call that confirms the branch.
    pub confirm_invocation: Option<Invocation>,
    /// Call that cancels the branch.
    pub cancel_invocation: Option<Invocation>,
    /// First stored.
    pub create_time: Timestamp,
    /// Last mutated.
    pub update_time: Timestamp,
}

impl Participant {
    /// Creates a TCC participant of `trans_id` in the `PreTry` state.
    #[must_use]
    pub fn new(participant_id: u64, trans_id: u64, app_name: impl Into<String>) -> Self {
        Self {
            participant_id,
            participant_ref_id: None,
            trans_id,
            trans_type: "TCC".to_string(),
            app_name: app_name.into(),
            status: HmilyAction::PreTry.code(),
            role: 0,
            version: 0,
            retry: 0,
            target_class: None,
            target_method: None,
            confirm_method: None,
            cancel_method: None,
            confirm_invocation: None,
            cancel_invocation: None,
            create_time: Timestamp::EPOCH,
            update_time: Timestamp::EPOCH,
        }
    }

    /// Sets the status.
    #[must_use]
    pub fn with_status(mut self, status: impl Into<i32>) -> Self {
        self.status = status.into();
        self
    }

    /// Sets the branch protocol.
    #[must_use]
    pub fn with_trans_type(mut self, trans_type: impl Into<String>) -> Self {
        self.trans_type = trans_type.into();
        self
    }

    /// Sets the related participant.
    #[must_use]
    pub fn with_ref_id(mut self, participant_ref_id: u64) -> Self {
        self.participant_ref_id = Some(participant_ref_id);
        self
    }
}

impl Record for Participant {
    const KIND: RecordKind = RecordKind::Participant;

    fn id(&self) -> u64 {
        self.participant_id
    }

    fn status(&self) -> i32 {
        self.status
    }

    fn set_status(&mut self, status: i32) {
        self.status = status;
    }

    fn create_time(&self) -> Timestamp {
        self.create_time
    }

    fn update_time(&self) -> Timestamp {
        self.update_time
    }

    fn set_create_time(&mut self, time: Timestamp) {
        self.create_time = time;
    }

    fn set_update_time(&mut self, time: Timestamp) {
        self.update_time = time;
    }

    fn bump_version(&mut self) {
        self.version = self.version.saturating_add(1);
    }

    fn bump_version_past(&mut self, stored: &Self) {
        self.version = self.version.max(stored.version).saturating_add(1);
    }
}

impl Versioned for Participant {
    fn app_name(&self) -> &str {
        &self.app_name
    }

    fn version(&self) -> u32 {
        self.version
    }

    fn retry(&self) -> u32 {
        self.retry
    }

    fn set_retry(&mut self, retry: u32) {
        self.retry = retry;
    }
}

/// Compensation data for one participant.
///
/// Undo records carry no version: overwriting one only refreshes
/// `update_time`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantUndo {
    /// Identity.
    pub undo_id: u64,
    /// Owning participant.
    pub participant_id: u64,
    /// Owning transaction.
    pub trans_id: u64,
    /// Resource the compensation applies to.
    pub resource_id: Option<String>,
    /// Lifecycle code.
    pub status: i32,
    /// Encoded compensation; opaque to the repository.
    pub undo_payload: Vec<u8>,
    /// First stored.
    pub create_time: Timestamp,
    /// Last mutated.
    pub update_time: Timestamp,
}

impl ParticipantUndo {
    /// Creates an undo record for `participant_id` in the `PreTry` state.
    #[must_use]
    pub fn new(undo_id: u64, participant_id: u64, trans_id: u64) -> Self {
        Self {
            undo_id,
            participant_id,
            trans_id,
            resource_id: None,
            status: HmilyAction::PreTry.code(),
            undo_payload: Vec::new(),
            create_time: Timestamp::EPOCH,
            update_time: Timestamp::EPOCH,
        }
    }

    /// Sets the status.
    #[must_use]
    pub fn with_status(mut self, status: impl Into<i32>) -> Self {
        self.status = status.into();
        self
    }

    /// Sets the compensation payload.
    #[must_use]
    pub fn with_payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.undo_payload = payload.into();
        self
    }
}

impl Record for ParticipantUndo {
    const KIND: RecordKind = RecordKind::ParticipantUndo;

    fn id(&self) -> u64 {
        self.undo_id
    }

    fn status(&self) -> i32 {
        self.status
    }

    fn set_status(&mut self, status: i32) {
        self.status = status;
    }

    fn create_time(&self) -> Timestamp {
        self.create_time
    }

    fn update_time(&self) -> Timestamp {
        self.update_time
    }

    fn set_create_time(&mut self, time: Timestamp) {
        self.create_time = time;
    }

    fn set_update_time(&mut self, time: Timestamp) {
        self.update_time = time;
    }
}
