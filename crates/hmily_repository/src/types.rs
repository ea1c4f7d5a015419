//! Core type definitions for the repository.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Wall-clock instant with millisecond precision.
///
/// Stored as milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The Unix epoch.
    pub const EPOCH: Timestamp = Timestamp(0);

    /// Creates a timestamp from milliseconds since the epoch.
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Returns milliseconds since the epoch.
    #[must_use]
    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// Returns the current time.
    #[must_use]
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        Self(u64::try_from(millis).unwrap_or(u64::MAX))
    }

    /// Returns the current time, or one millisecond after `self` if the
    /// clock has not moved past it.
    ///
    /// Used for `update_time` so that every mutation strictly advances it.
    #[must_use]
    pub fn advance(self) -> Self {
        Self::now().max(Self(self.0.saturating_add(1)))
    }

    /// Returns the instant `delay` before now, the usual recovery cutoff.
    #[must_use]
    pub fn ago(delay: Duration) -> Self {
        Self::now().saturating_sub(delay)
    }

    /// Subtracts a duration, clamping at the epoch.
    #[must_use]
    pub fn saturating_sub(self, delay: Duration) -> Self {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        Self(self.0.saturating_sub(millis))
    }

    /// Adds a duration, clamping at the maximum.
    #[must_use]
    pub fn saturating_add(self, delay: Duration) -> Self {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        Self(self.0.saturating_add(millis))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// The three kinds of persisted record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// A distributed transaction.
    Transaction,
    /// A branch of a distributed transaction.
    Participant,
    /// Compensation data for a participant.
    ParticipantUndo,
}

impl RecordKind {
    /// All record kinds.
    pub const ALL: [RecordKind; 3] = [
        RecordKind::Transaction,
        RecordKind::Participant,
        RecordKind::ParticipantUndo,
    ];

    /// Human-readable name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Transaction => "transaction",
            Self::Participant => "participant",
            Self::ParticipantUndo => "participant undo",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lifecycle codes stored in the `status` field of records.
///
/// The repository treats status as an opaque integer: it compares codes in
/// its purge and scan filters but never interprets transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum HmilyAction {
    /// Registered, try phase not started.
    PreTry = 0,
    /// Try phase in progress.
    Trying = 1,
    /// Confirm phase in progress.
    Confirming = 2,
    /// Cancel phase in progress.
    Canceling = 3,
    /// Finished and soft-deleted; eligible for purge.
    Delete = 4,
    /// Gave up; no further recovery.
    Death = 5,
}

impl HmilyAction {
    /// Returns the stored integer code.
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Maps a stored code back to an action.
    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::PreTry),
            1 => Some(Self::Trying),
            2 => Some(Self::Confirming),
            3 => Some(Self::Canceling),
            4 => Some(Self::Delete),
            5 => Some(Self::Death),
            _ => None,
        }
    }

    /// Returns true for codes that recovery must skip.
    #[must_use]
    pub const fn is_terminal(code: i32) -> bool {
        code == Self::Delete.code() || code == Self::Death.code()
    }
}

impl From<HmilyAction> for i32 {
    fn from(action: HmilyAction) -> Self {
        action.code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_is_strictly_increasing() {
        let far_future = Timestamp::now().saturating_add(Duration::from_secs(3600));
        assert_eq!(far_future.advance().as_millis(), far_future.as_millis() + 1);

        let past = Timestamp::from_millis(1);
        assert!(past.advance() > past);
    }

    #[test]
    fn ago_is_before_now() {
        let cutoff = Timestamp::ago(Duration::from_secs(60));
        assert!(cutoff < Timestamp::now());
        assert_eq!(Timestamp::EPOCH.saturating_sub(Duration::from_secs(1)), Timestamp::EPOCH);
    }

    #[test]
    fn action_codes() {
        assert_eq!(HmilyAction::Delete.code(), 4);
        assert_eq!(HmilyAction::Death.code(), 5);
        assert_eq!(HmilyAction::from_code(2), Some(HmilyAction::Confirming));
        assert_eq!(HmilyAction::from_code(42), None);
        assert!(HmilyAction::is_terminal(4));
        assert!(!HmilyAction::is_terminal(1));
    }
}
