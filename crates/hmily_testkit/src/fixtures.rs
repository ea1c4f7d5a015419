//! Test fixtures and repository helpers.

use hmily_repository::{
    FileConfig, FileRepository, HmilyAction, Participant, ParticipantUndo, Timestamp, Transaction,
};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

/// Application name used by all fixtures.
pub const TEST_APP: &str = "acct";

/// A file repository in a temporary directory, removed on drop.
pub struct TestRepository {
    /// The repository instance.
    pub repo: FileRepository,
    /// The temporary directory (kept alive to prevent cleanup).
    temp_dir: TempDir,
}

impl TestRepository {
    /// Creates a repository for [`TEST_APP`] with default options.
    pub fn new() -> Self {
        Self::with_config(|config| config)
    }

    /// Creates a repository, letting the caller adjust the configuration.
    pub fn with_config(adjust: impl FnOnce(FileConfig) -> FileConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config = adjust(FileConfig::new(temp_dir.path(), TEST_APP));
        let repo = FileRepository::open(config).expect("Failed to open file repository");
        Self { repo, temp_dir }
    }

    /// Returns the repository root.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Opens a second, independent instance on the same root.
    ///
    /// The two instances do not share a lock.
    pub fn reopen(&self) -> FileRepository {
        FileRepository::open(FileConfig::new(self.path(), TEST_APP))
            .expect("Failed to reopen file repository")
    }
}

impl Default for TestRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for TestRepository {
    type Target = FileRepository;

    fn deref(&self) -> &Self::Target {
        &self.repo
    }
}

/// Runs a test with a temporary file repository.
pub fn with_file_repository<F, R>(f: F) -> R
where
    F: FnOnce(&FileRepository) -> R,
{
    let test_repo = TestRepository::new();
    f(&test_repo.repo)
}

/// A transaction of [`TEST_APP`] in the `Trying` state.
pub fn transaction(trans_id: u64) -> Transaction {
    Transaction::new(trans_id, TEST_APP).with_status(HmilyAction::Trying)
}

/// A participant of [`TEST_APP`] in the `Trying` state.
pub fn participant(participant_id: u64, trans_id: u64) -> Participant {
    Participant::new(participant_id, trans_id, TEST_APP).with_status(HmilyAction::Trying)
}

/// An undo record with a small payload.
pub fn undo(undo_id: u64, participant_id: u64) -> ParticipantUndo {
    ParticipantUndo::new(undo_id, participant_id, 0).with_payload(b"UPDATE account SET balance = balance + 10".to_vec())
}

/// A cutoff one hour in the future: every stored record is older.
pub fn cutoff_after_everything() -> Timestamp {
    Timestamp::now().saturating_add(Duration::from_secs(3600))
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;
    use hmily_repository::HmilyRepository;

    /// Stores a transaction with `participants` branches, each with one undo
    /// record. Participant ids are `trans_id * 100 + n`, undo ids
    /// `participant_id * 10`.
    pub fn transaction_with_branches<H: HmilyRepository>(
        repo: &H,
        trans_id: u64,
        participants: u64,
    ) -> (Transaction, Vec<Participant>) {
        let mut tx = transaction(trans_id);
        repo.create_hmily_transaction(&mut tx)
            .expect("Failed to create transaction");

        let branches = (1..=participants)
            .map(|n| {
                let mut p = participant(trans_id * 100 + n, trans_id);
                repo.create_hmily_participant(&mut p)
                    .expect("Failed to create participant");
                let mut u = undo(p.participant_id * 10, p.participant_id);
                u.trans_id = trans_id;
                repo.create_hmily_participant_undo(&mut u)
                    .expect("Failed to create undo");
                p
            })
            .collect();
        (tx, branches)
    }
}
