//! File-backed repository.

use crate::config::FileConfig;
use crate::dir::{self, RepositoryDir};
use crate::error::{Affected, RepositoryError, RepositoryResult};
use crate::record::{Participant, ParticipantUndo, Record, Transaction, Versioned};
use crate::repository::{HmilyRepository, OptimisticLock, RecordRepository, ROWS};
use crate::stats::RepositoryStats;
use crate::types::RecordKind;
use hmily_serializer::{Serializer, SerializerKind};
use parking_lot::RwLock;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::ops::ControlFlow;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Maximum number of bytes read back from one record file.
///
/// This bounds the serialized size of a record: a larger record is written
/// in full but reads back truncated, fails to decode and behaves as absent.
pub const READ_BUFFER_SIZE: usize = 2048;

/// A repository storing one file per record.
///
/// See [`crate::dir`] for the layout. Every record mutation is an
/// independent full-file overwrite; there is no append log and no batch API.
///
/// # Durability
///
/// Writes go through the platform's buffered I/O. Unless
/// [`FileConfig::sync_writes`] is enabled, a crash between a write and the
/// OS flushing it can lose that latest update.
///
/// # Thread Safety
///
/// One read/write lock guards all record files of an instance, across all
/// record kinds. Writers exclude readers and other writers; readers run
/// concurrently. Clones share the instance and its lock.
///
/// Instances opened separately do **not** share a lock, even on the same
/// root, and nothing excludes other processes using the same root:
/// concurrent writers to one record file race and the last writer wins.
/// Multi-instance deployments need a backend with conditional writes.
///
/// # Example
///
/// ```no_run
/// use hmily_repository::{FileConfig, FileRepository, HmilyRepository, Transaction};
///
/// let repo = FileRepository::open(FileConfig::new("/var/lib/hmily", "acct"))?;
/// let mut tx = Transaction::new(1, "acct");
/// repo.create_hmily_transaction(&mut tx)?;
/// assert!(repo.find_by_trans_id(1).is_some());
/// # Ok::<(), hmily_repository::RepositoryError>(())
/// ```
pub struct FileRepository<S = SerializerKind> {
    inner: Arc<Inner<S>>,
}

struct Inner<S> {
    dir: RepositoryDir,
    app_name: String,
    serializer: S,
    sync_writes: bool,
    strict_optimistic_lock: bool,
    lock: RwLock<()>,
    stats: RepositoryStats,
}

impl FileRepository<SerializerKind> {
    /// Opens a repository using the serializer named in `config`.
    ///
    /// Creates the directory layout if needed.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the configuration is invalid, the
    /// root is not a directory or a directory cannot be created.
    pub fn open(config: FileConfig) -> RepositoryResult<Self> {
        let serializer = config.serializer;
        Self::open_with_serializer(config, serializer)
    }
}

impl<S: Serializer> FileRepository<S> {
    /// Opens a repository with a caller-supplied serializer.
    ///
    /// The `serializer` field of `config` is ignored.
    ///
    /// # Errors
    ///
    /// See [`FileRepository::open`].
    pub fn open_with_serializer(config: FileConfig, serializer: S) -> RepositoryResult<Self> {
        let dir = RepositoryDir::open(&config)?;
        Ok(Self {
            inner: Arc::new(Inner {
                dir,
                app_name: config.app_name,
                serializer,
                sync_writes: config.sync_writes,
                strict_optimistic_lock: config.strict_optimistic_lock,
                lock: RwLock::new(()),
                stats: RepositoryStats::new(),
            }),
        })
    }

    /// Returns the resolved directory layout.
    #[must_use]
    pub fn dir(&self) -> &RepositoryDir {
        &self.inner.dir
    }

    /// Returns the operation counters.
    #[must_use]
    pub fn stats(&self) -> &RepositoryStats {
        &self.inner.stats
    }

    /// Returns the serializer.
    #[must_use]
    pub fn serializer(&self) -> &S {
        &self.inner.serializer
    }

    /// Reads every record file and reports those that cannot be decoded.
    ///
    /// Unlike lookups and scans, which treat such files as absent, this
    /// surfaces each one as [`RepositoryError::Unreadable`].
    #[must_use]
    pub fn verify(&self) -> Vec<RepositoryError> {
        let _guard = self.inner.lock.read();
        let mut problems = Vec::new();
        self.verify_kind::<Transaction>(&mut problems);
        self.verify_kind::<Participant>(&mut problems);
        self.verify_kind::<ParticipantUndo>(&mut problems);
        problems
    }

    fn verify_kind<R: Record>(&self, problems: &mut Vec<RepositoryError>) {
        let ids = match dir::list_ids(self.inner.dir.records(R::KIND)) {
            Ok(ids) => ids,
            Err(e) => {
                problems.push(e.into());
                return;
            }
        };
        for id in ids {
            match self.load::<R>(id) {
                Ok(_) => {}
                Err(RepositoryError::Io(e)) => {
                    problems.push(RepositoryError::unreadable(R::KIND, id, e.to_string()));
                }
                Err(e) => problems.push(e),
            }
        }
    }

    /// Reads and decodes one record. `Ok(None)` if the file is absent.
    fn load<R: Record>(&self, id: u64) -> RepositoryResult<Option<R>> {
        let path = self.inner.dir.record_path(R::KIND, id);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut buffer = Vec::with_capacity(READ_BUFFER_SIZE);
        file.take(READ_BUFFER_SIZE as u64).read_to_end(&mut buffer)?;
        self.inner.stats.record_read(buffer.len() as u64);

        self.inner
            .serializer
            .deserialize::<R>(&buffer)
            .map(Some)
            .map_err(|e| RepositoryError::unreadable(R::KIND, id, e.to_string()))
    }

    /// Like `load`, but an unreadable record is logged, counted and
    /// reported as absent. Caller holds the lock.
    fn read_unlocked<R: Record>(&self, id: u64) -> Option<R> {
        match self.load::<R>(id) {
            Ok(record) => record,
            Err(e) => {
                warn!(kind = %R::KIND, id, error = %e, "treating unreadable record as absent");
                self.inner.stats.record_corrupt();
                None
            }
        }
    }

    /// Overwrites the file of `record`. Caller holds the write lock.
    fn write_unlocked<R: Record>(&self, record: &R) -> RepositoryResult<()> {
        let id = record.id();
        let bytes = self.inner.serializer.serialize(record)?;
        if bytes.len() > READ_BUFFER_SIZE {
            warn!(
                kind = %R::KIND,
                id,
                size = bytes.len(),
                limit = READ_BUFFER_SIZE,
                "record exceeds the read buffer and will not be readable"
            );
        }

        let path = self.inner.dir.record_path(R::KIND, id);
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;
        file.write_all(&bytes)?;
        if self.inner.sync_writes {
            file.sync_all()?;
        }

        self.inner.stats.record_write(bytes.len() as u64);
        debug!(kind = %R::KIND, id, bytes = bytes.len(), "wrote record");
        Ok(())
    }

    /// Deletes a record file. `Ok(false)` if it was already gone. Caller
    /// holds the write lock.
    fn delete_unlocked(&self, kind: RecordKind, id: u64) -> io::Result<bool> {
        match fs::remove_file(self.inner.dir.record_path(kind, id)) {
            Ok(()) => {
                self.inner.stats.record_delete();
                debug!(kind = %kind, id, "deleted record");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Decodes every record of kind `R` in id order, skipping unreadable
    /// ones, until `visit` breaks. Caller holds the lock.
    fn scan_unlocked<R: Record>(
        &self,
        mut visit: impl FnMut(u64, R) -> ControlFlow<()>,
    ) -> io::Result<()> {
        self.inner.stats.record_scan();
        for id in dir::list_ids(self.inner.dir.records(R::KIND))? {
            if let Some(record) = self.read_unlocked::<R>(id) {
                if visit(id, record).is_break() {
                    break;
                }
            }
        }
        Ok(())
    }

    fn contains_unlocked(&self, kind: RecordKind, id: u64) -> io::Result<bool> {
        dir::contains(self.inner.dir.records(kind), id)
    }

    fn transient(
        &self,
        operation: &'static str,
        kind: RecordKind,
        error: impl Into<RepositoryError>,
    ) -> Affected {
        let error = error.into();
        error!(operation, kind = %kind, error = %error, "repository operation failed");
        self.inner.stats.record_fault();
        Affected::Fault(error)
    }

    fn scan_failed(&self, operation: &'static str, kind: RecordKind, e: io::Error) {
        error!(operation, kind = %kind, error = %e, "cannot list record directory");
        self.inner.stats.record_fault();
    }
}

impl<R: Record, S: Serializer> RecordRepository<R> for FileRepository<S> {
    fn create(&self, record: &mut R) -> RepositoryResult<usize> {
        let _guard = self.inner.lock.write();

        let mut stamped = record.clone();
        if self.contains_unlocked(R::KIND, record.id())? {
            match self.read_unlocked::<R>(record.id()) {
                Some(stored) => stamped.mark_replacing(&stored),
                None => stamped.mark_updated(),
            }
        } else {
            stamped.mark_created();
        }
        self.write_unlocked(&stamped)?;

        *record = stamped;
        Ok(ROWS)
    }

    fn find_by_id(&self, id: u64) -> Option<R> {
        let _guard = self.inner.lock.read();
        self.read_unlocked(id)
    }

    fn list_by_filter(&self, filter: &mut dyn FnMut(&R) -> bool) -> Vec<R> {
        let _guard = self.inner.lock.read();
        let mut matches = Vec::new();
        let scanned = self.scan_unlocked::<R>(|_, record| {
            if filter(&record) {
                matches.push(record);
            }
            ControlFlow::Continue(())
        });
        if let Err(e) = scanned {
            self.scan_failed("list_by_filter", R::KIND, e);
            return Vec::new();
        }
        matches
    }

    fn update_status(&self, id: u64, status: i32) -> Affected {
        let _guard = self.inner.lock.write();

        match self.contains_unlocked(R::KIND, id) {
            Ok(true) => {}
            Ok(false) => return Affected::Rows(0),
            Err(e) => return self.transient("update_status", R::KIND, e),
        }
        let Some(mut record) = self.read_unlocked::<R>(id) else {
            return Affected::Rows(0);
        };

        record.set_status(status);
        record.mark_updated();
        match self.write_unlocked(&record) {
            Ok(()) => Affected::Rows(ROWS),
            Err(e) => self.transient("update_status", R::KIND, e),
        }
    }

    fn remove(&self, id: u64) -> Affected {
        let _guard = self.inner.lock.write();
        match self.delete_unlocked(R::KIND, id) {
            Ok(true) => Affected::Rows(ROWS),
            Ok(false) => Affected::Rows(0),
            Err(e) => self.transient("remove", R::KIND, e),
        }
    }

    /// Deletes matching records under one write lock.
    ///
    /// A delete that fails is logged and skipped; the next purge retries it.
    /// The result is a fault only if nothing could be removed.
    fn remove_by_filter(&self, filter: &mut dyn FnMut(&R) -> bool) -> Affected {
        let _guard = self.inner.lock.write();

        let mut removed = 0;
        let mut first_fault = None;
        let scanned = self.scan_unlocked::<R>(|id, record| {
            if filter(&record) {
                match self.delete_unlocked(R::KIND, id) {
                    Ok(true) => removed += 1,
                    Ok(false) => {}
                    Err(e) => {
                        error!(kind = %R::KIND, id, error = %e, "cannot delete record");
                        self.inner.stats.record_fault();
                        first_fault.get_or_insert(e);
                    }
                }
            }
            ControlFlow::Continue(())
        });

        if let Err(e) = scanned {
            return self.transient("remove_by_filter", R::KIND, e);
        }
        match first_fault {
            Some(e) if removed == 0 => Affected::Fault(e.into()),
            _ => Affected::Rows(removed),
        }
    }

    fn exists_by_filter(&self, filter: &mut dyn FnMut(&R) -> bool) -> bool {
        let _guard = self.inner.lock.read();
        let mut found = false;
        let scanned = self.scan_unlocked::<R>(|_, record| {
            if filter(&record) {
                found = true;
                return ControlFlow::Break(());
            }
            ControlFlow::Continue(())
        });
        if let Err(e) = scanned {
            self.scan_failed("exists_by_filter", R::KIND, e);
            return false;
        }
        found
    }
}

impl<R: Versioned, S: Serializer> OptimisticLock<R> for FileRepository<S> {
    /// Claims the record for another attempt.
    ///
    /// Without [`FileConfig::strict_optimistic_lock`] the stored version is
    /// not compared, so two claimants in one process both succeed, one after
    /// the other. The written version and retry count still start from the
    /// larger of the stored and presented values.
    fn update_with_optimistic_lock(&self, record: &mut R) -> Affected {
        let id = record.id();
        let _guard = self.inner.lock.write();

        match self.contains_unlocked(R::KIND, id) {
            Ok(true) => {}
            Ok(false) => {
                warn!(kind = %R::KIND, id, "record to claim no longer exists");
                return Affected::Rows(0);
            }
            Err(e) => return self.transient("update_with_optimistic_lock", R::KIND, e),
        }

        let stored = self.read_unlocked::<R>(id);
        if self.inner.strict_optimistic_lock {
            let Some(stored) = &stored else {
                return Affected::Rows(0);
            };
            if stored.version() != record.version() {
                debug!(
                    kind = %R::KIND,
                    id,
                    stored = stored.version(),
                    presented = record.version(),
                    "rejecting stale claim"
                );
                return Affected::Stale {
                    stored: stored.version(),
                    presented: record.version(),
                };
            }
        }

        let mut claimed = record.clone();
        match &stored {
            Some(stored) => claimed.mark_retried_over(stored),
            None => claimed.mark_retried(),
        }
        match self.write_unlocked(&claimed) {
            Ok(()) => {
                *record = claimed;
                Affected::Rows(ROWS)
            }
            Err(e) => self.transient("update_with_optimistic_lock", R::KIND, e),
        }
    }
}

impl<S: Serializer> HmilyRepository for FileRepository<S> {
    fn app_name(&self) -> &str {
        &self.inner.app_name
    }
}

impl<S> Clone for FileRepository<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> fmt::Debug for FileRepository<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileRepository")
            .field("root", &self.inner.dir.root())
            .field("app_name", &self.inner.app_name)
            .field("sync_writes", &self.inner.sync_writes)
            .field("strict_optimistic_lock", &self.inner.strict_optimistic_lock)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HmilyAction, Timestamp};
    use hmily_serializer::JsonSerializer;
    use std::thread;
    use std::time::Duration;
    use tempfile::{tempdir, TempDir};

    fn open(temp: &TempDir) -> FileRepository {
        FileRepository::open(FileConfig::new(temp.path(), "acct")).unwrap()
    }

    fn later() -> Timestamp {
        Timestamp::now().saturating_add(Duration::from_secs(3600))
    }

    #[test]
    fn create_then_find() {
        let temp = tempdir().unwrap();
        let repo = open(&temp);

        let mut tx = Transaction::new(1, "acct").with_status(HmilyAction::Trying);
        assert_eq!(repo.create_hmily_transaction(&mut tx).unwrap(), 1);
        assert_eq!(tx.version, 0);
        assert_ne!(tx.create_time, Timestamp::EPOCH);

        let found = repo.find_by_trans_id(1).unwrap();
        assert_eq!(found, tx);
        assert!(temp.path().join("hmily").join("1").is_file());
    }

    #[test]
    fn duplicate_create_is_an_update() {
        let temp = tempdir().unwrap();
        let repo = open(&temp);

        let mut tx = Transaction::new(1, "acct");
        repo.create_hmily_transaction(&mut tx).unwrap();
        let first = tx.clone();

        repo.create_hmily_transaction(&mut tx).unwrap();
        assert_eq!(tx.version, first.version + 1);
        assert!(tx.update_time > first.update_time);
        assert_eq!(tx.create_time, first.create_time);
        assert_eq!(repo.find_by_trans_id(1).unwrap().version, 1);
    }

    #[test]
    fn duplicate_undo_create_only_advances_time() {
        let temp = tempdir().unwrap();
        let repo = open(&temp);

        let mut undo = ParticipantUndo::new(100, 10, 1);
        repo.create_hmily_participant_undo(&mut undo).unwrap();
        let first = undo.update_time;
        repo.create_hmily_participant_undo(&mut undo).unwrap();
        assert!(undo.update_time > first);
    }

    #[test]
    fn find_absent_is_none() {
        let temp = tempdir().unwrap();
        let repo = open(&temp);
        assert!(repo.find_by_trans_id(404).is_none());
        assert_eq!(repo.stats().corrupt_records(), 0);
    }

    #[test]
    fn update_status_bumps_version() {
        let temp = tempdir().unwrap();
        let repo = open(&temp);

        let mut tx = Transaction::new(1, "acct").with_status(HmilyAction::Trying);
        repo.create_hmily_transaction(&mut tx).unwrap();

        let affected = repo.update_hmily_transaction_status(1, HmilyAction::Confirming.code());
        assert_eq!(affected.rows(), 1);

        let stored = repo.find_by_trans_id(1).unwrap();
        assert_eq!(stored.version, 1);
        assert_eq!(stored.status, HmilyAction::Confirming.code());
        assert!(stored.update_time > tx.update_time);
    }

    #[test]
    fn update_status_of_absent_record_is_zero_rows() {
        let temp = tempdir().unwrap();
        let repo = open(&temp);
        let affected = repo.update_hmily_participant_status(9, 2);
        assert!(matches!(affected, Affected::Rows(0)));
    }

    #[test]
    fn undo_status_update() {
        let temp = tempdir().unwrap();
        let repo = open(&temp);
        let mut undo = ParticipantUndo::new(100, 10, 1);
        repo.create_hmily_participant_undo(&mut undo).unwrap();

        assert!(repo.update_hmily_participant_undo_status(100, 4).is_applied());
        let stored = repo.find_hmily_participant_undo_by_participant_id(10);
        assert_eq!(stored[0].status, 4);
    }

    #[test]
    fn remove_is_idempotent() {
        let temp = tempdir().unwrap();
        let repo = open(&temp);
        let mut tx = Transaction::new(1, "acct");
        repo.create_hmily_transaction(&mut tx).unwrap();

        assert_eq!(repo.remove_hmily_transaction(1).rows(), 1);
        assert!(repo.find_by_trans_id(1).is_none());

        let again = repo.remove_hmily_transaction(1);
        assert!(!again.is_fault());
        assert_eq!(again.rows(), 0);
    }

    #[test]
    fn remove_failure_is_reported_not_raised() {
        let temp = tempdir().unwrap();
        let repo = open(&temp);
        // A directory where the record file should be cannot be unlinked.
        fs::create_dir(temp.path().join("hmily").join("5")).unwrap();

        let affected = repo.remove_hmily_transaction(5);
        assert!(affected.is_fault());
        assert_eq!(affected.rows(), 0);
        assert_eq!(repo.stats().faults(), 1);
    }

    #[test]
    fn create_failure_is_raised() {
        let temp = tempdir().unwrap();
        let repo = open(&temp);
        fs::create_dir(temp.path().join("hmily").join("7")).unwrap();

        let mut tx = Transaction::new(7, "acct");
        let result = repo.create_hmily_transaction(&mut tx);
        assert!(matches!(result, Err(RepositoryError::Io(_))));
        // The caller's record is left unstamped.
        assert_eq!(tx.create_time, Timestamp::EPOCH);
    }

    #[test]
    fn truncated_file_reads_as_absent() {
        let temp = tempdir().unwrap();
        let repo = open(&temp);
        let mut p = Participant::new(10, 1, "acct");
        repo.create_hmily_participant(&mut p).unwrap();

        let path = repo.dir().record_path(RecordKind::Participant, 10);
        let bytes = fs::read(&path).unwrap();
        fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();

        assert!(RecordRepository::<Participant>::find_by_id(&repo, 10).is_none());
        assert!(repo.list_hmily_participant_by_trans_id(1).is_empty());
        assert_eq!(repo.stats().corrupt_records(), 2);
    }

    #[test]
    fn oversize_record_is_written_but_unreadable() {
        let temp = tempdir().unwrap();
        let repo = open(&temp);
        let mut undo = ParticipantUndo::new(100, 10, 1).with_payload(vec![7u8; READ_BUFFER_SIZE]);

        repo.create_hmily_participant_undo(&mut undo).unwrap();
        let path = repo.dir().record_path(RecordKind::ParticipantUndo, 100);
        assert!(fs::metadata(path).unwrap().len() > READ_BUFFER_SIZE as u64);
        assert!(repo.find_hmily_participant_undo_by_participant_id(10).is_empty());
    }

    #[test]
    fn list_skips_corrupt_records() {
        let temp = tempdir().unwrap();
        let repo = open(&temp);
        for id in 1..=3 {
            repo.create_hmily_transaction(&mut Transaction::new(id, "acct")).unwrap();
        }
        fs::write(repo.dir().record_path(RecordKind::Transaction, 2), b"\xff\x00garbage").unwrap();

        let all = RecordRepository::<Transaction>::list_by_filter(&repo, &mut |_| true);
        let ids: Vec<u64> = all.iter().map(|t| t.trans_id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(repo.verify().len(), 1);
    }

    #[test]
    fn list_limit_by_delay_scopes_and_limits() {
        let temp = tempdir().unwrap();
        let repo = open(&temp);
        for id in 1..=5 {
            repo.create_hmily_transaction(&mut Transaction::new(id, "acct")).unwrap();
        }
        repo.create_hmily_transaction(&mut Transaction::new(6, "inventory")).unwrap();

        assert_eq!(repo.list_limit_by_delay(later(), 100).len(), 5);
        assert_eq!(repo.list_limit_by_delay(later(), 3).len(), 3);
        assert!(repo.list_limit_by_delay(Timestamp::EPOCH, 100).is_empty());
    }

    #[test]
    fn list_hmily_participant_excludes_terminal_statuses() {
        let temp = tempdir().unwrap();
        let repo = open(&temp);
        let statuses = [HmilyAction::Trying, HmilyAction::Delete, HmilyAction::Death, HmilyAction::Canceling];
        for (id, status) in (1..).zip(statuses) {
            let mut p = Participant::new(id, 1, "acct").with_status(status);
            repo.create_hmily_participant(&mut p).unwrap();
        }
        let mut saga = Participant::new(9, 1, "acct").with_trans_type("SAGA");
        repo.create_hmily_participant(&mut saga).unwrap();

        let ids: Vec<u64> = repo
            .list_hmily_participant(later(), "TCC", 10)
            .iter()
            .map(|p| p.participant_id)
            .collect();
        assert_eq!(ids, vec![1, 4]);
    }

    #[test]
    fn find_hmily_participant_follows_ref_id() {
        let temp = tempdir().unwrap();
        let repo = open(&temp);
        repo.create_hmily_participant(&mut Participant::new(10, 1, "acct")).unwrap();
        repo.create_hmily_participant(&mut Participant::new(11, 1, "acct").with_ref_id(10)).unwrap();
        repo.create_hmily_participant(&mut Participant::new(12, 1, "acct")).unwrap();

        let ids: Vec<u64> = repo.find_hmily_participant(10).iter().map(|p| p.participant_id).collect();
        assert_eq!(ids, vec![10, 11]);
    }

    #[test]
    fn exist_participant_by_trans_id() {
        let temp = tempdir().unwrap();
        let repo = open(&temp);
        repo.create_hmily_participant(&mut Participant::new(10, 1, "acct")).unwrap();

        assert!(repo.exist_hmily_participant_by_trans_id(1));
        assert!(!repo.exist_hmily_participant_by_trans_id(2));
    }

    #[test]
    fn purge_removes_only_old_soft_deleted_records() {
        let temp = tempdir().unwrap();
        let repo = open(&temp);
        repo.create_hmily_transaction(&mut Transaction::new(1, "acct").with_status(HmilyAction::Delete)).unwrap();
        repo.create_hmily_transaction(&mut Transaction::new(2, "acct").with_status(HmilyAction::Trying)).unwrap();
        repo.create_hmily_transaction(&mut Transaction::new(3, "acct").with_status(HmilyAction::Death)).unwrap();

        assert_eq!(repo.remove_hmily_transaction_by_date(Timestamp::EPOCH).rows(), 0);
        assert_eq!(repo.remove_hmily_transaction_by_date(later()).rows(), 1);
        assert!(repo.find_by_trans_id(1).is_none());
        assert!(repo.find_by_trans_id(2).is_some());
        assert!(repo.find_by_trans_id(3).is_some());
    }

    #[test]
    fn lock_participant_increments_retry() {
        let temp = tempdir().unwrap();
        let repo = open(&temp);
        let mut p = Participant::new(10, 1, "acct");
        repo.create_hmily_participant(&mut p).unwrap();

        assert!(repo.lock_hmily_participant(&mut p));
        assert_eq!((p.version, p.retry), (1, 1));
        let stored = RecordRepository::<Participant>::find_by_id(&repo, 10).unwrap();
        assert_eq!(stored, p);
    }

    #[test]
    fn lock_of_removed_record_fails() {
        let temp = tempdir().unwrap();
        let repo = open(&temp);
        let mut tx = Transaction::new(1, "acct");
        repo.create_hmily_transaction(&mut tx).unwrap();
        let _ = repo.remove_hmily_transaction(1);

        let affected = repo.update_retry_by_lock(&mut tx);
        assert_eq!(affected.rows(), 0);
        assert_eq!(tx.retry, 0);
    }

    #[test]
    fn default_lock_does_not_compare_versions() {
        let temp = tempdir().unwrap();
        let repo = open(&temp);
        let mut tx = Transaction::new(1, "acct");
        repo.create_hmily_transaction(&mut tx).unwrap();
        let mut stale = tx.clone();

        assert!(repo.update_retry_by_lock(&mut tx).is_applied());
        // A second claimant holding the old version still wins, but builds
        // on the stored claim.
        assert!(repo.update_retry_by_lock(&mut stale).is_applied());
        let stored = repo.find_by_trans_id(1).unwrap();
        assert_eq!((stored.version, stored.retry), (2, 2));
        assert!(stored.update_time > tx.update_time);
    }

    #[test]
    fn duplicate_create_of_stale_copy_keeps_history() {
        let temp = tempdir().unwrap();
        let repo = open(&temp);
        let mut tx = Transaction::new(1, "acct").with_status(HmilyAction::Trying);
        repo.create_hmily_transaction(&mut tx).unwrap();
        let original = tx.clone();
        repo.update_hmily_transaction_status(1, HmilyAction::Confirming.code()).into_result().unwrap();
        repo.update_hmily_transaction_status(1, HmilyAction::Canceling.code()).into_result().unwrap();
        let before = repo.find_by_trans_id(1).unwrap();
        assert_eq!(before.version, 2);

        let mut stale = original.clone();
        repo.create_hmily_transaction(&mut stale).unwrap();
        let after = repo.find_by_trans_id(1).unwrap();
        assert_eq!(after.version, 3);
        assert_eq!(after.status, HmilyAction::Trying.code());
        assert_eq!(after.create_time, original.create_time);
        assert!(after.update_time > before.update_time);

        let mut fresh = Transaction::new(1, "acct");
        repo.create_hmily_transaction(&mut fresh).unwrap();
        assert_eq!(fresh.create_time, original.create_time);
        assert_eq!(fresh.version, 4);
    }

    #[test]
    fn strict_lock_rejects_stale_version() {
        let temp = tempdir().unwrap();
        let config = FileConfig::new(temp.path(), "acct").strict_optimistic_lock(true);
        let repo = FileRepository::open(config).unwrap();
        let mut tx = Transaction::new(1, "acct");
        repo.create_hmily_transaction(&mut tx).unwrap();
        let mut stale = tx.clone();

        assert!(repo.update_retry_by_lock(&mut tx).is_applied());
        let affected = repo.update_retry_by_lock(&mut stale);
        assert!(matches!(affected, Affected::Stale { stored: 1, presented: 0 }));
        assert_eq!(stale.version, 0);
    }

    #[test]
    fn removing_participant_keeps_its_undo_records() {
        let temp = tempdir().unwrap();
        let repo = open(&temp);
        repo.create_hmily_participant(&mut Participant::new(10, 1, "acct")).unwrap();
        repo.create_hmily_participant_undo(&mut ParticipantUndo::new(100, 10, 1)).unwrap();

        assert!(repo.remove_hmily_participant(10).is_applied());
        let undo = repo.find_hmily_participant_undo_by_participant_id(10);
        assert_eq!(undo.len(), 1);
        assert_eq!(undo[0].undo_id, 100);
    }

    #[test]
    fn custom_serializer_writes_its_format() {
        let temp = tempdir().unwrap();
        let repo = FileRepository::open_with_serializer(FileConfig::new(temp.path(), "acct"), JsonSerializer).unwrap();
        repo.create_hmily_transaction(&mut Transaction::new(1, "acct")).unwrap();

        let raw = fs::read(repo.dir().record_path(RecordKind::Transaction, 1)).unwrap();
        assert!(raw.starts_with(b"{\"trans_id\":1"));
        assert!(repo.find_by_trans_id(1).is_some());
    }

    #[test]
    fn reopen_sees_previous_records() {
        let temp = tempdir().unwrap();
        {
            let repo = open(&temp);
            repo.create_hmily_transaction(&mut Transaction::new(1, "acct")).unwrap();
        }
        let repo = open(&temp);
        assert!(repo.find_by_trans_id(1).is_some());
    }

    #[test]
    fn clones_share_one_instance() {
        let temp = tempdir().unwrap();
        let repo = open(&temp);
        let handles: Vec<_> = (0..4u64)
            .map(|t| {
                let repo = repo.clone();
                thread::spawn(move || {
                    for i in 0..25 {
                        let id = t * 1000 + i;
                        repo.create_hmily_transaction(&mut Transaction::new(id, "acct")).unwrap();
                        let _ = repo.update_hmily_transaction_status(id, 2);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let all = RecordRepository::<Transaction>::list_by_filter(&repo, &mut |_| true);
        assert_eq!(all.len(), 100);
        assert!(all.iter().all(|t| t.status == 2 && t.version == 1));
        assert_eq!(repo.stats().writes(), 200);
    }
}
