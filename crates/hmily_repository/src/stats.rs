//! Repository statistics.
//!
//! Counters make the otherwise silent paths observable: a scan that skips an
//! unreadable record, or a status update that swallows an I/O fault, leaves a
//! trace here in addition to its log event.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Operation counters of one repository instance.
///
/// All counters are atomic and monotonically increasing.
#[derive(Debug, Default)]
pub struct RepositoryStats {
    /// Record files read.
    reads: AtomicU64,
    /// Record files written.
    writes: AtomicU64,
    /// Record files deleted.
    deletes: AtomicU64,
    /// Directory scans.
    scans: AtomicU64,
    /// Bytes read from record files.
    bytes_read: AtomicU64,
    /// Bytes written to record files.
    bytes_written: AtomicU64,
    /// Record files present but unreadable, treated as absent.
    corrupt_records: AtomicU64,
    /// Transient faults reported as zero rows.
    faults: AtomicU64,
}

impl RepositoryStats {
    /// Creates a new stats instance.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_read(&self, bytes: u64) {
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.bytes_read.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn record_write(&self, bytes: u64) {
        self.writes.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn record_delete(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_scan(&self) {
        self.scans.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_corrupt(&self) {
        self.corrupt_records.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_fault(&self) {
        self.faults.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the number of record files read.
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Returns the number of record files written.
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Returns the number of record files deleted.
    pub fn deletes(&self) -> u64 {
        self.deletes.load(Ordering::Relaxed)
    }

    /// Returns the number of directory scans.
    pub fn scans(&self) -> u64 {
        self.scans.load(Ordering::Relaxed)
    }

    /// Returns the number of unreadable records encountered.
    ///
    /// A non-zero value means some records are invisible to lookups and
    /// recovery scans.
    pub fn corrupt_records(&self) -> u64 {
        self.corrupt_records.load(Ordering::Relaxed)
    }

    /// Returns the number of transient faults.
    pub fn faults(&self) -> u64 {
        self.faults.load(Ordering::Relaxed)
    }

    /// Returns a snapshot of all counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            reads: self.reads(),
            writes: self.writes(),
            deletes: self.deletes(),
            scans: self.scans(),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            corrupt_records: self.corrupt_records(),
            faults: self.faults(),
        }
    }
}

/// A point-in-time copy of [`RepositoryStats`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct StatsSnapshot {
    /// Record files read.
    pub reads: u64,
    /// Record files written.
    pub writes: u64,
    /// Record files deleted.
    pub deletes: u64,
    /// Directory scans.
    pub scans: u64,
    /// Bytes read.
    pub bytes_read: u64,
    /// Bytes written.
    pub bytes_written: u64,
    /// Unreadable records encountered.
    pub corrupt_records: u64,
    /// Transient faults.
    pub faults: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_stats_are_zero() {
        assert_eq!(RepositoryStats::new().snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn record_operations() {
        let stats = RepositoryStats::new();
        stats.record_read(100);
        stats.record_read(50);
        stats.record_write(20);
        stats.record_corrupt();
        stats.record_fault();
        stats.record_fault();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.reads, 2);
        assert_eq!(snapshot.bytes_read, 150);
        assert_eq!(snapshot.writes, 1);
        assert_eq!(snapshot.bytes_written, 20);
        assert_eq!(snapshot.corrupt_records, 1);
        assert_eq!(snapshot.faults, 2);
    }
}
