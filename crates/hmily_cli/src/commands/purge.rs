//! Purge command implementation.

use super::Target;
use hmily_repository::{
    filter, Affected, FileRepository, HmilyAction, HmilyRepository, Participant, ParticipantUndo,
    Record, RecordRepository, Timestamp, Transaction,
};
use std::time::Duration;

/// Records removed, or that would be removed, per kind.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PurgeStats {
    /// Transactions.
    pub transactions: usize,
    /// Participants.
    pub participants: usize,
    /// Undo records.
    pub undo: usize,
}

/// Runs the purge command.
pub fn run(
    target: &Target,
    older_than_secs: u64,
    dry_run: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let repo = target.open()?;
    let cutoff = Timestamp::ago(Duration::from_secs(older_than_secs));

    let stats = if dry_run {
        println!("Dry run: counting soft-deleted records updated before {cutoff}");
        count(&repo, cutoff)
    } else {
        println!("Purging soft-deleted records updated before {cutoff}");
        purge(&repo, cutoff)?
    };

    println!("  Transactions: {}", stats.transactions);
    println!("  Participants: {}", stats.participants);
    println!("  Undo records: {}", stats.undo);
    Ok(())
}

/// Counts purgeable records without removing them.
pub fn count(repo: &FileRepository, cutoff: Timestamp) -> PurgeStats {
    PurgeStats {
        transactions: matching::<Transaction>(repo, cutoff),
        participants: matching::<Participant>(repo, cutoff),
        undo: matching::<ParticipantUndo>(repo, cutoff),
    }
}

/// Runs the three date purges.
///
/// # Errors
///
/// Returns the first purge that removed nothing because of a fault.
pub fn purge(repo: &FileRepository, cutoff: Timestamp) -> Result<PurgeStats, Box<dyn std::error::Error>> {
    let rows = |affected: Affected| affected.into_result();
    Ok(PurgeStats {
        transactions: rows(repo.remove_hmily_transaction_by_date(cutoff))?,
        participants: rows(repo.remove_hmily_participant_by_date(cutoff))?,
        undo: rows(repo.remove_hmily_participant_undo_by_date(cutoff))?,
    })
}

fn matching<R: Record>(repo: &FileRepository, cutoff: Timestamp) -> usize {
    let mut purgeable = filter::purgeable::<R>(cutoff, HmilyAction::Delete.code());
    RecordRepository::<R>::list_by_filter(repo, &mut purgeable).len()
}
