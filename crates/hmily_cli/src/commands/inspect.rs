//! Inspect command implementation.

use super::Target;
use hmily_repository::{
    FileRepository, Participant, ParticipantUndo, RecordKind, RecordRepository, RepositoryError,
    StatsSnapshot, Transaction,
};
use serde::Serialize;

/// Repository inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Repository root.
    pub path: String,
    /// Per-kind record counts.
    pub kinds: Vec<KindStats>,
    /// Engine counters accumulated while inspecting.
    pub stats: StatsSnapshot,
}

/// Counts for one record kind.
#[derive(Debug, Serialize)]
pub struct KindStats {
    /// Record kind name.
    pub kind: &'static str,
    /// Directory holding the records.
    pub directory: String,
    /// Records that decode.
    pub readable: usize,
    /// Record files that do not decode.
    pub unreadable: usize,
}

/// Runs the inspect command.
pub fn run(target: &Target, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let result = collect(target)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

/// Gathers the inspection result.
pub fn collect(target: &Target) -> Result<InspectResult, Box<dyn std::error::Error>> {
    let repo = target.open()?;
    let problems = repo.verify();
    let unreadable = |kind: RecordKind| {
        problems
            .iter()
            .filter(|p| matches!(p, RepositoryError::Unreadable { kind: k, .. } if *k == kind))
            .count()
    };

    let kinds = vec![
        KindStats {
            kind: RecordKind::Transaction.name(),
            directory: directory(&repo, RecordKind::Transaction),
            readable: RecordRepository::<Transaction>::list_by_filter(&repo, &mut |_| true).len(),
            unreadable: unreadable(RecordKind::Transaction),
        },
        KindStats {
            kind: RecordKind::Participant.name(),
            directory: directory(&repo, RecordKind::Participant),
            readable: RecordRepository::<Participant>::list_by_filter(&repo, &mut |_| true).len(),
            unreadable: unreadable(RecordKind::Participant),
        },
        KindStats {
            kind: RecordKind::ParticipantUndo.name(),
            directory: directory(&repo, RecordKind::ParticipantUndo),
            readable: RecordRepository::<ParticipantUndo>::list_by_filter(&repo, &mut |_| true)
                .len(),
            unreadable: unreadable(RecordKind::ParticipantUndo),
        },
    ];

    Ok(InspectResult {
        path: target.path().display().to_string(),
        kinds,
        stats: repo.stats().snapshot(),
    })
}

fn directory(repo: &FileRepository, kind: RecordKind) -> String {
    repo.dir().records(kind).display().to_string()
}

fn print_text_output(result: &InspectResult) {
    println!("Hmily Repository Inspection");
    println!("===========================");
    println!();
    println!("Path: {}", result.path);
    println!();
    println!("Records:");
    for kind in &result.kinds {
        println!(
            "  {:<18} {:>6} readable, {:>4} unreadable  ({})",
            kind.kind, kind.readable, kind.unreadable, kind.directory
        );
    }
    println!();
    println!("Bytes read: {}", result.stats.bytes_read);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::populated;
    use std::fs;

    #[test]
    fn counts_each_kind() {
        let (_temp, target) = populated();
        let result = collect(&target).unwrap();

        let counts: Vec<(usize, usize)> =
            result.kinds.iter().map(|k| (k.readable, k.unreadable)).collect();
        assert_eq!(counts, vec![(2, 0), (1, 0), (1, 0)]);
    }

    #[test]
    fn reports_unreadable_files() {
        let (temp, target) = populated();
        fs::write(temp.path().join("hmily").join("acct").join("10"), b"junk").unwrap();

        let result = collect(&target).unwrap();
        assert_eq!(result.kinds[1].readable, 0);
        assert_eq!(result.kinds[1].unreadable, 1);
        assert!(serde_json::to_string(&result).unwrap().contains("\"unreadable\":1"));
    }
}
