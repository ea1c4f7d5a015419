//! List command implementation.

use super::{RecordKindArg, Target};
use hmily_repository::{
    filter, FileRepository, HmilyAction, Participant, ParticipantUndo, Record, RecordRepository,
    Transaction,
};
use serde::Serialize;

/// Runs the list command.
pub fn run(
    target: &Target,
    kind: RecordKindArg,
    limit: Option<usize>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let repo = target.open()?;
    let limit = limit.unwrap_or(usize::MAX);

    match kind {
        RecordKindArg::Transactions => {
            let records = load::<Transaction>(&repo, limit);
            emit(&records, format, |t| {
                format!(
                    "{:>20}  {:<10} {:<5} v{} retry={} updated={}",
                    t.trans_id,
                    status_name(t.status),
                    t.trans_type,
                    t.version,
                    t.retry,
                    t.update_time
                )
            })
        }
        RecordKindArg::Participants => {
            let records = load::<Participant>(&repo, limit);
            emit(&records, format, |p| {
                format!(
                    "{:>20}  tx={} {:<10} {:<5} v{} retry={} updated={}",
                    p.participant_id,
                    p.trans_id,
                    status_name(p.status),
                    p.trans_type,
                    p.version,
                    p.retry,
                    p.update_time
                )
            })
        }
        RecordKindArg::Undo => {
            let records = load::<ParticipantUndo>(&repo, limit);
            emit(&records, format, |u| {
                format!(
                    "{:>20}  participant={} {:<10} {} bytes updated={}",
                    u.undo_id,
                    u.participant_id,
                    status_name(u.status),
                    u.undo_payload.len(),
                    u.update_time
                )
            })
        }
    }
}

/// Up to `limit` readable records of kind `R`, in id order.
pub fn load<R: Record>(repo: &FileRepository, limit: usize) -> Vec<R> {
    let mut pick = filter::limit(limit, |_: &R| true);
    RecordRepository::<R>::list_by_filter(repo, &mut pick)
}

fn emit<R: Serialize>(
    records: &[R],
    format: &str,
    line: impl Fn(&R) -> String,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(records)?),
        _ => {
            for record in records {
                println!("{}", line(record));
            }
            println!("({} records)", records.len());
        }
    }
    Ok(())
}

fn status_name(status: i32) -> String {
    match HmilyAction::from_code(status) {
        Some(action) => format!("{action:?}"),
        None => status.to_string(),
    }
}
