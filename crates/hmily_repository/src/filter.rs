//! Predicates for filtered scans.
//!
//! Scans take a `&mut dyn FnMut(&R) -> bool`. A predicate that needs state
//! across the scan, such as a remaining-slot counter, owns that state by
//! capture. The helpers here build the predicates the recovery scans use;
//! they compose with plain closures:
//!
//! ```
//! use hmily_repository::{filter, Transaction, Timestamp};
//!
//! let cutoff = Timestamp::now();
//! let mut pick = filter::limit(2, filter::older_than::<Transaction>(cutoff));
//!
//! let old = Transaction::new(1, "acct");
//! assert!(pick(&old));
//! assert!(pick(&old));
//! assert!(!pick(&old));
//! ```

use crate::record::{Record, Versioned};
use crate::types::Timestamp;

/// Accepts at most `limit` records that `predicate` accepts.
///
/// The counter only decreases when `predicate` matches, so rejected records
/// do not consume slots.
pub fn limit<R, F>(limit: usize, mut predicate: F) -> impl FnMut(&R) -> bool
where
    F: FnMut(&R) -> bool,
{
    let mut remaining = limit;
    move |record| {
        if remaining == 0 || !predicate(record) {
            return false;
        }
        remaining -= 1;
        true
    }
}

/// Accepts records last updated strictly before `cutoff`.
pub fn older_than<R: Record>(cutoff: Timestamp) -> impl Fn(&R) -> bool {
    move |record| record.update_time() < cutoff
}

/// Accepts records whose status equals `status`.
pub fn with_status<R: Record>(status: i32) -> impl Fn(&R) -> bool {
    move |record| record.status() == status
}

/// Accepts records owned by `app_name`.
pub fn owned_by<R: Versioned>(app_name: &str) -> impl Fn(&R) -> bool + '_ {
    move |record| record.app_name() == app_name
}

/// Accepts records older than `cutoff` with the given status; the shape of
/// every date purge.
pub fn purgeable<R: Record>(cutoff: Timestamp, status: i32) -> impl Fn(&R) -> bool {
    let older = older_than(cutoff);
    let matches_status = with_status(status);
    move |record| older(record) && matches_status(record)
}
