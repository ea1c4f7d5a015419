//! # Hmily Repository
//!
//! Persistence and recovery storage for the Hmily TCC (Try-Confirm-Cancel)
//! transaction coordinator.
//!
//! The coordinator records every distributed transaction, each of its
//! participants (branches) and any compensation data here. After a crash or
//! a timeout the recovery scanner queries for stale, unresolved records and
//! re-drives confirm or cancel, claiming each record with the
//! optimistic-lock update first.
//!
//! This crate stores and retrieves state; it never decides outcomes.
//!
//! ## Design Principles
//!
//! - One storage-agnostic contract ([`RecordRepository`], [`OptimisticLock`],
//!   [`HmilyRepository`]) shared by every backend
//! - Records are opaque to storage: a [`Serializer`](hmily_serializer::Serializer)
//!   turns them into bytes
//! - Scans never fail on a bad record: unreadable records are skipped,
//!   logged and counted in [`RepositoryStats`]
//! - Primary writes propagate errors; best-effort mutations report
//!   [`Affected`]
//!
//! ## Available Backends
//!
//! - [`FileRepository`] - One file per record below a root directory
//! - [`InMemoryRepository`] - For testing and ephemeral use
//!
//! ## Example
//!
//! ```rust
//! use hmily_repository::{HmilyAction, HmilyRepository, InMemoryRepository, Transaction};
//!
//! let repo = InMemoryRepository::new("acct");
//! let mut tx = Transaction::new(1, "acct").with_status(HmilyAction::Trying);
//! repo.create_hmily_transaction(&mut tx).unwrap();
//!
//! let affected = repo.update_hmily_transaction_status(1, HmilyAction::Confirming.code());
//! assert_eq!(affected.rows(), 1);
//! assert_eq!(repo.find_by_trans_id(1).unwrap().version, 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
pub mod dir;
mod error;
mod file;
pub mod filter;
mod memory;
mod record;
mod repository;
mod stats;
mod types;

pub use config::FileConfig;
pub use dir::RepositoryDir;
pub use error::{Affected, RepositoryError, RepositoryResult};
pub use file::{FileRepository, READ_BUFFER_SIZE};
pub use memory::InMemoryRepository;
pub use record::{Invocation, Participant, ParticipantUndo, Record, Transaction, Versioned};
pub use repository::{HmilyRepository, OptimisticLock, RecordRepository, ROWS};
pub use stats::{RepositoryStats, StatsSnapshot};
pub use types::{HmilyAction, RecordKind, Timestamp};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
