//! Repository directory management.
//!
//! This module owns the on-disk layout:
//!
//! ```text
//! <root>/
//! └─ hmily/
//!    ├─ <trans_id>                # one file per transaction
//!    └─ <app_name>/
//!       ├─ <participant_id>       # one file per participant
//!       └─ undo/
//!          └─ <undo_id>           # one file per participant undo
//! ```
//!
//! File names are decimal record ids; file contents are the serializer's
//! bytes for one record. There is no lock file: two processes pointed at
//! the same root are not excluded from each other.

use crate::config::FileConfig;
use crate::error::{RepositoryError, RepositoryResult};
use crate::types::RecordKind;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Directory holding all records below the root.
const HMILY_DIR: &str = "hmily";
/// Directory holding undo records inside an application directory.
const UNDO_DIR: &str = "undo";

/// Resolved record directories of one repository.
#[derive(Debug, Clone)]
pub struct RepositoryDir {
    root: PathBuf,
    transactions: PathBuf,
    participants: PathBuf,
    undo: PathBuf,
}

impl RepositoryDir {
    /// Resolves the layout for `config` and creates missing directories.
    ///
    /// Creation is idempotent: opening an existing repository changes
    /// nothing on disk.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if:
    /// - The configuration is invalid
    /// - The root exists and is not a directory
    /// - A directory cannot be created
    pub fn open(config: &FileConfig) -> RepositoryResult<Self> {
        config.validate()?;

        let root = config.path.clone();
        if root.exists() && !root.is_dir() {
            return Err(RepositoryError::config(format!(
                "repository root is not a directory: {}",
                root.display()
            )));
        }

        let transactions = root.join(HMILY_DIR);
        let participants = transactions.join(&config.app_name);
        let undo = participants.join(UNDO_DIR);

        let mut created = false;
        for dir in [&transactions, &participants, &undo] {
            created |= create_dir(dir)?;
        }
        if created {
            info!(root = %root.display(), app = %config.app_name, "created repository directories");
        } else {
            debug!(root = %root.display(), app = %config.app_name, "opened existing repository");
        }

        Ok(Self {
            root,
            transactions,
            participants,
            undo,
        })
    }

    /// Returns the root path.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the directory holding records of `kind`.
    #[must_use]
    pub fn records(&self, kind: RecordKind) -> &Path {
        match kind {
            RecordKind::Transaction => &self.transactions,
            RecordKind::Participant => &self.participants,
            RecordKind::ParticipantUndo => &self.undo,
        }
    }

    /// Returns the file path of one record.
    #[must_use]
    pub fn record_path(&self, kind: RecordKind, id: u64) -> PathBuf {
        self.records(kind).join(id.to_string())
    }
}

/// Creates `dir` if missing. Returns true if it had to be created.
fn create_dir(dir: &Path) -> RepositoryResult<bool> {
    if dir.is_dir() {
        return Ok(false);
    }
    fs::create_dir_all(dir).map_err(|e| {
        RepositoryError::config(format!("cannot create directory {}: {e}", dir.display()))
    })?;
    debug!(dir = %dir.display(), "created directory");
    Ok(true)
}

/// Lists the record ids stored in `dir`, in ascending order.
///
/// Subdirectories and files whose name is not a decimal id are ignored.
///
/// # Errors
///
/// Returns an error if the directory cannot be listed.
pub(crate) fn list_ids(dir: &Path) -> io::Result<Vec<u64>> {
    let mut ids = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        match entry.file_name().to_str().and_then(|name| name.parse::<u64>().ok()) {
            Some(id) => ids.push(id),
            None => debug!(path = %entry.path().display(), "ignoring foreign file"),
        }
    }
    ids.sort_unstable();
    Ok(ids)
}

/// Returns true if `dir` lists a file named after `id`.
///
/// # Errors
///
/// Returns an error if the directory cannot be listed.
pub(crate) fn contains(dir: &Path, id: u64) -> io::Result<bool> {
    let name = id.to_string();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_name() == name.as_str() && entry.file_type()?.is_file() {
            return Ok(true);
        }
    }
    Ok(false)
}
