//! CLI command implementations.

pub mod inspect;
pub mod list;
pub mod purge;
pub mod verify;

use clap::ValueEnum;
use hmily_repository::{FileConfig, FileRepository, RecordKind};
use hmily_serializer::SerializerKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Failures reported by the commands themselves.
#[derive(Debug, Error)]
pub enum CliError {
    /// No `hmily/` directory under the given root.
    #[error("no repository found at {path:?}")]
    NoRepository {
        /// The root that was searched.
        path: PathBuf,
    },

    /// The repository has no directory for the requested application.
    #[error("no application {app:?} in repository {path:?}")]
    NoApplication {
        /// The requested application.
        app: String,
        /// The repository root.
        path: PathBuf,
    },

    /// `verify` found unreadable records.
    #[error("verification failed: {count} unreadable record(s)")]
    VerificationFailed {
        /// Number of unreadable records.
        count: usize,
    },
}

/// Record kinds accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RecordKindArg {
    /// Transactions.
    Transactions,
    /// Participants of the application.
    Participants,
    /// Undo records of the application.
    Undo,
}

impl From<RecordKindArg> for RecordKind {
    fn from(arg: RecordKindArg) -> Self {
        match arg {
            RecordKindArg::Transactions => RecordKind::Transaction,
            RecordKindArg::Participants => RecordKind::Participant,
            RecordKindArg::Undo => RecordKind::ParticipantUndo,
        }
    }
}

/// The repository a command operates on.
#[derive(Debug, Clone)]
pub struct Target {
    path: PathBuf,
    app_name: String,
    serializer: SerializerKind,
}

impl Target {
    /// Creates a target.
    pub fn new(path: PathBuf, app_name: String, serializer: SerializerKind) -> Self {
        Self {
            path,
            app_name,
            serializer,
        }
    }

    /// Returns the repository root.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Opens the repository.
    ///
    /// Unlike [`FileRepository::open`], refuses to create a repository
    /// or an application directory where none exists.
    pub fn open(&self) -> Result<FileRepository, Box<dyn std::error::Error>> {
        let hmily = self.path.join("hmily");
        if !hmily.is_dir() {
            return Err(CliError::NoRepository {
                path: self.path.clone(),
            }
            .into());
        }
        if !hmily.join(&self.app_name).is_dir() {
            return Err(CliError::NoApplication {
                app: self.app_name.clone(),
                path: self.path.clone(),
            }
            .into());
        }
        debug!(path = %self.path.display(), app = %self.app_name, serializer = %self.serializer, "opening repository");
        let config = FileConfig::new(&self.path, &self.app_name).serializer(self.serializer);
        Ok(FileRepository::open(config)?)
    }
}
