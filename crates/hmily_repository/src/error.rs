//! Error types for repository operations.

use crate::types::RecordKind;
use hmily_serializer::SerializerError;
use std::io;
use thiserror::Error;

/// Result type for repository operations that must not fail silently.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Errors that can occur in repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A record could not be encoded or decoded.
    #[error("serializer error: {0}")]
    Serializer(#[from] SerializerError),

    /// The repository is misconfigured and cannot be opened.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the configuration problem.
        message: String,
    },

    /// A record file was found but could not be read back.
    #[error("{kind} record {id} is unreadable: {message}")]
    Unreadable {
        /// Kind of the record.
        kind: RecordKind,
        /// Identifier of the record.
        id: u64,
        /// Description of the failure.
        message: String,
    },
}

impl RepositoryError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an unreadable record error.
    pub fn unreadable(kind: RecordKind, id: u64, message: impl Into<String>) -> Self {
        Self::Unreadable {
            kind,
            id,
            message: message.into(),
        }
    }
}

/// Outcome of a best-effort mutation.
///
/// Primary writes (`create`) return [`RepositoryResult`] and propagate every
/// failure. Status updates, retry locks and deletes instead report what
/// happened through this type, so a recovery loop can log a transient fault
/// and try again on its next pass instead of aborting.
#[derive(Debug)]
#[must_use]
pub enum Affected {
    /// The operation completed and touched this many records.
    ///
    /// Zero means the target was absent, which is not a failure.
    Rows(usize),

    /// The optimistic-lock check found a newer version on disk.
    Stale {
        /// Version currently stored.
        stored: u32,
        /// Version presented by the caller.
        presented: u32,
    },

    /// The operation failed with a transient fault; nothing was changed.
    Fault(RepositoryError),
}

impl Affected {
    /// Number of records touched; zero for `Stale` and `Fault`.
    #[must_use]
    pub fn rows(&self) -> usize {
        match self {
            Self::Rows(n) => *n,
            Self::Stale { .. } | Self::Fault(_) => 0,
        }
    }

    /// Returns true if at least one record was touched.
    #[must_use]
    pub fn is_applied(&self) -> bool {
        self.rows() > 0
    }

    /// Returns true if the operation hit a transient fault.
    #[must_use]
    pub fn is_fault(&self) -> bool {
        matches!(self, Self::Fault(_))
    }

    /// Returns true if the optimistic-lock check rejected the update.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Stale { .. })
    }

    /// Converts into a result, turning a fault back into an error.
    ///
    /// # Errors
    ///
    /// Returns the wrapped error of [`Affected::Fault`].
    pub fn into_result(self) -> RepositoryResult<usize> {
        match self {
            Self::Rows(n) => Ok(n),
            Self::Stale { .. } => Ok(0),
            Self::Fault(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_of_each_outcome() {
        assert_eq!(Affected::Rows(3).rows(), 3);
        assert_eq!(
            Affected::Stale {
                stored: 2,
                presented: 1
            }
            .rows(),
            0
        );
        let fault = Affected::Fault(RepositoryError::config("x"));
        assert_eq!(fault.rows(), 0);
        assert!(fault.is_fault());
        assert!(!fault.is_applied());
    }

    #[test]
    fn fault_converts_back_to_error() {
        let io = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let affected = Affected::Fault(RepositoryError::Io(io));
        assert!(matches!(affected.into_result(), Err(RepositoryError::Io(_))));
        assert_eq!(Affected::Rows(0).into_result().unwrap(), 0);
    }

    #[test]
    fn display_mentions_record() {
        let err = RepositoryError::unreadable(RecordKind::Participant, 10, "eof");
        assert_eq!(err.to_string(), "participant record 10 is unreadable: eof");
    }
}
