//! Write-status taxonomy (spec §4.8, `[ADD 4.8a]`): classifies whether a
//! downstream write attempt should be retried, was outright rejected, or
//! failed. Ingestion itself is out of scope (spec Non-goals); this module
//! only defines the shape a host's write path reports through.

use crate::error::CoreError;

/// The result of a single write attempt a host reports back through this
/// core (e.g. for latching onto a [`crate::result::QueryResult`] during a
/// read-modify-write flow).
#[derive(Debug, Clone)]
pub enum WriteStatus {
    Ok,
    /// Transient; the caller should retry with backoff.
    Retry { message: String },
    /// The write was refused outright (e.g. out-of-order, quota).
    Rejected {
        message: String,
        cause: Option<CoreError>,
    },
    /// An unexpected failure occurred while attempting the write.
    Error {
        message: String,
        cause: Option<CoreError>,
    },
}

impl WriteStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, WriteStatus::Ok)
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, WriteStatus::Retry { .. })
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        WriteStatus::Rejected {
            message: message.into(),
            cause: None,
        }
    }

    pub fn rejected_with_cause(message: impl Into<String>, cause: CoreError) -> Self {
        WriteStatus::Rejected {
            message: message.into(),
            cause: Some(cause),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        WriteStatus::Error {
            message: message.into(),
            cause: None,
        }
    }

    pub fn error_with_cause(message: impl Into<String>, cause: CoreError) -> Self {
        WriteStatus::Error {
            message: message.into(),
            cause: Some(cause),
        }
    }

    pub fn cause(&self) -> Option<&CoreError> {
        match self {
            WriteStatus::Rejected { cause, .. } | WriteStatus::Error { cause, .. } => cause.as_ref(),
            _ => None,
        }
    }
}
