//! Error taxonomy for the query execution core (spec §7).
//!
//! These are *kinds*, not exception types: every fallible path in this
//! crate returns one of the [`CoreError`] variants rather than panicking,
//! except where the caller has already violated an iterator contract
//! (e.g. calling `next()` past `has_next() == false`), which is a bug and
//! asserts instead.

use thiserror::Error;

/// A single decode/encode failure in the row codec (spec §4.1).
///
/// Carries the byte offset within the row's `data` buffer so a host can
/// log which cell produced malformed bytes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("malformed qualifier at offset {offset}: reserved high bits set")]
    MalformedQualifier { offset: usize },

    #[error("truncated row at offset {offset}: needed {needed} bytes, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("value length mismatch at offset {offset}: expected {expected} bytes, got {actual}")]
    ValueLengthMismatch {
        offset: usize,
        expected: usize,
        actual: usize,
    },

    #[error("point offset {offset_ns}ns exceeds row interval {interval_ns}ns")]
    OffsetOutOfRange { offset_ns: i64, interval_ns: i64 },
}

/// The crate-wide error type (spec §7).
#[derive(Debug, Error, Clone)]
pub enum CoreError {
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    #[error("invariant violated: {message}")]
    InvariantError { message: String },

    #[error("plan error: {message}")]
    PlanError { message: String },

    #[error("downstream iterator error: {source}")]
    DownstreamError { source: Box<CoreError> },

    #[error("operation timed out after {after_ms}ms")]
    TimeoutError { after_ms: u64 },

    #[error("serialization/deserialization error: {message}")]
    SerdesError { message: String },

    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl CoreError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        CoreError::InvalidInput {
            message: message.into(),
        }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        CoreError::InvariantError {
            message: message.into(),
        }
    }

    pub fn plan(message: impl Into<String>) -> Self {
        CoreError::PlanError {
            message: message.into(),
        }
    }

    pub fn downstream(source: CoreError) -> Self {
        CoreError::DownstreamError {
            source: Box::new(source),
        }
    }

    pub fn serdes(message: impl Into<String>) -> Self {
        CoreError::SerdesError {
            message: message.into(),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
