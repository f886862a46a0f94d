//! Engine error types
//!
//! Errors raised while applying a single event. Handlers log and skip the
//! recoverable cases themselves; an error that escapes a handler drops the
//! whole event and its staged writes.

use crate::ids::CourtId;
use crate::oracle::OracleError;
use thiserror::Error;

/// Errors from event application.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// An entity the event refers to was never materialized.
    #[error("reference missing: {entity}")]
    ReferenceMissing {
        /// Description of the missing entity
        entity: String,
    },

    /// The configuration oracle could not answer.
    #[error("oracle unavailable for {query}: {reason}")]
    OracleUnavailable {
        /// Query that failed
        query: String,
        /// Reason reported by the oracle
        reason: String,
    },

    /// The oracle does not know the court.
    #[error("unknown court {court}")]
    UnknownCourt {
        /// Court id
        court: CourtId,
    },

    /// An aggregate invariant would be broken.
    #[error("invariant violation: {detail}")]
    InvariantViolation {
        /// What went wrong
        detail: String,
    },

    /// A period-change event carried an unknown period number.
    #[error("unknown period {0}")]
    UnknownPeriod(u8),
}

impl EngineError {
    /// Create a reference missing error.
    pub fn reference_missing(entity: impl Into<String>) -> Self {
        Self::ReferenceMissing {
            entity: entity.into(),
        }
    }

    /// Create an oracle unavailable error.
    pub fn oracle_unavailable(query: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::OracleUnavailable {
            query: query.into(),
            reason: reason.into(),
        }
    }

    /// Create an invariant violation error.
    pub fn invariant(detail: impl Into<String>) -> Self {
        Self::InvariantViolation {
            detail: detail.into(),
        }
    }

    /// Convert an oracle failure, naming the query that raised it.
    pub fn from_oracle(query: impl Into<String>, err: OracleError) -> Self {
        match err {
            OracleError::UnknownCourt(court) => Self::UnknownCourt { court },
            OracleError::Unavailable(reason) => Self::oracle_unavailable(query, reason),
        }
    }

    /// Short label used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ReferenceMissing { .. } => "reference_missing",
            Self::OracleUnavailable { .. } => "oracle_unavailable",
            Self::UnknownCourt { .. } => "unknown_court",
            Self::InvariantViolation { .. } => "invariant_violation",
            Self::UnknownPeriod(_) => "unknown_period",
        }
    }
}

impl From<OracleError> for EngineError {
    fn from(err: OracleError) -> Self {
        Self::from_oracle("oracle", err)
    }
}

/// Result alias for event application.
pub type Result<T> = std::result::Result<T, EngineError>;
