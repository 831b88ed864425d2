//! # Engine Error Types
//!
//! What a caller of the processor sees when a request does not commit.
//!
//! ## Mapping
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Source                         TransactionError        kind / status  │
//! │  ──────────────────────────     ────────────────────    ─────────────  │
//! │  ValidationError (request)  ──► InvalidRequest          validation 400 │
//! │  missing customer/location  ──► NotFound                not_found  404 │
//! │  Vec<LineError> (batch)     ──► Rejected                worst line     │
//! │  AllocationError            ──► Allocation              409 / 400 / 500│
//! │  DbError::Conflict          ──► Conflict                conflict   409 │
//! │  DbError (anything else)    ──► Persistence             persist.   500 │
//! │  deadline passed            ──► TimedOut                persist.   504 │
//! │  illegal state transition   ──► Internal                persist.   500 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every failure leaves storage exactly as it was before the request.

use std::time::Duration;

use thiserror::Error;

use stockroom_core::{AllocationError, ErrorKind, LineError, ProcessingState, ValidationError};
use stockroom_db::DbError;

use crate::config::ConfigError;

#[derive(Debug, Clone, Error)]
pub enum TransactionError {
    /// One or more lines failed; every offending line is listed.
    #[error("Request rejected: {}", summarize(.0))]
    Rejected(Vec<LineError>),

    /// A request-level field (ids, dates, notes, line count) failed.
    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] ValidationError),

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error(transparent)]
    Allocation(#[from] AllocationError),

    #[error("Concurrent modification of {entity} {id}")]
    Conflict { entity: String, id: String },

    #[error("Storage failure: {0}")]
    Persistence(String),

    #[error("Request did not finish within {0:?}")]
    TimedOut(Duration),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TransactionError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        TransactionError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// The category a caller should branch on.
    ///
    /// A rejection takes the most basic kind among its lines: a malformed
    /// line outranks an unknown item, which outranks a stock shortfall.
    pub fn kind(&self) -> ErrorKind {
        match self {
            TransactionError::Rejected(errors) => {
                let has = |kind| errors.iter().any(|e| e.kind == kind);
                if has(ErrorKind::Validation) {
                    ErrorKind::Validation
                } else if has(ErrorKind::NotFound) {
                    ErrorKind::NotFound
                } else if has(ErrorKind::InsufficientStock) {
                    ErrorKind::InsufficientStock
                } else {
                    ErrorKind::Validation
                }
            }
            TransactionError::InvalidRequest(_) => ErrorKind::Validation,
            TransactionError::NotFound { .. } => ErrorKind::NotFound,
            TransactionError::Allocation(AllocationError::InsufficientStock { .. }) => {
                ErrorKind::InsufficientStock
            }
            TransactionError::Allocation(AllocationError::QuantityOverflow { .. }) => {
                ErrorKind::Validation
            }
            TransactionError::Allocation(AllocationError::CorruptLedger { .. }) => {
                ErrorKind::Persistence
            }
            TransactionError::Conflict { .. } => ErrorKind::Conflict,
            TransactionError::Persistence(_)
            | TransactionError::TimedOut(_)
            | TransactionError::Internal(_) => ErrorKind::Persistence,
        }
    }

    /// HTTP-equivalent status. A committed request is the 201 case.
    pub fn status_code(&self) -> u16 {
        match self {
            TransactionError::TimedOut(_) => 504,
            other => other.kind().status_code(),
        }
    }

    /// Per-line errors of a rejection; empty for request-level failures.
    pub fn line_errors(&self) -> &[LineError] {
        match self {
            TransactionError::Rejected(errors) => errors,
            _ => &[],
        }
    }

    /// Largest stock shortfall reported, if any.
    pub fn shortfall(&self) -> Option<i64> {
        match self {
            TransactionError::Rejected(errors) => errors.iter().filter_map(|e| e.shortfall).max(),
            TransactionError::Allocation(err @ AllocationError::InsufficientStock { .. }) => {
                Some(err.shortfall())
            }
            _ => None,
        }
    }
}

fn summarize(errors: &[LineError]) -> String {
    match errors {
        [] => "no line errors".to_string(),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{} (and {} more)", first, rest.len()),
    }
}

/// Converts storage errors, hiding driver detail behind a log line.
impl From<DbError> for TransactionError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => TransactionError::NotFound { entity, id },
            DbError::Conflict { entity, id } => TransactionError::Conflict { entity, id },
            DbError::UniqueViolation { field, .. } => {
                tracing::error!(field = %field, "Unexpected unique violation");
                TransactionError::Persistence(format!("duplicate {}", field))
            }
            other => {
                tracing::error!(error = %other, "Storage operation failed");
                TransactionError::Persistence(other.to_string())
            }
        }
    }
}

/// A request that stopped in a failure state.
#[derive(Debug, Clone, Error)]
#[error("{state}: {error}")]
pub struct ProcessFailure {
    /// The terminal state the request ended in.
    pub state: ProcessingState,
    #[source]
    pub error: TransactionError,
}

impl ProcessFailure {
    pub fn new(state: ProcessingState, error: TransactionError) -> Self {
        ProcessFailure { state, error }
    }

    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }

    pub fn status_code(&self) -> u16 {
        self.error.status_code()
    }
}

/// Startup failures of the engine (config or database).
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Database(#[from] DbError),
}
