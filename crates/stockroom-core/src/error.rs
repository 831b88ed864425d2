//! # Error Types
//!
//! Domain-specific error types for stockroom-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stockroom-core (this file)                                            │
//! │  ├── CoreError        - Domain rule failures outside a single line     │
//! │  ├── ValidationError  - One field failed a rule                        │
//! │  ├── LineError        - Line index + ErrorKind + message (collected)   │
//! │  └── AllocationError  - Staging would break the ledger invariant       │
//! │                                                                         │
//! │  stockroom-db                                                          │
//! │  └── DbError          - Storage failures                               │
//! │                                                                         │
//! │  stockroom-engine                                                      │
//! │  └── TransactionError - What the caller sees                           │
//! │                                                                         │
//! │  Flow: ValidationError → LineError ─┐                                  │
//! │        AllocationError ─────────────┼──► TransactionError → caller     │
//! │        DbError ─────────────────────┘                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Validation never fails fast: every offending line is reported so the
//! caller can fix the whole request in one round trip.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use ts_rs::TS;

// =============================================================================
// Error Kind
// =============================================================================

/// Classification shared by line errors and request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed quantity, price, tax, discount, or unknown enum value.
    Validation,
    /// Unknown item, customer, supplier, or location.
    NotFound,
    /// Requested quantity exceeds available quantity.
    InsufficientStock,
    /// Transaction number collision or concurrent stock change.
    Conflict,
    /// Storage unavailable or commit failed.
    Persistence,
}

impl ErrorKind {
    /// HTTP-equivalent status code for an outer API layer.
    pub const fn status_code(&self) -> u16 {
        match self {
            ErrorKind::Validation => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::InsufficientStock | ErrorKind::Conflict => 409,
            ErrorKind::Persistence => 500,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Validation => "validation_error",
            ErrorKind::NotFound => "not_found",
            ErrorKind::InsufficientStock => "insufficient_stock",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Persistence => "persistence_error",
        };
        f.write_str(s)
    }
}

// =============================================================================
// Core Error
// =============================================================================

/// Domain errors that are not tied to a single requested line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A request-level field failed validation (notes, dates, line count).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Staging stock mutations failed.
    #[error("Allocation failed: {0}")]
    Allocation(#[from] AllocationError),

    /// A processing state machine was driven along an edge it does not have.
    #[error("Invalid processing transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },
}

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Validation Error
// =============================================================================

/// A single field that failed a rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Arithmetic on the value would overflow.
    #[error("{field} is too large")]
    Overflow { field: String },

    /// A date precedes the date it must follow.
    #[error("{field} must not be before {earliest}")]
    DateBefore { field: String, earliest: String },

    /// Text does not have the expected shape.
    #[error("{field} must look like {expected}")]
    Malformed { field: String, expected: String },
}

impl ValidationError {
    /// The field the error refers to.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::NotAllowed { field, .. }
            | ValidationError::Overflow { field }
            | ValidationError::DateBefore { field, .. }
            | ValidationError::Malformed { field, .. } => field,
        }
    }
}

// =============================================================================
// Line Error
// =============================================================================

/// One problem with one requested line.
///
/// `line_index` is the 0-based position in the request's `items` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineError {
    pub line_index: usize,
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    /// Only set for `InsufficientStock`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shortfall: Option<i64>,
}

impl LineError {
    pub fn validation(line_index: usize, item_id: &str, err: ValidationError) -> Self {
        LineError {
            line_index,
            kind: ErrorKind::Validation,
            message: err.to_string(),
            item_id: Some(item_id.to_string()),
            shortfall: None,
        }
    }

    pub fn not_found(line_index: usize, item_id: &str) -> Self {
        LineError {
            line_index,
            kind: ErrorKind::NotFound,
            message: format!("Item not found: {}", item_id),
            item_id: Some(item_id.to_string()),
            shortfall: None,
        }
    }

    /// The item exists but cannot take part in this kind of transaction.
    pub fn ineligible(line_index: usize, item_id: &str, reason: &str) -> Self {
        LineError {
            line_index,
            kind: ErrorKind::Validation,
            message: format!("Item {} {}", item_id, reason),
            item_id: Some(item_id.to_string()),
            shortfall: None,
        }
    }

    pub fn insufficient_stock(
        line_index: usize,
        item_id: &str,
        requested: i64,
        available: i64,
    ) -> Self {
        LineError {
            line_index,
            kind: ErrorKind::InsufficientStock,
            message: format!(
                "Insufficient stock for {}: available {}, requested {}",
                item_id, available, requested
            ),
            item_id: Some(item_id.to_string()),
            shortfall: Some(requested - available),
        }
    }
}

impl fmt::Display for LineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: [{}] {}", self.line_index, self.kind, self.message)
    }
}

// =============================================================================
// Allocation Error
// =============================================================================

/// Staging a stock mutation would violate `reserved <= on_hand`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocationError {
    #[error("Insufficient stock for {item_id} at {location_id}: available {available}, requested {requested}")]
    InsufficientStock {
        item_id: String,
        location_id: String,
        available: i64,
        requested: i64,
    },

    /// The snapshot row itself is already inconsistent.
    #[error("Stock level for {item_id} at {location_id} violates the ledger invariant")]
    CorruptLedger { item_id: String, location_id: String },

    #[error("Stock quantity for {item_id} at {location_id} would overflow")]
    QuantityOverflow { item_id: String, location_id: String },
}

impl AllocationError {
    /// How many units are missing; zero for the other variants.
    pub fn shortfall(&self) -> i64 {
        match self {
            AllocationError::InsufficientStock {
                available,
                requested,
                ..
            } => requested - available,
            AllocationError::CorruptLedger { .. } | AllocationError::QuantityOverflow { .. } => 0,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
