//! # stockroom-core: Pure Business Logic for the Stockroom Engine
//!
//! Every rule of rental and purchase transactions that does not need
//! storage lives here as a pure function over already-fetched data.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Stockroom Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Outer layer (HTTP handler, CLI, tests)             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ RentalRequest / PurchaseRequest        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │        stockroom-engine: TransactionProcessor (orchestrator)    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ stockroom-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │ validation│  │allocation │  │  pricing  │  │ numbering │  │   │
//! │  │   │  batch    │  │  staged   │  │  Money    │  │ lifecycle │  │   │
//! │  │   │  rules    │  │  stock    │  │  totals   │  │  draft    │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                stockroom-db (Database Layer)                    │   │
//! │  │      SQLite pool, migrations, repositories, lock table, writer  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Item, StockLevel, TransactionHeader, ...)
//! - [`money`] - Money type with integer arithmetic
//! - [`error`] - Domain error types
//! - [`request`] - Rental and purchase request shapes
//! - [`validation`] - Field rules and the Batch Validator
//! - [`pricing`] - Line totals and header aggregates
//! - [`allocation`] - Stock Allocator
//! - [`draft`] - Header and lines ready to be numbered and written
//! - [`numbering`] - Transaction number format
//! - [`lifecycle`] - Per-request processing states
//!
//! ## Example Usage
//!
//! ```rust
//! use stockroom_core::money::Money;
//! use stockroom_core::types::TaxRate;
//!
//! let unit_cost = Money::from_cents(2550);
//! let subtotal = unit_cost.multiply_quantity(10);
//! let tax = subtotal.calculate_tax(TaxRate::from_bps(825));
//! assert_eq!(tax.cents(), 2104);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod allocation;
pub mod draft;
pub mod error;
pub mod lifecycle;
pub mod money;
pub mod numbering;
pub mod pricing;
pub mod request;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use allocation::{allocate, StagedMutation, StagedStock};
pub use draft::{DraftLine, TransactionDraft};
pub use error::{AllocationError, CoreError, ErrorKind, LineError, ValidationError};
pub use lifecycle::ProcessingState;
pub use money::Money;
pub use request::{CreateTransactionRequest, LineRequest, PurchaseRequest, RentalRequest};
pub use types::*;
pub use validation::{validate_batch, validate_request, ValidatedBatch, ValidatedLine};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default cap on lines per request. The engine config can override it.
pub const DEFAULT_MAX_LINES: usize = 500;

/// Highest value `max_lines` may be configured to. The bulk lookups bind one
/// parameter per distinct item, and SQLite accepts at most 32766.
pub const MAX_LINES_LIMIT: usize = 10_000;

/// Largest quantity a single line may carry.
pub const MAX_LINE_QUANTITY: i64 = 1_000_000;

/// 100% in basis points.
pub const MAX_TAX_RATE_BPS: u32 = 10_000;

/// Characters, not bytes.
pub const MAX_NOTES_LENGTH: usize = 1_000;

/// Longest accepted identifier (UUIDs are 36).
pub const MAX_ID_LENGTH: usize = 64;
