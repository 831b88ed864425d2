//! # stockroom-engine: Inventory Transaction Processor
//!
//! Creates rental and purchase transactions against the stock ledger,
//! all-or-nothing, with per-row isolation between concurrent requests.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Caller (HTTP handler, CLI, tests)                                      │
//! │       │  RentalRequest / PurchaseRequest                                │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               stockroom-engine (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │  TransactionProcessor ── state machine, deadline, row locks     │   │
//! │  │  EngineConfig         ── engine.toml + STOCKROOM_* overrides     │   │
//! │  │  telemetry            ── tracing subscriber                     │   │
//! │  │  ProcessorMetrics     ── counters                               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                  │                              │
//! │       ▼                                  ▼                              │
//! │  stockroom-core                     stockroom-db                        │
//! │  (validate, allocate, price)        (reads, locks, atomic writer)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stockroom_engine::{EngineConfig, TransactionProcessor};
//!
//! let config = EngineConfig::load(None)?;
//! let processor = TransactionProcessor::connect(&config).await?;
//!
//! match processor.create_rental(request).await {
//!     Ok(committed) => println!("{}", committed.transaction_number()),
//!     Err(failure) => eprintln!("{} ({})", failure, failure.status_code()),
//! }
//! ```

pub mod config;
pub mod error;
pub mod metrics;
pub mod processor;
pub mod telemetry;

pub use config::{ConfigError, EngineConfig, ProcessingSettings};
pub use error::{EngineError, ProcessFailure, TransactionError};
pub use metrics::{MetricsSnapshot, ProcessorMetrics};
pub use processor::{CommittedTransaction, ProcessResult, TransactionProcessor};
