//! # stockroom-db: Storage Layer for the Stockroom Engine
//!
//! SQLite persistence for items, stock levels and transactions, plus the
//! in-process stock row locks and the atomic transaction writer.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockroom Data Flow                              │
//! │                                                                         │
//! │  TransactionProcessor (stockroom-engine)                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   stockroom-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │    Writer    │  │   │
//! │  │   │   (pool.rs)   │    │               │    │ (writer.rs)  │  │   │
//! │  │   │               │    │ ItemRepo      │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ StockRepo     │    │ BEGIN        │  │   │
//! │  │   │ StockLockTable│    │ Transaction-  │    │  header      │  │   │
//! │  │   │               │    │   Repo        │    │  stock CAS   │  │   │
//! │  │   └───────────────┘    └───────────────┘    │  lines       │  │   │
//! │  │                                             │ COMMIT       │  │   │
//! │  │                                             └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`locks`] - Per-(item, location) row locks
//! - [`repository`] - Read paths and master data inserts
//! - [`writer`] - The transaction unit of work
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stockroom_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("stockroom.db")).await?;
//! let level = db.stock().get("drill", "loc-1").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod locks;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod writer;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use locks::{StockKey, StockLockSet, StockLockTable};
pub use migrations::MigrationStatus;
pub use pool::{Database, DbConfig};
pub use writer::{PendingWrite, TransactionWriter, WriteOutcome};

// Repository re-exports for convenience
pub use repository::item::ItemRepository;
pub use repository::party::{CounterpartyRepository, LocationRepository};
pub use repository::stock::StockRepository;
pub use repository::transaction::TransactionRepository;
