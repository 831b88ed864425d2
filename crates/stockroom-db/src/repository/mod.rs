//! # Repository Module
//!
//! Database repository implementations for the stockroom.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Read Side vs Write Side                              │
//! │                                                                         │
//! │  TransactionProcessor                                                  │
//! │       │                                                                 │
//! │       │  db.items().find_many(ids)          ── one query                │
//! │       │  db.stock().find_for_items(loc, ids) ── one query               │
//! │       ▼                                                                 │
//! │  Repositories (pooled connection, autocommit)                          │
//! │  ├── ItemRepository           get_by_id, find_many, insert             │
//! │  ├── LocationRepository       get_by_id, exists, insert                │
//! │  ├── CounterpartyRepository   get_by_id, exists, insert                │
//! │  ├── StockRepository          get, find_for_items, set_level           │
//! │  └── TransactionRepository    get_by_id, get_by_number, list_by_date   │
//! │                                                                         │
//! │  TransactionWriter (one database transaction)                          │
//! │  └── uses the crate-private statements of stock.rs / transaction.rs    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod item;
pub mod party;
pub mod stock;
pub mod transaction;
