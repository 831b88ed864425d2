//! # Stock Allocator
//!
//! Turns a validated batch into staged stock mutations. Nothing here writes;
//! the writer applies the whole staged set inside its commit or not at all.
//!
//! ```text
//!   RENTAL    reserved += Σ qty per item      (fails if reserved > on_hand)
//!   PURCHASE  on_hand  += Σ qty per item      (missing row starts at zero)
//!
//!   snapshot row ─► StagedMutation { expected_version, deltas, new values }
//!                              │
//!                              ▼
//!   UPDATE stock_levels ... WHERE version = expected_version
//! ```
//!
//! Mutations come out ordered by item id so every writer touches rows in
//! the same order.

use serde::{Deserialize, Serialize};

use crate::error::AllocationError;
use crate::types::{StockLevel, TransactionKind};
use crate::validation::ValidatedBatch;

/// One pending change to a stock row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedMutation {
    pub item_id: String,
    pub location_id: String,
    /// Version of the snapshot row this was derived from, `None` if the row
    /// does not exist yet and must be inserted.
    pub expected_version: Option<i64>,
    pub on_hand_delta: i64,
    pub reserved_delta: i64,
    pub new_on_hand: i64,
    pub new_reserved: i64,
}

impl StagedMutation {
    /// Version the row will carry after the write.
    #[inline]
    pub fn new_version(&self) -> i64 {
        self.expected_version.map_or(1, |v| v + 1)
    }

    #[inline]
    pub fn is_insert(&self) -> bool {
        self.expected_version.is_none()
    }

    /// The row as it should read after commit (timestamp left to storage).
    pub fn to_level(&self) -> StockLevel {
        let mut level = StockLevel::empty(self.item_id.clone(), self.location_id.clone());
        level.quantity_on_hand = self.new_on_hand;
        level.quantity_reserved = self.new_reserved;
        level.version = self.new_version();
        level
    }
}

/// All mutations for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedStock {
    pub kind: TransactionKind,
    pub location_id: String,
    pub mutations: Vec<StagedMutation>,
}

impl StagedStock {
    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }
}

/// Stages the stock effect of a validated batch.
///
/// Re-derives availability from the batch's snapshot rather than trusting
/// the validator's verdict, so a batch built from a stale or hand-made
/// snapshot still cannot stage `reserved > on_hand`.
pub fn allocate(batch: &ValidatedBatch) -> Result<StagedStock, AllocationError> {
    let mut mutations = Vec::new();

    for (item_id, quantity) in batch.quantity_by_item() {
        let current = batch.snapshot.get(&item_id);

        if let Some(level) = current {
            if !level.satisfies_invariant() {
                return Err(AllocationError::CorruptLedger {
                    item_id,
                    location_id: batch.location_id.clone(),
                });
            }
        }

        let on_hand = current.map_or(0, |l| l.quantity_on_hand);
        let reserved = current.map_or(0, |l| l.quantity_reserved);
        let overflow = || AllocationError::QuantityOverflow {
            item_id: item_id.clone(),
            location_id: batch.location_id.clone(),
        };

        let (on_hand_delta, reserved_delta) = match batch.kind {
            TransactionKind::Rental => (0, quantity),
            TransactionKind::Purchase => (quantity, 0),
        };
        let new_on_hand = on_hand.checked_add(on_hand_delta).ok_or_else(overflow)?;
        let new_reserved = reserved.checked_add(reserved_delta).ok_or_else(overflow)?;

        if new_reserved > new_on_hand {
            return Err(AllocationError::InsufficientStock {
                item_id,
                location_id: batch.location_id.clone(),
                available: on_hand - reserved,
                requested: quantity,
            });
        }

        mutations.push(StagedMutation {
            location_id: batch.location_id.clone(),
            expected_version: current.map(|l| l.version),
            on_hand_delta,
            reserved_delta,
            new_on_hand,
            new_reserved,
            item_id,
        });
    }

    Ok(StagedStock {
        kind: batch.kind,
        location_id: batch.location_id.clone(),
        mutations,
    })
}
