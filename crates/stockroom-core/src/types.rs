//! # Domain Types
//!
//! Core domain types of the transaction engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌──────────────────────┐   ┌─────────────────┐  │
//! │  │      Item       │   │  TransactionHeader   │   │ TransactionLine │  │
//! │  │  ─────────────  │   │  ──────────────────  │   │  ─────────────  │  │
//! │  │  id             │◄──│  transaction_number  │──►│  line_number    │  │
//! │  │  is_rentable    │   │  kind / status       │   │  item_id        │  │
//! │  │  is_saleable    │   │  totals (cents)      │   │  quantity       │  │
//! │  │  status         │   │  rental lifecycle    │   │  line_total     │  │
//! │  └────────┬────────┘   └──────────────────────┘   └─────────────────┘  │
//! │           │                                                             │
//! │  ┌────────▼────────┐                                                    │
//! │  │   StockLevel    │  keyed by (item_id, location_id)                   │
//! │  │  on_hand        │  invariant: 0 <= reserved <= on_hand               │
//! │  │  reserved       │                                                    │
//! │  │  version        │  bumped on every committed mutation                │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate in basis points (1 bps = 0.01%).
///
/// 825 bps = 8.25%. The valid range for a line is 0..=10000 (0% to 100%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a whole percentage.
    #[inline]
    pub const fn from_percent(pct: u32) -> Self {
        TaxRate(pct * 100)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Item (catalog)
// =============================================================================

/// Catalog status of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    #[default]
    Active,
    Inactive,
    Discontinued,
}

/// An item in the catalog.
///
/// Owned by the catalog; the engine only reads it. `is_rentable` and
/// `is_saleable` are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub is_rentable: bool,
    pub is_saleable: bool,
    pub status: ItemStatus,
}

impl Item {
    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == ItemStatus::Active
    }
}

/// A stock location (store, warehouse).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Location {
    pub id: String,
    pub name: String,
}

/// A customer or supplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Counterparty {
    pub id: String,
    pub name: String,
}

/// Which side of a transaction the counterparty is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterpartyRole {
    Customer,
    Supplier,
}

impl CounterpartyRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            CounterpartyRole::Customer => "Customer",
            CounterpartyRole::Supplier => "Supplier",
        }
    }
}

// =============================================================================
// Stock Level (ledger row)
// =============================================================================

/// Quantity on hand and reserved for one (item, location).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockLevel {
    pub item_id: String,
    pub location_id: String,
    pub quantity_on_hand: i64,
    pub quantity_reserved: i64,
    /// Optimistic-concurrency version, incremented on every committed write.
    pub version: i64,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl StockLevel {
    /// An empty row for a pair that has never held stock.
    pub fn empty(item_id: impl Into<String>, location_id: impl Into<String>) -> Self {
        StockLevel {
            item_id: item_id.into(),
            location_id: location_id.into(),
            quantity_on_hand: 0,
            quantity_reserved: 0,
            version: 0,
            updated_at: DateTime::<Utc>::default(),
        }
    }

    /// Quantity that can still be reserved.
    #[inline]
    pub fn available(&self) -> i64 {
        self.quantity_on_hand - self.quantity_reserved
    }

    /// `0 <= reserved <= on_hand`
    #[inline]
    pub fn satisfies_invariant(&self) -> bool {
        self.quantity_on_hand >= 0
            && self.quantity_reserved >= 0
            && self.quantity_reserved <= self.quantity_on_hand
    }
}

// =============================================================================
// Transaction Kind / Status
// =============================================================================

/// Rental or purchase. Dispatched once at the processor boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Purchase,
    Rental,
}

impl TransactionKind {
    /// Transaction number prefix.
    pub const fn prefix(&self) -> &'static str {
        match self {
            TransactionKind::Purchase => "PUR",
            TransactionKind::Rental => "REN",
        }
    }

    /// Lowercase storage name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Purchase => "purchase",
            TransactionKind::Rental => "rental",
        }
    }

    pub const fn counterparty_role(&self) -> CounterpartyRole {
        match self {
            TransactionKind::Purchase => CounterpartyRole::Supplier,
            TransactionKind::Rental => CounterpartyRole::Customer,
        }
    }

    /// Header status a freshly committed transaction of this kind gets.
    pub const fn committed_status(&self) -> TransactionStatus {
        match self {
            // Goods are on hand the moment the receipt commits
            TransactionKind::Purchase => TransactionStatus::Completed,
            // Stock stays reserved until the rental is returned
            TransactionKind::Rental => TransactionStatus::InProgress,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Header status. Transitions after commit belong to the status-update
/// collaborator, not to this engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

/// Rental-specific lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RentalStatus {
    #[default]
    Reserved,
    Active,
    Returned,
    Late,
}

// =============================================================================
// Condition Code
// =============================================================================

/// Quality grade recorded for received stock. A is best, D is worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum ConditionCode {
    A,
    B,
    C,
    D,
}

impl ConditionCode {
    pub const ALL: [ConditionCode; 4] = [
        ConditionCode::A,
        ConditionCode::B,
        ConditionCode::C,
        ConditionCode::D,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            ConditionCode::A => "A",
            ConditionCode::B => "B",
            ConditionCode::C => "C",
            ConditionCode::D => "D",
        }
    }
}

impl fmt::Display for ConditionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConditionCode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(ConditionCode::A),
            "B" => Ok(ConditionCode::B),
            "C" => Ok(ConditionCode::C),
            "D" => Ok(ConditionCode::D),
            _ => Err(ValidationError::NotAllowed {
                field: "condition".to_string(),
                allowed: ConditionCode::ALL.iter().map(|c| c.to_string()).collect(),
            }),
        }
    }
}

// =============================================================================
// Transaction Header
// =============================================================================

/// Rental return tracking, present only on rental headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RentalLifecycle {
    pub rental_status: RentalStatus,
    #[ts(as = "Option<String>")]
    pub expected_return_date: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub actual_return_date: Option<NaiveDate>,
}

/// A committed rental or purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransactionHeader {
    pub id: String,
    /// `{PUR|REN}-{YYYYMMDD}-{sequence}`
    pub transaction_number: String,
    pub kind: TransactionKind,
    pub status: TransactionStatus,
    pub location_id: String,
    /// Customer for rentals, supplier for purchases.
    pub counterparty_id: String,
    #[ts(as = "String")]
    pub transaction_date: NaiveDate,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub paid_amount_cents: i64,
    pub rental: Option<RentalLifecycle>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl TransactionHeader {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Amount still owed; zero once fully paid.
    pub fn balance_due(&self) -> Money {
        Money::from_cents((self.total_cents - self.paid_amount_cents).max(0))
    }
}

// =============================================================================
// Transaction Line
// =============================================================================

/// One line of a committed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct TransactionLine {
    pub id: String,
    pub transaction_id: String,
    /// 1-based, contiguous, in request order.
    pub line_number: i64,
    pub item_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub tax_rate_bps: u32,
    pub discount_cents: i64,
    /// quantity × unit price
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    /// subtotal + tax − discount
    pub line_total_cents: i64,
    pub condition: Option<ConditionCode>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl TransactionLine {
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

/// Header plus its lines, as returned by read-back operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Transaction {
    pub header: TransactionHeader,
    pub lines: Vec<TransactionLine>,
}

// =============================================================================
// Unit Tests
// =============================================================================
