//! # Request Types
//!
//! What an outer layer (HTTP handler, CLI, test) hands to the processor.
//!
//! ```text
//!   RentalRequest ───┐
//!                    ├──► CreateTransactionRequest { kind, .. } ──► processor
//!   PurchaseRequest ─┘
//! ```
//!
//! The two entry shapes differ only in who the counterparty is and in the
//! rental-only return date, so both collapse into one request carrying an
//! explicit [`TransactionKind`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::TransactionKind;

/// One requested line.
///
/// Numbers are taken as sent (signed, unvalidated) so the validator can
/// report negative or out-of-range values per line instead of failing
/// deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineRequest {
    pub item_id: String,
    pub quantity: i64,
    /// Unit price for rentals, unit cost for purchases.
    pub unit_price_cents: i64,
    /// Basis points, 0..=10000. Missing means untaxed.
    #[serde(default)]
    pub tax_rate_bps: Option<u32>,
    #[serde(default)]
    pub discount_cents: Option<i64>,
    /// `A`..`D`; required for purchases.
    #[serde(default)]
    pub condition: Option<String>,
}

impl LineRequest {
    pub fn new(item_id: impl Into<String>, quantity: i64, unit_price_cents: i64) -> Self {
        LineRequest {
            item_id: item_id.into(),
            quantity,
            unit_price_cents,
            tax_rate_bps: None,
            discount_cents: None,
            condition: None,
        }
    }

    pub fn with_tax_bps(mut self, bps: u32) -> Self {
        self.tax_rate_bps = Some(bps);
        self
    }

    pub fn with_discount_cents(mut self, cents: i64) -> Self {
        self.discount_cents = Some(cents);
        self
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }
}

/// `CreateRentalTransaction(customer_id, location_id, date, items[])`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RentalRequest {
    pub customer_id: String,
    pub location_id: String,
    #[ts(as = "String")]
    pub transaction_date: NaiveDate,
    pub items: Vec<LineRequest>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub expected_return_date: Option<NaiveDate>,
    #[serde(default)]
    pub paid_amount_cents: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// `CreatePurchaseTransaction(supplier_id, location_id, date, items[])`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchaseRequest {
    pub supplier_id: String,
    pub location_id: String,
    #[ts(as = "String")]
    pub transaction_date: NaiveDate,
    pub items: Vec<LineRequest>,
    #[serde(default)]
    pub paid_amount_cents: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Kind-tagged request consumed by the processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreateTransactionRequest {
    pub kind: TransactionKind,
    pub counterparty_id: String,
    pub location_id: String,
    #[ts(as = "String")]
    pub transaction_date: NaiveDate,
    pub items: Vec<LineRequest>,
    #[ts(as = "Option<String>")]
    pub expected_return_date: Option<NaiveDate>,
    pub paid_amount_cents: Option<i64>,
    pub notes: Option<String>,
}

impl From<RentalRequest> for CreateTransactionRequest {
    fn from(req: RentalRequest) -> Self {
        CreateTransactionRequest {
            kind: TransactionKind::Rental,
            counterparty_id: req.customer_id,
            location_id: req.location_id,
            transaction_date: req.transaction_date,
            items: req.items,
            expected_return_date: req.expected_return_date,
            paid_amount_cents: req.paid_amount_cents,
            notes: req.notes,
        }
    }
}

impl From<PurchaseRequest> for CreateTransactionRequest {
    fn from(req: PurchaseRequest) -> Self {
        CreateTransactionRequest {
            kind: TransactionKind::Purchase,
            counterparty_id: req.supplier_id,
            location_id: req.location_id,
            transaction_date: req.transaction_date,
            items: req.items,
            expected_return_date: None,
            paid_amount_cents: req.paid_amount_cents,
            notes: req.notes,
        }
    }
}
