//! Transaction drafts: everything the writer persists except what only
//! storage can assign (id, number, timestamps).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::pricing::TransactionTotals;
use crate::request::CreateTransactionRequest;
use crate::types::{ConditionCode, RentalLifecycle, RentalStatus, TransactionKind, TransactionStatus};
use crate::validation::ValidatedBatch;

/// One line as it will be written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftLine {
    pub line_number: i64,
    pub item_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub tax_rate_bps: u32,
    pub discount_cents: i64,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub line_total_cents: i64,
    pub condition: Option<ConditionCode>,
}

/// Header and lines of a transaction that has not been numbered yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDraft {
    pub kind: TransactionKind,
    pub status: TransactionStatus,
    pub location_id: String,
    pub counterparty_id: String,
    pub transaction_date: NaiveDate,
    pub totals: TransactionTotals,
    pub paid_amount_cents: i64,
    pub rental: Option<RentalLifecycle>,
    pub notes: Option<String>,
    pub lines: Vec<DraftLine>,
}

impl TransactionDraft {
    /// Assembles the draft for a validated request.
    ///
    /// Line numbers are 1-based and follow request order.
    pub fn build(req: &CreateTransactionRequest, batch: &ValidatedBatch) -> Self {
        let lines = batch
            .lines
            .iter()
            .map(|line| DraftLine {
                line_number: line.line_number(),
                item_id: line.item.id.clone(),
                quantity: line.quantity(),
                unit_price_cents: line.pricing.unit_price.cents(),
                tax_rate_bps: line.pricing.tax_rate.bps(),
                discount_cents: line.pricing.discount.cents(),
                subtotal_cents: line.pricing.subtotal.cents(),
                tax_cents: line.pricing.tax.cents(),
                line_total_cents: line.pricing.line_total.cents(),
                condition: line.condition,
            })
            .collect();

        let rental = match req.kind {
            TransactionKind::Rental => Some(RentalLifecycle {
                rental_status: RentalStatus::Reserved,
                expected_return_date: req.expected_return_date,
                actual_return_date: None,
            }),
            TransactionKind::Purchase => None,
        };

        let notes = req
            .notes
            .as_ref()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        TransactionDraft {
            kind: req.kind,
            status: req.kind.committed_status(),
            location_id: req.location_id.clone(),
            counterparty_id: req.counterparty_id.clone(),
            transaction_date: req.transaction_date,
            totals: batch.totals,
            paid_amount_cents: req.paid_amount_cents.unwrap_or(0),
            rental,
            notes,
            lines,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::LineRequest;
    use crate::types::{Item, ItemStatus, StockLevel};
    use crate::validation::validate_batch;
    use std::collections::HashMap;

    #[test]
    fn test_rental_draft() {
        let drill = Item {
            id: "drill".into(),
            name: "Drill".into(),
            is_rentable: true,
            is_saleable: false,
            status: ItemStatus::Active,
        };
        let mut level = StockLevel::empty("drill", "loc-1");
        level.quantity_on_hand = 5;

        let items = HashMap::from([(drill.id.clone(), drill)]);
        let stock = HashMap::from([("drill".to_string(), level)]);
        let req = CreateTransactionRequest {
            kind: TransactionKind::Rental,
            counterparty_id: "cust-1".into(),
            location_id: "loc-1".into(),
            transaction_date: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            items: vec![
                LineRequest::new("drill", 1, 1500),
                LineRequest::new("drill", 2, 1500).with_tax_bps(500),
            ],
            expected_return_date: NaiveDate::from_ymd_opt(2026, 2, 8),
            paid_amount_cents: Some(1000),
            notes: Some("   ".into()),
        };

        let batch = validate_batch(req.kind, &req.location_id, &req.items, &items, &stock).unwrap();
        let draft = TransactionDraft::build(&req, &batch);

        assert_eq!(draft.status, TransactionStatus::InProgress);
        assert_eq!(draft.lines.len(), 2);
        assert_eq!(draft.lines[0].line_number, 1);
        assert_eq!(draft.lines[1].line_number, 2);
        assert_eq!(draft.lines[1].tax_cents, 150);
        assert_eq!(draft.totals.total.cents(), 1500 + 3150);
        assert_eq!(
            draft.rental.as_ref().map(|r| r.rental_status),
            Some(RentalStatus::Reserved)
        );
        assert_eq!(draft.paid_amount_cents, 1000);
        assert!(draft.notes.is_none());
    }
}
