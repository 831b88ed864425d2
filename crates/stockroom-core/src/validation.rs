//! # Validation Module
//!
//! Field rules plus the Batch Validator.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: validate_request (request-level, before any lookup)           │
//! │  ├── ids present, 1..=max_lines lines                                   │
//! │  └── return date, paid amount, notes                                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: validate_batch (per line, over one bulk item lookup and       │
//! │           one bulk stock lookup fetched by the caller)                  │
//! │  ├── item exists / eligible for the transaction kind                    │
//! │  ├── quantity, price, tax, discount, condition                          │
//! │  └── cumulative rental quantity per item vs available                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                             │
//! │  ├── CHECK (0 <= reserved <= on_hand)                                   │
//! │  ├── UNIQUE transaction_number                                          │
//! │  └── Foreign key constraints                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Layer 2 never stops at the first problem: it walks every line and
//! returns all of them, sorted by line index.
//!
//! ## Usage
//! ```rust
//! use stockroom_core::validation::{validate_quantity, validate_tax_rate_bps};
//!
//! assert!(validate_quantity(5).is_ok());
//! assert!(validate_tax_rate_bps(10_100).is_err());
//! ```

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{LineError, ValidationError};
use crate::money::Money;
use crate::pricing::{LinePricing, TransactionTotals};
use crate::request::{CreateTransactionRequest, LineRequest};
use crate::types::{ConditionCode, Item, StockLevel, TaxRate, TransactionKind};
use crate::{
    MAX_ID_LENGTH, MAX_LINES_LIMIT, MAX_LINE_QUANTITY, MAX_NOTES_LENGTH, MAX_TAX_RATE_BPS,
};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates an entity identifier.
///
/// ## Rules
/// - Must not be empty or whitespace
/// - At most 64 characters
pub fn validate_id(field: &str, id: &str) -> ValidationResult<()> {
    let id = id.trim();

    if id.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if id.len() > MAX_ID_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_ID_LENGTH,
        });
    }

    Ok(())
}

/// Validates free-text notes. Counted in characters, not bytes.
pub fn validate_notes(notes: &str) -> ValidationResult<()> {
    if notes.chars().count() > MAX_NOTES_LENGTH {
        return Err(ValidationError::TooLong {
            field: "notes".to_string(),
            max: MAX_NOTES_LENGTH,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price or cost in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (free loaners, donated stock)
///
/// ## Example
/// ```rust
/// use stockroom_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents("unit_price", 1099).is_ok());
/// assert!(validate_price_cents("unit_price", 0).is_ok());
/// assert!(validate_price_cents("unit_cost", -100).is_err());
/// ```
pub fn validate_price_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a tax rate in basis points.
///
/// ## Rules
/// - Must be between 0 and 10000 (0% to 100%)
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > MAX_TAX_RATE_BPS {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate".to_string(),
            min: 0,
            max: MAX_TAX_RATE_BPS as i64,
        });
    }

    Ok(())
}

/// Validates a line discount against the line subtotal.
///
/// ## Rules
/// - Must be non-negative
/// - Must not exceed quantity × unit price
pub fn validate_discount_cents(discount: i64, subtotal: Money) -> ValidationResult<()> {
    if discount < 0 || discount > subtotal.cents() {
        return Err(ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: 0,
            max: subtotal.cents(),
        });
    }

    Ok(())
}

/// Validates an amount already paid at creation time.
pub fn validate_paid_amount(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "paid_amount".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// Enum / Date Validators
// =============================================================================

/// Parses an optional condition code.
///
/// Purchases must carry one; rentals may omit it but anything present must
/// still be a valid code.
pub fn parse_condition(
    raw: Option<&str>,
    required: bool,
) -> ValidationResult<Option<ConditionCode>> {
    match raw {
        Some(s) if !s.trim().is_empty() => s.parse::<ConditionCode>().map(Some),
        _ if required => Err(ValidationError::Required {
            field: "condition".to_string(),
        }),
        _ => Ok(None),
    }
}

/// A rental cannot be due back before it starts.
pub fn validate_return_date(transaction_date: NaiveDate, expected: NaiveDate) -> ValidationResult<()> {
    if expected < transaction_date {
        return Err(ValidationError::DateBefore {
            field: "expected_return_date".to_string(),
            earliest: transaction_date.to_string(),
        });
    }

    Ok(())
}

/// Validates the number of lines in one request. `max_lines` is clamped to
/// [`MAX_LINES_LIMIT`].
pub fn validate_line_count(count: usize, max_lines: usize) -> ValidationResult<()> {
    let max_lines = max_lines.min(MAX_LINES_LIMIT);

    if count == 0 {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }

    if count > max_lines {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: max_lines as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Request-Level Validation
// =============================================================================

/// Checks everything that does not need a lookup.
///
/// Returns the first failing rule; these are not tied to a line index.
pub fn validate_request(req: &CreateTransactionRequest, max_lines: usize) -> ValidationResult<()> {
    let counterparty_field = match req.kind {
        TransactionKind::Rental => "customer_id",
        TransactionKind::Purchase => "supplier_id",
    };
    validate_id(counterparty_field, &req.counterparty_id)?;
    validate_id("location_id", &req.location_id)?;
    validate_line_count(req.items.len(), max_lines)?;

    if req.kind == TransactionKind::Rental {
        if let Some(expected) = req.expected_return_date {
            validate_return_date(req.transaction_date, expected)?;
        }
    }

    if let Some(paid) = req.paid_amount_cents {
        validate_paid_amount(paid)?;
    }

    if let Some(notes) = &req.notes {
        validate_notes(notes)?;
    }

    Ok(())
}

// =============================================================================
// Batch Validator
// =============================================================================

/// A requested line that passed every rule, with its resolved item and price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedLine {
    /// Position in the request's `items` array; line number is this + 1.
    pub line_index: usize,
    pub item: Item,
    pub condition: Option<ConditionCode>,
    pub pricing: LinePricing,
}

impl ValidatedLine {
    #[inline]
    pub fn line_number(&self) -> i64 {
        self.line_index as i64 + 1
    }

    #[inline]
    pub fn quantity(&self) -> i64 {
        self.pricing.quantity
    }
}

/// Output of the Batch Validator: ready for allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedBatch {
    pub kind: TransactionKind,
    pub location_id: String,
    /// In request order.
    pub lines: Vec<ValidatedLine>,
    /// Stock rows read for this request, keyed by item id. Items with no row
    /// at the location are absent.
    pub snapshot: BTreeMap<String, StockLevel>,
    pub totals: TransactionTotals,
}

impl ValidatedBatch {
    /// Total quantity per distinct item, in item id order.
    pub fn quantity_by_item(&self) -> BTreeMap<String, i64> {
        let mut totals = BTreeMap::new();
        for line in &self.lines {
            *totals.entry(line.item.id.clone()).or_insert(0) += line.quantity();
        }
        totals
    }
}

/// Validates every requested line against one item lookup and one stock
/// lookup.
///
/// `items` is keyed by item id and holds whatever the bulk lookup found;
/// `stock` is keyed by item id and holds the rows for `location_id`.
///
/// ## Flow
/// ```text
/// for each line ──► resolve item ──► eligibility (kind) ──► field rules
///                         │                                      │
///                   NotFound error                         LinePricing
///                                                                │
/// rentals: Σ quantity per item ──► compare with on_hand − reserved
///                                  (every line of a short item gets
///                                   its own InsufficientStock entry)
/// ```
pub fn validate_batch(
    kind: TransactionKind,
    location_id: &str,
    lines: &[LineRequest],
    items: &HashMap<String, Item>,
    stock: &HashMap<String, StockLevel>,
) -> Result<ValidatedBatch, Vec<LineError>> {
    let mut errors: Vec<LineError> = Vec::new();
    let mut validated: Vec<ValidatedLine> = Vec::with_capacity(lines.len());
    // item id -> (cumulative quantity, line indexes)
    let mut rental_demand: BTreeMap<&str, (i64, Vec<usize>)> = BTreeMap::new();

    let price_field = match kind {
        TransactionKind::Rental => "unit_price",
        TransactionKind::Purchase => "unit_cost",
    };

    for (idx, line) in lines.iter().enumerate() {
        let item_id = line.item_id.as_str();
        let before = errors.len();

        if let Err(e) = validate_id("item_id", item_id) {
            errors.push(LineError::validation(idx, item_id, e));
            continue;
        }

        let item = match items.get(item_id) {
            Some(item) => Some(item),
            None => {
                errors.push(LineError::not_found(idx, item_id));
                None
            }
        };

        let mut eligible = item.is_some();
        if let (Some(item), TransactionKind::Rental) = (item, kind) {
            if !item.is_rentable {
                errors.push(LineError::ineligible(idx, item_id, "is not rentable"));
                eligible = false;
            }
            if !item.is_active() {
                let reason = format!("is {}", status_name(item));
                errors.push(LineError::ineligible(idx, item_id, &reason));
                eligible = false;
            }
        }

        let quantity_ok = match validate_quantity(line.quantity) {
            Ok(()) => true,
            Err(e) => {
                errors.push(LineError::validation(idx, item_id, e));
                false
            }
        };

        let price_ok = match validate_price_cents(price_field, line.unit_price_cents) {
            Ok(()) => true,
            Err(e) => {
                errors.push(LineError::validation(idx, item_id, e));
                false
            }
        };

        let tax_bps = line.tax_rate_bps.unwrap_or(0);
        if let Err(e) = validate_tax_rate_bps(tax_bps) {
            errors.push(LineError::validation(idx, item_id, e));
        }

        let discount = line.discount_cents.unwrap_or(0);
        let unit_price = Money::from_cents(line.unit_price_cents);
        if quantity_ok && price_ok {
            match unit_price.checked_multiply_quantity(line.quantity) {
                Some(subtotal) => {
                    if let Err(e) = validate_discount_cents(discount, subtotal) {
                        errors.push(LineError::validation(idx, item_id, e));
                    }
                }
                None => errors.push(LineError::validation(
                    idx,
                    item_id,
                    ValidationError::Overflow {
                        field: "subtotal".to_string(),
                    },
                )),
            }
        } else if discount < 0 {
            errors.push(LineError::validation(
                idx,
                item_id,
                ValidationError::OutOfRange {
                    field: "discount".to_string(),
                    min: 0,
                    max: i64::MAX,
                },
            ));
        }

        let required = kind == TransactionKind::Purchase;
        let condition = match parse_condition(line.condition.as_deref(), required) {
            Ok(c) => c,
            Err(e) => {
                errors.push(LineError::validation(idx, item_id, e));
                None
            }
        };

        if kind == TransactionKind::Rental && eligible && quantity_ok {
            let entry = rental_demand.entry(item_id).or_insert((0, Vec::new()));
            entry.0 = entry.0.saturating_add(line.quantity);
            entry.1.push(idx);
        }

        if errors.len() > before {
            continue;
        }

        // Everything above passed, so the only failure left is overflow
        let Some(item) = item else { continue };
        match LinePricing::compute(
            line.quantity,
            unit_price,
            TaxRate::from_bps(tax_bps),
            Money::from_cents(discount),
        ) {
            Some(pricing) => validated.push(ValidatedLine {
                line_index: idx,
                item: item.clone(),
                condition,
                pricing,
            }),
            None => errors.push(LineError::validation(
                idx,
                item_id,
                ValidationError::Overflow {
                    field: "line_total".to_string(),
                },
            )),
        }
    }

    for (item_id, (requested, indexes)) in &rental_demand {
        let available = stock
            .get(*item_id)
            .map(|level| level.available().max(0))
            .unwrap_or(0);
        if *requested > available {
            for idx in indexes {
                errors.push(LineError::insufficient_stock(
                    *idx, item_id, *requested, available,
                ));
            }
        }
    }

    let mut totals = TransactionTotals::default();
    for line in &validated {
        match totals.checked_add_line(&line.pricing) {
            Some(next) => totals = next,
            None => {
                errors.push(LineError::validation(
                    line.line_index,
                    &line.item.id,
                    ValidationError::Overflow {
                        field: "total".to_string(),
                    },
                ));
                break;
            }
        }
    }

    if !errors.is_empty() {
        // Stable: detection order is kept within a line
        errors.sort_by_key(|e| e.line_index);
        return Err(errors);
    }

    let snapshot = validated
        .iter()
        .filter_map(|line| stock.get(&line.item.id))
        .map(|level| (level.item_id.clone(), level.clone()))
        .collect();

    Ok(ValidatedBatch {
        kind,
        location_id: location_id.to_string(),
        lines: validated,
        snapshot,
        totals,
    })
}

fn status_name(item: &Item) -> &'static str {
    match item.status {
        crate::types::ItemStatus::Active => "active",
        crate::types::ItemStatus::Inactive => "inactive",
        crate::types::ItemStatus::Discontinued => "discontinued",
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::types::ItemStatus;

    #[test]
    fn test_line_count_is_clamped_to_hard_limit() {
        assert!(validate_line_count(MAX_LINES_LIMIT, usize::MAX).is_ok());
        let err = validate_line_count(MAX_LINES_LIMIT + 1, usize::MAX).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { max, .. } if max == MAX_LINES_LIMIT as i64));
    }

    fn item(id: &str, rentable: bool) -> Item {
        Item {
            id: id.to_string(),
            name: id.to_uppercase(),
            is_rentable: rentable,
            is_saleable: !rentable,
            status: ItemStatus::Active,
        }
    }

    fn level(item_id: &str, on_hand: i64, reserved: i64) -> StockLevel {
        let mut l = StockLevel::empty(item_id, "loc-1");
        l.quantity_on_hand = on_hand;
        l.quantity_reserved = reserved;
        l.version = 3;
        l
    }

    fn catalog(items: Vec<Item>) -> HashMap<String, Item> {
        items.into_iter().map(|i| (i.id.clone(), i)).collect()
    }

    fn ledger(levels: Vec<StockLevel>) -> HashMap<String, StockLevel> {
        levels.into_iter().map(|l| (l.item_id.clone(), l)).collect()
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_LINE_QUANTITY).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(MAX_LINE_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_tax_rate_bps() {
        assert!(validate_tax_rate_bps(0).is_ok());
        assert!(validate_tax_rate_bps(825).is_ok());
        assert!(validate_tax_rate_bps(10000).is_ok());
        assert!(validate_tax_rate_bps(10001).is_err());
    }

    #[test]
    fn test_validate_discount() {
        let subtotal = Money::from_cents(1000);
        assert!(validate_discount_cents(0, subtotal).is_ok());
        assert!(validate_discount_cents(1000, subtotal).is_ok());
        assert!(validate_discount_cents(1001, subtotal).is_err());
        assert!(validate_discount_cents(-1, subtotal).is_err());
    }

    #[test]
    fn test_parse_condition() {
        assert_eq!(parse_condition(Some("b"), true).unwrap(), Some(ConditionCode::B));
        assert_eq!(parse_condition(None, false).unwrap(), None);
        assert!(matches!(
            parse_condition(None, true),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            parse_condition(Some("Z"), false),
            Err(ValidationError::NotAllowed { .. })
        ));
    }

    #[test]
    fn test_validate_request_rules() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let mut req = CreateTransactionRequest {
            kind: TransactionKind::Rental,
            counterparty_id: "cust-1".into(),
            location_id: "loc-1".into(),
            transaction_date: date,
            items: vec![LineRequest::new("drill", 1, 1500)],
            expected_return_date: NaiveDate::from_ymd_opt(2026, 3, 9),
            paid_amount_cents: None,
            notes: None,
        };
        assert!(matches!(
            validate_request(&req, 500),
            Err(ValidationError::DateBefore { .. })
        ));

        req.expected_return_date = Some(date);
        assert!(validate_request(&req, 500).is_ok());

        req.items.clear();
        assert!(matches!(
            validate_request(&req, 500),
            Err(ValidationError::Required { .. })
        ));

        req.items = vec![LineRequest::new("drill", 1, 1500); 3];
        assert!(validate_request(&req, 2).is_err());

        req.counterparty_id = "  ".into();
        let err = validate_request(&req, 500).unwrap_err();
        assert_eq!(err.field(), "customer_id");
    }

    #[test]
    fn test_rental_batch_prices_lines() {
        let items = catalog(vec![item("drill", true), item("saw", true)]);
        let stock = ledger(vec![level("drill", 10, 2), level("saw", 5, 0)]);
        let lines = vec![
            LineRequest::new("drill", 2, 1500).with_tax_bps(1000),
            LineRequest::new("saw", 1, 4000).with_discount_cents(500),
        ];

        let batch = validate_batch(TransactionKind::Rental, "loc-1", &lines, &items, &stock).unwrap();
        assert_eq!(batch.lines.len(), 2);
        assert_eq!(batch.lines[0].line_number(), 1);
        assert_eq!(batch.lines[0].pricing.line_total.cents(), 3300);
        assert_eq!(batch.lines[1].pricing.line_total.cents(), 3500);
        assert_eq!(batch.totals.total.cents(), 6800);
        assert_eq!(batch.snapshot.len(), 2);
    }

    #[test]
    fn test_rental_cumulative_demand_flags_every_line() {
        let items = catalog(vec![item("drill", true)]);
        let stock = ledger(vec![level("drill", 10, 4)]);
        let lines = vec![
            LineRequest::new("drill", 4, 1500),
            LineRequest::new("drill", 3, 1500),
        ];

        let errors =
            validate_batch(TransactionKind::Rental, "loc-1", &lines, &items, &stock).unwrap_err();
        assert_eq!(errors.len(), 2);
        for (i, err) in errors.iter().enumerate() {
            assert_eq!(err.line_index, i);
            assert_eq!(err.kind, ErrorKind::InsufficientStock);
            assert_eq!(err.shortfall, Some(1));
        }
    }

    #[test]
    fn test_rental_missing_stock_row_is_zero() {
        let items = catalog(vec![item("drill", true)]);
        let lines = vec![LineRequest::new("drill", 1, 1500)];

        let errors = validate_batch(
            TransactionKind::Rental,
            "loc-1",
            &lines,
            &items,
            &HashMap::new(),
        )
        .unwrap_err();
        assert_eq!(errors[0].kind, ErrorKind::InsufficientStock);
        assert_eq!(errors[0].shortfall, Some(1));
    }

    #[test]
    fn test_rental_rejects_ineligible_items() {
        let mut retired = item("old-drill", true);
        retired.status = ItemStatus::Discontinued;
        let items = catalog(vec![item("bolt", false), retired]);
        let stock = ledger(vec![level("bolt", 100, 0), level("old-drill", 5, 0)]);
        let lines = vec![
            LineRequest::new("bolt", 1, 10),
            LineRequest::new("old-drill", 1, 1500),
        ];

        let errors =
            validate_batch(TransactionKind::Rental, "loc-1", &lines, &items, &stock).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].message, "Item bolt is not rentable");
        assert_eq!(errors[1].message, "Item old-drill is discontinued");
    }

    #[test]
    fn test_purchase_requires_valid_condition() {
        let items = catalog(vec![item("bolt", false)]);
        let lines = vec![
            LineRequest::new("bolt", 10, 2550).with_condition("a"),
            LineRequest::new("bolt", 10, 2550),
            LineRequest::new("bolt", 10, 2550).with_condition("E"),
        ];

        let errors = validate_batch(
            TransactionKind::Purchase,
            "loc-1",
            &lines,
            &items,
            &HashMap::new(),
        )
        .unwrap_err();
        let indexes: Vec<usize> = errors.iter().map(|e| e.line_index).collect();
        assert_eq!(indexes, vec![1, 2]);
        assert!(errors.iter().all(|e| e.kind == ErrorKind::Validation));
    }

    #[test]
    fn test_errors_are_collected_and_sorted() {
        let items = catalog(vec![item("bolt", false)]);
        let lines = vec![
            LineRequest::new("bolt", 1, 100).with_condition("A"),
            LineRequest::new("ghost", 1, 100).with_condition("A"),
            LineRequest::new("bolt", 0, -5)
                .with_tax_bps(10_100)
                .with_condition("A"),
        ];

        let errors = validate_batch(
            TransactionKind::Purchase,
            "loc-1",
            &lines,
            &items,
            &HashMap::new(),
        )
        .unwrap_err();

        assert_eq!(errors[0].line_index, 1);
        assert_eq!(errors[0].kind, ErrorKind::NotFound);
        let third: Vec<&str> = errors[1..].iter().map(|e| e.message.as_str()).collect();
        assert_eq!(
            third,
            vec![
                "quantity must be positive",
                "unit_cost must be between 0 and 9223372036854775807",
                "tax_rate must be between 0 and 10000",
            ]
        );
    }

    #[test]
    fn test_discount_above_subtotal_rejected() {
        let items = catalog(vec![item("bolt", false)]);
        let lines = vec![LineRequest::new("bolt", 2, 100)
            .with_discount_cents(201)
            .with_condition("A")];

        let errors = validate_batch(
            TransactionKind::Purchase,
            "loc-1",
            &lines,
            &items,
            &HashMap::new(),
        )
        .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "discount must be between 0 and 200");
    }

    #[test]
    fn test_quantity_by_item_merges_duplicates() {
        let items = catalog(vec![item("drill", true)]);
        let stock = ledger(vec![level("drill", 10, 0)]);
        let lines = vec![
            LineRequest::new("drill", 2, 1500),
            LineRequest::new("drill", 3, 1500),
        ];

        let batch = validate_batch(TransactionKind::Rental, "loc-1", &lines, &items, &stock).unwrap();
        assert_eq!(batch.lines.len(), 2);
        assert_eq!(batch.quantity_by_item().get("drill"), Some(&5));
    }
}
