//! Transaction number format: `{PUR|REN}-{YYYYMMDD}-{sequence}`.
//!
//! The sequence is scoped to (kind, transaction date) and padded to at least
//! four digits; it grows past four digits rather than wrapping.

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::types::TransactionKind;

/// Formats a transaction number.
///
/// ```rust
/// use chrono::NaiveDate;
/// use stockroom_core::numbering::format_transaction_number;
/// use stockroom_core::types::TransactionKind;
///
/// let date = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
/// assert_eq!(
///     format_transaction_number(TransactionKind::Rental, date, 7),
///     "REN-20260115-0007"
/// );
/// ```
pub fn format_transaction_number(kind: TransactionKind, date: NaiveDate, sequence: i64) -> String {
    format!("{}-{}-{:04}", kind.prefix(), date.format("%Y%m%d"), sequence)
}

/// Components of a transaction number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionNumber {
    pub kind: TransactionKind,
    pub date: NaiveDate,
    pub sequence: i64,
}

/// Parses a transaction number, rejecting anything not in the expected shape.
pub fn validate_transaction_number(number: &str) -> Result<TransactionNumber, ValidationError> {
    parse_transaction_number(number).ok_or_else(|| ValidationError::Malformed {
        field: "transaction_number".into(),
        expected: "PUR|REN-YYYYMMDD-NNNN".into(),
    })
}

/// Parses a transaction number; `None` if it is not in the expected shape.
pub fn parse_transaction_number(number: &str) -> Option<TransactionNumber> {
    let mut parts = number.splitn(3, '-');
    let kind = match parts.next()? {
        "PUR" => TransactionKind::Purchase,
        "REN" => TransactionKind::Rental,
        _ => return None,
    };

    let date_part = parts.next()?;
    if date_part.len() != 8 {
        return None;
    }
    let date = NaiveDate::parse_from_str(date_part, "%Y%m%d").ok()?;

    let seq_part = parts.next()?;
    if seq_part.len() < 4 || !seq_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let sequence = seq_part.parse::<i64>().ok()?;

    Some(TransactionNumber {
        kind,
        date,
        sequence,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()
    }

    #[test]
    fn test_format() {
        assert_eq!(
            format_transaction_number(TransactionKind::Purchase, date(), 1),
            "PUR-20260115-0001"
        );
        assert_eq!(
            format_transaction_number(TransactionKind::Rental, date(), 12345),
            "REN-20260115-12345"
        );
    }

    #[test]
    fn test_parse() {
        let parsed = parse_transaction_number("PUR-20260115-0042").unwrap();
        assert_eq!(parsed.kind, TransactionKind::Purchase);
        assert_eq!(parsed.date, date());
        assert_eq!(parsed.sequence, 42);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(parse_transaction_number("SAL-20260115-0001").is_none());
        assert!(parse_transaction_number("PUR-2026011-0001").is_none());
        assert!(parse_transaction_number("PUR-20261315-0001").is_none());
        assert!(parse_transaction_number("PUR-20260115-01").is_none());
        assert!(parse_transaction_number("PUR-20260115").is_none());
    }

    #[test]
    fn test_validate_names_the_field() {
        let err = validate_transaction_number("drill-01").unwrap_err();
        assert_eq!(err.field(), "transaction_number");
        assert!(validate_transaction_number("REN-20260115-0001").is_ok());
    }
}
