//! # Transaction Repository
//!
//! Read-back of committed transactions, plus the row-level inserts the
//! writer runs inside its unit of work.
//!
//! Headers store the counterparty in `customer_id` (rentals) or
//! `supplier_id` (purchases) so both sides keep a real foreign key; the
//! domain type folds them back into one `counterparty_id`.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use stockroom_core::{
    RentalLifecycle, RentalStatus, Transaction, TransactionHeader, TransactionKind,
    TransactionLine, TransactionStatus,
};

const HEADER_COLUMNS: &str = r#"
    id, transaction_number, kind, status, location_id, customer_id, supplier_id,
    transaction_date, subtotal_cents, discount_cents, tax_cents, total_cents,
    paid_amount_cents, rental_status, expected_return_date, actual_return_date,
    notes, created_at, updated_at
"#;

const LINE_COLUMNS: &str = r#"
    id, transaction_id, line_number, item_id, quantity, unit_price_cents,
    tax_rate_bps, discount_cents, subtotal_cents, tax_cents, line_total_cents,
    condition, created_at
"#;

/// Storage shape of a header row.
#[derive(Debug, FromRow)]
struct HeaderRow {
    id: String,
    transaction_number: String,
    kind: TransactionKind,
    status: TransactionStatus,
    location_id: String,
    customer_id: Option<String>,
    supplier_id: Option<String>,
    transaction_date: NaiveDate,
    subtotal_cents: i64,
    discount_cents: i64,
    tax_cents: i64,
    total_cents: i64,
    paid_amount_cents: i64,
    rental_status: Option<RentalStatus>,
    expected_return_date: Option<NaiveDate>,
    actual_return_date: Option<NaiveDate>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<HeaderRow> for TransactionHeader {
    fn from(row: HeaderRow) -> Self {
        let rental = row.rental_status.map(|rental_status| RentalLifecycle {
            rental_status,
            expected_return_date: row.expected_return_date,
            actual_return_date: row.actual_return_date,
        });

        TransactionHeader {
            id: row.id,
            transaction_number: row.transaction_number,
            kind: row.kind,
            status: row.status,
            location_id: row.location_id,
            counterparty_id: row.customer_id.or(row.supplier_id).unwrap_or_default(),
            transaction_date: row.transaction_date,
            subtotal_cents: row.subtotal_cents,
            discount_cents: row.discount_cents,
            tax_cents: row.tax_cents,
            total_cents: row.total_cents,
            paid_amount_cents: row.paid_amount_cents,
            rental,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for committed transactions.
///
/// ## Usage
/// ```rust,ignore
/// let txn = db.transactions().get_by_number("REN-20260115-0001").await?;
/// ```
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    /// Creates a new TransactionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    /// Gets a transaction with its lines by id.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Transaction>> {
        let sql = format!("SELECT {HEADER_COLUMNS} FROM transactions WHERE id = ?1");
        let row = sqlx::query_as::<_, HeaderRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        self.with_lines(row).await
    }

    /// Gets a transaction with its lines by transaction number.
    pub async fn get_by_number(&self, number: &str) -> DbResult<Option<Transaction>> {
        let sql = format!("SELECT {HEADER_COLUMNS} FROM transactions WHERE transaction_number = ?1");
        let row = sqlx::query_as::<_, HeaderRow>(&sql)
            .bind(number)
            .fetch_optional(&self.pool)
            .await?;
        self.with_lines(row).await
    }

    /// Headers of one kind on one transaction date, in number order.
    pub async fn list_by_date(
        &self,
        kind: TransactionKind,
        date: NaiveDate,
    ) -> DbResult<Vec<TransactionHeader>> {
        let sql = format!(
            "SELECT {HEADER_COLUMNS} FROM transactions \
             WHERE kind = ?1 AND transaction_date = ?2 \
             ORDER BY transaction_number"
        );
        let rows = sqlx::query_as::<_, HeaderRow>(&sql)
            .bind(kind)
            .bind(date)
            .fetch_all(&self.pool)
            .await?;

        debug!(kind = %kind, date = %date, count = rows.len(), "Listed transactions");
        Ok(rows.into_iter().map(TransactionHeader::from).collect())
    }

    /// Lines of a transaction in line-number order.
    pub async fn get_lines(&self, transaction_id: &str) -> DbResult<Vec<TransactionLine>> {
        let sql = format!(
            "SELECT {LINE_COLUMNS} FROM transaction_lines \
             WHERE transaction_id = ?1 ORDER BY line_number"
        );
        let lines = sqlx::query_as::<_, TransactionLine>(&sql)
            .bind(transaction_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(lines)
    }

    /// Number of committed headers. Used by diagnostics and tests.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transactions")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn with_lines(&self, row: Option<HeaderRow>) -> DbResult<Option<Transaction>> {
        let Some(row) = row else {
            return Ok(None);
        };
        let header = TransactionHeader::from(row);
        let lines = self.get_lines(&header.id).await?;
        Ok(Some(Transaction { header, lines }))
    }
}

// =============================================================================
// Unit-of-work statements (writer only)
// =============================================================================

/// Increments and returns the counter for (kind, date).
///
/// The upsert takes SQLite's write lock, so two writers can never read the
/// same value; a rollback also rolls the counter back.
pub(crate) async fn next_sequence(
    conn: &mut SqliteConnection,
    kind: TransactionKind,
    date: NaiveDate,
) -> DbResult<i64> {
    let value: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO transaction_sequences (kind, business_date, last_value)
        VALUES (?1, ?2, 1)
        ON CONFLICT (kind, business_date) DO UPDATE SET last_value = last_value + 1
        RETURNING last_value
        "#,
    )
    .bind(kind)
    .bind(date)
    .fetch_one(&mut *conn)
    .await?;

    Ok(value)
}

pub(crate) async fn insert_header(
    conn: &mut SqliteConnection,
    header: &TransactionHeader,
) -> DbResult<()> {
    let (customer_id, supplier_id) = match header.kind {
        TransactionKind::Rental => (Some(header.counterparty_id.as_str()), None),
        TransactionKind::Purchase => (None, Some(header.counterparty_id.as_str())),
    };
    let rental = header.rental.as_ref();

    sqlx::query(
        r#"
        INSERT INTO transactions (
            id, transaction_number, kind, status, location_id, customer_id, supplier_id,
            transaction_date, subtotal_cents, discount_cents, tax_cents, total_cents,
            paid_amount_cents, rental_status, expected_return_date, actual_return_date,
            notes, created_at, updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6, ?7,
            ?8, ?9, ?10, ?11, ?12,
            ?13, ?14, ?15, ?16,
            ?17, ?18, ?19
        )
        "#,
    )
    .bind(&header.id)
    .bind(&header.transaction_number)
    .bind(header.kind)
    .bind(header.status)
    .bind(&header.location_id)
    .bind(customer_id)
    .bind(supplier_id)
    .bind(header.transaction_date)
    .bind(header.subtotal_cents)
    .bind(header.discount_cents)
    .bind(header.tax_cents)
    .bind(header.total_cents)
    .bind(header.paid_amount_cents)
    .bind(rental.map(|r| r.rental_status))
    .bind(rental.and_then(|r| r.expected_return_date))
    .bind(rental.and_then(|r| r.actual_return_date))
    .bind(&header.notes)
    .bind(header.created_at)
    .bind(header.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub(crate) async fn insert_line(conn: &mut SqliteConnection, line: &TransactionLine) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO transaction_lines (
            id, transaction_id, line_number, item_id, quantity, unit_price_cents,
            tax_rate_bps, discount_cents, subtotal_cents, tax_cents, line_total_cents,
            condition, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
        "#,
    )
    .bind(&line.id)
    .bind(&line.transaction_id)
    .bind(line.line_number)
    .bind(&line.item_id)
    .bind(line.quantity)
    .bind(line.unit_price_cents)
    .bind(line.tax_rate_bps)
    .bind(line.discount_cents)
    .bind(line.subtotal_cents)
    .bind(line.tax_cents)
    .bind(line.line_total_cents)
    .bind(line.condition)
    .bind(line.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}
