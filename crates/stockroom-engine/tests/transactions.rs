//! Single-request behaviour of the processor against an in-memory database.

mod common;

use common::*;
use stockroom_core::{
    ConditionCode, ErrorKind, ItemStatus, LineRequest, ProcessingState, RentalStatus,
    TransactionKind, TransactionStatus,
};
use stockroom_engine::TransactionError;

// =============================================================================
// Purchases
// =============================================================================

#[tokio::test]
async fn test_purchase_receives_stock() {
    let db = memory_db().await;
    add_item(&db, "bolt-m8", false, ItemStatus::Active).await;
    let processor = processor(&db);

    let committed = processor
        .create_purchase(purchase(vec![
            LineRequest::new("bolt-m8", 10, 2550).with_condition("A")
        ]))
        .await
        .unwrap();

    assert_eq!(committed.state, ProcessingState::Committed);
    assert_eq!(committed.transaction_number(), "PUR-20260115-0001");

    let header = &committed.transaction.header;
    assert_eq!(header.kind, TransactionKind::Purchase);
    assert_eq!(header.status, TransactionStatus::Completed);
    assert_eq!(header.counterparty_id, SUPPLIER);
    assert!(header.rental.is_none());

    let line = &committed.transaction.lines[0];
    assert_eq!(line.line_total_cents, 25_500);
    assert_eq!(line.condition, Some(ConditionCode::A));
    assert_eq!(header.total_cents, line.line_total_cents);

    let level = processor.stock_level("bolt-m8", LOCATION).await.unwrap();
    assert_eq!(level.quantity_on_hand, 10);
    assert_eq!(level.quantity_reserved, 0);
    assert_eq!(committed.stock_level("bolt-m8"), Some(&level));
}

#[tokio::test]
async fn test_purchase_adds_to_existing_stock() {
    let db = memory_db().await;
    add_rentable(&db, "drill", 4).await;
    let processor = processor(&db);

    processor
        .create_purchase(purchase(vec![
            LineRequest::new("drill", 3, 9000).with_condition("b")
        ]))
        .await
        .unwrap();

    let level = processor.stock_level("drill", LOCATION).await.unwrap();
    assert_eq!(level.quantity_on_hand, 7);
    assert_eq!(level.version, 2);
}

#[tokio::test]
async fn test_purchase_requires_condition() {
    let db = memory_db().await;
    add_item(&db, "bolt-m8", false, ItemStatus::Active).await;
    let processor = processor(&db);

    let failure = processor
        .create_purchase(purchase(vec![LineRequest::new("bolt-m8", 10, 2550)]))
        .await
        .unwrap_err();

    assert_eq!(failure.state, ProcessingState::ValidationFailed);
    assert_eq!(failure.kind(), ErrorKind::Validation);
    assert!(failure.error.line_errors()[0].message.contains("condition"));
}

// =============================================================================
// Rentals
// =============================================================================

#[tokio::test]
async fn test_rental_reserves_and_prices_lines() {
    let db = memory_db().await;
    add_rentable(&db, "drill", 10).await;
    let processor = processor(&db);

    let committed = processor
        .create_rental(rental(vec![LineRequest::new("drill", 2, 1000)
            .with_tax_bps(825)
            .with_discount_cents(100)]))
        .await
        .unwrap();

    assert_eq!(committed.transaction_number(), "REN-20260115-0001");
    let header = &committed.transaction.header;
    assert_eq!(header.status, TransactionStatus::InProgress);
    let rental_info = header.rental.as_ref().unwrap();
    assert_eq!(rental_info.rental_status, RentalStatus::Reserved);
    assert_eq!(rental_info.expected_return_date, chrono::NaiveDate::from_ymd_opt(2026, 1, 22));

    // 2 x 10.00, 8.25% tax on 20.00, minus 1.00
    let line = &committed.transaction.lines[0];
    assert_eq!(line.subtotal_cents, 2000);
    assert_eq!(line.tax_cents, 165);
    assert_eq!(line.line_total_cents, 2065);
    assert_eq!(header.subtotal_cents, 2000);
    assert_eq!(header.discount_cents, 100);
    assert_eq!(header.tax_cents, 165);
    assert_eq!(header.total_cents, 2065);

    let level = processor.stock_level("drill", LOCATION).await.unwrap();
    assert_eq!(level.quantity_on_hand, 10);
    assert_eq!(level.quantity_reserved, 2);
}

#[tokio::test]
async fn test_duplicate_item_lines_reserve_combined_quantity() {
    let db = memory_db().await;
    add_rentable(&db, "drill", 10).await;
    add_rentable(&db, "saw", 5).await;
    let processor = processor(&db);

    let committed = processor
        .create_rental(rental(vec![
            LineRequest::new("saw", 1, 500),
            LineRequest::new("drill", 3, 1000),
            LineRequest::new("drill", 4, 1000),
        ]))
        .await
        .unwrap();

    let lines = &committed.transaction.lines;
    let numbers: Vec<i64> = lines.iter().map(|l| l.line_number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    assert_eq!(lines[0].item_id, "saw");

    assert_eq!(committed.stock_levels.len(), 2);
    assert_eq!(committed.stock_level("drill").unwrap().quantity_reserved, 7);

    let stored = processor
        .get_by_number(committed.transaction_number())
        .await
        .unwrap();
    assert_eq!(stored.lines.len(), 3);
    assert_eq!(stored.lines[2].quantity, 4);
}

#[tokio::test]
async fn test_duplicate_lines_that_exceed_stock_together_are_rejected() {
    let db = memory_db().await;
    add_rentable(&db, "drill", 5).await;
    let processor = processor(&db);

    let failure = processor
        .create_rental(rental(vec![
            LineRequest::new("drill", 3, 1000),
            LineRequest::new("drill", 3, 1000),
        ]))
        .await
        .unwrap_err();

    assert_eq!(failure.kind(), ErrorKind::InsufficientStock);
    assert_eq!(failure.error.line_errors().len(), 2);
    assert_eq!(failure.error.shortfall(), Some(1));
}

#[tokio::test]
async fn test_rental_of_inactive_or_unrentable_item_is_rejected() {
    let db = memory_db().await;
    add_item(&db, "mixer", true, ItemStatus::Discontinued).await;
    add_item(&db, "bolt-m8", false, ItemStatus::Active).await;
    let processor = processor(&db);

    let failure = processor
        .create_rental(rental(vec![
            LineRequest::new("mixer", 1, 100),
            LineRequest::new("bolt-m8", 1, 100),
        ]))
        .await
        .unwrap_err();

    let errors = failure.error.line_errors();
    assert_eq!(failure.kind(), ErrorKind::Validation);
    assert!(errors.iter().any(|e| e.line_index == 0));
    assert!(errors
        .iter()
        .any(|e| e.line_index == 1 && e.message.contains("not rentable")));
    assert_eq!(db.transactions().count().await.unwrap(), 0);
}

// =============================================================================
// Rejections leave no trace
// =============================================================================

#[tokio::test]
async fn test_tax_rate_over_100_percent_is_rejected() {
    let db = memory_db().await;
    add_rentable(&db, "drill", 10).await;
    let processor = processor(&db);

    let failure = processor
        .create_rental(rental(vec![LineRequest::new("drill", 1, 1000).with_tax_bps(10_100)]))
        .await
        .unwrap_err();

    assert_eq!(failure.state, ProcessingState::ValidationFailed);
    assert_eq!(failure.status_code(), 400);
    let errors = failure.error.line_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].line_index, 0);
    assert!(errors[0].message.contains("tax_rate"));

    let level = processor.stock_level("drill", LOCATION).await.unwrap();
    assert_eq!(level.quantity_reserved, 0);
    assert_eq!(level.version, 1);
}

#[tokio::test]
async fn test_unknown_item_rejects_the_whole_request() {
    let db = memory_db().await;
    add_rentable(&db, "drill", 10).await;
    let processor = processor(&db);

    let failure = processor
        .create_rental(rental(vec![
            LineRequest::new("drill", 2, 1000),
            LineRequest::new("ghost", 1, 1000),
        ]))
        .await
        .unwrap_err();

    assert_eq!(failure.kind(), ErrorKind::NotFound);
    let errors = failure.error.line_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].line_index, 1);
    assert_eq!(errors[0].item_id.as_deref(), Some("ghost"));

    assert_eq!(db.transactions().count().await.unwrap(), 0);
    let level = processor.stock_level("drill", LOCATION).await.unwrap();
    assert_eq!(level.quantity_reserved, 0);
}

#[tokio::test]
async fn test_unknown_counterparty_and_location() {
    let db = memory_db().await;
    add_rentable(&db, "drill", 10).await;
    let processor = processor(&db);

    let mut req = rental(vec![LineRequest::new("drill", 1, 1000)]);
    req.customer_id = "nobody".into();
    let failure = processor.create_rental(req).await.unwrap_err();
    assert_eq!(failure.state, ProcessingState::ValidationFailed);
    assert!(matches!(
        failure.error,
        TransactionError::NotFound { ref entity, ref id } if entity == "Customer" && id == "nobody"
    ));

    // a customer id is not a supplier id
    let mut req = purchase(vec![LineRequest::new("drill", 1, 1000).with_condition("A")]);
    req.supplier_id = CUSTOMER.into();
    let failure = processor.create_purchase(req).await.unwrap_err();
    assert_eq!(failure.status_code(), 404);

    let mut req = rental(vec![LineRequest::new("drill", 1, 1000)]);
    req.location_id = "loc-elsewhere".into();
    let failure = processor.create_rental(req).await.unwrap_err();
    assert!(matches!(failure.error, TransactionError::NotFound { ref entity, .. } if entity == "Location"));
}

#[tokio::test]
async fn test_request_level_rules() {
    let db = memory_db().await;
    add_rentable(&db, "drill", 10).await;
    let processor = processor(&db);

    let failure = processor.create_rental(rental(vec![])).await.unwrap_err();
    assert!(matches!(failure.error, TransactionError::InvalidRequest(_)));

    let mut req = rental(vec![LineRequest::new("drill", 1, 1000)]);
    req.expected_return_date = chrono::NaiveDate::from_ymd_opt(2026, 1, 1);
    let failure = processor.create_rental(req).await.unwrap_err();
    assert_eq!(failure.kind(), ErrorKind::Validation);

    let too_many = (0..=settings().max_lines)
        .map(|_| LineRequest::new("drill", 1, 1))
        .collect();
    let failure = processor.create_rental(rental(too_many)).await.unwrap_err();
    assert!(matches!(failure.error, TransactionError::InvalidRequest(_)));

    assert_eq!(processor.metrics().snapshot().rejected, 3);
}

// =============================================================================
// Atomicity
// =============================================================================

#[tokio::test]
async fn test_failure_inside_the_write_rolls_everything_back() {
    let db = memory_db().await;
    add_rentable(&db, "drill", 10).await;
    let processor = processor(&db);

    sqlx::query(
        "CREATE TRIGGER fail_lines BEFORE INSERT ON transaction_lines \
         BEGIN SELECT RAISE(ABORT, 'forced failure'); END",
    )
    .execute(db.pool())
    .await
    .unwrap();

    let failure = processor
        .create_rental(rental(vec![LineRequest::new("drill", 4, 1000)]))
        .await
        .unwrap_err();
    assert_eq!(failure.state, ProcessingState::WriteFailed);
    assert_eq!(failure.kind(), ErrorKind::Persistence);

    assert_eq!(db.transactions().count().await.unwrap(), 0);
    let level = processor.stock_level("drill", LOCATION).await.unwrap();
    assert_eq!(level.quantity_reserved, 0);
    assert_eq!(level.version, 1);

    sqlx::query("DROP TRIGGER fail_lines")
        .execute(db.pool())
        .await
        .unwrap();

    // the number counter rolled back too
    let committed = processor
        .create_rental(rental(vec![LineRequest::new("drill", 4, 1000)]))
        .await
        .unwrap();
    assert_eq!(committed.transaction_number(), "REN-20260115-0001");
    assert_eq!(processor.metrics().snapshot().write_failures, 1);
}

// =============================================================================
// Numbering and read-back
// =============================================================================

#[tokio::test]
async fn test_numbers_are_sequential_per_kind_and_date() {
    let db = memory_db().await;
    add_rentable(&db, "drill", 10).await;
    let processor = processor(&db);

    for _ in 0..3 {
        processor
            .create_rental(rental(vec![LineRequest::new("drill", 1, 1000)]))
            .await
            .unwrap();
    }
    let purchased = processor
        .create_purchase(purchase(vec![
            LineRequest::new("drill", 1, 1000).with_condition("A")
        ]))
        .await
        .unwrap();
    assert_eq!(purchased.transaction_number(), "PUR-20260115-0001");

    let listed = processor
        .list_transactions(TransactionKind::Rental, date())
        .await
        .unwrap();
    let numbers: Vec<&str> = listed.iter().map(|h| h.transaction_number.as_str()).collect();
    assert_eq!(
        numbers,
        vec!["REN-20260115-0001", "REN-20260115-0002", "REN-20260115-0003"]
    );

    let by_id = processor.get_transaction(&listed[1].id).await.unwrap();
    assert_eq!(by_id.header.transaction_number, "REN-20260115-0002");
}

#[tokio::test]
async fn test_taken_number_is_skipped() {
    let db = memory_db().await;
    add_rentable(&db, "drill", 10).await;
    let processor = processor(&db);

    // imported history already holds the number the counter will hand out
    sqlx::query(
        "INSERT INTO transactions (id, transaction_number, kind, status, location_id, \
         customer_id, transaction_date, rental_status, created_at, updated_at) \
         VALUES ('legacy-1', 'REN-20260115-0001', 'rental', 'in_progress', ?1, ?2, \
         '2026-01-15', 'reserved', '2026-01-15T00:00:00Z', '2026-01-15T00:00:00Z')",
    )
    .bind(LOCATION)
    .bind(CUSTOMER)
    .execute(db.pool())
    .await
    .unwrap();

    let committed = processor
        .create_rental(rental(vec![LineRequest::new("drill", 1, 1000)]))
        .await
        .unwrap();
    assert_eq!(committed.transaction_number(), "REN-20260115-0002");
    assert_eq!(committed.number_retries, 1);
    assert_eq!(processor.metrics().snapshot().number_retries, 1);
}

#[tokio::test]
async fn test_missing_transaction_is_not_found() {
    let db = memory_db().await;
    let processor = processor(&db);

    let err = processor.get_by_number("REN-20260115-0042").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = processor.get_by_number("drill-01").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(err.status_code(), 400);

    let level = processor.stock_level("never-stocked", LOCATION).await.unwrap();
    assert_eq!(level.available(), 0);
}

// =============================================================================
// Cost of validation
// =============================================================================

#[tokio::test]
async fn test_validation_reads_do_not_grow_with_line_count() {
    let db = memory_db().await;
    let ids: Vec<String> = (0..25).map(|i| format!("item-{:02}", i)).collect();
    for id in &ids {
        add_rentable(&db, id, 3).await;
    }
    let processor = processor(&db);

    processor
        .create_rental(rental(vec![LineRequest::new("item-00", 1, 100)]))
        .await
        .unwrap();
    let after_one = processor.metrics().snapshot().storage_reads;

    let lines = ids.iter().map(|id| LineRequest::new(id, 1, 100)).collect();
    processor.create_rental(rental(lines)).await.unwrap();
    let after_many = processor.metrics().snapshot().storage_reads;

    assert_eq!(after_many - after_one, after_one);
}
