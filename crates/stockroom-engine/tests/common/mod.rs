//! Fixtures shared by the engine integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::time::Duration;

use chrono::NaiveDate;
use stockroom_core::{
    Counterparty, Item, ItemStatus, LineRequest, Location, PurchaseRequest, RentalRequest,
};
use stockroom_db::{Database, DbConfig};
use stockroom_engine::{ProcessingSettings, TransactionProcessor};

pub const LOCATION: &str = "loc-main";
pub const CUSTOMER: &str = "cust-dana";
pub const SUPPLIER: &str = "sup-acme";

pub fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()
}

pub fn settings() -> ProcessingSettings {
    ProcessingSettings {
        max_lines: 100,
        request_timeout_ms: 10_000,
    }
}

/// Single-connection in-memory database with master data and no stock.
pub async fn memory_db() -> Database {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    seed_master_data(&db).await;
    db
}

/// File-backed database with several pooled connections, for tests where
/// requests really overlap.
pub async fn file_db(dir: &Path) -> Database {
    let config = DbConfig::new(dir.join("stockroom.db"))
        .max_connections(8)
        .busy_timeout(Duration::from_secs(10));
    let db = Database::new(config).await.unwrap();
    seed_master_data(&db).await;
    db
}

pub async fn seed_master_data(db: &Database) {
    db.locations()
        .insert(&Location {
            id: LOCATION.into(),
            name: "Main Yard".into(),
        })
        .await
        .unwrap();
    db.customers()
        .insert(&Counterparty {
            id: CUSTOMER.into(),
            name: "Dana Builders".into(),
        })
        .await
        .unwrap();
    db.suppliers()
        .insert(&Counterparty {
            id: SUPPLIER.into(),
            name: "Acme Supply".into(),
        })
        .await
        .unwrap();
}

pub async fn add_rentable(db: &Database, id: &str, on_hand: i64) {
    add_item(db, id, true, ItemStatus::Active).await;
    db.stock().set_level(id, LOCATION, on_hand, 0).await.unwrap();
}

pub async fn add_item(db: &Database, id: &str, rentable: bool, status: ItemStatus) {
    db.items()
        .insert(&Item {
            id: id.into(),
            name: id.into(),
            is_rentable: rentable,
            is_saleable: !rentable,
            status,
        })
        .await
        .unwrap();
}

pub fn processor(db: &Database) -> TransactionProcessor {
    TransactionProcessor::new(db.clone(), settings())
}

pub fn rental(items: Vec<LineRequest>) -> RentalRequest {
    RentalRequest {
        customer_id: CUSTOMER.into(),
        location_id: LOCATION.into(),
        transaction_date: date(),
        items,
        expected_return_date: NaiveDate::from_ymd_opt(2026, 1, 22),
        paid_amount_cents: None,
        notes: None,
    }
}

pub fn purchase(items: Vec<LineRequest>) -> PurchaseRequest {
    PurchaseRequest {
        supplier_id: SUPPLIER.into(),
        location_id: LOCATION.into(),
        transaction_date: date(),
        items,
        paid_amount_cents: None,
        notes: None,
    }
}
