//! Customers, suppliers and locations.
//!
//! The engine only asks "does this id exist?"; inserts are for the seeding
//! side and tests.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use stockroom_core::{Counterparty, CounterpartyRole, Location};

fn table_for(role: CounterpartyRole) -> &'static str {
    match role {
        CounterpartyRole::Customer => "customers",
        CounterpartyRole::Supplier => "suppliers",
    }
}

/// Repository for customers or suppliers, chosen by role.
#[derive(Debug, Clone)]
pub struct CounterpartyRepository {
    pool: SqlitePool,
    role: CounterpartyRole,
}

impl CounterpartyRepository {
    pub fn new(pool: SqlitePool, role: CounterpartyRole) -> Self {
        CounterpartyRepository { pool, role }
    }

    pub fn role(&self) -> CounterpartyRole {
        self.role
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Counterparty>> {
        let sql = format!("SELECT id, name FROM {} WHERE id = ?1", table_for(self.role));
        let party = sqlx::query_as::<_, Counterparty>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(party)
    }

    pub async fn exists(&self, id: &str) -> DbResult<bool> {
        let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1)", table_for(self.role));
        let found: i64 = sqlx::query_scalar(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(found != 0)
    }

    pub async fn insert(&self, party: &Counterparty) -> DbResult<()> {
        debug!(role = self.role.as_str(), id = %party.id, "Inserting counterparty");

        let sql = format!("INSERT INTO {} (id, name) VALUES (?1, ?2)", table_for(self.role));
        sqlx::query(&sql)
            .bind(&party.id)
            .bind(&party.name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// Repository for stock locations.
#[derive(Debug, Clone)]
pub struct LocationRepository {
    pool: SqlitePool,
}

impl LocationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        LocationRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Location>> {
        let location = sqlx::query_as::<_, Location>("SELECT id, name FROM locations WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(location)
    }

    pub async fn exists(&self, id: &str) -> DbResult<bool> {
        let found: i64 = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM locations WHERE id = ?1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(found != 0)
    }

    pub async fn insert(&self, location: &Location) -> DbResult<()> {
        debug!(id = %location.id, "Inserting location");

        sqlx::query("INSERT INTO locations (id, name) VALUES (?1, ?2)")
            .bind(&location.id)
            .bind(&location.name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};
    use stockroom_core::{Counterparty, CounterpartyRole, Location};

    #[tokio::test]
    async fn test_roles_use_separate_tables() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let acme = Counterparty {
            id: "acme".into(),
            name: "Acme Supply".into(),
        };
        db.suppliers().insert(&acme).await.unwrap();

        assert!(db.suppliers().exists("acme").await.unwrap());
        assert!(!db.customers().exists("acme").await.unwrap());
        assert_eq!(
            db.counterparties(CounterpartyRole::Supplier)
                .get_by_id("acme")
                .await
                .unwrap(),
            Some(acme)
        );
    }

    #[tokio::test]
    async fn test_location_exists() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.locations()
            .insert(&Location {
                id: "loc-1".into(),
                name: "Main Store".into(),
            })
            .await
            .unwrap();

        assert!(db.locations().exists("loc-1").await.unwrap());
        assert!(!db.locations().exists("loc-2").await.unwrap());
        assert_eq!(
            db.locations().get_by_id("loc-1").await.unwrap().map(|l| l.name),
            Some("Main Store".to_string())
        );
    }
}
