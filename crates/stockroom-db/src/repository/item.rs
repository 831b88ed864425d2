//! # Item Repository
//!
//! Catalog reads for the engine plus the inserts the seeding side uses.
//!
//! ## Bulk Lookup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Request lines: drill, saw, drill, bolt, saw                           │
//! │       │                                                                 │
//! │       ▼  distinct ids                                                   │
//! │  {bolt, drill, saw}                                                     │
//! │       │                                                                 │
//! │       ▼  ONE round trip                                                 │
//! │  SELECT ... FROM items WHERE id IN (?, ?, ?)                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  HashMap<id, Item>   (missing ids are simply absent)                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::{BTreeSet, HashMap};

use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use stockroom_core::Item;

/// Repository for catalog items.
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    /// Creates a new ItemRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    /// Gets an item by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Item>> {
        let item = sqlx::query_as::<_, Item>(
            r#"
            SELECT id, name, is_rentable, is_saleable, status
            FROM items
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    /// Resolves a set of item ids in one query.
    ///
    /// Duplicates in `ids` are collapsed; unknown ids are absent from the
    /// returned map.
    pub async fn find_many<'a, I>(&self, ids: I) -> DbResult<HashMap<String, Item>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let ids: BTreeSet<&str> = ids.into_iter().collect();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT id, name, is_rentable, is_saleable, status FROM items WHERE id IN (",
        );
        let mut separated = qb.separated(", ");
        for id in &ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let items: Vec<Item> = qb.build_query_as().fetch_all(&self.pool).await?;

        debug!(requested = ids.len(), found = items.len(), "Bulk item lookup");
        Ok(items.into_iter().map(|i| (i.id.clone(), i)).collect())
    }

    /// Inserts a catalog item.
    pub async fn insert(&self, item: &Item) -> DbResult<()> {
        debug!(id = %item.id, name = %item.name, "Inserting item");

        sqlx::query(
            r#"
            INSERT INTO items (id, name, is_rentable, is_saleable, status)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&item.id)
        .bind(&item.name)
        .bind(item.is_rentable)
        .bind(item.is_saleable)
        .bind(item.status)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use stockroom_core::ItemStatus;

    fn item(id: &str, rentable: bool) -> Item {
        Item {
            id: id.to_string(),
            name: format!("{id} name"),
            is_rentable: rentable,
            is_saleable: !rentable,
            status: ItemStatus::Active,
        }
    }

    #[tokio::test]
    async fn test_find_many_collapses_and_skips_unknown() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.items();
        repo.insert(&item("drill", true)).await.unwrap();
        repo.insert(&item("bolt", false)).await.unwrap();

        let found = repo
            .find_many(["drill", "ghost", "drill", "bolt"])
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
        assert!(found["drill"].is_rentable);
        assert!(!found.contains_key("ghost"));

        assert!(repo.find_many(std::iter::empty()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_by_id_round_trips_status() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut retired = item("old-saw", true);
        retired.status = ItemStatus::Discontinued;
        db.items().insert(&retired).await.unwrap();

        let fetched = db.items().get_by_id("old-saw").await.unwrap().unwrap();
        assert_eq!(fetched, retired);
        assert!(db.items().get_by_id("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rentable_and_saleable_are_exclusive() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut both = item("hybrid", true);
        both.is_saleable = true;

        let err = db.items().insert(&both).await.unwrap_err();
        assert!(matches!(err, crate::DbError::CheckViolation { .. }));
    }
}
