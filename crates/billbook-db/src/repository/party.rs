//! # Party Repository
//!
//! Customers and suppliers.

use billbook_core::{Party, PartyType};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use super::EntityStore;
use crate::error::DbResult;

#[derive(Debug, sqlx::FromRow)]
struct PartyRow {
    id: String,
    name: String,
    party_type: PartyType,
    mobile: String,
    address: String,
    tax_id: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<PartyRow> for Party {
    fn from(row: PartyRow) -> Self {
        Party {
            id: row.id,
            name: row.name,
            party_type: row.party_type,
            mobile: row.mobile,
            address: row.address,
            tax_id: row.tax_id,
            created_at: row.created_at,
        }
    }
}

const SELECT_PARTY: &str = r#"
    SELECT id, name, party_type, mobile, address, tax_id, created_at
    FROM parties
"#;

/// Repository for parties.
#[derive(Debug, Clone)]
pub struct PartyRepository {
    pool: SqlitePool,
}

impl PartyRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PartyRepository { pool }
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM parties")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

impl EntityStore for PartyRepository {
    type Entity = Party;

    const ENTITY: &'static str = "Party";

    async fn list(&self) -> DbResult<Vec<Party>> {
        let rows: Vec<PartyRow> = sqlx::query_as(&format!("{SELECT_PARTY} ORDER BY rowid"))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Party::from).collect())
    }

    async fn get_by_id(&self, id: &str) -> DbResult<Option<Party>> {
        let row: Option<PartyRow> = sqlx::query_as(&format!("{SELECT_PARTY} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Party::from))
    }

    async fn put(&self, party: &Party) -> DbResult<()> {
        debug!(id = %party.id, name = %party.name, "Writing party");

        sqlx::query(
            r#"
            INSERT INTO parties (id, name, party_type, mobile, address, tax_id, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                party_type = excluded.party_type,
                mobile = excluded.mobile,
                address = excluded.address,
                tax_id = excluded.tax_id
            "#,
        )
        .bind(&party.id)
        .bind(&party.name)
        .bind(party.party_type)
        .bind(&party.mobile)
        .bind(&party.address)
        .bind(&party.tax_id)
        .bind(party.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn remove(&self, id: &str) -> DbResult<bool> {
        debug!(id = %id, "Removing party");

        let result = sqlx::query("DELETE FROM parties WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    fn party(name: &str, party_type: PartyType) -> Party {
        Party {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            party_type,
            mobile: "9800000000".to_string(),
            address: "Market Road".to_string(),
            tax_id: Some("27ABCDE1234F1Z5".to_string()),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_put_get_remove() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.parties();
        let sharma = party("Sharma Traders", PartyType::Supplier);

        repo.put(&sharma).await.unwrap();
        let loaded = repo.get_by_id(&sharma.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Sharma Traders");
        assert_eq!(loaded.party_type, PartyType::Supplier);
        assert_eq!(loaded.tax_id, sharma.tax_id);

        assert!(repo.remove(&sharma.id).await.unwrap());
        assert!(repo.get_by_id(&sharma.id).await.unwrap().is_none());
        assert!(!repo.remove(&sharma.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_overwrite_keeps_list_position() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.parties();
        let mut first = party("Asha", PartyType::Customer);
        let second = party("Bala", PartyType::Customer);

        repo.put(&first).await.unwrap();
        repo.put(&second).await.unwrap();
        first.name = "Asha Stores".to_string();
        repo.put(&first).await.unwrap();

        let names: Vec<String> = repo.list().await.unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["Asha Stores", "Bala"]);
        assert_eq!(repo.count().await.unwrap(), 2);
    }
}
