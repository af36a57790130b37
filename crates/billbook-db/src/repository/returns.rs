//! # Return Repository
//!
//! Sales and purchase returns, line items as a JSON column.

use billbook_core::{InvoiceItem, Money, Return, ReturnStatus, ReturnType, TaxRate};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::SqlitePool;
use tracing::debug;

use super::EntityStore;
use crate::error::DbResult;

#[derive(Debug, sqlx::FromRow)]
struct ReturnRow {
    id: String,
    return_number: String,
    return_type: ReturnType,
    party_id: String,
    invoice_id: Option<String>,
    invoice_number: Option<String>,
    date: NaiveDate,
    items: Json<Vec<InvoiceItem>>,
    subtotal_cents: i64,
    gst_rate_bps: i64,
    gst_amount_cents: i64,
    total_cents: i64,
    status: ReturnStatus,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ReturnRow> for Return {
    fn from(row: ReturnRow) -> Self {
        Return {
            id: row.id,
            return_number: row.return_number,
            return_type: row.return_type,
            party_id: row.party_id,
            invoice_id: row.invoice_id,
            invoice_number: row.invoice_number,
            date: row.date,
            items: row.items.0,
            subtotal: Money::from_cents(row.subtotal_cents),
            gst_rate: TaxRate::from_bps(row.gst_rate_bps as u32),
            gst_amount: Money::from_cents(row.gst_amount_cents),
            total: Money::from_cents(row.total_cents),
            status: row.status,
            notes: row.notes,
            created_at: row.created_at,
        }
    }
}

const SELECT_RETURN: &str = r#"
    SELECT
        id, return_number, return_type, party_id, invoice_id, invoice_number,
        date, items, subtotal_cents, gst_rate_bps, gst_amount_cents,
        total_cents, status, notes, created_at
    FROM returns
"#;

#[derive(Debug, Clone)]
pub struct ReturnRepository {
    pool: SqlitePool,
}

impl ReturnRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReturnRepository { pool }
    }

    /// Every return number that starts with `prefix` (e.g. `RET-2603-`).
    pub async fn numbers_with_prefix(&self, prefix: &str) -> DbResult<Vec<String>> {
        let numbers: Vec<String> =
            sqlx::query_scalar("SELECT return_number FROM returns WHERE return_number LIKE ?1 || '%'")
                .bind(prefix)
                .fetch_all(&self.pool)
                .await?;

        Ok(numbers)
    }
}

impl EntityStore for ReturnRepository {
    type Entity = Return;

    const ENTITY: &'static str = "Return";

    async fn list(&self) -> DbResult<Vec<Return>> {
        let rows: Vec<ReturnRow> = sqlx::query_as(&format!("{SELECT_RETURN} ORDER BY rowid"))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Return::from).collect())
    }

    async fn get_by_id(&self, id: &str) -> DbResult<Option<Return>> {
        let row: Option<ReturnRow> = sqlx::query_as(&format!("{SELECT_RETURN} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Return::from))
    }

    async fn put(&self, ret: &Return) -> DbResult<()> {
        debug!(
            id = %ret.id,
            number = %ret.return_number,
            status = %ret.status,
            "Writing return"
        );

        let items = serde_json::to_string(&ret.items)?;

        sqlx::query(
            r#"
            INSERT INTO returns (
                id, return_number, return_type, party_id, invoice_id, invoice_number,
                date, items, subtotal_cents, gst_rate_bps, gst_amount_cents,
                total_cents, status, notes, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            ON CONFLICT(id) DO UPDATE SET
                return_number = excluded.return_number,
                return_type = excluded.return_type,
                party_id = excluded.party_id,
                invoice_id = excluded.invoice_id,
                invoice_number = excluded.invoice_number,
                date = excluded.date,
                items = excluded.items,
                subtotal_cents = excluded.subtotal_cents,
                gst_rate_bps = excluded.gst_rate_bps,
                gst_amount_cents = excluded.gst_amount_cents,
                total_cents = excluded.total_cents,
                status = excluded.status,
                notes = excluded.notes
            "#,
        )
        .bind(&ret.id)
        .bind(&ret.return_number)
        .bind(ret.return_type)
        .bind(&ret.party_id)
        .bind(&ret.invoice_id)
        .bind(&ret.invoice_number)
        .bind(ret.date)
        .bind(items)
        .bind(ret.subtotal.cents())
        .bind(i64::from(ret.gst_rate.bps()))
        .bind(ret.gst_amount.cents())
        .bind(ret.total.cents())
        .bind(ret.status)
        .bind(&ret.notes)
        .bind(ret.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn remove(&self, id: &str) -> DbResult<bool> {
        debug!(id = %id, "Removing return");

        let result = sqlx::query("DELETE FROM returns WHERE id = ?1")
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

    #[tokio::test]
    async fn test_status_change_round_trip() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.returns();
        let mut ret = Return {
            id: uuid::Uuid::new_v4().to_string(),
            return_number: "RET-2603-001".to_string(),
            return_type: ReturnType::Purchase,
            party_id: "s1".to_string(),
            invoice_id: Some("inv-1".to_string()),
            invoice_number: Some("INV-2603-004".to_string()),
            date: NaiveDate::from_ymd_opt(2026, 3, 20).unwrap(),
            items: vec![InvoiceItem::new(Some("p-1".to_string()), "Widget", 3, Money::from_cents(700))],
            subtotal: Money::from_cents(2100),
            gst_rate: TaxRate::from_bps(1200),
            gst_amount: Money::from_cents(252),
            total: Money::from_cents(2352),
            status: ReturnStatus::Pending,
            notes: Some("damaged in transit".to_string()),
            created_at: Utc::now(),
        };
        repo.put(&ret).await.unwrap();

        ret.status = ReturnStatus::Processed;
        repo.put(&ret).await.unwrap();

        let loaded = repo.get_by_id(&ret.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, ReturnStatus::Processed);
        assert_eq!(loaded.return_type, ReturnType::Purchase);
        assert_eq!(loaded.items, ret.items);
        assert_eq!(loaded.gst_rate.bps(), 1200);
        assert_eq!(repo.numbers_with_prefix("RET-2603-").await.unwrap(), vec!["RET-2603-001"]);
    }
}
