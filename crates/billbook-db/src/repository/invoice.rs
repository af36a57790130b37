//! # Invoice Repository
//!
//! Invoices with their line items stored as a JSON column.
//!
//! ## Row Layout
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │ invoices                                                            │
//! │  id | invoice_number | party_id | date | items (JSON) | *_cents ... │
//! │                                                                      │
//! │  items = [{"id":..,"product_id":..,"qty":2,"rate":5000,..}, ...]    │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//! Line items are always read and written with their invoice, so they live
//! in the same row.

use billbook_core::{Invoice, InvoiceItem, InvoiceStatus, Money, TaxRate};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::SqlitePool;
use tracing::debug;

use super::EntityStore;
use crate::error::DbResult;

#[derive(Debug, sqlx::FromRow)]
struct InvoiceRow {
    id: String,
    invoice_number: String,
    party_id: String,
    date: NaiveDate,
    items: Json<Vec<InvoiceItem>>,
    subtotal_cents: i64,
    gst_rate_bps: i64,
    gst_amount_cents: i64,
    discount_cents: i64,
    total_cents: i64,
    paid_amount_cents: i64,
    status: InvoiceStatus,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<InvoiceRow> for Invoice {
    fn from(row: InvoiceRow) -> Self {
        Invoice {
            id: row.id,
            invoice_number: row.invoice_number,
            party_id: row.party_id,
            date: row.date,
            items: row.items.0,
            subtotal: Money::from_cents(row.subtotal_cents),
            gst_rate: TaxRate::from_bps(row.gst_rate_bps as u32),
            gst_amount: Money::from_cents(row.gst_amount_cents),
            discount: Money::from_cents(row.discount_cents),
            total: Money::from_cents(row.total_cents),
            paid_amount: Money::from_cents(row.paid_amount_cents),
            status: row.status,
            notes: row.notes,
            created_at: row.created_at,
        }
    }
}

const SELECT_INVOICE: &str = r#"
    SELECT
        id, invoice_number, party_id, date, items,
        subtotal_cents, gst_rate_bps, gst_amount_cents, discount_cents,
        total_cents, paid_amount_cents, status, notes, created_at
    FROM invoices
"#;

/// Repository for invoices.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    /// One party's invoices in insertion order.
    pub async fn list_for_party(&self, party_id: &str) -> DbResult<Vec<Invoice>> {
        let rows: Vec<InvoiceRow> =
            sqlx::query_as(&format!("{SELECT_INVOICE} WHERE party_id = ?1 ORDER BY rowid"))
                .bind(party_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(Invoice::from).collect())
    }

    /// Every invoice number that starts with `prefix` (e.g. `INV-2603-`).
    pub async fn numbers_with_prefix(&self, prefix: &str) -> DbResult<Vec<String>> {
        let numbers: Vec<String> =
            sqlx::query_scalar("SELECT invoice_number FROM invoices WHERE invoice_number LIKE ?1 || '%'")
                .bind(prefix)
                .fetch_all(&self.pool)
                .await?;

        Ok(numbers)
    }
}

impl EntityStore for InvoiceRepository {
    type Entity = Invoice;

    const ENTITY: &'static str = "Invoice";

    async fn list(&self) -> DbResult<Vec<Invoice>> {
        let rows: Vec<InvoiceRow> = sqlx::query_as(&format!("{SELECT_INVOICE} ORDER BY rowid"))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Invoice::from).collect())
    }

    async fn get_by_id(&self, id: &str) -> DbResult<Option<Invoice>> {
        let row: Option<InvoiceRow> = sqlx::query_as(&format!("{SELECT_INVOICE} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Invoice::from))
    }

    async fn put(&self, invoice: &Invoice) -> DbResult<()> {
        debug!(
            id = %invoice.id,
            number = %invoice.invoice_number,
            status = %invoice.status,
            paid = %invoice.paid_amount,
            "Writing invoice"
        );

        let items = serde_json::to_string(&invoice.items)?;

        sqlx::query(
            r#"
            INSERT INTO invoices (
                id, invoice_number, party_id, date, items,
                subtotal_cents, gst_rate_bps, gst_amount_cents, discount_cents,
                total_cents, paid_amount_cents, status, notes, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            ON CONFLICT(id) DO UPDATE SET
                invoice_number = excluded.invoice_number,
                party_id = excluded.party_id,
                date = excluded.date,
                items = excluded.items,
                subtotal_cents = excluded.subtotal_cents,
                gst_rate_bps = excluded.gst_rate_bps,
                gst_amount_cents = excluded.gst_amount_cents,
                discount_cents = excluded.discount_cents,
                total_cents = excluded.total_cents,
                paid_amount_cents = excluded.paid_amount_cents,
                status = excluded.status,
                notes = excluded.notes
            "#,
        )
        .bind(&invoice.id)
        .bind(&invoice.invoice_number)
        .bind(&invoice.party_id)
        .bind(invoice.date)
        .bind(items)
        .bind(invoice.subtotal.cents())
        .bind(i64::from(invoice.gst_rate.bps()))
        .bind(invoice.gst_amount.cents())
        .bind(invoice.discount.cents())
        .bind(invoice.total.cents())
        .bind(invoice.paid_amount.cents())
        .bind(invoice.status)
        .bind(&invoice.notes)
        .bind(invoice.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn remove(&self, id: &str) -> DbResult<bool> {
        debug!(id = %id, "Removing invoice");

        let result = sqlx::query("DELETE FROM invoices WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::{Database, DbConfig};

    fn invoice(number: &str, party_id: &str, total: i64) -> Invoice {
        let items = vec![
            InvoiceItem::new(Some("p-1".to_string()), "Widget", 2, Money::from_cents(total / 2)),
        ];
        Invoice {
            id: uuid::Uuid::new_v4().to_string(),
            invoice_number: number.to_string(),
            party_id: party_id.to_string(),
            date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
            items,
            subtotal: Money::from_cents(total),
            gst_rate: TaxRate::zero(),
            gst_amount: Money::zero(),
            discount: Money::zero(),
            total: Money::from_cents(total),
            paid_amount: Money::zero(),
            status: InvoiceStatus::Unpaid,
            notes: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_items_survive_round_trip() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.invoices();
        let original = invoice("INV-2603-001", "c1", 1000);

        repo.put(&original).await.unwrap();
        let loaded = repo.get_by_id(&original.id).await.unwrap().unwrap();

        assert_eq!(loaded.items, original.items);
        assert_eq!(loaded.date, original.date);
        assert_eq!(loaded.total, original.total);
        assert_eq!(loaded.status, InvoiceStatus::Unpaid);
    }

    #[tokio::test]
    async fn test_overwrite_updates_payment_state() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.invoices();
        let mut inv = invoice("INV-2603-001", "c1", 1000);
        repo.put(&inv).await.unwrap();

        inv.paid_amount = Money::from_cents(1000);
        inv.status = InvoiceStatus::Paid;
        repo.put(&inv).await.unwrap();

        let loaded = repo.get_by_id(&inv.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, InvoiceStatus::Paid);
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_number_is_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.invoices();
        repo.put(&invoice("INV-2603-001", "c1", 1000)).await.unwrap();

        let err = repo.put(&invoice("INV-2603-001", "c2", 500)).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_party_filter_and_prefix_lookup() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.invoices();
        repo.put(&invoice("INV-2603-001", "c1", 100)).await.unwrap();
        repo.put(&invoice("INV-2603-002", "c2", 200)).await.unwrap();
        repo.put(&invoice("INV-2604-001", "c1", 300)).await.unwrap();

        let for_c1 = repo.list_for_party("c1").await.unwrap();
        assert_eq!(for_c1.len(), 2);
        assert_eq!(for_c1[0].invoice_number, "INV-2603-001");

        let march = repo.numbers_with_prefix("INV-2603-").await.unwrap();
        assert_eq!(march.len(), 2);
    }
}
