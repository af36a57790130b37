//! # Transaction Repository
//!
//! Payments and receipts. Rows are written once and never updated by the
//! service.

use billbook_core::{Money, PaymentMode, Transaction, TransactionType};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use super::EntityStore;
use crate::error::DbResult;

#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: String,
    transaction_type: TransactionType,
    party_id: String,
    amount_cents: i64,
    date: NaiveDate,
    mode: PaymentMode,
    reference: Option<String>,
    description: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<TransactionRow> for Transaction {
    fn from(row: TransactionRow) -> Self {
        Transaction {
            id: row.id,
            transaction_type: row.transaction_type,
            party_id: row.party_id,
            amount: Money::from_cents(row.amount_cents),
            date: row.date,
            mode: row.mode,
            reference: row.reference,
            description: row.description,
            created_at: row.created_at,
        }
    }
}

const SELECT_TRANSACTION: &str = r#"
    SELECT
        id, transaction_type, party_id, amount_cents, date, mode,
        reference, description, created_at
    FROM transactions
"#;

#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    /// One party's transactions in insertion order.
    pub async fn list_for_party(&self, party_id: &str) -> DbResult<Vec<Transaction>> {
        let rows: Vec<TransactionRow> =
            sqlx::query_as(&format!("{SELECT_TRANSACTION} WHERE party_id = ?1 ORDER BY rowid"))
                .bind(party_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(Transaction::from).collect())
    }
}

impl EntityStore for TransactionRepository {
    type Entity = Transaction;

    const ENTITY: &'static str = "Transaction";

    async fn list(&self) -> DbResult<Vec<Transaction>> {
        let rows: Vec<TransactionRow> = sqlx::query_as(&format!("{SELECT_TRANSACTION} ORDER BY rowid"))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Transaction::from).collect())
    }

    async fn get_by_id(&self, id: &str) -> DbResult<Option<Transaction>> {
        let row: Option<TransactionRow> = sqlx::query_as(&format!("{SELECT_TRANSACTION} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Transaction::from))
    }

    async fn put(&self, transaction: &Transaction) -> DbResult<()> {
        debug!(
            id = %transaction.id,
            party_id = %transaction.party_id,
            amount = %transaction.amount,
            "Writing transaction"
        );

        sqlx::query(
            r#"
            INSERT INTO transactions (
                id, transaction_type, party_id, amount_cents, date, mode,
                reference, description, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(id) DO UPDATE SET
                transaction_type = excluded.transaction_type,
                party_id = excluded.party_id,
                amount_cents = excluded.amount_cents,
                date = excluded.date,
                mode = excluded.mode,
                reference = excluded.reference,
                description = excluded.description
            "#,
        )
        .bind(&transaction.id)
        .bind(transaction.transaction_type)
        .bind(&transaction.party_id)
        .bind(transaction.amount.cents())
        .bind(transaction.date)
        .bind(transaction.mode)
        .bind(&transaction.reference)
        .bind(&transaction.description)
        .bind(transaction.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn remove(&self, id: &str) -> DbResult<bool> {
        debug!(id = %id, "Removing transaction");

        let result = sqlx::query("DELETE FROM transactions WHERE id = ?1")
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
    async fn test_round_trip_and_party_filter() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.transactions();
        let receipt = Transaction {
            id: uuid::Uuid::new_v4().to_string(),
            transaction_type: TransactionType::Receipt,
            party_id: "c1".to_string(),
            amount: Money::from_cents(25_000),
            date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            mode: PaymentMode::BankTransfer,
            reference: Some("UTR 88123".to_string()),
            description: None,
            created_at: Utc::now(),
        };

        repo.put(&receipt).await.unwrap();

        let loaded = repo.get_by_id(&receipt.id).await.unwrap().unwrap();
        assert_eq!(loaded.mode, PaymentMode::BankTransfer);
        assert_eq!(loaded.amount, Money::from_cents(25_000));
        assert_eq!(repo.list_for_party("c1").await.unwrap().len(), 1);
        assert!(repo.list_for_party("c2").await.unwrap().is_empty());

        assert!(repo.remove(&receipt.id).await.unwrap());
        assert!(repo.list().await.unwrap().is_empty());
    }
}
