//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Stock Writes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  The stock engine computes the new absolute quantity; this repository  │
//! │  only stores it.                                                       │
//! │                                                                         │
//! │  stock::apply_invoice(products, invoice) ──► StockUpdate { products }  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  for product in update.products: repo.put(product)                     │
//! │     UPDATE products SET stock = 8 WHERE id = ?                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use billbook_core::{Money, Product};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use super::EntityStore;
use crate::error::DbResult;

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: String,
    name: String,
    price_cents: i64,
    cost_price_cents: i64,
    stock: i64,
    opening_stock: i64,
    low_stock_alert: Option<i64>,
    unit: String,
    created_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            price: Money::from_cents(row.price_cents),
            cost_price: Money::from_cents(row.cost_price_cents),
            stock: row.stock,
            opening_stock: row.opening_stock,
            low_stock_alert: row.low_stock_alert,
            unit: row.unit,
            created_at: row.created_at,
        }
    }
}

const SELECT_PRODUCT: &str = r#"
    SELECT
        id, name, price_cents, cost_price_cents, stock, opening_stock,
        low_stock_alert, unit, created_at
    FROM products
"#;

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Counts products (for diagnostics and the seed binary).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

impl EntityStore for ProductRepository {
    type Entity = Product;

    const ENTITY: &'static str = "Product";

    async fn list(&self) -> DbResult<Vec<Product>> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!("{SELECT_PRODUCT} ORDER BY rowid"))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let row: Option<ProductRow> = sqlx::query_as(&format!("{SELECT_PRODUCT} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Product::from))
    }

    async fn put(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, stock = product.stock, "Writing product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, price_cents, cost_price_cents, stock, opening_stock,
                low_stock_alert, unit, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                price_cents = excluded.price_cents,
                cost_price_cents = excluded.cost_price_cents,
                stock = excluded.stock,
                opening_stock = excluded.opening_stock,
                low_stock_alert = excluded.low_stock_alert,
                unit = excluded.unit
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.price.cents())
        .bind(product.cost_price.cents())
        .bind(product.stock)
        .bind(product.opening_stock)
        .bind(product.low_stock_alert)
        .bind(&product.unit)
        .bind(product.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn remove(&self, id: &str) -> DbResult<bool> {
        debug!(id = %id, "Removing product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
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

    fn product(name: &str, stock: i64) -> Product {
        Product {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            price: Money::from_cents(4500),
            cost_price: Money::from_cents(3000),
            stock,
            opening_stock: stock,
            low_stock_alert: Some(3),
            unit: "kg".to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_round_trip_keeps_money_and_threshold() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();
        let rice = product("Basmati Rice", 40);

        repo.put(&rice).await.unwrap();
        let loaded = repo.get_by_id(&rice.id).await.unwrap().unwrap();

        assert_eq!(loaded.price, Money::from_cents(4500));
        assert_eq!(loaded.cost_price, Money::from_cents(3000));
        assert_eq!(loaded.low_stock_alert, Some(3));
        assert_eq!(loaded.unit, "kg");
    }

    #[tokio::test]
    async fn test_negative_stock_is_stored() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();
        let mut sugar = product("Sugar", 2);
        repo.put(&sugar).await.unwrap();

        sugar.stock = -3;
        repo.put(&sugar).await.unwrap();

        assert_eq!(repo.get_by_id(&sugar.id).await.unwrap().unwrap().stock, -3);
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_missing_product_is_none() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.products().get_by_id("nope").await.unwrap().is_none());
        assert!(db.products().list().await.unwrap().is_empty());
    }
}
