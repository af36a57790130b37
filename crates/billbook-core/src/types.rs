//! # Domain Types
//!
//! Entities persisted by the entity store and the read models derived from them.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Stored                                                                 │
//! │  ┌──────────┐  ┌──────────┐  ┌──────────┐  ┌─────────────┐  ┌────────┐ │
//! │  │  Party   │  │ Product  │  │ Invoice  │  │ Transaction │  │ Return │ │
//! │  │ customer │  │  stock   │  │  items[] │  │  payment    │  │ items[]│ │
//! │  │ supplier │  │  unit    │  │  status  │  │  receipt    │  │ status │ │
//! │  └──────────┘  └──────────┘  └──────────┘  └─────────────┘  └────────┘ │
//! │                                                                         │
//! │  Derived (never stored)                                                 │
//! │  ┌────────────────────┐  ┌─────────────┐  ┌──────────────┐             │
//! │  │ StockMovementEntry │  │ LedgerEntry │  │ LedgerTotals │             │
//! │  └────────────────────┘  └─────────────┘  └──────────────┘             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every stored entity has:
//! - `id`: UUID v4, immutable, used for references
//! - a business key where one exists (`invoice_number`, `return_number`)

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// GST rate in basis points (1800 = 18%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(transparent)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage (for convenience).
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }
}

// =============================================================================
// Party
// =============================================================================

/// Which side of the business a party is on.
///
/// Customer invoices are sales (stock goes out), supplier invoices are
/// purchases (stock comes in). Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PartyType {
    Customer,
    Supplier,
}

impl std::fmt::Display for PartyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PartyType::Customer => write!(f, "customer"),
            PartyType::Supplier => write!(f, "supplier"),
        }
    }
}

/// A customer or supplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Party {
    pub id: String,
    pub name: String,
    pub party_type: PartyType,
    pub mobile: String,
    pub address: String,
    /// GSTIN or other tax registration, when the party has one.
    pub tax_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

/// A stocked product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub name: String,
    /// Sale rate.
    pub price: Money,
    pub cost_price: Money,
    /// Authoritative current quantity. Signed: oversold products go negative.
    pub stock: i64,
    /// Quantity at creation. `stock` always equals this plus every applied movement.
    pub opening_stock: i64,
    /// Low-stock threshold; the configured default (5 unless changed) when unset.
    pub low_stock_alert: Option<i64>,
    pub unit: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Stock classification for dashboards and reorder lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum StockLevel {
    OutOfStock,
    LowStock,
    InStock,
}

// =============================================================================
// Line Items
// =============================================================================

/// A line on an invoice or return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InvoiceItem {
    #[serde(default = "new_line_id")]
    pub id: String,
    /// `None` for free-text lines (services, delivery charges).
    #[serde(default)]
    pub product_id: Option<String>,
    pub product_name: String,
    pub qty: i64,
    pub rate: Money,
    /// `qty × rate`, recomputed on save.
    #[serde(default)]
    pub amount: Money,
}

fn new_line_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl InvoiceItem {
    /// Builds a line with `amount` derived from `qty × rate`.
    pub fn new(
        product_id: Option<String>,
        product_name: impl Into<String>,
        qty: i64,
        rate: Money,
    ) -> Self {
        InvoiceItem {
            id: uuid::Uuid::new_v4().to_string(),
            product_id,
            product_name: product_name.into(),
            qty,
            rate,
            amount: rate.multiply_quantity(qty),
        }
    }
}

// =============================================================================
// Invoice
// =============================================================================

/// Payment status of an invoice. Always derived from `paid_amount` vs `total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Unpaid,
    Partial,
    Paid,
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvoiceStatus::Unpaid => write!(f, "unpaid"),
            InvoiceStatus::Partial => write!(f, "partial"),
            InvoiceStatus::Paid => write!(f, "paid"),
        }
    }
}

/// Computed document totals shared by invoices and returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DocumentTotals {
    pub subtotal: Money,
    pub gst_amount: Money,
    pub discount: Money,
    pub total: Money,
}

/// A sales or purchase invoice. Sale vs purchase follows the party type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Invoice {
    pub id: String,
    pub invoice_number: String,
    pub party_id: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub items: Vec<InvoiceItem>,
    pub subtotal: Money,
    pub gst_rate: TaxRate,
    pub gst_amount: Money,
    pub discount: Money,
    pub total: Money,
    pub paid_amount: Money,
    pub status: InvoiceStatus,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Transaction
// =============================================================================

/// Direction of money.
///
/// A receipt is money in from a customer; a payment is money out to a supplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Payment,
    Receipt,
}

impl TransactionType {
    /// The transaction type that settles invoices of the given party type.
    pub const fn settling(party_type: PartyType) -> Self {
        match party_type {
            PartyType::Customer => TransactionType::Receipt,
            PartyType::Supplier => TransactionType::Payment,
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionType::Payment => write!(f, "payment"),
            TransactionType::Receipt => write!(f, "receipt"),
        }
    }
}

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMode {
    Cash,
    BankTransfer,
    Upi,
    Cheque,
}

/// A standalone payment or receipt. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Transaction {
    pub id: String,
    pub transaction_type: TransactionType,
    pub party_id: String,
    pub amount: Money,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub mode: PaymentMode,
    pub reference: Option<String>,
    pub description: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Return
// =============================================================================

/// Sales returns bring goods back in; purchase returns send goods back out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum ReturnType {
    Sales,
    Purchase,
}

impl ReturnType {
    /// The return type that matches a party's side of the business.
    pub const fn for_party(party_type: PartyType) -> Self {
        match party_type {
            PartyType::Customer => ReturnType::Sales,
            PartyType::Supplier => ReturnType::Purchase,
        }
    }
}

impl std::fmt::Display for ReturnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReturnType::Sales => write!(f, "sales"),
            ReturnType::Purchase => write!(f, "purchase"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum ReturnStatus {
    Pending,
    Processed,
    Rejected,
}

impl std::fmt::Display for ReturnStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReturnStatus::Pending => write!(f, "pending"),
            ReturnStatus::Processed => write!(f, "processed"),
            ReturnStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// A return of goods, optionally tied to its source invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Return {
    pub id: String,
    pub return_number: String,
    pub return_type: ReturnType,
    pub party_id: String,
    pub invoice_id: Option<String>,
    pub invoice_number: Option<String>,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub items: Vec<InvoiceItem>,
    pub subtotal: Money,
    pub gst_rate: TaxRate,
    pub gst_amount: Money,
    pub total: Money,
    pub status: ReturnStatus,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Derived Read Models
// =============================================================================

/// Document that caused a stock movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", content = "number", rename_all = "snake_case")]
pub enum MovementSource {
    Invoice(String),
    Return(String),
}

/// One signed stock change for a product. Derived on demand, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockMovementEntry {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub source: MovementSource,
    pub change: i64,
    pub unit: String,
    /// Stock after this entry, counting from the product's opening stock.
    pub balance: i64,
}

/// What a party ledger line represents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LedgerEntryKind {
    Invoice { status: InvoiceStatus },
    Transaction { transaction_type: TransactionType },
}

/// One line of a party statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LedgerEntry {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub kind: LedgerEntryKind,
    /// Invoice id or transaction id.
    pub document_id: String,
    /// Invoice number, or the transaction reference when one was given.
    pub reference: Option<String>,
    pub amount: Money,
}

/// Net position of a party statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LedgerTotals {
    pub total_amount: Money,
    pub paid_amount: Money,
    pub unpaid_amount: Money,
}

// =============================================================================
// Unit Tests
// =============================================================================
