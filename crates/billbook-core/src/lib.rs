//! # billbook-core: Reconciliation Logic for Billbook
//!
//! Pure engines that keep stock, invoice balances, payments and returns
//! consistent with one another. Nothing in this crate touches a database.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Billbook Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            billbook-db :: BillingService                        │   │
//! │  │   create_invoice, record_transaction, transition_return, ...   │   │
//! │  └──────────────┬───────────────────────────────▲──────────────────┘   │
//! │        entity snapshots                  updated entities + warnings    │
//! │  ┌──────────────▼───────────────────────────────┴──────────────────┐   │
//! │  │               ★ billbook-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌────────────┐  ┌───────────┐  │   │
//! │  │   │   stock   │  │  status   │  │ allocation │  │  returns  │  │   │
//! │  │   │ movements │  │  totals   │  │ oldest-    │  │ lifecycle │  │   │
//! │  │   │  drift    │  │  paid/    │  │ first      │  │ stock     │  │   │
//! │  │   │ low stock │  │  partial  │  │            │  │ effects   │  │   │
//! │  │   └───────────┘  └───────────┘  └────────────┘  └───────────┘  │   │
//! │  │          ┌──────────────┐   ┌───────────┐                       │   │
//! │  │          │ party_ledger │   │ numbering │                       │   │
//! │  │          └──────────────┘   └───────────┘                       │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO LOGGING • PURE FUNCTIONS            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain entities (Party, Product, Invoice, Transaction, Return)
//! - [`money`] - Money type with integer arithmetic
//! - [`error`] - Hard errors and non-fatal warnings
//! - [`validation`] - Input checks
//! - [`stock`] - Stock ledger: adjustments, movement history, low-stock report
//! - [`status`] - Invoice totals, status and balance
//! - [`allocation`] - Payment allocation across invoices
//! - [`returns`] - Return validation and lifecycle
//! - [`party_ledger`] - Party statements and balances
//! - [`numbering`] - Invoice and return numbers
//!
//! ## Design Principles
//!
//! 1. **Snapshots in, entities out**: engines never hold state between calls
//! 2. **Integer Money**: all amounts are cents (i64)
//! 3. **Warnings are values**: oversell and over-return do not fail an operation
//!
//! ## Example Usage
//!
//! ```rust
//! use billbook_core::money::Money;
//! use billbook_core::status::compute_totals;
//! use billbook_core::types::{InvoiceItem, TaxRate};
//!
//! let items = vec![InvoiceItem::new(None, "Widget", 2, Money::from_cents(5000))];
//! let totals = compute_totals(&items, TaxRate::from_bps(1800), Money::zero());
//!
//! // 100.00 + 18% GST
//! assert_eq!(totals.total.cents(), 11800);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod allocation;
pub mod error;
pub mod money;
pub mod numbering;
pub mod party_ledger;
pub mod returns;
pub mod status;
pub mod stock;
pub mod types;
pub mod validation;

#[cfg(test)]
mod testing;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use allocation::{Allocation, AllocationMode};
pub use error::{CoreError, CoreResult, ValidationError, Warning};
pub use money::Money;
pub use party_ledger::BalanceSummary;
pub use returns::{StockEffect, Transition};
pub use stock::{LowStockItem, StockLedger, StockUpdate};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Low-stock threshold for products that do not set their own.
pub const DEFAULT_LOW_STOCK_ALERT: i64 = 5;

/// Default GST rate for new documents, in basis points (18%).
pub const DEFAULT_GST_BPS: u32 = 1800;
