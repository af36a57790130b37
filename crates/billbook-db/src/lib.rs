//! # billbook-db: Storage and Reconciliation Service for Billbook
//!
//! SQLite persistence for the five entity collections, the configuration
//! file, and the [`BillingService`] that runs the pure engines from
//! `billbook-core` against stored data.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Billbook Data Flow                               │
//! │                                                                         │
//! │  UI action (save invoice, record receipt, process return)               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   billbook-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │BillingService │    │  Repositories │    │  Database    │  │   │
//! │  │   │ (service.rs)  │───►│ (EntityStore) │───►│  (pool.rs)   │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ read → engine │    │ PartyRepo     │    │ SqlitePool   │  │   │
//! │  │   │      → write  │    │ InvoiceRepo   │    │ Migrations   │  │   │
//! │  │   └───────┬───────┘    │ ...           │    └──────────────┘  │   │
//! │  │           │            └───────────────┘                      │   │
//! │  └───────────┼─────────────────────────────────────────────────────┘   │
//! │              ▼                                                          │
//! │  billbook-core engines (stock, status, allocation, returns, ledger)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - `billbook.toml` loading, defaults and env overrides
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Store, config and service error types
//! - [`repository`] - One repository per collection
//! - [`service`] - The reconciliation operations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use billbook_db::{BillingService, BookConfig};
//!
//! let config = BookConfig::load(None)?;
//! let service = BillingService::open(&config).await?;
//!
//! let outcome = service.record_transaction(receipt).await?;
//! for warning in &outcome.warnings {
//!     println!("{warning}");
//! }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod service;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{BillingSettings, BookConfig, DatabaseSettings};
pub use error::{ConfigError, DbError, Outcome, ServiceError, ServiceResult};
pub use pool::{Database, DbConfig};
pub use repository::{
    EntityStore, InvoiceRepository, PartyRepository, ProductRepository, ReturnRepository,
    TransactionRepository,
};
pub use service::{
    BillingService, InvoiceEdit, NewInvoice, NewParty, NewProduct, NewReturn, NewTransaction,
    PartyStatement, RecordedTransaction, StockCheck,
};
