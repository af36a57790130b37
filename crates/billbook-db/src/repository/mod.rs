//! # Repository Module
//!
//! One repository per entity collection, all behind the same
//! [`EntityStore`] contract.
//!
//! ## Entity Store Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BillingService                                                        │
//! │       │                                                                 │
//! │       │  db.invoices().get_by_id(id)                                   │
//! │       ▼                                                                 │
//! │  EntityStore                                                           │
//! │  ├── list()            all rows, insertion order                       │
//! │  ├── get_by_id(id)     Option<Entity>                                  │
//! │  ├── put(entity)       insert or overwrite by id                       │
//! │  └── remove(id)        true when a row was deleted                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (one table per collection)                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `list` returns rows in insertion order. Engines that sort by date rely on
//! that for a stable tie-break, and `put` keeps a row's position when it
//! overwrites.

use billbook_core::CoreError;

use crate::error::{DbResult, ServiceResult};

pub mod invoice;
pub mod party;
pub mod product;
pub mod returns;
pub mod transaction;

pub use invoice::InvoiceRepository;
pub use party::PartyRepository;
pub use product::ProductRepository;
pub use returns::ReturnRepository;
pub use transaction::TransactionRepository;

/// Persistence contract shared by every collection.
#[allow(async_fn_in_trait)]
pub trait EntityStore {
    type Entity;

    /// Entity name used in not-found errors.
    const ENTITY: &'static str;

    async fn list(&self) -> DbResult<Vec<Self::Entity>>;

    async fn get_by_id(&self, id: &str) -> DbResult<Option<Self::Entity>>;

    /// Inserts, or overwrites the row with the same id.
    async fn put(&self, entity: &Self::Entity) -> DbResult<()>;

    async fn remove(&self, id: &str) -> DbResult<bool>;
}

/// Fetches an entity that must exist, turning a miss into `NotFound`.
pub async fn require<S: EntityStore>(store: &S, id: &str) -> ServiceResult<S::Entity> {
    store
        .get_by_id(id)
        .await?
        .ok_or_else(|| CoreError::not_found(S::ENTITY, id).into())
}
