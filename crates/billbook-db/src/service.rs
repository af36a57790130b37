//! # Billing Service
//!
//! The reconciliation interface a UI calls. Every operation follows the same
//! three steps:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  record_transaction(receipt 150 from Asha)                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  1. READ    parties.get_by_id, invoices.list_for_party                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  2. ENGINE  allocation::allocate(invoices, 150, mode)   (pure)          │
//! │       │         └── Allocation { updated, allocated, unallocated }      │
//! │       ▼                                                                 │
//! │  3. WRITE   transactions.put, invoices.put(each updated)                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Outcome { value, warnings }                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Referenced ids are checked before the first write, so a missing party or
//! product fails with `NotFound` and leaves the store untouched. Writes that
//! span several collections are issued one after another without a
//! surrounding transaction.

use billbook_core::allocation::allocate;
use billbook_core::numbering::{invoice_prefix, next_invoice_number, next_return_number, return_prefix};
use billbook_core::returns::{self, StockEffect};
use billbook_core::stock::{self, LowStockItem, StockLedger, StockUpdate};
use billbook_core::validation::{
    validate_discount, validate_gst_rate, validate_items, validate_name, validate_payment_amount,
    validate_product_refs,
};
use billbook_core::{
    party_ledger, status, BalanceSummary, CoreError, Invoice, InvoiceItem, InvoiceStatus,
    LedgerEntry, LedgerTotals, Money, Party, PartyType, PaymentMode, Product, Return, ReturnStatus,
    ReturnType, StockMovementEntry, TaxRate, Transaction, TransactionType, Warning,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{BillingSettings, BookConfig};
use crate::error::{Outcome, ServiceResult};
use crate::pool::Database;
use crate::repository::{require, EntityStore};

// =============================================================================
// Inputs
// =============================================================================

/// A new customer or supplier.
#[derive(Debug, Clone, Deserialize)]
pub struct NewParty {
    pub name: String,
    pub party_type: PartyType,
    #[serde(default)]
    pub mobile: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub tax_id: Option<String>,
}

/// A new product. `opening_stock` also becomes the initial stored stock.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub price: Money,
    #[serde(default)]
    pub cost_price: Money,
    #[serde(default)]
    pub opening_stock: i64,
    /// Per-product threshold; the configured default applies when absent.
    #[serde(default)]
    pub low_stock_alert: Option<i64>,
    #[serde(default = "default_unit")]
    pub unit: String,
}

fn default_unit() -> String {
    "pcs".to_string()
}

/// A new invoice. Item amounts and totals are derived; anything the caller
/// puts in `amount` is overwritten.
#[derive(Debug, Clone, Deserialize)]
pub struct NewInvoice {
    pub party_id: String,
    pub date: NaiveDate,
    pub items: Vec<InvoiceItem>,
    /// Falls back to `billing.default_gst_bps`.
    #[serde(default)]
    pub gst_rate: Option<TaxRate>,
    #[serde(default)]
    pub discount: Money,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Changes to an existing invoice. `None` keeps the current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvoiceEdit {
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub items: Option<Vec<InvoiceItem>>,
    #[serde(default)]
    pub gst_rate: Option<TaxRate>,
    #[serde(default)]
    pub discount: Option<Money>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A payment (to a supplier) or receipt (from a customer).
#[derive(Debug, Clone, Deserialize)]
pub struct NewTransaction {
    pub transaction_type: TransactionType,
    pub party_id: String,
    pub amount: Money,
    pub date: NaiveDate,
    pub mode: PaymentMode,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A new return. It always starts out `pending`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewReturn {
    pub party_id: String,
    /// Inferred from the party when absent.
    #[serde(default)]
    pub return_type: Option<ReturnType>,
    #[serde(default)]
    pub invoice_id: Option<String>,
    pub date: NaiveDate,
    pub items: Vec<InvoiceItem>,
    #[serde(default)]
    pub gst_rate: Option<TaxRate>,
    #[serde(default)]
    pub notes: Option<String>,
}

// =============================================================================
// Results
// =============================================================================

/// What happened to a recorded payment or receipt.
#[derive(Debug, Clone, Serialize)]
pub struct RecordedTransaction {
    pub transaction: Transaction,
    /// Invoices whose paid amount changed, already persisted.
    pub settled: Vec<Invoice>,
    pub allocated: Money,
    pub unallocated: Money,
}

/// Stored stock of a product next to what its movement history implies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StockCheck {
    pub stock: i64,
    pub expected: i64,
    pub drift: i64,
}

impl StockCheck {
    pub fn is_consistent(&self) -> bool {
        self.drift == 0
    }
}

/// A party's statement.
#[derive(Debug, Clone, Serialize)]
pub struct PartyStatement {
    pub party: Party,
    pub entries: Vec<LedgerEntry>,
    pub totals: LedgerTotals,
}

// =============================================================================
// Service
// =============================================================================

/// Sequences store reads, pure engines and store writes.
#[derive(Debug, Clone)]
pub struct BillingService {
    db: Database,
    billing: BillingSettings,
}

impl BillingService {
    pub fn new(db: Database, billing: BillingSettings) -> Self {
        BillingService { db, billing }
    }

    /// Opens (and migrates) the configured database.
    pub async fn open(config: &BookConfig) -> ServiceResult<Self> {
        let db = Database::new(config.db_config()).await?;
        Ok(BillingService::new(db, config.billing.clone()))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn settings(&self) -> &BillingSettings {
        &self.billing
    }

    // =========================================================================
    // Parties & Products
    // =========================================================================

    pub async fn create_party(&self, new: NewParty) -> ServiceResult<Party> {
        validate_name("name", &new.name).map_err(CoreError::from)?;

        let party = Party {
            id: uuid::Uuid::new_v4().to_string(),
            name: new.name.trim().to_string(),
            party_type: new.party_type,
            mobile: new.mobile,
            address: new.address,
            tax_id: new.tax_id,
            created_at: Utc::now(),
        };
        self.db.parties().put(&party).await?;

        info!(id = %party.id, name = %party.name, party_type = %party.party_type, "Party created");
        Ok(party)
    }

    pub async fn create_product(&self, new: NewProduct) -> ServiceResult<Product> {
        validate_name("name", &new.name).map_err(CoreError::from)?;
        if new.price.is_negative() {
            return Err(CoreError::InvalidAmount {
                field: "price".to_string(),
                amount: new.price,
            }
            .into());
        }

        let product = Product {
            id: uuid::Uuid::new_v4().to_string(),
            name: new.name.trim().to_string(),
            price: new.price,
            cost_price: new.cost_price,
            stock: new.opening_stock,
            opening_stock: new.opening_stock,
            low_stock_alert: new.low_stock_alert,
            unit: new.unit,
            created_at: Utc::now(),
        };
        self.db.products().put(&product).await?;

        info!(id = %product.id, name = %product.name, stock = product.stock, "Product created");
        Ok(product)
    }

    // =========================================================================
    // Invoices
    // =========================================================================

    /// Saves an invoice and moves stock for its product lines.
    ///
    /// Sales take stock out, purchases put it back in. Overselling is allowed
    /// and reported as [`Warning::InsufficientStock`].
    pub async fn create_invoice(&self, new: NewInvoice) -> ServiceResult<Outcome<Invoice>> {
        let party = require(&self.db.parties(), &new.party_id).await?;
        let gst_rate = new.gst_rate.unwrap_or_else(|| self.billing.default_gst_rate());
        check_document("invoice", &new.items, gst_rate, new.discount)?;
        let products = self.db.products().list().await?;
        validate_product_refs(&products, &new.items)?;

        let existing = self.db.invoices().numbers_with_prefix(&invoice_prefix(new.date)).await?;
        let invoice_number = next_invoice_number(new.date, existing.iter().map(String::as_str));

        let invoice = status::recompute(&Invoice {
            id: uuid::Uuid::new_v4().to_string(),
            invoice_number,
            party_id: party.id.clone(),
            date: new.date,
            items: new.items,
            subtotal: Money::zero(),
            gst_rate,
            gst_amount: Money::zero(),
            discount: new.discount,
            total: Money::zero(),
            paid_amount: Money::zero(),
            status: InvoiceStatus::Unpaid,
            notes: new.notes,
            created_at: Utc::now(),
        });

        let update = stock::apply_invoice(&products, &invoice, party.party_type);

        self.db.invoices().put(&invoice).await?;
        self.write_stock(&update).await?;

        info!(
            number = %invoice.invoice_number,
            party = %party.name,
            total = %invoice.total,
            status = %invoice.status,
            "Invoice created"
        );
        log_warnings(&update.warnings);
        Ok(Outcome::new(invoice, update.warnings))
    }

    /// Rewrites an invoice's lines or terms.
    ///
    /// Stock moves by the difference between the old and new lines, and the
    /// paid amount is kept (capped at the new total). Replacement lines must
    /// name existing products; kept lines are not rechecked.
    pub async fn update_invoice(&self, id: &str, edit: InvoiceEdit) -> ServiceResult<Outcome<Invoice>> {
        let current = require(&self.db.invoices(), id).await?;
        let party = require(&self.db.parties(), &current.party_id).await?;
        let products = self.db.products().list().await?;
        if let Some(items) = &edit.items {
            validate_product_refs(&products, items)?;
        }

        let edited = Invoice {
            date: edit.date.unwrap_or(current.date),
            items: edit.items.unwrap_or_else(|| current.items.clone()),
            gst_rate: edit.gst_rate.unwrap_or(current.gst_rate),
            discount: edit.discount.unwrap_or(current.discount),
            notes: edit.notes.or_else(|| current.notes.clone()),
            ..current.clone()
        };
        check_document("invoice", &edited.items, edited.gst_rate, edited.discount)?;
        let edited = status::recompute(&edited);

        let update = stock::replace_invoice(&products, &current, &edited, party.party_type);

        self.db.invoices().put(&edited).await?;
        self.write_stock(&update).await?;

        info!(number = %edited.invoice_number, total = %edited.total, status = %edited.status, "Invoice updated");
        log_warnings(&update.warnings);
        Ok(Outcome::new(edited, update.warnings))
    }

    /// Removes an invoice after putting its stock movement back.
    ///
    /// Transactions already allocated to it stay recorded.
    pub async fn delete_invoice(&self, id: &str) -> ServiceResult<Outcome<()>> {
        let invoice = require(&self.db.invoices(), id).await?;
        let party = require(&self.db.parties(), &invoice.party_id).await?;

        let products = self.db.products().list().await?;
        let update = stock::reverse_invoice(&products, &invoice, party.party_type);
        self.write_stock(&update).await?;
        self.db.invoices().remove(&invoice.id).await?;

        info!(number = %invoice.invoice_number, "Invoice deleted");
        log_warnings(&update.warnings);
        Ok(Outcome::new((), update.warnings))
    }

    /// Explicit "mark as paid / unpaid". `partial` is rejected.
    pub async fn set_invoice_status(&self, id: &str, new_status: InvoiceStatus) -> ServiceResult<Invoice> {
        let invoice = require(&self.db.invoices(), id).await?;
        let updated = status::set_status(&invoice, new_status)?;
        self.db.invoices().put(&updated).await?;

        info!(
            number = %updated.invoice_number,
            from = %invoice.status,
            to = %updated.status,
            paid = %updated.paid_amount,
            "Invoice status overridden"
        );
        Ok(updated)
    }

    /// Remaining balance of one invoice.
    pub async fn invoice_balance(&self, id: &str) -> ServiceResult<Money> {
        let invoice = require(&self.db.invoices(), id).await?;
        Ok(status::remaining_balance(&invoice))
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    /// Records a payment or receipt and allocates it to the party's invoices.
    ///
    /// The transaction is written before allocation runs, so it is kept even
    /// when nothing is outstanding. A receipt from a supplier or a payment to
    /// a customer is recorded but not allocated.
    pub async fn record_transaction(&self, new: NewTransaction) -> ServiceResult<Outcome<RecordedTransaction>> {
        let party = require(&self.db.parties(), &new.party_id).await?;
        validate_payment_amount(new.amount)?;

        let transaction = Transaction {
            id: uuid::Uuid::new_v4().to_string(),
            transaction_type: new.transaction_type,
            party_id: party.id.clone(),
            amount: new.amount,
            date: new.date,
            mode: new.mode,
            reference: new.reference,
            description: new.description,
            created_at: Utc::now(),
        };
        self.db.transactions().put(&transaction).await?;

        info!(
            id = %transaction.id,
            transaction_type = %transaction.transaction_type,
            party = %party.name,
            amount = %transaction.amount,
            "Transaction recorded"
        );

        if transaction.transaction_type != TransactionType::settling(party.party_type) {
            let warnings = vec![Warning::TransactionTypeMismatch {
                transaction_id: transaction.id.clone(),
            }];
            log_warnings(&warnings);
            let unallocated = transaction.amount;
            return Ok(Outcome::new(
                RecordedTransaction {
                    transaction,
                    settled: Vec::new(),
                    allocated: Money::zero(),
                    unallocated,
                },
                warnings,
            ));
        }

        let invoices = self.db.invoices().list_for_party(&party.id).await?;
        let allocation = allocate(&invoices, transaction.amount, self.billing.allocation_mode);
        for invoice in &allocation.updated {
            self.db.invoices().put(invoice).await?;
        }

        debug!(
            settled = allocation.updated.len(),
            allocated = %allocation.allocated,
            unallocated = %allocation.unallocated,
            mode = ?self.billing.allocation_mode,
            "Allocation applied"
        );

        let mut warnings = Vec::new();
        if allocation.unallocated.is_positive() {
            warnings.push(Warning::UnallocatedRemainder {
                transaction_id: transaction.id.clone(),
                amount: allocation.unallocated,
            });
        }
        log_warnings(&warnings);

        Ok(Outcome::new(
            RecordedTransaction {
                transaction,
                settled: allocation.updated,
                allocated: allocation.allocated,
                unallocated: allocation.unallocated,
            },
            warnings,
        ))
    }

    // =========================================================================
    // Returns
    // =========================================================================

    /// Saves a pending return. Stock does not move until it is processed.
    pub async fn create_return(&self, new: NewReturn) -> ServiceResult<Outcome<Return>> {
        let party = require(&self.db.parties(), &new.party_id).await?;
        let source = match &new.invoice_id {
            Some(invoice_id) => Some(require(&self.db.invoices(), invoice_id).await?),
            None => None,
        };
        let gst_rate = new.gst_rate.unwrap_or_else(|| self.billing.default_gst_rate());
        check_document("return", &new.items, gst_rate, Money::zero())?;
        validate_product_refs(&self.db.products().list().await?, &new.items)?;

        let items: Vec<InvoiceItem> = new
            .items
            .into_iter()
            .map(|item| InvoiceItem {
                amount: item.rate.multiply_quantity(item.qty),
                ..item
            })
            .collect();
        let totals = status::compute_totals(&items, gst_rate, Money::zero());

        let existing = self.db.returns().numbers_with_prefix(&return_prefix(new.date)).await?;
        let return_number = next_return_number(new.date, existing.iter().map(String::as_str));

        let ret = Return {
            id: uuid::Uuid::new_v4().to_string(),
            return_number,
            return_type: returns::infer_return_type(new.return_type, party.party_type),
            party_id: party.id.clone(),
            invoice_id: source.as_ref().map(|invoice| invoice.id.clone()),
            invoice_number: source.as_ref().map(|invoice| invoice.invoice_number.clone()),
            date: new.date,
            items,
            subtotal: totals.subtotal,
            gst_rate,
            gst_amount: totals.gst_amount,
            total: totals.total,
            status: ReturnStatus::Pending,
            notes: new.notes,
            created_at: Utc::now(),
        };

        let mut warnings = returns::validate_return(&ret, source.as_ref())?;
        warnings.extend(returns::type_mismatch(&ret, party.party_type));

        self.db.returns().put(&ret).await?;

        info!(
            number = %ret.return_number,
            return_type = %ret.return_type,
            party = %party.name,
            total = %ret.total,
            "Return created"
        );
        log_warnings(&warnings);
        Ok(Outcome::new(ret, warnings))
    }

    /// Moves a return to `new_status`, applying or reversing its stock effect.
    ///
    /// Setting the status it already has writes nothing.
    pub async fn transition_return(&self, id: &str, new_status: ReturnStatus) -> ServiceResult<Outcome<Return>> {
        let current = require(&self.db.returns(), id).await?;
        if current.status == new_status {
            debug!(number = %current.return_number, status = %new_status, "Return already in requested status");
            return Ok(Outcome::clean(current));
        }

        let transition = returns::transition(&current, new_status);
        let update = self.return_stock(&transition.ret, transition.stock_effect).await?;
        self.write_stock(&update).await?;
        self.db.returns().put(&transition.ret).await?;

        info!(
            number = %transition.ret.return_number,
            from = %current.status,
            to = %transition.ret.status,
            stock_effect = ?transition.stock_effect,
            "Return status changed"
        );
        log_warnings(&update.warnings);
        Ok(Outcome::new(transition.ret, update.warnings))
    }

    /// Deletes a return. A processed return has its stock effect undone first.
    pub async fn delete_return(&self, id: &str) -> ServiceResult<Outcome<()>> {
        let ret = require(&self.db.returns(), id).await?;

        let effect = returns::deletion_effect(&ret);
        let update = self.return_stock(&ret, effect).await?;
        self.write_stock(&update).await?;
        self.db.returns().remove(&ret.id).await?;

        info!(number = %ret.return_number, stock_effect = ?effect, "Return deleted");
        log_warnings(&update.warnings);
        Ok(Outcome::new((), update.warnings))
    }

    // =========================================================================
    // Stock Reports
    // =========================================================================

    pub async fn current_stock(&self, product_id: &str) -> ServiceResult<i64> {
        let product = require(&self.db.products(), product_id).await?;
        Ok(stock::current_stock(&product))
    }

    /// Chronological stock movements of a product with running balances.
    pub async fn movement_history(&self, product_id: &str) -> ServiceResult<Vec<StockMovementEntry>> {
        let product = require(&self.db.products(), product_id).await?;
        let (parties, invoices, returns) = self.stock_sources().await?;

        Ok(StockLedger::new(&parties, &invoices, &returns).movement_history(&product))
    }

    /// Compares stored stock with `opening_stock + Σ movements`.
    pub async fn verify_stock(&self, product_id: &str) -> ServiceResult<StockCheck> {
        let product = require(&self.db.products(), product_id).await?;
        let (parties, invoices, returns) = self.stock_sources().await?;
        let ledger = StockLedger::new(&parties, &invoices, &returns);

        let check = StockCheck {
            stock: stock::current_stock(&product),
            expected: ledger.expected_stock(&product),
            drift: ledger.drift(&product),
        };
        if !check.is_consistent() {
            warn!(product = %product.name, stock = check.stock, expected = check.expected, "Stock drift detected");
        }
        Ok(check)
    }

    /// Products at or below their low-stock threshold.
    pub async fn low_stock_report(&self) -> ServiceResult<Vec<LowStockItem>> {
        let products = self.db.products().list().await?;
        Ok(stock::low_stock_report(&products, self.billing.low_stock_threshold))
    }

    // =========================================================================
    // Party Ledger
    // =========================================================================

    pub async fn party_statement(&self, party_id: &str) -> ServiceResult<PartyStatement> {
        let party = require(&self.db.parties(), party_id).await?;
        let invoices = self.db.invoices().list_for_party(&party.id).await?;
        let transactions = self.db.transactions().list_for_party(&party.id).await?;

        let entries = party_ledger::ledger_for(&party.id, &invoices, &transactions);
        let totals = party_ledger::totals(&entries, party.party_type);
        Ok(PartyStatement { party, entries, totals })
    }

    pub async fn balance_summary(&self) -> ServiceResult<BalanceSummary> {
        let parties = self.db.parties().list().await?;
        let invoices = self.db.invoices().list().await?;
        let transactions = self.db.transactions().list().await?;

        Ok(party_ledger::balance_summary(&parties, &invoices, &transactions))
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn stock_sources(&self) -> ServiceResult<(Vec<Party>, Vec<Invoice>, Vec<Return>)> {
        let parties = self.db.parties().list().await?;
        let invoices = self.db.invoices().list().await?;
        let returns = self.db.returns().list().await?;
        Ok((parties, invoices, returns))
    }

    async fn return_stock(&self, ret: &Return, effect: StockEffect) -> ServiceResult<StockUpdate> {
        let update = match effect {
            StockEffect::Apply => stock::apply_return(&self.db.products().list().await?, ret),
            StockEffect::Reverse => stock::reverse_return(&self.db.products().list().await?, ret),
            StockEffect::None => StockUpdate::default(),
        };
        Ok(update)
    }

    async fn write_stock(&self, update: &StockUpdate) -> ServiceResult<()> {
        let products = self.db.products();
        for product in &update.products {
            products.put(product).await?;
        }
        Ok(())
    }
}

/// Shared checks for invoice lines and terms.
fn check_document(document: &str, items: &[InvoiceItem], gst_rate: TaxRate, discount: Money) -> ServiceResult<()> {
    validate_items(document, items)?;
    validate_gst_rate(gst_rate).map_err(CoreError::from)?;
    validate_discount(discount)?;
    Ok(())
}

fn log_warnings(warnings: &[Warning]) {
    for warning in warnings {
        warn!(warning = %warning, "Reconciliation warning");
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
