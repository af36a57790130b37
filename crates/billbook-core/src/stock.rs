//! # Stock Ledger
//!
//! Stock levels and movement history for products, driven by invoices and
//! processed returns.
//!
//! ## Movement Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Document                         Effect on each line's product        │
//! │  ─────────────────────────────    ──────────────────────────────       │
//! │  Invoice to a customer (sale)     stock − qty                          │
//! │  Invoice from a supplier (buy)    stock + qty                          │
//! │  Sales return, processed          stock + qty   (goods come back)      │
//! │  Purchase return, processed       stock − qty   (goods go back)        │
//! │  Return pending / rejected        no effect                            │
//! │  Free-text line (no product_id)   no effect                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Two Views, One Source
//! ```text
//!   Invoices + Returns ──► apply_*/reverse_*  ──► Product.stock (stored)
//!          │
//!          └─────────────► StockLedger::movement_history (derived)
//!
//!   stock == opening_stock + Σ history.change     (checked by `drift`)
//! ```
//!
//! Stock may go negative. A decrease that ends below zero yields a
//! [`Warning::InsufficientStock`] but the update is still returned.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::Warning;
use crate::types::{
    Invoice, MovementSource, Party, PartyType, Product, Return, ReturnStatus, ReturnType,
    StockLevel, StockMovementEntry,
};

// =============================================================================
// Adjustments
// =============================================================================

/// A signed quantity change for one product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockAdjustment {
    pub product_id: String,
    pub change: i64,
}

/// Products whose stock changed, plus any warnings raised on the way.
///
/// Only touched products are included; the caller writes each one back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StockUpdate {
    pub products: Vec<Product>,
    pub warnings: Vec<Warning>,
}

/// Direction a document moves stock in, per unit of line quantity.
fn invoice_sign(party_type: PartyType) -> i64 {
    match party_type {
        PartyType::Customer => -1,
        PartyType::Supplier => 1,
    }
}

fn return_sign(return_type: ReturnType) -> i64 {
    match return_type {
        ReturnType::Sales => 1,
        ReturnType::Purchase => -1,
    }
}

/// Stock adjustments an invoice causes when it is saved.
pub fn invoice_adjustments(invoice: &Invoice, party_type: PartyType) -> Vec<StockAdjustment> {
    let sign = invoice_sign(party_type);
    invoice
        .items
        .iter()
        .filter_map(|item| {
            item.product_id.as_ref().map(|product_id| StockAdjustment {
                product_id: product_id.clone(),
                change: sign * item.qty,
            })
        })
        .collect()
}

/// Stock adjustments a return causes once it is processed.
///
/// The return's current status is not consulted; the Return Processor
/// decides when this effect fires.
pub fn return_adjustments(ret: &Return) -> Vec<StockAdjustment> {
    let sign = return_sign(ret.return_type);
    ret.items
        .iter()
        .filter_map(|item| {
            item.product_id.as_ref().map(|product_id| StockAdjustment {
                product_id: product_id.clone(),
                change: sign * item.qty,
            })
        })
        .collect()
}

fn negated(adjustments: Vec<StockAdjustment>) -> Vec<StockAdjustment> {
    adjustments
        .into_iter()
        .map(|adj| StockAdjustment {
            change: -adj.change,
            ..adj
        })
        .collect()
}

/// Applies adjustments to a product snapshot.
///
/// Adjustments for the same product are netted first so a product appearing
/// on two lines is written once. Ids that match no product (deleted products)
/// are skipped.
pub fn apply_adjustments(products: &[Product], adjustments: &[StockAdjustment]) -> StockUpdate {
    // Net per product, keeping first-seen order for a deterministic result
    let mut order: Vec<&str> = Vec::new();
    let mut net: HashMap<&str, i64> = HashMap::new();
    for adj in adjustments {
        let entry = net.entry(adj.product_id.as_str()).or_insert_with(|| {
            order.push(adj.product_id.as_str());
            0
        });
        *entry += adj.change;
    }

    let by_id: HashMap<&str, &Product> = products.iter().map(|p| (p.id.as_str(), p)).collect();
    let mut update = StockUpdate::default();

    for product_id in order {
        let change = net[product_id];
        let Some(product) = by_id.get(product_id) else {
            continue;
        };
        if change == 0 {
            continue;
        }

        let new_stock = product.stock + change;
        if change < 0 && new_stock < 0 {
            update.warnings.push(Warning::InsufficientStock {
                product_id: product.id.clone(),
                product_name: product.name.clone(),
                available: product.stock,
                requested: -change,
            });
        }

        update.products.push(Product {
            stock: new_stock,
            ..(*product).clone()
        });
    }

    update
}

/// Stock effect of saving an invoice.
pub fn apply_invoice(products: &[Product], invoice: &Invoice, party_type: PartyType) -> StockUpdate {
    apply_adjustments(products, &invoice_adjustments(invoice, party_type))
}

/// Undoes [`apply_invoice`], e.g. when the invoice is deleted.
pub fn reverse_invoice(products: &[Product], invoice: &Invoice, party_type: PartyType) -> StockUpdate {
    apply_adjustments(products, &negated(invoice_adjustments(invoice, party_type)))
}

/// Stock effect of editing an invoice's lines.
///
/// The old lines are reversed and the new ones applied in a single netted
/// pass, so a product whose quantity did not change is not rewritten.
pub fn replace_invoice(
    products: &[Product],
    old: &Invoice,
    new: &Invoice,
    party_type: PartyType,
) -> StockUpdate {
    let mut adjustments = negated(invoice_adjustments(old, party_type));
    adjustments.extend(invoice_adjustments(new, party_type));
    apply_adjustments(products, &adjustments)
}

/// Stock effect of a return reaching `processed`.
pub fn apply_return(products: &[Product], ret: &Return) -> StockUpdate {
    apply_adjustments(products, &return_adjustments(ret))
}

/// Undoes [`apply_return`] when a processed return is reopened, rejected or deleted.
pub fn reverse_return(products: &[Product], ret: &Return) -> StockUpdate {
    apply_adjustments(products, &negated(return_adjustments(ret)))
}

// =============================================================================
// Stock Levels
// =============================================================================

/// The authoritative stock of a product.
#[inline]
pub fn current_stock(product: &Product) -> i64 {
    product.stock
}

/// Classifies a product's stock.
///
/// `stock ≤ 0` is out of stock, `0 < stock ≤ threshold` is low, anything
/// above is in stock. `default_threshold` applies when the product has no
/// `low_stock_alert` of its own.
pub fn stock_level(product: &Product, default_threshold: i64) -> StockLevel {
    let threshold = product.low_stock_alert.unwrap_or(default_threshold);
    if product.stock <= 0 {
        StockLevel::OutOfStock
    } else if product.stock <= threshold {
        StockLevel::LowStock
    } else {
        StockLevel::InStock
    }
}

/// A product that needs reordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LowStockItem {
    pub product_id: String,
    pub name: String,
    pub stock: i64,
    pub threshold: i64,
    pub level: StockLevel,
}

/// Low and out-of-stock products, out-of-stock first, then by stock ascending.
pub fn low_stock_report(products: &[Product], default_threshold: i64) -> Vec<LowStockItem> {
    let mut report: Vec<LowStockItem> = products
        .iter()
        .filter_map(|product| {
            let level = stock_level(product, default_threshold);
            (level != StockLevel::InStock).then(|| LowStockItem {
                product_id: product.id.clone(),
                name: product.name.clone(),
                stock: product.stock,
                threshold: product.low_stock_alert.unwrap_or(default_threshold),
                level,
            })
        })
        .collect();

    report.sort_by_key(|item| (item.level != StockLevel::OutOfStock, item.stock));
    report
}

// =============================================================================
// Movement History
// =============================================================================

/// Read-only view over the invoice and return history, used to rebuild
/// per-product movements.
///
/// Nothing is cached: each call rescans the documents it was built from.
#[derive(Debug)]
pub struct StockLedger<'a> {
    party_types: HashMap<&'a str, PartyType>,
    invoices: &'a [Invoice],
    returns: &'a [Return],
}

impl<'a> StockLedger<'a> {
    pub fn new(parties: &'a [Party], invoices: &'a [Invoice], returns: &'a [Return]) -> Self {
        StockLedger {
            party_types: parties
                .iter()
                .map(|party| (party.id.as_str(), party.party_type))
                .collect(),
            invoices,
            returns,
        }
    }

    /// Chronological movements for a product, with a running balance from its
    /// opening stock.
    ///
    /// Invoices whose party is unknown are skipped; only processed returns count.
    /// Same-date entries keep document order (invoices, then returns).
    pub fn movement_history(&self, product: &Product) -> Vec<StockMovementEntry> {
        let mut movements: Vec<(chrono::NaiveDate, MovementSource, i64)> = Vec::new();

        for invoice in self.invoices {
            let Some(&party_type) = self.party_types.get(invoice.party_id.as_str()) else {
                continue;
            };
            let sign = invoice_sign(party_type);
            for item in &invoice.items {
                if item.product_id.as_deref() == Some(product.id.as_str()) {
                    movements.push((
                        invoice.date,
                        MovementSource::Invoice(invoice.invoice_number.clone()),
                        sign * item.qty,
                    ));
                }
            }
        }

        for ret in self.returns.iter().filter(|r| r.status == ReturnStatus::Processed) {
            let sign = return_sign(ret.return_type);
            for item in &ret.items {
                if item.product_id.as_deref() == Some(product.id.as_str()) {
                    movements.push((
                        ret.date,
                        MovementSource::Return(ret.return_number.clone()),
                        sign * item.qty,
                    ));
                }
            }
        }

        // Stable: equal dates keep scan order
        movements.sort_by_key(|(date, _, _)| *date);

        let mut balance = product.opening_stock;
        movements
            .into_iter()
            .map(|(date, source, change)| {
                balance += change;
                StockMovementEntry {
                    date,
                    source,
                    change,
                    unit: product.unit.clone(),
                    balance,
                }
            })
            .collect()
    }

    /// Net quantity moved for a product across all documents.
    pub fn net_movement(&self, product: &Product) -> i64 {
        self.movement_history(product).iter().map(|m| m.change).sum()
    }

    /// What the stored stock should be: opening stock plus every movement.
    pub fn expected_stock(&self, product: &Product) -> i64 {
        product.opening_stock + self.net_movement(product)
    }

    /// Stored stock minus expected stock. Zero when the two views agree.
    pub fn drift(&self, product: &Product) -> i64 {
        product.stock - self.expected_stock(product)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{customer, goods_invoice, goods_return, product, supplier};
    use proptest::prelude::*;

    #[test]
    fn test_sale_decreases_and_purchase_increases() {
        let widget = product("Widget", 10);
        let products = vec![widget.clone()];

        let sale = goods_invoice("c1", "2026-01-02", &[(&widget, 3)]);
        let update = apply_invoice(&products, &sale, PartyType::Customer);
        assert_eq!(update.products[0].stock, 7);
        assert!(update.warnings.is_empty());

        let purchase = goods_invoice("s1", "2026-01-03", &[(&widget, 4)]);
        let update = apply_invoice(&products, &purchase, PartyType::Supplier);
        assert_eq!(update.products[0].stock, 14);
    }

    #[test]
    fn test_oversell_warns_but_applies() {
        let widget = product("Widget", 3);
        let sale = goods_invoice("c1", "2026-01-02", &[(&widget, 5)]);

        let update = apply_invoice(&[widget.clone()], &sale, PartyType::Customer);
        assert_eq!(update.products[0].stock, -2);
        assert_eq!(
            update.warnings,
            vec![Warning::InsufficientStock {
                product_id: widget.id.clone(),
                product_name: "Widget".to_string(),
                available: 3,
                requested: 5,
            }]
        );
    }

    #[test]
    fn test_reverse_invoice_restores_stock() {
        let widget = product("Widget", 10);
        let sale = goods_invoice("c1", "2026-01-02", &[(&widget, 4)]);

        let applied = apply_invoice(&[widget.clone()], &sale, PartyType::Customer).products;
        let reversed = reverse_invoice(&applied, &sale, PartyType::Customer).products;
        assert_eq!(reversed[0].stock, 10);
    }

    #[test]
    fn test_replace_invoice_moves_only_the_difference() {
        let widget = product("Widget", 10);
        let gadget = product("Gadget", 10);
        let original = goods_invoice("c1", "2026-01-02", &[(&widget, 4), (&gadget, 1)]);
        let stocked = apply_invoice(&[widget.clone(), gadget.clone()], &original, PartyType::Customer).products;

        let mut edited = original.clone();
        edited.items[0].qty = 6;
        let update = replace_invoice(&stocked, &original, &edited, PartyType::Customer);

        assert_eq!(update.products.len(), 1);
        assert_eq!(update.products[0].id, widget.id);
        assert_eq!(update.products[0].stock, 4);
    }

    #[test]
    fn test_same_product_on_two_lines_is_netted() {
        let widget = product("Widget", 10);
        let sale = goods_invoice("c1", "2026-01-02", &[(&widget, 2), (&widget, 3)]);

        let update = apply_invoice(&[widget], &sale, PartyType::Customer);
        assert_eq!(update.products.len(), 1);
        assert_eq!(update.products[0].stock, 5);
    }

    #[test]
    fn test_free_text_and_unknown_products_have_no_effect() {
        let widget = product("Widget", 10);
        let deleted = product("Discontinued", 0);
        let mut sale = goods_invoice("c1", "2026-01-02", &[(&deleted, 1)]);
        sale.items.push(crate::types::InvoiceItem::new(
            None,
            "Delivery",
            1,
            crate::money::Money::from_cents(500),
        ));

        let update = apply_invoice(&[widget], &sale, PartyType::Customer);
        assert!(update.products.is_empty());
    }

    #[test]
    fn test_returns_move_stock_by_type() {
        let widget = product("Widget", 10);

        let sales_return = goods_return(ReturnType::Sales, "c1", "2026-01-04", &[(&widget, 2)]);
        assert_eq!(apply_return(&[widget.clone()], &sales_return).products[0].stock, 12);

        let purchase_return = goods_return(ReturnType::Purchase, "s1", "2026-01-04", &[(&widget, 3)]);
        assert_eq!(apply_return(&[widget.clone()], &purchase_return).products[0].stock, 7);
        assert_eq!(reverse_return(&[widget], &purchase_return).products[0].stock, 13);
    }

    #[test]
    fn test_stock_level_classification() {
        let mut widget = product("Widget", 0);
        assert_eq!(stock_level(&widget, 5), StockLevel::OutOfStock);

        widget.stock = -4;
        assert_eq!(stock_level(&widget, 5), StockLevel::OutOfStock);

        widget.stock = 5;
        assert_eq!(stock_level(&widget, 5), StockLevel::LowStock);

        widget.stock = 6;
        assert_eq!(stock_level(&widget, 5), StockLevel::InStock);

        widget.low_stock_alert = Some(10);
        assert_eq!(stock_level(&widget, 5), StockLevel::LowStock);
    }

    #[test]
    fn test_low_stock_report_orders_out_of_stock_first() {
        let healthy = product("Healthy", 50);
        let low = product("Low", 2);
        let out = product("Out", -1);

        let report = low_stock_report(&[healthy, low, out], 5);
        let names: Vec<&str> = report.iter().map(|item| item.name.as_str()).collect();
        assert_eq!(names, vec!["Out", "Low"]);
    }

    #[test]
    fn test_movement_history_is_chronological_with_balance() {
        let widget = product("Widget", 10);
        let parties = vec![customer("c1"), supplier("s1")];

        let late_sale = goods_invoice("c1", "2026-03-01", &[(&widget, 4)]);
        let early_purchase = goods_invoice("s1", "2026-01-15", &[(&widget, 6)]);
        let mut processed = goods_return(ReturnType::Sales, "c1", "2026-03-05", &[(&widget, 1)]);
        processed.status = ReturnStatus::Processed;
        let pending = goods_return(ReturnType::Sales, "c1", "2026-03-06", &[(&widget, 9)]);

        let invoices = vec![late_sale, early_purchase];
        let returns = vec![processed, pending];
        let ledger = StockLedger::new(&parties, &invoices, &returns);

        let history = ledger.movement_history(&widget);
        let changes: Vec<i64> = history.iter().map(|m| m.change).collect();
        let balances: Vec<i64> = history.iter().map(|m| m.balance).collect();
        assert_eq!(changes, vec![6, -4, 1]);
        assert_eq!(balances, vec![16, 12, 13]);
        assert!(matches!(history[2].source, MovementSource::Return(_)));
        assert_eq!(ledger.expected_stock(&widget), 13);
    }

    proptest! {
        /// Applying documents one by one always lands on the stock the
        /// movement history predicts.
        #[test]
        fn applied_stock_matches_history(
            docs in prop::collection::vec((0u8..4, 1i64..20, 1u32..28), 0..20)
        ) {
            let mut widget = product("Widget", 25);
            let parties = vec![customer("c1"), supplier("s1")];
            let mut invoices = Vec::new();
            let mut returns = Vec::new();

            for (kind, qty, day) in docs {
                let date = format!("2026-02-{:02}", day);
                let update = match kind {
                    0 => {
                        let inv = goods_invoice("c1", &date, &[(&widget, qty)]);
                        let update = apply_invoice(&[widget.clone()], &inv, PartyType::Customer);
                        invoices.push(inv);
                        update
                    }
                    1 => {
                        let inv = goods_invoice("s1", &date, &[(&widget, qty)]);
                        let update = apply_invoice(&[widget.clone()], &inv, PartyType::Supplier);
                        invoices.push(inv);
                        update
                    }
                    2 => {
                        let mut ret = goods_return(ReturnType::Sales, "c1", &date, &[(&widget, qty)]);
                        ret.status = ReturnStatus::Processed;
                        let update = apply_return(&[widget.clone()], &ret);
                        returns.push(ret);
                        update
                    }
                    _ => {
                        // Pending returns never move stock
                        returns.push(goods_return(ReturnType::Purchase, "s1", &date, &[(&widget, qty)]));
                        StockUpdate::default()
                    }
                };
                if let Some(updated) = update.products.into_iter().next() {
                    widget = updated;
                }
            }

            let ledger = StockLedger::new(&parties, &invoices, &returns);
            prop_assert_eq!(ledger.drift(&widget), 0);

            let history = ledger.movement_history(&widget);
            prop_assert!(history.windows(2).all(|w| w[0].date <= w[1].date));
            if let Some(last) = history.last() {
                prop_assert_eq!(last.balance, widget.stock);
            }
        }
    }
}
