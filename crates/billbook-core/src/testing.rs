//! Fixtures shared by the unit tests in this crate.

use chrono::{NaiveDate, Utc};

use crate::money::Money;
use crate::status::{compute_totals, derive_status};
use crate::types::{
    Invoice, InvoiceItem, Party, PartyType, PaymentMode, Product, Return, ReturnStatus,
    ReturnType, TaxRate, Transaction, TransactionType,
};

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn party(id: &str, party_type: PartyType) -> Party {
    Party {
        id: id.to_string(),
        name: format!("Party {}", id),
        party_type,
        mobile: "9800000000".to_string(),
        address: "Market Road".to_string(),
        tax_id: None,
        created_at: Utc::now(),
    }
}

pub fn customer(id: &str) -> Party {
    party(id, PartyType::Customer)
}

pub fn supplier(id: &str) -> Party {
    party(id, PartyType::Supplier)
}

pub fn product(name: &str, stock: i64) -> Product {
    Product {
        id: uuid::Uuid::new_v4().to_string(),
        name: name.to_string(),
        price: Money::from_cents(1000),
        cost_price: Money::from_cents(700),
        stock,
        opening_stock: stock,
        low_stock_alert: None,
        unit: "pcs".to_string(),
        created_at: Utc::now(),
    }
}

/// A one-line, tax-free invoice whose total is `total` cents.
pub fn invoice_with_total(on: &str, total: i64) -> Invoice {
    let items = vec![InvoiceItem::new(None, "Services", 1, Money::from_cents(total))];
    invoice_from_items("c1", on, items)
}

/// An invoice selling or buying the given products at their sale price.
pub fn goods_invoice(party_id: &str, on: &str, lines: &[(&Product, i64)]) -> Invoice {
    let items = lines
        .iter()
        .map(|(product, qty)| InvoiceItem::new(Some(product.id.clone()), &product.name, *qty, product.price))
        .collect();
    invoice_from_items(party_id, on, items)
}

fn invoice_from_items(party_id: &str, on: &str, items: Vec<InvoiceItem>) -> Invoice {
    let totals = compute_totals(&items, TaxRate::zero(), Money::zero());
    Invoice {
        id: uuid::Uuid::new_v4().to_string(),
        invoice_number: format!("INV-{}", uuid::Uuid::new_v4().simple()),
        party_id: party_id.to_string(),
        date: date(on),
        items,
        subtotal: totals.subtotal,
        gst_rate: TaxRate::zero(),
        gst_amount: totals.gst_amount,
        discount: totals.discount,
        total: totals.total,
        paid_amount: Money::zero(),
        status: derive_status(Money::zero(), totals.total),
        notes: None,
        created_at: Utc::now(),
    }
}

/// A pending return of the given products.
pub fn goods_return(
    return_type: ReturnType,
    party_id: &str,
    on: &str,
    lines: &[(&Product, i64)],
) -> Return {
    let items: Vec<InvoiceItem> = lines
        .iter()
        .map(|(product, qty)| InvoiceItem::new(Some(product.id.clone()), &product.name, *qty, product.price))
        .collect();
    let totals = compute_totals(&items, TaxRate::zero(), Money::zero());
    Return {
        id: uuid::Uuid::new_v4().to_string(),
        return_number: format!("RET-{}", uuid::Uuid::new_v4().simple()),
        return_type,
        party_id: party_id.to_string(),
        invoice_id: None,
        invoice_number: None,
        date: date(on),
        items,
        subtotal: totals.subtotal,
        gst_rate: TaxRate::zero(),
        gst_amount: totals.gst_amount,
        total: totals.total,
        status: ReturnStatus::Pending,
        notes: None,
        created_at: Utc::now(),
    }
}

pub fn transaction(
    transaction_type: TransactionType,
    party_id: &str,
    on: &str,
    amount: i64,
) -> Transaction {
    Transaction {
        id: uuid::Uuid::new_v4().to_string(),
        transaction_type,
        party_id: party_id.to_string(),
        amount: Money::from_cents(amount),
        date: date(on),
        mode: PaymentMode::Cash,
        reference: None,
        description: None,
        created_at: Utc::now(),
    }
}
