//! # Invoice Status Engine
//!
//! Derives `status` and remaining balance from an invoice's total and the
//! amount paid against it.
//!
//! ## Status Invariant
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  paid_amount ≥ total       ──► Paid                                    │
//! │  0 < paid_amount < total   ──► Partial                                 │
//! │  paid_amount = 0           ──► Unpaid                                  │
//! │                                                                         │
//! │  (a zero-total invoice is Paid: 0 ≥ 0)                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every function here returns a new invoice; callers persist it.

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{DocumentTotals, Invoice, InvoiceItem, InvoiceStatus, TaxRate};

/// Computes subtotal, GST and total for a set of lines.
///
/// `total = max(0, subtotal + gst − discount)`.
pub fn compute_totals(items: &[InvoiceItem], gst_rate: TaxRate, discount: Money) -> DocumentTotals {
    let subtotal: Money = items.iter().map(|item| item.rate.multiply_quantity(item.qty)).sum();
    let gst_amount = subtotal.calculate_tax(gst_rate);
    let total = (subtotal + gst_amount - discount).floor_zero();

    DocumentTotals {
        subtotal,
        gst_amount,
        discount,
        total,
    }
}

/// Status for a paid amount against a total.
pub fn derive_status(paid_amount: Money, total: Money) -> InvoiceStatus {
    if paid_amount >= total {
        InvoiceStatus::Paid
    } else if paid_amount.is_positive() {
        InvoiceStatus::Partial
    } else {
        InvoiceStatus::Unpaid
    }
}

/// `total − paid_amount`, floored at zero.
pub fn remaining_balance(invoice: &Invoice) -> Money {
    (invoice.total - invoice.paid_amount).floor_zero()
}

/// Adds `amount` to the paid amount, capped at the total.
///
/// ```rust,ignore
/// // total 500, paid 100
/// let updated = apply_payment(&invoice, Money::from_cents(600));
/// assert_eq!(updated.paid_amount, invoice.total);  // capped
/// assert_eq!(updated.status, InvoiceStatus::Paid);
/// ```
pub fn apply_payment(invoice: &Invoice, amount: Money) -> Invoice {
    let paid_amount = (invoice.paid_amount + amount).min(invoice.total);

    Invoice {
        paid_amount,
        status: derive_status(paid_amount, invoice.total),
        ..invoice.clone()
    }
}

/// Explicit "mark as paid / unpaid" override.
///
/// `Paid` sets `paid_amount = total`; `Unpaid` sets `paid_amount = 0`. Any
/// earlier partial amount is discarded, not restored later. `Partial` is
/// derived only and is rejected.
pub fn set_status(invoice: &Invoice, status: InvoiceStatus) -> CoreResult<Invoice> {
    let paid_amount = match status {
        InvoiceStatus::Paid => invoice.total,
        InvoiceStatus::Unpaid => Money::zero(),
        InvoiceStatus::Partial => {
            return Err(CoreError::InvalidStatusOverride {
                requested: status.to_string(),
            })
        }
    };

    Ok(Invoice {
        paid_amount,
        status: derive_status(paid_amount, invoice.total),
        ..invoice.clone()
    })
}

/// Re-derives item amounts, totals and status after an edit.
///
/// The paid amount is kept but capped to the (possibly lower) new total.
pub fn recompute(invoice: &Invoice) -> Invoice {
    let items: Vec<InvoiceItem> = invoice
        .items
        .iter()
        .map(|item| InvoiceItem {
            amount: item.rate.multiply_quantity(item.qty),
            ..item.clone()
        })
        .collect();
    let totals = compute_totals(&items, invoice.gst_rate, invoice.discount);
    let paid_amount = invoice.paid_amount.min(totals.total);

    Invoice {
        items,
        subtotal: totals.subtotal,
        gst_amount: totals.gst_amount,
        total: totals.total,
        paid_amount,
        status: derive_status(paid_amount, totals.total),
        ..invoice.clone()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
