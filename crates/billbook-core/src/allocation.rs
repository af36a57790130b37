//! # Payment Allocator
//!
//! Spreads an incoming payment or receipt over a party's outstanding
//! invoices, oldest first.
//!
//! ## Whole-Invoice Policy (default)
//! ```text
//! Receipt: 150        Unpaid invoices (oldest first)
//!                     ┌──────────────┐  ┌──────────────┐
//!                     │ I1  total 100│  │ I2  total 200│
//!                     └──────┬───────┘  └──────┬───────┘
//!  remaining 150 ≥ 100 ──────┘ paid            │
//!  remaining  50 < 200 ────────────────────────┘ stop, untouched
//!
//!  Result: updated [I1], allocated 100, unallocated 50
//! ```
//!
//! ## Spill Policy
//! With [`AllocationMode::SpillPartial`], partial invoices are also
//! candidates and each one takes `min(remaining, balance)`, so the last
//! invoice touched may end up `partial`.
//!
//! In both modes the unallocated remainder is returned to the caller rather
//! than dropped; it is not carried as credit on the party.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::Money;
use crate::status::{apply_payment, remaining_balance};
use crate::types::{Invoice, InvoiceStatus};

/// How a payment is spread across invoices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationMode {
    /// Only unpaid invoices, only when fully covered; stop at the first one
    /// the remaining amount cannot cover.
    #[default]
    WholeInvoices,
    /// Unpaid and partial invoices; the last one may be partly paid.
    SpillPartial,
}

impl std::str::FromStr for AllocationMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "whole_invoices" | "whole" => Ok(AllocationMode::WholeInvoices),
            "spill_partial" | "spill" | "partial" => Ok(AllocationMode::SpillPartial),
            other => Err(ValidationError::InvalidFormat {
                field: "allocation_mode".to_string(),
                reason: format!("unknown mode '{}', expected whole_invoices or spill_partial", other),
            }),
        }
    }
}

/// Result of allocating one payment.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Allocation {
    /// Invoices that received money, in allocation order. Only these need writing.
    pub updated: Vec<Invoice>,
    pub allocated: Money,
    pub unallocated: Money,
}

/// Candidates for allocation, oldest first.
///
/// The sort is stable, so same-date invoices keep the order they were given
/// in (the store lists them in insertion order).
fn candidates<'a>(invoices: &'a [Invoice], mode: AllocationMode) -> Vec<&'a Invoice> {
    let mut open: Vec<&Invoice> = invoices
        .iter()
        .filter(|invoice| match mode {
            AllocationMode::WholeInvoices => invoice.status == InvoiceStatus::Unpaid,
            AllocationMode::SpillPartial => invoice.status != InvoiceStatus::Paid,
        })
        .collect();
    open.sort_by_key(|invoice| invoice.date);
    open
}

/// Allocates `amount` across one party's invoices.
///
/// `invoices` should already be filtered to the party. Invoices that get
/// nothing are not returned.
pub fn allocate(invoices: &[Invoice], amount: Money, mode: AllocationMode) -> Allocation {
    let mut remaining = amount.floor_zero();
    let mut updated = Vec::new();

    for invoice in candidates(invoices, mode) {
        if !remaining.is_positive() {
            break;
        }

        match mode {
            AllocationMode::WholeInvoices => {
                if remaining < invoice.total {
                    break;
                }
                remaining -= invoice.total;
                updated.push(apply_payment(invoice, invoice.total));
            }
            AllocationMode::SpillPartial => {
                let share = remaining.min(remaining_balance(invoice));
                if share.is_zero() {
                    continue;
                }
                remaining -= share;
                updated.push(apply_payment(invoice, share));
            }
        }
    }

    Allocation {
        updated,
        allocated: amount.floor_zero() - remaining,
        unallocated: remaining,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
