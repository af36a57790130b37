//! # Party Ledger
//!
//! Builds a chronological statement for one party and the receivable /
//! payable position across all parties.
//!
//! ```text
//! invoices(party) ─┐
//!                  ├──► concat ──► stable sort by date ──► Vec<LedgerEntry>
//! transactions ────┘   (invoices first)                        │
//!                                                              ▼
//!                                                   totals(ledger, party_type)
//! ```
//!
//! Recomputed on every call; nothing here is stored.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{
    Invoice, InvoiceStatus, LedgerEntry, LedgerEntryKind, LedgerTotals, Party, PartyType,
    Transaction, TransactionType,
};

/// Statement lines for `party_id`, oldest first.
///
/// On equal dates invoices come before transactions, each in the order given.
pub fn ledger_for(party_id: &str, invoices: &[Invoice], transactions: &[Transaction]) -> Vec<LedgerEntry> {
    let invoice_entries = invoices
        .iter()
        .filter(|invoice| invoice.party_id == party_id)
        .map(|invoice| LedgerEntry {
            date: invoice.date,
            kind: LedgerEntryKind::Invoice {
                status: invoice.status,
            },
            document_id: invoice.id.clone(),
            reference: Some(invoice.invoice_number.clone()),
            amount: invoice.total,
        });

    let transaction_entries = transactions
        .iter()
        .filter(|transaction| transaction.party_id == party_id)
        .map(|transaction| LedgerEntry {
            date: transaction.date,
            kind: LedgerEntryKind::Transaction {
                transaction_type: transaction.transaction_type,
            },
            document_id: transaction.id.clone(),
            reference: transaction.reference.clone(),
            amount: transaction.amount,
        });

    let mut entries: Vec<LedgerEntry> = invoice_entries.chain(transaction_entries).collect();
    entries.sort_by_key(|entry| entry.date);
    entries
}

/// Sums a statement.
///
/// `paid` counts fully paid invoices plus the transactions that settle this
/// party's side (receipts for customers, payments for suppliers). Partly paid
/// invoices contribute nothing to `paid` until they are settled.
pub fn totals(ledger: &[LedgerEntry], party_type: PartyType) -> LedgerTotals {
    let settling = TransactionType::settling(party_type);
    let mut total_amount = Money::zero();
    let mut paid_amount = Money::zero();

    for entry in ledger {
        match &entry.kind {
            LedgerEntryKind::Invoice { status } => {
                total_amount += entry.amount;
                if *status == InvoiceStatus::Paid {
                    paid_amount += entry.amount;
                }
            }
            LedgerEntryKind::Transaction { transaction_type } if *transaction_type == settling => {
                paid_amount += entry.amount;
            }
            LedgerEntryKind::Transaction { .. } => {}
        }
    }

    LedgerTotals {
        total_amount,
        paid_amount,
        unpaid_amount: (total_amount - paid_amount).floor_zero(),
    }
}

/// What customers owe the business and what it owes suppliers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BalanceSummary {
    pub receivables: Money,
    pub payables: Money,
}

/// Sums every party's unpaid amount by side.
pub fn balance_summary(parties: &[Party], invoices: &[Invoice], transactions: &[Transaction]) -> BalanceSummary {
    parties.iter().fold(BalanceSummary::default(), |mut summary, party| {
        let ledger = ledger_for(&party.id, invoices, transactions);
        let unpaid = totals(&ledger, party.party_type).unpaid_amount;
        match party.party_type {
            PartyType::Customer => summary.receivables += unpaid,
            PartyType::Supplier => summary.payables += unpaid,
        }
        summary
    })
}
