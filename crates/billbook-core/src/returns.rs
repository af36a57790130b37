//! # Return Processor
//!
//! Validates returns and decides what a status change means for stock.
//!
//! ## Lifecycle
//! ```text
//!              ┌──────── Apply ────────┐
//!              │                       ▼
//!         ┌─────────┐             ┌───────────┐
//!         │ pending │◄── Reverse ─│ processed │
//!         └────┬────┘             └─────┬─────┘
//!        None  │  ▲ None        Reverse │  ▲ Apply
//!              ▼  │                     ▼  │
//!         ┌──────────┐                  │  │
//!         │ rejected │◄─────────────────┘  │
//!         └────┬─────┘─────────────────────┘
//! ```
//!
//! Stock is touched only when a return enters or leaves `processed`, so a
//! return's goods are counted at most once whatever path it takes.
//! Returns never change the source invoice's payment state.

use std::collections::HashMap;

use crate::error::{CoreError, CoreResult, Warning};
use crate::types::{Invoice, PartyType, Return, ReturnStatus, ReturnType};

/// What a return transition does to stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockEffect {
    Apply,
    Reverse,
    None,
}

/// A return after a status change, with the stock work it requires.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub ret: Return,
    pub stock_effect: StockEffect,
}

/// Checks a return's lines.
///
/// Quantities must be positive. When the source invoice is given, returning
/// more of a product than it carried produces a warning, not an error.
pub fn validate_return(ret: &Return, source_invoice: Option<&Invoice>) -> CoreResult<Vec<Warning>> {
    if ret.items.is_empty() {
        return Err(CoreError::EmptyDocument {
            document: "return".to_string(),
        });
    }
    if let Some(item) = ret.items.iter().find(|item| item.qty <= 0) {
        return Err(CoreError::InvalidQuantity {
            item: item.product_name.clone(),
            qty: item.qty,
        });
    }

    let Some(invoice) = source_invoice else {
        return Ok(Vec::new());
    };

    let mut invoiced: HashMap<&str, i64> = HashMap::new();
    for item in &invoice.items {
        if let Some(product_id) = item.product_id.as_deref() {
            *invoiced.entry(product_id).or_default() += item.qty;
        }
    }

    // Sum per product first; a product may be split across lines
    let mut returned: Vec<(&str, &str, i64)> = Vec::new();
    for item in &ret.items {
        let Some(product_id) = item.product_id.as_deref() else {
            continue;
        };
        match returned.iter_mut().find(|(id, _, _)| *id == product_id) {
            Some(entry) => entry.2 += item.qty,
            None => returned.push((product_id, &item.product_name, item.qty)),
        }
    }

    let warnings = returned
        .into_iter()
        .filter_map(|(product_id, product_name, qty)| {
            let limit = invoiced.get(product_id).copied().unwrap_or(0);
            (qty > limit).then(|| Warning::ReturnExceedsInvoiced {
                product_id: product_id.to_string(),
                product_name: product_name.to_string(),
                invoiced: limit,
                returned: qty,
            })
        })
        .collect();

    Ok(warnings)
}

/// Return type for a party when the caller did not give one.
pub fn infer_return_type(requested: Option<ReturnType>, party_type: PartyType) -> ReturnType {
    requested.unwrap_or_else(|| ReturnType::for_party(party_type))
}

/// Warns when a return's type is on the wrong side for its party.
pub fn type_mismatch(ret: &Return, party_type: PartyType) -> Option<Warning> {
    (ret.return_type != ReturnType::for_party(party_type)).then(|| Warning::ReturnTypeMismatch {
        return_number: ret.return_number.clone(),
    })
}

/// Moves a return to `new_status`. Setting the current status again is a no-op.
pub fn transition(ret: &Return, new_status: ReturnStatus) -> Transition {
    use ReturnStatus::{Pending, Processed, Rejected};

    let stock_effect = match (ret.status, new_status) {
        (from, to) if from == to => StockEffect::None,
        (Pending | Rejected, Processed) => StockEffect::Apply,
        (Processed, Pending | Rejected) => StockEffect::Reverse,
        _ => StockEffect::None,
    };

    Transition {
        ret: Return {
            status: new_status,
            ..ret.clone()
        },
        stock_effect,
    }
}

/// Stock work needed before a return is deleted.
pub fn deletion_effect(ret: &Return) -> StockEffect {
    if ret.status == ReturnStatus::Processed {
        StockEffect::Reverse
    } else {
        StockEffect::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stock::{apply_return, reverse_return};
    use crate::testing::{customer, goods_invoice, goods_return, product};
    use crate::types::InvoiceItem;
    use crate::Money;

    #[test]
    fn test_transition_table() {
        let pending = goods_return(ReturnType::Sales, "c1", "2026-04-01", &[(&product("Widget", 10), 2)]);

        let processed = transition(&pending, ReturnStatus::Processed);
        assert_eq!(processed.stock_effect, StockEffect::Apply);
        assert_eq!(processed.ret.status, ReturnStatus::Processed);

        assert_eq!(transition(&processed.ret, ReturnStatus::Rejected).stock_effect, StockEffect::Reverse);
        assert_eq!(transition(&processed.ret, ReturnStatus::Pending).stock_effect, StockEffect::Reverse);
        assert_eq!(transition(&pending, ReturnStatus::Rejected).stock_effect, StockEffect::None);

        let rejected = transition(&pending, ReturnStatus::Rejected).ret;
        assert_eq!(transition(&rejected, ReturnStatus::Pending).stock_effect, StockEffect::None);
        assert_eq!(transition(&rejected, ReturnStatus::Processed).stock_effect, StockEffect::Apply);
    }

    #[test]
    fn test_repeated_transition_is_noop() {
        let pending = goods_return(ReturnType::Sales, "c1", "2026-04-01", &[(&product("Widget", 10), 2)]);
        let processed = transition(&pending, ReturnStatus::Processed).ret;

        let again = transition(&processed, ReturnStatus::Processed);
        assert_eq!(again.stock_effect, StockEffect::None);
    }

    #[test]
    fn test_process_then_reject_restores_stock() {
        let widget = product("Widget", 10);
        let pending = goods_return(ReturnType::Sales, "c1", "2026-04-01", &[(&widget, 2)]);

        let processed = transition(&pending, ReturnStatus::Processed);
        let after_process = apply_return(&[widget.clone()], &processed.ret);
        assert_eq!(after_process.products[0].stock, 12);

        let rejected = transition(&processed.ret, ReturnStatus::Rejected);
        assert_eq!(rejected.stock_effect, StockEffect::Reverse);
        let after_reject = reverse_return(&after_process.products, &rejected.ret);
        assert_eq!(after_reject.products[0].stock, 10);
    }

    #[test]
    fn test_deletion_effect() {
        let pending = goods_return(ReturnType::Purchase, "s1", "2026-04-01", &[(&product("Widget", 10), 3)]);
        assert_eq!(deletion_effect(&pending), StockEffect::None);

        let processed = transition(&pending, ReturnStatus::Processed).ret;
        assert_eq!(deletion_effect(&processed), StockEffect::Reverse);
    }

    #[test]
    fn test_zero_quantity_is_rejected() {
        let mut ret = goods_return(ReturnType::Sales, "c1", "2026-04-01", &[(&product("Widget", 10), 1)]);
        ret.items[0].qty = 0;

        let err = validate_return(&ret, None).unwrap_err();
        assert!(matches!(err, CoreError::InvalidQuantity { qty: 0, .. }));
    }

    #[test]
    fn test_empty_return_is_rejected() {
        let mut ret = goods_return(ReturnType::Sales, "c1", "2026-04-01", &[(&product("Widget", 10), 1)]);
        ret.items.clear();
        assert!(matches!(validate_return(&ret, None), Err(CoreError::EmptyDocument { .. })));
    }

    #[test]
    fn test_over_return_is_only_a_warning() {
        let widget = product("Widget", 10);
        let invoice = goods_invoice("c1", "2026-04-01", &[(&widget, 2)]);
        let ret = goods_return(ReturnType::Sales, "c1", "2026-04-02", &[(&widget, 3)]);

        let warnings = validate_return(&ret, Some(&invoice)).unwrap();
        assert_eq!(
            warnings,
            vec![Warning::ReturnExceedsInvoiced {
                product_id: widget.id.clone(),
                product_name: "Widget".to_string(),
                invoiced: 2,
                returned: 3,
            }]
        );
    }

    #[test]
    fn test_split_lines_are_summed_against_invoice() {
        let widget = product("Widget", 10);
        let invoice = goods_invoice("c1", "2026-04-01", &[(&widget, 4)]);
        let mut ret = goods_return(ReturnType::Sales, "c1", "2026-04-02", &[(&widget, 2)]);
        ret.items.push(InvoiceItem::new(Some(widget.id.clone()), "Widget", 2, Money::from_cents(1000)));

        assert!(validate_return(&ret, Some(&invoice)).unwrap().is_empty());

        ret.items[1].qty = 3;
        assert_eq!(validate_return(&ret, Some(&invoice)).unwrap().len(), 1);
    }

    #[test]
    fn test_type_inference_and_mismatch() {
        let party = customer("c1");
        assert_eq!(infer_return_type(None, party.party_type), ReturnType::Sales);
        assert_eq!(infer_return_type(Some(ReturnType::Purchase), party.party_type), ReturnType::Purchase);

        let ret = goods_return(ReturnType::Purchase, "c1", "2026-04-01", &[(&product("Widget", 10), 1)]);
        assert!(type_mismatch(&ret, PartyType::Customer).is_some());
        assert!(type_mismatch(&ret, PartyType::Supplier).is_none());
    }
}
