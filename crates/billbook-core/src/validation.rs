//! # Validation Module
//!
//! Input checks run before any reconciliation logic or store write.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Layer 1: UI forms (outside this workspace)                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── item quantities (> 0) and rates (≥ 0)                             │
//! │  ├── payment amounts (> 0)                                             │
//! │  ├── names and GST rates                                               │
//! │  └── product references on lines                                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite (NOT NULL / UNIQUE on document numbers)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Hard failures only. Soft checks (oversell, over-return) produce
//! [`Warning`](crate::error::Warning)s in the engines instead.

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{InvoiceItem, Product, TaxRate};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest name accepted for parties and products.
const MAX_NAME_LEN: usize = 200;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a party or product name.
///
/// ```rust
/// use billbook_core::validation::validate_name;
///
/// assert!(validate_name("name", "Sharma Traders").is_ok());
/// assert!(validate_name("name", "   ").is_err());
/// ```
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.len() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a GST rate (0% to 100%).
pub fn validate_gst_rate(rate: TaxRate) -> ValidationResult<()> {
    if rate.bps() > 10000 {
        return Err(ValidationError::OutOfRange {
            field: "gst_rate".to_string(),
            min: 0,
            max: 10000,
        });
    }

    Ok(())
}

/// Validates a payment or receipt amount (must be > 0).
pub fn validate_payment_amount(amount: Money) -> CoreResult<()> {
    if !amount.is_positive() {
        return Err(CoreError::InvalidAmount {
            field: "transaction amount".to_string(),
            amount,
        });
    }

    Ok(())
}

/// Validates a discount (must be ≥ 0).
pub fn validate_discount(discount: Money) -> CoreResult<()> {
    if discount.is_negative() {
        return Err(CoreError::InvalidAmount {
            field: "discount".to_string(),
            amount: discount,
        });
    }

    Ok(())
}

// =============================================================================
// Line Items
// =============================================================================

/// Validates the line items of an invoice or return.
///
/// ## Rules
/// - At least one line
/// - Every `qty > 0` (`InvalidQuantity` otherwise)
/// - Every `rate ≥ 0`
/// - Every `qty × rate` fits in [`Money`]
/// - Every line has a product name
pub fn validate_items(document: &str, items: &[InvoiceItem]) -> CoreResult<()> {
    if items.is_empty() {
        return Err(CoreError::EmptyDocument {
            document: document.to_string(),
        });
    }

    for item in items {
        validate_name("product_name", &item.product_name)?;

        if item.qty <= 0 {
            return Err(CoreError::InvalidQuantity {
                item: item.product_name.clone(),
                qty: item.qty,
            });
        }

        if item.rate.is_negative() {
            return Err(CoreError::InvalidAmount {
                field: format!("rate of '{}'", item.product_name),
                amount: item.rate,
            });
        }

        if item.rate.checked_multiply_quantity(item.qty).is_none() {
            return Err(CoreError::InvalidAmount {
                field: format!("amount of '{}'", item.product_name),
                amount: item.rate,
            });
        }
    }

    Ok(())
}

/// Checks that every `product_id` on incoming lines names a known product.
///
/// Free-text lines (`product_id = None`) always pass. The stock engine skips
/// unknown ids on documents already stored; new and edited documents are
/// held to this check instead.
pub fn validate_product_refs(products: &[Product], items: &[InvoiceItem]) -> CoreResult<()> {
    let missing = items
        .iter()
        .filter_map(|item| item.product_id.as_deref())
        .find(|id| !products.iter().any(|product| product.id == *id));

    match missing {
        Some(id) => Err(CoreError::not_found("Product", id)),
        None => Ok(()),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn item(qty: i64, rate: i64) -> InvoiceItem {
        InvoiceItem::new(None, "Widget", qty, Money::from_cents(rate))
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("name", "Acme").is_ok());
        assert!(validate_name("name", "").is_err());
        assert!(validate_name("name", &"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_items_rejects_empty() {
        let err = validate_items("Invoice", &[]).unwrap_err();
        assert!(matches!(err, CoreError::EmptyDocument { .. }));
    }

    #[test]
    fn test_validate_items_rejects_non_positive_qty() {
        let err = validate_items("Invoice", &[item(1, 100), item(0, 100)]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidQuantity { qty: 0, .. }));

        let err = validate_items("Invoice", &[item(-2, 100)]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidQuantity { qty: -2, .. }));
    }

    #[test]
    fn test_validate_items_allows_zero_rate() {
        assert!(validate_items("Invoice", &[item(1, 0)]).is_ok());
        assert!(validate_items("Invoice", &[item(1, -1)]).is_err());
    }

    #[test]
    fn test_validate_items_rejects_overflowing_amount() {
        let err = validate_items("Invoice", &[item(3, i64::MAX / 2)]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidAmount { .. }));
    }

    #[test]
    fn test_validate_product_refs() {
        let rice = crate::testing::product("Rice", 10);
        let known = InvoiceItem::new(Some(rice.id.clone()), "Rice", 1, Money::from_cents(100));
        let ghost = InvoiceItem::new(Some("no-such-product".to_string()), "Ghost", 1, Money::from_cents(100));

        assert!(validate_product_refs(&[rice.clone()], &[known.clone(), item(1, 100)]).is_ok());

        let err = validate_product_refs(&[rice], &[known, ghost]).unwrap_err();
        assert!(matches!(err, CoreError::NotFound { ref entity, ref id } if entity == "Product" && id == "no-such-product"));
    }

    #[test]
    fn test_validate_payment_amount() {
        assert!(validate_payment_amount(Money::from_cents(1)).is_ok());
        assert!(validate_payment_amount(Money::zero()).is_err());
        assert!(validate_payment_amount(Money::from_cents(-5)).is_err());
    }

    #[test]
    fn test_validate_gst_rate() {
        assert!(validate_gst_rate(TaxRate::from_bps(1800)).is_ok());
        assert!(validate_gst_rate(TaxRate::from_bps(10001)).is_err());
    }
}
