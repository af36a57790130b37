//! # Error Types
//!
//! Domain-specific error and warning types for billbook-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  billbook-core (this file)                                             │
//! │  ├── CoreError        - Operation rejected, nothing written            │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  └── Warning          - Operation proceeds, caller is told why         │
//! │                                                                         │
//! │  billbook-db (separate crate)                                          │
//! │  ├── DbError          - Store read/write failures                      │
//! │  └── ServiceError     - CoreError | DbError                            │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ServiceError → caller             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Errors vs Warnings
//! The billing rules are permissive: overselling and over-returning are
//! allowed and only reported. Those conditions are [`Warning`]s, carried out
//! of an operation next to its result. Anything that must stop an operation
//! before a write is a [`CoreError`].

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Reconciliation errors. Returning one of these means nothing was written.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A referenced entity does not exist.
    ///
    /// ## When This Occurs
    /// - Invoice id passed to a status override is unknown
    /// - Party id on a new invoice, transaction or return is unknown
    /// - Product id on a new or edited invoice or return line is unknown
    /// - Return points at an invoice that was deleted
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// An item quantity is zero or negative.
    #[error("Invalid quantity {qty} for '{item}': quantity must be positive")]
    InvalidQuantity { item: String, qty: i64 },

    /// A money amount is out of range (negative rate, non-positive payment).
    #[error("Invalid amount for {field}: {amount}")]
    InvalidAmount { field: String, amount: Money },

    /// A document (invoice or return) has no line items.
    #[error("{document} must have at least one item")]
    EmptyDocument { document: String },

    /// `partial` is a derived status and cannot be forced.
    #[error("Status '{requested}' cannot be set explicitly; use paid or unpaid")]
    InvalidStatusOverride { requested: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, malformed document number).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Warnings
// =============================================================================

/// Non-blocking conditions raised while reconciling.
///
/// ## User Workflow
/// ```text
/// Save invoice (sell 5 × Widget, stock 3)
///      │
///      ▼
/// Stock written as -2  ──► Warning::InsufficientStock { available: 3, requested: 5 }
///      │
///      ▼
/// UI shows success + "Widget oversold by 2"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// A stock decrease took the product below zero.
    InsufficientStock {
        product_id: String,
        product_name: String,
        available: i64,
        requested: i64,
    },

    /// A return line asks for more than the source invoice carried.
    ReturnExceedsInvoiced {
        product_id: String,
        product_name: String,
        invoiced: i64,
        returned: i64,
    },

    /// A return's type does not match its party (e.g. sales return for a supplier).
    ReturnTypeMismatch { return_number: String },

    /// Part of a payment/receipt could not be applied to any invoice.
    UnallocatedRemainder {
        transaction_id: String,
        amount: Money,
    },

    /// A payment was recorded against a customer, or a receipt against a supplier.
    TransactionTypeMismatch { transaction_id: String },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::InsufficientStock {
                product_name,
                available,
                requested,
                ..
            } => write!(
                f,
                "Insufficient stock for {}: available {}, requested {}",
                product_name, available, requested
            ),
            Warning::ReturnExceedsInvoiced {
                product_name,
                invoiced,
                returned,
                ..
            } => write!(
                f,
                "Returned quantity {} of {} exceeds invoiced quantity {}",
                returned, product_name, invoiced
            ),
            Warning::ReturnTypeMismatch { return_number } => {
                write!(f, "Return {} does not match its party type", return_number)
            }
            Warning::UnallocatedRemainder {
                transaction_id,
                amount,
            } => write!(
                f,
                "{} of transaction {} was not allocated to any invoice",
                amount, transaction_id
            ),
            Warning::TransactionTypeMismatch { transaction_id } => write!(
                f,
                "Transaction {} does not match its party type; not allocated",
                transaction_id
            ),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::not_found("Invoice", "abc");
        assert_eq!(err.to_string(), "Invoice not found: abc");

        let err = CoreError::InvalidQuantity {
            item: "Widget".to_string(),
            qty: 0,
        };
        assert_eq!(
            err.to_string(),
            "Invalid quantity 0 for 'Widget': quantity must be positive"
        );
    }

    #[test]
    fn test_warning_display() {
        let warning = Warning::InsufficientStock {
            product_id: "p1".to_string(),
            product_name: "Widget".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            warning.to_string(),
            "Insufficient stock for Widget: available 3, requested 5"
        );
    }

    #[test]
    fn test_warning_serializes_with_kind_tag() {
        let warning = Warning::ReturnTypeMismatch {
            return_number: "RET-2601-001".to_string(),
        };
        let json = serde_json::to_value(&warning).unwrap();
        assert_eq!(json["kind"], "return_type_mismatch");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
