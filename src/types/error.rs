//! Error types for the chip exchange ledger
//!
//! This module defines every error the ledger can report to its collaborators.
//! Messages are meant to be shown to users and operators as-is.
//!
//! # Error Categories
//!
//! - **Validation Errors**: missing or malformed input, rejected promo codes,
//!   illegal status transitions. Nothing is mutated.
//! - **Lookup Errors**: unknown transaction, promo code or affiliate id.
//! - **Conflict Errors**: duplicate promo codes.
//! - **Storage Errors**: the persistence medium failed; the in-memory commit
//!   is kept and the caller is told to try again.
//! - **Delivery Errors**: the messaging collaborator failed; only ever logged.

use super::transaction::TransactionStatus;
use thiserror::Error;

/// Main error type for the ledger
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Missing or malformed input
    #[error("Invalid {field}: {message}")]
    Validation {
        /// Name of the offending input field
        field: String,
        /// What is wrong with it
        message: String,
    },

    /// A promo code failed validation while creating a transaction
    #[error("Promo code '{code}' rejected: {reason}")]
    PromoRejected {
        /// The code as submitted
        code: String,
        /// Human-readable reason, e.g. "usage limit reached"
        reason: String,
    },

    /// Unknown id on lookup, transition or payout
    #[error("{entity} '{id}' not found")]
    NotFound {
        /// Kind of entity looked up ("transaction", "promo code", "affiliate")
        entity: String,
        /// The id that was not found
        id: String,
    },

    /// A promo code with this code already exists (case-insensitive)
    #[error("Promo code '{code}' already exists")]
    DuplicateCode {
        /// The conflicting code
        code: String,
    },

    /// The state machine does not allow this transition
    #[error("Transaction '{id}' cannot move from {from} to {to}")]
    InvalidTransition {
        /// Transaction id
        id: String,
        /// Current status
        from: TransactionStatus,
        /// Requested status
        to: TransactionStatus,
    },

    /// The persistence medium could not store a committed value
    #[error("Storage error for '{key}': {message}")]
    Storage {
        /// Store key being written
        key: String,
        /// Description of the medium failure
        message: String,
    },

    /// A notification could not be delivered
    #[error("Delivery error: {message}")]
    Delivery {
        /// Description of the delivery failure
        message: String,
    },
}

impl From<std::io::Error> for LedgerError {
    fn from(error: std::io::Error) -> Self {
        LedgerError::Storage {
            key: String::new(),
            message: error.to_string(),
        }
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(error: serde_json::Error) -> Self {
        LedgerError::Storage {
            key: String::new(),
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl LedgerError {
    /// Create a Validation error
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        LedgerError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Create a PromoRejected error
    pub fn promo_rejected(code: &str, reason: impl Into<String>) -> Self {
        LedgerError::PromoRejected {
            code: code.to_string(),
            reason: reason.into(),
        }
    }

    /// Create a NotFound error
    pub fn not_found(entity: &str, id: &str) -> Self {
        LedgerError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    /// Create a DuplicateCode error
    pub fn duplicate_code(code: &str) -> Self {
        LedgerError::DuplicateCode {
            code: code.to_string(),
        }
    }

    /// Create an InvalidTransition error
    pub fn invalid_transition(id: &str, from: TransactionStatus, to: TransactionStatus) -> Self {
        LedgerError::InvalidTransition {
            id: id.to_string(),
            from,
            to,
        }
    }

    /// Create a Storage error
    pub fn storage(key: &str, message: impl Into<String>) -> Self {
        LedgerError::Storage {
            key: key.to_string(),
            message: message.into(),
        }
    }

    /// Create a Delivery error
    pub fn delivery(message: impl Into<String>) -> Self {
        LedgerError::Delivery {
            message: message.into(),
        }
    }

    /// Whether the caller should just be told to try again
    ///
    /// Storage and delivery failures carry no user-fixable detail.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LedgerError::Storage { .. } | LedgerError::Delivery { .. }
        )
    }

    /// Attach the store key to a Storage error
    pub fn with_key(self, key: &str) -> Self {
        match self {
            LedgerError::Storage { message, .. } => LedgerError::Storage {
                key: key.to_string(),
                message,
            },
            other => other,
        }
    }
}
