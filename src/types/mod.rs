//! Types module
//!
//! Contains the plain data structures used throughout the ledger.
//! This module organizes types into logical submodules:
//! - `transaction`: transactions, statuses, submission input and events
//! - `promo`: promo codes and validation verdicts
//! - `vip`: VIP tiers and resolved status
//! - `affiliate`: referral commission records
//! - `settings`: operator settings and the persisted ledger document
//! - `error`: error types for the ledger

pub mod affiliate;
pub mod error;
pub mod promo;
pub mod settings;
pub mod transaction;
pub mod vip;

pub use affiliate::{AffiliateCommission, AffiliateRecord, AffiliateStats};
pub use error::LedgerError;
pub use promo::{PromoCode, PromoScope, PromoUpdate, PromoVerdict};
pub use settings::{
    default_chip_packages, AdminSettings, AffiliateSystemSettings, Branding, ChipPackage,
    ExchangeRates, FeatureToggles, LedgerState, VipSystemSettings, CHIP_UNIT,
};
pub use transaction::{
    LedgerSummary, NewTransaction, Order, PaymentDetails, PaymentMethod, PublicTransaction,
    Transaction, TransactionDetails, TransactionEvent, TransactionFilter, TransactionId,
    TransactionStatus, TransactionType, UserId,
};
pub use vip::{VipStatus, VipTier};
