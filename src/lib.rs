//! Chip Exchange Ledger Library
//! # Overview
//!
//! This library is the transaction and incentive ledger of a chip exchange:
//! users sell in-game chips for money or buy chip packages, an operator
//! verifies and settles each transaction, and three incentive programs
//! (promo codes, VIP tiers, affiliate commissions) adjust prices and reward
//! users.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (Transaction, PromoCode, VipTier, etc.)
//! - [`cli`] - CLI arguments parsing and command dispatch
//! - [`core`] - Business logic components:
//!   - [`core::ledger`] - The transaction state machine and incentive orchestration
//!   - [`core::atomic_store`] - Serialized read-modify-write storage
//!   - [`core::pricing`] - Money value of a chip quantity
//!   - [`core::promo_registry`] - Promo code validation and redemption
//!   - [`core::vip_resolver`] - VIP tier from lifetime paid volume
//!   - [`core::affiliate_ledger`] - Referral commissions
//! - [`io`] - JSON file persistence, CSV exports and notifiers
//!
//! # Transaction Lifecycle
//!
//! - **PENDING**: Recorded, waiting for the operator
//! - **VERIFYING**: The operator is checking the transfer
//! - **PAID**: Settled (terminal)
//! - **REJECTED**: Refused (terminal)
//!
//! # Pricing
//!
//! Rates are money per 1,000,000,000 chips. Promo and VIP percentages are
//! taken off (BUY) or added to (SELL) the base value independently.

// Module declarations
pub mod cli;
pub mod core;
pub mod io;
pub mod types;

pub use core::{AtomicStore, MemoryStore, NewPromo, TransactionLedger};
pub use io::{JsonFileStore, write_transactions_csv};
pub use types::{
    LedgerError, NewTransaction, PromoCode, Transaction, TransactionId, TransactionStatus,
    TransactionType,
};
