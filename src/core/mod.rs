//! Core business logic module
//!
//! This module contains the ledger and the components it coordinates:
//! - `traits` - Seams for the store, the notifier and the clock
//! - `atomic_store` - In-memory `AtomicStore` implementation
//! - `ids` - Transaction id generation and anonymization
//! - `pricing` - Money value of a chip quantity
//! - `promo_registry` - Promo code CRUD, validation and redemption
//! - `vip_resolver` - VIP tier and progress from paid volume
//! - `affiliate_ledger` - Referral capture and commission accounting
//! - `settings` - Invariant checks for operator settings
//! - `ledger` - The `TransactionLedger` state machine

pub mod affiliate_ledger;
pub mod atomic_store;
pub mod ids;
pub mod ledger;
pub mod pricing;
pub mod promo_registry;
pub mod settings;
pub mod traits;
pub mod vip_resolver;

pub use atomic_store::MemoryStore;
pub use ledger::{TransactionLedger, LEDGER_KEY};
pub use promo_registry::NewPromo;
pub use traits::{AtomicStore, Clock, Committed, ManualClock, Notifier, NullNotifier, SystemClock};
