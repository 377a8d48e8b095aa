//! Transaction-related types for the chip exchange ledger
//!
//! This module defines the transaction record, its lifecycle status, the
//! type-specific payload (payment destination for SELL, chip package for BUY)
//! and the submission input accepted by the ledger.

use super::settings::ChipPackage;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Transaction identifier (human-readable, e.g. `RP-M2K9Q0ZL`)
pub type TransactionId = String;

/// Game-account identifier of a user (seller, buyer or referrer)
pub type UserId = String;

/// Direction of a transaction, seen from the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    /// User sends chips and receives cash
    Sell,

    /// User pays cash and receives a chip package
    Buy,
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionType::Sell => write!(f, "SELL"),
            TransactionType::Buy => write!(f, "BUY"),
        }
    }
}

/// Lifecycle status of a transaction
///
/// `Pending → Verifying → Paid`, with `Rejected` reachable from `Pending` or
/// `Verifying`. `Paid` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionStatus {
    Pending,
    Verifying,
    Paid,
    Rejected,
}

impl TransactionStatus {
    /// Whether no further transition may leave this status
    pub fn is_terminal(self) -> bool {
        matches!(self, TransactionStatus::Paid | TransactionStatus::Rejected)
    }

    /// Whether the state machine allows moving from `self` to `next`
    ///
    /// Re-entering the current non-terminal status is allowed and is a no-op.
    pub fn can_transition_to(self, next: TransactionStatus) -> bool {
        use TransactionStatus::*;
        match (self, next) {
            (Pending, Pending | Verifying | Paid | Rejected) => true,
            (Verifying, Verifying | Paid | Rejected) => true,
            _ => false,
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TransactionStatus::Pending => "PENDING",
            TransactionStatus::Verifying => "VERIFYING",
            TransactionStatus::Paid => "PAID",
            TransactionStatus::Rejected => "REJECTED",
        };
        f.write_str(label)
    }
}

/// How a seller wants to be paid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    Bank,
    #[serde(rename = "E-Wallet")]
    EWallet,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::Bank => write!(f, "Bank"),
            PaymentMethod::EWallet => write!(f, "E-Wallet"),
        }
    }
}

/// Payment destination of a SELL transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetails {
    pub method: PaymentMethod,
    /// Bank or e-wallet provider, e.g. `BCA` or `DANA`
    pub provider: String,
    /// Account number, or phone number for e-wallets
    pub account_number: String,
    pub account_name: String,
}

/// Type-specific payload of a stored transaction
///
/// The variant fixes the transaction type for the lifetime of the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum TransactionDetails {
    Sell {
        #[serde(rename = "paymentDetails")]
        payment_details: PaymentDetails,
    },
    Buy {
        #[serde(rename = "chipPackage")]
        chip_package: ChipPackage,
    },
}

impl TransactionDetails {
    pub fn tx_type(&self) -> TransactionType {
        match self {
            TransactionDetails::Sell { .. } => TransactionType::Sell,
            TransactionDetails::Buy { .. } => TransactionType::Buy,
        }
    }
}

/// A ledger transaction
///
/// `money_value` is computed once at creation and never recomputed.
/// `verified_at` and `paid_at` are set the first time the transaction enters
/// `Verifying` / `Paid` and are never overwritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,

    /// Masked id safe to show on public feeds
    pub anonymized_id: String,

    /// Counterparty game-account id
    pub destination_id: UserId,

    /// Chip quantity in the smallest chip denomination
    pub chip_amount: u64,

    /// Final money value after promo and VIP modifiers
    pub money_value: Decimal,

    pub status: TransactionStatus,

    pub details: TransactionDetails,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promo_code_used: Option<String>,

    /// Id of the redeemed promo; survives a later rename of its code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promo_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referrer_id: Option<UserId>,

    pub created_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
}

impl Transaction {
    pub fn tx_type(&self) -> TransactionType {
        self.details.tx_type()
    }
}

/// What the user is asking for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Order {
    /// Sell `chip_amount` chips and be paid to `payment_details`
    Sell {
        chip_amount: u64,
        payment_details: PaymentDetails,
    },

    /// Buy the catalog package with id `package_id`
    Buy { package_id: String },
}

impl Order {
    pub fn tx_type(&self) -> TransactionType {
        match self {
            Order::Sell { .. } => TransactionType::Sell,
            Order::Buy { .. } => TransactionType::Buy,
        }
    }
}

/// Submission input for `TransactionLedger::create`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub destination_id: UserId,
    pub order: Order,
    pub promo_code: Option<String>,
    /// Referral context captured at submission time (e.g. a `?ref=` link)
    pub referrer_id: Option<UserId>,
}

impl NewTransaction {
    pub fn sell(
        destination_id: impl Into<UserId>,
        chip_amount: u64,
        payment_details: PaymentDetails,
    ) -> Self {
        NewTransaction {
            destination_id: destination_id.into(),
            order: Order::Sell {
                chip_amount,
                payment_details,
            },
            promo_code: None,
            referrer_id: None,
        }
    }

    pub fn buy(destination_id: impl Into<UserId>, package_id: impl Into<String>) -> Self {
        NewTransaction {
            destination_id: destination_id.into(),
            order: Order::Buy {
                package_id: package_id.into(),
            },
            promo_code: None,
            referrer_id: None,
        }
    }

    pub fn with_promo(mut self, code: impl Into<String>) -> Self {
        self.promo_code = Some(code.into());
        self
    }

    pub fn with_referrer(mut self, referrer_id: impl Into<UserId>) -> Self {
        self.referrer_id = Some(referrer_id.into());
        self
    }
}

/// Operator dashboard filter; `None` matches everything
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    pub status: Option<TransactionStatus>,
    pub tx_type: Option<TransactionType>,
}

impl TransactionFilter {
    pub fn matches(&self, tx: &Transaction) -> bool {
        self.status.map_or(true, |status| tx.status == status)
            && self.tx_type.map_or(true, |tx_type| tx.tx_type() == tx_type)
    }
}

/// Counts and sums of transactions waiting for the operator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSummary {
    pub pending_sell_count: usize,
    pub pending_buy_count: usize,
    pub pending_sell_value: Decimal,
    pub pending_buy_value: Decimal,
}

/// Public view of a settled transaction, safe for the history feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicTransaction {
    pub anonymized_id: String,
    pub tx_type: TransactionType,
    pub chip_amount: u64,
    pub created_at: DateTime<Utc>,
}

impl From<&Transaction> for PublicTransaction {
    fn from(tx: &Transaction) -> Self {
        PublicTransaction {
            anonymized_id: tx.anonymized_id.clone(),
            tx_type: tx.tx_type(),
            chip_amount: tx.chip_amount,
            created_at: tx.created_at,
        }
    }
}

/// Event handed to the messaging collaborator after every `create`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionEvent {
    pub transaction_id: TransactionId,
    pub tx_type: TransactionType,
    pub chip_amount: u64,
    pub amount: Decimal,
    pub user_id: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promo_code: Option<String>,
}

impl From<&Transaction> for TransactionEvent {
    fn from(tx: &Transaction) -> Self {
        TransactionEvent {
            transaction_id: tx.id.clone(),
            tx_type: tx.tx_type(),
            chip_amount: tx.chip_amount,
            amount: tx.money_value,
            user_id: tx.destination_id.clone(),
            promo_code: tx.promo_code_used.clone(),
        }
    }
}
