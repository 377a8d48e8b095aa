//! Affiliate (referral commission) types

use super::transaction::{TransactionId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One accrued commission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffiliateCommission {
    pub transaction_id: TransactionId,
    pub amount: Decimal,
    pub timestamp: DateTime<Utc>,
}

/// Commission account of one referrer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AffiliateRecord {
    /// Accrued and not yet paid out
    pub commission_balance: Decimal,
    /// Lifetime paid out
    pub commission_paid: Decimal,
    /// Distinct referred users
    pub referrals: BTreeSet<UserId>,
    /// Append-only
    pub history: Vec<AffiliateCommission>,
}

/// Read model for the affiliate UI
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AffiliateStats {
    pub referrals: usize,
    pub commission_balance: Decimal,
    pub commission_paid: Decimal,
    pub history: Vec<AffiliateCommission>,
}

impl From<&AffiliateRecord> for AffiliateStats {
    fn from(record: &AffiliateRecord) -> Self {
        AffiliateStats {
            referrals: record.referrals.len(),
            commission_balance: record.commission_balance,
            commission_paid: record.commission_paid,
            history: record.history.clone(),
        }
    }
}
