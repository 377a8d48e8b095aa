//! VIP tier types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A loyalty level unlocked by lifetime PAID volume
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VipTier {
    pub name: String,
    /// Minimum lifetime paid volume, in money units
    pub threshold: Decimal,
    /// Discount off the base BUY price, percent
    pub buy_rate_bonus: Decimal,
    /// Bonus on top of the base SELL value, percent
    pub sell_rate_bonus: Decimal,
}

impl VipTier {
    pub fn new(
        name: impl Into<String>,
        threshold: Decimal,
        buy_rate_bonus: Decimal,
        sell_rate_bonus: Decimal,
    ) -> Self {
        VipTier {
            name: name.into(),
            threshold,
            buy_rate_bonus,
            sell_rate_bonus,
        }
    }
}

/// A user's resolved tier and progress toward the next one
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VipStatus {
    pub total_volume: Decimal,
    pub current_tier: VipTier,
    pub next_tier: Option<VipTier>,
    /// 0–100
    pub progress_percent: Decimal,
}
