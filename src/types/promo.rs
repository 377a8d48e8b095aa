//! Promo code types

use super::transaction::TransactionType;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Which transaction types a promo code applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PromoScope {
    Buy,
    Sell,
    Both,
}

impl PromoScope {
    pub fn applies_to(self, tx_type: TransactionType) -> bool {
        matches!(
            (self, tx_type),
            (PromoScope::Both, _)
                | (PromoScope::Buy, TransactionType::Buy)
                | (PromoScope::Sell, TransactionType::Sell)
        )
    }
}

/// A discount (BUY) or bonus (SELL) token
///
/// Codes are stored upper-cased and compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoCode {
    pub id: String,
    pub code: String,
    /// 0–100
    pub discount_percent: Decimal,
    #[serde(rename = "type")]
    pub scope: PromoScope,
    /// 0 means unlimited
    pub max_uses: u32,
    pub current_uses: u32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl PromoCode {
    pub fn is_exhausted(&self) -> bool {
        self.max_uses != 0 && self.current_uses >= self.max_uses
    }

    pub fn matches_code(&self, code: &str) -> bool {
        self.code == code.trim().to_uppercase()
    }
}

/// Partial update for `promo_registry::update`; `None` leaves a field alone
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromoUpdate {
    pub code: Option<String>,
    pub discount_percent: Option<Decimal>,
    pub scope: Option<PromoScope>,
    pub max_uses: Option<u32>,
    pub is_active: Option<bool>,
}

/// Outcome of `promo_registry::validate`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromoVerdict {
    Valid(PromoCode),
    Invalid { reason: String },
}

impl PromoVerdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, PromoVerdict::Valid(_))
    }

    /// Human-readable message for the submission UI
    pub fn message(&self) -> String {
        match self {
            PromoVerdict::Valid(promo) => format!(
                "promo code {} applied ({}%)",
                promo.code, promo.discount_percent
            ),
            PromoVerdict::Invalid { reason } => reason.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(PromoScope::Both, TransactionType::Buy, true)]
    #[case(PromoScope::Both, TransactionType::Sell, true)]
    #[case(PromoScope::Buy, TransactionType::Buy, true)]
    #[case(PromoScope::Buy, TransactionType::Sell, false)]
    #[case(PromoScope::Sell, TransactionType::Buy, false)]
    fn test_scope_applies_to(
        #[case] scope: PromoScope,
        #[case] tx_type: TransactionType,
        #[case] expected: bool,
    ) {
        assert_eq!(scope.applies_to(tx_type), expected);
    }

    #[rstest]
    #[case::unlimited(0, 500, false)]
    #[case::below_cap(3, 2, false)]
    #[case::at_cap(3, 3, true)]
    fn test_is_exhausted(#[case] max_uses: u32, #[case] current_uses: u32, #[case] expected: bool) {
        let promo = PromoCode {
            id: "PROMO-1".to_string(),
            code: "WELCOME10".to_string(),
            discount_percent: Decimal::TEN,
            scope: PromoScope::Both,
            max_uses,
            current_uses,
            is_active: true,
            created_at: Utc::now(),
        };
        assert_eq!(promo.is_exhausted(), expected);
        assert!(promo.matches_code(" welcome10 "));
    }
}
