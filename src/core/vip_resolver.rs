//! VIP tier resolution
//!
//! A user's tier is a pure function of their PAID history and the tier table.
//! Nothing is cached: every call recomputes from the ledger state it is given.

use crate::types::{Transaction, TransactionStatus, VipStatus, VipTier};
use rust_decimal::Decimal;

/// Sum of `money_value` over `user_id`'s PAID transactions
pub fn lifetime_volume(transactions: &[Transaction], user_id: &str) -> Decimal {
    transactions
        .iter()
        .filter(|tx| tx.destination_id == user_id && tx.status == TransactionStatus::Paid)
        .map(|tx| tx.money_value)
        .sum()
}

/// Resolve `user_id`'s tier from `transactions`
///
/// Returns `None` only when the tier table is empty.
pub fn resolve(transactions: &[Transaction], tiers: &[VipTier], user_id: &str) -> Option<VipStatus> {
    resolve_volume(lifetime_volume(transactions, user_id), tiers)
}

/// Resolve the tier reached with `total_volume`
///
/// The current tier is the highest threshold at or below the volume; with no
/// such tier (a table not starting at zero) the lowest tier is used.
pub fn resolve_volume(total_volume: Decimal, tiers: &[VipTier]) -> Option<VipStatus> {
    let mut sorted: Vec<&VipTier> = tiers.iter().collect();
    sorted.sort_by(|a, b| a.threshold.cmp(&b.threshold));

    let current_index = sorted
        .iter()
        .rposition(|tier| tier.threshold <= total_volume)
        .unwrap_or(0);
    let current_tier = *sorted.get(current_index)?;
    let next_tier = sorted.get(current_index + 1).copied();

    let progress_percent = match next_tier {
        Some(next) => progress(total_volume, current_tier.threshold, next.threshold),
        None => Decimal::ONE_HUNDRED,
    };

    Some(VipStatus {
        total_volume,
        current_tier: current_tier.clone(),
        next_tier: next_tier.cloned(),
        progress_percent,
    })
}

fn progress(volume: Decimal, from: Decimal, to: Decimal) -> Decimal {
    let span = to - from;
    if span <= Decimal::ZERO {
        return Decimal::ONE_HUNDRED;
    }
    let done = (volume - from).max(Decimal::ZERO);
    (Decimal::ONE_HUNDRED * done / span).min(Decimal::ONE_HUNDRED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PaymentDetails, PaymentMethod, TransactionDetails, VipSystemSettings};
    use chrono::Utc;
    use rstest::rstest;

    fn two_tiers() -> Vec<VipTier> {
        vec![
            VipTier::new("Base", Decimal::ZERO, Decimal::ZERO, Decimal::ZERO),
            VipTier::new("Bonus", Decimal::from(1_000_000), Decimal::ZERO, Decimal::ONE),
        ]
    }

    fn sale(user: &str, value: i64, status: TransactionStatus) -> Transaction {
        Transaction {
            id: format!("RP-{}-{}", user, value),
            anonymized_id: "RP-***".to_string(),
            destination_id: user.to_string(),
            chip_amount: 1_000_000_000,
            money_value: Decimal::from(value),
            status,
            details: TransactionDetails::Sell {
                payment_details: PaymentDetails {
                    method: PaymentMethod::Bank,
                    provider: "BCA".to_string(),
                    account_number: "123".to_string(),
                    account_name: "Someone".to_string(),
                },
            },
            promo_code_used: None,
            promo_id: None,
            referrer_id: None,
            created_at: Utc::now(),
            verified_at: None,
            paid_at: None,
        }
    }

    #[test]
    fn test_volume_counts_only_own_paid_transactions() {
        let history = vec![
            sale("U1", 300_000, TransactionStatus::Paid),
            sale("U1", 200_000, TransactionStatus::Paid),
            sale("U1", 900_000, TransactionStatus::Pending),
            sale("U1", 900_000, TransactionStatus::Rejected),
            sale("U2", 900_000, TransactionStatus::Paid),
        ];
        assert_eq!(lifetime_volume(&history, "U1"), Decimal::from(500_000));
    }

    #[test]
    fn test_halfway_to_next_tier() {
        let history = vec![sale("U1", 500_000, TransactionStatus::Paid)];
        let status = resolve(&history, &two_tiers(), "U1").unwrap();

        assert_eq!(status.current_tier.name, "Base");
        assert_eq!(status.next_tier.map(|t| t.name), Some("Bonus".to_string()));
        assert_eq!(status.progress_percent, Decimal::from(50));
    }

    #[test]
    fn test_top_tier_has_full_progress() {
        let history = vec![
            sale("U1", 500_000, TransactionStatus::Paid),
            sale("U1", 500_000, TransactionStatus::Paid),
        ];
        let status = resolve(&history, &two_tiers(), "U1").unwrap();

        assert_eq!(status.current_tier.name, "Bonus");
        assert!(status.next_tier.is_none());
        assert_eq!(status.progress_percent, Decimal::ONE_HUNDRED);
    }

    #[test]
    fn test_unsorted_table_is_sorted_first() {
        let mut tiers = two_tiers();
        tiers.reverse();
        let status = resolve_volume(Decimal::from(250_000), &tiers).unwrap();
        assert_eq!(status.current_tier.name, "Base");
        assert_eq!(status.progress_percent, Decimal::from(25));
    }

    #[test]
    fn test_empty_table_resolves_nothing() {
        assert!(resolve_volume(Decimal::from(1), &[]).is_none());
    }

    #[rstest]
    #[case(0)]
    #[case(9_999_999)]
    #[case(10_000_000)]
    #[case(49_000_000)]
    #[case(50_000_000)]
    #[case(199_999_999)]
    #[case(200_000_000)]
    fn test_tier_is_monotonic_in_volume(#[case] volume: i64) {
        let tiers = VipSystemSettings::default().tiers;
        let current = resolve_volume(Decimal::from(volume), &tiers).unwrap();
        let more = resolve_volume(Decimal::from(volume + 1), &tiers).unwrap();

        assert!(more.current_tier.threshold >= current.current_tier.threshold);
        assert!(current.progress_percent <= Decimal::ONE_HUNDRED);
    }
}
