//! Affiliate commission accounting
//!
//! A referral is captured at the referee's very first transaction only. The
//! commission for it is accrued in the same store updater that records that
//! transaction, so it happens once per referred user.

use crate::core::pricing::percent_of;
use crate::types::{
    AffiliateCommission, AffiliateRecord, AffiliateStats, AffiliateSystemSettings, LedgerError,
    Transaction, UserId,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Decide which referrer, if any, the new transaction of `referee_id` carries
///
/// # Arguments
///
/// * `config` - Affiliate program settings
/// * `history` - All transactions recorded so far (excluding the new one)
/// * `referrer_id` - Referral context captured with the submission
/// * `referee_id` - Destination id of the new transaction
///
/// # Returns
///
/// The trimmed referrer id when the program is enabled, the referrer is not
/// the referee, and the referee has no earlier transaction.
pub fn register_referral(
    config: &AffiliateSystemSettings,
    history: &[Transaction],
    referrer_id: Option<&str>,
    referee_id: &str,
) -> Option<UserId> {
    if !config.enabled {
        return None;
    }
    let referrer = referrer_id.map(str::trim).filter(|id| !id.is_empty())?;
    if referrer == referee_id.trim() {
        return None;
    }
    if has_prior_transaction(history, referee_id) {
        return None;
    }
    Some(referrer.to_string())
}

pub fn has_prior_transaction(history: &[Transaction], user_id: &str) -> bool {
    history.iter().any(|tx| tx.destination_id == user_id)
}

/// Credit the referrer of `transaction`
///
/// Must be called before `transaction` is appended to `history`. Returns the
/// accrued amount, or `None` when the transaction does not qualify.
pub fn accrue_commission(
    records: &mut BTreeMap<UserId, AffiliateRecord>,
    config: &AffiliateSystemSettings,
    history: &[Transaction],
    transaction: &Transaction,
    now: DateTime<Utc>,
) -> Result<Option<Decimal>, LedgerError> {
    let Some(referrer) = transaction.referrer_id.as_deref() else {
        return Ok(None);
    };
    if !config.enabled
        || referrer == transaction.destination_id
        || has_prior_transaction(history, &transaction.destination_id)
    {
        return Ok(None);
    }

    let amount = percent_of(transaction.money_value, config.commission_rate)?;
    let record = records.entry(referrer.to_string()).or_default();
    if !record.referrals.insert(transaction.destination_id.clone()) {
        // referee already credited once
        return Ok(None);
    }
    record.commission_balance += amount;
    record.history.push(AffiliateCommission {
        transaction_id: transaction.id.clone(),
        amount,
        timestamp: now,
    });

    Ok(Some(amount))
}

/// Move the entire balance of `referrer_id` to paid
///
/// Returns the amount paid out, zero if nothing was owed.
pub fn mark_paid(
    records: &mut BTreeMap<UserId, AffiliateRecord>,
    referrer_id: &str,
) -> Result<Decimal, LedgerError> {
    let record = records
        .get_mut(referrer_id)
        .ok_or_else(|| LedgerError::not_found("affiliate", referrer_id))?;

    let amount = record.commission_balance;
    record.commission_paid += amount;
    record.commission_balance = Decimal::ZERO;

    Ok(amount)
}

/// Stats for `user_id`; a user who never referred anyone has empty stats
pub fn stats(records: &BTreeMap<UserId, AffiliateRecord>, user_id: &str) -> AffiliateStats {
    records
        .get(user_id)
        .map(AffiliateStats::from)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChipPackage, TransactionDetails, TransactionStatus};

    fn enabled() -> AffiliateSystemSettings {
        AffiliateSystemSettings {
            enabled: true,
            commission_rate: Decimal::from(5),
        }
    }

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp_millis(1_700_000_000_000).unwrap()
    }

    fn purchase(id: &str, user: &str, value: i64, referrer: Option<&str>) -> Transaction {
        Transaction {
            id: id.to_string(),
            anonymized_id: id.to_string(),
            destination_id: user.to_string(),
            chip_amount: 2_000_000_000,
            money_value: Decimal::from(value),
            status: TransactionStatus::Pending,
            details: TransactionDetails::Buy {
                chip_package: ChipPackage {
                    id: "p2".to_string(),
                    name: "2B".to_string(),
                    chip_amount: 2_000_000_000,
                },
            },
            promo_code_used: None,
            promo_id: None,
            referrer_id: referrer.map(str::to_string),
            created_at: now(),
            verified_at: None,
            paid_at: None,
        }
    }

    #[test]
    fn test_register_referral_rules() {
        let history = vec![purchase("RP-1", "B", 1, None)];

        assert_eq!(
            register_referral(&enabled(), &[], Some(" A "), "B"),
            Some("A".to_string())
        );
        assert_eq!(register_referral(&enabled(), &[], Some("B"), "B"), None);
        assert_eq!(register_referral(&enabled(), &[], Some("  "), "B"), None);
        assert_eq!(register_referral(&enabled(), &history, Some("A"), "B"), None);
        assert_eq!(
            register_referral(&AffiliateSystemSettings::default(), &[], Some("A"), "B"),
            None
        );
    }

    #[test]
    fn test_first_transaction_accrues_once() {
        let mut records = BTreeMap::new();
        let mut history = Vec::new();

        let first = purchase("RP-1", "B", 200_000, Some("A"));
        let accrued =
            accrue_commission(&mut records, &enabled(), &history, &first, now()).unwrap();
        assert_eq!(accrued, Some(Decimal::from(10_000)));
        history.push(first);

        let second = purchase("RP-2", "B", 500_000, Some("A"));
        let accrued =
            accrue_commission(&mut records, &enabled(), &history, &second, now()).unwrap();
        assert_eq!(accrued, None);

        let stats = stats(&records, "A");
        assert_eq!(stats.referrals, 1);
        assert_eq!(stats.commission_balance, Decimal::from(10_000));
        assert_eq!(stats.history.len(), 1);
        assert_eq!(stats.history[0].transaction_id, "RP-1");
    }

    #[test]
    fn test_no_referrer_no_commission() {
        let mut records = BTreeMap::new();
        let tx = purchase("RP-1", "B", 200_000, None);
        let accrued = accrue_commission(&mut records, &enabled(), &[], &tx, now()).unwrap();
        assert_eq!(accrued, None);
        assert!(records.is_empty());
    }

    #[test]
    fn test_mark_paid_moves_whole_balance() {
        let mut records = BTreeMap::new();
        let tx = purchase("RP-1", "B", 200_000, Some("A"));
        accrue_commission(&mut records, &enabled(), &[], &tx, now()).unwrap();

        assert_eq!(mark_paid(&mut records, "A").unwrap(), Decimal::from(10_000));
        assert_eq!(mark_paid(&mut records, "A").unwrap(), Decimal::ZERO);

        let stats = stats(&records, "A");
        assert_eq!(stats.commission_balance, Decimal::ZERO);
        assert_eq!(stats.commission_paid, Decimal::from(10_000));
    }

    #[test]
    fn test_mark_paid_unknown_referrer() {
        let mut records = BTreeMap::new();
        assert_eq!(
            mark_paid(&mut records, "nobody"),
            Err(LedgerError::not_found("affiliate", "nobody"))
        );
    }

    #[test]
    fn test_stats_for_stranger_are_empty() {
        assert_eq!(stats(&BTreeMap::new(), "X"), AffiliateStats::default());
    }
}
