//! Promo code registry
//!
//! CRUD and validation over the promo codes kept in the settings document.
//! Functions take the promo list (and, for validation, the transaction
//! history) explicitly so the ledger can run them inside a single store
//! updater: a redemption and the transaction that uses it commit together.
//!
//! Validation checks, in order: existence, active flag, usage cap
//! (`max_uses == 0` is unlimited), type compatibility (`BOTH` matches any),
//! and prior use of the same promo by the same account anywhere in history.

use crate::core::ids::unique_id;
use crate::types::{
    LedgerError, PromoCode, PromoScope, PromoUpdate, PromoVerdict, Transaction, TransactionType,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

pub const REASON_NOT_FOUND: &str = "promo code not found";
pub const REASON_INACTIVE: &str = "promo code is inactive";
pub const REASON_LIMIT_REACHED: &str = "usage limit reached";
pub const REASON_ALREADY_USED: &str = "already used by this account";

/// Input for `create`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPromo {
    pub code: String,
    pub discount_percent: Decimal,
    pub scope: PromoScope,
    pub max_uses: u32,
}

impl NewPromo {
    pub fn new(code: impl Into<String>, discount_percent: Decimal, scope: PromoScope) -> Self {
        NewPromo {
            code: code.into(),
            discount_percent,
            scope,
            max_uses: 0,
        }
    }

    pub fn with_max_uses(mut self, max_uses: u32) -> Self {
        self.max_uses = max_uses;
        self
    }
}

/// Find a promo by code, case-insensitively
pub fn find_by_code<'a>(promos: &'a [PromoCode], code: &str) -> Option<&'a PromoCode> {
    promos.iter().find(|p| p.matches_code(code))
}

/// Register a new, active promo code
pub fn create(
    promos: &mut Vec<PromoCode>,
    new_promo: NewPromo,
    now: DateTime<Utc>,
) -> Result<PromoCode, LedgerError> {
    let code = normalize_code(&new_promo.code)?;
    validate_percent(new_promo.discount_percent)?;

    if find_by_code(promos, &code).is_some() {
        return Err(LedgerError::duplicate_code(&code));
    }

    let id = unique_id("PROMO", now, |candidate| {
        promos.iter().any(|p| p.id == candidate)
    });
    let promo = PromoCode {
        id,
        code,
        discount_percent: new_promo.discount_percent,
        scope: new_promo.scope,
        max_uses: new_promo.max_uses,
        current_uses: 0,
        is_active: true,
        created_at: now,
    };

    promos.push(promo.clone());
    Ok(promo)
}

/// Apply a partial update; renames are checked for duplicates
pub fn update(
    promos: &mut [PromoCode],
    id: &str,
    changes: PromoUpdate,
) -> Result<PromoCode, LedgerError> {
    let renamed = match &changes.code {
        Some(code) => {
            let code = normalize_code(code)?;
            if promos.iter().any(|p| p.id != id && p.matches_code(&code)) {
                return Err(LedgerError::duplicate_code(&code));
            }
            Some(code)
        }
        None => None,
    };
    if let Some(percent) = changes.discount_percent {
        validate_percent(percent)?;
    }

    let promo = promos
        .iter_mut()
        .find(|p| p.id == id)
        .ok_or_else(|| LedgerError::not_found("promo code", id))?;

    if let Some(code) = renamed {
        promo.code = code;
    }
    if let Some(percent) = changes.discount_percent {
        promo.discount_percent = percent;
    }
    if let Some(scope) = changes.scope {
        promo.scope = scope;
    }
    if let Some(max_uses) = changes.max_uses {
        promo.max_uses = max_uses;
    }
    if let Some(is_active) = changes.is_active {
        promo.is_active = is_active;
    }

    Ok(promo.clone())
}

/// Administrative removal
pub fn delete(promos: &mut Vec<PromoCode>, id: &str) -> Result<PromoCode, LedgerError> {
    let index = promos
        .iter()
        .position(|p| p.id == id)
        .ok_or_else(|| LedgerError::not_found("promo code", id))?;
    Ok(promos.remove(index))
}

/// Check whether `user_id` may use `code` on a `tx_type` transaction
pub fn validate(
    promos: &[PromoCode],
    history: &[Transaction],
    code: &str,
    tx_type: TransactionType,
    user_id: &str,
) -> PromoVerdict {
    let Some(promo) = find_by_code(promos, code) else {
        return invalid(REASON_NOT_FOUND);
    };
    if !promo.is_active {
        return invalid(REASON_INACTIVE);
    }
    if promo.is_exhausted() {
        return invalid(REASON_LIMIT_REACHED);
    }
    if !promo.scope.applies_to(tx_type) {
        return invalid(format!(
            "promo code is not valid for {} transactions",
            tx_type
        ));
    }
    if has_used(history, promo, user_id) {
        return invalid(REASON_ALREADY_USED);
    }

    PromoVerdict::Valid(promo.clone())
}

/// Validate and count one use of `code`
///
/// Only called from inside the ledger's creation updater, so the increment is
/// committed if and only if the transaction is.
pub fn redeem(
    promos: &mut [PromoCode],
    history: &[Transaction],
    code: &str,
    tx_type: TransactionType,
    user_id: &str,
) -> Result<PromoCode, LedgerError> {
    let promo_id = match validate(promos, history, code, tx_type, user_id) {
        PromoVerdict::Valid(promo) => promo.id,
        PromoVerdict::Invalid { reason } => {
            return Err(LedgerError::promo_rejected(code.trim(), reason))
        }
    };

    let promo = promos
        .iter_mut()
        .find(|p| p.id == promo_id)
        .ok_or_else(|| LedgerError::not_found("promo code", &promo_id))?;
    promo.current_uses += 1;

    Ok(promo.clone())
}

fn has_used(history: &[Transaction], promo: &PromoCode, user_id: &str) -> bool {
    history.iter().any(|tx| {
        tx.destination_id == user_id
            && match (&tx.promo_id, &tx.promo_code_used) {
                (Some(id), _) => *id == promo.id,
                // records without a promo id predate renames
                (None, Some(used)) => promo.matches_code(used),
                (None, None) => false,
            }
    })
}

fn invalid(reason: impl Into<String>) -> PromoVerdict {
    PromoVerdict::Invalid {
        reason: reason.into(),
    }
}

fn normalize_code(code: &str) -> Result<String, LedgerError> {
    let code = code.trim();
    if code.is_empty() {
        return Err(LedgerError::validation("code", "must not be empty"));
    }
    if code.chars().any(char::is_whitespace) {
        return Err(LedgerError::validation("code", "must not contain spaces"));
    }
    Ok(code.to_uppercase())
}

fn validate_percent(percent: Decimal) -> Result<(), LedgerError> {
    if percent < Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
        return Err(LedgerError::validation(
            "discountPercent",
            format!("{} is outside 0-100", percent),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChipPackage, TransactionDetails, TransactionStatus};
    use rstest::rstest;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp_millis(1_700_000_000_000).unwrap()
    }

    fn registry_with(new_promo: NewPromo) -> Vec<PromoCode> {
        let mut promos = Vec::new();
        create(&mut promos, new_promo, now()).unwrap();
        promos
    }

    fn used_by(user: &str, code: &str) -> Transaction {
        Transaction {
            id: format!("RP-{}", user),
            anonymized_id: "RP-***".to_string(),
            destination_id: user.to_string(),
            chip_amount: 1_000_000_000,
            money_value: Decimal::from(90_000),
            status: TransactionStatus::Rejected,
            details: TransactionDetails::Buy {
                chip_package: ChipPackage {
                    id: "p1".to_string(),
                    name: "1B".to_string(),
                    chip_amount: 1_000_000_000,
                },
            },
            promo_code_used: Some(code.to_string()),
            promo_id: None,
            referrer_id: None,
            created_at: now(),
            verified_at: None,
            paid_at: None,
        }
    }

    #[test]
    fn test_create_normalizes_code() {
        let promos = registry_with(NewPromo::new(" welcome10 ", Decimal::TEN, PromoScope::Both));
        assert_eq!(promos[0].code, "WELCOME10");
        assert_eq!(promos[0].current_uses, 0);
        assert!(promos[0].is_active);
        assert!(promos[0].id.starts_with("PROMO-"));
    }

    #[test]
    fn test_create_rejects_duplicate_case_insensitive() {
        let mut promos = registry_with(NewPromo::new("WELCOME10", Decimal::TEN, PromoScope::Both));
        let result = create(
            &mut promos,
            NewPromo::new("Welcome10", Decimal::ONE, PromoScope::Buy),
            now(),
        );
        assert_eq!(result, Err(LedgerError::duplicate_code("WELCOME10")));
        assert_eq!(promos.len(), 1);
    }

    #[rstest]
    #[case::empty("   ", Decimal::TEN)]
    #[case::spaces("WELCOME 10", Decimal::TEN)]
    #[case::negative("NEG", Decimal::NEGATIVE_ONE)]
    #[case::over_hundred("BIG", Decimal::from(101))]
    fn test_create_validation(#[case] code: &str, #[case] percent: Decimal) {
        let mut promos = Vec::new();
        let result = create(&mut promos, NewPromo::new(code, percent, PromoScope::Both), now());
        assert!(matches!(result, Err(LedgerError::Validation { .. })));
        assert!(promos.is_empty());
    }

    #[test]
    fn test_validate_check_order() {
        let mut promos =
            registry_with(NewPromo::new("ONLYBUY", Decimal::TEN, PromoScope::Buy).with_max_uses(1));
        let id = promos[0].id.clone();

        // wrong type
        let verdict = validate(&promos, &[], "onlybuy", TransactionType::Sell, "U1");
        assert_eq!(verdict.message(), "promo code is not valid for SELL transactions");

        // exhausted beats wrong type
        promos[0].current_uses = 1;
        let verdict = validate(&promos, &[], "onlybuy", TransactionType::Sell, "U1");
        assert_eq!(verdict.message(), REASON_LIMIT_REACHED);

        // inactive beats exhausted
        update(&mut promos, &id, PromoUpdate { is_active: Some(false), ..Default::default() })
            .unwrap();
        let verdict = validate(&promos, &[], "onlybuy", TransactionType::Sell, "U1");
        assert_eq!(verdict.message(), REASON_INACTIVE);

        let verdict = validate(&promos, &[], "nope", TransactionType::Buy, "U1");
        assert_eq!(verdict.message(), REASON_NOT_FOUND);
    }

    #[test]
    fn test_validate_prior_use_in_history() {
        let promos = registry_with(NewPromo::new("WELCOME10", Decimal::TEN, PromoScope::Both));
        let history = vec![used_by("U1", "welcome10")];

        let verdict = validate(&promos, &history, "WELCOME10", TransactionType::Buy, "U1");
        assert_eq!(verdict, PromoVerdict::Invalid { reason: REASON_ALREADY_USED.to_string() });

        let verdict = validate(&promos, &history, "WELCOME10", TransactionType::Buy, "U2");
        assert!(verdict.is_valid());
    }

    #[test]
    fn test_prior_use_follows_promo_across_rename() {
        let mut promos = registry_with(NewPromo::new("WELCOME10", Decimal::TEN, PromoScope::Both));
        let id = promos[0].id.clone();
        let mut redeemed = used_by("U1", "WELCOME10");
        redeemed.promo_id = Some(id.clone());
        let history = vec![redeemed];

        update(&mut promos, &id, PromoUpdate { code: Some("welcome20".to_string()), ..Default::default() })
            .unwrap();

        let result = redeem(&mut promos, &history, "WELCOME20", TransactionType::Buy, "U1");
        assert_eq!(
            result,
            Err(LedgerError::promo_rejected("WELCOME20", REASON_ALREADY_USED))
        );
        assert_eq!(promos[0].current_uses, 0);

        // a new promo reusing the old name is a different promo
        create(&mut promos, NewPromo::new("WELCOME10", Decimal::ONE, PromoScope::Both), now())
            .unwrap();
        let verdict = validate(&promos, &history, "WELCOME10", TransactionType::Buy, "U1");
        assert!(verdict.is_valid());
    }

    #[rstest]
    #[case::exact("café")]
    #[case::upper("CAFÉ")]
    #[case::padded(" Café ")]
    fn test_non_ascii_code_matches_case_insensitively(#[case] typed: &str) {
        let promos = registry_with(NewPromo::new("café", Decimal::TEN, PromoScope::Both));
        assert_eq!(promos[0].code, "CAFÉ");

        let verdict = validate(&promos, &[], typed, TransactionType::Buy, "U1");
        assert!(verdict.is_valid());
    }

    #[test]
    fn test_redeem_increments_once() {
        let mut promos = registry_with(NewPromo::new("WELCOME10", Decimal::TEN, PromoScope::Both));

        let redeemed = redeem(&mut promos, &[], "welcome10", TransactionType::Buy, "U1").unwrap();
        assert_eq!(redeemed.current_uses, 1);
        assert_eq!(promos[0].current_uses, 1);
    }

    #[test]
    fn test_redeem_rejection_has_no_side_effect() {
        let mut promos = registry_with(
            NewPromo::new("WELCOME10", Decimal::TEN, PromoScope::Both).with_max_uses(1),
        );
        promos[0].current_uses = 1;

        let result = redeem(&mut promos, &[], "WELCOME10", TransactionType::Buy, "U1");
        assert_eq!(
            result,
            Err(LedgerError::promo_rejected("WELCOME10", REASON_LIMIT_REACHED))
        );
        assert_eq!(promos[0].current_uses, 1);
    }

    #[test]
    fn test_update_rename_conflict() {
        let mut promos = registry_with(NewPromo::new("FIRST", Decimal::TEN, PromoScope::Both));
        create(&mut promos, NewPromo::new("SECOND", Decimal::ONE, PromoScope::Sell), now()).unwrap();
        let second_id = promos[1].id.clone();

        let result = update(
            &mut promos,
            &second_id,
            PromoUpdate { code: Some("first".to_string()), ..Default::default() },
        );
        assert_eq!(result, Err(LedgerError::duplicate_code("FIRST")));
        assert_eq!(promos[1].code, "SECOND");
    }

    #[test]
    fn test_delete_unknown_promo() {
        let mut promos = Vec::new();
        assert_eq!(
            delete(&mut promos, "PROMO-X"),
            Err(LedgerError::not_found("promo code", "PROMO-X"))
        );
    }

    #[test]
    fn test_second_promo_in_same_millisecond_gets_distinct_id() {
        let mut promos = registry_with(NewPromo::new("FIRST", Decimal::TEN, PromoScope::Both));
        let second =
            create(&mut promos, NewPromo::new("SECOND", Decimal::ONE, PromoScope::Sell), now())
                .unwrap();
        assert_ne!(promos[0].id, second.id);
    }
}
