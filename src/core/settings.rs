//! Invariant checks for operator settings updates
//!
//! Each validator returns the first violated rule as a `Validation` error.
//! The ledger runs them before touching the stored document.

use crate::types::{
    AffiliateSystemSettings, Branding, ChipPackage, ExchangeRates, LedgerError, VipTier,
};
use rust_decimal::Decimal;
use std::collections::HashSet;

pub fn validate_rates(rates: &ExchangeRates) -> Result<(), LedgerError> {
    if rates.sell_rate <= Decimal::ZERO {
        return Err(LedgerError::validation("sellRate", "must be positive"));
    }
    if rates.buy_rate <= Decimal::ZERO {
        return Err(LedgerError::validation("buyRate", "must be positive"));
    }
    Ok(())
}

/// Tier table must start at zero and ascend strictly
pub fn validate_vip_tiers(tiers: &[VipTier]) -> Result<(), LedgerError> {
    let first = tiers
        .first()
        .ok_or_else(|| LedgerError::validation("tiers", "at least one tier is required"))?;
    if first.threshold != Decimal::ZERO {
        return Err(LedgerError::validation(
            "tiers",
            "the first tier must have threshold 0",
        ));
    }
    if let Some(pair) = tiers
        .windows(2)
        .find(|pair| pair[1].threshold <= pair[0].threshold)
    {
        return Err(LedgerError::validation(
            "tiers",
            format!(
                "threshold of {} must be above that of {}",
                pair[1].name, pair[0].name
            ),
        ));
    }
    for tier in tiers {
        if tier.name.trim().is_empty() {
            return Err(LedgerError::validation("tiers", "tier name must not be empty"));
        }
        validate_percent("buyRateBonus", tier.buy_rate_bonus)?;
        validate_percent("sellRateBonus", tier.sell_rate_bonus)?;
    }
    Ok(())
}

pub fn validate_affiliate(config: &AffiliateSystemSettings) -> Result<(), LedgerError> {
    validate_percent("commissionRate", config.commission_rate)
}

/// Catalog must be non-empty with unique ids and positive chip amounts
pub fn validate_chip_packages(packages: &[ChipPackage]) -> Result<(), LedgerError> {
    if packages.is_empty() {
        return Err(LedgerError::validation(
            "chipPackages",
            "at least one package is required",
        ));
    }
    let mut seen = HashSet::new();
    for package in packages {
        if package.id.trim().is_empty() {
            return Err(LedgerError::validation("chipPackages", "package id must not be empty"));
        }
        if !seen.insert(package.id.as_str()) {
            return Err(LedgerError::validation(
                "chipPackages",
                format!("duplicate package id {}", package.id),
            ));
        }
        if package.chip_amount == 0 {
            return Err(LedgerError::validation(
                "chipPackages",
                format!("package {} has no chips", package.id),
            ));
        }
    }
    Ok(())
}

pub fn validate_branding(branding: &Branding) -> Result<(), LedgerError> {
    if branding.app_name.trim().is_empty() {
        return Err(LedgerError::validation("appName", "must not be empty"));
    }
    Ok(())
}

fn validate_percent(field: &str, percent: Decimal) -> Result<(), LedgerError> {
    if percent < Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
        return Err(LedgerError::validation(
            field,
            format!("{} is outside 0-100", percent),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{default_chip_packages, VipSystemSettings};
    use rstest::rstest;

    #[rstest]
    #[case::defaults(ExchangeRates::default(), true)]
    #[case::zero_sell(ExchangeRates { sell_rate: Decimal::ZERO, buy_rate: Decimal::ONE }, false)]
    #[case::negative_buy(ExchangeRates { sell_rate: Decimal::ONE, buy_rate: Decimal::NEGATIVE_ONE }, false)]
    fn test_validate_rates(#[case] rates: ExchangeRates, #[case] ok: bool) {
        assert_eq!(validate_rates(&rates).is_ok(), ok);
    }

    #[test]
    fn test_default_tiers_are_valid() {
        assert!(validate_vip_tiers(&VipSystemSettings::default().tiers).is_ok());
    }

    #[rstest]
    #[case::empty(vec![])]
    #[case::not_from_zero(vec![VipTier::new("A", Decimal::ONE, Decimal::ZERO, Decimal::ZERO)])]
    #[case::not_ascending(vec![
        VipTier::new("A", Decimal::ZERO, Decimal::ZERO, Decimal::ZERO),
        VipTier::new("B", Decimal::ZERO, Decimal::ZERO, Decimal::ZERO),
    ])]
    #[case::bonus_too_large(vec![
        VipTier::new("A", Decimal::ZERO, Decimal::from(101), Decimal::ZERO),
    ])]
    fn test_invalid_tier_tables(#[case] tiers: Vec<VipTier>) {
        assert!(matches!(
            validate_vip_tiers(&tiers),
            Err(LedgerError::Validation { .. })
        ));
    }

    #[test]
    fn test_duplicate_package_ids_rejected() {
        let mut packages = default_chip_packages();
        packages.push(packages[0].clone());
        assert!(validate_chip_packages(&packages).is_err());
        assert!(validate_chip_packages(&default_chip_packages()).is_ok());
    }

    #[test]
    fn test_commission_rate_bounds() {
        let config = AffiliateSystemSettings {
            enabled: true,
            commission_rate: Decimal::from(150),
        };
        assert!(validate_affiliate(&config).is_err());
        assert!(validate_affiliate(&AffiliateSystemSettings::default()).is_ok());
    }
}
