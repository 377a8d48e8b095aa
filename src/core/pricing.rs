//! Pricing engine
//!
//! Pure functions computing the money value of a chip quantity.
//!
//! Base value is `(chip_amount / CHIP_UNIT) * rate`. Promo and VIP
//! percentages are each taken off the *base* independently (not compounded):
//! for BUY they are discounts subtracted from the base, for SELL they are
//! bonuses added to it. Percentages are clamped to 0–100 and a BUY price never
//! goes below zero. No rounding happens here.

use crate::types::{ChipPackage, LedgerError, PromoCode, VipTier, CHIP_UNIT};
use rust_decimal::Decimal;

/// Value of `chip_amount` chips at `rate` money per `CHIP_UNIT`
pub fn base_value(chip_amount: u64, rate: Decimal) -> Result<Decimal, LedgerError> {
    let units = Decimal::from(chip_amount) / Decimal::from(CHIP_UNIT);
    units
        .checked_mul(rate)
        .ok_or_else(|| LedgerError::validation("chipAmount", "money value overflows"))
}

/// Price a buyer pays for `package`
pub fn compute_buy_price(
    package: &ChipPackage,
    buy_rate: Decimal,
    promo: Option<&PromoCode>,
    vip_tier: Option<&VipTier>,
) -> Result<Decimal, LedgerError> {
    let base = base_value(package.chip_amount, buy_rate)?;
    let percent = clamp_percent(promo.map(|p| p.discount_percent))
        + clamp_percent(vip_tier.map(|t| t.buy_rate_bonus));
    let discount = percent_of(base, percent)?;

    Ok((base - discount).max(Decimal::ZERO))
}

/// Amount paid out to a seller of `chip_amount` chips
pub fn compute_sell_value(
    chip_amount: u64,
    sell_rate: Decimal,
    promo: Option<&PromoCode>,
    vip_tier: Option<&VipTier>,
) -> Result<Decimal, LedgerError> {
    let base = base_value(chip_amount, sell_rate)?;
    let percent = clamp_percent(promo.map(|p| p.discount_percent))
        + clamp_percent(vip_tier.map(|t| t.sell_rate_bonus));
    let bonus = percent_of(base, percent)?;

    base.checked_add(bonus)
        .ok_or_else(|| LedgerError::validation("chipAmount", "money value overflows"))
}

/// `percent`% of `amount`
pub fn percent_of(amount: Decimal, percent: Decimal) -> Result<Decimal, LedgerError> {
    amount
        .checked_mul(percent)
        .map(|scaled| scaled / Decimal::ONE_HUNDRED)
        .ok_or_else(|| LedgerError::validation("amount", "percentage overflows"))
}

fn clamp_percent(percent: Option<Decimal>) -> Decimal {
    percent
        .unwrap_or(Decimal::ZERO)
        .clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
}
