//! Operator settings and the persisted ledger document
//!
//! `AdminSettings` is the business configuration of the exchange (rates,
//! catalog, incentive programs, toggles). `LedgerState` is the single JSON
//! document the ledger keeps in its `AtomicStore`, so that a transaction, its
//! promo redemption and its commission accrual are committed by one updater.

use super::affiliate::AffiliateRecord;
use super::promo::PromoCode;
use super::transaction::{Transaction, UserId};
use super::vip::VipTier;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Chips per rate quote: rates are money per 1,000,000,000 chips
pub const CHIP_UNIT: u64 = 1_000_000_000;

/// A purchasable chip package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChipPackage {
    pub id: String,
    pub name: String,
    pub chip_amount: u64,
}

impl ChipPackage {
    fn new(id: &str, name: &str, chip_amount: u64) -> Self {
        ChipPackage {
            id: id.to_string(),
            name: name.to_string(),
            chip_amount,
        }
    }
}

/// Default package catalog
pub fn default_chip_packages() -> Vec<ChipPackage> {
    vec![
        ChipPackage::new("p1", "1B Gold Coins", CHIP_UNIT),
        ChipPackage::new("p2", "2B Gold Coins", 2 * CHIP_UNIT),
        ChipPackage::new("p3", "5B Purple Coins", 5 * CHIP_UNIT),
        ChipPackage::new("p4", "10B Purple Coins", 10 * CHIP_UNIT),
        ChipPackage::new("p5", "20B Sultan Coins", 20 * CHIP_UNIT),
        ChipPackage::new("p6", "50B Sultan Coins", 50 * CHIP_UNIT),
    ]
}

/// Money per `CHIP_UNIT` chips
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRates {
    /// What the operator pays a seller
    pub sell_rate: Decimal,
    /// What a buyer pays the operator
    pub buy_rate: Decimal,
}

impl Default for ExchangeRates {
    fn default() -> Self {
        ExchangeRates {
            sell_rate: Decimal::from(95_000),
            buy_rate: Decimal::from(105_000),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VipSystemSettings {
    pub enabled: bool,
    /// Ascending by threshold, first threshold is zero
    pub tiers: Vec<VipTier>,
}

impl Default for VipSystemSettings {
    fn default() -> Self {
        VipSystemSettings {
            enabled: false,
            tiers: vec![
                VipTier::new("Bronze", Decimal::ZERO, Decimal::ZERO, Decimal::ZERO),
                VipTier::new(
                    "Silver",
                    Decimal::from(10_000_000),
                    Decimal::new(5, 1),
                    Decimal::new(5, 1),
                ),
                VipTier::new(
                    "Gold",
                    Decimal::from(50_000_000),
                    Decimal::ONE,
                    Decimal::ONE,
                ),
                VipTier::new(
                    "Platinum",
                    Decimal::from(200_000_000),
                    Decimal::TWO,
                    Decimal::TWO,
                ),
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffiliateSystemSettings {
    pub enabled: bool,
    /// Percentage of the referred user's first transaction, 0–100
    pub commission_rate: Decimal,
}

impl Default for AffiliateSystemSettings {
    fn default() -> Self {
        AffiliateSystemSettings {
            enabled: false,
            commission_rate: Decimal::from(5),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureToggles {
    pub sell_chip: bool,
    pub buy_chip: bool,
    pub global_history: bool,
}

impl Default for FeatureToggles {
    fn default() -> Self {
        FeatureToggles {
            sell_chip: true,
            buy_chip: true,
            global_history: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Branding {
    pub app_name: String,
}

impl Default for Branding {
    fn default() -> Self {
        Branding {
            app_name: "Chip Exchange".to_string(),
        }
    }
}

/// Business configuration of the exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdminSettings {
    pub branding: Branding,
    pub rates: ExchangeRates,
    pub chip_packages: Vec<ChipPackage>,
    pub maintenance_mode: bool,
    pub announcement: String,
    pub enabled_features: FeatureToggles,
    pub promo_codes: Vec<PromoCode>,
    pub vip_system: VipSystemSettings,
    pub affiliate_system: AffiliateSystemSettings,
}

impl Default for AdminSettings {
    fn default() -> Self {
        AdminSettings {
            branding: Branding::default(),
            rates: ExchangeRates::default(),
            chip_packages: default_chip_packages(),
            maintenance_mode: false,
            announcement: String::new(),
            enabled_features: FeatureToggles::default(),
            promo_codes: Vec::new(),
            vip_system: VipSystemSettings::default(),
            affiliate_system: AffiliateSystemSettings::default(),
        }
    }
}

impl AdminSettings {
    pub fn find_package(&self, package_id: &str) -> Option<&ChipPackage> {
        self.chip_packages.iter().find(|p| p.id == package_id)
    }
}

/// The document persisted under `LEDGER_KEY`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LedgerState {
    pub transactions: Vec<Transaction>,
    pub settings: AdminSettings,
    pub affiliate_data: BTreeMap<UserId, AffiliateRecord>,
}
