//! Transaction ledger
//!
//! This module provides the `TransactionLedger`, the authoritative record of
//! chip exchange transactions and the incentive programs attached to them.
//!
//! The whole ledger (transactions, operator settings including promo codes,
//! and affiliate records) is one `LedgerState` document stored under
//! `LEDGER_KEY`. Every mutation is a single `AtomicStore::write`, which gives:
//! - creation, promo redemption and commission accrual commit together or not
//!   at all
//! - rapid repeated calls (a double submit, two operators clicking at once)
//!   are serialized against the latest state
//! - validation failures leave the stored document untouched
//!
//! Transaction lifecycle:
//!
//! ```text
//! PENDING ──> VERIFYING ──> PAID
//!    │            │
//!    └────────────┴──────> REJECTED
//! ```
//!
//! `PENDING -> PAID` is allowed and backfills `verified_at`. `PAID` and
//! `REJECTED` are terminal. Rejection does not reverse promo usage or
//! affiliate commission.

use crate::core::affiliate_ledger;
use crate::core::ids::{anonymize_id, unique_id};
use crate::core::pricing::{compute_buy_price, compute_sell_value};
use crate::core::promo_registry::{self, NewPromo};
use crate::core::settings as rules;
use crate::core::traits::{AtomicStore, Clock, Committed, Notifier, NullNotifier, SystemClock};
use crate::core::vip_resolver;
use crate::types::{
    AdminSettings, AffiliateStats, AffiliateSystemSettings, Branding, ChipPackage, ExchangeRates,
    FeatureToggles, LedgerError, LedgerState, LedgerSummary, NewTransaction, Order, PaymentDetails,
    PromoCode, PromoUpdate, PromoVerdict, PublicTransaction, Transaction, TransactionDetails,
    TransactionEvent, TransactionFilter, TransactionStatus, TransactionType, VipStatus,
    VipSystemSettings,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Store key of the ledger document
pub const LEDGER_KEY: &str = "ledger";

/// Prefix of transaction ids
pub const TRANSACTION_ID_PREFIX: &str = "RP";

/// Chip exchange ledger
///
/// Generic over the persistence medium. The ledger is `Send + Sync` whenever
/// the store is, so one instance can be shared behind an `Arc` by many
/// threads or tasks.
pub struct TransactionLedger<S: AtomicStore> {
    store: S,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
}

impl<S: AtomicStore> TransactionLedger<S> {
    /// Create a ledger over `store` with the wall clock and no notifier
    pub fn new(store: S) -> Self {
        TransactionLedger {
            store,
            notifier: Arc::new(NullNotifier),
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the messaging collaborator
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Replace the time source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Record a new PENDING transaction
    ///
    /// Validates the submission, prices it, redeems the promo code and accrues
    /// the referrer's commission, all within one store updater. The notifier
    /// is called after the commit; its failure is logged and swallowed.
    ///
    /// # Arguments
    ///
    /// * `new_tx` - The user's submission
    ///
    /// # Returns
    ///
    /// * `Ok(Transaction)` - The stored transaction
    /// * `Err(LedgerError)` - Nothing was recorded, or (for `Storage`) the
    ///   transaction was recorded in memory but could not be persisted
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Maintenance mode is on or the SELL/BUY feature is disabled
    /// - The destination id is empty
    /// - A SELL has no chips or incomplete payment details
    /// - A BUY references an unknown package
    /// - The promo code fails validation
    /// - The persistence medium fails
    pub fn create(&self, new_tx: NewTransaction) -> Result<Transaction, LedgerError> {
        let now = self.clock.now();

        let committed = self
            .store
            .write(LEDGER_KEY, |state: &mut LedgerState| {
                let (tx, commission) = prepare_transaction(state, &new_tx, now)?;
                state.transactions.push(tx.clone());
                Ok((tx, commission))
            })
            .inspect_err(|e| {
                warn!(
                    user = %new_tx.destination_id,
                    tx_type = %new_tx.order.tx_type(),
                    error = %e,
                    "Transaction rejected"
                );
            })?;

        let persist_error = committed.persist_error;
        let (tx, commission) = committed.value;

        info!(
            tx_id = %tx.id,
            tx_type = %tx.tx_type(),
            user = %tx.destination_id,
            chip_amount = tx.chip_amount,
            money_value = %tx.money_value,
            promo = tx.promo_code_used.as_deref().unwrap_or("-"),
            "Transaction created"
        );
        if let (Some(amount), Some(referrer)) = (commission, tx.referrer_id.as_deref()) {
            info!(tx_id = %tx.id, referrer = %referrer, amount = %amount, "Commission accrued");
        }

        self.notify(&TransactionEvent::from(&tx));

        surface(
            Committed {
                value: tx,
                persist_error,
            },
            "create",
        )
    }

    /// Price a submission against current state without recording it
    ///
    /// Runs the same validation as `create`, so an invalid promo code or
    /// package is reported here too.
    pub fn quote(&self, new_tx: &NewTransaction) -> Result<Decimal, LedgerError> {
        let mut state = self.state()?;
        let (tx, _) = prepare_transaction(&mut state, new_tx, self.clock.now())?;
        Ok(tx.money_value)
    }

    /// Move a transaction along its lifecycle
    ///
    /// Setting the current status again is a no-op for non-terminal states.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `id` is unknown (`NotFound`, nothing changes)
    /// - the move leaves a terminal state or goes backwards (`InvalidTransition`)
    /// - the persistence medium fails
    pub fn transition(
        &self,
        id: &str,
        status: TransactionStatus,
    ) -> Result<Transaction, LedgerError> {
        let now = self.clock.now();

        let committed = self
            .store
            .write(LEDGER_KEY, |state: &mut LedgerState| {
                let tx = state
                    .transactions
                    .iter_mut()
                    .find(|tx| tx.id == id)
                    .ok_or_else(|| LedgerError::not_found("transaction", id))?;
                apply_transition(tx, status, now)?;
                Ok(tx.clone())
            })
            .inspect_err(|e| warn!(tx_id = %id, status = %status, error = %e, "Transition refused"))?;

        info!(tx_id = %id, status = %committed.value.status, "Transaction status updated");
        surface(committed, "transition")
    }

    pub fn find_by_id(&self, id: &str) -> Result<Option<Transaction>, LedgerError> {
        let state = self.state()?;
        Ok(state.transactions.into_iter().find(|tx| tx.id == id))
    }

    /// Transactions matching `filter`, newest first
    pub fn list(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>, LedgerError> {
        let mut transactions: Vec<Transaction> = self
            .state()?
            .transactions
            .into_iter()
            .filter(|tx| filter.matches(tx))
            .collect();
        transactions.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(transactions)
    }

    /// Work waiting for the operator
    pub fn summary(&self) -> Result<LedgerSummary, LedgerError> {
        let state = self.state()?;
        let mut summary = LedgerSummary::default();
        for tx in state
            .transactions
            .iter()
            .filter(|tx| tx.status == TransactionStatus::Pending)
        {
            match tx.tx_type() {
                TransactionType::Sell => {
                    summary.pending_sell_count += 1;
                    summary.pending_sell_value += tx.money_value;
                }
                TransactionType::Buy => {
                    summary.pending_buy_count += 1;
                    summary.pending_buy_value += tx.money_value;
                }
            }
        }
        Ok(summary)
    }

    /// Public feed of the latest PAID transactions
    ///
    /// Empty when the global history feature is switched off.
    pub fn recent_paid(&self, limit: usize) -> Result<Vec<PublicTransaction>, LedgerError> {
        if !self.settings()?.enabled_features.global_history {
            return Ok(Vec::new());
        }
        let paid = self.list(&TransactionFilter {
            status: Some(TransactionStatus::Paid),
            tx_type: None,
        })?;
        Ok(paid.iter().take(limit).map(PublicTransaction::from).collect())
    }

    /// Snapshot of the whole ledger document
    pub fn state(&self) -> Result<LedgerState, LedgerError> {
        self.store.read(LEDGER_KEY)
    }

    pub fn settings(&self) -> Result<AdminSettings, LedgerError> {
        Ok(self.state()?.settings)
    }

    // Promo codes

    pub fn create_promo(&self, new_promo: NewPromo) -> Result<PromoCode, LedgerError> {
        let now = self.clock.now();
        let committed = self.store.write(LEDGER_KEY, |state: &mut LedgerState| {
            promo_registry::create(&mut state.settings.promo_codes, new_promo, now)
        })?;
        info!(
            promo_id = %committed.value.id,
            code = %committed.value.code,
            discount = %committed.value.discount_percent,
            "Promo code created"
        );
        surface(committed, "create_promo")
    }

    pub fn update_promo(&self, id: &str, changes: PromoUpdate) -> Result<PromoCode, LedgerError> {
        let committed = self.store.write(LEDGER_KEY, |state: &mut LedgerState| {
            promo_registry::update(&mut state.settings.promo_codes, id, changes)
        })?;
        info!(promo_id = %id, code = %committed.value.code, "Promo code updated");
        surface(committed, "update_promo")
    }

    pub fn delete_promo(&self, id: &str) -> Result<PromoCode, LedgerError> {
        let committed = self.store.write(LEDGER_KEY, |state: &mut LedgerState| {
            promo_registry::delete(&mut state.settings.promo_codes, id)
        })?;
        info!(promo_id = %id, code = %committed.value.code, "Promo code deleted");
        surface(committed, "delete_promo")
    }

    pub fn list_promos(&self) -> Result<Vec<PromoCode>, LedgerError> {
        Ok(self.settings()?.promo_codes)
    }

    /// Check a promo code for the submission UI without redeeming it
    pub fn validate_promo(
        &self,
        code: &str,
        tx_type: TransactionType,
        user_id: &str,
    ) -> Result<PromoVerdict, LedgerError> {
        let state = self.state()?;
        Ok(promo_registry::validate(
            &state.settings.promo_codes,
            &state.transactions,
            code,
            tx_type,
            user_id.trim(),
        ))
    }

    // Incentive read models

    /// Tier and progress of `user_id`; `None` while the VIP system is off
    pub fn vip_status(&self, user_id: &str) -> Result<Option<VipStatus>, LedgerError> {
        let state = self.state()?;
        if !state.settings.vip_system.enabled {
            return Ok(None);
        }
        Ok(vip_resolver::resolve(
            &state.transactions,
            &state.settings.vip_system.tiers,
            user_id.trim(),
        ))
    }

    /// Referral stats of `user_id`; `None` while the affiliate system is off
    pub fn affiliate_stats(&self, user_id: &str) -> Result<Option<AffiliateStats>, LedgerError> {
        let state = self.state()?;
        if !state.settings.affiliate_system.enabled {
            return Ok(None);
        }
        Ok(Some(affiliate_ledger::stats(
            &state.affiliate_data,
            user_id.trim(),
        )))
    }

    /// Pay out the whole commission balance of `referrer_id`
    pub fn mark_commission_paid(&self, referrer_id: &str) -> Result<Decimal, LedgerError> {
        let committed = self.store.write(LEDGER_KEY, |state: &mut LedgerState| {
            affiliate_ledger::mark_paid(&mut state.affiliate_data, referrer_id)
        })?;
        info!(referrer = %referrer_id, amount = %committed.value, "Commission paid out");
        surface(committed, "mark_commission_paid")
    }

    // Operator settings

    pub fn update_rates(&self, rates: ExchangeRates) -> Result<AdminSettings, LedgerError> {
        rules::validate_rates(&rates)?;
        self.update_settings("rates", |settings| {
            settings.rates = rates;
        })
    }

    pub fn update_vip_system(
        &self,
        vip_system: VipSystemSettings,
    ) -> Result<AdminSettings, LedgerError> {
        rules::validate_vip_tiers(&vip_system.tiers)?;
        self.update_settings("vipSystem", |settings| {
            settings.vip_system = vip_system;
        })
    }

    pub fn update_affiliate_system(
        &self,
        affiliate_system: AffiliateSystemSettings,
    ) -> Result<AdminSettings, LedgerError> {
        rules::validate_affiliate(&affiliate_system)?;
        self.update_settings("affiliateSystem", |settings| {
            settings.affiliate_system = affiliate_system;
        })
    }

    pub fn update_features(&self, features: FeatureToggles) -> Result<AdminSettings, LedgerError> {
        self.update_settings("enabledFeatures", |settings| {
            settings.enabled_features = features;
        })
    }

    pub fn set_maintenance_mode(&self, enabled: bool) -> Result<AdminSettings, LedgerError> {
        self.update_settings("maintenanceMode", |settings| {
            settings.maintenance_mode = enabled;
        })
    }

    pub fn update_branding(&self, branding: Branding) -> Result<AdminSettings, LedgerError> {
        rules::validate_branding(&branding)?;
        self.update_settings("branding", |settings| {
            settings.branding = branding;
        })
    }

    pub fn update_announcement(
        &self,
        announcement: impl Into<String>,
    ) -> Result<AdminSettings, LedgerError> {
        let announcement = announcement.into();
        self.update_settings("announcement", |settings| {
            settings.announcement = announcement;
        })
    }

    pub fn update_chip_packages(
        &self,
        packages: Vec<ChipPackage>,
    ) -> Result<AdminSettings, LedgerError> {
        rules::validate_chip_packages(&packages)?;
        self.update_settings("chipPackages", |settings| {
            settings.chip_packages = packages;
        })
    }

    fn update_settings<F>(&self, section: &str, apply: F) -> Result<AdminSettings, LedgerError>
    where
        F: FnOnce(&mut AdminSettings),
    {
        let committed = self.store.write(LEDGER_KEY, |state: &mut LedgerState| {
            apply(&mut state.settings);
            Ok(state.settings.clone())
        })?;
        info!(section = %section, "Settings updated");
        surface(committed, "update_settings")
    }

    fn notify(&self, event: &TransactionEvent) {
        if let Err(e) = self.notifier.dispatch(event) {
            warn!(tx_id = %event.transaction_id, error = %e, "Notification dispatch failed");
        }
    }
}

/// Turn a persistence failure into an error after the in-memory commit
fn surface<R>(committed: Committed<R>, operation: &str) -> Result<R, LedgerError> {
    match committed.persist_error {
        Some(e) => {
            error!(operation = %operation, error = %e, "Committed in memory but not persisted");
            Err(e)
        }
        None => Ok(committed.value),
    }
}

/// Validate, price and build a new transaction against `state`
///
/// Redeems the promo code on `state`; the caller decides whether `state`
/// is committed. Returns the transaction and the accrued commission.
fn prepare_transaction(
    state: &mut LedgerState,
    new_tx: &NewTransaction,
    now: DateTime<Utc>,
) -> Result<(Transaction, Option<Decimal>), LedgerError> {
    let tx_type = new_tx.order.tx_type();
    check_open_for(&state.settings, tx_type)?;

    let destination_id = new_tx.destination_id.trim().to_string();
    if destination_id.is_empty() {
        return Err(LedgerError::validation("destinationId", "must not be empty"));
    }

    // Resolve the order before redeeming so a bad order never consumes a use
    let (details, chip_amount) = match &new_tx.order {
        Order::Sell {
            chip_amount,
            payment_details,
        } => {
            if *chip_amount == 0 {
                return Err(LedgerError::validation("chipAmount", "must be positive"));
            }
            check_payment_details(payment_details)?;
            let details = TransactionDetails::Sell {
                payment_details: payment_details.clone(),
            };
            (details, *chip_amount)
        }
        Order::Buy { package_id } => {
            let package = state
                .settings
                .find_package(package_id)
                .cloned()
                .ok_or_else(|| {
                    LedgerError::validation("packageId", format!("unknown package {}", package_id))
                })?;
            let chip_amount = package.chip_amount;
            (TransactionDetails::Buy { chip_package: package }, chip_amount)
        }
    };

    let promo = match new_tx
        .promo_code
        .as_deref()
        .map(str::trim)
        .filter(|code| !code.is_empty())
    {
        Some(code) => Some(promo_registry::redeem(
            &mut state.settings.promo_codes,
            &state.transactions,
            code,
            tx_type,
            &destination_id,
        )?),
        None => None,
    };

    let vip_tier = if state.settings.vip_system.enabled {
        vip_resolver::resolve(
            &state.transactions,
            &state.settings.vip_system.tiers,
            &destination_id,
        )
        .map(|status| status.current_tier)
    } else {
        None
    };

    let rates = state.settings.rates;
    let money_value = match &details {
        TransactionDetails::Sell { .. } => {
            compute_sell_value(chip_amount, rates.sell_rate, promo.as_ref(), vip_tier.as_ref())?
        }
        TransactionDetails::Buy { chip_package } => {
            compute_buy_price(chip_package, rates.buy_rate, promo.as_ref(), vip_tier.as_ref())?
        }
    };

    let affiliate_config = state.settings.affiliate_system;
    let referrer_id = affiliate_ledger::register_referral(
        &affiliate_config,
        &state.transactions,
        new_tx.referrer_id.as_deref(),
        &destination_id,
    );

    let id = unique_id(TRANSACTION_ID_PREFIX, now, |candidate| {
        state.transactions.iter().any(|tx| tx.id == candidate)
    });
    let (promo_id, promo_code_used) = promo.map(|p| (p.id, p.code)).unzip();
    let tx = Transaction {
        anonymized_id: anonymize_id(&id),
        id,
        destination_id,
        chip_amount,
        money_value,
        status: TransactionStatus::Pending,
        details,
        promo_code_used,
        promo_id,
        referrer_id,
        created_at: now,
        verified_at: None,
        paid_at: None,
    };

    let commission = affiliate_ledger::accrue_commission(
        &mut state.affiliate_data,
        &affiliate_config,
        &state.transactions,
        &tx,
        now,
    )?;

    Ok((tx, commission))
}

fn check_open_for(settings: &AdminSettings, tx_type: TransactionType) -> Result<(), LedgerError> {
    if settings.maintenance_mode {
        return Err(LedgerError::validation(
            "service",
            "the exchange is under maintenance",
        ));
    }
    let enabled = match tx_type {
        TransactionType::Sell => settings.enabled_features.sell_chip,
        TransactionType::Buy => settings.enabled_features.buy_chip,
    };
    if !enabled {
        return Err(LedgerError::validation(
            "type",
            format!("{} is currently disabled", tx_type),
        ));
    }
    Ok(())
}

fn check_payment_details(details: &PaymentDetails) -> Result<(), LedgerError> {
    let fields = [
        ("provider", &details.provider),
        ("accountNumber", &details.account_number),
        ("accountName", &details.account_name),
    ];
    match fields.iter().find(|(_, value)| value.trim().is_empty()) {
        Some((field, _)) => Err(LedgerError::validation(field, "must not be empty")),
        None => Ok(()),
    }
}

/// Apply a status change and its timestamp side effects to `tx`
fn apply_transition(
    tx: &mut Transaction,
    next: TransactionStatus,
    now: DateTime<Utc>,
) -> Result<(), LedgerError> {
    if !tx.status.can_transition_to(next) {
        return Err(LedgerError::invalid_transition(&tx.id, tx.status, next));
    }

    match next {
        TransactionStatus::Verifying => {
            tx.verified_at.get_or_insert(now);
        }
        TransactionStatus::Paid => {
            tx.verified_at.get_or_insert(now);
            tx.paid_at.get_or_insert(now);
        }
        TransactionStatus::Pending | TransactionStatus::Rejected => {}
    }
    tx.status = next;

    Ok(())
}
