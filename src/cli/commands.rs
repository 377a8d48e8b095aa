use super::args::{AffiliateCommand, CliArgs, Command, IncentiveArgs, PromoCommand, VipCommand};
use crate::core::{AtomicStore, NewPromo, TransactionLedger};
use crate::io::{write_promos_csv, write_transactions_csv};
use crate::types::{
    AffiliateSystemSettings, ExchangeRates, LedgerError, NewTransaction, PaymentDetails,
    PromoUpdate, TransactionFilter, VipSystemSettings,
};
use serde::Serialize;
use std::io::Write;

/// Run one parsed command against `ledger`
///
/// Machine-readable results (CSV exports, JSON documents) go to `output`;
/// progress and diagnostics go to the log.
///
/// # Returns
///
/// * `Ok(())` if the command succeeded
/// * `Err(String)` with a user-facing message otherwise
pub fn execute<S: AtomicStore>(
    args: CliArgs,
    ledger: &TransactionLedger<S>,
    output: &mut dyn Write,
) -> Result<(), String> {
    match args.command {
        Command::Sell {
            user,
            chips,
            method,
            provider,
            account_number,
            account_name,
            incentives,
        } => {
            let payment_details = PaymentDetails {
                method: method.into(),
                provider,
                account_number,
                account_name,
            };
            let new_tx = NewTransaction::sell(user, chips, payment_details);
            submit(ledger, with_incentives(new_tx, &incentives), incentives.dry_run, output)
        }

        Command::Buy {
            user,
            package,
            incentives,
        } => {
            let new_tx = NewTransaction::buy(user, package);
            submit(ledger, with_incentives(new_tx, &incentives), incentives.dry_run, output)
        }

        Command::Show { id } => match ledger.find_by_id(&id).map_err(user_message)? {
            Some(tx) => write_json(&tx, output),
            None => Err(LedgerError::not_found("transaction", &id).to_string()),
        },

        Command::List { status, tx_type } => {
            let filter = TransactionFilter {
                status: status.map(Into::into),
                tx_type: tx_type.map(Into::into),
            };
            let transactions = ledger.list(&filter).map_err(user_message)?;
            write_transactions_csv(&transactions, output)
        }

        Command::Transition { id, status } => {
            let tx = ledger
                .transition(&id, status.into())
                .map_err(user_message)?;
            write_json(&tx, output)
        }

        Command::Summary => write_json(&ledger.summary().map_err(user_message)?, output),

        Command::Feed { limit } => {
            write_json(&ledger.recent_paid(limit).map_err(user_message)?, output)
        }

        Command::Promo { action } => execute_promo(action, ledger, output),

        Command::Vip { action } => match action {
            VipCommand::Status { user } => {
                let status = ledger.vip_status(&user).map_err(user_message)?;
                write_json(&status, output)
            }
            VipCommand::Enable { enabled } => {
                let current = ledger.settings().map_err(user_message)?.vip_system;
                let settings = ledger
                    .update_vip_system(VipSystemSettings {
                        enabled,
                        ..current
                    })
                    .map_err(user_message)?;
                write_json(&settings.vip_system, output)
            }
        },

        Command::Affiliate { action } => match action {
            AffiliateCommand::Stats { user } => {
                let stats = ledger.affiliate_stats(&user).map_err(user_message)?;
                write_json(&stats, output)
            }
            AffiliateCommand::Payout { user } => {
                let amount = ledger.mark_commission_paid(&user).map_err(user_message)?;
                writeln!(output, "{}", amount).map_err(|e| e.to_string())
            }
            AffiliateCommand::Configure { enabled, rate } => {
                let current = ledger.settings().map_err(user_message)?.affiliate_system;
                let settings = ledger
                    .update_affiliate_system(AffiliateSystemSettings {
                        enabled: enabled.unwrap_or(current.enabled),
                        commission_rate: rate.unwrap_or(current.commission_rate),
                    })
                    .map_err(user_message)?;
                write_json(&settings.affiliate_system, output)
            }
        },

        Command::Rates { sell, buy } => {
            let current = ledger.settings().map_err(user_message)?.rates;
            let rates = if sell.is_none() && buy.is_none() {
                current
            } else {
                let updated = ExchangeRates {
                    sell_rate: sell.unwrap_or(current.sell_rate),
                    buy_rate: buy.unwrap_or(current.buy_rate),
                };
                ledger.update_rates(updated).map_err(user_message)?.rates
            };
            write_json(&rates, output)
        }

        Command::Maintenance { enabled } => {
            let settings = ledger.set_maintenance_mode(enabled).map_err(user_message)?;
            writeln!(output, "maintenance mode: {}", settings.maintenance_mode)
                .map_err(|e| e.to_string())
        }
    }
}

fn execute_promo<S: AtomicStore>(
    action: PromoCommand,
    ledger: &TransactionLedger<S>,
    output: &mut dyn Write,
) -> Result<(), String> {
    match action {
        PromoCommand::Add {
            code,
            percent,
            scope,
            max_uses,
        } => {
            let promo = ledger
                .create_promo(NewPromo::new(code, percent, scope.into()).with_max_uses(max_uses))
                .map_err(user_message)?;
            write_json(&promo, output)
        }
        PromoCommand::List => {
            let promos = ledger.list_promos().map_err(user_message)?;
            write_promos_csv(&promos, output)
        }
        PromoCommand::Update {
            id,
            code,
            percent,
            scope,
            max_uses,
            active,
        } => {
            let changes = PromoUpdate {
                code,
                discount_percent: percent,
                scope: scope.map(Into::into),
                max_uses,
                is_active: active,
            };
            let promo = ledger.update_promo(&id, changes).map_err(user_message)?;
            write_json(&promo, output)
        }
        PromoCommand::Remove { id } => {
            let promo = ledger.delete_promo(&id).map_err(user_message)?;
            writeln!(output, "removed {}", promo.code).map_err(|e| e.to_string())
        }
        PromoCommand::Check {
            code,
            tx_type,
            user,
        } => {
            let verdict = ledger
                .validate_promo(&code, tx_type.into(), &user)
                .map_err(user_message)?;
            writeln!(output, "{}", verdict.message()).map_err(|e| e.to_string())
        }
    }
}

fn with_incentives(mut new_tx: NewTransaction, incentives: &IncentiveArgs) -> NewTransaction {
    if let Some(code) = &incentives.promo {
        new_tx = new_tx.with_promo(code.clone());
    }
    if let Some(referrer) = &incentives.referrer {
        new_tx = new_tx.with_referrer(referrer.clone());
    }
    new_tx
}

fn submit<S: AtomicStore>(
    ledger: &TransactionLedger<S>,
    new_tx: NewTransaction,
    dry_run: bool,
    output: &mut dyn Write,
) -> Result<(), String> {
    if dry_run {
        let price = ledger.quote(&new_tx).map_err(user_message)?;
        return writeln!(output, "{}", price).map_err(|e| e.to_string());
    }
    let tx = ledger.create(new_tx).map_err(user_message)?;
    write_json(&tx, output)
}

/// Storage and delivery failures are reported generically
fn user_message(error: LedgerError) -> String {
    if error.is_retryable() {
        format!("Something went wrong, please try again ({})", error)
    } else {
        error.to_string()
    }
}

fn write_json<T: Serialize>(value: &T, output: &mut dyn Write) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to encode output: {}", e))?;
    writeln!(output, "{}", text).map_err(|e| format!("Failed to write output: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MemoryStore;
    use clap::Parser;

    fn run(ledger: &TransactionLedger<MemoryStore>, args: &[&str]) -> Result<String, String> {
        let mut argv = vec!["chipex"];
        argv.extend_from_slice(args);
        let parsed = CliArgs::try_parse_from(argv).map_err(|e| e.to_string())?;

        let mut output = Vec::new();
        execute(parsed, ledger, &mut output)?;
        Ok(String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_buy_then_list() {
        let ledger = TransactionLedger::new(MemoryStore::new());

        let created = run(&ledger, &["buy", "--user", "12345", "--package", "p1"]).unwrap();
        assert!(created.contains("\"status\": \"PENDING\""));

        let csv = run(&ledger, &["list", "--status", "pending"]).unwrap();
        assert_eq!(csv.lines().count(), 2);
        assert!(csv.lines().nth(1).unwrap().contains(",BUY,PENDING,12345,"));
    }

    #[test]
    fn test_dry_run_records_nothing() {
        let ledger = TransactionLedger::new(MemoryStore::new());

        let price = run(&ledger, &["buy", "--user", "1", "--package", "p1", "--dry-run"]).unwrap();
        assert_eq!(price.trim(), "105000");
        assert!(ledger.state().unwrap().transactions.is_empty());
    }

    #[test]
    fn test_promo_round_trip_through_cli() {
        let ledger = TransactionLedger::new(MemoryStore::new());

        run(&ledger, &["promo", "add", "welcome10", "--percent", "10", "--max-uses", "2"]).unwrap();
        let verdict = run(
            &ledger,
            &["promo", "check", "WELCOME10", "--type", "sell", "--user", "1"],
        )
        .unwrap();
        assert_eq!(verdict.trim(), "promo code WELCOME10 applied (10%)");

        let csv = run(&ledger, &["promo", "list"]).unwrap();
        assert!(csv.contains(",WELCOME10,10,BOTH,2,0,true"));
    }

    #[test]
    fn test_errors_are_user_messages() {
        let ledger = TransactionLedger::new(MemoryStore::new());

        let err = run(&ledger, &["transition", "RP-NOPE", "paid"]).unwrap_err();
        assert_eq!(err, "transaction 'RP-NOPE' not found");

        let err = run(&ledger, &["show", "RP-NOPE"]).unwrap_err();
        assert_eq!(err, "transaction 'RP-NOPE' not found");
    }

    #[test]
    fn test_rates_show_and_update() {
        let ledger = TransactionLedger::new(MemoryStore::new());

        let shown = run(&ledger, &["rates"]).unwrap();
        assert!(shown.contains("\"sellRate\": \"95000\""));

        run(&ledger, &["rates", "--buy", "110000"]).unwrap();
        let rates = ledger.settings().unwrap().rates;
        assert_eq!(rates.buy_rate, rust_decimal::Decimal::from(110_000));
        assert_eq!(rates.sell_rate, rust_decimal::Decimal::from(95_000));
    }
}
