use crate::io::parse_chip_amount;
use crate::types::{PaymentMethod, PromoScope, TransactionStatus, TransactionType};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;

/// Operate the chip exchange ledger
#[derive(Parser, Debug)]
#[command(name = "chipex")]
#[command(about = "Operate the chip exchange transaction and incentive ledger", long_about = None)]
pub struct CliArgs {
    /// Directory holding the ledger document
    #[arg(
        long = "data-dir",
        value_name = "DIR",
        env = "CHIPEX_DATA_DIR",
        default_value = "./chipex-data",
        help = "Directory holding the ledger JSON document"
    )]
    pub data_dir: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Record a SELL: the user sends chips and is paid out
    Sell {
        #[arg(long, help = "Game account id of the seller")]
        user: String,

        #[arg(long, value_parser = parse_chips, help = "Chip amount, e.g. 1.5b or 750m")]
        chips: u64,

        #[arg(long, value_enum, default_value = "bank")]
        method: MethodArg,

        #[arg(long, help = "Bank or e-wallet provider")]
        provider: String,

        #[arg(long = "account-number")]
        account_number: String,

        #[arg(long = "account-name")]
        account_name: String,

        #[command(flatten)]
        incentives: IncentiveArgs,
    },

    /// Record a BUY of a catalog package
    Buy {
        #[arg(long, help = "Game account id receiving the chips")]
        user: String,

        #[arg(long, help = "Chip package id, e.g. p1")]
        package: String,

        #[command(flatten)]
        incentives: IncentiveArgs,
    },

    /// Print one transaction as JSON
    Show { id: String },

    /// Export transactions as CSV, newest first
    List {
        #[arg(long, value_enum)]
        status: Option<StatusArg>,

        #[arg(long = "type", value_enum)]
        tx_type: Option<TypeArg>,
    },

    /// Move a transaction to a new status
    Transition {
        id: String,

        #[arg(value_enum)]
        status: StatusArg,
    },

    /// Pending work for the operator
    Summary,

    /// Public feed of recently paid transactions
    Feed {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Manage promo codes
    Promo {
        #[command(subcommand)]
        action: PromoCommand,
    },

    /// VIP program
    Vip {
        #[command(subcommand)]
        action: VipCommand,
    },

    /// Affiliate program
    Affiliate {
        #[command(subcommand)]
        action: AffiliateCommand,
    },

    /// Show or change exchange rates (money per 1B chips)
    Rates {
        #[arg(long)]
        sell: Option<Decimal>,

        #[arg(long)]
        buy: Option<Decimal>,
    },

    /// Switch maintenance mode on or off
    Maintenance {
        #[arg(action = ArgAction::Set)]
        enabled: bool,
    },
}

/// Promo and referral context of a submission
#[derive(clap::Args, Debug, Clone, Default)]
pub struct IncentiveArgs {
    #[arg(long, help = "Promo code to redeem")]
    pub promo: Option<String>,

    #[arg(long = "ref", value_name = "REFERRER", help = "Referrer id from the referral link")]
    pub referrer: Option<String>,

    #[arg(long = "dry-run", help = "Print the price without recording anything")]
    pub dry_run: bool,
}

#[derive(Subcommand, Debug)]
pub enum PromoCommand {
    /// Create a promo code
    Add {
        code: String,

        #[arg(long)]
        percent: Decimal,

        #[arg(long = "type", value_enum, default_value = "both")]
        scope: ScopeArg,

        #[arg(long = "max-uses", default_value_t = 0, help = "0 means unlimited")]
        max_uses: u32,
    },

    /// Export promo codes as CSV
    List,

    /// Change fields of a promo code
    Update {
        id: String,

        #[arg(long)]
        code: Option<String>,

        #[arg(long)]
        percent: Option<Decimal>,

        #[arg(long = "type", value_enum)]
        scope: Option<ScopeArg>,

        #[arg(long = "max-uses")]
        max_uses: Option<u32>,

        #[arg(long, action = ArgAction::Set)]
        active: Option<bool>,
    },

    /// Delete a promo code
    Remove { id: String },

    /// Check a code for a user without redeeming it
    Check {
        code: String,

        #[arg(long = "type", value_enum)]
        tx_type: TypeArg,

        #[arg(long)]
        user: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum VipCommand {
    /// Tier and progress of a user
    Status { user: String },

    /// Switch the VIP program on or off
    Enable {
        #[arg(action = ArgAction::Set)]
        enabled: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum AffiliateCommand {
    /// Referral stats of a referrer
    Stats { user: String },

    /// Pay out a referrer's whole commission balance
    Payout { user: String },

    /// Change the affiliate program settings
    Configure {
        #[arg(long, action = ArgAction::Set)]
        enabled: Option<bool>,

        #[arg(long, help = "Commission percentage, 0-100")]
        rate: Option<Decimal>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    Pending,
    Verifying,
    Paid,
    Rejected,
}

impl From<StatusArg> for TransactionStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Pending => TransactionStatus::Pending,
            StatusArg::Verifying => TransactionStatus::Verifying,
            StatusArg::Paid => TransactionStatus::Paid,
            StatusArg::Rejected => TransactionStatus::Rejected,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum TypeArg {
    Sell,
    Buy,
}

impl From<TypeArg> for TransactionType {
    fn from(arg: TypeArg) -> Self {
        match arg {
            TypeArg::Sell => TransactionType::Sell,
            TypeArg::Buy => TransactionType::Buy,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum MethodArg {
    Bank,
    #[value(name = "e-wallet")]
    EWallet,
}

impl From<MethodArg> for PaymentMethod {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Bank => PaymentMethod::Bank,
            MethodArg::EWallet => PaymentMethod::EWallet,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ScopeArg {
    Buy,
    Sell,
    Both,
}

impl From<ScopeArg> for PromoScope {
    fn from(arg: ScopeArg) -> Self {
        match arg {
            ScopeArg::Buy => PromoScope::Buy,
            ScopeArg::Sell => PromoScope::Sell,
            ScopeArg::Both => PromoScope::Both,
        }
    }
}

fn parse_chips(input: &str) -> Result<u64, String> {
    parse_chip_amount(input).map_err(|e| e.to_string())
}
