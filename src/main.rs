//! Chip exchange ledger CLI
//!
//! Operator tool for recording and settling chip exchange transactions.
//!
//! # Usage
//!
//! ```bash
//! chipex buy --user 12345 --package p2 --promo WELCOME10
//! chipex sell --user 12345 --chips 1.5b --provider BCA --account-number 123 --account-name Budi
//! chipex transition RP-LOYW3V28 paid
//! chipex list --status pending > pending.csv
//! chipex promo add WELCOME10 --percent 10 --max-uses 100
//! CHIPEX_LOG=debug chipex --data-dir /var/lib/chipex summary
//! ```
//!
//! Results are written to stdout; logs go to stderr.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (invalid input, unknown id, storage failure, etc.)

use chip_exchange_ledger::cli;
use chip_exchange_ledger::core::TransactionLedger;
use chip_exchange_ledger::io::{JsonFileStore, LogNotifier};
use std::process;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_env("CHIPEX_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    init_tracing();

    let args = cli::parse_args();

    let store = match JsonFileStore::open(&args.data_dir) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
    let ledger = TransactionLedger::new(store).with_notifier(Arc::new(LogNotifier));

    let mut output = std::io::stdout();
    if let Err(e) = cli::execute(args, &ledger, &mut output) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
