//! CSV output for operator exports
//!
//! Column names follow the ledger's JSON field names. Optional fields are
//! written as empty cells; timestamps are RFC 3339 UTC with milliseconds.

use crate::types::{PromoCode, Transaction, TransactionDetails};
use chrono::{DateTime, SecondsFormat, Utc};
use std::io::Write;

const TRANSACTION_HEADER: [&str; 12] = [
    "id",
    "type",
    "status",
    "destinationId",
    "chipAmount",
    "moneyValue",
    "destination",
    "promoCodeUsed",
    "referrerId",
    "createdAt",
    "verifiedAt",
    "paidAt",
];

const PROMO_HEADER: [&str; 7] = [
    "id",
    "code",
    "discountPercent",
    "type",
    "maxUses",
    "currentUses",
    "isActive",
];

/// Write transactions as CSV in the given order
///
/// The `destination` column holds the payout account of a SELL
/// (`method/provider/number/name`) or the package id of a BUY.
///
/// # Arguments
///
/// * `transactions` - Transactions to write
/// * `output` - Mutable reference to a writer for outputting CSV
///
/// # Returns
///
/// * `Ok(())` if writing succeeded
/// * `Err(String)` if a write error occurred
pub fn write_transactions_csv(
    transactions: &[Transaction],
    output: &mut dyn Write,
) -> Result<(), String> {
    let mut writer = csv::Writer::from_writer(output);

    writer
        .write_record(TRANSACTION_HEADER)
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    for tx in transactions {
        let destination = match &tx.details {
            TransactionDetails::Sell { payment_details } => format!(
                "{}/{}/{}/{}",
                payment_details.method,
                payment_details.provider,
                payment_details.account_number,
                payment_details.account_name
            ),
            TransactionDetails::Buy { chip_package } => chip_package.id.clone(),
        };

        writer
            .write_record(&[
                tx.id.clone(),
                tx.tx_type().to_string(),
                tx.status.to_string(),
                tx.destination_id.clone(),
                tx.chip_amount.to_string(),
                tx.money_value.to_string(),
                destination,
                tx.promo_code_used.clone().unwrap_or_default(),
                tx.referrer_id.clone().unwrap_or_default(),
                timestamp(tx.created_at),
                tx.verified_at.map(timestamp).unwrap_or_default(),
                tx.paid_at.map(timestamp).unwrap_or_default(),
            ])
            .map_err(|e| format!("Failed to write transaction {}: {}", tx.id, e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))
}

/// Write promo codes as CSV, sorted by code
pub fn write_promos_csv(promos: &[PromoCode], output: &mut dyn Write) -> Result<(), String> {
    let mut writer = csv::Writer::from_writer(output);

    writer
        .write_record(PROMO_HEADER)
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    let mut sorted: Vec<&PromoCode> = promos.iter().collect();
    sorted.sort_by(|a, b| a.code.cmp(&b.code));

    for promo in sorted {
        let scope = serde_json::to_value(promo.scope)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        writer
            .write_record(&[
                promo.id.clone(),
                promo.code.clone(),
                promo.discount_percent.to_string(),
                scope,
                promo.max_uses.to_string(),
                promo.current_uses.to_string(),
                promo.is_active.to_string(),
            ])
            .map_err(|e| format!("Failed to write promo {}: {}", promo.code, e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
