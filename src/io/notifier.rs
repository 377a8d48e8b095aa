//! Notifier implementations
//!
//! `LogNotifier` writes each event to the log. `ChannelNotifier` hands events
//! to a `tokio` task (a bot, a webhook sender) through an unbounded channel,
//! so `create` never waits on the messaging side.

use crate::core::traits::Notifier;
use crate::io::chips::format_chip_amount;
use crate::types::{LedgerError, TransactionEvent, TransactionType};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::info;

/// Plain-text notification for the operator channel
pub fn render_message(event: &TransactionEvent) -> String {
    let action = match event.tx_type {
        TransactionType::Sell => "sells",
        TransactionType::Buy => "buys",
    };
    let mut message = format!(
        "New {} transaction {}: {} {} {} chips for {}",
        event.tx_type,
        event.transaction_id,
        event.user_id,
        action,
        format_chip_amount(event.chip_amount),
        event.amount
    );
    if let Some(code) = &event.promo_code {
        message.push_str(&format!(" (promo {})", code));
    }
    message
}

/// Logs every event at info level
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn dispatch(&self, event: &TransactionEvent) -> Result<(), LedgerError> {
        info!(tx_id = %event.transaction_id, "{}", render_message(event));
        Ok(())
    }
}

/// Forwards events to an async consumer
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: UnboundedSender<TransactionEvent>,
}

impl ChannelNotifier {
    /// Create a notifier and the receiving end for the consumer task
    pub fn channel() -> (Self, UnboundedReceiver<TransactionEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (ChannelNotifier { sender }, receiver)
    }
}

impl Notifier for ChannelNotifier {
    fn dispatch(&self, event: &TransactionEvent) -> Result<(), LedgerError> {
        self.sender
            .send(event.clone())
            .map_err(|_| LedgerError::delivery("notification channel closed"))
    }
}
