//! I/O module
//!
//! Everything that touches the world outside the ledger.
//!
//! # Components
//!
//! - `json_store` - Durable `AtomicStore` over one JSON file per key
//! - `csv_format` - CSV exports for the operator
//! - `notifier` - Log and channel notifiers, notification text
//! - `chips` - Parsing and formatting of chip amounts

pub mod chips;
pub mod csv_format;
pub mod json_store;
pub mod notifier;

pub use chips::{format_chip_amount, parse_chip_amount};
pub use csv_format::{write_promos_csv, write_transactions_csv};
pub use json_store::JsonFileStore;
pub use notifier::{render_message, ChannelNotifier, LogNotifier};
