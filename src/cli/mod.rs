// CLI module
// Command-line interface, argument parsing and command dispatch

mod args;
mod commands;

pub use args::{
    AffiliateCommand, CliArgs, Command, IncentiveArgs, MethodArg, PromoCommand, ScopeArg,
    StatusArg, TypeArg, VipCommand,
};
pub use commands::execute;

use clap::Parser;

/// Parse command-line arguments using clap
///
/// If parsing fails (e.g., unknown subcommand, missing required arguments, or
/// --help flag), clap will automatically display an error message or help text
/// and exit the process.
///
/// # Returns
///
/// Returns a `CliArgs` struct with the parsed command-line arguments.
pub fn parse_args() -> CliArgs {
    CliArgs::parse()
}
