//! `kitchen` dashboard entry point.

use clap::Parser;
use kitchen_cli::{commands, ApiClient, Cli, Commands};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = kitchen_core::init_logging(&cli.log_level, None) {
        eprintln!("kitchen: logging disabled: {err}");
    }

    let client = ApiClient::new(&cli.config());
    let result = match &cli.command {
        Commands::Watch(args) => commands::watch(&client, args),
        Commands::Show(args) => commands::show(&client, args),
        Commands::Advance(args) => commands::advance(&client, args),
        Commands::Statuses => commands::statuses(&client),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("kitchen: {err}");
            ExitCode::FAILURE
        }
    }
}
