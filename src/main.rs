mod aggregate;
mod amount;
mod cli;
mod columns;
mod convert;
mod dates;
mod db;
mod error;
mod extract;
mod fmt;
mod formats;
mod header;
mod ledger;
mod matcher;
mod models;
mod settings;
mod table;
mod text;
mod workbook;

use clap::Parser;
use env_logger::Env;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Extract { file, bank, output } => cli::extract::run(&file, &bank, output.as_deref()),
        Commands::Reconcile {
            file,
            bank,
            account,
            mode,
            ledger,
            output,
        } => cli::reconcile::run(
            &file,
            &bank,
            account.as_deref(),
            mode.as_deref(),
            ledger.as_deref(),
            output.as_deref(),
        ),
        Commands::Status => cli::status::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
