pub mod extract;
pub mod init;
pub mod reconcile;
pub mod status;

use std::path::Path;

use clap::{Parser, Subcommand};
use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::error::Result;
use crate::fmt::display_value;
use crate::models::{StatementTable, Value};

#[derive(Parser)]
#[command(name = "cotejo", about = "Extract bank statements and reconcile them against the ledger.")]
pub struct Cli {
    /// Log extraction and matching details to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write settings and create the local ledger database.
    Init {
        /// Path for cotejo data (default: ~/Documents/cotejo)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Extract the movements of a statement file.
    Extract {
        /// Statement file (.xls, .xlsx, .ods or .csv)
        file: String,
        /// Bank format: brou or itau
        #[arg(long)]
        bank: String,
        /// Write the extracted table to this CSV file
        #[arg(long)]
        output: Option<String>,
    },
    /// Extract a statement and match it against pending ledger rows.
    Reconcile {
        /// Statement file (.xls, .xlsx, .ods or .csv)
        file: String,
        /// Bank format: brou or itau
        #[arg(long)]
        bank: String,
        /// Only ledger rows of this account
        #[arg(long)]
        account: Option<String>,
        /// Join mode: inner or audit (default from settings)
        #[arg(long)]
        mode: Option<String>,
        /// Ledger source, SQLite database or CSV (default from settings)
        #[arg(long)]
        ledger: Option<String>,
        /// Write the result table to this CSV file
        #[arg(long)]
        output: Option<String>,
    },
    /// Show settings and ledger summary.
    Status,
}

/// Print a table with locale-formatted cells; `Encontrado` flags are coloured.
pub(crate) fn print_table(title: &str, data: &StatementTable) {
    let mut table = Table::new();
    table.set_header(data.columns.iter().map(Cell::new).collect::<Vec<_>>());
    for row in &data.rows {
        table.add_row(
            row.values
                .iter()
                .map(|v| match v {
                    Value::Bool(true) => Cell::new(display_value(v).green()),
                    Value::Bool(false) => Cell::new(display_value(v).red()),
                    _ => Cell::new(display_value(v)),
                })
                .collect::<Vec<_>>(),
        );
    }
    println!("{}\n{table}", title.bold());
}

pub(crate) fn write_csv(path: &Path, data: &StatementTable) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().from_path(path)?;
    writer.write_record(&data.columns)?;
    for row in &data.rows {
        writer.write_record(row.values.iter().map(Value::to_string))?;
    }
    writer.flush()?;
    Ok(())
}
