use std::path::PathBuf;

use colored::Colorize;

use crate::cli::{print_table, write_csv};
use crate::convert;
use crate::error::Result;
use crate::extract::extract_statement;
use crate::fmt::percent;
use crate::formats::parse_format;
use crate::ledger::{fetch_required, open_provider};
use crate::matcher::{match_audit, match_inner, pairs_table, JoinMode};
use crate::settings::{load_settings, shellexpand_path};

pub fn run(
    file: &str,
    bank: &str,
    account: Option<&str>,
    mode: Option<&str>,
    ledger: Option<&str>,
    output: Option<&str>,
) -> Result<()> {
    let settings = load_settings();
    let format = parse_format(bank)?;
    let mode = match mode {
        Some(m) => m.parse::<JoinMode>()?,
        None => settings.matching.mode,
    };
    let source = match ledger {
        Some(path) => PathBuf::from(shellexpand_path(path)),
        None => settings.ledger_source(),
    };
    let key_config = settings.matching.key_config(&settings.ledger);

    let converter = convert::from_settings(&settings);
    let statement = extract_statement(&PathBuf::from(file), format, converter.as_ref())?;
    println!("{} processed ({} rows).", format.name(), statement.len());

    let provider = open_provider(&source, &settings.ledger);
    let rows = fetch_required(provider.as_ref(), account)?;
    println!("{} ledger rows read from {}.", rows.len(), source.display());

    let result = match mode {
        JoinMode::Inner => {
            let pairs = match_inner(&statement, &rows, &key_config)?;
            println!("{} matched pairs.", pairs.len());
            pairs_table(&statement, &pairs, &key_config.id_column)
        }
        JoinMode::Audit => {
            let audit = match_audit(&statement, &rows, &key_config)?;
            let s = audit.summary;
            println!();
            println!("Total:      {}", s.total);
            println!("Found:      {}", s.found.to_string().green());
            println!("Not found:  {}", s.not_found.to_string().red());
            println!("Match rate: {}", percent(s.match_rate()));
            println!();
            audit.table
        }
    };

    print_table("Result", &result);

    if let Some(out) = output {
        write_csv(&PathBuf::from(out), &result)?;
        println!("Written to {out}");
    }
    Ok(())
}
