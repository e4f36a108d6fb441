use crate::db::{get_connection, ledger_counts};
use crate::error::Result;
use crate::formats::ALL_FORMATS;
use crate::settings::{load_settings, settings_file_exists};

pub fn run() -> Result<()> {
    let settings = load_settings();
    let source = settings.ledger_source();

    if !settings_file_exists() {
        println!("Settings not found, using defaults. Run `cotejo init` to set up.");
    }
    println!("Data dir:   {}", settings.data_dir);
    println!("Ledger:     {}", source.display());
    println!("Table:      {}", settings.ledger.table);
    println!("Match mode: {:?}", settings.matching.mode);
    println!("Amounts:    {:?}", settings.matching.amount_convention);
    println!(
        "Converter:  {}",
        settings.converter.as_deref().unwrap_or("(native)")
    );
    println!(
        "Banks:      {}",
        ALL_FORMATS.iter().map(|f| f.key()).collect::<Vec<_>>().join(", ")
    );

    let is_local = settings.ledger.source.is_none();
    if is_local && source.exists() {
        let conn = get_connection(&source)?;
        let (total, pending) = ledger_counts(&conn)?;
        println!();
        println!("Ledger rows: {total}");
        println!("Pending:     {pending}");
    } else if !source.exists() {
        println!();
        println!("Ledger source not found.");
    }
    Ok(())
}
