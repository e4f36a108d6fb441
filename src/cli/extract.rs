use std::path::PathBuf;

use crate::cli::{print_table, write_csv};
use crate::convert;
use crate::error::Result;
use crate::extract::extract_statement;
use crate::formats::parse_format;
use crate::settings::load_settings;

pub fn run(file: &str, bank: &str, output: Option<&str>) -> Result<()> {
    let settings = load_settings();
    let format = parse_format(bank)?;
    let converter = convert::from_settings(&settings);

    let table = extract_statement(&PathBuf::from(file), format, converter.as_ref())?;
    print_table(&format!("{}: {} movements", format.name(), table.len()), &table);

    if let Some(out) = output {
        write_csv(&PathBuf::from(out), &table)?;
        println!("Written to {out}");
    }
    Ok(())
}
