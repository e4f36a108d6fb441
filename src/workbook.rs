use std::path::Path;

use calamine::{Data, Range, Reader};

use crate::dates::{excel_serial_to_date, parse_date_dmy};
use crate::error::{CotejoError, Result};
use crate::models::{RawCell, RawGrid};

fn data_to_cell(data: &Data) -> RawCell {
    match data {
        Data::String(s) if s.trim().is_empty() => RawCell::Empty,
        Data::String(s) => RawCell::Text(s.clone()),
        Data::Float(f) => RawCell::Number(*f),
        Data::Int(i) => RawCell::Number(*i as f64),
        Data::Bool(b) => RawCell::Text(b.to_string()),
        Data::DateTime(dt) => excel_serial_to_date(dt.as_f64()).map_or(RawCell::Empty, RawCell::Date),
        Data::DateTimeIso(s) => parse_date_dmy(s).map_or_else(|| RawCell::Text(s.clone()), RawCell::Date),
        Data::DurationIso(s) => RawCell::Text(s.clone()),
        _ => RawCell::Empty,
    }
}

/// Calamine ranges start at the first used cell; pad so indices match the sheet.
fn range_to_grid(name: String, range: &Range<Data>) -> RawGrid {
    let (first_row, first_col) = range.start().unwrap_or((0, 0));
    let mut rows: Vec<Vec<RawCell>> = vec![Vec::new(); first_row as usize];
    for row in range.rows() {
        let mut cells = vec![RawCell::Empty; first_col as usize];
        cells.extend(row.iter().map(data_to_cell));
        rows.push(cells);
    }
    RawGrid::new(name, rows)
}

fn read_workbook_grids(path: &Path) -> Result<Vec<RawGrid>> {
    let mut workbook = calamine::open_workbook_auto(path)
        .map_err(|e| CotejoError::Workbook(format!("{}: {e}", path.display())))?;
    Ok(workbook
        .worksheets()
        .into_iter()
        .map(|(name, range)| range_to_grid(name, &range))
        .collect())
}

fn sniff_delimiter(content: &str) -> u8 {
    let head: String = content.lines().take(10).collect();
    let semicolons = head.matches(';').count();
    let commas = head.matches(',').count();
    if semicolons > commas {
        b';'
    } else {
        b','
    }
}

fn read_csv_grid(path: &Path) -> Result<RawGrid> {
    let bytes = std::fs::read(path)?;
    let content = String::from_utf8_lossy(&bytes);
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(sniff_delimiter(&content))
        .from_reader(content.as_bytes());
    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(
            record
                .iter()
                .map(|f| {
                    if f.trim().is_empty() {
                        RawCell::Empty
                    } else {
                        RawCell::Text(f.to_string())
                    }
                })
                .collect(),
        );
    }
    let name = path
        .file_stem()
        .and_then(|n| n.to_str())
        .unwrap_or("csv")
        .to_string();
    Ok(RawGrid::new(name, rows))
}

/// One grid per worksheet (`.xlsx`, `.xlsm`, `.xls`, `.ods`) or a single grid for `.csv`.
pub fn read_grids(path: &Path) -> Result<Vec<RawGrid>> {
    if !path.exists() {
        return Err(CotejoError::FileNotFound(path.to_path_buf()));
    }
    let is_csv = path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("csv") || e.eq_ignore_ascii_case("txt"));
    if is_csv {
        Ok(vec![read_csv_grid(path)?])
    } else {
        read_workbook_grids(path)
    }
}
