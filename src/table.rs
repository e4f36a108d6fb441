use log::debug;

use crate::amount::normalize_amount;
use crate::dates::cell_date;
use crate::formats::{FormatProfile, FECHA};
use crate::header::is_footer_row;
use crate::models::{CanonicalRow, ColumnMap, HeaderCandidate, RawCell, RawGrid, StatementTable, Value};

fn text_value(cell: &RawCell) -> Value {
    if cell.is_empty() {
        Value::Null
    } else {
        Value::Text(cell.text())
    }
}

/// Build the canonical rows of one block, from the row after the header window
/// up to the first footer row.
pub fn build_table(
    grid: &RawGrid,
    header: &HeaderCandidate,
    map: &ColumnMap,
    profile: &FormatProfile,
) -> StatementTable {
    let mut table = StatementTable::new(profile.columns());
    let Some(date_col) = map.get(FECHA) else {
        return table;
    };
    let mut dropped = 0usize;

    for row_idx in header.data_start()..grid.row_count() {
        if is_footer_row(&grid.rows[row_idx], profile.footer_hints) {
            debug!("[{}] footer at row {row_idx}, stopping", grid.name);
            break;
        }
        // blank separator
        if map.columns().all(|c| grid.cell(row_idx, c).is_empty()) {
            continue;
        }
        let Some(date) = cell_date(grid.cell(row_idx, date_col)) else {
            dropped += 1;
            continue;
        };

        let values = profile
            .schema
            .iter()
            .map(|field| {
                if *field == FECHA {
                    return Value::Date(date);
                }
                match map.get(field) {
                    None => Value::Null,
                    Some(col) if profile.is_amount_field(field) => normalize_amount(grid.cell(row_idx, col)).into(),
                    Some(col) => text_value(grid.cell(row_idx, col)),
                }
            })
            .collect();
        table.rows.push(CanonicalRow { values });
    }

    if dropped > 0 {
        debug!("[{}] dropped {dropped} row(s) without a valid date", grid.name);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::map_header;
    use crate::formats::{BankFormat, ASUNTO, CONCEPTO, CREDITO, DEBITO, DESCRIPCION, SALDO};
    use crate::header::locate_header;
    use chrono::NaiveDate;

    fn build(format: BankFormat, rows: &[&[&str]]) -> StatementTable {
        let profile = format.profile().unwrap();
        let grid = RawGrid::from_text("test", rows);
        let header = locate_header(&grid, &profile).unwrap();
        let map = map_header(&header, &profile);
        build_table(&grid, &header, &map, &profile)
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_builds_typed_rows_in_schema_order() {
        let table = build(
            BankFormat::Brou,
            &[
                &["Fecha", "Descripción", "Débito", "Crédito"],
                &["02/01/2025", "COMPRA POS", "1.234,56", ""],
                &["03/01/2025", "TRANSFERENCIA", "", "(50,00)"],
            ],
        );
        assert_eq!(table.columns.len(), 7);
        assert_eq!(table.len(), 2);
        assert_eq!(table.value(0, FECHA), Some(&Value::Date(ymd(2025, 1, 2))));
        assert_eq!(table.value(0, DESCRIPCION), Some(&Value::Text("COMPRA POS".into())));
        assert_eq!(table.value(0, DEBITO), Some(&Value::Number(1234.56)));
        assert_eq!(table.value(0, CREDITO), Some(&Value::Null));
        assert_eq!(table.value(0, ASUNTO), Some(&Value::Null));
        assert_eq!(table.value(1, CREDITO), Some(&Value::Number(-50.0)));
    }

    #[test]
    fn test_stops_at_footer_banner() {
        let table = build(
            BankFormat::Brou,
            &[
                &["Fecha", "Descripción", "Débito", "Crédito"],
                &["02/01/2025", "COMPRA", "100,00", ""],
                &["Saldo actual 1.000,00"],
                &["04/01/2025", "DESPUES DEL PIE", "5,00", ""],
            ],
        );
        assert_eq!(table.len(), 1);
        assert_eq!(table.value(0, DESCRIPCION), Some(&Value::Text("COMPRA".into())));
    }

    #[test]
    fn test_blank_rows_are_skipped_not_terminal() {
        let table = build(
            BankFormat::Brou,
            &[
                &["Fecha", "Descripción", "Débito", "Crédito"],
                &["02/01/2025", "UNO", "1,00", ""],
                &["", "", "", ""],
                &[],
                &["03/01/2025", "DOS", "2,00", ""],
            ],
        );
        assert_eq!(table.len(), 2);
        assert_eq!(table.value(1, DESCRIPCION), Some(&Value::Text("DOS".into())));
    }

    #[test]
    fn test_rows_with_bad_dates_are_dropped() {
        let table = build(
            BankFormat::Brou,
            &[
                &["Fecha", "Descripción", "Débito", "Crédito"],
                &["Movimientos del mes", "", "", ""],
                &["02/01/2025", "UNO", "1,00", ""],
                &["31/02/2025", "INVALIDA", "1,00", ""],
            ],
        );
        assert_eq!(table.len(), 1);
        assert!(table.rows.iter().all(|r| !r.values[0].is_null()));
    }

    #[test]
    fn test_fused_header_continuation_row_is_not_data() {
        let table = build(
            BankFormat::Itau,
            &[
                &["Fecha", "Concepto", "", "", ""],
                &["", "", "Débito", "Crédito", "Saldo"],
                &["05/01/2025", "DEPOSITO", "", "2.000,00", "2.000,00"],
                &["Cantidad de movimientos: 1"],
            ],
        );
        assert_eq!(table.len(), 1);
        assert_eq!(table.value(0, CONCEPTO), Some(&Value::Text("DEPOSITO".into())));
        assert_eq!(table.value(0, SALDO), Some(&Value::Number(2000.0)));
        assert_eq!(table.value(0, DEBITO), Some(&Value::Null));
    }

    #[test]
    fn test_numeric_and_date_cells() {
        let profile = BankFormat::Itau.profile().unwrap();
        let grid = RawGrid::new(
            "typed",
            vec![
                vec![
                    RawCell::Text("Fecha".into()),
                    RawCell::Text("Concepto".into()),
                    RawCell::Text("Débito".into()),
                ],
                vec![RawCell::Number(45667.0), RawCell::Number(1234.0), RawCell::Number(99.999)],
                vec![RawCell::Date(ymd(2025, 1, 11)), RawCell::Text("X".into()), RawCell::Empty],
            ],
        );
        let header = locate_header(&grid, &profile).unwrap();
        let map = map_header(&header, &profile);
        let table = build_table(&grid, &header, &map, &profile);
        assert_eq!(table.len(), 2);
        assert_eq!(table.value(0, FECHA), Some(&Value::Date(ymd(2025, 1, 10))));
        assert_eq!(table.value(0, CONCEPTO), Some(&Value::Text("1234".into())));
        assert_eq!(table.value(0, DEBITO), Some(&Value::Number(100.0)));
        assert_eq!(table.value(1, FECHA), Some(&Value::Date(ymd(2025, 1, 11))));
    }

    #[test]
    fn test_huge_number_in_date_column_is_dropped() {
        let profile = BankFormat::Brou.profile().unwrap();
        let grid = RawGrid::new(
            "brou",
            vec![
                ["Fecha", "Descripción", "Débito", "Crédito"]
                    .iter()
                    .map(|s| RawCell::Text(s.to_string()))
                    .collect(),
                vec![
                    RawCell::Number(4e15),
                    RawCell::Text("TARJETA".into()),
                    RawCell::Number(10.0),
                    RawCell::Empty,
                ],
                vec![
                    RawCell::Text("02/01/2025".into()),
                    RawCell::Text("COMPRA".into()),
                    RawCell::Number(5.0),
                    RawCell::Empty,
                ],
            ],
        );
        let header = locate_header(&grid, &profile).unwrap();
        let map = map_header(&header, &profile);
        let table = build_table(&grid, &header, &map, &profile);
        assert_eq!(table.len(), 1);
        assert_eq!(table.value(0, DESCRIPCION), Some(&Value::Text("COMPRA".into())));
    }
}
