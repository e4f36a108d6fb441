use std::path::Path;

use log::info;

use crate::aggregate::aggregate_blocks;
use crate::convert::FormatConverter;
use crate::error::{CotejoError, Result};
use crate::formats::BankFormat;
use crate::models::{RawGrid, StatementTable};
use crate::workbook::read_grids;

/// Extract from grids that were already read (or rendered by another tool).
pub fn extract_grids(grids: &[RawGrid], format: BankFormat) -> Result<StatementTable> {
    let profile = format.profile()?;
    aggregate_blocks(grids, &profile)
}

/// Extract one statement file into the bank's canonical table.
pub fn extract_statement(
    path: &Path,
    format: BankFormat,
    converter: &dyn FormatConverter,
) -> Result<StatementTable> {
    if !path.exists() {
        return Err(CotejoError::FileNotFound(path.to_path_buf()));
    }
    let readable = converter.convert(path)?;
    let grids = read_grids(&readable)?;
    let table = extract_grids(&grids, format)?;
    info!(
        "{}: {} movement(s) from {} block(s) ({})",
        path.display(),
        table.len(),
        grids.len(),
        format.name()
    );
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::NativeConverter;
    use crate::formats::{CONCEPTO, CREDITO, DEBITO, DESCRIPCION, FECHA};
    use crate::models::Value;
    use chrono::NaiveDate;
    use rust_xlsxwriter::Workbook;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_extract_brou_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brou.csv");
        std::fs::write(
            &path,
            "BROU - Detalle de movimientos;;;\n\
             Cuenta;001234567;;\n\
             ;;;\n\
             Fecha;Descripción;Débito;Crédito\n\
             02/01/2025;COMPRA POS;1.234,56;\n\
             03/01/2025;TRANSFERENCIA;;500,00\n\
             Saldo actual;;;2.000,00\n",
        )
        .unwrap();
        let table = extract_statement(&path, BankFormat::Brou, &NativeConverter).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.value(0, FECHA), Some(&Value::Date(ymd(2025, 1, 2))));
        assert_eq!(table.value(0, DEBITO), Some(&Value::Number(1234.56)));
        assert_eq!(table.value(1, CREDITO), Some(&Value::Number(500.0)));
        assert_eq!(table.value(1, DESCRIPCION), Some(&Value::Text("TRANSFERENCIA".into())));
    }

    #[test]
    fn test_extract_itau_workbook_with_two_sheets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("itau.xlsx");
        let mut workbook = Workbook::new();
        for (sheet_idx, concept) in ["ENERO", "FEBRERO"].iter().enumerate() {
            let sheet = workbook.add_worksheet();
            sheet.write_string(0, 0, "Itaú - Estado de cuenta").unwrap();
            sheet.write_string(2, 0, "Fecha").unwrap();
            sheet.write_string(2, 1, "Concepto").unwrap();
            sheet.write_string(3, 2, "Débito").unwrap();
            sheet.write_string(3, 3, "Crédito").unwrap();
            sheet.write_string(4, 0, &format!("1{}/0{}/2025", sheet_idx, sheet_idx + 1)).unwrap();
            sheet.write_string(4, 1, *concept).unwrap();
            sheet.write_number(4, 2, 100.0).unwrap();
            sheet.write_string(5, 0, "Cantidad de movimientos: 1").unwrap();
        }
        workbook.save(&path).unwrap();

        let table = extract_statement(&path, BankFormat::Itau, &NativeConverter).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.value(0, CONCEPTO), Some(&Value::Text("ENERO".into())));
        assert_eq!(table.value(1, CONCEPTO), Some(&Value::Text("FEBRERO".into())));
        assert_eq!(table.value(1, FECHA), Some(&Value::Date(ymd(2025, 2, 11))));
        assert_eq!(table.value(0, DEBITO), Some(&Value::Number(100.0)));
    }

    #[test]
    fn test_missing_file() {
        let err = extract_statement(Path::new("/nope/brou.xls"), BankFormat::Brou, &NativeConverter).unwrap_err();
        assert!(matches!(err, CotejoError::FileNotFound(_)));
    }

    #[test]
    fn test_unrelated_sheet_has_no_header() {
        let grids = vec![RawGrid::from_text("x", &[&["Nombre", "Edad"], &["Ana", "30"]])];
        assert!(matches!(
            extract_grids(&grids, BankFormat::Itau),
            Err(CotejoError::NoCompatibleHeader)
        ));
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let grids = vec![RawGrid::from_text(
            "s",
            &[&["Fecha", "Descripción", "Débito", "Crédito"], &["02/01/2025", "A", "1,00", ""]],
        )];
        let a = extract_grids(&grids, BankFormat::Brou).unwrap();
        let b = extract_grids(&grids, BankFormat::Brou).unwrap();
        assert_eq!(a, b);
    }
}
