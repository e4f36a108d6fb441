use log::debug;

use crate::columns::map_columns;
use crate::formats::{FormatProfile, FECHA};
use crate::models::{ColumnMap, HeaderCandidate, HeaderStrategy, RawCell, RawGrid};
use crate::text::normalize_label;

const MAX_DEPTH: usize = 3;

/// True when the row's joined text contains one of the footer sentinels.
pub fn is_footer_row(row: &[RawCell], hints: &[&str]) -> bool {
    let text = row
        .iter()
        .map(|c| normalize_label(&c.text()))
        .collect::<Vec<_>>()
        .join(" ");
    hints.iter().any(|h| text.contains(h))
}

/// Join the non-empty texts of `depth` stacked rows, column by column.
pub fn fuse_rows(grid: &RawGrid, start: usize, depth: usize) -> Vec<String> {
    let width = grid.rows[start..start + depth]
        .iter()
        .map(Vec::len)
        .max()
        .unwrap_or(0);
    (0..width)
        .map(|col| {
            (start..start + depth)
                .map(|row| grid.cell(row, col).text())
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

fn row_labels(grid: &RawGrid, row: usize) -> Vec<String> {
    grid.rows[row].iter().map(RawCell::text).collect()
}

fn accepts(map: &ColumnMap, profile: &FormatProfile, strategy: HeaderStrategy) -> bool {
    if !map.contains(FECHA) {
        return false;
    }
    let amount = map.contains_any(profile.amount_fields);
    let descriptive = map.contains_any(profile.descriptive_fields);
    match strategy {
        HeaderStrategy::Dictionary => (map.len() >= 4 && amount) || (map.len() >= 3 && descriptive),
        HeaderStrategy::Fusion => amount && descriptive,
        HeaderStrategy::Anchor => amount,
    }
}

fn window_has_footer(grid: &RawGrid, start: usize, depth: usize, profile: &FormatProfile) -> bool {
    grid.rows[start..start + depth]
        .iter()
        .any(|r| is_footer_row(r, profile.footer_hints))
}

fn candidate(start: usize, depth: usize, labels: Vec<String>, strategy: HeaderStrategy) -> HeaderCandidate {
    HeaderCandidate {
        start,
        depth,
        labels,
        strategy,
    }
}

fn scan_dictionary(grid: &RawGrid, limit: usize, profile: &FormatProfile) -> Option<HeaderCandidate> {
    (0..limit).find_map(|row| {
        if window_has_footer(grid, row, 1, profile) {
            return None;
        }
        let labels = row_labels(grid, row);
        let map = map_columns(&labels, profile, HeaderStrategy::Dictionary);
        accepts(&map, profile, HeaderStrategy::Dictionary)
            .then(|| candidate(row, 1, labels, HeaderStrategy::Dictionary))
    })
}

fn scan_fusion(grid: &RawGrid, limit: usize, profile: &FormatProfile) -> Option<HeaderCandidate> {
    for start in 0..limit {
        for depth in 1..=MAX_DEPTH {
            if start + depth > limit || window_has_footer(grid, start, depth, profile) {
                continue;
            }
            let labels = fuse_rows(grid, start, depth);
            let map = map_columns(&labels, profile, HeaderStrategy::Fusion);
            if accepts(&map, profile, HeaderStrategy::Fusion) {
                return Some(candidate(start, depth, labels, HeaderStrategy::Fusion));
            }
        }
    }
    None
}

fn mentions_fecha(cell: &RawCell) -> bool {
    normalize_label(&cell.text())
        .split(|c: char| !c.is_alphanumeric())
        .any(|w| w == "fecha")
}

/// Only the first row mentioning "fecha" is considered.
fn scan_anchor(grid: &RawGrid, limit: usize, profile: &FormatProfile) -> Option<HeaderCandidate> {
    let row = (0..limit).find(|&r| grid.rows[r].iter().any(mentions_fecha))?;
    if window_has_footer(grid, row, 1, profile) {
        return None;
    }
    let labels = row_labels(grid, row);
    let map = map_columns(&labels, profile, HeaderStrategy::Anchor);
    accepts(&map, profile, HeaderStrategy::Anchor).then(|| candidate(row, 1, labels, HeaderStrategy::Anchor))
}

/// Find the earliest header accepted by the format's strategies, in order.
pub fn locate_header(grid: &RawGrid, profile: &FormatProfile) -> Option<HeaderCandidate> {
    let limit = profile
        .scan_rows
        .map_or(grid.row_count(), |n| n.min(grid.row_count()));
    for strategy in profile.strategies {
        let found = match strategy {
            HeaderStrategy::Dictionary => scan_dictionary(grid, limit, profile),
            HeaderStrategy::Fusion => scan_fusion(grid, limit, profile),
            HeaderStrategy::Anchor => scan_anchor(grid, limit, profile),
        };
        if let Some(header) = found {
            debug!(
                "[{}] header at row {} (depth {}, {:?}): {:?}",
                grid.name, header.start, header.depth, header.strategy, header.labels
            );
            return Some(header);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::map_header;
    use crate::formats::{BankFormat, CONCEPTO, CREDITO, DEBITO, DESCRIPCION};

    fn grid(rows: &[&[&str]]) -> RawGrid {
        RawGrid::from_text("test", rows)
    }

    #[test]
    fn test_dictionary_header_after_banner_rows() {
        let profile = BankFormat::Brou.profile().unwrap();
        let g = grid(&[
            &["Banco de la República Oriental del Uruguay"],
            &["Detalle de movimientos", "", "Cuenta 001234567"],
            &[],
            &["Fecha", "Descripción", "Débito", "Crédito"],
            &["02/01/2025", "COMPRA", "100,00", ""],
        ]);
        let header = locate_header(&g, &profile).unwrap();
        assert_eq!(header.start, 3);
        assert_eq!(header.depth, 1);
        assert_eq!(header.strategy, HeaderStrategy::Dictionary);
        let map = map_header(&header, &profile);
        assert_eq!(map.get(FECHA), Some(0));
        assert_eq!(map.get(DESCRIPCION), Some(1));
        assert_eq!(map.get(DEBITO), Some(2));
        assert_eq!(map.get(CREDITO), Some(3));
    }

    #[test]
    fn test_dictionary_accepts_three_fields_with_description() {
        let profile = BankFormat::Brou.profile().unwrap();
        let g = grid(&[&["Fecha", "Asunto", "Dependencia"]]);
        let header = locate_header(&g, &profile).unwrap();
        assert_eq!(header.start, 0);
    }

    #[test]
    fn test_dictionary_rejects_date_and_amount_only() {
        let profile = BankFormat::Brou.profile().unwrap();
        let g = grid(&[&["Fecha", "Débito", "Crédito"]]);
        let found = scan_dictionary(&g, g.row_count(), &profile);
        assert!(found.is_none());
    }

    #[test]
    fn test_fusion_joins_split_header() {
        let profile = BankFormat::Itau.profile().unwrap();
        let g = grid(&[
            &["Fecha", "Concepto", "Deb", "Cred"],
            &["", "", "ito", "ito"],
            &["03/01/2025", "TRANSFERENCIA", "", "1.000,00"],
        ]);
        let header = scan_fusion(&g, g.row_count(), &profile).unwrap();
        assert_eq!(header.start, 0);
        let map = map_header(&header, &profile);
        assert_eq!(map.get(FECHA), Some(0));
        assert_eq!(map.get(CONCEPTO), Some(1));
        assert_eq!(map.get(DEBITO), Some(2));
        assert_eq!(map.get(CREDITO), Some(3));
    }

    #[test]
    fn test_fusion_needs_second_row() {
        let profile = BankFormat::Itau.profile().unwrap();
        let g = grid(&[
            &["Estado de cuenta"],
            &["Fecha", "Concepto", "", ""],
            &["", "", "Débito", "Crédito"],
            &["03/01/2025", "TRANSFERENCIA", "", "1.000,00"],
        ]);
        let header = locate_header(&g, &profile).unwrap();
        assert_eq!(header.strategy, HeaderStrategy::Fusion);
        assert_eq!((header.start, header.depth), (1, 2));
        assert_eq!(header.labels, vec!["Fecha", "Concepto", "Débito", "Crédito"]);
        assert_eq!(header.data_start(), 3);
    }

    #[test]
    fn test_fusion_of_three_rows() {
        let profile = BankFormat::Itau.profile().unwrap();
        let g = grid(&[
            &["Fecha", "", ""],
            &["", "Concepto", ""],
            &["", "", "Crédito"],
        ]);
        let header = scan_fusion(&g, g.row_count(), &profile).unwrap();
        assert_eq!((header.start, header.depth), (0, 3));
    }

    #[test]
    fn test_anchor_takes_first_fecha_row() {
        let profile = BankFormat::Itau.profile().unwrap();
        let g = grid(&[
            &["Itaú - Estado de cuenta"],
            &["Fecha", "Concepto", "Débito", "Crédito", "Saldo"],
        ]);
        let header = locate_header(&g, &profile).unwrap();
        assert_eq!(header.strategy, HeaderStrategy::Anchor);
        assert_eq!(header.start, 1);
    }

    #[test]
    fn test_anchor_falls_back_to_fusion() {
        let profile = BankFormat::Itau.profile().unwrap();
        // The first "fecha" row is a banner, so the anchor strategy gives up.
        let g = grid(&[
            &["Fecha de emisión: 05/01/2025"],
            &["Cuenta 001234"],
            &["Fecha", "Concepto", "", ""],
            &["", "", "Débito", "Crédito"],
        ]);
        let header = locate_header(&g, &profile).unwrap();
        assert_eq!(header.strategy, HeaderStrategy::Fusion);
        assert_eq!((header.start, header.depth), (2, 2));
    }

    #[test]
    fn test_itau_dictionary_after_anchor_miss() {
        let profile = BankFormat::Itau.profile().unwrap();
        let g = grid(&[
            &["Fecha de emisión: 05/01/2025"],
            &["Fecha valor", "Descripción", "Referencia", "Destino"],
            &["03/01/2025", "TRANSFERENCIA", "88123", "AHORRO"],
        ]);
        let header = locate_header(&g, &profile).unwrap();
        assert_eq!(header.strategy, HeaderStrategy::Dictionary);
        assert_eq!((header.start, header.depth), (1, 1));
        let map = map_header(&header, &profile);
        assert_eq!(map.get(CONCEPTO), Some(1));
    }

    #[test]
    fn test_header_never_inside_footer() {
        let profile = BankFormat::Itau.profile().unwrap();
        let g = grid(&[
            &["Saldo anterior", "Fecha", "Concepto", "Débito"],
            &["Fecha", "Concepto", "Débito", "Crédito"],
        ]);
        let header = scan_fusion(&g, g.row_count(), &profile).unwrap();
        assert_eq!(header.start, 1);
        assert_eq!(header.depth, 1);
    }

    #[test]
    fn test_scan_window_limits_search() {
        let profile = BankFormat::Itau.profile().unwrap();
        let mut rows: Vec<Vec<RawCell>> = (0..35).map(|_| vec![RawCell::Text("x".into())]).collect();
        rows.push(vec![
            RawCell::Text("Fecha".into()),
            RawCell::Text("Concepto".into()),
            RawCell::Text("Débito".into()),
        ]);
        let g = RawGrid::new("long", rows);
        assert!(locate_header(&g, &profile).is_none());
    }

    #[test]
    fn test_not_found() {
        let profile = BankFormat::Brou.profile().unwrap();
        let g = grid(&[&["nada"], &["que", "ver"]]);
        assert!(locate_header(&g, &profile).is_none());
        assert!(locate_header(&RawGrid::default(), &profile).is_none());
    }

    #[test]
    fn test_is_footer_row() {
        let hints = BankFormat::Itau.profile().unwrap().footer_hints;
        let row = |v: &[&str]| v.iter().map(|s| RawCell::Text(s.to_string())).collect::<Vec<_>>();
        assert!(is_footer_row(&row(&["Saldo actual 1.000,00"]), hints));
        assert!(is_footer_row(&row(&["SALDO ANTERIOR", "500,00"]), hints));
        assert!(is_footer_row(&row(&["Total:", "1.500,00"]), hints));
        assert!(is_footer_row(&row(&["Cantidad de movimientos: 12"]), hints));
        assert!(is_footer_row(&row(&["Saldo  actual", "1.000,00"]), hints));
        assert!(is_footer_row(&row(&["SALDO\nANTERIOR"]), hints));
        assert!(is_footer_row(&row(&["  Cantidad de\tmovimientos "]), hints));
        assert!(!is_footer_row(&row(&["02/01/2025", "COMPRA", "100,00"]), hints));
    }
}
