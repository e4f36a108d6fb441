use crate::models::RawCell;

/// Round half away from zero to two decimals.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Parse a locale-formatted amount: `.` thousands, `,` decimals, `(x)` negative.
///
/// Empty text and a bare `-` are null, never zero. Parenthesised values are
/// always negative, even when a sign also appears inside the parentheses.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let s = raw.trim();
    let (negative, s) = match s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, s),
    };
    let s = s.replace('$', "").replace('.', "").replace(',', ".");
    let s = s.trim();
    if s.is_empty() || s == "-" {
        return None;
    }
    let value: f64 = s.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    let value = if negative { -value.abs() } else { value };
    Some(round2(value))
}

/// Amount of a raw cell; numeric cells pass through, dates and blanks are null.
pub fn normalize_amount(cell: &RawCell) -> Option<f64> {
    match cell {
        RawCell::Number(n) if n.is_finite() => Some(round2(*n)),
        RawCell::Text(s) => parse_amount(s),
        _ => None,
    }
}
