use chrono::NaiveDate;

static EMPTY_CELL: RawCell = RawCell::Empty;

/// One cell as read from a worksheet or CSV block.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Empty,
}

impl RawCell {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Trimmed display text; numbers lose a trailing `.0`, dates render day-first.
    pub fn text(&self) -> String {
        match self {
            Self::Text(s) => s.trim().to_string(),
            Self::Number(n) => number_text(*n),
            Self::Date(d) => d.format("%d/%m/%Y").to_string(),
            Self::Empty => String::new(),
        }
    }
}

fn number_text(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// A worksheet (or CSV file) as an immutable grid of cells.
#[derive(Debug, Clone, Default)]
pub struct RawGrid {
    pub name: String,
    pub rows: Vec<Vec<RawCell>>,
}

impl RawGrid {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<RawCell>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// Build a grid from plain strings; empty strings become `RawCell::Empty`.
    #[cfg(test)]
    pub fn from_text(name: impl Into<String>, rows: &[&[&str]]) -> Self {
        let rows = rows
            .iter()
            .map(|r| {
                r.iter()
                    .map(|v| {
                        if v.trim().is_empty() {
                            RawCell::Empty
                        } else {
                            RawCell::Text(v.to_string())
                        }
                    })
                    .collect()
            })
            .collect();
        Self::new(name, rows)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn cell(&self, row: usize, col: usize) -> &RawCell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY_CELL)
    }
}

// ---------------------------------------------------------------------------
// Header detection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderStrategy {
    /// Single row, exact synonym lookup.
    Dictionary,
    /// One to three stacked rows fused per column, regex patterns.
    Fusion,
    /// First row mentioning "fecha", regex patterns, relaxed acceptance.
    Anchor,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeaderCandidate {
    pub start: usize,
    pub depth: usize,
    pub labels: Vec<String>,
    pub strategy: HeaderStrategy,
}

impl HeaderCandidate {
    /// First row index after the header window.
    pub fn data_start(&self) -> usize {
        self.start + self.depth
    }
}

/// Canonical field name -> source column index, in claim order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnMap {
    entries: Vec<(&'static str, usize)>,
}

impl ColumnMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `field` for `col` unless the field is already taken.
    pub fn claim(&mut self, field: &'static str, col: usize) -> bool {
        if self.contains(field) {
            return false;
        }
        self.entries.push((field, col));
        true
    }

    pub fn get(&self, field: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, c)| *c)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    pub fn contains_any(&self, fields: &[&str]) -> bool {
        fields.iter().any(|f| self.contains(f))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.iter().map(|(_, c)| *c)
    }
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Bool(bool),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[cfg(test)]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<Option<f64>> for Value {
    fn from(v: Option<f64>) -> Self {
        v.map_or(Value::Null, Value::Number)
    }
}

impl From<Option<NaiveDate>> for Value {
    fn from(v: Option<NaiveDate>) -> Self {
        v.map_or(Value::Null, Value::Date)
    }
}

/// Plain rendering used for CSV output: ISO dates, two-decimal amounts.
impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Text(s) => write!(f, "{s}"),
            Self::Number(n) => write!(f, "{n:.2}"),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// One transaction aligned to its table's columns.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRow {
    pub values: Vec<Value>,
}

impl CanonicalRow {
    pub fn is_all_null(&self) -> bool {
        self.values.iter().all(Value::is_null)
    }
}

/// Column-named table; statements and audit results share this shape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatementTable {
    pub columns: Vec<String>,
    pub rows: Vec<CanonicalRow>,
}

impl StatementTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.values.get(idx))
    }
}

/// A record supplied by the ledger provider.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerRow {
    pub id: String,
    pub date: Option<NaiveDate>,
    pub amount: Option<f64>,
}

/// Comparison key: calendar date plus amount in cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MatchKey {
    pub date: NaiveDate,
    pub cents: i64,
}

impl MatchKey {
    pub fn new(date: NaiveDate, amount: f64) -> Self {
        Self {
            date,
            cents: (amount * 100.0).round() as i64,
        }
    }

    pub fn amount(&self) -> f64 {
        self.cents as f64 / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_text() {
        assert_eq!(RawCell::Text("  Fecha ".into()).text(), "Fecha");
        assert_eq!(RawCell::Number(1234.0).text(), "1234");
        assert_eq!(RawCell::Number(12.5).text(), "12.5");
        let d = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        assert_eq!(RawCell::Date(d).text(), "02/01/2025");
        assert!(RawCell::Text("   ".into()).is_empty());
    }

    #[test]
    fn test_grid_cell_out_of_bounds_is_empty() {
        let grid = RawGrid::from_text("s", &[&["a", "b"], &["c"]]);
        assert_eq!(grid.cell(1, 1), &RawCell::Empty);
        assert_eq!(grid.cell(9, 0), &RawCell::Empty);
    }

    #[test]
    fn test_column_map_first_claim_wins() {
        let mut map = ColumnMap::new();
        assert!(map.claim("Fecha", 0));
        assert!(!map.claim("Fecha", 3));
        assert_eq!(map.get("Fecha"), Some(0));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_match_key_rounds_to_cents() {
        let d = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert_eq!(MatchKey::new(d, 10.004), MatchKey::new(d, 10.0));
        assert_eq!(MatchKey::new(d, 10.004).amount(), 10.0);
        assert_eq!(MatchKey::new(d, -500.0).cents, -50000);
    }
}
