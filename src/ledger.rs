use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, info};
use rusqlite::types::ValueRef;

use crate::amount::{parse_amount, round2};
use crate::dates::parse_date_dmy;
use crate::db::get_connection;
use crate::error::{CotejoError, Result};
use crate::models::LedgerRow;
use crate::settings::LedgerSettings;

pub const AMOUNT_CANDIDATES: &[&str] = &[
    "imp_mov_mo",
    "imp_neto",
    "importe_neto",
    "importe",
    "monto",
    "amount",
    "importe_total",
    "val_neto",
    "imp_total",
];
pub const DATE_CANDIDATES: &[&str] = &["fec_doc", "fecha", "fecha_doc", "fch_doc", "fecha_mov", "fch_mov"];
pub const ID_CANDIDATES: &[&str] = &["nro_trans", "id", "transaction_id"];

/// Source of accounting records that statements are reconciled against.
pub trait LedgerProvider {
    fn fetch(&self, account: Option<&str>) -> Result<Vec<LedgerRow>>;
}

/// Fetch and refuse an empty result; there is nothing to reconcile against.
pub fn fetch_required(provider: &dyn LedgerProvider, account: Option<&str>) -> Result<Vec<LedgerRow>> {
    let rows = provider.fetch(account)?;
    if rows.is_empty() {
        return Err(CotejoError::EmptyLedger(account.unwrap_or("*").to_string()));
    }
    info!("ledger: {} pending row(s)", rows.len());
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Column resolution
// ---------------------------------------------------------------------------

/// Configured name (case-insensitive) or the first candidate present.
fn resolve_column(columns: &[String], configured: Option<&str>, candidates: &[&str], field: &str) -> Result<usize> {
    let find = |name: &str| columns.iter().position(|c| c.trim().eq_ignore_ascii_case(name));
    let found = match configured {
        Some(name) => find(name),
        None => candidates.iter().find_map(|c| find(c)),
    };
    found.ok_or_else(|| CotejoError::missing_column("ledger", configured.unwrap_or(field)))
}

#[derive(Debug, Clone, Copy)]
struct LedgerColumns {
    id: usize,
    date: usize,
    amount: usize,
    account: Option<usize>,
    pending: Option<usize>,
}

impl LedgerColumns {
    fn resolve(columns: &[String], settings: &LedgerSettings) -> Result<Self> {
        let optional = |name: &Option<String>| -> Result<Option<usize>> {
            match name.as_deref() {
                Some(n) => resolve_column(columns, Some(n), &[], n).map(Some),
                None => Ok(None),
            }
        };
        Ok(Self {
            id: resolve_column(columns, settings.id_column.as_deref(), ID_CANDIDATES, "id")?,
            date: resolve_column(columns, settings.date_column.as_deref(), DATE_CANDIDATES, "date")?,
            amount: resolve_column(columns, settings.amount_column.as_deref(), AMOUNT_CANDIDATES, "amount")?,
            account: optional(&settings.account_column)?,
            pending: optional(&settings.pending_column)?,
        })
    }
}

fn parse_ledger_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").ok().map(|dt| dt.date()))
        .or_else(|| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").ok().map(|dt| dt.date()))
        .or_else(|| s.get(..10).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()))
        .or_else(|| parse_date_dmy(s))
}

/// Plain decimal first ("-1234.5"), then the locale form ("-1.234,50").
fn parse_ledger_amount(raw: &str) -> Option<f64> {
    let s = raw.trim();
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(round2(v)),
        _ => parse_amount(s),
    }
}

fn is_falsey(raw: &str) -> bool {
    matches!(
        raw.trim().to_lowercase().as_str(),
        "" | "0" | "false" | "f" | "no" | "n"
    )
}

// ---------------------------------------------------------------------------
// SQLite
// ---------------------------------------------------------------------------

pub struct SqliteLedger {
    path: PathBuf,
    settings: LedgerSettings,
}

fn valid_identifier(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|part| {
            !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

fn quote_identifier(name: &str) -> String {
    name.split('.')
        .map(|part| format!("\"{part}\""))
        .collect::<Vec<_>>()
        .join(".")
}

fn text_of(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(t) | ValueRef::Blob(t) => Some(String::from_utf8_lossy(t).to_string()),
    }
}

fn amount_of(value: ValueRef<'_>) -> Option<f64> {
    match value {
        ValueRef::Integer(i) => Some(i as f64),
        ValueRef::Real(f) => Some(round2(f)),
        ValueRef::Text(t) => parse_ledger_amount(&String::from_utf8_lossy(t)),
        _ => None,
    }
}

impl SqliteLedger {
    pub fn new(path: impl Into<PathBuf>, settings: LedgerSettings) -> Self {
        Self {
            path: path.into(),
            settings,
        }
    }

    fn build_query(&self, columns: &LedgerColumns, names: &[String], account: Option<&str>) -> (String, Vec<String>) {
        let mut sql = format!("SELECT * FROM {}", quote_identifier(&self.settings.table));
        let mut clauses = Vec::new();
        let mut params = Vec::new();
        if let (Some(col), Some(acct)) = (columns.account, account) {
            clauses.push(format!("{} = ?1", quote_identifier(&names[col])));
            params.push(acct.to_string());
        }
        if let Some(col) = columns.pending {
            clauses.push(format!("{} = 0", quote_identifier(&names[col])));
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        (sql, params)
    }
}

impl LedgerProvider for SqliteLedger {
    fn fetch(&self, account: Option<&str>) -> Result<Vec<LedgerRow>> {
        if !self.path.exists() {
            return Err(CotejoError::Ledger(format!("database not found: {}", self.path.display())));
        }
        if !valid_identifier(&self.settings.table) {
            return Err(CotejoError::Ledger(format!("invalid table name '{}'", self.settings.table)));
        }
        let conn = get_connection(&self.path)?;

        // Column names come from an empty probe so they can drive the WHERE clause.
        let probe = conn.prepare(&format!("SELECT * FROM {} LIMIT 0", quote_identifier(&self.settings.table)))?;
        let names: Vec<String> = probe.column_names().iter().map(|s| s.to_string()).collect();
        drop(probe);
        let columns = LedgerColumns::resolve(&names, &self.settings)?;

        let (sql, params) = self.build_query(&columns, &names, account);
        debug!("ledger query: {sql}");
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(rusqlite::params_from_iter(params.iter()))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let Some(id) = text_of(row.get_ref(columns.id)?) else {
                continue;
            };
            let date = text_of(row.get_ref(columns.date)?).and_then(|s| parse_ledger_date(&s));
            let amount = amount_of(row.get_ref(columns.amount)?);
            out.push(LedgerRow { id, date, amount });
        }
        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

pub struct CsvLedger {
    path: PathBuf,
    settings: LedgerSettings,
}

impl CsvLedger {
    pub fn new(path: impl Into<PathBuf>, settings: LedgerSettings) -> Self {
        Self {
            path: path.into(),
            settings,
        }
    }
}

impl LedgerProvider for CsvLedger {
    fn fetch(&self, account: Option<&str>) -> Result<Vec<LedgerRow>> {
        if !self.path.exists() {
            return Err(CotejoError::Ledger(format!("ledger file not found: {}", self.path.display())));
        }
        let mut rdr = csv::ReaderBuilder::new().flexible(true).from_path(&self.path)?;
        let names: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();
        let columns = LedgerColumns::resolve(&names, &self.settings)?;

        let mut out = Vec::new();
        for result in rdr.records() {
            let record = result?;
            let field = |idx: usize| record.get(idx).unwrap_or("").trim();
            if let (Some(col), Some(acct)) = (columns.account, account) {
                if field(col) != acct {
                    continue;
                }
            }
            if let Some(col) = columns.pending {
                if !is_falsey(field(col)) {
                    continue;
                }
            }
            let id = field(columns.id);
            if id.is_empty() {
                continue;
            }
            out.push(LedgerRow {
                id: id.to_string(),
                date: parse_ledger_date(field(columns.date)),
                amount: parse_ledger_amount(field(columns.amount)),
            });
        }
        Ok(out)
    }
}

/// `.csv` sources read with `CsvLedger`, anything else is a SQLite database.
pub fn open_provider(source: &Path, settings: &LedgerSettings) -> Box<dyn LedgerProvider> {
    let is_csv = source.extension().is_some_and(|e| e.eq_ignore_ascii_case("csv"));
    if is_csv {
        Box::new(CsvLedger::new(source, settings.clone()))
    } else {
        Box::new(SqliteLedger::new(source, settings.clone()))
    }
}
