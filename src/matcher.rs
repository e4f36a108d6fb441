use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::NaiveDate;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::amount::{parse_amount, round2};
use crate::dates::parse_date_dmy;
use crate::error::{CotejoError, Result};
use crate::models::{CanonicalRow, LedgerRow, MatchKey, StatementTable, Value};
use crate::text::normalize_label;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinMode {
    /// Only statement/ledger pairs sharing a key.
    Inner,
    /// Every statement row, flagged found or not.
    #[default]
    Audit,
}

impl FromStr for JoinMode {
    type Err = CotejoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "inner" => Ok(Self::Inner),
            "audit" => Ok(Self::Audit),
            other => Err(CotejoError::Settings(format!(
                "unknown match mode '{other}' (expected inner or audit)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountConvention {
    #[default]
    Signed,
    /// Compare magnitudes only; for ledgers that store every movement as positive.
    Absolute,
}

impl AmountConvention {
    pub fn apply(self, amount: f64) -> f64 {
        match self {
            Self::Signed => amount,
            Self::Absolute => amount.abs(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StatementAmount {
    /// credit − debit, either side optional.
    #[default]
    CreditMinusDebit,
    /// A column that already carries a signed amount.
    Column(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyConfig {
    pub statement_amount: StatementAmount,
    pub convention: AmountConvention,
    /// Output name for the ledger identifier in result tables.
    pub id_column: String,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            statement_amount: StatementAmount::default(),
            convention: AmountConvention::default(),
            id_column: "nro_trans".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Statement projection
// ---------------------------------------------------------------------------

const DESCRIPTION_LABELS: &[&str] = &["descripcion", "concepto"];

const DROPPED_LABELS: &[&str] = &[
    "numero de documento",
    "asunto",
    "dependencia",
    "debito",
    "credito",
    "saldo",
    "referencia",
    "destino",
];

#[derive(Debug, Clone, PartialEq)]
struct StatementColumns {
    date: usize,
    description: Option<usize>,
    debit: Option<usize>,
    credit: Option<usize>,
    amount: Option<usize>,
}

fn find_column(table: &StatementTable, labels: &[&str]) -> Option<usize> {
    table
        .columns
        .iter()
        .position(|c| labels.contains(&normalize_label(c).as_str()))
}

fn locate_columns(table: &StatementTable, cfg: &KeyConfig) -> Result<StatementColumns> {
    let date = find_column(table, &["fecha"]).ok_or_else(|| CotejoError::missing_column("statement", "Fecha"))?;
    let description = find_column(table, DESCRIPTION_LABELS);
    let debit = find_column(table, &["debito"]);
    let credit = find_column(table, &["credito"]);

    let amount = match &cfg.statement_amount {
        StatementAmount::CreditMinusDebit => {
            if debit.is_none() && credit.is_none() {
                return Err(CotejoError::missing_column("statement", "Débito/Crédito"));
            }
            None
        }
        StatementAmount::Column(name) => {
            let wanted = normalize_label(name);
            let idx = find_column(table, &[wanted.as_str()])
                .ok_or_else(|| CotejoError::missing_column("statement", name))?;
            Some(idx)
        }
    };

    Ok(StatementColumns {
        date,
        description,
        debit,
        credit,
        amount,
    })
}

fn number_at(row: &CanonicalRow, col: Option<usize>) -> Option<f64> {
    match col.and_then(|c| row.values.get(c))? {
        Value::Number(n) => Some(*n),
        Value::Text(s) => parse_amount(s),
        _ => None,
    }
}

fn date_at(row: &CanonicalRow, col: usize) -> Option<NaiveDate> {
    match row.values.get(col)? {
        Value::Date(d) => Some(*d),
        Value::Text(s) => parse_date_dmy(s),
        _ => None,
    }
}

/// One statement row reduced to what matching needs.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementEntry {
    pub index: usize,
    pub date: Option<NaiveDate>,
    /// Net or column amount, before the convention is applied.
    pub amount: Option<f64>,
    pub key: Option<MatchKey>,
}

fn project_statement(table: &StatementTable, cols: &StatementColumns, cfg: &KeyConfig) -> Vec<StatementEntry> {
    table
        .rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let date = date_at(row, cols.date);
            // an empty side counts as zero
            let amount = match cols.amount {
                Some(_) => number_at(row, cols.amount),
                None => {
                    let credit = number_at(row, cols.credit).unwrap_or(0.0);
                    let debit = number_at(row, cols.debit).unwrap_or(0.0);
                    Some(round2(credit - debit))
                }
            };
            let key = date
                .zip(amount)
                .map(|(d, a)| MatchKey::new(d, cfg.convention.apply(a)));
            StatementEntry {
                index,
                date,
                amount,
                key,
            }
        })
        .collect()
}

fn ledger_key(row: &LedgerRow, cfg: &KeyConfig) -> Option<MatchKey> {
    row.date
        .zip(row.amount)
        .map(|(d, a)| MatchKey::new(d, cfg.convention.apply(a)))
}

/// Ledger positions per key, in ledger order.
fn ledger_index(ledger: &[LedgerRow], cfg: &KeyConfig) -> BTreeMap<MatchKey, Vec<usize>> {
    let mut index: BTreeMap<MatchKey, Vec<usize>> = BTreeMap::new();
    for (i, row) in ledger.iter().enumerate() {
        if let Some(key) = ledger_key(row, cfg) {
            index.entry(key).or_default().push(i);
        }
    }
    index
}

// ---------------------------------------------------------------------------
// Inner join
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct MatchedPair {
    pub statement: StatementEntry,
    pub ledger: LedgerRow,
    pub key: MatchKey,
}

/// Every statement/ledger pair sharing a key: m statement rows and n ledger
/// rows on one key give m×n pairs, in statement order then ledger order.
pub fn match_inner(statement: &StatementTable, ledger: &[LedgerRow], cfg: &KeyConfig) -> Result<Vec<MatchedPair>> {
    let cols = locate_columns(statement, cfg)?;
    let entries = project_statement(statement, &cols, cfg);
    let index = ledger_index(ledger, cfg);

    let mut pairs = Vec::new();
    for entry in entries {
        let Some(key) = entry.key else { continue };
        let Some(positions) = index.get(&key) else { continue };
        for &pos in positions {
            pairs.push(MatchedPair {
                statement: entry.clone(),
                ledger: ledger[pos].clone(),
                key,
            });
        }
    }
    debug!("inner match: {} pair(s) from {} statement row(s)", pairs.len(), statement.len());
    Ok(pairs)
}

/// Statement columns followed by the ledger side of each pair.
pub fn pairs_table(statement: &StatementTable, pairs: &[MatchedPair], id_column: &str) -> StatementTable {
    let mut columns = statement.columns.clone();
    columns.extend(["Fecha_BD".to_string(), "Monto_BD".to_string(), id_column.to_string()]);
    let mut out = StatementTable::new(columns);
    for pair in pairs {
        let mut values = statement
            .rows
            .get(pair.statement.index)
            .map(|r| r.values.clone())
            .unwrap_or_default();
        values.resize(statement.columns.len(), Value::Null);
        values.push(pair.ledger.date.into());
        values.push(pair.ledger.amount.into());
        values.push(Value::Text(pair.ledger.id.clone()));
        out.rows.push(CanonicalRow { values });
    }
    out
}

// ---------------------------------------------------------------------------
// Audit
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuditSummary {
    pub total: usize,
    pub found: usize,
    pub not_found: usize,
}

impl AuditSummary {
    /// Percentage of statement rows found in the ledger.
    pub fn match_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.found as f64 * 100.0 / self.total as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuditResult {
    pub table: StatementTable,
    pub summary: AuditSummary,
}

enum Source {
    Statement(usize),
    MontoExcel,
    FechaNorm,
    MontoNorm,
    FechaBd,
    MontoBd,
    LedgerId,
    Encontrado,
}

fn audit_layout(statement: &StatementTable, cols: &StatementColumns, id_column: &str) -> Vec<(String, Source)> {
    let mut layout = Vec::new();
    if let Some(desc) = cols.description {
        layout.push(("Descripcion".to_string(), Source::Statement(desc)));
    }
    layout.push(("Fecha_Excel".to_string(), Source::Statement(cols.date)));
    layout.push(("Monto_Excel".to_string(), Source::MontoExcel));
    layout.push(("Fecha_norm".to_string(), Source::FechaNorm));
    layout.push(("Monto_norm".to_string(), Source::MontoNorm));
    layout.push(("Fecha_BD".to_string(), Source::FechaBd));
    layout.push(("Monto_BD".to_string(), Source::MontoBd));
    layout.push((id_column.to_string(), Source::LedgerId));
    layout.push(("Encontrado".to_string(), Source::Encontrado));

    for (idx, name) in statement.columns.iter().enumerate() {
        if idx == cols.date || Some(idx) == cols.description {
            continue;
        }
        let norm = normalize_label(name);
        if DROPPED_LABELS.contains(&norm.as_str()) || DESCRIPTION_LABELS.contains(&norm.as_str()) {
            continue;
        }
        layout.push((name.clone(), Source::Statement(idx)));
    }
    layout
}

/// One output row per statement row, with the ledger detail of the first
/// ledger row sharing its key. Rows without a key are reported as not found.
pub fn match_audit(statement: &StatementTable, ledger: &[LedgerRow], cfg: &KeyConfig) -> Result<AuditResult> {
    let cols = locate_columns(statement, cfg)?;
    let entries = project_statement(statement, &cols, cfg);
    let index = ledger_index(ledger, cfg);
    let layout = audit_layout(statement, &cols, &cfg.id_column);

    let mut table = StatementTable::new(layout.iter().map(|(name, _)| name.clone()).collect());
    let mut summary = AuditSummary::default();

    for entry in &entries {
        let hit = entry
            .key
            .and_then(|k| index.get(&k))
            .and_then(|positions| positions.first())
            .map(|&pos| &ledger[pos]);
        summary.total += 1;
        if hit.is_some() {
            summary.found += 1;
        } else {
            summary.not_found += 1;
        }

        let row = &statement.rows[entry.index];
        let values = layout
            .iter()
            .map(|(_, source)| match source {
                Source::Statement(c) => row.values.get(*c).cloned().unwrap_or(Value::Null),
                Source::MontoExcel => entry.amount.into(),
                Source::FechaNorm => entry.date.into(),
                Source::MontoNorm => entry.key.map(|k| k.amount()).into(),
                Source::FechaBd => hit.and_then(|l| l.date).into(),
                Source::MontoBd => hit.and_then(|l| l.amount).into(),
                Source::LedgerId => hit.map_or(Value::Null, |l| Value::Text(l.id.clone())),
                Source::Encontrado => Value::Bool(hit.is_some()),
            })
            .collect();
        table.rows.push(CanonicalRow { values });
    }

    info!(
        "audit: {} row(s), {} found, {} not found ({:.1}%)",
        summary.total,
        summary.found,
        summary.not_found,
        summary.match_rate()
    );
    Ok(AuditResult { table, summary })
}
