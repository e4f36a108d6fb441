use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{CotejoError, Result};
use crate::matcher::{AmountConvention, JoinMode, KeyConfig, StatementAmount};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub data_dir: String,
    #[serde(default)]
    pub ledger: LedgerSettings,
    #[serde(default)]
    pub matching: MatchSettings,
    /// External command for legacy `.xls` files, e.g.
    /// `soffice --headless --convert-to xlsx --outdir {outdir} {input}`.
    #[serde(default)]
    pub converter: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir().to_string_lossy().to_string(),
            ledger: LedgerSettings::default(),
            matching: MatchSettings::default(),
            converter: None,
        }
    }
}

/// Where ledger rows come from and which columns carry the key.
/// Unset id/date/amount columns are detected from the usual export names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerSettings {
    /// SQLite database or `.csv` file; defaults to `<data_dir>/cotejo.db`.
    pub source: Option<String>,
    pub table: String,
    pub id_column: Option<String>,
    pub date_column: Option<String>,
    pub amount_column: Option<String>,
    pub account_column: Option<String>,
    pub pending_column: Option<String>,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            source: None,
            table: "ledger_entries".to_string(),
            id_column: None,
            date_column: None,
            amount_column: None,
            account_column: Some("account".to_string()),
            pending_column: Some("conciliado".to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchSettings {
    pub mode: JoinMode,
    pub amount_convention: AmountConvention,
    /// Pre-signed statement column; credit − debit is used when unset.
    pub statement_amount_column: Option<String>,
}

impl MatchSettings {
    pub fn key_config(&self, ledger: &LedgerSettings) -> KeyConfig {
        KeyConfig {
            statement_amount: match &self.statement_amount_column {
                Some(col) => StatementAmount::Column(col.clone()),
                None => StatementAmount::CreditMinusDebit,
            },
            convention: self.amount_convention,
            id_column: ledger.id_column.clone().unwrap_or_else(|| "nro_trans".to_string()),
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("cotejo")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("cotejo")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_default()
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| CotejoError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

pub fn settings_file_exists() -> bool {
    settings_path().exists()
}

impl Settings {
    pub fn ledger_source(&self) -> PathBuf {
        match &self.ledger.source {
            Some(src) => PathBuf::from(shellexpand_path(src)),
            None => PathBuf::from(&self.data_dir).join("cotejo.db"),
        }
    }
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}
