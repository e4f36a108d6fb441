use std::path::Path;

use rusqlite::Connection;

use crate::error::Result;

/// Local ledger used when no external source is configured. Column names
/// follow the accounting export (`nro_trans`, `fec_doc`, `imp_mov_mo`).
pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS ledger_entries (
    nro_trans TEXT PRIMARY KEY,
    account TEXT NOT NULL,
    fec_doc TEXT NOT NULL,
    imp_mov_mo REAL NOT NULL,
    detalle TEXT,
    conciliado INTEGER NOT NULL DEFAULT 0,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_ledger_pending
    ON ledger_entries (account, conciliado);
";

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

/// (total, pending) rows in the local ledger table.
pub fn ledger_counts(conn: &Connection) -> Result<(i64, i64)> {
    let total: i64 = conn.query_row("SELECT count(*) FROM ledger_entries", [], |r| r.get(0))?;
    let pending: i64 = conn.query_row(
        "SELECT count(*) FROM ledger_entries WHERE conciliado = 0",
        [],
        |r| r.get(0),
    )?;
    Ok((total, pending))
}
