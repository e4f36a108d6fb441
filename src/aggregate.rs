use log::debug;

use crate::columns::map_header;
use crate::error::{CotejoError, Result};
use crate::formats::FormatProfile;
use crate::header::locate_header;
use crate::models::{RawGrid, StatementTable};
use crate::table::build_table;

/// Run locate → map → build on one block; `None` when no header qualifies.
pub fn extract_block(grid: &RawGrid, profile: &FormatProfile) -> Option<StatementTable> {
    let header = locate_header(grid, profile)?;
    let map = map_header(&header, profile);
    let table = build_table(grid, &header, &map, profile);
    debug!("[{}] {} row(s) built", grid.name, table.len());
    Some(table)
}

/// Concatenate every block's rows, in block order then row order.
///
/// A block without a header is skipped. The whole extraction fails only when
/// no block yields a header or no rows survive.
pub fn aggregate_blocks(grids: &[RawGrid], profile: &FormatProfile) -> Result<StatementTable> {
    let mut out = StatementTable::new(profile.columns());
    let mut headers_found = 0usize;

    for grid in grids {
        let Some(fragment) = extract_block(grid, profile) else {
            debug!("[{}] no compatible header, skipping block", grid.name);
            continue;
        };
        headers_found += 1;
        out.rows
            .extend(fragment.rows.into_iter().filter(|r| !r.is_all_null()));
    }

    if headers_found == 0 {
        return Err(CotejoError::NoCompatibleHeader);
    }
    if out.is_empty() {
        return Err(CotejoError::NoCompatibleTable);
    }
    Ok(out)
}
