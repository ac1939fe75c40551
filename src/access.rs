use log::{debug, warn};

use crate::{
    schema::{Header, USERNAME_COLUMN},
    source::{RawTable, SheetLocation, TabularSource, cell_text},
};

/// True when `identity` appears verbatim in the `Username` column.
///
/// Never fails: an empty table or a missing column reads as "not registered".
pub fn is_registered(table: &RawTable, identity: &str) -> bool {
    let Some(header) = table.header() else {
        return false;
    };
    let Some(username_idx) = Header::new(&header).column_index(USERNAME_COLUMN) else {
        debug!("No '{USERNAME_COLUMN}' column; treating '{identity}' as unregistered");
        return false;
    };
    table
        .data_rows()
        .iter()
        .filter_map(|row| cell_text(row, username_idx))
        .any(|stored| stored == identity)
}

/// Fetches the table and applies [`is_registered`]; fetch errors collapse to `false`.
pub fn check_registered<S: TabularSource>(
    source: &S,
    location: &SheetLocation,
    identity: &str,
) -> bool {
    match source.fetch_location(location) {
        Ok(table) => is_registered(&table, identity),
        Err(err) => {
            warn!("Error reading sheet for username check: {err}");
            false
        }
    }
}
