//! Raw tabular data and the source abstraction it is fetched through.
//!
//! A [`RawTable`] is the grid exactly as the source returned it: the first
//! row is the header, rows may be ragged, and cells are untyped. Tables are
//! fetched fresh for every query and never cached.

use crate::{
    data::{Cell, cell_to_text},
    error::InventoryResult,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        Self { rows }
    }

    /// Builds a table of text cells; convenient for fixtures and CSV input.
    pub fn from_text_rows<R, S>(rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(|s| Cell::Text(s.into())).collect())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Header cells rendered to text, or `None` for an empty table.
    pub fn header(&self) -> Option<Vec<String>> {
        self.rows
            .first()
            .map(|row| row.iter().map(cell_to_text).collect())
    }

    pub fn data_rows(&self) -> &[Vec<Cell>] {
        self.rows.get(1..).unwrap_or_default()
    }
}

/// Text of the cell at `index`, or `None` when the row is too short.
pub fn cell_text(row: &[Cell], index: usize) -> Option<String> {
    row.get(index).map(cell_to_text)
}

/// Where the inventory grid lives inside the external store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetLocation {
    pub spreadsheet_id: String,
    pub sheet_name: String,
    pub range: String,
}

impl SheetLocation {
    /// A1-notation range expression such as `DALONG!A1:Z1000`.
    pub fn range_expr(&self) -> String {
        format!("{}!{}", self.sheet_name, self.range)
    }
}

pub trait TabularSource {
    /// Fetches the rectangular range `range_expr` of `sheet_id` as rows of
    /// untyped cells. An unpopulated range yields an empty table.
    fn fetch(&self, sheet_id: &str, range_expr: &str) -> InventoryResult<RawTable>;

    fn fetch_location(&self, location: &SheetLocation) -> InventoryResult<RawTable> {
        self.fetch(&location.spreadsheet_id, &location.range_expr())
    }
}

impl<T: TabularSource + ?Sized> TabularSource for &T {
    fn fetch(&self, sheet_id: &str, range_expr: &str) -> InventoryResult<RawTable> {
        (**self).fetch(sheet_id, range_expr)
    }
}

impl<T: TabularSource + ?Sized> TabularSource for Box<T> {
    fn fetch(&self, sheet_id: &str, range_expr: &str) -> InventoryResult<RawTable> {
        (**self).fetch(sheet_id, range_expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_rows_skip_header_and_tolerate_empty_tables() {
        let table = RawTable::from_text_rows([vec!["Model"], vec!["X1"]]);
        assert_eq!(table.header(), Some(vec!["Model".to_string()]));
        assert_eq!(table.data_rows().len(), 1);

        let empty = RawTable::default();
        assert!(empty.header().is_none());
        assert!(empty.data_rows().is_empty());
    }

    #[test]
    fn range_expr_joins_sheet_and_range() {
        let location = SheetLocation {
            spreadsheet_id: "abc".to_string(),
            sheet_name: "DALONG".to_string(),
            range: "A1:Z1000".to_string(),
        };
        assert_eq!(location.range_expr(), "DALONG!A1:Z1000");
    }

    #[test]
    fn cell_text_is_none_past_row_end() {
        let row = vec![Cell::from("a")];
        assert_eq!(cell_text(&row, 0).as_deref(), Some("a"));
        assert_eq!(cell_text(&row, 1), None);
    }
}
