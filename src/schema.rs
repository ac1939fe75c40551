//! Header resolution for inventory tables.
//!
//! Maps the header row of a [`RawTable`](crate::source::RawTable) to the
//! zero-based column indices the rest of the crate reads from.
//!
//! ## Matching rules
//!
//! - Header cells are trimmed and compared **case-sensitively** to the
//!   required names. There is no renaming, aliasing, or fuzzy matching.
//! - When a name repeats, the first occurrence wins.
//! - Resolution fails with [`InventoryError::Schema`] listing every missing
//!   name; callers never read data through a partial mapping.
//!
//! Value matching elsewhere (categories) is case-insensitive; header matching
//! deliberately is not.

use std::collections::BTreeMap;

use crate::error::{InventoryError, InventoryResult};

pub const USERNAME_COLUMN: &str = "Username";
pub const CATEGORY_COLUMN: &str = "Mahsulot Kategoriyasi";
pub const LOCATION_COLUMN: &str = "Sklad";
pub const MODEL_COLUMN: &str = "Model";
pub const QUANTITY_COLUMN: &str = "Soni";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    names: Vec<String>,
}

impl Header {
    pub fn new<I, S>(cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            names: cells
                .into_iter()
                .map(|cell| cell.as_ref().trim().to_string())
                .collect(),
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|candidate| candidate == name)
    }

    pub fn resolve(&self, required: &[&str]) -> InventoryResult<ColumnMap> {
        let mut indices = BTreeMap::new();
        let mut missing = Vec::new();
        for name in required {
            match self.column_index(name) {
                Some(idx) => {
                    indices.insert((*name).to_string(), idx);
                }
                None => missing.push((*name).to_string()),
            }
        }
        if missing.is_empty() {
            Ok(ColumnMap { indices })
        } else {
            Err(InventoryError::Schema { missing })
        }
    }

    /// Resolves a fixed set of columns and returns their indices in the
    /// order requested.
    pub fn resolve_indices<const N: usize>(
        &self,
        required: [&str; N],
    ) -> InventoryResult<[usize; N]> {
        let map = self.resolve(&required)?;
        let mut out = [0usize; N];
        for (slot, name) in out.iter_mut().zip(required) {
            *slot = map.get(name).ok_or_else(|| InventoryError::Schema {
                missing: vec![name.to_string()],
            })?;
        }
        Ok(out)
    }
}

/// Resolved name-to-index mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    indices: BTreeMap<String, usize>,
}

impl ColumnMap {
    pub fn get(&self, name: &str) -> Option<usize> {
        self.indices.get(name).copied()
    }
}

pub fn resolve_columns<S: AsRef<str>>(
    header: &[S],
    required: &[&str],
) -> InventoryResult<ColumnMap> {
    Header::new(header).resolve(required)
}
