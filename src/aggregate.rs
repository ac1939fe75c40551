//! Category listing and per-location model counts.
//!
//! Both operations read a freshly fetched [`RawTable`]. Category values are
//! compared trimmed and upper-cased; location and model values are used as
//! they appear (trimmed only).

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::Write as _,
};

use log::debug;

use crate::{
    data::parse_quantity,
    error::{InventoryError, InventoryResult},
    schema::{CATEGORY_COLUMN, Header, LOCATION_COLUMN, MODEL_COLUMN, QUANTITY_COLUMN},
    source::{RawTable, cell_text},
};

/// Sums below this are not reported at all.
pub const MIN_REPORTED_QUANTITY: i64 = 3;

pub type CategorySet = BTreeSet<String>;

pub fn normalize_category(raw: &str) -> String {
    raw.trim().to_uppercase()
}

pub fn list_categories(table: &RawTable) -> InventoryResult<CategorySet> {
    let header = table.header().ok_or(InventoryError::EmptyTable)?;
    let [category_idx] = Header::new(&header).resolve_indices([CATEGORY_COLUMN])?;

    let categories = table
        .data_rows()
        .iter()
        .filter_map(|row| cell_text(row, category_idx))
        .map(|raw| normalize_category(&raw))
        .filter(|category| !category.is_empty())
        .collect::<CategorySet>();
    debug!("Found {} distinct categories", categories.len());
    Ok(categories)
}

/// Quantity sums keyed by location, then by model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregationResult {
    locations: BTreeMap<String, BTreeMap<String, i64>>,
}

impl AggregationResult {
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn add(&mut self, location: &str, model: &str, quantity: i64) {
        let total = self
            .locations
            .entry(location.to_string())
            .or_default()
            .entry(model.to_string())
            .or_insert(0);
        *total = total.saturating_add(quantity);
    }

    pub fn quantity(&self, location: &str, model: &str) -> Option<i64> {
        self.locations.get(location)?.get(model).copied()
    }

    pub fn locations(&self) -> impl Iterator<Item = (&str, &BTreeMap<String, i64>)> {
        self.locations
            .iter()
            .map(|(location, models)| (location.as_str(), models))
    }

    /// `(location, model, quantity, tier)` for every pair that survives the
    /// reporting threshold.
    pub fn reported_lines(&self) -> Vec<(&str, &str, i64, Tier)> {
        let mut lines = Vec::new();
        for (location, models) in self.locations() {
            for (model, quantity) in models {
                if let Some(tier) = Tier::classify(*quantity) {
                    lines.push((location, model.as_str(), *quantity, tier));
                }
            }
        }
        lines
    }
}

pub fn aggregate_rows(table: &RawTable, category: &str) -> InventoryResult<AggregationResult> {
    let header = table.header().ok_or(InventoryError::EmptyTable)?;
    let [category_idx, location_idx, model_idx, quantity_idx] = Header::new(&header)
        .resolve_indices([CATEGORY_COLUMN, LOCATION_COLUMN, MODEL_COLUMN, QUANTITY_COLUMN])
        .map_err(|_| InventoryError::Schema {
            missing: vec![
                CATEGORY_COLUMN.to_string(),
                LOCATION_COLUMN.to_string(),
                MODEL_COLUMN.to_string(),
                QUANTITY_COLUMN.to_string(),
            ],
        })?;

    let wanted = normalize_category(category);
    let mut result = AggregationResult::default();
    for row in table.data_rows() {
        let (Some(row_category), Some(location), Some(model), Some(quantity)) = (
            cell_text(row, category_idx),
            cell_text(row, location_idx),
            cell_text(row, model_idx),
            cell_text(row, quantity_idx),
        ) else {
            continue;
        };
        if normalize_category(&row_category) != wanted {
            continue;
        }
        let (location, model, quantity) = (location.trim(), model.trim(), quantity.trim());
        if location.is_empty() || model.is_empty() || quantity.is_empty() {
            continue;
        }
        let parsed = parse_quantity(quantity);
        if parsed == 0 {
            continue;
        }
        result.add(location, model, parsed);
    }
    Ok(result)
}

pub fn aggregate_by_category(table: &RawTable, category: &str) -> InventoryResult<String> {
    let result = aggregate_rows(table, category)?;
    Ok(render_report(&normalize_category(category), &result))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Exact(i64),
    FiftyPlus,
    HundredPlus,
}

impl Tier {
    /// `None` for sums too small to report.
    pub fn classify(quantity: i64) -> Option<Self> {
        match quantity {
            q if q < MIN_REPORTED_QUANTITY => None,
            q if q < 50 => Some(Tier::Exact(q)),
            q if q < 100 => Some(Tier::FiftyPlus),
            _ => Some(Tier::HundredPlus),
        }
    }

    pub fn indicator(&self) -> String {
        match self {
            Tier::Exact(count) => format!("🔵 {count} ta"),
            Tier::FiftyPlus => "🟡 50+".to_string(),
            Tier::HundredPlus => "🟢 100+".to_string(),
        }
    }

    pub fn label(&self) -> String {
        match self {
            Tier::Exact(count) => count.to_string(),
            Tier::FiftyPlus => "50+".to_string(),
            Tier::HundredPlus => "100+".to_string(),
        }
    }
}

pub fn no_data_message(category: &str) -> String {
    format!("*{category}* kategoriyasi uchun ma'lumot topilmadi")
}

pub fn render_report(category: &str, result: &AggregationResult) -> String {
    if result.is_empty() {
        return no_data_message(category);
    }

    let mut output = String::new();
    let _ = write!(
        output,
        "*{category}* bo‘yicha ANGAR va Model kesimidagi soni:\n\n"
    );
    for (location, models) in result.locations() {
        let mut section = String::new();
        for (model, quantity) in models {
            let Some(tier) = Tier::classify(*quantity) else {
                continue;
            };
            let _ = writeln!(section, "  📦 {model}: {}", tier.indicator());
        }
        // Locations whose models were all filtered out get no heading.
        if !section.is_empty() {
            let _ = writeln!(output, "🏠 *{location}*:");
            output.push_str(&section);
            output.push('\n');
        }
    }
    output
}
