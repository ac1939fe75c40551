use std::fmt;

use serde::{Deserialize, Serialize};

/// A single untyped value as delivered by a tabular source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

impl Cell {
    pub fn as_display(&self) -> String {
        cell_to_text(self)
    }

    /// Interprets one value of a Sheets `values` array.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Cell::Empty,
            serde_json::Value::Bool(b) => Cell::Boolean(*b),
            serde_json::Value::String(s) => Cell::Text(s.clone()),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Cell::Integer(i),
                None => n.as_f64().map(Cell::Float).unwrap_or(Cell::Empty),
            },
            other => Cell::Text(other.to_string()),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

/// Renders any cell kind to text. Every read of a cell goes through here
/// before trimming or comparison.
pub fn cell_to_text(cell: &Cell) -> String {
    match cell {
        Cell::Empty => String::new(),
        Cell::Text(s) => s.clone(),
        Cell::Integer(i) => i.to_string(),
        Cell::Float(f) => {
            if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 {
                (*f as i64).to_string()
            } else {
                f.to_string()
            }
        }
        Cell::Boolean(b) => b.to_string(),
    }
}

/// Best-effort quantity parse: the leading ASCII digits of the trimmed text,
/// or 0 when there are none. Never fails.
pub fn parse_quantity(raw: &str) -> i64 {
    let mut value: i64 = 0;
    for ch in raw.trim().chars() {
        let Some(digit) = ch.to_digit(10) else {
            break;
        };
        value = value.saturating_mul(10).saturating_add(i64::from(digit));
    }
    value
}
