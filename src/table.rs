//! Plain-text tables for terminal output of the inventory commands.

use std::fmt::Write as _;

use crate::aggregate::{AggregationResult, CategorySet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

pub struct Column<'a> {
    pub title: &'a str,
    pub align: Align,
}

impl<'a> Column<'a> {
    pub const fn left(title: &'a str) -> Self {
        Self {
            title,
            align: Align::Left,
        }
    }

    pub const fn right(title: &'a str) -> Self {
        Self {
            title,
            align: Align::Right,
        }
    }
}

pub fn render_table(columns: &[Column<'_>], rows: &[Vec<String>]) -> String {
    let mut widths = columns
        .iter()
        .map(|c| display_width(c.title).max(1))
        .collect::<Vec<_>>();
    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(columns.len()) {
            widths[idx] = widths[idx].max(display_width(cell));
        }
    }

    let mut output = String::new();
    let titles = columns.iter().map(|c| c.title.to_string()).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(columns, &titles, &widths));
    let separators = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(columns, &separators, &widths));
    for row in rows {
        let _ = writeln!(output, "{}", format_row(columns, row, &widths));
    }
    output
}

fn format_row(columns: &[Column<'_>], values: &[String], widths: &[usize]) -> String {
    let mut cells = Vec::with_capacity(columns.len());
    for (idx, column) in columns.iter().enumerate() {
        let value = values.get(idx).map(String::as_str).unwrap_or_default();
        let value = value.replace(['\n', '\r', '\t'], " ");
        let padding = " ".repeat(widths[idx].saturating_sub(display_width(&value)));
        cells.push(match column.align {
            Align::Left => format!("{value}{padding}"),
            Align::Right => format!("{padding}{value}"),
        });
    }
    cells.join("  ").trim_end().to_string()
}

fn display_width(value: &str) -> usize {
    value.chars().count()
}

pub fn render_categories(categories: &CategorySet) -> String {
    let rows = categories
        .iter()
        .map(|category| vec![category.clone()])
        .collect::<Vec<_>>();
    render_table(&[Column::left("category")], &rows)
}

/// One line per reported `(location, model)` pair with its quantity and tier label.
pub fn render_aggregation(result: &AggregationResult) -> String {
    let rows = result
        .reported_lines()
        .into_iter()
        .map(|(location, model, quantity, tier)| {
            vec![
                location.to_string(),
                model.to_string(),
                quantity.to_string(),
                tier.label(),
            ]
        })
        .collect::<Vec<_>>();
    render_table(
        &[
            Column::left("location"),
            Column::left("model"),
            Column::right("quantity"),
            Column::right("tier"),
        ],
        &rows,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn right_aligned_columns_pad_on_the_left() {
        let rendered = render_table(
            &[Column::left("model"), Column::right("qty")],
            &[
                vec!["X1".to_string(), "4".to_string()],
                vec!["Galaxy".to_string(), "120".to_string()],
            ],
        );
        let lines = rendered.lines().collect::<Vec<_>>();
        assert_eq!(
            lines,
            vec!["model   qty", "------  ---", "X1        4", "Galaxy  120"]
        );
    }

    #[test]
    fn control_characters_become_spaces() {
        let rendered = render_table(&[Column::left("note")], &[vec!["a\tb\nc".to_string()]]);
        assert_eq!(rendered.lines().nth(2), Some("a b c"));
    }

    #[test]
    fn aggregation_table_omits_small_sums() {
        let mut result = AggregationResult::default();
        result.add("WH1", "X1", 2);
        result.add("WH1", "X2", 75);
        let rendered = render_aggregation(&result);
        assert!(!rendered.contains("X1"));
        assert!(rendered.contains("WH1       X2"));
        assert!(rendered.trim_end().ends_with("50+"));
    }
}
