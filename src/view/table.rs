//! Derived tables handed to the presentation layer.

use crate::analysis::Aggregation;
use crate::models::{Table, Transaction, REQUIRED_COLUMNS};
use serde::Serialize;
use std::fmt;

/// A single value of a derived table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Integer(i64),
    Number(f64),
    Empty,
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => write!(f, "{}", s),
            Cell::Integer(i) => write!(f, "{}", i),
            Cell::Number(n) if n.is_nan() => write!(f, "NaN"),
            Cell::Number(n) => write!(f, "{:.2}", n),
            Cell::Empty => Ok(()),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

impl From<usize> for Cell {
    fn from(n: usize) -> Self {
        Cell::Integer(n as i64)
    }
}

impl From<u32> for Cell {
    fn from(n: u32) -> Self {
        Cell::Integer(i64::from(n))
    }
}

/// A column-named grid of cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DerivedTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl DerivedTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<Cell>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Group keys followed by the aggregated value.
    pub fn from_aggregation(aggregation: &Aggregation) -> Self {
        let mut columns = aggregation.group_columns.clone();
        columns.push(aggregation.value_name());

        let mut table = Self::new(columns);
        for row in &aggregation.rows {
            let mut cells: Vec<Cell> = row.keys.iter().map(|k| Cell::from(k.as_str())).collect();
            cells.push(Cell::Number(row.value));
            table.push(cells);
        }
        table
    }

    /// Selected columns of raw records; `headers` name source columns.
    pub fn from_records<'a>(
        table: &Table,
        records: impl IntoIterator<Item = &'a Transaction>,
        headers: &[&str],
    ) -> Self {
        let mut derived = Self::new(headers.iter().map(|h| h.to_string()).collect());
        for record in records {
            derived.push(headers.iter().map(|h| cell_of(table, record, h)).collect());
        }
        derived
    }

    /// Every column of up to `limit` records.
    pub fn preview(table: &Table, limit: usize) -> Self {
        let headers = table.headers();
        let refs: Vec<&str> = headers.iter().map(String::as_str).collect();
        Self::from_records(table, table.iter().take(limit), &refs)
    }
}

fn cell_of(table: &Table, record: &Transaction, header: &str) -> Cell {
    match header {
        "Age" => Cell::from(record.age),
        "Gender" => Cell::from(record.gender.as_str()),
        "Category" => Cell::from(record.category.as_str()),
        "Purchase Amount (USD)" => Cell::Number(record.purchase_amount),
        "Review Rating" => Cell::Number(record.review_rating),
        "Season" => Cell::from(record.season.as_str()),
        "Previous Purchases" => Cell::from(record.previous_purchases),
        other => {
            debug_assert!(!REQUIRED_COLUMNS.contains(&other));
            table
                .extra_columns()
                .iter()
                .position(|c| c == other)
                .and_then(|i| record.extra.get(i))
                .map(|v| Cell::from(v.as_str()))
                .unwrap_or(Cell::Empty)
        }
    }
}
