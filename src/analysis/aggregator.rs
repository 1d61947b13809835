//! Grouped aggregation.
//!
//! Rows are partitioned by one or more grouping keys and a metric column is
//! reduced within each partition. Only partitions that actually hold rows are
//! emitted; rows whose segment is undefined are skipped.

use super::segment::Segments;
use crate::models::{CategoricalColumn, NumericColumn, Table, Transaction};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Reduction applied to the metric column within each group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AggFn {
    Count,
    Mean,
    Sum,
}

impl fmt::Display for AggFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggFn::Count => write!(f, "count"),
            AggFn::Mean => write!(f, "mean"),
            AggFn::Sum => write!(f, "sum"),
        }
    }
}

impl FromStr for AggFn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "count" => Ok(AggFn::Count),
            "mean" | "avg" | "average" => Ok(AggFn::Mean),
            "sum" | "total" => Ok(AggFn::Sum),
            other => Err(format!("unknown aggregation '{}'", other)),
        }
    }
}

/// A grouping key: a categorical column or a derived segment column.
#[derive(Debug, Clone, Copy)]
pub enum GroupBy<'a> {
    Column(CategoricalColumn),
    Segment(&'a Segments),
}

impl GroupBy<'_> {
    pub fn name(&self) -> String {
        match self {
            GroupBy::Column(column) => column.header().to_string(),
            GroupBy::Segment(_) => "Segment".to_string(),
        }
    }

    /// Sort rank and label of a row's group. Categorical groups sort by
    /// label, segments by bin order.
    fn key(&self, row: usize, record: &Transaction) -> Option<(usize, String)> {
        match self {
            GroupBy::Column(column) => Some((0, column.value(record).to_string())),
            GroupBy::Segment(segments) => {
                let bin = segments.assignments.get(row).copied().flatten()?;
                Some((bin, segments.labels[bin].clone()))
            }
        }
    }
}

/// One emitted group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    /// Group labels, one per grouping key.
    pub keys: Vec<String>,
    pub value: f64,
    /// Rows in the partition.
    pub rows: usize,
}

/// The result of an aggregation request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregation {
    pub group_columns: Vec<String>,
    pub metric: NumericColumn,
    pub func: AggFn,
    pub rows: Vec<AggregateRow>,
}

impl Aggregation {
    /// Header for the value column, e.g. `mean(Review Rating)`.
    pub fn value_name(&self) -> String {
        match self.func {
            AggFn::Count => "Count".to_string(),
            func => format!("{}({})", func, self.metric.header()),
        }
    }

    /// Total number of rows across all emitted groups.
    pub fn total_rows(&self) -> usize {
        self.rows.iter().map(|r| r.rows).sum()
    }

    /// The value of the group with the given single key.
    pub fn value_of(&self, key: &str) -> Option<f64> {
        self.rows
            .iter()
            .find(|r| r.keys.len() == 1 && r.keys[0] == key)
            .map(|r| r.value)
    }
}

/// Aggregates `metric` with `func` per distinct value of `group_by`.
pub fn aggregate(table: &Table, group_by: GroupBy<'_>, metric: NumericColumn, func: AggFn) -> Aggregation {
    aggregate_by(table, &[group_by], metric, func)
}

/// Aggregates `metric` with `func` per distinct combination of `groups`.
pub fn aggregate_by(
    table: &Table,
    groups: &[GroupBy<'_>],
    metric: NumericColumn,
    func: AggFn,
) -> Aggregation {
    let mut partitions: BTreeMap<Vec<(usize, String)>, (usize, f64)> = BTreeMap::new();

    'rows: for (row, record) in table.iter().enumerate() {
        let mut key = Vec::with_capacity(groups.len());
        for group in groups {
            match group.key(row, record) {
                Some(part) => key.push(part),
                None => continue 'rows,
            }
        }

        let entry = partitions.entry(key).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += metric.value(record);
    }

    let rows = partitions
        .into_iter()
        .map(|(key, (count, sum))| AggregateRow {
            keys: key.into_iter().map(|(_, label)| label).collect(),
            value: match func {
                AggFn::Count => count as f64,
                AggFn::Mean => sum / count as f64,
                AggFn::Sum => sum,
            },
            rows: count,
        })
        .collect();

    Aggregation {
        group_columns: groups.iter().map(GroupBy::name).collect(),
        metric,
        func,
        rows,
    }
}

/// The `n` groups with the largest values, largest first. Ties keep group order.
pub fn top_groups(aggregation: &Aggregation, n: usize) -> Vec<AggregateRow> {
    let mut rows = aggregation.rows.clone();
    rows.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(std::cmp::Ordering::Equal));
    rows.truncate(n);
    rows
}

/// The first group holding the largest value.
pub fn top_group(aggregation: &Aggregation) -> Option<&AggregateRow> {
    aggregation.rows.iter().fold(None, |best: Option<&AggregateRow>, row| match best {
        Some(b) if b.value >= row.value => Some(b),
        _ => Some(row),
    })
}

/// Segment sizes, most populated first, empty segments omitted.
pub fn value_counts(segments: &Segments) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = segments
        .labels
        .iter()
        .cloned()
        .zip(segments.counts())
        .filter(|(_, count)| *count > 0)
        .collect();
    counts.sort_by_key(|(_, count)| std::cmp::Reverse(*count));
    counts
}

/// Metric values partitioned by a categorical column, groups in label order.
pub fn group_values(
    table: &Table,
    group: CategoricalColumn,
    metric: NumericColumn,
) -> BTreeMap<String, Vec<f64>> {
    let mut grouped: BTreeMap<String, Vec<f64>> = BTreeMap::new();

    for record in table {
        grouped
            .entry(group.value(record).to_string())
            .or_default()
            .push(metric.value(record));
    }

    grouped
}
