//! Segmentation of numeric columns into ordered, labelled buckets.
//!
//! Bins are right-closed: `[e0, e1], (e1, e2], ..., (e(n-1), en]`. A value
//! sitting on an interior edge belongs to the lower bin, and the lowest bin
//! also includes its lower edge so the column minimum is always binned.

use super::AnalysisError;
use crate::models::{NumericColumn, Table};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// How a numeric column is cut into bins.
#[derive(Debug, Clone, PartialEq)]
pub enum BinSpec {
    /// `bins` equal-width bins spanning the observed min..max.
    EqualWidth {
        bins: usize,
        labels: Option<Vec<String>>,
    },
    /// Explicit ascending edges; one fewer label than edges.
    Edges {
        edges: Vec<f64>,
        labels: Option<Vec<String>>,
    },
}

/// The segment of every row of a table, plus the bins that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segments {
    pub column: NumericColumn,
    pub edges: Vec<f64>,
    pub labels: Vec<String>,
    /// Bin index per row; `None` when the value lies outside every bin.
    pub assignments: Vec<Option<usize>>,
}

impl Segments {
    /// The label of a row's segment.
    pub fn label_of(&self, row: usize) -> Option<&str> {
        self.assignments
            .get(row)
            .copied()
            .flatten()
            .map(|bin| self.labels[bin].as_str())
    }

    /// Number of rows that fell outside every bin.
    pub fn unassigned(&self) -> usize {
        self.assignments.iter().filter(|a| a.is_none()).count()
    }

    /// Row count per bin, in bin order.
    pub fn counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.labels.len()];
        for bin in self.assignments.iter().flatten() {
            counts[*bin] += 1;
        }
        counts
    }
}

/// Cuts `column` of `table` into segments.
pub fn bin_into_segments(
    table: &Table,
    column: NumericColumn,
    spec: &BinSpec,
) -> Result<Segments, AnalysisError> {
    let values = table.numeric(column);

    let (edges, labels) = match spec {
        BinSpec::EqualWidth { bins, labels } => {
            let edges = equal_width_edges(&values, *bins)
                .ok_or_else(|| AnalysisError::EmptyColumn(column.header().to_string()))?;
            (edges, labels.clone())
        }
        BinSpec::Edges { edges, labels } => (edges.clone(), labels.clone()),
    };

    validate_edges(&edges)?;

    let labels = match labels {
        Some(labels) => {
            if labels.len() != edges.len() - 1 {
                return Err(AnalysisError::LabelCount {
                    expected: edges.len() - 1,
                    actual: labels.len(),
                });
            }
            labels
        }
        None => interval_labels(&edges),
    };

    let assignments = values.iter().map(|v| locate(&edges, *v)).collect();

    Ok(Segments {
        column,
        edges,
        labels,
        assignments,
    })
}

/// Edges of `bins` equal-width bins over the observed range of `values`.
///
/// A constant column is widened by 0.1% of its magnitude on each side.
/// Returns `None` for an empty input.
pub(crate) fn equal_width_edges(values: &[f64], bins: usize) -> Option<Vec<f64>> {
    if bins == 0 {
        return Some(Vec::new());
    }

    let (mut lo, mut hi) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            None => Some((*v, *v)),
            Some((lo, hi)) => Some((lo.min(*v), hi.max(*v))),
        })?;

    if lo == hi {
        let adjust = if lo == 0.0 { 0.001 } else { lo.abs() * 0.001 };
        lo -= adjust;
        hi += adjust;
    }

    let width = (hi - lo) / bins as f64;
    let mut edges: Vec<f64> = (0..bins).map(|i| lo + width * i as f64).collect();
    edges.push(hi);
    Some(edges)
}

fn validate_edges(edges: &[f64]) -> Result<(), AnalysisError> {
    if edges.len() < 2 {
        return Err(AnalysisError::ZeroBins);
    }
    if edges.iter().any(|e| !e.is_finite()) || edges.windows(2).any(|w| w[0] >= w[1]) {
        return Err(AnalysisError::InvalidEdges);
    }
    Ok(())
}

/// Bin index of `value`, or `None` outside `[first, last]`.
pub(crate) fn locate(edges: &[f64], value: f64) -> Option<usize> {
    let (first, last) = (*edges.first()?, *edges.last()?);
    if !value.is_finite() || value < first || value > last {
        return None;
    }
    if value == first {
        return Some(0);
    }
    Some(edges.partition_point(|e| *e < value) - 1)
}

fn interval_labels(edges: &[f64]) -> Vec<String> {
    edges
        .windows(2)
        .enumerate()
        .map(|(i, w)| {
            let open = if i == 0 { '[' } else { '(' };
            format!("{}{:.2}, {:.2}]", open, w[0], w[1])
        })
        .collect()
}

/// The customer segmentations offered on the insights page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SegmentPreset {
    PurchaseAmount,
    AgeGroup,
    ReviewRating,
    PreviousPurchases,
}

impl SegmentPreset {
    pub fn column(&self) -> NumericColumn {
        match self {
            SegmentPreset::PurchaseAmount => NumericColumn::PurchaseAmount,
            SegmentPreset::AgeGroup => NumericColumn::Age,
            SegmentPreset::ReviewRating => NumericColumn::ReviewRating,
            SegmentPreset::PreviousPurchases => NumericColumn::PreviousPurchases,
        }
    }

    pub fn bin_spec(&self) -> BinSpec {
        fn labels(names: &[&str]) -> Option<Vec<String>> {
            Some(names.iter().map(|s| s.to_string()).collect())
        }

        match self {
            SegmentPreset::PurchaseAmount => BinSpec::EqualWidth {
                bins: 3,
                labels: labels(&["Low Spender", "Medium Spender", "High Spender"]),
            },
            SegmentPreset::AgeGroup => BinSpec::Edges {
                edges: vec![0.0, 25.0, 45.0, 65.0, 100.0],
                labels: labels(&[
                    "Young (≤25)",
                    "Adult (26-45)",
                    "Middle-aged (46-65)",
                    "Senior (65+)",
                ]),
            },
            SegmentPreset::ReviewRating => BinSpec::Edges {
                edges: vec![0.0, 3.0, 4.0, 5.0],
                labels: labels(&[
                    "Low Rating (≤3.0)",
                    "Medium Rating (3.0-4.0)",
                    "High Rating (>4.0)",
                ]),
            },
            SegmentPreset::PreviousPurchases => BinSpec::EqualWidth {
                bins: 3,
                labels: labels(&["New Customer", "Regular Customer", "Loyal Customer"]),
            },
        }
    }
}

impl fmt::Display for SegmentPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SegmentPreset::PurchaseAmount => write!(f, "Purchase Amount"),
            SegmentPreset::AgeGroup => write!(f, "Age Group"),
            SegmentPreset::ReviewRating => write!(f, "Review Rating"),
            SegmentPreset::PreviousPurchases => write!(f, "Previous Purchases"),
        }
    }
}

impl FromStr for SegmentPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace([' ', '_'], "-").as_str() {
            "purchase-amount" | "purchase" => Ok(SegmentPreset::PurchaseAmount),
            "age-group" | "age" => Ok(SegmentPreset::AgeGroup),
            "review-rating" | "rating" => Ok(SegmentPreset::ReviewRating),
            "previous-purchases" => Ok(SegmentPreset::PreviousPurchases),
            _ => Err(format!(
                "unknown segmentation '{}' (expected purchase-amount, age-group, review-rating or previous-purchases)",
                s
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::testing::{record, sample_table};
    use crate::models::{Gender, Season};

    fn table_with_ages(ages: &[u32]) -> Table {
        Table::new(
            vec![],
            ages.iter()
                .map(|a| record(*a, Gender::Male, "Clothing", 10.0, 3.0, Season::Fall, 1))
                .collect(),
        )
    }

    #[test]
    fn test_equal_width_assigns_every_value_once() {
        let table = sample_table();
        let spec = BinSpec::EqualWidth {
            bins: 3,
            labels: None,
        };
        let segments = bin_into_segments(&table, NumericColumn::PurchaseAmount, &spec).unwrap();

        assert_eq!(segments.labels.len(), 3);
        assert!(segments.edges.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(segments.unassigned(), 0);
        assert_eq!(segments.counts().iter().sum::<usize>(), table.len());
        // 25..99 in steps of 24.67: [25, 49.67] (49.67, 74.33] (74.33, 99]
        assert_eq!(segments.counts(), vec![2, 2, 2]);
    }

    #[test]
    fn test_interior_edge_goes_to_lower_bin() {
        let table = table_with_ages(&[0, 25, 26, 45, 46, 65, 66, 100]);
        let segments = bin_into_segments(
            &table,
            NumericColumn::Age,
            &SegmentPreset::AgeGroup.bin_spec(),
        )
        .unwrap();

        assert_eq!(
            segments.assignments,
            vec![
                Some(0),
                Some(0),
                Some(1),
                Some(1),
                Some(2),
                Some(2),
                Some(3),
                Some(3)
            ]
        );
        assert_eq!(segments.label_of(1), Some("Young (≤25)"));
        assert_eq!(segments.label_of(3), Some("Adult (26-45)"));
    }

    #[test]
    fn test_rating_edges_fall_in_lower_segment() {
        let ratings = [3.0, 4.0, 4.1, 2.9];
        let table = Table::new(
            vec![],
            ratings
                .iter()
                .map(|r| record(30, Gender::Female, "Clothing", 10.0, *r, Season::Fall, 1))
                .collect(),
        );
        let segments = bin_into_segments(
            &table,
            NumericColumn::ReviewRating,
            &SegmentPreset::ReviewRating.bin_spec(),
        )
        .unwrap();

        assert_eq!(segments.label_of(0), Some("Low Rating (≤3.0)"));
        assert_eq!(segments.label_of(1), Some("Medium Rating (3.0-4.0)"));
        assert_eq!(segments.label_of(2), Some("High Rating (>4.0)"));
        assert_eq!(segments.label_of(3), Some("Low Rating (≤3.0)"));
    }

    #[test]
    fn test_default_labels_are_right_closed() {
        let table = table_with_ages(&[10, 50]);
        let spec = BinSpec::Edges {
            edges: vec![0.0, 50.0, 100.0],
            labels: None,
        };
        let segments = bin_into_segments(&table, NumericColumn::Age, &spec).unwrap();

        assert_eq!(segments.labels, vec!["[0.00, 50.00]", "(50.00, 100.00]"]);
        assert_eq!(segments.counts(), vec![2, 0]);
    }

    #[test]
    fn test_out_of_range_values_are_unassigned() {
        let table = table_with_ages(&[10, 120]);
        let spec = BinSpec::Edges {
            edges: vec![0.0, 50.0, 100.0],
            labels: Some(vec!["low".into(), "high".into()]),
        };
        let segments = bin_into_segments(&table, NumericColumn::Age, &spec).unwrap();

        assert_eq!(segments.label_of(0), Some("low"));
        assert_eq!(segments.label_of(1), None);
        assert_eq!(segments.unassigned(), 1);
    }

    #[test]
    fn test_constant_column_is_widened() {
        let table = table_with_ages(&[30, 30, 30]);
        let spec = BinSpec::EqualWidth {
            bins: 3,
            labels: None,
        };
        let segments = bin_into_segments(&table, NumericColumn::Age, &spec).unwrap();

        assert!((segments.edges[0] - 29.97).abs() < 1e-9);
        assert!((segments.edges[3] - 30.03).abs() < 1e-9);
        assert_eq!(segments.counts(), vec![0, 3, 0]);
    }

    #[test]
    fn test_invalid_specs_are_errors() {
        let table = sample_table();

        let zero = BinSpec::EqualWidth {
            bins: 0,
            labels: None,
        };
        assert_eq!(
            bin_into_segments(&table, NumericColumn::Age, &zero),
            Err(AnalysisError::ZeroBins)
        );

        let descending = BinSpec::Edges {
            edges: vec![10.0, 5.0, 20.0],
            labels: None,
        };
        assert_eq!(
            bin_into_segments(&table, NumericColumn::Age, &descending),
            Err(AnalysisError::InvalidEdges)
        );

        let mislabelled = BinSpec::Edges {
            edges: vec![0.0, 50.0, 100.0],
            labels: Some(vec!["only one".into()]),
        };
        assert_eq!(
            bin_into_segments(&table, NumericColumn::Age, &mislabelled),
            Err(AnalysisError::LabelCount {
                expected: 2,
                actual: 1
            })
        );

        let empty = table.derive(vec![]);
        let spec = BinSpec::EqualWidth {
            bins: 3,
            labels: None,
        };
        assert!(matches!(
            bin_into_segments(&empty, NumericColumn::Age, &spec),
            Err(AnalysisError::EmptyColumn(_))
        ));
    }

    #[test]
    fn test_preset_parsing() {
        assert_eq!("age".parse::<SegmentPreset>(), Ok(SegmentPreset::AgeGroup));
        assert_eq!(
            "Previous Purchases".parse::<SegmentPreset>(),
            Ok(SegmentPreset::PreviousPurchases)
        );
        assert!("colour".parse::<SegmentPreset>().is_err());
    }
}
