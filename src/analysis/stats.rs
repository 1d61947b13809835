//! Descriptive statistics, quantiles and IQR outlier detection.

use super::aggregator::group_values;
use super::segment::{equal_width_edges, locate};
use crate::models::{CategoricalColumn, NumericColumn, Table, Transaction};
use serde::Serialize;
use std::collections::BTreeMap;

/// Multiplier applied to the inter-quartile range by the outlier rule.
pub const IQR_FACTOR: f64 = 1.5;

/// Quantile `q` (0.0..=1.0) of `values` by linear interpolation between the
/// two nearest ranks. `None` when `values` is empty.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);
    Some(quantile_sorted(&sorted, q))
}

fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let position = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

/// The `describe()` summary of a numeric sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; NaN below two observations.
    pub std: f64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Summarizes a sample. `None` when it is empty.
pub fn describe(values: &[f64]) -> Option<Summary> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);

    let count = sorted.len();
    let mean = sorted.iter().sum::<f64>() / count as f64;
    let std = if count < 2 {
        f64::NAN
    } else {
        let ss: f64 = sorted.iter().map(|v| (v - mean).powi(2)).sum();
        (ss / (count - 1) as f64).sqrt()
    };

    Some(Summary {
        count,
        mean,
        std,
        min: sorted[0],
        q1: quantile_sorted(&sorted, 0.25),
        median: quantile_sorted(&sorted, 0.5),
        q3: quantile_sorted(&sorted, 0.75),
        max: sorted[count - 1],
    })
}

/// One summary per distinct value of `group`, in label order.
pub fn describe_by(
    table: &Table,
    group: CategoricalColumn,
    column: NumericColumn,
) -> BTreeMap<String, Summary> {
    group_values(table, group, column)
        .into_iter()
        .filter_map(|(label, values)| describe(&values).map(|s| (label, s)))
        .collect()
}

/// IQR fences of a numeric column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OutlierBounds {
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower: f64,
    pub upper: f64,
}

impl OutlierBounds {
    /// Fences from the two quartiles.
    pub fn from_quartiles(q1: f64, q3: f64) -> Self {
        let iqr = q3 - q1;
        Self {
            q1,
            q3,
            iqr,
            lower: q1 - IQR_FACTOR * iqr,
            upper: q3 + IQR_FACTOR * iqr,
        }
    }

    /// Strictly outside the fences.
    pub fn is_outlier(&self, value: f64) -> bool {
        value < self.lower || value > self.upper
    }
}

/// IQR fences of `column` over the rows of `table`. `None` when empty.
pub fn outlier_bounds(table: &Table, column: NumericColumn) -> Option<OutlierBounds> {
    let values = table.numeric(column);
    let q1 = quantile(&values, 0.25)?;
    let q3 = quantile(&values, 0.75)?;
    Some(OutlierBounds::from_quartiles(q1, q3))
}

/// Outlier detection over one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlierReport {
    pub column: NumericColumn,
    pub bounds: OutlierBounds,
    pub total: usize,
    /// Outlying rows in source order.
    pub outliers: Vec<Transaction>,
}

impl OutlierReport {
    /// Share of rows flagged, in percent.
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.outliers.len() as f64 / self.total as f64 * 100.0
        }
    }
}

/// Flags every row of `table` outside the IQR fences of `column`.
pub fn detect_outliers(table: &Table, column: NumericColumn) -> Option<OutlierReport> {
    let bounds = outlier_bounds(table, column)?;
    let outliers = table
        .iter()
        .filter(|r| bounds.is_outlier(column.value(r)))
        .cloned()
        .collect();

    Some(OutlierReport {
        column,
        bounds,
        total: table.len(),
        outliers,
    })
}

/// One histogram bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Equal-width histogram of `values`. Bins are right-closed, as in
/// segmentation, so a value on an interior edge counts toward the lower bin.
pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    let edges = match equal_width_edges(values, bins) {
        Some(edges) if edges.len() >= 2 => edges,
        _ => return Vec::new(),
    };

    let mut counts = vec![0usize; edges.len() - 1];
    for bin in values.iter().filter_map(|v| locate(&edges, *v)) {
        counts[bin] += 1;
    }

    edges
        .windows(2)
        .zip(counts)
        .map(|(w, count)| HistogramBin {
            start: w[0],
            end: w[1],
            count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::testing::{record, sample_table};
    use crate::models::{Gender, Season};

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_quantile_linear_interpolation() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&values, 0.0), Some(1.0));
        assert_eq!(quantile(&values, 1.0), Some(4.0));
        assert!(approx(quantile(&values, 0.25).unwrap(), 1.75));
        assert!(approx(quantile(&values, 0.5).unwrap(), 2.5));
        assert!(approx(quantile(&values, 0.75).unwrap(), 3.25));
        assert_eq!(quantile(&[], 0.5), None);
        assert_eq!(quantile(&[7.0], 0.75), Some(7.0));
    }

    #[test]
    fn test_outlier_fences_from_quartiles() {
        let bounds = OutlierBounds::from_quartiles(20.0, 80.0);
        assert_eq!(bounds.iqr, 60.0);
        assert_eq!(bounds.lower, -70.0);
        assert_eq!(bounds.upper, 170.0);

        assert!(bounds.is_outlier(-70.5));
        assert!(bounds.is_outlier(170.01));
        assert!(!bounds.is_outlier(-70.0));
        assert!(!bounds.is_outlier(170.0));
        assert!(!bounds.is_outlier(50.0));
    }

    #[test]
    fn test_detect_outliers_on_table() {
        let mut records: Vec<_> = (1..=9)
            .map(|i| record(30, Gender::Male, "Clothing", 50.0 + i as f64, 4.0, Season::Fall, 3))
            .collect();
        records.push(record(30, Gender::Female, "Footwear", 500.0, 4.0, Season::Fall, 3));
        let table = Table::new(vec![], records);

        let report = detect_outliers(&table, NumericColumn::PurchaseAmount).unwrap();
        assert_eq!(report.total, 10);
        assert_eq!(report.outliers.len(), 1);
        assert_eq!(report.outliers[0].purchase_amount, 500.0);
        assert!(approx(report.percentage(), 10.0));
    }

    #[test]
    fn test_outlier_bounds_on_empty_table() {
        let empty = sample_table().derive(vec![]);
        assert_eq!(outlier_bounds(&empty, NumericColumn::Age), None);
        assert!(detect_outliers(&empty, NumericColumn::Age).is_none());
    }

    #[test]
    fn test_describe() {
        let summary = describe(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_eq!(summary.count, 8);
        assert!(approx(summary.mean, 5.0));
        assert!(approx(summary.std, (32.0f64 / 7.0).sqrt()));
        assert_eq!(summary.min, 2.0);
        assert_eq!(summary.median, 4.5);
        assert_eq!(summary.max, 9.0);

        let single = describe(&[3.0]).unwrap();
        assert!(single.std.is_nan());
        assert!(describe(&[]).is_none());
    }

    #[test]
    fn test_describe_by_gender() {
        let summaries = describe_by(&sample_table(), CategoricalColumn::Gender, NumericColumn::Age);
        let keys: Vec<&String> = summaries.keys().collect();
        assert_eq!(keys, vec!["Female", "Male"]);
        assert_eq!(summaries["Male"].count, 3);
        assert_eq!(summaries["Female"].max, 67.0);
    }

    #[test]
    fn test_histogram_covers_all_values() {
        let values: Vec<f64> = (0..=100).map(f64::from).collect();
        let bins = histogram(&values, 30);
        assert_eq!(bins.len(), 30);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), values.len());
        assert_eq!(bins[0].start, 0.0);
        assert_eq!(bins[29].end, 100.0);
        assert!(histogram(&[], 30).is_empty());
    }

    #[test]
    fn test_histogram_edges_count_toward_lower_bin() {
        let bins = histogram(&[0.0, 1.0, 2.0, 3.0], 3);
        let counts: Vec<usize> = bins.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![2, 1, 1]);
    }
}
