//! Pairwise correlation of numeric columns.

use super::AnalysisError;
use crate::models::{NumericColumn, Table};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Correlation coefficient flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum CorrelationMethod {
    #[default]
    Pearson,
    /// Pearson over average-tie ranks.
    Spearman,
}

impl fmt::Display for CorrelationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorrelationMethod::Pearson => write!(f, "Pearson"),
            CorrelationMethod::Spearman => write!(f, "Spearman"),
        }
    }
}

impl FromStr for CorrelationMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pearson" => Ok(CorrelationMethod::Pearson),
            "spearman" => Ok(CorrelationMethod::Spearman),
            other => Err(format!("unknown correlation method '{}'", other)),
        }
    }
}

/// A symmetric matrix of coefficients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub method: CorrelationMethod,
    pub columns: Vec<NumericColumn>,
    /// Row-major; `values[i][j]` correlates `columns[i]` with `columns[j]`.
    pub values: Vec<Vec<f64>>,
}

/// One off-diagonal entry of a matrix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CorrelationPair {
    pub first: NumericColumn,
    pub second: NumericColumn,
    pub coefficient: f64,
}

impl CorrelationMatrix {
    pub fn get(&self, a: NumericColumn, b: NumericColumn) -> Option<f64> {
        let i = self.columns.iter().position(|c| *c == a)?;
        let j = self.columns.iter().position(|c| *c == b)?;
        Some(self.values[i][j])
    }

    /// The `k` unordered pairs with the largest |coefficient|. Undefined
    /// coefficients are skipped; ties keep matrix order.
    pub fn strongest_pairs(&self, k: usize) -> Vec<CorrelationPair> {
        let mut pairs = Vec::new();
        for i in 0..self.columns.len() {
            for j in (i + 1)..self.columns.len() {
                let coefficient = self.values[i][j];
                if coefficient.is_nan() {
                    continue;
                }
                pairs.push(CorrelationPair {
                    first: self.columns[i],
                    second: self.columns[j],
                    coefficient,
                });
            }
        }

        pairs.sort_by(|a, b| {
            b.coefficient
                .abs()
                .partial_cmp(&a.coefficient.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        pairs.truncate(k);
        pairs
    }
}

/// Correlates every pair of `columns` over the rows of `table`.
///
/// Duplicate columns are collapsed. A column with zero variance, or a table
/// with fewer than two rows, yields NaN coefficients.
pub fn correlation_matrix(
    table: &Table,
    columns: &[NumericColumn],
    method: CorrelationMethod,
) -> Result<CorrelationMatrix, AnalysisError> {
    let mut distinct: Vec<NumericColumn> = Vec::new();
    for column in columns {
        if !distinct.contains(column) {
            distinct.push(*column);
        }
    }
    if distinct.len() < 2 {
        return Err(AnalysisError::TooFewColumns(distinct.len()));
    }

    let series: Vec<Vec<f64>> = distinct
        .iter()
        .map(|c| {
            let values = table.numeric(*c);
            match method {
                CorrelationMethod::Pearson => values,
                CorrelationMethod::Spearman => ranks(&values),
            }
        })
        .collect();

    let n = distinct.len();
    let mut values = vec![vec![f64::NAN; n]; n];
    for i in 0..n {
        values[i][i] = if has_variance(&series[i]) { 1.0 } else { f64::NAN };
        for j in (i + 1)..n {
            let r = pearson(&series[i], &series[j]);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    Ok(CorrelationMatrix {
        method,
        columns: distinct,
        values,
    })
}

fn has_variance(values: &[f64]) -> bool {
    values.len() >= 2 && values.iter().any(|v| *v != values[0])
}

/// Pearson's r. NaN when either side is constant or shorter than two.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n < 2 {
        return f64::NAN;
    }

    let mean_x = x[..n].iter().sum::<f64>() / n as f64;
    let mean_y = y[..n].iter().sum::<f64>() / n as f64;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in x[..n].iter().zip(&y[..n]) {
        let (dx, dy) = (a - mean_x, b - mean_y);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if sxx == 0.0 || syy == 0.0 {
        return f64::NAN;
    }
    (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
}

/// 1-based ranks, ties sharing the average of the ranks they span.
pub fn ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|a, b| values[*a].total_cmp(&values[*b]));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start;
        while end + 1 < order.len() && values[order[end + 1]] == values[order[start]] {
            end += 1;
        }
        let average = (start + end) as f64 / 2.0 + 1.0;
        for idx in &order[start..=end] {
            ranks[*idx] = average;
        }
        start = end + 1;
    }
    ranks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::testing::{record, sample_table};
    use crate::models::{Gender, Season};

    #[test]
    fn test_pearson_perfect_and_inverse() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert!((pearson(&x, &x) - 1.0).abs() < 1e-12);
        let y = [-1.0, -2.0, -3.0, -4.0, -5.0];
        assert!((pearson(&x, &y) + 1.0).abs() < 1e-12);
        assert!(pearson(&x, &[2.0; 5]).is_nan());
        assert!(pearson(&[1.0], &[1.0]).is_nan());
    }

    #[test]
    fn test_ranks_average_ties() {
        assert_eq!(ranks(&[10.0, 20.0, 20.0, 5.0]), vec![2.0, 3.5, 3.5, 1.0]);
    }

    #[test]
    fn test_matrix_is_symmetric_with_unit_diagonal() {
        let table = sample_table();
        for method in [CorrelationMethod::Pearson, CorrelationMethod::Spearman] {
            let matrix = correlation_matrix(&table, &NumericColumn::ALL, method).unwrap();
            let n = matrix.columns.len();
            for i in 0..n {
                assert_eq!(matrix.values[i][i], 1.0);
                for j in 0..n {
                    assert_eq!(matrix.values[i][j].to_bits(), matrix.values[j][i].to_bits());
                    assert!((-1.0..=1.0).contains(&matrix.values[i][j]));
                }
            }
        }
    }

    #[test]
    fn test_spearman_is_rank_based() {
        let records = [1.0, 2.0, 3.0, 4.0, 100.0]
            .iter()
            .enumerate()
            .map(|(i, amount)| {
                record(20 + i as u32, Gender::Male, "Clothing", *amount, 3.0, Season::Fall, 1)
            })
            .collect();
        let table = Table::new(vec![], records);
        let columns = [NumericColumn::Age, NumericColumn::PurchaseAmount];

        let spearman = correlation_matrix(&table, &columns, CorrelationMethod::Spearman).unwrap();
        assert!((spearman.values[0][1] - 1.0).abs() < 1e-12);

        let pearson = correlation_matrix(&table, &columns, CorrelationMethod::Pearson).unwrap();
        assert!(pearson.values[0][1] < 0.99);
    }

    #[test]
    fn test_constant_column_is_nan() {
        let records = (0..4)
            .map(|i| record(20 + i, Gender::Male, "Clothing", 10.0, 3.0, Season::Fall, i))
            .collect();
        let table = Table::new(vec![], records);
        let matrix = correlation_matrix(
            &table,
            &[NumericColumn::Age, NumericColumn::ReviewRating],
            CorrelationMethod::Pearson,
        )
        .unwrap();

        assert_eq!(matrix.get(NumericColumn::Age, NumericColumn::Age), Some(1.0));
        assert!(matrix.values[1][1].is_nan());
        assert!(matrix.values[0][1].is_nan());
        assert!(matrix.strongest_pairs(3).is_empty());
    }

    #[test]
    fn test_too_few_columns() {
        let table = sample_table();
        assert_eq!(
            correlation_matrix(&table, &[NumericColumn::Age], CorrelationMethod::Pearson),
            Err(AnalysisError::TooFewColumns(1))
        );
        assert_eq!(
            correlation_matrix(
                &table,
                &[NumericColumn::Age, NumericColumn::Age],
                CorrelationMethod::Pearson
            ),
            Err(AnalysisError::TooFewColumns(1))
        );
    }

    #[test]
    fn test_strongest_pairs_counts_each_pair_once() {
        let table = sample_table();
        let matrix =
            correlation_matrix(&table, &NumericColumn::ALL, CorrelationMethod::Pearson).unwrap();

        let pairs = matrix.strongest_pairs(10);
        assert_eq!(pairs.len(), 6);
        assert!(pairs.iter().all(|p| p.first != p.second));
        assert!(pairs
            .windows(2)
            .all(|w| w[0].coefficient.abs() >= w[1].coefficient.abs()));
        assert_eq!(matrix.strongest_pairs(3).len(), 3);
    }
}
