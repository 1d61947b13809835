//! Data models for shopping transactions.
//!
//! This module contains the typed transaction record, the closed enums it is
//! built from, and the immutable [`Table`] every analysis works against.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Customer gender as recorded in the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub const ALL: [Gender; 2] = [Gender::Male, Gender::Female];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            other => Err(format!("unknown gender '{}'", other)),
        }
    }
}

/// Season in which the purchase was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Season {
    Spring,
    Summer,
    Fall,
    Winter,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Spring, Season::Summer, Season::Fall, Season::Winter];

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Fall => "Fall",
            Season::Winter => "Winter",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Season {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "spring" => Ok(Season::Spring),
            "summer" => Ok(Season::Summer),
            "fall" | "autumn" => Ok(Season::Fall),
            "winter" => Ok(Season::Winter),
            other => Err(format!("unknown season '{}'", other)),
        }
    }
}

/// Lowercases a column key and folds spaces and underscores into dashes.
pub(crate) fn normalize_key(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .replace("(usd)", "")
        .trim()
        .replace([' ', '_'], "-")
}

/// Numeric columns that can be measured, binned and correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NumericColumn {
    Age,
    PurchaseAmount,
    ReviewRating,
    PreviousPurchases,
}

impl NumericColumn {
    pub const ALL: [NumericColumn; 4] = [
        NumericColumn::Age,
        NumericColumn::PurchaseAmount,
        NumericColumn::ReviewRating,
        NumericColumn::PreviousPurchases,
    ];

    /// The exact header of this column in the source file.
    pub fn header(&self) -> &'static str {
        match self {
            NumericColumn::Age => "Age",
            NumericColumn::PurchaseAmount => "Purchase Amount (USD)",
            NumericColumn::ReviewRating => "Review Rating",
            NumericColumn::PreviousPurchases => "Previous Purchases",
        }
    }

    /// Reads this column from a record.
    pub fn value(&self, record: &Transaction) -> f64 {
        match self {
            NumericColumn::Age => f64::from(record.age),
            NumericColumn::PurchaseAmount => record.purchase_amount,
            NumericColumn::ReviewRating => record.review_rating,
            NumericColumn::PreviousPurchases => f64::from(record.previous_purchases),
        }
    }
}

impl fmt::Display for NumericColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

impl FromStr for NumericColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_key(s).as_str() {
            "age" => Ok(NumericColumn::Age),
            "purchase-amount" | "purchase" | "amount" => Ok(NumericColumn::PurchaseAmount),
            "review-rating" | "rating" => Ok(NumericColumn::ReviewRating),
            "previous-purchases" => Ok(NumericColumn::PreviousPurchases),
            _ => Err(format!(
                "unknown numeric column '{}' (expected age, purchase-amount, review-rating or previous-purchases)",
                s
            )),
        }
    }
}

/// Categorical columns that can be grouped on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CategoricalColumn {
    Gender,
    Category,
    Season,
}

impl CategoricalColumn {
    pub const ALL: [CategoricalColumn; 3] = [
        CategoricalColumn::Gender,
        CategoricalColumn::Category,
        CategoricalColumn::Season,
    ];

    pub fn header(&self) -> &'static str {
        match self {
            CategoricalColumn::Gender => "Gender",
            CategoricalColumn::Category => "Category",
            CategoricalColumn::Season => "Season",
        }
    }

    pub fn value<'a>(&self, record: &'a Transaction) -> &'a str {
        match self {
            CategoricalColumn::Gender => record.gender.as_str(),
            CategoricalColumn::Category => &record.category,
            CategoricalColumn::Season => record.season.as_str(),
        }
    }
}

impl fmt::Display for CategoricalColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

impl FromStr for CategoricalColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_key(s).as_str() {
            "gender" => Ok(CategoricalColumn::Gender),
            "category" => Ok(CategoricalColumn::Category),
            "season" => Ok(CategoricalColumn::Season),
            _ => Err(format!(
                "unknown categorical column '{}' (expected gender, category or season)",
                s
            )),
        }
    }
}

/// A single purchase event, one row of the source table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub age: u32,
    pub gender: Gender,
    pub category: String,
    /// Purchase amount in USD, never negative.
    pub purchase_amount: f64,
    /// Review rating within [`RATING_RANGE`].
    pub review_rating: f64,
    pub season: Season,
    pub previous_purchases: u32,
    /// Pass-through columns, aligned with [`Table::extra_columns`].
    pub extra: Vec<String>,
}

/// Documented bounds of the review rating.
pub const RATING_RANGE: (f64, f64) = (1.0, 5.0);

/// Headers every source file must carry, in canonical order.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "Age",
    "Gender",
    "Category",
    "Purchase Amount (USD)",
    "Review Rating",
    "Season",
    "Previous Purchases",
];

/// The immutable transaction table.
///
/// Derived tables (filter results) are new `Table`s sharing the
/// pass-through header list with their source.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    extra_columns: Arc<Vec<String>>,
    records: Vec<Transaction>,
}

impl Table {
    pub fn new(extra_columns: Vec<String>, records: Vec<Transaction>) -> Self {
        Self {
            extra_columns: Arc::new(extra_columns),
            records,
        }
    }

    /// Builds a table with the same columns as `self` over other records.
    pub fn derive(&self, records: Vec<Transaction>) -> Self {
        Self {
            extra_columns: Arc::clone(&self.extra_columns),
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Transaction] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Transaction> {
        self.records.iter()
    }

    pub fn extra_columns(&self) -> &[String] {
        &self.extra_columns
    }

    /// All headers: the required columns followed by pass-through columns.
    pub fn headers(&self) -> Vec<String> {
        REQUIRED_COLUMNS
            .iter()
            .map(|h| h.to_string())
            .chain(self.extra_columns.iter().cloned())
            .collect()
    }

    /// Values of a numeric column in row order.
    pub fn numeric(&self, column: NumericColumn) -> Vec<f64> {
        self.records.iter().map(|r| column.value(r)).collect()
    }

    /// Distinct values of a categorical column in order of first appearance.
    pub fn distinct(&self, column: CategoricalColumn) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for record in &self.records {
            let value = column.value(record);
            if !seen.iter().any(|s| s == value) {
                seen.push(value.to_string());
            }
        }
        seen
    }

    /// Distinct values of a categorical column, sorted ascending.
    pub fn distinct_sorted(&self, column: CategoricalColumn) -> Vec<String> {
        let mut values = self.distinct(column);
        values.sort();
        values
    }

    /// Arithmetic mean of a numeric column, `None` when the table is empty.
    pub fn mean(&self, column: NumericColumn) -> Option<f64> {
        if self.records.is_empty() {
            return None;
        }
        let total: f64 = self.records.iter().map(|r| column.value(r)).sum();
        Some(total / self.records.len() as f64)
    }

    /// Observed minimum and maximum of a numeric column.
    pub fn min_max(&self, column: NumericColumn) -> Option<(f64, f64)> {
        self.records.iter().map(|r| column.value(r)).fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }
}

impl<'a> IntoIterator for &'a Table {
    type Item = &'a Transaction;
    type IntoIter = std::slice::Iter<'a, Transaction>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Builds a record with the fields most tests care about.
    pub fn record(
        age: u32,
        gender: Gender,
        category: &str,
        amount: f64,
        rating: f64,
        season: Season,
        previous: u32,
    ) -> Transaction {
        Transaction {
            age,
            gender,
            category: category.to_string(),
            purchase_amount: amount,
            review_rating: rating,
            season,
            previous_purchases: previous,
            extra: vec![],
        }
    }

    /// A small mixed table used across the analysis tests.
    pub fn sample_table() -> Table {
        Table::new(
            vec![],
            vec![
                record(25, Gender::Male, "Clothing", 40.0, 3.5, Season::Winter, 10),
                record(34, Gender::Female, "Footwear", 85.0, 4.5, Season::Summer, 22),
                record(52, Gender::Female, "Clothing", 60.0, 4.0, Season::Fall, 5),
                record(19, Gender::Male, "Accessories", 25.0, 2.8, Season::Spring, 1),
                record(67, Gender::Female, "Outerwear", 99.0, 4.9, Season::Winter, 48),
                record(41, Gender::Male, "Footwear", 70.0, 3.1, Season::Fall, 30),
            ],
        )
    }
}
