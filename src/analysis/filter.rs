//! Row filtering.
//!
//! A [`FilterSpec`] is a conjunction of per-dimension constraints. Each
//! categorical dimension is a [`Selection`]: `All` imposes nothing, `Only`
//! keeps rows whose value is in the set. An empty `Only` set keeps no rows,
//! which is what an untouched multi-select means.

use crate::models::{Gender, Season, Table, Transaction};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

/// A constraint on one categorical dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Selection<T: Ord> {
    All,
    Only(BTreeSet<T>),
}

impl<T: Ord> Default for Selection<T> {
    fn default() -> Self {
        Selection::All
    }
}

impl<T: Ord> Selection<T> {
    /// A single-choice selection.
    pub fn one(value: T) -> Self {
        Selection::Only(BTreeSet::from([value]))
    }

    /// A multi-select; an empty iterator selects nothing.
    pub fn any_of(values: impl IntoIterator<Item = T>) -> Self {
        Selection::Only(values.into_iter().collect())
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }

    pub fn allows(&self, value: &T) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(set) => set.contains(value),
        }
    }
}

impl Selection<String> {
    /// Membership test without allocating for string-keyed selections.
    pub fn allows_str(&self, value: &str) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(set) => set.contains(value),
        }
    }
}

/// Inclusive age bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AgeRange {
    pub min: u32,
    pub max: u32,
}

impl AgeRange {
    pub fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, age: u32) -> bool {
        (self.min..=self.max).contains(&age)
    }
}

/// The active filter constraints for one view.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterSpec {
    pub gender: Selection<Gender>,
    pub category: Selection<String>,
    pub season: Selection<Season>,
    pub age: Option<AgeRange>,
}

impl FilterSpec {
    /// True when no dimension constrains anything.
    pub fn is_unconstrained(&self) -> bool {
        self.gender.is_all() && self.category.is_all() && self.season.is_all() && self.age.is_none()
    }

    pub fn matches(&self, record: &Transaction) -> bool {
        self.gender.allows(&record.gender)
            && self.category.allows_str(&record.category)
            && self.season.allows(&record.season)
            && self.age.map_or(true, |range| range.contains(record.age))
    }
}

/// Returns the rows of `table` matching every active constraint, in source order.
pub fn apply_filters(table: &Table, filters: &FilterSpec) -> Table {
    if filters.is_unconstrained() {
        return table.derive(table.records().to_vec());
    }

    let records: Vec<Transaction> = table
        .iter()
        .filter(|record| filters.matches(record))
        .cloned()
        .collect();

    debug!("Filter kept {} of {} rows", records.len(), table.len());
    table.derive(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::testing::sample_table;

    #[test]
    fn test_unconstrained_filter_returns_input() {
        let table = sample_table();
        let spec = FilterSpec::default();
        assert!(spec.is_unconstrained());

        let filtered = apply_filters(&table, &spec);
        assert_eq!(filtered, table);
    }

    #[test]
    fn test_single_choice_filters() {
        let table = sample_table();
        let spec = FilterSpec {
            gender: Selection::one(Gender::Female),
            ..Default::default()
        };

        let filtered = apply_filters(&table, &spec);
        assert_eq!(filtered.len(), 3);
        assert!(filtered.iter().all(|r| r.gender == Gender::Female));

        let spec = FilterSpec {
            gender: Selection::one(Gender::Female),
            category: Selection::one("Clothing".to_string()),
            ..Default::default()
        };
        let filtered = apply_filters(&table, &spec);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered.records()[0].age, 52);
    }

    #[test]
    fn test_age_range_is_inclusive() {
        let table = sample_table();
        let spec = FilterSpec {
            age: Some(AgeRange::new(25, 52)),
            ..Default::default()
        };

        let ages: Vec<u32> = apply_filters(&table, &spec).iter().map(|r| r.age).collect();
        assert_eq!(ages, vec![25, 34, 52, 41]);
    }

    #[test]
    fn test_empty_selection_matches_nothing() {
        let table = sample_table();
        let spec = FilterSpec {
            gender: Selection::any_of(Vec::<Gender>::new()),
            ..Default::default()
        };

        assert!(!spec.is_unconstrained());
        let filtered = apply_filters(&table, &spec);
        assert!(filtered.is_empty());
        assert_eq!(filtered.extra_columns(), table.extra_columns());
    }

    #[test]
    fn test_filter_is_idempotent_subset() {
        let table = sample_table();
        let spec = FilterSpec {
            category: Selection::any_of(["Footwear".to_string(), "Clothing".to_string()]),
            season: Selection::any_of([Season::Fall, Season::Winter, Season::Summer]),
            age: Some(AgeRange::new(20, 60)),
            ..Default::default()
        };

        let once = apply_filters(&table, &spec);
        let twice = apply_filters(&once, &spec);
        assert_eq!(once, twice);
        assert!(once.iter().all(|r| table.records().contains(r)));
        assert_eq!(once.len(), 4);
    }

    #[test]
    fn test_source_is_not_modified() {
        let table = sample_table();
        let before = table.clone();
        let spec = FilterSpec {
            season: Selection::one(Season::Winter),
            ..Default::default()
        };
        let _ = apply_filters(&table, &spec);
        assert_eq!(table, before);
    }
}
