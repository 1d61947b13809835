//! Overview page: headline metrics and a filtered preview of the dataset.

use super::{currency, NO_MATCH_MESSAGE};
use crate::analysis::{apply_filters, FilterSpec, Selection};
use crate::models::{CategoricalColumn, Gender, NumericColumn, Season, Table};
use crate::view::{DerivedTable, Metric, PageView, Section};

pub const DEFAULT_PREVIEW_ROWS: usize = 20;

/// Single-select filters; `None` is "All".
#[derive(Debug, Clone)]
pub struct OverviewOptions {
    pub gender: Option<Gender>,
    pub category: Option<String>,
    pub season: Option<Season>,
    /// Maximum rows in the dataset preview.
    pub preview_rows: usize,
}

impl Default for OverviewOptions {
    fn default() -> Self {
        Self {
            gender: None,
            category: None,
            season: None,
            preview_rows: DEFAULT_PREVIEW_ROWS,
        }
    }
}

impl OverviewOptions {
    pub fn filters(&self) -> FilterSpec {
        FilterSpec {
            gender: self.gender.map_or(Selection::All, Selection::one),
            category: self
                .category
                .clone()
                .map_or(Selection::All, Selection::one),
            season: self.season.map_or(Selection::All, Selection::one),
            age: None,
        }
    }
}

pub fn build_overview(table: &Table, options: &OverviewOptions) -> PageView {
    let mut page = PageView::new(
        "Shopping Trends Overview",
        "Explore key insights from shopping trends data.",
    );

    let mut summary = Section::new("Dataset Summary");
    summary.metrics(vec![
        Metric::new("Total Records", table.len().to_string()),
        Metric::new(
            "Total Categories",
            table.distinct(CategoricalColumn::Category).len().to_string(),
        ),
        Metric::new(
            "Avg Purchase Amount",
            table
                .mean(NumericColumn::PurchaseAmount)
                .map_or_else(|| "n/a".to_string(), currency),
        ),
        Metric::new(
            "Avg Rating",
            table
                .mean(NumericColumn::ReviewRating)
                .map_or_else(|| "n/a".to_string(), |v| format!("{:.2}", v)),
        ),
    ]);
    page.push(summary);

    let filters = options.filters();
    let filtered = apply_filters(table, &filters);
    if !filters.is_unconstrained() {
        page.filtered_rows = Some(filtered.len());
    }

    let mut dataset = Section::new("Filter Dataset");
    dataset.text(format!(
        "Filters: Gender = {}, Category = {}, Season = {}",
        choice(options.gender.as_ref()),
        choice(options.category.as_ref()),
        choice(options.season.as_ref()),
    ));
    dataset.text(format!(
        "Showing {} of {} records",
        filtered.len(),
        table.len()
    ));

    if filtered.is_empty() {
        dataset.warning(NO_MATCH_MESSAGE);
    } else {
        let preview = DerivedTable::preview(&filtered, options.preview_rows);
        let caption = if preview.len() < filtered.len() {
            format!("Dataset (first {} rows)", preview.len())
        } else {
            "Dataset".to_string()
        };
        dataset.table(caption, preview);
    }
    page.push(dataset);

    page
}

fn choice<T: ToString>(value: Option<&T>) -> String {
    value.map_or_else(|| "All".to_string(), T::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::testing::fixture_table;
    use crate::view::{Block, NoticeLevel};

    #[test]
    fn test_unfiltered_overview() {
        let table = fixture_table();
        let page = build_overview(&table, &OverviewOptions::default());

        assert_eq!(page.filtered_rows, None);
        let summary = page.section("Dataset Summary").unwrap();
        match &summary.blocks[0] {
            Block::Metrics { items } => {
                assert_eq!(items[0], Metric::new("Total Records", "100"));
                assert_eq!(items[1], Metric::new("Total Categories", "4"));
            }
            other => panic!("expected metrics, got {:?}", other),
        }
    }

    #[test]
    fn test_female_filter_counts_exactly() {
        let table = fixture_table();
        let options = OverviewOptions {
            gender: Some(Gender::Female),
            ..Default::default()
        };
        let page = build_overview(&table, &options);

        assert_eq!(page.filtered_rows, Some(52));
        let dataset = page.section("Filter Dataset").unwrap();
        assert!(dataset
            .blocks
            .contains(&Block::Text {
                text: "Showing 52 of 100 records".to_string()
            }));
        match dataset.blocks.last() {
            Some(Block::Table { table, .. }) => assert_eq!(table.len(), DEFAULT_PREVIEW_ROWS),
            other => panic!("expected preview table, got {:?}", other),
        }
    }

    #[test]
    fn test_combined_filters() {
        let table = fixture_table();
        let options = OverviewOptions {
            gender: Some(Gender::Female),
            category: Some("Clothing".to_string()),
            preview_rows: 100,
            ..Default::default()
        };
        let page = build_overview(&table, &options);
        assert_eq!(page.filtered_rows, Some(19));
    }

    #[test]
    fn test_no_match_emits_warning() {
        let table = fixture_table();
        let options = OverviewOptions {
            category: Some("Electronics".to_string()),
            ..Default::default()
        };
        let page = build_overview(&table, &options);

        assert!(page.is_empty_result());
        let notices: Vec<_> = page.notices().collect();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Warning);
        assert!(!page
            .section("Filter Dataset")
            .unwrap()
            .blocks
            .iter()
            .any(|b| matches!(b, Block::Table { .. })));
    }
}
