//! Dashboard pages.
//!
//! Each page is a pure function of the loaded [`Table`] and its options and
//! produces a [`PageView`]. Pages never fail: anything that cannot be
//! computed for the current selection becomes a notice in the view.

pub mod insights;
pub mod overview;
pub mod visualizations;

pub use insights::{build_insights, DistributionPlot, InsightOptions, StatisticalAnalysis};
pub use overview::{build_overview, OverviewOptions};
pub use visualizations::{
    build_visualizations, CategoryMetric, PurchaseChart, SeasonalMetric, VisualizationOptions,
};

use crate::models::Table;
use crate::view::{DerivedTable, PageView};
use std::fmt;
use tracing::debug;

/// Shown in place of content when active filters match no rows.
pub const NO_MATCH_MESSAGE: &str = "No data matches your filters. Please adjust your selection.";

/// The pages of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Overview,
    Visualizations,
    Insights,
}

impl Page {
    pub const ALL: [Page; 3] = [Page::Overview, Page::Visualizations, Page::Insights];
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Page::Overview => write!(f, "Overview"),
            Page::Visualizations => write!(f, "Visualizations"),
            Page::Insights => write!(f, "Advanced Insights"),
        }
    }
}

/// Widget state for every page.
#[derive(Debug, Clone, Default)]
pub struct PageOptions {
    pub overview: OverviewOptions,
    pub visualizations: VisualizationOptions,
    pub insights: InsightOptions,
}

/// Builds one page.
pub fn build_page(page: Page, table: &Table, options: &PageOptions) -> PageView {
    debug!("Building page: {}", page);
    match page {
        Page::Overview => build_overview(table, &options.overview),
        Page::Visualizations => build_visualizations(table, &options.visualizations),
        Page::Insights => build_insights(table, &options.insights),
    }
}

/// Builds several pages over the same table, in the given order.
pub fn build_pages(pages: &[Page], table: &Table, options: &PageOptions) -> Vec<PageView> {
    pages
        .iter()
        .map(|page| build_page(*page, table, options))
        .collect()
}

fn currency(value: f64) -> String {
    format!("${:.2}", value)
}

/// Replaces the header of the last (value) column.
fn rename_value_column(mut table: DerivedTable, name: &str) -> DerivedTable {
    if let Some(last) = table.columns.last_mut() {
        *last = name.to_string();
    }
    table
}

/// Drops repeated headers, keeping first occurrences.
fn unique_headers<'a>(headers: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
    let mut unique: Vec<&str> = Vec::new();
    for header in headers {
        if !unique.contains(&header) {
            unique.push(header);
        }
    }
    unique
}


#[cfg(test)]
mod tests {
    use super::testing::fixture_table;
    use super::*;

    #[test]
    fn test_build_pages_keeps_order() {
        let table = fixture_table();
        let views = build_pages(
            &[Page::Insights, Page::Overview],
            &table,
            &PageOptions::default(),
        );

        assert_eq!(views.len(), 2);
        assert_eq!(views[0].title, "Advanced Data Insights");
        assert_eq!(views[1].title, "Shopping Trends Overview");
    }

    #[test]
    fn test_unique_headers() {
        assert_eq!(
            unique_headers(["Age", "Category", "Age", "Gender"]),
            vec!["Age", "Category", "Gender"]
        );
    }
}
