//! Visualizations page: charts over a sidebar-filtered subset.

use super::{rename_value_column, unique_headers, NO_MATCH_MESSAGE};
use crate::analysis::{
    aggregate, aggregate_by, apply_filters, describe_by, top_groups, AgeRange, AggFn, FilterSpec,
    GroupBy, Selection,
};
use crate::models::{normalize_key, CategoricalColumn, Gender, NumericColumn, Table};
use crate::view::{BarMode, Cell, ChartKind, ChartSpec, DerivedTable, PageView, Section};
use serde::Serialize;
use std::str::FromStr;

pub const DEFAULT_CATEGORY_COUNT: usize = 5;
pub const DEFAULT_TOP_CATEGORIES: usize = 5;

/// Chart used for the purchase amount analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum PurchaseChart {
    #[default]
    Bar,
    Box,
    Violin,
}

impl FromStr for PurchaseChart {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_key(s).as_str() {
            "bar" | "bar-chart" => Ok(PurchaseChart::Bar),
            "box" | "box-plot" => Ok(PurchaseChart::Box),
            "violin" | "violin-plot" => Ok(PurchaseChart::Violin),
            _ => Err(format!("unknown chart '{}' (expected bar, box or violin)", s)),
        }
    }
}

/// Measure shown per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum CategoryMetric {
    /// Sum of purchase amounts.
    #[default]
    TotalPurchase,
    AverageRating,
    AveragePreviousPurchases,
}

impl CategoryMetric {
    fn column(&self) -> NumericColumn {
        match self {
            CategoryMetric::TotalPurchase => NumericColumn::PurchaseAmount,
            CategoryMetric::AverageRating => NumericColumn::ReviewRating,
            CategoryMetric::AveragePreviousPurchases => NumericColumn::PreviousPurchases,
        }
    }

    fn func(&self) -> AggFn {
        match self {
            CategoryMetric::TotalPurchase => AggFn::Sum,
            _ => AggFn::Mean,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            CategoryMetric::TotalPurchase => "Total Purchase Amount",
            CategoryMetric::AverageRating => "Average Rating",
            CategoryMetric::AveragePreviousPurchases => "Average Previous Purchases",
        }
    }

    fn title(&self) -> &'static str {
        match self {
            CategoryMetric::TotalPurchase => "Total Purchase Amount by Category",
            CategoryMetric::AverageRating => "Average Review Rating by Category",
            CategoryMetric::AveragePreviousPurchases => "Average Previous Purchases by Category",
        }
    }
}

impl FromStr for CategoryMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_key(s).as_str() {
            "purchase-amount" | "purchase" | "total-purchase" => Ok(CategoryMetric::TotalPurchase),
            "review-rating" | "rating" => Ok(CategoryMetric::AverageRating),
            "previous-purchases" => Ok(CategoryMetric::AveragePreviousPurchases),
            _ => Err(format!(
                "unknown category metric '{}' (expected purchase-amount, review-rating or previous-purchases)",
                s
            )),
        }
    }
}

/// Measure shown per season and gender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SeasonalMetric {
    #[default]
    PurchaseAmount,
    ReviewRating,
    ItemCount,
}

impl FromStr for SeasonalMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_key(s).as_str() {
            "purchase-amount" | "purchase" => Ok(SeasonalMetric::PurchaseAmount),
            "review-rating" | "rating" => Ok(SeasonalMetric::ReviewRating),
            "item-count" | "count" => Ok(SeasonalMetric::ItemCount),
            _ => Err(format!(
                "unknown seasonal metric '{}' (expected purchase-amount, review-rating or item-count)",
                s
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct VisualizationOptions {
    /// Selected categories; `None` selects the first
    /// `default_category_count` categories in order of appearance.
    pub categories: Option<Vec<String>>,
    /// Selected genders; `None` selects all.
    pub genders: Option<Vec<Gender>>,
    /// Inclusive age bounds; a missing bound is the observed extreme.
    pub age_min: Option<u32>,
    pub age_max: Option<u32>,
    pub chart: PurchaseChart,
    pub group_by: CategoricalColumn,
    pub color_by: CategoricalColumn,
    pub size_by: NumericColumn,
    pub category_metric: CategoryMetric,
    pub seasonal_metric: SeasonalMetric,
    pub default_category_count: usize,
    pub top_categories: usize,
}

impl Default for VisualizationOptions {
    fn default() -> Self {
        Self {
            categories: None,
            genders: None,
            age_min: None,
            age_max: None,
            chart: PurchaseChart::default(),
            group_by: CategoricalColumn::Category,
            color_by: CategoricalColumn::Gender,
            size_by: NumericColumn::PurchaseAmount,
            category_metric: CategoryMetric::default(),
            seasonal_metric: SeasonalMetric::default(),
            default_category_count: DEFAULT_CATEGORY_COUNT,
            top_categories: DEFAULT_TOP_CATEGORIES,
        }
    }
}

impl VisualizationOptions {
    /// Resolves the sidebar widgets against the values present in `table`.
    pub fn filters(&self, table: &Table) -> FilterSpec {
        let category = match &self.categories {
            Some(selected) => Selection::any_of(selected.iter().cloned()),
            None => Selection::any_of(
                table
                    .distinct(CategoricalColumn::Category)
                    .into_iter()
                    .take(self.default_category_count),
            ),
        };

        let gender = match &self.genders {
            Some(selected) => Selection::any_of(selected.iter().copied()),
            None => Selection::All,
        };

        let age = match (self.age_min, self.age_max) {
            (None, None) => None,
            (min, max) => {
                let (lo, hi) = table.min_max(NumericColumn::Age).unwrap_or((0.0, 0.0));
                Some(AgeRange::new(
                    min.unwrap_or(lo as u32),
                    max.unwrap_or(hi as u32),
                ))
            }
        };

        FilterSpec {
            gender,
            category,
            season: Selection::All,
            age,
        }
    }
}

pub fn build_visualizations(table: &Table, options: &VisualizationOptions) -> PageView {
    let mut page = PageView::new(
        "Interactive Data Visualizations",
        "Explore shopping trends through interactive charts and filters.",
    );

    let filters = options.filters(table);
    let data = apply_filters(table, &filters);
    if !filters.is_unconstrained() {
        page.filtered_rows = Some(data.len());
    }

    let mut selection = Section::new("Visualization Filters");
    if data.is_empty() {
        selection.warning(NO_MATCH_MESSAGE);
        page.push(selection);
        return page;
    }
    selection.text(format!("Displaying data for {} records", data.len()));
    page.push(selection);

    page.push(purchase_section(&data, options));
    page.push(scatter_section(&data, options));
    page.push(category_section(&data, options));
    page.push(seasonal_section(&data, options));
    page.push(summary_section(&data, options));
    page
}

fn purchase_section(data: &Table, options: &VisualizationOptions) -> Section {
    let group = options.group_by;
    let amount = NumericColumn::PurchaseAmount;
    let mut section = Section::new("Purchase Amount Analysis");

    let kind = match options.chart {
        PurchaseChart::Bar => {
            let means = aggregate(data, GroupBy::Column(group), amount, AggFn::Mean);
            let chart = ChartSpec::new(
                ChartKind::Bar,
                format!("Average Purchase Amount by {}", group),
                rename_value_column(DerivedTable::from_aggregation(&means), amount.header()),
            )
            .x(group.header())
            .y(amount.header())
            .color(group.header());
            section.chart(chart);
            return section;
        }
        PurchaseChart::Box => ChartKind::Box,
        PurchaseChart::Violin => ChartKind::Violin,
    };

    let raw = DerivedTable::from_records(data, data, &[group.header(), amount.header()]);
    section.chart(
        ChartSpec::new(kind, format!("Purchase Amount Distribution by {}", group), raw)
            .x(group.header())
            .y(amount.header())
            .color(group.header()),
    );

    let mut summary = DerivedTable::new(
        [group.header(), "count", "min", "25%", "50%", "75%", "max"]
            .iter()
            .map(|c| c.to_string())
            .collect(),
    );
    for (label, stats) in describe_by(data, group, amount) {
        summary.push(vec![
            Cell::from(label),
            Cell::from(stats.count),
            Cell::from(stats.min),
            Cell::from(stats.q1),
            Cell::from(stats.median),
            Cell::from(stats.q3),
            Cell::from(stats.max),
        ]);
    }
    section.table(format!("Purchase Amount Distribution by {}", group), summary);
    section
}

fn scatter_section(data: &Table, options: &VisualizationOptions) -> Section {
    let hover = ["Category", "Season", "Review Rating"];
    let headers = unique_headers(
        ["Age", NumericColumn::PurchaseAmount.header()]
            .into_iter()
            .chain([options.color_by.header(), options.size_by.header()])
            .chain(hover),
    );

    let mut section = Section::new("Age and Purchase Patterns");
    section.chart(
        ChartSpec::new(
            ChartKind::Scatter,
            "Age vs Purchase Amount",
            DerivedTable::from_records(data, data, &headers),
        )
        .x("Age")
        .y(NumericColumn::PurchaseAmount.header())
        .color(options.color_by.header())
        .size(options.size_by.header())
        .hover(&hover),
    );
    section
}

fn category_section(data: &Table, options: &VisualizationOptions) -> Section {
    let metric = options.category_metric;
    let by_category = GroupBy::Column(CategoricalColumn::Category);
    let selected = aggregate(data, by_category, metric.column(), metric.func());

    let mut section = Section::new("Category Performance");
    section.chart(
        ChartSpec::new(
            ChartKind::Bar,
            metric.title(),
            rename_value_column(DerivedTable::from_aggregation(&selected), metric.label()),
        )
        .x("Category")
        .y(metric.label()),
    );

    let amount = NumericColumn::PurchaseAmount;
    let totals = aggregate(data, by_category, amount, AggFn::Sum);
    let means = aggregate(data, by_category, amount, AggFn::Mean);
    let ratings = aggregate(data, by_category, NumericColumn::ReviewRating, AggFn::Mean);
    let previous = aggregate(data, by_category, NumericColumn::PreviousPurchases, AggFn::Mean);

    let mut breakdown = DerivedTable::new(
        [
            "Category",
            "Total Purchase",
            "Avg Purchase",
            "Count",
            "Avg Rating",
            "Avg Previous Purchases",
        ]
        .iter()
        .map(|c| c.to_string())
        .collect(),
    );
    for (((total, mean), rating), prev) in totals
        .rows
        .iter()
        .zip(&means.rows)
        .zip(&ratings.rows)
        .zip(&previous.rows)
    {
        breakdown.push(vec![
            Cell::from(total.keys[0].as_str()),
            Cell::from(total.value),
            Cell::from(mean.value),
            Cell::from(total.rows),
            Cell::from(rating.value),
            Cell::from(prev.value),
        ]);
    }
    section.table("Category breakdown", breakdown);
    section
}

fn seasonal_section(data: &Table, options: &VisualizationOptions) -> Section {
    let groups = [
        GroupBy::Column(CategoricalColumn::Season),
        GroupBy::Column(CategoricalColumn::Gender),
    ];
    let mut section = Section::new("Seasonal Analysis");

    let chart = match options.seasonal_metric {
        SeasonalMetric::ItemCount => {
            let counts = aggregate_by(data, &groups, NumericColumn::PurchaseAmount, AggFn::Count);
            ChartSpec::new(
                ChartKind::Bar,
                "Number of Purchases by Season and Gender",
                DerivedTable::from_aggregation(&counts),
            )
            .x("Season")
            .y("Count")
            .color("Gender")
            .bar_mode(BarMode::Group)
        }
        metric => {
            let column = match metric {
                SeasonalMetric::ReviewRating => NumericColumn::ReviewRating,
                _ => NumericColumn::PurchaseAmount,
            };
            let means = aggregate_by(data, &groups, column, AggFn::Mean);
            ChartSpec::new(
                ChartKind::Line,
                format!("Average {} by Season and Gender", column),
                rename_value_column(DerivedTable::from_aggregation(&means), column.header()),
            )
            .x("Season")
            .y(column.header())
            .color("Gender")
        }
    };

    section.chart(chart);
    section
}

fn summary_section(data: &Table, options: &VisualizationOptions) -> Section {
    let amount = NumericColumn::PurchaseAmount;
    let mut section = Section::new("Summary Statistics");

    let totals = aggregate(data, GroupBy::Column(CategoricalColumn::Category), amount, AggFn::Sum);
    let mut top = DerivedTable::new(vec!["Category".to_string(), amount.header().to_string()]);
    for row in top_groups(&totals, options.top_categories) {
        top.push(vec![Cell::from(row.keys[0].as_str()), Cell::from(row.value)]);
    }
    section.table(
        format!("Top {} Categories by Purchase Volume", options.top_categories),
        top,
    );

    let by_gender = GroupBy::Column(CategoricalColumn::Gender);
    let means = aggregate(data, by_gender, amount, AggFn::Mean);
    let sums = aggregate(data, by_gender, amount, AggFn::Sum);
    let mut genders = DerivedTable::new(
        ["Gender", "count", "mean", "sum"]
            .iter()
            .map(|c| c.to_string())
            .collect(),
    );
    for (mean, sum) in means.rows.iter().zip(&sums.rows) {
        genders.push(vec![
            Cell::from(mean.keys[0].as_str()),
            Cell::from(mean.rows),
            Cell::from(mean.value),
            Cell::from(sum.value),
        ]);
    }
    section.table("Purchase Distribution by Gender", genders);
    section
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::testing::fixture_table;
    use crate::view::NoticeLevel;

    #[test]
    fn test_default_filters_select_first_categories() {
        let table = fixture_table();
        let options = VisualizationOptions {
            default_category_count: 2,
            ..Default::default()
        };
        let filters = options.filters(&table);

        assert_eq!(
            filters.category,
            Selection::any_of(["Clothing".to_string(), "Footwear".to_string()])
        );
        assert_eq!(filters.gender, Selection::All);
        assert_eq!(filters.age, None);
    }

    #[test]
    fn test_single_age_bound_uses_observed_extreme() {
        let table = fixture_table();
        let options = VisualizationOptions {
            age_min: Some(30),
            ..Default::default()
        };
        assert_eq!(options.filters(&table).age, Some(AgeRange::new(30, 70)));
    }

    #[test]
    fn test_empty_gender_selection_emits_notice_only() {
        let table = fixture_table();
        let options = VisualizationOptions {
            genders: Some(vec![]),
            ..Default::default()
        };
        let page = build_visualizations(&table, &options);

        assert_eq!(page.filtered_rows, Some(0));
        assert!(page.is_empty_result());
        assert_eq!(page.charts().count(), 0);
        let notices: Vec<_> = page.notices().collect();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Warning);
        assert_eq!(notices[0].message, NO_MATCH_MESSAGE);
    }

    #[test]
    fn test_default_page_covers_all_rows() {
        let table = fixture_table();
        let page = build_visualizations(&table, &VisualizationOptions::default());

        // The fixture has four categories, all inside the default selection.
        assert_eq!(page.filtered_rows, Some(100));
        assert_eq!(page.charts().count(), 4);
        assert_eq!(page.notices().count(), 0);
    }

    #[test]
    fn test_mean_by_category_has_one_row_per_category() {
        let table = fixture_table();
        let page = build_visualizations(&table, &VisualizationOptions::default());

        let chart = page
            .section("Purchase Amount Analysis")
            .and_then(|s| s.charts().next())
            .unwrap();
        assert_eq!(chart.kind, ChartKind::Bar);
        let labels: Vec<String> = chart.data.rows.iter().map(|r| r[0].to_string()).collect();
        assert_eq!(labels, vec!["Accessories", "Clothing", "Footwear", "Outerwear"]);
    }

    #[test]
    fn test_item_count_is_grouped_bar() {
        let table = fixture_table();
        let options = VisualizationOptions {
            seasonal_metric: SeasonalMetric::ItemCount,
            ..Default::default()
        };
        let page = build_visualizations(&table, &options);

        let chart = page
            .section("Seasonal Analysis")
            .and_then(|s| s.charts().next())
            .unwrap();
        assert_eq!(chart.bar_mode, Some(BarMode::Group));
        let total: f64 = chart
            .data
            .rows
            .iter()
            .map(|r| match &r[2] {
                Cell::Number(n) => *n,
                _ => 0.0,
            })
            .sum();
        assert_eq!(total, 100.0);
    }

    #[test]
    fn test_box_chart_carries_raw_values() {
        let table = fixture_table();
        let options = VisualizationOptions {
            chart: PurchaseChart::Box,
            genders: Some(vec![Gender::Male]),
            ..Default::default()
        };
        let page = build_visualizations(&table, &options);

        let section = page.section("Purchase Amount Analysis").unwrap();
        let chart = section.charts().next().unwrap();
        assert_eq!(chart.kind, ChartKind::Box);
        assert_eq!(chart.data.len(), 48);
    }

    #[test]
    fn test_widget_parsing() {
        assert_eq!("violin-plot".parse::<PurchaseChart>(), Ok(PurchaseChart::Violin));
        assert_eq!("Item Count".parse::<SeasonalMetric>(), Ok(SeasonalMetric::ItemCount));
        assert_eq!(
            "Review Rating".parse::<CategoryMetric>(),
            Ok(CategoryMetric::AverageRating)
        );
        assert!("pie".parse::<PurchaseChart>().is_err());
    }
}
