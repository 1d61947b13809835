//! Advanced insights page: correlation, segmentation and statistics over the
//! full dataset.

use super::{currency, rename_value_column, unique_headers};
use crate::analysis::{
    aggregate, bin_into_segments, correlation_matrix, describe, describe_by, detect_outliers,
    histogram, top_group, value_counts, AggFn, CorrelationMatrix, CorrelationMethod, GroupBy,
    SegmentPreset, Summary,
};
use crate::models::{normalize_key, CategoricalColumn, NumericColumn, Table};
use crate::view::{Cell, ChartKind, ChartSpec, DerivedTable, Metric, PageView, Section};
use serde::Serialize;
use std::str::FromStr;
use tracing::debug;

pub const DEFAULT_TOP_CORRELATIONS: usize = 3;
pub const DEFAULT_HISTOGRAM_BINS: usize = 30;
pub const DEFAULT_OUTLIER_PREVIEW_ROWS: usize = 10;

const SUMMARY_COLUMNS: [&str; 8] = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum StatisticalAnalysis {
    #[default]
    Descriptive,
    Distribution,
    Outliers,
}

impl FromStr for StatisticalAnalysis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_key(s).as_str() {
            "descriptive" | "descriptive-statistics" => Ok(StatisticalAnalysis::Descriptive),
            "distribution" | "distribution-analysis" => Ok(StatisticalAnalysis::Distribution),
            "outliers" | "outlier-detection" => Ok(StatisticalAnalysis::Outliers),
            _ => Err(format!(
                "unknown analysis '{}' (expected descriptive, distribution or outliers)",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum DistributionPlot {
    #[default]
    Histogram,
    Box,
    Violin,
}

impl FromStr for DistributionPlot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_key(s).as_str() {
            "histogram" => Ok(DistributionPlot::Histogram),
            "box" | "box-plot" => Ok(DistributionPlot::Box),
            "violin" | "violin-plot" => Ok(DistributionPlot::Violin),
            _ => Err(format!(
                "unknown plot '{}' (expected histogram, box or violin)",
                s
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InsightOptions {
    pub corr_columns: Vec<NumericColumn>,
    pub corr_method: CorrelationMethod,
    pub segment_by: SegmentPreset,
    pub analysis: StatisticalAnalysis,
    /// Column examined by the statistical analysis.
    pub variable: NumericColumn,
    pub stats_group_by: Option<CategoricalColumn>,
    pub distribution_plot: DistributionPlot,
    pub top_k_correlations: usize,
    pub histogram_bins: usize,
    pub outlier_preview_rows: usize,
}

impl Default for InsightOptions {
    fn default() -> Self {
        Self {
            corr_columns: NumericColumn::ALL.to_vec(),
            corr_method: CorrelationMethod::default(),
            segment_by: SegmentPreset::PurchaseAmount,
            analysis: StatisticalAnalysis::default(),
            variable: NumericColumn::Age,
            stats_group_by: None,
            distribution_plot: DistributionPlot::default(),
            top_k_correlations: DEFAULT_TOP_CORRELATIONS,
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
            outlier_preview_rows: DEFAULT_OUTLIER_PREVIEW_ROWS,
        }
    }
}

pub fn build_insights(table: &Table, options: &InsightOptions) -> PageView {
    let mut page = PageView::new(
        "Advanced Data Insights",
        "Deep dive into shopping patterns with advanced analytics and statistical insights.",
    );

    if table.is_empty() {
        let mut section = Section::new("Dataset");
        section.warning("The dataset has no rows to analyze.");
        page.push(section);
        return page;
    }

    page.push(correlation_section(table, options));
    page.push(segmentation_section(table, options));
    page.push(statistics_section(table, options));
    page.push(key_insights_section(table));
    page
}

fn correlation_section(table: &Table, options: &InsightOptions) -> Section {
    let mut section = Section::new("Correlation Analysis");

    let matrix = match correlation_matrix(table, &options.corr_columns, options.corr_method) {
        Ok(matrix) => matrix,
        Err(err) => {
            debug!("Correlation skipped: {}", err);
            section.info("Select at least two variables to see correlations.");
            return section;
        }
    };

    section.chart(
        ChartSpec::new(
            ChartKind::Heatmap,
            format!("{} Correlation Matrix", matrix.method),
            matrix_table(&matrix),
        )
        .x("Variable"),
    );

    let pairs = matrix.strongest_pairs(options.top_k_correlations);
    if pairs.is_empty() {
        if matrix.strongest_pairs(1).is_empty() {
            section.info("No correlation is defined: the selected variables have no variance.");
        }
        return section;
    }

    let mut strongest = DerivedTable::new(vec!["Variables".to_string(), "Correlation".to_string()]);
    for pair in pairs {
        strongest.push(vec![
            Cell::from(format!("{} ↔ {}", pair.first, pair.second)),
            Cell::from(format!("{:.3}", pair.coefficient)),
        ]);
    }
    section.table("Strongest Correlations", strongest);
    section
}

fn matrix_table(matrix: &CorrelationMatrix) -> DerivedTable {
    let mut data = DerivedTable::new(
        std::iter::once("Variable".to_string())
            .chain(matrix.columns.iter().map(|c| c.header().to_string()))
            .collect(),
    );
    for (column, values) in matrix.columns.iter().zip(&matrix.values) {
        data.push(
            std::iter::once(Cell::from(column.header()))
                .chain(values.iter().map(|v| Cell::from(*v)))
                .collect(),
        );
    }
    data
}

fn segmentation_section(table: &Table, options: &InsightOptions) -> Section {
    let preset = options.segment_by;
    let mut section = Section::new("Customer Segmentation");

    let segments = match bin_into_segments(table, preset.column(), &preset.bin_spec()) {
        Ok(segments) => segments,
        Err(err) => {
            section.info(format!("Cannot segment customers by {}: {}", preset, err));
            return section;
        }
    };

    let outside = segments.unassigned();
    if outside > 0 {
        section.info(format!(
            "{} records fall outside every {} segment and are not counted.",
            outside, preset
        ));
    }

    let group = GroupBy::Segment(&segments);
    let amount = NumericColumn::PurchaseAmount;
    let purchases = aggregate(table, group, amount, AggFn::Mean);
    let ratings = aggregate(table, group, NumericColumn::ReviewRating, AggFn::Mean);
    let ages = aggregate(table, group, NumericColumn::Age, AggFn::Mean);

    let mut summary = DerivedTable::new(
        [
            "Segment",
            "Count",
            "Avg Purchase Amount",
            "Avg Review Rating",
            "Avg Age",
        ]
        .iter()
        .map(|c| c.to_string())
        .collect(),
    );
    for ((purchase, rating), age) in purchases.rows.iter().zip(&ratings.rows).zip(&ages.rows) {
        summary.push(vec![
            Cell::from(purchase.keys[0].as_str()),
            Cell::from(purchase.rows),
            Cell::from(purchase.value),
            Cell::from(rating.value),
            Cell::from(age.value),
        ]);
    }
    section.table(format!("Segments by {}", preset), summary);

    let mut sizes = DerivedTable::new(vec!["Segment".to_string(), "Count".to_string()]);
    for (label, count) in value_counts(&segments) {
        sizes.push(vec![Cell::from(label), Cell::from(count)]);
    }
    section.chart(
        ChartSpec::new(
            ChartKind::Pie,
            format!("Customer Distribution by {}", preset),
            sizes,
        )
        .x("Segment")
        .y("Count"),
    );

    section.chart(
        ChartSpec::new(
            ChartKind::Bar,
            format!("Average Purchase Amount by {}", preset),
            rename_value_column(DerivedTable::from_aggregation(&purchases), amount.header()),
        )
        .x("Segment")
        .y(amount.header()),
    );
    section
}

fn statistics_section(table: &Table, options: &InsightOptions) -> Section {
    let variable = options.variable;
    let mut section = Section::new("Statistical Analysis");

    match options.analysis {
        StatisticalAnalysis::Descriptive => {
            let (first, summaries): (&str, Vec<(String, Summary)>) = match options.stats_group_by {
                Some(group) => (
                    group.header(),
                    describe_by(table, group, variable).into_iter().collect(),
                ),
                None => (
                    "Variable",
                    describe(&table.numeric(variable))
                        .map(|s| (variable.header().to_string(), s))
                        .into_iter()
                        .collect(),
                ),
            };
            section.table(
                format!("Key Statistics Summary: {}", variable),
                summary_table(first, &summaries),
            );
        }
        StatisticalAnalysis::Distribution => {
            let chart = match options.distribution_plot {
                DistributionPlot::Histogram => {
                    let mut bins = DerivedTable::new(
                        ["Bin Start", "Bin End", "Count"]
                            .iter()
                            .map(|c| c.to_string())
                            .collect(),
                    );
                    for bin in histogram(&table.numeric(variable), options.histogram_bins) {
                        bins.push(vec![
                            Cell::from(bin.start),
                            Cell::from(bin.end),
                            Cell::from(bin.count),
                        ]);
                    }
                    ChartSpec::new(
                        ChartKind::Histogram,
                        format!("Distribution of {}", variable),
                        bins,
                    )
                    .x("Bin Start")
                    .y("Count")
                }
                DistributionPlot::Box => raw_chart(table, variable, ChartKind::Box, "Box Plot of"),
                DistributionPlot::Violin => {
                    raw_chart(table, variable, ChartKind::Violin, "Violin Plot of")
                }
            };
            section.chart(chart);
        }
        StatisticalAnalysis::Outliers => {
            let Some(report) = detect_outliers(table, variable) else {
                section.info(format!("No values of {} to examine.", variable));
                return section;
            };
            let bounds = report.bounds;

            section.metrics(vec![
                Metric::new("Total Records", report.total.to_string()),
                Metric::new("Outliers Found", report.outliers.len().to_string()),
                Metric::new("Outlier %", format!("{:.1}%", report.percentage())),
            ]);
            section.text(format!(
                "Q1 = {:.2}, Q3 = {:.2}, IQR = {:.2}; values below {:.2} or above {:.2} are outliers.",
                bounds.q1, bounds.q3, bounds.iqr, bounds.lower, bounds.upper
            ));
            section.chart(
                raw_chart(table, variable, ChartKind::Box, "Outlier Detection for")
                    .reference_line(bounds.lower, "Lower Bound")
                    .reference_line(bounds.upper, "Upper Bound"),
            );

            if !report.outliers.is_empty() {
                let headers = unique_headers([variable.header(), "Category", "Gender", "Age"]);
                section.table(
                    "Outlier Records",
                    DerivedTable::from_records(
                        table,
                        report.outliers.iter().take(options.outlier_preview_rows),
                        &headers,
                    ),
                );
            }
        }
    }

    section
}

fn raw_chart(table: &Table, variable: NumericColumn, kind: ChartKind, title: &str) -> ChartSpec {
    ChartSpec::new(
        kind,
        format!("{} {}", title, variable),
        DerivedTable::from_records(table, table, &[variable.header()]),
    )
    .y(variable.header())
}

fn summary_table(first: &str, summaries: &[(String, Summary)]) -> DerivedTable {
    let mut table = DerivedTable::new(
        std::iter::once(first)
            .chain(SUMMARY_COLUMNS)
            .map(|c| c.to_string())
            .collect(),
    );
    for (label, s) in summaries {
        table.push(vec![
            Cell::from(label.as_str()),
            Cell::from(s.count),
            Cell::from(s.mean),
            Cell::from(s.std),
            Cell::from(s.min),
            Cell::from(s.q1),
            Cell::from(s.median),
            Cell::from(s.q3),
            Cell::from(s.max),
        ]);
    }
    table
}

fn key_insights_section(table: &Table) -> Section {
    let amount = NumericColumn::PurchaseAmount;
    let leader = |column: CategoricalColumn| {
        let totals = aggregate(table, GroupBy::Column(column), amount, AggFn::Sum);
        top_group(&totals)
            .map(|row| row.keys[0].clone())
            .unwrap_or_default()
    };

    let mut items = Vec::new();
    if let Some(avg) = table.mean(amount) {
        items.push(format!("💰 Average purchase amount is {}", currency(avg)));
    }
    items.push(format!(
        "🏆 Top performing category: {}",
        leader(CategoricalColumn::Category)
    ));
    items.push(format!(
        "👤 {} customers generate higher total revenue",
        leader(CategoricalColumn::Gender)
    ));
    items.push(format!(
        "🌟 {} is the peak shopping season",
        leader(CategoricalColumn::Season)
    ));
    if let Some(rating) = table.mean(NumericColumn::ReviewRating) {
        items.push(format!("📊 {:.2} average customer satisfaction rating", rating));
    }

    let mut section = Section::new("Key Insights");
    section.bullets(items);
    section
}
