//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values. Widget flags mirror the
//! dashboard's selectors and are turned into page options here.

use crate::analysis::{CorrelationMethod, SegmentPreset};
use crate::config::ViewConfig;
use crate::models::{CategoricalColumn, Gender, NumericColumn, Season};
use crate::pages::{
    CategoryMetric, DistributionPlot, InsightOptions, OverviewOptions, Page, PageOptions,
    PurchaseChart, SeasonalMetric, StatisticalAnalysis, VisualizationOptions,
};
use clap::Parser;
use std::path::PathBuf;

/// shoptrends - shopping trends analytics from the command line
///
/// Load a shopping transactions spreadsheet, filter, segment and aggregate
/// it, and write the dashboard pages as a Markdown or JSON report.
///
/// Examples:
///   shoptrends --data data/shopping_trends.xlsx
///   shoptrends --data trends.csv --page overview --gender female --season winter
///   shoptrends --data trends.csv --page visualizations --genders male --categories Clothing,Footwear
///   shoptrends --data trends.csv --page insights --analysis outliers --variable purchase-amount
///   shoptrends --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Dataset file (csv, xlsx, xlsm, xlsb, xls or ods)
    ///
    /// Can also be set via SHOPTRENDS_DATA or the [data] section of .shoptrends.toml.
    #[arg(short, long, value_name = "FILE", env = "SHOPTRENDS_DATA")]
    pub data: Option<PathBuf>,

    /// Worksheet to read from a workbook (first sheet by default)
    #[arg(long, value_name = "NAME")]
    pub sheet: Option<String>,

    /// Page to build
    #[arg(short, long, value_enum, default_value = "all")]
    pub page: PageSelection,

    /// Output file path for the report
    ///
    /// Defaults to the configured output, shopping_trends_report.md.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Path to configuration file
    ///
    /// If not specified, looks for .shoptrends.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Stylesheet embedded into Markdown reports
    #[arg(long, value_name = "FILE")]
    pub stylesheet: Option<PathBuf>,

    /// Load and validate the dataset, then exit
    #[arg(long)]
    pub check: bool,

    /// Generate a default .shoptrends.toml configuration file
    #[arg(long)]
    pub init_config: bool,

    /// Exit with code 2 when an active filter matches no rows
    #[arg(long)]
    pub fail_on_empty: bool,

    // === Overview ===
    /// Gender filter (default: all)
    #[arg(long, help_heading = "Overview")]
    pub gender: Option<Gender>,

    /// Category filter (default: all)
    #[arg(long, help_heading = "Overview")]
    pub category: Option<String>,

    /// Season filter (default: all)
    #[arg(long, help_heading = "Overview")]
    pub season: Option<Season>,

    // === Visualizations ===
    /// Categories to include (comma-separated; given empty, selects none)
    #[arg(long, num_args = 0.., value_delimiter = ',', help_heading = "Visualizations")]
    pub categories: Option<Vec<String>>,

    /// Genders to include (comma-separated; given empty, selects none)
    #[arg(long, num_args = 0.., value_delimiter = ',', help_heading = "Visualizations")]
    pub genders: Option<Vec<Gender>>,

    /// Lowest age included
    #[arg(long, value_name = "AGE", help_heading = "Visualizations")]
    pub age_min: Option<u32>,

    /// Highest age included
    #[arg(long, value_name = "AGE", help_heading = "Visualizations")]
    pub age_max: Option<u32>,

    /// Purchase amount chart (bar, box, violin)
    #[arg(long, default_value = "bar", help_heading = "Visualizations")]
    pub chart: PurchaseChart,

    /// Grouping of the purchase amount chart (gender, category, season)
    #[arg(long, default_value = "category", help_heading = "Visualizations")]
    pub group_by: CategoricalColumn,

    /// Scatter plot color (gender, category, season)
    #[arg(long, default_value = "gender", help_heading = "Visualizations")]
    pub color_by: CategoricalColumn,

    /// Scatter plot marker size (purchase-amount, review-rating, previous-purchases)
    #[arg(long, default_value = "purchase-amount", help_heading = "Visualizations")]
    pub size_by: NumericColumn,

    /// Category performance metric (purchase-amount, review-rating, previous-purchases)
    #[arg(long, default_value = "purchase-amount", help_heading = "Visualizations")]
    pub category_metric: CategoryMetric,

    /// Seasonal metric (purchase-amount, review-rating, item-count)
    #[arg(long, default_value = "purchase-amount", help_heading = "Visualizations")]
    pub seasonal_metric: SeasonalMetric,

    // === Insights ===
    /// Columns to correlate (comma-separated; default: all numeric columns)
    #[arg(long, num_args = 0.., value_delimiter = ',', help_heading = "Insights")]
    pub corr_columns: Option<Vec<NumericColumn>>,

    /// Correlation method (pearson, spearman)
    #[arg(long, default_value = "pearson", help_heading = "Insights")]
    pub corr_method: CorrelationMethod,

    /// Customer segmentation (purchase-amount, age-group, review-rating, previous-purchases)
    #[arg(long, default_value = "purchase-amount", help_heading = "Insights")]
    pub segment_by: SegmentPreset,

    /// Statistical analysis (descriptive, distribution, outliers)
    #[arg(long, default_value = "descriptive", help_heading = "Insights")]
    pub analysis: StatisticalAnalysis,

    /// Variable for the statistical analysis
    #[arg(long, default_value = "age", help_heading = "Insights")]
    pub variable: NumericColumn,

    /// Grouping of descriptive statistics (gender, category, season)
    #[arg(long, help_heading = "Insights")]
    pub stats_group_by: Option<CategoricalColumn>,

    /// Distribution plot (histogram, box, violin)
    #[arg(long, default_value = "histogram", help_heading = "Insights")]
    pub distribution_plot: DistributionPlot,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

/// Pages to include in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum PageSelection {
    Overview,
    Visualizations,
    Insights,
    /// Every page (default)
    #[default]
    All,
}

impl PageSelection {
    pub fn pages(&self) -> Vec<Page> {
        match self {
            PageSelection::Overview => vec![Page::Overview],
            PageSelection::Visualizations => vec![Page::Visualizations],
            PageSelection::Insights => vec![Page::Insights],
            PageSelection::All => Page::ALL.to_vec(),
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        // Validate age range
        if let (Some(min), Some(max)) = (self.age_min, self.age_max) {
            if min > max {
                return Err(format!(
                    "--age-min ({}) must not be greater than --age-max ({})",
                    min, max
                ));
            }
        }

        // Validate the dataset path if provided
        if let Some(ref data) = self.data {
            if data.is_dir() {
                return Err(format!("Dataset path is a directory: {}", data.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `config_verbose` is `[general] verbose`; `--quiet` overrides it.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Builds the widget state of every page from the flags and view limits.
    pub fn page_options(&self, view: &ViewConfig) -> PageOptions {
        PageOptions {
            overview: OverviewOptions {
                gender: self.gender,
                category: self.category.clone(),
                season: self.season,
                preview_rows: view.preview_rows,
            },
            visualizations: VisualizationOptions {
                categories: self.categories.clone(),
                genders: self.genders.clone(),
                age_min: self.age_min,
                age_max: self.age_max,
                chart: self.chart,
                group_by: self.group_by,
                color_by: self.color_by,
                size_by: self.size_by,
                category_metric: self.category_metric,
                seasonal_metric: self.seasonal_metric,
                default_category_count: view.default_category_count,
                top_categories: view.top_categories,
            },
            insights: InsightOptions {
                corr_columns: self
                    .corr_columns
                    .clone()
                    .unwrap_or_else(|| NumericColumn::ALL.to_vec()),
                corr_method: self.corr_method,
                segment_by: self.segment_by,
                analysis: self.analysis,
                variable: self.variable,
                stats_group_by: self.stats_group_by,
                distribution_plot: self.distribution_plot,
                top_k_correlations: view.top_k_correlations,
                histogram_bins: view.histogram_bins,
                outlier_preview_rows: view.outlier_preview_rows,
            },
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    pub fn make_args() -> Args {
        Args {
            data: Some(PathBuf::from("fixtures/shopping_trends.csv")),
            sheet: None,
            page: PageSelection::All,
            output: None,
            format: OutputFormat::Markdown,
            config: None,
            verbose: false,
            quiet: false,
            stylesheet: None,
            check: false,
            init_config: false,
            fail_on_empty: false,
            gender: None,
            category: None,
            season: None,
            categories: None,
            genders: None,
            age_min: None,
            age_max: None,
            chart: PurchaseChart::Bar,
            group_by: CategoricalColumn::Category,
            color_by: CategoricalColumn::Gender,
            size_by: NumericColumn::PurchaseAmount,
            category_metric: CategoryMetric::TotalPurchase,
            seasonal_metric: SeasonalMetric::PurchaseAmount,
            corr_columns: None,
            corr_method: CorrelationMethod::Pearson,
            segment_by: SegmentPreset::PurchaseAmount,
            analysis: StatisticalAnalysis::Descriptive,
            variable: NumericColumn::Age,
            stats_group_by: None,
            distribution_plot: DistributionPlot::Histogram,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::make_args;
    use super::*;

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_age_range() {
        let mut args = make_args();
        args.age_min = Some(50);
        args.age_max = Some(20);
        assert!(args.validate().is_err());

        args.age_max = Some(50);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(false), tracing::Level::INFO);
        assert_eq!(args.log_level(true), tracing::Level::DEBUG);

        args.verbose = true;
        assert_eq!(args.log_level(false), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(false), tracing::Level::ERROR);
        assert_eq!(args.log_level(true), tracing::Level::ERROR);
    }

    #[test]
    fn test_parse_widget_flags() {
        let args = Args::try_parse_from([
            "shoptrends",
            "--data",
            "trends.csv",
            "--page",
            "insights",
            "--gender",
            "female",
            "--corr-columns",
            "age,review-rating",
            "--corr-method",
            "spearman",
            "--segment-by",
            "age-group",
        ])
        .unwrap();

        assert_eq!(args.page, PageSelection::Insights);
        assert_eq!(args.gender, Some(Gender::Female));
        assert_eq!(
            args.corr_columns,
            Some(vec![NumericColumn::Age, NumericColumn::ReviewRating])
        );
        assert_eq!(args.corr_method, CorrelationMethod::Spearman);
        assert_eq!(args.segment_by, SegmentPreset::AgeGroup);
        assert_eq!(args.group_by, CategoricalColumn::Category);
    }

    #[test]
    fn test_empty_multi_select_selects_nothing() {
        let args = Args::try_parse_from(["shoptrends", "--data", "trends.csv", "--genders"]).unwrap();
        assert_eq!(args.genders, Some(vec![]));
        assert_eq!(args.categories, None);

        let options = args.page_options(&ViewConfig::default());
        assert_eq!(options.visualizations.genders, Some(vec![]));
    }

    #[test]
    fn test_invalid_widget_value_is_rejected() {
        let result = Args::try_parse_from(["shoptrends", "--group-by", "age"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_page_options_use_view_limits() {
        let args = make_args();
        let view = ViewConfig {
            preview_rows: 7,
            histogram_bins: 15,
            ..Default::default()
        };
        let options = args.page_options(&view);

        assert_eq!(options.overview.preview_rows, 7);
        assert_eq!(options.insights.histogram_bins, 15);
        assert_eq!(options.insights.corr_columns, NumericColumn::ALL.to_vec());
    }

    #[test]
    fn test_page_selection() {
        assert_eq!(PageSelection::All.pages().len(), 3);
        assert_eq!(PageSelection::Overview.pages(), vec![Page::Overview]);
    }
}
