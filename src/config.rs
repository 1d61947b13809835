//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.shoptrends.toml` files.

use crate::pages::{insights, overview, visualizations};
use crate::report::DEFAULT_TITLE;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".shoptrends.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Dataset location.
    #[serde(default)]
    pub data: DataConfig,

    /// Page limits.
    #[serde(default)]
    pub view: ViewConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "shopping_trends_report.md".to_string()
}

/// Dataset settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataConfig {
    /// Dataset file used when `--data` is not given.
    #[serde(default)]
    pub path: Option<String>,

    /// Worksheet to read from a workbook.
    #[serde(default)]
    pub sheet: Option<String>,
}

/// Limits applied while building pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Rows shown in the overview dataset preview.
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,

    /// Categories preselected on the visualizations page.
    #[serde(default = "default_category_count")]
    pub default_category_count: usize,

    /// Strongest correlation pairs listed.
    #[serde(default = "default_top_k_correlations")]
    pub top_k_correlations: usize,

    /// Bins of the distribution histogram.
    #[serde(default = "default_histogram_bins")]
    pub histogram_bins: usize,

    /// Outlier rows listed.
    #[serde(default = "default_outlier_preview_rows")]
    pub outlier_preview_rows: usize,

    /// Rows of the top categories table.
    #[serde(default = "default_top_categories")]
    pub top_categories: usize,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            preview_rows: default_preview_rows(),
            default_category_count: default_category_count(),
            top_k_correlations: default_top_k_correlations(),
            histogram_bins: default_histogram_bins(),
            outlier_preview_rows: default_outlier_preview_rows(),
            top_categories: default_top_categories(),
        }
    }
}

fn default_preview_rows() -> usize {
    overview::DEFAULT_PREVIEW_ROWS
}

fn default_category_count() -> usize {
    visualizations::DEFAULT_CATEGORY_COUNT
}

fn default_top_k_correlations() -> usize {
    insights::DEFAULT_TOP_CORRELATIONS
}

fn default_histogram_bins() -> usize {
    insights::DEFAULT_HISTOGRAM_BINS
}

fn default_outlier_preview_rows() -> usize {
    insights::DEFAULT_OUTLIER_PREVIEW_ROWS
}

fn default_top_categories() -> usize {
    visualizations::DEFAULT_TOP_CATEGORIES
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Report title.
    #[serde(default = "default_title")]
    pub title: String,

    /// Stylesheet embedded into Markdown reports.
    #[serde(default)]
    pub stylesheet: Option<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            stylesheet: None,
        }
    }
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }
        if let Some(ref data) = args.data {
            self.data.path = Some(data.display().to_string());
        }
        if let Some(ref sheet) = args.sheet {
            self.data.sheet = Some(sheet.clone());
        }
        if let Some(ref stylesheet) = args.stylesheet {
            self.report.stylesheet = Some(stylesheet.display().to_string());
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// The dataset to load, if one is configured.
    pub fn data_path(&self) -> Option<PathBuf> {
        self.data.path.as_ref().map(PathBuf::from)
    }

    pub fn stylesheet_path(&self) -> Option<PathBuf> {
        self.report.stylesheet.as_ref().map(PathBuf::from)
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
