//! Report rendering.
//!
//! A [`Report`] bundles the pages built for one run with metadata about the
//! source dataset. It renders to Markdown (optionally themed) or JSON.

pub mod generator;
pub mod theme;

pub use generator::{generate_json_report, generate_markdown_report};
pub use theme::load_theme;

use crate::view::PageView;
use chrono::{DateTime, Utc};
use serde::Serialize;

pub const DEFAULT_TITLE: &str = "Shopping Trends Dashboard";

/// Metadata about a report run.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub title: String,
    /// Dataset path as given on the command line.
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet: Option<String>,
    pub generated_at: DateTime<Utc>,
    pub total_records: usize,
    pub duration_seconds: f64,
}

/// The complete output of a run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub pages: Vec<PageView>,
}

impl Report {
    /// True when any page had an active filter that matched nothing.
    pub fn has_empty_result(&self) -> bool {
        self.pages.iter().any(PageView::is_empty_result)
    }

    pub fn chart_count(&self) -> usize {
        self.pages.iter().map(|p| p.charts().count()).sum()
    }

    pub fn notice_count(&self) -> usize {
        self.pages.iter().map(|p| p.notices().count()).sum()
    }
}
