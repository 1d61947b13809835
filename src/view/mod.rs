//! Renderable page views.
//!
//! Pages produce a [`PageView`]: titled sections of metrics, text, notices,
//! tables and chart specifications. Rendering them is the report layer's job.

pub mod chart;
pub mod table;

pub use chart::{BarMode, ChartKind, ChartSpec};
pub use table::{Cell, DerivedTable};

use serde::Serialize;

/// A headline number.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    pub label: String,
    pub value: String,
}

impl Metric {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
}

/// A message shown in place of content that could not be computed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Block {
    Metrics { items: Vec<Metric> },
    Text { text: String },
    Notice(Notice),
    Table { caption: String, table: DerivedTable },
    Chart(ChartSpec),
    Bullets { items: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub heading: String,
    pub blocks: Vec<Block>,
}

impl Section {
    pub fn new(heading: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            blocks: Vec::new(),
        }
    }

    pub fn metrics(&mut self, items: Vec<Metric>) -> &mut Self {
        self.blocks.push(Block::Metrics { items });
        self
    }

    pub fn text(&mut self, text: impl Into<String>) -> &mut Self {
        self.blocks.push(Block::Text { text: text.into() });
        self
    }

    pub fn info(&mut self, message: impl Into<String>) -> &mut Self {
        self.notice(NoticeLevel::Info, message)
    }

    pub fn warning(&mut self, message: impl Into<String>) -> &mut Self {
        self.notice(NoticeLevel::Warning, message)
    }

    fn notice(&mut self, level: NoticeLevel, message: impl Into<String>) -> &mut Self {
        self.blocks.push(Block::Notice(Notice {
            level,
            message: message.into(),
        }));
        self
    }

    pub fn table(&mut self, caption: impl Into<String>, table: DerivedTable) -> &mut Self {
        self.blocks.push(Block::Table {
            caption: caption.into(),
            table,
        });
        self
    }

    pub fn chart(&mut self, chart: ChartSpec) -> &mut Self {
        self.blocks.push(Block::Chart(chart));
        self
    }

    pub fn bullets(&mut self, items: Vec<String>) -> &mut Self {
        self.blocks.push(Block::Bullets { items });
        self
    }

    pub fn charts(&self) -> impl Iterator<Item = &ChartSpec> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Chart(chart) => Some(chart),
            _ => None,
        })
    }

    pub fn notices(&self) -> impl Iterator<Item = &Notice> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Notice(notice) => Some(notice),
            _ => None,
        })
    }
}

/// The output of one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageView {
    pub title: String,
    pub description: String,
    pub sections: Vec<Section>,
    /// Rows left after the page's filters; `None` when it does not filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filtered_rows: Option<usize>,
}

impl PageView {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            sections: Vec::new(),
            filtered_rows: None,
        }
    }

    pub fn push(&mut self, section: Section) {
        self.sections.push(section);
    }

    pub fn section(&self, heading: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.heading == heading)
    }

    pub fn charts(&self) -> impl Iterator<Item = &ChartSpec> {
        self.sections.iter().flat_map(Section::charts)
    }

    pub fn notices(&self) -> impl Iterator<Item = &Notice> {
        self.sections.iter().flat_map(Section::notices)
    }

    /// True when a filter was active and matched no rows.
    pub fn is_empty_result(&self) -> bool {
        self.filtered_rows == Some(0)
    }
}
