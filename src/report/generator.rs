//! Markdown and JSON report generation.
//!
//! This module renders a [`Report`] into a self-contained Markdown document
//! or pretty-printed JSON.

use super::theme::Theme;
use super::{Report, ReportMetadata};
use crate::view::{Block, ChartSpec, DerivedTable, Metric, Notice, NoticeLevel, PageView};
use anyhow::Result;

/// Rows shown for a plain table before it is truncated.
const MAX_TABLE_ROWS: usize = 50;

/// Rows of chart data shown under a chart.
const MAX_CHART_ROWS: usize = 20;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report, theme: &Theme) -> String {
    let mut output = String::new();

    // Stylesheet
    output.push_str(&format!("<style>\n{}\n</style>\n\n", theme.css.trim_end()));

    // Title
    output.push_str(&format!("# {}\n\n", report.metadata.title));
    output.push_str("*Advanced analytics and visualization of consumer shopping patterns*\n\n");

    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_table_of_contents(report));

    for page in &report.pages {
        output.push_str(&generate_page_section(page));
    }

    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Dataset:** `{}`\n", metadata.source));
    if let Some(ref sheet) = metadata.sheet {
        section.push_str(&format!("- **Worksheet:** {}\n", sheet));
    }
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Records:** {}\n", metadata.total_records));
    section.push_str(&format!(
        "- **Duration:** {:.2}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the table of contents.
fn generate_table_of_contents(report: &Report) -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Metadata](#metadata)\n");

    for page in &report.pages {
        toc.push_str(&format!("- [{}](#{})\n", page.title, anchor(&page.title)));
        for section in &page.sections {
            toc.push_str(&format!(
                "  - [{}](#{})\n",
                section.heading,
                anchor(&section.heading)
            ));
        }
    }

    toc.push('\n');

    toc
}

/// GitHub-style heading anchor.
fn anchor(heading: &str) -> String {
    heading
        .trim()
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            ' ' => Some('-'),
            c if c.is_alphanumeric() || c == '-' || c == '_' => Some(c),
            _ => None,
        })
        .collect()
}

/// Generate one page.
fn generate_page_section(page: &PageView) -> String {
    let mut section = String::new();

    section.push_str(&format!("## {}\n\n", page.title));
    if !page.description.is_empty() {
        section.push_str(&format!("*{}*\n\n", page.description));
    }
    if let Some(rows) = page.filtered_rows {
        section.push_str(&format!("*Rows after filters: {}*\n\n", rows));
    }

    for sub in &page.sections {
        section.push_str(&format!("### {}\n\n", sub.heading));
        for block in &sub.blocks {
            section.push_str(&generate_block(block));
        }
    }

    section.push_str("---\n\n");

    section
}

fn generate_block(block: &Block) -> String {
    match block {
        Block::Metrics { items } => generate_metrics(items),
        Block::Text { text } => format!("**{}**\n\n", text),
        Block::Notice(notice) => generate_notice(notice),
        Block::Table { caption, table } => {
            format!("**{}**\n\n{}", caption, markdown_table(table, MAX_TABLE_ROWS))
        }
        Block::Chart(chart) => generate_chart(chart),
        Block::Bullets { items } => {
            let mut list: String = items.iter().map(|item| format!("- {}\n", item)).collect();
            list.push('\n');
            list
        }
    }
}

fn generate_metrics(items: &[Metric]) -> String {
    if items.is_empty() {
        return String::new();
    }

    let mut block = String::new();
    block.push_str(&format!(
        "| {} |\n",
        items
            .iter()
            .map(|m| escape(&m.label))
            .collect::<Vec<_>>()
            .join(" | ")
    ));
    block.push_str(&format!("|{}\n", ":---:|".repeat(items.len())));
    block.push_str(&format!(
        "| {} |\n\n",
        items
            .iter()
            .map(|m| format!("**{}**", escape(&m.value)))
            .collect::<Vec<_>>()
            .join(" | ")
    ));
    block
}

fn generate_notice(notice: &Notice) -> String {
    match notice.level {
        NoticeLevel::Warning => format!("> ⚠️ **Warning:** {}\n\n", notice.message),
        NoticeLevel::Info => format!("> ℹ️ {}\n\n", notice.message),
    }
}

/// Generate a chart block: title, encoding and the data behind it.
fn generate_chart(chart: &ChartSpec) -> String {
    let mut block = String::new();

    block.push_str(&format!("#### 📊 {}\n\n", chart.title));

    let mut encoding = vec![format!("*{}*", chart.kind)];
    encoding.extend(
        chart
            .mappings()
            .into_iter()
            .map(|(role, column)| format!("{}: `{}`", role, column)),
    );
    if !chart.hover.is_empty() {
        encoding.push(format!("hover: {}", chart.hover.join(", ")));
    }
    if let Some(mode) = chart.bar_mode {
        encoding.push(format!("bars: {:?}", mode).to_lowercase());
    }
    block.push_str(&encoding.join(" · "));
    block.push_str("\n\n");

    for line in &chart.reference_lines {
        block.push_str(&format!("- {} at {:.2}\n", line.label, line.y));
    }
    if !chart.reference_lines.is_empty() {
        block.push('\n');
    }

    block.push_str(&markdown_table(&chart.data, MAX_CHART_ROWS));
    block
}

/// Render a derived table, showing at most `limit` rows.
fn markdown_table(table: &DerivedTable, limit: usize) -> String {
    if table.columns.is_empty() {
        return String::new();
    }
    if table.is_empty() {
        return "*No rows.*\n\n".to_string();
    }

    let mut output = String::new();
    output.push_str(&format!(
        "| {} |\n",
        table
            .columns
            .iter()
            .map(|c| escape(c))
            .collect::<Vec<_>>()
            .join(" | ")
    ));
    output.push_str(&format!("|{}\n", ":---|".repeat(table.columns.len())));

    for row in table.rows.iter().take(limit) {
        output.push_str(&format!(
            "| {} |\n",
            row.iter()
                .map(|cell| escape(&cell.to_string()))
                .collect::<Vec<_>>()
                .join(" | ")
        ));
    }

    if table.len() > limit {
        output.push_str(&format!("\n*… {} more rows*\n", table.len() - limit));
    }
    output.push('\n');

    output
}

fn escape(text: &str) -> String {
    text.replace('|', "\\|")
}

/// Generate the report footer.
fn generate_footer() -> String {
    format!(
        "*Report generated by shoptrends v{}*\n",
        env!("CARGO_PKG_VERSION")
    )
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::testing::sample_report;
    use crate::view::Cell;

    #[test]
    fn test_generate_markdown_report() {
        let report = sample_report();
        let markdown = generate_markdown_report(&report, &Theme::default());

        assert!(markdown.starts_with("<style>"));
        assert!(markdown.contains("# Shopping Trends Dashboard"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("## Shopping Trends Overview"));
        assert!(markdown.contains("### Category Performance"));
        assert!(markdown.contains("#### 📊 Purchases by Category"));
        assert!(markdown.contains("> ⚠️ **Warning:** No data matches your filters."));
        assert!(markdown.contains("*Rows after filters: 0*"));
    }

    #[test]
    fn test_custom_theme_is_embedded() {
        let theme = Theme {
            css: "body { margin: 0; }".to_string(),
            source: None,
        };
        let markdown = generate_markdown_report(&sample_report(), &theme);
        assert!(markdown.contains("<style>\nbody { margin: 0; }\n</style>"));
    }

    #[test]
    fn test_table_of_contents_anchors() {
        let toc = generate_table_of_contents(&sample_report());
        assert!(toc.contains("- [Shopping Trends Overview](#shopping-trends-overview)"));
        assert!(toc.contains("  - [Dataset Summary](#dataset-summary)"));
        assert_eq!(anchor("💡 Key Insights"), "-key-insights");
    }

    #[test]
    fn test_markdown_table_escapes_and_truncates() {
        let mut table = DerivedTable::new(vec!["Value".to_string()]);
        for i in 0..5 {
            table.push(vec![Cell::Integer(i)]);
        }
        table.push(vec![Cell::from("a|b")]);

        let rendered = markdown_table(&table, 3);
        assert!(rendered.contains("| Value |"));
        assert!(rendered.contains("| 2 |"));
        assert!(!rendered.contains("| 3 |"));
        assert!(rendered.contains("3 more rows"));

        let full = markdown_table(&table, 10);
        assert!(full.contains("a\\|b"));
    }

    #[test]
    fn test_generate_metadata_section() {
        let report = sample_report();
        let section = generate_metadata_section(&report.metadata);

        assert!(section.contains("`fixtures/shopping_trends.csv`"));
        assert!(section.contains("- **Records:** 6"));
        assert!(!section.contains("Worksheet"));
    }

    #[test]
    fn test_generate_json_report() {
        let report = sample_report();
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"metadata\""));
        assert!(json.contains("\"pages\""));
        assert!(json.contains("\"type\": \"chart\""));
        assert!(json.contains("\"filtered_rows\": 0"));
    }
}
