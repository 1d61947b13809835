//! shoptrends - Shopping trends analytics
//!
//! A CLI tool that loads a shopping transactions spreadsheet, applies the
//! dashboard's filters, segmentations and aggregations, and writes the
//! resulting pages as a Markdown or JSON report.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (missing or malformed dataset, config, write failure)
//!   2 - An active filter matched no rows and --fail-on-empty was set

mod analysis;
mod cli;
mod config;
mod dataset;
mod models;
mod pages;
mod report;
mod view;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, DEFAULT_CONFIG_FILE};
use dataset::{DatasetCache, LoadOptions};
use models::Table;
use report::{Report, ReportMetadata};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Load configuration before logging so `[general] verbose` applies
    let (mut config, source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    // Initialize logging
    init_logging(args.log_level(config.general.verbose));

    info!("shoptrends v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    source.log();

    match run(args, config) {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .shoptrends.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("   Edit it to set the dataset path, page limits and report title.");
    Ok(())
}

/// Initialize logging at the given level.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the complete workflow. Returns exit code (0 or 2).
fn run(args: Args, config: Config) -> Result<i32> {
    let start_time = Instant::now();

    let Some(data_path) = config.data_path() else {
        bail!(
            "No dataset given. Pass --data <FILE> or set [data] path in {}",
            DEFAULT_CONFIG_FILE
        );
    };

    // Step 1: Load the dataset
    println!("📥 Loading dataset: {}", data_path.display());
    let load_options = LoadOptions {
        sheet: config.data.sheet.clone(),
        show_progress: !args.quiet,
    };
    let mut cache = DatasetCache::new();
    let table = cache
        .get_or_load(&data_path, &load_options)
        .with_context(|| format!("Failed to load dataset {}", data_path.display()))?;
    debug!(
        "Loaded {} records ({} pass-through columns)",
        table.len(),
        table.extra_columns().len()
    );

    // Handle --check: validation only
    if args.check {
        return handle_check(&table);
    }

    // Step 2: Build the requested pages
    let selected = args.page.pages();
    println!("\n🔬 Building {} page(s)...", selected.len());
    let options = args.page_options(&config.view);
    let views = pages::build_pages(&selected, &table, &options);

    for view in &views {
        if let Some(rows) = view.filtered_rows {
            println!("   {}: {} of {} records after filters", view.title, rows, table.len());
        }
        for notice in view.notices() {
            warn!("{}: {}", view.title, notice.message);
        }
    }

    // Step 3: Render and save the report
    println!("\n📝 Generating report...");

    let report = Report {
        metadata: ReportMetadata {
            title: config.report.title.clone(),
            source: data_path.display().to_string(),
            sheet: config.data.sheet.clone(),
            generated_at: Utc::now(),
            total_records: table.len(),
            duration_seconds: start_time.elapsed().as_secs_f64(),
        },
        pages: views,
    };

    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => {
            let theme = report::load_theme(config.stylesheet_path().as_deref());
            report::generate_markdown_report(&report, &theme)
        }
    };

    let output_path = Path::new(&config.general.output);
    std::fs::write(output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    // Print summary
    println!("\n📊 Report Summary:");
    println!("   Records: {}", table.len());
    println!("   Pages: {}", report.pages.len());
    println!("   Charts: {}", report.chart_count());
    println!("   Notices: {}", report.notice_count());
    println!("   Duration: {:.2}s", start_time.elapsed().as_secs_f64());
    println!(
        "\n✅ Report complete! Saved to: {}",
        output_path.display()
    );

    // Check --fail-on-empty
    if args.fail_on_empty && report.has_empty_result() {
        eprintln!("\n⛔ An active filter matched no rows. Failing (exit code 2).");
        return Ok(2);
    }

    Ok(0)
}

/// Handle --check: print what was loaded, exit.
fn handle_check(table: &Table) -> Result<i32> {
    println!("\n🔍 Dataset is valid.\n");
    println!("   Records: {}", table.len());
    println!(
        "   Categories: {}",
        table
            .distinct_sorted(models::CategoricalColumn::Category)
            .join(", ")
    );
    if !table.extra_columns().is_empty() {
        println!("   Extra columns: {}", table.extra_columns().join(", "));
    }

    println!("\n✅ Check complete. No report was written.");
    Ok(0)
}

/// Where the configuration came from, logged once logging is up.
enum ConfigSource {
    File(PathBuf),
    Defaults,
    Unreadable(anyhow::Error),
}

impl ConfigSource {
    fn log(&self) {
        match self {
            ConfigSource::File(path) => info!("Loaded config from {}", path.display()),
            ConfigSource::Defaults => debug!("No config file found, using defaults"),
            ConfigSource::Unreadable(e) => warn!("Failed to load config: {:#}", e),
        }
    }
}

/// Load configuration from file or use defaults.
///
/// An explicit `--config` must load; a broken default file falls back to
/// defaults with a warning.
fn load_config(args: &Args) -> Result<(Config, ConfigSource)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, ConfigSource::File(config_path.clone())));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, ConfigSource::File(PathBuf::from(DEFAULT_CONFIG_FILE)))),
        Ok(None) => Ok((Config::default(), ConfigSource::Defaults)),
        Err(e) => Ok((Config::default(), ConfigSource::Unreadable(e))),
    }
}
