//! Spreadsheet and CSV readers.
//!
//! Both readers produce a header row and string cells; a single parser then
//! validates the schema once and builds typed records.

use super::DatasetError;
use crate::models::{Gender, Season, Table, Transaction, RATING_RANGE, REQUIRED_COLUMNS};
use calamine::{open_workbook_auto, Data, Reader};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Options for loading a dataset.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Worksheet to read; the first sheet when `None`. Ignored for CSV.
    pub sheet: Option<String>,
    /// Whether to show a spinner while reading.
    pub show_progress: bool,
}

/// Raw header and rows before typing.
struct RawSheet {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// Load and validate a dataset file.
pub fn load_table(path: &Path, options: &LoadOptions) -> Result<Table, DatasetError> {
    if !path.exists() {
        return Err(DatasetError::NotFound(path.to_path_buf()));
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let spinner = options.show_progress.then(|| {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(format!("Loading {}", path.display()));
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    });

    let raw = match extension.as_str() {
        "csv" => read_csv(path),
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => read_workbook(path, options.sheet.as_deref()),
        other => Err(DatasetError::UnsupportedFormat(other.to_string())),
    };

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let table = parse_table(raw?)?;
    info!("Loaded {} records from {}", table.len(), path.display());
    Ok(table)
}

fn read_csv(path: &Path) -> Result<RawSheet, DatasetError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| csv_error(path, e))?;

    let headers = reader
        .headers()
        .map_err(|e| csv_error(path, e))?
        .iter()
        .map(str::to_string)
        .collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| csv_error(path, e))?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(RawSheet { headers, rows })
}

/// Separates read failures from malformed CSV.
fn csv_error(path: &Path, err: csv::Error) -> DatasetError {
    let io = match err.kind() {
        csv::ErrorKind::Io(io) => Some(std::io::Error::new(io.kind(), io.to_string())),
        _ => None,
    };
    match io {
        Some(source) => DatasetError::Io {
            path: path.to_path_buf(),
            source,
        },
        None => DatasetError::Csv(err),
    }
}

fn read_workbook(path: &Path, sheet: Option<&str>) -> Result<RawSheet, DatasetError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| DatasetError::Workbook {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let sheet_name = match sheet {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or(DatasetError::Empty)?,
    };
    debug!("Reading worksheet '{}'", sheet_name);

    if !workbook.sheet_names().contains(&sheet_name) {
        return Err(DatasetError::SheetNotFound(sheet_name));
    }

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| DatasetError::Workbook {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let mut rows = range.rows().map(|row| row.iter().map(cell_text).collect::<Vec<_>>());
    let headers = rows.next().ok_or(DatasetError::Empty)?;

    Ok(RawSheet {
        headers,
        rows: rows.collect(),
    })
}

/// Text of a workbook cell; integral floats lose their fraction.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(serial) => serial.as_f64().to_string(),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("#ERROR:{:?}", e),
    }
}

/// Positions of the required columns within the header row.
struct ColumnIndex {
    required: [usize; REQUIRED_COLUMNS.len()],
    extra: Vec<(usize, String)>,
}

impl ColumnIndex {
    fn resolve(headers: &[String]) -> Result<Self, DatasetError> {
        let headers: Vec<&str> = headers.iter().map(|h| h.trim()).collect();

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|name| !headers.contains(*name))
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(DatasetError::MissingColumns(missing));
        }

        let mut required = [0; REQUIRED_COLUMNS.len()];
        for (slot, name) in required.iter_mut().zip(REQUIRED_COLUMNS) {
            *slot = headers.iter().position(|h| *h == name).unwrap_or_default();
        }

        let extra = headers
            .iter()
            .enumerate()
            .filter(|(_, h)| !h.is_empty() && !REQUIRED_COLUMNS.contains(*h))
            .map(|(i, h)| (i, h.to_string()))
            .collect();

        Ok(Self { required, extra })
    }
}

fn parse_table(raw: RawSheet) -> Result<Table, DatasetError> {
    let index = ColumnIndex::resolve(&raw.headers)?;

    let mut records = Vec::with_capacity(raw.rows.len());
    for (i, row) in raw.rows.iter().enumerate() {
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        // Spreadsheet row number: 1-based, after the header.
        records.push(parse_record(row, &index, i + 2)?);
    }

    if records.is_empty() {
        return Err(DatasetError::Empty);
    }

    let extra_columns = index.extra.into_iter().map(|(_, name)| name).collect();
    Ok(Table::new(extra_columns, records))
}

fn parse_record(
    row: &[String],
    index: &ColumnIndex,
    row_number: usize,
) -> Result<Transaction, DatasetError> {
    let field = |slot: usize| Field {
        column: REQUIRED_COLUMNS[slot],
        value: row.get(index.required[slot]).map(|s| s.trim()).unwrap_or(""),
        row: row_number,
    };

    let age = field(0).count()?;
    let gender = field(1).parse::<Gender>()?;
    let category = field(2).text()?;
    let purchase_amount = field(3).number()?;
    if purchase_amount < 0.0 {
        return Err(field(3).invalid("purchase amount cannot be negative"));
    }
    let review_rating = field(4).number()?;
    if !(RATING_RANGE.0..=RATING_RANGE.1).contains(&review_rating) {
        return Err(field(4).invalid(&format!(
            "rating must be between {} and {}",
            RATING_RANGE.0, RATING_RANGE.1
        )));
    }
    let season = field(5).parse::<Season>()?;
    let previous_purchases = field(6).count()?;

    let extra = index
        .extra
        .iter()
        .map(|(i, _)| row.get(*i).cloned().unwrap_or_default())
        .collect();

    Ok(Transaction {
        age,
        gender,
        category,
        purchase_amount,
        review_rating,
        season,
        previous_purchases,
        extra,
    })
}

/// One cell being parsed, with enough context to report it.
struct Field<'a> {
    column: &'static str,
    value: &'a str,
    row: usize,
}

impl Field<'_> {
    fn invalid(&self, reason: &str) -> DatasetError {
        DatasetError::InvalidValue {
            row: self.row,
            column: self.column.to_string(),
            value: self.value.to_string(),
            reason: reason.to_string(),
        }
    }

    fn text(&self) -> Result<String, DatasetError> {
        if self.value.is_empty() {
            return Err(self.invalid("value is required"));
        }
        Ok(self.value.to_string())
    }

    fn number(&self) -> Result<f64, DatasetError> {
        match self.value.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(self.invalid("expected a number")),
        }
    }

    /// A non-negative whole number; `35.0` is accepted as `35`.
    fn count(&self) -> Result<u32, DatasetError> {
        let v = self.number()?;
        if v < 0.0 || v.fract() != 0.0 || v > f64::from(u32::MAX) {
            return Err(self.invalid("expected a non-negative whole number"));
        }
        Ok(v as u32)
    }

    fn parse<T: std::str::FromStr<Err = String>>(&self) -> Result<T, DatasetError> {
        self.value.parse::<T>().map_err(|reason| self.invalid(&reason))
    }
}
