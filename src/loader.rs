use crate::book::{ABSENT_MARKER, BookRecord, parse_sheet_date, thumbnail_from_cell};
use crate::config::{SourceConfig, SourceKind};
use crate::error::{DashboardError, Result};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const COL_BOOK_NAME: &str = "BookName";
pub const COL_AUTHORS: &str = "Authors";
pub const COL_START_DATE: &str = "StartDate";
pub const COL_FINISH_DATE: &str = "FinishDate";
pub const COL_RATING: &str = "Rating";
pub const COL_CATEGORY: &str = "Category";
pub const COL_THUMBNAIL: &str = "Thumbnail";

const REQUIRED_COLUMNS: &[&str] = &[
    COL_BOOK_NAME,
    COL_AUTHORS,
    COL_FINISH_DATE,
    COL_RATING,
    COL_CATEGORY,
];

/// Raw answer of a tabular source: a header row and the data rows below it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetRows {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// A read-only tabular source of book rows
///
/// Implementations answer the equivalent of `SELECT * FROM <source>`: every
/// row, unfiltered, with the header as the first row.
pub trait BookSource: Send + Sync {
    /// Human readable locator, used in logs
    fn describe(&self) -> String;

    fn fetch_rows(&self) -> Result<SheetRows>;
}

/// A CSV export of the reading log
pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl BookSource for CsvSource {
    fn describe(&self) -> String {
        format!("csv:{}", self.path.display())
    }

    fn fetch_rows(&self) -> Result<SheetRows> {
        let content = fs::read_to_string(&self.path).map_err(|e| {
            DashboardError::DataSource(format!("cannot read {}: {}", self.path.display(), e))
        })?;

        // Byte-order mark written by spreadsheet programs
        let content = content.strip_prefix('\u{feff}').unwrap_or(&content);

        let mut records = parse_csv(content).into_iter();
        let header = records.next().ok_or_else(|| {
            DashboardError::DataSource(format!("{} is empty", self.path.display()))
        })?;

        Ok(SheetRows {
            header,
            rows: records.collect(),
        })
    }
}

/// A workbook export of the reading log (XLSX)
#[cfg(feature = "web")]
pub struct XlsxSource {
    path: PathBuf,
    sheet: Option<String>,
}

#[cfg(feature = "web")]
impl XlsxSource {
    pub fn new(path: impl AsRef<Path>, sheet: Option<String>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            sheet,
        }
    }
}

#[cfg(feature = "web")]
impl BookSource for XlsxSource {
    fn describe(&self) -> String {
        match &self.sheet {
            Some(sheet) => format!("xlsx:{}#{}", self.path.display(), sheet),
            None => format!("xlsx:{}", self.path.display()),
        }
    }

    fn fetch_rows(&self) -> Result<SheetRows> {
        use calamine::{Data, DataType, Reader, Xlsx, open_workbook};

        let mut workbook: Xlsx<_> = open_workbook(&self.path).map_err(|e| {
            DashboardError::DataSource(format!("cannot open {}: {}", self.path.display(), e))
        })?;

        let sheet_name = match &self.sheet {
            Some(name) => name.clone(),
            None => workbook.sheet_names().first().cloned().ok_or_else(|| {
                DashboardError::DataSource(format!(
                    "no sheets found in {}",
                    self.path.display()
                ))
            })?,
        };

        let range = workbook.worksheet_range(&sheet_name).map_err(|e| {
            DashboardError::DataSource(format!("cannot read sheet '{}': {}", sheet_name, e))
        })?;

        let mut rows = range.rows().map(|row| {
            row.iter()
                .map(|cell| match cell {
                    // Date cells come back as serial numbers unless converted here
                    Data::DateTime(_) | Data::DateTimeIso(_) => cell
                        .as_date()
                        .map(|date| date.format("%Y-%m-%d").to_string())
                        .unwrap_or_else(|| cell.to_string()),
                    _ => cell.to_string(),
                })
                .collect::<Vec<String>>()
        });

        let header = rows.next().ok_or_else(|| {
            DashboardError::DataSource(format!("sheet '{}' is empty", sheet_name))
        })?;

        Ok(SheetRows {
            header,
            rows: rows.collect(),
        })
    }
}

/// Fixed in-memory rows, for embedding and tests
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    rows: SheetRows,
}

impl MemorySource {
    pub fn new(rows: SheetRows) -> Self {
        Self { rows }
    }

    /// Lays records out the way a sheet export would
    pub fn from_records(records: &[BookRecord]) -> Self {
        let header = [
            COL_BOOK_NAME,
            COL_AUTHORS,
            COL_START_DATE,
            COL_FINISH_DATE,
            COL_RATING,
            COL_CATEGORY,
            COL_THUMBNAIL,
        ]
        .iter()
        .map(|c| c.to_string())
        .collect();

        let format_date = |date: Option<NaiveDate>| {
            date.map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default()
        };

        let rows = records
            .iter()
            .map(|r| {
                vec![
                    r.book_name.clone(),
                    r.authors.clone(),
                    format_date(r.start_date),
                    format_date(r.finish_date),
                    r.rating.to_string(),
                    r.category.clone(),
                    r.thumbnail
                        .clone()
                        .unwrap_or_else(|| ABSENT_MARKER.to_string()),
                ]
            })
            .collect();

        Self {
            rows: SheetRows { header, rows },
        }
    }
}

impl BookSource for MemorySource {
    fn describe(&self) -> String {
        format!("memory:{} rows", self.rows.rows.len())
    }

    fn fetch_rows(&self) -> Result<SheetRows> {
        Ok(self.rows.clone())
    }
}

/// Builds the source named by the configuration
pub fn source_from_config(config: &SourceConfig) -> Result<Box<dyn BookSource>> {
    match config.resolved_kind()? {
        SourceKind::Csv => Ok(Box::new(CsvSource::new(&config.path))),
        #[cfg(feature = "web")]
        SourceKind::Xlsx => Ok(Box::new(XlsxSource::new(
            &config.path,
            config.sheet.clone(),
        ))),
        #[cfg(not(feature = "web"))]
        SourceKind::Xlsx => Err(DashboardError::Config(
            "XLSX sources require the 'web' feature".to_string(),
        )),
    }
}

/// Fetches every row of the source and converts it into book records
///
/// Columns are located by header name. Fails with a data-source error when
/// the source cannot be read and with a data-shape error when a required
/// column is missing or a cell cannot be parsed.
pub fn load_books(source: &dyn BookSource) -> Result<Vec<BookRecord>> {
    let sheet = source.fetch_rows()?;
    let columns = ColumnIndex::new(&sheet.header)?;

    let mut books = Vec::with_capacity(sheet.rows.len());
    for (i, row) in sheet.rows.iter().enumerate() {
        // Row 1 is the header
        let row_number = i + 2;
        if row.iter().all(|cell| cell.trim().is_empty()) {
            log::debug!("skipping blank row {} of {}", row_number, source.describe());
            continue;
        }
        books.push(columns.record(row, row_number)?);
    }

    log::info!("loaded {} books from {}", books.len(), source.describe());
    Ok(books)
}

/// Header name to column position
struct ColumnIndex {
    positions: HashMap<String, usize>,
}

impl ColumnIndex {
    fn new(header: &[String]) -> Result<Self> {
        let positions: HashMap<String, usize> = header
            .iter()
            .enumerate()
            .map(|(i, name)| (name.trim().to_string(), i))
            .collect();

        for column in REQUIRED_COLUMNS {
            if !positions.contains_key(*column) {
                return Err(DashboardError::missing_column(column));
            }
        }

        Ok(Self { positions })
    }

    fn cell<'a>(&self, row: &'a [String], column: &str) -> &'a str {
        self.positions
            .get(column)
            .and_then(|&i| row.get(i))
            .map(|cell| cell.trim())
            .unwrap_or("")
    }

    fn date(&self, row: &[String], column: &str, row_number: usize) -> Result<Option<NaiveDate>> {
        let raw = self.cell(row, column);
        if raw.is_empty() {
            return Ok(None);
        }
        parse_sheet_date(raw)
            .map(Some)
            .ok_or_else(|| DashboardError::bad_cell(row_number, column, raw, "a date"))
    }

    fn record(&self, row: &[String], row_number: usize) -> Result<BookRecord> {
        let raw_rating = self.cell(row, COL_RATING);
        let rating = if raw_rating.is_empty() {
            0.0
        } else {
            raw_rating.parse::<f64>().map_err(|_| {
                DashboardError::bad_cell(row_number, COL_RATING, raw_rating, "a number")
            })?
        };

        Ok(BookRecord {
            book_name: self.cell(row, COL_BOOK_NAME).to_string(),
            authors: self.cell(row, COL_AUTHORS).to_string(),
            start_date: self.date(row, COL_START_DATE, row_number)?,
            finish_date: self.date(row, COL_FINISH_DATE, row_number)?,
            rating,
            category: self.cell(row, COL_CATEGORY).to_string(),
            thumbnail: thumbnail_from_cell(self.cell(row, COL_THUMBNAIL)),
        })
    }
}

/// Splits CSV text into records of fields
///
/// Handles quoted fields with embedded commas, doubled quotes and line
/// breaks. Both `\n` and `\r\n` end a record.
pub fn parse_csv(content: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut current_field = String::new();
    let mut in_quotes = false;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                if in_quotes && chars.peek() == Some(&'"') {
                    // Double quote inside quoted field - add a single quote
                    current_field.push('"');
                    chars.next();
                } else {
                    in_quotes = !in_quotes;
                }
            }
            ',' if !in_quotes => {
                record.push(std::mem::take(&mut current_field));
            }
            '\r' if !in_quotes && chars.peek() == Some(&'\n') => {}
            '\n' if !in_quotes => {
                record.push(std::mem::take(&mut current_field));
                records.push(std::mem::take(&mut record));
            }
            _ => {
                current_field.push(c);
            }
        }
    }

    // Last record without a trailing newline
    if !current_field.is_empty() || !record.is_empty() {
        record.push(current_field);
        records.push(record);
    }

    records
}
