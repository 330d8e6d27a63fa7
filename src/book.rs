use chrono::{Datelike, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

lazy_static! {
    static ref YEAR_MONTH_REGEX: Regex = Regex::new(r"^(\d{4})-(\d{2})$").unwrap();
    // "2023-01-15 00:00:00", "2023-01-15T08:30:00Z", "1/15/2023 10:00"
    static ref TIME_SUFFIX_REGEX: Regex =
        Regex::new(r"^(.+?)[T ]\d{1,2}:\d{2}(:\d{2}(\.\d+)?)?(Z|[+-]\d{2}:?\d{2})?$").unwrap();
}

/// Date layouts a spreadsheet export is known to produce, tried in order
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d %B %Y", "%B %d, %Y"];

/// The literal a sheet uses for "no thumbnail"
pub const ABSENT_MARKER: &str = "None";

/// Categories offered by the category picker, in display order
pub const KNOWN_CATEGORIES: &[&str] = &[
    "Biography/Autobiography",
    "Fantasy",
    "Historical Fiction",
    "Informational",
    "Mystery",
    "Realistic Fiction",
    "Poetry",
    "Traditional Literature",
];

/// One row of the reading log
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BookRecord {
    pub book_name: String,
    /// May hold several authors in one string; never split
    pub authors: String,
    pub start_date: Option<NaiveDate>,
    pub finish_date: Option<NaiveDate>,
    pub rating: f64,
    pub category: String,
    pub thumbnail: Option<String>,
}

impl BookRecord {
    pub fn new(book_name: &str, authors: &str, category: &str) -> Self {
        BookRecord {
            book_name: book_name.to_string(),
            authors: authors.to_string(),
            start_date: None,
            finish_date: None,
            rating: 0.0,
            category: category.to_string(),
            thumbnail: None,
        }
    }

    pub fn finished_on(mut self, date: NaiveDate) -> Self {
        self.finish_date = Some(date);
        self
    }

    pub fn started_on(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    pub fn rated(mut self, rating: f64) -> Self {
        self.rating = rating;
        self
    }

    pub fn with_thumbnail(mut self, url: &str) -> Self {
        self.thumbnail = thumbnail_from_cell(url);
        self
    }
}

/// Calendar month a book was finished in, rendered as "YYYY-MM"
///
/// Ordering is chronological, which matches the ordering of the string form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) && (0..=9999).contains(&year) {
            Some(YearMonth { year, month })
        } else {
            None
        }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        YearMonth {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Parses the "YYYY-MM" key form
    pub fn parse(key: &str) -> Option<Self> {
        let caps = YEAR_MONTH_REGEX.captures(key.trim())?;
        let year = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        YearMonth::new(year, month)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        YearMonth::parse(s).ok_or_else(|| format!("'{}' is not a YYYY-MM month", s))
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A book together with the month it was finished in
///
/// `read_month` is `None` while the book has no FinishDate; such books count
/// towards totals, categories and authors but never towards a month bucket.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReadBook {
    #[serde(flatten)]
    pub record: BookRecord,
    #[serde(rename = "ReadYearMonth")]
    pub read_month: Option<YearMonth>,
}

/// Parses a date cell as written by a spreadsheet export
///
/// Returns `None` for text in none of the known layouts; callers decide
/// whether an empty cell is acceptable before calling this.
pub fn parse_sheet_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let date_part = match TIME_SUFFIX_REGEX.captures(trimmed) {
        Some(caps) => caps.get(1).map_or(trimmed, |m| m.as_str()),
        None => trimmed,
    };

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(date_part, format).ok())
}

pub fn thumbnail_from_cell(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == ABSENT_MARKER {
        None
    } else {
        Some(trimmed.to_string())
    }
}
