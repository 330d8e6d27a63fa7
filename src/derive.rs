//! Aggregate tables derived from the loaded reading log.
//!
//! Everything here is a pure function of the book list; nothing is cached or
//! updated incrementally.

use crate::book::{BookRecord, ReadBook, YearMonth};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Books of one category and their share of the whole log
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CategoryShare {
    pub category: String,
    pub count: usize,
    /// Percentage of all books, rounded to two decimals
    pub percentage: f64,
}

/// Running total of a category up to and including a month
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CumulativePoint {
    #[serde(rename = "ReadYearMonth")]
    pub read_month: YearMonth,
    pub category: String,
    pub cumulative_count: usize,
}

/// Books of one category finished in one month
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MonthCategoryCount {
    #[serde(rename = "ReadYearMonth")]
    pub read_month: YearMonth,
    pub category: String,
    pub count: usize,
}

/// Attaches the month of completion to every record
pub fn with_read_month(records: Vec<BookRecord>) -> Vec<ReadBook> {
    records
        .into_iter()
        .map(|record| ReadBook {
            read_month: record.finish_date.map(YearMonth::from_date),
            record,
        })
        .collect()
}

/// Number of books finished per month, oldest month first
///
/// Books without a FinishDate belong to no month and are not counted.
pub fn monthly_counts(books: &[ReadBook]) -> Vec<(YearMonth, usize)> {
    let mut counts: BTreeMap<YearMonth, usize> = BTreeMap::new();
    for month in books.iter().filter_map(|b| b.read_month) {
        *counts.entry(month).or_insert(0) += 1;
    }
    counts.into_iter().collect()
}

/// Count and percentage of books per category, sorted by category
///
/// # Arguments
/// * `books` - Every loaded book; unfinished books count too
///
/// # Returns
/// * One [`CategoryShare`] per category present, empty for an empty log
///
/// # Notes
/// * Percentages are rounded to two decimals independently and may not add
///   up to exactly 100
pub fn category_breakdown(books: &[ReadBook]) -> Vec<CategoryShare> {
    let total = books.len();
    if total == 0 {
        return Vec::new();
    }

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for book in books {
        *counts.entry(book.record.category.as_str()).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .map(|(category, count)| CategoryShare {
            category: category.to_string(),
            count,
            percentage: round2(count as f64 * 100.0 / total as f64),
        })
        .collect()
}

/// Running total per category over every observed month
///
/// # Arguments
/// * `books` - Books with their ReadYearMonth attached
///
/// # Returns
/// * The full cross of observed months and observed categories, ordered by
///   month then category. A category with no book in a month carries its
///   previous total forward (zero before its first book).
///
/// # Notes
/// * Books without a FinishDate contribute to no month and are skipped
pub fn cumulative_category_series(books: &[ReadBook]) -> Vec<CumulativePoint> {
    let mut months: BTreeSet<YearMonth> = BTreeSet::new();
    let mut categories: BTreeSet<&str> = BTreeSet::new();
    let mut cells: BTreeMap<(YearMonth, &str), usize> = BTreeMap::new();

    for book in books {
        let Some(month) = book.read_month else {
            continue;
        };
        let category = book.record.category.as_str();
        months.insert(month);
        categories.insert(category);
        *cells.entry((month, category)).or_insert(0) += 1;
    }

    let mut running: BTreeMap<&str, usize> = categories.iter().map(|c| (*c, 0)).collect();
    let mut series = Vec::with_capacity(months.len() * categories.len());

    for month in &months {
        for category in &categories {
            let added = cells.get(&(*month, *category)).copied().unwrap_or(0);
            let total = running.entry(*category).or_insert(0);
            *total += added;
            series.push(CumulativePoint {
                read_month: *month,
                category: category.to_string(),
                cumulative_count: *total,
            });
        }
    }

    series
}

/// Books per author string, most read first (ties by author)
pub fn author_counts(books: &[ReadBook]) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for book in books {
        *counts.entry(book.record.authors.as_str()).or_insert(0) += 1;
    }

    let mut sorted: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(author, count)| (author.to_string(), count))
        .collect();
    // Stable sort keeps the alphabetical order among equal counts
    sorted.sort_by(|a, b| b.1.cmp(&a.1));
    sorted
}

/// Books per (month, category) for the stacked monthly chart
pub fn month_category_counts(books: &[ReadBook]) -> Vec<MonthCategoryCount> {
    let mut counts: BTreeMap<(YearMonth, &str), usize> = BTreeMap::new();
    for book in books {
        if let Some(month) = book.read_month {
            *counts
                .entry((month, book.record.category.as_str()))
                .or_insert(0) += 1;
        }
    }

    counts
        .into_iter()
        .map(|((read_month, category), count)| MonthCategoryCount {
            read_month,
            category: category.to_string(),
            count,
        })
        .collect()
}

/// Books per category, most read first (ties by category)
pub fn category_counts(books: &[ReadBook]) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = category_breakdown(books)
        .into_iter()
        .map(|share| (share.category, share.count))
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
