use crate::book::{ReadBook, YearMonth};
use crate::derive::monthly_counts;
use crate::error::{DashboardError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::str::FromStr;

/// Category value meaning "do not filter"
pub const ALL_CATEGORIES: &str = "All";

/// Headline numbers shown above the charts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryMetrics {
    pub total_books: usize,
    /// Unique Authors strings; a multi-author string counts once
    pub distinct_author_count: usize,
    /// Zero when no book has a FinishDate
    pub max_books_in_any_month: usize,
}

/// Computes the headline numbers of the reading log
///
/// # Arguments
/// * `books` - Every loaded book, finished or not
///
/// # Returns
/// * Total books, distinct Authors strings (empty ones excluded) and the
///   largest number of books finished in a single month
pub fn summary_metrics(books: &[ReadBook]) -> SummaryMetrics {
    let authors: HashSet<&str> = books
        .iter()
        .map(|b| b.record.authors.as_str())
        .filter(|a| !a.is_empty())
        .collect();

    SummaryMetrics {
        total_books: books.len(),
        distinct_author_count: authors.len(),
        max_books_in_any_month: monthly_counts(books)
            .into_iter()
            .map(|(_, count)| count)
            .max()
            .unwrap_or(0),
    }
}

/// Keeps the books of one category; "All" or an empty value keeps everything
pub fn filter_by_category(books: &[ReadBook], category: &str) -> Vec<ReadBook> {
    if is_all(category) {
        return books.to_vec();
    }
    books
        .iter()
        .filter(|b| b.record.category == category)
        .cloned()
        .collect()
}

pub fn is_all(category: &str) -> bool {
    category.is_empty() || category == ALL_CATEGORIES
}

/// Field a search filters on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SearchParameter {
    Author,
    ReadMonth,
    Rating,
    Category,
}

impl SearchParameter {
    pub const ALL: [SearchParameter; 4] = [
        SearchParameter::Author,
        SearchParameter::ReadMonth,
        SearchParameter::Rating,
        SearchParameter::Category,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchParameter::Author => "Author",
            SearchParameter::ReadMonth => "ReadMonth",
            SearchParameter::Rating => "Rating",
            SearchParameter::Category => "Category",
        }
    }
}

impl fmt::Display for SearchParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchParameter {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        SearchParameter::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DashboardError::InvalidQuery(format!("unknown search field '{}'", s)))
    }
}

/// A search choice interpreted for its field
#[derive(Debug, Clone, PartialEq)]
pub enum SearchChoice {
    /// The empty / zero sentinel: no filtering
    Any,
    Text(String),
    Month(YearMonth),
    Rating(f64),
}

impl SearchChoice {
    /// Interprets a raw choice for the given field
    pub fn parse(parameter: SearchParameter, raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(SearchChoice::Any);
        }

        match parameter {
            SearchParameter::Author | SearchParameter::Category => {
                Ok(SearchChoice::Text(raw.to_string()))
            }
            SearchParameter::ReadMonth => YearMonth::parse(raw)
                .map(SearchChoice::Month)
                .ok_or_else(|| {
                    DashboardError::InvalidQuery(format!("'{}' is not a YYYY-MM month", raw))
                }),
            SearchParameter::Rating => {
                let rating = raw.parse::<f64>().map_err(|_| {
                    DashboardError::InvalidQuery(format!("'{}' is not a rating", raw))
                })?;
                if rating == 0.0 {
                    Ok(SearchChoice::Any)
                } else {
                    Ok(SearchChoice::Rating(rating))
                }
            }
        }
    }

    /// Canonical string form, used as the cache key
    pub fn key(&self) -> String {
        match self {
            SearchChoice::Any => String::new(),
            SearchChoice::Text(text) => text.clone(),
            SearchChoice::Month(month) => month.to_string(),
            SearchChoice::Rating(rating) => rating.to_string(),
        }
    }

    fn matches(&self, parameter: SearchParameter, book: &ReadBook) -> bool {
        match (self, parameter) {
            (SearchChoice::Any, _) => true,
            (SearchChoice::Text(text), SearchParameter::Author) => book.record.authors == *text,
            (SearchChoice::Text(text), SearchParameter::Category) => book.record.category == *text,
            (SearchChoice::Month(month), SearchParameter::ReadMonth) => {
                book.read_month == Some(*month)
            }
            (SearchChoice::Rating(rating), SearchParameter::Rating) => book.record.rating == *rating,
            _ => false,
        }
    }
}

/// The columns shown by the search table
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DisplayRow {
    pub book_name: String,
    pub authors: String,
    pub start_date: Option<NaiveDate>,
    pub finish_date: Option<NaiveDate>,
    pub rating: f64,
    pub category: String,
}

impl From<&ReadBook> for DisplayRow {
    fn from(book: &ReadBook) -> Self {
        let r = &book.record;
        DisplayRow {
            book_name: r.book_name.clone(),
            authors: r.authors.clone(),
            start_date: r.start_date,
            finish_date: r.finish_date,
            rating: r.rating,
            category: r.category.clone(),
        }
    }
}

/// Exact-match search projected to the display columns
///
/// # Arguments
/// * `books` - The record set to search
/// * `parameter` - Field the choice is compared against
/// * `choice` - Raw choice as typed or picked by the user
///
/// # Returns
/// * The matching books in record order. An empty choice, or zero for
///   Rating, returns every book.
///
/// # Errors
/// * `InvalidQuery` if the choice does not parse for the field (a rating
///   that is not a number, a month that is not `YYYY-MM`)
pub fn search(books: &[ReadBook], parameter: SearchParameter, choice: &str) -> Result<Vec<DisplayRow>> {
    let choice = SearchChoice::parse(parameter, choice)?;
    Ok(run_search(books, parameter, &choice))
}

fn run_search(books: &[ReadBook], parameter: SearchParameter, choice: &SearchChoice) -> Vec<DisplayRow> {
    books
        .iter()
        .filter(|b| choice.matches(parameter, b))
        .map(DisplayRow::from)
        .collect()
}

/// Number of distinct searches a [`SearchCache`] keeps by default
pub const SEARCH_CACHE_CAPACITY: usize = 16;

type CacheKey = (SearchParameter, String);

/// Search results remembered per (field, choice)
///
/// Entries belong to one generation of the record set. Loading a new record
/// set must call [`SearchCache::invalidate`]; a lookup against a different
/// generation also empties the cache. At most `capacity` searches are kept,
/// the oldest one is evicted first.
#[derive(Debug)]
pub struct SearchCache {
    generation: u64,
    capacity: usize,
    entries: HashMap<CacheKey, Vec<DisplayRow>>,
    order: VecDeque<CacheKey>,
    hits: u64,
    misses: u64,
}

impl Default for SearchCache {
    fn default() -> Self {
        Self::with_capacity(SEARCH_CACHE_CAPACITY)
    }
}

impl SearchCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache holding at most `capacity` searches (at least one)
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            generation: 0,
            capacity: capacity.max(1),
            entries: HashMap::new(),
            order: VecDeque::new(),
            hits: 0,
            misses: 0,
        }
    }

    /// Drops every entry and moves to the given generation
    pub fn invalidate(&mut self, generation: u64) {
        if !self.entries.is_empty() {
            log::debug!(
                "search cache invalidated ({} entries, generation {} -> {})",
                self.entries.len(),
                self.generation,
                generation
            );
        }
        self.entries.clear();
        self.order.clear();
        self.generation = generation;
    }

    /// Returns the cached rows or computes and stores them
    ///
    /// # Arguments
    /// * `books` - The record set of `generation`
    /// * `generation` - Load counter of `books`; a new value empties the cache
    /// * `parameter` - Field to search
    /// * `choice` - Raw choice, normalized before lookup so "4" and "4.0" share
    ///   an entry
    ///
    /// # Errors
    /// * `InvalidQuery` as for [`search`]; nothing is cached in that case
    pub fn search(
        &mut self,
        books: &[ReadBook],
        generation: u64,
        parameter: SearchParameter,
        choice: &str,
    ) -> Result<Vec<DisplayRow>> {
        if generation != self.generation {
            self.invalidate(generation);
        }

        let choice = SearchChoice::parse(parameter, choice)?;
        let key = (parameter, choice.key());

        if let Some(rows) = self.entries.get(&key) {
            self.hits += 1;
            log::debug!("search cache hit for {}={:?}", parameter, key.1);
            return Ok(rows.clone());
        }

        self.misses += 1;
        let rows = run_search(books, parameter, &choice);

        while self.entries.len() >= self.capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }
        self.order.push_back(key.clone());
        self.entries.insert(key, rows.clone());
        Ok(rows)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// (hits, misses) since creation
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}
