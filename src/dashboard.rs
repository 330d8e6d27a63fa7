//! The whole dashboard as a pure function of (books, selection).
//!
//! Every interaction builds a fresh [`DashboardView`]; nothing derived is
//! kept between requests.

use crate::book::ReadBook;
use crate::chart::{
    ChartSpec, author_chart, category_count_chart, category_share_chart, cumulative_chart,
    monthly_chart,
};
use crate::derive::{
    author_counts, category_breakdown, category_counts, cumulative_category_series,
    month_category_counts,
};
use crate::error::Result;
use crate::grid::BookGrid;
use crate::query::{
    ALL_CATEGORIES, DisplayRow, SearchParameter, SummaryMetrics, filter_by_category, is_all,
    search, summary_metrics,
};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// What the user has picked on the page
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Selection {
    /// Category filter of the author chart; "All" when unset
    pub category: Option<String>,
    /// Category clicked in the category bar chart
    pub highlight: Option<String>,
    #[serde(deserialize_with = "blank_as_none")]
    pub search: Option<SearchParameter>,
    pub choice: Option<String>,
    /// Grid row whose thumbnail is shown
    #[serde(deserialize_with = "blank_as_none")]
    pub row: Option<usize>,
    /// Zero-based grid page
    #[serde(deserialize_with = "blank_as_none")]
    pub page: Option<usize>,
}

/// Form fields arrive as strings; an empty one means "not picked"
fn blank_as_none<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

impl Selection {
    pub fn category(&self) -> &str {
        self.category
            .as_deref()
            .filter(|c| !is_all(c))
            .unwrap_or(ALL_CATEGORIES)
    }

    pub fn highlight(&self) -> Option<&str> {
        self.highlight.as_deref().filter(|h| !h.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub metrics: SummaryMetrics,
    pub category: String,
    pub charts: Vec<ChartSpec>,
    pub grid: BookGrid,
    pub selected_thumbnail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_rows: Option<Vec<DisplayRow>>,
}

impl DashboardView {
    pub fn chart(&self, id: &str) -> Option<&ChartSpec> {
        self.charts.iter().find(|c| c.id == id)
    }
}

pub fn build_dashboard(
    books: &[ReadBook],
    selection: &Selection,
    page_size: usize,
) -> Result<DashboardView> {
    let category = selection.category();
    let by_category = filter_by_category(books, category);

    let charts = vec![
        category_share_chart(&category_breakdown(books)),
        cumulative_chart(&cumulative_category_series(books)),
        category_count_chart(&category_counts(books), selection.highlight()),
        monthly_chart(&month_category_counts(books)),
        author_chart(&author_counts(&by_category), category),
    ];

    let grid = BookGrid::new(books, page_size);
    let selected_thumbnail = selection
        .row
        .and_then(|row| grid.selected_thumbnail(row))
        .map(str::to_string);

    let search_rows = match selection.search {
        Some(parameter) => Some(search(
            books,
            parameter,
            selection.choice.as_deref().unwrap_or(""),
        )?),
        None => None,
    };

    Ok(DashboardView {
        metrics: summary_metrics(books),
        category: category.to_string(),
        charts,
        grid,
        selected_thumbnail,
        search_rows,
    })
}
