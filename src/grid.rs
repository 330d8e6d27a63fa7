use crate::book::{ReadBook, YearMonth};
use serde::Serialize;
use std::cmp::Reverse;

pub const GRID_COLUMNS: &[&str] = &[
    "BookName",
    "Authors",
    "Rating",
    "Category",
    "ReadYearMonth",
    "Thumbnail",
];

/// Column revealed only through row selection
const HIDDEN_COLUMN: &str = "Thumbnail";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridColumn {
    pub field: String,
    pub hidden: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GridRow {
    pub book_name: String,
    pub authors: String,
    pub rating: f64,
    pub category: String,
    #[serde(rename = "ReadYearMonth")]
    pub read_month: Option<YearMonth>,
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page_size: usize,
    pub page_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowSelection {
    pub single: bool,
    pub use_checkbox: bool,
}

/// Sortable, paginated table of every book, newest first
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookGrid {
    pub columns: Vec<GridColumn>,
    pub rows: Vec<GridRow>,
    pub pagination: Pagination,
    pub selection: RowSelection,
}

impl BookGrid {
    /// Lays out the books; `page_size` of zero is treated as one
    pub fn new(books: &[ReadBook], page_size: usize) -> Self {
        let page_size = page_size.max(1);

        let mut rows: Vec<GridRow> = books
            .iter()
            .map(|b| GridRow {
                book_name: b.record.book_name.clone(),
                authors: b.record.authors.clone(),
                rating: b.record.rating,
                category: b.record.category.clone(),
                read_month: b.read_month,
                thumbnail: b.record.thumbnail.clone(),
            })
            .collect();
        // Unfinished books (no month) sort last
        rows.sort_by_key(|row| Reverse(row.read_month));

        let columns = GRID_COLUMNS
            .iter()
            .map(|field| GridColumn {
                field: field.to_string(),
                hidden: *field == HIDDEN_COLUMN,
            })
            .collect();

        BookGrid {
            columns,
            pagination: Pagination {
                page_size,
                page_count: rows.len().div_ceil(page_size),
            },
            rows,
            selection: RowSelection {
                single: true,
                use_checkbox: true,
            },
        }
    }

    /// Rows of a zero-based page; empty past the last page
    pub fn page(&self, page: usize) -> &[GridRow] {
        let start = page.saturating_mul(self.pagination.page_size);
        if start >= self.rows.len() {
            return &[];
        }
        let end = (start + self.pagination.page_size).min(self.rows.len());
        &self.rows[start..end]
    }

    /// Thumbnail of the selected row, when the row exists and has one
    pub fn selected_thumbnail(&self, row: usize) -> Option<&str> {
        self.rows.get(row)?.thumbnail.as_deref()
    }
}
