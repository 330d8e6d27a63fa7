/*!
# Bookshelf

A personal reading dashboard. It reads the log of books read from a
spreadsheet export, derives summary statistics and aggregations, and serves
them as charts and an interactive table.

## Pipeline

Every page render runs the same three stages over the whole log:

### Loader
- **Technologies**: CSV / XLSX (calamine)
- A [`loader::BookSource`] answers the equivalent of `SELECT * FROM <sheet>`;
  [`loader::load_books`] maps its columns by header name into
  [`book::BookRecord`]s

### Derivation
- Month of completion (`YYYY-MM`) per book
- Books per month, per category (with percentages), per author
- Running total per category over every observed month

### Presentation
- Summary metrics, category filter, exact-match search with a result cache
- Declarative chart descriptors and the book grid
- [`dashboard::build_dashboard`]: one pure function from (books, selection)
  to the whole view

## Web shell (feature `web`)
- **Technologies**: Rust, axum, handlebars, plotters
- `/` dashboard page, `/api/dashboard` JSON view, `/charts/{name}` SVG,
  `/api/search`, `/api/export/{csv,xlsx}`, `POST /api/reload`

## Modules

- **book**: book records, `YYYY-MM` months, date cell parsing
- **config**: JSON configuration and environment overrides
- **error**: error taxonomy
- **loader**: tabular sources and row to record conversion
- **derive**: aggregate tables
- **query**: metrics, filters, search and the search cache
- **chart**: chart descriptors
- **grid**: book grid descriptor
- **dashboard**: the assembled view
- **downloader**: CSV / XLSX export of the book table
- **graph**: SVG rendering of the charts
- **app**: routing and handlers
*/

pub mod book;
pub mod chart;
pub mod config;
pub mod dashboard;
pub mod derive;
pub mod downloader;
pub mod error;
pub mod grid;
pub mod loader;
pub mod query;

#[cfg(feature = "web")]
pub mod app;
#[cfg(feature = "web")]
pub mod graph;

/// Re-export the everyday types to make them easier to use
pub use book::{BookRecord, ReadBook, YearMonth};
pub use config::DashboardConfig;
pub use dashboard::{DashboardView, Selection, build_dashboard};
pub use error::{DashboardError, Result};
pub use loader::{BookSource, load_books};
