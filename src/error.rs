use thiserror::Error;

/// Errors raised while loading, deriving or presenting the book table
#[derive(Debug, Error)]
pub enum DashboardError {
    /// The tabular source could not be reached or returned something unreadable
    #[error("data source error: {0}")]
    DataSource(String),

    /// The source answered, but a column is missing or a cell cannot be parsed
    #[error("data shape error: {0}")]
    DataShape(String),

    /// A search choice that cannot be interpreted for its field
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DashboardError {
    pub fn missing_column(column: &str) -> Self {
        DashboardError::DataShape(format!("expected column '{}' is missing", column))
    }

    pub fn bad_cell(row: usize, column: &str, value: &str, expected: &str) -> Self {
        DashboardError::DataShape(format!(
            "row {}: column '{}' holds '{}', expected {}",
            row, column, value, expected
        ))
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
