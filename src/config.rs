use crate::book::KNOWN_CATEGORIES;
use crate::error::{DashboardError, Result};
use crate::query::SEARCH_CACHE_CAPACITY;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

// Environment overrides
pub const CONFIG_ENV: &str = "BOOKSHELF_CONFIG";
pub const SOURCE_ENV: &str = "BOOKSHELF_SOURCE";

/// Storage format of the reading log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Csv,
    Xlsx,
}

/// Where the reading log lives
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Path of the exported sheet
    pub path: PathBuf,

    /// Format; inferred from the extension of `path` when omitted
    pub kind: Option<SourceKind>,

    /// Worksheet to read from a workbook; the first one when omitted
    pub sheet: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/books.csv"),
            kind: None,
            sheet: None,
        }
    }
}

impl SourceConfig {
    /// Resolves the source format, falling back to the file extension
    pub fn resolved_kind(&self) -> Result<SourceKind> {
        if let Some(kind) = self.kind {
            return Ok(kind);
        }

        let extension = self
            .path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase());

        match extension.as_deref() {
            Some("csv") => Ok(SourceKind::Csv),
            Some("xlsx") | Some("xls") => Ok(SourceKind::Xlsx),
            Some(ext) => Err(DashboardError::Config(format!(
                "unsupported source extension: {}",
                ext
            ))),
            None => Err(DashboardError::Config(format!(
                "cannot infer source format of {}",
                self.path.display()
            ))),
        }
    }
}

/// Settings for the dashboard and the report binary
///
/// Every field has a default, so an empty JSON object is a valid config.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Browser tab title
    pub title: String,

    /// Heading shown above the metrics
    pub heading: String,

    /// Address the web server listens on
    pub bind_addr: String,

    /// Rows per page of the book grid
    pub page_size: usize,

    /// Distinct searches remembered between reloads
    pub search_cache_size: usize,

    /// Re-read the source every time the dashboard page is requested
    pub reload_on_page_load: bool,

    /// Values offered by the category picker (besides "All")
    pub categories: Vec<String>,

    pub source: SourceConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            title: "My Books Catalog".to_string(),
            heading: "My Year in Books".to_string(),
            bind_addr: "127.0.0.1:3000".to_string(),
            page_size: 20,
            search_cache_size: SEARCH_CACHE_CAPACITY,
            reload_on_page_load: true,
            categories: KNOWN_CATEGORIES.iter().map(|c| c.to_string()).collect(),
            source: SourceConfig::default(),
        }
    }
}

impl DashboardConfig {
    /// Reads a JSON config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            DashboardError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content)
            .map_err(|e| DashboardError::Config(format!("malformed {}: {}", path.display(), e)))
    }

    /// Builds the effective configuration for a binary
    ///
    /// The config file comes from `arg`, then `BOOKSHELF_CONFIG`; without
    /// either the defaults are used. `BOOKSHELF_SOURCE` replaces the source path.
    pub fn resolve(arg: Option<&str>) -> Result<Self> {
        let file = arg
            .map(str::to_string)
            .or_else(|| std::env::var(CONFIG_ENV).ok());

        let mut config = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        if let Ok(source) = std::env::var(SOURCE_ENV) {
            config.source.path = PathBuf::from(source);
        }

        if config.page_size == 0 {
            return Err(DashboardError::Config(
                "page_size must be at least 1".to_string(),
            ));
        }

        Ok(config)
    }
}
