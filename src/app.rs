#![cfg(feature = "web")]
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use handlebars::Handlebars;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::book::ReadBook;
use crate::config::DashboardConfig;
use crate::dashboard::{DashboardView, Selection, build_dashboard};
use crate::derive::with_read_month;
use crate::downloader;
use crate::error::DashboardError;
use crate::graph::{CHART_NAMES, chart_svg};
use crate::loader::{BookSource, load_books};
use crate::query::{ALL_CATEGORIES, DisplayRow, SearchCache, SearchParameter};

const DASHBOARD_TEMPLATE: &str = include_str!("./static/dashboard.hbs");

/// The loaded reading log and the load it came from
struct BookTable {
    books: Vec<ReadBook>,
    generation: u64,
}

pub struct AppState {
    config: DashboardConfig,
    source: Box<dyn BookSource>,
    table: RwLock<BookTable>,
    cache: Mutex<SearchCache>,
    templates: Handlebars<'static>,
}

impl AppState {
    /// Performs the first load; a source that cannot be read fails startup
    pub fn new(config: DashboardConfig, source: Box<dyn BookSource>) -> Result<Self, DashboardError> {
        let mut templates = Handlebars::new();
        templates
            .register_template_string("dashboard", DASHBOARD_TEMPLATE)
            .map_err(|e| DashboardError::Render(e.to_string()))?;

        let books = with_read_month(load_books(source.as_ref())?);
        let cache = SearchCache::with_capacity(config.search_cache_size);

        Ok(Self {
            config,
            source,
            table: RwLock::new(BookTable {
                books,
                generation: 1,
            }),
            cache: Mutex::new(cache),
            templates,
        })
    }

    /// Re-reads the source and drops every cached search
    ///
    /// On failure the previous table stays in place.
    pub fn reload(&self) -> Result<usize, DashboardError> {
        let books = with_read_month(load_books(self.source.as_ref())?);
        let count = books.len();

        let generation = {
            let mut table = self.table.write().unwrap_or_else(PoisonError::into_inner);
            table.books = books;
            table.generation += 1;
            table.generation
        };
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .invalidate(generation);

        log::info!("reloaded {} books (generation {})", count, generation);
        Ok(count)
    }

    /// Runs [`AppState::reload`] on the blocking thread pool
    async fn reload_blocking(self: &Arc<Self>) -> Result<usize, DashboardError> {
        let state = Arc::clone(self);
        tokio::task::spawn_blocking(move || state.reload())
            .await
            .map_err(|e| DashboardError::DataSource(format!("reload task failed: {}", e)))?
    }

    fn with_books<T>(&self, f: impl FnOnce(&[ReadBook], u64) -> T) -> T {
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
        f(&table.books, table.generation)
    }

    fn view(&self, selection: &Selection) -> Result<DashboardView, DashboardError> {
        self.with_books(|books, _| build_dashboard(books, selection, self.config.page_size))
    }

    fn cached_search(&self, parameter: SearchParameter, choice: &str) -> Result<Vec<DisplayRow>, DashboardError> {
        self.with_books(|books, generation| {
            self.cache
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .search(books, generation, parameter, choice)
        })
    }
}

#[derive(Serialize)]
struct StatusResponse {
    status: String,
    message: Option<String>,
}

#[derive(Deserialize)]
struct SearchQuery {
    parameter: String,
    #[serde(default)]
    choice: String,
}

/// A [`DashboardError`] answered over HTTP
pub struct ApiError(DashboardError);

impl From<DashboardError> for ApiError {
    fn from(e: DashboardError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            DashboardError::DataSource(_) => StatusCode::BAD_GATEWAY,
            DashboardError::DataShape(_) => StatusCode::UNPROCESSABLE_ENTITY,
            DashboardError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            DashboardError::Config(_) | DashboardError::Render(_) | DashboardError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        log::warn!("request failed: {}", self.0);

        (
            status,
            Json(StatusResponse {
                status: "error".to_string(),
                message: Some(self.0.to_string()),
            }),
        )
            .into_response()
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(dashboard_page))
        .route("/api/dashboard", get(dashboard_json))
        .route("/api/search", get(search_books))
        .route("/api/export/csv", get(export_csv))
        .route("/api/export/xlsx", get(export_xlsx))
        .route("/api/reload", post(reload_books))
        .route("/charts/:name", get(chart))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run(config: DashboardConfig, source: Box<dyn BookSource>) -> Result<(), Box<dyn std::error::Error>> {
    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState::new(config, source)?);
    let app = router(state);

    let listener = TcpListener::bind(&bind_addr).await?;
    log::info!("Listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn dashboard_page(
    Query(selection): Query<Selection>,
    State(state): State<Arc<AppState>>,
) -> Result<Html<String>, ApiError> {
    if state.config.reload_on_page_load {
        state.reload_blocking().await?;
    }

    let view = state.view(&selection)?;
    let context = page_context(&state.config, &view, &selection);
    let body = state
        .templates
        .render("dashboard", &context)
        .map_err(|e| DashboardError::Render(e.to_string()))?;

    Ok(Html(body))
}

async fn dashboard_json(
    Query(selection): Query<Selection>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardView>, ApiError> {
    Ok(Json(state.view(&selection)?))
}

async fn search_books(
    Query(query): Query<SearchQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<DisplayRow>>, ApiError> {
    let parameter: SearchParameter = query.parameter.parse()?;
    Ok(Json(state.cached_search(parameter, &query.choice)?))
}

async fn chart(
    Path(name): Path<String>,
    Query(selection): Query<Selection>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let svg = state.with_books(|books, _| {
        chart_svg(&name, books, selection.category(), selection.highlight())
    })?;

    match svg {
        Some(svg) => Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg).into_response()),
        None => Ok((
            StatusCode::NOT_FOUND,
            Json(StatusResponse {
                status: "error".to_string(),
                message: Some(format!("unknown chart '{}', expected one of {:?}", name, CHART_NAMES)),
            }),
        )
            .into_response()),
    }
}

/// Rows of the current search, or every book when no search is active
fn export_rows(state: &AppState, selection: &Selection) -> Result<Vec<DisplayRow>, DashboardError> {
    let parameter = selection.search.unwrap_or(SearchParameter::Author);
    let choice = match selection.search {
        Some(_) => selection.choice.as_deref().unwrap_or(""),
        None => "",
    };
    state.cached_search(parameter, choice)
}

async fn export_csv(
    Query(selection): Query<Selection>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let rows = export_rows(&state, &selection)?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"books.csv\""),
        ],
        downloader::to_csv(&rows),
    )
        .into_response())
}

async fn export_xlsx(
    Query(selection): Query<Selection>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let rows = export_rows(&state, &selection)?;
    let buffer =
        downloader::to_xlsx(&rows).map_err(|e| DashboardError::Render(e.to_string()))?;
    Ok((
        [
            (
                header::CONTENT_TYPE,
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            ),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"books.xlsx\""),
        ],
        buffer,
    )
        .into_response())
}

async fn reload_books(State(state): State<Arc<AppState>>) -> Result<Json<serde_json::Value>, ApiError> {
    let count = state.reload_blocking().await?;
    Ok(Json(json!({"status": "ok", "books": count})))
}

/// Link back to the dashboard with one selection field replaced
fn page_href(selection: &Selection, key: &str, value: &str) -> String {
    let mut pairs: Vec<(String, String)> = Vec::new();
    let mut push = |k: &str, v: Option<String>| {
        if k != key {
            if let Some(v) = v {
                pairs.push((k.to_string(), v));
            }
        }
    };
    push("category", selection.category.clone());
    push("highlight", selection.highlight.clone());
    push("search", selection.search.map(|p| p.to_string()));
    push("choice", selection.choice.clone());
    push("row", selection.row.map(|r| r.to_string()));
    push("page", selection.page.map(|p| p.to_string()));
    pairs.push((key.to_string(), value.to_string()));

    let query: Vec<String> = pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect();
    format!("/?{}", query.join("&"))
}

fn page_context(config: &DashboardConfig, view: &DashboardView, selection: &Selection) -> serde_json::Value {
    let category = selection.category();
    let highlight = selection.highlight().unwrap_or("");

    let categories: Vec<serde_json::Value> = std::iter::once(ALL_CATEGORIES.to_string())
        .chain(config.categories.iter().cloned())
        .map(|name| json!({"selected": name == category, "name": name}))
        .collect();

    let highlight_links: Vec<serde_json::Value> = view
        .chart("by_category")
        .map(|chart| {
            chart
                .data
                .iter()
                .filter_map(|row| row["Category"].as_str())
                .map(|name| {
                    json!({
                        "name": name,
                        "active": name == highlight,
                        "href": page_href(selection, "highlight", name),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    let page = selection.page.unwrap_or(0);
    let offset = page.saturating_mul(view.grid.pagination.page_size);
    let rows: Vec<serde_json::Value> = view
        .grid
        .page(page)
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let index = offset + i;
            json!({
                "row": row,
                "selected": selection.row == Some(index),
                "href": page_href(selection, "row", &index.to_string()),
            })
        })
        .collect();

    let pages: Vec<serde_json::Value> = (0..view.grid.pagination.page_count)
        .map(|p| {
            json!({
                "number": p + 1,
                "current": p == page,
                "href": page_href(selection, "page", &p.to_string()),
            })
        })
        .collect();

    let search_fields: Vec<serde_json::Value> = SearchParameter::ALL
        .iter()
        .map(|p| json!({"name": p.as_str(), "selected": selection.search == Some(*p)}))
        .collect();

    let export_query = match (selection.search, selection.choice.as_deref()) {
        (Some(parameter), Some(choice)) => format!(
            "?search={}&choice={}",
            parameter,
            urlencoding::encode(choice)
        ),
        (Some(parameter), None) => format!("?search={}", parameter),
        (None, _) => String::new(),
    };

    let encoded_category = urlencoding::encode(category);
    let encoded_highlight = urlencoding::encode(highlight);

    json!({
        "title": config.title,
        "heading": config.heading,
        "metrics": view.metrics,
        "categories": categories,
        "highlight_links": highlight_links,
        "chart_urls": {
            "category_share": "/charts/category_share",
            "cumulative": "/charts/cumulative",
            "by_category": format!("/charts/by_category?highlight={}", encoded_highlight),
            "by_month": "/charts/by_month",
            "by_author": format!("/charts/by_author?category={}", encoded_category),
        },
        "rows": rows,
        "pages": pages,
        "thumbnail": view.selected_thumbnail,
        "search_fields": search_fields,
        "choice": selection.choice.clone().unwrap_or_default(),
        "search_rows": view.search_rows,
        "export_urls": {
            "csv": format!("/api/export/csv{}", export_query),
            "xlsx": format!("/api/export/xlsx{}", export_query),
        },
    })
}
