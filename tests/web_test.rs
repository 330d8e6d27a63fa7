#![cfg(feature = "web")]

mod common;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use bookshelf::app::{AppState, router};
use bookshelf::config::DashboardConfig;
use bookshelf::graph::{CHART_NAMES, chart_svg};
use bookshelf::loader::{CsvSource, MemorySource};
use common::{sample_books, sample_records, season_books};
use std::io::Write;
use std::sync::Arc;
use tower::ServiceExt;

fn memory_app() -> axum::Router {
    let source = MemorySource::from_records(&sample_records());
    let state = AppState::new(DashboardConfig::default(), Box::new(source)).unwrap();
    router(Arc::new(state))
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8_lossy(&body).to_string())
}

#[test]
fn every_chart_renders_as_svg() {
    for books in [sample_books(), season_books(), Vec::new()] {
        for name in CHART_NAMES {
            let svg = chart_svg(name, &books, "All", Some("Fantasy"))
                .unwrap()
                .unwrap();
            assert!(svg.contains("<svg"), "{} did not render", name);
        }
    }
    println!("✓ {} charts rendered", CHART_NAMES.len());
}

#[test]
fn unknown_chart_name_renders_nothing() {
    assert!(chart_svg("pie", &sample_books(), "All", None).unwrap().is_none());
}

#[tokio::test]
async fn dashboard_json_route() {
    let (status, body) = get(memory_app(), "/api/dashboard?category=Fantasy").await;
    assert_eq!(status, StatusCode::OK);

    let view: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(view["metrics"]["totalBooks"], 3);
    assert_eq!(view["category"], "Fantasy");
    assert_eq!(view["charts"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn dashboard_page_renders_metrics() {
    let (status, body) = get(memory_app(), "/?row=0&search=&choice=").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("My Year in Books"));
    assert!(body.contains("Most books in a month"));
    assert!(body.contains("/charts/by_author?category=All"));
    // Row 0 is book B, the one with a cover
    assert!(body.contains("https://covers.example/b.jpg"));
}

#[tokio::test]
async fn chart_route_serves_svg() {
    let app = memory_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/charts/by_month")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/svg+xml");

    let (status, _) = get(memory_app(), "/charts/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn search_route_and_bad_choice() {
    let (status, body) = get(memory_app(), "/api/search?parameter=Author&choice=Author%20One").await;
    assert_eq!(status, StatusCode::OK);
    let rows: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(rows.as_array().unwrap().len(), 2);

    let (status, body) = get(memory_app(), "/api/search?parameter=Rating&choice=great").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("\"status\":\"error\""));

    let (status, _) = get(memory_app(), "/api/search?parameter=Publisher").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn csv_export_route() {
    let (status, body) = get(memory_app(), "/api/export/csv?search=Category&choice=Mystery").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.lines().count(), 2);
    assert!(body.starts_with("BookName,Authors,StartDate,FinishDate,Rating,Category"));
}

#[tokio::test]
async fn reload_picks_up_source_changes_and_clears_cache() {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(file, "BookName,Authors,FinishDate,Rating,Category").unwrap();
    writeln!(file, "A,Author One,2023-01-15,4,Fantasy").unwrap();
    file.flush().unwrap();

    let config = DashboardConfig {
        reload_on_page_load: false,
        ..DashboardConfig::default()
    };
    let state = AppState::new(config, Box::new(CsvSource::new(file.path()))).unwrap();
    let app = router(Arc::new(state));

    let (_, body) = get(app.clone(), "/api/search?parameter=Category&choice=Fantasy").await;
    let rows: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(rows.as_array().unwrap().len(), 1);

    writeln!(file, "B,Author Two,2023-02-10,5,Fantasy").unwrap();
    file.flush().unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/reload")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (_, body) = get(app, "/api/search?parameter=Category&choice=Fantasy").await;
    let rows: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(rows.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn bad_source_data_answers_unprocessable() {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(file, "BookName,Authors,FinishDate,Rating,Category").unwrap();
    writeln!(file, "A,Author One,2023-01-15,4,Fantasy").unwrap();
    file.flush().unwrap();

    let state = AppState::new(DashboardConfig::default(), Box::new(CsvSource::new(file.path()))).unwrap();
    let app = router(Arc::new(state));

    writeln!(file, "B,Author Two,whenever,5,Fantasy").unwrap();
    file.flush().unwrap();

    // The page reloads the source before rendering
    let (status, body) = get(app, "/").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body.contains("whenever"));
}

#[tokio::test]
async fn page_number_past_the_end_renders_an_empty_grid() {
    let (status, body) = get(memory_app(), "/?page=18446744073709551615").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("My Year in Books"));

    let (status, _) = get(memory_app(), "/?page=7").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn export_links_carry_the_current_search() {
    let (_, body) = get(memory_app(), "/?search=ReadMonth&choice=2023-02").await;
    assert!(body.contains("/api/export/csv?search=ReadMonth&choice=2023-02"));
    assert!(body.contains("/api/export/xlsx?search=ReadMonth&choice=2023-02"));

    let (_, body) = get(memory_app(), "/").await;
    assert!(body.contains("href=\"/api/export/csv\""));
}

#[tokio::test]
async fn blank_category_selects_all_in_the_picker() {
    let (status, body) = get(memory_app(), "/?category=").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<option value=\"All\" selected>All</option>"));
}
