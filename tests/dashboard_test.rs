mod common;

use bookshelf::chart::{Mark, SortOrder};
use bookshelf::dashboard::{Selection, build_dashboard};
use bookshelf::downloader::to_csv;
use bookshelf::grid::BookGrid;
use bookshelf::query::{SearchParameter, search};
use common::{sample_books, season_books};
use serde_json::json;

#[test]
fn grid_is_newest_first_with_unfinished_last() {
    let grid = BookGrid::new(&season_books(), 20);
    let months: Vec<Option<String>> = grid
        .rows
        .iter()
        .map(|r| r.read_month.map(|m| m.to_string()))
        .collect();
    assert_eq!(months[0].as_deref(), Some("2023-04"));
    assert_eq!(months[1].as_deref(), Some("2023-04"));
    assert_eq!(months.last().unwrap(), &None);
}

#[test]
fn grid_hides_only_the_thumbnail_column() {
    let grid = BookGrid::new(&sample_books(), 20);
    let hidden: Vec<&str> = grid
        .columns
        .iter()
        .filter(|c| c.hidden)
        .map(|c| c.field.as_str())
        .collect();
    assert_eq!(hidden, vec!["Thumbnail"]);
    assert_eq!(grid.columns.len(), 6);
    assert!(grid.selection.single);
    assert!(grid.selection.use_checkbox);
}

#[test]
fn grid_pages() {
    let grid = BookGrid::new(&season_books(), 4);
    assert_eq!(grid.pagination.page_count, 2);
    assert_eq!(grid.page(0).len(), 4);
    assert_eq!(grid.page(1).len(), 2);
    assert!(grid.page(2).is_empty());
}

#[test]
fn selected_row_reveals_thumbnail_only_when_present() {
    let grid = BookGrid::new(&sample_books(), 20);
    // Newest first: B and C (Feb), then A (Jan)
    let with_cover = grid
        .rows
        .iter()
        .position(|r| r.book_name == "B")
        .unwrap();
    let without_cover = grid
        .rows
        .iter()
        .position(|r| r.book_name == "A")
        .unwrap();

    assert_eq!(
        grid.selected_thumbnail(with_cover),
        Some("https://covers.example/b.jpg")
    );
    assert_eq!(grid.selected_thumbnail(without_cover), None);
    assert_eq!(grid.selected_thumbnail(99), None);
}

#[test]
fn dashboard_holds_every_chart() {
    let view = build_dashboard(&sample_books(), &Selection::default(), 20).unwrap();
    let ids: Vec<&str> = view.charts.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(
        ids,
        vec!["category_share", "cumulative", "by_category", "by_month", "by_author"]
    );

    assert_eq!(view.metrics.total_books, 3);
    assert_eq!(view.category, "All");
    assert!(view.search_rows.is_none());
    assert!(view.selected_thumbnail.is_none());

    let share = view.chart("category_share").unwrap();
    assert_eq!(share.mark, Mark::Arc);
    assert_eq!(share.data[0], json!({"Category": "Fantasy", "Count": 2, "Percentage": 66.67}));

    let cumulative = view.chart("cumulative").unwrap();
    assert_eq!(cumulative.mark, Mark::Line);
    assert!(cumulative.point);
    assert_eq!(cumulative.x.as_ref().unwrap().field, "ReadYearMonth");
    assert_eq!(cumulative.data.len(), 4);
}

#[test]
fn author_chart_follows_category_filter() {
    let selection = Selection {
        category: Some("Mystery".to_string()),
        ..Selection::default()
    };
    let view = build_dashboard(&sample_books(), &selection, 20).unwrap();
    let authors = view.chart("by_author").unwrap();
    assert_eq!(authors.data, vec![json!({"Authors": "Author One", "Count": 1})]);
    assert_eq!(
        authors.x.as_ref().unwrap().sort,
        Some(SortOrder::ByYDescending)
    );
    // The other charts still cover every book
    assert_eq!(view.metrics.total_books, 3);
}

#[test]
fn category_chart_highlights_the_clicked_bar() {
    let selection = Selection {
        highlight: Some("Mystery".to_string()),
        ..Selection::default()
    };
    let view = build_dashboard(&sample_books(), &selection, 20).unwrap();
    let chart = view.chart("by_category").unwrap();

    let selected = chart.selection.as_ref().unwrap();
    assert_eq!(selected.selected.as_deref(), Some("Mystery"));
    assert_eq!(selected.unselected_color, "lightgray");

    for row in &chart.data {
        let highlighted = row["Highlighted"].as_bool().unwrap();
        assert_eq!(highlighted, row["Category"] == "Mystery");
    }
}

#[test]
fn dashboard_runs_the_search_and_reveals_thumbnail() {
    let books = sample_books();
    let grid = BookGrid::new(&books, 20);
    let row = grid.rows.iter().position(|r| r.book_name == "B").unwrap();

    let selection = Selection {
        search: Some(SearchParameter::Author),
        choice: Some("Author Two".to_string()),
        row: Some(row),
        ..Selection::default()
    };
    let view = build_dashboard(&books, &selection, 20).unwrap();
    let rows = view.search_rows.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].book_name, "B");
    assert_eq!(
        view.selected_thumbnail.as_deref(),
        Some("https://covers.example/b.jpg")
    );
}

#[test]
fn selection_treats_blank_form_fields_as_unset() {
    let selection: Selection =
        serde_json::from_value(json!({"search": "", "row": "", "page": "2", "category": "Poetry"}))
            .unwrap();
    assert_eq!(selection.search, None);
    assert_eq!(selection.row, None);
    assert_eq!(selection.page, Some(2));
    assert_eq!(selection.category(), "Poetry");

    let selection: Selection = serde_json::from_value(json!({"search": "Rating"})).unwrap();
    assert_eq!(selection.search, Some(SearchParameter::Rating));
}

#[test]
fn view_serializes_with_sheet_column_names() {
    let view = build_dashboard(&sample_books(), &Selection::default(), 20).unwrap();
    let value = serde_json::to_value(&view).unwrap();
    assert_eq!(value["metrics"]["totalBooks"], 3);
    assert_eq!(value["metrics"]["maxBooksInAnyMonth"], 2);
    assert_eq!(value["grid"]["rows"][0]["ReadYearMonth"], "2023-02");
    assert_eq!(value["grid"]["pagination"]["pageSize"], 20);
}

#[test]
fn csv_export_quotes_awkward_fields() {
    let mut books = sample_books();
    books[0].record.book_name = "Guns, Germs, and Steel".to_string();
    let rows = search(&books, SearchParameter::Rating, "0").unwrap();
    let csv = to_csv(&rows);

    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(
        lines[1],
        "\"Guns, Germs, and Steel\",Author One,,2023-01-15,4,Fantasy"
    );
}

#[test]
fn blank_category_means_all() {
    let selection: Selection = serde_json::from_value(json!({"category": ""})).unwrap();
    assert_eq!(selection.category(), "All");

    let view = build_dashboard(&sample_books(), &selection, 20).unwrap();
    assert_eq!(view.category, "All");
    assert_eq!(view.chart("by_author").unwrap().data.len(), 2);
}
