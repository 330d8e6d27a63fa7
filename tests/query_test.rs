mod common;

use bookshelf::error::DashboardError;
use bookshelf::query::{
    SEARCH_CACHE_CAPACITY, SearchCache, SearchChoice, SearchParameter, filter_by_category, search,
    summary_metrics,
};
use common::{date, sample_books, season_books};

#[test]
fn summary_metrics_of_sample() {
    let metrics = summary_metrics(&sample_books());
    assert_eq!(metrics.total_books, 3);
    assert_eq!(metrics.distinct_author_count, 2);
    assert_eq!(metrics.max_books_in_any_month, 2);
}

#[test]
fn multi_author_string_counts_once() {
    let mut books = sample_books();
    books[1].record.authors = "Author One, Author Two".to_string();
    // "Author One" and "Author One, Author Two"
    assert_eq!(summary_metrics(&books).distinct_author_count, 2);
}

#[test]
fn summary_metrics_without_dated_books() {
    let metrics = summary_metrics(&[]);
    assert_eq!(metrics.total_books, 0);
    assert_eq!(metrics.max_books_in_any_month, 0);
}

#[test]
fn filter_all_returns_everything() {
    let books = season_books();
    assert_eq!(filter_by_category(&books, "All"), books);
    assert_eq!(filter_by_category(&books, ""), books);
}

#[test]
fn filter_is_exact_and_case_sensitive() {
    let books = season_books();
    let fantasy = filter_by_category(&books, "Fantasy");
    assert_eq!(fantasy.len(), 3);
    assert!(fantasy.iter().all(|b| b.record.category == "Fantasy"));
    assert!(filter_by_category(&books, "fantasy").is_empty());
}

#[test]
fn rating_zero_returns_full_projection() {
    let books = sample_books();
    for sentinel in ["0", "0.0", ""] {
        let rows = search(&books, SearchParameter::Rating, sentinel).unwrap();
        assert_eq!(rows.len(), books.len());
    }

    let rows = search(&books, SearchParameter::Rating, "0.0").unwrap();
    assert_eq!(rows[0].book_name, "A");
    assert_eq!(rows[0].authors, "Author One");
    assert_eq!(rows[0].finish_date, Some(date(2023, 1, 15)));
    assert_eq!(rows[0].rating, 4.0);
    assert_eq!(rows[0].category, "Fantasy");
}

#[test]
fn search_by_each_field() {
    let books = sample_books();

    let by_author = search(&books, SearchParameter::Author, "Author One").unwrap();
    let names: Vec<&str> = by_author.iter().map(|r| r.book_name.as_str()).collect();
    assert_eq!(names, vec!["A", "C"]);

    let by_month = search(&books, SearchParameter::ReadMonth, "2023-02").unwrap();
    assert_eq!(by_month.len(), 2);

    let by_rating = search(&books, SearchParameter::Rating, "5").unwrap();
    assert_eq!(by_rating.len(), 1);
    assert_eq!(by_rating[0].book_name, "B");

    let by_category = search(&books, SearchParameter::Category, "Mystery").unwrap();
    assert_eq!(by_category.len(), 1);
}

#[test]
fn search_has_no_partial_matching() {
    let books = sample_books();
    assert!(search(&books, SearchParameter::Author, "Author").unwrap().is_empty());
    assert!(search(&books, SearchParameter::Category, "mystery").unwrap().is_empty());
}

#[test]
fn invalid_choices_are_rejected() {
    let books = sample_books();
    assert!(matches!(
        search(&books, SearchParameter::Rating, "five"),
        Err(DashboardError::InvalidQuery(_))
    ));
    assert!(matches!(
        search(&books, SearchParameter::ReadMonth, "Feb 2023"),
        Err(DashboardError::InvalidQuery(_))
    ));
}

#[test]
fn search_parameter_from_str() {
    assert_eq!("Author".parse::<SearchParameter>().unwrap(), SearchParameter::Author);
    assert_eq!("readmonth".parse::<SearchParameter>().unwrap(), SearchParameter::ReadMonth);
    assert!("Publisher".parse::<SearchParameter>().is_err());
}

#[test]
fn choice_keys_are_normalized() {
    let a = SearchChoice::parse(SearchParameter::Rating, "4").unwrap();
    let b = SearchChoice::parse(SearchParameter::Rating, "4.0").unwrap();
    assert_eq!(a.key(), b.key());
    assert_eq!(
        SearchChoice::parse(SearchParameter::Rating, "0").unwrap(),
        SearchChoice::Any
    );
}

#[test]
fn cache_reuses_results_within_a_generation() {
    let books = sample_books();
    let mut cache = SearchCache::new();

    let first = cache.search(&books, 1, SearchParameter::Author, "Author One").unwrap();
    let second = cache.search(&books, 1, SearchParameter::Author, "Author One").unwrap();
    assert_eq!(first, second);
    assert_eq!(cache.stats(), (1, 1));
    assert_eq!(cache.len(), 1);
}

#[test]
fn cache_is_dropped_on_new_generation() {
    let mut books = sample_books();
    let mut cache = SearchCache::new();

    let before = cache.search(&books, 1, SearchParameter::Category, "Mystery").unwrap();
    assert_eq!(before.len(), 1);

    books[0].record.category = "Mystery".to_string();
    let after = cache.search(&books, 2, SearchParameter::Category, "Mystery").unwrap();
    assert_eq!(after.len(), 2);
    assert_eq!(cache.generation(), 2);
    assert_eq!(cache.stats(), (0, 2));
}

#[test]
fn explicit_invalidate_empties_cache() {
    let books = sample_books();
    let mut cache = SearchCache::new();
    cache.search(&books, 0, SearchParameter::Rating, "").unwrap();
    assert!(!cache.is_empty());

    cache.invalidate(1);
    assert!(cache.is_empty());
    assert_eq!(cache.generation(), 1);
}

#[test]
fn cache_keeps_only_the_most_recent_searches() {
    let books = sample_books();
    let mut cache = SearchCache::with_capacity(4);

    for i in 0..1000 {
        let author = format!("Author {}", i);
        cache.search(&books, 1, SearchParameter::Author, &author).unwrap();
    }
    assert_eq!(cache.len(), 4);
    assert_eq!(cache.capacity(), 4);

    // The newest entry survives, the oldest was evicted
    cache.search(&books, 1, SearchParameter::Author, "Author 999").unwrap();
    assert_eq!(cache.stats(), (1, 1000));
    cache.search(&books, 1, SearchParameter::Author, "Author 0").unwrap();
    assert_eq!(cache.stats(), (1, 1001));
    assert_eq!(cache.len(), 4);
}

#[test]
fn default_cache_is_bounded() {
    let books = sample_books();
    let mut cache = SearchCache::new();
    for i in 0..200 {
        cache.search(&books, 1, SearchParameter::Category, &format!("C{}", i)).unwrap();
    }
    assert_eq!(cache.len(), SEARCH_CACHE_CAPACITY);
}
