#![allow(dead_code)]

use bookshelf::book::{BookRecord, ReadBook};
use bookshelf::derive::with_read_month;
use chrono::NaiveDate;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// The three-book log used throughout the tests
pub fn sample_records() -> Vec<BookRecord> {
    vec![
        BookRecord::new("A", "Author One", "Fantasy")
            .finished_on(date(2023, 1, 15))
            .rated(4.0),
        BookRecord::new("B", "Author Two", "Fantasy")
            .finished_on(date(2023, 2, 10))
            .rated(5.0)
            .with_thumbnail("https://covers.example/b.jpg"),
        BookRecord::new("C", "Author One", "Mystery")
            .finished_on(date(2023, 2, 20))
            .rated(3.0),
    ]
}

pub fn sample_books() -> Vec<ReadBook> {
    with_read_month(sample_records())
}

/// A longer log spanning categories that start in different months
pub fn season_books() -> Vec<ReadBook> {
    with_read_month(vec![
        BookRecord::new("Dune", "Frank Herbert", "Fantasy").finished_on(date(2023, 1, 3)),
        BookRecord::new("Poems", "Mary Oliver", "Poetry").finished_on(date(2023, 3, 9)),
        BookRecord::new("Hobbit", "J.R.R. Tolkien", "Fantasy").finished_on(date(2023, 3, 21)),
        BookRecord::new("Maus", "Art Spiegelman", "Biography/Autobiography")
            .finished_on(date(2023, 4, 2)),
        BookRecord::new("Rebecca", "Daphne du Maurier", "Mystery").finished_on(date(2023, 4, 30)),
        BookRecord::new("In Progress", "Frank Herbert", "Fantasy").started_on(date(2023, 5, 1)),
    ])
}
