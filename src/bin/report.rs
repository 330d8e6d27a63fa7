#![cfg(not(tarpaulin_include))]

use bookshelf::config::DashboardConfig;
use bookshelf::derive::{
    author_counts, category_breakdown, cumulative_category_series, monthly_counts,
    with_read_month,
};
use bookshelf::loader::{load_books, source_from_config};
use bookshelf::query::summary_metrics;
use std::env;

// Prints the dashboard numbers of the configured reading log
fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = env::args().collect();
    if args.len() > 2 {
        eprintln!("Usage: {} [config.json]", args[0]);
        return Ok(());
    }

    let config = DashboardConfig::resolve(args.get(1).map(String::as_str))?;
    let source = source_from_config(&config.source)?;
    let books = with_read_month(load_books(source.as_ref())?);

    let metrics = summary_metrics(&books);
    println!("{}", config.heading);
    println!("  Number of Books:       {}", metrics.total_books);
    println!("  Number of Authors:     {}", metrics.distinct_author_count);
    println!("  Most books in a month: {}", metrics.max_books_in_any_month);

    println!("\nBooks by Month");
    for (month, count) in monthly_counts(&books) {
        println!("  {}  {:>3}", month, count);
    }

    println!("\nBooks by Category");
    for share in category_breakdown(&books) {
        println!(
            "  {:<28} {:>3}  {:>6.2}%",
            share.category, share.count, share.percentage
        );
    }

    println!("\nBooks by Author(s)");
    for (author, count) in author_counts(&books) {
        println!("  {:<40} {:>3}", author, count);
    }

    println!("\nCumulative Count by Category over Months");
    for point in cumulative_category_series(&books) {
        println!(
            "  {}  {:<28} {:>3}",
            point.read_month, point.category, point.cumulative_count
        );
    }

    Ok(())
}
