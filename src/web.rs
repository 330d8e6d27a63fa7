#![cfg(not(tarpaulin_include))]

use bookshelf::app;
use bookshelf::config::DashboardConfig;
use bookshelf::loader::source_from_config;
use std::env;

/// Main entry point for the dashboard web server
///
/// # Arguments
/// * Optional path of a JSON config file (falls back to `BOOKSHELF_CONFIG`,
///   then to the defaults)
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    let config = DashboardConfig::resolve(args.get(1).map(String::as_str))?;

    // The source handle is built once and owned by the server state
    let source = source_from_config(&config.source)?;
    log::info!("Starting dashboard over {}", source.describe());

    app::run(config, source).await
}
