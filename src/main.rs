use clap::Parser;
use log::info;
use profilescraper::cli::Args;
use profilescraper::{Crawler, DiskStorage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .filter_module("selectors", log::LevelFilter::Warn)
        .filter_module("html5ever", log::LevelFilter::Error)
        .parse_default_env()
        .init();

    let args = Args::parse();
    let config = args.run_config()?;
    let renderer = args.renderer(&config)?;

    let crawler = Crawler::new(renderer, config)?;
    let storage = DiskStorage::new(&args.output);
    let summary = crawler.run(&storage).await?;

    if let Some(path) = &args.failures_output {
        DiskStorage::new(path).write_json(&summary.skipped).await?;
        info!("Wrote {} skipped profiles to {}", summary.skipped.len(), path.display());
    }

    crawler.stats().print_summary();
    println!(
        "\nSaved {} profiles to {} ({} skipped)",
        summary.succeeded,
        storage.path().display(),
        summary.skipped.len()
    );

    Ok(())
}
