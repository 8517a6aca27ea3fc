use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use venturewire::{
    default_sources, ArticleStore, FetchConfig, Fetcher, InMemoryStore, Pipeline, PipelineConfig,
    Summarizer,
};

#[derive(Parser, Debug)]
#[command(name = "venturewire", about = "VC article ingestion and summarization pipeline")]
struct Args {
    /// HTTP timeout in seconds for feed and page fetches
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,

    /// How many sources to process concurrently
    #[arg(long, default_value_t = 3)]
    sources: usize,

    /// How many articles of one source to summarize concurrently
    #[arg(long, default_value_t = 4)]
    summaries: usize,

    /// Per-source cap on feed items processed in one pass
    #[arg(long, default_value_t = 20)]
    max_items: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    info!("Starting VentureWire ingestion pass");

    let mut fetch_config = FetchConfig::from_env();
    fetch_config.timeout = Duration::from_secs(args.timeout_secs);

    let pipeline_config = PipelineConfig {
        max_feed_items: args.max_items,
        source_concurrency: args.sources,
        summary_concurrency: args.summaries,
    };

    let fetcher = Arc::new(Fetcher::new(fetch_config)?);
    let summarizer = Arc::new(Summarizer::from_env());
    let store = Arc::new(InMemoryStore::new());

    let pipeline = Pipeline::new(
        default_sources(),
        fetcher,
        summarizer,
        store.clone(),
        pipeline_config,
    );

    let report = pipeline.run().await;

    for source in &report.sources {
        info!(
            "{}: fetched={} extracted={} summarized={} failed={} skipped={}",
            source.source_slug,
            source.fetched,
            source.extracted,
            source.summarized,
            source.failed,
            source.skipped
        );
    }

    if report.total_failed() > 0 {
        warn!("{} failures recorded this pass", report.total_failed());
    }
    info!(
        "Pass complete: {} articles persisted across {} firms",
        store.article_count().await,
        store.list_firms().await?.len()
    );

    Ok(())
}
