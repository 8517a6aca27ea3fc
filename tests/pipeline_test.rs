use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use venturewire::{
    FetchContent, FetchErrorReason, InMemoryStore, IngestError, Pipeline, PipelineConfig, Result,
    Summarize, SummarizationErrorReason, Summarizer, SummarizerConfig, SummaryResult,
};
use venturewire::types::Source;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .try_init();
}

fn test_source(slug: &str, feed_url: &str) -> Source {
    Source {
        name: format!("{} Capital", slug),
        slug: slug.to_string(),
        homepage_url: format!("https://{}.vc", slug),
        feed_url: feed_url.to_string(),
        page_url: String::new(),
        logo_url: format!("https://{}.vc/logo.svg", slug),
    }
}

fn rss_feed(item_count: usize) -> String {
    let items: String = (0..item_count)
        .map(|i| {
            format!(
                "<item><title>Post {i}</title><link>https://posts.example.com/{i}</link>\
                 <description>Great company raised money. It focuses on infrastructure. Founders ship fast.</description></item>"
            )
        })
        .collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <rss version=\"2.0\"><channel><title>Feed</title>{}</channel></rss>",
        items
    )
}

/// Serves canned payloads keyed by URL; unknown URLs fail like an
/// unreachable host.
struct StaticFetcher {
    payloads: HashMap<String, String>,
}

impl StaticFetcher {
    fn new(payloads: &[(&str, String)]) -> Self {
        Self {
            payloads: payloads
                .iter()
                .map(|(url, payload)| (url.to_string(), payload.clone()))
                .collect(),
        }
    }
}

#[async_trait]
impl FetchContent for StaticFetcher {
    async fn fetch_feed(&self, feed_url: &str) -> Result<String> {
        self.payloads
            .get(feed_url)
            .cloned()
            .ok_or_else(|| IngestError::Fetch {
                url: feed_url.to_string(),
                reason: FetchErrorReason::Network,
            })
    }

    async fn fetch_page(&self, page_url: &str) -> Result<String> {
        self.payloads
            .get(page_url)
            .cloned()
            .ok_or_else(|| IngestError::Fetch {
                url: page_url.to_string(),
                reason: FetchErrorReason::Network,
            })
    }
}

/// Behaves like an AI backend answering HTTP 500 on every call.
struct FailingSummarizer;

#[async_trait]
impl Summarize for FailingSummarizer {
    async fn summarize(&self, _body_text: &str) -> Result<SummaryResult> {
        Err(IngestError::Summarization {
            backend: "openai",
            reason: SummarizationErrorReason::HttpStatus(500),
        })
    }
}

fn fallback_summarizer() -> Arc<Summarizer> {
    Arc::new(Summarizer::with_config(SummarizerConfig::default()))
}

#[tokio::test]
async fn pass_ingests_feed_sources_end_to_end() {
    init_tracing();

    let fetcher = StaticFetcher::new(&[("https://good.vc/feed", rss_feed(3))]);
    let store = Arc::new(InMemoryStore::new());
    let pipeline = Pipeline::new(
        vec![test_source("good", "https://good.vc/feed")],
        Arc::new(fetcher),
        fallback_summarizer(),
        store.clone(),
        PipelineConfig::default(),
    );

    let report = pipeline.run().await;

    assert_eq!(report.sources.len(), 1);
    assert_eq!(report.sources[0].fetched, 1);
    assert_eq!(report.sources[0].extracted, 3);
    assert_eq!(report.sources[0].summarized, 3);
    assert_eq!(report.sources[0].failed, 0);
    assert_eq!(store.article_count().await, 3);

    let stored = store
        .get_article("https://posts.example.com/0")
        .await
        .unwrap();
    assert_eq!(stored.article.title, "Post 0");
    assert!(!stored.summary.synopsis.is_empty());
}

#[tokio::test]
async fn broken_source_does_not_abort_the_run() {
    init_tracing();

    let fetcher = StaticFetcher::new(&[("https://good.vc/feed", rss_feed(2))]);
    let store = Arc::new(InMemoryStore::new());
    let pipeline = Pipeline::new(
        vec![
            test_source("down", "https://down.vc/feed"),
            test_source("good", "https://good.vc/feed"),
        ],
        Arc::new(fetcher),
        fallback_summarizer(),
        store.clone(),
        PipelineConfig::default(),
    );

    let report = pipeline.run().await;

    assert_eq!(report.sources.len(), 2);
    let down = report
        .sources
        .iter()
        .find(|s| s.source_slug == "down")
        .unwrap();
    assert_eq!(down.extracted, 0);
    assert_eq!(down.failed, 1);

    let good = report
        .sources
        .iter()
        .find(|s| s.source_slug == "good")
        .unwrap();
    assert_eq!(good.extracted, 2);
    assert_eq!(store.article_count().await, 2);
}

#[tokio::test]
async fn unparseable_feed_counts_as_source_failure() {
    init_tracing();

    let fetcher = StaticFetcher::new(&[(
        "https://weird.vc/feed",
        "definitely not xml".to_string(),
    )]);
    let store = Arc::new(InMemoryStore::new());
    let pipeline = Pipeline::new(
        vec![test_source("weird", "https://weird.vc/feed")],
        Arc::new(fetcher),
        fallback_summarizer(),
        store.clone(),
        PipelineConfig::default(),
    );

    let report = pipeline.run().await;

    assert_eq!(report.sources[0].fetched, 1);
    assert_eq!(report.sources[0].extracted, 0);
    assert_eq!(report.sources[0].failed, 1);
    assert_eq!(store.article_count().await, 0);
}

#[tokio::test]
async fn failed_summarization_persists_placeholder_and_counts_failure() {
    init_tracing();

    let fetcher = StaticFetcher::new(&[("https://good.vc/feed", rss_feed(2))]);
    let store = Arc::new(InMemoryStore::new());
    let pipeline = Pipeline::new(
        vec![test_source("good", "https://good.vc/feed")],
        Arc::new(fetcher),
        Arc::new(FailingSummarizer),
        store.clone(),
        PipelineConfig::default(),
    );

    let report = pipeline.run().await;

    assert_eq!(report.sources[0].extracted, 2);
    assert_eq!(report.sources[0].summarized, 0);
    assert_eq!(report.sources[0].failed, 2);

    // Articles are never dropped over a summarizer error; the placeholder
    // is the visible marker.
    assert_eq!(store.article_count().await, 2);
    let stored = store
        .get_article("https://posts.example.com/0")
        .await
        .unwrap();
    assert_eq!(stored.summary, SummaryResult::placeholder());
}

#[tokio::test]
async fn feed_window_caps_articles_per_pass() {
    init_tracing();

    let fetcher = StaticFetcher::new(&[("https://busy.vc/feed", rss_feed(25))]);
    let store = Arc::new(InMemoryStore::new());
    let pipeline = Pipeline::new(
        vec![test_source("busy", "https://busy.vc/feed")],
        Arc::new(fetcher),
        fallback_summarizer(),
        store.clone(),
        PipelineConfig::default(),
    );

    let report = pipeline.run().await;

    assert_eq!(report.sources[0].extracted, 20);
    assert_eq!(store.article_count().await, 20);
}

#[tokio::test]
async fn replaying_identical_content_stays_idempotent() {
    init_tracing();

    let store = Arc::new(InMemoryStore::new());
    for _ in 0..2 {
        let fetcher = StaticFetcher::new(&[("https://good.vc/feed", rss_feed(3))]);
        let pipeline = Pipeline::new(
            vec![test_source("good", "https://good.vc/feed")],
            Arc::new(fetcher),
            fallback_summarizer(),
            store.clone(),
            PipelineConfig::default(),
        );
        pipeline.run().await;
    }

    assert_eq!(store.article_count().await, 3);
}

#[tokio::test]
async fn items_without_urls_are_skipped_not_persisted() {
    init_tracing();

    let feed = "<?xml version=\"1.0\"?><rss version=\"2.0\"><channel><title>F</title>\
                <item><title>No link here</title><description>Body text for the item.</description></item>\
                <item><title>Linked</title><link>https://posts.example.com/linked</link></item>\
                </channel></rss>";
    let fetcher = StaticFetcher::new(&[("https://gaps.vc/feed", feed.to_string())]);
    let store = Arc::new(InMemoryStore::new());
    let pipeline = Pipeline::new(
        vec![test_source("gaps", "https://gaps.vc/feed")],
        Arc::new(fetcher),
        fallback_summarizer(),
        store.clone(),
        PipelineConfig::default(),
    );

    let report = pipeline.run().await;

    assert_eq!(report.sources[0].extracted, 2);
    assert_eq!(report.sources[0].skipped, 1);
    assert_eq!(store.article_count().await, 1);
}

#[tokio::test]
async fn page_only_source_is_scraped_once() {
    init_tracing();

    let html = r#"<html><head><title>Insights</title>
        <meta property="og:description" content="Firm insights page.">
        </head><body><article>Quarterly thoughts on markets and more.</article></body></html>"#;

    let mut source = test_source("pages", "");
    source.page_url = "https://pages.vc/insights".to_string();

    let fetcher = StaticFetcher::new(&[("https://pages.vc/insights", html.to_string())]);
    let store = Arc::new(InMemoryStore::new());
    let pipeline = Pipeline::new(
        vec![source],
        Arc::new(fetcher),
        fallback_summarizer(),
        store.clone(),
        PipelineConfig::default(),
    );

    let report = pipeline.run().await;

    assert_eq!(report.sources[0].fetched, 1);
    assert_eq!(report.sources[0].extracted, 1);
    let stored = store.get_article("https://pages.vc/insights").await.unwrap();
    assert_eq!(stored.article.title, "Insights");
    assert_eq!(stored.article.summary_text.as_deref(), Some("Firm insights page."));
}

#[tokio::test]
async fn cancellation_prevents_new_source_passes() {
    init_tracing();

    let fetcher = StaticFetcher::new(&[("https://good.vc/feed", rss_feed(3))]);
    let store = Arc::new(InMemoryStore::new());
    let pipeline = Pipeline::new(
        vec![
            test_source("good", "https://good.vc/feed"),
            test_source("other", "https://good.vc/feed"),
        ],
        Arc::new(fetcher),
        fallback_summarizer(),
        store.clone(),
        PipelineConfig::default(),
    );

    pipeline.cancel_token().cancel();
    let report = pipeline.run().await;

    assert_eq!(report.sources.len(), 2);
    assert!(report.sources.iter().all(|s| s.fetched == 0));
    assert_eq!(store.article_count().await, 0);
}
