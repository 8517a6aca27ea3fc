use crate::extractor::{extract_from_feed, extract_from_page};
use crate::fetcher::FetchContent;
use crate::store::ArticleStore;
use crate::summarizer::Summarize;
use crate::types::{PipelineConfig, PublishableArticle, RawArticle, Source, SummaryResult};
use futures::stream::{self, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Cooperative stop signal. Cancelling prevents new source passes from
/// starting; in-flight network calls complete or time out normally.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Per-source tally for one pass.
#[derive(Debug, Clone, Default)]
pub struct SourceReport {
    pub source_slug: String,
    /// Raw payloads retrieved (one per feed or page).
    pub fetched: usize,
    /// Articles extracted from those payloads.
    pub extracted: usize,
    /// Articles that received a real (non-placeholder) summary.
    pub summarized: usize,
    /// Fetch/extract/summarize/persist failures attributed to the source.
    pub failed: usize,
    /// Articles skipped because their canonical URL was unresolvable.
    pub skipped: usize,
}

impl SourceReport {
    fn empty(slug: &str) -> Self {
        Self {
            source_slug: slug.to_string(),
            ..Self::default()
        }
    }
}

/// Terminal state of one pass over the registry. Always reached; a fully
/// broken source contributes a zero-article report instead of aborting
/// the run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub sources: Vec<SourceReport>,
}

impl RunReport {
    pub fn total_extracted(&self) -> usize {
        self.sources.iter().map(|s| s.extracted).sum()
    }

    pub fn total_summarized(&self) -> usize {
        self.sources.iter().map(|s| s.summarized).sum()
    }

    pub fn total_failed(&self) -> usize {
        self.sources.iter().map(|s| s.failed).sum()
    }
}

/// Orchestrates one ingestion pass: for every registry source, fetch and
/// extract, summarize each article, and emit the combined record to the
/// store. Sources are independent of one another and run concurrently up
/// to a bounded worker count; per-source article summarization is bounded
/// separately.
pub struct Pipeline {
    sources: Vec<Source>,
    fetcher: Arc<dyn FetchContent>,
    summarizer: Arc<dyn Summarize>,
    store: Arc<dyn ArticleStore>,
    config: PipelineConfig,
    cancel: CancelToken,
}

impl Pipeline {
    pub fn new(
        sources: Vec<Source>,
        fetcher: Arc<dyn FetchContent>,
        summarizer: Arc<dyn Summarize>,
        store: Arc<dyn ArticleStore>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            sources,
            fetcher,
            summarizer,
            store,
            config,
            cancel: CancelToken::new(),
        }
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// One pass over the registry. Never fails: every source failure is
    /// recorded in the report and the terminal state is always reached.
    pub async fn run(&self) -> RunReport {
        info!("Starting ingestion pass over {} sources", self.sources.len());

        let reports: Vec<SourceReport> = stream::iter(self.sources.iter())
            .map(|source| self.process_source(source))
            .buffer_unordered(self.config.source_concurrency.max(1))
            .collect()
            .await;

        let report = RunReport { sources: reports };
        info!(
            "Ingestion pass complete: {} extracted, {} summarized, {} failed",
            report.total_extracted(),
            report.total_summarized(),
            report.total_failed()
        );
        report
    }

    async fn process_source(&self, source: &Source) -> SourceReport {
        let mut report = SourceReport::empty(&source.slug);

        if self.cancel.is_cancelled() {
            debug!("Run cancelled, skipping source {}", source.slug);
            return report;
        }

        let articles = match self.discover_articles(source, &mut report).await {
            Some(articles) => articles,
            None => return report,
        };
        report.extracted = articles.len();

        let outcomes: Vec<(RawArticle, SummaryResult, bool)> = stream::iter(articles)
            .map(|article| self.summarize_article(source, article))
            .buffer_unordered(self.config.summary_concurrency.max(1))
            .collect()
            .await;

        for (article, summary, summarize_ok) in outcomes {
            if article.canonical_url.is_empty() {
                debug!(
                    "Skipping unresolvable article from {} (empty URL): {}",
                    source.slug, article.title
                );
                report.skipped += 1;
                continue;
            }

            if summarize_ok {
                report.summarized += 1;
            } else {
                report.failed += 1;
            }

            let publishable = PublishableArticle {
                source: source.clone(),
                article,
                summary,
            };
            if let Err(e) = self.store.upsert_article(&publishable).await {
                warn!(
                    "Failed to persist article {} from {}: {}",
                    publishable.article.canonical_url, source.slug, e
                );
                report.failed += 1;
            }
        }

        info!(
            "Source {} done: {} extracted, {} summarized, {} failed, {} skipped",
            source.slug, report.extracted, report.summarized, report.failed, report.skipped
        );
        report
    }

    /// Fetches and extracts the articles of one source, preferring its
    /// feed; a source with only a page URL gets a single page scrape. Any
    /// failure here isolates to this source.
    async fn discover_articles(
        &self,
        source: &Source,
        report: &mut SourceReport,
    ) -> Option<Vec<RawArticle>> {
        if !source.feed_url.is_empty() {
            let payload = match self.fetcher.fetch_feed(&source.feed_url).await {
                Ok(payload) => payload,
                Err(e) => {
                    warn!("Failed to fetch feed for {}: {}", source.slug, e);
                    report.failed += 1;
                    return None;
                }
            };
            report.fetched = 1;

            match extract_from_feed(&payload, self.config.max_feed_items) {
                Ok(articles) => Some(articles),
                Err(e) => {
                    warn!("Failed to extract feed for {}: {}", source.slug, e);
                    report.failed += 1;
                    None
                }
            }
        } else if !source.page_url.is_empty() {
            let html = match self.fetcher.fetch_page(&source.page_url).await {
                Ok(html) => html,
                Err(e) => {
                    warn!("Failed to fetch page for {}: {}", source.slug, e);
                    report.failed += 1;
                    return None;
                }
            };
            report.fetched = 1;
            Some(vec![extract_from_page(&html, &source.page_url)])
        } else {
            warn!("Source {} has no feed or page locator", source.slug);
            None
        }
    }

    /// Summarizes one article. A summarizer failure never drops the
    /// article: it is emitted with the visible placeholder summary and
    /// counted as failed.
    async fn summarize_article(
        &self,
        source: &Source,
        article: RawArticle,
    ) -> (RawArticle, SummaryResult, bool) {
        let body = article
            .body_text
            .as_deref()
            .or(article.summary_text.as_deref())
            .unwrap_or_default();

        match self.summarizer.summarize(body).await {
            Ok(summary) => (article, summary, true),
            Err(e) => {
                warn!(
                    "Summarization failed for {} ({}): {}",
                    article.canonical_url, source.slug, e
                );
                (article, SummaryResult::placeholder(), false)
            }
        }
    }
}
