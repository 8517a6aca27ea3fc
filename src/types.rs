use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A configured origin (a VC firm's feed or blog page) from which articles
/// are discovered. Registry entries are built once at startup and never
/// mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub name: String,
    pub slug: String,
    pub homepage_url: String,
    pub feed_url: String,
    pub page_url: String,
    pub logo_url: String,
}

/// Canonical article record produced by the extractor. `canonical_url` is
/// the identity key; an empty URL means the item was unresolvable and must
/// not be persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawArticle {
    pub title: String,
    pub canonical_url: String,
    pub summary_text: Option<String>,
    pub body_text: Option<String>,
    pub image_url: Option<String>,
    pub published_at: DateTime<Utc>,
    pub author: Option<String>,
    pub reading_time_minutes: u32,
}

/// Closed category set for summarized articles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    MarketTrends,
    FounderAdvice,
    IndustryAnalysis,
    InvestmentThesis,
    PortfolioUpdates,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::MarketTrends,
        Category::FounderAdvice,
        Category::IndustryAnalysis,
        Category::InvestmentThesis,
        Category::PortfolioUpdates,
    ];

    /// Total parse over whatever a backend returned. Unknown or missing
    /// values coerce to `IndustryAnalysis` rather than failing or passing
    /// through.
    pub fn parse_or_default(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("market_trends") => Category::MarketTrends,
            Some("founder_advice") => Category::FounderAdvice,
            Some("industry_analysis") => Category::IndustryAnalysis,
            Some("investment_thesis") => Category::InvestmentThesis,
            Some("portfolio_updates") => Category::PortfolioUpdates,
            _ => Category::IndustryAnalysis,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::MarketTrends => "market_trends",
            Category::FounderAdvice => "founder_advice",
            Category::IndustryAnalysis => "industry_analysis",
            Category::InvestmentThesis => "investment_thesis",
            Category::PortfolioUpdates => "portfolio_updates",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Category::MarketTrends => "Market Trends",
            Category::FounderAdvice => "Founder Advice",
            Category::IndustryAnalysis => "Industry Analysis",
            Category::InvestmentThesis => "Investment Thesis",
            Category::PortfolioUpdates => "Portfolio Updates",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured summary produced for one article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryResult {
    pub synopsis: String,
    pub key_takeaways: Vec<String>,
    pub category: Category,
}

impl SummaryResult {
    /// Marker summary persisted when summarization failed for an article.
    /// The pipeline never drops an extracted article over a summarizer
    /// error; it emits this placeholder and counts the failure.
    pub fn placeholder() -> Self {
        Self {
            synopsis: "Summary unavailable".to_string(),
            key_takeaways: Vec::new(),
            category: Category::IndustryAnalysis,
        }
    }
}

/// The record the pipeline emits to the store collaborator: the article,
/// its summary and the owning source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishableArticle {
    pub source: Source,
    pub article: RawArticle,
    pub summary: SummaryResult,
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "VentureWire/1.0".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl FetchConfig {
    /// `USER_AGENT` overrides the default identity header; sources block
    /// anonymous crawlers.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(agent) = std::env::var("USER_AGENT") {
            if !agent.trim().is_empty() {
                config.user_agent = agent;
            }
        }
        config
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Per-pass cap on feed items processed for one source. A policy
    /// choice bounding work per pass, not a parsing limitation.
    pub max_feed_items: usize,
    /// How many sources run concurrently.
    pub source_concurrency: usize,
    /// How many articles of one source are summarized concurrently.
    pub summary_concurrency: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_feed_items: 20,
            source_concurrency: 3,
            summary_concurrency: 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorReason {
    Timeout,
    Network,
    HttpStatus(u16),
}

impl std::fmt::Display for FetchErrorReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchErrorReason::Timeout => write!(f, "timeout"),
            FetchErrorReason::Network => write!(f, "network"),
            FetchErrorReason::HttpStatus(code) => write!(f, "http status {}", code),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummarizationErrorReason {
    BadResponse(String),
    HttpStatus(u16),
}

impl std::fmt::Display for SummarizationErrorReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SummarizationErrorReason::BadResponse(detail) => {
                write!(f, "bad response: {}", detail)
            }
            SummarizationErrorReason::HttpStatus(code) => write!(f, "http status {}", code),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: FetchErrorReason },

    #[error("unparseable payload: {0}")]
    Extraction(String),

    #[error("summarization failed ({backend}): {reason}")]
    Summarization {
        backend: &'static str,
        reason: SummarizationErrorReason,
    },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("store error: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, IngestError>;
