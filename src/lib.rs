pub mod extractor;
pub mod fetcher;
pub mod pipeline;
pub mod sources;
pub mod store;
pub mod summarizer;
pub mod types;

pub use extractor::{estimate_reading_time, extract_from_feed, extract_from_page};
pub use fetcher::{FetchContent, Fetcher};
pub use pipeline::{CancelToken, Pipeline, RunReport, SourceReport};
pub use sources::{default_sources, slugify};
pub use store::{ArticleStore, Firm, InMemoryStore, Topic};
pub use summarizer::{
    local_fallback_summary, select_backend, BackendChoice, SummarizationBackend, Summarize,
    Summarizer, SummarizerConfig,
};
pub use types::*;
