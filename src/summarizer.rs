use crate::types::{
    Category, IngestError, Result, SummarizationErrorReason, SummaryResult,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

const OPENAI_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";
const ANTHROPIC_MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Cost/latency control on backend input, not a correctness requirement.
const MAX_INPUT_CHARS: usize = 4000;

const ANALYST_INSTRUCTION: &str = "You are an expert VC content analyst. Analyze the given article and provide:\n\
1. A concise 2-3 sentence summary\n\
2. 3-5 key takeaways (bullet points)\n\
3. Category (one of: market_trends, founder_advice, industry_analysis, investment_thesis, portfolio_updates)\n\n\
Format your response as JSON with keys: \"summary\", \"keyTakeaways\" (array), \"category\"";

/// Tokens shorter than these words carry no signal for the fallback
/// takeaway heuristic.
const STOP_WORDS: [&str; 15] = [
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "from",
];

/// Seam between the pipeline and summarization, so tests can substitute
/// failing or canned backends.
#[async_trait]
pub trait Summarize: Send + Sync {
    async fn summarize(&self, body_text: &str) -> Result<SummaryResult>;
}

#[derive(Debug, Clone, Default)]
pub struct SummarizerConfig {
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
}

impl SummarizerConfig {
    pub fn from_env() -> Self {
        Self {
            openai_api_key: non_empty_env("OPENAI_API_KEY"),
            anthropic_api_key: non_empty_env("ANTHROPIC_API_KEY"),
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendChoice {
    /// OpenAI-compatible chat completions endpoint.
    Primary,
    /// Anthropic-compatible messages endpoint.
    Secondary,
    /// Deterministic local heuristic; never fails.
    Fallback,
}

/// Pure selection over current configuration: primary credential wins,
/// then secondary, then the local fallback.
pub fn select_backend(config: &SummarizerConfig) -> BackendChoice {
    if config.openai_api_key.is_some() {
        BackendChoice::Primary
    } else if config.anthropic_api_key.is_some() {
        BackendChoice::Secondary
    } else {
        BackendChoice::Fallback
    }
}

enum ConfigSource {
    /// Re-read the environment on every call so rotated credentials take
    /// effect without a restart.
    Env,
    Fixed(SummarizerConfig),
}

/// Turns article body text into a structured summary through whichever
/// backend the current configuration selects. Selection happens fresh on
/// every call; a backend failure surfaces to the caller rather than
/// falling through to another backend here.
pub struct Summarizer {
    client: Client,
    config: ConfigSource,
}

impl Summarizer {
    pub fn from_env() -> Self {
        Self::build(ConfigSource::Env)
    }

    pub fn with_config(config: SummarizerConfig) -> Self {
        Self::build(ConfigSource::Fixed(config))
    }

    fn build(config: ConfigSource) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");
        Self { client, config }
    }

    fn current_config(&self) -> SummarizerConfig {
        match &self.config {
            ConfigSource::Env => SummarizerConfig::from_env(),
            ConfigSource::Fixed(config) => config.clone(),
        }
    }
}

#[async_trait]
impl Summarize for Summarizer {
    async fn summarize(&self, body_text: &str) -> Result<SummaryResult> {
        let config = self.current_config();
        match select_backend(&config) {
            BackendChoice::Primary => {
                let backend = OpenAiBackend {
                    client: self.client.clone(),
                    api_key: config.openai_api_key,
                };
                backend.summarize(body_text).await
            }
            BackendChoice::Secondary => {
                let backend = AnthropicBackend {
                    client: self.client.clone(),
                    api_key: config.anthropic_api_key,
                };
                backend.summarize(body_text).await
            }
            BackendChoice::Fallback => {
                debug!("No AI credential configured, using local fallback summary");
                Ok(local_fallback_summary(body_text))
            }
        }
    }
}

/// One remote summarization backend reachable over HTTP JSON.
#[async_trait]
pub trait SummarizationBackend: Send + Sync {
    fn name(&self) -> &'static str;
    async fn summarize(&self, text: &str) -> Result<SummaryResult>;
}

pub struct OpenAiBackend {
    client: Client,
    api_key: Option<String>,
}

impl OpenAiBackend {
    pub fn new(client: Client, api_key: Option<String>) -> Self {
        Self { client, api_key }
    }
}

#[async_trait]
impl SummarizationBackend for OpenAiBackend {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn summarize(&self, text: &str) -> Result<SummaryResult> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            IngestError::Configuration("OPENAI_API_KEY is not configured".to_string())
        })?;

        let body = json!({
            "model": "gpt-4-turbo-preview",
            "messages": [
                { "role": "system", "content": ANALYST_INSTRUCTION },
                {
                    "role": "user",
                    "content": format!("Please analyze this article:\n\n{}", truncate_chars(text, MAX_INPUT_CHARS)),
                },
            ],
            "temperature": 0.7,
            "max_tokens": 500,
        });

        let response = self
            .client
            .post(OPENAI_COMPLETIONS_URL)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| summarization_transport_error(self.name(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::Summarization {
                backend: self.name(),
                reason: SummarizationErrorReason::HttpStatus(status.as_u16()),
            });
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| summarization_transport_error(self.name(), e))?;

        let content = data["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| IngestError::Summarization {
                backend: self.name(),
                reason: SummarizationErrorReason::BadResponse(
                    "missing completion content".to_string(),
                ),
            })?;

        info!("OpenAI summary generated ({} chars of input)", text.len().min(MAX_INPUT_CHARS));
        parse_backend_summary(self.name(), content)
    }
}

pub struct AnthropicBackend {
    client: Client,
    api_key: Option<String>,
}

impl AnthropicBackend {
    pub fn new(client: Client, api_key: Option<String>) -> Self {
        Self { client, api_key }
    }
}

#[async_trait]
impl SummarizationBackend for AnthropicBackend {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    async fn summarize(&self, text: &str) -> Result<SummaryResult> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            IngestError::Configuration("ANTHROPIC_API_KEY is not configured".to_string())
        })?;

        let prompt = format!(
            "{}\n\nArticle to analyze:\n{}",
            ANALYST_INSTRUCTION,
            truncate_chars(text, MAX_INPUT_CHARS)
        );
        let body = json!({
            "model": "claude-3-sonnet-20240229",
            "max_tokens": 500,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let response = self
            .client
            .post(ANTHROPIC_MESSAGES_URL)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| summarization_transport_error(self.name(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::Summarization {
                backend: self.name(),
                reason: SummarizationErrorReason::HttpStatus(status.as_u16()),
            });
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| summarization_transport_error(self.name(), e))?;

        let content = data["content"][0]["text"]
            .as_str()
            .ok_or_else(|| IngestError::Summarization {
                backend: self.name(),
                reason: SummarizationErrorReason::BadResponse(
                    "missing message content".to_string(),
                ),
            })?;

        info!("Anthropic summary generated ({} chars of input)", text.len().min(MAX_INPUT_CHARS));
        parse_backend_summary(self.name(), content)
    }
}

fn summarization_transport_error(backend: &'static str, error: reqwest::Error) -> IngestError {
    warn!("Summarization transport failure ({}): {}", backend, error);
    IngestError::Summarization {
        backend,
        reason: SummarizationErrorReason::BadResponse(error.to_string()),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BackendSummary {
    #[serde(default)]
    summary: String,
    #[serde(default)]
    key_takeaways: Vec<String>,
    #[serde(default)]
    category: Option<String>,
}

/// Normalizes a backend's JSON text into a `SummaryResult`. Unknown or
/// missing categories coerce to `industry_analysis`; missing takeaways
/// become an empty list. Models habitually wrap JSON in markdown fences,
/// so those are stripped first.
pub fn parse_backend_summary(backend: &'static str, content: &str) -> Result<SummaryResult> {
    let stripped = strip_code_fences(content);
    let parsed: BackendSummary =
        serde_json::from_str(stripped).map_err(|e| IngestError::Summarization {
            backend,
            reason: SummarizationErrorReason::BadResponse(format!("invalid JSON: {}", e)),
        })?;

    Ok(SummaryResult {
        synopsis: parsed.summary,
        key_takeaways: parsed.key_takeaways,
        category: Category::parse_or_default(parsed.category.as_deref()),
    })
}

fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.trim_start_matches(['\r', '\n'])
        .strip_suffix("```")
        .unwrap_or(rest)
        .trim()
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// Deterministic extractive summary used when no AI backend is
/// configured. Pure and total: never fails, same input always yields the
/// same result, category is always `industry_analysis` since the
/// heuristic carries no classification signal.
pub fn local_fallback_summary(text: &str) -> SummaryResult {
    let synopsis = {
        let sentences: Vec<String> = split_sentences(text).into_iter().take(3).collect();
        if sentences.is_empty() {
            "Summary not available".to_string()
        } else {
            sentences.join(" ")
        }
    };

    let key_takeaways: Vec<String> = text
        .to_lowercase()
        .split_whitespace()
        .filter(|word| word.chars().count() > 5 && !STOP_WORDS.contains(word))
        .take(5)
        .map(|word| format!("• {}", capitalize(word)))
        .collect();

    SummaryResult {
        synopsis,
        key_takeaways: if key_takeaways.is_empty() {
            vec!["No key takeaways extracted".to_string()]
        } else {
            key_takeaways
        },
        category: Category::IndustryAnalysis,
    }
}

/// Sentence-like segments delimited by terminal punctuation, each
/// trimmed and carrying its terminator. Trailing text without a
/// terminator is not a segment.
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        current.push(ch);
        if matches!(ch, '.' | '!' | '?') {
            let trimmed = current.trim();
            // A bare terminator is punctuation noise, not a sentence.
            if trimmed.chars().any(|c| !matches!(c, '.' | '!' | '?')) {
                sentences.push(trimmed.to_string());
            }
            current.clear();
        }
    }
    sentences
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
