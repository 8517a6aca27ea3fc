use crate::types::{IngestError, RawArticle, Result};
use chrono::Utc;
use feed_rs::parser;
use scraper::{Html, Selector};
use tracing::{debug, info};
use url::Url;

/// Words-per-minute divisor for reading time estimates.
const WORDS_PER_MINUTE: u32 = 200;

/// Reading time assigned to feed items carrying neither content nor a
/// summary snippet.
const DEFAULT_READING_TIME_MINUTES: u32 = 5;

/// Ordered cascade of structural selectors tried for page body text.
/// First non-empty match wins; `body` text is the last resort. Best
/// effort: navigation and boilerplate can leak through and that is an
/// accepted limitation.
const CONTENT_SELECTORS: [&str; 5] = [
    "article",
    "main",
    ".post-content",
    ".article-content",
    ".entry-content",
];

/// Parses a syndication feed payload into canonical articles, capped at
/// `max_items` per pass.
///
/// Missing fields never fail extraction: title defaults to `"Untitled"`,
/// a missing link yields an empty canonical URL (skipped downstream),
/// a missing publish date defaults to now. Only an unparseable payload
/// is an error.
pub fn extract_from_feed(payload: &str, max_items: usize) -> Result<Vec<RawArticle>> {
    let feed = parser::parse(payload.as_bytes())
        .map_err(|e| IngestError::Extraction(format!("feed parse: {}", e)))?;

    let total = feed.entries.len();
    let mut articles = Vec::with_capacity(total.min(max_items));

    for entry in feed.entries.into_iter().take(max_items) {
        let title = entry
            .title
            .map(|t| t.content)
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| "Untitled".to_string());

        let canonical_url = entry
            .links
            .first()
            .map(|link| link.href.clone())
            .unwrap_or_default();

        let raw_summary = entry.summary.map(|s| s.content);
        let raw_content = entry.content.and_then(|c| c.body);

        // Image comes from whichever embedded markup is available;
        // relative paths are unresolvable without a base URL and are
        // dropped.
        let image_url = raw_content
            .as_deref()
            .or(raw_summary.as_deref())
            .and_then(extract_image_from_content);

        let summary_text = raw_summary
            .as_deref()
            .map(html_to_text)
            .filter(|s| !s.is_empty());
        let body_text = raw_content
            .as_deref()
            .map(html_to_text)
            .filter(|s| !s.is_empty());

        let reading_time_minutes = body_text
            .as_deref()
            .or(summary_text.as_deref())
            .map(estimate_reading_time)
            .unwrap_or(DEFAULT_READING_TIME_MINUTES);

        let author = entry
            .authors
            .first()
            .map(|person| person.name.clone())
            .filter(|name| !name.trim().is_empty());

        articles.push(RawArticle {
            title,
            canonical_url,
            summary_text,
            body_text,
            image_url,
            published_at: entry.published.unwrap_or_else(Utc::now),
            author,
            reading_time_minutes,
        });
    }

    info!(
        "Extracted {} of {} feed entries (cap {})",
        articles.len(),
        total,
        max_items
    );
    Ok(articles)
}

/// Scrapes a single article page into a canonical record. Social metadata
/// tags are preferred, then the document title, then a truncated prefix
/// of the extracted body text. Total over any markup; HTML parsing is
/// lenient by construction.
pub fn extract_from_page(html: &str, page_url: &str) -> RawArticle {
    let document = Html::parse_document(html);

    let title = meta_content(&document, r#"meta[property="og:title"]"#)
        .or_else(|| select_text(&document, "title"))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "Untitled".to_string());

    let body_text = extract_body_text(&document);

    let summary_text = meta_content(&document, r#"meta[property="og:description"]"#)
        .or_else(|| meta_content(&document, r#"meta[name="description"]"#))
        .filter(|s| !s.is_empty())
        .or_else(|| {
            let prefix: String = body_text.chars().take(200).collect();
            if prefix.is_empty() {
                None
            } else {
                Some(prefix)
            }
        });

    let image_url = meta_content(&document, r#"meta[property="og:image"]"#);

    let reading_time_minutes = estimate_reading_time(&body_text);
    debug!(
        "Scraped page {} ({} words, {} min read)",
        page_url,
        body_text.split_whitespace().count(),
        reading_time_minutes
    );

    RawArticle {
        title,
        canonical_url: page_url.to_string(),
        summary_text,
        body_text: if body_text.is_empty() {
            None
        } else {
            Some(body_text)
        },
        image_url,
        published_at: Utc::now(),
        author: None,
        reading_time_minutes,
    }
}

/// `ceil(word_count / 200)`. Zero for empty text; monotonic in the
/// number of whitespace-separated words.
pub fn estimate_reading_time(text: &str) -> u32 {
    let words = text.split_whitespace().count() as u32;
    words.div_ceil(WORDS_PER_MINUTE)
}

/// First `<img src>` in embedded item markup, kept only when it is a
/// scheme-qualified absolute URL.
pub fn extract_image_from_content(html_content: &str) -> Option<String> {
    let fragment = Html::parse_fragment(html_content);
    let selector = Selector::parse("img").ok()?;
    let src = fragment
        .select(&selector)
        .next()
        .and_then(|img| img.value().attr("src"))?;

    if is_absolute_url(src) {
        Some(src.to_string())
    } else {
        None
    }
}

fn is_absolute_url(candidate: &str) -> bool {
    Url::parse(candidate)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Visible text of an HTML fragment with whitespace collapsed.
fn html_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text: Vec<_> = fragment
        .root_element()
        .text()
        .flat_map(str::split_whitespace)
        .collect();
    text.join(" ")
}

fn extract_body_text(document: &Html) -> String {
    for selector_str in CONTENT_SELECTORS {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            let text: Vec<_> = element.text().flat_map(str::split_whitespace).collect();
            let text = text.join(" ");
            if !text.is_empty() {
                return text;
            }
        }
    }

    // No structural container matched; fall back to everything visible.
    let Ok(body) = Selector::parse("body") else {
        return String::new();
    };
    document
        .select(&body)
        .next()
        .map(|el| {
            let text: Vec<_> = el.text().flat_map(str::split_whitespace).collect();
            text.join(" ")
        })
        .unwrap_or_default()
}

fn meta_content(document: &Html, selector_str: &str) -> Option<String> {
    let selector = Selector::parse(selector_str).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn select_text(document: &Html, selector_str: &str) -> Option<String> {
    let selector = Selector::parse(selector_str).ok()?;
    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
}
