use crate::types::{Category, PublishableArticle, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Persisted firm identity a `Source` resolves to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Firm {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub logo_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    pub slug: String,
    pub name: String,
}

/// Store collaborator boundary. The pipeline only needs idempotent
/// upserts keyed by canonical URL plus firm/topic resolution; schema and
/// query language are the store's business.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Insert or replace the article for its canonical URL, returning the
    /// persistent id. Replaying identical upstream content must not
    /// create a second record.
    async fn upsert_article(&self, article: &PublishableArticle) -> Result<Uuid>;

    async fn list_firms(&self) -> Result<Vec<Firm>>;

    async fn list_topics(&self) -> Result<Vec<Topic>>;
}

#[derive(Debug, Clone)]
struct StoredArticle {
    id: Uuid,
    article: PublishableArticle,
}

/// Reference store used by tests and the demo binary. Firm ids are minted
/// once per slug; article identity is the canonical URL.
#[derive(Default)]
pub struct InMemoryStore {
    articles: RwLock<HashMap<String, StoredArticle>>,
    firms: RwLock<HashMap<String, Firm>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn article_count(&self) -> usize {
        self.articles.read().await.len()
    }

    pub async fn get_article(&self, canonical_url: &str) -> Option<PublishableArticle> {
        self.articles
            .read()
            .await
            .get(canonical_url)
            .map(|stored| stored.article.clone())
    }
}

#[async_trait]
impl ArticleStore for InMemoryStore {
    async fn upsert_article(&self, article: &PublishableArticle) -> Result<Uuid> {
        // Resolve (or mint) the firm identity before writing the article.
        {
            let mut firms = self.firms.write().await;
            firms
                .entry(article.source.slug.clone())
                .or_insert_with(|| Firm {
                    id: Uuid::new_v4(),
                    name: article.source.name.clone(),
                    slug: article.source.slug.clone(),
                    logo_url: article.source.logo_url.clone(),
                });
        }

        let mut articles = self.articles.write().await;
        let key = article.article.canonical_url.clone();
        match articles.get_mut(&key) {
            Some(existing) => {
                debug!("Replacing stored article for {}", key);
                existing.article = article.clone();
                Ok(existing.id)
            }
            None => {
                let id = Uuid::new_v4();
                articles.insert(
                    key,
                    StoredArticle {
                        id,
                        article: article.clone(),
                    },
                );
                Ok(id)
            }
        }
    }

    async fn list_firms(&self) -> Result<Vec<Firm>> {
        let firms = self.firms.read().await;
        let mut all: Vec<_> = firms.values().cloned().collect();
        all.sort_by(|a, b| a.slug.cmp(&b.slug));
        Ok(all)
    }

    async fn list_topics(&self) -> Result<Vec<Topic>> {
        Ok(Category::ALL
            .iter()
            .map(|category| Topic {
                slug: category.as_str().to_string(),
                name: category.display_name().to_string(),
            })
            .collect())
    }
}
