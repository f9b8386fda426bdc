use crate::article::{Article, NewArticle, ALL_CATEGORIES};
use crate::storage::ArticleStorage;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::{debug, error, info, warn};

/// Owns the article collection and mirrors every change to the storage port.
///
/// The collection is newest-first by construction. There is no delete or edit
/// operation; articles only ever gain views.
///
/// Assumes a single logical writer. Each mutation is a whole-collection
/// read-modify-write, so two stores over the same storage lose updates.
pub struct ArticleStore {
    storage: Box<dyn ArticleStorage>,
    articles: Vec<Article>,
}

impl ArticleStore {
    /// Open the store, loading whatever the storage currently holds.
    pub fn open(storage: impl ArticleStorage + 'static) -> Self {
        let storage: Box<dyn ArticleStorage> = Box::new(storage);
        let articles = load_articles(storage.as_ref());
        info!("Loaded {} articles", articles.len());
        Self { storage, articles }
    }

    /// Discard in-memory state and re-read the persisted collection.
    pub fn reload(&mut self) {
        self.articles = load_articles(self.storage.as_ref());
    }

    pub fn list(&self) -> &[Article] {
        &self.articles
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Article> {
        self.articles.iter().find(|article| article.id == id)
    }

    /// Articles in `category` (exact match), or all of them for [`ALL_CATEGORIES`].
    pub fn filter(&self, category: &str) -> Vec<Article> {
        if category == ALL_CATEGORIES {
            return self.articles.clone();
        }

        self.articles
            .iter()
            .filter(|article| article.category == category)
            .cloned()
            .collect()
    }

    pub fn create(&mut self, input: NewArticle) -> Article {
        self.create_at(input, Utc::now())
    }

    /// Create an article as of `now`.
    ///
    /// Input is stored as given; blank fields are the caller's concern.
    pub fn create_at(&mut self, input: NewArticle, now: DateTime<Utc>) -> Article {
        let article = Article {
            id: next_id(now, &self.articles),
            title: input.title,
            content: input.content,
            category: input.category,
            created_at: now,
            views: 0,
        };

        self.articles.insert(0, article.clone());
        self.persist();

        info!("Created article {} in {}", article.id, article.category);
        article
    }

    /// Add one view to the article with `id`.
    ///
    /// Returns the updated article. An unknown id changes nothing and writes nothing.
    pub fn increment_view(&mut self, id: &str) -> Option<Article> {
        let Some(article) = self.articles.iter_mut().find(|article| article.id == id) else {
            debug!("View increment for unknown article {}", id);
            return None;
        };

        article.views += 1;
        let updated = article.clone();
        self.persist();
        Some(updated)
    }

    fn persist(&self) {
        let blob = match serde_json::to_string(&self.articles) {
            Ok(blob) => blob,
            Err(e) => {
                error!("Failed to serialize articles: {}", e);
                return;
            }
        };

        // The in-memory collection stays authoritative until the next reload.
        if let Err(e) = self.storage.save(&blob) {
            error!("Failed to persist {} articles: {}", self.articles.len(), e);
        }
    }
}

/// Read the persisted collection. Anything unreadable counts as empty.
fn load_articles(storage: &dyn ArticleStorage) -> Vec<Article> {
    let blob = match storage.load() {
        Ok(Some(blob)) => blob,
        Ok(None) => return Vec::new(),
        Err(e) => {
            warn!("Failed to read persisted articles, starting empty: {}", e);
            return Vec::new();
        }
    };

    serde_json::from_str(&blob).unwrap_or_else(|e| {
        warn!("Persisted articles are malformed, starting empty: {}", e);
        Vec::new()
    })
}

/// Millisecond timestamp id, bumped past the largest existing numeric id so
/// that ids stay unique when the clock repeats or goes backwards.
fn next_id(now: DateTime<Utc>, articles: &[Article]) -> String {
    let candidate = i128::from(now.timestamp_millis());
    let newest = articles
        .iter()
        .filter_map(|article| article.id.parse::<i128>().ok())
        .max();

    match newest {
        Some(newest) if newest >= candidate => match newest.checked_add(1) {
            Some(next) => next.to_string(),
            None => first_unused_id(candidate, articles),
        },
        _ => candidate.to_string(),
    }
}

/// Smallest id at or after `from` that no article uses yet.
fn first_unused_id(from: i128, articles: &[Article]) -> String {
    let taken: HashSet<&str> = articles.iter().map(|article| article.id.as_str()).collect();
    (from..)
        .map(|id| id.to_string())
        .find(|id| !taken.contains(id.as_str()))
        .unwrap_or_else(|| from.to_string())
}
