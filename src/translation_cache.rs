use crate::article::Article;
use crate::i18n::Language;
use crate::translation::Translator;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// Session-wide memo of translated articles, keyed by `(article id, language)`.
///
/// Entries are never evicted or invalidated. An entry is a snapshot taken when
/// the article was first translated, so later view increments are not reflected
/// in it; callers that show view counts overlay the live value.
#[derive(Debug, Default)]
pub struct TranslationCache {
    entries: Mutex<HashMap<(String, Language), Article>>,
}

impl TranslationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The article with `title`, `content` and `category` in `target`.
    ///
    /// The canonical language is returned untouched and never cached. Otherwise
    /// the three fields are translated together and the result is cached only
    /// once all of them are done. Failed fields keep their original text.
    pub async fn ensure_translated(
        &self,
        translator: &Translator,
        article: &Article,
        target: Language,
    ) -> Article {
        let source = Language::canonical();
        if target == source {
            return article.clone();
        }

        let key = (article.id.clone(), target);
        if let Some(hit) = self.lookup(&key) {
            translator.metrics().record_cache_hit();
            return hit;
        }
        translator.metrics().record_cache_miss();

        debug!("Translating article {} to {}", article.id, target);
        let (title, content, category) = tokio::join!(
            translator.translate(&article.title, source, target),
            translator.translate(&article.content, source, target),
            translator.translate(&article.category, source, target),
        );

        let translated = Article {
            title,
            content,
            category,
            ..article.clone()
        };

        // Concurrent misses for the same key keep the first stored result.
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key)
            .or_insert(translated)
            .clone()
    }

    /// [`ensure_translated`](Self::ensure_translated) for each article, in order.
    pub async fn translate_all(
        &self,
        translator: &Translator,
        articles: &[Article],
        target: Language,
    ) -> Vec<Article> {
        let mut translated = Vec::with_capacity(articles.len());
        for article in articles {
            translated.push(self.ensure_translated(translator, article, target).await);
        }
        translated
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, key: &(String, Language)) -> Option<Article> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }
}
