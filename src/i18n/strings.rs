use crate::i18n::Language;
use crate::translation::Translator;
use futures::future::join_all;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::info;

/// Interface labels in the canonical language (Korean), keyed by name.
pub const CANONICAL_UI_TEXTS: &[(&str, &str)] = &[
    // ==================== Header ====================
    ("siteTitle", "익명 뉴스"),
    ("translating", "번역 중..."),
    // ==================== Stats ====================
    ("todayArticles", "오늘 작성"),
    ("todayViews", "오늘 조회수"),
    ("totalArticles", "전체 기사"),
    // ==================== Article Form ====================
    ("writeArticle", "새 기사 작성"),
    ("category", "카테고리"),
    ("title", "제목"),
    ("content", "내용"),
    ("titlePlaceholder", "기사 제목을 입력하세요"),
    ("contentPlaceholder", "기사 내용을 입력하세요"),
    ("publish", "발행"),
    ("cancel", "취소"),
    // ==================== Article List ====================
    ("readMore", "더 읽기"),
    ("noArticles", "아직 작성된 기사가 없습니다."),
    ("writeNew", "새 기사 작성"),
    // ==================== About ====================
    ("about", "소개"),
    (
        "aboutText",
        "익명으로 뉴스와 의견을 공유할 수 있는 플랫폼입니다. 회원가입 없이 누구나 자유롭게 기사를 작성하고 읽을 수 있습니다.",
    ),
    // ==================== Article Detail ====================
    ("notFound", "기사를 찾을 수 없습니다"),
    ("goBack", "돌아가기"),
    ("articleNotFound", "기사를 찾을 수 없습니다"),
    ("backToHome", "홈으로 돌아가기"),
    ("backToNews", "뉴스로 돌아가기"),
    ("relatedArticles", "관련 기사"),
    ("moreArticlesMessage", "더 많은 기사를 보려면 홈페이지로 돌아가세요."),
];

/// The UI string table rendered in one language.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UiStrings {
    language: Language,
    texts: BTreeMap<&'static str, String>,
}

impl UiStrings {
    /// The table as authored.
    pub fn canonical() -> Self {
        Self {
            language: Language::canonical(),
            texts: CANONICAL_UI_TEXTS
                .iter()
                .map(|(key, text)| (*key, text.to_string()))
                .collect(),
        }
    }

    /// Translate every label into `language`.
    ///
    /// Each label is translated independently, so one failed request only
    /// leaves that label in Korean.
    pub async fn translated(translator: &Translator, language: Language) -> Self {
        let source = Language::canonical();
        if language == source {
            return Self::canonical();
        }

        let translations = join_all(
            CANONICAL_UI_TEXTS
                .iter()
                .map(|(_, text)| translator.translate(text, source, language)),
        )
        .await;

        Self {
            language,
            texts: CANONICAL_UI_TEXTS
                .iter()
                .map(|(key, _)| *key)
                .zip(translations)
                .collect(),
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Look up a label. Missing or empty values fall back to the canonical
    /// text, and unknown keys to the key itself.
    pub fn get<'a>(&'a self, key: &'a str) -> &'a str {
        self.texts
            .get(key)
            .map(String::as_str)
            .filter(|text| !text.is_empty())
            .or_else(|| canonical_text(key))
            .unwrap_or(key)
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }
}

fn canonical_text(key: &str) -> Option<&'static str> {
    CANONICAL_UI_TEXTS
        .iter()
        .find(|(candidate, _)| *candidate == key)
        .map(|(_, text)| *text)
}

/// Per-language UI tables, each translated at most once per process.
#[derive(Debug, Default)]
pub struct UiStringCache {
    entries: Mutex<HashMap<Language, Arc<UiStrings>>>,
}

impl UiStringCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, translator: &Translator, language: Language) -> Arc<UiStrings> {
        if let Some(cached) = self.lookup(language) {
            return cached;
        }

        info!("Translating UI strings to {}", language.name());
        let strings = Arc::new(UiStrings::translated(translator, language).await);

        // A concurrent request may have finished first; keep whichever landed first.
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(language)
            .or_insert(strings)
            .clone()
    }

    fn lookup(&self, language: Language) -> Option<Arc<UiStrings>> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&language)
            .cloned()
    }
}
