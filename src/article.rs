use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Sentinel category that selects every article.
pub const ALL_CATEGORIES: &str = "전체";

/// ASCII alias for [`ALL_CATEGORIES`], convenient in query strings.
pub const ALL_CATEGORIES_ALIAS: &str = "all";

/// Suggested categories offered by the creation form. Not enforced on storage.
pub const SUGGESTED_CATEGORIES: [&str; 5] = ["정치", "경제", "사회", "기술", "기타"];

pub const DEFAULT_CATEGORY: &str = "정치";

/// Characters of content shown in list previews.
pub const PREVIEW_CHARS: usize = 300;

pub const PREVIEW_ELLIPSIS: &str = "...";

/// A user-submitted article as persisted and served.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: String,
    pub title: String,
    pub content: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub views: u64,
}

impl Article {
    /// List preview of the content.
    pub fn preview(&self) -> Cow<'_, str> {
        preview(&self.content)
    }

    /// Whether the list preview cuts the content short.
    pub fn is_truncated(&self) -> bool {
        is_truncated(&self.content)
    }
}

/// Input for creating an article.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewArticle {
    pub title: String,
    pub content: String,
    #[serde(default = "default_category")]
    pub category: String,
}

impl NewArticle {
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            category: category.into(),
        }
    }

    /// The form's required-field check: title and content must not be blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push("title");
        }
        if self.content.trim().is_empty() {
            missing.push("content");
        }
        missing
    }
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

/// Whether a requested `category` means every article: the sentinel or its
/// alias, ignoring surrounding whitespace and ASCII case.
pub fn is_all_categories(category: &str) -> bool {
    let category = category.trim();
    category == ALL_CATEGORIES || category.eq_ignore_ascii_case(ALL_CATEGORIES_ALIAS)
}

/// Cut content longer than [`PREVIEW_CHARS`] characters and append an ellipsis.
pub fn preview(content: &str) -> Cow<'_, str> {
    match content.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => Cow::Owned(format!("{}{}", &content[..cut], PREVIEW_ELLIPSIS)),
        None => Cow::Borrowed(content),
    }
}

pub fn is_truncated(content: &str) -> bool {
    content.chars().nth(PREVIEW_CHARS).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn create_article(content: &str) -> Article {
        Article {
            id: "1700000000000".to_string(),
            title: "A".to_string(),
            content: content.to_string(),
            category: "정치".to_string(),
            created_at: "2024-01-15T10:30:00.000Z".parse().expect("timestamp"),
            views: 0,
        }
    }

    // ==================== Serialization Tests ====================

    #[test]
    fn test_article_uses_camel_case_fields() {
        let json = serde_json::to_value(create_article("B")).expect("serialize");

        assert!(json.get("createdAt").is_some());
        assert!(json.get("created_at").is_none());
        assert_eq!(json["views"], 0);
    }

    #[test]
    fn test_article_parses_browser_iso_timestamp() {
        let json = r#"{"id":"1","title":"t","content":"c","category":"기타","createdAt":"2024-03-01T09:15:27.123Z","views":4}"#;
        let article: Article = serde_json::from_str(json).expect("deserialize");

        assert_eq!(article.views, 4);
        assert_eq!(article.created_at.timestamp_millis(), 1_709_284_527_123);
    }

    #[test]
    fn test_article_missing_views_defaults_to_zero() {
        let json = r#"{"id":"1","title":"t","content":"c","category":"기타","createdAt":"2024-03-01T09:15:27Z"}"#;
        let article: Article = serde_json::from_str(json).expect("deserialize");

        assert_eq!(article.views, 0);
    }

    #[test]
    fn test_new_article_defaults_category() {
        let input: NewArticle =
            serde_json::from_str(r#"{"title":"t","content":"c"}"#).expect("deserialize");

        assert_eq!(input.category, DEFAULT_CATEGORY);
    }

    #[test]
    fn test_missing_fields() {
        assert!(NewArticle::new("t", "c", "기타").missing_fields().is_empty());
        assert_eq!(NewArticle::new(" ", "c", "기타").missing_fields(), vec!["title"]);
        assert_eq!(
            NewArticle::new("", "\n", "기타").missing_fields(),
            vec!["title", "content"]
        );
    }

    // ==================== Category Tests ====================

    #[test]
    fn test_all_categories_sentinel() {
        assert!(is_all_categories("전체"));
        assert!(is_all_categories("all"));
        assert!(is_all_categories("ALL"));
        assert!(!is_all_categories("정치"));
        assert!(!is_all_categories(""));
    }

    #[test]
    fn test_default_category_is_suggested() {
        assert!(SUGGESTED_CATEGORIES.contains(&DEFAULT_CATEGORY));
        assert!(!SUGGESTED_CATEGORIES.contains(&ALL_CATEGORIES));
    }

    // ==================== Preview Tests ====================

    #[test]
    fn test_preview_short_content_unchanged() {
        let article = create_article("짧은 내용");

        assert_eq!(article.preview(), "짧은 내용");
        assert!(!article.is_truncated());
    }

    #[test]
    fn test_preview_exactly_limit_unchanged() {
        let content = "B".repeat(PREVIEW_CHARS);

        assert_eq!(preview(&content), content.as_str());
        assert!(!is_truncated(&content));
    }

    #[test]
    fn test_preview_long_content_truncated() {
        let article = create_article(&"B".repeat(400));

        assert_eq!(article.content.len(), 400);
        assert_eq!(article.preview(), format!("{}...", "B".repeat(300)));
        assert!(article.is_truncated());
    }

    #[test]
    fn test_preview_counts_characters_not_bytes() {
        let content = "가".repeat(301);
        let cut = preview(&content);

        assert_eq!(cut, format!("{}...", "가".repeat(300)));
    }

    proptest! {
        #[test]
        fn prop_preview_never_exceeds_limit(content in ".{0,600}") {
            let cut = preview(&content);
            let chars = content.chars().count();

            if chars > PREVIEW_CHARS {
                prop_assert!(cut.ends_with(PREVIEW_ELLIPSIS));
                prop_assert_eq!(cut.chars().count(), PREVIEW_CHARS + PREVIEW_ELLIPSIS.len());
                prop_assert!(content.starts_with(&cut[..cut.len() - PREVIEW_ELLIPSIS.len()]));
            } else {
                prop_assert_eq!(&*cut, content.as_str());
            }
        }
    }
}
