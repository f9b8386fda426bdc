use crate::article::Article;
use chrono::{DateTime, TimeZone};
use serde::Serialize;

/// Header counters: articles and views for today, plus the collection size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleStats {
    pub today_count: usize,
    pub today_views: u64,
    pub total_count: usize,
}

impl ArticleStats {
    /// "Today" is `now`'s calendar date in `now`'s timezone.
    pub fn compute<Tz: TimeZone>(articles: &[Article], now: &DateTime<Tz>) -> Self {
        let tz = now.timezone();
        let today = now.date_naive();

        let (today_count, today_views) = articles
            .iter()
            .filter(|article| article.created_at.with_timezone(&tz).date_naive() == today)
            .fold((0, 0), |(count, views), article| {
                (count + 1, views + article.views)
            });

        Self {
            today_count,
            today_views,
            total_count: articles.len(),
        }
    }
}
