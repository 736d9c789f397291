use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    /// Severity as published, e.g. "High" or "Low".
    pub impact: String,
    /// Display string, never parsed.
    pub time: String,
}

impl NewsItem {
    pub fn new(title: &str, impact: &str, time: &str) -> Self {
        Self {
            title: title.to_string(),
            impact: impact.to_string(),
            time: time.to_string(),
        }
    }
}

/// Source of headlines for one render cycle. An empty list means no news.
pub trait NewsProvider {
    fn fetch_news(&self) -> Vec<NewsItem>;
}

/// Today's scheduled macro release.
#[derive(Debug, Clone, Default)]
pub struct StaticNews;

impl NewsProvider for StaticNews {
    fn fetch_news(&self) -> Vec<NewsItem> {
        vec![NewsItem::new("FOMC Rate Decision", "High", "14:00 ET")]
    }
}

#[derive(Debug, Clone, Default)]
pub struct NoNews;

impl NewsProvider for NoNews {
    fn fetch_news(&self) -> Vec<NewsItem> {
        Vec::new()
    }
}

pub const NO_NEWS_BANNER: &str = "No major news at this time.";

/// The first item is the headline.
pub fn headline(items: &[NewsItem]) -> Option<&NewsItem> {
    items.first()
}

pub fn format_news_alert(items: &[NewsItem]) -> String {
    match headline(items) {
        Some(n) => format!(
            "Breaking News: {} (Impact: {}) at {}",
            n.title, n.impact, n.time
        ),
        None => NO_NEWS_BANNER.to_string(),
    }
}
