use crate::models::{NewsItem, Service};
use serde::Serialize;
use std::cmp::Ordering;

/// Excerpt length on the "Latest Market News" card.
pub const NEWS_CARD_EXCERPT_CHARS: usize = 120;
/// Excerpt length in the news management table.
pub const NEWS_TABLE_EXCERPT_CHARS: usize = 100;
/// Active items shown on the news card.
pub const NEWS_CARD_ITEMS: usize = 3;

/// Ascending by `order`; ties keep their fetched order.
pub fn sort_services(services: &mut [Service]) {
    services.sort_by_key(|s| s.order);
}

/// Newest first. Items without a creation timestamp go last.
pub fn sort_news(news: &mut [NewsItem]) {
    news.sort_by(|a, b| match (&a.created_at, &b.created_at) {
        (Some(a), Some(b)) => b.cmp(a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

/// Cuts on a char boundary and appends `...` only when something was cut.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

pub fn format_created(news: &NewsItem) -> String {
    news.created_at
        .map(|ts| ts.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

#[derive(Serialize)]
pub struct NewsRow {
    pub id: String,
    pub title: String,
    pub excerpt: String,
    pub impact: &'static str,
    pub impact_label: &'static str,
    pub is_active: bool,
    pub created: String,
}

fn row(item: &NewsItem, max_chars: usize) -> NewsRow {
    NewsRow {
        id: item.id.clone(),
        title: item.title.clone(),
        excerpt: excerpt(&item.content, max_chars),
        impact: item.impact.as_str(),
        impact_label: item.impact.label(),
        is_active: item.is_active,
        created: format_created(item),
    }
}

/// Rows for the management table; expects `news` already sorted.
pub fn news_table_rows(news: &[NewsItem]) -> Vec<NewsRow> {
    news.iter().map(|n| row(n, NEWS_TABLE_EXCERPT_CHARS)).collect()
}

/// The first few active items for the news card; expects `news` already sorted.
pub fn news_card_rows(news: &[NewsItem]) -> Vec<NewsRow> {
    news.iter()
        .filter(|n| n.is_active)
        .take(NEWS_CARD_ITEMS)
        .map(|n| row(n, NEWS_CARD_EXCERPT_CHARS))
        .collect()
}
