use std::sync::Arc;
use chrono::{DateTime, Utc};
use ns_core::{Article, Error, Result};
use tracing::debug;
use crate::fetcher::FeedFetcher;
use crate::text::{clean_summary, clean_title};

/// Category for feeds whose URL carries no `/rss/<category>` segment.
pub const DEFAULT_CATEGORY: &str = "hlavne";

/// Host part of a feed URL: the third `/`-delimited segment.
pub fn source_from_url(url: &str) -> Result<String> {
    match url.split('/').nth(2) {
        Some(host) if !host.is_empty() => Ok(host.to_string()),
        _ => Err(Error::InvalidUrl(format!(
            "{} has no host segment, expected scheme://host/path",
            url
        ))),
    }
}

/// `https://www.aktuality.sk/rss/sport` is filed under `sport`; anything
/// without a segment after `rss` falls back to [`DEFAULT_CATEGORY`].
pub fn category_from_url(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let segments: Vec<&str> = path.split('/').skip(3).collect();

    segments
        .iter()
        .position(|segment| *segment == "rss")
        .and_then(|pos| segments[pos + 1..].iter().rev().find(|s| !s.is_empty()))
        .map(|segment| segment.to_string())
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string())
}

/// Turn a raw RSS/Atom document into article records.
///
/// Entries without a title are dropped. A document that does not parse
/// fails as a whole; no partial list is returned.
pub fn parse_feed(url: &str, body: &[u8], ingested_at: DateTime<Utc>) -> Result<Vec<Article>> {
    let source = source_from_url(url)?;
    let category = category_from_url(url);
    let feed = feed_rs::parser::parse(body).map_err(|e| Error::fetch(url, e))?;

    let mut articles = Vec::with_capacity(feed.entries.len());
    for entry in feed.entries {
        let title = entry
            .title
            .map(|text| clean_title(&text.content))
            .unwrap_or_default();
        if title.is_empty() {
            debug!(feed = url, entry = %entry.id, "Skipping entry without a title");
            continue;
        }

        let summary = entry
            .summary
            .map(|text| clean_summary(&text.content))
            .unwrap_or_default();

        articles.push(Article::new(
            source.as_str(),
            category.as_str(),
            title,
            summary,
            entry.published.or(entry.updated),
            ingested_at,
        ));
    }

    Ok(articles)
}

pub struct FeedNormalizer {
    fetcher: Arc<dyn FeedFetcher>,
}

impl FeedNormalizer {
    pub fn new(fetcher: Arc<dyn FeedFetcher>) -> Self {
        Self { fetcher }
    }

    pub async fn fetch_articles(&self, url: &str) -> Result<Vec<Article>> {
        // Reject malformed URLs before touching the network.
        source_from_url(url)?;
        let body = self.fetcher.fetch(url).await?;
        parse_feed(url, &body, Utc::now())
    }
}
