use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Stable identifier for an article: the first 128 bits of
/// `SHA-256(source + ":" + title)`, hex encoded.
///
/// The same `(source, title)` pair always yields the same id, so
/// re-ingesting a feed overwrites instead of duplicating.
pub fn article_id(source: &str, title: &str) -> String {
    let digest = Sha256::digest(format!("{}:{}", source, title).as_bytes());
    digest[..16].iter().map(|b| format!("{:02x}", b)).collect()
}

/// Canonical article record produced by the feed normalizer.
///
/// Fields are private so `id` and `body_text` can't drift from the
/// title and source they were derived from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Article {
    id: String,
    title: String,
    summary: String,
    body_text: String,
    published_at: DateTime<Utc>,
    published_at_estimated: bool,
    source: String,
    category: String,
}

impl Article {
    /// `published` is the timestamp found in the feed entry, if any.
    /// Without one, `ingested_at` is used and the record is flagged as
    /// carrying an estimated timestamp.
    pub fn new(
        source: impl Into<String>,
        category: impl Into<String>,
        title: impl Into<String>,
        summary: impl Into<String>,
        published: Option<DateTime<Utc>>,
        ingested_at: DateTime<Utc>,
    ) -> Self {
        let source = source.into();
        let title = title.into();
        let summary = summary.into();
        let body_text = if summary.is_empty() {
            title.clone()
        } else {
            format!("{}\n\n{}", title, summary)
        };

        Self {
            id: article_id(&source, &title),
            title,
            summary,
            body_text,
            published_at: published.unwrap_or(ingested_at),
            published_at_estimated: published.is_none(),
            source,
            category: category.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Text handed to the embedding service.
    pub fn body_text(&self) -> &str {
        &self.body_text
    }

    pub fn published_at(&self) -> DateTime<Utc> {
        self.published_at
    }

    /// True when the feed had no date and `published_at` is the ingestion time.
    pub fn published_at_estimated(&self) -> bool {
        self.published_at_estimated
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn metadata(&self) -> ArticleMetadata {
        ArticleMetadata::from(self)
    }
}

/// Subset of an article kept next to its vector in the index.
///
/// Every field is optional on the way back: indexes may hold records
/// written by other tools, and absent fields are simply not rendered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticleMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl From<&Article> for ArticleMetadata {
    fn from(article: &Article) -> Self {
        Self {
            title: Some(article.title.clone()),
            summary: Some(article.summary.clone()),
            published_at: Some(article.published_at.to_rfc3339()),
            source: Some(article.source.clone()),
            category: Some(article.category.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: ArticleMetadata,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredMatch {
    pub id: String,
    /// Cosine similarity as reported by the index.
    pub score: f32,
    pub metadata: ArticleMetadata,
}

impl ScoredMatch {
    pub fn similarity_percent(&self) -> f32 {
        self.score * 100.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub total_count: u64,
    pub dimension: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ingested_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_article_id_is_deterministic() {
        let first = article_id("www.aktuality.sk", "Parlament schválil rozpočet");
        let second = article_id("www.aktuality.sk", "Parlament schválil rozpočet");
        assert_eq!(first, second);
        assert_eq!(first.len(), 32);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_article_id_changes_with_source_or_title() {
        let base = article_id("www.aktuality.sk", "Voľby 2025");
        assert_ne!(base, article_id("dennikn.sk", "Voľby 2025"));
        assert_ne!(base, article_id("www.aktuality.sk", "Voľby 2026"));
    }

    #[test]
    fn test_article_id_has_no_collisions_in_corpus() {
        let mut ids = std::collections::HashSet::new();
        for source in ["www.aktuality.sk", "dennikn.sk", "sport.sme.sk"] {
            for n in 0..500 {
                ids.insert(article_id(source, &format!("Správa číslo {}", n)));
            }
        }
        assert_eq!(ids.len(), 1500);
    }

    #[test]
    fn test_body_text_joins_title_and_summary() {
        let article = Article::new("dennikn.sk", "svet", "Titulok", "Perex", None, ingested_at());
        assert_eq!(article.body_text(), "Titulok\n\nPerex");
    }

    #[test]
    fn test_body_text_without_summary_is_title() {
        let article = Article::new("dennikn.sk", "svet", "Titulok", "", None, ingested_at());
        assert_eq!(article.body_text(), "Titulok");
        assert!(!article.body_text().is_empty());
    }

    #[test]
    fn test_published_at_falls_back_to_ingestion_time() {
        let article = Article::new("dennikn.sk", "svet", "Titulok", "", None, ingested_at());
        assert_eq!(article.published_at(), ingested_at());
        assert!(article.published_at_estimated());

        let published = Utc.with_ymd_and_hms(2025, 3, 13, 8, 30, 0).unwrap();
        let article = Article::new("dennikn.sk", "svet", "Titulok", "", Some(published), ingested_at());
        assert_eq!(article.published_at(), published);
        assert!(!article.published_at_estimated());
    }

    #[test]
    fn test_metadata_excludes_id_and_body() {
        let article = Article::new("dennikn.sk", "svet", "Titulok", "Perex", None, ingested_at());
        let json = serde_json::to_value(article.metadata()).unwrap();
        let keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys.len(), 5);
        assert!(json.get("id").is_none());
        assert!(json.get("body_text").is_none());
        assert_eq!(json["published_at"], "2025-03-14T12:00:00+00:00");
    }

    #[test]
    fn test_metadata_missing_fields_deserialize_as_none() {
        let metadata: ArticleMetadata = serde_json::from_str(r#"{"title": "Len titulok"}"#).unwrap();
        assert_eq!(metadata.title.as_deref(), Some("Len titulok"));
        assert!(metadata.summary.is_none());
        assert!(metadata.source.is_none());
    }

    #[test]
    fn test_similarity_percent() {
        let scored = ScoredMatch {
            id: "x".to_string(),
            score: 0.873,
            metadata: ArticleMetadata::default(),
        };
        assert!((scored.similarity_percent() - 87.3).abs() < 1e-3);
    }
}
