use std::sync::Arc;
use ns_core::{
    Article, EmbeddingService, Error, IngestConfig, Result, VectorIndex, VectorRecord,
};
use crate::feed::FeedNormalizer;
use crate::logging::Logger;

/// What happened to one feed during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedOutcome {
    pub url: String,
    pub articles: usize,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    pub feeds: Vec<FeedOutcome>,
    pub articles: usize,
    pub batches: usize,
}

impl IngestReport {
    pub fn failed_feeds(&self) -> usize {
        self.feeds.iter().filter(|feed| feed.error.is_some()).count()
    }
}

#[derive(Debug)]
pub enum IngestOutcome {
    /// The index already holds enough records.
    Skipped { total_count: u64, threshold: u64 },
    Completed(IngestReport),
}

/// Drives the normalizer over every configured feed and pushes the
/// records through the embedding service into the vector index.
///
/// Records are not deduplicated here: two feeds producing the same id
/// overwrite each other in the index, last write wins.
pub struct IngestManager {
    normalizer: FeedNormalizer,
    embedder: Arc<dyn EmbeddingService>,
    index: Arc<dyn VectorIndex>,
    config: IngestConfig,
    logger: Logger,
}

impl IngestManager {
    pub fn new(
        normalizer: FeedNormalizer,
        embedder: Arc<dyn EmbeddingService>,
        index: Arc<dyn VectorIndex>,
        config: IngestConfig,
        logger: Logger,
    ) -> Self {
        Self {
            normalizer,
            embedder,
            index,
            config,
            logger,
        }
    }

    /// Fetch every feed in order. A failing feed is logged and contributes
    /// nothing; it never stops the others.
    pub async fn collect_articles(&self) -> (Vec<Article>, Vec<FeedOutcome>) {
        let mut articles = Vec::new();
        let mut outcomes = Vec::with_capacity(self.config.feeds.len());

        for url in &self.config.feeds {
            self.logger.debug(&format!("📡 Fetching {}", url));
            match self.normalizer.fetch_articles(url).await {
                Ok(mut fetched) => {
                    if fetched.is_empty() {
                        self.logger.warn(&format!("No articles in {}", url));
                    } else {
                        self.logger.info(&format!("📰 {} articles from {}", fetched.len(), url));
                    }
                    outcomes.push(FeedOutcome {
                        url: url.clone(),
                        articles: fetched.len(),
                        error: None,
                    });
                    articles.append(&mut fetched);
                }
                Err(e) => {
                    if e.is_recoverable() {
                        self.logger.warn(&format!("⚠️ Skipping feed: {}", e));
                    } else {
                        self.logger.error(&format!("Unexpected failure for {}: {}", url, e));
                    }
                    outcomes.push(FeedOutcome {
                        url: url.clone(),
                        articles: 0,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        (articles, outcomes)
    }

    /// Embed and upsert in batches of `batch_size`. The first failing
    /// batch aborts the run; batches already written stay written.
    ///
    /// Returns the number of batches sent.
    pub async fn upsert_articles(&self, articles: &[Article]) -> Result<usize> {
        if articles.is_empty() {
            self.logger.warn("No articles to upsert");
            return Ok(0);
        }

        let batch_size = self.config.batch_size.max(1);
        let total = articles.len().div_ceil(batch_size);
        let dimension = self.embedder.dimension();

        for (i, chunk) in articles.chunks(batch_size).enumerate() {
            let texts: Vec<String> = chunk.iter().map(|a| a.body_text().to_string()).collect();
            let embeddings = self.embedder.generate_batch(&texts).await?;
            if embeddings.len() != chunk.len() {
                return Err(Error::Embedding(format!(
                    "{} returned {} vectors for {} texts",
                    self.embedder.name(),
                    embeddings.len(),
                    chunk.len()
                )));
            }

            let records = chunk
                .iter()
                .zip(embeddings)
                .map(|(article, values)| {
                    if values.len() != dimension {
                        return Err(Error::Embedding(format!(
                            "Expected {} dimensions, got {}",
                            dimension,
                            values.len()
                        )));
                    }
                    Ok(VectorRecord {
                        id: article.id().to_string(),
                        values,
                        metadata: article.metadata(),
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            self.index.upsert(&records).await?;
            self.logger.info(&format!("💾 Upserted batch {}/{} ({} articles)", i + 1, total, records.len()));
        }

        Ok(total)
    }

    pub async fn run(&self) -> Result<IngestReport> {
        let (articles, feeds) = self.collect_articles().await;
        self.logger.info(&format!("✨ Collected {} articles from {} feeds", articles.len(), feeds.len()));

        let batches = self.upsert_articles(&articles).await?;

        let report = IngestReport {
            feeds,
            articles: articles.len(),
            batches,
        };
        if report.failed_feeds() > 0 {
            self.logger.warn(&format!("{} of {} feeds failed", report.failed_feeds(), report.feeds.len()));
        }
        Ok(report)
    }

    /// Run only while the index holds fewer than `threshold` records.
    pub async fn run_if_needed(&self) -> Result<IngestOutcome> {
        let stats = self.index.describe_stats().await?;
        self.logger.info(&format!("🏦 Index holds {} records", stats.total_count));

        if stats.total_count >= self.config.threshold {
            self.logger.info(&format!(
                "⏭️ Skipping ingestion, {} records reach the threshold of {}",
                stats.total_count, self.config.threshold
            ));
            return Ok(IngestOutcome::Skipped {
                total_count: stats.total_count,
                threshold: self.config.threshold,
            });
        }

        Ok(IngestOutcome::Completed(self.run().await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::FeedFetcher;
    use async_trait::async_trait;
    use ns_core::{IndexStats, ScoredMatch};
    use std::sync::Mutex;

    struct StaticFetcher;

    #[async_trait]
    impl FeedFetcher for StaticFetcher {
        async fn fetch(&self, _url: &str) -> Result<Vec<u8>> {
            let mut xml = String::from(r#"<?xml version="1.0"?><rss version="2.0"><channel><title>t</title>"#);
            for n in 0..7 {
                xml.push_str(&format!("<item><title>Správa {}</title></item>", n));
            }
            xml.push_str("</channel></rss>");
            Ok(xml.into_bytes())
        }
    }

    struct FixedEmbedder {
        dimension: usize,
        produced: usize,
    }

    #[async_trait]
    impl EmbeddingService for FixedEmbedder {
        fn name(&self) -> &str {
            "fixed"
        }

        fn dimension(&self) -> usize {
            self.dimension
        }

        async fn generate_embeddings(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![0.5; self.produced])
        }
    }

    #[derive(Default)]
    struct MockIndex {
        batches: Mutex<Vec<usize>>,
        total_count: u64,
    }

    #[async_trait]
    impl VectorIndex for MockIndex {
        fn name(&self) -> &str {
            "mock"
        }

        async fn upsert(&self, records: &[VectorRecord]) -> Result<()> {
            self.batches.lock().unwrap().push(records.len());
            Ok(())
        }

        async fn query(&self, _vector: &[f32], _top_k: usize) -> Result<Vec<ScoredMatch>> {
            Ok(Vec::new())
        }

        async fn describe_stats(&self) -> Result<IndexStats> {
            Ok(IndexStats {
                total_count: self.total_count,
                dimension: Some(4),
            })
        }
    }

    fn manager(index: Arc<MockIndex>, embedder: FixedEmbedder, batch_size: usize) -> IngestManager {
        IngestManager::new(
            FeedNormalizer::new(Arc::new(StaticFetcher)),
            Arc::new(embedder),
            index,
            IngestConfig {
                feeds: vec!["https://www.aktuality.sk/rss/domace".to_string()],
                batch_size,
                threshold: 250,
            },
            Logger::new(),
        )
    }

    #[tokio::test]
    async fn test_batches_follow_batch_size() {
        let index = Arc::new(MockIndex::default());
        let report = manager(index.clone(), FixedEmbedder { dimension: 4, produced: 4 }, 3)
            .run()
            .await
            .unwrap();

        assert_eq!(report.articles, 7);
        assert_eq!(report.batches, 3);
        assert_eq!(*index.batches.lock().unwrap(), vec![3, 3, 1]);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_aborts() {
        let index = Arc::new(MockIndex::default());
        let err = manager(index.clone(), FixedEmbedder { dimension: 4, produced: 3 }, 3)
            .run()
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Embedding(_)));
        assert!(index.batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_run_if_needed_skips_full_index() {
        let index = Arc::new(MockIndex {
            total_count: 250,
            ..Default::default()
        });
        let outcome = manager(index.clone(), FixedEmbedder { dimension: 4, produced: 4 }, 3)
            .run_if_needed()
            .await
            .unwrap();

        assert!(matches!(outcome, IngestOutcome::Skipped { total_count: 250, threshold: 250 }));
        assert!(index.batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_article_list_sends_nothing() {
        let index = Arc::new(MockIndex::default());
        let batches = manager(index.clone(), FixedEmbedder { dimension: 4, produced: 4 }, 3)
            .upsert_articles(&[])
            .await
            .unwrap();
        assert_eq!(batches, 0);
        assert!(index.batches.lock().unwrap().is_empty());
    }
}
