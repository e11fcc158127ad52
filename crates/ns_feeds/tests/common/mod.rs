// Test doubles shared by the ingestion integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use async_trait::async_trait;
use ns_core::{EmbeddingService, IndexStats, Result, ScoredMatch, VectorIndex, VectorRecord};

pub const DIMENSION: usize = 8;

pub fn rss(titles: &[(&str, Option<&str>)]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?><rss version="2.0"><channel><title>Test</title>"#,
    );
    for (title, description) in titles {
        xml.push_str("<item>");
        xml.push_str(&format!("<title>{}</title>", title));
        if let Some(description) = description {
            xml.push_str(&format!("<description><![CDATA[{}]]></description>", description));
        }
        xml.push_str("</item>");
    }
    xml.push_str("</channel></rss>");
    xml
}

/// Embeds every text as a constant vector and counts calls.
#[derive(Default)]
pub struct CountingEmbedder {
    pub calls: Mutex<usize>,
}

#[async_trait]
impl EmbeddingService for CountingEmbedder {
    fn name(&self) -> &str {
        "counting"
    }

    fn dimension(&self) -> usize {
        DIMENSION
    }

    async fn generate_embeddings(&self, text: &str) -> Result<Vec<f32>> {
        *self.calls.lock().unwrap() += 1;
        let mut vector = vec![0.0; DIMENSION];
        vector[text.len() % DIMENSION] = 1.0;
        Ok(vector)
    }
}

/// Keyed store that records the size of every upsert call.
#[derive(Default)]
pub struct RecordingIndex {
    pub records: Mutex<HashMap<String, VectorRecord>>,
    pub upserts: Mutex<Vec<Vec<String>>>,
    pub preset_count: Option<u64>,
}

impl RecordingIndex {
    pub fn with_count(total_count: u64) -> Self {
        Self {
            preset_count: Some(total_count),
            ..Default::default()
        }
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.upserts.lock().unwrap().iter().map(Vec::len).collect()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

#[async_trait]
impl VectorIndex for RecordingIndex {
    fn name(&self) -> &str {
        "recording"
    }

    async fn upsert(&self, records: &[VectorRecord]) -> Result<()> {
        let mut stored = self.records.lock().unwrap();
        for record in records {
            stored.insert(record.id.clone(), record.clone());
        }
        self.upserts
            .lock()
            .unwrap()
            .push(records.iter().map(|r| r.id.clone()).collect());
        Ok(())
    }

    async fn query(&self, _vector: &[f32], _top_k: usize) -> Result<Vec<ScoredMatch>> {
        Ok(Vec::new())
    }

    async fn describe_stats(&self) -> Result<IndexStats> {
        let total_count = self
            .preset_count
            .unwrap_or_else(|| self.records.lock().unwrap().len() as u64);
        Ok(IndexStats {
            total_count,
            dimension: Some(DIMENSION),
        })
    }
}
