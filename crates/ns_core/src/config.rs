use std::fmt;

pub const EMBEDDING_DIMENSION: usize = 384;
pub const DEFAULT_BATCH_SIZE: usize = 100;
pub const DEFAULT_INGEST_THRESHOLD: u64 = 250;
pub const DEFAULT_TOP_K: usize = 5;
pub const DEFAULT_EXIT_WORDS: &[&str] = &["koniec", "quit", "exit", "q"];

/// Secret that never shows up in `Debug` output or logs.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub feeds: Vec<String>,
    pub batch_size: usize,
    /// Ingestion only runs while the index holds fewer records than this.
    pub threshold: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            feeds: Vec::new(),
            batch_size: DEFAULT_BATCH_SIZE,
            threshold: DEFAULT_INGEST_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone)]
pub struct QueryConfig {
    pub top_k: usize,
    pub exit_words: Vec<String>,
}

impl QueryConfig {
    pub fn is_exit_word(&self, input: &str) -> bool {
        let input = input.trim();
        self.exit_words.iter().any(|word| word.eq_ignore_ascii_case(input))
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            exit_words: DEFAULT_EXIT_WORDS.iter().map(|w| w.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_debug_is_redacted() {
        let key = ApiKey::new("pcsk_secret_value");
        let debug = format!("{:?}", key);
        assert!(!debug.contains("secret"));
        assert_eq!(key.expose(), "pcsk_secret_value");
    }

    #[test]
    fn test_exit_words_are_case_insensitive() {
        let config = QueryConfig::default();
        assert!(config.is_exit_word("koniec"));
        assert!(config.is_exit_word("KONIEC"));
        assert!(config.is_exit_word(" Quit "));
        assert!(config.is_exit_word("q"));
        assert!(!config.is_exit_word("koniec sveta"));
        assert!(!config.is_exit_word(""));
    }

    #[test]
    fn test_defaults() {
        let ingest = IngestConfig::default();
        assert_eq!(ingest.batch_size, 100);
        assert_eq!(ingest.threshold, 250);
        assert_eq!(QueryConfig::default().top_k, 5);
    }
}
