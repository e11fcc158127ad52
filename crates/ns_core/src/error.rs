use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to fetch feed {url}: {cause}")]
    Fetch { url: String, cause: String },

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Index error: {0}")]
    Index(String),

    #[error("Aborted by user")]
    UserAbort,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn fetch(url: impl Into<String>, cause: impl ToString) -> Self {
        Self::Fetch {
            url: url.into(),
            cause: cause.to_string(),
        }
    }

    /// Per-feed failures are absorbed by the ingestion run; everything
    /// else terminates the phase it happened in.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Fetch { .. } | Self::InvalidUrl(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_carries_url_and_cause() {
        let err = Error::fetch("https://example.com/rss", "connection refused");
        let message = err.to_string();
        assert!(message.contains("https://example.com/rss"));
        assert!(message.contains("connection refused"));
    }

    #[test]
    fn test_recoverable_kinds() {
        assert!(Error::fetch("u", "c").is_recoverable());
        assert!(Error::InvalidUrl("x".to_string()).is_recoverable());
        assert!(!Error::Index("upsert failed".to_string()).is_recoverable());
        assert!(!Error::Embedding("timeout".to_string()).is_recoverable());
        assert!(!Error::Config("missing key".to_string()).is_recoverable());
        assert!(!Error::UserAbort.is_recoverable());
    }

    #[test]
    fn test_io_failures_convert_and_terminate() {
        fn render() -> crate::Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "stdout closed"))?
        }
        let err = render().unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert!(!err.is_recoverable());
    }
}
