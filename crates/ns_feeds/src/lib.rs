pub mod feed;
pub mod fetcher;
pub mod logging;
pub mod manager;
pub mod sources;
pub mod text;

pub use feed::{parse_feed, FeedNormalizer, DEFAULT_CATEGORY};
pub use fetcher::{FeedFetcher, HttpFetcher};
pub use logging::{init_logging, Logger};
pub use manager::{FeedOutcome, IngestManager, IngestOutcome, IngestReport};

pub mod prelude {
    pub use super::feed::FeedNormalizer;
    pub use super::manager::{IngestManager, IngestOutcome};
    pub use ns_core::{Article, Error, Result};
}
