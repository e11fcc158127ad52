use std::fs;
use std::path::Path;
use ns_core::{Error, Result};
use crate::feed::source_from_url;

/// Slovak news outlets ingested when no feed list is configured.
pub const DEFAULT_FEEDS: &[&str] = &[
    // Aktuality.sk
    "https://www.aktuality.sk/rss",
    "https://www.aktuality.sk/rss/domace",
    "https://www.aktuality.sk/rss/zahranicne",
    "https://www.aktuality.sk/rss/ekonomika",
    "https://www.aktuality.sk/rss/sport",
    "https://www.aktuality.sk/rss/veda",
    "https://www.aktuality.sk/rss/auto",
    "https://www.aktuality.sk/rss/kultura",
    // SME.sk
    "https://rss.sme.sk/rss/rss.asp",
    "https://domov.sme.sk/rss",
    "https://svet.sme.sk/rss",
    "https://ekonomika.sme.sk/rss",
    "https://sport.sme.sk/rss",
    "https://tech.sme.sk/rss",
    "https://auto.sme.sk/rss",
    "https://kultura.sme.sk/rss",
    // Pravda.sk
    "https://feeds.feedburner.com/Pravda",
    "https://spravy.pravda.sk/domace/rss",
    "https://spravy.pravda.sk/svet/rss",
    "https://ekonomika.pravda.sk/rss",
    "https://sport.pravda.sk/rss",
    "https://vat.pravda.sk/rss",
    "https://style.pravda.sk/rss",
    // HNonline.sk
    "https://finweb.hnonline.sk/rss",
    "https://slovensko.hnonline.sk/rss",
    "https://zahranicne.hnonline.sk/rss",
    "https://sport.hnonline.sk/rss",
    "https://style.hnonline.sk/rss",
    // Denník N
    "https://dennikn.sk/feed/",
    "https://dennikn.sk/slovensko/feed/",
    "https://dennikn.sk/svet/feed/",
    "https://dennikn.sk/ekonomika/feed/",
    "https://dennikn.sk/sport/feed/",
    "https://dennikn.sk/veda/feed/",
    // Refresher.sk
    "https://refresher.sk/rss",
    "https://refresher.sk/rss/spravy",
    "https://refresher.sk/rss/tech",
    "https://refresher.sk/rss/kultura",
    // StartitUp
    "https://www.startitup.sk/feed/",
    "https://www.startitup.sk/category/tech/feed/",
    "https://www.startitup.sk/category/biznis/feed/",
];

pub fn default_feeds() -> Vec<String> {
    DEFAULT_FEEDS.iter().map(|url| url.to_string()).collect()
}

/// Read a feed list: one URL per line, blank lines and `#` comments ignored.
pub fn load_feeds_file(path: &Path) -> Result<Vec<String>> {
    let contents = fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read feeds file {}: {}", path.display(), e))
    })?;

    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

/// Check every configured URL up front so a typo is a startup error
/// rather than a silently empty feed.
pub fn validate_feeds(feeds: &[String]) -> Result<()> {
    if feeds.is_empty() {
        return Err(Error::Config("No feed URLs configured".to_string()));
    }
    for url in feeds {
        source_from_url(url).map_err(|e| Error::Config(format!("Bad feed URL: {}", e)))?;
    }
    Ok(())
}
