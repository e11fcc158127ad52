use std::io::{self, Write};
use chrono::{DateTime, Local};
use ns_core::ScoredMatch;
use ns_feeds::IngestOutcome;

const UNKNOWN_TITLE: &str = "Neznámy nadpis";

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// RFC 3339 timestamps are shown in local time; anything else verbatim.
fn format_published(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Local).format("%d.%m.%Y %H:%M").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

pub fn render_matches<W: Write>(out: &mut W, matches: &[ScoredMatch]) -> io::Result<()> {
    if matches.is_empty() {
        writeln!(out, "\nNenašli sa žiadne podobné správy.")?;
        return Ok(());
    }

    writeln!(out, "\nNájdených {} podobných správ:", matches.len())?;
    for (rank, scored) in matches.iter().enumerate() {
        let metadata = &scored.metadata;
        writeln!(out, "\n{}. Správa (Podobnosť: {:.1}%):", rank + 1, scored.similarity_percent())?;
        writeln!(out, "Nadpis: {}", present(&metadata.title).unwrap_or(UNKNOWN_TITLE))?;
        if let Some(source) = present(&metadata.source) {
            writeln!(out, "Zdroj: {}", source)?;
        }
        if let Some(category) = present(&metadata.category) {
            writeln!(out, "Kategória: {}", category)?;
        }
        if let Some(summary) = present(&metadata.summary) {
            writeln!(out, "Perex: {}", summary)?;
        }
        if let Some(published) = present(&metadata.published_at) {
            writeln!(out, "Dátum: {}", format_published(published))?;
        }
    }
    out.flush()
}

pub fn render_outcome<W: Write>(out: &mut W, outcome: &IngestOutcome) -> io::Result<()> {
    match outcome {
        IngestOutcome::Skipped { total_count, threshold } => {
            writeln!(
                out,
                "Index obsahuje {} záznamov (prah {}), sťahovanie správ preskočené.",
                total_count, threshold
            )?;
        }
        IngestOutcome::Completed(report) => {
            writeln!(out, "\nVýsledok sťahovania:")?;
            for feed in &report.feeds {
                match &feed.error {
                    None => writeln!(out, "  ✓ {} ({} správ)", feed.url, feed.articles)?,
                    Some(error) => writeln!(out, "  ✗ {}: {}", feed.url, error)?,
                }
            }
            writeln!(
                out,
                "Celkovo {} správ vložených v {} dávkach, {} z {} zdrojov zlyhalo.",
                report.articles,
                report.batches,
                report.failed_feeds(),
                report.feeds.len()
            )?;
        }
    }
    out.flush()
}
