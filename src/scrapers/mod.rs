//! Source scrapers for news and scholarship records.
//!
//! Each scrape profile is a list of sources plus a static selector table.
//! Scraping follows the same pattern for every profile:
//!
//! 1. **Fetch**: download each source page once
//! 2. **Extract**: pull up to `limit` records out of it with [`extract`]
//! 3. **Filter**: drop ad/tracking links (news) or irrelevant titles
//!    (scholarships, via [`keywords`])
//!
//! # Supported Profiles
//!
//! | Profile | Sources | Extra filtering |
//! |---------|---------|-----------------|
//! | News | Xataka, Genbeta, ComputerHoy, HobbyConsolas, El País, ABC, Vida Extra | ad/tracking links |
//! | Becas | Levante-EMV, Valencia Plaza, Fundación Carolina | keyword relevance |
//!
//! Sources are processed one at a time; a failing source is logged and
//! skipped.

pub mod extract;
pub mod keywords;

use crate::config::ScrapeProfile;
use crate::error::ConfigError;
use crate::http::PageFetch;
use crate::models::Record;
use extract::{CompiledSelectors, extract_from};
use keywords::KeywordFilter;
use futures::stream::{self, StreamExt};
use tracing::{info, instrument};

/// Substrings that mark a link as advertising or tracking.
const SUSPICIOUS_LINK_MARKERS: [&str; 2] = ["ads", "track"];

/// Scrape every source of `profile` in order and concatenate the batches.
///
/// Only an invalid selector table is an error; individual source failures
/// produce empty batches.
#[instrument(level = "info", skip_all, fields(sources = profile.sources.len()))]
pub async fn scrape_sources<F: PageFetch>(
    fetcher: &F,
    profile: &ScrapeProfile,
) -> Result<Vec<Record>, ConfigError> {
    let selectors = CompiledSelectors::compile(&profile.selectors)?;
    let selectors = &selectors;
    let limit = profile.limit;

    let batches: Vec<Vec<Record>> = stream::iter(profile.sources.iter())
        .then(move |source| extract_from(fetcher, source, selectors, limit))
        .collect()
        .await;

    let records: Vec<Record> = batches.into_iter().flatten().collect();
    info!(count = records.len(), "Scraped all sources");
    Ok(records)
}

/// Scrape the news profile, without ad or tracking links.
pub async fn scrape_news<F: PageFetch>(
    fetcher: &F,
    profile: &ScrapeProfile,
) -> Result<Vec<Record>, ConfigError> {
    let records = scrape_sources(fetcher, profile).await?;
    Ok(drop_suspicious_links(records))
}

/// Scrape the scholarship profile, keeping only relevant titles.
///
/// Links are not screened for ads here: scholarship pages often point at
/// `/uploads/` or `/downloads/` documents.
pub async fn scrape_becas<F: PageFetch>(
    fetcher: &F,
    profile: &ScrapeProfile,
    filter: &KeywordFilter,
) -> Result<Vec<Record>, ConfigError> {
    let records = scrape_sources(fetcher, profile).await?;
    Ok(filter.retain_relevant(records))
}

/// Whether a link looks like advertising or tracking (case-insensitive).
pub fn is_suspicious_link(link: &str) -> bool {
    let lowered = link.to_lowercase();
    SUSPICIOUS_LINK_MARKERS
        .iter()
        .any(|marker| lowered.contains(*marker))
}

/// Drop every record whose link looks like advertising or tracking.
pub fn drop_suspicious_links(records: Vec<Record>) -> Vec<Record> {
    let before = records.len();
    let kept: Vec<Record> = records
        .into_iter()
        .filter(|record| !is_suspicious_link(&record.link))
        .collect();
    info!(before, kept = kept.len(), "Dropped ad/tracking links");
    kept
}
