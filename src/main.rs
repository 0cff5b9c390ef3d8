//! # Auto News
//!
//! A site maintenance pipeline that checks a blog for broken links, scrapes
//! Spanish tech news and scholarship announcements, keeps deduplicated JSON
//! archives of both, and turns news items into Markdown posts.
//!
//! ## Usage
//!
//! ```sh
//! auto_news -o ./public -c sources.yaml
//! ```
//!
//! ## Architecture
//!
//! The application runs four independent stages in order:
//! 1. **Crawl**: Walk same-origin links from the base URL and classify them
//! 2. **News**: Scrape the news sources, archive them, generate posts
//! 3. **Becas**: Scrape the scholarship sources, keep relevant titles, archive them
//! 4. **Reports**: Write `index.html` and `sitemap.xml`
//!
//! A failing source or link only shows up in the logs and reports; only
//! invalid configuration and failed writes stop the run.

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod archive;
mod cli;
mod config;
mod crawler;
mod error;
mod http;
mod models;
mod outputs;
mod posts;
mod scrapers;
mod storage;
mod utils;

use cli::Cli;
use config::Config;
use http::ReqwestFetcher;
use models::{LinkReport, Record};
use outputs::report::RunOverview;
use outputs::{Collection, OutputLayout, json, report, sitemap};
use scrapers::extract::{CompiledSelectors, today};
use scrapers::keywords::KeywordFilter;
use utils::{ensure_writable_dir, run_stamp};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("auto_news starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args.output_dir, ?args.posts_dir, ?args.config, "Parsed CLI arguments");

    // ---- Configuration ----
    let mut config = Config::load(args.config.as_deref())?;
    args.apply(&mut config);
    for profile in [&config.news, &config.becas] {
        CompiledSelectors::compile(&profile.selectors)?;
    }
    info!(
        base_url = %config.crawl.base_url,
        max_depth = config.crawl.max_depth,
        delay_ms = config.crawl.delay_ms,
        max_visited = config.crawl.max_visited,
        "Configuration ready"
    );

    let layout = OutputLayout::new(args.output_dir.clone(), args.posts_dir.clone());

    // Early check: ensure the output dirs are writable
    for dir in [layout.files_dir(), layout.posts_dir().to_path_buf()] {
        if let Err(e) = ensure_writable_dir(&dir).await {
            error!(
                path = %dir.display(),
                error = %e,
                "Output directory is not writable (fix perms or choose a different path)"
            );
            return Err(e);
        }
    }

    let fetcher = ReqwestFetcher::new(config.crawl.timeout(), &config.user_agent)?;
    let stamp = run_stamp();
    let date = today();

    // ---- Broken-link crawl ----
    let link_report: Option<LinkReport> = if args.skip_crawl {
        info!("Skipping link check");
        None
    } else {
        let links = crawler::crawl(&fetcher, &config.crawl).await?;
        json::write_link_report(&layout, &stamp, &links).await?;
        Some(links)
    };

    // ---- Tech news ----
    let mut posts_written = 0usize;
    if args.skip_news {
        info!("Skipping news scrape");
    } else {
        let news = scrapers::scrape_news(&fetcher, &config.news).await?;
        json::write_batch(&layout, Collection::News, &stamp, &news).await?;
        archive::accumulate(&layout.archive(Collection::News), news.clone()).await?;
        posts_written = posts::materialize_all(layout.posts_dir(), &news).await?.len();
    }

    // ---- Scholarships ----
    if args.skip_becas {
        info!("Skipping becas scrape");
    } else {
        let filter = KeywordFilter::new(&config.keywords);
        let becas = scrapers::scrape_becas(&fetcher, &config.becas, &filter).await?;
        json::write_batch(&layout, Collection::Becas, &stamp, &becas).await?;
        archive::accumulate(&layout.archive(Collection::Becas), becas).await?;
    }

    // ---- Reports ----
    let news_archive: Vec<Record> = archive::load_archive(&layout.archive(Collection::News)).await;
    let becas_archive: Vec<Record> = archive::load_archive(&layout.archive(Collection::Becas)).await;

    if let Some(links) = &link_report {
        sitemap::write_sitemap(&layout.sitemap(), links, &date).await?;
    }
    report::write_index(
        &layout.index_html(),
        &RunOverview {
            links: link_report.as_ref(),
            news: &news_archive,
            becas: &becas_archive,
            generated: &date,
        },
    )
    .await?;

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        links_checked = link_report.as_ref().map_or(0, LinkReport::total),
        broken_links = link_report.as_ref().map_or(0, |r| r.broken.len()),
        news_archived = news_archive.len(),
        becas_archived = becas_archive.len(),
        posts_written,
        "Execution complete"
    );

    Ok(())
}
