//! Command-line interface definitions for Auto News.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Most arguments can be provided via command-line flags or environment
//! variables, and every crawl flag overrides the value from the config file.

use crate::config::Config;
use clap::Parser;
use std::path::PathBuf;
use tracing::warn;

/// Smallest pause between two crawler requests accepted from the outside.
pub const MIN_DELAY_MS: u64 = 500;

/// Command-line arguments for the Auto News application.
///
/// # Examples
///
/// ```sh
/// # Everything with defaults, writing under the current directory
/// auto_news
///
/// # Crawl a different site, deeper, with a config file for the sources
/// auto_news -o ./public -c sources.yaml --base-url https://blog.example.com/ --max-depth 3
///
/// # Only refresh the news archive and posts
/// auto_news --skip-crawl --skip-becas
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Output root for files/, index.html and sitemap.xml
    #[arg(short, long, env = "AUTO_NEWS_OUTPUT_DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Directory for generated Markdown posts (default: <output-dir>/auto-news)
    #[arg(short, long, env = "AUTO_NEWS_POSTS_DIR")]
    pub posts_dir: Option<PathBuf>,

    /// Optional path to a YAML config file
    #[arg(short, long, env = "AUTO_NEWS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Root URL of the broken-link crawl
    #[arg(long, env = "AUTO_NEWS_BASE_URL")]
    pub base_url: Option<String>,

    /// Pages deeper than this are checked but not expanded
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Pause between crawler requests in milliseconds (minimum 500)
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Maximum number of URLs the crawler visits
    #[arg(long)]
    pub max_visited: Option<usize>,

    /// Maximum records taken from each source page
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Skip the broken-link crawl
    #[arg(long)]
    pub skip_crawl: bool,

    /// Skip the tech news scrape
    #[arg(long)]
    pub skip_news: bool,

    /// Skip the scholarship scrape
    #[arg(long)]
    pub skip_becas: bool,
}

impl Cli {
    /// Apply the flags given on the command line on top of `config`.
    pub fn apply(&self, config: &mut Config) {
        if let Some(base_url) = &self.base_url {
            config.crawl.base_url = base_url.clone();
        }
        if let Some(max_depth) = self.max_depth {
            config.crawl.max_depth = max_depth;
        }
        if let Some(timeout_secs) = self.timeout_secs {
            config.crawl.timeout_secs = timeout_secs;
        }
        if let Some(delay_ms) = self.delay_ms {
            config.crawl.delay_ms = delay_ms;
        }
        if let Some(max_visited) = self.max_visited {
            config.crawl.max_visited = max_visited;
        }
        if let Some(limit) = self.limit {
            config.news.limit = limit;
            config.becas.limit = limit;
        }

        if config.crawl.delay_ms < MIN_DELAY_MS {
            warn!(
                requested = config.crawl.delay_ms,
                min = MIN_DELAY_MS,
                "Crawl delay too small; raising to minimum"
            );
            config.crawl.delay_ms = MIN_DELAY_MS;
        }
    }
}
