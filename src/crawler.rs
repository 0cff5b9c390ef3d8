//! Broken-link crawler over a single origin.
//!
//! Starting from the configured base URL, the crawler health-checks every
//! same-origin page it can reach and records each one as working or broken.
//!
//! # Traversal
//!
//! The [`Frontier`] holds discovered-but-unvisited URLs, each labeled with the
//! depth at which it was first found (`depth(child) = depth(parent) + 1`).
//! Pages deeper than `max_depth` are still checked but their links are not
//! followed. Pop order is unspecified.
//!
//! # Invariants
//!
//! - A URL is never in the frontier and the visited set at the same time
//! - A URL from another origin never enters the frontier
//! - Each URL is health-checked at most once per crawl

use crate::config::CrawlSettings;
use crate::error::ConfigError;
use crate::http::PageFetch;
use crate::models::{LinkReport, LinkResult};
use crate::utils::truncate_for_log;
use scraper::{Html, Selector};
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};
use url::{Origin, Url};

/// Unvisited and visited URLs of one crawl.
#[derive(Debug)]
pub struct Frontier {
    origin: Origin,
    pending: HashMap<String, usize>,
    visited: HashSet<String>,
}

impl Frontier {
    /// Create a frontier seeded with `base` at depth 0.
    pub fn new(base: &Url) -> Self {
        let mut frontier = Self {
            origin: base.origin(),
            pending: HashMap::new(),
            visited: HashSet::new(),
        };
        frontier.offer(base, 0);
        frontier
    }

    /// Offer a discovered URL.
    ///
    /// Returns `true` if the URL was added. Foreign origins, visited URLs and
    /// URLs already pending are refused; a pending URL keeps the smallest
    /// depth it was offered at.
    pub fn offer(&mut self, url: &Url, depth: usize) -> bool {
        if url.origin() != self.origin {
            return false;
        }
        let key = canonical(url);
        if self.visited.contains(&key) {
            return false;
        }
        match self.pending.get_mut(&key) {
            Some(existing) => {
                *existing = (*existing).min(depth);
                false
            }
            None => {
                self.pending.insert(key, depth);
                true
            }
        }
    }

    /// Move an arbitrary pending URL into the visited set and return it with
    /// its depth.
    pub fn claim_next(&mut self) -> Option<(String, usize)> {
        let key = self.pending.keys().next()?.clone();
        let depth = self.pending.remove(&key)?;
        if !self.visited.insert(key.clone()) {
            return self.claim_next();
        }
        Some((key, depth))
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn visited_len(&self) -> usize {
        self.visited.len()
    }

    pub fn is_disjoint(&self) -> bool {
        self.pending.keys().all(|url| !self.visited.contains(url))
    }
}

/// Normalized string form used as the frontier key: fragment dropped.
fn canonical(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    url.to_string()
}

/// Resolve every `a[href]` in `html` against `page_url`.
///
/// In-page anchors and non-navigational schemes are skipped, fragments are
/// dropped.
pub fn extract_links(html: &str, page_url: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);
    let Ok(anchor) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&anchor)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| resolve_href(href, page_url))
        .collect()
}

fn resolve_href(href: &str, base: &Url) -> Option<Url> {
    let trimmed = href.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    let mut url = base.join(trimmed).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.set_fragment(None);
    Some(url)
}

/// Health-check a single URL.
async fn check_link<F: PageFetch>(fetcher: &F, url: &str) -> LinkResult {
    match fetcher.head(url).await {
        Ok(status) => LinkResult::from_status(url, status),
        Err(e) => LinkResult::from_error(url, e.to_string()),
    }
}

/// Fetch `url` and return the links found on it; any failure yields none.
async fn discover<F: PageFetch>(fetcher: &F, url: &str) -> Vec<Url> {
    let page_url = match Url::parse(url) {
        Ok(u) => u,
        Err(e) => {
            warn!(%url, error = %e, "Unparseable URL in frontier");
            return Vec::new();
        }
    };
    match fetcher.get(url).await {
        Ok(page) => extract_links(&page.body, &page_url),
        Err(e) => {
            debug!(%url, error = %truncate_for_log(&e.to_string(), 200), "No links discovered");
            Vec::new()
        }
    }
}

/// Crawl every same-origin page reachable from `settings.base_url`.
///
/// # Arguments
///
/// * `fetcher` - HTTP access; carries the per-request timeout
/// * `settings` - Base URL, depth limit, pacing delay and visit ceiling
///
/// # Returns
///
/// A [`LinkReport`] with one entry per visited URL, or an error if the base
/// URL cannot be parsed.
#[instrument(level = "info", skip_all, fields(base_url = %settings.base_url, max_depth = settings.max_depth))]
pub async fn crawl<F: PageFetch>(
    fetcher: &F,
    settings: &CrawlSettings,
) -> Result<LinkReport, ConfigError> {
    let base = Url::parse(&settings.base_url).map_err(|source| ConfigError::Url {
        url: settings.base_url.clone(),
        source,
    })?;
    crawl_from(fetcher, &base, settings.max_depth, settings.delay(), settings.max_visited).await
}

async fn crawl_from<F: PageFetch>(
    fetcher: &F,
    base: &Url,
    max_depth: usize,
    delay: Duration,
    max_visited: usize,
) -> Result<LinkReport, ConfigError> {
    let t0 = Instant::now();
    let mut frontier = Frontier::new(base);
    let mut report = LinkReport::default();
    let mut first = true;

    while frontier.pending_len() > 0 {
        if frontier.visited_len() >= max_visited {
            warn!(
                visited = frontier.visited_len(),
                pending = frontier.pending_len(),
                "Visit ceiling reached; abandoning remaining frontier"
            );
            break;
        }
        if !first && !delay.is_zero() {
            sleep(delay).await;
        }
        first = false;

        let Some((url, depth)) = frontier.claim_next() else {
            break;
        };

        let result = check_link(fetcher, &url).await;
        if result.is_broken() {
            warn!(%url, depth, detail = ?result.detail, "Broken link");
        } else {
            debug!(%url, depth, detail = ?result.detail, "Working link");
        }
        report.push(result);

        if depth <= max_depth {
            let mut added = 0usize;
            for link in discover(fetcher, &url).await {
                if frontier.offer(&link, depth + 1) {
                    added += 1;
                }
            }
            debug!(%url, added, pending = frontier.pending_len(), "Expanded page");
        }
        debug_assert!(frontier.is_disjoint());
    }

    info!(
        working = report.working.len(),
        broken = report.broken.len(),
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "Crawl complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::fake::FakeWeb;
    use crate::models::LinkDetail;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn settings(base: &str, max_depth: usize) -> CrawlSettings {
        CrawlSettings {
            base_url: base.to_string(),
            max_depth,
            delay_ms: 0,
            ..CrawlSettings::default()
        }
    }

    #[test]
    fn test_frontier_stays_disjoint() {
        let base = url("https://x.test/");
        let mut frontier = Frontier::new(&base);
        assert!(frontier.is_disjoint());

        let (first, depth) = frontier.claim_next().unwrap();
        assert_eq!(first, "https://x.test/");
        assert_eq!(depth, 0);
        assert!(frontier.is_disjoint());

        // Re-offering a visited URL is refused.
        assert!(!frontier.offer(&base, 1));
        assert!(frontier.offer(&url("https://x.test/a"), 1));
        assert!(!frontier.offer(&url("https://x.test/a#top"), 1));
        assert!(frontier.is_disjoint());
        assert_eq!(frontier.pending_len(), 1);

        frontier.claim_next().unwrap();
        assert_eq!(frontier.visited_len(), 2);
        assert!(!frontier.offer(&url("https://x.test/a"), 2));
        assert!(frontier.is_disjoint());
        assert!(frontier.claim_next().is_none());
    }

    #[test]
    fn test_frontier_rejects_foreign_origins() {
        let mut frontier = Frontier::new(&url("https://x.test/"));
        assert!(!frontier.offer(&url("https://other.test/"), 1));
        assert!(!frontier.offer(&url("http://x.test/"), 1));
        assert!(!frontier.offer(&url("https://x.test:8443/"), 1));
        assert!(!frontier.offer(&url("https://sub.x.test/"), 1));
        assert!(frontier.offer(&url("https://x.test/page"), 1));
    }

    #[test]
    fn test_frontier_keeps_smallest_depth() {
        let mut frontier = Frontier::new(&url("https://x.test/"));
        frontier.claim_next();
        assert!(frontier.offer(&url("https://x.test/a"), 3));
        assert!(!frontier.offer(&url("https://x.test/a"), 1));
        assert_eq!(frontier.claim_next(), Some(("https://x.test/a".to_string(), 1)));
    }

    #[test]
    fn test_extract_links_resolves_and_filters() {
        let html = r##"
            <a href="/a">A</a>
            <a href="b#section">B</a>
            <a href="#top">top</a>
            <a href="mailto:me@x.test">mail</a>
            <a href="javascript:void(0)">js</a>
            <a href="https://other.test/c">C</a>
            <a>no href</a>
        "##;
        let links: Vec<String> = extract_links(html, &url("https://x.test/dir/page"))
            .into_iter()
            .map(|u| u.to_string())
            .collect();
        assert_eq!(
            links,
            vec![
                "https://x.test/a".to_string(),
                "https://x.test/dir/b".to_string(),
                "https://other.test/c".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_cycle_visits_each_page_once() {
        let web = FakeWeb::new()
            .page("https://x.test/", r#"<a href="/b">B</a>"#)
            .page("https://x.test/b", r#"<a href="/c">C</a>"#)
            .page("https://x.test/c", r#"<a href="/">A</a>"#);

        let report = crawl(&web, &settings("https://x.test/", 2)).await.unwrap();

        assert_eq!(report.working.len(), 3);
        assert!(report.broken.is_empty());
        for page in ["https://x.test/", "https://x.test/b", "https://x.test/c"] {
            assert_eq!(web.head_count(page), 1, "{page} checked once");
        }
    }

    #[tokio::test]
    async fn test_broken_links_are_classified() {
        let web = FakeWeb::new()
            .page(
                "https://x.test/",
                r#"<a href="/gone">gone</a><a href="/down">down</a><a href="/ok">ok</a>"#,
            )
            .status("https://x.test/gone", 404)
            .page("https://x.test/ok", "");

        let report = crawl(&web, &settings("https://x.test/", 2)).await.unwrap();

        assert_eq!(report.working.len(), 2);
        assert_eq!(report.broken.len(), 2);
        let gone = report.broken.iter().find(|r| r.url.ends_with("/gone")).unwrap();
        assert_eq!(gone.detail, LinkDetail::Status(404));
        let down = report.broken.iter().find(|r| r.url.ends_with("/down")).unwrap();
        assert!(matches!(down.detail, LinkDetail::Error(_)));
    }

    #[tokio::test]
    async fn test_foreign_links_are_never_checked() {
        let web = FakeWeb::new().page(
            "https://x.test/",
            r#"<a href="https://elsewhere.test/">out</a><a href="/in">in</a>"#,
        );

        let report = crawl(&web, &settings("https://x.test/", 2)).await.unwrap();

        assert_eq!(report.total(), 2);
        assert!(web.heads.borrow().iter().all(|u| u.starts_with("https://x.test/")));
    }

    #[tokio::test]
    async fn test_depth_limit_stops_expansion() {
        // Chain root -> 1 -> 2 -> 3; with max_depth 1 page 2 is checked but
        // not expanded, so page 3 is never reached.
        let web = FakeWeb::new()
            .page("https://x.test/", r#"<a href="/1">1</a>"#)
            .page("https://x.test/1", r#"<a href="/2">2</a>"#)
            .page("https://x.test/2", r#"<a href="/3">3</a>"#)
            .page("https://x.test/3", "");

        let report = crawl(&web, &settings("https://x.test/", 1)).await.unwrap();

        assert_eq!(report.total(), 3);
        assert_eq!(web.head_count("https://x.test/3"), 0);
        assert!(!web.gets.borrow().contains(&"https://x.test/2".to_string()));
    }

    #[tokio::test]
    async fn test_visit_ceiling_bounds_the_crawl() {
        let links: String = (0..20).map(|i| format!(r#"<a href="/p{i}">p</a>"#)).collect();
        let web = FakeWeb::new().page("https://x.test/", &links);
        let settings = CrawlSettings {
            max_visited: 5,
            ..settings("https://x.test/", 2)
        };

        let report = crawl(&web, &settings).await.unwrap();
        assert_eq!(report.total(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_requests_are_spaced_by_the_delay() {
        let web = FakeWeb::new()
            .page("https://x.test/", r#"<a href="/a">a</a><a href="/b">b</a>"#)
            .page("https://x.test/a", "")
            .page("https://x.test/b", "");
        let settings = CrawlSettings {
            delay_ms: 500,
            ..settings("https://x.test/", 2)
        };

        let t0 = tokio::time::Instant::now();
        let report = crawl(&web, &settings).await.unwrap();

        // Three pops, two pauses between them.
        assert_eq!(report.total(), 3);
        assert!(t0.elapsed() >= Duration::from_millis(1000), "{:?}", t0.elapsed());
    }

    #[tokio::test]
    async fn test_invalid_base_url_is_a_config_error() {
        let web = FakeWeb::new();
        let err = crawl(&web, &settings("not a url", 2)).await.unwrap_err();
        assert!(matches!(err, ConfigError::Url { .. }));
    }
}
