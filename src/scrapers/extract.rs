//! Selector-driven record extraction from a single source page.
//!
//! A source page is fetched once and parsed with `scraper`. Candidate
//! containers come from the first container selector that matches anything,
//! capped at the profile limit. Each candidate yields at most one
//! [`Record`]; candidates lacking a title or a link are dropped.
//!
//! # Dates
//!
//! Only machine-readable `datetime` attributes are used. If the first ten
//! characters form a `YYYY-MM-DD` date it becomes the record date, otherwise
//! the record is stamped with today's date. Free-text dates are never parsed.

use crate::config::{SelectorSet, Source};
use crate::error::ConfigError;
use crate::http::PageFetch;
use crate::models::Record;
use chrono::{Local, NaiveDate};
use itertools::Itertools;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// A [`SelectorSet`] with every selector parsed.
#[derive(Debug)]
pub struct CompiledSelectors {
    containers: Vec<Selector>,
    title: Vec<Selector>,
    link: Vec<Selector>,
    date: Vec<Selector>,
    image: Vec<Selector>,
}

impl CompiledSelectors {
    /// Parse every selector in `set`, failing on the first invalid one.
    pub fn compile(set: &SelectorSet) -> Result<Self, ConfigError> {
        Ok(Self {
            containers: compile_all(&set.containers)?,
            title: compile_all(&set.title)?,
            link: compile_all(&set.link)?,
            date: compile_all(&set.date)?,
            image: compile_all(&set.image)?,
        })
    }
}

fn compile_all(selectors: &[String]) -> Result<Vec<Selector>, ConfigError> {
    selectors
        .iter()
        .map(|raw| {
            Selector::parse(raw).map_err(|e| ConfigError::Selector {
                selector: raw.clone(),
                reason: format!("{e:?}"),
            })
        })
        .collect()
}

/// Today's date as `YYYY-MM-DD` in local time.
pub fn today() -> String {
    Local::now().date_naive().format("%Y-%m-%d").to_string()
}

/// Fetch one source and extract up to `limit` records from it.
///
/// A fetch failure is logged and yields an empty batch so that one bad
/// source never stops the others.
#[instrument(level = "info", skip(fetcher, source, selectors), fields(source = %source.name))]
pub async fn extract_from<F: PageFetch>(
    fetcher: &F,
    source: &Source,
    selectors: &CompiledSelectors,
    limit: usize,
) -> Vec<Record> {
    let base = match Url::parse(&source.url) {
        Ok(base) => base,
        Err(e) => {
            warn!(url = %source.url, error = %e, "Source URL is invalid; skipping");
            return Vec::new();
        }
    };

    let page = match fetcher.get(&source.url).await {
        Ok(page) => page,
        Err(e) => {
            error!(url = %source.url, error = %e, "Source fetch failed; skipping");
            return Vec::new();
        }
    };

    // Relative links resolve against the configured URL, not `page.url`.
    let records = parse_records(&page.body, &source.name, &base, selectors, limit, &today());
    info!(count = records.len(), status = page.status, url = %page.url, "Extracted records");
    records
}

/// Extract records from an already downloaded page.
///
/// Titles repeated within this page are kept only once (first wins).
pub fn parse_records(
    html: &str,
    source_name: &str,
    base: &Url,
    selectors: &CompiledSelectors,
    limit: usize,
    today: &str,
) -> Vec<Record> {
    let document = Html::parse_document(html);

    let candidates: Vec<ElementRef> = selectors
        .containers
        .iter()
        .map(|sel| document.select(sel).take(limit).collect::<Vec<_>>())
        .find(|found| !found.is_empty())
        .unwrap_or_default();
    debug!(candidates = candidates.len(), "Selected candidate containers");

    candidates
        .into_iter()
        .filter_map(|candidate| {
            let record = parse_candidate(candidate, source_name, base, selectors, today);
            if record.is_none() {
                debug!("Candidate without title or link dropped");
            }
            record
        })
        .unique_by(|record| record.title.clone())
        .collect()
}

fn parse_candidate(
    candidate: ElementRef,
    source_name: &str,
    base: &Url,
    selectors: &CompiledSelectors,
    today: &str,
) -> Option<Record> {
    let title = selectors.title.iter().find_map(|sel| {
        candidate
            .select(sel)
            .map(text_of)
            .find(|text| !text.is_empty())
    })?;

    let link = selectors
        .link
        .iter()
        .find_map(|sel| candidate.select(sel).find_map(|a| a.value().attr("href")))
        .and_then(|href| resolve(href, base))?;

    let published_date = selectors
        .date
        .iter()
        .find_map(|sel| candidate.select(sel).next())
        .and_then(|el| el.value().attr("datetime"))
        .and_then(date_prefix)
        .unwrap_or_else(|| today.to_string());

    let image_url = selectors
        .image
        .iter()
        .find_map(|sel| candidate.select(sel).find_map(|img| img.value().attr("src")))
        .and_then(|src| resolve(src, base));

    Some(Record {
        title,
        link,
        published_date,
        image_url,
        source: source_name.to_string(),
    })
}

/// Element text with runs of whitespace collapsed to single spaces.
fn text_of(element: ElementRef) -> String {
    element.text().flat_map(str::split_whitespace).join(" ")
}

fn resolve(reference: &str, base: &Url) -> Option<String> {
    let trimmed = reference.trim();
    if trimmed.is_empty() {
        return None;
    }
    let url = base.join(trimmed).ok()?;
    matches!(url.scheme(), "http" | "https").then(|| url.to_string())
}

/// The `YYYY-MM-DD` prefix of a `datetime` attribute, if it is a real date.
fn date_prefix(raw: &str) -> Option<String> {
    let prefix: String = raw.trim().chars().take(10).collect();
    NaiveDate::parse_from_str(&prefix, "%Y-%m-%d")
        .ok()
        .map(|date| date.format("%Y-%m-%d").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScrapeProfile;
    use crate::http::fake::FakeWeb;
    use pretty_assertions::assert_eq;

    const TODAY: &str = "2025-06-01";

    fn news_selectors() -> CompiledSelectors {
        CompiledSelectors::compile(&ScrapeProfile::news().selectors).unwrap()
    }

    fn base() -> Url {
        Url::parse("https://news.test/tech/").unwrap()
    }

    #[test]
    fn test_extracts_full_record() {
        let html = r#"
            <article>
              <h2>  Nuevo   procesador <b>cuántico</b> </h2>
              <a href="/2025/05/chip">Leer</a>
              <time datetime="2025-05-30T08:00:00Z">hace dos días</time>
              <img src="img/chip.webp">
            </article>
        "#;
        let records = parse_records(html, "Xataka", &base(), &news_selectors(), 5, TODAY);
        assert_eq!(
            records,
            vec![Record {
                title: "Nuevo procesador cuántico".to_string(),
                link: "https://news.test/2025/05/chip".to_string(),
                published_date: "2025-05-30".to_string(),
                image_url: Some("https://news.test/tech/img/chip.webp".to_string()),
                source: "Xataka".to_string(),
            }]
        );
    }

    #[test]
    fn test_free_text_or_missing_date_defaults_to_today() {
        let html = r#"
            <article><h2>Con fecha libre</h2><a href="/a">a</a><span class="date">3 de mayo</span></article>
            <article><h2>Sin fecha</h2><a href="/b">b</a></article>
            <article><h2>Fecha rota</h2><a href="/c">c</a><time datetime="ayer">ayer</time></article>
        "#;
        let records = parse_records(html, "Genbeta", &base(), &news_selectors(), 5, TODAY);
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.published_date == TODAY));
        assert!(records.iter().all(|r| r.image_url.is_none()));
    }

    #[test]
    fn test_container_fallback_and_limit() {
        // No <article>, so ".post" is used; only the first five are inspected.
        let html: String = (0..8)
            .map(|i| format!(r#"<div class="post"><h3>Post {i}</h3><a href="/p/{i}">x</a></div>"#))
            .collect();
        let records = parse_records(&html, "ComputerHoy", &base(), &news_selectors(), 5, TODAY);
        let titles: Vec<&str> = records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Post 0", "Post 1", "Post 2", "Post 3", "Post 4"]);
    }

    #[test]
    fn test_first_matching_container_selector_wins() {
        let html = r#"
            <div class="entry"><h2>Entry</h2><a href="/e">e</a></div>
            <article><h2>Article</h2><a href="/a">a</a></article>
        "#;
        let records = parse_records(html, "S", &base(), &news_selectors(), 5, TODAY);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Article");
    }

    #[test]
    fn test_candidates_without_title_or_link_are_dropped() {
        let html = r#"
            <article><a href="/no-title">x</a></article>
            <article><h2>No link</h2></article>
            <article><h2>Empty href target</h2><a>x</a></article>
            <article><h2>Valid</h2><a href="https://other.test/v">v</a></article>
        "#;
        let records = parse_records(html, "S", &base(), &news_selectors(), 5, TODAY);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Valid");
        assert_eq!(records[0].link, "https://other.test/v");
    }

    #[test]
    fn test_duplicate_titles_in_one_source_collapse() {
        let html = r#"
            <article><h2>Same</h2><a href="/1">1</a></article>
            <article><h2>Same</h2><a href="/2">2</a></article>
            <article><h2>same</h2><a href="/3">3</a></article>
        "#;
        let records = parse_records(html, "S", &base(), &news_selectors(), 5, TODAY);
        let links: Vec<&str> = records.iter().map(|r| r.link.as_str()).collect();
        assert_eq!(links, vec!["https://news.test/1", "https://news.test/3"]);
    }

    #[test]
    fn test_becas_profile_falls_back_to_anchor_title() {
        let selectors = CompiledSelectors::compile(&ScrapeProfile::becas().selectors).unwrap();
        let html = r#"<div class="noticia"><a href="/beca-ia">Beca de IA 2025</a></div>"#;
        let records = parse_records(html, "Levante-EMV", &base(), &selectors, 5, TODAY);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Beca de IA 2025");
        assert_eq!(records[0].link, "https://news.test/beca-ia");
    }

    #[test]
    fn test_invalid_selector_is_a_config_error() {
        let set = SelectorSet {
            containers: vec!["article[".to_string()],
            ..SelectorSet::default()
        };
        let err = CompiledSelectors::compile(&set).unwrap_err();
        assert!(matches!(err, ConfigError::Selector { .. }));
    }

    #[tokio::test]
    async fn test_extract_from_skips_failing_source() {
        let web = FakeWeb::new().status("https://down.test/", 503);
        let source = Source::new("Down", "https://down.test/");
        let records = extract_from(&web, &source, &news_selectors(), 5).await;
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_extract_from_fetches_once() {
        let web = FakeWeb::new().page(
            "https://up.test/",
            r#"<article><h2>Hola</h2><a href="/hola">x</a></article>"#,
        );
        let source = Source::new("Up", "https://up.test/");
        let records = extract_from(&web, &source, &news_selectors(), 5).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source, "Up");
        assert_eq!(web.gets.borrow().len(), 1);
    }

    #[tokio::test]
    async fn test_links_resolve_against_source_url_after_redirect() {
        let web = FakeWeb::new().redirected(
            "https://up.test/tech/",
            "https://cdn.up.test/mirror/index.html",
            r#"<article><h2>Hola</h2><a href="nota">x</a><img src="/i.png"></article>"#,
        );
        let source = Source::new("Up", "https://up.test/tech/");
        let records = extract_from(&web, &source, &news_selectors(), 5).await;

        assert_eq!(records[0].link, "https://up.test/tech/nota");
        assert_eq!(records[0].image_url.as_deref(), Some("https://up.test/i.png"));
    }
}
