//! Markdown post generation for scraped news.
//!
//! Every record becomes one `<slug>.md` file with Astro front matter. Posts
//! accumulate across runs and an existing file is never overwritten:
//!
//! - If `<slug>.md` is free, the post is written there
//! - If it already holds a post with the same title, nothing is written
//! - Otherwise `<slug>_1.md`, `<slug>_2.md`, ... are tried in turn

use crate::error::StorageError;
use crate::models::Record;
use crate::storage::ensure_dir;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::Write as _;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument};

/// Longest base slug, before any collision suffix.
const MAX_SLUG_LEN: usize = 50;
/// Used when a title has no ASCII letters or digits at all.
const FALLBACK_SLUG: &str = "post";
const DEFAULT_IMAGE: &str = "/img/tech_news.webp";
const AUTHOR: &str = "Bot Scraper";
const LAYOUT: &str = "../../layouts/PostLayout.astro";

static DISALLOWED: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9_-]").unwrap());

/// Result of [`materialize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Materialized {
    /// A new post was written under this slug.
    Written(String),
    /// A post for this title already exists under this slug.
    Skipped(String),
}

/// Derive the filesystem-safe base slug for a title.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(base_slug("Hola, Mundo! 2024"), "hola_mundo_2024");
/// ```
pub fn base_slug(title: &str) -> String {
    let lowered = title.to_lowercase().replace(' ', "_");
    let cleaned = DISALLOWED.replace_all(&lowered, "");
    let truncated: String = cleaned.chars().take(MAX_SLUG_LEN).collect();
    let trimmed = truncated.trim_end_matches('_');
    if trimmed.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Escape a value for a double-quoted YAML scalar.
fn quoted(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn title_line(record: &Record) -> String {
    format!("title: \"{}\"", quoted(&record.title))
}

/// Render the full Markdown document for `record` stored under `slug`.
pub fn render_post(record: &Record, slug: &str) -> String {
    let image = record.image_url.as_deref().unwrap_or(DEFAULT_IMAGE);
    let mut doc = String::new();

    writeln!(doc, "---").unwrap();
    writeln!(doc, "draft: false").unwrap();
    writeln!(doc, "{}", title_line(record)).unwrap();
    writeln!(doc, "description: \"Noticia automática de {}\"", quoted(&record.source)).unwrap();
    writeln!(doc, "pubDate: \"{}\"", record.published_date.replace('-', "/")).unwrap();
    writeln!(doc, "tags: ['tecnologia', 'auto']").unwrap();
    writeln!(doc, "slug: \"{slug}\"").unwrap();
    writeln!(doc, "image: \"{}\"", quoted(image)).unwrap();
    writeln!(doc, "author: \"{AUTHOR}\"").unwrap();
    writeln!(doc, "layout: \"{LAYOUT}\"").unwrap();
    writeln!(doc, "---\n").unwrap();
    writeln!(doc, "# {}\n", record.title).unwrap();
    writeln!(doc, "Fuente: {}\n", record.source).unwrap();
    writeln!(doc, "[Leer la noticia completa]({})\n", record.link).unwrap();
    writeln!(
        doc,
        "*Esta es una noticia automática scrapeada. Para más detalles, visita el enlace original.*"
    )
    .unwrap();
    doc
}

/// Whether the post at `path` was generated for `record`.
async fn holds_record(path: &Path, record: &Record) -> bool {
    let expected = title_line(record);
    match fs::read_to_string(path).await {
        Ok(existing) => existing
            .lines()
            .take_while(|line| !line.is_empty())
            .any(|line| line == expected),
        Err(_) => false,
    }
}

/// Create `path` holding exactly `contents`, failing with `AlreadyExists`
/// if it is taken.
///
/// The document is staged in `<path>.tmp` and hard-linked into place, so a
/// failed write never leaves a partial post at `path`.
async fn create_post_file(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp = PathBuf::from(tmp_name);

    let result = match fs::write(&tmp, contents).await {
        Ok(()) => fs::hard_link(&tmp, path).await,
        Err(e) => Err(e),
    };
    let _ = fs::remove_file(&tmp).await;
    result
}

/// Write the post for `record` into `dir` unless one already exists.
///
/// An existing document is never replaced.
#[instrument(level = "debug", skip_all, fields(title = %record.title))]
pub async fn materialize(dir: &Path, record: &Record) -> Result<Materialized, StorageError> {
    let base = base_slug(&record.title);
    let mut suffix = 0usize;

    loop {
        let slug = if suffix == 0 {
            base.clone()
        } else {
            format!("{base}_{suffix}")
        };
        let path = dir.join(format!("{slug}.md"));

        if fs::try_exists(&path).await.unwrap_or(false) {
            if holds_record(&path, record).await {
                debug!(%slug, "Post already exists; skipping");
                return Ok(Materialized::Skipped(slug));
            }
            suffix += 1;
            continue;
        }

        let doc = render_post(record, &slug);
        match create_post_file(&path, doc.as_bytes()).await {
            Ok(()) => {
                debug!(%slug, "Wrote post");
                return Ok(Materialized::Written(slug));
            }
            // Taken between the check and the link; look at it again.
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(StorageError::io(&path, e)),
        }
    }
}

/// Materialize every record, returning the slugs actually written.
#[instrument(level = "info", skip_all, fields(dir = %dir.display(), records = records.len()))]
pub async fn materialize_all(dir: &Path, records: &[Record]) -> Result<Vec<String>, StorageError> {
    ensure_dir(dir).await?;
    let mut written = Vec::new();
    let mut skipped = 0usize;

    for record in records {
        match materialize(dir, record).await? {
            Materialized::Written(slug) => written.push(slug),
            Materialized::Skipped(_) => skipped += 1,
        }
    }

    info!(written = written.len(), skipped, "Generated posts");
    Ok(written)
}
