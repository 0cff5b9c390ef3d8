//! `index.html` summary of a run.
//!
//! The page shows the link check counts, a table of broken links, and the
//! newest entries of both archives. Every scraped or crawled string is
//! HTML-escaped before it is written.

use crate::error::StorageError;
use crate::models::{LinkDetail, LinkReport, Record};
use crate::storage::write_atomic;
use quick_xml::escape::escape;
use std::fmt::Write;
use std::path::Path;
use tracing::{info, instrument};

/// How many archive entries are listed per section.
const LATEST_LIMIT: usize = 20;

/// Everything the summary page shows.
#[derive(Debug, Clone, Copy)]
pub struct RunOverview<'a> {
    /// `None` when the crawl was skipped.
    pub links: Option<&'a LinkReport>,
    pub news: &'a [Record],
    pub becas: &'a [Record],
    /// Date shown in the page header.
    pub generated: &'a str,
}

fn render_records(html: &mut String, heading: &str, records: &[Record]) {
    writeln!(html, "<h2>{}</h2>", escape(heading)).unwrap();
    if records.is_empty() {
        writeln!(html, "<p>Sin entradas.</p>").unwrap();
        return;
    }
    writeln!(html, "<ul>").unwrap();
    for record in records.iter().take(LATEST_LIMIT) {
        writeln!(
            html,
            "  <li><a href=\"{}\">{}</a> <small>{} · {}</small></li>",
            escape(record.link.as_str()),
            escape(record.title.as_str()),
            escape(record.source.as_str()),
            escape(record.published_date.as_str()),
        )
        .unwrap();
    }
    writeln!(html, "</ul>").unwrap();
}

fn render_links(html: &mut String, links: Option<&LinkReport>) {
    writeln!(html, "<h2>Enlaces</h2>").unwrap();
    let Some(report) = links else {
        writeln!(html, "<p>Comprobación de enlaces omitida.</p>").unwrap();
        return;
    };

    writeln!(
        html,
        "<p>{} funcionan, {} rotos, {} comprobados.</p>",
        report.working.len(),
        report.broken.len(),
        report.total()
    )
    .unwrap();

    if report.broken.is_empty() {
        return;
    }
    writeln!(html, "<table>").unwrap();
    writeln!(html, "  <tr><th>URL</th><th>Motivo</th></tr>").unwrap();
    for result in &report.broken {
        let reason = match &result.detail {
            LinkDetail::Status(code) => code.to_string(),
            LinkDetail::Error(message) => message.clone(),
        };
        writeln!(
            html,
            "  <tr><td>{}</td><td>{}</td></tr>",
            escape(result.url.as_str()),
            escape(reason.as_str()),
        )
        .unwrap();
    }
    writeln!(html, "</table>").unwrap();
}

/// Render the complete summary page.
pub fn render_index(overview: &RunOverview<'_>) -> String {
    let mut html = String::new();

    writeln!(html, "<!DOCTYPE html>").unwrap();
    writeln!(html, "<html lang=\"es\">").unwrap();
    writeln!(html, "<head>").unwrap();
    writeln!(html, "<meta charset=\"utf-8\">").unwrap();
    writeln!(html, "<title>Auto News {}</title>", escape(overview.generated)).unwrap();
    writeln!(html, "</head>").unwrap();
    writeln!(html, "<body>").unwrap();
    writeln!(html, "<h1>Auto News {}</h1>", escape(overview.generated)).unwrap();

    render_links(&mut html, overview.links);
    render_records(&mut html, "Últimas noticias", overview.news);
    render_records(&mut html, "Últimas becas", overview.becas);

    writeln!(html, "</body>").unwrap();
    writeln!(html, "</html>").unwrap();
    html
}

/// Write `index.html` to `path`.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_index(path: &Path, overview: &RunOverview<'_>) -> Result<(), StorageError> {
    let html = render_index(overview);
    write_atomic(path, html.as_bytes()).await?;
    info!(
        news = overview.news.len().min(LATEST_LIMIT),
        becas = overview.becas.len().min(LATEST_LIMIT),
        "Wrote index page"
    );
    Ok(())
}
