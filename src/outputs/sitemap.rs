//! `sitemap.xml` generation.
//!
//! Lists every URL the crawler found working, sorted, with the run date as
//! `lastmod`.

use crate::error::StorageError;
use crate::models::LinkReport;
use crate::storage::write_atomic;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::io;
use std::path::Path;
use tracing::{info, instrument};

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

fn emit<W: io::Write>(writer: &mut Writer<W>, event: Event<'_>) -> io::Result<()> {
    writer
        .write_event(event)
        .map_err(|e| io::Error::other(e.to_string()))
}

fn text_element<W: io::Write>(writer: &mut Writer<W>, name: &str, text: &str) -> io::Result<()> {
    emit(writer, Event::Start(BytesStart::new(name)))?;
    emit(writer, Event::Text(BytesText::new(text)))?;
    emit(writer, Event::End(BytesEnd::new(name)))
}

/// Render a sitemap for `urls`, each stamped with `lastmod` (`YYYY-MM-DD`).
pub fn render_sitemap(urls: &[&str], lastmod: &str) -> io::Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    emit(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut urlset = BytesStart::new("urlset");
    urlset.push_attribute(("xmlns", SITEMAP_NS));
    emit(&mut writer, Event::Start(urlset))?;

    for url in urls {
        emit(&mut writer, Event::Start(BytesStart::new("url")))?;
        text_element(&mut writer, "loc", url)?;
        text_element(&mut writer, "lastmod", lastmod)?;
        emit(&mut writer, Event::End(BytesEnd::new("url")))?;
    }

    emit(&mut writer, Event::End(BytesEnd::new("urlset")))?;
    String::from_utf8(writer.into_inner()).map_err(|e| io::Error::other(e.to_string()))
}

/// Write `sitemap.xml` from the working links of `report`.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_sitemap(path: &Path, report: &LinkReport, lastmod: &str) -> Result<(), StorageError> {
    let mut urls: Vec<&str> = report.working.iter().map(|r| r.url.as_str()).collect();
    urls.sort_unstable();

    let xml = render_sitemap(&urls, lastmod).map_err(|e| StorageError::io(path, e))?;
    write_atomic(path, xml.as_bytes()).await?;
    info!(urls = urls.len(), "Wrote sitemap");
    Ok(())
}
