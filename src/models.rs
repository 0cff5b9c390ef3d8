//! Data models for link checks and scraped records.
//!
//! This module defines the core data structures used throughout the application:
//! - [`LinkResult`]: Health of one crawled URL
//! - [`LinkReport`]: The full outcome of a crawl, split into working and broken links
//! - [`Record`]: A news or scholarship item extracted from a source page
//!
//! Record fields serialize with the Spanish keys used by the site that
//! consumes the JSON files (`titulo`, `enlace`, `fecha`, `imagen`, `fuente`).

use serde::{Deserialize, Serialize};

/// Whether a crawled URL answered successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    Working,
    Broken,
}

/// What the health check observed: an HTTP status code or a transport error.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkDetail {
    Status(u16),
    Error(String),
}

/// The classified health of a single crawled URL.
///
/// Created once per unique URL visited and never modified afterwards.
///
/// # JSON Shape
///
/// ```json
/// {"url": "https://example.com/a", "health": "broken", "status": 404}
/// {"url": "https://example.com/b", "health": "broken", "error": "request timed out"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LinkResult {
    pub url: String,
    #[serde(rename = "health")]
    pub status: LinkStatus,
    #[serde(flatten)]
    pub detail: LinkDetail,
}

impl LinkResult {
    /// Classify an HTTP status: anything at or above 400 is broken.
    pub fn from_status(url: impl Into<String>, code: u16) -> Self {
        let status = if code >= 400 {
            LinkStatus::Broken
        } else {
            LinkStatus::Working
        };
        Self {
            url: url.into(),
            status,
            detail: LinkDetail::Status(code),
        }
    }

    /// A request that never produced a response is always broken.
    pub fn from_error(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: LinkStatus::Broken,
            detail: LinkDetail::Error(message.into()),
        }
    }

    pub fn is_broken(&self) -> bool {
        self.status == LinkStatus::Broken
    }
}

/// Outcome of a crawl, written to `files/link_check_<YYYYMMDD>.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct LinkReport {
    pub working: Vec<LinkResult>,
    pub broken: Vec<LinkResult>,
}

impl LinkReport {
    pub fn push(&mut self, result: LinkResult) {
        if result.is_broken() {
            self.broken.push(result);
        } else {
            self.working.push(result);
        }
    }

    pub fn total(&self) -> usize {
        self.working.len() + self.broken.len()
    }
}

/// A news or scholarship item scraped from a source.
///
/// The title is the identity of a record: two records with the same title
/// (exact, case-sensitive) are the same item, both within one batch and
/// across the persisted archive.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Record {
    #[serde(rename = "titulo", alias = "title")]
    pub title: String,
    #[serde(rename = "enlace", alias = "link")]
    pub link: String,
    /// Publication date as `YYYY-MM-DD`; string order equals date order.
    #[serde(rename = "fecha", alias = "date")]
    pub published_date: String,
    #[serde(rename = "imagen", alias = "image", default, with = "empty_as_none")]
    pub image_url: Option<String>,
    #[serde(rename = "fuente", alias = "source")]
    pub source: String,
}

/// Missing images are stored as `""` in the JSON files.
mod empty_as_none {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(value.as_deref().unwrap_or(""))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.filter(|s| !s.trim().is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(image: Option<&str>) -> Record {
        Record {
            title: "Nueva beca de IA".to_string(),
            link: "https://example.com/beca".to_string(),
            published_date: "2025-03-01".to_string(),
            image_url: image.map(str::to_string),
            source: "Levante-EMV".to_string(),
        }
    }

    #[test]
    fn test_link_result_classification() {
        assert_eq!(LinkResult::from_status("u", 200).status, LinkStatus::Working);
        assert_eq!(LinkResult::from_status("u", 301).status, LinkStatus::Working);
        assert_eq!(LinkResult::from_status("u", 399).status, LinkStatus::Working);
        assert_eq!(LinkResult::from_status("u", 400).status, LinkStatus::Broken);
        assert_eq!(LinkResult::from_status("u", 503).status, LinkStatus::Broken);
        assert!(LinkResult::from_error("u", "dns failure").is_broken());
    }

    #[test]
    fn test_link_result_json_shape() {
        let ok = serde_json::to_value(LinkResult::from_status("https://x.test/", 200)).unwrap();
        assert_eq!(
            ok,
            serde_json::json!({"url": "https://x.test/", "health": "working", "status": 200})
        );

        let err = serde_json::to_value(LinkResult::from_error("https://x.test/a", "timeout")).unwrap();
        assert_eq!(
            err,
            serde_json::json!({"url": "https://x.test/a", "health": "broken", "error": "timeout"})
        );

        let back: LinkResult = serde_json::from_value(err).unwrap();
        assert_eq!(back.detail, LinkDetail::Error("timeout".to_string()));
    }

    #[test]
    fn test_link_report_push_splits_by_health() {
        let mut report = LinkReport::default();
        report.push(LinkResult::from_status("a", 200));
        report.push(LinkResult::from_status("b", 404));
        report.push(LinkResult::from_error("c", "refused"));
        assert_eq!(report.working.len(), 1);
        assert_eq!(report.broken.len(), 2);
        assert_eq!(report.total(), 3);
    }

    #[test]
    fn test_record_serializes_spanish_keys() {
        let json = serde_json::to_value(record(None)).unwrap();
        assert_eq!(json["titulo"], "Nueva beca de IA");
        assert_eq!(json["enlace"], "https://example.com/beca");
        assert_eq!(json["fecha"], "2025-03-01");
        assert_eq!(json["imagen"], "");
        assert_eq!(json["fuente"], "Levante-EMV");
    }

    #[test]
    fn test_record_empty_image_reads_as_none() {
        let json = r#"{
            "titulo": "X",
            "enlace": "https://example.com/x",
            "fecha": "2024-01-01",
            "imagen": "",
            "fuente": "Xataka"
        }"#;
        let parsed: Record = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.image_url, None);

        let with_image = serde_json::to_string(&record(Some("https://example.com/a.png"))).unwrap();
        let parsed: Record = serde_json::from_str(&with_image).unwrap();
        assert_eq!(parsed.image_url.as_deref(), Some("https://example.com/a.png"));
    }

    #[test]
    fn test_record_accepts_english_aliases_and_missing_image() {
        let json = r#"{
            "title": "X",
            "link": "https://example.com/x",
            "date": "2024-01-01",
            "source": "Genbeta"
        }"#;
        let parsed: Record = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.title, "X");
        assert_eq!(parsed.image_url, None);
    }
}
