//! Keyword relevance filter for scholarship records.
//!
//! A title is relevant when its lowercased form contains any keyword from
//! either list as a plain substring. Matching is deliberately untokenized:
//! `ia` also matches inside `academia`.

use crate::config::Keywords;
use crate::models::Record;
use tracing::info;

/// Substring test of `title` against the union of both keyword lists.
pub fn is_relevant(title: &str, tech_keywords: &[String], scholarship_keywords: &[String]) -> bool {
    let lowered = title.to_lowercase();
    tech_keywords
        .iter()
        .chain(scholarship_keywords)
        .filter(|keyword| !keyword.is_empty())
        .any(|keyword| lowered.contains(&keyword.to_lowercase()))
}

/// Both keyword lists, lowercased once.
#[derive(Debug, Clone)]
pub struct KeywordFilter {
    tech: Vec<String>,
    scholarship: Vec<String>,
}

fn lowered(list: &[String]) -> Vec<String> {
    list.iter()
        .map(|k| k.to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}

impl KeywordFilter {
    pub fn new(keywords: &Keywords) -> Self {
        Self {
            tech: lowered(&keywords.tech),
            scholarship: lowered(&keywords.scholarship),
        }
    }

    pub fn is_relevant(&self, title: &str) -> bool {
        is_relevant(title, &self.tech, &self.scholarship)
    }

    /// Keep only relevant records, preserving order.
    pub fn retain_relevant(&self, records: Vec<Record>) -> Vec<Record> {
        let before = records.len();
        let kept: Vec<Record> = records
            .into_iter()
            .filter(|record| self.is_relevant(&record.title))
            .collect();
        info!(before, kept = kept.len(), "Applied keyword filter");
        kept
    }
}
