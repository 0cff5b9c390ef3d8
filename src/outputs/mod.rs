//! Output generation for JSON files, posts and reports.
//!
//! This module contains submodules responsible for writing a run's results:
//!
//! # Submodules
//!
//! - [`json`]: Link check report and per-run record batches
//! - [`sitemap`]: `sitemap.xml` built from the working crawled URLs
//! - [`report`]: `index.html` summary of the run
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── files/
//! │   ├── link_check_20250530.json
//! │   ├── tech_news_20250530.json
//! │   ├── becas_20250530.json
//! │   ├── all_news.json        # news archive
//! │   └── all_becas.json       # becas archive
//! ├── auto-news/
//! │   └── <slug>.md
//! ├── index.html
//! └── sitemap.xml
//! ```

pub mod json;
pub mod report;
pub mod sitemap;

use std::path::{Path, PathBuf};

/// The two record collections a run accumulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    News,
    Becas,
}

impl Collection {
    fn batch_prefix(self) -> &'static str {
        match self {
            Collection::News => "tech_news",
            Collection::Becas => "becas",
        }
    }

    fn archive_name(self) -> &'static str {
        match self {
            Collection::News => "all_news.json",
            Collection::Becas => "all_becas.json",
        }
    }
}

/// Paths of every file a run reads or writes.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
    posts_dir: PathBuf,
}

impl OutputLayout {
    /// `posts_dir` defaults to `<root>/auto-news` when not given.
    pub fn new(root: impl Into<PathBuf>, posts_dir: Option<PathBuf>) -> Self {
        let root = root.into();
        let posts_dir = posts_dir.unwrap_or_else(|| root.join("auto-news"));
        Self { root, posts_dir }
    }

    pub fn files_dir(&self) -> PathBuf {
        self.root.join("files")
    }

    pub fn posts_dir(&self) -> &Path {
        &self.posts_dir
    }

    pub fn link_report(&self, stamp: &str) -> PathBuf {
        self.files_dir().join(format!("link_check_{stamp}.json"))
    }

    pub fn batch(&self, collection: Collection, stamp: &str) -> PathBuf {
        self.files_dir()
            .join(format!("{}_{stamp}.json", collection.batch_prefix()))
    }

    pub fn archive(&self, collection: Collection) -> PathBuf {
        self.files_dir().join(collection.archive_name())
    }

    pub fn index_html(&self) -> PathBuf {
        self.root.join("index.html")
    }

    pub fn sitemap(&self) -> PathBuf {
        self.root.join("sitemap.xml")
    }
}
