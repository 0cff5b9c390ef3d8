//! Runtime configuration: crawl settings, scrape profiles and keyword lists.
//!
//! Every value has a compiled-in default. A YAML file may override any subset
//! of the structure, and the CLI may override the crawl settings on top of
//! that. The resulting [`Config`] is built once in `main` and passed down by
//! reference; nothing mutates it afterwards.
//!
//! # Example file
//!
//! ```yaml
//! crawl:
//!   base_url: https://blog.example.com/
//!   max_depth: 3
//! news:
//!   limit: 8
//!   sources:
//!     - name: Xataka
//!       url: https://www.xataka.com/
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument};

/// Settings for the broken-link crawler.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CrawlSettings {
    /// Root of the crawl; only URLs sharing its origin are followed.
    pub base_url: String,
    /// Pages deeper than this are still checked but not expanded.
    pub max_depth: usize,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Pause between two frontier pops, in milliseconds.
    pub delay_ms: u64,
    /// Hard ceiling on the number of URLs visited in one run.
    pub max_visited: usize,
}

impl CrawlSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            base_url: "https://blog-jorbencas.vercel.app/".to_string(),
            max_depth: 2,
            timeout_secs: 10,
            delay_ms: 500,
            max_visited: 500,
        }
    }
}

/// A named page to scrape.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Source {
    pub name: String,
    pub url: String,
}

impl Source {
    pub fn new(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
        }
    }
}

/// Ordered CSS selector fallbacks used to pull records out of a page.
///
/// Each list is tried front to back and the first selector that matches
/// wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectorSet {
    pub containers: Vec<String>,
    pub title: Vec<String>,
    pub link: Vec<String>,
    pub date: Vec<String>,
    pub image: Vec<String>,
}

impl Default for SelectorSet {
    fn default() -> Self {
        Self {
            containers: strings(&["article", ".post", ".entry"]),
            title: strings(&["h1", "h2", "h3", ".title"]),
            link: strings(&["a[href]"]),
            date: strings(&["time", "[datetime]", ".date", ".published"]),
            image: strings(&["img[src]"]),
        }
    }
}

/// Sources plus the rules used to scrape them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScrapeProfile {
    pub sources: Vec<Source>,
    pub selectors: SelectorSet,
    /// Maximum number of candidate containers inspected per source.
    pub limit: usize,
}

/// A selector table as written in a config file; absent lists are `None`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct SelectorOverrides {
    containers: Option<Vec<String>>,
    title: Option<Vec<String>>,
    link: Option<Vec<String>>,
    date: Option<Vec<String>>,
    image: Option<Vec<String>>,
}

/// A scrape profile as written in a config file.
///
/// Whatever is given replaces the matching part of the built-in profile;
/// everything else is kept from it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ProfileOverrides {
    sources: Option<Vec<Source>>,
    selectors: SelectorOverrides,
    limit: Option<usize>,
}

fn default_limit() -> usize {
    5
}

impl ScrapeProfile {
    fn overlay(mut self, overrides: ProfileOverrides) -> Self {
        let ProfileOverrides {
            sources,
            selectors,
            limit,
        } = overrides;
        if let Some(sources) = sources {
            self.sources = sources;
        }
        if let Some(limit) = limit {
            self.limit = limit;
        }

        let set = &mut self.selectors;
        for (target, given) in [
            (&mut set.containers, selectors.containers),
            (&mut set.title, selectors.title),
            (&mut set.link, selectors.link),
            (&mut set.date, selectors.date),
            (&mut set.image, selectors.image),
        ] {
            if let Some(given) = given {
                *target = given;
            }
        }
        self
    }

    /// Spanish technology news sites.
    pub fn news() -> Self {
        Self {
            sources: vec![
                Source::new("Xataka", "https://www.xataka.com/"),
                Source::new("Genbeta", "https://www.genbeta.com/"),
                Source::new("ComputerHoy", "https://computerhoy.com/"),
                Source::new("HobbyConsolas", "https://www.hobbyconsolas.com/"),
                Source::new("El País Tecnología", "https://elpais.com/tecnologia/"),
                Source::new("ABC Tecnología", "https://www.abc.es/tecnologia/"),
                Source::new("Vida Extra", "https://www.vidaextra.com/"),
            ],
            selectors: SelectorSet::default(),
            limit: default_limit(),
        }
    }

    /// Scholarship and course announcements around la Vall d'Albaida.
    pub fn becas() -> Self {
        Self {
            sources: vec![
                Source::new("Levante-EMV", "https://www.levante-emv.com/"),
                Source::new("Valencia Plaza", "https://valenciaplaza.com/"),
                Source::new("Fundación Carolina", "https://www.fundacioncarolina.es/"),
            ],
            selectors: SelectorSet {
                containers: strings(&[
                    "article", ".post", ".entry", ".news", ".noticia", ".beca",
                ]),
                title: strings(&["h1", "h2", "h3", ".title", "a"]),
                ..SelectorSet::default()
            },
            limit: default_limit(),
        }
    }
}

/// Keyword lists deciding whether a scholarship record is relevant.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Keywords {
    pub tech: Vec<String>,
    pub scholarship: Vec<String>,
}

impl Default for Keywords {
    fn default() -> Self {
        Self {
            tech: strings(&[
                "informática",
                "ia",
                "inteligencia artificial",
                "programación",
                "desarrollo",
                "tecnología",
                "software",
                "hardware",
                "ciberseguridad",
                "machine learning",
                "deep learning",
                "data science",
                "big data",
                "blockchain",
                "criptomonedas",
                "iot",
                "internet de las cosas",
                "cloud",
                "nube",
                "devops",
                "agile",
                "scrum",
            ]),
            scholarship: strings(&[
                "beca",
                "curso",
                "ayuda",
                "subvención",
                "formación",
                "certificación",
                "diploma",
                "master",
                "doctorado",
                "fp",
                "vocacional",
                "valencia",
                "vall",
                "albaida",
            ]),
        }
    }
}

/// Complete configuration for one run.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(from = "ConfigFile")]
pub struct Config {
    pub crawl: CrawlSettings,
    pub news: ScrapeProfile,
    pub becas: ScrapeProfile,
    pub keywords: Keywords,
    /// User agent sent with every request.
    pub user_agent: String,
}

/// On-disk shape of [`Config`]; every section is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    crawl: CrawlSettings,
    news: ProfileOverrides,
    becas: ProfileOverrides,
    keywords: Keywords,
    user_agent: Option<String>,
}

impl From<ConfigFile> for Config {
    fn from(file: ConfigFile) -> Self {
        let defaults = Config::default();
        Self {
            crawl: file.crawl,
            news: defaults.news.overlay(file.news),
            becas: defaults.becas.overlay(file.becas),
            keywords: file.keywords,
            user_agent: file.user_agent.unwrap_or(defaults.user_agent),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            crawl: CrawlSettings::default(),
            news: ScrapeProfile::news(),
            becas: ScrapeProfile::becas(),
            keywords: Keywords::default(),
            user_agent: format!("auto_news/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Config {
    /// Load configuration from an optional YAML file.
    ///
    /// With no path the compiled-in defaults are returned. Fields absent from
    /// the file keep their defaults.
    #[instrument(level = "info")]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            info!("No config file given; using built-in defaults");
            return Ok(Self::default());
        };

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!(
            path = %path.display(),
            news_sources = config.news.sources.len(),
            becas_sources = config.becas.sources.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(raw)
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
