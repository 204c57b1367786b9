use crate::domain::ports::ConfigProvider;
use crate::domain::venue::Venue;
use crate::utils::error::{DigestError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

static ENV_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"));

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DigestConfig {
    pub collection: CollectionConfig,
    pub titles: TitlesConfig,
    pub store: StoreConfig,
    pub catalog: CatalogConfig,
    pub notify: NotifyConfig,
    pub output: OutputConfig,
    pub venues: VenuesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionConfig {
    pub window_seconds: u64,
    pub request_timeout_seconds: u64,
    pub day_request_timeout_seconds: u64,
    pub day_window_seconds: u64,
    pub max_page_depth: usize,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            window_seconds: 90,
            request_timeout_seconds: 30,
            day_request_timeout_seconds: 5,
            day_window_seconds: 15,
            max_page_depth: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TitlesConfig {
    pub excluded_keywords: Vec<String>,
    /// Removed in this order after punctuation is gone.
    pub noise_phrases: Vec<String>,
}

impl Default for TitlesConfig {
    fn default() -> Self {
        let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        Self {
            excluded_keywords: owned(&[
                "UKRAINIAN",
                "UKRAIŃSKI",
                "DLA OSÓB",
                "KLUB SENIORA",
                "DKF KROPKA DLA DZIECI",
            ]),
            noise_phrases: owned(&[
                "2D",
                "3D",
                "DUBBING",
                "+ ENG SUB",
                "ENG SUB",
                "NAPISY",
                "TANI WTOREK",
                "DKF KROPKA",
                "DKF PEŁNA SALA",
                "PRZEDPREMIERA",
                "POKAZ SPECJALNY Z DYSKUSJĄ",
                "POKAZ SPECJALNY",
                "WERSJA REŻYSERSKA",
            ]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: "./movies.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub enabled: bool,
    pub base_url: String,
    pub concurrent_lookups: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "https://www.filmweb.pl".to_string(),
            concurrent_lookups: 4,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub origin: Option<String>,
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub log: bool,
    pub directory: Option<String>,
    pub links: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VenuesConfig {
    /// Venue identifiers to run; all venues when absent.
    pub only: Option<Vec<String>>,
    /// Per-venue replacement for the site origin, keyed by venue identifier.
    pub base_urls: HashMap<String, String>,
}

impl DigestConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content);

        toml::from_str(&processed).map_err(|e| DigestError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the variable's value; unset variables are left as written.
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    /// Venues to run, in venue order.
    pub fn selected_venues(&self) -> Result<Vec<Venue>> {
        let Some(only) = &self.venues.only else {
            return Ok(Venue::ALL.to_vec());
        };

        let mut selected = only
            .iter()
            .map(|id| id.parse::<Venue>())
            .collect::<Result<Vec<_>>>()?;
        selected.sort();
        selected.dedup();
        Ok(selected)
    }

    pub fn base_url_override(&self, venue: Venue) -> Option<&str> {
        self.venues
            .base_urls
            .iter()
            .find(|(id, _)| id.parse::<Venue>().ok() == Some(venue))
            .map(|(_, url)| url.as_str())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.collection.request_timeout_seconds)
    }

    pub fn day_request_timeout(&self) -> Duration {
        Duration::from_secs(self.collection.day_request_timeout_seconds)
    }

    pub fn day_window(&self) -> Duration {
        Duration::from_secs(self.collection.day_window_seconds)
    }

    /// Origin and token, when push delivery is configured.
    pub fn notify_target(&self) -> Option<(&str, &str)> {
        match (&self.notify.origin, &self.notify.token) {
            (Some(origin), Some(token)) => Some((origin.as_str(), token.as_str())),
            _ => None,
        }
    }

    pub fn validate_config(&self) -> Result<()> {
        let c = &self.collection;
        validation::validate_positive_number("collection.window_seconds", c.window_seconds, 1)?;
        validation::validate_positive_number(
            "collection.request_timeout_seconds",
            c.request_timeout_seconds,
            1,
        )?;
        validation::validate_positive_number(
            "collection.day_request_timeout_seconds",
            c.day_request_timeout_seconds,
            1,
        )?;
        validation::validate_positive_number(
            "collection.day_window_seconds",
            c.day_window_seconds,
            1,
        )?;
        validation::validate_range("collection.max_page_depth", c.max_page_depth, 0, 10)?;

        validation::validate_path("store.path", &self.store.path)?;

        validation::validate_url("catalog.base_url", &self.catalog.base_url)?;
        validation::validate_positive_number(
            "catalog.concurrent_lookups",
            self.catalog.concurrent_lookups as u64,
            1,
        )?;

        validation::validate_paired(
            "notify.origin",
            &self.notify.origin,
            "notify.token",
            &self.notify.token,
        )?;
        if let Some(origin) = &self.notify.origin {
            validation::validate_url("notify.origin", origin)?;
        }
        if let Some(token) = &self.notify.token {
            validation::validate_non_empty_string("notify.token", token)?;
        }

        if let Some(dir) = &self.output.directory {
            validation::validate_path("output.directory", dir)?;
        }

        self.selected_venues()?;
        for (id, url) in &self.venues.base_urls {
            id.parse::<Venue>()?;
            validation::validate_url(&format!("venues.base_urls.{}", id), url)?;
        }

        Ok(())
    }
}

impl ConfigProvider for DigestConfig {
    fn collection_window(&self) -> Duration {
        Duration::from_secs(self.collection.window_seconds)
    }

    fn excluded_keywords(&self) -> &[String] {
        &self.titles.excluded_keywords
    }

    fn noise_phrases(&self) -> &[String] {
        &self.titles.noise_phrases
    }

    fn output_path(&self) -> Option<&str> {
        self.output.directory.as_deref()
    }

    fn log_summary(&self) -> bool {
        self.output.log
    }

    fn show_links(&self) -> bool {
        self.output.links
    }

    fn concurrent_lookups(&self) -> usize {
        self.catalog.concurrent_lookups
    }
}

impl Validate for DigestConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
