use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::domain::model::CatalogEntry;
use crate::domain::ports::CatalogLookup;
use crate::utils::error::{DigestError, Result};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    #[serde(default)]
    search_hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    id: u64,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TitleInfo {
    title: String,
    original_title: Option<String>,
    year: Option<i32>,
}

/// Film catalog lookups against the Filmweb public API.
pub struct FilmwebCatalog {
    client: Client,
    base: Url,
}

impl FilmwebCatalog {
    /// Paths are resolved below `base`, so a catalog mounted under a prefix works too.
    pub fn new(client: Client, mut base: Url) -> Self {
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Self { client, base }
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base.join(path).map_err(|e| DigestError::CatalogError {
            message: format!("bad catalog path {:?}: {}", path, e),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T> {
        tracing::debug!("🔎 GET {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DigestError::CatalogError {
                message: format!("HTTP {}", status),
            });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl CatalogLookup for FilmwebCatalog {
    async fn lookup(&self, title: &str) -> Result<Option<CatalogEntry>> {
        let mut search = self.url("api/v1/live/search")?;
        search.query_pairs_mut().append_pair("query", title);

        let hits: SearchResponse = self.get_json(search).await?;
        let Some(film) = hits.search_hits.into_iter().find(|h| h.kind == "film") else {
            return Ok(None);
        };

        let info: TitleInfo = self
            .get_json(self.url(&format!("api/v1/title/{}/info", film.id))?)
            .await?;

        Ok(Some(CatalogEntry {
            id: film.id,
            title: info.title,
            secondary_title: info.original_title.filter(|t| !t.trim().is_empty()),
            year: info.year,
        }))
    }
}
