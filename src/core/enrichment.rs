//! Catalog lookups for titles the registry has just learned about.
//!
//! Lookups run as one task group, at most `concurrent_lookups` at a time, and
//! the group is joined before the digest is formatted. Only the joining side
//! writes to the registry.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::domain::model::{CatalogEntry, ClassifiedTitle};
use crate::domain::ports::{CatalogLookup, TitleStore};
use crate::utils::error::Result;

pub struct Enricher {
    lookup: Arc<dyn CatalogLookup>,
    store: Arc<dyn TitleStore>,
    concurrent_lookups: usize,
}

impl Enricher {
    pub fn new(
        lookup: Arc<dyn CatalogLookup>,
        store: Arc<dyn TitleStore>,
        concurrent_lookups: usize,
    ) -> Self {
        Self {
            lookup,
            store,
            concurrent_lookups: concurrent_lookups.max(1),
        }
    }

    /// Looks up every newly seen title and fills in its secondary title and
    /// catalog reference. Lookup failures leave the title as it was; a
    /// registry failure aborts the whole barrier.
    ///
    /// Returns the number of titles that got a catalog match.
    pub async fn enrich(&self, titles: &mut [ClassifiedTitle]) -> Result<usize> {
        let pending: Vec<String> = titles
            .iter()
            .filter(|t| t.newly_seen && t.catalog_id.is_none())
            .map(|t| t.title.clone())
            .collect();

        if pending.is_empty() {
            return Ok(0);
        }

        tracing::info!(
            "🔎 Looking up {} new titles ({} at a time)",
            pending.len(),
            self.concurrent_lookups
        );

        let semaphore = Arc::new(Semaphore::new(self.concurrent_lookups));
        let mut tasks = JoinSet::new();

        for title in pending {
            let lookup = Arc::clone(&self.lookup);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let found = lookup.lookup(&title).await;
                (title, found)
            });
        }

        let mut matches: HashMap<String, CatalogEntry> = HashMap::new();
        while let Some(joined) = tasks.join_next().await {
            let (title, found) = match joined {
                Ok(done) => done,
                Err(e) => {
                    tracing::warn!("⚠️ Catalog lookup task failed: {}", e);
                    continue;
                }
            };

            match found {
                Ok(Some(entry)) => {
                    let reference = entry.reference();
                    self.store
                        .set_enrichment(&title, entry.secondary_title.as_deref(), &reference)?;
                    tracing::debug!("🔎 {} -> {}", title, reference);
                    matches.insert(title, entry);
                }
                Ok(None) => tracing::debug!("🔎 {}: no catalog match", title),
                Err(e) => tracing::warn!("⚠️ {}: catalog lookup failed ({})", title, e),
            }
        }

        for title in titles.iter_mut() {
            if let Some(entry) = matches.get(&title.title) {
                title.secondary_title = entry.secondary_title.clone();
                title.catalog_id = Some(entry.reference());
            }
        }

        tracing::info!("🔎 {} titles matched in the catalog", matches.len());
        Ok(matches.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite_store::SqliteStore;
    use crate::domain::model::{Bucket, TitleRecord};
    use crate::utils::error::DigestError;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct FakeCatalog {
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl FakeCatalog {
        fn new() -> Self {
            Self {
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl CatalogLookup for FakeCatalog {
        async fn lookup(&self, title: &str) -> Result<Option<CatalogEntry>> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            match title {
                "DZIKIE RÓŻE" => Ok(Some(CatalogEntry {
                    id: 7,
                    title: "Dzikie róże".to_string(),
                    secondary_title: Some("Wild Roses".to_string()),
                    year: Some(2017),
                })),
                "BROKEN" => Err(DigestError::CatalogError {
                    message: "HTTP 500".to_string(),
                }),
                _ => Ok(None),
            }
        }
    }

    fn classified(title: &str, newly_seen: bool) -> ClassifiedTitle {
        ClassifiedTitle {
            title: title.to_string(),
            bucket: Bucket::NewToday,
            showings: Vec::new(),
            secondary_title: None,
            catalog_id: None,
            newly_seen,
        }
    }

    fn store_with(titles: &[&str]) -> Arc<SqliteStore> {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        for t in titles {
            store.insert(&TitleRecord::first_seen_on(*t, today)).unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_matches_fill_digest_and_registry() {
        let store = store_with(&["DZIKIE RÓŻE", "BROKEN", "UNKNOWN"]);
        let enricher = Enricher::new(Arc::new(FakeCatalog::new()), store.clone(), 2);
        let mut titles = vec![
            classified("DZIKIE RÓŻE", true),
            classified("BROKEN", true),
            classified("UNKNOWN", true),
        ];

        let matched = enricher.enrich(&mut titles).await.unwrap();

        assert_eq!(matched, 1);
        assert_eq!(titles[0].secondary_title.as_deref(), Some("Wild Roses"));
        assert_eq!(titles[0].catalog_id.as_deref(), Some("Wild+Roses-2017-7"));
        assert_eq!(titles[1].secondary_title, None);
        let stored = store.get("DZIKIE RÓŻE").unwrap().unwrap();
        assert_eq!(stored.catalog_id.as_deref(), Some("Wild+Roses-2017-7"));
    }

    #[tokio::test]
    async fn test_only_newly_seen_titles_are_looked_up() {
        let store = store_with(&["DZIKIE RÓŻE"]);
        let enricher = Enricher::new(Arc::new(FakeCatalog::new()), store, 2);
        let mut titles = vec![classified("DZIKIE RÓŻE", false)];

        assert_eq!(enricher.enrich(&mut titles).await.unwrap(), 0);
        assert_eq!(titles[0].secondary_title, None);
    }

    #[tokio::test]
    async fn test_lookups_respect_concurrency_limit() {
        let names: Vec<String> = (0..8).map(|i| format!("FILM {}", i)).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let store = store_with(&refs);
        let catalog = Arc::new(FakeCatalog::new());
        let enricher = Enricher::new(catalog.clone(), store, 3);
        let mut titles: Vec<_> = names.iter().map(|n| classified(n, true)).collect();

        enricher.enrich(&mut titles).await.unwrap();

        assert!(catalog.max_in_flight.load(Ordering::SeqCst) <= 3);
        assert_eq!(catalog.in_flight.load(Ordering::SeqCst), 0);
    }
}
