use crate::domain::model::{CatalogEntry, Collection, Digest, TitleRecord, TitleShowings};
use crate::domain::venue::Venue;
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<String>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn collection_window(&self) -> Duration;
    fn excluded_keywords(&self) -> &[String];
    fn noise_phrases(&self) -> &[String];
    fn output_path(&self) -> Option<&str>;
    fn log_summary(&self) -> bool;
    fn show_links(&self) -> bool;
    fn concurrent_lookups(&self) -> usize;
}

/// A producer of showings for one venue.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn venue(&self) -> Venue;
    async fn run(&self) -> Result<TitleShowings>;
}

/// Registry of every canonical title seen so far. Any failure here is fatal
/// for the run.
pub trait TitleStore: Send + Sync {
    fn get(&self, title: &str) -> Result<Option<TitleRecord>>;
    fn insert(&self, record: &TitleRecord) -> Result<()>;
    /// Sets both first-seen and last-seen to `date`.
    fn reset_dates(&self, title: &str, date: NaiveDate) -> Result<()>;
    /// Sets last-seen to `date`.
    fn touch(&self, title: &str, date: NaiveDate) -> Result<()>;
    fn set_enrichment(&self, title: &str, secondary_title: Option<&str>, catalog_id: &str)
        -> Result<()>;
}

#[async_trait]
pub trait CatalogLookup: Send + Sync {
    async fn lookup(&self, title: &str) -> Result<Option<CatalogEntry>>;
}

#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, title: &str, body: &str) -> Result<()>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Collection>;
    async fn transform(&self, collection: Collection) -> Result<Digest>;
    async fn load(&self, digest: Digest) -> Result<String>;
}
