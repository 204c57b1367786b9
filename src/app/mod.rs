//! Wires a resolved configuration to concrete collaborators.

use std::sync::Arc;

use crate::adapters::filmweb::FilmwebCatalog;
use crate::adapters::gotify::GotifySink;
use crate::adapters::sqlite_store::SqliteStore;
use crate::adapters::{build_adapters, http_client, parse_base};
use crate::config::cli::LocalStorage;
use crate::config::toml_config::DigestConfig;
use crate::core::pipeline::DigestPipeline;
use crate::utils::error::Result;

pub type LocalDigestPipeline = DigestPipeline<LocalStorage, DigestConfig>;

/// Opens the title registry and builds the full pipeline. Fails when the
/// registry cannot be opened.
pub fn build_pipeline(config: DigestConfig) -> Result<LocalDigestPipeline> {
    let store = Arc::new(SqliteStore::open(&config.store.path)?);
    tracing::info!("🗄️ Title registry: {}", config.store.path);

    let adapters = build_adapters(&config)?;
    let client = http_client(config.request_timeout())?;

    let catalog = if config.catalog.enabled {
        let base = parse_base("catalog.base_url", &config.catalog.base_url)?;
        Some(Arc::new(FilmwebCatalog::new(client.clone(), base)))
    } else {
        None
    };

    let notifier = config
        .notify_target()
        .map(|(origin, token)| Arc::new(GotifySink::new(client.clone(), origin, token)));

    let storage = LocalStorage::new(config.output.directory.clone().unwrap_or_else(|| ".".to_string()));

    let mut pipeline = DigestPipeline::new(storage, config, adapters, store)?;
    if let Some(catalog) = catalog {
        pipeline = pipeline.with_catalog(catalog);
    }
    if let Some(notifier) = notifier {
        pipeline = pipeline.with_notifier(notifier);
    }
    Ok(pipeline)
}
