use crate::core::classifier::TemporalClassifier;
use crate::core::collector::Collector;
use crate::core::enrichment::Enricher;
use crate::core::summary::{day_month_year, summary_file_name, SummaryFormatter};
use crate::core::titles::TitleNormalizer;
use crate::core::{ConfigProvider, Pipeline, Storage};
use crate::domain::model::{Collection, Digest};
use crate::domain::ports::{CatalogLookup, NotificationSink, SourceAdapter, TitleStore};
use crate::utils::error::Result;
use chrono::{Local, NaiveDate};
use std::sync::Arc;

/// The digest run wired to its collaborators: venue adapters, the title
/// registry, an optional catalog and an optional push sink.
pub struct DigestPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    collector: Collector,
    normalizer: TitleNormalizer,
    store: Arc<dyn TitleStore>,
    catalog: Option<Arc<dyn CatalogLookup>>,
    notifier: Option<Arc<dyn NotificationSink>>,
    today: NaiveDate,
}

impl<S: Storage, C: ConfigProvider> DigestPipeline<S, C> {
    pub fn new(
        storage: S,
        config: C,
        adapters: Vec<Arc<dyn SourceAdapter>>,
        store: Arc<dyn TitleStore>,
    ) -> Result<Self> {
        let normalizer = TitleNormalizer::new(config.excluded_keywords(), config.noise_phrases())?;
        let collector = Collector::new(adapters, config.collection_window());

        Ok(Self {
            storage,
            config,
            collector,
            normalizer,
            store,
            catalog: None,
            notifier: None,
            today: Local::now().date_naive(),
        })
    }

    pub fn with_catalog(mut self, catalog: Arc<dyn CatalogLookup>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Pins the calendar day used for classification and file names.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for DigestPipeline<S, C> {
    async fn extract(&self) -> Result<Collection> {
        tracing::debug!(
            "Launching {} venue adapters with a {:?} window",
            self.collector.venue_count(),
            self.collector.window()
        );
        Ok(self.collector.collect().await)
    }

    async fn transform(&self, collection: Collection) -> Result<Digest> {
        let canonical = self.normalizer.canonicalize(collection.showings);

        let classifier = TemporalClassifier::new(Arc::clone(&self.store), self.today);
        let mut titles = classifier.classify(canonical)?;

        if let Some(catalog) = &self.catalog {
            let enricher = Enricher::new(
                Arc::clone(catalog),
                Arc::clone(&self.store),
                self.config.concurrent_lookups(),
            );
            enricher.enrich(&mut titles).await?;
        }

        Ok(Digest {
            date: self.today,
            titles,
            received: collection.received,
        })
    }

    async fn load(&self, digest: Digest) -> Result<String> {
        let summary = SummaryFormatter::new(self.config.show_links()).format(&digest)?;

        if self.config.log_summary() {
            print!("{}", summary);
        }

        if self.config.output_path().is_some() {
            let written = self
                .storage
                .write_file(&summary_file_name(digest.date), summary.as_bytes())
                .await?;
            tracing::info!("💾 Summary saved to: {}", written);
        }

        if let Some(notifier) = &self.notifier {
            match notifier.send(&day_month_year(digest.date), &summary).await {
                Ok(()) => tracing::info!("📨 Summary pushed"),
                Err(e) => tracing::error!("❌ Push delivery failed: {}", e),
            }
        }

        Ok(summary)
    }
}
