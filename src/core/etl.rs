use crate::core::Pipeline;
use crate::utils::error::Result;
use std::time::Instant;

/// Drives one digest run: collect, classify, deliver.
pub struct DigestEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> DigestEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    /// Returns the formatted summary.
    pub async fn run(&self) -> Result<String> {
        let started = Instant::now();
        tracing::info!("🚀 Starting digest run");

        tracing::info!("📡 Collecting repertoires...");
        let collection = self.pipeline.extract().await?;
        tracing::info!(
            "📡 {} raw titles, {} showings from {} venues",
            collection.showings.len(),
            collection.showings.showing_count(),
            collection.received.received_count()
        );

        tracing::info!("🔄 Classifying titles...");
        let digest = self.pipeline.transform(collection).await?;
        tracing::info!("🔄 {} titles in the digest", digest.titles.len());

        tracing::info!("💾 Delivering summary...");
        let summary = self.pipeline.load(digest).await?;

        tracing::info!("✅ Digest run finished in {:.1?}", started.elapsed());
        Ok(summary)
    }
}
