//! Buckets titles by how long they have been on the repertoire, keeping the
//! title registry current as a side effect.

use chrono::NaiveDate;
use std::sync::Arc;

use crate::domain::model::{Bucket, CanonicalShowings, ClassifiedTitle, TitleRecord};
use crate::domain::ports::TitleStore;
use crate::utils::error::Result;

/// A title absent for longer than this counts as new again.
pub const REAPPEARANCE_GAP_HOURS: i64 = 25;
pub const YESTERDAY_MAX_HOURS: i64 = 50;
pub const LAST_WEEK_MAX_HOURS: i64 = 170;

fn hours_between(earlier: NaiveDate, later: NaiveDate) -> i64 {
    (later - earlier).num_hours()
}

/// Bucket for a title already present in the registry and seen recently.
pub fn bucket_for_age(first_seen: NaiveDate, today: NaiveDate) -> Bucket {
    let age = hours_between(first_seen, today);
    if age <= YESTERDAY_MAX_HOURS {
        Bucket::Yesterday
    } else if age <= LAST_WEEK_MAX_HOURS {
        Bucket::LastWeek
    } else {
        Bucket::Earlier
    }
}

pub struct TemporalClassifier {
    store: Arc<dyn TitleStore>,
    today: NaiveDate,
}

impl TemporalClassifier {
    pub fn new(store: Arc<dyn TitleStore>, today: NaiveDate) -> Self {
        Self { store, today }
    }

    pub fn classify_title(&self, title: &str) -> Result<(Bucket, TitleRecord, bool)> {
        let today = self.today;

        let Some(mut record) = self.store.get(title)? else {
            let record = TitleRecord::first_seen_on(title, today);
            self.store.insert(&record)?;
            return Ok((Bucket::NewToday, record, true));
        };

        if hours_between(record.last_seen, today) > REAPPEARANCE_GAP_HOURS {
            self.store.reset_dates(title, today)?;
            record.first_seen = today;
            record.last_seen = today;
            return Ok((Bucket::NewToday, record, false));
        }

        self.store.touch(title, today)?;
        record.last_seen = today;
        Ok((bucket_for_age(record.first_seen, today), record, false))
    }

    /// Classifies every title, stopping at the first store failure.
    pub fn classify(&self, titles: CanonicalShowings) -> Result<Vec<ClassifiedTitle>> {
        let mut classified = Vec::with_capacity(titles.len());

        for (title, showings) in titles {
            let (bucket, record, newly_seen) = self.classify_title(&title)?;
            tracing::debug!("🗂️ {} -> {:?}", title, bucket);
            classified.push(ClassifiedTitle {
                title,
                bucket,
                showings,
                secondary_title: record.secondary_title,
                catalog_id: record.catalog_id,
                newly_seen,
            });
        }

        tracing::info!(
            "🗂️ Classified {} titles ({} new in registry)",
            classified.len(),
            classified.iter().filter(|t| t.newly_seen).count()
        );
        Ok(classified)
    }
}
