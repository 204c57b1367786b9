use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::domain::venue::Venue;

/// One scheduled screening.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Showing {
    pub venue: Venue,
    pub time: DateTime<Local>,
    pub url: Option<String>,
}

impl Showing {
    pub fn new(venue: Venue, time: DateTime<Local>, url: Option<String>) -> Self {
        Self { venue, time, url }
    }
}

/// Raw title, as printed by the venue, to its showings.
pub type TitleShowings = HashMap<String, Vec<Showing>>;

/// Canonical title to its showings, ordered by title.
pub type CanonicalShowings = BTreeMap<String, Vec<Showing>>;

/// What a single adapter hands over to the coordinator.
#[derive(Debug, Clone)]
pub struct SourceResult {
    pub venue: Venue,
    pub titles: TitleShowings,
}

#[derive(Debug, Clone, Default)]
pub struct AggregateShowings {
    titles: TitleShowings,
}

impl AggregateShowings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends every showing list of `result` onto the list kept for the same raw title.
    pub fn merge(&mut self, result: SourceResult) {
        for (title, showings) in result.titles {
            self.titles.entry(title).or_default().extend(showings);
        }
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    pub fn showing_count(&self) -> usize {
        self.titles.values().map(Vec::len).sum()
    }

    pub fn get(&self, raw_title: &str) -> Option<&[Showing]> {
        self.titles.get(raw_title).map(Vec::as_slice)
    }

    pub fn into_inner(self) -> TitleShowings {
        self.titles
    }
}

impl From<TitleShowings> for AggregateShowings {
    fn from(titles: TitleShowings) -> Self {
        Self { titles }
    }
}

/// Which of the configured venues answered inside the collection window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReceivedSet {
    expected: [bool; Venue::COUNT],
    received: [bool; Venue::COUNT],
}

impl ReceivedSet {
    pub fn expecting(venues: impl IntoIterator<Item = Venue>) -> Self {
        let mut set = Self::default();
        for venue in venues {
            set.expected[venue.index()] = true;
        }
        set
    }

    pub fn mark(&mut self, venue: Venue) {
        self.received[venue.index()] = true;
    }

    pub fn received_count(&self) -> usize {
        self.received.iter().filter(|r| **r).count()
    }

    /// Expected venues that never reported, in venue order.
    pub fn missing(&self) -> Vec<Venue> {
        Venue::ALL
            .into_iter()
            .filter(|v| self.expected[v.index()] && !self.received[v.index()])
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }
}

/// Persisted bookkeeping for one canonical title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleRecord {
    pub title: String,
    pub first_seen: NaiveDate,
    pub last_seen: NaiveDate,
    pub secondary_title: Option<String>,
    pub catalog_id: Option<String>,
}

impl TitleRecord {
    pub fn first_seen_on(title: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            title: title.into(),
            first_seen: date,
            last_seen: date,
            secondary_title: None,
            catalog_id: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Bucket {
    NewToday,
    Yesterday,
    LastWeek,
    Earlier,
}

impl Bucket {
    pub const ALL: [Bucket; 4] = [
        Bucket::NewToday,
        Bucket::Yesterday,
        Bucket::LastWeek,
        Bucket::Earlier,
    ];

    pub fn header(self) -> &'static str {
        match self {
            Bucket::NewToday => "TODAY",
            Bucket::Yesterday => "YESTERDAY",
            Bucket::LastWeek => "LAST WEEK",
            Bucket::Earlier => "ALL OTHERS",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedTitle {
    pub title: String,
    pub bucket: Bucket,
    pub showings: Vec<Showing>,
    pub secondary_title: Option<String>,
    pub catalog_id: Option<String>,
    /// Inserted into the registry by this run.
    pub newly_seen: bool,
}

/// Output of the extract stage.
#[derive(Debug, Clone)]
pub struct Collection {
    pub showings: AggregateShowings,
    pub received: ReceivedSet,
}

/// Output of the transform stage, ready to be formatted.
#[derive(Debug, Clone)]
pub struct Digest {
    pub date: NaiveDate,
    pub titles: Vec<ClassifiedTitle>,
    pub received: ReceivedSet,
}

impl Digest {
    pub fn in_bucket(&self, bucket: Bucket) -> impl Iterator<Item = &ClassifiedTitle> {
        self.titles.iter().filter(move |t| t.bucket == bucket)
    }
}

/// Best single catalog match for a title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: u64,
    pub title: String,
    pub secondary_title: Option<String>,
    pub year: Option<i32>,
}

impl CatalogEntry {
    /// Opaque reference stored alongside the title, e.g. `The+Brutalist-2024-10005680`.
    pub fn reference(&self) -> String {
        let name = self.secondary_title.as_deref().unwrap_or(&self.title);
        let slug = name.split_whitespace().collect::<Vec<_>>().join("+");
        match self.year {
            Some(year) => format!("{}-{}-{}", slug, year, self.id),
            None => format!("{}-{}", slug, self.id),
        }
    }
}
