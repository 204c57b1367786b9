use async_trait::async_trait;
use chrono::{Local, Months, NaiveDate};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use url::Url;

use crate::core::collector::fan_in;
use crate::core::datetime::parse_showing_time;
use crate::domain::model::{Showing, TitleShowings};
use crate::domain::ports::SourceAdapter;
use crate::domain::venue::Venue;
use crate::utils::error::{DigestError, Result};

pub const BASE_URL: &str = "https://cinema-city.pl";
const QUICKBOOK: &str = "/pl/data-api-service/v1/quickbook/10103";

pub fn cinema_id(venue: Venue) -> Option<&'static str> {
    match venue {
        Venue::CinemaCityBonarka => Some("1090"),
        Venue::CinemaCityKazimierz => Some("1076"),
        Venue::CinemaCityZakopianka => Some("1064"),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    body: T,
}

#[derive(Debug, Deserialize)]
struct DatesBody {
    dates: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct DayBody {
    #[serde(default)]
    films: Vec<Film>,
    #[serde(default)]
    events: Vec<Event>,
}

#[derive(Debug, Deserialize)]
struct Film {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Event {
    film_id: String,
    event_date_time: String,
    booking_link: Option<String>,
}

fn day_titles(venue: Venue, day: DayBody) -> TitleShowings {
    let names: HashMap<String, String> = day.films.into_iter().map(|f| (f.id, f.name)).collect();
    let mut titles = TitleShowings::new();

    for event in day.events {
        let Some(name) = names.get(&event.film_id) else {
            tracing::debug!("{}: event for unknown film {}", venue, event.film_id);
            continue;
        };
        let Some(time) = parse_showing_time(&event.event_date_time, venue) else {
            continue;
        };
        titles
            .entry(name.clone())
            .or_default()
            .push(Showing::new(venue, time, event.booking_link));
    }

    titles
}

struct DayFetcher {
    venue: Venue,
    client: Client,
    base: Url,
    cinema_id: String,
    day_timeout: Duration,
}

impl DayFetcher {
    fn url(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| DigestError::processing(format!("{}: endpoint {:?}: {}", self.venue, path, e)))
    }

    async fn dates(&self, until: NaiveDate) -> Result<Vec<String>> {
        let url = self.url(&format!(
            "{}/dates/in-cinema/{}/until/{}",
            QUICKBOOK,
            self.cinema_id,
            until.format("%Y-%m-%d")
        ))?;
        tracing::debug!("📡 {}: GET {}", self.venue, url);
        let dates: Envelope<DatesBody> = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(dates.body.dates)
    }

    async fn day(&self, date: &str) -> Result<TitleShowings> {
        let url = self.url(&format!(
            "{}/film-events/in-cinema/{}/at-date/{}",
            QUICKBOOK, self.cinema_id, date
        ))?;
        tracing::debug!("📡 {}: GET {}", self.venue, url);
        let day: Envelope<DayBody> = self
            .client
            .get(url)
            .timeout(self.day_timeout)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(day_titles(self.venue, day.body))
    }
}

/// Reads one Cinema City venue: the list of playing dates first, then every
/// date in parallel, keeping whatever days answer inside the day window.
pub struct CinemaCityAdapter {
    fetcher: Arc<DayFetcher>,
    day_window: Duration,
}

impl CinemaCityAdapter {
    pub fn new(
        venue: Venue,
        client: Client,
        base: Url,
        cinema_id: &str,
        day_timeout: Duration,
        day_window: Duration,
    ) -> Self {
        Self {
            fetcher: Arc::new(DayFetcher {
                venue,
                client,
                base,
                cinema_id: cinema_id.to_string(),
                day_timeout,
            }),
            day_window,
        }
    }
}

#[async_trait]
impl SourceAdapter for CinemaCityAdapter {
    fn venue(&self) -> Venue {
        self.fetcher.venue
    }

    async fn run(&self) -> Result<TitleShowings> {
        let venue = self.venue();
        let today = Local::now().date_naive();
        let until = today.checked_add_months(Months::new(12)).unwrap_or(today);

        let dates = self.fetcher.dates(until).await?;
        tracing::debug!("{}: {} playing dates", venue, dates.len());

        let (tx, rx) = mpsc::channel::<TitleShowings>(dates.len().max(1));
        for date in &dates {
            let fetcher = Arc::clone(&self.fetcher);
            let tx = tx.clone();
            let date = date.clone();
            tokio::spawn(async move {
                match fetcher.day(&date).await {
                    Ok(titles) => {
                        let _ = tx.send(titles).await;
                    }
                    Err(e) => tracing::warn!("⚠️ {}: day {} failed ({})", fetcher.venue, date, e),
                }
            });
        }
        drop(tx);

        let mut titles = TitleShowings::new();
        let outcome = fan_in(rx, dates.len(), self.day_window, |day: TitleShowings| {
            for (title, showings) in day {
                titles.entry(title).or_default().extend(showings);
            }
        })
        .await;

        if !outcome.is_complete() {
            tracing::warn!(
                "⚠️ {}: {}/{} days answered",
                venue,
                outcome.received,
                outcome.expected
            );
        }

        Ok(titles)
    }
}
