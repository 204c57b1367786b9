use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::core::datetime::parse_showing_time;
use crate::domain::model::{Showing, TitleShowings};
use crate::domain::ports::SourceAdapter;
use crate::domain::venue::Venue;
use crate::utils::error::{DigestError, Result};

pub const BASE_URL: &str = "https://multikino.pl";
/// Kraków.
pub const CINEMA_ID: &str = "0005";

#[derive(Debug, Deserialize)]
struct FilmsResponse {
    result: Vec<Film>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Film {
    film_title: String,
    #[serde(default)]
    showing_groups: Vec<ShowingGroup>,
}

#[derive(Debug, Deserialize)]
struct ShowingGroup {
    #[serde(default)]
    sessions: Vec<Session>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Session {
    start_time: String,
    booking_url: Option<String>,
}

/// Reads the Multikino showings API. The API only answers once the client
/// holds the session cookies handed out by its root endpoint.
pub struct MultikinoAdapter {
    client: Client,
    base: Url,
    cinema_id: String,
}

impl MultikinoAdapter {
    /// `client` must keep cookies, see [`crate::adapters::cookie_client`].
    pub fn new(client: Client, base: Url, cinema_id: &str) -> Self {
        Self {
            client,
            base,
            cinema_id: cinema_id.to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| DigestError::processing(format!("Multikino endpoint {:?}: {}", path, e)))
    }

    fn into_titles(&self, films: FilmsResponse) -> TitleShowings {
        let mut titles = TitleShowings::new();

        for film in films.result {
            let showings: Vec<Showing> = film
                .showing_groups
                .into_iter()
                .flat_map(|group| group.sessions)
                .filter_map(|session| {
                    let time = parse_showing_time(&session.start_time, Venue::Multikino)?;
                    let url = session
                        .booking_url
                        .as_deref()
                        .and_then(|path| self.base.join(path).ok())
                        .map(String::from);
                    Some(Showing::new(Venue::Multikino, time, url))
                })
                .collect();

            titles.entry(film.film_title).or_default().extend(showings);
        }

        titles
    }
}

#[async_trait]
impl SourceAdapter for MultikinoAdapter {
    fn venue(&self) -> Venue {
        Venue::Multikino
    }

    async fn run(&self) -> Result<TitleShowings> {
        let cookies = self.endpoint("/api/microservice")?;
        tracing::debug!("🍪 Multikino: GET {}", cookies);
        self.client.get(cookies).send().await?.error_for_status()?;

        let films_url = self.endpoint(&format!(
            "/api/microservice/showings/cinemas/{}/films/",
            self.cinema_id
        ))?;
        tracing::debug!("📡 Multikino: GET {}", films_url);
        let films: FilmsResponse = self
            .client
            .get(films_url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(self.into_titles(films))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_maps_sessions_to_showings() {
        let payload = r#"{
            "result": [
                {
                    "filmTitle": "Konklawe",
                    "showingGroups": [
                        {"sessions": [
                            {"startTime": "2099-10-20T18:00:00", "bookingUrl": "/rezerwacja/abc"},
                            {"startTime": "2099-10-21T20:30:00"}
                        ]},
                        {"sessions": [{"startTime": "garbage", "bookingUrl": "/x"}]}
                    ]
                },
                {"filmTitle": "Flow"}
            ]
        }"#;
        let films: FilmsResponse = serde_json::from_str(payload).unwrap();
        let adapter = MultikinoAdapter::new(Client::new(), Url::parse(BASE_URL).unwrap(), CINEMA_ID);

        let titles = adapter.into_titles(films);

        let konklawe = &titles["Konklawe"];
        assert_eq!(konklawe.len(), 2);
        assert_eq!(
            konklawe[0].url.as_deref(),
            Some("https://multikino.pl/rezerwacja/abc")
        );
        assert_eq!(konklawe[1].url, None);
        assert!(titles["Flow"].is_empty());
    }

    #[test]
    fn test_missing_result_is_a_payload_error() {
        assert!(serde_json::from_str::<FilmsResponse>(r#"{"films": []}"#).is_err());
    }
}
