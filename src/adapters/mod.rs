//! Concrete collaborators behind the ports: venue sites and APIs, the
//! title registry, the film catalog and the push service.

pub mod cinema_city;
pub mod filmweb;
pub mod gotify;
pub mod html;
pub mod multikino;
pub mod sqlite_store;
pub mod venues;

use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::config::toml_config::DigestConfig;
use crate::domain::ports::SourceAdapter;
use crate::domain::venue::Venue;
use crate::utils::error::{DigestError, Result};

pub const USER_AGENT: &str = concat!("kino-digest/", env!("CARGO_PKG_VERSION"));

pub fn http_client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()?)
}

/// Client keeping cookies between requests, for sites that hand out a
/// session before answering API calls.
pub fn cookie_client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .cookie_store(true)
        .build()?)
}

pub(crate) fn parse_base(field: &str, raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| DigestError::InvalidConfigValueError {
        field: field.to_string(),
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

/// One adapter per selected venue, in venue order.
pub fn build_adapters(config: &DigestConfig) -> Result<Vec<Arc<dyn SourceAdapter>>> {
    let client = http_client(config.request_timeout())?;
    let mut adapters: Vec<Arc<dyn SourceAdapter>> = Vec::new();

    for venue in config.selected_venues()? {
        let base_override = config.base_url_override(venue);

        let adapter: Arc<dyn SourceAdapter> = match venue {
            Venue::Multikino => {
                let base = base_override.unwrap_or(multikino::BASE_URL);
                Arc::new(multikino::MultikinoAdapter::new(
                    cookie_client(config.request_timeout())?,
                    parse_base("venues.base_urls.multikino", base)?,
                    multikino::CINEMA_ID,
                ))
            }
            Venue::CinemaCityBonarka | Venue::CinemaCityKazimierz | Venue::CinemaCityZakopianka => {
                let base = base_override.unwrap_or(cinema_city::BASE_URL);
                let cinema_id = cinema_city::cinema_id(venue).ok_or_else(|| {
                    DigestError::processing(format!("{} has no Cinema City id", venue))
                })?;
                Arc::new(cinema_city::CinemaCityAdapter::new(
                    venue,
                    client.clone(),
                    parse_base("venues.base_urls", base)?,
                    cinema_id,
                    config.day_request_timeout(),
                    config.day_window(),
                ))
            }
            html_venue => {
                let rules = venues::html_rules(html_venue).ok_or_else(|| {
                    DigestError::processing(format!("{} has no page rules", html_venue))
                })?;
                let origin = base_override.unwrap_or(rules.origin);
                Arc::new(html::HtmlAdapter::new(
                    rules,
                    client.clone(),
                    parse_base("venues.base_urls", origin)?,
                    config.collection.max_page_depth,
                )?)
            }
        };
        adapters.push(adapter);
    }

    tracing::debug!("Built {} venue adapters", adapters.len());
    Ok(adapters)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_venue_gets_an_adapter() {
        let config = DigestConfig::default();
        let adapters = build_adapters(&config).unwrap();

        let venues: Vec<Venue> = adapters.iter().map(|a| a.venue()).collect();
        assert_eq!(venues, Venue::ALL.to_vec());
    }

    #[test]
    fn test_selection_limits_adapters() {
        let config = DigestConfig::from_toml_str(
            "[venues]\nonly = [\"sfinks\", \"cinemacitybonarka\"]\n",
        )
        .unwrap();
        let adapters = build_adapters(&config).unwrap();

        let venues: Vec<Venue> = adapters.iter().map(|a| a.venue()).collect();
        assert_eq!(venues, vec![Venue::CinemaCityBonarka, Venue::Sfinks]);
    }
}
