//! HTTP client for the provider's query endpoints
//!
//! Three read-only operations are used: meeting-list-by-time-window and
//! event-detail-by-id (persisted GraphQL queries), and per-event odds
//! fluctuations (REST). All calls are idempotent from the provider's side.

use std::time::Duration;

use chrono::NaiveDate;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, ORIGIN, REFERER, USER_AGENT};
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use crate::config::ProviderConfig;
use super::types::{EventDetail, EventEnvelope, MeetingSummary, MeetingsEnvelope, OddsEntry, OddsResponse};
use super::window::{fetch_window, format_end, format_start};

// ============================================================================
// Persisted query descriptors
// ============================================================================

const OP_MEETINGS_BY_WINDOW: &str = "meetingsIndexByStartEndTime";
const HASH_MEETINGS_BY_WINDOW: &str =
    "ddea43c96aff80097730c1cea2b715459febf6eea4bf3ee6d8f09eee7c271c9c";

const OP_EVENT_BY_ID: &str = "getEventById";
const HASH_EVENT_BY_ID: &str = "1208f445f68dbd694b26c8d0e4d1cad7112e80f9e3bbc61d672de2610f261f94";

/// Bookmakers requested on the odds endpoint.
const ODDS_BOOKMAKERS: &str = "bet365,ubet,tabtouch,betr,boombet,sportsbet,picklebet,pointsbet,ladbrokes,neds,colossalbet,average";

const ODDS_BET_TYPES: &str = "fixed-place,fixed-win";

const ODDS_FLUCTUATION_COUNT: u32 = 50;

/// The provider rejects requests without browser-looking headers.
const PROVIDER_ORIGIN: &str = "https://www.punters.com.au";
const PROVIDER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/138.0.0.0 Safari/537.36";

/// Errors raised by provider fetches
///
/// Every fetch failure is non-fatal at the unit level: the synchronizer logs
/// it and moves on to the next unit of work.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("bearer token is not a valid header value: {0}")]
    Header(#[from] reqwest::header::InvalidHeaderValue),
}

/// Client for the provider API
///
/// Holds its configuration as an immutable value; construct once and share.
pub struct ProviderClient {
    client: reqwest::Client,
    config: ProviderConfig,
}

impl ProviderClient {
    pub fn new(config: ProviderConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", config.bearer_token))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ORIGIN, HeaderValue::from_static(PROVIDER_ORIGIN));
        headers.insert(REFERER, HeaderValue::from_static("https://www.punters.com.au/"));
        headers.insert(USER_AGENT, HeaderValue::from_static(PROVIDER_USER_AGENT));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Fetch the meeting list for one local race day, filtered to the
    /// configured allow-listed countries.
    ///
    /// Zero meetings is an empty list, not an error.
    pub async fn fetch_meetings(&self, date: NaiveDate) -> Result<Vec<MeetingSummary>, FetchError> {
        let (start, end) = fetch_window(date);

        let variables = json!({
            "brand": self.config.brand,
            "sport": self.config.sport,
            "startTime": format_start(start),
            "endTime": format_end(end),
        });

        let envelope: MeetingsEnvelope = self
            .client
            .get(&self.config.base_url)
            .query(&[
                ("operationName", OP_MEETINGS_BY_WINDOW.to_string()),
                ("variables", variables.to_string()),
                ("extensions", persisted_query(HASH_MEETINGS_BY_WINDOW)),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let meetings = envelope
            .data
            .and_then(|d| d.meetings)
            .unwrap_or_default();

        let total = meetings.len();
        let allowed: Vec<MeetingSummary> = meetings
            .into_iter()
            .filter(|m| self.country_allowed(m))
            .collect();

        debug!(
            date = %date,
            total,
            allowed = allowed.len(),
            "fetched meeting list"
        );

        Ok(allowed)
    }

    /// Fetch full nested detail for one event.
    ///
    /// `Ok(None)` when the provider has no event for the id.
    pub async fn fetch_event_detail(
        &self,
        event_id: &str,
    ) -> Result<Option<EventDetail>, FetchError> {
        let variables = json!({
            "brand": self.config.brand,
            "brandEnum": self.config.brand,
            "eventId": event_id,
        });

        let envelope: EventEnvelope = self
            .client
            .get(&self.config.base_url)
            .query(&[
                ("operationName", OP_EVENT_BY_ID.to_string()),
                ("variables", variables.to_string()),
                ("extensions", persisted_query(HASH_EVENT_BY_ID)),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(envelope.data.and_then(|d| d.event))
    }

    /// Fetch the odds-fluctuation series for one event.
    ///
    /// `Ok(None)` when the response carries no odds array.
    pub async fn fetch_odds(&self, event_id: &str) -> Result<Option<Vec<OddsEntry>>, FetchError> {
        let url = format!(
            "{}/{}?priceFluctuations={}&type=bookmaker&betTypes={}&bookmaker={}",
            self.config.odds_base_url,
            event_id,
            ODDS_FLUCTUATION_COUNT,
            ODDS_BET_TYPES,
            ODDS_BOOKMAKERS,
        );

        let response: OddsResponse = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response.odds)
    }

    fn country_allowed(&self, meeting: &MeetingSummary) -> bool {
        let country = meeting
            .venue
            .as_ref()
            .and_then(|v| v.country.as_ref())
            .and_then(|c| c.name.as_deref())
            .unwrap_or("");

        self.config
            .allowed_countries
            .iter()
            .any(|allowed| allowed == country)
    }
}

fn persisted_query(hash: &str) -> String {
    json!({
        "persistedQuery": {
            "version": 1,
            "sha256Hash": hash,
        }
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderConfig;

    fn test_config() -> ProviderConfig {
        crate::config::Config::default().provider
    }

    #[test]
    fn client_builds_with_default_config() {
        assert!(ProviderClient::new(test_config()).is_ok());
    }

    #[test]
    fn country_filter_rejects_unknown_and_missing_countries() {
        let client = ProviderClient::new(test_config()).unwrap();

        let allowed: MeetingSummary = serde_json::from_value(serde_json::json!({
            "id": "m1",
            "venue": { "country": { "name": "Australia" } }
        }))
        .unwrap();
        let rejected: MeetingSummary = serde_json::from_value(serde_json::json!({
            "id": "m2",
            "venue": { "country": { "name": "France" } }
        }))
        .unwrap();
        let missing: MeetingSummary = serde_json::from_value(serde_json::json!({
            "id": "m3"
        }))
        .unwrap();

        assert!(client.country_allowed(&allowed));
        assert!(!client.country_allowed(&rejected));
        assert!(!client.country_allowed(&missing));
    }

    #[test]
    fn persisted_query_embeds_hash() {
        let extensions = persisted_query("abc123");
        assert!(extensions.contains("\"sha256Hash\":\"abc123\""));
        assert!(extensions.contains("\"version\":1"));
    }
}
