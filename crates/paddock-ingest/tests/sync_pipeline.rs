//! End-to-end synchronization tests against a mocked provider
//!
//! These tests validate the full pipeline including:
//! - Meeting, runner, exotic and odds flattening into the store
//! - Per-event failure isolation
//! - Idempotent re-runs
//! - Country allow-list filtering
//! - Cancellation between units of work

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use paddock_ingest::config::{ProviderConfig, SyncConfig};
use paddock_ingest::db::{MergeStore, StoreError, TableSpec};
use paddock_ingest::flatten::{Row, SqlValue};
use paddock_ingest::provider::ProviderClient;
use paddock_ingest::Synchronizer;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param, query_param_contains};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Store that merges rows into per-table maps keyed the same way the real
/// gateway's conflict targets are.
#[derive(Default)]
struct InMemoryStore {
    tables: Mutex<HashMap<&'static str, HashMap<String, Row>>>,
}

impl InMemoryStore {
    fn rows(&self, table: &TableSpec) -> Vec<Row> {
        self.tables
            .lock()
            .unwrap()
            .get(table.name)
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default()
    }

    fn count(&self, table: &TableSpec) -> usize {
        self.rows(table).len()
    }
}

#[async_trait]
impl MergeStore for InMemoryStore {
    async fn upsert(&self, table: &TableSpec, row: &Row) -> Result<(), StoreError> {
        let key = table
            .key_columns
            .iter()
            .copied()
            .map(|column| match row.get(column) {
                Some(value) => Ok(format!("{value:?}")),
                None => Err(StoreError::MissingKeyColumn {
                    table: table.name,
                    column,
                }),
            })
            .collect::<Result<Vec<_>, _>>()?
            .join("|");

        self.tables
            .lock()
            .unwrap()
            .entry(table.name)
            .or_default()
            .insert(key, row.clone());
        Ok(())
    }
}

/// Store that requests cancellation after its first successful merge,
/// simulating an interrupt arriving mid-day.
struct CancelOnFirstUpsert {
    inner: InMemoryStore,
    cancel: Mutex<Option<CancellationToken>>,
}

impl CancelOnFirstUpsert {
    fn new() -> Self {
        Self {
            inner: InMemoryStore::default(),
            cancel: Mutex::new(None),
        }
    }

    fn arm(&self, token: CancellationToken) {
        *self.cancel.lock().unwrap() = Some(token);
    }
}

#[async_trait]
impl MergeStore for CancelOnFirstUpsert {
    async fn upsert(&self, table: &TableSpec, row: &Row) -> Result<(), StoreError> {
        self.inner.upsert(table, row).await?;
        if let Some(token) = self.cancel.lock().unwrap().take() {
            token.cancel();
        }
        Ok(())
    }
}

fn provider_config(mock_uri: &str) -> ProviderConfig {
    let mut config = paddock_ingest::Config::default().provider;
    config.base_url = format!("{mock_uri}/racing");
    config.odds_base_url = format!("{mock_uri}/odds/au/event");
    config
}

fn synchronizer(mock_uri: &str, store: Arc<InMemoryStore>) -> Synchronizer<InMemoryStore> {
    let client = ProviderClient::new(provider_config(mock_uri)).unwrap();
    Synchronizer::new(client, store, SyncConfig { event_fan_out: 2 })
}

fn race_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 7, 8).unwrap()
}

fn meetings_payload(meetings: serde_json::Value) -> serde_json::Value {
    serde_json::json!({ "data": { "meetings": meetings } })
}

fn flemington_meeting(events: serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "id": "m-1",
        "name": "Flemington",
        "meetingDateLocal": "2025-07-08",
        "venue": {
            "name": "Flemington",
            "state": "VIC",
            "country": { "id": "c-au", "name": "Australia", "iso2": "AU", "iso3": "AUS" }
        },
        "events": events
    })
}

fn event_payload(event: serde_json::Value) -> serde_json::Value {
    serde_json::json!({ "data": { "event": event } })
}

async fn mount_meetings(server: &MockServer, meetings: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/racing"))
        .and(query_param("operationName", "meetingsIndexByStartEndTime"))
        .respond_with(ResponseTemplate::new(200).set_body_json(meetings_payload(meetings)))
        .mount(server)
        .await;
}

async fn mount_event(server: &MockServer, event_id: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/racing"))
        .and(query_param("operationName", "getEventById"))
        .and(query_param_contains("variables", format!("\"{event_id}\"")))
        .respond_with(response)
        .mount(server)
        .await;
}

async fn mount_odds(server: &MockServer, event_id: &str, odds: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/odds/au/event/{event_id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "odds": odds })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn full_pipeline_merges_meetings_runners_exotics_and_odds() {
    let server = MockServer::start().await;

    mount_meetings(
        &server,
        serde_json::json!([flemington_meeting(serde_json::json!([{ "id": "e-1", "eventNumber": 3 }]))]),
    )
    .await;

    mount_event(
        &server,
        "e-1",
        ResponseTemplate::new(200).set_body_json(event_payload(serde_json::json!({
            "id": "e-1",
            "eventNumber": 3,
            "name": "Sprint Handicap",
            "isResulted": true,
            "selections": [
                {
                    "id": "s-1",
                    "competitorNumber": 1,
                    "competitor": { "name": "Fast Horse" },
                    "stats": { "totalRuns": 12, "lastTenPlaces": [3, 2, 1] }
                },
                { "id": "s-2", "competitorNumber": 2 }
            ],
            "exoticResult": [
                { "id": "x-1", "tote": "VIC", "exoticMarket": "Quinella", "results": [[1, 2]], "amount": 14.2 }
            ]
        }))),
    )
    .await;

    mount_odds(
        &server,
        "e-1",
        serde_json::json!([{
            "selectionId": "s-1",
            "betType": "fixed-win",
            "bookmakerId": "bet365",
            "price": {
                "fluctuations": [
                    { "value": 4.2, "rollingMeanDeviation": 0.1, "updatedAt": "2025-07-08T02:00:00Z" },
                    { "value": 4.6, "rollingMeanDeviation": 0.2, "updatedAt": "2025-07-08T02:05:00Z" }
                ]
            }
        }]),
    )
    .await;

    let store = Arc::new(InMemoryStore::default());
    let summary = synchronizer(&server.uri(), store.clone())
        .sync_date(race_day())
        .await;

    assert_eq!(summary.meetings, 1);
    assert_eq!(summary.runners, 2);
    assert_eq!(summary.exotics, 1);
    assert_eq!(summary.odds, 2);
    assert_eq!(summary.failed_meetings, 0);
    assert_eq!(summary.failed_events, 0);

    assert_eq!(store.count(&paddock_ingest::db::MEETINGS), 1);
    assert_eq!(store.count(&paddock_ingest::db::EXOTIC_RESULTS), 1);
    assert_eq!(store.count(&paddock_ingest::db::ODDS), 2);

    let runners = store.rows(&paddock_ingest::db::RUNNERS);
    assert_eq!(runners.len(), 2);

    let with_stats = runners
        .iter()
        .find(|r| r.get("selection_id") == Some(&SqlValue::Text(Some("s-1".into()))))
        .unwrap();
    assert_eq!(
        with_stats.get("composite_key"),
        Some(&SqlValue::Text(Some("8/07/2025-Flemington-3-1".into())))
    );
    assert_eq!(with_stats.get("total_runs"), Some(&SqlValue::Int(Some(12))));
    assert_eq!(with_stats.get("last_ten_places_1"), Some(&SqlValue::Int(Some(3))));

    let without_stats = runners
        .iter()
        .find(|r| r.get("selection_id") == Some(&SqlValue::Text(Some("s-2".into()))))
        .unwrap();
    assert_eq!(without_stats.get("total_runs"), Some(&SqlValue::Int(None)));
    assert_eq!(without_stats.get("last_ten_places_1"), Some(&SqlValue::Int(None)));
}

#[tokio::test]
async fn one_failing_event_does_not_sink_the_meeting() {
    let server = MockServer::start().await;

    mount_meetings(
        &server,
        serde_json::json!([flemington_meeting(serde_json::json!([
            { "id": "e-bad", "eventNumber": 1 },
            { "id": "e-good", "eventNumber": 2 }
        ]))]),
    )
    .await;

    mount_event(&server, "e-bad", ResponseTemplate::new(500)).await;
    mount_event(
        &server,
        "e-good",
        ResponseTemplate::new(200).set_body_json(event_payload(serde_json::json!({
            "id": "e-good",
            "eventNumber": 2,
            "selections": [{ "id": "s-9", "competitorNumber": 5 }]
        }))),
    )
    .await;
    mount_odds(&server, "e-good", serde_json::json!([])).await;

    let store = Arc::new(InMemoryStore::default());
    let summary = synchronizer(&server.uri(), store.clone())
        .sync_date(race_day())
        .await;

    assert_eq!(summary.meetings, 1);
    assert_eq!(summary.runners, 1);
    assert_eq!(summary.failed_events, 1);

    let runners = store.rows(&paddock_ingest::db::RUNNERS);
    assert_eq!(runners.len(), 1);
    assert_eq!(
        runners[0].get("event_id"),
        Some(&SqlValue::Text(Some("e-good".into())))
    );
}

#[tokio::test]
async fn cancellation_after_first_meeting_stops_the_day() {
    let server = MockServer::start().await;

    // Two meetings; no event or odds mocks are mounted, so any event fetch
    // would 404 and surface as a failed event.
    mount_meetings(
        &server,
        serde_json::json!([
            flemington_meeting(serde_json::json!([{ "id": "e-1", "eventNumber": 1 }])),
            {
                "id": "m-2",
                "name": "Caulfield",
                "meetingDateLocal": "2025-07-08",
                "venue": { "country": { "name": "Australia" } },
                "events": [{ "id": "e-2", "eventNumber": 1 }]
            }
        ]),
    )
    .await;

    let store = Arc::new(CancelOnFirstUpsert::new());
    let client = ProviderClient::new(provider_config(&server.uri())).unwrap();
    let synchronizer = Synchronizer::new(client, store.clone(), SyncConfig { event_fan_out: 2 });
    store.arm(synchronizer.cancellation_token());

    let summary = synchronizer.sync_date(race_day()).await;

    // The first meeting row landed before the interrupt; nothing after it did.
    assert_eq!(summary.meetings, 1);
    assert_eq!(summary.runners, 0);
    assert_eq!(summary.failed_events, 0);
    assert_eq!(store.inner.count(&paddock_ingest::db::MEETINGS), 1);
    assert_eq!(store.inner.count(&paddock_ingest::db::RUNNERS), 0);

    let meetings = store.inner.rows(&paddock_ingest::db::MEETINGS);
    assert_eq!(
        meetings[0].get("meeting_id"),
        Some(&SqlValue::Text(Some("m-1".into())))
    );
}

#[tokio::test]
async fn failed_meeting_list_fetch_is_counted_against_the_day() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/racing"))
        .and(query_param("operationName", "meetingsIndexByStartEndTime"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let store = Arc::new(InMemoryStore::default());
    let summary = synchronizer(&server.uri(), store.clone())
        .sync_date(race_day())
        .await;

    assert_eq!(summary.failed_days, 1);
    assert_eq!(summary.meetings, 0);
    assert_eq!(summary.failed_meetings, 0);
    assert_eq!(store.count(&paddock_ingest::db::MEETINGS), 0);
}

#[tokio::test]
async fn rerunning_the_same_day_does_not_grow_the_store() {
    let server = MockServer::start().await;

    mount_meetings(
        &server,
        serde_json::json!([flemington_meeting(serde_json::json!([{ "id": "e-1", "eventNumber": 1 }]))]),
    )
    .await;
    mount_event(
        &server,
        "e-1",
        ResponseTemplate::new(200).set_body_json(event_payload(serde_json::json!({
            "id": "e-1",
            "eventNumber": 1,
            "selections": [
                { "id": "s-1", "competitorNumber": 1 },
                { "id": "s-2", "competitorNumber": 2 }
            ]
        }))),
    )
    .await;
    mount_odds(&server, "e-1", serde_json::json!([])).await;

    let store = Arc::new(InMemoryStore::default());
    let synchronizer = synchronizer(&server.uri(), store.clone());

    let first = synchronizer.sync_date(race_day()).await;
    let second = synchronizer.sync_date(race_day()).await;

    assert_eq!(first.runners, 2);
    assert_eq!(second.runners, 2);
    assert_eq!(store.count(&paddock_ingest::db::MEETINGS), 1);
    assert_eq!(store.count(&paddock_ingest::db::RUNNERS), 2);
}

#[tokio::test]
async fn meetings_outside_allowed_countries_are_skipped() {
    let server = MockServer::start().await;

    mount_meetings(
        &server,
        serde_json::json!([{
            "id": "m-fr",
            "name": "Longchamp",
            "venue": { "country": { "name": "France" } },
            "events": [{ "id": "e-1" }]
        }]),
    )
    .await;

    let store = Arc::new(InMemoryStore::default());
    let summary = synchronizer(&server.uri(), store.clone())
        .sync_date(race_day())
        .await;

    assert_eq!(summary, Default::default());
    assert_eq!(store.count(&paddock_ingest::db::MEETINGS), 0);
}

#[tokio::test]
async fn empty_meeting_list_is_a_clean_no_op() {
    let server = MockServer::start().await;
    mount_meetings(&server, serde_json::json!([])).await;

    let store = Arc::new(InMemoryStore::default());
    let summary = synchronizer(&server.uri(), store.clone())
        .sync_date(race_day())
        .await;

    assert_eq!(summary, Default::default());
}
