//! Synchronization orchestrator
//!
//! Walks one or more race days: fetches the meeting list, merges each
//! meeting row, then fans out over that meeting's events with bounded
//! concurrency. Every meeting and every event is an isolated unit of work;
//! a failure is logged and counted, never propagated, so one bad payload
//! cannot sink the rest of the run.

use std::sync::Arc;

use chrono::{Days, Local, NaiveDate};
use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::SyncConfig;
use crate::db::{tables, MergeStore};
use crate::flatten::{self, flatten_exotics, flatten_meeting, flatten_odds, flatten_runners};
use crate::provider::types::{EventRef, MeetingSummary};
use crate::provider::ProviderClient;

/// Counters for one synchronization run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub meetings: u64,
    pub runners: u64,
    pub exotics: u64,
    pub odds: u64,
    pub failed_days: u64,
    pub failed_meetings: u64,
    pub failed_events: u64,
}

impl RunSummary {
    pub fn merge(&mut self, other: RunSummary) {
        self.meetings += other.meetings;
        self.runners += other.runners;
        self.exotics += other.exotics;
        self.odds += other.odds;
        self.failed_days += other.failed_days;
        self.failed_meetings += other.failed_meetings;
        self.failed_events += other.failed_events;
    }
}

pub struct Synchronizer<S> {
    client: ProviderClient,
    store: Arc<S>,
    config: SyncConfig,
    cancel: CancellationToken,
}

impl<S: MergeStore> Synchronizer<S> {
    pub fn new(client: ProviderClient, store: Arc<S>, config: SyncConfig) -> Self {
        Self {
            client,
            store,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Token for wiring external shutdown (ctrl-c). Cancellation takes
    /// effect between units of work; an in-flight upsert always completes.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Synchronize a contiguous range of days relative to today.
    ///
    /// Offsets are in days, both inclusive: `run(-1, 0)` covers yesterday
    /// and today. The run itself never fails; per-unit failures land in the
    /// returned counters.
    pub async fn run(&self, start_offset: i64, end_offset: i64) -> RunSummary {
        let today = Local::now().date_naive();
        let mut summary = RunSummary::default();

        for offset in start_offset..=end_offset {
            if self.cancel.is_cancelled() {
                info!("cancellation requested, stopping before next day");
                break;
            }

            let Some(date) = offset_date(today, offset) else {
                warn!(offset, "day offset out of calendar range, skipped");
                continue;
            };

            summary.merge(self.sync_date(date).await);
        }

        info!(
            meetings = summary.meetings,
            runners = summary.runners,
            exotics = summary.exotics,
            odds = summary.odds,
            failed_days = summary.failed_days,
            failed_meetings = summary.failed_meetings,
            failed_events = summary.failed_events,
            "synchronization run complete"
        );

        summary
    }

    /// Synchronize every allow-listed meeting of one race day.
    pub async fn sync_date(&self, date: NaiveDate) -> RunSummary {
        let mut summary = RunSummary::default();

        let meetings = match self.client.fetch_meetings(date).await {
            Ok(meetings) => meetings,
            Err(err) => {
                error!(%date, error = %err, "meeting list fetch failed, day skipped");
                summary.failed_days += 1;
                return summary;
            }
        };

        info!(%date, meetings = meetings.len(), "synchronizing race day");

        for meeting in &meetings {
            if self.cancel.is_cancelled() {
                info!(%date, "cancellation requested, stopping before next meeting");
                break;
            }
            summary.merge(self.sync_meeting(date, meeting).await);
        }

        summary
    }

    /// Merge one meeting row, then its events with bounded concurrency.
    ///
    /// A meeting that cannot be flattened or stored forfeits its events:
    /// runner rows without a valid meeting context would carry a broken
    /// composite key.
    async fn sync_meeting(&self, date: NaiveDate, meeting: &MeetingSummary) -> RunSummary {
        let mut summary = RunSummary::default();

        let row = match flatten_meeting(meeting) {
            Ok(row) => row,
            Err(err) => {
                warn!(%date, error = %err, "malformed meeting payload, skipped with its events");
                summary.failed_meetings += 1;
                return summary;
            }
        };

        // flatten_meeting guarantees a non-empty meeting_id
        let meeting_id = match row.get("meeting_id") {
            Some(crate::flatten::SqlValue::Text(Some(id))) => id.clone(),
            _ => {
                summary.failed_meetings += 1;
                return summary;
            }
        };

        if let Err(err) = self.store.upsert(&tables::MEETINGS, &row).await {
            warn!(%date, %meeting_id, error = %err, "meeting merge failed, events skipped");
            summary.failed_meetings += 1;
            return summary;
        }
        summary.meetings += 1;

        let meeting_name = meeting.name.as_deref();
        let meeting_date_local = flatten::parse_date(meeting.meeting_date_local.as_deref());

        let event_summaries: Vec<RunSummary> = stream::iter(&meeting.events)
            .map(|event| self.sync_event(&meeting_id, meeting_name, meeting_date_local, event))
            .buffer_unordered(self.config.event_fan_out)
            .collect()
            .await;

        for event_summary in event_summaries {
            summary.merge(event_summary);
        }

        summary
    }

    /// One event: runner rows, exotic dividends once resulted, then odds.
    ///
    /// Runner rows surviving an odds failure still count; the event is
    /// marked failed at most once.
    async fn sync_event(
        &self,
        meeting_id: &str,
        meeting_name: Option<&str>,
        meeting_date_local: Option<NaiveDate>,
        event: &EventRef,
    ) -> RunSummary {
        let mut summary = RunSummary::default();

        if self.cancel.is_cancelled() {
            return summary;
        }

        let Some(event_id) = event.id.as_deref().filter(|id| !id.is_empty()) else {
            warn!(meeting_id, "event reference without id, skipped");
            summary.failed_events += 1;
            return summary;
        };

        let detail = match self.client.fetch_event_detail(event_id).await {
            Ok(Some(detail)) => detail,
            Ok(None) => {
                warn!(meeting_id, event_id, "provider has no detail for event, skipped");
                summary.failed_events += 1;
                return summary;
            }
            Err(err) => {
                warn!(meeting_id, event_id, error = %err, "event detail fetch failed, skipped");
                summary.failed_events += 1;
                return summary;
            }
        };

        let rows = match flatten_runners(&detail, meeting_id, meeting_name, meeting_date_local) {
            Ok(rows) => rows,
            Err(err) => {
                warn!(meeting_id, event_id, error = %err, "malformed event payload, skipped");
                summary.failed_events += 1;
                return summary;
            }
        };

        match self.store.upsert_many(&tables::RUNNERS, &rows).await {
            Ok(count) => summary.runners += count,
            Err(err) => {
                warn!(meeting_id, event_id, error = %err, "runner merge failed");
                summary.failed_events += 1;
                return summary;
            }
        }

        if detail.is_resulted.unwrap_or(false) {
            match flatten_exotics(&detail, meeting_id) {
                Ok(rows) => match self.store.upsert_many(&tables::EXOTIC_RESULTS, &rows).await {
                    Ok(count) => summary.exotics += count,
                    Err(err) => {
                        warn!(meeting_id, event_id, error = %err, "exotic result merge failed");
                        summary.failed_events += 1;
                        return summary;
                    }
                },
                Err(err) => {
                    warn!(meeting_id, event_id, error = %err, "exotic flatten failed");
                    summary.failed_events += 1;
                    return summary;
                }
            }
        }

        match self.sync_odds(event_id).await {
            Ok(count) => summary.odds += count,
            Err(err) => {
                warn!(meeting_id, event_id, error = %err, "odds sync failed");
                summary.failed_events += 1;
            }
        }

        summary
    }

    /// Odds-only synchronization for one event, as driven from the CLI.
    pub async fn sync_single_event_odds(&self, event_id: &str) -> RunSummary {
        let mut summary = RunSummary::default();

        match self.sync_odds(event_id).await {
            Ok(count) => summary.odds += count,
            Err(err) => {
                warn!(event_id, error = %err, "odds sync failed");
                summary.failed_events += 1;
            }
        }

        summary
    }

    async fn sync_odds(&self, event_id: &str) -> anyhow::Result<u64> {
        let Some(entries) = self.client.fetch_odds(event_id).await? else {
            return Ok(0);
        };

        let rows = flatten_odds(event_id, &entries);
        let count = self.store.upsert_many(&tables::ODDS, &rows).await?;
        Ok(count)
    }
}

fn offset_date(today: NaiveDate, offset: i64) -> Option<NaiveDate> {
    if offset >= 0 {
        today.checked_add_days(Days::new(offset as u64))
    } else {
        today.checked_sub_days(Days::new(offset.unsigned_abs()))
    }
}
