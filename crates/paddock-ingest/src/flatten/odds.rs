//! Odds-fluctuation flattening
//!
//! Each bookmaker price series unrolls into one row per fluctuation, keyed
//! by (event, selection, bet type, bookmaker, fluctuation time). An entry
//! missing any key part, or a fluctuation without a parseable timestamp,
//! cannot be keyed and is dropped rather than written with a null key.

use tracing::trace;

use crate::provider::types::OddsEntry;

use super::row::{Row, SqlValue};
use super::parse_timestamp;

/// Flatten one event's odds entries into fluctuation rows.
pub fn flatten_odds(event_id: &str, entries: &[OddsEntry]) -> Vec<Row> {
    let mut rows = Vec::new();

    for entry in entries {
        let (Some(selection_id), Some(bet_type), Some(bookmaker_id)) = (
            entry.selection_id.as_deref(),
            entry.bet_type.as_deref(),
            entry.bookmaker_id.as_deref(),
        ) else {
            trace!(event_id, "odds entry missing key fields, dropped");
            continue;
        };

        let Some(fluctuations) = entry.price.as_ref().and_then(|p| p.fluctuations.as_ref())
        else {
            continue;
        };

        for fluc in fluctuations {
            let Some(fluctuation_time) = parse_timestamp(fluc.updated_at.as_deref()) else {
                trace!(event_id, selection_id, "fluctuation without timestamp, dropped");
                continue;
            };

            let mut row = Row::new();
            row.push("event_id", SqlValue::text(Some(event_id)));
            row.push("selection_id", SqlValue::text(Some(selection_id)));
            row.push("bet_type", SqlValue::text(Some(bet_type)));
            row.push("bookmaker_id", SqlValue::text(Some(bookmaker_id)));
            row.push("price", SqlValue::Float(fluc.value));
            row.push(
                "rolling_mean_deviation",
                SqlValue::Float(fluc.rolling_mean_deviation),
            );
            row.push("fluctuation_time", SqlValue::Timestamp(fluctuation_time.into()));
            rows.push(row);
        }
    }

    rows
}
