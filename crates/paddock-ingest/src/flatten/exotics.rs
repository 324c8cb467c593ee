//! Exotic-dividend flattening
//!
//! Resulted events carry a list of exotic-bet dividends (quinella, trifecta
//! and friends). Each dividend becomes one row keyed by the provider's
//! result id; the raw `results` structure is kept as serialized JSON since
//! its shape varies by market.

use crate::provider::types::EventDetail;

use super::row::{Row, SqlValue};
use super::ShapeError;

/// Flatten an event's exotic dividends.
///
/// Dividends without an id cannot be keyed and are skipped; everything else
/// is preserved as-is.
pub fn flatten_exotics(event: &EventDetail, meeting_id: &str) -> Result<Vec<Row>, ShapeError> {
    let event_id = event
        .id
        .as_ref()
        .filter(|id| !id.is_empty())
        .ok_or(ShapeError::MissingEventId)?;

    let rows = event
        .exotic_result
        .iter()
        .filter_map(|dividend| {
            let result_id = dividend.id.as_ref().filter(|id| !id.is_empty())?;

            let mut row = Row::new();
            row.push("result_id", SqlValue::text(Some(result_id.clone())));
            row.push("event_id", SqlValue::text(Some(event_id.as_str())));
            row.push("meeting_id", SqlValue::text(Some(meeting_id)));
            row.push("tote", SqlValue::Text(dividend.tote.clone()));
            row.push("exotic_market", SqlValue::Text(dividend.exotic_market.clone()));
            row.push(
                "results",
                SqlValue::Text(dividend.results.as_ref().map(|v| v.to_string())),
            );
            row.push("amount", SqlValue::Float(dividend.amount));
            Some(row)
        })
        .collect();

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(value: serde_json::Value) -> EventDetail {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn flattens_each_dividend_with_event_context() {
        let event = event(json!({
            "id": "e-7",
            "exoticResult": [
                {
                    "id": 5551,
                    "tote": "VIC",
                    "exoticMarket": "Quinella",
                    "results": [[1, 4]],
                    "amount": 18.6
                },
                {
                    "id": "5552",
                    "tote": "VIC",
                    "exoticMarket": "Trifecta",
                    "results": [[1, 4, 2]],
                    "amount": 204.1
                }
            ]
        }));

        let rows = flatten_exotics(&event, "m-9").unwrap();
        assert_eq!(rows.len(), 2);

        assert_eq!(
            rows[0].get("result_id"),
            Some(&SqlValue::Text(Some("5551".into())))
        );
        assert_eq!(rows[0].get("event_id"), Some(&SqlValue::Text(Some("e-7".into()))));
        assert_eq!(rows[0].get("meeting_id"), Some(&SqlValue::Text(Some("m-9".into()))));
        assert_eq!(
            rows[0].get("results"),
            Some(&SqlValue::Text(Some("[[1,4]]".into())))
        );
        assert_eq!(rows[1].get("amount"), Some(&SqlValue::Float(Some(204.1))));
    }

    #[test]
    fn dividend_without_id_is_skipped() {
        let event = event(json!({
            "id": "e-7",
            "exoticResult": [
                { "exoticMarket": "Exacta", "amount": 12.0 },
                { "id": "ok", "exoticMarket": "Quinella" }
            ]
        }));

        let rows = flatten_exotics(&event, "m-9").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("result_id"), Some(&SqlValue::Text(Some("ok".into()))));
    }

    #[test]
    fn no_dividends_is_an_empty_list() {
        let event = event(json!({ "id": "e-7" }));
        assert_eq!(flatten_exotics(&event, "m-9"), Ok(vec![]));
    }

    #[test]
    fn event_without_id_is_rejected() {
        let event = event(json!({ "exoticResult": [{ "id": "x" }] }));
        assert_eq!(flatten_exotics(&event, "m-9"), Err(ShapeError::MissingEventId));
    }
}
