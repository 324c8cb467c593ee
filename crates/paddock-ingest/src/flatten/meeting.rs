//! Meeting flattening

use crate::provider::types::MeetingSummary;

use super::row::{Row, SqlValue};
use super::{parse_date, parse_timestamp, ShapeError};

/// Flatten one meeting into a wide row keyed by the provider meeting id.
///
/// Any missing optional sub-object (`venue`, `venue.country`, `weather`)
/// yields typed nulls for its fields. The trailing duplicated columns
/// (`meeting_date`, `venue_country_*`, `track_condition_*`) exist for
/// downstream filtering on the meetings table alone.
pub fn flatten_meeting(meeting: &MeetingSummary) -> Result<Row, ShapeError> {
    let meeting_id = meeting
        .id
        .as_ref()
        .filter(|id| !id.is_empty())
        .ok_or(ShapeError::MissingMeetingId)?;

    let venue = meeting.venue.clone().unwrap_or_default();
    let country = venue.country.clone().unwrap_or_default();
    let weather = meeting.weather.clone().unwrap_or_default();

    let mut row = Row::new();

    row.push("meeting_id", SqlValue::text(Some(meeting_id.clone())));
    row.push("meeting_name", SqlValue::Text(meeting.name.clone()));
    row.push("meeting_slug", SqlValue::Text(meeting.slug.clone()));
    row.push("meeting_category", SqlValue::Text(meeting.meeting_category.clone()));
    row.push("meeting_type", SqlValue::Text(meeting.meeting_type.clone()));
    row.push("meeting_stage", SqlValue::Text(meeting.meeting_stage.clone()));
    row.push(
        "meeting_date_utc",
        SqlValue::Date(parse_date(meeting.meeting_date_utc.as_deref())),
    );
    row.push(
        "meeting_date_local",
        SqlValue::Date(parse_date(meeting.meeting_date_local.as_deref())),
    );
    row.push("rail_position", SqlValue::Text(meeting.rail_position.clone()));
    row.push("region_id", SqlValue::Text(meeting.region_id.clone()));
    row.push("sport_id", SqlValue::Text(meeting.sport_id.clone()));

    row.push("venue_id", SqlValue::Text(venue.id.clone()));
    row.push("venue_name", SqlValue::Text(venue.name.clone()));
    row.push("venue_slug", SqlValue::Text(venue.slug.clone()));
    row.push("venue_sport_id", SqlValue::Text(venue.sport_id.clone()));
    row.push("venue_state", SqlValue::Text(venue.state.clone()));
    row.push("venue_address", SqlValue::Text(venue.address.clone()));
    row.push("venue_track_map_url", SqlValue::Text(venue.track_map_url.clone()));
    row.push("venue_straight", SqlValue::Float(venue.straight));
    row.push("venue_straight_unit", SqlValue::Text(venue.straight_unit.clone()));
    row.push("venue_circumference", SqlValue::Float(venue.circumference));
    row.push(
        "venue_circumference_unit",
        SqlValue::Text(venue.circumference_unit.clone()),
    );
    row.push(
        "venue_weather_last_updated",
        SqlValue::Timestamp(parse_timestamp(venue.weather_last_updated.as_deref())),
    );
    row.push("venue_is_clockwise", SqlValue::Bool(venue.is_clock_wise));

    row.push("country_id", SqlValue::Text(country.id.clone()));
    row.push("country_name", SqlValue::Text(country.name.clone()));
    row.push("country_iso2", SqlValue::Text(country.iso2.clone()));
    row.push("country_iso3", SqlValue::Text(country.iso3.clone()));

    row.push("weather_condition", SqlValue::Text(weather.condition.clone()));
    row.push(
        "weather_condition_icon",
        SqlValue::Text(weather.condition_icon.clone()),
    );
    row.push("weather_feels_like", SqlValue::Float(weather.feels_like));
    row.push("weather_humidity", SqlValue::Float(weather.humidity));
    row.push("weather_temperature", SqlValue::Float(weather.temperature));
    row.push(
        "weather_temperature_units",
        SqlValue::Text(weather.temperature_units.clone()),
    );
    row.push(
        "weather_track_condition_overall",
        SqlValue::Text(weather.track_condition_overall.clone()),
    );
    row.push(
        "weather_track_condition_rating",
        SqlValue::Int(weather.track_condition_rating),
    );
    row.push("weather_wind", SqlValue::Text(weather.wind.clone()));
    row.push(
        "weather_wind_speed_units",
        SqlValue::Text(weather.wind_speed_units.clone()),
    );

    // Duplicated for filtering directly on the meetings table
    row.push(
        "meeting_date",
        SqlValue::Date(parse_date(meeting.meeting_date_local.as_deref())),
    );
    row.push("venue_country_id", SqlValue::Text(country.id));
    row.push("venue_country_name", SqlValue::Text(country.name));
    row.push("venue_country_iso2", SqlValue::Text(country.iso2));
    row.push("venue_country_iso3", SqlValue::Text(country.iso3));
    row.push(
        "track_condition_overall",
        SqlValue::Text(weather.track_condition_overall),
    );
    row.push(
        "track_condition_rating",
        SqlValue::Int(weather.track_condition_rating),
    );

    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn meeting(value: serde_json::Value) -> MeetingSummary {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn flattens_fully_populated_meeting() {
        let row = flatten_meeting(&meeting(json!({
            "id": "m-188212",
            "name": "Flemington",
            "meetingDateLocal": "2025-07-08",
            "venue": {
                "id": "v-12",
                "name": "Flemington",
                "state": "VIC",
                "isClockWise": false,
                "country": { "id": "c-au", "name": "Australia", "iso2": "AU", "iso3": "AUS" }
            },
            "weather": { "condition": "Fine", "temperature": 14.5, "trackConditionOverall": "Good" }
        })))
        .unwrap();

        assert_eq!(
            row.get("meeting_id"),
            Some(&SqlValue::Text(Some("m-188212".to_string())))
        );
        assert_eq!(
            row.get("meeting_date_local"),
            Some(&SqlValue::Date(NaiveDate::from_ymd_opt(2025, 7, 8)))
        );
        assert_eq!(
            row.get("venue_is_clockwise"),
            Some(&SqlValue::Bool(Some(false)))
        );
        assert_eq!(
            row.get("country_name"),
            Some(&SqlValue::Text(Some("Australia".to_string())))
        );
        // filter duplicates carry the same values
        assert_eq!(row.get("venue_country_name"), row.get("country_name"));
        assert_eq!(
            row.get("track_condition_overall"),
            Some(&SqlValue::Text(Some("Good".to_string())))
        );
    }

    #[test]
    fn missing_sub_objects_become_typed_nulls() {
        let row = flatten_meeting(&meeting(json!({ "id": "m-1" }))).unwrap();

        assert_eq!(row.get("venue_name"), Some(&SqlValue::Text(None)));
        assert_eq!(row.get("weather_temperature"), Some(&SqlValue::Float(None)));
        assert_eq!(row.get("country_iso2"), Some(&SqlValue::Text(None)));
        assert_eq!(row.get("meeting_date_utc"), Some(&SqlValue::Date(None)));
    }

    #[test]
    fn meeting_without_id_is_a_shape_error() {
        assert_eq!(
            flatten_meeting(&meeting(json!({ "name": "Nowhere" }))),
            Err(ShapeError::MissingMeetingId)
        );
    }

    #[test]
    fn malformed_dates_become_null() {
        let row = flatten_meeting(&meeting(json!({
            "id": "m-1",
            "meetingDateUtc": "garbage",
            "venue": { "weatherLastUpdated": "also garbage" }
        })))
        .unwrap();

        assert_eq!(row.get("meeting_date_utc"), Some(&SqlValue::Date(None)));
        assert_eq!(
            row.get("venue_weather_last_updated"),
            Some(&SqlValue::Timestamp(None))
        );
    }
}
