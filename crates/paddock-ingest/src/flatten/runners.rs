//! Runner flattening
//!
//! One event detail payload becomes one row per selection. Each row repeats
//! the event-level fields so the runners table is queryable on its own, and
//! carries a deterministic composite key so re-ingesting the same day is an
//! update, not a duplicate.

use chrono::NaiveDate;

use crate::provider::types::{EventDetail, Selection};

use super::row::{Row, SqlValue};
use super::{parse_timestamp, ShapeError};

/// Composite runner identity: `{d/mm/yyyy}-{meeting name}-{event number}-{competitor number}`.
///
/// The day is unpadded and the month padded, matching the historical key
/// format already present in the table. Changing either would orphan every
/// existing row, so the format is load-bearing.
fn composite_key(
    meeting_date_local: Option<NaiveDate>,
    meeting_name: Option<&str>,
    event_number: Option<i64>,
    competitor_number: Option<i64>,
) -> String {
    let date = meeting_date_local
        .map(|d| d.format("%-d/%m/%Y").to_string())
        .unwrap_or_default();
    let name = meeting_name.unwrap_or_default();
    let event = event_number.map(|n| n.to_string()).unwrap_or_default();
    let competitor = competitor_number.map(|n| n.to_string()).unwrap_or_default();

    format!("{date}-{name}-{event}-{competitor}")
}

/// Positional places triple (firsts, seconds, thirds). A short or missing
/// array yields nulls for the absent positions.
fn triple(places: Option<&Vec<i64>>) -> [Option<i64>; 3] {
    let places = places.map(Vec::as_slice).unwrap_or_default();
    [
        places.first().copied(),
        places.get(1).copied(),
        places.get(2).copied(),
    ]
}

fn push_triple(row: &mut Row, names: [&'static str; 3], values: [Option<i64>; 3]) {
    for (name, value) in names.into_iter().zip(values) {
        row.push(name, SqlValue::Int(value));
    }
}

/// Flatten every selection of one event into wide runner rows.
///
/// An event without an id, or whose payload carries no selections array at
/// all, is malformed and rejected whole. An empty selections array is a
/// legitimate zero-runner event.
pub fn flatten_runners(
    event: &EventDetail,
    meeting_id: &str,
    meeting_name: Option<&str>,
    meeting_date_local: Option<NaiveDate>,
) -> Result<Vec<Row>, ShapeError> {
    let event_id = event
        .id
        .as_ref()
        .filter(|id| !id.is_empty())
        .ok_or(ShapeError::MissingEventId)?;

    let selections = event.selections.as_ref().ok_or(ShapeError::MissingSelections)?;

    Ok(selections
        .iter()
        .map(|selection| {
            flatten_selection(event, event_id, selection, meeting_id, meeting_name, meeting_date_local)
        })
        .collect())
}

fn flatten_selection(
    event: &EventDetail,
    event_id: &str,
    selection: &Selection,
    meeting_id: &str,
    meeting_name: Option<&str>,
    meeting_date_local: Option<NaiveDate>,
) -> Row {
    let competitor = selection.competitor.clone().unwrap_or_default();
    let stats = selection.stats.clone().unwrap_or_default();
    let prediction = selection.prediction.clone().unwrap_or_default();
    let trainer = selection.trainer.clone().unwrap_or_default();
    let jockey = selection.jockey.clone().unwrap_or_default();
    let flucs = selection.flucs.clone().unwrap_or_default();
    let track = event.track_condition.clone().unwrap_or_default();

    let mut row = Row::new();

    row.push(
        "composite_key",
        SqlValue::text(Some(composite_key(
            meeting_date_local,
            meeting_name,
            event.event_number,
            selection.competitor_number,
        ))),
    );
    row.push("meeting_id", SqlValue::text(Some(meeting_id)));
    row.push("meeting_name", SqlValue::text(meeting_name));
    row.push("meeting_date_local", SqlValue::Date(meeting_date_local));

    row.push("event_id", SqlValue::text(Some(event_id)));
    row.push("event_number", SqlValue::Int(event.event_number));
    row.push("event_name", SqlValue::Text(event.name.clone()));
    row.push("event_slug", SqlValue::Text(event.slug.clone()));
    row.push("event_class", SqlValue::Text(event.event_class.clone()));
    row.push("distance", SqlValue::Int(event.distance));
    row.push(
        "start_time",
        SqlValue::Timestamp(parse_timestamp(event.start_time.as_deref())),
    );
    row.push(
        "event_end_time",
        SqlValue::Timestamp(parse_timestamp(event.end_time.as_deref())),
    );
    row.push("race_type", SqlValue::Text(event.race_type.clone()));
    row.push("is_resulted", SqlValue::Bool(event.is_resulted));
    row.push("track_condition_overall", SqlValue::Text(track.overall));
    row.push("track_condition_rating", SqlValue::Int(track.rating));
    row.push("surface", SqlValue::Text(track.surface));
    row.push("race_prize_money", SqlValue::Float(event.race_prize_money));
    row.push("result_state", SqlValue::Text(event.result_state.clone()));
    row.push("starters", SqlValue::Int(event.starters));
    row.push("place_winners", SqlValue::Int(event.place_winners));
    row.push("winning_time", SqlValue::Float(event.winning_time));
    row.push("pace", SqlValue::Text(event.pace.clone()));
    row.push("rail_position", SqlValue::Text(event.rail_position.clone()));
    row.push("apprentice_can_claim", SqlValue::Bool(event.apprentice_can_claim));

    row.push("selection_id", SqlValue::Text(selection.id.clone()));
    row.push("competitor_number", SqlValue::Int(selection.competitor_number));
    row.push("barrier_number", SqlValue::Int(selection.barrier_number));
    row.push("barrier_row", SqlValue::Int(selection.barrier_row));
    row.push("barrier_handicap", SqlValue::Float(selection.barrier_handicap));
    row.push("is_emergency", SqlValue::Bool(selection.is_emergency));
    row.push("selection_result", SqlValue::Int(selection.selection_result));
    row.push("official_margin", SqlValue::Float(selection.official_margin));
    row.push("official_time", SqlValue::Float(selection.official_time));
    row.push("weight", SqlValue::Float(selection.weight));
    row.push("weight_unit", SqlValue::Text(selection.weight_unit.clone()));
    row.push("jockey_weight", SqlValue::Float(selection.jockey_weight));
    row.push("jockey_weight_claim", SqlValue::Float(selection.jockey_weight_claim));
    row.push("starting_price", SqlValue::Float(selection.starting_price));
    row.push("rating_official", SqlValue::Int(selection.rating_official));
    row.push("form_letters", SqlValue::Text(selection.form_letters.clone()));
    row.push("status", SqlValue::Text(selection.status.clone()));
    row.push("silk_image_url", SqlValue::Text(selection.silk_image_url.clone()));
    row.push("racing_colours", SqlValue::Text(selection.racing_colours.clone()));
    row.push("has_blinkers", SqlValue::Bool(selection.has_blinkers));
    row.push("blinkers_first_time", SqlValue::Bool(selection.blinkers_first_time));
    row.push("has_silk", SqlValue::Bool(selection.has_silk));
    row.push("gear_changes", SqlValue::Text(selection.gear_changes.clone()));
    row.push("comments", SqlValue::Text(selection.comments.clone()));
    row.push(
        "runner_comments",
        SqlValue::Text(
            selection
                .selection_comments
                .first()
                .and_then(|c| c.comments.clone()),
        ),
    );

    row.push("competitor_id", SqlValue::Text(competitor.id));
    row.push("competitor_name", SqlValue::Text(competitor.name));
    row.push("competitor_slug", SqlValue::Text(competitor.slug));
    row.push("country_of_origin", SqlValue::Text(competitor.country));
    row.push("sex", SqlValue::Text(competitor.sex));
    row.push("age", SqlValue::Int(competitor.age));
    row.push("colour", SqlValue::Text(competitor.colour));
    row.push("sire_name", SqlValue::Text(competitor.sire));
    row.push("dam_name", SqlValue::Text(competitor.dam));

    row.push("trainer_name", SqlValue::Text(trainer.name));
    row.push("jockey_name", SqlValue::Text(jockey.name));

    row.push("barrier_speed_rating", SqlValue::Float(prediction.barrier_speed_rating));
    row.push(
        "settling_speed_rating",
        SqlValue::Text(prediction.speed_measure_rating_name),
    );
    row.push("closing_speed_rating", SqlValue::Float(prediction.closing_speed_rating));

    row.push("flucs_high", SqlValue::Float(flucs.high));
    row.push("flucs_low", SqlValue::Float(flucs.low));
    row.push("flucs_open", SqlValue::Float(flucs.open));

    row.push("average_prize_money", SqlValue::Float(stats.average_prize_money));
    row.push("total_prize_money", SqlValue::Float(stats.total_prize_money));
    row.push("total_runs", SqlValue::Int(stats.total_runs));
    push_triple(
        &mut row,
        ["total_places_1", "total_places_2", "total_places_3"],
        triple(stats.total_places.as_ref()),
    );
    row.push("win_percentage", SqlValue::Float(stats.win_percentage));
    row.push("place_percentage", SqlValue::Float(stats.place_percentage));
    row.push("last_ten_runs", SqlValue::Text(stats.last_ten_runs));
    push_triple(
        &mut row,
        ["last_ten_places_1", "last_ten_places_2", "last_ten_places_3"],
        triple(stats.last_ten_places.as_ref()),
    );
    row.push("last_ten_figure", SqlValue::Float(stats.last_ten_figure));
    row.push("rating", SqlValue::Float(stats.rating));
    row.push("days_since_last_run", SqlValue::Int(stats.days_since_last_run));
    row.push("last_run", SqlValue::Text(stats.last_run));
    row.push("last_win", SqlValue::Text(stats.last_win));
    row.push(
        "last_run_finish_position",
        SqlValue::Int(stats.last_run_finish_position),
    );
    row.push(
        "last_run_starting_price",
        SqlValue::Float(stats.last_run_starting_price),
    );
    row.push("runs_by_trainer_jockey", SqlValue::Int(stats.runs_by_trainer_jockey));
    push_triple(
        &mut row,
        [
            "places_by_trainer_jockey_1",
            "places_by_trainer_jockey_2",
            "places_by_trainer_jockey_3",
        ],
        triple(stats.places_by_trainer_jockey.as_ref()),
    );
    row.push("trainer_jockey_win", SqlValue::Float(stats.trainer_jockey_win));

    row.push("runs_by_distance", SqlValue::Int(stats.runs_by_distance));
    push_triple(
        &mut row,
        ["places_by_distance_1", "places_by_distance_2", "places_by_distance_3"],
        triple(stats.places_by_distance.as_ref()),
    );

    row.push("runs_by_track", SqlValue::Int(stats.runs_by_track));
    push_triple(
        &mut row,
        ["places_by_track_1", "places_by_track_2", "places_by_track_3"],
        triple(stats.places_by_track.as_ref()),
    );

    row.push("runs_by_dist_track", SqlValue::Int(stats.runs_by_dist_track));
    push_triple(
        &mut row,
        [
            "places_by_dist_track_1",
            "places_by_dist_track_2",
            "places_by_dist_track_3",
        ],
        triple(stats.places_by_dist_track.as_ref()),
    );

    row.push("firm_runs", SqlValue::Int(stats.firm_runs));
    push_triple(
        &mut row,
        ["firm_places_1", "firm_places_2", "firm_places_3"],
        triple(stats.firm_places.as_ref()),
    );

    row.push("good_runs", SqlValue::Int(stats.good_runs));
    push_triple(
        &mut row,
        ["good_places_1", "good_places_2", "good_places_3"],
        triple(stats.good_places.as_ref()),
    );

    row.push("soft_runs", SqlValue::Int(stats.soft_runs));
    push_triple(
        &mut row,
        ["soft_places_1", "soft_places_2", "soft_places_3"],
        triple(stats.soft_places.as_ref()),
    );

    row.push("heavy_runs", SqlValue::Int(stats.heavy_runs));
    push_triple(
        &mut row,
        ["heavy_places_1", "heavy_places_2", "heavy_places_3"],
        triple(stats.heavy_places.as_ref()),
    );

    row.push("wet_runs", SqlValue::Int(stats.wet_runs));
    push_triple(
        &mut row,
        ["wet_places_1", "wet_places_2", "wet_places_3"],
        triple(stats.wet_places.as_ref()),
    );

    push_triple(
        &mut row,
        ["dry_places_1", "dry_places_2", "dry_places_3"],
        triple(stats.dry_places.as_ref()),
    );

    row.push("group1_runs", SqlValue::Int(stats.group1_runs));
    push_triple(
        &mut row,
        ["group1_places_1", "group1_places_2", "group1_places_3"],
        triple(stats.group1_places.as_ref()),
    );

    row.push("group2_runs", SqlValue::Int(stats.group2_runs));
    push_triple(
        &mut row,
        ["group2_places_1", "group2_places_2", "group2_places_3"],
        triple(stats.group2_places.as_ref()),
    );

    row.push("group3_runs", SqlValue::Int(stats.group3_runs));
    push_triple(
        &mut row,
        ["group3_places_1", "group3_places_2", "group3_places_3"],
        triple(stats.group3_places.as_ref()),
    );

    row.push("listed_race_runs", SqlValue::Int(stats.listed_race_runs));
    push_triple(
        &mut row,
        [
            "listed_race_places_1",
            "listed_race_places_2",
            "listed_race_places_3",
        ],
        triple(stats.listed_race_places.as_ref()),
    );

    row.push("class_runs", SqlValue::Int(stats.class_runs));
    push_triple(
        &mut row,
        ["class_places_1", "class_places_2", "class_places_3"],
        triple(stats.class_places.as_ref()),
    );

    row.push("fav_runs", SqlValue::Int(stats.fav_runs));
    push_triple(
        &mut row,
        ["fav_places_1", "fav_places_2", "fav_places_3"],
        triple(stats.fav_places.as_ref()),
    );

    row.push("night_runs", SqlValue::Int(stats.night_runs));
    push_triple(
        &mut row,
        ["night_places_1", "night_places_2", "night_places_3"],
        triple(stats.night_places.as_ref()),
    );

    row.push("clockwise_runs", SqlValue::Int(stats.clockwise_runs));
    push_triple(
        &mut row,
        ["clockwise_places_1", "clockwise_places_2", "clockwise_places_3"],
        triple(stats.clockwise_places.as_ref()),
    );

    row.push("anticlockwise_runs", SqlValue::Int(stats.a_clockwise_runs));
    push_triple(
        &mut row,
        [
            "anticlockwise_places_1",
            "anticlockwise_places_2",
            "anticlockwise_places_3",
        ],
        triple(stats.a_clockwise_places.as_ref()),
    );

    row.push("synth_runs", SqlValue::Int(stats.synth_run));
    push_triple(
        &mut row,
        ["synth_places_1", "synth_places_2", "synth_places_3"],
        triple(stats.synth_places.as_ref()),
    );

    row.push("dirt_runs", SqlValue::Int(stats.dirt_runs));

    row.push("first_up_runs", SqlValue::Int(stats.first_up_runs));
    push_triple(
        &mut row,
        ["first_up_places_1", "first_up_places_2", "first_up_places_3"],
        triple(stats.first_up_places.as_ref()),
    );

    row.push("second_up_runs", SqlValue::Int(stats.second_up_starts));
    push_triple(
        &mut row,
        ["second_up_places_1", "second_up_places_2", "second_up_places_3"],
        triple(stats.second_up_places.as_ref()),
    );

    row.push("third_up_runs", SqlValue::Int(stats.third_up_starts));
    push_triple(
        &mut row,
        ["third_up_places_1", "third_up_places_2", "third_up_places_3"],
        triple(stats.third_up_places.as_ref()),
    );

    row.push("roi", SqlValue::Float(stats.roi));

    row
}
