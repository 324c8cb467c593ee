//! Provider payload types
//!
//! The provider's JSON shape is not contractually guaranteed field-complete,
//! so every nested field is optional and ids tolerate string or numeric
//! encodings. Responses arrive in a `data.<field>` envelope; an absent field
//! means "no data", not a transport error.

use serde::{Deserialize, Deserializer};

/// Ids occasionally arrive as JSON numbers; normalize everything to strings.
pub(crate) fn flexible_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
        Bool(bool),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(s) => s,
        Raw::Int(i) => i.to_string(),
        Raw::Float(f) => f.to_string(),
        Raw::Bool(b) => b.to_string(),
    }))
}

// ============================================================================
// Envelopes
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MeetingsEnvelope {
    pub data: Option<MeetingsData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MeetingsData {
    pub meetings: Option<Vec<MeetingSummary>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EventEnvelope {
    pub data: Option<EventData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EventData {
    pub event: Option<EventDetail>,
}

// ============================================================================
// Meeting list
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MeetingSummary {
    #[serde(deserialize_with = "flexible_string")]
    pub id: Option<String>,
    pub name: Option<String>,
    pub slug: Option<String>,
    pub meeting_category: Option<String>,
    pub meeting_type: Option<String>,
    pub meeting_stage: Option<String>,
    pub meeting_date_utc: Option<String>,
    pub meeting_date_local: Option<String>,
    pub rail_position: Option<String>,
    #[serde(deserialize_with = "flexible_string")]
    pub region_id: Option<String>,
    #[serde(deserialize_with = "flexible_string")]
    pub sport_id: Option<String>,
    pub venue: Option<Venue>,
    pub weather: Option<Weather>,
    pub events: Vec<EventRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Venue {
    #[serde(deserialize_with = "flexible_string")]
    pub id: Option<String>,
    pub name: Option<String>,
    pub slug: Option<String>,
    #[serde(deserialize_with = "flexible_string")]
    pub sport_id: Option<String>,
    pub state: Option<String>,
    pub address: Option<String>,
    pub track_map_url: Option<String>,
    pub straight: Option<f64>,
    pub straight_unit: Option<String>,
    pub circumference: Option<f64>,
    pub circumference_unit: Option<String>,
    pub weather_last_updated: Option<String>,
    pub is_clock_wise: Option<bool>,
    pub country: Option<Country>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Country {
    #[serde(deserialize_with = "flexible_string")]
    pub id: Option<String>,
    pub name: Option<String>,
    pub iso2: Option<String>,
    pub iso3: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Weather {
    pub condition: Option<String>,
    pub condition_icon: Option<String>,
    pub feels_like: Option<f64>,
    pub humidity: Option<f64>,
    pub temperature: Option<f64>,
    pub temperature_units: Option<String>,
    pub track_condition_overall: Option<String>,
    pub track_condition_rating: Option<i64>,
    pub wind: Option<String>,
    pub wind_speed_units: Option<String>,
}

/// Event reference inside a meeting-list payload; full detail is fetched
/// separately per event.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EventRef {
    #[serde(deserialize_with = "flexible_string")]
    pub id: Option<String>,
    pub event_number: Option<i64>,
    pub is_resulted: Option<bool>,
}

// ============================================================================
// Event detail
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EventDetail {
    #[serde(deserialize_with = "flexible_string")]
    pub id: Option<String>,
    pub event_number: Option<i64>,
    pub name: Option<String>,
    pub slug: Option<String>,
    pub event_class: Option<String>,
    pub distance: Option<i64>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub race_type: Option<String>,
    pub is_resulted: Option<bool>,
    pub track_condition: Option<TrackCondition>,
    pub race_prize_money: Option<f64>,
    pub result_state: Option<String>,
    pub starters: Option<i64>,
    pub place_winners: Option<i64>,
    pub winning_time: Option<f64>,
    pub pace: Option<String>,
    pub rail_position: Option<String>,
    pub apprentice_can_claim: Option<bool>,
    #[serde(deserialize_with = "flexible_string")]
    pub meeting_id: Option<String>,
    pub selections: Option<Vec<Selection>>,
    pub exotic_result: Vec<ExoticDividend>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TrackCondition {
    pub overall: Option<String>,
    pub rating: Option<i64>,
    pub surface: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Selection {
    #[serde(deserialize_with = "flexible_string")]
    pub id: Option<String>,
    pub competitor_number: Option<i64>,
    pub barrier_number: Option<i64>,
    pub barrier_row: Option<i64>,
    pub barrier_handicap: Option<f64>,
    pub is_emergency: Option<bool>,
    pub selection_result: Option<i64>,
    pub official_margin: Option<f64>,
    pub official_time: Option<f64>,
    pub weight: Option<f64>,
    pub weight_unit: Option<String>,
    pub jockey_weight: Option<f64>,
    pub jockey_weight_claim: Option<f64>,
    pub starting_price: Option<f64>,
    pub rating_official: Option<i64>,
    pub form_letters: Option<String>,
    pub status: Option<String>,
    pub silk_image_url: Option<String>,
    pub racing_colours: Option<String>,
    pub has_blinkers: Option<bool>,
    pub blinkers_first_time: Option<bool>,
    pub has_silk: Option<bool>,
    pub gear_changes: Option<String>,
    pub comments: Option<String>,
    pub selection_comments: Vec<SelectionComment>,
    pub competitor: Option<Competitor>,
    pub stats: Option<SelectionStats>,
    pub prediction: Option<Prediction>,
    pub trainer: Option<Person>,
    pub jockey: Option<Person>,
    pub flucs: Option<Flucs>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SelectionComment {
    pub comments: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Competitor {
    #[serde(deserialize_with = "flexible_string")]
    pub id: Option<String>,
    pub name: Option<String>,
    pub slug: Option<String>,
    pub country: Option<String>,
    pub sex: Option<String>,
    pub age: Option<i64>,
    pub colour: Option<String>,
    pub sire: Option<String>,
    pub dam: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Person {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Prediction {
    pub barrier_speed_rating: Option<f64>,
    pub speed_measure_rating_name: Option<String>,
    pub closing_speed_rating: Option<f64>,
}

/// Pre-race fixed-odds summary attached to a selection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Flucs {
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub open: Option<f64>,
}

/// Rolling performance aggregates, captured at fetch time.
///
/// The places arrays are positional triples (firsts, seconds, thirds); the
/// provider sometimes sends them short or not at all.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SelectionStats {
    pub average_prize_money: Option<f64>,
    pub total_prize_money: Option<f64>,
    pub total_runs: Option<i64>,
    pub total_places: Option<Vec<i64>>,
    pub win_percentage: Option<f64>,
    pub place_percentage: Option<f64>,
    pub last_ten_runs: Option<String>,
    pub last_ten_places: Option<Vec<i64>>,
    pub last_ten_figure: Option<f64>,
    pub rating: Option<f64>,
    pub days_since_last_run: Option<i64>,
    pub last_run: Option<String>,
    pub last_win: Option<String>,
    pub last_run_finish_position: Option<i64>,
    pub last_run_starting_price: Option<f64>,
    pub runs_by_trainer_jockey: Option<i64>,
    pub places_by_trainer_jockey: Option<Vec<i64>>,
    pub trainer_jockey_win: Option<f64>,
    pub runs_by_distance: Option<i64>,
    pub places_by_distance: Option<Vec<i64>>,
    pub runs_by_track: Option<i64>,
    pub places_by_track: Option<Vec<i64>>,
    pub runs_by_dist_track: Option<i64>,
    pub places_by_dist_track: Option<Vec<i64>>,
    pub firm_runs: Option<i64>,
    pub firm_places: Option<Vec<i64>>,
    pub good_runs: Option<i64>,
    pub good_places: Option<Vec<i64>>,
    pub soft_runs: Option<i64>,
    pub soft_places: Option<Vec<i64>>,
    pub heavy_runs: Option<i64>,
    pub heavy_places: Option<Vec<i64>>,
    pub wet_runs: Option<i64>,
    pub wet_places: Option<Vec<i64>>,
    pub dry_places: Option<Vec<i64>>,
    pub group1_runs: Option<i64>,
    pub group1_places: Option<Vec<i64>>,
    pub group2_runs: Option<i64>,
    pub group2_places: Option<Vec<i64>>,
    pub group3_runs: Option<i64>,
    pub group3_places: Option<Vec<i64>>,
    pub listed_race_runs: Option<i64>,
    pub listed_race_places: Option<Vec<i64>>,
    pub class_runs: Option<i64>,
    pub class_places: Option<Vec<i64>>,
    pub fav_runs: Option<i64>,
    pub fav_places: Option<Vec<i64>>,
    pub night_runs: Option<i64>,
    pub night_places: Option<Vec<i64>>,
    pub clockwise_runs: Option<i64>,
    pub clockwise_places: Option<Vec<i64>>,
    #[serde(rename = "aClockwiseRuns")]
    pub a_clockwise_runs: Option<i64>,
    #[serde(rename = "aClockwisePlaces")]
    pub a_clockwise_places: Option<Vec<i64>>,
    pub synth_run: Option<i64>,
    pub synth_places: Option<Vec<i64>>,
    pub dirt_runs: Option<i64>,
    pub first_up_runs: Option<i64>,
    pub first_up_places: Option<Vec<i64>>,
    pub second_up_starts: Option<i64>,
    pub second_up_places: Option<Vec<i64>>,
    pub third_up_starts: Option<i64>,
    pub third_up_places: Option<Vec<i64>>,
    pub roi: Option<f64>,
}

/// One exotic-bet dividend outcome, present once an event is resulted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExoticDividend {
    #[serde(deserialize_with = "flexible_string")]
    pub id: Option<String>,
    pub tote: Option<String>,
    pub exotic_market: Option<String>,
    pub results: Option<serde_json::Value>,
    pub amount: Option<f64>,
}

// ============================================================================
// Odds fluctuations
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OddsResponse {
    pub odds: Option<Vec<OddsEntry>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OddsEntry {
    #[serde(deserialize_with = "flexible_string")]
    pub selection_id: Option<String>,
    pub bet_type: Option<String>,
    #[serde(deserialize_with = "flexible_string")]
    pub bookmaker_id: Option<String>,
    pub price: Option<PriceSeries>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PriceSeries {
    pub fluctuations: Option<Vec<Fluctuation>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Fluctuation {
    pub value: Option<f64>,
    pub rolling_mean_deviation: Option<f64>,
    pub updated_at: Option<String>,
}
