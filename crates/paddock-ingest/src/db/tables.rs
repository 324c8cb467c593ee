//! Target table registry
//!
//! Each ingested table is described once: its name and the key columns that
//! make re-ingestion idempotent. The gateway builds its upsert statements
//! from these specs, so the conflict target always matches the unique
//! constraint the migrations create.

/// One ingestion target table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSpec {
    pub name: &'static str,
    pub key_columns: &'static [&'static str],
}

/// Meetings, one row per provider meeting.
pub const MEETINGS: TableSpec = TableSpec {
    name: "punters_meetings",
    key_columns: &["meeting_id"],
};

/// Runners, one row per selection per event, keyed by the composite
/// date-meeting-race-competitor identity.
pub const RUNNERS: TableSpec = TableSpec {
    name: "punters_runners",
    key_columns: &["composite_key"],
};

/// Exotic-bet dividends for resulted events.
pub const EXOTIC_RESULTS: TableSpec = TableSpec {
    name: "punters_exotic_results",
    key_columns: &["result_id"],
};

/// Bookmaker price fluctuations. The five-part key makes each observed
/// price point unique while re-observations of the same point update in
/// place.
pub const ODDS: TableSpec = TableSpec {
    name: "punters_odds",
    key_columns: &[
        "event_id",
        "selection_id",
        "bet_type",
        "bookmaker_id",
        "fluctuation_time",
    ],
};

pub const ALL_TABLES: &[TableSpec] = &[MEETINGS, RUNNERS, EXOTIC_RESULTS, ODDS];

/// Startup check over the whole registry. Specs are constants, so a failure
/// here is a programming error caught before the first fetch.
pub fn validate() -> Result<(), String> {
    for table in ALL_TABLES {
        if !is_safe_identifier(table.name) {
            return Err(format!("unsafe table name: {}", table.name));
        }
        if table.key_columns.is_empty() {
            return Err(format!("table {} has no key columns", table.name));
        }
        for column in table.key_columns.iter().copied() {
            if !is_safe_identifier(column) {
                return Err(format!("unsafe key column {column} on {}", table.name));
            }
        }
    }
    Ok(())
}

/// Table and column names are interpolated into SQL text, so they must stay
/// plain lowercase identifiers. Specs are compile-time constants, but the
/// gateway still refuses anything that fails this check.
pub fn is_safe_identifier(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        && !name.starts_with(|c: char| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_validates() {
        assert_eq!(validate(), Ok(()));
    }

    #[test]
    fn identifier_check_rejects_sql_metacharacters() {
        assert!(is_safe_identifier("meeting_id"));
        assert!(is_safe_identifier("group1_places_2"));
        assert!(!is_safe_identifier(""));
        assert!(!is_safe_identifier("1st_place"));
        assert!(!is_safe_identifier("name; drop table x"));
        assert!(!is_safe_identifier("Name"));
        assert!(!is_safe_identifier("na-me"));
    }
}
