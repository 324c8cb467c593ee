//! Merge gateway
//!
//! All writes go through one statement shape: insert the row, and on key
//! conflict update every non-key column in place. The row describes its own
//! columns, so the gateway carries no per-table SQL; the table spec supplies
//! the conflict target. Every write stamps `last_updated` server-side.

use async_trait::async_trait;
use sqlx::postgres::Postgres;
use sqlx::{PgPool, QueryBuilder};
use thiserror::Error;
use tracing::trace;

use crate::flatten::{Row, SqlValue};

use super::tables::{is_safe_identifier, TableSpec};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database query failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("row for {table} is missing key column {column}")]
    MissingKeyColumn {
        table: &'static str,
        column: &'static str,
    },

    #[error("unsafe sql identifier: {0}")]
    InvalidIdentifier(String),

    #[error("refusing to upsert an empty row")]
    EmptyRow,
}

/// Idempotent row persistence.
///
/// The synchronizer only ever merges; it never reads back. Tests substitute
/// an in-memory implementation.
#[async_trait]
pub trait MergeStore: Send + Sync {
    async fn upsert(&self, table: &TableSpec, row: &Row) -> Result<(), StoreError>;

    async fn upsert_many(&self, table: &TableSpec, rows: &[Row]) -> Result<u64, StoreError> {
        for row in rows {
            self.upsert(table, row).await?;
        }
        Ok(rows.len() as u64)
    }
}

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MergeStore for PgStore {
    async fn upsert(&self, table: &TableSpec, row: &Row) -> Result<(), StoreError> {
        let mut builder = upsert_statement(table, row)?;

        builder.build().execute(&self.pool).await?;

        trace!(table = table.name, columns = row.len(), "row merged");
        Ok(())
    }
}

/// Assemble `INSERT ... ON CONFLICT (keys) DO UPDATE SET ...` for one row.
///
/// Split out of the store so the statement shape is testable without a
/// database.
fn upsert_statement<'a>(
    table: &TableSpec,
    row: &'a Row,
) -> Result<QueryBuilder<'a, Postgres>, StoreError> {
    if row.is_empty() {
        return Err(StoreError::EmptyRow);
    }

    if !is_safe_identifier(table.name) {
        return Err(StoreError::InvalidIdentifier(table.name.to_string()));
    }
    for (name, _) in row.columns() {
        if !is_safe_identifier(name) {
            return Err(StoreError::InvalidIdentifier((*name).to_string()));
        }
    }

    for key in table.key_columns.iter().copied() {
        if row.get(key).is_none() {
            return Err(StoreError::MissingKeyColumn {
                table: table.name,
                column: key,
            });
        }
    }

    let mut builder = QueryBuilder::<Postgres>::new("INSERT INTO ");
    builder.push(table.name);

    builder.push(" (");
    {
        let mut list = builder.separated(", ");
        for (name, _) in row.columns() {
            list.push(*name);
        }
        list.push("last_updated");
    }
    builder.push(") VALUES (");
    {
        let mut list = builder.separated(", ");
        for (_, value) in row.columns() {
            push_value(&mut list, value);
        }
        list.push("now()");
    }
    builder.push(") ON CONFLICT (");
    {
        let mut list = builder.separated(", ");
        for key in table.key_columns {
            list.push(*key);
        }
    }
    builder.push(") DO UPDATE SET ");
    {
        let mut list = builder.separated(", ");
        for (name, _) in row.columns() {
            if !table.key_columns.contains(name) {
                list.push(format!("{name} = EXCLUDED.{name}"));
            }
        }
        list.push("last_updated = now()");
    }

    Ok(builder)
}

fn push_value<'qb, 'args>(
    list: &mut sqlx::query_builder::Separated<'qb, 'args, Postgres, &'static str>,
    value: &'args SqlValue,
) {
    match value {
        SqlValue::Text(v) => list.push_bind(v.as_deref()),
        SqlValue::Int(v) => list.push_bind(*v),
        SqlValue::Float(v) => list.push_bind(*v),
        SqlValue::Bool(v) => list.push_bind(*v),
        SqlValue::Timestamp(v) => list.push_bind(*v),
        SqlValue::Date(v) => list.push_bind(*v),
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tables::{MEETINGS, ODDS};
    use sqlx::Execute;

    fn meeting_row() -> Row {
        let mut row = Row::new();
        row.push("meeting_id", SqlValue::text(Some("m-1")));
        row.push("meeting_name", SqlValue::text(Some("Flemington")));
        row.push("rail_position", SqlValue::Text(None));
        row
    }

    #[test]
    fn statement_inserts_and_updates_non_key_columns() {
        let row = meeting_row();
        let mut builder = upsert_statement(&MEETINGS, &row).unwrap();
        let sql = builder.build().sql().to_string();

        assert!(sql.starts_with("INSERT INTO punters_meetings (meeting_id, meeting_name, rail_position, last_updated)"));
        assert!(sql.contains("VALUES ($1, $2, $3, now())"));
        assert!(sql.contains("ON CONFLICT (meeting_id) DO UPDATE SET"));
        assert!(sql.contains("meeting_name = EXCLUDED.meeting_name"));
        assert!(sql.contains("rail_position = EXCLUDED.rail_position"));
        assert!(sql.contains("last_updated = now()"));
        // key column is never updated
        assert!(!sql.contains("meeting_id = EXCLUDED.meeting_id"));
    }

    #[test]
    fn multi_column_conflict_targets_all_keys() {
        let mut row = Row::new();
        row.push("event_id", SqlValue::text(Some("e-1")));
        row.push("selection_id", SqlValue::text(Some("s-1")));
        row.push("bet_type", SqlValue::text(Some("fixed-win")));
        row.push("bookmaker_id", SqlValue::text(Some("bet365")));
        row.push("fluctuation_time", SqlValue::Timestamp(Some(chrono::Utc::now())));
        row.push("price", SqlValue::Float(Some(4.2)));

        let mut builder = upsert_statement(&ODDS, &row).unwrap();
        let sql = builder.build().sql().to_string();

        assert!(sql.contains(
            "ON CONFLICT (event_id, selection_id, bet_type, bookmaker_id, fluctuation_time)"
        ));
        assert!(sql.contains("price = EXCLUDED.price"));
    }

    #[test]
    fn missing_key_column_is_rejected() {
        let mut row = Row::new();
        row.push("meeting_name", SqlValue::text(Some("Flemington")));

        match upsert_statement(&MEETINGS, &row) {
            Err(StoreError::MissingKeyColumn { table, column }) => {
                assert_eq!(table, "punters_meetings");
                assert_eq!(column, "meeting_id");
            }
            Ok(_) => panic!("expected MissingKeyColumn, got Ok(_)"),
            Err(other) => panic!("expected MissingKeyColumn, got {other:?}"),
        }
    }

    #[test]
    fn empty_row_is_rejected() {
        assert!(matches!(
            upsert_statement(&MEETINGS, &Row::new()),
            Err(StoreError::EmptyRow)
        ));
    }

    #[test]
    fn unsafe_table_name_is_rejected() {
        let bad = TableSpec {
            name: "punters_meetings; drop table x",
            key_columns: &["meeting_id"],
        };
        assert!(matches!(
            upsert_statement(&bad, &meeting_row()),
            Err(StoreError::InvalidIdentifier(_))
        ));
    }
}
