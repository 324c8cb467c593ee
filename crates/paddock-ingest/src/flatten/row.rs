//! Self-describing flat rows
//!
//! A flattened row carries its own column set, so the persistence gateway
//! never needs a hardcoded column list per call site. Values are typed so a
//! null still knows which SQL type it binds as.

use chrono::{DateTime, NaiveDate, Utc};

/// A single typed SQL value, nullable in every variant
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(Option<String>),
    Int(Option<i64>),
    Float(Option<f64>),
    Bool(Option<bool>),
    Timestamp(Option<DateTime<Utc>>),
    Date(Option<NaiveDate>),
}

impl SqlValue {
    pub fn text(value: Option<impl Into<String>>) -> Self {
        Self::Text(value.map(Into::into))
    }

    pub fn is_null(&self) -> bool {
        match self {
            Self::Text(v) => v.is_none(),
            Self::Int(v) => v.is_none(),
            Self::Float(v) => v.is_none(),
            Self::Bool(v) => v.is_none(),
            Self::Timestamp(v) => v.is_none(),
            Self::Date(v) => v.is_none(),
        }
    }
}

/// One flat relational row: ordered (column, value) pairs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(&'static str, SqlValue)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, column: &'static str, value: SqlValue) {
        self.columns.push((column, value));
    }

    pub fn columns(&self) -> &[(&'static str, SqlValue)] {
        &self.columns
    }

    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_preserves_insertion_order() {
        let mut row = Row::new();
        row.push("b", SqlValue::Int(Some(2)));
        row.push("a", SqlValue::Int(Some(1)));

        let names: Vec<_> = row.columns().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn get_finds_column_by_name() {
        let mut row = Row::new();
        row.push("meeting_id", SqlValue::text(Some("m1")));

        assert_eq!(
            row.get("meeting_id"),
            Some(&SqlValue::Text(Some("m1".to_string())))
        );
        assert!(row.get("missing").is_none());
    }

    #[test]
    fn typed_nulls_report_null() {
        assert!(SqlValue::Int(None).is_null());
        assert!(!SqlValue::Float(Some(1.5)).is_null());
    }
}
