/// Storage contract shared by every entity
///
/// A [`Record`] describes how an entity maps onto a table: its name, its primary
/// key column, the column sets that must stay unique, and the values of every
/// column in insert order. Both store backends drive their SQL (or in-memory
/// bookkeeping) entirely from this description, so an entity never carries
/// backend-specific query code.
///
/// # Timestamps
///
/// Every table has `created_at`, `updated_at` and a nullable `deleted_at`.
/// Records own those values; the store writes whatever the record holds.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value as JsonValue;
use sqlx::postgres::PgRow;
use uuid::Uuid;

use crate::models::EntityKind;

/// A single column value, typed for binding
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Uuid(Uuid),
    Text(String),
    OptionalText(Option<String>),
    Bool(bool),
    Timestamp(DateTime<Utc>),
    OptionalTimestamp(Option<DateTime<Utc>>),
}

impl ColumnValue {
    /// JSON form of the value, identical to how serde renders the same field
    pub fn to_json(&self) -> JsonValue {
        match self {
            ColumnValue::Uuid(v) => JsonValue::String(v.to_string()),
            ColumnValue::Text(v) => JsonValue::String(v.clone()),
            ColumnValue::OptionalText(v) => v
                .as_ref()
                .map(|s| JsonValue::String(s.clone()))
                .unwrap_or(JsonValue::Null),
            ColumnValue::Bool(v) => JsonValue::Bool(*v),
            ColumnValue::Timestamp(v) => serde_json::to_value(v).unwrap_or(JsonValue::Null),
            ColumnValue::OptionalTimestamp(v) => serde_json::to_value(v).unwrap_or(JsonValue::Null),
        }
    }
}

impl From<Uuid> for ColumnValue {
    fn from(value: Uuid) -> Self {
        ColumnValue::Uuid(value)
    }
}

impl From<String> for ColumnValue {
    fn from(value: String) -> Self {
        ColumnValue::Text(value)
    }
}

impl From<&str> for ColumnValue {
    fn from(value: &str) -> Self {
        ColumnValue::Text(value.to_string())
    }
}

impl From<bool> for ColumnValue {
    fn from(value: bool) -> Self {
        ColumnValue::Bool(value)
    }
}

impl From<Option<String>> for ColumnValue {
    fn from(value: Option<String>) -> Self {
        ColumnValue::OptionalText(value)
    }
}

impl From<DateTime<Utc>> for ColumnValue {
    fn from(value: DateTime<Utc>) -> Self {
        ColumnValue::Timestamp(value)
    }
}

impl From<Option<DateTime<Utc>>> for ColumnValue {
    fn from(value: Option<DateTime<Utc>>) -> Self {
        ColumnValue::OptionalTimestamp(value)
    }
}

/// An entity persisted in its own table
///
/// Serde field names must equal column names: the in-memory backend stores
/// rows as JSON objects and filters on those keys.
pub trait Record:
    Serialize
    + DeserializeOwned
    + for<'r> sqlx::FromRow<'r, PgRow>
    + Clone
    + Send
    + Sync
    + Unpin
    + 'static
{
    /// Entity kind, used in errors and logs
    const KIND: EntityKind;

    /// Table name
    const TABLE: &'static str;

    /// Primary key column
    const ID_COLUMN: &'static str = "id";

    /// Column sets with a UNIQUE constraint (tombstoned rows included)
    const UNIQUE: &'static [&'static [&'static str]] = &[];

    /// Primary key value
    fn id(&self) -> Uuid;

    fn created_at(&self) -> DateTime<Utc>;

    fn deleted_at(&self) -> Option<DateTime<Utc>>;

    fn set_updated_at(&mut self, at: DateTime<Utc>);

    fn set_deleted_at(&mut self, at: DateTime<Utc>);

    /// Every column with its current value, primary key first
    fn columns(&self) -> Vec<(&'static str, ColumnValue)>;
}

/// Implements the timestamp accessors of [`Record`] for structs with the
/// standard `created_at` / `updated_at` / `deleted_at` fields
macro_rules! record_timestamps {
    () => {
        fn created_at(&self) -> chrono::DateTime<chrono::Utc> {
            self.created_at
        }

        fn deleted_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
            self.deleted_at
        }

        fn set_updated_at(&mut self, at: chrono::DateTime<chrono::Utc>) {
            self.updated_at = at;
        }

        fn set_deleted_at(&mut self, at: chrono::DateTime<chrono::Utc>) {
            self.deleted_at = Some(at);
        }
    };
}

pub(crate) use record_timestamps;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_value_json_matches_serde() {
        let id = Uuid::new_v4();
        assert_eq!(
            ColumnValue::from(id).to_json(),
            serde_json::to_value(id).unwrap()
        );

        let now = Utc::now();
        assert_eq!(
            ColumnValue::from(now).to_json(),
            serde_json::to_value(now).unwrap()
        );

        assert_eq!(ColumnValue::from(None::<String>).to_json(), JsonValue::Null);
        assert_eq!(ColumnValue::from(true).to_json(), JsonValue::Bool(true));
    }
}
