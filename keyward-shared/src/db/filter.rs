/// Row filters understood by every store backend
///
/// Filters are conjunctions of equality tests plus a visibility switch. By
/// default only live rows (`deleted_at IS NULL`) match; history reads opt in
/// to tombstoned rows explicitly.
///
/// # Example
///
/// ```
/// use keyward_shared::db::filter::Filter;
/// use uuid::Uuid;
///
/// let user_id = Uuid::new_v4();
/// let filter = Filter::live().eq("user_id", user_id);
/// assert_eq!(filter.conditions.len(), 1);
/// ```

use serde_json::Value as JsonValue;
use uuid::Uuid;

use super::record::ColumnValue;

/// Which rows a read may see
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    /// Only rows without a tombstone
    #[default]
    Live,

    /// Tombstoned rows too (history queries)
    IncludeDeleted,
}

/// A single condition on a column
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `column = value`
    Eq(&'static str, ColumnValue),

    /// `column = ANY(ids)`
    AnyOf(&'static str, Vec<Uuid>),
}

/// Conjunction of conditions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub visibility: Visibility,
    pub conditions: Vec<Condition>,
}

impl Filter {
    /// Matches every live row
    pub fn live() -> Self {
        Self::default()
    }

    /// Matches live and tombstoned rows
    pub fn with_deleted() -> Self {
        Self {
            visibility: Visibility::IncludeDeleted,
            conditions: Vec::new(),
        }
    }

    /// Adds an equality condition
    pub fn eq(mut self, column: &'static str, value: impl Into<ColumnValue>) -> Self {
        self.conditions.push(Condition::Eq(column, value.into()));
        self
    }

    /// Adds a membership condition on a UUID column
    pub fn any_of(mut self, column: &'static str, ids: Vec<Uuid>) -> Self {
        self.conditions.push(Condition::AnyOf(column, ids));
        self
    }

    /// Evaluates the filter against a row stored as a JSON object
    pub fn matches(&self, row: &JsonValue) -> bool {
        if self.visibility == Visibility::Live && !is_live(row) {
            return false;
        }

        self.conditions.iter().all(|condition| match condition {
            Condition::Eq(column, value) => row.get(*column) == Some(&value.to_json()),
            Condition::AnyOf(column, ids) => row
                .get(*column)
                .and_then(JsonValue::as_str)
                .and_then(|s| Uuid::parse_str(s).ok())
                .map_or(false, |id| ids.contains(&id)),
        })
    }
}

/// Whether a JSON row carries no tombstone
pub fn is_live(row: &JsonValue) -> bool {
    row.get("deleted_at").map_or(true, JsonValue::is_null)
}
