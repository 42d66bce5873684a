/// In-memory store backend
///
/// Rows are kept as JSON objects keyed by table and primary key. A transaction
/// holds the store's write lock for its whole lifetime and works on a staged
/// copy of the tables, so transactions are fully serialized and a dropped
/// transaction leaves no trace.
///
/// Unique constraints declared by [`Record::UNIQUE`] are enforced over all
/// rows, tombstoned ones included, mirroring the column-level constraints of
/// the SQL schema. Foreign keys are not checked here; the services validate
/// parents before writing.
///
/// # Example
///
/// ```
/// use keyward_shared::db::memory::MemoryStore;
/// use keyward_shared::db::store::{Store, Transaction};
/// use keyward_shared::models::organization::{NewOrganization, Organization};
///
/// # #[tokio::main]
/// # async fn main() {
/// let store = MemoryStore::new();
/// let org = Organization::new(NewOrganization { name: "Acme".into() });
///
/// let mut tx = store.begin().await.unwrap();
/// tx.insert(&org).await.unwrap();
/// tx.commit().await.unwrap();
///
/// let mut tx = store.begin().await.unwrap();
/// let found = tx.fetch::<Organization>(org.id).await.unwrap();
/// assert_eq!(found, Some(org));
/// # }
/// ```

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};
use uuid::Uuid;

use super::filter::{is_live, Filter};
use super::record::Record;
use super::store::{Store, StoreError, StoreResult, Transaction};

type Table = BTreeMap<Uuid, JsonValue>;

static NULL: JsonValue = JsonValue::Null;

#[derive(Debug, Clone, Default)]
struct Tables {
    rows: HashMap<&'static str, Table>,
}

/// Store keeping every table in process memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent operation fail as if the backend were down
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of rows in a table, tombstoned rows included
    pub async fn row_count(&self, table: &str) -> usize {
        self.tables
            .read()
            .await
            .rows
            .get(table)
            .map_or(0, BTreeMap::len)
    }
}

/// A serialized unit of work over the in-memory tables
pub struct MemoryTransaction {
    guard: OwnedRwLockWriteGuard<Tables>,
    staged: Tables,
    unavailable: Arc<AtomicBool>,
}

impl MemoryTransaction {
    fn ensure_available(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store marked unavailable".to_string()));
        }
        Ok(())
    }

    fn table<R: Record>(&mut self) -> &mut Table {
        self.staged.rows.entry(R::TABLE).or_default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    type Tx = MemoryTransaction;

    async fn begin(&self) -> StoreResult<MemoryTransaction> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store marked unavailable".to_string()));
        }

        let guard = self.tables.clone().write_owned().await;
        let staged = (*guard).clone();
        Ok(MemoryTransaction {
            guard,
            staged,
            unavailable: self.unavailable.clone(),
        })
    }

    async fn ping(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store marked unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Transaction for MemoryTransaction {
    async fn insert<R: Record>(&mut self, record: &R) -> StoreResult<R> {
        self.ensure_available()?;
        let id = record.id();
        let row = to_row(record)?;
        let table = self.table::<R>();

        if table.contains_key(&id) {
            return Err(StoreError::UniqueViolation {
                kind: R::KIND,
                field: R::ID_COLUMN.to_string(),
            });
        }
        check_unique::<R>(table, id, &row)?;

        table.insert(id, row.clone());
        from_row(row)
    }

    async fn update<R: Record>(&mut self, record: &R) -> StoreResult<Option<R>> {
        self.ensure_available()?;
        let id = record.id();
        let row = to_row(record)?;
        let table = self.table::<R>();

        if !table.get(&id).map_or(false, is_live) {
            return Ok(None);
        }
        check_unique::<R>(table, id, &row)?;

        table.insert(id, row.clone());
        from_row(row).map(Some)
    }

    async fn fetch<R: Record>(&mut self, id: Uuid) -> StoreResult<Option<R>> {
        self.ensure_available()?;
        self.table::<R>()
            .get(&id)
            .filter(|row| is_live(row))
            .cloned()
            .map(from_row)
            .transpose()
    }

    async fn fetch_for_update<R: Record>(&mut self, id: Uuid) -> StoreResult<Option<R>> {
        // The transaction already holds the exclusive lock
        self.fetch::<R>(id).await
    }

    async fn select<R: Record>(&mut self, filter: &Filter) -> StoreResult<Vec<R>> {
        self.ensure_available()?;
        let mut records = self
            .table::<R>()
            .values()
            .filter(|row| filter.matches(row))
            .cloned()
            .map(from_row::<R>)
            .collect::<StoreResult<Vec<R>>>()?;

        records.sort_by_key(|r| (r.created_at(), r.id()));
        Ok(records)
    }

    async fn commit(self) -> StoreResult<()> {
        self.ensure_available()?;
        let MemoryTransaction {
            mut guard, staged, ..
        } = self;
        *guard = staged;
        Ok(())
    }
}

fn to_row<R: Record>(record: &R) -> StoreResult<JsonValue> {
    serde_json::to_value(record).map_err(|e| StoreError::Conversion(e.to_string()))
}

fn from_row<R: Record>(row: JsonValue) -> StoreResult<R> {
    serde_json::from_value(row).map_err(|e| StoreError::Conversion(e.to_string()))
}

/// Rejects a row whose unique column set matches another row's
///
/// NULL never collides, as in SQL.
fn check_unique<R: Record>(table: &Table, id: Uuid, row: &JsonValue) -> StoreResult<()> {
    for columns in R::UNIQUE {
        let candidate: Vec<&JsonValue> = columns
            .iter()
            .map(|c| row.get(*c).unwrap_or(&NULL))
            .collect();
        if candidate.iter().any(|v| v.is_null()) {
            continue;
        }

        let clash = table
            .iter()
            .filter(|(other_id, _)| **other_id != id)
            .any(|(_, other)| {
                columns
                    .iter()
                    .zip(&candidate)
                    .all(|(c, v)| other.get(*c) == Some(*v))
            });

        if clash {
            return Err(StoreError::UniqueViolation {
                kind: R::KIND,
                field: columns.join("_"),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::organization::{NewOrganization, Organization};

    fn org(name: &str) -> Organization {
        Organization::new(NewOrganization {
            name: name.to_string(),
        })
    }

    #[tokio::test]
    async fn test_dropped_transaction_discards_writes() {
        let store = MemoryStore::new();
        let acme = org("Acme");

        {
            let mut tx = store.begin().await.unwrap();
            tx.insert(&acme).await.unwrap();
        }

        let mut tx = store.begin().await.unwrap();
        assert!(tx.fetch::<Organization>(acme.id).await.unwrap().is_none());
        let all = tx.select::<Organization>(&Filter::with_deleted()).await.unwrap();
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn test_unique_violation_includes_tombstoned_rows() {
        let store = MemoryStore::new();
        let mut first = org("Acme");

        let mut tx = store.begin().await.unwrap();
        tx.insert(&first).await.unwrap();
        first.set_deleted_at(chrono::Utc::now());
        tx.update(&first).await.unwrap();

        let err = tx.insert(&org("Acme")).await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation { ref field, .. } if field == "name"));
    }

    #[tokio::test]
    async fn test_update_ignores_tombstoned_rows() {
        let store = MemoryStore::new();
        let mut acme = org("Acme");

        let mut tx = store.begin().await.unwrap();
        tx.insert(&acme).await.unwrap();
        acme.set_deleted_at(chrono::Utc::now());
        assert!(tx.update(&acme).await.unwrap().is_some());
        assert!(tx.update(&acme).await.unwrap().is_none());
        assert!(tx.fetch::<Organization>(acme.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unavailable_store_fails() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        assert!(matches!(store.begin().await, Err(StoreError::Unavailable(_))));
        assert!(store.ping().await.is_err());

        store.set_unavailable(false);
        assert!(store.ping().await.is_ok());
    }

    #[tokio::test]
    async fn test_commit_publishes_rows() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.insert(&org("Acme")).await.unwrap();
        tx.insert(&org("Globex")).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(store.row_count(Organization::TABLE).await, 2);
    }
}
