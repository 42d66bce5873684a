/// Store and transaction traits
///
/// Every component receives a [`Store`] by value (stores are cheap handles
/// around a pool or shared map) and opens a [`Transaction`] per operation.
/// Nothing is written until [`Transaction::commit`]; dropping a transaction
/// discards its writes.
///
/// # Backends
///
/// - [`PgStore`](super::postgres::PgStore): PostgreSQL via sqlx
/// - [`MemoryStore`](super::memory::MemoryStore): in-process, for tests and
///   local runs
///
/// # Example
///
/// ```no_run
/// use keyward_shared::db::memory::MemoryStore;
/// use keyward_shared::db::store::{Store, Transaction};
/// use keyward_shared::models::organization::{NewOrganization, Organization};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
/// let mut tx = store.begin().await?;
/// let org = tx.insert(&Organization::new(NewOrganization { name: "Acme".into() })).await?;
/// tx.commit().await?;
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use uuid::Uuid;

use super::filter::Filter;
use super::record::Record;
use crate::models::EntityKind;

/// Errors raised by store backends
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A UNIQUE constraint rejected the write
    #[error("unique constraint violated for {kind}: {field}")]
    UniqueViolation { kind: EntityKind, field: String },

    /// A FOREIGN KEY constraint rejected the write
    #[error("foreign key constraint violated for {kind}: {constraint}")]
    ForeignKeyViolation { kind: EntityKind, constraint: String },

    /// The backend cannot be reached
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A stored row could not be converted to or from its record type
    #[error("row conversion failed: {0}")]
    Conversion(String),

    /// Any other database failure
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// A handle to a relational store
#[async_trait]
pub trait Store: Clone + Send + Sync + 'static {
    type Tx: Transaction;

    /// Opens a transaction
    async fn begin(&self) -> StoreResult<Self::Tx>;

    /// Checks the backend is reachable
    async fn ping(&self) -> StoreResult<()>;
}

/// One atomic unit of work
///
/// Reads inside a transaction see its own uncommitted writes. Only
/// [`Transaction::update`] and [`Transaction::fetch`] variants address rows by
/// primary key; everything else goes through [`Filter`].
#[async_trait]
pub trait Transaction: Send + Sized {
    /// Inserts a new row and returns it as stored
    async fn insert<R: Record>(&mut self, record: &R) -> StoreResult<R>;

    /// Overwrites every column of a live row
    ///
    /// Returns `None` when no live row has the record's id; tombstoned rows
    /// are never updated.
    async fn update<R: Record>(&mut self, record: &R) -> StoreResult<Option<R>>;

    /// Fetches a live row by primary key
    async fn fetch<R: Record>(&mut self, id: Uuid) -> StoreResult<Option<R>>;

    /// Fetches a live row by primary key and locks it until commit
    async fn fetch_for_update<R: Record>(&mut self, id: Uuid) -> StoreResult<Option<R>>;

    /// Rows matching a filter, oldest first
    async fn select<R: Record>(&mut self, filter: &Filter) -> StoreResult<Vec<R>>;

    /// First row matching a filter
    async fn select_one<R: Record>(&mut self, filter: &Filter) -> StoreResult<Option<R>> {
        Ok(self.select::<R>(filter).await?.into_iter().next())
    }

    /// Makes every write of this transaction durable
    async fn commit(self) -> StoreResult<()>;
}
