/// Generic create/read/update/delete over any [`Record`]
///
/// Each function opens its own transaction and commits it before returning,
/// so every mutation is atomic. Entity services layer validation and
/// relationship checks on top; the functions here only know about rows and
/// tombstones.

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::db::filter::Filter;
use crate::db::record::Record;
use crate::db::store::{Store, Transaction};
use crate::error::{CoreError, CoreResult};
use crate::soft_delete::tombstone;

/// Persists a freshly built record
pub async fn create<S: Store, R: Record>(store: &S, record: R) -> CoreResult<R> {
    let mut tx = store.begin().await?;
    let created = tx.insert(&record).await?;
    tx.commit().await?;

    info!(entity = %R::KIND, id = %created.id(), "Created");
    Ok(created)
}

/// Live record by id
pub async fn get<S: Store, R: Record>(store: &S, id: Uuid) -> CoreResult<R> {
    let mut tx = store.begin().await?;
    tx.fetch::<R>(id)
        .await?
        .ok_or_else(|| CoreError::not_found(R::KIND, id))
}

/// Record by id, tombstoned or not
pub async fn history<S: Store, R: Record>(store: &S, id: Uuid) -> CoreResult<R> {
    let mut tx = store.begin().await?;
    tx.select_one::<R>(&Filter::with_deleted().eq(R::ID_COLUMN, id))
        .await?
        .ok_or_else(|| CoreError::not_found(R::KIND, id))
}

/// Records matching `filter`, oldest first
pub async fn list<S: Store, R: Record>(store: &S, filter: &Filter) -> CoreResult<Vec<R>> {
    let mut tx = store.begin().await?;
    let records = tx.select::<R>(filter).await?;
    debug!(entity = %R::KIND, count = records.len(), "Listed");
    Ok(records)
}

/// Locks the live record `id`, applies `change` and writes it back
pub async fn update_with<S, R, F>(store: &S, id: Uuid, change: F) -> CoreResult<R>
where
    S: Store,
    R: Record,
    F: FnOnce(&mut R) + Send,
{
    let mut tx = store.begin().await?;
    let mut record = tx
        .fetch_for_update::<R>(id)
        .await?
        .ok_or_else(|| CoreError::not_found(R::KIND, id))?;

    change(&mut record);
    record.set_updated_at(Utc::now());

    let updated = tx
        .update(&record)
        .await?
        .ok_or_else(|| CoreError::not_found(R::KIND, id))?;
    tx.commit().await?;

    info!(entity = %R::KIND, id = %id, "Updated");
    Ok(updated)
}

/// Soft-deletes the live record `id`
pub async fn delete<S: Store, R: Record>(store: &S, id: Uuid) -> CoreResult<R> {
    let mut tx = store.begin().await?;
    let deleted = tombstone::<R, _>(&mut tx, id).await?;
    tx.commit().await?;

    info!(entity = %R::KIND, id = %id, "Deleted");
    Ok(deleted)
}
