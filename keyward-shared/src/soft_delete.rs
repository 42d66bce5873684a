/// Soft-delete policy
///
/// Rows are never physically removed. Deleting an entity stamps
/// `deleted_at`, after which every ordinary read skips it. Deletion never
/// cascades: tombstoning a developer leaves its users, tokens and memberships
/// exactly as they were, and each of those reads filters its own
/// `deleted_at` independently.

use chrono::Utc;
use uuid::Uuid;

use crate::db::record::Record;
use crate::db::store::Transaction;
use crate::error::{CoreError, CoreResult};

/// Tombstone state of a record
pub trait SoftDelete {
    fn is_deleted(&self) -> bool;
}

impl<R: Record> SoftDelete for R {
    fn is_deleted(&self) -> bool {
        self.deleted_at().is_some()
    }
}

/// Tombstones the live row `id` inside `tx`
///
/// Fails with NotFound when the row is absent or already tombstoned.
pub async fn tombstone<R: Record, T: Transaction>(tx: &mut T, id: Uuid) -> CoreResult<R> {
    let mut record = tx
        .fetch_for_update::<R>(id)
        .await?
        .ok_or_else(|| CoreError::not_found(R::KIND, id))?;

    let now = Utc::now();
    record.set_updated_at(now);
    record.set_deleted_at(now);

    tx.update(&record)
        .await?
        .ok_or_else(|| CoreError::not_found(R::KIND, id))
}
