/// PostgreSQL store backend
///
/// Queries are assembled with [`sqlx::QueryBuilder`] from the [`Record`]
/// description of each entity. Table and column names come from compile-time
/// constants; every value is bound as a parameter.
///
/// # Isolation
///
/// Each [`PgTransaction`] wraps one database transaction. `fetch_for_update`
/// issues `SELECT ... FOR UPDATE`, so two transactions touching the same row
/// (for example concurrent token regenerations) serialize on the row lock and
/// each observes the other's committed write.
///
/// # Example
///
/// ```no_run
/// use keyward_shared::db::pool::{create_pool, DatabaseConfig};
/// use keyward_shared::db::postgres::PgStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig {
///     url: std::env::var("DATABASE_URL")?,
///     ..Default::default()
/// })
/// .await?;
/// let store = PgStore::new(pool);
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;
use uuid::Uuid;

use super::filter::{Condition, Filter, Visibility};
use super::record::{ColumnValue, Record};
use super::store::{Store, StoreError, StoreResult, Transaction};

/// Store backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying pool (for migrations and health checks)
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// An open PostgreSQL transaction
pub struct PgTransaction {
    tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl Store for PgStore {
    type Tx = PgTransaction;

    async fn begin(&self) -> StoreResult<PgTransaction> {
        let tx = self.pool.begin().await.map_err(connection_error)?;
        Ok(PgTransaction { tx })
    }

    async fn ping(&self) -> StoreResult<()> {
        super::pool::health_check(&self.pool)
            .await
            .map_err(connection_error)
    }
}

#[async_trait]
impl Transaction for PgTransaction {
    async fn insert<R: Record>(&mut self, record: &R) -> StoreResult<R> {
        let columns = record.columns();
        let names: Vec<&str> = columns.iter().map(|(name, _)| *name).collect();

        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "INSERT INTO {} ({}) VALUES (",
            R::TABLE,
            names.join(", ")
        ));
        for (i, (_, value)) in columns.into_iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            push_value(&mut qb, value);
        }
        qb.push(") RETURNING *");

        debug!(table = R::TABLE, "insert");
        qb.build_query_as::<R>()
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| write_error::<R>(e))
    }

    async fn update<R: Record>(&mut self, record: &R) -> StoreResult<Option<R>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("UPDATE {} SET ", R::TABLE));
        let assignments = record
            .columns()
            .into_iter()
            .filter(|(name, _)| *name != R::ID_COLUMN);
        for (i, (name, value)) in assignments.enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            qb.push(name).push(" = ");
            push_value(&mut qb, value);
        }
        qb.push(" WHERE ")
            .push(R::ID_COLUMN)
            .push(" = ")
            .push_bind(record.id())
            .push(" AND deleted_at IS NULL RETURNING *");

        debug!(table = R::TABLE, id = %record.id(), "update");
        qb.build_query_as::<R>()
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| write_error::<R>(e))
    }

    async fn fetch<R: Record>(&mut self, id: Uuid) -> StoreResult<Option<R>> {
        fetch_live::<R>(&mut self.tx, id, false).await
    }

    async fn fetch_for_update<R: Record>(&mut self, id: Uuid) -> StoreResult<Option<R>> {
        fetch_live::<R>(&mut self.tx, id, true).await
    }

    async fn select<R: Record>(&mut self, filter: &Filter) -> StoreResult<Vec<R>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT * FROM {} WHERE TRUE", R::TABLE));
        if filter.visibility == Visibility::Live {
            qb.push(" AND deleted_at IS NULL");
        }
        for condition in &filter.conditions {
            match condition {
                Condition::Eq(column, value) => {
                    qb.push(" AND ").push(*column).push(" = ");
                    push_value(&mut qb, value.clone());
                }
                Condition::AnyOf(column, ids) => {
                    qb.push(" AND ")
                        .push(*column)
                        .push(" = ANY(")
                        .push_bind(ids.clone())
                        .push(")");
                }
            }
        }
        qb.push(" ORDER BY created_at, ").push(R::ID_COLUMN);

        qb.build_query_as::<R>()
            .fetch_all(&mut *self.tx)
            .await
            .map_err(connection_error)
    }

    async fn commit(self) -> StoreResult<()> {
        self.tx.commit().await.map_err(connection_error)
    }
}

async fn fetch_live<R: Record>(
    tx: &mut sqlx::Transaction<'static, Postgres>,
    id: Uuid,
    lock: bool,
) -> StoreResult<Option<R>> {
    let mut qb = QueryBuilder::<Postgres>::new(format!(
        "SELECT * FROM {} WHERE {} = ",
        R::TABLE,
        R::ID_COLUMN
    ));
    qb.push_bind(id).push(" AND deleted_at IS NULL");
    if lock {
        qb.push(" FOR UPDATE");
    }

    qb.build_query_as::<R>()
        .fetch_optional(&mut **tx)
        .await
        .map_err(connection_error)
}

fn push_value(qb: &mut QueryBuilder<'static, Postgres>, value: ColumnValue) {
    match value {
        ColumnValue::Uuid(v) => qb.push_bind(v),
        ColumnValue::Text(v) => qb.push_bind(v),
        ColumnValue::OptionalText(v) => qb.push_bind(v),
        ColumnValue::Bool(v) => qb.push_bind(v),
        ColumnValue::Timestamp(v) => qb.push_bind(v),
        ColumnValue::OptionalTimestamp(v) => qb.push_bind(v),
    };
}

/// Maps errors of INSERT/UPDATE statements, recognising constraint violations
fn write_error<R: Record>(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        let constraint = db_err.constraint().unwrap_or_default().to_string();

        if db_err.is_unique_violation() {
            return StoreError::UniqueViolation {
                kind: R::KIND,
                field: field_from_constraint(R::TABLE, &constraint),
            };
        }

        if db_err.is_foreign_key_violation() {
            return StoreError::ForeignKeyViolation {
                kind: R::KIND,
                constraint,
            };
        }
    }

    connection_error(err)
}

fn connection_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(err.to_string())
        }
        other => StoreError::Database(other),
    }
}

/// Extracts the column part of a default PostgreSQL constraint name
///
/// `organizations_name_key` on table `organizations` yields `name`.
fn field_from_constraint(table: &str, constraint: &str) -> String {
    constraint
        .strip_prefix(table)
        .and_then(|rest| rest.strip_prefix('_'))
        .and_then(|rest| rest.strip_suffix("_key"))
        .unwrap_or(constraint)
        .to_string()
}
