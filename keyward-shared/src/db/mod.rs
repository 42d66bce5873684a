/// Persistence layer
///
/// # Modules
///
/// - `record`: the [`Record`](record::Record) contract every entity implements
/// - `filter`: row filters and tombstone visibility
/// - `store`: the [`Store`](store::Store) / [`Transaction`](store::Transaction) traits
/// - `postgres`: PostgreSQL backend (sqlx)
/// - `memory`: in-process backend
/// - `pool`: connection pool management
/// - `migrations`: embedded schema migrations

pub mod filter;
pub mod memory;
pub mod migrations;
pub mod pool;
pub mod postgres;
pub mod record;
pub mod store;
