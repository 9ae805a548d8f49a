//! Database access layer
//!
//! The pipeline only needs three operations from the database: listing table
//! names, listing column names, and running an arbitrary SQL statement. They
//! sit behind the [`Database`] trait so tests can substitute an in-memory
//! fake for the Postgres backend.

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

mod postgres;

pub use postgres::PgDatabase;

/// One row of a query result, keyed by column name in select order.
pub type ResultRow = Map<String, Value>;

/// Data-access errors
#[derive(Error, Debug)]
pub enum DbError {
    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("database configuration error: {0}")]
    Config(String),

    /// Backend-agnostic failure, used by non-Postgres implementations.
    #[error("{0}")]
    Backend(String),
}

/// Narrow seam over the spatial database.
///
/// Generated SQL is untrusted input to `run_sql`; a future safety layer
/// (statement allow-list, read-only transaction) belongs inside an
/// implementation of this trait, not in the orchestrator.
#[async_trait]
pub trait Database: Send + Sync {
    /// List table names visible in `schema`, in the catalog's order.
    async fn table_names(&self, schema: &str) -> Result<Vec<String>, DbError>;

    /// List column names of `schema`.`table` in native column order.
    async fn column_names(&self, schema: &str, table: &str) -> Result<Vec<String>, DbError>;

    /// Execute an arbitrary SQL statement and return its rows unmodified.
    async fn run_sql(&self, sql: &str) -> Result<Vec<ResultRow>, DbError>;
}
