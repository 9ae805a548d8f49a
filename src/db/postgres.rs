use std::env;

use async_trait::async_trait;
use serde_json::Value;
use tokio_postgres::{Client, NoTls, SimpleQueryMessage};

use super::{Database, DbError, ResultRow};

/// PostGIS-enabled Postgres backend.
///
/// Holds a single long-lived connection shared by every request; the client
/// serializes access internally.
pub struct PgDatabase {
    client: Client,
}

fn require_env_var(key: &str) -> Result<String, DbError> {
    env::var(key).map_err(|_| DbError::Config(format!("missing environment variable {}", key)))
}

impl PgDatabase {
    /// Connect using the `PG_*` environment variables.
    pub async fn connect_from_env() -> Result<Self, DbError> {
        let host = require_env_var("PG_HOST")?;
        let port: u16 = require_env_var("PG_PORT")?
            .parse()
            .map_err(|e| DbError::Config(format!("invalid PG_PORT: {}", e)))?;
        let user = require_env_var("PG_USER")?;
        let password = require_env_var("PG_PASS")?;
        let dbname = require_env_var("PG_DB")?;

        let mut pg_config = tokio_postgres::Config::new();
        pg_config
            .host(&host)
            .port(port)
            .user(&user)
            .password(&password)
            .dbname(&dbname);

        let (client, connection) = pg_config.connect(NoTls).await?;

        // The connection object drives the socket; it must be polled for the
        // client to make progress.
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                log::error!("postgres connection error: {}", e);
            }
        });

        log::info!("Connected to postgres database '{}' on {}:{}", dbname, host, port);

        Ok(Self { client })
    }
}

#[async_trait]
impl Database for PgDatabase {
    async fn table_names(&self, schema: &str) -> Result<Vec<String>, DbError> {
        let rows = self
            .client
            .query(
                "SELECT table_name::text
                 FROM information_schema.tables
                 WHERE table_schema = $1",
                &[&schema],
            )
            .await?;

        Ok(rows.iter().map(|row| row.get(0)).collect())
    }

    async fn column_names(&self, schema: &str, table: &str) -> Result<Vec<String>, DbError> {
        let rows = self
            .client
            .query(
                "SELECT column_name::text
                 FROM information_schema.columns
                 WHERE table_schema = $1
                 AND table_name = $2
                 ORDER BY ordinal_position",
                &[&schema, &table],
            )
            .await?;

        Ok(rows.iter().map(|row| row.get(0)).collect())
    }

    async fn run_sql(&self, sql: &str) -> Result<Vec<ResultRow>, DbError> {
        // The simple-query protocol takes the statement as-is and returns
        // every value as text, which sidesteps per-type decoding for SQL we
        // did not write ourselves.
        let messages = self.client.simple_query(sql).await?;

        let mut rows = Vec::new();
        for message in messages {
            if let SimpleQueryMessage::Row(row) = message {
                let mut record = ResultRow::new();
                for (idx, column) in row.columns().iter().enumerate() {
                    let value = match row.try_get(idx)? {
                        Some(text) => Value::String(text.to_string()),
                        None => Value::Null,
                    };
                    record.insert(column.name().to_string(), value);
                }
                rows.push(record);
            }
        }

        Ok(rows)
    }
}
