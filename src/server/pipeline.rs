//! Translation orchestrator and query executor
//!
//! [`SearchPipeline::translate`] composes cache lookup, schema introspection,
//! prompting, generation, and sanitation into one request/response unit.
//! [`SearchPipeline::search`] runs the translated statement and keeps
//! execution failures distinct from translation failures, so callers can tell
//! "could not translate" apart from "translated but the statement is invalid".

use std::sync::Arc;

use thiserror::Error;

use crate::db::{Database, DbError, ResultRow};
use crate::llm::{sanitize::clean_sql_response, LlmError, TextModel};
use crate::prompt;
use crate::schema_catalog;

use super::query_cache::QueryCache;

/// Failure while turning a natural-language query into SQL
#[derive(Error, Debug)]
pub enum TranslateError {
    #[error("schema introspection failed: {0}")]
    Introspection(#[source] DbError),

    #[error("SQL generation failed: {0}")]
    Generation(#[source] LlmError),

    #[error("model returned an empty response")]
    EmptyResponse,
}

/// Failure anywhere in the search request
#[derive(Error, Debug)]
pub enum SearchError {
    #[error(transparent)]
    Translation(#[from] TranslateError),

    #[error("query execution failed: {0}")]
    Execution(#[source] DbError),
}

/// The whole NL-to-rows pipeline behind one handle.
///
/// The database, model, and cache are process-wide singletons constructed at
/// startup and shared across requests.
pub struct SearchPipeline {
    db: Arc<dyn Database>,
    model: Arc<dyn TextModel>,
    cache: Arc<QueryCache>,
    schema: String,
}

impl SearchPipeline {
    pub fn new(
        db: Arc<dyn Database>,
        model: Arc<dyn TextModel>,
        cache: Arc<QueryCache>,
        schema: String,
    ) -> Self {
        Self {
            db,
            model,
            cache,
            schema,
        }
    }

    /// Translate a natural-language query into a SQL string.
    ///
    /// A live cache entry is returned without touching the database or the
    /// model. On a miss the schema is re-introspected, the model is invoked
    /// exactly once (plus configured retries inside the client), the response
    /// is sanitized, and the result is cached under the original raw query
    /// string. Nothing is cached on failure.
    pub async fn translate(&self, query: &str) -> Result<String, TranslateError> {
        if let Some(sql) = self.cache.get(query) {
            log::debug!("query cache HIT");
            return Ok(sql);
        }
        log::debug!("query cache MISS");

        let schema_map = schema_catalog::introspect(self.db.as_ref(), &self.schema)
            .await
            .map_err(|e| {
                log::error!("schema introspection failed: {}", e);
                TranslateError::Introspection(e)
            })?;

        let prompt = prompt::sql_generation_prompt(&self.schema, &schema_map, query);

        let raw = self.model.generate(&prompt).await.map_err(|e| {
            log::error!("SQL generation failed: {}", e);
            TranslateError::Generation(e)
        })?;

        let sql = clean_sql_response(&raw);
        if sql.is_empty() {
            log::error!("model returned an empty response");
            return Err(TranslateError::EmptyResponse);
        }

        log::debug!("generated SQL: {}", sql);
        self.cache.insert(query, &sql);

        Ok(sql)
    }

    /// Translate `query` and execute the resulting statement.
    ///
    /// When execution of the translated statement fails, the cache entry for
    /// the query is dropped so a retry re-translates instead of replaying a
    /// statement known to be broken.
    pub async fn search(&self, query: &str) -> Result<Vec<ResultRow>, SearchError> {
        let sql = self.translate(query).await?;

        match self.db.run_sql(&sql).await {
            Ok(rows) => Ok(rows),
            Err(e) => {
                log::error!("execution of generated SQL failed: {}", e);
                self.cache.remove(query);
                Err(SearchError::Execution(e))
            }
        }
    }
}
