use serde::{Deserialize, Serialize};

use crate::db::ResultRow;

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    /// Natural-language query to translate and execute
    pub query: String,
}

/// Rows answering the query, under the fixed `postgres` key.
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub postgres: Vec<ResultRow>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
