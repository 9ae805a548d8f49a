//! Geosearch - natural-language search over a PostGIS database
//!
//! This crate turns a plain-text question into a SQL statement and runs it:
//! - Live schema introspection over `information_schema`
//! - Prompt construction for a generative model
//! - Response sanitation (code-fence stripping)
//! - Per-query caching of generated SQL with a TTL
//! - Execution against the spatial database

pub mod config;
pub mod db;
pub mod llm;
pub mod prompt;
pub mod schema_catalog;
pub mod server;
