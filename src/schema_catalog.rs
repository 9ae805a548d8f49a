//! Schema introspection
//!
//! Discovers the current table/column layout of the target schema from the
//! database catalog. There is no caching here: every call re-queries the
//! database so schema changes show up promptly. The cost is paid once per
//! query-cache miss upstream.

use crate::db::{Database, DbError};

/// Table reserved for dataset bookkeeping; never exposed to the model.
pub const RESERVED_METADATA_TABLE: &str = "metadata";

/// One table and its columns, in native column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableColumns {
    pub name: String,
    pub columns: Vec<String>,
}

/// Snapshot of the target schema's layout, in introspection order.
///
/// Rebuilt fresh on every translation cache miss; never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaMap {
    tables: Vec<TableColumns>,
}

impl SchemaMap {
    pub fn tables(&self) -> &[TableColumns] {
        &self.tables
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Render one description line per table, e.g.
    /// `Table **roads**: id, name, width`.
    pub fn describe(&self) -> String {
        self.tables
            .iter()
            .map(|table| format!("Table **{}**: {}", table.name, table.columns.join(", ")))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Build a [`SchemaMap`] for `schema`, excluding the reserved metadata table.
///
/// Any catalog query failure propagates as-is; no partial map is returned.
pub async fn introspect(db: &dyn Database, schema: &str) -> Result<SchemaMap, DbError> {
    let mut tables = Vec::new();

    for name in db.table_names(schema).await? {
        if name == RESERVED_METADATA_TABLE {
            continue;
        }
        let columns = db.column_names(schema, &name).await?;
        tables.push(TableColumns { name, columns });
    }

    Ok(SchemaMap { tables })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::db::ResultRow;

    struct FakeDb {
        tables: Vec<(&'static str, Vec<&'static str>)>,
        fail_on_columns: bool,
    }

    #[async_trait]
    impl Database for FakeDb {
        async fn table_names(&self, _schema: &str) -> Result<Vec<String>, DbError> {
            Ok(self.tables.iter().map(|(name, _)| name.to_string()).collect())
        }

        async fn column_names(&self, _schema: &str, table: &str) -> Result<Vec<String>, DbError> {
            if self.fail_on_columns {
                return Err(DbError::Backend("catalog unavailable".to_string()));
            }
            Ok(self
                .tables
                .iter()
                .find(|(name, _)| *name == table)
                .map(|(_, cols)| cols.iter().map(|c| c.to_string()).collect())
                .unwrap_or_default())
        }

        async fn run_sql(&self, _sql: &str) -> Result<Vec<ResultRow>, DbError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn excludes_reserved_metadata_table() {
        let db = FakeDb {
            tables: vec![
                ("roads", vec!["id", "name", "width"]),
                ("metadata", vec!["key", "value"]),
                ("parks", vec!["id", "geom"]),
            ],
            fail_on_columns: false,
        };

        let map = introspect(&db, "gis").await.unwrap();
        let names: Vec<&str> = map.tables().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["roads", "parks"]);
    }

    #[tokio::test]
    async fn preserves_table_and_column_order() {
        let db = FakeDb {
            tables: vec![
                ("roads", vec!["id", "name", "width"]),
                ("parks", vec!["id", "geom"]),
            ],
            fail_on_columns: false,
        };

        let map = introspect(&db, "gis").await.unwrap();
        assert_eq!(map.tables()[0].columns, vec!["id", "name", "width"]);
        assert_eq!(
            map.describe(),
            "Table **roads**: id, name, width\nTable **parks**: id, geom"
        );
    }

    #[tokio::test]
    async fn propagates_catalog_failures_without_partial_map() {
        let db = FakeDb {
            tables: vec![("roads", vec!["id"])],
            fail_on_columns: true,
        };

        assert!(introspect(&db, "gis").await.is_err());
    }

    #[tokio::test]
    async fn empty_schema_yields_empty_description() {
        let db = FakeDb {
            tables: vec![],
            fail_on_columns: false,
        };

        let map = introspect(&db, "gis").await.unwrap();
        assert!(map.is_empty());
        assert_eq!(map.describe(), "");
    }
}
