//! Prompt construction for SQL generation
//!
//! Pure rendering: the same schema snapshot and query always produce a
//! byte-identical prompt.

use crate::schema_catalog::SchemaMap;

/// Render the instruction payload sent to the generative model.
pub fn sql_generation_prompt(schema: &str, schema_map: &SchemaMap, query: &str) -> String {
    let mut prompt = String::new();

    prompt.push_str("You are a SQL query generator for a geospatial search tool.\n\n");

    prompt.push_str("Important:\n");
    prompt.push_str(&format!(
        "- The tables are stored in the schema: **{}**.\n",
        schema
    ));
    prompt.push_str("- Append the schema name to the table name when referencing columns.\n");
    prompt.push_str(
        "- Select all columns from a table using the wildcard character: ***, unless \
         columns are explicitly excluded by the query below.\n",
    );
    prompt.push_str(
        "- For columns holding numeric values inside text, extract the value with a regex \
         or substring cleanup, e.g. NULLIF(regexp_replace(width, '[^0-9.]', '', 'g'), '')::decimal \
         to extract the width of a road from a string.\n",
    );
    prompt.push_str("- Cast the numeric columns to decimal or integer as necessary.\n\n");

    prompt.push_str("The database contains the following tables:\n");
    prompt.push_str(&schema_map.describe());
    prompt.push_str("\n\n");

    prompt.push_str("Your task:\n");
    prompt.push_str(
        "- Convert the following natural language query into a PostgreSQL SQL statement.\n",
    );
    prompt.push_str("- Ensure that it applies to the appropriate table.\n");
    prompt.push_str("- The SQL statement should dynamically filter based on relevant columns.\n");
    prompt.push_str("- The database is PostGIS enabled, so you can use spatial functions.\n\n");

    prompt.push_str("You may:\n");
    prompt.push_str(
        "- Join multiple tables if necessary by referencing the columns across the tables \
         and joining related tables.\n",
    );
    prompt.push_str("- Remove any irrelevant table and column references.\n");
    prompt.push_str(
        "- Convert geom fields from WKT or WKB to GeoJSON using ST_AsGeoJSON(geom). Ensure \
         to alias the column as geojson.\n\n",
    );

    prompt.push_str(
        "Return the full SQL query only as raw text. Remove language or code markers or any \
         other formatting.\n",
    );
    prompt.push_str(&format!("Query: \"{}\"", query));

    prompt
}
