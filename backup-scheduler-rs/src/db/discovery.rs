//! Catalog queries that enumerate backup units in the source database.

use sqlx::{PgPool, Row};

use crate::error::Result;

/// Every user table in a plain PostgreSQL database, schema-qualified.
const PLAIN_TABLES: &str = "SELECT table_schema || '.' || table_name \
     FROM information_schema.tables \
     WHERE table_schema NOT IN ('pg_catalog', 'information_schema') \
     AND table_type != 'VIEW'";

/// User tables in a TimescaleDB database that are not hypertables and not
/// part of Timescale's own catalogs. Hypertables are handled chunk by
/// chunk instead.
const NON_HYPERTABLE_TABLES: &str = "SELECT table_schema || '.' || table_name \
     FROM information_schema.tables \
     WHERE table_schema NOT LIKE '_timescaledb_%' \
     AND table_schema NOT LIKE 'timescaledb_information%' \
     AND table_schema NOT IN ('pg_catalog', 'information_schema') \
     AND table_type != 'VIEW' \
     AND table_name NOT IN (SELECT table_name FROM \"_timescaledb_catalog\".\"hypertable\")";

const HYPERTABLES: &str =
    "SELECT schema_name || '.' || table_name FROM _timescaledb_catalog.hypertable";

/// Physical chunks of one hypertable, oldest partition first.
const CHUNKS: &str = "SELECT \
       h.schema_name || '.' || h.table_name AS hypertable, \
       c.schema_name || '.' || c.table_name AS chunk, \
       to_char(to_timestamp(ds.range_start / 1000 / 1000), 'DD-MM-YYYY') AS range_start, \
       to_char(to_timestamp(ds.range_end / 1000 / 1000), 'DD-MM-YYYY') AS range_end \
     FROM \"_timescaledb_catalog\".\"hypertable\" h \
     INNER JOIN \"_timescaledb_catalog\".\"chunk\" c ON c.hypertable_id = h.id \
     INNER JOIN \"_timescaledb_catalog\".\"dimension\" d ON d.hypertable_id = c.hypertable_id \
     INNER JOIN \"_timescaledb_catalog\".\"dimension_slice\" ds ON ds.id = c.id \
     WHERE h.schema_name || '.' || h.table_name = $1 \
     ORDER BY ds.range_start ASC";

#[derive(Debug, Clone)]
pub struct ChunkRow {
    pub hypertable: String,
    pub chunk: String,
    pub range_start: String,
    pub range_end: String,
}

pub async fn plain_tables(pool: &PgPool) -> Result<Vec<String>> {
    Ok(sqlx::query_scalar(PLAIN_TABLES).fetch_all(pool).await?)
}

pub async fn non_hypertable_tables(pool: &PgPool) -> Result<Vec<String>> {
    Ok(sqlx::query_scalar(NON_HYPERTABLE_TABLES)
        .fetch_all(pool)
        .await?)
}

pub async fn hypertables(pool: &PgPool) -> Result<Vec<String>> {
    Ok(sqlx::query_scalar(HYPERTABLES).fetch_all(pool).await?)
}

pub async fn chunks(pool: &PgPool, hypertable: &str) -> Result<Vec<ChunkRow>> {
    let rows = sqlx::query(CHUNKS).bind(hypertable).fetch_all(pool).await?;
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        out.push(ChunkRow {
            hypertable: row.try_get("hypertable")?,
            chunk: row.try_get("chunk")?,
            range_start: row.try_get("range_start")?,
            range_end: row.try_get("range_end")?,
        });
    }
    Ok(out)
}

/// The unit's change fingerprint: the highest transaction id that touched
/// it, as text. An empty table produces no row and therefore no
/// fingerprint. Unit names come from the catalog queries above, never from
/// user input.
pub async fn fingerprint(pool: &PgPool, unit: &str) -> Result<Option<String>> {
    let query = format!(
        "SELECT MAX(xmin::text::bigint)::text FROM {} GROUP BY true",
        unit
    );
    let row: Option<Option<String>> = sqlx::query_scalar(&query).fetch_optional(pool).await?;
    Ok(row.flatten())
}
