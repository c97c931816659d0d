//! Unit discovery for a TimescaleDB source.
//!
//! Two-level: regular tables first, then each hypertable decomposed into
//! its chunks. A hypertable's chunk list is collected in full (ascending by
//! partition start) before any of its chunks are turned into units.

use sqlx::PgPool;

use crate::db::discovery;
use crate::error::Result;
use crate::models::unit::BackupUnit;

pub async fn discover(pool: &PgPool) -> Result<Vec<BackupUnit>> {
    let tables = discovery::non_hypertable_tables(pool).await?;
    let mut units = Vec::with_capacity(tables.len());
    for table in tables {
        let fingerprint = discovery::fingerprint(pool, &table).await?;
        units.push(BackupUnit::table(&table, fingerprint));
    }

    for hypertable in discovery::hypertables(pool).await? {
        let chunks = discovery::chunks(pool, &hypertable).await?;
        for chunk in chunks {
            let fingerprint = discovery::fingerprint(pool, &chunk.chunk).await?;
            units.push(BackupUnit::chunk(
                &chunk.hypertable,
                &chunk.chunk,
                &chunk.range_start,
                &chunk.range_end,
                fingerprint,
            ));
        }
    }
    Ok(units)
}
