//! Unit discovery for a plain PostgreSQL source.

use sqlx::PgPool;

use crate::db::discovery;
use crate::error::Result;
use crate::models::unit::BackupUnit;

/// Every user table, each with the fingerprint observed right now.
pub async fn discover(pool: &PgPool) -> Result<Vec<BackupUnit>> {
    let tables = discovery::plain_tables(pool).await?;
    let mut units = Vec::with_capacity(tables.len());
    for table in tables {
        let fingerprint = discovery::fingerprint(pool, &table).await?;
        units.push(BackupUnit::table(&table, fingerprint));
    }
    Ok(units)
}
