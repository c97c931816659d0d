use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;

use crate::config::DbConfig;

/// Discovery and fingerprint queries run sequentially, but diff, full and
/// schema runs can overlap, so the pool holds a few connections.
pub async fn create_pool(db: &DbConfig) -> Result<PgPool, sqlx::Error> {
    let options = PgConnectOptions::new()
        .host(&db.host)
        .port(db.port)
        .username(&db.user)
        .password(&db.pass)
        .database(&db.name);

    PgPoolOptions::new()
        .max_connections(4)
        .connect_with(options)
        .await
}
