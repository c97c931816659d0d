//! Database connectors.
//!
//! A connector exposes the three backup operations the scheduler drives:
//! `diff` (changed units only), `full` (whole database) and `schema`
//! (structure only). The source kind decides how units are discovered;
//! planning and execution are shared.

pub mod postgres;
pub mod timescale;

use std::path::PathBuf;

use sqlx::PgPool;

use crate::cache::TransactionCache;
use crate::config::{AppConfig, SourceKind};
use crate::error::Result;
use crate::models::unit::BackupUnit;
use crate::services::dump::{DumpMode, Dumper};
use crate::services::executor;
use crate::services::planner;
use crate::services::remote::Replicator;

pub struct Connector {
    kind: SourceKind,
    pool: PgPool,
    cache: TransactionCache,
    dumper: Dumper,
    replicator: Option<Replicator>,
    dry_run: bool,
}

impl Connector {
    pub fn new(config: &AppConfig, pool: PgPool) -> Result<Self> {
        let replicator = match &config.remote {
            Some(target) => Some(Replicator::new(target.clone())?),
            None => None,
        };
        Ok(Connector {
            kind: config.source,
            pool,
            cache: TransactionCache::new(&config.cache_dir),
            dumper: Dumper::new(config.db.clone(), config.data_dir.clone())?,
            replicator,
            dry_run: config.dry_run,
        })
    }

    pub fn replicator(&self) -> Option<&Replicator> {
        self.replicator.as_ref()
    }

    /// Incremental backup: discover the current unit universe, plan the
    /// units whose fingerprint moved, and dump each one.
    pub async fn diff(&self) -> Result<()> {
        let known = self.cache.known_units();
        let discovered = self.discover().await?;
        let total = discovered.len();
        let plan = planner::plan(&known, &self.cache, discovered);
        tracing::info!(discovered = total, planned = plan.len(), "Diff plan ready");

        executor::run_units(
            &plan,
            &self.dumper,
            self.replicator.as_ref(),
            &self.cache,
            self.dry_run,
        )
        .await
    }

    /// Unconditional whole-database dump.
    pub async fn full(&self) -> Result<PathBuf> {
        self.dump_whole(DumpMode::Full).await
    }

    /// Unconditional structure-only dump.
    pub async fn schema(&self) -> Result<PathBuf> {
        self.dump_whole(DumpMode::Schema).await
    }

    async fn discover(&self) -> Result<Vec<BackupUnit>> {
        match self.kind {
            SourceKind::Postgres => postgres::discover(&self.pool).await,
            SourceKind::Timescale => timescale::discover(&self.pool).await,
        }
    }

    async fn dump_whole(&self, mode: DumpMode) -> Result<PathBuf> {
        if self.dry_run {
            let path = self.dumper.database_artifact_path(mode);
            tracing::info!(artifact = %path.display(), "[dry-run] would dump database");
            return Ok(path);
        }
        let artifact = self.dumper.dump_database(mode).await?;
        executor::replicate(&artifact, self.replicator.as_ref()).await?;
        Ok(artifact)
    }
}
