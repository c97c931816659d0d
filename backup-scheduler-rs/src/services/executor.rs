//! Drives planned units through dump, replication, and cache commit.

use std::path::Path;

use crate::cache::TransactionCache;
use crate::error::Result;
use crate::models::unit::BackupUnit;
use crate::services::dump::Dumper;
use crate::services::remote::Replicator;

/// Processes the plan in order. Each unit is dumped, optionally replicated
/// (the local artifact is removed after a successful transfer), and only
/// then committed to the cache with the fingerprint captured at discovery.
/// The first failing step aborts the remainder of the run; commits already
/// made stand, so finished units are not re-dumped next cycle.
pub async fn run_units(
    plan: &[BackupUnit],
    dumper: &Dumper,
    replicator: Option<&Replicator>,
    cache: &TransactionCache,
    dry_run: bool,
) -> Result<()> {
    for unit in plan {
        let Some(fingerprint) = unit.fingerprint.as_deref() else {
            continue;
        };

        if dry_run {
            tracing::info!(
                table = %unit.source_name,
                artifact = %unit.artifact_name,
                "[dry-run] would dump unit"
            );
            continue;
        }

        tracing::info!(table = %unit.source_name, artifact = %unit.artifact_name, "Dumping unit");
        if let (Some(start), Some(end)) = (&unit.range_start, &unit.range_end) {
            tracing::debug!(chunk = %unit.source_name, start = %start, end = %end, "Chunk partition bounds");
        }
        let artifact = dumper.dump_unit(unit).await?;
        replicate(&artifact, replicator).await?;
        cache.commit(&unit.artifact_name, fingerprint)?;
        tracing::info!(artifact = %unit.artifact_name, fingerprint = %fingerprint, "Unit committed");
    }
    Ok(())
}

/// Ships one artifact to the remote target, then reclaims the local copy.
/// No-op when replication is not configured.
pub async fn replicate(artifact: &Path, replicator: Option<&Replicator>) -> Result<()> {
    let Some(replicator) = replicator else {
        return Ok(());
    };
    replicator.copy(artifact).await?;
    tokio::fs::remove_file(artifact).await?;
    tracing::info!(artifact = %artifact.display(), "Replicated and removed local artifact");
    Ok(())
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
    use super::*;
    use crate::config::DbConfig;
    use crate::error::BackupError;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn test_db() -> DbConfig {
        DbConfig {
            host: "localhost".into(),
            port: 5432,
            user: "backup".into(),
            pass: "secret".into(),
            name: "appdb".into(),
        }
    }

    /// Stand-in for pg_dump that fails when asked for `public.bad`.
    fn fake_pg_dump(dir: &Path) -> PathBuf {
        let path = dir.join("pg_dump");
        let script = "#!/bin/sh\n\
            for arg in \"$@\"; do\n\
              case \"$arg\" in\n\
                --table=public.bad) echo 'relation vanished' >&2; exit 1 ;;\n\
              esac\n\
            done\n\
            echo 'COPY rows'\n";
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn unit(source: &str, fingerprint: &str) -> BackupUnit {
        BackupUnit::table(source, Some(fingerprint.to_string()))
    }

    #[tokio::test]
    async fn successful_run_commits_every_unit() {
        let data = TempDir::new().unwrap();
        let cache_dir = TempDir::new().unwrap();
        let dumper = Dumper::with_program(
            fake_pg_dump(data.path()),
            test_db(),
            data.path().to_path_buf(),
        );
        let cache = TransactionCache::new(cache_dir.path());

        let plan = vec![unit("public.orders", "100"), unit("public.users", "7")];
        run_units(&plan, &dumper, None, &cache, false).await.unwrap();

        assert!(!cache.has_changed("public.orders", "100"));
        assert!(!cache.has_changed("public.users", "7"));
        assert!(data.path().join("public.orders.sql.gz").exists());
        assert!(data.path().join("public.users.sql.gz").exists());
    }

    #[tokio::test]
    async fn failing_unit_aborts_the_rest_but_keeps_earlier_commits() {
        let data = TempDir::new().unwrap();
        let cache_dir = TempDir::new().unwrap();
        let dumper = Dumper::with_program(
            fake_pg_dump(data.path()),
            test_db(),
            data.path().to_path_buf(),
        );
        let cache = TransactionCache::new(cache_dir.path());

        let plan = vec![
            unit("public.orders", "100"),
            unit("public.bad", "55"),
            unit("public.users", "7"),
        ];
        let err = run_units(&plan, &dumper, None, &cache, false)
            .await
            .unwrap_err();
        assert!(matches!(err, BackupError::Dump { .. }));

        // first unit finished and stays committed
        assert!(!cache.has_changed("public.orders", "100"));
        // the failing unit and everything after it were not committed
        assert!(cache.has_changed("public.bad", "55"));
        assert!(cache.has_changed("public.users", "7"));
        assert!(!data.path().join("public.users.sql.gz").exists());
    }

    #[tokio::test]
    async fn dry_run_touches_nothing() {
        let data = TempDir::new().unwrap();
        let cache_dir = TempDir::new().unwrap();
        let dumper = Dumper::with_program(
            fake_pg_dump(data.path()),
            test_db(),
            data.path().to_path_buf(),
        );
        let cache = TransactionCache::new(cache_dir.path());

        let plan = vec![unit("public.orders", "100")];
        run_units(&plan, &dumper, None, &cache, true).await.unwrap();

        assert!(cache.known_units().is_empty());
        assert!(!data.path().join("public.orders.sql.gz").exists());
    }
}
