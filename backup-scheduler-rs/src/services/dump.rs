//! pg_dump invocation and artifact compression.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_compression::tokio::write::GzipEncoder;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use which::which;

use crate::config::DbConfig;
use crate::error::{BackupError, Result};
use crate::models::unit::BackupUnit;

#[derive(Debug, Clone, Copy)]
pub enum DumpMode {
    Full,
    Schema,
}

impl DumpMode {
    fn label(&self) -> &'static str {
        match self {
            DumpMode::Full => "full",
            DumpMode::Schema => "schema",
        }
    }
}

/// Runs the external dump tool and writes gzip-compressed artifacts into
/// the data directory.
#[derive(Debug, Clone)]
pub struct Dumper {
    program: PathBuf,
    db: DbConfig,
    data_dir: PathBuf,
}

impl Dumper {
    pub fn new(db: DbConfig, data_dir: PathBuf) -> Result<Self> {
        let program = which("pg_dump").map_err(|e| {
            BackupError::Config(format!("pg_dump executable not found in PATH: {}", e))
        })?;
        Ok(Dumper {
            program,
            db,
            data_dir,
        })
    }

    /// Points the dumper at a stand-in executable instead of pg_dump.
    #[cfg(test)]
    pub fn with_program(program: PathBuf, db: DbConfig, data_dir: PathBuf) -> Self {
        Dumper {
            program,
            db,
            data_dir,
        }
    }

    /// Dumps one unit's rows into `<data_dir>/<artifact_name>.sql.gz`.
    ///
    /// Chunks are rewritten to their parent hypertable's name so a restore
    /// targets the logical table. Note: the dump output is held in memory
    /// for that rewrite.
    pub async fn dump_unit(&self, unit: &BackupUnit) -> Result<PathBuf> {
        let output = self
            .command()
            .arg("--data-only")
            .arg("--format=plain")
            .arg(format!("--table={}", unit.source_name))
            .arg(&self.db.name)
            .output()
            .await
            .map_err(|e| dump_error(&unit.source_name, e.to_string()))?;

        if !output.status.success() {
            return Err(dump_error(
                &unit.source_name,
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        let sql = match &unit.rename_target {
            Some(parent) => String::from_utf8_lossy(&output.stdout)
                .replace(&unit.source_name, parent)
                .into_bytes(),
            None => output.stdout,
        };

        let path = self.data_dir.join(format!("{}.sql.gz", unit.artifact_name));
        write_gzip(&path, &sql).await?;
        Ok(path)
    }

    /// Dumps the whole database (rows and structure for [`DumpMode::Full`],
    /// structure only for [`DumpMode::Schema`]) into a timestamped artifact.
    pub async fn dump_database(&self, mode: DumpMode) -> Result<PathBuf> {
        let mut cmd = self.command();
        if let DumpMode::Schema = mode {
            cmd.arg("--schema-only");
        }
        let output = cmd
            .arg("--format=plain")
            .arg(&self.db.name)
            .output()
            .await
            .map_err(|e| dump_error(&self.db.name, e.to_string()))?;

        if !output.status.success() {
            return Err(dump_error(
                &self.db.name,
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        let path = self.database_artifact_path(mode);
        write_gzip(&path, &output.stdout).await?;
        Ok(path)
    }

    /// Where a whole-database artifact for `mode` would land right now.
    pub fn database_artifact_path(&self, mode: DumpMode) -> PathBuf {
        let stamp = chrono::Utc::now().format("%Y-%m-%d_%H-%M-%S");
        self.data_dir
            .join(format!("{}_{}_{}.sql.gz", self.db.name, mode.label(), stamp))
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-h")
            .arg(&self.db.host)
            .arg("-p")
            .arg(self.db.port.to_string())
            .arg("-U")
            .arg(&self.db.user)
            .env("PGPASSWORD", &self.db.pass)
            .stdin(Stdio::null());
        cmd
    }
}

fn dump_error(unit: &str, message: String) -> BackupError {
    BackupError::Dump {
        unit: unit.to_string(),
        message,
    }
}

async fn write_gzip(path: &Path, data: &[u8]) -> Result<()> {
    let file = tokio::fs::File::create(path).await?;
    let mut encoder = GzipEncoder::new(file);
    encoder.write_all(data).await?;
    encoder.shutdown().await?;
    Ok(())
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
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

    fn fake_pg_dump(dir: &Path, script: &str) -> PathBuf {
        let path = dir.join("pg_dump");
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[tokio::test]
    async fn dump_unit_writes_compressed_artifact() {
        let dir = TempDir::new().unwrap();
        let program = fake_pg_dump(dir.path(), "#!/bin/sh\necho 'COPY public.orders FROM stdin;'\n");
        let dumper = Dumper::with_program(program, test_db(), dir.path().to_path_buf());

        let unit = BackupUnit::table("public.orders", Some("100".into()));
        let artifact = dumper.dump_unit(&unit).await.unwrap();

        assert_eq!(artifact, dir.path().join("public.orders.sql.gz"));
        let written = std::fs::read(&artifact).unwrap();
        assert!(!written.is_empty());
        // gzip magic bytes
        assert_eq!(&written[..2], &[0x1f, 0x8b]);
    }

    #[tokio::test]
    async fn failed_dump_surfaces_stderr() {
        let dir = TempDir::new().unwrap();
        let program = fake_pg_dump(dir.path(), "#!/bin/sh\necho 'connection refused' >&2\nexit 1\n");
        let dumper = Dumper::with_program(program, test_db(), dir.path().to_path_buf());

        let unit = BackupUnit::table("public.orders", Some("100".into()));
        let err = dumper.dump_unit(&unit).await.unwrap_err();
        match err {
            BackupError::Dump { unit, message } => {
                assert_eq!(unit, "public.orders");
                assert!(message.contains("connection refused"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!dir.path().join("public.orders.sql.gz").exists());
    }

    #[tokio::test]
    async fn schema_dump_lands_in_a_timestamped_artifact() {
        let dir = TempDir::new().unwrap();
        let program = fake_pg_dump(dir.path(), "#!/bin/sh\necho 'CREATE TABLE t ();'\n");
        let dumper = Dumper::with_program(program, test_db(), dir.path().to_path_buf());

        let artifact = dumper.dump_database(DumpMode::Schema).await.unwrap();
        let name = artifact.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("appdb_schema_"));
        assert!(name.ends_with(".sql.gz"));
        assert!(artifact.exists());
    }
}
