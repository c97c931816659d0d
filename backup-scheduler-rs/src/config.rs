use std::path::PathBuf;

use crate::error::{BackupError, Result};

/// Which kind of source database the connector targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Postgres,
    Timescale,
}

impl SourceKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "postgres" => Some(SourceKind::Postgres),
            "timescale" => Some(SourceKind::Timescale),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Postgres => "postgres",
            SourceKind::Timescale => "timescale",
        }
    }
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct RemoteTarget {
    pub host: String,
    pub user: String,
    pub path: String,
    pub key_file: PathBuf,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub source: SourceKind,
    pub db: DbConfig,
    pub diff_schedule: String,
    pub full_schedule: Option<String>,
    pub schema_schedule: Option<String>,
    pub cache_dir: PathBuf,
    pub data_dir: PathBuf,
    pub remote: Option<RemoteTarget>,
    pub port: u16,
    pub dry_run: bool,
}

impl AppConfig {
    /// Loads configuration from the environment. All missing required
    /// variables are reported in a single error so the operator can fix
    /// them in one pass.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let mut missing = Vec::new();

        let backup_type = require("BACKUP_TYPE", &mut missing);
        let db_host = require("DB_HOST", &mut missing);
        let db_user = require("DB_USER", &mut missing);
        let db_pass = require("DB_PASS", &mut missing);
        let db_name = require("DB_NAME", &mut missing);
        let diff_schedule = require("DIFF_SCHEDULE", &mut missing);

        let remote = if is_set("REMOTE_BACKUP") {
            let host = require("REMOTE_HOST", &mut missing);
            let user = require("REMOTE_USER", &mut missing);
            let path = require("REMOTE_PATH", &mut missing);
            let key_file = require("REMOTE_KEY_FILE", &mut missing);
            Some((host, user, path, key_file))
        } else {
            None
        };

        if !missing.is_empty() {
            return Err(BackupError::Config(format!(
                "missing required environment variables: {}",
                missing.join(", ")
            )));
        }

        let source = SourceKind::parse(&backup_type).ok_or_else(|| {
            BackupError::Config(format!(
                "BACKUP_TYPE '{}' is not handled (expected 'postgres' or 'timescale')",
                backup_type
            ))
        })?;

        Ok(AppConfig {
            source,
            db: DbConfig {
                host: db_host,
                port: parse_port("DB_PORT", 5432)?,
                user: db_user,
                pass: db_pass,
                name: db_name,
            },
            diff_schedule,
            full_schedule: optional("FULL_SCHEDULE"),
            schema_schedule: optional("SCHEMA_SCHEDULE"),
            cache_dir: PathBuf::from(
                std::env::var("CACHE_DIR").unwrap_or_else(|_| "/cache".into()),
            ),
            data_dir: PathBuf::from(std::env::var("DATA_DIR").unwrap_or_else(|_| "/data".into())),
            remote: remote.map(|(host, user, path, key_file)| RemoteTarget {
                host,
                user,
                path,
                key_file: PathBuf::from(key_file),
            }),
            port: parse_port("PORT", 8080)?,
            dry_run: is_set("DRY_RUN"),
        })
    }
}

fn require(name: &'static str, missing: &mut Vec<&'static str>) -> String {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => value,
        _ => {
            missing.push(name);
            String::new()
        }
    }
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn is_set(name: &str) -> bool {
    std::env::var(name).map(|v| !v.is_empty()).unwrap_or(false)
}

fn parse_port(name: &str, default: u16) -> Result<u16> {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => value
            .parse()
            .map_err(|_| BackupError::Config(format!("{} '{}' is not a valid port", name, value))),
        _ => Ok(default),
    }
}
