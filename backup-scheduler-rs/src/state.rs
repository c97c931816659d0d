use std::collections::{HashMap, HashSet};

use tokio::sync::Mutex;

use crate::config::AppConfig;
use crate::connectors::Connector;
use crate::models::schedule::{BackupKind, ScheduleStatus};

pub struct AppState {
    pub config: AppConfig,
    pub connector: Connector,
    /// Registered schedules, updated with a last-run timestamp after each
    /// successful run. Read by the status endpoint.
    pub schedules: Mutex<HashMap<BackupKind, ScheduleStatus>>,
    /// In-progress guard per backup kind; a firing that finds its kind
    /// here is skipped instead of overlapping the running one.
    pub running: Mutex<HashSet<BackupKind>>,
}

impl AppState {
    pub fn new(config: AppConfig, connector: Connector) -> Self {
        AppState {
            config,
            connector,
            schedules: Mutex::new(HashMap::new()),
            running: Mutex::new(HashSet::new()),
        }
    }
}
