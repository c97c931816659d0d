//! Read-only status endpoint for liveness checks and monitoring.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::models::schedule::{BackupKind, ScheduleStatus};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    #[serde(rename = "type")]
    pub source: &'static str,
    pub schedules: Vec<ScheduleStatus>,
}

pub async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let schedules = state.schedules.lock().await;
    let schedules = [BackupKind::Diff, BackupKind::Full, BackupKind::Schema]
        .iter()
        .filter_map(|kind| schedules.get(kind).cloned())
        .collect();

    Json(StatusResponse {
        status: "OK",
        source: state.config.source.as_str(),
        schedules,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_payload_shape() {
        let response = StatusResponse {
            status: "OK",
            source: "timescale",
            schedules: vec![ScheduleStatus {
                kind: BackupKind::Diff,
                schedule: "0 0 3 * * *".into(),
                last: None,
            }],
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "OK");
        assert_eq!(json["type"], "timescale");
        assert_eq!(json["schedules"][0]["type"], "DIFF");
    }
}
