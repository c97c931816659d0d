use chrono::{DateTime, Utc};
use serde::Serialize;

/// The three independently scheduled backup types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BackupKind {
    Diff,
    Full,
    Schema,
}

impl BackupKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackupKind::Diff => "DIFF",
            BackupKind::Full => "FULL",
            BackupKind::Schema => "SCHEMA",
        }
    }
}

impl std::fmt::Display for BackupKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reporting view of one registered schedule.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleStatus {
    #[serde(rename = "type")]
    pub kind: BackupKind,
    pub schedule: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_without_last_run_omits_the_field() {
        let status = ScheduleStatus {
            kind: BackupKind::Diff,
            schedule: "0 0 3 * * *".into(),
            last: None,
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["type"], "DIFF");
        assert_eq!(json["schedule"], "0 0 3 * * *");
        assert!(json.get("last").is_none());
    }

    #[test]
    fn schedule_with_last_run_serializes_timestamp() {
        let status = ScheduleStatus {
            kind: BackupKind::Full,
            schedule: "0 0 4 * * 0".into(),
            last: Some(Utc::now()),
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["type"], "FULL");
        assert!(json.get("last").is_some());
    }
}
