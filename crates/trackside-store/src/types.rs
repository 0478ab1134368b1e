//! Core data types for the race domain.
//!
//! A **team** carries an optional BLE beacon MAC; a **race** owns a set of
//! teams through the `race_teams` junction and walks a four-state lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum length of a team name.
pub const MAX_TEAM_NAME_LEN: usize = 80;
/// Maximum length of a beacon MAC string.
pub const MAX_BEACON_MAC_LEN: usize = 32;
/// Maximum length of a race name.
pub const MAX_RACE_NAME_LEN: usize = 120;
/// Shortest allowed race duration.
pub const MIN_RACE_DURATION_MINUTES: u32 = 1;
/// Longest allowed race duration.
pub const MAX_RACE_DURATION_MINUTES: u32 = 360;
/// Duration used when a race is created without one.
pub const DEFAULT_RACE_DURATION_MINUTES: u32 = 30;

/// A participating team.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    /// Row ID (autoincrement)
    pub id: i64,
    /// Display name, unique across teams
    pub name: String,
    /// BLE MAC of the beacon carried by this team, if assigned
    pub beacon_mac: Option<String>,
    /// When this team was registered
    pub created_at: DateTime<Utc>,
}

/// Reduced team view embedded in race responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamSummary {
    /// Row ID
    pub id: i64,
    /// Display name
    pub name: String,
}

/// Lifecycle state of a race.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RaceStatus {
    /// Created but not yet started
    Planned,
    /// Clock is running
    Running,
    /// Temporarily halted, can resume
    Paused,
    /// Ended, terminal
    Finished,
}

impl std::fmt::Display for RaceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Planned => write!(f, "planned"),
            Self::Running => write!(f, "running"),
            Self::Paused => write!(f, "paused"),
            Self::Finished => write!(f, "finished"),
        }
    }
}

impl RaceStatus {
    /// Parse from string.
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "running" => Self::Running,
            "paused" => Self::Paused,
            "finished" => Self::Finished,
            _ => Self::Planned, // fallback
        }
    }
}

/// A race with its assigned teams.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Race {
    /// Row ID (autoincrement)
    pub id: i64,
    /// Race name (not unique, re-runs happen)
    pub name: String,
    /// Planned duration in minutes
    pub duration_minutes: u32,
    /// Current lifecycle state
    pub status: RaceStatus,
    /// When this race was created
    pub created_at: DateTime<Utc>,
    /// Set on the first transition to `Running`, never cleared
    pub started_at: Option<DateTime<Utc>>,
    /// Set when the race finishes
    pub ended_at: Option<DateTime<Utc>>,
    /// Teams assigned to this race
    pub teams: Vec<TeamSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_race_status_roundtrip() {
        for status in [
            RaceStatus::Planned,
            RaceStatus::Running,
            RaceStatus::Paused,
            RaceStatus::Finished,
        ] {
            assert_eq!(RaceStatus::from_str_lossy(&status.to_string()), status);
        }
    }

    #[test]
    fn test_race_status_fallback() {
        assert_eq!(RaceStatus::from_str_lossy("bogus"), RaceStatus::Planned);
    }

    #[test]
    fn test_race_status_serde_lowercase() {
        let json = serde_json::to_string(&RaceStatus::Running).unwrap();
        assert_eq!(json, "\"running\"");
    }
}
