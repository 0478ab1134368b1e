use super::TrackStore;
use crate::error::{Error, Result};
use crate::types::{Race, RaceStatus, TeamSummary};
use chrono::{DateTime, Utc};
use sqlx::Row;

impl TrackStore {
    // ── Races ───────────────────────────────────────────────────

    /// Create a race in `Planned` state with the given teams assigned.
    ///
    /// Every ID in `team_ids` must refer to an existing team.
    pub async fn create_race(
        &self,
        name: &str,
        duration_minutes: u32,
        team_ids: &[i64],
    ) -> Result<Race> {
        self.ensure_teams_exist(team_ids).await?;

        let result = sqlx::query(
            "INSERT INTO races (name, duration_minutes, status, created_at)
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(name)
        .bind(duration_minutes)
        .bind(RaceStatus::Planned.to_string())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        let race_id = result.last_insert_rowid();
        for team_id in team_ids {
            sqlx::query("INSERT OR IGNORE INTO race_teams (race_id, team_id) VALUES (?1, ?2)")
                .bind(race_id)
                .bind(team_id)
                .execute(&self.pool)
                .await?;
        }

        self.get_race(race_id).await
    }

    /// All races, newest first, with their team summaries.
    pub async fn list_races(&self) -> Result<Vec<Race>> {
        let rows = sqlx::query(
            "SELECT id, name, duration_minutes, status, created_at, started_at, ended_at
             FROM races ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut races = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut race = Self::row_to_race(row)?;
            race.teams = self.race_team_summaries(race.id).await?;
            races.push(race);
        }
        Ok(races)
    }

    /// Get a race by ID, with its team summaries.
    pub async fn get_race(&self, id: i64) -> Result<Race> {
        let row = sqlx::query(
            "SELECT id, name, duration_minutes, status, created_at, started_at, ended_at
             FROM races WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Err(Error::NotFound(format!("race {id} not found")));
        };
        let mut race = Self::row_to_race(&row)?;
        race.teams = self.race_team_summaries(race.id).await?;
        Ok(race)
    }

    /// Update name and/or duration. `None` fields are left unchanged.
    pub async fn update_race(
        &self,
        id: i64,
        name: Option<&str>,
        duration_minutes: Option<u32>,
    ) -> Result<Race> {
        let race = self.get_race(id).await?;

        let name = name.unwrap_or(&race.name);
        let duration = duration_minutes.unwrap_or(race.duration_minutes);

        sqlx::query("UPDATE races SET name = ?1, duration_minutes = ?2 WHERE id = ?3")
            .bind(name)
            .bind(duration)
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.get_race(id).await
    }

    /// Delete a race and its team assignments.
    pub async fn delete_race(&self, id: i64) -> Result<()> {
        self.get_race(id).await?;

        sqlx::query("DELETE FROM race_teams WHERE race_id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        sqlx::query("DELETE FROM races WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ── Lifecycle ───────────────────────────────────────────────

    /// Start (or resume) a race. Only `Planned` or `Paused` races can start.
    ///
    /// `started_at` is set on the first start and kept on resume.
    pub async fn start_race(&self, id: i64) -> Result<Race> {
        let race = self.get_race(id).await?;

        if !matches!(race.status, RaceStatus::Planned | RaceStatus::Paused) {
            return Err(Error::Conflict(format!(
                "race {id} cannot start from status '{}'",
                race.status
            )));
        }

        let started_at = race.started_at.unwrap_or_else(Utc::now);
        sqlx::query("UPDATE races SET status = ?1, started_at = ?2 WHERE id = ?3")
            .bind(RaceStatus::Running.to_string())
            .bind(started_at.to_rfc3339())
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.get_race(id).await
    }

    /// Pause a running race.
    pub async fn pause_race(&self, id: i64) -> Result<Race> {
        let race = self.get_race(id).await?;

        if race.status != RaceStatus::Running {
            return Err(Error::Conflict(format!("race {id} is not running")));
        }

        sqlx::query("UPDATE races SET status = ?1 WHERE id = ?2")
            .bind(RaceStatus::Paused.to_string())
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.get_race(id).await
    }

    /// Finish a race. Allowed from `Running` or `Paused`; terminal.
    pub async fn stop_race(&self, id: i64) -> Result<Race> {
        let race = self.get_race(id).await?;

        if !matches!(race.status, RaceStatus::Running | RaceStatus::Paused) {
            return Err(Error::Conflict(format!("race {id} is not running")));
        }

        sqlx::query("UPDATE races SET status = ?1, ended_at = ?2 WHERE id = ?3")
            .bind(RaceStatus::Finished.to_string())
            .bind(Utc::now().to_rfc3339())
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.get_race(id).await
    }

    /// Total number of races.
    pub async fn race_count(&self) -> Result<u32> {
        let row = sqlx::query("SELECT COUNT(*) as cnt FROM races")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get::<i32, _>("cnt")? as u32)
    }

    // ── Helpers ─────────────────────────────────────────────────

    async fn ensure_teams_exist(&self, team_ids: &[i64]) -> Result<()> {
        let mut missing = Vec::new();
        for team_id in team_ids {
            let row = sqlx::query("SELECT id FROM teams WHERE id = ?1")
                .bind(team_id)
                .fetch_optional(&self.pool)
                .await?;
            if row.is_none() {
                missing.push(*team_id);
            }
        }
        if missing.is_empty() {
            Ok(())
        } else {
            missing.sort_unstable();
            Err(Error::NotFound(format!("unknown team ids: {missing:?}")))
        }
    }

    pub(crate) async fn race_team_summaries(&self, race_id: i64) -> Result<Vec<TeamSummary>> {
        let rows = sqlx::query(
            "SELECT t.id, t.name
             FROM teams t
             JOIN race_teams rt ON rt.team_id = t.id
             WHERE rt.race_id = ?1
             ORDER BY t.created_at, t.id",
        )
        .bind(race_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(TeamSummary {
                    id: row.try_get("id")?,
                    name: row.try_get("name")?,
                })
            })
            .collect()
    }

    pub(crate) fn row_to_race(row: &sqlx::sqlite::SqliteRow) -> Result<Race> {
        let status_str: String = row.try_get("status")?;
        let created_str: String = row.try_get("created_at")?;
        Ok(Race {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            duration_minutes: row.try_get::<i32, _>("duration_minutes")? as u32,
            status: RaceStatus::from_str_lossy(&status_str),
            created_at: DateTime::parse_from_rfc3339(&created_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
            started_at: parse_optional_ts(row.try_get("started_at")?),
            ended_at: parse_optional_ts(row.try_get("ended_at")?),
            teams: Vec::new(),
        })
    }
}

fn parse_optional_ts(value: Option<String>) -> Option<DateTime<Utc>> {
    value
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}
