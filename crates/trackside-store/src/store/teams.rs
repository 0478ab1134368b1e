use super::TrackStore;
use crate::error::{Error, Result};
use crate::types::{Team, TeamSummary};
use chrono::{DateTime, Utc};
use sqlx::Row;

impl TrackStore {
    // ── Teams ───────────────────────────────────────────────────

    /// Register a new team. Duplicate names are a `Conflict`.
    pub async fn create_team(&self, name: &str, beacon_mac: Option<&str>) -> Result<Team> {
        self.ensure_team_name_free(name, None).await?;

        let result = sqlx::query(
            "INSERT INTO teams (name, beacon_mac, created_at)
             VALUES (?1, ?2, ?3)",
        )
        .bind(name)
        .bind(beacon_mac)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        self.get_team(result.last_insert_rowid()).await
    }

    /// All teams, oldest first.
    pub async fn list_teams(&self) -> Result<Vec<Team>> {
        let rows = sqlx::query(
            "SELECT id, name, beacon_mac, created_at
             FROM teams ORDER BY created_at, id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_team).collect()
    }

    /// Get a team by ID.
    pub async fn get_team(&self, id: i64) -> Result<Team> {
        let row = sqlx::query(
            "SELECT id, name, beacon_mac, created_at
             FROM teams WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Self::row_to_team(&row),
            None => Err(Error::NotFound(format!("team {id} not found"))),
        }
    }

    /// Update name and/or beacon. `None` fields are left unchanged.
    pub async fn update_team(
        &self,
        id: i64,
        name: Option<&str>,
        beacon_mac: Option<&str>,
    ) -> Result<Team> {
        let team = self.get_team(id).await?;

        if let Some(new_name) = name {
            if new_name != team.name {
                self.ensure_team_name_free(new_name, Some(id)).await?;
            }
        }

        let name = name.unwrap_or(&team.name);
        let beacon = beacon_mac.or(team.beacon_mac.as_deref());

        sqlx::query("UPDATE teams SET name = ?1, beacon_mac = ?2 WHERE id = ?3")
            .bind(name)
            .bind(beacon)
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.get_team(id).await
    }

    /// Delete a team and its race assignments.
    pub async fn delete_team(&self, id: i64) -> Result<()> {
        self.get_team(id).await?;

        sqlx::query("DELETE FROM race_teams WHERE team_id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        sqlx::query("DELETE FROM teams WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Attach a beacon MAC to a team.
    pub async fn assign_beacon(&self, id: i64, beacon_mac: &str) -> Result<Team> {
        self.get_team(id).await?;

        sqlx::query("UPDATE teams SET beacon_mac = ?1 WHERE id = ?2")
            .bind(beacon_mac)
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.get_team(id).await
    }

    /// Reduced id/name view of all teams, oldest first.
    pub async fn list_team_summaries(&self) -> Result<Vec<TeamSummary>> {
        let rows = sqlx::query("SELECT id, name FROM teams ORDER BY created_at, id")
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

    /// Total number of teams.
    pub async fn team_count(&self) -> Result<u32> {
        let row = sqlx::query("SELECT COUNT(*) as cnt FROM teams")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get::<i32, _>("cnt")? as u32)
    }

    async fn ensure_team_name_free(&self, name: &str, exclude_id: Option<i64>) -> Result<()> {
        let row = sqlx::query("SELECT id FROM teams WHERE name = ?1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(row) = row {
            let existing: i64 = row.try_get("id")?;
            if exclude_id != Some(existing) {
                return Err(Error::Conflict(format!(
                    "team name '{name}' already exists"
                )));
            }
        }
        Ok(())
    }

    pub(crate) fn row_to_team(row: &sqlx::sqlite::SqliteRow) -> Result<Team> {
        let created_str: String = row.try_get("created_at")?;
        Ok(Team {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            beacon_mac: row.try_get("beacon_mac")?,
            created_at: DateTime::parse_from_rfc3339(&created_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }
}
