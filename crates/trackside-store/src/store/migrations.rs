use super::TrackStore;
use crate::error::Result;

impl TrackStore {
    // ── Migrations ──────────────────────────────────────────────

    pub(crate) async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS teams (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                name       TEXT NOT NULL UNIQUE,
                beacon_mac TEXT,
                created_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_teams_beacon ON teams(beacon_mac)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS races (
                id               INTEGER PRIMARY KEY AUTOINCREMENT,
                name             TEXT NOT NULL,
                duration_minutes INTEGER NOT NULL DEFAULT 30,
                status           TEXT NOT NULL DEFAULT 'planned',
                created_at       TEXT NOT NULL,
                started_at       TEXT,
                ended_at         TEXT
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_races_created ON races(created_at)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS race_teams (
                race_id        INTEGER NOT NULL REFERENCES races(id),
                team_id        INTEGER NOT NULL REFERENCES teams(id),
                is_active      INTEGER NOT NULL DEFAULT 1,
                start_position INTEGER,
                PRIMARY KEY (race_id, team_id)
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_race_teams_team ON race_teams(team_id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
