//! Race API endpoints
//!
//! GET    /api/v1/races - List races
//! POST   /api/v1/races - Create a race
//! GET    /api/v1/races/:id - Get race details
//! PUT    /api/v1/races/:id - Update a race
//! DELETE /api/v1/races/:id - Delete a race
//! PUT    /api/v1/races/:id/start - Start or resume
//! PUT    /api/v1/races/:id/pause - Pause
//! PUT    /api/v1/races/:id/stop - Finish
//!
//! Lifecycle transitions also publish a status frame to the downlink
//! topic so trackside displays can react without polling.

use axum::{
    extract::Path,
    http::StatusCode,
    routing::{get, put},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;

use trackside_ingest::{MqttClient, QoS};
use trackside_store::types::{
    DEFAULT_RACE_DURATION_MINUTES, MAX_RACE_DURATION_MINUTES, MAX_RACE_NAME_LEN,
    MIN_RACE_DURATION_MINUTES,
};
use trackside_store::{Race, TrackStore};

use super::error::{ApiError, ApiResponse, ApiResult};
use super::teams::TeamSummaryView;
use crate::server::config::AppConfig;

/// Race view for API responses
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RaceView {
    pub id: i64,
    pub name: String,
    pub duration_minutes: u32,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub teams: Vec<TeamSummaryView>,
}

impl From<Race> for RaceView {
    fn from(race: Race) -> Self {
        Self {
            id: race.id,
            name: race.name,
            duration_minutes: race.duration_minutes,
            status: race.status.to_string(),
            created_at: race.created_at,
            started_at: race.started_at,
            ended_at: race.ended_at,
            teams: race.teams.into_iter().map(TeamSummaryView::from).collect(),
        }
    }
}

/// Request to create a race
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateRaceRequest {
    pub name: String,
    #[serde(default = "default_duration")]
    pub duration_minutes: u32,
    pub team_ids: Option<Vec<i64>>,
}

pub(crate) fn default_duration() -> u32 {
    DEFAULT_RACE_DURATION_MINUTES
}

/// Request to update a race; lifecycle fields go through the
/// start/pause/stop endpoints instead
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRaceRequest {
    pub name: Option<String>,
    pub duration_minutes: Option<u32>,
}

fn clean_race_name(raw: &str) -> Result<String, ApiError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ApiError::validation("race name must not be empty"));
    }
    if name.len() > MAX_RACE_NAME_LEN {
        return Err(ApiError::validation(format!(
            "race name exceeds {} characters",
            MAX_RACE_NAME_LEN
        )));
    }
    Ok(name.to_string())
}

fn check_duration(minutes: u32) -> Result<u32, ApiError> {
    if !(MIN_RACE_DURATION_MINUTES..=MAX_RACE_DURATION_MINUTES).contains(&minutes) {
        return Err(ApiError::validation(format!(
            "duration_minutes must be between {} and {}",
            MIN_RACE_DURATION_MINUTES, MAX_RACE_DURATION_MINUTES
        )));
    }
    Ok(minutes)
}

/// Announce a lifecycle transition on the downlink topic. Fire-and-forget.
async fn publish_transition(bus: &MqttClient, topic: &str, race: &Race) {
    let frame = serde_json::json!({
        "race_id": race.id,
        "status": race.status.to_string(),
    });
    bus.publish(topic, frame.to_string().into_bytes(), QoS::AtLeastOnce, false)
        .await;
}

/// List all races, newest first
#[utoipa::path(
    get,
    path = "/api/v1/races",
    tag = "races",
    responses(
        (status = 200, description = "List of races", body = Vec<RaceView>)
    )
)]
pub async fn list_races(Extension(store): Extension<TrackStore>) -> ApiResult<Vec<RaceView>> {
    let races = store.list_races().await?;
    let views: Vec<RaceView> = races.into_iter().map(RaceView::from).collect();
    Ok(Json(ApiResponse::success(views)))
}

/// Create a race, optionally assigning teams up front
#[utoipa::path(
    post,
    path = "/api/v1/races",
    tag = "races",
    request_body = CreateRaceRequest,
    responses(
        (status = 201, description = "Created race", body = RaceView),
        (status = 404, description = "Unknown team ids"),
        (status = 422, description = "Invalid request")
    )
)]
pub async fn create_race(
    Extension(store): Extension<TrackStore>,
    Json(request): Json<CreateRaceRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RaceView>>), ApiError> {
    let name = clean_race_name(&request.name)?;
    let duration = check_duration(request.duration_minutes)?;
    let team_ids = request.team_ids.unwrap_or_default();

    let race = store.create_race(&name, duration, &team_ids).await?;
    info!(race_id = race.id, name = %race.name, teams = race.teams.len(), "race created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(RaceView::from(race))),
    ))
}

/// Get race details
#[utoipa::path(
    get,
    path = "/api/v1/races/{id}",
    tag = "races",
    params(
        ("id" = i64, Path, description = "Race ID")
    ),
    responses(
        (status = 200, description = "Race details", body = RaceView),
        (status = 404, description = "Race not found")
    )
)]
pub async fn get_race(
    Extension(store): Extension<TrackStore>,
    Path(id): Path<i64>,
) -> ApiResult<RaceView> {
    let race = store.get_race(id).await?;
    Ok(Json(ApiResponse::success(RaceView::from(race))))
}

/// Update name or duration
#[utoipa::path(
    put,
    path = "/api/v1/races/{id}",
    tag = "races",
    params(
        ("id" = i64, Path, description = "Race ID")
    ),
    request_body = UpdateRaceRequest,
    responses(
        (status = 200, description = "Updated race", body = RaceView),
        (status = 404, description = "Race not found"),
        (status = 422, description = "Invalid request")
    )
)]
pub async fn update_race(
    Extension(store): Extension<TrackStore>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateRaceRequest>,
) -> ApiResult<RaceView> {
    let name = match request.name.as_deref() {
        Some(raw) => Some(clean_race_name(raw)?),
        None => None,
    };
    let duration = match request.duration_minutes {
        Some(minutes) => Some(check_duration(minutes)?),
        None => None,
    };

    let race = store.update_race(id, name.as_deref(), duration).await?;
    info!(race_id = id, "race updated");
    Ok(Json(ApiResponse::success(RaceView::from(race))))
}

/// Delete a race and its team assignments
#[utoipa::path(
    delete,
    path = "/api/v1/races/{id}",
    tag = "races",
    params(
        ("id" = i64, Path, description = "Race ID")
    ),
    responses(
        (status = 204, description = "Race deleted"),
        (status = 404, description = "Race not found")
    )
)]
pub async fn delete_race(
    Extension(store): Extension<TrackStore>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    store.delete_race(id).await?;
    info!(race_id = id, "race deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Start a planned race or resume a paused one
#[utoipa::path(
    put,
    path = "/api/v1/races/{id}/start",
    tag = "races",
    params(
        ("id" = i64, Path, description = "Race ID")
    ),
    responses(
        (status = 200, description = "Race running", body = RaceView),
        (status = 404, description = "Race not found"),
        (status = 409, description = "Race cannot start from its current status")
    )
)]
pub async fn start_race(
    Extension(store): Extension<TrackStore>,
    Extension(bus): Extension<Arc<MqttClient>>,
    Extension(config): Extension<AppConfig>,
    Path(id): Path<i64>,
) -> ApiResult<RaceView> {
    let race = store.start_race(id).await?;
    info!(race_id = id, "race started");
    publish_transition(&bus, &config.mqtt.tx_topic, &race).await;
    Ok(Json(ApiResponse::success(RaceView::from(race))))
}

/// Pause a running race
#[utoipa::path(
    put,
    path = "/api/v1/races/{id}/pause",
    tag = "races",
    params(
        ("id" = i64, Path, description = "Race ID")
    ),
    responses(
        (status = 200, description = "Race paused", body = RaceView),
        (status = 404, description = "Race not found"),
        (status = 409, description = "Race is not running")
    )
)]
pub async fn pause_race(
    Extension(store): Extension<TrackStore>,
    Extension(bus): Extension<Arc<MqttClient>>,
    Extension(config): Extension<AppConfig>,
    Path(id): Path<i64>,
) -> ApiResult<RaceView> {
    let race = store.pause_race(id).await?;
    info!(race_id = id, "race paused");
    publish_transition(&bus, &config.mqtt.tx_topic, &race).await;
    Ok(Json(ApiResponse::success(RaceView::from(race))))
}

/// Finish a running or paused race
#[utoipa::path(
    put,
    path = "/api/v1/races/{id}/stop",
    tag = "races",
    params(
        ("id" = i64, Path, description = "Race ID")
    ),
    responses(
        (status = 200, description = "Race finished", body = RaceView),
        (status = 404, description = "Race not found"),
        (status = 409, description = "Race is not running")
    )
)]
pub async fn stop_race(
    Extension(store): Extension<TrackStore>,
    Extension(bus): Extension<Arc<MqttClient>>,
    Extension(config): Extension<AppConfig>,
    Path(id): Path<i64>,
) -> ApiResult<RaceView> {
    let race = store.stop_race(id).await?;
    info!(race_id = id, "race finished");
    publish_transition(&bus, &config.mqtt.tx_topic, &race).await;
    Ok(Json(ApiResponse::success(RaceView::from(race))))
}

/// Create race routes
pub fn race_routes() -> Router {
    Router::new()
        .route("/api/v1/races", get(list_races).post(create_race))
        .route(
            "/api/v1/races/:id",
            get(get_race).put(update_race).delete(delete_race),
        )
        .route("/api/v1/races/:id/start", put(start_race))
        .route("/api/v1/races/:id/pause", put(pause_race))
        .route("/api/v1/races/:id/stop", put(stop_race))
}

#[cfg(test)]
mod tests {
    use super::*;
    use trackside_ingest::MqttConfig;

    async fn test_store() -> TrackStore {
        TrackStore::in_memory().await.unwrap()
    }

    // Never started, so transition publishes are dropped with a warning.
    fn test_bus() -> Arc<MqttClient> {
        Arc::new(MqttClient::new(MqttConfig::default()))
    }

    fn test_config() -> AppConfig {
        AppConfig::default()
    }

    #[tokio::test]
    async fn test_create_with_default_duration() {
        let store = test_store().await;

        let request: CreateRaceRequest =
            serde_json::from_value(serde_json::json!({ "name": "Sprint" })).unwrap();
        let (status, Json(created)) = create_race(Extension(store), Json(request)).await.unwrap();
        assert_eq!(status, StatusCode::CREATED);

        let view = created.data.unwrap();
        assert_eq!(view.duration_minutes, DEFAULT_RACE_DURATION_MINUTES);
        assert_eq!(view.status, "planned");
        assert!(view.teams.is_empty());
    }

    #[tokio::test]
    async fn test_create_with_teams() {
        let store = test_store().await;
        let team = store.create_team("Crew", None).await.unwrap();

        let (_, Json(created)) = create_race(
            Extension(store),
            Json(CreateRaceRequest {
                name: "Endurance".into(),
                duration_minutes: 120,
                team_ids: Some(vec![team.id]),
            }),
        )
        .await
        .unwrap();
        let view = created.data.unwrap();
        assert_eq!(view.teams.len(), 1);
        assert_eq!(view.teams[0].name, "Crew");
    }

    #[tokio::test]
    async fn test_create_unknown_team_not_found() {
        let store = test_store().await;

        let err = create_race(
            Extension(store),
            Json(CreateRaceRequest {
                name: "Ghost".into(),
                duration_minutes: 30,
                team_ids: Some(vec![42]),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert!(err.message().contains("unknown team ids"));
    }

    #[tokio::test]
    async fn test_duration_bounds() {
        let store = test_store().await;

        for minutes in [0u32, MAX_RACE_DURATION_MINUTES + 1] {
            let err = create_race(
                Extension(store.clone()),
                Json(CreateRaceRequest {
                    name: "Bounds".into(),
                    duration_minutes: minutes,
                    team_ids: None,
                }),
            )
            .await
            .unwrap_err();
            assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        }
    }

    #[tokio::test]
    async fn test_lifecycle_through_handlers() {
        let store = test_store().await;
        let bus = test_bus();
        let config = test_config();
        let race = store.create_race("Laps", 45, &[]).await.unwrap();

        let Json(started) = start_race(
            Extension(store.clone()),
            Extension(bus.clone()),
            Extension(config.clone()),
            Path(race.id),
        )
        .await
        .unwrap();
        assert_eq!(started.data.unwrap().status, "running");

        let Json(paused) = pause_race(
            Extension(store.clone()),
            Extension(bus.clone()),
            Extension(config.clone()),
            Path(race.id),
        )
        .await
        .unwrap();
        assert_eq!(paused.data.unwrap().status, "paused");

        let Json(stopped) = stop_race(
            Extension(store),
            Extension(bus),
            Extension(config),
            Path(race.id),
        )
        .await
        .unwrap();
        let view = stopped.data.unwrap();
        assert_eq!(view.status, "finished");
        assert!(view.ended_at.is_some());
    }

    #[tokio::test]
    async fn test_pause_planned_race_conflict() {
        let store = test_store().await;
        let race = store.create_race("Idle", 30, &[]).await.unwrap();

        let err = pause_race(
            Extension(store),
            Extension(test_bus()),
            Extension(test_config()),
            Path(race.id),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let store = test_store().await;
        let race = store.create_race("Draft", 30, &[]).await.unwrap();

        let Json(updated) = update_race(
            Extension(store.clone()),
            Path(race.id),
            Json(UpdateRaceRequest {
                name: Some("Final".into()),
                duration_minutes: Some(60),
            }),
        )
        .await
        .unwrap();
        let view = updated.data.unwrap();
        assert_eq!(view.name, "Final");
        assert_eq!(view.duration_minutes, 60);

        let status = delete_race(Extension(store.clone()), Path(race.id))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let err = get_race(Extension(store), Path(race.id)).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let store = test_store().await;
        store.create_race("First", 30, &[]).await.unwrap();
        store.create_race("Second", 30, &[]).await.unwrap();

        let Json(listed) = list_races(Extension(store)).await.unwrap();
        let views = listed.data.unwrap();
        assert_eq!(views[0].name, "Second");
        assert_eq!(views[1].name, "First");
    }
}
