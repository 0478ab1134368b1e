//! Team API endpoints
//!
//! GET    /api/v1/teams - List teams
//! POST   /api/v1/teams - Create a team
//! GET    /api/v1/teams/summaries - Compact id/name listing
//! GET    /api/v1/teams/:id - Get team details
//! PUT    /api/v1/teams/:id - Update a team
//! DELETE /api/v1/teams/:id - Delete a team
//! POST   /api/v1/teams/:id/beacon - Assign a beacon MAC

use axum::{
    extract::Path,
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use trackside_store::types::{MAX_BEACON_MAC_LEN, MAX_TEAM_NAME_LEN};
use trackside_store::{Team, TeamSummary, TrackStore};

use super::error::{ApiError, ApiResponse, ApiResult};

/// Team view for API responses
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TeamView {
    pub id: i64,
    pub name: String,
    pub beacon_mac: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Team> for TeamView {
    fn from(team: Team) -> Self {
        Self {
            id: team.id,
            name: team.name,
            beacon_mac: team.beacon_mac,
            created_at: team.created_at,
        }
    }
}

/// Compact team reference embedded in race responses
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TeamSummaryView {
    pub id: i64,
    pub name: String,
}

impl From<TeamSummary> for TeamSummaryView {
    fn from(summary: TeamSummary) -> Self {
        Self {
            id: summary.id,
            name: summary.name,
        }
    }
}

/// Request to create a team
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTeamRequest {
    pub name: String,
    pub beacon_mac: Option<String>,
}

/// Request to update a team; omitted fields are left unchanged
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTeamRequest {
    pub name: Option<String>,
    pub beacon_mac: Option<String>,
}

/// Request to assign a beacon MAC
#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignBeaconRequest {
    pub beacon_mac: String,
}

fn clean_team_name(raw: &str) -> Result<String, ApiError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ApiError::validation("team name must not be empty"));
    }
    if name.len() > MAX_TEAM_NAME_LEN {
        return Err(ApiError::validation(format!(
            "team name exceeds {} characters",
            MAX_TEAM_NAME_LEN
        )));
    }
    Ok(name.to_string())
}

fn clean_beacon_mac(raw: &str) -> Result<String, ApiError> {
    let mac = raw.trim();
    if mac.is_empty() {
        return Err(ApiError::validation("beacon_mac must not be empty"));
    }
    if mac.len() > MAX_BEACON_MAC_LEN {
        return Err(ApiError::validation(format!(
            "beacon_mac exceeds {} characters",
            MAX_BEACON_MAC_LEN
        )));
    }
    Ok(mac.to_string())
}

/// List all teams in creation order
#[utoipa::path(
    get,
    path = "/api/v1/teams",
    tag = "teams",
    responses(
        (status = 200, description = "List of teams", body = Vec<TeamView>)
    )
)]
pub async fn list_teams(Extension(store): Extension<TrackStore>) -> ApiResult<Vec<TeamView>> {
    let teams = store.list_teams().await?;
    let views: Vec<TeamView> = teams.into_iter().map(TeamView::from).collect();
    Ok(Json(ApiResponse::success(views)))
}

/// Create a new team
#[utoipa::path(
    post,
    path = "/api/v1/teams",
    tag = "teams",
    request_body = CreateTeamRequest,
    responses(
        (status = 201, description = "Created team", body = TeamView),
        (status = 409, description = "Team name already exists"),
        (status = 422, description = "Invalid request")
    )
)]
pub async fn create_team(
    Extension(store): Extension<TrackStore>,
    Json(request): Json<CreateTeamRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TeamView>>), ApiError> {
    let name = clean_team_name(&request.name)?;
    let beacon_mac = match request.beacon_mac.as_deref() {
        Some(raw) => Some(clean_beacon_mac(raw)?),
        None => None,
    };

    let team = store.create_team(&name, beacon_mac.as_deref()).await?;
    info!(team_id = team.id, name = %team.name, "team created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(TeamView::from(team))),
    ))
}

/// Compact id/name listing for pickers
#[utoipa::path(
    get,
    path = "/api/v1/teams/summaries",
    tag = "teams",
    responses(
        (status = 200, description = "Team summaries", body = Vec<TeamSummaryView>)
    )
)]
pub async fn list_team_summaries(
    Extension(store): Extension<TrackStore>,
) -> ApiResult<Vec<TeamSummaryView>> {
    let summaries = store.list_team_summaries().await?;
    let views: Vec<TeamSummaryView> = summaries.into_iter().map(TeamSummaryView::from).collect();
    Ok(Json(ApiResponse::success(views)))
}

/// Get team details
#[utoipa::path(
    get,
    path = "/api/v1/teams/{id}",
    tag = "teams",
    params(
        ("id" = i64, Path, description = "Team ID")
    ),
    responses(
        (status = 200, description = "Team details", body = TeamView),
        (status = 404, description = "Team not found")
    )
)]
pub async fn get_team(
    Extension(store): Extension<TrackStore>,
    Path(id): Path<i64>,
) -> ApiResult<TeamView> {
    let team = store.get_team(id).await?;
    Ok(Json(ApiResponse::success(TeamView::from(team))))
}

/// Update a team; only provided fields change
#[utoipa::path(
    put,
    path = "/api/v1/teams/{id}",
    tag = "teams",
    params(
        ("id" = i64, Path, description = "Team ID")
    ),
    request_body = UpdateTeamRequest,
    responses(
        (status = 200, description = "Updated team", body = TeamView),
        (status = 404, description = "Team not found"),
        (status = 409, description = "Team name already exists"),
        (status = 422, description = "Invalid request")
    )
)]
pub async fn update_team(
    Extension(store): Extension<TrackStore>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateTeamRequest>,
) -> ApiResult<TeamView> {
    let name = match request.name.as_deref() {
        Some(raw) => Some(clean_team_name(raw)?),
        None => None,
    };
    let beacon_mac = match request.beacon_mac.as_deref() {
        Some(raw) => Some(clean_beacon_mac(raw)?),
        None => None,
    };

    let team = store
        .update_team(id, name.as_deref(), beacon_mac.as_deref())
        .await?;
    info!(team_id = team.id, "team updated");
    Ok(Json(ApiResponse::success(TeamView::from(team))))
}

/// Delete a team and its race assignments
#[utoipa::path(
    delete,
    path = "/api/v1/teams/{id}",
    tag = "teams",
    params(
        ("id" = i64, Path, description = "Team ID")
    ),
    responses(
        (status = 204, description = "Team deleted"),
        (status = 404, description = "Team not found")
    )
)]
pub async fn delete_team(
    Extension(store): Extension<TrackStore>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    store.delete_team(id).await?;
    info!(team_id = id, "team deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Assign a beacon MAC to a team
#[utoipa::path(
    post,
    path = "/api/v1/teams/{id}/beacon",
    tag = "teams",
    params(
        ("id" = i64, Path, description = "Team ID")
    ),
    request_body = AssignBeaconRequest,
    responses(
        (status = 200, description = "Team with beacon assigned", body = TeamView),
        (status = 404, description = "Team not found"),
        (status = 422, description = "Invalid request")
    )
)]
pub async fn assign_beacon(
    Extension(store): Extension<TrackStore>,
    Path(id): Path<i64>,
    Json(request): Json<AssignBeaconRequest>,
) -> ApiResult<TeamView> {
    let mac = clean_beacon_mac(&request.beacon_mac)?;
    let team = store.assign_beacon(id, &mac).await?;
    info!(team_id = id, beacon = %mac, "beacon assigned");
    Ok(Json(ApiResponse::success(TeamView::from(team))))
}

/// Create team routes
pub fn team_routes() -> Router {
    Router::new()
        .route("/api/v1/teams", get(list_teams).post(create_team))
        .route("/api/v1/teams/summaries", get(list_team_summaries))
        .route(
            "/api/v1/teams/:id",
            get(get_team).put(update_team).delete(delete_team),
        )
        .route("/api/v1/teams/:id/beacon", post(assign_beacon))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> TrackStore {
        TrackStore::in_memory().await.unwrap()
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let store = test_store().await;

        let (status, Json(created)) = create_team(
            Extension(store.clone()),
            Json(CreateTeamRequest {
                name: "  Red Rockets  ".into(),
                beacon_mac: Some("AA:BB:CC:DD:EE:01".into()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        let view = created.data.unwrap();
        assert_eq!(view.name, "Red Rockets");
        assert_eq!(view.beacon_mac.as_deref(), Some("AA:BB:CC:DD:EE:01"));

        let Json(listed) = list_teams(Extension(store)).await.unwrap();
        assert_eq!(listed.data.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_empty_name_rejected() {
        let store = test_store().await;

        let err = create_team(
            Extension(store),
            Json(CreateTeamRequest {
                name: "   ".into(),
                beacon_mac: None,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_create_name_too_long_rejected() {
        let store = test_store().await;

        let err = create_team(
            Extension(store),
            Json(CreateTeamRequest {
                name: "x".repeat(MAX_TEAM_NAME_LEN + 1),
                beacon_mac: None,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_duplicate_name_conflict() {
        let store = test_store().await;
        store.create_team("Solo", None).await.unwrap();

        let err = create_team(
            Extension(store),
            Json(CreateTeamRequest {
                name: "Solo".into(),
                beacon_mac: None,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_get_missing_team() {
        let store = test_store().await;

        let err = get_team(Extension(store), Path(99)).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_partial() {
        let store = test_store().await;
        let team = store.create_team("Old", Some("AA:01")).await.unwrap();

        let Json(updated) = update_team(
            Extension(store),
            Path(team.id),
            Json(UpdateTeamRequest {
                name: Some("New".into()),
                beacon_mac: None,
            }),
        )
        .await
        .unwrap();
        let view = updated.data.unwrap();
        assert_eq!(view.name, "New");
        assert_eq!(view.beacon_mac.as_deref(), Some("AA:01"));
    }

    #[tokio::test]
    async fn test_delete_returns_no_content() {
        let store = test_store().await;
        let team = store.create_team("Gone", None).await.unwrap();

        let status = delete_team(Extension(store.clone()), Path(team.id))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let err = delete_team(Extension(store), Path(team.id))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_assign_beacon_trims() {
        let store = test_store().await;
        let team = store.create_team("Beacon", None).await.unwrap();

        let Json(updated) = assign_beacon(
            Extension(store),
            Path(team.id),
            Json(AssignBeaconRequest {
                beacon_mac: "  FF:EE:DD  ".into(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(updated.data.unwrap().beacon_mac.as_deref(), Some("FF:EE:DD"));
    }

    #[tokio::test]
    async fn test_summaries_shape() {
        let store = test_store().await;
        store.create_team("A", Some("AA:01")).await.unwrap();

        let Json(summaries) = list_team_summaries(Extension(store)).await.unwrap();
        let views = summaries.data.unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].name, "A");
    }
}
