//! API Documentation - Swagger UI
//!
//! Provides OpenAPI documentation at /docs

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::{
    positions::{PositionsView, TrackView},
    races::{CreateRaceRequest, RaceView, UpdateRaceRequest},
    teams::{
        AssignBeaconRequest, CreateTeamRequest, TeamSummaryView, TeamView, UpdateTeamRequest,
    },
};
use crate::server::positions::PositionSample;

/// Trackside API OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Trackside API",
        version = "1.0.0",
        description = "Race tracking backend REST API.

## Overview
Trackside provides an API for:
- **Teams**: Manage teams and their beacon assignments
- **Races**: Plan races and drive the start/pause/stop lifecycle
- **Positions**: Live position view fed by trackside telemetry
",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    paths(
        // Teams
        crate::api::teams::list_teams,
        crate::api::teams::create_team,
        crate::api::teams::list_team_summaries,
        crate::api::teams::get_team,
        crate::api::teams::update_team,
        crate::api::teams::delete_team,
        crate::api::teams::assign_beacon,
        // Races
        crate::api::races::list_races,
        crate::api::races::create_race,
        crate::api::races::get_race,
        crate::api::races::update_race,
        crate::api::races::delete_race,
        crate::api::races::start_race,
        crate::api::races::pause_race,
        crate::api::races::stop_race,
        // Positions
        crate::api::positions::get_positions,
    ),
    components(
        schemas(
            // Teams
            TeamView,
            TeamSummaryView,
            CreateTeamRequest,
            UpdateTeamRequest,
            AssignBeaconRequest,
            // Races
            RaceView,
            CreateRaceRequest,
            UpdateRaceRequest,
            // Positions
            PositionsView,
            TrackView,
            PositionSample,
        )
    ),
    tags(
        (name = "teams", description = "Team management"),
        (name = "races", description = "Race planning and lifecycle"),
        (name = "positions", description = "Live position view"),
    )
)]
pub struct ApiDoc;

/// Create documentation routes
pub fn docs_routes() -> Router {
    Router::new().merge(SwaggerUi::new("/docs").url("/api/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_document_builds() {
        let doc = ApiDoc::openapi();
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["info"]["title"], "Trackside API");

        let paths = json["paths"].as_object().unwrap();
        assert!(paths.contains_key("/api/v1/teams"));
        assert!(paths.contains_key("/api/v1/races/{id}/start"));
        assert!(paths.contains_key("/api/v1/positions"));
    }
}
