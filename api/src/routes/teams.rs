use axum::{
    extract::Path,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use serde::{Deserialize, Deserializer};
use serde_json::json;
use tracing::{event, instrument, Level};

use roster_db::{
    object_id::TeamId,
    teams::{self, NewTeam, TeamFilter},
    PoolExt,
};

use crate::{shared_state::State, Error};

#[derive(Debug, Deserialize)]
pub struct TeamUpdateInput {
    pub name: Option<String>,
    /// Absent leaves the parent alone, `null` clears it.
    #[serde(default, deserialize_with = "present")]
    pub parent: Option<Option<TeamId>>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

async fn list_teams(Extension(ref state): Extension<State>) -> Result<impl IntoResponse, Error> {
    let objects = state.db.interact(teams::list).await?;
    Ok((StatusCode::OK, Json(objects)))
}

#[instrument(skip(state, body), fields(name = %body.name))]
async fn new_team(
    Extension(ref state): Extension<State>,
    Json(body): Json<NewTeam>,
) -> Result<impl IntoResponse, Error> {
    let team = state
        .db
        .transaction(move |conn| teams::create(conn, body))
        .await?;

    Ok((StatusCode::OK, Json(team)))
}

async fn get_team(
    Extension(ref state): Extension<State>,
    Path(team_id): Path<TeamId>,
) -> Result<impl IntoResponse, Error> {
    let team = state
        .db
        .interact(move |conn| teams::find_by_id(conn, team_id))
        .await?;

    Ok((StatusCode::OK, Json(team)))
}

async fn get_children(
    Extension(ref state): Extension<State>,
    Path(team_id): Path<TeamId>,
) -> Result<impl IntoResponse, Error> {
    let children = state
        .db
        .interact(move |conn| teams::get_children(conn, team_id))
        .await?;

    Ok((StatusCode::OK, Json(children)))
}

#[instrument(skip(state, body))]
async fn write_team(
    Extension(ref state): Extension<State>,
    Path(team_id): Path<TeamId>,
    Json(body): Json<TeamUpdateInput>,
) -> Result<impl IntoResponse, Error> {
    let team = state
        .db
        .transaction(move |conn| {
            let mut team = teams::find_by_id(conn, team_id)?;
            if let Some(name) = body.name {
                team.name = name;
            }
            if let Some(parent) = body.parent {
                team.parent = parent;
            }

            teams::save(conn, &team)
        })
        .await?;

    Ok((StatusCode::OK, Json(team)))
}

#[instrument(skip(state))]
async fn delete_team(
    Extension(ref state): Extension<State>,
    Path(team_id): Path<TeamId>,
) -> Result<impl IntoResponse, Error> {
    let removed = state
        .db
        .interact(move |conn| teams::remove(conn, TeamFilter::ById(team_id)))
        .await?;

    if removed == 0 {
        return Err(Error::ObjectNotFound("team"));
    }

    event!(Level::INFO, %team_id, "Deleted team");
    Ok((StatusCode::OK, Json(json!({}))))
}

pub fn configure() -> Router {
    Router::new()
        .route("/teams", get(list_teams).post(new_team))
        .route(
            "/teams/:team_id",
            get(get_team).put(write_team).delete(delete_team),
        )
        .route("/teams/:team_id/children", get(get_children))
}
