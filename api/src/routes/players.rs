use axum::{
    extract::Path,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Extension, Json, Router,
};
use serde_json::json;
use tracing::{event, instrument, Level};

use roster_db::{
    object_id::PlayerId,
    players::{self, NewPlayer, PlayerFilter, PlayerUpdate},
    PoolExt,
};
use roster_http_errors::MissingObjectData;

use crate::{shared_state::State, Error};

async fn list_players(Extension(ref state): Extension<State>) -> Result<impl IntoResponse, Error> {
    let objects = state.db.interact(players::list).await?;
    Ok((StatusCode::OK, Json(objects)))
}

#[instrument(skip(state, body), fields(email = %body.email))]
async fn new_player(
    Extension(ref state): Extension<State>,
    Json(body): Json<NewPlayer>,
) -> Result<impl IntoResponse, Error> {
    let player = state
        .db
        .interact(move |conn| players::create(conn, body))
        .await?;

    Ok((StatusCode::OK, Json(player)))
}

/// A missing player is reported with a 200 status and an `errorMessage` body. Ids that can not be
/// parsed are reported the same way.
async fn get_player(
    Extension(ref state): Extension<State>,
    Path(player_id): Path<String>,
) -> Result<Response, Error> {
    let missing = || {
        (
            StatusCode::OK,
            Json(MissingObjectData::new("PLAYER", &player_id)),
        )
            .into_response()
    };

    let Ok(id) = player_id.parse::<PlayerId>() else {
        return Ok(missing());
    };

    match state
        .db
        .interact(move |conn| players::find_by_id(conn, id))
        .await
    {
        Ok(player) => Ok((StatusCode::OK, Json(player)).into_response()),
        Err(roster_db::Error::NotFound { .. }) => Ok(missing()),
        Err(e) => Err(e.into()),
    }
}

#[instrument(skip(state, body))]
async fn write_player(
    Extension(ref state): Extension<State>,
    Path(player_id): Path<PlayerId>,
    Json(body): Json<PlayerUpdate>,
) -> Result<impl IntoResponse, Error> {
    let player = state
        .db
        .interact(move |conn| players::update(conn, player_id, body))
        .await?;

    Ok((StatusCode::OK, Json(player)))
}

#[instrument(skip(state))]
async fn delete_player(
    Extension(ref state): Extension<State>,
    Path(player_id): Path<PlayerId>,
) -> Result<impl IntoResponse, Error> {
    let removed = state
        .db
        .interact(move |conn| players::remove(conn, PlayerFilter::ById(player_id)))
        .await?;

    if removed == 0 {
        return Err(Error::ObjectNotFound("player"));
    }

    event!(Level::INFO, %player_id, "Deleted player");
    Ok((StatusCode::OK, Json(json!({}))))
}

pub fn configure() -> Router {
    Router::new()
        .route("/players", get(list_players).post(new_player))
        .route(
            "/players/:player_id",
            get(get_player).put(write_player).delete(delete_player),
        )
}
