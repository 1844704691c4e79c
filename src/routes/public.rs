use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use crate::{
    dto::{
        player::PlayerView,
        pool::PoolSummary,
        round::{PublicRoundView, TileQuestionView},
        settings::SettingsView,
    },
    error::AppError,
    services::{player_service, pool_service, round_service, settings_service},
    state::SharedState,
};

/// Read-only endpoints for the board, scoreboard and lobby screens.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/public/rounds", get(list_rounds))
        .route("/public/rounds/{id}/tiles/{tile}", get(tile_question))
        .route("/public/settings", get(get_settings))
        .route("/public/players", get(list_players))
        .route("/public/pools", get(list_pools))
}

#[utoipa::path(
    get,
    path = "/public/rounds",
    tag = "public",
    responses((status = 200, description = "Rounds in play order, answers hidden", body = [PublicRoundView]))
)]
/// Return rounds in play order with their occupied tile numbers.
pub async fn list_rounds(
    State(state): State<SharedState>,
) -> Result<Json<Vec<PublicRoundView>>, AppError> {
    Ok(Json(round_service::list_public_rounds(&state).await?))
}

#[utoipa::path(
    get,
    path = "/public/rounds/{id}/tiles/{tile}",
    tag = "public",
    params(
        ("id" = String, Path, description = "Identifier of the round"),
        ("tile" = u32, Path, description = "Tile number, starting at 1")
    ),
    responses(
        (status = 200, description = "Question behind the tile", body = TileQuestionView),
        (status = 404, description = "Unknown round or empty tile")
    )
)]
/// Return the question bound to one tile, without its answer.
pub async fn tile_question(
    State(state): State<SharedState>,
    Path((id, tile)): Path<(String, u32)>,
) -> Result<Json<TileQuestionView>, AppError> {
    Ok(Json(round_service::tile_question(&state, &id, tile).await?))
}

#[utoipa::path(
    get,
    path = "/public/settings",
    tag = "public",
    responses((status = 200, description = "Game settings", body = SettingsView))
)]
/// Return the game settings, including the live round.
pub async fn get_settings(State(state): State<SharedState>) -> Result<Json<SettingsView>, AppError> {
    Ok(Json(settings_service::get_settings(&state).await?))
}

#[utoipa::path(
    get,
    path = "/public/players",
    tag = "public",
    responses((status = 200, description = "Players with scores and inventories", body = [PlayerView]))
)]
/// Return every player.
pub async fn list_players(
    State(state): State<SharedState>,
) -> Result<Json<Vec<PlayerView>>, AppError> {
    Ok(Json(player_service::list_players(&state).await?))
}

#[utoipa::path(
    get,
    path = "/public/pools",
    tag = "public",
    responses((status = 200, description = "Question pools without their questions", body = [PoolSummary]))
)]
/// Return pool names and sizes.
pub async fn list_pools(State(state): State<SharedState>) -> Result<Json<Vec<PoolSummary>>, AppError> {
    Ok(Json(pool_service::list_pool_summaries(&state).await?))
}
