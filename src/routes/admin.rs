use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::{Request, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, patch, post, put},
};
use validator::Validate;

use crate::{
    dto::{
        inventory::{CreateInventoryItemRequest, InventoryItemView, UpdateInventoryItemRequest},
        player::{
            CreatePlayerRequest, GrantItemsRequest, PlayerView, ScoreAdjustmentRequest,
            UpdatePlayerRequest,
        },
        pool::{CreatePoolRequest, ImportQuestionsRequest, PoolView, QuestionView},
        round::{
            AssignQuestionsRequest, CreateRoundRequest, MoveRoundRequest, ReorderRoundRequest,
            RoundView, UpdateRoundRequest,
        },
        settings::{PatchSettingsRequest, ReplaceSettingsRequest, SettingsView},
    },
    error::AppError,
    services::{
        assignment, inventory_service, player_service, pool_service, round_service,
        settings_service,
    },
    state::SharedState,
};

const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Admin-only management endpoints for pools, rounds, players, the item catalog and settings.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/admin/pools", get(list_pools).post(create_pool))
        .route("/admin/pools/{id}", delete(delete_pool))
        .route("/admin/pools/{id}/questions", post(import_questions))
        .route("/admin/rounds", get(list_rounds).post(create_round))
        .route("/admin/rounds/{id}", patch(update_round).delete(delete_round))
        .route("/admin/rounds/{id}/order", put(reorder_round))
        .route("/admin/rounds/{id}/move", post(move_round))
        .route("/admin/rounds/{id}/assign", post(assign_questions))
        .route("/admin/players", get(list_players).post(create_player))
        .route(
            "/admin/players/{id}",
            patch(update_player).delete(delete_player),
        )
        .route("/admin/players/{id}/score", post(adjust_score))
        .route(
            "/admin/players/{id}/inventory",
            post(grant_items).delete(clear_inventory),
        )
        .route("/admin/inventory", get(list_items).post(create_item))
        .route(
            "/admin/inventory/{id}",
            patch(update_item).delete(delete_item),
        )
        .route(
            "/admin/settings",
            get(get_settings).put(replace_settings).patch(patch_settings),
        )
        .route_layer(middleware::from_fn_with_state(state, require_admin_token))
}

/// List every question pool with its questions.
#[utoipa::path(
    get,
    path = "/admin/pools",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream")),
    responses((status = 200, description = "Question pools", body = [PoolView]))
)]
pub async fn list_pools(State(state): State<SharedState>) -> Result<Json<Vec<PoolView>>, AppError> {
    Ok(Json(pool_service::list_pools(&state).await?))
}

/// Create an empty question pool.
#[utoipa::path(
    post,
    path = "/admin/pools",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream")),
    request_body = CreatePoolRequest,
    responses(
        (status = 201, description = "Pool created", body = PoolView),
        (status = 400, description = "Blank name")
    )
)]
pub async fn create_pool(
    State(state): State<SharedState>,
    Json(payload): Json<CreatePoolRequest>,
) -> Result<(StatusCode, Json<PoolView>), AppError> {
    payload.validate()?;
    let pool = pool_service::create_pool(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(pool)))
}

/// Delete a pool and its questions.
#[utoipa::path(
    delete,
    path = "/admin/pools/{id}",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream"),
    ("id" = String, Path, description = "Identifier of the pool")),
    responses(
        (status = 204, description = "Pool deleted"),
        (status = 404, description = "Unknown pool")
    )
)]
pub async fn delete_pool(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    pool_service::delete_pool(&state, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Append question rows to a pool.
#[utoipa::path(
    post,
    path = "/admin/pools/{id}/questions",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream"),
    ("id" = String, Path, description = "Identifier of the pool")),
    request_body = ImportQuestionsRequest,
    responses(
        (status = 201, description = "Imported questions", body = [QuestionView]),
        (status = 404, description = "Unknown pool")
    )
)]
pub async fn import_questions(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(payload): Json<ImportQuestionsRequest>,
) -> Result<(StatusCode, Json<Vec<QuestionView>>), AppError> {
    payload.validate()?;
    let questions = pool_service::import_questions(&state, &id, payload).await?;
    Ok((StatusCode::CREATED, Json(questions)))
}

/// List rounds in play order.
#[utoipa::path(
    get,
    path = "/admin/rounds",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream")),
    responses((status = 200, description = "Rounds sorted by order", body = [RoundView]))
)]
pub async fn list_rounds(
    State(state): State<SharedState>,
) -> Result<Json<Vec<RoundView>>, AppError> {
    Ok(Json(round_service::list_rounds(&state).await?))
}

/// Append a new round.
#[utoipa::path(
    post,
    path = "/admin/rounds",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream")),
    request_body = CreateRoundRequest,
    responses((status = 201, description = "Round created", body = RoundView))
)]
pub async fn create_round(
    State(state): State<SharedState>,
    Json(payload): Json<CreateRoundRequest>,
) -> Result<(StatusCode, Json<RoundView>), AppError> {
    payload.validate()?;
    let round = round_service::create_round(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(round)))
}

/// Merge-patch a round.
#[utoipa::path(
    patch,
    path = "/admin/rounds/{id}",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream"),
    ("id" = String, Path, description = "Identifier of the round")),
    request_body = UpdateRoundRequest,
    responses(
        (status = 200, description = "Round updated", body = RoundView),
        (status = 404, description = "Unknown round")
    )
)]
pub async fn update_round(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateRoundRequest>,
) -> Result<Json<RoundView>, AppError> {
    payload.validate()?;
    Ok(Json(round_service::update_round(&state, &id, payload).await?))
}

/// Delete a round and compact the remaining orders.
#[utoipa::path(
    delete,
    path = "/admin/rounds/{id}",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream"),
    ("id" = String, Path, description = "Identifier of the round")),
    responses(
        (status = 204, description = "Round deleted"),
        (status = 404, description = "Unknown round")
    )
)]
pub async fn delete_round(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    round_service::delete_round(&state, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Move a round to an absolute position.
#[utoipa::path(
    put,
    path = "/admin/rounds/{id}/order",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream"),
    ("id" = String, Path, description = "Identifier of the round")),
    request_body = ReorderRoundRequest,
    responses(
        (status = 200, description = "Rounds in their new order", body = [RoundView]),
        (status = 400, description = "Target position out of range")
    )
)]
pub async fn reorder_round(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(payload): Json<ReorderRoundRequest>,
) -> Result<Json<Vec<RoundView>>, AppError> {
    Ok(Json(
        round_service::reorder_round(&state, &id, payload.new_order).await?,
    ))
}

/// Move a round one slot up or down.
#[utoipa::path(
    post,
    path = "/admin/rounds/{id}/move",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream"),
    ("id" = String, Path, description = "Identifier of the round")),
    request_body = MoveRoundRequest,
    responses((status = 200, description = "Rounds in their new order", body = [RoundView]))
)]
pub async fn move_round(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(payload): Json<MoveRoundRequest>,
) -> Result<Json<Vec<RoundView>>, AppError> {
    Ok(Json(
        round_service::move_round(&state, &id, payload.direction).await?,
    ))
}

/// Draw a fresh set of unused questions from a pool into the round.
#[utoipa::path(
    post,
    path = "/admin/rounds/{id}/assign",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream"),
    ("id" = String, Path, description = "Identifier of the round")),
    request_body = AssignQuestionsRequest,
    responses(
        (status = 200, description = "Questions bound to tiles", body = [QuestionView]),
        (status = 404, description = "Unknown round or pool"),
        (status = 409, description = "Not enough unused questions in the pool")
    )
)]
pub async fn assign_questions(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(payload): Json<AssignQuestionsRequest>,
) -> Result<Json<Vec<QuestionView>>, AppError> {
    payload.validate()?;
    let questions =
        assignment::assign_questions(&state, &id, &payload.pool_id, payload.count).await?;
    Ok(Json(questions))
}

/// List players.
#[utoipa::path(
    get,
    path = "/admin/players",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream")),
    responses((status = 200, description = "Players", body = [PlayerView]))
)]
pub async fn list_players(
    State(state): State<SharedState>,
) -> Result<Json<Vec<PlayerView>>, AppError> {
    Ok(Json(player_service::list_players(&state).await?))
}

/// Register a player.
#[utoipa::path(
    post,
    path = "/admin/players",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream")),
    request_body = CreatePlayerRequest,
    responses(
        (status = 201, description = "Player created", body = PlayerView),
        (status = 409, description = "Player limit reached")
    )
)]
pub async fn create_player(
    State(state): State<SharedState>,
    Json(payload): Json<CreatePlayerRequest>,
) -> Result<(StatusCode, Json<PlayerView>), AppError> {
    payload.validate()?;
    let player = player_service::create_player(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(player)))
}

/// Merge-patch a player.
#[utoipa::path(
    patch,
    path = "/admin/players/{id}",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream"),
    ("id" = String, Path, description = "Identifier of the player")),
    request_body = UpdatePlayerRequest,
    responses((status = 200, description = "Player updated", body = PlayerView))
)]
pub async fn update_player(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdatePlayerRequest>,
) -> Result<Json<PlayerView>, AppError> {
    payload.validate()?;
    Ok(Json(player_service::update_player(&state, &id, payload).await?))
}

/// Remove a player.
#[utoipa::path(
    delete,
    path = "/admin/players/{id}",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream"),
    ("id" = String, Path, description = "Identifier of the player")),
    responses(
        (status = 204, description = "Player deleted"),
        (status = 404, description = "Unknown player")
    )
)]
pub async fn delete_player(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    player_service::delete_player(&state, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Add or remove one point.
#[utoipa::path(
    post,
    path = "/admin/players/{id}/score",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream"),
    ("id" = String, Path, description = "Identifier of the player")),
    request_body = ScoreAdjustmentRequest,
    responses((status = 200, description = "Score updated", body = PlayerView))
)]
pub async fn adjust_score(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(payload): Json<ScoreAdjustmentRequest>,
) -> Result<Json<PlayerView>, AppError> {
    payload.validate()?;
    Ok(Json(
        player_service::adjust_score(&state, &id, payload.delta).await?,
    ))
}

/// Grant catalog items to a player.
#[utoipa::path(
    post,
    path = "/admin/players/{id}/inventory",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream"),
    ("id" = String, Path, description = "Identifier of the player")),
    request_body = GrantItemsRequest,
    responses((status = 200, description = "Inventory updated", body = PlayerView))
)]
pub async fn grant_items(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(payload): Json<GrantItemsRequest>,
) -> Result<Json<PlayerView>, AppError> {
    payload.validate()?;
    Ok(Json(player_service::grant_items(&state, &id, payload).await?))
}

/// Empty a player's inventory.
#[utoipa::path(
    delete,
    path = "/admin/players/{id}/inventory",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream"),
    ("id" = String, Path, description = "Identifier of the player")),
    responses((status = 200, description = "Inventory cleared", body = PlayerView))
)]
pub async fn clear_inventory(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<PlayerView>, AppError> {
    Ok(Json(player_service::clear_inventory(&state, &id).await?))
}

/// List the item catalog.
#[utoipa::path(
    get,
    path = "/admin/inventory",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream")),
    responses((status = 200, description = "Catalog items", body = [InventoryItemView]))
)]
pub async fn list_items(
    State(state): State<SharedState>,
) -> Result<Json<Vec<InventoryItemView>>, AppError> {
    Ok(Json(inventory_service::list_items(&state).await?))
}

/// Add an item to the catalog.
#[utoipa::path(
    post,
    path = "/admin/inventory",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream")),
    request_body = CreateInventoryItemRequest,
    responses((status = 201, description = "Item created", body = InventoryItemView))
)]
pub async fn create_item(
    State(state): State<SharedState>,
    Json(payload): Json<CreateInventoryItemRequest>,
) -> Result<(StatusCode, Json<InventoryItemView>), AppError> {
    payload.validate()?;
    let item = inventory_service::create_item(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Merge-patch a catalog item.
#[utoipa::path(
    patch,
    path = "/admin/inventory/{id}",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream"),
    ("id" = String, Path, description = "Identifier of the item")),
    request_body = UpdateInventoryItemRequest,
    responses((status = 200, description = "Item updated", body = InventoryItemView))
)]
pub async fn update_item(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateInventoryItemRequest>,
) -> Result<Json<InventoryItemView>, AppError> {
    payload.validate()?;
    Ok(Json(inventory_service::update_item(&state, &id, payload).await?))
}

/// Remove an item from the catalog.
#[utoipa::path(
    delete,
    path = "/admin/inventory/{id}",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream"),
    ("id" = String, Path, description = "Identifier of the item")),
    responses((status = 204, description = "Item deleted"))
)]
pub async fn delete_item(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    inventory_service::delete_item(&state, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Read the settings document.
#[utoipa::path(
    get,
    path = "/admin/settings",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream")),
    responses((status = 200, description = "Settings", body = SettingsView))
)]
pub async fn get_settings(State(state): State<SharedState>) -> Result<Json<SettingsView>, AppError> {
    Ok(Json(settings_service::get_settings(&state).await?))
}

/// Replace the settings document.
#[utoipa::path(
    put,
    path = "/admin/settings",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream")),
    request_body = ReplaceSettingsRequest,
    responses((status = 200, description = "Settings replaced", body = SettingsView))
)]
pub async fn replace_settings(
    State(state): State<SharedState>,
    Json(payload): Json<ReplaceSettingsRequest>,
) -> Result<Json<SettingsView>, AppError> {
    payload.validate()?;
    Ok(Json(settings_service::replace_settings(&state, payload).await?))
}

/// Merge-patch the settings document.
#[utoipa::path(
    patch,
    path = "/admin/settings",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream")),
    request_body = PatchSettingsRequest,
    responses((status = 200, description = "Settings updated", body = SettingsView))
)]
pub async fn patch_settings(
    State(state): State<SharedState>,
    Json(payload): Json<PatchSettingsRequest>,
) -> Result<Json<SettingsView>, AppError> {
    payload.validate()?;
    Ok(Json(settings_service::patch_settings(&state, payload).await?))
}

async fn require_admin_token(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let provided = req
        .headers()
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_owned())
        .ok_or_else(|| {
            AppError::Unauthorized("missing admin token header `X-Admin-Token`".into())
        })?;

    let expected = {
        let guard = state.admin_token().lock().await;
        guard.clone()
    };

    match expected {
        Some(token) if token == provided => Ok(next.run(req).await),
        Some(_) => Err(AppError::Unauthorized("invalid admin token".into())),
        None => Err(AppError::Unauthorized(
            "admin SSE stream not initialised yet".into(),
        )),
    }
}
