use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::board::{AdvanceRequest, AnswerRequest, AnswerResponse, BoardSnapshot},
    error::AppError,
    services::board_service,
    state::SharedState,
};

/// Board session endpoints driven by the game screen.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/board/sessions", post(open_session))
        .route(
            "/board/sessions/{id}",
            get(get_session).delete(close_session),
        )
        .route("/board/sessions/{id}/advance", post(advance))
        .route("/board/sessions/{id}/tiles/{tile}/open", post(open_tile))
        .route("/board/sessions/{id}/answer", post(answer))
        .route("/board/sessions/{id}/reset", post(reset_round))
}

#[utoipa::path(
    post,
    path = "/board/sessions",
    tag = "board",
    responses(
        (status = 201, description = "Board opened on the live round", body = BoardSnapshot),
        (status = 503, description = "Storage unavailable")
    )
)]
/// Open a board session on the live round, or the first round when none is live.
pub async fn open_session(
    State(state): State<SharedState>,
) -> Result<(StatusCode, Json<BoardSnapshot>), AppError> {
    let snapshot = board_service::open_session(&state).await?;
    Ok((StatusCode::CREATED, Json(snapshot)))
}

#[utoipa::path(
    get,
    path = "/board/sessions/{id}",
    tag = "board",
    params(("id" = Uuid, Path, description = "Board session identifier")),
    responses(
        (status = 200, description = "Board state", body = BoardSnapshot),
        (status = 404, description = "Unknown session")
    )
)]
/// Return the current state of a board.
pub async fn get_session(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BoardSnapshot>, AppError> {
    Ok(Json(board_service::get_session(&state, id).await?))
}

#[utoipa::path(
    delete,
    path = "/board/sessions/{id}",
    tag = "board",
    params(("id" = Uuid, Path, description = "Board session identifier")),
    responses(
        (status = 204, description = "Session closed"),
        (status = 404, description = "Unknown session")
    )
)]
/// Close a board session.
pub async fn close_session(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    board_service::close_session(&state, id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/board/sessions/{id}/advance",
    tag = "board",
    params(("id" = Uuid, Path, description = "Board session identifier")),
    request_body = AdvanceRequest,
    responses(
        (status = 200, description = "Board moved and live round persisted", body = BoardSnapshot),
        (status = 409, description = "No round in that direction")
    )
)]
/// Move to the next or previous round.
pub async fn advance(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AdvanceRequest>,
) -> Result<Json<BoardSnapshot>, AppError> {
    Ok(Json(
        board_service::advance(&state, id, payload.direction.into()).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/board/sessions/{id}/tiles/{tile}/open",
    tag = "board",
    params(
        ("id" = Uuid, Path, description = "Board session identifier"),
        ("tile" = u32, Path, description = "Tile number, starting at 1")
    ),
    responses(
        (status = 200, description = "Question opened", body = BoardSnapshot),
        (status = 404, description = "No question on that tile"),
        (status = 409, description = "Tile already revealed or another question open")
    )
)]
/// Open the question behind a hidden tile and start the answer window.
pub async fn open_tile(
    State(state): State<SharedState>,
    Path((id, tile)): Path<(Uuid, u32)>,
) -> Result<Json<BoardSnapshot>, AppError> {
    Ok(Json(board_service::open_tile(&state, id, tile).await?))
}

#[utoipa::path(
    post,
    path = "/board/sessions/{id}/answer",
    tag = "board",
    params(("id" = Uuid, Path, description = "Board session identifier")),
    request_body = AnswerRequest,
    responses(
        (status = 200, description = "Answer judged", body = AnswerResponse),
        (status = 409, description = "No question is open")
    )
)]
/// Submit an answer for the open question; omit `answer` to skip it.
pub async fn answer(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AnswerRequest>,
) -> Result<Json<AnswerResponse>, AppError> {
    Ok(Json(board_service::answer(&state, id, payload.answer).await?))
}

#[utoipa::path(
    post,
    path = "/board/sessions/{id}/reset",
    tag = "board",
    params(("id" = Uuid, Path, description = "Board session identifier")),
    responses((status = 200, description = "Every tile hidden again", body = BoardSnapshot))
)]
/// Hide every tile of the current round.
pub async fn reset_round(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BoardSnapshot>, AppError> {
    Ok(Json(board_service::reset_round(&state, id).await?))
}
