//! Board sessions: per-view progression through rounds and tile reveals.
//!
//! Sessions live in memory. Round changes also move the persisted live-round
//! pointer so a newly opened board starts where the game currently is.

use std::time::{Duration, Instant};

use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dao::models::RoundEntity,
    dto::board::{AnswerResponse, BoardSnapshot},
    error::ServiceError,
    services::{round_service::load_sorted_rounds, settings_service, sse_events},
    state::{
        SharedState,
        board::{BoardSession, Direction},
    },
};

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Start a board on the live round (or the first round when none is live).
pub async fn open_session(state: &SharedState) -> Result<BoardSnapshot, ServiceError> {
    let store = state.require_store().await?;
    let rounds = load_sorted_rounds(&store).await?;
    let settings = store.load_settings().await?;

    let session = BoardSession::new(&rounds, settings.current_round.as_deref());
    let snapshot = snapshot_of(state, &session, &rounds);
    state.boards().insert(session.id(), session);

    info!(session_id = %snapshot.session_id, round_id = ?snapshot.round.as_ref().map(|r| &r.id), "board session opened");
    sse_events::broadcast_board_updated(state, &snapshot);
    Ok(snapshot)
}

/// Current state of a board.
pub async fn get_session(state: &SharedState, session_id: Uuid) -> Result<BoardSnapshot, ServiceError> {
    let store = state.require_store().await?;
    let rounds = load_sorted_rounds(&store).await?;
    let mut board = state
        .boards()
        .get_mut(&session_id)
        .ok_or_else(|| session_not_found(session_id))?;
    board.touch(Instant::now());
    Ok(snapshot_of(state, &*board, &rounds))
}

/// Drop a board session.
pub fn close_session(state: &SharedState, session_id: Uuid) -> Result<(), ServiceError> {
    state
        .boards()
        .remove(&session_id)
        .ok_or_else(|| session_not_found(session_id))?;
    info!(%session_id, "board session closed");
    sse_events::broadcast_board_closed(state, session_id);
    Ok(())
}

/// Move a board to the adjacent round and persist it as the live round.
///
/// The session is only switched once the live-round pointer is written. A failed
/// write, or a caller that goes away mid-write, aborts the planned change and
/// leaves the board on its previous round.
pub async fn advance(
    state: &SharedState,
    session_id: Uuid,
    direction: Direction,
) -> Result<BoardSnapshot, ServiceError> {
    let store = state.require_store().await?;
    let rounds = load_sorted_rounds(&store).await?;

    let plan = {
        let mut board = state
            .boards()
            .get_mut(&session_id)
            .ok_or_else(|| session_not_found(session_id))?;
        board.touch(Instant::now());
        board.plan_advance(&rounds, direction)?
    };
    let pending = PendingRoundChange::new(state, session_id, plan.id);

    settings_service::set_current_round(state, &plan.target_round_id).await?;

    let snapshot = {
        let mut board = state
            .boards()
            .get_mut(&session_id)
            .ok_or_else(|| session_not_found(session_id))?;
        board.apply_round_change(plan.id)?;
        snapshot_of(state, &*board, &rounds)
    };
    pending.settle();

    info!(
        %session_id,
        round_id = %plan.target_round_id,
        round_index = plan.target_index,
        ?direction,
        "board moved to another round"
    );
    sse_events::broadcast_board_updated(state, &snapshot);
    Ok(snapshot)
}

/// Aborts a planned round change on drop unless it was settled.
struct PendingRoundChange<'a> {
    state: &'a SharedState,
    session_id: Uuid,
    plan_id: Uuid,
    settled: bool,
}

impl<'a> PendingRoundChange<'a> {
    fn new(state: &'a SharedState, session_id: Uuid, plan_id: Uuid) -> Self {
        Self {
            state,
            session_id,
            plan_id,
            settled: false,
        }
    }

    fn settle(mut self) {
        self.settled = true;
    }
}

impl Drop for PendingRoundChange<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let Some(mut board) = self.state.boards().get_mut(&self.session_id) else {
            return;
        };
        match board.abort_round_change(self.plan_id) {
            Ok(()) => warn!(session_id = %self.session_id, plan_id = %self.plan_id, "round change aborted"),
            // Apply already consumed the plan before failing its version check.
            Err(err) => debug!(session_id = %self.session_id, error = %err, "no round change left to abort"),
        }
    }
}

/// Drop every session unused for longer than `max_idle`, returning how many went.
pub fn evict_idle_sessions(state: &SharedState, now: Instant, max_idle: Duration) -> usize {
    let mut evicted = Vec::new();
    state.boards().retain(|id, board| {
        let keep = board.idle_for(now) <= max_idle;
        if !keep {
            evicted.push(*id);
        }
        keep
    });

    for session_id in &evicted {
        info!(%session_id, "idle board session dropped");
        sse_events::broadcast_board_closed(state, *session_id);
    }
    evicted.len()
}

/// Periodically drop board sessions whose clients went away without closing them.
pub async fn run_idle_sweeper(state: SharedState) {
    let max_idle = state.config().board_idle_timeout();
    let mut ticker = interval(SWEEP_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let evicted = evict_idle_sessions(&state, Instant::now(), max_idle);
        if evicted > 0 {
            debug!(evicted, remaining = state.boards().len(), "board sweep finished");
        }
    }
}

/// Open the question behind a hidden tile.
pub async fn open_tile(
    state: &SharedState,
    session_id: Uuid,
    tile_number: u32,
) -> Result<BoardSnapshot, ServiceError> {
    let window = state.config().answer_window();
    let snapshot = with_board(state, session_id, |board, rounds| {
        let round = board.current_round(rounds)?;
        board.open_tile(round, tile_number, Instant::now(), window)?;
        Ok(snapshot_of(state, board, rounds))
    })
    .await?;

    info!(%session_id, tile_number, "tile opened");
    sse_events::broadcast_board_updated(state, &snapshot);
    Ok(snapshot)
}

/// Judge an answer to the open question; a correct one reveals its tile.
pub async fn answer(
    state: &SharedState,
    session_id: Uuid,
    submitted: Option<String>,
) -> Result<AnswerResponse, ServiceError> {
    let window = state.config().answer_window();
    let response = with_board(state, session_id, |board, rounds| {
        let round = board.current_round(rounds)?;
        let outcome = board.answer(round, submitted.as_deref(), Instant::now(), window)?;
        Ok(AnswerResponse::new(outcome, snapshot_of(state, board, rounds)))
    })
    .await?;

    info!(
        %session_id,
        tile_number = response.tile_number,
        verdict = ?response.verdict,
        round_completed = response.round_completed,
        "answer judged"
    );
    sse_events::broadcast_board_updated(state, &response.board);
    Ok(response)
}

/// Hide every tile of the current round again.
pub async fn reset_round(state: &SharedState, session_id: Uuid) -> Result<BoardSnapshot, ServiceError> {
    let snapshot = with_board(state, session_id, |board, rounds| {
        board.reset_round();
        Ok(snapshot_of(state, board, rounds))
    })
    .await?;

    info!(%session_id, "board round reset");
    sse_events::broadcast_board_updated(state, &snapshot);
    Ok(snapshot)
}

/// Load the ordered rounds, then run `step` against the session without awaiting in between.
async fn with_board<T, F>(state: &SharedState, session_id: Uuid, step: F) -> Result<T, ServiceError>
where
    F: FnOnce(&mut BoardSession, &[RoundEntity]) -> Result<T, ServiceError>,
{
    let store = state.require_store().await?;
    let rounds = load_sorted_rounds(&store).await?;
    let mut board = state
        .boards()
        .get_mut(&session_id)
        .ok_or_else(|| session_not_found(session_id))?;
    board.touch(Instant::now());
    step(&mut *board, &rounds)
}

fn snapshot_of(state: &SharedState, board: &BoardSession, rounds: &[RoundEntity]) -> BoardSnapshot {
    BoardSnapshot::build(board, rounds, Instant::now(), state.config().answer_window())
}

fn session_not_found(session_id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("board session `{session_id}` not found"))
}

#[cfg(test)]
mod tests {
    use tokio::time::timeout;

    use super::*;
    use crate::{
        dto::{
            board::{AnswerVerdict, BoardPhaseKind},
            pool::{CreatePoolRequest, ImportQuestionsRequest, QuestionRow},
            round::CreateRoundRequest,
        },
        services::{assignment, pool_service, round_service, test_support::state_with_store},
    };

    async fn seed_two_rounds(state: &SharedState) -> Vec<String> {
        let pool = pool_service::create_pool(state, CreatePoolRequest { name: "Capitals".into() })
            .await
            .unwrap();
        let rows = [("France", "Paris"), ("Italy", "Rome"), ("Peru", "Lima")]
            .into_iter()
            .map(|(country, capital)| QuestionRow {
                text: format!("Capital of {country}?"),
                answer: capital.into(),
                image_url: None,
            })
            .collect();
        pool_service::import_questions(state, &pool.id, ImportQuestionsRequest { questions: rows })
            .await
            .unwrap();

        let mut ids = Vec::new();
        for (name, count) in [("First", 2), ("Second", 1)] {
            let round = round_service::create_round(
                state,
                CreateRoundRequest {
                    name: name.into(),
                    tile_count: None,
                    background_image: None,
                    question_pool_id: None,
                    points_per_question: None,
                },
            )
            .await
            .unwrap();
            assignment::assign_questions(state, &round.id, &pool.id, count)
                .await
                .unwrap();
            ids.push(round.id);
        }
        ids
    }

    async fn answer_for(state: &SharedState, round_id: &str, tile: u32) -> String {
        let store = state.require_store().await.unwrap();
        let rounds = store.load_rounds().await.unwrap();
        let round = rounds.iter().find(|round| round.id == round_id).unwrap();
        crate::state::board::question_for_tile(round, tile)
            .unwrap()
            .answer
            .clone()
    }

    #[tokio::test]
    async fn advancing_persists_the_live_round() {
        let (state, _dir) = state_with_store().await;
        let rounds = seed_two_rounds(&state).await;

        let board = open_session(&state).await.unwrap();
        assert_eq!(board.round_index, Some(0));
        assert!(board.can_go_forward);

        let board = advance(&state, board.session_id, Direction::Forward).await.unwrap();
        assert_eq!(board.round.as_ref().map(|r| r.id.as_str()), Some(rounds[1].as_str()));

        let settings = settings_service::get_settings(&state).await.unwrap();
        assert_eq!(settings.current_round.as_deref(), Some(rounds[1].as_str()));

        let next = open_session(&state).await.unwrap();
        assert_eq!(next.round_index, Some(1));

        assert!(matches!(
            advance(&state, board.session_id, Direction::Forward).await,
            Err(ServiceError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn answering_every_tile_completes_the_round() {
        let (state, _dir) = state_with_store().await;
        let rounds = seed_two_rounds(&state).await;
        let session_id = open_session(&state).await.unwrap().session_id;

        for tile in 1..=2 {
            open_tile(&state, session_id, tile).await.unwrap();
            let wrong = answer(&state, session_id, Some("Atlantis".into())).await.unwrap();
            assert_eq!(wrong.verdict, AnswerVerdict::Incorrect);

            open_tile(&state, session_id, tile).await.unwrap();
            let expected = answer_for(&state, &rounds[0], tile).await;
            let right = answer(&state, session_id, Some(format!("  {}  ", expected.to_uppercase())))
                .await
                .unwrap();
            assert_eq!(right.verdict, AnswerVerdict::Correct);
        }

        let board = get_session(&state, session_id).await.unwrap();
        assert!(board.all_tiles_revealed);
        assert_eq!(board.phase, BoardPhaseKind::Completed);
        assert_eq!(board.round_index, Some(0));

        let board = reset_round(&state, session_id).await.unwrap();
        assert!(board.revealed_tiles.is_empty());
        assert_eq!(board.phase, BoardPhaseKind::Choosing);
    }

    #[tokio::test]
    async fn skipped_answer_keeps_tile_hidden() {
        let (state, _dir) = state_with_store().await;
        seed_two_rounds(&state).await;
        let session_id = open_session(&state).await.unwrap().session_id;

        let opened = open_tile(&state, session_id, 1).await.unwrap();
        assert_eq!(opened.open_question.as_ref().map(|q| q.tile_number), Some(1));

        let response = answer(&state, session_id, None).await.unwrap();
        assert_eq!(response.verdict, AnswerVerdict::Skipped);
        assert!(response.board.revealed_tiles.is_empty());
    }

    #[tokio::test]
    async fn closed_sessions_are_gone() {
        let (state, _dir) = state_with_store().await;
        let session_id = open_session(&state).await.unwrap().session_id;

        close_session(&state, session_id).unwrap();

        assert!(matches!(
            get_session(&state, session_id).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(close_session(&state, session_id).is_err());
    }

    #[tokio::test]
    async fn abandoned_advance_releases_the_session() {
        let (state, _dir) = state_with_store().await;
        let rounds = seed_two_rounds(&state).await;
        let session_id = open_session(&state).await.unwrap().session_id;

        let settings_gate = state.gates().settings.lock().await;
        let abandoned = timeout(
            Duration::from_millis(50),
            advance(&state, session_id, Direction::Forward),
        )
        .await;
        assert!(abandoned.is_err());
        drop(settings_gate);

        let board = advance(&state, session_id, Direction::Forward).await.unwrap();
        assert_eq!(board.round.as_ref().map(|r| r.id.as_str()), Some(rounds[1].as_str()));
        let board = advance(&state, session_id, Direction::Backward).await.unwrap();
        assert_eq!(board.round_index, Some(0));
    }

    #[tokio::test]
    async fn idle_sessions_are_swept() {
        let (state, _dir) = state_with_store().await;
        let stale = open_session(&state).await.unwrap().session_id;
        let fresh = open_session(&state).await.unwrap().session_id;
        let max_idle = Duration::from_secs(60 * 60);

        let soon = Instant::now() + Duration::from_secs(60);
        assert_eq!(evict_idle_sessions(&state, soon, max_idle), 0);

        let later = Instant::now() + Duration::from_secs(2 * 60 * 60);
        state.boards().get_mut(&fresh).unwrap().touch(later);
        assert_eq!(evict_idle_sessions(&state, later, max_idle), 1);

        assert!(state.boards().contains_key(&fresh));
        assert!(matches!(
            get_session(&state, stale).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
