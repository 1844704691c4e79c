//! Board session payloads consumed by the spectator view.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dao::models::RoundEntity,
    state::board::{AnswerOutcome, BoardPhase, BoardSession, Direction, question_for_tile},
};

/// Which way a board should move through the rounds.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AdvanceDirection {
    Forward,
    Backward,
}

impl From<AdvanceDirection> for Direction {
    fn from(value: AdvanceDirection) -> Self {
        match value {
            AdvanceDirection::Forward => Direction::Forward,
            AdvanceDirection::Backward => Direction::Backward,
        }
    }
}

/// Request body for a round change.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AdvanceRequest {
    pub direction: AdvanceDirection,
}

/// Answer submitted for the open question. A missing answer discards the attempt.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct AnswerRequest {
    #[serde(default)]
    pub answer: Option<String>,
}

/// Coarse phase of the board grid.
#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BoardPhaseKind {
    Choosing,
    Answering,
    Completed,
}

/// Question currently displayed over the grid.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OpenQuestionView {
    pub tile_number: u32,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub seconds_left: u64,
}

/// Round shown by a board.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BoardRoundView {
    pub id: String,
    pub name: String,
    pub background_image: String,
    pub points_per_question: u32,
    pub tile_numbers: Vec<u32>,
}

/// Full state of a board session.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BoardSnapshot {
    pub session_id: Uuid,
    pub version: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round: Option<BoardRoundView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round_index: Option<usize>,
    pub round_count: usize,
    pub phase: BoardPhaseKind,
    pub revealed_tiles: Vec<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_question: Option<OpenQuestionView>,
    pub all_tiles_revealed: bool,
    pub can_go_back: bool,
    pub can_go_forward: bool,
}

impl BoardSnapshot {
    /// Project a session against the ordered rounds.
    pub fn build(
        session: &BoardSession,
        rounds: &[RoundEntity],
        now: Instant,
        window: Duration,
    ) -> Self {
        let round_index = session.round_index(rounds);
        let round = round_index.map(|index| &rounds[index]);

        let phase = match session.phase() {
            BoardPhase::Choosing => BoardPhaseKind::Choosing,
            BoardPhase::Answering { .. } => BoardPhaseKind::Answering,
            BoardPhase::Completed => BoardPhaseKind::Completed,
        };

        let open_question = match (session.phase(), round) {
            (BoardPhase::Answering { tile_number, .. }, Some(round)) => {
                question_for_tile(round, *tile_number).map(|question| OpenQuestionView {
                    tile_number: *tile_number,
                    text: question.text.clone(),
                    image_url: question.image_url.clone(),
                    seconds_left: session
                        .time_left(now, window)
                        .map(|left| left.as_secs())
                        .unwrap_or_default(),
                })
            }
            _ => None,
        };

        Self {
            session_id: session.id(),
            version: session.version(),
            round: round.map(|round| {
                let mut tile_numbers: Vec<u32> = round
                    .active_questions
                    .iter()
                    .filter_map(|question| question.tile_number)
                    .collect();
                tile_numbers.sort_unstable();
                BoardRoundView {
                    id: round.id.clone(),
                    name: round.name.clone(),
                    background_image: round.background_image.clone(),
                    points_per_question: round.points_per_question,
                    tile_numbers,
                }
            }),
            round_index,
            round_count: rounds.len(),
            phase,
            revealed_tiles: session.revealed_tiles().collect(),
            open_question,
            all_tiles_revealed: round.is_some_and(|round| session.all_tiles_revealed(round)),
            can_go_back: round_index.is_some_and(|index| index > 0),
            can_go_forward: match round_index {
                Some(index) => index + 1 < rounds.len(),
                None => !rounds.is_empty(),
            },
        }
    }
}

/// How an answer attempt was judged.
#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnswerVerdict {
    Correct,
    Incorrect,
    TimedOut,
    Skipped,
}

/// Result of an answer together with the updated board.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResponse {
    pub verdict: AnswerVerdict,
    pub tile_number: u32,
    pub round_completed: bool,
    pub board: BoardSnapshot,
}

impl AnswerResponse {
    pub fn new(outcome: AnswerOutcome, board: BoardSnapshot) -> Self {
        let (verdict, tile_number, round_completed) = match outcome {
            AnswerOutcome::Correct {
                tile_number,
                completed,
            } => (AnswerVerdict::Correct, tile_number, completed),
            AnswerOutcome::Incorrect { tile_number } => {
                (AnswerVerdict::Incorrect, tile_number, false)
            }
            AnswerOutcome::TimedOut { tile_number } => (AnswerVerdict::TimedOut, tile_number, false),
            AnswerOutcome::Skipped { tile_number } => (AnswerVerdict::Skipped, tile_number, false),
        };
        Self {
            verdict,
            tile_number,
            round_completed,
            board,
        }
    }
}
