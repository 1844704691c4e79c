//! Per-board progression through the ordered rounds and the reveal state of the current grid.
//!
//! A board session tracks which round a spectator view shows, which tiles have been
//! revealed and whether a question is currently open. Round changes go through a
//! plan/apply cycle so the persisted live-round pointer can be written in between:
//! a failed write aborts the plan and leaves the session on its previous round.

use std::{
    collections::BTreeSet,
    time::{Duration, Instant},
};

use thiserror::Error;
use uuid::Uuid;

use crate::dao::models::{QuestionEntity, RoundEntity};

/// Direction of a round change requested by the game master.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Move to the next round in order.
    Forward,
    /// Move back to the previous round.
    Backward,
}

/// Fine-grained phase of the grid for the current round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardPhase {
    /// Waiting for a hidden tile to be picked.
    Choosing,
    /// A tile's question is on screen and awaits an answer.
    Answering {
        /// Tile whose question is open.
        tile_number: u32,
        /// When the question was opened; the answer window runs from here.
        opened_at: Instant,
    },
    /// Every tile is revealed; the full background is shown until the round changes or resets.
    Completed,
}

/// Result of an answer attempt on the open question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// The answer matched; the tile is now revealed.
    Correct {
        /// Revealed tile.
        tile_number: u32,
        /// Whether this reveal uncovered the last hidden tile.
        completed: bool,
    },
    /// The answer did not match; the tile stays hidden.
    Incorrect {
        /// Tile that stays hidden.
        tile_number: u32,
    },
    /// The answer arrived after the window closed and was discarded.
    TimedOut {
        /// Tile that stays hidden.
        tile_number: u32,
    },
    /// No answer was submitted; the attempt was discarded.
    Skipped {
        /// Tile that stays hidden.
        tile_number: u32,
    },
}

/// Failures raised by board operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProgressionError {
    #[error("no rounds have been configured")]
    NoRounds,
    #[error("the board is not showing any round")]
    NoCurrentRound,
    #[error("cannot move {direction:?} from round index {from} of {count}")]
    OutOfRange {
        from: usize,
        count: usize,
        direction: Direction,
    },
    #[error("tile {0} is not bound to a question in this round")]
    UnknownTile(u32),
    #[error("tile {0} is already revealed")]
    TileAlreadyRevealed(u32),
    #[error("the question for tile {0} is still open")]
    QuestionAlreadyOpen(u32),
    #[error("no question is open")]
    NoOpenQuestion,
    #[error("every tile of this round is already revealed")]
    RoundCompleted,
    #[error("a round change is already pending")]
    AlreadyPending,
    #[error("no round change is pending")]
    NoPending,
    #[error("round change plan does not match the pending one")]
    PlanMismatch,
    #[error("board changed while the round change was pending (expected version {expected}, got {actual})")]
    VersionMismatch { expected: usize, actual: usize },
}

/// Validated but not yet applied round change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundChangePlan {
    /// Unique identifier for this plan.
    pub id: Uuid,
    /// Round the board will show once the plan is applied.
    pub target_round_id: String,
    /// Position of the target round in the ordered list.
    pub target_index: usize,
    /// Board version the plan was computed against.
    pub base_version: usize,
}

/// Progression state held for one spectator board.
#[derive(Debug, Clone)]
pub struct BoardSession {
    id: Uuid,
    round_id: Option<String>,
    revealed: BTreeSet<u32>,
    phase: BoardPhase,
    version: usize,
    pending: Option<RoundChangePlan>,
    last_active: Instant,
}

impl BoardSession {
    /// Start a session on the live round when it still exists, otherwise on the first round.
    ///
    /// `rounds` must be sorted by `order`.
    pub fn new(rounds: &[RoundEntity], live_round: Option<&str>) -> Self {
        let round_id = live_round
            .and_then(|id| rounds.iter().find(|round| round.id == id))
            .or_else(|| rounds.first())
            .map(|round| round.id.clone());

        Self {
            id: Uuid::new_v4(),
            round_id,
            revealed: BTreeSet::new(),
            phase: BoardPhase::Choosing,
            version: 0,
            pending: None,
            last_active: Instant::now(),
        }
    }

    /// Record that a client used the session at `now`.
    pub fn touch(&mut self, now: Instant) {
        self.last_active = self.last_active.max(now);
    }

    /// Time since the session was last used.
    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_active)
    }

    /// Identifier of the session.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Identifier of the round the board shows.
    pub fn round_id(&self) -> Option<&str> {
        self.round_id.as_deref()
    }

    /// Tiles revealed in the current round, ascending.
    pub fn revealed_tiles(&self) -> impl Iterator<Item = u32> + '_ {
        self.revealed.iter().copied()
    }

    /// Whether `tile_number` is revealed in the current round.
    pub fn is_revealed(&self, tile_number: u32) -> bool {
        self.revealed.contains(&tile_number)
    }

    /// Current grid phase.
    pub fn phase(&self) -> &BoardPhase {
        &self.phase
    }

    /// Monotonic counter bumped on every change of the session.
    pub fn version(&self) -> usize {
        self.version
    }

    /// Position of the current round in `rounds` (sorted by `order`).
    pub fn round_index(&self, rounds: &[RoundEntity]) -> Option<usize> {
        let id = self.round_id.as_deref()?;
        rounds.iter().position(|round| round.id == id)
    }

    /// Resolve the current round within `rounds`.
    pub fn current_round<'a>(
        &self,
        rounds: &'a [RoundEntity],
    ) -> Result<&'a RoundEntity, ProgressionError> {
        self.round_index(rounds)
            .map(|index| &rounds[index])
            .ok_or(ProgressionError::NoCurrentRound)
    }

    /// Plan a move to the adjacent round, reserving the session until the plan is applied or aborted.
    pub fn plan_advance(
        &mut self,
        rounds: &[RoundEntity],
        direction: Direction,
    ) -> Result<RoundChangePlan, ProgressionError> {
        if self.pending.is_some() {
            return Err(ProgressionError::AlreadyPending);
        }
        if rounds.is_empty() {
            return Err(ProgressionError::NoRounds);
        }

        let target_index = match (self.round_index(rounds), direction) {
            // A board whose round vanished restarts from the top.
            (None, Direction::Forward) => 0,
            (None, Direction::Backward) => return Err(ProgressionError::NoCurrentRound),
            (Some(from), Direction::Forward) if from + 1 < rounds.len() => from + 1,
            (Some(from), Direction::Backward) if from > 0 => from - 1,
            (Some(from), direction) => {
                return Err(ProgressionError::OutOfRange {
                    from,
                    count: rounds.len(),
                    direction,
                });
            }
        };

        let plan = RoundChangePlan {
            id: Uuid::new_v4(),
            target_round_id: rounds[target_index].id.clone(),
            target_index,
            base_version: self.version,
        };
        self.pending = Some(plan.clone());
        Ok(plan)
    }

    /// Apply a pending plan: switch rounds and clear the reveal state.
    pub fn apply_round_change(&mut self, plan_id: Uuid) -> Result<(), ProgressionError> {
        let plan = self.pending.take().ok_or(ProgressionError::NoPending)?;
        if plan.id != plan_id {
            self.pending = Some(plan);
            return Err(ProgressionError::PlanMismatch);
        }
        if plan.base_version != self.version {
            return Err(ProgressionError::VersionMismatch {
                expected: plan.base_version,
                actual: self.version,
            });
        }

        self.round_id = Some(plan.target_round_id);
        self.clear_grid();
        Ok(())
    }

    /// Drop a pending plan without touching the board.
    pub fn abort_round_change(&mut self, plan_id: Uuid) -> Result<(), ProgressionError> {
        match &self.pending {
            None => Err(ProgressionError::NoPending),
            Some(plan) if plan.id != plan_id => Err(ProgressionError::PlanMismatch),
            Some(_) => {
                self.pending = None;
                Ok(())
            }
        }
    }

    /// Open the question bound to a hidden tile.
    pub fn open_tile<'a>(
        &mut self,
        round: &'a RoundEntity,
        tile_number: u32,
        now: Instant,
        window: Duration,
    ) -> Result<&'a QuestionEntity, ProgressionError> {
        self.expire_open_question(now, window);
        match self.phase {
            BoardPhase::Choosing => {}
            BoardPhase::Answering { tile_number, .. } => {
                return Err(ProgressionError::QuestionAlreadyOpen(tile_number));
            }
            BoardPhase::Completed => return Err(ProgressionError::RoundCompleted),
        }

        let question = question_for_tile(round, tile_number)
            .ok_or(ProgressionError::UnknownTile(tile_number))?;
        if self.revealed.contains(&tile_number) {
            return Err(ProgressionError::TileAlreadyRevealed(tile_number));
        }

        self.phase = BoardPhase::Answering {
            tile_number,
            opened_at: now,
        };
        self.version += 1;
        Ok(question)
    }

    /// Judge an answer for the open question. `None` discards the attempt.
    pub fn answer(
        &mut self,
        round: &RoundEntity,
        submitted: Option<&str>,
        now: Instant,
        window: Duration,
    ) -> Result<AnswerOutcome, ProgressionError> {
        let BoardPhase::Answering {
            tile_number,
            opened_at,
        } = self.phase
        else {
            return Err(ProgressionError::NoOpenQuestion);
        };

        self.phase = BoardPhase::Choosing;
        self.version += 1;

        if now.saturating_duration_since(opened_at) > window {
            return Ok(AnswerOutcome::TimedOut { tile_number });
        }
        let Some(submitted) = submitted else {
            return Ok(AnswerOutcome::Skipped { tile_number });
        };
        let question =
            question_for_tile(round, tile_number).ok_or(ProgressionError::UnknownTile(tile_number))?;
        if !answers_match(submitted, &question.answer) {
            return Ok(AnswerOutcome::Incorrect { tile_number });
        }

        let completed = self.reveal_tile(round, tile_number)?;
        Ok(AnswerOutcome::Correct {
            tile_number,
            completed,
        })
    }

    /// Whether every tile bound in `round` has been revealed.
    pub fn all_tiles_revealed(&self, round: &RoundEntity) -> bool {
        !round.active_questions.is_empty()
            && round
                .active_questions
                .iter()
                .filter_map(|question| question.tile_number)
                .all(|tile| self.revealed.contains(&tile))
    }

    /// Hide every tile again so the current round can be replayed.
    pub fn reset_round(&mut self) {
        self.clear_grid();
    }

    /// Seconds left to answer the open question, if any.
    pub fn time_left(&self, now: Instant, window: Duration) -> Option<Duration> {
        match self.phase {
            BoardPhase::Answering { opened_at, .. } => {
                Some(window.saturating_sub(now.saturating_duration_since(opened_at)))
            }
            _ => None,
        }
    }

    /// Mark a tile revealed after its question was answered correctly, returning
    /// whether the grid is now complete.
    fn reveal_tile(&mut self, round: &RoundEntity, tile_number: u32) -> Result<bool, ProgressionError> {
        if !self.revealed.insert(tile_number) {
            return Err(ProgressionError::TileAlreadyRevealed(tile_number));
        }
        let completed = self.all_tiles_revealed(round);
        if completed {
            self.phase = BoardPhase::Completed;
        }
        Ok(completed)
    }

    fn expire_open_question(&mut self, now: Instant, window: Duration) {
        if let BoardPhase::Answering { opened_at, .. } = self.phase {
            if now.saturating_duration_since(opened_at) > window {
                self.phase = BoardPhase::Choosing;
                self.version += 1;
            }
        }
    }

    fn clear_grid(&mut self) {
        self.revealed.clear();
        self.phase = BoardPhase::Choosing;
        self.version += 1;
    }
}

/// Compare a submitted answer with the expected one, ignoring surrounding whitespace and case.
pub fn answers_match(submitted: &str, expected: &str) -> bool {
    submitted.trim().to_lowercase() == expected.trim().to_lowercase()
}

/// Question bound to `tile_number` in `round`.
pub fn question_for_tile(round: &RoundEntity, tile_number: u32) -> Option<&QuestionEntity> {
    round
        .active_questions
        .iter()
        .find(|question| question.tile_number == Some(tile_number))
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(30);

    fn question(id: &str, answer: &str, tile: u32) -> QuestionEntity {
        QuestionEntity {
            id: id.into(),
            text: format!("question {id}"),
            answer: answer.into(),
            image_url: None,
            tile_number: Some(tile),
            pool_id: Some("pool".into()),
        }
    }

    fn round(id: &str, order: usize, answers: &[&str]) -> RoundEntity {
        RoundEntity {
            id: id.into(),
            name: format!("round {id}"),
            tile_count: answers.len() as u32,
            background_image: "/uploads/bg.png".into(),
            order,
            question_pool_id: Some("pool".into()),
            active_questions: answers
                .iter()
                .enumerate()
                .map(|(i, answer)| question(&format!("{id}-q{i}"), answer, i as u32 + 1))
                .collect(),
            points_per_question: 100,
        }
    }

    fn rounds() -> Vec<RoundEntity> {
        vec![
            round("r0", 0, &["paris", "rome"]),
            round("r1", 1, &["berlin"]),
            round("r2", 2, &["oslo"]),
        ]
    }

    fn advance(session: &mut BoardSession, rounds: &[RoundEntity], direction: Direction) {
        let plan = session.plan_advance(rounds, direction).unwrap();
        session.apply_round_change(plan.id).unwrap();
    }

    #[test]
    fn answer_comparison_trims_and_ignores_case() {
        assert!(answers_match(" Paris ", "paris"));
        assert!(answers_match("PARIS", "  Paris"));
        assert!(!answers_match("Pari", "paris"));
    }

    #[test]
    fn new_session_starts_on_live_round_or_first() {
        let rounds = rounds();
        assert_eq!(BoardSession::new(&rounds, Some("r1")).round_id(), Some("r1"));
        assert_eq!(BoardSession::new(&rounds, Some("gone")).round_id(), Some("r0"));
        assert_eq!(BoardSession::new(&rounds, None).round_id(), Some("r0"));
        assert_eq!(BoardSession::new(&[], None).round_id(), None);
    }

    #[test]
    fn correct_answer_reveals_tile() {
        let rounds = rounds();
        let mut session = BoardSession::new(&rounds, None);
        let now = Instant::now();

        let opened = session.open_tile(&rounds[0], 1, now, WINDOW).unwrap();
        assert_eq!(opened.answer, "paris");

        let outcome = session
            .answer(&rounds[0], Some(" Paris "), now, WINDOW)
            .unwrap();
        assert_eq!(
            outcome,
            AnswerOutcome::Correct {
                tile_number: 1,
                completed: false
            }
        );
        assert!(session.is_revealed(1));
        assert_eq!(session.phase(), &BoardPhase::Choosing);
    }

    #[test]
    fn wrong_skipped_and_late_answers_keep_tile_hidden() {
        let rounds = rounds();
        let mut session = BoardSession::new(&rounds, None);
        let now = Instant::now();

        session.open_tile(&rounds[0], 1, now, WINDOW).unwrap();
        assert_eq!(
            session.answer(&rounds[0], Some("lyon"), now, WINDOW).unwrap(),
            AnswerOutcome::Incorrect { tile_number: 1 }
        );

        session.open_tile(&rounds[0], 1, now, WINDOW).unwrap();
        assert_eq!(
            session.answer(&rounds[0], None, now, WINDOW).unwrap(),
            AnswerOutcome::Skipped { tile_number: 1 }
        );

        session.open_tile(&rounds[0], 1, now, WINDOW).unwrap();
        let late = now + WINDOW + Duration::from_secs(1);
        assert_eq!(
            session.answer(&rounds[0], Some("paris"), late, WINDOW).unwrap(),
            AnswerOutcome::TimedOut { tile_number: 1 }
        );

        assert!(!session.is_revealed(1));
    }

    #[test]
    fn expired_question_does_not_block_next_tile() {
        let rounds = rounds();
        let mut session = BoardSession::new(&rounds, None);
        let now = Instant::now();

        session.open_tile(&rounds[0], 1, now, WINDOW).unwrap();
        assert_eq!(
            session.open_tile(&rounds[0], 2, now, WINDOW).unwrap_err(),
            ProgressionError::QuestionAlreadyOpen(1)
        );

        let later = now + WINDOW + Duration::from_millis(1);
        assert!(session.open_tile(&rounds[0], 2, later, WINDOW).is_ok());
    }

    #[test]
    fn revealed_and_unknown_tiles_cannot_be_opened() {
        let rounds = rounds();
        let mut session = BoardSession::new(&rounds, None);
        let now = Instant::now();

        session.open_tile(&rounds[0], 1, now, WINDOW).unwrap();
        session.answer(&rounds[0], Some("paris"), now, WINDOW).unwrap();

        assert_eq!(
            session.open_tile(&rounds[0], 1, now, WINDOW).unwrap_err(),
            ProgressionError::TileAlreadyRevealed(1)
        );
        assert_eq!(
            session.open_tile(&rounds[0], 9, now, WINDOW).unwrap_err(),
            ProgressionError::UnknownTile(9)
        );
        assert_eq!(
            session.answer(&rounds[0], Some("rome"), now, WINDOW).unwrap_err(),
            ProgressionError::NoOpenQuestion
        );
    }

    #[test]
    fn revealing_every_tile_completes_round_without_advancing() {
        let rounds = rounds();
        let mut session = BoardSession::new(&rounds, None);
        let now = Instant::now();

        for (tile, answer) in [(1, "paris"), (2, "rome")] {
            session.open_tile(&rounds[0], tile, now, WINDOW).unwrap();
            session.answer(&rounds[0], Some(answer), now, WINDOW).unwrap();
        }

        assert!(session.all_tiles_revealed(&rounds[0]));
        assert_eq!(session.phase(), &BoardPhase::Completed);
        assert_eq!(session.round_id(), Some("r0"));
        assert_eq!(
            session.open_tile(&rounds[0], 1, now, WINDOW).unwrap_err(),
            ProgressionError::RoundCompleted
        );

        session.reset_round();
        assert_eq!(session.revealed_tiles().count(), 0);
        assert_eq!(session.phase(), &BoardPhase::Choosing);
    }

    #[test]
    fn round_without_questions_is_never_complete() {
        let empty = round("r9", 0, &[]);
        let session = BoardSession::new(std::slice::from_ref(&empty), None);
        assert!(!session.all_tiles_revealed(&empty));
    }

    #[test]
    fn advance_moves_within_bounds_and_clears_reveals() {
        let rounds = rounds();
        let mut session = BoardSession::new(&rounds, None);
        let now = Instant::now();
        session.open_tile(&rounds[0], 1, now, WINDOW).unwrap();
        session.answer(&rounds[0], Some("paris"), now, WINDOW).unwrap();

        let err = session.plan_advance(&rounds, Direction::Backward).unwrap_err();
        assert_eq!(
            err,
            ProgressionError::OutOfRange {
                from: 0,
                count: 3,
                direction: Direction::Backward
            }
        );

        advance(&mut session, &rounds, Direction::Forward);
        assert_eq!(session.round_id(), Some("r1"));
        assert_eq!(session.revealed_tiles().count(), 0);

        advance(&mut session, &rounds, Direction::Forward);
        assert!(matches!(
            session.plan_advance(&rounds, Direction::Forward),
            Err(ProgressionError::OutOfRange { from: 2, .. })
        ));

        advance(&mut session, &rounds, Direction::Backward);
        assert_eq!(session.round_id(), Some("r1"));
    }

    #[test]
    fn aborted_plan_leaves_round_untouched() {
        let rounds = rounds();
        let mut session = BoardSession::new(&rounds, None);

        let plan = session.plan_advance(&rounds, Direction::Forward).unwrap();
        assert_eq!(
            session.plan_advance(&rounds, Direction::Forward).unwrap_err(),
            ProgressionError::AlreadyPending
        );
        session.abort_round_change(plan.id).unwrap();

        assert_eq!(session.round_id(), Some("r0"));
        assert_eq!(
            session.apply_round_change(plan.id).unwrap_err(),
            ProgressionError::NoPending
        );
    }

    #[test]
    fn plan_is_rejected_when_board_changed_meanwhile() {
        let rounds = rounds();
        let mut session = BoardSession::new(&rounds, None);
        let now = Instant::now();

        let plan = session.plan_advance(&rounds, Direction::Forward).unwrap();
        session.open_tile(&rounds[0], 1, now, WINDOW).unwrap();

        assert!(matches!(
            session.apply_round_change(plan.id),
            Err(ProgressionError::VersionMismatch { .. })
        ));
        assert_eq!(session.round_id(), Some("r0"));
    }

    #[test]
    fn touching_restarts_the_idle_clock() {
        let mut session = BoardSession::new(&rounds(), None);
        let later = Instant::now() + Duration::from_secs(600);
        assert!(session.idle_for(later) >= Duration::from_secs(600));

        session.touch(later);
        assert_eq!(session.idle_for(later), Duration::ZERO);
        assert_eq!(session.idle_for(later + WINDOW), WINDOW);
    }
}
