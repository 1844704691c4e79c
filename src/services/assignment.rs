//! Random, non-repeating question draws from a pool into a round.

use std::collections::HashSet;

use rand::{Rng, seq::SliceRandom};
use tracing::info;

use crate::{
    dao::models::{QuestionEntity, QuestionPoolEntity, RoundEntity},
    dto::pool::QuestionView,
    error::ServiceError,
    services::sse_events,
    state::SharedState,
};

/// Draw `count` questions from `pool` that no round drawn from the same pool holds yet.
///
/// The target round counts as a holder too, so re-assigning a round never repeats
/// its current questions. Selected copies are bound to tiles `1..=count` in draw order.
pub fn select_questions<R>(
    rounds: &[RoundEntity],
    pool: &QuestionPoolEntity,
    count: usize,
    rng: &mut R,
) -> Result<Vec<QuestionEntity>, ServiceError>
where
    R: Rng + ?Sized,
{
    let used: HashSet<&str> = rounds
        .iter()
        .filter(|round| round.question_pool_id.as_deref() == Some(pool.id.as_str()))
        .flat_map(|round| round.active_questions.iter())
        .map(|question| question.id.as_str())
        .collect();

    let mut available: Vec<&QuestionEntity> = pool
        .questions
        .iter()
        .filter(|question| !used.contains(question.id.as_str()))
        .collect();

    if available.len() < count {
        return Err(ServiceError::InsufficientSupply {
            available: available.len(),
            requested: count,
        });
    }

    let (drawn, _) = available.partial_shuffle(rng, count);
    Ok(drawn
        .iter()
        .zip(1u32..)
        .map(|(question, tile_number)| QuestionEntity {
            tile_number: Some(tile_number),
            pool_id: Some(pool.id.clone()),
            ..(*question).clone()
        })
        .collect())
}

/// Replace a round's active questions with a fresh draw from `pool_id`.
///
/// The round is left untouched when the pool cannot supply enough questions.
pub async fn assign_questions(
    state: &SharedState,
    round_id: &str,
    pool_id: &str,
    count: usize,
) -> Result<Vec<QuestionView>, ServiceError> {
    if pool_id.trim().is_empty() {
        return Err(ServiceError::InvalidInput("poolId is required".into()));
    }
    if count == 0 {
        return Err(ServiceError::InvalidInput("count must be at least 1".into()));
    }

    let store = state.require_store().await?;
    let assigned = {
        let _gate = state.gates().rounds.lock().await;
        let mut rounds = store.load_rounds().await?;
        let index = rounds
            .iter()
            .position(|round| round.id == round_id)
            .ok_or_else(|| ServiceError::NotFound(format!("round `{round_id}` not found")))?;

        let pools = store.load_pools().await?;
        let pool = pools
            .iter()
            .find(|pool| pool.id == pool_id)
            .ok_or_else(|| ServiceError::NotFound(format!("pool `{pool_id}` not found")))?;

        let selected = select_questions(&rounds, pool, count, &mut rand::rng())?;

        let round = &mut rounds[index];
        round.active_questions = selected.clone();
        round.question_pool_id = Some(pool_id.to_string());
        store.save_rounds(rounds).await?;
        selected
    };

    info!(round_id, pool_id, count, "questions assigned to round");
    sse_events::broadcast_questions_assigned(state, round_id, pool_id, count);
    Ok(assigned.into_iter().map(Into::into).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    use crate::{
        dto::{
            pool::{CreatePoolRequest, ImportQuestionsRequest, QuestionRow},
            round::CreateRoundRequest,
        },
        services::{pool_service, round_service, test_support::state_with_store},
    };

    fn pool(id: &str, size: usize) -> QuestionPoolEntity {
        QuestionPoolEntity {
            id: id.into(),
            name: id.to_uppercase(),
            questions: (0..size)
                .map(|i| QuestionEntity {
                    id: format!("{id}-q{i}"),
                    text: format!("question {i}"),
                    answer: format!("answer {i}"),
                    image_url: None,
                    tile_number: None,
                    pool_id: Some(id.into()),
                })
                .collect(),
        }
    }

    fn round_holding(id: &str, pool_id: &str, question_ids: &[&str]) -> RoundEntity {
        RoundEntity {
            id: id.into(),
            name: id.into(),
            tile_count: 16,
            background_image: String::new(),
            order: 0,
            question_pool_id: Some(pool_id.into()),
            active_questions: question_ids
                .iter()
                .enumerate()
                .map(|(i, qid)| QuestionEntity {
                    id: (*qid).into(),
                    text: String::new(),
                    answer: String::new(),
                    image_url: None,
                    tile_number: Some(i as u32 + 1),
                    pool_id: Some(pool_id.into()),
                })
                .collect(),
            points_per_question: 100,
        }
    }

    #[test]
    fn draw_binds_sequential_tiles_to_distinct_questions() {
        let pool = pool("p", 10);
        let mut rng = StdRng::seed_from_u64(7);

        let drawn = select_questions(&[], &pool, 4, &mut rng).unwrap();

        let tiles: Vec<u32> = drawn.iter().filter_map(|q| q.tile_number).collect();
        assert_eq!(tiles, [1, 2, 3, 4]);
        let ids: HashSet<&str> = drawn.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids.len(), 4);
        assert!(drawn.iter().all(|q| q.pool_id.as_deref() == Some("p")));
    }

    #[test]
    fn questions_held_by_rounds_of_the_same_pool_are_skipped() {
        let pool = pool("p", 5);
        let rounds = [
            round_holding("r1", "p", &["p-q0", "p-q1"]),
            round_holding("target", "p", &["p-q2"]),
            round_holding("other", "x", &["p-q3"]),
        ];
        let mut rng = StdRng::seed_from_u64(11);

        let drawn = select_questions(&rounds, &pool, 2, &mut rng).unwrap();

        let ids: HashSet<&str> = drawn.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, HashSet::from(["p-q3", "p-q4"]));
    }

    #[test]
    fn short_pool_reports_supply() {
        let pool = pool("p", 5);
        let rounds = [round_holding("r1", "p", &["p-q0", "p-q1"])];
        let mut rng = StdRng::seed_from_u64(3);

        let err = select_questions(&rounds, &pool, 5, &mut rng).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::InsufficientSupply {
                available: 3,
                requested: 5
            }
        ));
    }

    #[test]
    fn whole_remaining_supply_can_be_drawn() {
        let pool = pool("p", 3);
        let mut rng = StdRng::seed_from_u64(5);
        let drawn = select_questions(&[], &pool, 3, &mut rng).unwrap();
        assert_eq!(drawn.len(), 3);
    }

    async fn active_ids(state: &SharedState, round_id: &str) -> Vec<(String, Option<u32>)> {
        round_service::list_rounds(state)
            .await
            .unwrap()
            .into_iter()
            .find(|round| round.id == round_id)
            .unwrap()
            .active_questions
            .into_iter()
            .map(|q| (q.id, q.tile_number))
            .collect()
    }

    #[tokio::test]
    async fn failed_assignments_leave_rounds_untouched() {
        let (state, _dir) = state_with_store().await;
        let pool = pool_service::create_pool(&state, CreatePoolRequest { name: "Letters".into() })
            .await
            .unwrap();
        let rows = ["A", "B", "C", "D"]
            .into_iter()
            .map(|letter| QuestionRow {
                text: format!("Say {letter}"),
                answer: letter.into(),
                image_url: None,
            })
            .collect();
        pool_service::import_questions(&state, &pool.id, ImportQuestionsRequest { questions: rows })
            .await
            .unwrap();

        let mut rounds = Vec::new();
        for name in ["R1", "R2"] {
            let request = CreateRoundRequest {
                name: name.into(),
                tile_count: None,
                background_image: None,
                question_pool_id: None,
                points_per_question: None,
            };
            rounds.push(round_service::create_round(&state, request).await.unwrap().id);
        }

        assign_questions(&state, &rounds[0], &pool.id, 2).await.unwrap();
        let first_draw = active_ids(&state, &rounds[0]).await;
        assert_eq!(first_draw.len(), 2);

        let err = assign_questions(&state, &rounds[1], &pool.id, 3)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::InsufficientSupply {
                available: 2,
                requested: 3
            }
        ));
        assert!(active_ids(&state, &rounds[1]).await.is_empty());

        let err = assign_questions(&state, &rounds[0], &pool.id, 3)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InsufficientSupply { .. }));
        assert_eq!(active_ids(&state, &rounds[0]).await, first_draw);
    }
}
