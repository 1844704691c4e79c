//! Round listing, editing and ordering.
//!
//! Orders are kept dense: after every create, delete or reorder the rounds carry
//! exactly the orders `0..n` in ascending position.

use std::{
    collections::{BTreeSet, HashSet},
    sync::Arc,
};

use tracing::info;

use crate::{
    dao::{
        models::{QuestionPoolEntity, RoundEntity},
        trivia_store::TriviaStore,
    },
    dto::{
        pool::QuestionView,
        round::{
            CreateRoundRequest, MoveDirection, PublicRoundView, RoundView, TileQuestionView,
            UpdateRoundRequest,
        },
    },
    error::ServiceError,
    services::sse_events,
    state::{SharedState, board::question_for_tile},
    util::id::new_entity_id,
};

/// Load every round sorted by `order`.
pub(crate) async fn load_sorted_rounds(
    store: &Arc<dyn TriviaStore>,
) -> Result<Vec<RoundEntity>, ServiceError> {
    let mut rounds = store.load_rounds().await?;
    rounds.sort_by_key(|round| round.order);
    Ok(rounds)
}

/// Rounds in play order, answers included.
pub async fn list_rounds(state: &SharedState) -> Result<Vec<RoundView>, ServiceError> {
    let store = state.require_store().await?;
    let rounds = load_sorted_rounds(&store).await?;
    Ok(rounds.into_iter().map(Into::into).collect())
}

/// Rounds in play order as seen by spectators.
pub async fn list_public_rounds(state: &SharedState) -> Result<Vec<PublicRoundView>, ServiceError> {
    let store = state.require_store().await?;
    let rounds = load_sorted_rounds(&store).await?;
    Ok(rounds.iter().map(PublicRoundView::from).collect())
}

/// Question bound to a tile of a round, without its answer.
pub async fn tile_question(
    state: &SharedState,
    round_id: &str,
    tile_number: u32,
) -> Result<TileQuestionView, ServiceError> {
    let store = state.require_store().await?;
    let rounds = store.load_rounds().await?;
    let round = rounds
        .iter()
        .find(|round| round.id == round_id)
        .ok_or_else(|| round_not_found(round_id))?;
    let question = question_for_tile(round, tile_number).ok_or_else(|| {
        ServiceError::NotFound(format!("round `{round_id}` has no question on tile {tile_number}"))
    })?;
    Ok(TileQuestionView::new(tile_number, question))
}

/// Append a round at the end of the order.
pub async fn create_round(
    state: &SharedState,
    request: CreateRoundRequest,
) -> Result<RoundView, ServiceError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(ServiceError::InvalidInput("round name must not be blank".into()));
    }

    let store = state.require_store().await?;
    let settings = store.load_settings().await?;
    let round = RoundEntity {
        id: new_entity_id(),
        name: name.to_string(),
        tile_count: request.tile_count.unwrap_or(settings.tile_count),
        background_image: request
            .background_image
            .unwrap_or(settings.background_image),
        order: 0,
        question_pool_id: request.question_pool_id.filter(|id| !id.is_empty()),
        active_questions: Vec::new(),
        points_per_question: request
            .points_per_question
            .unwrap_or(crate::dao::models::DEFAULT_POINTS_PER_QUESTION),
    };

    let round = {
        let _gate = state.gates().rounds.lock().await;
        let mut rounds = load_sorted_rounds(&store).await?;
        let order = append_round(&mut rounds, round);
        let created = rounds[order].clone();
        store.save_rounds(rounds).await?;
        created
    };

    info!(round_id = %round.id, order = round.order, "round created");
    let view = RoundView::from(round);
    sse_events::broadcast_round_created(state, &view);
    Ok(view)
}

/// Merge-patch a round. `id` and `order` cannot be changed here.
pub async fn update_round(
    state: &SharedState,
    round_id: &str,
    request: UpdateRoundRequest,
) -> Result<RoundView, ServiceError> {
    let store = state.require_store().await?;
    let updated = {
        let _gate = state.gates().rounds.lock().await;
        let mut rounds = load_sorted_rounds(&store).await?;
        let index = rounds
            .iter()
            .position(|round| round.id == round_id)
            .ok_or_else(|| round_not_found(round_id))?;
        let touches_questions =
            request.question_pool_id.is_some() || request.active_questions.is_some();
        apply_round_patch(&mut rounds[index], request)?;
        if touches_questions {
            let pools = store.load_pools().await?;
            check_pool_questions(&rounds, index, &pools)?;
        }
        let updated = rounds[index].clone();
        store.save_rounds(rounds).await?;
        updated
    };

    info!(round_id, "round updated");
    let view = RoundView::from(updated);
    sse_events::broadcast_round_updated(state, &view);
    Ok(view)
}

/// Move a round to an absolute position, shifting the rounds in between.
pub async fn reorder_round(
    state: &SharedState,
    round_id: &str,
    new_order: usize,
) -> Result<Vec<RoundView>, ServiceError> {
    let store = state.require_store().await?;
    let rounds = {
        let _gate = state.gates().rounds.lock().await;
        let mut rounds = load_sorted_rounds(&store).await?;
        reorder_rounds(&mut rounds, round_id, new_order)?;
        store.save_rounds(rounds.clone()).await?;
        rounds
    };

    info!(round_id, new_order, "round reordered");
    let views: Vec<RoundView> = rounds.into_iter().map(Into::into).collect();
    sse_events::broadcast_rounds_reordered(state, &views);
    Ok(views)
}

/// Move a round one slot up or down; a no-op at either end.
pub async fn move_round(
    state: &SharedState,
    round_id: &str,
    direction: MoveDirection,
) -> Result<Vec<RoundView>, ServiceError> {
    let store = state.require_store().await?;
    let rounds = load_sorted_rounds(&store).await?;
    let current = rounds
        .iter()
        .position(|round| round.id == round_id)
        .ok_or_else(|| round_not_found(round_id))?;
    let target = match direction {
        MoveDirection::Up => current.saturating_sub(1),
        MoveDirection::Down => (current + 1).min(rounds.len() - 1),
    };
    reorder_round(state, round_id, target).await
}

/// Delete a round and close the gap it leaves in the order.
pub async fn delete_round(state: &SharedState, round_id: &str) -> Result<(), ServiceError> {
    let store = state.require_store().await?;
    {
        let _gate = state.gates().rounds.lock().await;
        let mut rounds = load_sorted_rounds(&store).await?;
        remove_round(&mut rounds, round_id)?;
        store.save_rounds(rounds).await?;
    }

    info!(round_id, "round deleted");
    sse_events::broadcast_round_deleted(state, round_id);
    Ok(())
}

/// Push `round` at the end of `rounds` (sorted), returning its order.
fn append_round(rounds: &mut Vec<RoundEntity>, mut round: RoundEntity) -> usize {
    round.order = rounds.len();
    rounds.push(round);
    renumber(rounds);
    rounds.len() - 1
}

/// Move `round_id` to `new_order` within `rounds` (sorted) and renumber.
fn reorder_rounds(
    rounds: &mut Vec<RoundEntity>,
    round_id: &str,
    new_order: usize,
) -> Result<(), ServiceError> {
    let current = rounds
        .iter()
        .position(|round| round.id == round_id)
        .ok_or_else(|| round_not_found(round_id))?;
    if new_order >= rounds.len() {
        return Err(ServiceError::InvalidInput(format!(
            "new order {new_order} is out of range for {} rounds",
            rounds.len()
        )));
    }

    let round = rounds.remove(current);
    rounds.insert(new_order, round);
    renumber(rounds);
    Ok(())
}

/// Remove `round_id` from `rounds` (sorted) and compact the remaining orders.
fn remove_round(rounds: &mut Vec<RoundEntity>, round_id: &str) -> Result<RoundEntity, ServiceError> {
    let index = rounds
        .iter()
        .position(|round| round.id == round_id)
        .ok_or_else(|| round_not_found(round_id))?;
    let removed = rounds.remove(index);
    renumber(rounds);
    Ok(removed)
}

fn renumber(rounds: &mut [RoundEntity]) {
    for (order, round) in rounds.iter_mut().enumerate() {
        round.order = order;
    }
}

fn apply_round_patch(round: &mut RoundEntity, patch: UpdateRoundRequest) -> Result<(), ServiceError> {
    if let Some(name) = patch.name {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::InvalidInput("round name must not be blank".into()));
        }
        round.name = name.to_string();
    }
    if let Some(tile_count) = patch.tile_count {
        round.tile_count = tile_count;
    }
    if let Some(background_image) = patch.background_image {
        round.background_image = background_image;
    }
    if let Some(points) = patch.points_per_question {
        round.points_per_question = points;
    }
    if let Some(pool_id) = patch.question_pool_id {
        round.question_pool_id = pool_id;
    }
    if let Some(questions) = patch.active_questions {
        check_tile_permutation(&questions)?;
        round.active_questions = questions.into_iter().map(Into::into).collect();
    }
    Ok(())
}

/// Active questions must be bound to the tiles `1..=len`, once each.
fn check_tile_permutation(questions: &[QuestionView]) -> Result<(), ServiceError> {
    let tiles: BTreeSet<u32> = questions.iter().filter_map(|q| q.tile_number).collect();
    let expected = 1..=questions.len() as u32;
    if tiles.len() != questions.len() || !expected.eq(tiles.iter().copied()) {
        return Err(ServiceError::InvalidInput(format!(
            "active questions must be bound to tiles 1..={} exactly once",
            questions.len()
        )));
    }
    Ok(())
}

/// A round bound to a pool may only hold that pool's questions, none of which may
/// be active in another round of the same pool.
fn check_pool_questions(
    rounds: &[RoundEntity],
    index: usize,
    pools: &[QuestionPoolEntity],
) -> Result<(), ServiceError> {
    let round = &rounds[index];
    let Some(pool_id) = round.question_pool_id.as_deref() else {
        return Ok(());
    };
    if round.active_questions.is_empty() {
        return Ok(());
    }

    let pool = pools
        .iter()
        .find(|pool| pool.id == pool_id)
        .ok_or_else(|| ServiceError::NotFound(format!("question pool `{pool_id}` not found")))?;
    let in_pool: HashSet<&str> = pool.questions.iter().map(|q| q.id.as_str()).collect();
    let held_elsewhere: HashSet<&str> = rounds
        .iter()
        .enumerate()
        .filter(|(other, sibling)| {
            *other != index && sibling.question_pool_id.as_deref() == Some(pool_id)
        })
        .flat_map(|(_, sibling)| sibling.active_questions.iter().map(|q| q.id.as_str()))
        .collect();

    let mut seen = HashSet::new();
    for question in &round.active_questions {
        let id = question.id.as_str();
        if !in_pool.contains(id) {
            return Err(ServiceError::InvalidInput(format!(
                "question `{id}` does not belong to pool `{pool_id}`"
            )));
        }
        if held_elsewhere.contains(id) || !seen.insert(id) {
            return Err(ServiceError::InvalidInput(format!(
                "question `{id}` is already active in a round of pool `{pool_id}`"
            )));
        }
    }
    Ok(())
}

fn round_not_found(round_id: &str) -> ServiceError {
    ServiceError::NotFound(format!("round `{round_id}` not found"))
}
