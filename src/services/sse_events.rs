use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::{
    dto::{
        board::BoardSnapshot,
        inventory::InventoryItemView,
        player::PlayerView,
        pool::PoolSummary,
        round::RoundView,
        settings::SettingsView,
        sse::{
            BoardClosedEvent, EntityDeletedEvent, QuestionsAssignedEvent, ServerEvent, SystemStatus,
        },
    },
    state::SharedState,
};

const EVENT_POOL_CREATED: &str = "pool.created";
const EVENT_POOL_UPDATED: &str = "pool.updated";
const EVENT_POOL_DELETED: &str = "pool.deleted";
const EVENT_ROUND_CREATED: &str = "round.created";
const EVENT_ROUND_UPDATED: &str = "round.updated";
const EVENT_ROUND_DELETED: &str = "round.deleted";
const EVENT_ROUNDS_REORDERED: &str = "round.reordered";
const EVENT_QUESTIONS_ASSIGNED: &str = "round.assigned";
const EVENT_PLAYER_CREATED: &str = "player.created";
const EVENT_PLAYER_UPDATED: &str = "player.updated";
const EVENT_PLAYER_DELETED: &str = "player.deleted";
const EVENT_ITEM_CREATED: &str = "inventory.created";
const EVENT_ITEM_UPDATED: &str = "inventory.updated";
const EVENT_ITEM_DELETED: &str = "inventory.deleted";
const EVENT_SETTINGS_UPDATED: &str = "settings.updated";
const EVENT_BOARD_UPDATED: &str = "board.updated";
const EVENT_BOARD_CLOSED: &str = "board.closed";
const EVENT_SYSTEM_STATUS: &str = "system.status";

pub fn broadcast_pool_created(state: &SharedState, pool: &PoolSummary) {
    send_admin_event(state, EVENT_POOL_CREATED, pool);
}

/// Broadcast a pool whose question list changed.
pub fn broadcast_pool_updated(state: &SharedState, pool: &PoolSummary) {
    send_admin_event(state, EVENT_POOL_UPDATED, pool);
}

pub fn broadcast_pool_deleted(state: &SharedState, id: &str) {
    let payload = EntityDeletedEvent { id: id.to_string() };
    send_admin_event(state, EVENT_POOL_DELETED, &payload);
}

pub fn broadcast_round_created(state: &SharedState, round: &RoundView) {
    send_admin_event(state, EVENT_ROUND_CREATED, round);
}

pub fn broadcast_round_updated(state: &SharedState, round: &RoundView) {
    send_admin_event(state, EVENT_ROUND_UPDATED, round);
}

pub fn broadcast_round_deleted(state: &SharedState, id: &str) {
    let payload = EntityDeletedEvent { id: id.to_string() };
    send_admin_event(state, EVENT_ROUND_DELETED, &payload);
}

/// Broadcast the full ordered round list after a position change.
pub fn broadcast_rounds_reordered(state: &SharedState, rounds: &[RoundView]) {
    send_admin_event(state, EVENT_ROUNDS_REORDERED, &rounds);
}

pub fn broadcast_questions_assigned(state: &SharedState, round_id: &str, pool_id: &str, count: usize) {
    let payload = QuestionsAssignedEvent {
        round_id: round_id.to_string(),
        pool_id: pool_id.to_string(),
        count,
    };
    send_admin_event(state, EVENT_QUESTIONS_ASSIGNED, &payload);
}

pub fn broadcast_player_created(state: &SharedState, player: &PlayerView) {
    send_public_event(state, EVENT_PLAYER_CREATED, player);
    send_admin_event(state, EVENT_PLAYER_CREATED, player);
}

/// Broadcast a player after a profile, score or inventory change.
pub fn broadcast_player_updated(state: &SharedState, player: &PlayerView) {
    send_public_event(state, EVENT_PLAYER_UPDATED, player);
    send_admin_event(state, EVENT_PLAYER_UPDATED, player);
}

pub fn broadcast_player_deleted(state: &SharedState, id: &str) {
    let payload = EntityDeletedEvent { id: id.to_string() };
    send_public_event(state, EVENT_PLAYER_DELETED, &payload);
    send_admin_event(state, EVENT_PLAYER_DELETED, &payload);
}

pub fn broadcast_item_created(state: &SharedState, item: &InventoryItemView) {
    send_admin_event(state, EVENT_ITEM_CREATED, item);
}

pub fn broadcast_item_updated(state: &SharedState, item: &InventoryItemView) {
    send_admin_event(state, EVENT_ITEM_UPDATED, item);
}

pub fn broadcast_item_deleted(state: &SharedState, id: &str) {
    let payload = EntityDeletedEvent { id: id.to_string() };
    send_admin_event(state, EVENT_ITEM_DELETED, &payload);
}

pub fn broadcast_settings_updated(state: &SharedState, settings: &SettingsView) {
    send_public_event(state, EVENT_SETTINGS_UPDATED, settings);
    send_admin_event(state, EVENT_SETTINGS_UPDATED, settings);
}

/// Broadcast the new state of a board after any progression step.
pub fn broadcast_board_updated(state: &SharedState, board: &BoardSnapshot) {
    send_public_event(state, EVENT_BOARD_UPDATED, board);
    send_admin_event(state, EVENT_BOARD_UPDATED, board);
}

pub fn broadcast_board_closed(state: &SharedState, session_id: Uuid) {
    let payload = BoardClosedEvent { session_id };
    send_public_event(state, EVENT_BOARD_CLOSED, &payload);
    send_admin_event(state, EVENT_BOARD_CLOSED, &payload);
}

/// Broadcast a degraded mode transition to every stream.
pub fn broadcast_system_status(state: &SharedState, degraded: bool) {
    let payload = SystemStatus { degraded };
    send_public_event(state, EVENT_SYSTEM_STATUS, &payload);
    send_admin_event(state, EVENT_SYSTEM_STATUS, &payload);
}

fn send_public_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.public_sse().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize public SSE payload"),
    }
}

fn send_admin_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.admin_sse().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize admin SSE payload"),
    }
}
