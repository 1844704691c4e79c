use tracing::info;

use crate::{
    dao::models::{DEFAULT_PLAYER_ICON, InventoryItemEntity, PlayerEntity},
    dto::player::{CreatePlayerRequest, GrantItemsRequest, PlayerView, UpdatePlayerRequest},
    error::ServiceError,
    services::sse_events,
    state::SharedState,
    util::id::new_entity_id,
};

/// All players in creation order.
pub async fn list_players(state: &SharedState) -> Result<Vec<PlayerView>, ServiceError> {
    let store = state.require_store().await?;
    let players = store.load_players().await?;
    Ok(players.into_iter().map(Into::into).collect())
}

/// Register a player unless the roster is full.
pub async fn create_player(
    state: &SharedState,
    request: CreatePlayerRequest,
) -> Result<PlayerView, ServiceError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(ServiceError::InvalidInput("player name must not be blank".into()));
    }

    let max_players = state.config().max_players();
    let store = state.require_store().await?;
    let player = {
        let _gate = state.gates().players.lock().await;
        let mut players = store.load_players().await?;
        if players.len() >= max_players {
            return Err(ServiceError::Capacity(format!(
                "at most {max_players} players can take part"
            )));
        }
        let player = PlayerEntity {
            id: new_entity_id(),
            name: name.to_string(),
            score: request.score.unwrap_or_default(),
            icon: request
                .icon
                .filter(|icon| !icon.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_PLAYER_ICON.to_string()),
            inventory: Vec::new(),
        };
        players.push(player.clone());
        store.save_players(players).await?;
        player
    };

    info!(player_id = %player.id, name = %player.name, "player created");
    let view = PlayerView::from(player);
    sse_events::broadcast_player_created(state, &view);
    Ok(view)
}

/// Merge-patch a player's name, icon or score.
pub async fn update_player(
    state: &SharedState,
    player_id: &str,
    request: UpdatePlayerRequest,
) -> Result<PlayerView, ServiceError> {
    if request.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
        return Err(ServiceError::InvalidInput("player name must not be blank".into()));
    }
    mutate_player(state, player_id, |player| {
        if let Some(name) = request.name {
            player.name = name.trim().to_string();
        }
        if let Some(icon) = request.icon {
            player.icon = icon;
        }
        if let Some(score) = request.score {
            player.score = score;
        }
        Ok(())
    })
    .await
}

/// Move a player's score by `delta` (validated as +1 or -1 upstream).
pub async fn adjust_score(
    state: &SharedState,
    player_id: &str,
    delta: i64,
) -> Result<PlayerView, ServiceError> {
    if delta != 1 && delta != -1 {
        return Err(ServiceError::InvalidInput(format!(
            "score delta must be +1 or -1 (got {delta})"
        )));
    }
    let view = mutate_player(state, player_id, |player| {
        player.score = player.score.saturating_add(delta);
        Ok(())
    })
    .await?;
    info!(player_id, delta, score = view.score, "score adjusted");
    Ok(view)
}

/// Copy catalog items into a player's inventory, merging counts per item id.
pub async fn grant_items(
    state: &SharedState,
    player_id: &str,
    request: GrantItemsRequest,
) -> Result<PlayerView, ServiceError> {
    let store = state.require_store().await?;
    let catalog = store.load_inventory_items().await?;

    let mut granted = Vec::with_capacity(request.items.len());
    for item in request.items {
        let entry = catalog
            .iter()
            .find(|entry| entry.id == item.item_id)
            .ok_or_else(|| {
                ServiceError::NotFound(format!("inventory item `{}` not found", item.item_id))
            })?;
        granted.push(InventoryItemEntity {
            count: item.count.or(entry.count),
            ..entry.clone()
        });
    }

    mutate_player(state, player_id, move |player| {
        for item in granted {
            merge_item(&mut player.inventory, item)?;
        }
        Ok(())
    })
    .await
}

/// Empty a player's inventory.
pub async fn clear_inventory(state: &SharedState, player_id: &str) -> Result<PlayerView, ServiceError> {
    mutate_player(state, player_id, |player| {
        player.inventory.clear();
        Ok(())
    })
    .await
}

/// Remove a player.
pub async fn delete_player(state: &SharedState, player_id: &str) -> Result<(), ServiceError> {
    let store = state.require_store().await?;
    {
        let _gate = state.gates().players.lock().await;
        let mut players = store.load_players().await?;
        let before = players.len();
        players.retain(|player| player.id != player_id);
        if players.len() == before {
            return Err(player_not_found(player_id));
        }
        store.save_players(players).await?;
    }

    info!(player_id, "player deleted");
    sse_events::broadcast_player_deleted(state, player_id);
    Ok(())
}

async fn mutate_player<F>(
    state: &SharedState,
    player_id: &str,
    mutate: F,
) -> Result<PlayerView, ServiceError>
where
    F: FnOnce(&mut PlayerEntity) -> Result<(), ServiceError>,
{
    let store = state.require_store().await?;
    let player = {
        let _gate = state.gates().players.lock().await;
        let mut players = store.load_players().await?;
        let player = players
            .iter_mut()
            .find(|player| player.id == player_id)
            .ok_or_else(|| player_not_found(player_id))?;
        mutate(player)?;
        let updated = player.clone();
        store.save_players(players).await?;
        updated
    };

    let view = PlayerView::from(player);
    sse_events::broadcast_player_updated(state, &view);
    Ok(view)
}

/// Add `granted` to `inventory`, summing counts when the item is already owned.
fn merge_item(
    inventory: &mut Vec<InventoryItemEntity>,
    granted: InventoryItemEntity,
) -> Result<(), ServiceError> {
    let added = granted.count.unwrap_or(1);
    match inventory.iter_mut().find(|owned| owned.id == granted.id) {
        Some(owned) => {
            let total = owned.count.unwrap_or(0).checked_add(added).ok_or_else(|| {
                ServiceError::InvalidInput(format!(
                    "inventory count for `{}` would overflow",
                    granted.id
                ))
            })?;
            owned.count = Some(total);
        }
        None => inventory.push(InventoryItemEntity {
            count: Some(added),
            ..granted
        }),
    }
    Ok(())
}

fn player_not_found(player_id: &str) -> ServiceError {
    ServiceError::NotFound(format!("player `{player_id}` not found"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dto::{inventory::CreateInventoryItemRequest, player::GrantedItem},
        services::{inventory_service, test_support::state_with_config},
    };

    fn item(id: &str, count: Option<u32>) -> InventoryItemEntity {
        InventoryItemEntity {
            id: id.into(),
            name: id.into(),
            description: String::new(),
            icon: String::new(),
            value: None,
            count,
        }
    }

    fn create_request(name: &str) -> CreatePlayerRequest {
        CreatePlayerRequest {
            name: name.into(),
            icon: None,
            score: None,
        }
    }

    #[test]
    fn granting_owned_item_sums_counts() {
        let mut inventory = vec![item("potion", Some(2))];

        merge_item(&mut inventory, item("potion", Some(3))).unwrap();
        merge_item(&mut inventory, item("potion", None)).unwrap();
        merge_item(&mut inventory, item("shield", None)).unwrap();

        assert_eq!(inventory.len(), 2);
        assert_eq!(inventory[0].count, Some(6));
        assert_eq!(inventory[1].count, Some(1));
    }

    #[test]
    fn merging_past_the_count_ceiling_is_rejected() {
        let mut inventory = vec![item("potion", Some(u32::MAX))];

        let err = merge_item(&mut inventory, item("potion", Some(1))).unwrap_err();

        assert!(matches!(err, ServiceError::InvalidInput(_)));
        assert_eq!(inventory[0].count, Some(u32::MAX));
    }

    #[tokio::test]
    async fn roster_cap_is_enforced_at_creation() {
        let (state, _dir) = state_with_config(AppConfig::default()).await;
        for i in 0..10 {
            create_player(&state, create_request(&format!("P{i}")))
                .await
                .unwrap();
        }

        let err = create_player(&state, create_request("Eleventh"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Capacity(_)));
        assert_eq!(list_players(&state).await.unwrap().len(), 10);
    }

    #[tokio::test]
    async fn new_player_gets_default_icon_and_moves_one_point() {
        let (state, _dir) = state_with_config(AppConfig::default()).await;
        let player = create_player(&state, create_request("Ada")).await.unwrap();
        assert_eq!(player.icon, DEFAULT_PLAYER_ICON);
        assert_eq!(player.score, 0);

        adjust_score(&state, &player.id, 1).await.unwrap();
        adjust_score(&state, &player.id, 1).await.unwrap();
        let player = adjust_score(&state, &player.id, -1).await.unwrap();
        assert_eq!(player.score, 1);

        assert!(matches!(
            adjust_score(&state, &player.id, 3).await,
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn deleting_unknown_player_is_not_found() {
        let (state, _dir) = state_with_config(AppConfig::default()).await;
        assert!(matches!(
            delete_player(&state, "ghost").await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn grants_copy_catalog_items_and_merge() {
        let (state, _dir) = state_with_config(AppConfig::default()).await;
        let catalog_item = inventory_service::create_item(
            &state,
            CreateInventoryItemRequest {
                name: "Joker".into(),
                description: Some("Skip a question".into()),
                icon: None,
                value: Some(50),
                count: None,
            },
        )
        .await
        .unwrap();
        let player = create_player(&state, create_request("Ada")).await.unwrap();

        let grant = |count| GrantItemsRequest {
            items: vec![GrantedItem {
                item_id: catalog_item.id.clone(),
                count,
            }],
        };
        grant_items(&state, &player.id, grant(None)).await.unwrap();
        let player = grant_items(&state, &player.id, grant(Some(2))).await.unwrap();

        assert_eq!(player.inventory.len(), 1);
        assert_eq!(player.inventory[0].name, "Joker");
        assert_eq!(player.inventory[0].count, Some(3));

        let player = clear_inventory(&state, &player.id).await.unwrap();
        assert!(player.inventory.is_empty());
    }
}
