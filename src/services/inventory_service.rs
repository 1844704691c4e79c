use tracing::info;

use crate::{
    dao::models::InventoryItemEntity,
    dto::inventory::{CreateInventoryItemRequest, InventoryItemView, UpdateInventoryItemRequest},
    error::ServiceError,
    services::sse_events,
    state::SharedState,
    util::id::new_entity_id,
};

/// Every catalog item.
pub async fn list_items(state: &SharedState) -> Result<Vec<InventoryItemView>, ServiceError> {
    let store = state.require_store().await?;
    let items = store.load_inventory_items().await?;
    Ok(items.into_iter().map(Into::into).collect())
}

/// Add an item definition to the catalog.
pub async fn create_item(
    state: &SharedState,
    request: CreateInventoryItemRequest,
) -> Result<InventoryItemView, ServiceError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(ServiceError::InvalidInput("item name must not be blank".into()));
    }

    let item = InventoryItemEntity {
        id: new_entity_id(),
        name: name.to_string(),
        description: request.description.unwrap_or_default(),
        icon: request.icon.unwrap_or_default(),
        value: request.value,
        count: request.count,
    };

    let store = state.require_store().await?;
    {
        let _gate = state.gates().inventory.lock().await;
        let mut items = store.load_inventory_items().await?;
        items.push(item.clone());
        store.save_inventory_items(items).await?;
    }

    info!(item_id = %item.id, name = %item.name, "inventory item created");
    let view = InventoryItemView::from(item);
    sse_events::broadcast_item_created(state, &view);
    Ok(view)
}

/// Merge-patch a catalog item. Copies already held by players are not touched.
pub async fn update_item(
    state: &SharedState,
    item_id: &str,
    request: UpdateInventoryItemRequest,
) -> Result<InventoryItemView, ServiceError> {
    if request.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
        return Err(ServiceError::InvalidInput("item name must not be blank".into()));
    }

    let store = state.require_store().await?;
    let item = {
        let _gate = state.gates().inventory.lock().await;
        let mut items = store.load_inventory_items().await?;
        let item = items
            .iter_mut()
            .find(|item| item.id == item_id)
            .ok_or_else(|| item_not_found(item_id))?;
        if let Some(name) = request.name {
            item.name = name.trim().to_string();
        }
        if let Some(description) = request.description {
            item.description = description;
        }
        if let Some(icon) = request.icon {
            item.icon = icon;
        }
        if let Some(value) = request.value {
            item.value = value;
        }
        if let Some(count) = request.count {
            item.count = count;
        }
        let updated = item.clone();
        store.save_inventory_items(items).await?;
        updated
    };

    info!(item_id, "inventory item updated");
    let view = InventoryItemView::from(item);
    sse_events::broadcast_item_updated(state, &view);
    Ok(view)
}

/// Remove an item from the catalog.
pub async fn delete_item(state: &SharedState, item_id: &str) -> Result<(), ServiceError> {
    let store = state.require_store().await?;
    {
        let _gate = state.gates().inventory.lock().await;
        let mut items = store.load_inventory_items().await?;
        let before = items.len();
        items.retain(|item| item.id != item_id);
        if items.len() == before {
            return Err(item_not_found(item_id));
        }
        store.save_inventory_items(items).await?;
    }

    info!(item_id, "inventory item deleted");
    sse_events::broadcast_item_deleted(state, item_id);
    Ok(())
}

fn item_not_found(item_id: &str) -> ServiceError {
    ServiceError::NotFound(format!("inventory item `{item_id}` not found"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::state_with_store;

    #[tokio::test]
    async fn patch_can_clear_optional_fields() {
        let (state, _dir) = state_with_store().await;
        let item = create_item(
            &state,
            CreateInventoryItemRequest {
                name: "Bomb".into(),
                description: None,
                icon: Some("/uploads/bomb.png".into()),
                value: Some(-20),
                count: Some(1),
            },
        )
        .await
        .unwrap();

        let patched: UpdateInventoryItemRequest =
            serde_json::from_str(r#"{"value":null,"description":"Lose 20 points"}"#).unwrap();
        let item = update_item(&state, &item.id, patched).await.unwrap();

        assert_eq!(item.value, None);
        assert_eq!(item.count, Some(1));
        assert_eq!(item.description, "Lose 20 points");
        assert_eq!(item.icon, "/uploads/bomb.png");

        delete_item(&state, &item.id).await.unwrap();
        assert!(list_items(&state).await.unwrap().is_empty());
    }
}
