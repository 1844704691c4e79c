//! Player payloads.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::{
    dao::models::PlayerEntity,
    dto::{
        inventory::InventoryItemView,
        validation::{validate_not_blank, validate_score_delta},
    },
};

/// Largest quantity a single grant may carry.
pub const MAX_GRANT_COUNT: u32 = 1_000;

/// Player as shown on scoreboards and in the admin panel.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub id: String,
    pub name: String,
    pub score: i64,
    pub icon: String,
    pub inventory: Vec<InventoryItemView>,
}

impl From<PlayerEntity> for PlayerView {
    fn from(value: PlayerEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            score: value.score,
            icon: value.icon,
            inventory: value.inventory.into_iter().map(Into::into).collect(),
        }
    }
}

/// Request to register a player.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlayerRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub name: String,
    /// Defaults to the stock avatar.
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub score: Option<i64>,
}

/// Merge-patch of a player.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePlayerRequest {
    #[serde(default)]
    #[validate(custom(function = "validate_not_blank"))]
    pub name: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub score: Option<i64>,
}

/// One-point score action.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ScoreAdjustmentRequest {
    /// `1` or `-1`.
    pub delta: i64,
}

impl Validate for ScoreAdjustmentRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Err(e) = validate_score_delta(&self.delta) {
            errors.add("delta", e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Catalog item to hand out, optionally with an explicit quantity.
#[derive(Debug, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GrantedItem {
    #[validate(custom(function = "validate_not_blank"))]
    pub item_id: String,
    /// Defaults to the catalog item's count, then to one.
    #[serde(default)]
    #[validate(range(min = 1, max = MAX_GRANT_COUNT))]
    pub count: Option<u32>,
}

/// Request to add catalog items to a player's inventory.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GrantItemsRequest {
    #[validate(length(min = 1), nested)]
    pub items: Vec<GrantedItem>,
}
