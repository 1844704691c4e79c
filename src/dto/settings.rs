//! Settings payloads.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::dao::models::SettingsEntity;

/// Presentation defaults and the live round pointer.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettingsView {
    pub tile_count: u32,
    pub background_image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_round: Option<String>,
}

impl From<SettingsEntity> for SettingsView {
    fn from(value: SettingsEntity) -> Self {
        Self {
            tile_count: value.tile_count,
            background_image: value.background_image,
            points_name: value.points_name,
            current_round: value.current_round,
        }
    }
}

/// Full replacement of the settings document.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceSettingsRequest {
    #[validate(range(min = 1))]
    pub tile_count: u32,
    #[serde(default)]
    pub background_image: String,
    #[serde(default)]
    pub points_name: Option<String>,
    #[serde(default)]
    pub current_round: Option<String>,
}

impl From<ReplaceSettingsRequest> for SettingsEntity {
    fn from(value: ReplaceSettingsRequest) -> Self {
        Self {
            tile_count: value.tile_count,
            background_image: value.background_image,
            points_name: value.points_name,
            current_round: value.current_round,
        }
    }
}

/// Merge-patch of the settings document.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PatchSettingsRequest {
    #[serde(default)]
    #[validate(range(min = 1))]
    pub tile_count: Option<u32>,
    #[serde(default)]
    pub background_image: Option<String>,
    /// `null` removes the custom points name.
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub points_name: Option<Option<String>>,
    /// `null` clears the live round.
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub current_round: Option<Option<String>>,
}

impl PatchSettingsRequest {
    /// Apply the present fields onto `settings`.
    pub fn apply_to(self, settings: &mut SettingsEntity) {
        if let Some(tile_count) = self.tile_count {
            settings.tile_count = tile_count;
        }
        if let Some(background_image) = self.background_image {
            settings.background_image = background_image;
        }
        if let Some(points_name) = self.points_name {
            settings.points_name = points_name;
        }
        if let Some(current_round) = self.current_round {
            settings.current_round = current_round;
        }
    }
}
