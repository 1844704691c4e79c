use tracing::info;

use crate::{
    dao::models::SettingsEntity,
    dto::settings::{PatchSettingsRequest, ReplaceSettingsRequest, SettingsView},
    error::ServiceError,
    services::sse_events,
    state::SharedState,
};

/// Current settings, initialised with defaults on first access.
pub async fn get_settings(state: &SharedState) -> Result<SettingsView, ServiceError> {
    let store = state.require_store().await?;
    Ok(store.load_settings().await?.into())
}

/// Overwrite the whole settings document.
pub async fn replace_settings(
    state: &SharedState,
    request: ReplaceSettingsRequest,
) -> Result<SettingsView, ServiceError> {
    let store = state.require_store().await?;
    let settings: SettingsEntity = request.into();
    {
        let _gate = state.gates().settings.lock().await;
        store.save_settings(settings.clone()).await?;
    }
    publish(state, settings)
}

/// Apply the present fields of `request` onto the stored settings.
pub async fn patch_settings(
    state: &SharedState,
    request: PatchSettingsRequest,
) -> Result<SettingsView, ServiceError> {
    let store = state.require_store().await?;
    let settings = {
        let _gate = state.gates().settings.lock().await;
        let mut settings = store.load_settings().await?;
        request.apply_to(&mut settings);
        store.save_settings(settings.clone()).await?;
        settings
    };
    publish(state, settings)
}

/// Point the live round at `round_id`; the only field board progression writes.
pub(crate) async fn set_current_round(
    state: &SharedState,
    round_id: &str,
) -> Result<SettingsView, ServiceError> {
    patch_settings(
        state,
        PatchSettingsRequest {
            current_round: Some(Some(round_id.to_string())),
            ..Default::default()
        },
    )
    .await
}

fn publish(state: &SharedState, settings: SettingsEntity) -> Result<SettingsView, ServiceError> {
    info!(
        tile_count = settings.tile_count,
        current_round = ?settings.current_round,
        "settings updated"
    );
    let view = SettingsView::from(settings);
    sse_events::broadcast_settings_updated(state, &view);
    Ok(view)
}
