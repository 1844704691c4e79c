use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Tile Trivia Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::public_stream,
        crate::routes::sse::admin_stream,
        crate::routes::sse::scoreboard_stream,
        crate::routes::public::list_rounds,
        crate::routes::public::tile_question,
        crate::routes::public::get_settings,
        crate::routes::public::list_players,
        crate::routes::public::list_pools,
        crate::routes::board::open_session,
        crate::routes::board::get_session,
        crate::routes::board::close_session,
        crate::routes::board::advance,
        crate::routes::board::open_tile,
        crate::routes::board::answer,
        crate::routes::board::reset_round,
        crate::routes::admin::list_pools,
        crate::routes::admin::create_pool,
        crate::routes::admin::delete_pool,
        crate::routes::admin::import_questions,
        crate::routes::admin::list_rounds,
        crate::routes::admin::create_round,
        crate::routes::admin::update_round,
        crate::routes::admin::delete_round,
        crate::routes::admin::reorder_round,
        crate::routes::admin::move_round,
        crate::routes::admin::assign_questions,
        crate::routes::admin::list_players,
        crate::routes::admin::create_player,
        crate::routes::admin::update_player,
        crate::routes::admin::delete_player,
        crate::routes::admin::adjust_score,
        crate::routes::admin::grant_items,
        crate::routes::admin::clear_inventory,
        crate::routes::admin::list_items,
        crate::routes::admin::create_item,
        crate::routes::admin::update_item,
        crate::routes::admin::delete_item,
        crate::routes::admin::get_settings,
        crate::routes::admin::replace_settings,
        crate::routes::admin::patch_settings,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::sse::AdminHandshake,
            crate::dto::sse::SystemStatus,
            crate::dto::sse::EntityDeletedEvent,
            crate::dto::sse::QuestionsAssignedEvent,
            crate::dto::sse::BoardClosedEvent,
            crate::dto::pool::QuestionView,
            crate::dto::pool::PoolView,
            crate::dto::pool::PoolSummary,
            crate::dto::pool::CreatePoolRequest,
            crate::dto::pool::QuestionRow,
            crate::dto::pool::ImportQuestionsRequest,
            crate::dto::round::RoundView,
            crate::dto::round::PublicRoundView,
            crate::dto::round::TileQuestionView,
            crate::dto::round::CreateRoundRequest,
            crate::dto::round::UpdateRoundRequest,
            crate::dto::round::ReorderRoundRequest,
            crate::dto::round::MoveDirection,
            crate::dto::round::MoveRoundRequest,
            crate::dto::round::AssignQuestionsRequest,
            crate::dto::player::PlayerView,
            crate::dto::player::CreatePlayerRequest,
            crate::dto::player::UpdatePlayerRequest,
            crate::dto::player::ScoreAdjustmentRequest,
            crate::dto::player::GrantedItem,
            crate::dto::player::GrantItemsRequest,
            crate::dto::inventory::InventoryItemView,
            crate::dto::inventory::CreateInventoryItemRequest,
            crate::dto::inventory::UpdateInventoryItemRequest,
            crate::dto::settings::SettingsView,
            crate::dto::settings::ReplaceSettingsRequest,
            crate::dto::settings::PatchSettingsRequest,
            crate::dto::board::AdvanceDirection,
            crate::dto::board::AdvanceRequest,
            crate::dto::board::AnswerRequest,
            crate::dto::board::BoardPhaseKind,
            crate::dto::board::OpenQuestionView,
            crate::dto::board::BoardRoundView,
            crate::dto::board::BoardSnapshot,
            crate::dto::board::AnswerVerdict,
            crate::dto::board::AnswerResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "public", description = "Read-only data for display screens"),
        (name = "board", description = "Board sessions: round progression and tile reveals"),
        (name = "admin", description = "Content and player management, guarded by the admin token"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_board_and_admin_paths() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;
        assert!(paths.contains_key("/board/sessions/{id}/tiles/{tile}/open"));
        assert!(paths.contains_key("/admin/rounds/{id}/assign"));
        assert!(paths.contains_key("/sse/scoreboard"));
    }
}
