use serde::Serialize;
use utoipa::ToSchema;

/// Health payload returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// "ok" while the data directory is usable, "degraded" otherwise.
    pub status: String,
    /// Board sessions currently held in memory.
    pub board_sessions: usize,
    /// Clients connected to the public event stream.
    pub public_subscribers: usize,
}

impl HealthResponse {
    pub fn new(degraded: bool, board_sessions: usize, public_subscribers: usize) -> Self {
        Self {
            status: if degraded { "degraded" } else { "ok" }.to_string(),
            board_sessions,
            public_subscribers,
        }
    }
}
