//! Connection diagnostics (admin)

use axum::extract::State;
use shared::client::ConnectionsInfo;
use shared::error::ApiResponse;

use crate::state::AppState;

/// GET /api/auth/connections
pub async fn status(State(state): State<AppState>) -> ApiResponse<ConnectionsInfo> {
    state.registry.log_status();
    ApiResponse::success(state.registry.connections_info())
}
