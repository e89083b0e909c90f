use axum::{Json, extract::State};
use std::sync::Arc;

use super::auth::{MaybePrincipal, require_authenticated};
use super::{ApiError, ApiResponse, AppState, SystemStatusDto};

/// Liveness and a few vitals. Fails with a 500 when the database does not
/// answer a ping.
pub async fn get_system_status(
    State(state): State<Arc<AppState>>,
    principal: MaybePrincipal,
) -> Result<Json<ApiResponse<SystemStatusDto>>, ApiError> {
    require_authenticated(principal.get())?;

    state.store.ping().await?;
    let user_count = state.store.count_users().await?;

    Ok(Json(ApiResponse::success(SystemStatusDto {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        user_count,
    })))
}
