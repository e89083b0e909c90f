use axum::{
    Json,
    extract::{Path, State},
};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::info;

use super::auth::{MaybePrincipal, require_authenticated, require_self_or_admin};
use super::{ApiError, ApiKeyDto, ApiResponse, AppState, IssuedApiKeyDto};

/// Issue a new API key for the caller. The response is the only place the
/// plaintext secret ever appears; only its hash is stored.
pub async fn create_api_key(
    State(state): State<Arc<AppState>>,
    principal: MaybePrincipal,
) -> Result<Json<ApiResponse<IssuedApiKeyDto>>, ApiError> {
    let caller = require_authenticated(principal.get())?;

    let owner = state
        .store
        .get_user(caller.user_id)
        .await?
        .ok_or_else(|| ApiError::user_not_found(caller.user_id))?;

    let issued = state.api_keys.issue(&owner).await?;

    info!(user_id = owner.id, identifier = %issued.identifier, "API key issued");
    Ok(Json(ApiResponse::success(IssuedApiKeyDto::from(issued))))
}

pub async fn list_api_keys(
    State(state): State<Arc<AppState>>,
    principal: MaybePrincipal,
    Path(user_id): Path<i32>,
) -> Result<Json<ApiResponse<Vec<ApiKeyDto>>>, ApiError> {
    require_self_or_admin(principal.get(), Some(user_id))?;

    let keys = state.store.list_api_keys_for_owner(user_id).await?;
    Ok(Json(ApiResponse::success(
        keys.into_iter().map(ApiKeyDto::from).collect(),
    )))
}

/// Expiry date of one key. Scoped to the owner in the path; an identifier
/// that belongs to someone else reads as absent.
pub async fn get_valid_till_date(
    State(state): State<Arc<AppState>>,
    principal: MaybePrincipal,
    Path((user_id, identifier)): Path<(i32, String)>,
) -> Result<Json<ApiResponse<NaiveDate>>, ApiError> {
    require_self_or_admin(principal.get(), Some(user_id))?;

    let key = state
        .store
        .get_api_key(&identifier)
        .await?
        .filter(|key| key.user_id == user_id)
        .ok_or_else(|| ApiError::api_key_not_found(&identifier))?;

    Ok(Json(ApiResponse::success(key.valid_till)))
}

/// Revoke a key, returning the number of rows removed (0 when the identifier
/// does not exist or belongs to another user).
pub async fn revoke_api_key(
    State(state): State<Arc<AppState>>,
    principal: MaybePrincipal,
    Path((user_id, identifier)): Path<(i32, String)>,
) -> Result<Json<ApiResponse<u64>>, ApiError> {
    require_self_or_admin(principal.get(), Some(user_id))?;

    let removed = state.api_keys.revoke(user_id, &identifier).await?;

    info!(user_id, identifier = %identifier, removed, "API key revoked");
    Ok(Json(ApiResponse::success(removed)))
}
