use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;
use tracing::info;

use super::auth::{
    MaybePrincipal, require_admin, require_authenticated, require_password_credential,
    require_self_or_admin,
};
use super::validation::{validate_email, validate_password, validate_username};
use super::{
    ApiError, ApiResponse, AppState, ChangePasswordRequest, CreateUserRequest, UpdateEmailRequest,
    UpdateUsernameRequest, UserDto,
};
use crate::entities::users::{PaymentPlan, UserType};

/// Public sign-up. New accounts start as STANDARD on the FREE plan and stay
/// disabled until an administrator enables them.
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateUserRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let email = validate_email(&body.email)?;
    if state.store.get_user_by_email(&email).await?.is_some() {
        return Err(ApiError::conflict(format!(
            "email '{}' is already being used by another user.",
            email
        )));
    }

    let username = validate_username(&body.username)?;
    if state.store.get_user_by_username(&username).await?.is_some() {
        return Err(ApiError::conflict(format!(
            "username '{}' is already being used by another user.",
            username
        )));
    }

    validate_password(&body.password)?;

    let password_hash = state.encoder.hash_async(body.password).await?;
    let user = state
        .store
        .insert_user(&username, &email, &password_hash)
        .await?;

    info!(user_id = user.id, username = %user.username, "New user signed up");
    Ok(Json(ApiResponse::success(UserDto::from(user))))
}

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    principal: MaybePrincipal,
) -> Result<Json<ApiResponse<Vec<UserDto>>>, ApiError> {
    require_admin(principal.get())?;

    let users = state.store.list_users().await?;
    Ok(Json(ApiResponse::success(
        users.into_iter().map(UserDto::from).collect(),
    )))
}

pub async fn get_user_by_id(
    State(state): State<Arc<AppState>>,
    principal: MaybePrincipal,
    Path(user_id): Path<i32>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    require_authenticated(principal.get())?;

    let user = state
        .store
        .get_user(user_id)
        .await?
        .ok_or_else(|| ApiError::user_not_found(user_id))?;

    Ok(Json(ApiResponse::success(UserDto::from(user))))
}

pub async fn get_user_by_username(
    State(state): State<Arc<AppState>>,
    principal: MaybePrincipal,
    Path(username): Path<String>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    require_authenticated(principal.get())?;

    let user = state
        .store
        .get_user_by_username(&username)
        .await?
        .ok_or_else(|| ApiError::username_not_found(&username))?;

    Ok(Json(ApiResponse::success(UserDto::from(user))))
}

/// Removes the account, its API keys, and its claim on any encounters.
/// Returns the number of user rows removed.
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    principal: MaybePrincipal,
    Path(user_id): Path<i32>,
) -> Result<Json<ApiResponse<u64>>, ApiError> {
    let caller = require_self_or_admin(principal.get(), Some(user_id))?;
    require_password_credential(caller, &state.config.security)?;

    let removed = state.store.delete_user(user_id).await?;
    if removed == 0 {
        return Err(ApiError::user_not_found(user_id));
    }

    info!(user_id, "User account deleted");
    Ok(Json(ApiResponse::success(removed)))
}

pub async fn update_email(
    State(state): State<Arc<AppState>>,
    principal: MaybePrincipal,
    Path(user_id): Path<i32>,
    Json(body): Json<UpdateEmailRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    require_self_or_admin(principal.get(), Some(user_id))?;

    let user = state
        .store
        .get_user(user_id)
        .await?
        .ok_or_else(|| ApiError::user_not_found(user_id))?;

    let email = validate_email(&body.email)?;
    if user.email == email {
        return Ok(Json(ApiResponse::success(UserDto::from(user))));
    }
    if state.store.get_user_by_email(&email).await?.is_some() {
        return Err(ApiError::conflict(format!(
            "email '{}' is already being used by another user.",
            email
        )));
    }

    let updated = state
        .store
        .update_user_email(user_id, &email)
        .await?
        .ok_or_else(|| ApiError::user_not_found(user_id))?;

    Ok(Json(ApiResponse::success(UserDto::from(updated))))
}

pub async fn update_username(
    State(state): State<Arc<AppState>>,
    principal: MaybePrincipal,
    Path(user_id): Path<i32>,
    Json(body): Json<UpdateUsernameRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    require_self_or_admin(principal.get(), Some(user_id))?;

    let user = state
        .store
        .get_user(user_id)
        .await?
        .ok_or_else(|| ApiError::user_not_found(user_id))?;

    let username = validate_username(&body.username)?;
    if user.username == username {
        return Ok(Json(ApiResponse::success(UserDto::from(user))));
    }
    if state.store.get_user_by_username(&username).await?.is_some() {
        return Err(ApiError::conflict(format!(
            "username '{}' is already being used by another user.",
            username
        )));
    }

    let updated = state
        .store
        .update_user_username(user_id, &username)
        .await?
        .ok_or_else(|| ApiError::user_not_found(user_id))?;

    Ok(Json(ApiResponse::success(UserDto::from(updated))))
}

/// Changes the caller's own password. The current password must verify
/// before the new one is accepted.
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    principal: MaybePrincipal,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let caller = require_authenticated(principal.get())?;
    require_password_credential(caller, &state.config.security)?;
    let user_id = caller.user_id;

    let user = state
        .store
        .get_user(user_id)
        .await?
        .ok_or_else(|| ApiError::user_not_found(user_id))?;

    let current_ok = state
        .encoder
        .verify_async(body.current_password, user.password_hash)
        .await?;
    if !current_ok {
        return Err(ApiError::unprocessable(
            "provided current password is not correct",
        ));
    }

    validate_password(&body.new_password)?;

    let password_hash = state.encoder.hash_async(body.new_password).await?;
    let updated = state
        .store
        .update_user_password_hash(user_id, &password_hash)
        .await?
        .ok_or_else(|| ApiError::user_not_found(user_id))?;

    info!(user_id, "Password changed");
    Ok(Json(ApiResponse::success(UserDto::from(updated))))
}

pub async fn set_payment_plan(
    State(state): State<Arc<AppState>>,
    principal: MaybePrincipal,
    Path((user_id, plan)): Path<(i32, String)>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    require_admin(principal.get())?;

    let plan = PaymentPlan::from_name(&plan).ok_or_else(|| {
        ApiError::unprocessable(format!("provided payment plan '{}' is not valid.", plan))
    })?;

    let user = state
        .store
        .get_user(user_id)
        .await?
        .ok_or_else(|| ApiError::user_not_found(user_id))?;
    if user.payment_plan == plan {
        return Ok(Json(ApiResponse::success(UserDto::from(user))));
    }

    let updated = state
        .store
        .set_user_payment_plan(user_id, plan)
        .await?
        .ok_or_else(|| ApiError::user_not_found(user_id))?;

    info!(user_id, plan = ?plan, "Payment plan changed");
    Ok(Json(ApiResponse::success(UserDto::from(updated))))
}

pub async fn set_user_type(
    State(state): State<Arc<AppState>>,
    principal: MaybePrincipal,
    Path((user_id, user_type)): Path<(i32, String)>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    require_admin(principal.get())?;

    let user_type = UserType::from_name(&user_type).ok_or_else(|| {
        ApiError::unprocessable(format!("provided user type '{}' is not valid.", user_type))
    })?;

    let user = state
        .store
        .get_user(user_id)
        .await?
        .ok_or_else(|| ApiError::user_not_found(user_id))?;
    if user.user_type == user_type {
        return Ok(Json(ApiResponse::success(UserDto::from(user))));
    }

    let updated = state
        .store
        .set_user_type(user_id, user_type)
        .await?
        .ok_or_else(|| ApiError::user_not_found(user_id))?;

    info!(user_id, user_type = ?user_type, "User type changed");
    Ok(Json(ApiResponse::success(UserDto::from(updated))))
}

pub async fn enable_user(
    State(state): State<Arc<AppState>>,
    principal: MaybePrincipal,
    Path(user_id): Path<i32>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    require_admin(principal.get())?;

    let user = state
        .store
        .get_user(user_id)
        .await?
        .ok_or_else(|| ApiError::user_not_found(user_id))?;
    if user.enabled {
        return Ok(Json(ApiResponse::success(UserDto::from(user))));
    }

    let updated = state
        .store
        .enable_user(user_id)
        .await?
        .ok_or_else(|| ApiError::user_not_found(user_id))?;

    info!(user_id, "User account enabled");
    Ok(Json(ApiResponse::success(UserDto::from(updated))))
}

pub async fn toggle_lock(
    State(state): State<Arc<AppState>>,
    principal: MaybePrincipal,
    Path(user_id): Path<i32>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    require_admin(principal.get())?;

    let updated = state
        .store
        .toggle_user_lock(user_id)
        .await?
        .ok_or_else(|| ApiError::user_not_found(user_id))?;

    info!(user_id, locked = updated.locked, "User lock toggled");
    Ok(Json(ApiResponse::success(UserDto::from(updated))))
}

pub async fn refresh_password_date(
    State(state): State<Arc<AppState>>,
    principal: MaybePrincipal,
    Path(user_id): Path<i32>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    require_self_or_admin(principal.get(), Some(user_id))?;

    let updated = state
        .store
        .refresh_user_password_date(user_id)
        .await?
        .ok_or_else(|| ApiError::user_not_found(user_id))?;

    Ok(Json(ApiResponse::success(UserDto::from(updated))))
}
