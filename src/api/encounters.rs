use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;
use tracing::info;

use super::auth::{MaybePrincipal, require_admin, require_authenticated, require_self_or_admin};
use super::validation::{validate_encounter_description, validate_encounter_name};
use super::{
    ApiError, ApiResponse, AppState, CreateEncounterRequest, EncounterDto, UpdateDescriptionRequest,
};
use crate::auth::policy;
use crate::db::QuotaOutcome;
use crate::entities::users::UserType;

/// Create an encounter for `user_id`. An admin may create on behalf of any
/// user; the owner's plan quota applies either way.
pub async fn create_encounter(
    State(state): State<Arc<AppState>>,
    principal: MaybePrincipal,
    Json(body): Json<CreateEncounterRequest>,
) -> Result<Json<ApiResponse<EncounterDto>>, ApiError> {
    require_self_or_admin(principal.get(), Some(body.user_id))?;

    let owner = state
        .store
        .get_user(body.user_id)
        .await?
        .ok_or_else(|| ApiError::user_not_found(body.user_id))?;

    let name = validate_encounter_name(&body.name)?;
    let description = validate_encounter_description(&body.description)?;

    let limit = (owner.user_type != UserType::Admin).then(|| owner.payment_plan.encounter_limit());
    match state
        .store
        .insert_encounter_with_quota(owner.id, name, description, limit)
        .await?
    {
        QuotaOutcome::Created(encounter) => {
            info!(
                encounter_id = encounter.id,
                user_id = owner.id,
                "Encounter created"
            );
            Ok(Json(ApiResponse::success(EncounterDto::from(encounter))))
        }
        QuotaOutcome::LimitReached { limit, .. } => Err(ApiError::QuotaExceeded(format!(
            "Cannot create. Reached limit of Encounters: {}",
            limit
        ))),
    }
}

pub async fn list_encounters(
    State(state): State<Arc<AppState>>,
    principal: MaybePrincipal,
) -> Result<Json<ApiResponse<Vec<EncounterDto>>>, ApiError> {
    require_admin(principal.get())?;

    let encounters = state.store.list_encounters().await?;
    Ok(Json(ApiResponse::success(
        encounters.into_iter().map(EncounterDto::from).collect(),
    )))
}

/// Read one encounter. Owners and admins always may; everyone else only once
/// it is published.
pub async fn get_encounter(
    State(state): State<Arc<AppState>>,
    principal: MaybePrincipal,
    Path(encounter_id): Path<i32>,
) -> Result<Json<ApiResponse<EncounterDto>>, ApiError> {
    let caller = require_authenticated(principal.get())?;

    let encounter = state
        .store
        .get_encounter(encounter_id)
        .await?
        .ok_or_else(|| ApiError::encounter_not_found(encounter_id))?;

    if !encounter.published && !policy::is_self_or_admin(caller, encounter.user_id) {
        return Err(ApiError::not_authorized());
    }

    Ok(Json(ApiResponse::success(EncounterDto::from(encounter))))
}

pub async fn list_encounters_by_user_id(
    State(state): State<Arc<AppState>>,
    principal: MaybePrincipal,
    Path(user_id): Path<i32>,
) -> Result<Json<ApiResponse<Vec<EncounterDto>>>, ApiError> {
    require_self_or_admin(principal.get(), Some(user_id))?;

    let encounters = state.store.list_encounters_for_owner(user_id).await?;
    Ok(Json(ApiResponse::success(
        encounters.into_iter().map(EncounterDto::from).collect(),
    )))
}

pub async fn list_encounters_by_username(
    State(state): State<Arc<AppState>>,
    principal: MaybePrincipal,
    Path(username): Path<String>,
) -> Result<Json<ApiResponse<Vec<EncounterDto>>>, ApiError> {
    require_authenticated(principal.get())?;

    let owner = state
        .store
        .get_user_by_username(&username)
        .await?
        .ok_or_else(|| ApiError::username_not_found(&username))?;

    require_self_or_admin(principal.get(), Some(owner.id))?;

    let encounters = state.store.list_encounters_for_owner(owner.id).await?;
    Ok(Json(ApiResponse::success(
        encounters.into_iter().map(EncounterDto::from).collect(),
    )))
}

pub async fn update_description(
    State(state): State<Arc<AppState>>,
    principal: MaybePrincipal,
    Path(encounter_id): Path<i32>,
    Json(body): Json<UpdateDescriptionRequest>,
) -> Result<Json<ApiResponse<EncounterDto>>, ApiError> {
    let caller = require_authenticated(principal.get())?;

    let encounter = state
        .store
        .get_encounter(encounter_id)
        .await?
        .ok_or_else(|| ApiError::encounter_not_found(encounter_id))?;
    if !policy::is_self_or_admin(caller, encounter.user_id) {
        return Err(ApiError::not_authorized());
    }

    let description = validate_encounter_description(&body.description)?;
    let updated = state
        .store
        .update_encounter_description(encounter_id, description)
        .await?
        .ok_or_else(|| ApiError::encounter_not_found(encounter_id))?;

    Ok(Json(ApiResponse::success(EncounterDto::from(updated))))
}

pub async fn toggle_published(
    State(state): State<Arc<AppState>>,
    principal: MaybePrincipal,
    Path(encounter_id): Path<i32>,
) -> Result<Json<ApiResponse<EncounterDto>>, ApiError> {
    let caller = require_authenticated(principal.get())?;

    let encounter = state
        .store
        .get_encounter(encounter_id)
        .await?
        .ok_or_else(|| ApiError::encounter_not_found(encounter_id))?;
    if !policy::is_self_or_admin(caller, encounter.user_id) {
        return Err(ApiError::not_authorized());
    }

    let updated = state
        .store
        .toggle_encounter_published(encounter_id)
        .await?
        .ok_or_else(|| ApiError::encounter_not_found(encounter_id))?;

    info!(
        encounter_id,
        published = updated.published,
        "Encounter visibility toggled"
    );
    Ok(Json(ApiResponse::success(EncounterDto::from(updated))))
}

/// Delete an encounter, returning rows removed. Deleting an id that does not
/// exist is not an error; it reports 0.
pub async fn delete_encounter(
    State(state): State<Arc<AppState>>,
    principal: MaybePrincipal,
    Path(encounter_id): Path<i32>,
) -> Result<Json<ApiResponse<u64>>, ApiError> {
    let caller = require_authenticated(principal.get())?;

    let Some(encounter) = state.store.get_encounter(encounter_id).await? else {
        return Ok(Json(ApiResponse::success(0)));
    };
    if !policy::is_self_or_admin(caller, encounter.user_id) {
        return Err(ApiError::not_authorized());
    }

    let removed = state.store.delete_encounter(encounter_id).await?;

    info!(encounter_id, "Encounter deleted");
    Ok(Json(ApiResponse::success(removed)))
}
