use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, patch, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::{Authenticator, PasswordEncoder};
use crate::config::Config;
use crate::db::Store;
use crate::services::{ApiKeyService, SeaOrmApiKeyService};

mod api_keys;
pub mod auth;
mod encounters;
mod error;
mod system;
mod types;
mod users;
pub mod validation;

pub use error::ApiError;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,

    pub store: Store,

    pub encoder: Arc<PasswordEncoder>,

    pub api_keys: Arc<dyn ApiKeyService>,

    pub authenticator: Arc<Authenticator>,

    pub start_time: std::time::Instant,
}

pub async fn create_app_state(config: Config) -> anyhow::Result<Arc<AppState>> {
    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    let encoder = Arc::new(PasswordEncoder::new(&config.security)?);
    let api_keys: Arc<dyn ApiKeyService> =
        Arc::new(SeaOrmApiKeyService::new(store.clone(), encoder.clone()));
    let authenticator = Arc::new(Authenticator::new(
        store.clone(),
        encoder.clone(),
        api_keys.clone(),
    ));

    Ok(Arc::new(AppState {
        config,
        store,
        encoder,
        api_keys,
        authenticator,
        start_time: std::time::Instant::now(),
    }))
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config.server.cors_allowed_origins.clone();

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .route("/user", post(users::create_user))
        .route("/user", get(users::list_users))
        .route("/user/{user_id}", delete(users::delete_user))
        .route("/user/by-userid/{user_id}", get(users::get_user_by_id))
        .route(
            "/user/by-username/{username}",
            get(users::get_user_by_username),
        )
        .route("/user/email/{user_id}", patch(users::update_email))
        .route("/user/username/{user_id}", patch(users::update_username))
        .route("/user/password", patch(users::change_password))
        .route(
            "/user/paymentplan/{user_id}/{plan}",
            patch(users::set_payment_plan),
        )
        .route(
            "/user/usertype/{user_id}/{user_type}",
            patch(users::set_user_type),
        )
        .route("/user/enable/{user_id}", patch(users::enable_user))
        .route("/user/lock-unlock/{user_id}", patch(users::toggle_lock))
        .route(
            "/user/refresh-password-last-updated-date/{user_id}",
            patch(users::refresh_password_date),
        )
        .route("/apikey", post(api_keys::create_api_key))
        .route("/apikey/{user_id}", get(api_keys::list_api_keys))
        .route(
            "/apikey/valid-till-date/{user_id}/{identifier}",
            get(api_keys::get_valid_till_date),
        )
        .route(
            "/apikey/{user_id}/{identifier}",
            delete(api_keys::revoke_api_key),
        )
        .route("/encounter", post(encounters::create_encounter))
        .route("/encounter", get(encounters::list_encounters))
        .route("/encounter/{encounter_id}", get(encounters::get_encounter))
        .route(
            "/encounter/{encounter_id}",
            delete(encounters::delete_encounter),
        )
        .route(
            "/encounter/by-userid/{user_id}",
            get(encounters::list_encounters_by_user_id),
        )
        .route(
            "/encounter/by-username/{username}",
            get(encounters::list_encounters_by_username),
        )
        .route(
            "/encounter/description/{encounter_id}",
            patch(encounters::update_description),
        )
        .route(
            "/encounter/published/{encounter_id}",
            patch(encounters::toggle_published),
        )
        .route("/system/status", get(system::get_system_status))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::resolve_request_principal,
        ))
        .with_state(state)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}
