//! Credential resolution and API key lifecycle, exercised end to end over
//! HTTP with both authentication schemes.

use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode},
};
use http_body_util::BodyExt;
use std::sync::Arc;
use tavernkeep::api::AppState;
use tavernkeep::config::Config;
use tower::ServiceExt;

const ADMIN_USER: &str = "admin";
const ADMIN_PASSWORD: &str = "Admin-123!";

const TEST_PASSWORD: &str = "Dragon-Fire7!";

async fn spawn_app() -> (Arc<AppState>, Router) {
    let db_path =
        std::env::temp_dir().join(format!("tavernkeep-auth-test-{}.db", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    // Cheap hashing parameters so the suite stays quick.
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;

    let state = tavernkeep::api::create_app_state(config)
        .await
        .expect("failed to create app state");
    let router = tavernkeep::api::router(state.clone());
    (state, router)
}

fn basic_auth(username: &str, password: &str) -> String {
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
}

async fn read_json(response: Response<Body>) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

async fn get_with_auth(app: &Router, uri: &str, auth: &str) -> Response<Body> {
    app.clone()
        .oneshot(
            Request::builder()
                .uri(uri)
                .header("Authorization", auth)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

/// Sign up, enable, and upgrade an account to the ADVENTURER plan so it may
/// hold API keys.
async fn create_adventurer(app: &Router, username: &str) -> i32 {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/user")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "username": username,
                        "email": format!("{username}@example.com"),
                        "password": TEST_PASSWORD,
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    let user_id = i32::try_from(body["data"]["id"].as_i64().unwrap()).unwrap();

    for uri in [
        format!("/user/enable/{user_id}"),
        format!("/user/paymentplan/{user_id}/ADVENTURER"),
    ] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("PATCH")
                    .uri(uri)
                    .header("Authorization", basic_auth(ADMIN_USER, ADMIN_PASSWORD))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    user_id
}

/// POST /apikey as the given caller, returning (identifier, full key).
async fn issue_key(app: &Router, auth: &str) -> (String, String) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/apikey")
                .header("Authorization", auth)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    let identifier = body["data"]["identifier"].as_str().unwrap().to_string();
    let key = body["data"]["key"].as_str().unwrap().to_string();
    (identifier, key)
}

#[tokio::test]
async fn test_missing_credentials_rejected() {
    let (_, app) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/user").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = read_json(response).await;
    assert_eq!(
        body["error"],
        "Full authentication is required to access this resource"
    );
}

#[tokio::test]
async fn test_bad_basic_credentials_share_one_message() {
    let (_, app) = spawn_app().await;

    // Wrong password for a real account and an unknown account read the
    // same, so responses cannot confirm which usernames exist.
    let response = get_with_auth(&app, "/user", &basic_auth(ADMIN_USER, "Wrong-Pass1!")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = read_json(response).await;
    assert_eq!(body["error"], "Invalid username or password.");

    let response = get_with_auth(&app, "/user", &basic_auth("nobody", "Wrong-Pass1!")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = read_json(response).await;
    assert_eq!(body["error"], "Invalid username or password.");
}

#[tokio::test]
async fn test_non_basic_scheme_is_anonymous() {
    let (_, app) = spawn_app().await;

    let response = get_with_auth(&app, "/user", "Bearer some-token").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = read_json(response).await;
    assert_eq!(
        body["error"],
        "Full authentication is required to access this resource"
    );
}

#[tokio::test]
async fn test_garbled_basic_header_rejected() {
    let (_, app) = spawn_app().await;

    let response = get_with_auth(&app, "/user", "Basic %%%not-base64%%%").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = read_json(response).await;
    assert_eq!(body["error"], "Invalid Basic authentication header.");
}

#[tokio::test]
async fn test_malformed_api_key_header_rejected() {
    let (_, app) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/system/status")
                .header("X-API-KEY", "far-too-short")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = read_json(response).await;
    assert_eq!(body["error"], "Provided API Key is malformed.");
}

#[tokio::test]
async fn test_free_plan_cannot_issue_api_keys() {
    let (_, app) = spawn_app().await;

    // Signup and enable, but stay on the FREE plan.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/user")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "username": "freeloader",
                        "email": "freeloader@example.com",
                        "password": TEST_PASSWORD,
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    let user_id = body["data"]["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri(format!("/user/enable/{user_id}"))
                .header("Authorization", basic_auth(ADMIN_USER, ADMIN_PASSWORD))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/apikey")
                .header("Authorization", basic_auth("freeloader", TEST_PASSWORD))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = read_json(response).await;
    assert_eq!(body["error"], "Cannot create. Reached limit of API Keys: 0");
}

#[tokio::test]
async fn test_api_key_lifecycle() {
    let (_, app) = spawn_app().await;
    let user_id = create_adventurer(&app, "keymaster").await;
    let auth = basic_auth("keymaster", TEST_PASSWORD);

    let (identifier, key) = issue_key(&app, &auth).await;
    assert_eq!(identifier.chars().count(), 35);
    assert_eq!(key.chars().count(), 71);
    assert!(key.starts_with(&identifier));

    // The key authenticates requests on its own.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/system/status")
                .header("X-API-KEY", key.clone())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Listing never echoes the secret back.
    let response = get_with_auth(&app, &format!("/apikey/{user_id}"), &auth).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    let keys = body["data"].as_array().unwrap();
    assert_eq!(keys.len(), 1);
    assert_eq!(keys[0]["identifier"], serde_json::json!(identifier));
    assert_eq!(keys[0]["secret"], "[hidden for security reasons]");

    let response = get_with_auth(
        &app,
        &format!("/apikey/valid-till-date/{user_id}/{identifier}"),
        &auth,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert!(body["data"].is_string());

    // Same identifier, wrong secret.
    let forged = format!("{identifier}{}", "0".repeat(36));
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/system/status")
                .header("X-API-KEY", forged)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = read_json(response).await;
    assert_eq!(body["error"], "Provided API Key is not valid.");

    // Revocation removes one row, repeating it removes none.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/apikey/{user_id}/{identifier}"))
                .header("Authorization", auth.clone())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["data"], serde_json::json!(1));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/apikey/{user_id}/{identifier}"))
                .header("Authorization", auth.clone())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["data"], serde_json::json!(0));

    // The revoked key no longer authenticates.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/system/status")
                .header("X-API-KEY", key)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = read_json(response).await;
    assert_eq!(body["error"], "API Key with provided value not found");
}

#[tokio::test]
async fn test_expired_api_key_rejected() {
    let (state, app) = spawn_app().await;
    create_adventurer(&app, "latecomer").await;

    let (identifier, key) = issue_key(&app, &basic_auth("latecomer", TEST_PASSWORD)).await;

    // Age the key past its expiry date.
    let yesterday = chrono::Utc::now().date_naive() - chrono::Days::new(1);
    let updated = state
        .store
        .set_api_key_valid_till(&identifier, yesterday)
        .await
        .expect("failed to backdate key");
    assert_eq!(updated, 1);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/system/status")
                .header("X-API-KEY", key)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = read_json(response).await;
    assert_eq!(body["error"], "API Key has expired. Please generate new one.");
}

#[tokio::test]
async fn test_api_key_quota_enforced_per_plan() {
    let (_, app) = spawn_app().await;
    create_adventurer(&app, "stockpiler").await;
    let auth = basic_auth("stockpiler", TEST_PASSWORD);

    issue_key(&app, &auth).await;
    issue_key(&app, &auth).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/apikey")
                .header("Authorization", auth)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = read_json(response).await;
    assert_eq!(body["error"], "Cannot create. Reached limit of API Keys: 2");
}

#[tokio::test]
async fn test_revoking_all_keys_for_owner() {
    let (state, app) = spawn_app().await;
    let user_id = create_adventurer(&app, "keyring").await;
    let auth = basic_auth("keyring", TEST_PASSWORD);

    let (_, first_key) = issue_key(&app, &auth).await;
    let (_, second_key) = issue_key(&app, &auth).await;

    let removed = state
        .api_keys
        .revoke_all_for_owner(user_id)
        .await
        .expect("failed to revoke keys");
    assert_eq!(removed, 2);

    // Running it again finds nothing left.
    let removed = state
        .api_keys
        .revoke_all_for_owner(user_id)
        .await
        .expect("failed to revoke keys");
    assert_eq!(removed, 0);

    for key in [first_key, second_key] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/system/status")
                    .header("X-API-KEY", key)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn test_admin_is_exempt_from_key_quota() {
    let (_, app) = spawn_app().await;
    let auth = basic_auth(ADMIN_USER, ADMIN_PASSWORD);

    // The bootstrap admin sits on the FREE plan, which allows zero keys for
    // everyone else.
    issue_key(&app, &auth).await;
    issue_key(&app, &auth).await;
}

#[tokio::test]
async fn test_api_key_cannot_perform_restricted_mutations() {
    let (_, app) = spawn_app().await;
    let user_id = create_adventurer(&app, "cautious").await;
    let (_, key) = issue_key(&app, &basic_auth("cautious", TEST_PASSWORD)).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri("/user/password")
                .header("X-API-KEY", key.clone())
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "current_password": TEST_PASSWORD,
                        "new_password": "Taken-Over99!",
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = read_json(response).await;
    assert_eq!(body["error"], "Forbidden. Cannot use API Key for this action.");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/user/{user_id}"))
                .header("X-API-KEY", key)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_api_key_takes_precedence_over_basic_auth() {
    let (_, app) = spawn_app().await;
    create_adventurer(&app, "twohats").await;
    let (_, key) = issue_key(&app, &basic_auth("twohats", TEST_PASSWORD)).await;

    // Both headers present: the key decides who the caller is, so the
    // admin-only listing is refused even though the Basic pair is an admin.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/user")
                .header("Authorization", basic_auth(ADMIN_USER, ADMIN_PASSWORD))
                .header("X-API-KEY", key)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_api_keys_are_scoped_to_their_owner() {
    let (_, app) = spawn_app().await;
    create_adventurer(&app, "firstkey").await;
    let second = create_adventurer(&app, "secondkey").await;

    let (identifier, key) = issue_key(&app, &basic_auth("firstkey", TEST_PASSWORD)).await;
    let second_auth = basic_auth("secondkey", TEST_PASSWORD);

    // Another user cannot read or revoke the key through their own scope.
    let response = get_with_auth(
        &app,
        &format!("/apikey/valid-till-date/{second}/{identifier}"),
        &second_auth,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/apikey/{second}/{identifier}"))
                .header("Authorization", second_auth)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["data"], serde_json::json!(0));

    // The key survived the foreign revocation attempt.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/system/status")
                .header("X-API-KEY", key)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
