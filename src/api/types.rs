use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::entities::users::{PaymentPlan, UserType};
use crate::entities::{api_keys, encounters, users};
use crate::services::IssuedApiKey;

/// Placeholder returned wherever a stored secret would otherwise appear.
pub const REDACTED: &str = "[hidden for security reasons]";

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// User representation returned by every user endpoint. The password field
/// always carries the redaction placeholder, never the stored hash.
#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub user_type: UserType,
    pub payment_plan: PaymentPlan,
    pub password: String,
    pub locked: bool,
    pub enabled: bool,
    pub password_last_updated: NaiveDate,
    pub created_at: NaiveDateTime,
}

impl From<users::Model> for UserDto {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            user_type: model.user_type,
            payment_plan: model.payment_plan,
            password: REDACTED.to_string(),
            locked: model.locked,
            enabled: model.enabled,
            password_last_updated: model.password_last_updated,
            created_at: model.created_at,
        }
    }
}

/// Stored API key as listed back to its owner; the secret is redacted.
#[derive(Debug, Serialize)]
pub struct ApiKeyDto {
    pub identifier: String,
    pub secret: String,
    pub user_id: i32,
    pub valid_till: NaiveDate,
}

impl From<api_keys::Model> for ApiKeyDto {
    fn from(model: api_keys::Model) -> Self {
        Self {
            identifier: model.identifier,
            secret: REDACTED.to_string(),
            user_id: model.user_id,
            valid_till: model.valid_till,
        }
    }
}

/// Issuance response. `key` is the identifier plus the plaintext secret; this
/// is the only response that ever carries the secret.
#[derive(Debug, Serialize)]
pub struct IssuedApiKeyDto {
    pub key: String,
    pub identifier: String,
    pub valid_till: NaiveDate,
}

impl From<IssuedApiKey> for IssuedApiKeyDto {
    fn from(issued: IssuedApiKey) -> Self {
        Self {
            key: issued.credential,
            identifier: issued.identifier,
            valid_till: issued.valid_till,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EncounterDto {
    pub id: i32,
    pub user_id: Option<i32>,
    pub name: String,
    pub description: String,
    pub published: bool,
    pub created_at: NaiveDateTime,
}

impl From<encounters::Model> for EncounterDto {
    fn from(model: encounters::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            name: model.name,
            description: model.description,
            published: model.published,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateEmailRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUsernameRequest {
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateEncounterRequest {
    pub user_id: i32,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDescriptionRequest {
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct SystemStatusDto {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub user_count: u64,
}
