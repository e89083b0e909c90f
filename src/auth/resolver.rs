//! Dual-scheme authentication: `X-API-KEY` header or HTTP Basic. The header
//! inspection is a pure function so the dispatch rules can be unit tested
//! without a running server; the `Authenticator` then drives the database
//! and hashing work for whichever scheme won.

use std::sync::Arc;

use axum::http::{HeaderMap, header};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use thiserror::Error;

use crate::auth::encoder::PasswordEncoder;
use crate::auth::identifier::IDENTIFIER_LENGTH;
use crate::auth::principal::{AuthContext, CredentialKind, Principal};
use crate::db::Store;
use crate::entities::users;
use crate::services::api_key_service::{ApiKeyError, ApiKeyService};

/// Header carrying `identifier + secret` as one opaque credential string.
pub const API_KEY_HEADER: &str = "X-API-KEY";

const MALFORMED_API_KEY: &str = "Provided API Key is malformed.";
const INVALID_BASIC: &str = "Invalid Basic authentication header.";
const BAD_CREDENTIALS: &str = "Invalid username or password.";
const NO_USER_FOR_KEY: &str = "No user found for provided API Key";
const ACCOUNT_LOCKED: &str = "Your account is locked.";
const ACCOUNT_NOT_ENABLED: &str = "Your account is not enabled.";

/// What the request headers ask us to do. Exactly one variant per request;
/// an API key takes precedence over Basic credentials when both are sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthAttempt {
    /// A principal resolved earlier in the pipeline; never re-authenticate.
    Resolved(Principal),
    /// No credentials at all. Downstream authorization may still reject.
    Anonymous,
    ApiKey { identifier: String, secret: String },
    Basic { username: String, password: String },
    /// Credentials were supplied but unusable. Fails 401, never falls
    /// through to anonymous.
    Malformed(String),
}

/// Classifies a request's credentials without touching the database.
#[must_use]
pub fn classify_request(existing: Option<Principal>, headers: &HeaderMap) -> AuthAttempt {
    if let Some(principal) = existing {
        return AuthAttempt::Resolved(principal);
    }

    if let Some(raw) = headers.get(API_KEY_HEADER) {
        let Ok(value) = raw.to_str() else {
            return AuthAttempt::Malformed(MALFORMED_API_KEY.to_string());
        };
        let value = value.trim();
        if !value.is_empty() {
            // Identifier plus at least one secret character.
            if value.len() <= IDENTIFIER_LENGTH {
                return AuthAttempt::Malformed(MALFORMED_API_KEY.to_string());
            }
            let (identifier, secret) = value.split_at(IDENTIFIER_LENGTH);
            return AuthAttempt::ApiKey {
                identifier: identifier.to_string(),
                secret: secret.to_string(),
            };
        }
    }

    if let Some(raw) = headers.get(header::AUTHORIZATION) {
        let Ok(value) = raw.to_str() else {
            return AuthAttempt::Malformed(INVALID_BASIC.to_string());
        };
        let Some(encoded) = strip_basic_scheme(value) else {
            // Some other scheme (e.g. Bearer). Not ours to judge.
            return AuthAttempt::Anonymous;
        };
        let Ok(decoded) = BASE64.decode(encoded.trim()) else {
            return AuthAttempt::Malformed(INVALID_BASIC.to_string());
        };
        let Ok(pair) = String::from_utf8(decoded) else {
            return AuthAttempt::Malformed(INVALID_BASIC.to_string());
        };
        let Some((username, password)) = pair.split_once(':') else {
            return AuthAttempt::Malformed(INVALID_BASIC.to_string());
        };
        return AuthAttempt::Basic {
            username: username.to_string(),
            password: password.to_string(),
        };
    }

    AuthAttempt::Anonymous
}

fn strip_basic_scheme(value: &str) -> Option<&str> {
    let (scheme, rest) = value.split_once(' ')?;
    scheme.eq_ignore_ascii_case("Basic").then_some(rest)
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// Credentials were presented and refused. Maps to HTTP 401.
    #[error("{0}")]
    Rejected(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Async driver: turns a classified attempt into a principal or a rejection.
pub struct Authenticator {
    store: Store,
    encoder: Arc<PasswordEncoder>,
    api_keys: Arc<dyn ApiKeyService>,
}

impl Authenticator {
    pub fn new(store: Store, encoder: Arc<PasswordEncoder>, api_keys: Arc<dyn ApiKeyService>) -> Self {
        Self {
            store,
            encoder,
            api_keys,
        }
    }

    pub async fn authenticate(&self, attempt: AuthAttempt) -> Result<AuthContext, AuthError> {
        match attempt {
            AuthAttempt::Resolved(principal) => Ok(AuthContext::Authenticated(principal)),
            AuthAttempt::Anonymous => Ok(AuthContext::Anonymous),
            AuthAttempt::Malformed(reason) => Err(AuthError::Rejected(reason)),
            AuthAttempt::ApiKey { identifier, secret } => {
                self.authenticate_api_key(&identifier, &secret).await
            }
            AuthAttempt::Basic { username, password } => {
                self.authenticate_basic(&username, &password).await
            }
        }
    }

    async fn authenticate_api_key(
        &self,
        identifier: &str,
        secret: &str,
    ) -> Result<AuthContext, AuthError> {
        let owner_id = self
            .api_keys
            .validate(identifier, secret)
            .await
            .map_err(|err| match err {
                ApiKeyError::Database(source) => AuthError::Internal(source),
                refused => AuthError::Rejected(refused.to_string()),
            })?;

        let Some(user) = self.store.get_user(owner_id).await? else {
            return Err(AuthError::Rejected(NO_USER_FOR_KEY.to_string()));
        };

        let principal = check_account_flags(&user, CredentialKind::ApiKey)?;
        Ok(AuthContext::Authenticated(principal))
    }

    /// Unknown username and wrong password produce the same message, so the
    /// response never confirms that an account exists.
    async fn authenticate_basic(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AuthContext, AuthError> {
        let Some(user) = self.store.get_user_by_username(username).await? else {
            return Err(AuthError::Rejected(BAD_CREDENTIALS.to_string()));
        };

        let verified = self
            .encoder
            .verify_async(password.to_string(), user.password_hash.clone())
            .await?;
        if !verified {
            return Err(AuthError::Rejected(BAD_CREDENTIALS.to_string()));
        }

        let principal = check_account_flags(&user, CredentialKind::Password)?;
        Ok(AuthContext::Authenticated(principal))
    }
}

/// Locked beats not-enabled when both apply; both reject with 401 even when
/// the presented credentials were correct.
fn check_account_flags(
    user: &users::Model,
    credential: CredentialKind,
) -> Result<Principal, AuthError> {
    if user.locked {
        return Err(AuthError::Rejected(ACCOUNT_LOCKED.to_string()));
    }
    if !user.enabled {
        return Err(AuthError::Rejected(ACCOUNT_NOT_ENABLED.to_string()));
    }
    Ok(Principal::new(user.id, user.user_type, credential))
}
