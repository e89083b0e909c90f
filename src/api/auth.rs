//! Request authentication middleware and the authorization guards handlers
//! call before touching resources.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use std::convert::Infallible;
use std::sync::Arc;

use super::{ApiError, AppState};
use crate::auth::{AuthContext, CredentialKind, Principal, classify_request, policy};
use crate::config::SecurityConfig;

/// Resolves the request's credentials and stashes the principal in request
/// extensions. Applied to every route; a bad credential fails here with 401
/// and never reaches a handler, while an absent credential passes through as
/// anonymous.
pub async fn resolve_request_principal(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let existing = request.extensions().get::<Principal>().cloned();
    let attempt = classify_request(existing, request.headers());
    let context = state.authenticator.authenticate(attempt).await?;

    if let AuthContext::Authenticated(principal) = context {
        tracing::debug!(user_id = principal.user_id, "request authenticated");
        request.extensions_mut().insert(principal);
    }

    Ok(next.run(request).await)
}

/// Extractor for the principal stashed by [`resolve_request_principal`].
/// Empty for anonymous requests; never rejects on its own.
#[derive(Debug, Clone)]
pub struct MaybePrincipal(Option<Principal>);

impl MaybePrincipal {
    #[must_use]
    pub fn get(&self) -> Option<&Principal> {
        self.0.as_ref()
    }
}

impl<S> FromRequestParts<S> for MaybePrincipal
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<Principal>().cloned()))
    }
}

/// 401 when the request carries no principal with an authenticated role.
pub fn require_authenticated(principal: Option<&Principal>) -> Result<&Principal, ApiError> {
    match principal {
        Some(p) if policy::has_any_authenticated_role(Some(p)) => Ok(p),
        _ => Err(ApiError::authentication_required()),
    }
}

pub fn require_admin(principal: Option<&Principal>) -> Result<&Principal, ApiError> {
    let principal = require_authenticated(principal)?;
    if policy::is_admin(principal) {
        Ok(principal)
    } else {
        Err(ApiError::not_authorized())
    }
}

pub fn require_self_or_admin(
    principal: Option<&Principal>,
    target_user_id: Option<i32>,
) -> Result<&Principal, ApiError> {
    let principal = require_authenticated(principal)?;
    if policy::is_self_or_admin(principal, target_user_id) {
        Ok(principal)
    } else {
        Err(ApiError::not_authorized())
    }
}

/// Extra guard for sensitive mutations (account deletion, password change):
/// when the restriction is switched on, a session authenticated by API key
/// may not perform them.
pub fn require_password_credential(
    principal: &Principal,
    security: &SecurityConfig,
) -> Result<(), ApiError> {
    if security.restrict_api_key_mutations && principal.credential == CredentialKind::ApiKey {
        return Err(ApiError::api_key_barred());
    }
    Ok(())
}
