use crate::entities::users::UserType;

/// Which mechanism authenticated the request. Some mutations are barred for
/// API-key sessions, so handlers need to know how the principal got here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    Password,
    ApiKey,
}

/// The resolved identity attached to an authenticated request. Carried in
/// request extensions, never in ambient global state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: i32,
    pub role: UserType,
    pub credential: CredentialKind,
}

impl Principal {
    #[must_use]
    pub const fn new(user_id: i32, role: UserType, credential: CredentialKind) -> Self {
        Self {
            user_id,
            role,
            credential,
        }
    }
}

/// Outcome of running the resolver over a request that was not rejected.
#[derive(Debug, Clone)]
pub enum AuthContext {
    Anonymous,
    Authenticated(Principal),
}
