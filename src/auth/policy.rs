//! Pure authorization predicates. Handlers call these through the guards in
//! the API layer; keeping them free of I/O makes the rules trivially
//! testable.

use crate::auth::principal::Principal;
use crate::entities::users::UserType;

/// True when the request resolved to a principal with a known role. Anonymous
/// requests carry no principal and fail this check.
#[must_use]
pub fn has_any_authenticated_role(principal: Option<&Principal>) -> bool {
    principal.is_some_and(|p| matches!(p.role, UserType::Standard | UserType::Admin))
}

#[must_use]
pub fn is_admin(principal: &Principal) -> bool {
    principal.role == UserType::Admin
}

/// True for admins and for the owner of the target resource. A target of
/// `None` (orphaned resource, owner deleted) is admin-only.
#[must_use]
pub fn is_self_or_admin(principal: &Principal, target_user_id: Option<i32>) -> bool {
    is_admin(principal) || target_user_id.is_some_and(|id| id == principal.user_id)
}
