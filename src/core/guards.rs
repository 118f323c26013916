//! Route guards - Decide whether a caller may enter a role-scoped area.
//!
//! Guards are pure functions over the caller's role so that both the HTTP
//! layer and any front end can share the same routing rules.

use crate::entities::Role;
use serde::Serialize;

/// Sign-in page
pub const AUTH_ROUTE: &str = "/auth";
/// Landing page
pub const HOME_ROUTE: &str = "/";

/// Outcome of a guard check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", content = "to", rename_all = "lowercase")]
pub enum GuardDecision {
    /// Let the caller through
    Allow,
    /// Send the caller elsewhere
    Redirect(&'static str),
}

/// Home area of each role.
#[must_use]
pub const fn dashboard_route(role: Role) -> &'static str {
    match role {
        Role::Admin => "/admin",
        Role::Teacher => "/teacher",
        Role::Parent => "/parent",
    }
}

/// Allows callers whose role is in `allowed`.
///
/// `caller` is `None` when nobody is signed in, and `Some(None)` when the
/// caller is signed in but has no profile (role unknown).
#[must_use]
pub fn role_guard(caller: Option<Option<Role>>, allowed: &[Role]) -> GuardDecision {
    match caller {
        None => GuardDecision::Redirect(AUTH_ROUTE),
        Some(Some(role)) if allowed.contains(&role) => GuardDecision::Allow,
        Some(_) => GuardDecision::Redirect(HOME_ROUTE),
    }
}

/// Sends signed-in callers with a known role to their dashboard.
#[must_use]
pub const fn redirect_authenticated(caller: Option<Option<Role>>) -> GuardDecision {
    match caller {
        Some(Some(role)) => GuardDecision::Redirect(dashboard_route(role)),
        _ => GuardDecision::Allow,
    }
}

/// Requires any signed-in caller.
#[must_use]
pub const fn require_auth(caller: Option<Option<Role>>) -> GuardDecision {
    match caller {
        None => GuardDecision::Redirect(AUTH_ROUTE),
        Some(_) => GuardDecision::Allow,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_guard() {
        assert_eq!(role_guard(None, &[Role::Admin]), GuardDecision::Redirect("/auth"));
        assert_eq!(role_guard(Some(Some(Role::Admin)), &[Role::Admin]), GuardDecision::Allow);
        assert_eq!(
            role_guard(Some(Some(Role::Parent)), &[Role::Admin, Role::Teacher]),
            GuardDecision::Redirect("/")
        );
        assert_eq!(role_guard(Some(None), &[Role::Admin]), GuardDecision::Redirect("/"));
    }

    #[test]
    fn test_redirect_authenticated() {
        assert_eq!(redirect_authenticated(None), GuardDecision::Allow);
        assert_eq!(redirect_authenticated(Some(None)), GuardDecision::Allow);
        assert_eq!(
            redirect_authenticated(Some(Some(Role::Teacher))),
            GuardDecision::Redirect("/teacher")
        );
        assert_eq!(
            redirect_authenticated(Some(Some(Role::Parent))),
            GuardDecision::Redirect("/parent")
        );
    }

    #[test]
    fn test_require_auth() {
        assert_eq!(require_auth(None), GuardDecision::Redirect("/auth"));
        assert_eq!(require_auth(Some(None)), GuardDecision::Allow);
    }

    #[test]
    fn test_decision_serialization() {
        let json = serde_json::to_value(GuardDecision::Redirect("/admin")).unwrap_or_default();
        assert_eq!(json["decision"], "redirect");
        assert_eq!(json["to"], "/admin");
    }
}
