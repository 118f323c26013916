//! Request extractors that resolve the caller from a bearer session token.
//!
//! The role-specific extractors ([`AdminCaller`], [`TeacherCaller`],
//! [`ParentCaller`]) run the same route guard the front end uses and turn a
//! redirect into `unauthenticated` or `permission-denied`.

use super::{error::AppError, state::AppState};
use crate::{
    core::{
        activity::Actor,
        auth,
        guards::{self, GuardDecision},
        teacher,
    },
    entities::{Role, teacher as teacher_entity, user},
    errors::{Error, Result},
};
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

/// Token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

/// Applies the role guard to a signed-in user.
fn enforce(user: &user::Model, allowed: &[Role]) -> Result<()> {
    match guards::role_guard(Some(Some(user.role)), allowed) {
        GuardDecision::Allow => Ok(()),
        GuardDecision::Redirect(guards::AUTH_ROUTE) => Err(Error::Unauthenticated),
        GuardDecision::Redirect(_) => Err(Error::permission_denied(
            "No tienes acceso a esta sección",
        )),
    }
}

/// Any signed-in user.
#[derive(Debug, Clone)]
pub struct Caller {
    /// Profile of the caller
    pub user: user::Model,
    /// Session token the request carried
    pub token: String,
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> std::result::Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(Error::Unauthenticated)?.to_string();
        let user = auth::authenticate(&state.db, &token).await?;
        Ok(Self { user, token })
    }
}

/// The caller when a valid session is present, `None` otherwise.
#[derive(Debug, Clone)]
pub struct MaybeCaller(pub Option<user::Model>);

impl FromRequestParts<AppState> for MaybeCaller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> std::result::Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            return Ok(Self(None));
        };
        match auth::authenticate(&state.db, token).await {
            Ok(user) => Ok(Self(Some(user))),
            Err(Error::Unauthenticated) => Ok(Self(None)),
            Err(e) => Err(e.into()),
        }
    }
}

/// A school administrator, acting in their own tenant.
#[derive(Debug, Clone)]
pub struct AdminCaller {
    /// Profile of the admin
    pub user: user::Model,
    /// Audit identity, scoped to the admin's tenant
    pub actor: Actor,
}

impl AdminCaller {
    /// The admin's tenant.
    #[must_use]
    pub fn tenant(&self) -> &str {
        &self.actor.tenant_id
    }
}

impl FromRequestParts<AppState> for AdminCaller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> std::result::Result<Self, Self::Rejection> {
        let Caller { user, .. } = Caller::from_request_parts(parts, state).await?;
        enforce(&user, &[Role::Admin])?;
        let actor = auth::actor_for(&user, &user.id);
        Ok(Self { user, actor })
    }
}

/// A teacher with a linked teacher record.
#[derive(Debug, Clone)]
pub struct TeacherCaller {
    /// Login profile
    pub user: user::Model,
    /// Audit identity, scoped to the teacher's school
    pub actor: Actor,
    /// The teacher record linked to the login
    pub teacher: teacher_entity::Model,
}

impl TeacherCaller {
    /// The teacher's school.
    #[must_use]
    pub fn tenant(&self) -> &str {
        &self.actor.tenant_id
    }
}

impl FromRequestParts<AppState> for TeacherCaller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> std::result::Result<Self, Self::Rejection> {
        let Caller { user, .. } = Caller::from_request_parts(parts, state).await?;
        enforce(&user, &[Role::Teacher])?;
        let tenant = auth::staff_tenant(&user)
            .ok_or_else(|| Error::permission_denied("Tu cuenta no está asociada a una escuela"))?;
        let teacher = teacher::teacher_for_user(&state.db, &user.id)
            .await?
            .filter(|t| t.tenant_id == tenant)
            .ok_or_else(|| Error::permission_denied("No hay un perfil de profesor vinculado a esta cuenta"))?;
        let actor = auth::actor_for(&user, &tenant);
        Ok(Self { user, actor, teacher })
    }
}

/// A parent. Parents have no tenant; access goes through their children.
#[derive(Debug, Clone)]
pub struct ParentCaller {
    /// Profile of the parent
    pub user: user::Model,
}

impl ParentCaller {
    /// Audit identity when acting on a child in `tenant_id`.
    #[must_use]
    pub fn actor_in(&self, tenant_id: &str) -> Actor {
        auth::actor_for(&self.user, tenant_id)
    }
}

impl FromRequestParts<AppState> for ParentCaller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> std::result::Result<Self, Self::Rejection> {
        let Caller { user, .. } = Caller::from_request_parts(parts, state).await?;
        enforce(&user, &[Role::Parent])?;
        Ok(Self { user })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use axum::http::Request;

    fn parts_with(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        let (parts, ()) = builder.body(()).unwrap().into_parts();
        parts
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(&parts_with(Some("Bearer abc123"))), Some("abc123"));
        assert_eq!(bearer_token(&parts_with(Some("Basic abc123"))), None);
        assert_eq!(bearer_token(&parts_with(Some("Bearer "))), None);
        assert_eq!(bearer_token(&parts_with(None)), None);
    }
}
