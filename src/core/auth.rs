//! Authentication - Credentials, sessions and user profiles.
//!
//! Passwords are stored as Argon2 PHC strings. A successful sign-in issues an
//! opaque bearer token backed by a row in `sessions`; [`authenticate`] resolves
//! the token back to the caller's profile.

use crate::{
    core::activity::{self, Actor, ActivityRecord},
    entities::{
        Credential, Session, User, credential,
        activity::{ActivityEntity, ActivityType},
        session,
        user::{self, Role},
    },
    errors::{CredentialError, Error, Result},
};
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

/// Password and session policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthPolicy {
    /// Minimum accepted password length
    pub min_password_length: usize,
    /// How long a session token stays valid
    pub session_ttl: Duration,
}

impl Default for AuthPolicy {
    fn default() -> Self {
        Self {
            min_password_length: 6,
            session_ttl: Duration::days(7),
        }
    }
}

impl From<&crate::config::settings::AuthSettings> for AuthPolicy {
    fn from(settings: &crate::config::settings::AuthSettings) -> Self {
        Self {
            min_password_length: settings.min_password_length,
            session_ttl: Duration::hours(settings.session_ttl_hours),
        }
    }
}

/// Self-service registration request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    /// Display name
    pub full_name: String,
    /// Login email
    pub email: String,
    /// Contact phone
    #[serde(default)]
    pub phone_number: String,
    /// Plain-text password
    pub password: String,
    /// `admin` or `parent`; teachers are created by their school
    pub role: Role,
}

/// A freshly issued session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    /// Bearer token
    pub token: String,
    /// When the token stops being accepted
    pub expires_at: DateTime<Utc>,
    /// Signed-in user's profile
    pub user: user::Model,
}

/// Normalises an email for storage and lookup.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic shape check: one `@`, a non-empty local part, a dotted domain, no spaces.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

fn validate_password(password: &str, policy: &AuthPolicy) -> Result<()> {
    if password.chars().count() < policy.min_password_length {
        return Err(CredentialError::InvalidPassword {
            min_length: policy.min_password_length,
        }
        .into());
    }
    Ok(())
}

/// Hashes a password with Argon2 and a random salt.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::internal(format!("No se pudo procesar la contraseña: {e}")))
}

/// Checks a password against a stored PHC string.
#[must_use]
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash)
        .and_then(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed))
        .is_ok()
}

/// Creates a login credential for `user_id`.
pub async fn create_credential<C>(
    db: &C,
    user_id: &str,
    email: &str,
    password: &str,
    policy: &AuthPolicy,
) -> Result<credential::Model>
where
    C: ConnectionTrait,
{
    let email = normalize_email(email);
    if !is_valid_email(&email) {
        return Err(CredentialError::InvalidEmail.into());
    }
    validate_password(password, policy)?;

    let existing = Credential::find()
        .filter(credential::Column::Email.eq(email.as_str()))
        .one(db)
        .await?;
    if existing.is_some() {
        return Err(CredentialError::EmailAlreadyExists.into());
    }

    let now = Utc::now();
    let record = credential::ActiveModel {
        user_id: Set(user_id.to_string()),
        email: Set(email),
        password_hash: Set(hash_password(password)?),
        created_at: Set(now),
        updated_at: Set(now),
    };
    record.insert(db).await.map_err(Into::into)
}

/// Replaces the password of an existing credential.
pub async fn set_password<C>(db: &C, user_id: &str, new_password: &str, policy: &AuthPolicy) -> Result<()>
where
    C: ConnectionTrait,
{
    validate_password(new_password, policy)?;

    let existing = Credential::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or(CredentialError::UserNotFound)?;

    let mut record: credential::ActiveModel = existing.into();
    record.password_hash = Set(hash_password(new_password)?);
    record.updated_at = Set(Utc::now());
    record.update(db).await?;
    Ok(())
}

/// Registers a new admin or parent account.
///
/// Input is trimmed and the email lowercased. Admins become the owners of a
/// new tenant whose id is their user id.
pub async fn sign_up(db: &DatabaseConnection, policy: &AuthPolicy, request: SignUpRequest) -> Result<user::Model> {
    if request.role == Role::Teacher {
        return Err(Error::permission_denied(
            "Las cuentas de profesores las crea el administrador de la escuela",
        ));
    }
    let full_name = request.full_name.trim().to_string();
    if full_name.is_empty() {
        return Err(Error::invalid("El nombre es obligatorio"));
    }

    let user_id = Uuid::new_v4().to_string();
    let email = normalize_email(&request.email);

    let txn = db.begin().await?;
    create_credential(&txn, &user_id, &email, &request.password, policy).await?;
    let profile = user::ActiveModel {
        id: Set(user_id.clone()),
        full_name: Set(full_name),
        email: Set(email),
        phone_number: Set(request.phone_number.trim().to_string()),
        role: Set(request.role),
        tenant_id: Set((request.role == Role::Admin).then(|| user_id.clone())),
        photo_url: Set(None),
        created_at: Set(Utc::now()),
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    info!(user_id = %profile.id, role = profile.role.as_str(), "User signed up");

    if profile.role == Role::Admin {
        let actor = Actor {
            user_id: profile.id.clone(),
            name: profile.full_name.clone(),
            email: profile.email.clone(),
            tenant_id: profile.id.clone(),
        };
        let record = ActivityRecord {
            kind: ActivityType::Create,
            entity: ActivityEntity::User,
            entity_id: profile.id.clone(),
            entity_name: profile.full_name.clone(),
            description: "Se registró como administrador de la escuela".to_string(),
            metadata: json!({ "role": "admin", "email": profile.email }),
        };
        activity::log_activity(db, &actor, record).await;
    }

    Ok(profile)
}

/// Verifies credentials and issues a session token.
pub async fn sign_in(db: &DatabaseConnection, policy: &AuthPolicy, email: &str, password: &str) -> Result<SessionInfo> {
    let email = normalize_email(email);
    let credential = Credential::find()
        .filter(credential::Column::Email.eq(email.as_str()))
        .one(db)
        .await?
        .ok_or(CredentialError::WrongPassword)?;

    if !verify_password(password, &credential.password_hash) {
        debug!("Rejected sign-in for {}", email);
        return Err(CredentialError::WrongPassword.into());
    }

    let user = User::find_by_id(credential.user_id.as_str())
        .one(db)
        .await?
        .ok_or(CredentialError::UserNotFound)?;

    let now = Utc::now();
    prune_expired_sessions(db, now).await?;
    let token = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
    let session = session::ActiveModel {
        token: Set(token),
        user_id: Set(user.id.clone()),
        created_at: Set(now),
        expires_at: Set(now + policy.session_ttl),
    }
    .insert(db)
    .await?;

    info!(user_id = %user.id, "User signed in");
    Ok(SessionInfo {
        token: session.token,
        expires_at: session.expires_at,
        user,
    })
}

/// Deletes every session that expired at or before `now`.
pub async fn prune_expired_sessions<C>(db: &C, now: DateTime<Utc>) -> Result<u64>
where
    C: ConnectionTrait,
{
    let result = Session::delete_many()
        .filter(session::Column::ExpiresAt.lte(now))
        .exec(db)
        .await?;
    if result.rows_affected > 0 {
        debug!(count = result.rows_affected, "Pruned expired sessions");
    }
    Ok(result.rows_affected)
}

/// Ends a session. Unknown tokens are ignored.
pub async fn sign_out<C>(db: &C, token: &str) -> Result<()>
where
    C: ConnectionTrait,
{
    Session::delete_by_id(token).exec(db).await?;
    Ok(())
}

/// Resolves a bearer token to the caller's profile.
///
/// Expired sessions are removed and reported as unauthenticated.
pub async fn authenticate<C>(db: &C, token: &str) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    let session = Session::find_by_id(token)
        .one(db)
        .await?
        .ok_or(Error::Unauthenticated)?;

    if session.expires_at <= Utc::now() {
        Session::delete_by_id(token).exec(db).await?;
        return Err(Error::Unauthenticated);
    }

    User::find_by_id(session.user_id.as_str())
        .one(db)
        .await?
        .ok_or(Error::Unauthenticated)
}

/// Gets a user's profile.
pub async fn get_profile<C>(db: &C, user_id: &str) -> Result<Option<user::Model>>
where
    C: ConnectionTrait,
{
    User::find_by_id(user_id).one(db).await.map_err(Into::into)
}

/// Role stored on the profile, or `None` ("unknown") when there is no profile.
pub async fn fetch_user_role<C>(db: &C, user_id: &str) -> Result<Option<Role>>
where
    C: ConnectionTrait,
{
    Ok(get_profile(db, user_id).await?.map(|u| u.role))
}

/// The tenant a staff member acts in: an admin's own id, or a teacher's school.
#[must_use]
pub fn staff_tenant(user: &user::Model) -> Option<String> {
    match user.role {
        Role::Admin => Some(user.id.clone()),
        Role::Teacher => user.tenant_id.clone(),
        Role::Parent => None,
    }
}

/// Builds the audit-log actor for a user acting in `tenant_id`.
#[must_use]
pub fn actor_for(user: &user::Model, tenant_id: &str) -> Actor {
    Actor {
        user_id: user.id.clone(),
        name: user.full_name.clone(),
        email: user.email.clone(),
        tenant_id: tenant_id.to_string(),
    }
}

/// Stores the storage path of a user's profile photo.
pub async fn set_photo_url<C>(db: &C, user_id: &str, path: &str) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    let profile = get_profile(db, user_id)
        .await?
        .ok_or_else(|| Error::not_found("Usuario no encontrado"))?;
    let mut active: user::ActiveModel = profile.into();
    active.photo_url = Set(Some(path.to_string()));
    active.update(db).await.map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    fn sign_up_request(email: &str, role: Role) -> SignUpRequest {
        SignUpRequest {
            full_name: "  María López ".to_string(),
            email: email.to_string(),
            phone_number: " 809-555-0101 ".to_string(),
            password: "secreto123".to_string(),
            role,
        }
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("ana@escuela.edu"));
        assert!(!is_valid_email("ana@escuela"));
        assert!(!is_valid_email("ana.escuela.edu"));
        assert!(!is_valid_email("ana@@escuela.edu"));
        assert!(!is_valid_email("@escuela.edu"));
        assert!(!is_valid_email("a na@escuela.edu"));
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("clave-segura").unwrap();
        assert!(verify_password("clave-segura", &hash));
        assert!(!verify_password("otra-clave", &hash));
        assert!(!verify_password("clave-segura", "not-a-phc-string"));
    }

    #[tokio::test]
    async fn test_sign_up_admin_normalises_and_owns_tenant() -> Result<()> {
        let db = setup_test_db().await?;
        let policy = AuthPolicy::default();

        let user = sign_up(&db, &policy, sign_up_request("  Maria@Escuela.EDU ", Role::Admin)).await?;
        assert_eq!(user.email, "maria@escuela.edu");
        assert_eq!(user.full_name, "María López");
        assert_eq!(user.phone_number, "809-555-0101");
        assert_eq!(user.tenant_id.as_deref(), Some(user.id.as_str()));
        assert_eq!(staff_tenant(&user), Some(user.id.clone()));

        let log = activity::recent_activities(&db, &user.id, 10).await?;
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].description, "Se registró como administrador de la escuela");
        Ok(())
    }

    #[tokio::test]
    async fn test_sign_up_parent_has_no_tenant() -> Result<()> {
        let db = setup_test_db().await?;
        let user = sign_up(&db, &AuthPolicy::default(), sign_up_request("papa@correo.com", Role::Parent)).await?;
        assert!(user.tenant_id.is_none());
        assert!(staff_tenant(&user).is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_sign_up_rejects_duplicates_and_bad_input() -> Result<()> {
        let db = setup_test_db().await?;
        let policy = AuthPolicy::default();
        sign_up(&db, &policy, sign_up_request("ana@escuela.edu", Role::Admin)).await?;

        let dup = sign_up(&db, &policy, sign_up_request("ANA@escuela.edu", Role::Parent)).await;
        assert!(matches!(dup, Err(Error::Credential(CredentialError::EmailAlreadyExists))));

        let bad_email = sign_up(&db, &policy, sign_up_request("no-es-correo", Role::Parent)).await;
        assert!(matches!(bad_email, Err(Error::Credential(CredentialError::InvalidEmail))));

        let mut short = sign_up_request("corto@escuela.edu", Role::Parent);
        short.password = "123".to_string();
        let result = sign_up(&db, &policy, short).await;
        assert!(matches!(
            result,
            Err(Error::Credential(CredentialError::InvalidPassword { min_length: 6 }))
        ));

        let teacher = sign_up(&db, &policy, sign_up_request("profe@escuela.edu", Role::Teacher)).await;
        assert!(matches!(teacher, Err(Error::PermissionDenied { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_sign_in_and_authenticate() -> Result<()> {
        let db = setup_test_db().await?;
        let policy = AuthPolicy::default();
        let user = sign_up(&db, &policy, sign_up_request("ana@escuela.edu", Role::Admin)).await?;

        let wrong = sign_in(&db, &policy, "ana@escuela.edu", "incorrecta").await;
        assert!(matches!(wrong, Err(Error::Credential(CredentialError::WrongPassword))));

        let session = sign_in(&db, &policy, " ANA@escuela.edu", "secreto123").await?;
        assert_eq!(session.user.id, user.id);

        let caller = authenticate(&db, &session.token).await?;
        assert_eq!(caller.id, user.id);

        sign_out(&db, &session.token).await?;
        let gone = authenticate(&db, &session.token).await;
        assert!(matches!(gone, Err(Error::Unauthenticated)));
        Ok(())
    }

    #[tokio::test]
    async fn test_expired_session_is_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let policy = AuthPolicy {
            session_ttl: Duration::seconds(-1),
            ..AuthPolicy::default()
        };
        sign_up(&db, &policy, sign_up_request("ana@escuela.edu", Role::Admin)).await?;
        let session = sign_in(&db, &policy, "ana@escuela.edu", "secreto123").await?;

        let result = authenticate(&db, &session.token).await;
        assert!(matches!(result, Err(Error::Unauthenticated)));
        assert!(Session::find_by_id(session.token.as_str()).one(&db).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_sign_in_prunes_expired_sessions() -> Result<()> {
        let db = setup_test_db().await?;
        let expired = AuthPolicy {
            session_ttl: Duration::seconds(-1),
            ..AuthPolicy::default()
        };
        sign_up(&db, &expired, sign_up_request("ana@escuela.edu", Role::Admin)).await?;
        let stale = sign_in(&db, &expired, "ana@escuela.edu", "secreto123").await?;
        let other = sign_in(&db, &expired, "ana@escuela.edu", "secreto123").await?;
        assert!(Session::find_by_id(stale.token.as_str()).one(&db).await?.is_none());

        let live = sign_in(&db, &AuthPolicy::default(), "ana@escuela.edu", "secreto123").await?;
        assert!(Session::find_by_id(other.token.as_str()).one(&db).await?.is_none());
        assert_eq!(Session::find().all(&db).await?.len(), 1);
        assert_eq!(authenticate(&db, &live.token).await?.email, "ana@escuela.edu");
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_user_role_unknown() -> Result<()> {
        let db = setup_test_db().await?;
        assert_eq!(fetch_user_role(&db, "nobody").await?, None);
        let user = sign_up(&db, &AuthPolicy::default(), sign_up_request("p@correo.com", Role::Parent)).await?;
        assert_eq!(fetch_user_role(&db, &user.id).await?, Some(Role::Parent));
        Ok(())
    }

    #[tokio::test]
    async fn test_set_password() -> Result<()> {
        let db = setup_test_db().await?;
        let policy = AuthPolicy::default();
        let user = sign_up(&db, &policy, sign_up_request("ana@escuela.edu", Role::Admin)).await?;

        set_password(&db, &user.id, "nueva-clave", &policy).await?;
        assert!(sign_in(&db, &policy, "ana@escuela.edu", "nueva-clave").await.is_ok());

        let missing = set_password(&db, "ghost", "nueva-clave", &policy).await;
        assert!(matches!(missing, Err(Error::Credential(CredentialError::UserNotFound))));
        Ok(())
    }
}
