//! Teacher account management - The two privileged operations an admin runs
//! on behalf of their staff.
//!
//! Both operations check the caller themselves instead of trusting the HTTP
//! layer, and both report failures with the callable error codes.

use crate::{
    core::{
        activity::{self, ActivityRecord},
        auth::{self, AuthPolicy},
        teacher,
    },
    entities::{
        activity::{ActivityEntity, ActivityType},
        user::{self, Role},
    },
    errors::{Error, Result},
};
use argon2::password_hash::rand_core::{OsRng, RngCore};
use chrono::Utc;
use sea_orm::{Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

const UPPERCASE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWERCASE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const DIGITS: &[u8] = b"0123456789";
const SYMBOLS: &[u8] = b"!@#$%&*-_=+";

/// Length of generated passwords.
pub const GENERATED_PASSWORD_LENGTH: usize = 12;

/// Input of [`create_teacher_account`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeacherAccount {
    pub email: String,
    pub password: String,
    pub teacher_id: String,
    pub teacher_name: String,
    pub tenant_id: String,
}

/// Input of [`reset_teacher_password`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetTeacherPassword {
    pub teacher_user_id: String,
    pub teacher_id: String,
    pub new_password: String,
}

/// Success payload of both operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// Maps a failed credential write to an `internal` error with a readable message.
fn friendly(err: Error, fallback: &str) -> Error {
    match err {
        Error::Credential(credential) => Error::internal(credential.to_string()),
        _ => Error::internal(fallback),
    }
}

fn require_admin(caller: Option<&user::Model>, message: &str) -> Result<user::Model> {
    let caller = caller.ok_or(Error::Unauthenticated)?;
    if caller.role != Role::Admin {
        return Err(Error::permission_denied(message));
    }
    Ok(caller.clone())
}

/// Creates a login for an existing teacher record of the caller's school.
///
/// The credential, the teacher's profile and the link from the teacher record
/// are written in one transaction.
pub async fn create_teacher_account<C>(
    db: &C,
    policy: &AuthPolicy,
    caller: Option<&user::Model>,
    data: CreateTeacherAccount,
) -> Result<AccountResponse>
where
    C: ConnectionTrait + TransactionTrait,
{
    let caller = caller.ok_or(Error::Unauthenticated)?;
    if caller.id != data.tenant_id {
        return Err(Error::permission_denied("No tienes permisos para crear esta cuenta"));
    }
    let profile = auth::get_profile(db, &caller.id).await?;
    let admin = require_admin(profile.as_ref(), "Solo administradores pueden crear cuentas de profesores")?;

    let record = teacher::get_teacher_any_tenant(db, &data.teacher_id)
        .await?
        .ok_or_else(|| Error::not_found("Profesor no encontrado"))?;
    if record.tenant_id != data.tenant_id {
        return Err(Error::permission_denied("Este profesor no pertenece a tu escuela"));
    }

    let user_id = Uuid::new_v4().to_string();
    let result: Result<()> = async {
        let txn = db.begin().await?;
        auth::create_credential(&txn, &user_id, &data.email, &data.password, policy).await?;
        user::ActiveModel {
            id: Set(user_id.clone()),
            full_name: Set(data.teacher_name.trim().to_string()),
            email: Set(auth::normalize_email(&data.email)),
            phone_number: Set(String::new()),
            role: Set(Role::Teacher),
            tenant_id: Set(Some(data.tenant_id.clone())),
            photo_url: Set(None),
            created_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await?;
        teacher::link_user(&txn, record, &user_id).await?;
        txn.commit().await?;
        Ok::<(), Error>(())
    }
    .await;

    if let Err(e) = result {
        error!(teacher_id = %data.teacher_id, "Error creating teacher account: {}", e);
        return Err(friendly(e, "Error al crear la cuenta"));
    }

    let actor = auth::actor_for(&admin, &data.tenant_id);
    let entry = ActivityRecord {
        kind: ActivityType::Create,
        entity: ActivityEntity::User,
        entity_id: user_id.clone(),
        entity_name: data.teacher_name.clone(),
        description: format!("Creó cuenta de acceso para el profesor \"{}\"", data.teacher_name),
        metadata: json!({ "role": "teacher", "teacherId": data.teacher_id }),
    };
    activity::log_activity(db, &actor, entry).await;

    info!(teacher_id = %data.teacher_id, user_id = %user_id, "Teacher account created");
    Ok(AccountResponse {
        success: true,
        user_id: Some(user_id),
    })
}

/// Sets a new password on a teacher's login.
pub async fn reset_teacher_password<C>(
    db: &C,
    policy: &AuthPolicy,
    caller: Option<&user::Model>,
    data: ResetTeacherPassword,
) -> Result<AccountResponse>
where
    C: ConnectionTrait,
{
    let caller = caller.ok_or(Error::Unauthenticated)?;
    let profile = auth::get_profile(db, &caller.id).await?;
    let admin = require_admin(profile.as_ref(), "Solo administradores pueden restablecer contraseñas")?;

    let record = teacher::get_teacher_any_tenant(db, &data.teacher_id)
        .await?
        .ok_or_else(|| Error::not_found("Profesor no encontrado"))?;
    if record.tenant_id != admin.id {
        return Err(Error::permission_denied("Este profesor no pertenece a tu escuela"));
    }
    if record.user_id.as_deref() != Some(data.teacher_user_id.as_str()) {
        return Err(Error::invalid("El ID de usuario no coincide con el profesor"));
    }

    if let Err(e) = auth::set_password(db, &data.teacher_user_id, &data.new_password, policy).await {
        error!(teacher_id = %data.teacher_id, "Error resetting teacher password: {}", e);
        return Err(friendly(e, "Error al restablecer la contraseña"));
    }

    let actor = auth::actor_for(&admin, &admin.id);
    let entry = ActivityRecord {
        kind: ActivityType::Update,
        entity: ActivityEntity::User,
        entity_id: data.teacher_user_id.clone(),
        entity_name: record.full_name.clone(),
        description: format!("Restableció la contraseña del profesor \"{}\"", record.full_name),
        metadata: json!({ "role": "teacher", "teacherId": data.teacher_id, "action": "password_reset" }),
    };
    activity::log_activity(db, &actor, entry).await;

    info!(teacher_id = %data.teacher_id, user_id = %data.teacher_user_id, "Teacher password reset");
    Ok(AccountResponse {
        success: true,
        user_id: None,
    })
}

fn pick(rng: &mut OsRng, charset: &[u8]) -> u8 {
    let index = rng.next_u32() as usize % charset.len();
    charset[index]
}

/// A random 12-character password with at least one uppercase letter, one
/// lowercase letter, one digit and one symbol.
#[must_use]
pub fn generate_random_password() -> String {
    let mut rng = OsRng;
    let all: Vec<u8> = [UPPERCASE, LOWERCASE, DIGITS, SYMBOLS].concat();

    let mut chars = vec![
        pick(&mut rng, UPPERCASE),
        pick(&mut rng, LOWERCASE),
        pick(&mut rng, DIGITS),
        pick(&mut rng, SYMBOLS),
    ];
    while chars.len() < GENERATED_PASSWORD_LENGTH {
        chars.push(pick(&mut rng, &all));
    }

    // Fisher-Yates
    for i in (1..chars.len()).rev() {
        let j = rng.next_u32() as usize % (i + 1);
        chars.swap(i, j);
    }

    chars.into_iter().map(char::from).collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{core::teacher::get_teacher, test_utils::*};

    fn request(teacher_id: &str, tenant_id: &str) -> CreateTeacherAccount {
        CreateTeacherAccount {
            email: "Profe@Escuela.edu".to_string(),
            password: "clave123".to_string(),
            teacher_id: teacher_id.to_string(),
            teacher_name: "Luis Gómez".to_string(),
            tenant_id: tenant_id.to_string(),
        }
    }

    #[test]
    fn test_generated_password_shape() {
        for _ in 0..50 {
            let password = generate_random_password();
            assert_eq!(password.chars().count(), GENERATED_PASSWORD_LENGTH);
            assert!(password.chars().any(|c| c.is_ascii_uppercase()));
            assert!(password.chars().any(|c| c.is_ascii_lowercase()));
            assert!(password.chars().any(|c| c.is_ascii_digit()));
            assert!(password.bytes().any(|b| SYMBOLS.contains(&b)));
        }
    }

    #[tokio::test]
    async fn test_create_teacher_account() -> Result<()> {
        let db = setup_test_db().await?;
        let policy = AuthPolicy::default();
        let admin = create_test_admin(&db, "admin@escuela.edu").await?;
        let record = create_test_teacher(&db, &admin.id, "Luis Gómez").await?;

        let response = create_teacher_account(&db, &policy, Some(&admin), request(&record.id, &admin.id)).await?;
        assert!(response.success);
        let user_id = response.user_id.unwrap();

        let linked = get_teacher(&db, &admin.id, &record.id).await?.unwrap();
        assert_eq!(linked.user_id.as_deref(), Some(user_id.as_str()));

        let profile = auth::get_profile(&db, &user_id).await?.unwrap();
        assert_eq!(profile.role, Role::Teacher);
        assert_eq!(profile.tenant_id.as_deref(), Some(admin.id.as_str()));
        assert_eq!(profile.email, "profe@escuela.edu");

        let session = auth::sign_in(&db, &policy, "profe@escuela.edu", "clave123").await?;
        assert_eq!(session.user.id, user_id);

        let log = activity::recent_activities(&db, &admin.id, 1).await?;
        assert_eq!(log[0].description, "Creó cuenta de acceso para el profesor \"Luis Gómez\"");
        assert_eq!(log[0].metadata["teacherId"], record.id.as_str());
        Ok(())
    }

    #[tokio::test]
    async fn test_create_account_checks_in_order() -> Result<()> {
        let db = setup_test_db().await?;
        let policy = AuthPolicy::default();
        let admin = create_test_admin(&db, "admin@escuela.edu").await?;
        let other_admin = create_test_admin(&db, "otro@escuela.edu").await?;
        let parent = create_test_parent(&db, "padre@correo.com").await?;
        let foreign = create_test_teacher(&db, &other_admin.id, "Ajeno").await?;

        let err = create_teacher_account(&db, &policy, None, request("t", &admin.id)).await.unwrap_err();
        assert_eq!(err.code(), "unauthenticated");

        let err = create_teacher_account(&db, &policy, Some(&admin), request("t", &other_admin.id))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "permission-denied");

        let err = create_teacher_account(&db, &policy, Some(&parent), request("t", &parent.id))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Solo administradores pueden crear cuentas de profesores");

        let err = create_teacher_account(&db, &policy, Some(&admin), request("missing", &admin.id))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "not-found");

        let err = create_teacher_account(&db, &policy, Some(&admin), request(&foreign.id, &admin.id))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Este profesor no pertenece a tu escuela");
        Ok(())
    }

    #[tokio::test]
    async fn test_create_account_write_failure_is_internal() -> Result<()> {
        let db = setup_test_db().await?;
        let policy = AuthPolicy::default();
        let admin = create_test_admin(&db, "admin@escuela.edu").await?;
        let record = create_test_teacher(&db, &admin.id, "Luis").await?;

        let mut taken = request(&record.id, &admin.id);
        taken.email = "admin@escuela.edu".to_string();
        let err = create_teacher_account(&db, &policy, Some(&admin), taken).await.unwrap_err();
        assert_eq!(err.code(), "internal");
        assert_eq!(err.to_string(), "Este correo ya está registrado");

        let mut short = request(&record.id, &admin.id);
        short.password = "123".to_string();
        let err = create_teacher_account(&db, &policy, Some(&admin), short).await.unwrap_err();
        assert_eq!(err.to_string(), "La contraseña debe tener al menos 6 caracteres");

        // Nothing was linked by the failed attempts.
        let unchanged = get_teacher(&db, &admin.id, &record.id).await?.unwrap();
        assert!(unchanged.user_id.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_reset_teacher_password() -> Result<()> {
        let db = setup_test_db().await?;
        let policy = AuthPolicy::default();
        let admin = create_test_admin(&db, "admin@escuela.edu").await?;
        let record = create_test_teacher(&db, &admin.id, "Luis Gómez").await?;
        let user_id = create_teacher_account(&db, &policy, Some(&admin), request(&record.id, &admin.id))
            .await?
            .user_id
            .unwrap();

        let mismatch = ResetTeacherPassword {
            teacher_user_id: "someone-else".to_string(),
            teacher_id: record.id.clone(),
            new_password: "nueva123".to_string(),
        };
        let err = reset_teacher_password(&db, &policy, Some(&admin), mismatch).await.unwrap_err();
        assert_eq!(err.code(), "invalid-argument");

        let reset = ResetTeacherPassword {
            teacher_user_id: user_id.clone(),
            teacher_id: record.id.clone(),
            new_password: "nueva123".to_string(),
        };
        let response = reset_teacher_password(&db, &policy, Some(&admin), reset).await?;
        assert!(response.success);
        assert!(response.user_id.is_none());

        assert!(auth::sign_in(&db, &policy, "profe@escuela.edu", "clave123").await.is_err());
        auth::sign_in(&db, &policy, "profe@escuela.edu", "nueva123").await?;

        let log = activity::recent_activities(&db, &admin.id, 1).await?;
        assert_eq!(log[0].metadata["action"], "password_reset");
        Ok(())
    }
}
