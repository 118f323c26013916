//! Teacher business logic - Staff records of a school.
//!
//! Teacher records are not audited here; account creation for a teacher is
//! audited by [`crate::core::accounts`].

use crate::{
    entities::{ActiveStatus, StringList, Teacher, teacher},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Deserialize;
use uuid::Uuid;

/// Data needed to add a teacher.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTeacher {
    /// Display name
    pub full_name: String,
    /// Contact email
    pub email: String,
    /// Contact phone
    #[serde(default)]
    pub phone_number: String,
    /// Subjects the teacher can teach
    #[serde(default)]
    pub subjects: Vec<String>,
}

/// Partial update of a teacher.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherUpdate {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub subjects: Option<Vec<String>>,
    pub status: Option<ActiveStatus>,
}

/// All teachers of a tenant, alphabetically.
pub async fn list_teachers<C>(db: &C, tenant_id: &str) -> Result<Vec<teacher::Model>>
where
    C: ConnectionTrait,
{
    Teacher::find()
        .filter(teacher::Column::TenantId.eq(tenant_id))
        .order_by_asc(teacher::Column::FullName)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Active teachers of a tenant, alphabetically.
pub async fn active_teachers<C>(db: &C, tenant_id: &str) -> Result<Vec<teacher::Model>>
where
    C: ConnectionTrait,
{
    Teacher::find()
        .filter(teacher::Column::TenantId.eq(tenant_id))
        .filter(teacher::Column::Status.eq(ActiveStatus::Active))
        .order_by_asc(teacher::Column::FullName)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a teacher of the tenant by id.
pub async fn get_teacher<C>(db: &C, tenant_id: &str, teacher_id: &str) -> Result<Option<teacher::Model>>
where
    C: ConnectionTrait,
{
    Teacher::find_by_id(teacher_id)
        .filter(teacher::Column::TenantId.eq(tenant_id))
        .one(db)
        .await
        .map_err(Into::into)
}

async fn require_teacher<C>(db: &C, tenant_id: &str, teacher_id: &str) -> Result<teacher::Model>
where
    C: ConnectionTrait,
{
    get_teacher(db, tenant_id, teacher_id)
        .await?
        .ok_or_else(|| Error::not_found("Profesor no encontrado"))
}

/// Finds a teacher by id regardless of tenant. Callers check ownership.
pub async fn get_teacher_any_tenant<C>(db: &C, teacher_id: &str) -> Result<Option<teacher::Model>>
where
    C: ConnectionTrait,
{
    Teacher::find_by_id(teacher_id).one(db).await.map_err(Into::into)
}

/// The teacher record linked to a login account.
pub async fn teacher_for_user<C>(db: &C, user_id: &str) -> Result<Option<teacher::Model>>
where
    C: ConnectionTrait,
{
    Teacher::find()
        .filter(teacher::Column::UserId.eq(user_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Adds a teacher to a tenant. New teachers start active and without an account.
pub async fn create_teacher<C>(db: &C, tenant_id: &str, data: NewTeacher) -> Result<teacher::Model>
where
    C: ConnectionTrait,
{
    let full_name = data.full_name.trim().to_string();
    if full_name.is_empty() {
        return Err(Error::invalid("El nombre del profesor es obligatorio"));
    }

    teacher::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        tenant_id: Set(tenant_id.to_string()),
        full_name: Set(full_name),
        email: Set(data.email.trim().to_lowercase()),
        phone_number: Set(data.phone_number.trim().to_string()),
        subjects: Set(StringList(data.subjects)),
        status: Set(ActiveStatus::Active),
        user_id: Set(None),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Applies a partial update to a teacher.
pub async fn update_teacher<C>(db: &C, tenant_id: &str, teacher_id: &str, changes: TeacherUpdate) -> Result<teacher::Model>
where
    C: ConnectionTrait,
{
    let existing = require_teacher(db, tenant_id, teacher_id).await?;
    let mut active: teacher::ActiveModel = existing.into();

    if let Some(name) = changes.full_name {
        if name.trim().is_empty() {
            return Err(Error::invalid("El nombre del profesor es obligatorio"));
        }
        active.full_name = Set(name.trim().to_string());
    }
    if let Some(email) = changes.email {
        active.email = Set(email.trim().to_lowercase());
    }
    if let Some(phone) = changes.phone_number {
        active.phone_number = Set(phone);
    }
    if let Some(subjects) = changes.subjects {
        active.subjects = Set(StringList(subjects));
    }
    if let Some(status) = changes.status {
        active.status = Set(status);
    }

    active.update(db).await.map_err(Into::into)
}

/// Activates or deactivates a teacher.
pub async fn update_teacher_status<C>(db: &C, tenant_id: &str, teacher_id: &str, status: ActiveStatus) -> Result<teacher::Model>
where
    C: ConnectionTrait,
{
    update_teacher(
        db,
        tenant_id,
        teacher_id,
        TeacherUpdate {
            status: Some(status),
            ..Default::default()
        },
    )
    .await
}

/// Links a teacher record to a login account.
pub async fn link_user<C>(db: &C, teacher: teacher::Model, user_id: &str) -> Result<teacher::Model>
where
    C: ConnectionTrait,
{
    let mut active: teacher::ActiveModel = teacher.into();
    active.user_id = Set(Some(user_id.to_string()));
    active.update(db).await.map_err(Into::into)
}

/// Removes a teacher.
pub async fn delete_teacher<C>(db: &C, tenant_id: &str, teacher_id: &str) -> Result<()>
where
    C: ConnectionTrait,
{
    let existing = require_teacher(db, tenant_id, teacher_id).await?;
    Teacher::delete_by_id(existing.id).exec(db).await?;
    Ok(())
}
