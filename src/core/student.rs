//! Student business logic - Roster management and the parent view of children.

use crate::{
    core::activity::{self, Actor},
    entities::{
        ActiveStatus, Student, activity::ActivityEntity, student,
    },
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

/// Data needed to register a student.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStudent {
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    pub grade_level: String,
    pub parent_name: String,
    pub parent_email: String,
    #[serde(default)]
    pub parent_phone: String,
    #[serde(default)]
    pub emergency_contact: String,
    #[serde(default)]
    pub emergency_phone: String,
    #[serde(default)]
    pub medical_notes: Option<String>,
}

/// Partial update of a student. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentUpdate {
    pub full_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub grade_level: Option<String>,
    pub parent_name: Option<String>,
    pub parent_email: Option<String>,
    pub parent_phone: Option<String>,
    pub emergency_contact: Option<String>,
    pub emergency_phone: Option<String>,
    pub medical_notes: Option<String>,
    pub status: Option<ActiveStatus>,
}

/// All students of a tenant, most recently enrolled first.
pub async fn list_students<C>(db: &C, tenant_id: &str) -> Result<Vec<student::Model>>
where
    C: ConnectionTrait,
{
    Student::find()
        .filter(student::Column::TenantId.eq(tenant_id))
        .order_by_desc(student::Column::EnrollmentDate)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Students of a tenant with the given status.
pub async fn students_by_status<C>(db: &C, tenant_id: &str, status: ActiveStatus) -> Result<Vec<student::Model>>
where
    C: ConnectionTrait,
{
    Student::find()
        .filter(student::Column::TenantId.eq(tenant_id))
        .filter(student::Column::Status.eq(status))
        .order_by_desc(student::Column::EnrollmentDate)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Students of a tenant in a grade level.
pub async fn students_by_grade_level<C>(db: &C, tenant_id: &str, grade_level: &str) -> Result<Vec<student::Model>>
where
    C: ConnectionTrait,
{
    Student::find()
        .filter(student::Column::TenantId.eq(tenant_id))
        .filter(student::Column::GradeLevel.eq(grade_level))
        .order_by_desc(student::Column::EnrollmentDate)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a student of the tenant by id.
pub async fn get_student<C>(db: &C, tenant_id: &str, student_id: &str) -> Result<Option<student::Model>>
where
    C: ConnectionTrait,
{
    Student::find_by_id(student_id)
        .filter(student::Column::TenantId.eq(tenant_id))
        .one(db)
        .await
        .map_err(Into::into)
}

async fn require_student<C>(db: &C, tenant_id: &str, student_id: &str) -> Result<student::Model>
where
    C: ConnectionTrait,
{
    get_student(db, tenant_id, student_id)
        .await?
        .ok_or_else(|| Error::not_found("Estudiante no encontrado"))
}

/// Registers a student in the actor's tenant. New students start active.
pub async fn create_student<C>(db: &C, actor: &Actor, data: NewStudent) -> Result<student::Model>
where
    C: ConnectionTrait,
{
    let full_name = data.full_name.trim().to_string();
    if full_name.is_empty() {
        return Err(Error::invalid("El nombre del estudiante es obligatorio"));
    }
    if data.grade_level.trim().is_empty() {
        return Err(Error::invalid("El nivel académico es obligatorio"));
    }

    let student = student::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        tenant_id: Set(actor.tenant_id.clone()),
        full_name: Set(full_name),
        date_of_birth: Set(data.date_of_birth),
        email: Set(data.email.trim().to_lowercase()),
        phone: Set(data.phone.trim().to_string()),
        address: Set(data.address.trim().to_string()),
        grade_level: Set(data.grade_level),
        parent_name: Set(data.parent_name.trim().to_string()),
        parent_email: Set(data.parent_email.trim().to_lowercase()),
        parent_phone: Set(data.parent_phone.trim().to_string()),
        enrollment_date: Set(Utc::now()),
        status: Set(ActiveStatus::Active),
        emergency_contact: Set(data.emergency_contact.trim().to_string()),
        emergency_phone: Set(data.emergency_phone.trim().to_string()),
        medical_notes: Set(data.medical_notes),
    }
    .insert(db)
    .await?;

    activity::log_create(
        db,
        actor,
        ActivityEntity::Student,
        &student.id,
        &student.full_name,
        json!({ "gradeLevel": student.grade_level }),
    )
    .await;
    Ok(student)
}

/// Applies a partial update. Id, tenant and enrollment date never change.
pub async fn update_student<C>(db: &C, actor: &Actor, student_id: &str, changes: StudentUpdate) -> Result<student::Model>
where
    C: ConnectionTrait,
{
    let existing = require_student(db, &actor.tenant_id, student_id).await?;
    let mut active: student::ActiveModel = existing.into();

    if let Some(name) = changes.full_name {
        if name.trim().is_empty() {
            return Err(Error::invalid("El nombre del estudiante es obligatorio"));
        }
        active.full_name = Set(name.trim().to_string());
    }
    if let Some(v) = changes.date_of_birth {
        active.date_of_birth = Set(v);
    }
    if let Some(v) = changes.email {
        active.email = Set(v.trim().to_lowercase());
    }
    if let Some(v) = changes.phone {
        active.phone = Set(v);
    }
    if let Some(v) = changes.address {
        active.address = Set(v);
    }
    if let Some(v) = changes.grade_level {
        active.grade_level = Set(v);
    }
    if let Some(v) = changes.parent_name {
        active.parent_name = Set(v);
    }
    if let Some(v) = changes.parent_email {
        active.parent_email = Set(v.trim().to_lowercase());
    }
    if let Some(v) = changes.parent_phone {
        active.parent_phone = Set(v);
    }
    if let Some(v) = changes.emergency_contact {
        active.emergency_contact = Set(v);
    }
    if let Some(v) = changes.emergency_phone {
        active.emergency_phone = Set(v);
    }
    if let Some(v) = changes.medical_notes {
        active.medical_notes = Set(Some(v).filter(|n| !n.trim().is_empty()));
    }
    if let Some(v) = changes.status {
        active.status = Set(v);
    }

    let student = active.update(db).await?;
    activity::log_update(db, actor, ActivityEntity::Student, &student.id, &student.full_name, Value::Null).await;
    Ok(student)
}

/// Activates or deactivates a student.
pub async fn update_student_status<C>(db: &C, actor: &Actor, student_id: &str, status: ActiveStatus) -> Result<student::Model>
where
    C: ConnectionTrait,
{
    let existing = require_student(db, &actor.tenant_id, student_id).await?;
    let mut active: student::ActiveModel = existing.into();
    active.status = Set(status);
    let student = active.update(db).await?;

    let new_status = if status == ActiveStatus::Active { "active" } else { "inactive" };
    activity::log_status_change(
        db,
        actor,
        ActivityEntity::Student,
        &student.id,
        &student.full_name,
        new_status,
        Value::Null,
    )
    .await;
    Ok(student)
}

/// Removes a student.
pub async fn delete_student<C>(db: &C, actor: &Actor, student_id: &str) -> Result<()>
where
    C: ConnectionTrait,
{
    let existing = require_student(db, &actor.tenant_id, student_id).await?;
    Student::delete_by_id(existing.id.as_str()).exec(db).await?;
    activity::log_delete(db, actor, ActivityEntity::Student, &existing.id, &existing.full_name, Value::Null).await;
    Ok(())
}

/// Active students whose parent email matches, across all tenants.
pub async fn children_for_parent<C>(db: &C, parent_email: &str) -> Result<Vec<student::Model>>
where
    C: ConnectionTrait,
{
    Student::find()
        .filter(student::Column::ParentEmail.eq(parent_email.trim().to_lowercase()))
        .filter(student::Column::Status.eq(ActiveStatus::Active))
        .order_by_asc(student::Column::FullName)
        .all(db)
        .await
        .map_err(Into::into)
}

/// One child of a parent; anyone else's student is reported as not found.
pub async fn child_for_parent<C>(db: &C, parent_email: &str, student_id: &str) -> Result<student::Model>
where
    C: ConnectionTrait,
{
    let student = Student::find_by_id(student_id)
        .one(db)
        .await?
        .filter(|s| s.parent_email == parent_email.trim().to_lowercase())
        .ok_or_else(|| Error::not_found("Estudiante no encontrado"))?;
    Ok(student)
}
