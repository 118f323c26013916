//! Enrollment business logic - Putting students into classes.
//!
//! [`enroll_student`] checks its preconditions in a fixed order so the
//! caller always sees the first rule that fails:
//! both records exist, student active, class active, grade levels match,
//! not already enrolled, class not full.

use crate::{
    core::{
        activity::{self, Actor, ActivityRecord},
        class as classes, student as students,
    },
    entities::{
        ActiveStatus, Enrollment,
        activity::{ActivityEntity, ActivityType},
        class::ClassStatus,
        enrollment::{self, EnrollmentStatus},
    },
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{PaginatorTrait, QueryOrder, Set, prelude::*};
use serde_json::json;
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

async fn find_active_enrollment<C>(
    db: &C,
    tenant_id: &str,
    class_id: &str,
    student_id: &str,
) -> Result<Option<enrollment::Model>>
where
    C: ConnectionTrait,
{
    Enrollment::find()
        .filter(enrollment::Column::TenantId.eq(tenant_id))
        .filter(enrollment::Column::ClassId.eq(class_id))
        .filter(enrollment::Column::StudentId.eq(student_id))
        .filter(enrollment::Column::Status.eq(EnrollmentStatus::Enrolled))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Enrolls a student in a class after checking every precondition.
pub async fn enroll_student<C>(db: &C, actor: &Actor, class_id: &str, student_id: &str) -> Result<enrollment::Model>
where
    C: ConnectionTrait,
{
    let tenant_id = actor.tenant_id.as_str();
    let class = classes::get_class(db, tenant_id, class_id).await?;
    let student = students::get_student(db, tenant_id, student_id).await?;
    let (Some(class), Some(student)) = (class, student) else {
        return Err(Error::not_found("Clase o estudiante no encontrado"));
    };

    if student.status != ActiveStatus::Active {
        return Err(Error::precondition("El estudiante debe estar activo"));
    }
    if class.status != ClassStatus::Active {
        return Err(Error::precondition("La clase debe estar activa"));
    }
    if student.grade_level != class.grade_level_id {
        return Err(Error::precondition(
            "El nivel académico del estudiante no coincide con el de la clase",
        ));
    }
    if find_active_enrollment(db, tenant_id, class_id, student_id).await?.is_some() {
        return Err(Error::already_exists("El estudiante ya está inscrito en esta clase"));
    }
    let enrolled = enrollment_count(db, tenant_id, class_id).await?;
    if enrolled >= u64::try_from(class.max_students).unwrap_or(0) {
        return Err(Error::precondition("La clase ha alcanzado su capacidad máxima"));
    }

    let now = Utc::now();
    let enrollment = enrollment::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        tenant_id: Set(tenant_id.to_string()),
        class_id: Set(class.id.clone()),
        student_id: Set(student.id.clone()),
        enrolled_at: Set(now),
        status: Set(EnrollmentStatus::Enrolled),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;

    info!(class = %class.id, student = %student.id, "Student enrolled");

    let record = ActivityRecord {
        kind: ActivityType::Enrollment,
        entity: ActivityEntity::Enrollment,
        entity_id: enrollment.id.clone(),
        entity_name: format!("{} - {}", student.full_name, class.class_name),
        description: format!(
            "Inscribió al estudiante \"{}\" en la clase \"{}\"",
            student.full_name, class.class_name
        ),
        metadata: json!({ "studentId": student.id, "classId": class.id }),
    };
    activity::log_activity(db, actor, record).await;
    Ok(enrollment)
}

/// Removes an enrollment.
pub async fn unenroll<C>(db: &C, actor: &Actor, enrollment_id: &str) -> Result<()>
where
    C: ConnectionTrait,
{
    let existing = Enrollment::find_by_id(enrollment_id)
        .filter(enrollment::Column::TenantId.eq(actor.tenant_id.as_str()))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Inscripción no encontrada"))?;

    let student = students::get_student(db, &actor.tenant_id, &existing.student_id).await?;
    let class = classes::get_class(db, &actor.tenant_id, &existing.class_id).await?;

    Enrollment::delete_by_id(existing.id.as_str()).exec(db).await?;

    let student_name = student.map_or_else(|| existing.student_id.clone(), |s| s.full_name);
    let class_name = class.map_or_else(|| existing.class_id.clone(), |c| c.class_name);
    let record = ActivityRecord {
        kind: ActivityType::Delete,
        entity: ActivityEntity::Enrollment,
        entity_id: existing.id.clone(),
        entity_name: format!("{student_name} - {class_name}"),
        description: format!("Desinscribió al estudiante \"{student_name}\" de la clase \"{class_name}\""),
        metadata: json!({ "studentId": existing.student_id, "classId": existing.class_id }),
    };
    activity::log_activity(db, actor, record).await;
    Ok(())
}

/// Current enrollments of a class, newest first.
pub async fn class_enrollments<C>(db: &C, tenant_id: &str, class_id: &str) -> Result<Vec<enrollment::Model>>
where
    C: ConnectionTrait,
{
    Enrollment::find()
        .filter(enrollment::Column::TenantId.eq(tenant_id))
        .filter(enrollment::Column::ClassId.eq(class_id))
        .filter(enrollment::Column::Status.eq(EnrollmentStatus::Enrolled))
        .order_by_desc(enrollment::Column::EnrolledAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Current enrollments of a student, newest first.
pub async fn student_enrollments<C>(db: &C, tenant_id: &str, student_id: &str) -> Result<Vec<enrollment::Model>>
where
    C: ConnectionTrait,
{
    Enrollment::find()
        .filter(enrollment::Column::TenantId.eq(tenant_id))
        .filter(enrollment::Column::StudentId.eq(student_id))
        .filter(enrollment::Column::Status.eq(EnrollmentStatus::Enrolled))
        .order_by_desc(enrollment::Column::EnrolledAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Number of students currently enrolled in a class.
pub async fn enrollment_count<C>(db: &C, tenant_id: &str, class_id: &str) -> Result<u64>
where
    C: ConnectionTrait,
{
    Enrollment::find()
        .filter(enrollment::Column::TenantId.eq(tenant_id))
        .filter(enrollment::Column::ClassId.eq(class_id))
        .filter(enrollment::Column::Status.eq(EnrollmentStatus::Enrolled))
        .count(db)
        .await
        .map_err(Into::into)
}

/// Enrolled counts for several classes at once. Every requested id is present.
pub async fn enrollment_counts<C>(db: &C, tenant_id: &str, class_ids: &[String]) -> Result<HashMap<String, u64>>
where
    C: ConnectionTrait,
{
    let mut counts: HashMap<String, u64> = class_ids.iter().map(|id| (id.clone(), 0)).collect();
    if class_ids.is_empty() {
        return Ok(counts);
    }

    let rows = Enrollment::find()
        .filter(enrollment::Column::TenantId.eq(tenant_id))
        .filter(enrollment::Column::ClassId.is_in(class_ids.iter().cloned()))
        .filter(enrollment::Column::Status.eq(EnrollmentStatus::Enrolled))
        .all(db)
        .await?;
    for row in rows {
        *counts.entry(row.class_id).or_default() += 1;
    }
    Ok(counts)
}

/// Whether a class has no free seats. A missing class counts as full.
pub async fn is_class_full<C>(db: &C, tenant_id: &str, class_id: &str) -> Result<bool>
where
    C: ConnectionTrait,
{
    let Some(class) = classes::get_class(db, tenant_id, class_id).await? else {
        return Ok(true);
    };
    let count = enrollment_count(db, tenant_id, class_id).await?;
    Ok(count >= u64::try_from(class.max_students).unwrap_or(0))
}

/// Whether a student is currently enrolled in a class.
pub async fn is_student_enrolled<C>(db: &C, tenant_id: &str, class_id: &str, student_id: &str) -> Result<bool>
where
    C: ConnectionTrait,
{
    Ok(find_active_enrollment(db, tenant_id, class_id, student_id).await?.is_some())
}

/// Rounded percentage of seats taken; 0 for a missing class.
pub async fn capacity_percentage<C>(db: &C, tenant_id: &str, class_id: &str) -> Result<u32>
where
    C: ConnectionTrait,
{
    let Some(class) = classes::get_class(db, tenant_id, class_id).await? else {
        return Ok(0);
    };
    if class.max_students <= 0 {
        return Ok(0);
    }
    let count = enrollment_count(db, tenant_id, class_id).await?;
    Ok(percentage(count, u64::try_from(class.max_students).unwrap_or(1)))
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn percentage(count: u64, max: u64) -> u32 {
    ((count as f64 / max as f64) * 100.0).round() as u32
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        core::{class::update_class_status, student::update_student_status},
        test_utils::*,
    };

    #[tokio::test]
    async fn test_enroll_success_and_log() -> Result<()> {
        let db = setup_test_db().await?;
        let actor = test_actor("tenant-1");
        let class = create_test_class(&db, &actor, "Matemáticas", "gl-1", 2).await?;
        let ana = create_test_student(&db, &actor, "Ana", "gl-1").await?;

        let enrollment = enroll_student(&db, &actor, &class.id, &ana.id).await?;
        assert_eq!(enrollment.status, EnrollmentStatus::Enrolled);
        assert!(is_student_enrolled(&db, "tenant-1", &class.id, &ana.id).await?);
        assert_eq!(enrollment_count(&db, "tenant-1", &class.id).await?, 1);
        assert_eq!(capacity_percentage(&db, "tenant-1", &class.id).await?, 50);

        let log = activity::recent_activities(&db, "tenant-1", 1).await?;
        assert_eq!(log[0].kind, ActivityType::Enrollment);
        assert_eq!(log[0].description, "Inscribió al estudiante \"Ana\" en la clase \"Matemáticas\"");
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_records() -> Result<()> {
        let db = setup_test_db().await?;
        let actor = test_actor("tenant-1");
        let class = create_test_class(&db, &actor, "Matemáticas", "gl-1", 2).await?;

        let result = enroll_student(&db, &actor, &class.id, "ghost").await;
        assert!(matches!(result, Err(Error::NotFound { ref message }) if message == "Clase o estudiante no encontrado"));

        // A student of another tenant is invisible.
        let foreign = create_test_student(&db, &test_actor("tenant-2"), "Luis", "gl-1").await?;
        let result = enroll_student(&db, &actor, &class.id, &foreign.id).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_precondition_order() -> Result<()> {
        let db = setup_test_db().await?;
        let actor = test_actor("tenant-1");
        let class = create_test_class(&db, &actor, "Matemáticas", "gl-1", 1).await?;
        let ana = create_test_student(&db, &actor, "Ana", "gl-2").await?;

        // Inactive student and inactive class: the student rule fires first.
        update_student_status(&db, &actor, &ana.id, ActiveStatus::Inactive).await?;
        update_class_status(&db, &actor, &class.id, ClassStatus::Cancelled).await?;
        let err = enroll_student(&db, &actor, &class.id, &ana.id).await.unwrap_err();
        assert_eq!(err.to_string(), "El estudiante debe estar activo");

        update_student_status(&db, &actor, &ana.id, ActiveStatus::Active).await?;
        let err = enroll_student(&db, &actor, &class.id, &ana.id).await.unwrap_err();
        assert_eq!(err.to_string(), "La clase debe estar activa");

        update_class_status(&db, &actor, &class.id, ClassStatus::Active).await?;
        let err = enroll_student(&db, &actor, &class.id, &ana.id).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "El nivel académico del estudiante no coincide con el de la clase"
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_and_capacity() -> Result<()> {
        let db = setup_test_db().await?;
        let actor = test_actor("tenant-1");
        let class = create_test_class(&db, &actor, "Arte", "gl-1", 1).await?;
        let ana = create_test_student(&db, &actor, "Ana", "gl-1").await?;
        let luis = create_test_student(&db, &actor, "Luis", "gl-1").await?;

        enroll_student(&db, &actor, &class.id, &ana.id).await?;

        let err = enroll_student(&db, &actor, &class.id, &ana.id).await.unwrap_err();
        assert_eq!(err.to_string(), "El estudiante ya está inscrito en esta clase");

        let err = enroll_student(&db, &actor, &class.id, &luis.id).await.unwrap_err();
        assert_eq!(err.to_string(), "La clase ha alcanzado su capacidad máxima");
        assert!(is_class_full(&db, "tenant-1", &class.id).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_unenroll_and_counts() -> Result<()> {
        let db = setup_test_db().await?;
        let actor = test_actor("tenant-1");
        let math = create_test_class(&db, &actor, "Matemáticas", "gl-1", 10).await?;
        let art = create_test_class(&db, &actor, "Arte", "gl-1", 10).await?;
        let ana = create_test_student(&db, &actor, "Ana", "gl-1").await?;

        let enrollment = enroll_student(&db, &actor, &math.id, &ana.id).await?;
        enroll_student(&db, &actor, &art.id, &ana.id).await?;
        assert_eq!(student_enrollments(&db, "tenant-1", &ana.id).await?.len(), 2);

        unenroll(&db, &actor, &enrollment.id).await?;
        assert!(class_enrollments(&db, "tenant-1", &math.id).await?.is_empty());

        let counts = enrollment_counts(&db, "tenant-1", &[math.id.clone(), art.id.clone()]).await?;
        assert_eq!(counts[&math.id], 0);
        assert_eq!(counts[&art.id], 1);

        let log = activity::recent_activities(&db, "tenant-1", 10).await?;
        assert!(log.iter().any(|a| a.description == "Desinscribió al estudiante \"Ana\" de la clase \"Matemáticas\""));
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_class_is_full() -> Result<()> {
        let db = setup_test_db().await?;
        assert!(is_class_full(&db, "tenant-1", "nope").await?);
        assert_eq!(capacity_percentage(&db, "tenant-1", "nope").await?, 0);
        Ok(())
    }
}
