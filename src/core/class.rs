//! Class business logic - Sections, schedules and teacher assignment.

use crate::{
    core::activity::{self, Actor, ActivityRecord},
    entities::{
        Class, Schedule, ScheduleSlot,
        activity::{ActivityEntity, ActivityType},
        class::{self, ClassStatus},
    },
    errors::{Error, Result},
};
use chrono::{Datelike, NaiveDate, Utc};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

/// Data needed to create a class.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewClass {
    /// Display name
    pub class_name: String,
    /// Subject taught
    pub subject_id: String,
    /// Grade level the class is for
    pub grade_level_id: String,
    /// Section label
    #[serde(default)]
    pub section: String,
    /// Assigned teacher
    #[serde(default)]
    pub teacher_id: Option<String>,
    /// Weekly meetings
    #[serde(default)]
    pub schedule: Vec<ScheduleSlot>,
    /// Capacity, must be positive
    pub max_students: i32,
    /// Defaults to the current academic year
    #[serde(default)]
    pub academic_year: Option<String>,
    /// Semester label
    #[serde(default)]
    pub semester: String,
}

/// Partial update of a class.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassUpdate {
    pub class_name: Option<String>,
    pub subject_id: Option<String>,
    pub grade_level_id: Option<String>,
    pub section: Option<String>,
    pub schedule: Option<Vec<ScheduleSlot>>,
    pub max_students: Option<i32>,
    pub academic_year: Option<String>,
    pub semester: Option<String>,
    pub status: Option<ClassStatus>,
}

/// Academic year containing `today`. Years start in August.
///
/// ```
/// use chrono::NaiveDate;
/// use school_manager::core::class::current_academic_year;
///
/// let sept = NaiveDate::from_ymd_opt(2024, 9, 1).unwrap();
/// assert_eq!(current_academic_year(sept), "2024-2025");
/// ```
#[must_use]
pub fn current_academic_year(today: NaiveDate) -> String {
    let year = today.year();
    if today.month() >= 8 {
        format!("{}-{}", year, year + 1)
    } else {
        format!("{}-{}", year - 1, year)
    }
}

fn validate_capacity(max_students: i32) -> Result<()> {
    if max_students <= 0 {
        return Err(Error::invalid("La capacidad de la clase debe ser mayor que cero"));
    }
    Ok(())
}

/// All classes of a tenant by name.
pub async fn list_classes<C>(db: &C, tenant_id: &str) -> Result<Vec<class::Model>>
where
    C: ConnectionTrait,
{
    Class::find()
        .filter(class::Column::TenantId.eq(tenant_id))
        .order_by_asc(class::Column::ClassName)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Classes with the given status.
pub async fn classes_by_status<C>(db: &C, tenant_id: &str, status: ClassStatus) -> Result<Vec<class::Model>>
where
    C: ConnectionTrait,
{
    Class::find()
        .filter(class::Column::TenantId.eq(tenant_id))
        .filter(class::Column::Status.eq(status))
        .order_by_asc(class::Column::ClassName)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Classes for a grade level.
pub async fn classes_by_grade_level<C>(db: &C, tenant_id: &str, grade_level_id: &str) -> Result<Vec<class::Model>>
where
    C: ConnectionTrait,
{
    Class::find()
        .filter(class::Column::TenantId.eq(tenant_id))
        .filter(class::Column::GradeLevelId.eq(grade_level_id))
        .order_by_asc(class::Column::ClassName)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Classes of a subject.
pub async fn classes_by_subject<C>(db: &C, tenant_id: &str, subject_id: &str) -> Result<Vec<class::Model>>
where
    C: ConnectionTrait,
{
    Class::find()
        .filter(class::Column::TenantId.eq(tenant_id))
        .filter(class::Column::SubjectId.eq(subject_id))
        .order_by_asc(class::Column::ClassName)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Classes taught by a teacher.
pub async fn classes_by_teacher<C>(db: &C, tenant_id: &str, teacher_id: &str) -> Result<Vec<class::Model>>
where
    C: ConnectionTrait,
{
    Class::find()
        .filter(class::Column::TenantId.eq(tenant_id))
        .filter(class::Column::TeacherId.eq(teacher_id))
        .order_by_asc(class::Column::ClassName)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a class of the tenant by id.
pub async fn get_class<C>(db: &C, tenant_id: &str, class_id: &str) -> Result<Option<class::Model>>
where
    C: ConnectionTrait,
{
    Class::find_by_id(class_id)
        .filter(class::Column::TenantId.eq(tenant_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Like [`get_class`] but a missing class is an error.
pub async fn require_class<C>(db: &C, tenant_id: &str, class_id: &str) -> Result<class::Model>
where
    C: ConnectionTrait,
{
    get_class(db, tenant_id, class_id)
        .await?
        .ok_or_else(|| Error::not_found("Clase no encontrada"))
}

/// Creates an active class.
pub async fn create_class<C>(db: &C, actor: &Actor, data: NewClass) -> Result<class::Model>
where
    C: ConnectionTrait,
{
    let class_name = data.class_name.trim().to_string();
    if class_name.is_empty() {
        return Err(Error::invalid("El nombre de la clase es obligatorio"));
    }
    validate_capacity(data.max_students)?;

    let now = Utc::now();
    let academic_year = data
        .academic_year
        .filter(|y| !y.trim().is_empty())
        .unwrap_or_else(|| current_academic_year(now.date_naive()));

    let class = class::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        tenant_id: Set(actor.tenant_id.clone()),
        class_name: Set(class_name),
        subject_id: Set(data.subject_id),
        grade_level_id: Set(data.grade_level_id),
        section: Set(data.section),
        teacher_id: Set(data.teacher_id.filter(|t| !t.is_empty())),
        schedule: Set(Schedule(data.schedule)),
        max_students: Set(data.max_students),
        academic_year: Set(academic_year),
        semester: Set(data.semester),
        status: Set(ClassStatus::Active),
        created_at: Set(now),
    }
    .insert(db)
    .await?;

    activity::log_create(
        db,
        actor,
        ActivityEntity::Class,
        &class.id,
        &class.class_name,
        json!({ "gradeLevelId": class.grade_level_id, "subjectId": class.subject_id }),
    )
    .await;
    Ok(class)
}

/// Applies a partial update.
pub async fn update_class<C>(db: &C, actor: &Actor, class_id: &str, changes: ClassUpdate) -> Result<class::Model>
where
    C: ConnectionTrait,
{
    let existing = require_class(db, &actor.tenant_id, class_id).await?;
    let mut active: class::ActiveModel = existing.into();

    if let Some(name) = changes.class_name {
        if name.trim().is_empty() {
            return Err(Error::invalid("El nombre de la clase es obligatorio"));
        }
        active.class_name = Set(name.trim().to_string());
    }
    if let Some(v) = changes.subject_id {
        active.subject_id = Set(v);
    }
    if let Some(v) = changes.grade_level_id {
        active.grade_level_id = Set(v);
    }
    if let Some(v) = changes.section {
        active.section = Set(v);
    }
    if let Some(v) = changes.schedule {
        active.schedule = Set(Schedule(v));
    }
    if let Some(v) = changes.max_students {
        validate_capacity(v)?;
        active.max_students = Set(v);
    }
    if let Some(v) = changes.academic_year {
        active.academic_year = Set(v);
    }
    if let Some(v) = changes.semester {
        active.semester = Set(v);
    }
    if let Some(v) = changes.status {
        active.status = Set(v);
    }

    let class = active.update(db).await?;
    activity::log_update(db, actor, ActivityEntity::Class, &class.id, &class.class_name, Value::Null).await;
    Ok(class)
}

/// Changes the lifecycle state of a class.
pub async fn update_class_status<C>(db: &C, actor: &Actor, class_id: &str, status: ClassStatus) -> Result<class::Model>
where
    C: ConnectionTrait,
{
    let existing = require_class(db, &actor.tenant_id, class_id).await?;
    let mut active: class::ActiveModel = existing.into();
    active.status = Set(status);
    let class = active.update(db).await?;

    let new_status = if status == ClassStatus::Active { "active" } else { "inactive" };
    activity::log_status_change(
        db,
        actor,
        ActivityEntity::Class,
        &class.id,
        &class.class_name,
        new_status,
        json!({ "classStatus": status }),
    )
    .await;
    Ok(class)
}

/// Assigns (or with `None`, unassigns) the teacher of a class.
pub async fn assign_teacher<C>(db: &C, actor: &Actor, class_id: &str, teacher_id: Option<String>) -> Result<class::Model>
where
    C: ConnectionTrait,
{
    let existing = require_class(db, &actor.tenant_id, class_id).await?;
    if let Some(teacher_id) = teacher_id.as_deref() {
        crate::core::teacher::get_teacher(db, &actor.tenant_id, teacher_id)
            .await?
            .ok_or_else(|| Error::not_found("Profesor no encontrado"))?;
    }

    let mut active: class::ActiveModel = existing.into();
    active.teacher_id = Set(teacher_id.clone());
    let class = active.update(db).await?;

    let description = if teacher_id.is_some() {
        format!("Asignó profesor a la clase \"{}\"", class.class_name)
    } else {
        format!("Quitó el profesor de la clase \"{}\"", class.class_name)
    };
    let record = ActivityRecord {
        kind: ActivityType::Assignment,
        entity: ActivityEntity::Class,
        entity_id: class.id.clone(),
        entity_name: class.class_name.clone(),
        description,
        metadata: json!({ "teacherId": teacher_id }),
    };
    activity::log_activity(db, actor, record).await;
    Ok(class)
}

/// Removes a class.
pub async fn delete_class<C>(db: &C, actor: &Actor, class_id: &str) -> Result<()>
where
    C: ConnectionTrait,
{
    let existing = require_class(db, &actor.tenant_id, class_id).await?;
    Class::delete_by_id(existing.id.as_str()).exec(db).await?;
    activity::log_delete(db, actor, ActivityEntity::Class, &existing.id, &existing.class_name, Value::Null).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{entities::Weekday, test_utils::*};

    #[test]
    fn test_current_academic_year() {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
        assert_eq!(current_academic_year(d(2024, 8, 1)), "2024-2025");
        assert_eq!(current_academic_year(d(2024, 12, 31)), "2024-2025");
        assert_eq!(current_academic_year(d(2025, 1, 15)), "2024-2025");
        assert_eq!(current_academic_year(d(2025, 7, 31)), "2024-2025");
    }

    #[tokio::test]
    async fn test_create_validates_and_defaults() -> Result<()> {
        let db = setup_test_db().await?;
        let actor = test_actor("tenant-1");

        let mut data = new_class("Matemáticas 1A", "gl-1", 30);
        data.max_students = 0;
        assert!(matches!(create_class(&db, &actor, data).await, Err(Error::InvalidArgument { .. })));

        let mut data = new_class("Matemáticas 1A", "gl-1", 30);
        data.academic_year = None;
        data.schedule = vec![ScheduleSlot {
            day: Weekday::Lunes,
            start_time: "08:00".to_string(),
            end_time: "09:00".to_string(),
            room: Some("A-1".to_string()),
        }];
        let class = create_class(&db, &actor, data).await?;
        assert_eq!(class.status, ClassStatus::Active);
        assert_eq!(class.academic_year, current_academic_year(Utc::now().date_naive()));
        assert_eq!(class.schedule.0.len(), 1);
        assert_eq!(class.schedule.0[0].day, Weekday::Lunes);

        let mut data = new_class("Historia 1A", "gl-1", 30);
        data.academic_year = Some("2023-2024".to_string());
        let class = create_class(&db, &actor, data).await?;
        assert_eq!(class.academic_year, "2023-2024");

        let mut data = new_class("Arte 1A", "gl-1", 30);
        data.academic_year = Some("  ".to_string());
        let class = create_class(&db, &actor, data).await?;
        assert_eq!(class.academic_year, current_academic_year(Utc::now().date_naive()));
        Ok(())
    }

    #[tokio::test]
    async fn test_listing_order_and_filters() -> Result<()> {
        let db = setup_test_db().await?;
        let actor = test_actor("tenant-1");
        create_test_class(&db, &actor, "Química", "gl-2", 25).await?;
        let bio = create_test_class(&db, &actor, "Biología", "gl-1", 25).await?;

        let names: Vec<String> = list_classes(&db, "tenant-1").await?.into_iter().map(|c| c.class_name).collect();
        assert_eq!(names, vec!["Biología", "Química"]);
        assert_eq!(classes_by_grade_level(&db, "tenant-1", "gl-1").await?.len(), 1);

        update_class_status(&db, &actor, &bio.id, ClassStatus::Completed).await?;
        assert_eq!(classes_by_status(&db, "tenant-1", ClassStatus::Active).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_assign_teacher() -> Result<()> {
        let db = setup_test_db().await?;
        let actor = test_actor("tenant-1");
        let class = create_test_class(&db, &actor, "Historia", "gl-1", 20).await?;
        let teacher = create_test_teacher(&db, "tenant-1", "Rosa").await?;
        let foreign = create_test_teacher(&db, "tenant-2", "Pedro").await?;

        let result = assign_teacher(&db, &actor, &class.id, Some(foreign.id)).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));

        let class = assign_teacher(&db, &actor, &class.id, Some(teacher.id.clone())).await?;
        assert_eq!(class.teacher_id.as_deref(), Some(teacher.id.as_str()));
        assert_eq!(classes_by_teacher(&db, "tenant-1", &teacher.id).await?.len(), 1);

        let log = activity::recent_activities(&db, "tenant-1", 1).await?;
        assert_eq!(log[0].kind, ActivityType::Assignment);
        Ok(())
    }
}
