//! Grade business logic - Publishing grades and computing averages.

use crate::{
    core::{
        activity::{self, Actor, ActivityRecord},
        enrollment,
    },
    entities::{
        Grade,
        activity::{ActivityEntity, ActivityType},
        grade::{self, GradeType},
    },
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashMap;
use uuid::Uuid;

/// Data needed to publish a grade.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGrade {
    pub class_id: String,
    pub student_id: String,
    pub grade_value: f64,
    pub grade_type: GradeType,
    pub grade_name: String,
    #[serde(default = "default_points")]
    pub max_points: f64,
    #[serde(default)]
    pub earned_points: f64,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub submitted_date: Option<NaiveDate>,
    #[serde(default)]
    pub comments: Option<String>,
}

const fn default_points() -> f64 {
    100.0
}

/// Partial update of a grade.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeUpdate {
    pub grade_value: Option<f64>,
    pub grade_type: Option<GradeType>,
    pub grade_name: Option<String>,
    pub max_points: Option<f64>,
    pub earned_points: Option<f64>,
    pub weight: Option<f64>,
    pub due_date: Option<NaiveDate>,
    pub submitted_date: Option<NaiveDate>,
    pub comments: Option<String>,
}

/// Per-student aggregate within a class.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentGradeSummary {
    pub student_id: String,
    pub student_name: String,
    pub grades: Vec<grade::Model>,
    pub average: f64,
    pub letter_grade: String,
}

/// Letter for a 0-100 score.
#[must_use]
pub fn grade_letter(value: f64) -> &'static str {
    if value >= 90.0 {
        "A"
    } else if value >= 80.0 {
        "B"
    } else if value >= 70.0 {
        "C"
    } else if value >= 60.0 {
        "D"
    } else {
        "F"
    }
}

fn validate_value(value: f64) -> Result<()> {
    if !(0.0..=100.0).contains(&value) {
        return Err(Error::invalid("La calificación debe estar entre 0 y 100"));
    }
    Ok(())
}

/// Weighted mean when any grade carries a positive weight, plain mean
/// otherwise, and 0 without grades.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn student_average(grades: &[grade::Model]) -> f64 {
    if grades.is_empty() {
        return 0.0;
    }
    let has_weights = grades.iter().any(|g| g.weight.is_some_and(|w| w > 0.0));
    if has_weights {
        let (sum, weights) = grades.iter().fold((0.0, 0.0), |(sum, weights), g| {
            let w = g.weight.unwrap_or(0.0);
            (g.grade_value.mul_add(w, sum), weights + w)
        });
        if weights > 0.0 {
            return sum / weights;
        }
    }
    grades.iter().map(|g| g.grade_value).sum::<f64>() / grades.len() as f64
}

/// Plain mean of every grade in a class.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn class_average(grades: &[grade::Model]) -> f64 {
    if grades.is_empty() {
        return 0.0;
    }
    grades.iter().map(|g| g.grade_value).sum::<f64>() / grades.len() as f64
}

/// Groups a class's grades by student, sorted by student name.
///
/// Students missing from `names` are reported as "Unknown".
#[must_use]
pub fn student_summaries(grades: Vec<grade::Model>, names: &HashMap<String, String>) -> Vec<StudentGradeSummary> {
    let mut by_student: HashMap<String, Vec<grade::Model>> = HashMap::new();
    for grade in grades {
        by_student.entry(grade.student_id.clone()).or_default().push(grade);
    }

    let mut summaries: Vec<StudentGradeSummary> = by_student
        .into_iter()
        .map(|(student_id, grades)| {
            let average = student_average(&grades);
            StudentGradeSummary {
                student_name: names.get(&student_id).cloned().unwrap_or_else(|| "Unknown".to_string()),
                student_id,
                grades,
                average,
                letter_grade: grade_letter(average).to_string(),
            }
        })
        .collect();
    summaries.sort_by(|a, b| a.student_name.cmp(&b.student_name));
    summaries
}

/// Grades of a class, newest first.
pub async fn grades_by_class<C>(db: &C, tenant_id: &str, class_id: &str) -> Result<Vec<grade::Model>>
where
    C: ConnectionTrait,
{
    Grade::find()
        .filter(grade::Column::TenantId.eq(tenant_id))
        .filter(grade::Column::ClassId.eq(class_id))
        .order_by_desc(grade::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Grades of one student, optionally restricted to one class, newest first.
pub async fn grades_by_student<C>(db: &C, tenant_id: &str, student_id: &str, class_id: Option<&str>) -> Result<Vec<grade::Model>>
where
    C: ConnectionTrait,
{
    let mut query = Grade::find()
        .filter(grade::Column::TenantId.eq(tenant_id))
        .filter(grade::Column::StudentId.eq(student_id));
    if let Some(class_id) = class_id {
        query = query.filter(grade::Column::ClassId.eq(class_id));
    }
    query
        .order_by_desc(grade::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Grades of one kind in a class.
pub async fn grades_by_type<C>(db: &C, tenant_id: &str, class_id: &str, grade_type: GradeType) -> Result<Vec<grade::Model>>
where
    C: ConnectionTrait,
{
    Grade::find()
        .filter(grade::Column::TenantId.eq(tenant_id))
        .filter(grade::Column::ClassId.eq(class_id))
        .filter(grade::Column::GradeType.eq(grade_type))
        .order_by_desc(grade::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a grade of the tenant, or `not-found`.
pub async fn require_grade<C>(db: &C, tenant_id: &str, grade_id: &str) -> Result<grade::Model>
where
    C: ConnectionTrait,
{
    Grade::find_by_id(grade_id)
        .filter(grade::Column::TenantId.eq(tenant_id))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Calificación no encontrada"))
}

/// Publishes a grade on behalf of `teacher_id`. The student must be enrolled
/// in the class.
pub async fn add_grade<C>(db: &C, actor: &Actor, teacher_id: &str, data: NewGrade) -> Result<grade::Model>
where
    C: ConnectionTrait,
{
    validate_value(data.grade_value)?;
    if data.grade_name.trim().is_empty() {
        return Err(Error::invalid("El nombre de la evaluación es obligatorio"));
    }
    if !enrollment::is_student_enrolled(db, &actor.tenant_id, &data.class_id, &data.student_id).await? {
        return Err(Error::invalid("El estudiante no está inscrito en esta clase"));
    }

    let now = Utc::now();
    let grade = grade::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        tenant_id: Set(actor.tenant_id.clone()),
        class_id: Set(data.class_id),
        student_id: Set(data.student_id),
        teacher_id: Set(teacher_id.to_string()),
        grade_value: Set(data.grade_value),
        grade_letter: Set(grade_letter(data.grade_value).to_string()),
        grade_type: Set(data.grade_type),
        grade_name: Set(data.grade_name.trim().to_string()),
        max_points: Set(data.max_points),
        earned_points: Set(data.earned_points),
        weight: Set(data.weight),
        due_date: Set(data.due_date),
        submitted_date: Set(data.submitted_date),
        comments: Set(data.comments),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;

    let record = ActivityRecord {
        kind: ActivityType::Create,
        entity: ActivityEntity::Grade,
        entity_id: grade.id.clone(),
        entity_name: grade.grade_name.clone(),
        description: format!("Publicó calificación \"{}\" ({}%)", grade.grade_name, grade.grade_value),
        metadata: json!({
            "studentId": grade.student_id,
            "classId": grade.class_id,
            "gradeType": grade.grade_type,
        }),
    };
    activity::log_activity(db, actor, record).await;
    Ok(grade)
}

/// Applies a partial update; the letter follows the value.
pub async fn update_grade<C>(db: &C, actor: &Actor, grade_id: &str, changes: GradeUpdate) -> Result<grade::Model>
where
    C: ConnectionTrait,
{
    let existing = require_grade(db, &actor.tenant_id, grade_id).await?;
    let mut active: grade::ActiveModel = existing.into();

    if let Some(value) = changes.grade_value {
        validate_value(value)?;
        active.grade_value = Set(value);
        active.grade_letter = Set(grade_letter(value).to_string());
    }
    if let Some(v) = changes.grade_type {
        active.grade_type = Set(v);
    }
    if let Some(v) = changes.grade_name {
        active.grade_name = Set(v);
    }
    if let Some(v) = changes.max_points {
        active.max_points = Set(v);
    }
    if let Some(v) = changes.earned_points {
        active.earned_points = Set(v);
    }
    if let Some(v) = changes.weight {
        active.weight = Set(Some(v));
    }
    if let Some(v) = changes.due_date {
        active.due_date = Set(Some(v));
    }
    if let Some(v) = changes.submitted_date {
        active.submitted_date = Set(Some(v));
    }
    if let Some(v) = changes.comments {
        active.comments = Set(Some(v));
    }
    active.updated_at = Set(Utc::now());

    let grade = active.update(db).await?;
    activity::log_update(db, actor, ActivityEntity::Grade, &grade.id, &grade.grade_name, Value::Null).await;
    Ok(grade)
}

/// Removes a grade.
pub async fn delete_grade<C>(db: &C, actor: &Actor, grade_id: &str) -> Result<()>
where
    C: ConnectionTrait,
{
    let existing = require_grade(db, &actor.tenant_id, grade_id).await?;
    Grade::delete_by_id(existing.id.as_str()).exec(db).await?;
    activity::log_delete(db, actor, ActivityEntity::Grade, &existing.id, &existing.grade_name, Value::Null).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    fn model(student: &str, value: f64, weight: Option<f64>) -> grade::Model {
        let now = Utc::now();
        grade::Model {
            id: Uuid::new_v4().to_string(),
            tenant_id: "t".to_string(),
            class_id: "c".to_string(),
            student_id: student.to_string(),
            teacher_id: "teacher".to_string(),
            grade_value: value,
            grade_letter: grade_letter(value).to_string(),
            grade_type: GradeType::Exam,
            grade_name: "Parcial".to_string(),
            max_points: 100.0,
            earned_points: value,
            weight,
            due_date: None,
            submitted_date: None,
            comments: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_grade_letter_boundaries() {
        assert_eq!(grade_letter(100.0), "A");
        assert_eq!(grade_letter(90.0), "A");
        assert_eq!(grade_letter(89.9), "B");
        assert_eq!(grade_letter(80.0), "B");
        assert_eq!(grade_letter(70.0), "C");
        assert_eq!(grade_letter(60.0), "D");
        assert_eq!(grade_letter(59.99), "F");
        assert_eq!(grade_letter(0.0), "F");
    }

    #[test]
    fn test_averages() {
        assert_eq!(student_average(&[]), 0.0);

        let plain = vec![model("s", 80.0, None), model("s", 100.0, None)];
        assert_eq!(student_average(&plain), 90.0);

        let weighted = vec![model("s", 100.0, Some(3.0)), model("s", 60.0, Some(1.0))];
        assert_eq!(student_average(&weighted), 90.0);

        // Zero weights fall back to the plain mean.
        let zero = vec![model("s", 70.0, Some(0.0)), model("s", 90.0, Some(0.0))];
        assert_eq!(student_average(&zero), 80.0);

        assert_eq!(class_average(&weighted), 80.0);
    }

    #[test]
    fn test_summaries_sorted_with_unknown() {
        let grades = vec![model("s2", 95.0, None), model("s1", 65.0, None), model("s3", 75.0, None)];
        let names = HashMap::from([
            ("s1".to_string(), "Zoe".to_string()),
            ("s2".to_string(), "Ana".to_string()),
        ]);
        let summaries = student_summaries(grades, &names);
        let order: Vec<&str> = summaries.iter().map(|s| s.student_name.as_str()).collect();
        assert_eq!(order, vec!["Ana", "Unknown", "Zoe"]);
        assert_eq!(summaries[0].letter_grade, "A");
        assert_eq!(summaries[2].letter_grade, "D");
    }

    #[test]
    fn test_type_labels() {
        assert_eq!(GradeType::Homework.label(), "Tarea");
        assert_eq!(GradeType::Participation.label(), "Participación");
    }

    #[tokio::test]
    async fn test_add_update_delete() -> Result<()> {
        let db = setup_test_db().await?;
        let actor = test_actor("tenant-1");
        let (class, s) = create_enrolled_class(&db, &actor, "Matemáticas", &["Ana", "Beto"]).await?;

        let bad = add_grade(&db, &actor, "t1", new_grade(&class.id, &s[0].id, 101.0)).await;
        assert!(matches!(bad, Err(Error::InvalidArgument { .. })));

        let grade = add_grade(&db, &actor, "t1", new_grade(&class.id, &s[0].id, 85.0)).await?;
        assert_eq!(grade.grade_letter, "B");

        let log = activity::recent_activities(&db, "tenant-1", 1).await?;
        assert_eq!(log[0].description, "Publicó calificación \"Examen parcial\" (85%)");

        let updated = update_grade(
            &db,
            &actor,
            &grade.id,
            GradeUpdate {
                grade_value: Some(92.5),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(updated.grade_letter, "A");

        add_grade(&db, &actor, "t1", new_grade(&class.id, &s[1].id, 70.0)).await?;
        assert_eq!(grades_by_class(&db, "tenant-1", &class.id).await?.len(), 2);
        assert_eq!(grades_by_student(&db, "tenant-1", &s[0].id, Some(class.id.as_str())).await?.len(), 1);
        assert_eq!(grades_by_type(&db, "tenant-1", &class.id, GradeType::Exam).await?.len(), 2);

        delete_grade(&db, &actor, &grade.id).await?;
        assert_eq!(grades_by_class(&db, "tenant-1", &class.id).await?.len(), 1);
        assert!(grades_by_class(&db, "tenant-2", &class.id).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_add_requires_enrollment() -> Result<()> {
        let db = setup_test_db().await?;
        let actor = test_actor("tenant-1");
        let (class, _) = create_enrolled_class(&db, &actor, "Matemáticas", &["Ana"]).await?;
        let outsider = create_test_student(&db, &actor, "Luis", "gl-1").await?;
        let foreign = create_test_student(&db, &test_actor("tenant-2"), "Eva", "gl-1").await?;

        for student in [&outsider, &foreign] {
            let result = add_grade(&db, &actor, "t1", new_grade(&class.id, &student.id, 90.0)).await;
            assert!(matches!(result, Err(Error::InvalidArgument { .. })));
        }
        assert!(grades_by_class(&db, "tenant-1", &class.id).await?.is_empty());
        Ok(())
    }
}
