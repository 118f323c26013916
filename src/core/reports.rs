//! Report generation business logic.
//!
//! This module computes the admin dashboard counters and the analytics shown
//! on the reports page. Aggregations over already loaded rows are plain
//! functions so they can be tested without a database.

use crate::{
    core::enrollment,
    entities::{
        ActiveStatus, Activity, Class, GradeLevel, Role, Student, Subject, Teacher, User,
        activity::{self, ActivityEntity, ActivityType},
        class, grade_level, student, subject, teacher, user,
    },
    errors::Result,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use sea_orm::{PaginatorTrait, QueryOrder, QuerySelect, prelude::*};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Activities considered by the activity analytics.
pub const ACTIVITY_SAMPLE: u64 = 1000;

/// Days covered by [`activity_trend`].
pub const TREND_DAYS: i64 = 30;

/// Counters on the admin home page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_classes: u64,
    /// Teachers with a login account
    pub total_teachers: u64,
    pub total_students: u64,
}

/// School-wide totals for the reports page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_classes: u64,
    pub total_teachers: u64,
    pub total_students: u64,
    pub total_grade_levels: u64,
    pub total_subjects: u64,
    pub active_students: u64,
    pub active_teachers: u64,
    pub inactive_students: u64,
    pub inactive_teachers: u64,
}

/// One of the most active users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserActivity {
    pub email: String,
    pub name: String,
    pub count: u64,
}

/// Breakdown of the recent audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityMetrics {
    pub total_activities: u64,
    pub activities_by_type: HashMap<ActivityType, u64>,
    pub activities_by_entity: HashMap<ActivityEntity, u64>,
    pub activities_last_7_days: u64,
    pub activities_last_30_days: u64,
    /// Top five users by number of activities
    pub most_active_users: Vec<UserActivity>,
}

/// A named count.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedCount {
    pub name: String,
    pub count: u64,
}

/// How students are distributed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentMetrics {
    pub total_students: u64,
    pub students_by_grade: Vec<NamedCount>,
    pub enrollments_by_class: Vec<NamedCount>,
    /// Students per class
    pub average_class_size: f64,
}

/// How classes are distributed among teachers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherMetrics {
    pub teachers_with_classes: u64,
    pub teachers_without_classes: u64,
    /// Classes per teacher, over teachers that have any
    pub average_classes_per_teacher: f64,
    pub classes_by_teacher: Vec<NamedCount>,
}

/// Activity count of one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    pub date: String,
    pub value: u64,
}

/// Counts classes, teacher accounts and students of a tenant.
pub async fn dashboard_stats<C>(db: &C, tenant_id: &str) -> Result<DashboardStats>
where
    C: ConnectionTrait,
{
    let total_classes = Class::find()
        .filter(class::Column::TenantId.eq(tenant_id))
        .count(db)
        .await?;
    let total_teachers = User::find()
        .filter(user::Column::TenantId.eq(tenant_id))
        .filter(user::Column::Role.eq(Role::Teacher))
        .count(db)
        .await?;
    let total_students = count_students(db, tenant_id, None).await?;

    Ok(DashboardStats {
        total_classes,
        total_teachers,
        total_students,
    })
}

async fn count_students<C>(db: &C, tenant_id: &str, status: Option<ActiveStatus>) -> Result<u64>
where
    C: ConnectionTrait,
{
    let mut query = Student::find().filter(student::Column::TenantId.eq(tenant_id));
    if let Some(status) = status {
        query = query.filter(student::Column::Status.eq(status));
    }
    query.count(db).await.map_err(Into::into)
}

async fn count_teachers<C>(db: &C, tenant_id: &str, status: Option<ActiveStatus>) -> Result<u64>
where
    C: ConnectionTrait,
{
    let mut query = Teacher::find().filter(teacher::Column::TenantId.eq(tenant_id));
    if let Some(status) = status {
        query = query.filter(teacher::Column::Status.eq(status));
    }
    query.count(db).await.map_err(Into::into)
}

/// Totals per collection plus the active/inactive split.
pub async fn report_summary<C>(db: &C, tenant_id: &str) -> Result<ReportSummary>
where
    C: ConnectionTrait,
{
    Ok(ReportSummary {
        total_classes: Class::find()
            .filter(class::Column::TenantId.eq(tenant_id))
            .count(db)
            .await?,
        total_teachers: count_teachers(db, tenant_id, None).await?,
        total_students: count_students(db, tenant_id, None).await?,
        total_grade_levels: GradeLevel::find()
            .filter(grade_level::Column::TenantId.eq(tenant_id))
            .count(db)
            .await?,
        total_subjects: Subject::find()
            .filter(subject::Column::TenantId.eq(tenant_id))
            .count(db)
            .await?,
        active_students: count_students(db, tenant_id, Some(ActiveStatus::Active)).await?,
        active_teachers: count_teachers(db, tenant_id, Some(ActiveStatus::Active)).await?,
        inactive_students: count_students(db, tenant_id, Some(ActiveStatus::Inactive)).await?,
        inactive_teachers: count_teachers(db, tenant_id, Some(ActiveStatus::Inactive)).await?,
    })
}

async fn activity_sample<C>(db: &C, tenant_id: &str) -> Result<Vec<activity::Model>>
where
    C: ConnectionTrait,
{
    Activity::find()
        .filter(activity::Column::TenantId.eq(tenant_id))
        .order_by_desc(activity::Column::Timestamp)
        .limit(ACTIVITY_SAMPLE)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Computes [`ActivityMetrics`] over a list of activities.
pub fn summarize_activities(activities: &[activity::Model], now: DateTime<Utc>) -> ActivityMetrics {
    let week_ago = now - Duration::days(7);
    let month_ago = now - Duration::days(30);

    let mut by_type = HashMap::new();
    let mut by_entity = HashMap::new();
    let mut by_user: HashMap<&str, UserActivity> = HashMap::new();
    let mut last_7 = 0;
    let mut last_30 = 0;

    for entry in activities {
        *by_type.entry(entry.kind).or_insert(0) += 1;
        *by_entity.entry(entry.entity).or_insert(0) += 1;
        if entry.timestamp >= week_ago {
            last_7 += 1;
        }
        if entry.timestamp >= month_ago {
            last_30 += 1;
        }
        if !entry.user_email.is_empty() {
            by_user
                .entry(entry.user_email.as_str())
                .or_insert_with(|| UserActivity {
                    email: entry.user_email.clone(),
                    name: entry.user_name.clone(),
                    count: 0,
                })
                .count += 1;
        }
    }

    let mut most_active_users: Vec<UserActivity> = by_user.into_values().collect();
    most_active_users.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.email.cmp(&b.email)));
    most_active_users.truncate(5);

    ActivityMetrics {
        total_activities: activities.len() as u64,
        activities_by_type: by_type,
        activities_by_entity: by_entity,
        activities_last_7_days: last_7,
        activities_last_30_days: last_30,
        most_active_users,
    }
}

/// Breakdown of the latest activities of a tenant.
pub async fn activity_metrics<C>(db: &C, tenant_id: &str) -> Result<ActivityMetrics>
where
    C: ConnectionTrait,
{
    let sample = activity_sample(db, tenant_id).await?;
    Ok(summarize_activities(&sample, Utc::now()))
}

/// Daily counts for the `TREND_DAYS` days ending `today`, oldest first.
pub fn daily_trend(activities: &[activity::Model], today: NaiveDate) -> Vec<DailyCount> {
    let start = today - Duration::days(TREND_DAYS - 1);
    let mut days: BTreeMap<NaiveDate, u64> = (0..TREND_DAYS).map(|i| (start + Duration::days(i), 0)).collect();

    for entry in activities {
        if let Some(count) = days.get_mut(&entry.timestamp.date_naive()) {
            *count += 1;
        }
    }

    days.into_iter()
        .map(|(date, value)| DailyCount {
            date: date.format("%Y-%m-%d").to_string(),
            value,
        })
        .collect()
}

/// Activity per day over the last month.
pub async fn activity_trend<C>(db: &C, tenant_id: &str) -> Result<Vec<DailyCount>>
where
    C: ConnectionTrait,
{
    let sample = activity_sample(db, tenant_id).await?;
    Ok(daily_trend(&sample, Utc::now().date_naive()))
}

fn sorted_counts(counts: impl IntoIterator<Item = (String, u64)>) -> Vec<NamedCount> {
    let mut counts: Vec<NamedCount> = counts.into_iter().map(|(name, count)| NamedCount { name, count }).collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    counts
}

/// Students per grade level and enrolled students per class.
pub async fn enrollment_metrics<C>(db: &C, tenant_id: &str) -> Result<EnrollmentMetrics>
where
    C: ConnectionTrait,
{
    let students = Student::find()
        .filter(student::Column::TenantId.eq(tenant_id))
        .all(db)
        .await?;
    let levels: HashMap<String, String> = GradeLevel::find()
        .filter(grade_level::Column::TenantId.eq(tenant_id))
        .all(db)
        .await?
        .into_iter()
        .map(|level| (level.id, level.name))
        .collect();
    let classes = Class::find()
        .filter(class::Column::TenantId.eq(tenant_id))
        .all(db)
        .await?;

    let mut by_grade: HashMap<String, u64> = HashMap::new();
    for s in students.iter().filter(|s| !s.grade_level.is_empty()) {
        let name = levels.get(&s.grade_level).cloned().unwrap_or_else(|| s.grade_level.clone());
        *by_grade.entry(name).or_insert(0) += 1;
    }

    let class_ids: Vec<String> = classes.iter().map(|c| c.id.clone()).collect();
    let enrolled = enrollment::enrollment_counts(db, tenant_id, &class_ids).await?;
    let by_class = classes
        .iter()
        .map(|c| (c.class_name.clone(), enrolled.get(&c.id).copied().unwrap_or(0)));

    let total_students = students.len() as u64;
    #[allow(clippy::cast_precision_loss)]
    let average_class_size = if classes.is_empty() {
        0.0
    } else {
        total_students as f64 / classes.len() as f64
    };

    Ok(EnrollmentMetrics {
        total_students,
        students_by_grade: sorted_counts(by_grade),
        enrollments_by_class: sorted_counts(by_class),
        average_class_size,
    })
}

/// Distribution of classes among the tenant's teachers.
pub async fn teacher_metrics<C>(db: &C, tenant_id: &str) -> Result<TeacherMetrics>
where
    C: ConnectionTrait,
{
    let teachers = Teacher::find()
        .filter(teacher::Column::TenantId.eq(tenant_id))
        .all(db)
        .await?;
    let classes = Class::find()
        .filter(class::Column::TenantId.eq(tenant_id))
        .all(db)
        .await?;

    let mut per_teacher: HashMap<&str, u64> = HashMap::new();
    for teacher_id in classes.iter().filter_map(|c| c.teacher_id.as_deref()) {
        *per_teacher.entry(teacher_id).or_insert(0) += 1;
    }

    let names: HashMap<&str, &str> = teachers.iter().map(|t| (t.id.as_str(), t.full_name.as_str())).collect();
    let with_classes = per_teacher.len() as u64;
    let assigned: u64 = per_teacher.values().sum();

    #[allow(clippy::cast_precision_loss)]
    let average_classes_per_teacher = if with_classes == 0 {
        0.0
    } else {
        assigned as f64 / with_classes as f64
    };

    let classes_by_teacher = sorted_counts(per_teacher.into_iter().map(|(id, count)| {
        let name = names.get(id).map_or_else(|| id.to_string(), |n| (*n).to_string());
        (name, count)
    }));

    Ok(TeacherMetrics {
        teachers_with_classes: with_classes,
        teachers_without_classes: (teachers.len() as u64).saturating_sub(with_classes),
        average_classes_per_teacher,
        classes_by_teacher,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::{
        core::{class as classes, enrollment::enroll_student, student as students},
        entities::grade_level::Stage,
        test_utils::*,
    };
    use serde_json::json;

    fn entry(kind: ActivityType, email: &str, timestamp: DateTime<Utc>) -> activity::Model {
        activity::Model {
            id: uuid::Uuid::new_v4().to_string(),
            tenant_id: "tenant-1".to_string(),
            user_id: email.to_string(),
            user_name: email.to_string(),
            user_email: email.to_string(),
            kind,
            entity: ActivityEntity::Student,
            entity_id: "s1".to_string(),
            entity_name: "Ana".to_string(),
            description: "x".to_string(),
            timestamp,
            metadata: json!({}),
        }
    }

    #[test]
    fn test_summarize_activities() {
        let now = Utc::now();
        let activities = vec![
            entry(ActivityType::Create, "a@x.com", now),
            entry(ActivityType::Create, "a@x.com", now - Duration::days(10)),
            entry(ActivityType::Delete, "b@x.com", now - Duration::days(40)),
        ];

        let metrics = summarize_activities(&activities, now);
        assert_eq!(metrics.total_activities, 3);
        assert_eq!(metrics.activities_by_type[&ActivityType::Create], 2);
        assert_eq!(metrics.activities_by_entity[&ActivityEntity::Student], 3);
        assert_eq!(metrics.activities_last_7_days, 1);
        assert_eq!(metrics.activities_last_30_days, 2);
        assert_eq!(metrics.most_active_users[0].email, "a@x.com");
        assert_eq!(metrics.most_active_users[0].count, 2);
    }

    #[test]
    fn test_daily_trend_window() {
        let now = Utc::now();
        let today = now.date_naive();
        let activities = vec![
            entry(ActivityType::Create, "a@x.com", now),
            entry(ActivityType::Create, "a@x.com", now),
            entry(ActivityType::Create, "a@x.com", now - Duration::days(45)),
        ];

        let trend = daily_trend(&activities, today);
        assert_eq!(trend.len(), 30);
        assert_eq!(trend.last().unwrap().date, today.format("%Y-%m-%d").to_string());
        assert_eq!(trend.last().unwrap().value, 2);
        assert_eq!(trend.iter().map(|d| d.value).sum::<u64>(), 2);
    }

    #[tokio::test]
    async fn test_summary_and_dashboard() -> Result<()> {
        let db = setup_test_db().await?;
        let actor = test_actor("tenant-1");
        let ana = create_test_student(&db, &actor, "Ana", "gl-1").await?;
        create_test_student(&db, &actor, "Beto", "gl-1").await?;
        students::update_student_status(&db, &actor, &ana.id, ActiveStatus::Inactive).await?;
        create_test_teacher(&db, "tenant-1", "Luis").await?;
        create_test_student(&db, &test_actor("tenant-2"), "Otro", "gl-1").await?;

        let summary = report_summary(&db, "tenant-1").await?;
        assert_eq!(summary.total_students, 2);
        assert_eq!(summary.active_students, 1);
        assert_eq!(summary.inactive_students, 1);
        assert_eq!(summary.total_teachers, 1);
        assert_eq!(summary.active_teachers, 1);

        let stats = dashboard_stats(&db, "tenant-1").await?;
        assert_eq!(stats.total_students, 2);
        // No teacher has a login account yet.
        assert_eq!(stats.total_teachers, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_enrollment_and_teacher_metrics() -> Result<()> {
        let db = setup_test_db().await?;
        let actor = test_actor("tenant-1");
        let level = create_test_grade_level(&db, &actor, "1ro de Primaria", Stage::Primaria, 1).await?;
        let luis = create_test_teacher(&db, "tenant-1", "Luis").await?;
        create_test_teacher(&db, "tenant-1", "Marta").await?;

        let math = create_test_class(&db, &actor, "Matemáticas", &level.id, 30).await?;
        let art = create_test_class(&db, &actor, "Arte", &level.id, 30).await?;
        classes::assign_teacher(&db, &actor, &math.id, Some(luis.id.clone())).await?;
        classes::assign_teacher(&db, &actor, &art.id, Some(luis.id.clone())).await?;

        let ana = create_test_student(&db, &actor, "Ana", &level.id).await?;
        let beto = create_test_student(&db, &actor, "Beto", &level.id).await?;
        enroll_student(&db, &actor, &math.id, &ana.id).await?;
        enroll_student(&db, &actor, &math.id, &beto.id).await?;

        let enrollment = enrollment_metrics(&db, "tenant-1").await?;
        assert_eq!(enrollment.total_students, 2);
        assert_eq!(enrollment.students_by_grade[0].name, "1ro de Primaria");
        assert_eq!(enrollment.students_by_grade[0].count, 2);
        assert_eq!(enrollment.enrollments_by_class[0].name, "Matemáticas");
        assert_eq!(enrollment.enrollments_by_class[0].count, 2);
        assert_eq!(enrollment.enrollments_by_class[1].count, 0);
        assert_eq!(enrollment.average_class_size, 1.0);

        let teachers = teacher_metrics(&db, "tenant-1").await?;
        assert_eq!(teachers.teachers_with_classes, 1);
        assert_eq!(teachers.teachers_without_classes, 1);
        assert_eq!(teachers.average_classes_per_teacher, 2.0);
        assert_eq!(teachers.classes_by_teacher[0].name, "Luis");
        Ok(())
    }
}
