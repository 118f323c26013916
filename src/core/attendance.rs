//! Attendance business logic - Daily roll call per class.
//!
//! Attendance is taken for a whole class at once with [`record_bulk`], which
//! upserts one row per student for the day inside a single transaction.

use crate::{
    core::{
        activity::{self, Actor, ActivityRecord},
        enrollment,
    },
    entities::{
        Attendance,
        activity::{ActivityEntity, ActivityType},
        attendance::{self, AttendanceStatus},
    },
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};
use tracing::info;
use uuid::Uuid;

/// One student's mark in a roll call.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceEntry {
    /// Student
    pub student_id: String,
    /// Mark
    pub status: AttendanceStatus,
    /// Optional remarks
    #[serde(default)]
    pub notes: Option<String>,
}

/// A roll call for one class on one day.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkAttendance {
    /// Class
    pub class_id: String,
    /// School day
    pub date: NaiveDate,
    /// One entry per student
    pub records: Vec<AttendanceEntry>,
}

/// Attendance totals of one student.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceStats {
    pub student_id: String,
    pub student_name: String,
    pub present: u32,
    pub absent: u32,
    pub late: u32,
    pub excused: u32,
    pub total: u32,
    pub attendance_rate: f64,
}

/// Inclusive date range filter.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    /// First day, inclusive
    pub start_date: Option<NaiveDate>,
    /// Last day, inclusive
    pub end_date: Option<NaiveDate>,
}

/// Attendance can only be taken for today or earlier.
#[must_use]
pub fn is_valid_attendance_date(date: NaiveDate, today: NaiveDate) -> bool {
    date <= today
}

/// (present + late) / total as a percentage; 0 without records.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn attendance_rate(records: &[attendance::Model]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    let attended = records
        .iter()
        .filter(|r| matches!(r.status, AttendanceStatus::Present | AttendanceStatus::Late))
        .count();
    attended as f64 / records.len() as f64 * 100.0
}

/// Per-student totals sorted by name. Unknown students are named "Unknown".
#[must_use]
pub fn attendance_stats(records: &[attendance::Model], names: &HashMap<String, String>) -> Vec<AttendanceStats> {
    let mut grouped: HashMap<&str, Vec<attendance::Model>> = HashMap::new();
    for record in records {
        grouped.entry(record.student_id.as_str()).or_default().push(record.clone());
    }

    let mut stats: Vec<AttendanceStats> = grouped
        .into_iter()
        .map(|(student_id, rows)| {
            let count = |status: AttendanceStatus| {
                u32::try_from(rows.iter().filter(|r| r.status == status).count()).unwrap_or(u32::MAX)
            };
            AttendanceStats {
                student_id: student_id.to_string(),
                student_name: names.get(student_id).cloned().unwrap_or_else(|| "Unknown".to_string()),
                present: count(AttendanceStatus::Present),
                absent: count(AttendanceStatus::Absent),
                late: count(AttendanceStatus::Late),
                excused: count(AttendanceStatus::Excused),
                total: u32::try_from(rows.len()).unwrap_or(u32::MAX),
                attendance_rate: attendance_rate(&rows),
            }
        })
        .collect();
    stats.sort_by(|a, b| a.student_name.cmp(&b.student_name));
    stats
}

/// Roll call of a class on a day.
pub async fn attendance_by_class_and_date<C>(db: &C, tenant_id: &str, class_id: &str, date: NaiveDate) -> Result<Vec<attendance::Model>>
where
    C: ConnectionTrait,
{
    Attendance::find()
        .filter(attendance::Column::TenantId.eq(tenant_id))
        .filter(attendance::Column::ClassId.eq(class_id))
        .filter(attendance::Column::Date.eq(date))
        .all(db)
        .await
        .map_err(Into::into)
}

/// A student's attendance, optionally in one class and a date range, newest first.
pub async fn attendance_by_student<C>(
    db: &C,
    tenant_id: &str,
    student_id: &str,
    class_id: Option<&str>,
    range: DateRange,
) -> Result<Vec<attendance::Model>>
where
    C: ConnectionTrait,
{
    let mut query = Attendance::find()
        .filter(attendance::Column::TenantId.eq(tenant_id))
        .filter(attendance::Column::StudentId.eq(student_id));
    if let Some(class_id) = class_id {
        query = query.filter(attendance::Column::ClassId.eq(class_id));
    }
    if let Some(start) = range.start_date {
        query = query.filter(attendance::Column::Date.gte(start));
    }
    if let Some(end) = range.end_date {
        query = query.filter(attendance::Column::Date.lte(end));
    }
    query
        .order_by_desc(attendance::Column::Date)
        .all(db)
        .await
        .map_err(Into::into)
}

/// A class's attendance within a date range, newest first.
pub async fn attendance_by_class<C>(db: &C, tenant_id: &str, class_id: &str, range: DateRange) -> Result<Vec<attendance::Model>>
where
    C: ConnectionTrait,
{
    let mut query = Attendance::find()
        .filter(attendance::Column::TenantId.eq(tenant_id))
        .filter(attendance::Column::ClassId.eq(class_id));
    if let Some(start) = range.start_date {
        query = query.filter(attendance::Column::Date.gte(start));
    }
    if let Some(end) = range.end_date {
        query = query.filter(attendance::Column::Date.lte(end));
    }
    query
        .order_by_desc(attendance::Column::Date)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Records a class's roll call, updating marks already taken that day.
///
/// Returns the stored rows. An empty roll call, a future date, a student listed
/// twice or a student not enrolled in the class is rejected.
pub async fn record_bulk<C>(db: &C, actor: &Actor, teacher_id: &str, roll: BulkAttendance) -> Result<Vec<attendance::Model>>
where
    C: ConnectionTrait + TransactionTrait,
{
    if roll.records.is_empty() {
        return Err(Error::invalid("No hay registros de asistencia"));
    }
    if !is_valid_attendance_date(roll.date, Utc::now().date_naive()) {
        return Err(Error::invalid("No se puede registrar asistencia para fechas futuras"));
    }
    let mut seen = HashSet::with_capacity(roll.records.len());
    for entry in &roll.records {
        if !seen.insert(entry.student_id.as_str()) {
            return Err(Error::invalid("Un estudiante aparece más de una vez en la lista"));
        }
        if !enrollment::is_student_enrolled(db, &actor.tenant_id, &roll.class_id, &entry.student_id).await? {
            return Err(Error::invalid("El estudiante no está inscrito en esta clase"));
        }
    }

    let txn = db.begin().await?;
    let existing: HashMap<String, attendance::Model> =
        attendance_by_class_and_date(&txn, &actor.tenant_id, &roll.class_id, roll.date)
            .await?
            .into_iter()
            .map(|row| (row.student_id.clone(), row))
            .collect();

    let now = Utc::now();
    let mut stored = Vec::with_capacity(roll.records.len());
    for entry in roll.records {
        let row = if let Some(current) = existing.get(&entry.student_id) {
            let mut active: attendance::ActiveModel = current.clone().into();
            active.status = Set(entry.status);
            active.notes = Set(entry.notes);
            active.teacher_id = Set(teacher_id.to_string());
            active.updated_at = Set(now);
            active.update(&txn).await?
        } else {
            attendance::ActiveModel {
                id: Set(Uuid::new_v4().to_string()),
                tenant_id: Set(actor.tenant_id.clone()),
                class_id: Set(roll.class_id.clone()),
                student_id: Set(entry.student_id),
                teacher_id: Set(teacher_id.to_string()),
                date: Set(roll.date),
                status: Set(entry.status),
                notes: Set(entry.notes),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(&txn)
            .await?
        };
        stored.push(row);
    }
    txn.commit().await?;

    info!(class = %roll.class_id, date = %roll.date, count = stored.len(), "Attendance recorded");

    let record = ActivityRecord {
        kind: ActivityType::Create,
        entity: ActivityEntity::Attendance,
        entity_id: roll.class_id.clone(),
        entity_name: roll.date.to_string(),
        description: format!(
            "Registró asistencia para {} estudiantes ({})",
            stored.len(),
            roll.date
        ),
        metadata: json!({ "classId": roll.class_id, "date": roll.date, "count": stored.len() }),
    };
    activity::log_activity(db, actor, record).await;
    Ok(stored)
}

/// Finds an attendance mark of the tenant, or `not-found`.
pub async fn require_attendance<C>(db: &C, tenant_id: &str, id: &str) -> Result<attendance::Model>
where
    C: ConnectionTrait,
{
    Attendance::find_by_id(id)
        .filter(attendance::Column::TenantId.eq(tenant_id))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Registro de asistencia no encontrado"))
}

/// Changes one mark.
pub async fn update_attendance<C>(
    db: &C,
    actor: &Actor,
    id: &str,
    status: AttendanceStatus,
    notes: Option<String>,
) -> Result<attendance::Model>
where
    C: ConnectionTrait,
{
    let existing = require_attendance(db, &actor.tenant_id, id).await?;
    let mut active: attendance::ActiveModel = existing.into();
    active.status = Set(status);
    active.notes = Set(notes);
    active.updated_at = Set(Utc::now());
    let row = active.update(db).await?;

    activity::log_update(
        db,
        actor,
        ActivityEntity::Attendance,
        &row.id,
        &row.date.to_string(),
        json!({ "status": status.label() }),
    )
    .await;
    Ok(row)
}

/// Removes one mark.
pub async fn delete_attendance<C>(db: &C, actor: &Actor, id: &str) -> Result<()>
where
    C: ConnectionTrait,
{
    let existing = require_attendance(db, &actor.tenant_id, id).await?;
    Attendance::delete_by_id(existing.id.as_str()).exec(db).await?;
    activity::log_delete(db, actor, ActivityEntity::Attendance, &existing.id, &existing.date.to_string(), Value::Null).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;
    use chrono::Duration;

    fn entry(student: &str, status: AttendanceStatus) -> AttendanceEntry {
        AttendanceEntry {
            student_id: student.to_string(),
            status,
            notes: None,
        }
    }

    #[test]
    fn test_valid_date() {
        let today = NaiveDate::from_ymd_opt(2024, 10, 10).unwrap();
        assert!(is_valid_attendance_date(today, today));
        assert!(is_valid_attendance_date(today - Duration::days(1), today));
        assert!(!is_valid_attendance_date(today + Duration::days(1), today));
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(AttendanceStatus::Present.label(), "Presente");
        assert_eq!(AttendanceStatus::Excused.label(), "Justificado");
    }

    fn roll(class_id: &str, date: NaiveDate, records: Vec<AttendanceEntry>) -> BulkAttendance {
        BulkAttendance {
            class_id: class_id.to_string(),
            date,
            records,
        }
    }

    #[tokio::test]
    async fn test_bulk_upsert_and_rate() -> Result<()> {
        let db = setup_test_db().await?;
        let actor = test_actor("tenant-1");
        let today = Utc::now().date_naive();
        let (class, s) = create_enrolled_class(&db, &actor, "Matemáticas", &["Ana", "Beto", "Carla", "Dario"]).await?;

        let records = vec![
            entry(&s[0].id, AttendanceStatus::Present),
            entry(&s[1].id, AttendanceStatus::Absent),
            entry(&s[2].id, AttendanceStatus::Late),
            entry(&s[3].id, AttendanceStatus::Excused),
        ];
        record_bulk(&db, &actor, "t1", roll(&class.id, today, records)).await?;

        let rows = attendance_by_class_and_date(&db, "tenant-1", &class.id, today).await?;
        assert_eq!(rows.len(), 4);
        assert_eq!(attendance_rate(&rows), 50.0);

        // Taking the roll again updates instead of duplicating.
        let records = vec![entry(&s[1].id, AttendanceStatus::Present)];
        record_bulk(&db, &actor, "t1", roll(&class.id, today, records)).await?;
        let rows = attendance_by_class_and_date(&db, "tenant-1", &class.id, today).await?;
        assert_eq!(rows.len(), 4);
        assert_eq!(attendance_rate(&rows), 75.0);

        let log = activity::recent_activities(&db, "tenant-1", 10).await?;
        assert!(log.iter().any(|a| a.description == format!("Registró asistencia para 4 estudiantes ({today})")));
        Ok(())
    }

    #[tokio::test]
    async fn test_bulk_rejections() -> Result<()> {
        let db = setup_test_db().await?;
        let actor = test_actor("tenant-1");
        let today = Utc::now().date_naive();
        let (class, s) = create_enrolled_class(&db, &actor, "Matemáticas", &["Ana"]).await?;

        let empty = roll(&class.id, today, vec![]);
        assert!(matches!(record_bulk(&db, &actor, "t1", empty).await, Err(Error::InvalidArgument { .. })));

        let future = roll(&class.id, today + Duration::days(2), vec![entry(&s[0].id, AttendanceStatus::Present)]);
        assert!(matches!(record_bulk(&db, &actor, "t1", future).await, Err(Error::InvalidArgument { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_bulk_rejects_repeated_student() -> Result<()> {
        let db = setup_test_db().await?;
        let actor = test_actor("tenant-1");
        let today = Utc::now().date_naive();
        let (class, s) = create_enrolled_class(&db, &actor, "Matemáticas", &["Ana"]).await?;

        let records = vec![
            entry(&s[0].id, AttendanceStatus::Absent),
            entry(&s[0].id, AttendanceStatus::Present),
        ];
        let result = record_bulk(&db, &actor, "t1", roll(&class.id, today, records)).await;
        assert!(matches!(result, Err(Error::InvalidArgument { .. })));
        assert!(attendance_by_class_and_date(&db, "tenant-1", &class.id, today).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_bulk_requires_enrollment() -> Result<()> {
        let db = setup_test_db().await?;
        let actor = test_actor("tenant-1");
        let today = Utc::now().date_naive();
        let (class, s) = create_enrolled_class(&db, &actor, "Matemáticas", &["Ana"]).await?;
        let outsider = create_test_student(&db, &actor, "Luis", "gl-1").await?;
        let foreign = create_test_student(&db, &test_actor("tenant-2"), "Eva", "gl-1").await?;

        for student in [&outsider, &foreign] {
            let records = vec![
                entry(&s[0].id, AttendanceStatus::Present),
                entry(&student.id, AttendanceStatus::Present),
            ];
            let result = record_bulk(&db, &actor, "t1", roll(&class.id, today, records)).await;
            assert!(matches!(result, Err(Error::InvalidArgument { .. })));
        }
        assert!(attendance_by_class_and_date(&db, "tenant-1", &class.id, today).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_student_history_range_and_stats() -> Result<()> {
        let db = setup_test_db().await?;
        let actor = test_actor("tenant-1");
        let today = Utc::now().date_naive();
        let (class, s) = create_enrolled_class(&db, &actor, "Matemáticas", &["Beto", "Ana"]).await?;
        let (beto, ana) = (&s[0], &s[1]);

        for days_ago in 0..3 {
            let records = vec![
                entry(&beto.id, if days_ago == 0 { AttendanceStatus::Absent } else { AttendanceStatus::Present }),
                entry(&ana.id, AttendanceStatus::Late),
            ];
            record_bulk(&db, &actor, "t1", roll(&class.id, today - Duration::days(days_ago), records)).await?;
        }

        let history = attendance_by_student(&db, "tenant-1", &beto.id, None, DateRange::default()).await?;
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].date, today);

        let range = DateRange {
            start_date: Some(today - Duration::days(1)),
            end_date: Some(today),
        };
        assert_eq!(attendance_by_student(&db, "tenant-1", &beto.id, Some(class.id.as_str()), range).await?.len(), 2);

        let rows = attendance_by_class(&db, "tenant-1", &class.id, DateRange::default()).await?;
        let names = HashMap::from([
            (beto.id.clone(), beto.full_name.clone()),
            (ana.id.clone(), ana.full_name.clone()),
        ]);
        let stats = attendance_stats(&rows, &names);
        assert_eq!(stats[0].student_name, "Ana");
        assert_eq!(stats[0].late, 3);
        assert_eq!(stats[0].attendance_rate, 100.0);
        assert_eq!(stats[1].absent, 1);
        assert_eq!(stats[1].total, 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_and_delete() -> Result<()> {
        let db = setup_test_db().await?;
        let actor = test_actor("tenant-1");
        let (class, s) = create_enrolled_class(&db, &actor, "Matemáticas", &["Ana"]).await?;
        let records = vec![entry(&s[0].id, AttendanceStatus::Absent)];
        let rows = record_bulk(&db, &actor, "t1", roll(&class.id, Utc::now().date_naive(), records)).await?;

        let updated = update_attendance(&db, &actor, &rows[0].id, AttendanceStatus::Excused, Some("Cita médica".to_string())).await?;
        assert_eq!(updated.status, AttendanceStatus::Excused);

        let other = delete_attendance(&db, &test_actor("tenant-2"), &rows[0].id).await;
        assert!(matches!(other, Err(Error::NotFound { .. })));
        delete_attendance(&db, &actor, &rows[0].id).await?;
        Ok(())
    }
}
