//! Teacher endpoints. A teacher only sees classes assigned to them and the
//! absence requests addressed to them.

use super::{CreatedResult, EmptyResult, HandlerResult, found};
use crate::{
    api::{AppState, error::AppError, extract::TeacherCaller},
    core::{
        absence_request::{self, Decision},
        attendance::{self, AttendanceStats, BulkAttendance, DateRange},
        class, enrollment,
        grade::{self, GradeUpdate, NewGrade, StudentGradeSummary},
        student,
    },
    entities::{
        absence_request::{self as request_entity, RequestStatus},
        attendance::{self as attendance_entity, AttendanceStatus},
        class as class_entity, grade as grade_entity, student as student_entity,
    },
    errors::{Error, Result},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Loads a class and checks it is assigned to the caller.
async fn own_class(state: &AppState, teacher: &TeacherCaller, class_id: &str) -> Result<class_entity::Model> {
    let record = class::require_class(&state.db, teacher.tenant(), class_id).await?;
    if record.teacher_id.as_deref() != Some(teacher.teacher.id.as_str()) {
        return Err(Error::permission_denied("Esta clase no está asignada a ti"));
    }
    Ok(record)
}

/// Enrolled students of a class, by name.
async fn roster(state: &AppState, tenant_id: &str, class_id: &str) -> Result<Vec<student_entity::Model>> {
    let enrolled: HashSet<String> = enrollment::class_enrollments(&state.db, tenant_id, class_id)
        .await?
        .into_iter()
        .map(|e| e.student_id)
        .collect();
    let mut students: Vec<student_entity::Model> = student::list_students(&state.db, tenant_id)
        .await?
        .into_iter()
        .filter(|s| enrolled.contains(&s.id))
        .collect();
    students.sort_by(|a, b| a.full_name.cmp(&b.full_name));
    Ok(students)
}

async fn student_names(state: &AppState, tenant_id: &str, class_id: &str) -> Result<HashMap<String, String>> {
    Ok(roster(state, tenant_id, class_id)
        .await?
        .into_iter()
        .map(|s| (s.id, s.full_name))
        .collect())
}

// ---------------------------------------------------------------------------
// Classes
// ---------------------------------------------------------------------------

/// GET /v1/teacher/classes
pub async fn my_classes(State(state): State<AppState>, teacher: TeacherCaller) -> HandlerResult<Vec<class_entity::Model>> {
    Ok(Json(
        class::classes_by_teacher(&state.db, teacher.tenant(), &teacher.teacher.id).await?,
    ))
}

/// GET /v1/teacher/classes/{id}/students
pub async fn class_students(
    State(state): State<AppState>,
    teacher: TeacherCaller,
    Path(id): Path<String>,
) -> HandlerResult<Vec<student_entity::Model>> {
    own_class(&state, &teacher, &id).await?;
    Ok(Json(roster(&state, teacher.tenant(), &id).await?))
}

// ---------------------------------------------------------------------------
// Grades
// ---------------------------------------------------------------------------

/// GET /v1/teacher/classes/{id}/grades
pub async fn class_grades(
    State(state): State<AppState>,
    teacher: TeacherCaller,
    Path(id): Path<String>,
) -> HandlerResult<Vec<grade_entity::Model>> {
    own_class(&state, &teacher, &id).await?;
    Ok(Json(grade::grades_by_class(&state.db, teacher.tenant(), &id).await?))
}

/// GET /v1/teacher/classes/{id}/grades/summary
pub async fn grade_summaries(
    State(state): State<AppState>,
    teacher: TeacherCaller,
    Path(id): Path<String>,
) -> HandlerResult<Vec<StudentGradeSummary>> {
    own_class(&state, &teacher, &id).await?;
    let grades = grade::grades_by_class(&state.db, teacher.tenant(), &id).await?;
    let names = student_names(&state, teacher.tenant(), &id).await?;
    Ok(Json(grade::student_summaries(grades, &names)))
}

/// POST /v1/teacher/grades
pub async fn add_grade(
    State(state): State<AppState>,
    teacher: TeacherCaller,
    Json(data): Json<NewGrade>,
) -> CreatedResult<grade_entity::Model> {
    own_class(&state, &teacher, &data.class_id).await?;
    let record = grade::add_grade(&state.db, &teacher.actor, &teacher.teacher.id, data).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// PUT /v1/teacher/grades/{id}
pub async fn update_grade(
    State(state): State<AppState>,
    teacher: TeacherCaller,
    Path(id): Path<String>,
    Json(changes): Json<GradeUpdate>,
) -> HandlerResult<grade_entity::Model> {
    let existing = grade::require_grade(&state.db, teacher.tenant(), &id).await?;
    own_class(&state, &teacher, &existing.class_id).await?;
    Ok(Json(grade::update_grade(&state.db, &teacher.actor, &id, changes).await?))
}

/// DELETE /v1/teacher/grades/{id}
pub async fn delete_grade(
    State(state): State<AppState>,
    teacher: TeacherCaller,
    Path(id): Path<String>,
) -> EmptyResult {
    let existing = grade::require_grade(&state.db, teacher.tenant(), &id).await?;
    own_class(&state, &teacher, &existing.class_id).await?;
    grade::delete_grade(&state.db, &teacher.actor, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Attendance
// ---------------------------------------------------------------------------

/// Query selecting one school day.
#[derive(Debug, Deserialize)]
pub struct DayQuery {
    pub date: NaiveDate,
}

/// Body of `PUT /v1/teacher/attendance/{id}`.
#[derive(Debug, Deserialize)]
pub struct AttendanceChange {
    pub status: AttendanceStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

/// GET /v1/teacher/classes/{id}/attendance?date=YYYY-MM-DD
pub async fn class_attendance(
    State(state): State<AppState>,
    teacher: TeacherCaller,
    Path(id): Path<String>,
    Query(query): Query<DayQuery>,
) -> HandlerResult<Vec<attendance_entity::Model>> {
    own_class(&state, &teacher, &id).await?;
    Ok(Json(
        attendance::attendance_by_class_and_date(&state.db, teacher.tenant(), &id, query.date).await?,
    ))
}

/// GET /v1/teacher/classes/{id}/attendance/stats
pub async fn attendance_stats(
    State(state): State<AppState>,
    teacher: TeacherCaller,
    Path(id): Path<String>,
    Query(range): Query<DateRange>,
) -> HandlerResult<Vec<AttendanceStats>> {
    own_class(&state, &teacher, &id).await?;
    let records = attendance::attendance_by_class(&state.db, teacher.tenant(), &id, range).await?;
    let names = student_names(&state, teacher.tenant(), &id).await?;
    Ok(Json(attendance::attendance_stats(&records, &names)))
}

/// POST /v1/teacher/attendance
pub async fn record_attendance(
    State(state): State<AppState>,
    teacher: TeacherCaller,
    Json(roll): Json<BulkAttendance>,
) -> HandlerResult<Vec<attendance_entity::Model>> {
    own_class(&state, &teacher, &roll.class_id).await?;
    Ok(Json(
        attendance::record_bulk(&state.db, &teacher.actor, &teacher.teacher.id, roll).await?,
    ))
}

/// PUT /v1/teacher/attendance/{id}
pub async fn update_attendance(
    State(state): State<AppState>,
    teacher: TeacherCaller,
    Path(id): Path<String>,
    Json(change): Json<AttendanceChange>,
) -> HandlerResult<attendance_entity::Model> {
    let existing = attendance::require_attendance(&state.db, teacher.tenant(), &id).await?;
    own_class(&state, &teacher, &existing.class_id).await?;
    Ok(Json(
        attendance::update_attendance(&state.db, &teacher.actor, &id, change.status, change.notes).await?,
    ))
}

/// DELETE /v1/teacher/attendance/{id}
pub async fn delete_attendance(
    State(state): State<AppState>,
    teacher: TeacherCaller,
    Path(id): Path<String>,
) -> EmptyResult {
    let existing = attendance::require_attendance(&state.db, teacher.tenant(), &id).await?;
    own_class(&state, &teacher, &existing.class_id).await?;
    attendance::delete_attendance(&state.db, &teacher.actor, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Absence requests
// ---------------------------------------------------------------------------

/// Optional status filter.
#[derive(Debug, Default, Deserialize)]
pub struct RequestQuery {
    pub status: Option<RequestStatus>,
}

/// Number of requests awaiting review.
#[derive(Debug, Serialize)]
pub struct PendingCount {
    pub pending: u64,
}

/// Body of `POST /v1/teacher/absence-requests/{id}/review`.
#[derive(Debug, Deserialize)]
pub struct ReviewBody {
    pub decision: Decision,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Loads a request and checks it is addressed to the caller.
async fn own_request(state: &AppState, teacher: &TeacherCaller, id: &str) -> Result<request_entity::Model> {
    let request = absence_request::require_request(&state.db, teacher.tenant(), id).await?;
    if request.teacher_id != teacher.teacher.id {
        return Err(Error::permission_denied("Esta solicitud no está dirigida a ti"));
    }
    Ok(request)
}

/// GET /v1/teacher/absence-requests
pub async fn absence_requests(
    State(state): State<AppState>,
    teacher: TeacherCaller,
    Query(query): Query<RequestQuery>,
) -> HandlerResult<Vec<request_entity::Model>> {
    let tenant = teacher.tenant();
    let teacher_id = &teacher.teacher.id;
    let requests = match query.status {
        Some(status) => absence_request::requests_by_status(&state.db, tenant, teacher_id, status).await?,
        None => absence_request::requests_by_teacher(&state.db, tenant, teacher_id).await?,
    };
    Ok(Json(requests))
}

/// GET /v1/teacher/absence-requests/pending-count
pub async fn pending_requests(State(state): State<AppState>, teacher: TeacherCaller) -> HandlerResult<PendingCount> {
    let pending = absence_request::pending_count(&state.db, teacher.tenant(), &teacher.teacher.id).await?;
    Ok(Json(PendingCount { pending }))
}

/// POST /v1/teacher/absence-requests/{id}/review
pub async fn review_request(
    State(state): State<AppState>,
    teacher: TeacherCaller,
    Path(id): Path<String>,
    Json(body): Json<ReviewBody>,
) -> HandlerResult<request_entity::Model> {
    own_request(&state, &teacher, &id).await?;
    Ok(Json(
        absence_request::review_request(&state.db, &teacher.actor, &id, body.decision, body.notes).await?,
    ))
}

/// GET /v1/teacher/absence-requests/{id}/attachment
pub async fn request_attachment(
    State(state): State<AppState>,
    teacher: TeacherCaller,
    Path(id): Path<String>,
) -> std::result::Result<Vec<u8>, AppError> {
    let request = own_request(&state, &teacher, &id).await?;
    let path = found(request.attachment_url, "La solicitud no tiene adjunto")?;
    let bytes = state.storage.get(&path).await?;
    Ok(found(bytes, "Adjunto no encontrado")?)
}
