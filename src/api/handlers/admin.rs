//! Admin endpoints: school profile, people, announcements, the audit log and
//! reports. Every call acts in the admin's own tenant.

use super::{CreatedResult, EmptyResult, HandlerResult, found};
use crate::{
    api::{AppState, extract::AdminCaller},
    core::{
        activity::{self, ActivityFilter, ActivityPage},
        announcement::{self, AnnouncementUpdate, NewAnnouncement},
        reports::{self, ActivityMetrics, DailyCount, DashboardStats, EnrollmentMetrics, ReportSummary, TeacherMetrics},
        school::{self, NewSchool},
        student::{self, NewStudent, StudentUpdate},
        teacher::{self, NewTeacher, TeacherUpdate},
    },
    entities::{
        ActiveStatus,
        activity::{ActivityEntity, ActivityType},
        announcement::{self as announcement_entity, AnnouncementStatus, AnnouncementType},
        school as school_entity, student as student_entity, teacher as teacher_entity,
    },
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of the status endpoints of students and teachers.
#[derive(Debug, Deserialize)]
pub struct ActiveStatusBody {
    /// New status
    pub status: ActiveStatus,
}

// ---------------------------------------------------------------------------
// School
// ---------------------------------------------------------------------------

/// Registration number availability.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationQuery {
    /// Number to check
    pub registration_number: String,
}

/// Whether a value is free to use.
#[derive(Debug, Serialize)]
pub struct Availability {
    /// `true` when nothing uses the value yet
    pub available: bool,
}

/// GET /v1/admin/school
pub async fn get_school(State(state): State<AppState>, admin: AdminCaller) -> HandlerResult<school_entity::Model> {
    let school = school::get_school(&state.db, admin.tenant()).await?;
    Ok(Json(found(school, "Escuela no encontrada")?))
}

/// POST /v1/admin/school
pub async fn create_school(
    State(state): State<AppState>,
    admin: AdminCaller,
    Json(data): Json<NewSchool>,
) -> CreatedResult<school_entity::Model> {
    let school = school::create_school(&state.db, admin.tenant(), data).await?;
    Ok((StatusCode::CREATED, Json(school)))
}

/// GET /v1/admin/school/registration-available?registrationNumber=...
pub async fn registration_available(
    State(state): State<AppState>,
    _admin: AdminCaller,
    Query(query): Query<RegistrationQuery>,
) -> HandlerResult<Availability> {
    let available = school::is_registration_number_available(&state.db, &query.registration_number).await?;
    Ok(Json(Availability { available }))
}

// ---------------------------------------------------------------------------
// Students
// ---------------------------------------------------------------------------

/// Optional filters of the student list.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentQuery {
    /// Only this status
    pub status: Option<ActiveStatus>,
    /// Only this grade level
    pub grade_level: Option<String>,
}

/// GET /v1/admin/students
pub async fn list_students(
    State(state): State<AppState>,
    admin: AdminCaller,
    Query(query): Query<StudentQuery>,
) -> HandlerResult<Vec<student_entity::Model>> {
    let tenant = admin.tenant();
    let students = match (query.status, query.grade_level) {
        (Some(status), _) => student::students_by_status(&state.db, tenant, status).await?,
        (None, Some(grade_level)) => student::students_by_grade_level(&state.db, tenant, &grade_level).await?,
        (None, None) => student::list_students(&state.db, tenant).await?,
    };
    Ok(Json(students))
}

/// GET /v1/admin/students/{id}
pub async fn get_student(
    State(state): State<AppState>,
    admin: AdminCaller,
    Path(id): Path<String>,
) -> HandlerResult<student_entity::Model> {
    let record = student::get_student(&state.db, admin.tenant(), &id).await?;
    Ok(Json(found(record, "Estudiante no encontrado")?))
}

/// POST /v1/admin/students
pub async fn create_student(
    State(state): State<AppState>,
    admin: AdminCaller,
    Json(data): Json<NewStudent>,
) -> CreatedResult<student_entity::Model> {
    let record = student::create_student(&state.db, &admin.actor, data).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// PUT /v1/admin/students/{id}
pub async fn update_student(
    State(state): State<AppState>,
    admin: AdminCaller,
    Path(id): Path<String>,
    Json(changes): Json<StudentUpdate>,
) -> HandlerResult<student_entity::Model> {
    Ok(Json(student::update_student(&state.db, &admin.actor, &id, changes).await?))
}

/// PUT /v1/admin/students/{id}/status
pub async fn update_student_status(
    State(state): State<AppState>,
    admin: AdminCaller,
    Path(id): Path<String>,
    Json(body): Json<ActiveStatusBody>,
) -> HandlerResult<student_entity::Model> {
    Ok(Json(student::update_student_status(&state.db, &admin.actor, &id, body.status).await?))
}

/// DELETE /v1/admin/students/{id}
pub async fn delete_student(
    State(state): State<AppState>,
    admin: AdminCaller,
    Path(id): Path<String>,
) -> EmptyResult {
    student::delete_student(&state.db, &admin.actor, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Teachers
// ---------------------------------------------------------------------------

/// Optional filter of the teacher list.
#[derive(Debug, Default, Deserialize)]
pub struct TeacherQuery {
    /// Only active teachers
    #[serde(default)]
    pub active: bool,
}

/// GET /v1/admin/teachers
pub async fn list_teachers(
    State(state): State<AppState>,
    admin: AdminCaller,
    Query(query): Query<TeacherQuery>,
) -> HandlerResult<Vec<teacher_entity::Model>> {
    let teachers = if query.active {
        teacher::active_teachers(&state.db, admin.tenant()).await?
    } else {
        teacher::list_teachers(&state.db, admin.tenant()).await?
    };
    Ok(Json(teachers))
}

/// GET /v1/admin/teachers/{id}
pub async fn get_teacher(
    State(state): State<AppState>,
    admin: AdminCaller,
    Path(id): Path<String>,
) -> HandlerResult<teacher_entity::Model> {
    let record = teacher::get_teacher(&state.db, admin.tenant(), &id).await?;
    Ok(Json(found(record, "Profesor no encontrado")?))
}

/// POST /v1/admin/teachers
pub async fn create_teacher(
    State(state): State<AppState>,
    admin: AdminCaller,
    Json(data): Json<NewTeacher>,
) -> CreatedResult<teacher_entity::Model> {
    let record = teacher::create_teacher(&state.db, admin.tenant(), data).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// PUT /v1/admin/teachers/{id}
pub async fn update_teacher(
    State(state): State<AppState>,
    admin: AdminCaller,
    Path(id): Path<String>,
    Json(changes): Json<TeacherUpdate>,
) -> HandlerResult<teacher_entity::Model> {
    Ok(Json(teacher::update_teacher(&state.db, admin.tenant(), &id, changes).await?))
}

/// PUT /v1/admin/teachers/{id}/status
pub async fn update_teacher_status(
    State(state): State<AppState>,
    admin: AdminCaller,
    Path(id): Path<String>,
    Json(body): Json<ActiveStatusBody>,
) -> HandlerResult<teacher_entity::Model> {
    Ok(Json(teacher::update_teacher_status(&state.db, admin.tenant(), &id, body.status).await?))
}

/// DELETE /v1/admin/teachers/{id}
pub async fn delete_teacher(
    State(state): State<AppState>,
    admin: AdminCaller,
    Path(id): Path<String>,
) -> EmptyResult {
    teacher::delete_teacher(&state.db, admin.tenant(), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Announcements
// ---------------------------------------------------------------------------

/// Optional filters of the announcement list.
#[derive(Debug, Default, Deserialize)]
pub struct AnnouncementQuery {
    /// Only this status
    pub status: Option<AnnouncementStatus>,
    /// Only this type
    #[serde(rename = "type")]
    pub kind: Option<AnnouncementType>,
}

/// Body of `PUT /v1/admin/announcements/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct AnnouncementStatusBody {
    /// New status
    pub status: AnnouncementStatus,
}

/// GET /v1/admin/announcements
pub async fn list_announcements(
    State(state): State<AppState>,
    admin: AdminCaller,
    Query(query): Query<AnnouncementQuery>,
) -> HandlerResult<Vec<announcement_entity::Model>> {
    let tenant = admin.tenant();
    let records = match (query.status, query.kind) {
        (Some(status), _) => announcement::announcements_by_status(&state.db, tenant, status).await?,
        (None, Some(kind)) => announcement::announcements_by_type(&state.db, tenant, kind).await?,
        (None, None) => announcement::list_announcements(&state.db, tenant).await?,
    };
    Ok(Json(records))
}

/// GET /v1/admin/announcements/{id}
pub async fn get_announcement(
    State(state): State<AppState>,
    admin: AdminCaller,
    Path(id): Path<String>,
) -> HandlerResult<announcement_entity::Model> {
    let record = announcement::get_announcement(&state.db, admin.tenant(), &id).await?;
    Ok(Json(found(record, "Anuncio no encontrado")?))
}

/// POST /v1/admin/announcements
pub async fn create_announcement(
    State(state): State<AppState>,
    admin: AdminCaller,
    Json(data): Json<NewAnnouncement>,
) -> CreatedResult<announcement_entity::Model> {
    let record = announcement::create_announcement(&state.db, &admin.actor, data).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// PUT /v1/admin/announcements/{id}
pub async fn update_announcement(
    State(state): State<AppState>,
    admin: AdminCaller,
    Path(id): Path<String>,
    Json(changes): Json<AnnouncementUpdate>,
) -> HandlerResult<announcement_entity::Model> {
    Ok(Json(announcement::update_announcement(&state.db, &admin.actor, &id, changes).await?))
}

/// PUT /v1/admin/announcements/{id}/status
pub async fn update_announcement_status(
    State(state): State<AppState>,
    admin: AdminCaller,
    Path(id): Path<String>,
    Json(body): Json<AnnouncementStatusBody>,
) -> HandlerResult<announcement_entity::Model> {
    Ok(Json(
        announcement::update_announcement_status(&state.db, &admin.actor, &id, body.status).await?,
    ))
}

/// DELETE /v1/admin/announcements/{id}
pub async fn delete_announcement(
    State(state): State<AppState>,
    admin: AdminCaller,
    Path(id): Path<String>,
) -> EmptyResult {
    announcement::delete_announcement(&state.db, &admin.actor, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Activities
// ---------------------------------------------------------------------------

/// Filters and paging of the audit log.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityQuery {
    /// Only this kind of action
    #[serde(rename = "type")]
    pub kind: Option<ActivityType>,
    /// Only this kind of record
    pub entity: Option<ActivityEntity>,
    /// Not before this instant
    pub start_date: Option<DateTime<Utc>>,
    /// Not after this instant
    pub end_date: Option<DateTime<Utc>>,
    /// Free-text search
    pub search: Option<String>,
    /// Page size, defaults to the configured page size
    pub limit: Option<u64>,
    /// Id of the last activity of the previous page
    pub cursor: Option<String>,
}

/// Query of the recent-activity widget.
#[derive(Debug, Default, Deserialize)]
pub struct RecentQuery {
    /// Number of entries
    pub limit: Option<u64>,
}

/// GET /v1/admin/activities
pub async fn list_activities(
    State(state): State<AppState>,
    admin: AdminCaller,
    Query(query): Query<ActivityQuery>,
) -> HandlerResult<ActivityPage> {
    let filter = ActivityFilter {
        kind: query.kind,
        entity: query.entity,
        start_date: query.start_date,
        end_date: query.end_date,
        search: query.search,
    };
    let limit = query.limit.unwrap_or(state.settings.activities.page_size);
    let page = activity::list_activities(&state.db, admin.tenant(), &filter, limit, query.cursor.as_deref().filter(|c| !c.is_empty())).await?;
    Ok(Json(page))
}

/// GET /v1/admin/activities/recent
pub async fn recent_activities(
    State(state): State<AppState>,
    admin: AdminCaller,
    Query(query): Query<RecentQuery>,
) -> HandlerResult<Vec<crate::entities::activity::Model>> {
    let limit = query.limit.unwrap_or(state.settings.activities.recent_limit);
    Ok(Json(activity::recent_activities(&state.db, admin.tenant(), limit).await?))
}

// ---------------------------------------------------------------------------
// Dashboard and reports
// ---------------------------------------------------------------------------

/// GET /v1/admin/dashboard
pub async fn dashboard(State(state): State<AppState>, admin: AdminCaller) -> HandlerResult<DashboardStats> {
    Ok(Json(reports::dashboard_stats(&state.db, admin.tenant()).await?))
}

/// GET /v1/admin/reports/summary
pub async fn report_summary(State(state): State<AppState>, admin: AdminCaller) -> HandlerResult<ReportSummary> {
    Ok(Json(reports::report_summary(&state.db, admin.tenant()).await?))
}

/// GET /v1/admin/reports/activity
pub async fn activity_metrics(State(state): State<AppState>, admin: AdminCaller) -> HandlerResult<ActivityMetrics> {
    Ok(Json(reports::activity_metrics(&state.db, admin.tenant()).await?))
}

/// GET /v1/admin/reports/activity-trend
pub async fn activity_trend(State(state): State<AppState>, admin: AdminCaller) -> HandlerResult<Vec<DailyCount>> {
    Ok(Json(reports::activity_trend(&state.db, admin.tenant()).await?))
}

/// GET /v1/admin/reports/enrollment
pub async fn enrollment_metrics(State(state): State<AppState>, admin: AdminCaller) -> HandlerResult<EnrollmentMetrics> {
    Ok(Json(reports::enrollment_metrics(&state.db, admin.tenant()).await?))
}

/// GET /v1/admin/reports/teachers
pub async fn teacher_metrics(State(state): State<AppState>, admin: AdminCaller) -> HandlerResult<TeacherMetrics> {
    Ok(Json(reports::teacher_metrics(&state.db, admin.tenant()).await?))
}
