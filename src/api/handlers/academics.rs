//! Admin endpoints for the academic structure: classes, enrollments,
//! subjects and grade levels.

use super::{CreatedResult, EmptyResult, HandlerResult, found};
use crate::{
    api::{AppState, extract::AdminCaller},
    core::{
        class::{self, ClassUpdate, NewClass},
        enrollment,
        grade_level::{self, GradeLevelUpdate, NewGradeLevel},
        subject::{self, NewSubject, SubjectUpdate},
    },
    entities::{
        class::{self as class_entity, ClassStatus},
        enrollment as enrollment_entity,
        grade_level::{self as grade_level_entity, Stage},
        subject as subject_entity,
    },
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Classes
// ---------------------------------------------------------------------------

/// Optional filters of the class list. The first one present wins.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassQuery {
    pub status: Option<ClassStatus>,
    pub grade_level_id: Option<String>,
    pub subject_id: Option<String>,
    pub teacher_id: Option<String>,
}

/// Body of `PUT /v1/admin/classes/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct ClassStatusBody {
    pub status: ClassStatus,
}

/// Body of `PUT /v1/admin/classes/{id}/teacher`. A null teacher unassigns.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignTeacherBody {
    #[serde(default)]
    pub teacher_id: Option<String>,
}

/// Seat usage of a class.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Capacity {
    pub enrolled: u64,
    pub is_full: bool,
    pub percentage: u32,
}

/// GET /v1/admin/classes
pub async fn list_classes(
    State(state): State<AppState>,
    admin: AdminCaller,
    Query(query): Query<ClassQuery>,
) -> HandlerResult<Vec<class_entity::Model>> {
    let tenant = admin.tenant();
    let db = &state.db;
    let classes = if let Some(status) = query.status {
        class::classes_by_status(db, tenant, status).await?
    } else if let Some(id) = query.grade_level_id {
        class::classes_by_grade_level(db, tenant, &id).await?
    } else if let Some(id) = query.subject_id {
        class::classes_by_subject(db, tenant, &id).await?
    } else if let Some(id) = query.teacher_id {
        class::classes_by_teacher(db, tenant, &id).await?
    } else {
        class::list_classes(db, tenant).await?
    };
    Ok(Json(classes))
}

/// GET /v1/admin/classes/{id}
pub async fn get_class(
    State(state): State<AppState>,
    admin: AdminCaller,
    Path(id): Path<String>,
) -> HandlerResult<class_entity::Model> {
    let record = class::get_class(&state.db, admin.tenant(), &id).await?;
    Ok(Json(found(record, "Clase no encontrada")?))
}

/// POST /v1/admin/classes
pub async fn create_class(
    State(state): State<AppState>,
    admin: AdminCaller,
    Json(data): Json<NewClass>,
) -> CreatedResult<class_entity::Model> {
    let record = class::create_class(&state.db, &admin.actor, data).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// PUT /v1/admin/classes/{id}
pub async fn update_class(
    State(state): State<AppState>,
    admin: AdminCaller,
    Path(id): Path<String>,
    Json(changes): Json<ClassUpdate>,
) -> HandlerResult<class_entity::Model> {
    Ok(Json(class::update_class(&state.db, &admin.actor, &id, changes).await?))
}

/// PUT /v1/admin/classes/{id}/status
pub async fn update_class_status(
    State(state): State<AppState>,
    admin: AdminCaller,
    Path(id): Path<String>,
    Json(body): Json<ClassStatusBody>,
) -> HandlerResult<class_entity::Model> {
    Ok(Json(class::update_class_status(&state.db, &admin.actor, &id, body.status).await?))
}

/// PUT /v1/admin/classes/{id}/teacher
pub async fn assign_teacher(
    State(state): State<AppState>,
    admin: AdminCaller,
    Path(id): Path<String>,
    Json(body): Json<AssignTeacherBody>,
) -> HandlerResult<class_entity::Model> {
    Ok(Json(class::assign_teacher(&state.db, &admin.actor, &id, body.teacher_id).await?))
}

/// DELETE /v1/admin/classes/{id}
pub async fn delete_class(
    State(state): State<AppState>,
    admin: AdminCaller,
    Path(id): Path<String>,
) -> EmptyResult {
    class::delete_class(&state.db, &admin.actor, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/admin/classes/{id}/capacity
pub async fn class_capacity(
    State(state): State<AppState>,
    admin: AdminCaller,
    Path(id): Path<String>,
) -> HandlerResult<Capacity> {
    let tenant = admin.tenant();
    Ok(Json(Capacity {
        enrolled: enrollment::enrollment_count(&state.db, tenant, &id).await?,
        is_full: enrollment::is_class_full(&state.db, tenant, &id).await?,
        percentage: enrollment::capacity_percentage(&state.db, tenant, &id).await?,
    }))
}

// ---------------------------------------------------------------------------
// Enrollments
// ---------------------------------------------------------------------------

/// Body of `POST /v1/admin/classes/{id}/enrollments`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollBody {
    pub student_id: String,
}

/// GET /v1/admin/classes/{id}/enrollments
pub async fn class_enrollments(
    State(state): State<AppState>,
    admin: AdminCaller,
    Path(id): Path<String>,
) -> HandlerResult<Vec<enrollment_entity::Model>> {
    Ok(Json(enrollment::class_enrollments(&state.db, admin.tenant(), &id).await?))
}

/// POST /v1/admin/classes/{id}/enrollments
pub async fn enroll_student(
    State(state): State<AppState>,
    admin: AdminCaller,
    Path(id): Path<String>,
    Json(body): Json<EnrollBody>,
) -> CreatedResult<enrollment_entity::Model> {
    let record = enrollment::enroll_student(&state.db, &admin.actor, &id, &body.student_id).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /v1/admin/students/{id}/enrollments
pub async fn student_enrollments(
    State(state): State<AppState>,
    admin: AdminCaller,
    Path(id): Path<String>,
) -> HandlerResult<Vec<enrollment_entity::Model>> {
    Ok(Json(enrollment::student_enrollments(&state.db, admin.tenant(), &id).await?))
}

/// DELETE /v1/admin/enrollments/{id}
pub async fn unenroll(
    State(state): State<AppState>,
    admin: AdminCaller,
    Path(id): Path<String>,
) -> EmptyResult {
    enrollment::unenroll(&state.db, &admin.actor, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Subjects
// ---------------------------------------------------------------------------

/// Optional filters of the subject list.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectQuery {
    #[serde(default)]
    pub active: bool,
    pub grade_level_id: Option<String>,
}

/// Query of the code availability check.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeQuery {
    pub code: String,
    pub exclude_id: Option<String>,
}

/// Result of the code availability check.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeAvailability {
    pub is_unique: bool,
}

/// GET /v1/admin/subjects
pub async fn list_subjects(
    State(state): State<AppState>,
    admin: AdminCaller,
    Query(query): Query<SubjectQuery>,
) -> HandlerResult<Vec<subject_entity::Model>> {
    let tenant = admin.tenant();
    let subjects = match (query.grade_level_id, query.active) {
        (Some(id), _) => subject::subjects_by_grade_level(&state.db, tenant, &id).await?,
        (None, true) => subject::active_subjects(&state.db, tenant).await?,
        (None, false) => subject::list_subjects(&state.db, tenant).await?,
    };
    Ok(Json(subjects))
}

/// GET /v1/admin/subjects/code-available?code=...&excludeId=...
pub async fn subject_code_available(
    State(state): State<AppState>,
    admin: AdminCaller,
    Query(query): Query<CodeQuery>,
) -> HandlerResult<CodeAvailability> {
    let is_unique = subject::is_code_unique(&state.db, admin.tenant(), &query.code, query.exclude_id.as_deref()).await?;
    Ok(Json(CodeAvailability { is_unique }))
}

/// GET /v1/admin/subjects/{id}
pub async fn get_subject(
    State(state): State<AppState>,
    admin: AdminCaller,
    Path(id): Path<String>,
) -> HandlerResult<subject_entity::Model> {
    let record = subject::get_subject(&state.db, admin.tenant(), &id).await?;
    Ok(Json(found(record, "Materia no encontrada")?))
}

/// POST /v1/admin/subjects
pub async fn create_subject(
    State(state): State<AppState>,
    admin: AdminCaller,
    Json(data): Json<NewSubject>,
) -> CreatedResult<subject_entity::Model> {
    let record = subject::create_subject(&state.db, &admin.actor, data).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// PUT /v1/admin/subjects/{id}
pub async fn update_subject(
    State(state): State<AppState>,
    admin: AdminCaller,
    Path(id): Path<String>,
    Json(changes): Json<SubjectUpdate>,
) -> HandlerResult<subject_entity::Model> {
    Ok(Json(subject::update_subject(&state.db, &admin.actor, &id, changes).await?))
}

/// POST /v1/admin/subjects/{id}/toggle
pub async fn toggle_subject(
    State(state): State<AppState>,
    admin: AdminCaller,
    Path(id): Path<String>,
) -> HandlerResult<subject_entity::Model> {
    Ok(Json(subject::toggle_subject(&state.db, &admin.actor, &id).await?))
}

/// DELETE /v1/admin/subjects/{id}
pub async fn delete_subject(
    State(state): State<AppState>,
    admin: AdminCaller,
    Path(id): Path<String>,
) -> EmptyResult {
    subject::delete_subject(&state.db, &admin.actor, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Grade levels
// ---------------------------------------------------------------------------

/// Optional filters of the grade level list.
#[derive(Debug, Default, Deserialize)]
pub struct GradeLevelQuery {
    #[serde(default)]
    pub active: bool,
    pub stage: Option<Stage>,
}

/// GET /v1/admin/grade-levels
pub async fn list_grade_levels(
    State(state): State<AppState>,
    admin: AdminCaller,
    Query(query): Query<GradeLevelQuery>,
) -> HandlerResult<Vec<grade_level_entity::Model>> {
    let tenant = admin.tenant();
    let levels = match (query.stage, query.active) {
        (Some(stage), _) => grade_level::grade_levels_by_stage(&state.db, tenant, stage).await?,
        (None, true) => grade_level::active_grade_levels(&state.db, tenant).await?,
        (None, false) => grade_level::list_grade_levels(&state.db, tenant).await?,
    };
    Ok(Json(levels))
}

/// GET /v1/admin/grade-levels/{id}
pub async fn get_grade_level(
    State(state): State<AppState>,
    admin: AdminCaller,
    Path(id): Path<String>,
) -> HandlerResult<grade_level_entity::Model> {
    let record = grade_level::get_grade_level(&state.db, admin.tenant(), &id).await?;
    Ok(Json(found(record, "Nivel no encontrado")?))
}

/// POST /v1/admin/grade-levels
pub async fn create_grade_level(
    State(state): State<AppState>,
    admin: AdminCaller,
    Json(data): Json<NewGradeLevel>,
) -> CreatedResult<grade_level_entity::Model> {
    let record = grade_level::create_grade_level(&state.db, &admin.actor, data).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// PUT /v1/admin/grade-levels/{id}
pub async fn update_grade_level(
    State(state): State<AppState>,
    admin: AdminCaller,
    Path(id): Path<String>,
    Json(changes): Json<GradeLevelUpdate>,
) -> HandlerResult<grade_level_entity::Model> {
    Ok(Json(grade_level::update_grade_level(&state.db, &admin.actor, &id, changes).await?))
}

/// POST /v1/admin/grade-levels/{id}/toggle
pub async fn toggle_grade_level(
    State(state): State<AppState>,
    admin: AdminCaller,
    Path(id): Path<String>,
) -> HandlerResult<grade_level_entity::Model> {
    Ok(Json(grade_level::toggle_grade_level(&state.db, &admin.actor, &id).await?))
}

/// DELETE /v1/admin/grade-levels/{id}
pub async fn delete_grade_level(
    State(state): State<AppState>,
    admin: AdminCaller,
    Path(id): Path<String>,
) -> EmptyResult {
    grade_level::delete_grade_level(&state.db, &admin.actor, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
