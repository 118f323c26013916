//! Parent endpoints. Parents reach records only through their own children,
//! matched by the parent email on the student record.

use super::{CreatedResult, HandlerResult, UploadQuery, UploadResponse, check_upload};
use crate::{
    api::{AppState, extract::ParentCaller},
    core::{
        absence_request::{self, NewAbsenceRequest},
        announcement,
        attendance::{self, DateRange},
        enrollment, grade, student,
    },
    entities::{
        absence_request as request_entity, announcement as announcement_entity, attendance as attendance_entity,
        grade as grade_entity, student as student_entity,
    },
    errors::{Error, Result},
    storage,
};
use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::NaiveDate;
use serde::Deserialize;

async fn own_child(state: &AppState, parent: &ParentCaller, student_id: &str) -> Result<student_entity::Model> {
    student::child_for_parent(&state.db, &parent.user.email, student_id).await
}

/// Optional class filter.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassFilter {
    pub class_id: Option<String>,
}

/// Optional class and date filters of a child's attendance.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceQuery {
    pub class_id: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// GET /v1/parent/children
pub async fn children(State(state): State<AppState>, parent: ParentCaller) -> HandlerResult<Vec<student_entity::Model>> {
    Ok(Json(student::children_for_parent(&state.db, &parent.user.email).await?))
}

/// GET /v1/parent/children/{id}
pub async fn child(
    State(state): State<AppState>,
    parent: ParentCaller,
    Path(id): Path<String>,
) -> HandlerResult<student_entity::Model> {
    Ok(Json(own_child(&state, &parent, &id).await?))
}

/// GET /v1/parent/children/{id}/grades
pub async fn child_grades(
    State(state): State<AppState>,
    parent: ParentCaller,
    Path(id): Path<String>,
    Query(filter): Query<ClassFilter>,
) -> HandlerResult<Vec<grade_entity::Model>> {
    let child = own_child(&state, &parent, &id).await?;
    Ok(Json(
        grade::grades_by_student(&state.db, &child.tenant_id, &child.id, filter.class_id.as_deref()).await?,
    ))
}

/// GET /v1/parent/children/{id}/attendance
pub async fn child_attendance(
    State(state): State<AppState>,
    parent: ParentCaller,
    Path(id): Path<String>,
    Query(query): Query<AttendanceQuery>,
) -> HandlerResult<Vec<attendance_entity::Model>> {
    let child = own_child(&state, &parent, &id).await?;
    let range = DateRange {
        start_date: query.start_date,
        end_date: query.end_date,
    };
    Ok(Json(
        attendance::attendance_by_student(&state.db, &child.tenant_id, &child.id, query.class_id.as_deref(), range)
            .await?,
    ))
}

/// GET /v1/parent/children/{id}/absence-requests
pub async fn child_requests(
    State(state): State<AppState>,
    parent: ParentCaller,
    Path(id): Path<String>,
) -> HandlerResult<Vec<request_entity::Model>> {
    let child = own_child(&state, &parent, &id).await?;
    Ok(Json(
        absence_request::requests_by_student(&state.db, &child.tenant_id, &child.id).await?,
    ))
}

/// POST /v1/parent/absence-requests
pub async fn create_request(
    State(state): State<AppState>,
    parent: ParentCaller,
    Json(data): Json<NewAbsenceRequest>,
) -> CreatedResult<request_entity::Model> {
    let child = own_child(&state, &parent, &data.student_id).await?;
    if !enrollment::is_student_enrolled(&state.db, &child.tenant_id, &data.class_id, &child.id).await? {
        return Err(Error::invalid("El estudiante no está inscrito en esta clase").into());
    }
    let actor = parent.actor_in(&child.tenant_id);
    let request = absence_request::create_request(&state.db, &actor, data).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

/// PUT /v1/parent/children/{id}/absence-requests/{request_id}/attachment?fileName=...
///
/// The request body is the raw file.
pub async fn upload_attachment(
    State(state): State<AppState>,
    parent: ParentCaller,
    Path((id, request_id)): Path<(String, String)>,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> HandlerResult<UploadResponse> {
    check_upload(&body, state.settings.storage.max_upload_bytes)?;
    let child = own_child(&state, &parent, &id).await?;
    let existing = absence_request::require_request(&state.db, &child.tenant_id, &request_id).await?;
    if existing.student_id != child.id || existing.submitted_by != parent.user.id {
        return Err(Error::permission_denied("Solo quien envió la solicitud puede adjuntar archivos").into());
    }

    let path = storage::attachment_path(&child.tenant_id, &request_id, &query.file_name)?;
    state.storage.put(&path, &body).await?;
    absence_request::set_attachment(&state.db, &child.tenant_id, &request_id, &parent.user.id, &path).await?;
    Ok(Json(UploadResponse { path }))
}

/// GET /v1/parent/announcements
pub async fn announcements(
    State(state): State<AppState>,
    _parent: ParentCaller,
) -> HandlerResult<Vec<announcement_entity::Model>> {
    Ok(Json(announcement::published_announcements(&state.db, None).await?))
}
