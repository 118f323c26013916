//! Absence request business logic - Parents ask, teachers review.

use crate::{
    core::activity::{self, Actor},
    entities::{
        AbsenceRequest,
        absence_request::{self, RequestStatus},
        activity::ActivityEntity,
    },
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{PaginatorTrait, QueryOrder, Set, prelude::*};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

/// Data a parent submits.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAbsenceRequest {
    pub student_id: String,
    pub teacher_id: String,
    pub class_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    #[serde(default)]
    pub attachment_url: Option<String>,
}

/// A reviewer's decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// Approve the request
    Approve,
    /// Reject the request
    Reject,
}

fn entity_name(request: &absence_request::Model) -> String {
    format!("{} - {}", request.start_date, request.end_date)
}

/// Requests assigned to a teacher, newest first.
pub async fn requests_by_teacher<C>(db: &C, tenant_id: &str, teacher_id: &str) -> Result<Vec<absence_request::Model>>
where
    C: ConnectionTrait,
{
    AbsenceRequest::find()
        .filter(absence_request::Column::TenantId.eq(tenant_id))
        .filter(absence_request::Column::TeacherId.eq(teacher_id))
        .order_by_desc(absence_request::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Requests for a student, newest first.
pub async fn requests_by_student<C>(db: &C, tenant_id: &str, student_id: &str) -> Result<Vec<absence_request::Model>>
where
    C: ConnectionTrait,
{
    AbsenceRequest::find()
        .filter(absence_request::Column::TenantId.eq(tenant_id))
        .filter(absence_request::Column::StudentId.eq(student_id))
        .order_by_desc(absence_request::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// A teacher's requests in one state.
pub async fn requests_by_status<C>(
    db: &C,
    tenant_id: &str,
    teacher_id: &str,
    status: RequestStatus,
) -> Result<Vec<absence_request::Model>>
where
    C: ConnectionTrait,
{
    AbsenceRequest::find()
        .filter(absence_request::Column::TenantId.eq(tenant_id))
        .filter(absence_request::Column::TeacherId.eq(teacher_id))
        .filter(absence_request::Column::Status.eq(status))
        .order_by_desc(absence_request::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Number of requests awaiting a teacher's review.
pub async fn pending_count<C>(db: &C, tenant_id: &str, teacher_id: &str) -> Result<u64>
where
    C: ConnectionTrait,
{
    AbsenceRequest::find()
        .filter(absence_request::Column::TenantId.eq(tenant_id))
        .filter(absence_request::Column::TeacherId.eq(teacher_id))
        .filter(absence_request::Column::Status.eq(RequestStatus::Pending))
        .count(db)
        .await
        .map_err(Into::into)
}

/// Finds a request of the tenant by id.
pub async fn get_request<C>(db: &C, tenant_id: &str, id: &str) -> Result<Option<absence_request::Model>>
where
    C: ConnectionTrait,
{
    AbsenceRequest::find_by_id(id)
        .filter(absence_request::Column::TenantId.eq(tenant_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a request of the tenant, or `not-found`.
pub async fn require_request<C>(db: &C, tenant_id: &str, id: &str) -> Result<absence_request::Model>
where
    C: ConnectionTrait,
{
    get_request(db, tenant_id, id)
        .await?
        .ok_or_else(|| Error::not_found("Solicitud de ausencia no encontrada"))
}

/// Submits a pending request on behalf of the acting parent.
pub async fn create_request<C>(db: &C, actor: &Actor, data: NewAbsenceRequest) -> Result<absence_request::Model>
where
    C: ConnectionTrait,
{
    if data.start_date > data.end_date {
        return Err(Error::invalid("La fecha de inicio no puede ser posterior a la fecha de fin"));
    }
    let reason = data.reason.trim().to_string();
    if reason.is_empty() {
        return Err(Error::invalid("El motivo es obligatorio"));
    }

    let now = Utc::now();
    let request = absence_request::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        tenant_id: Set(actor.tenant_id.clone()),
        student_id: Set(data.student_id),
        teacher_id: Set(data.teacher_id),
        class_id: Set(data.class_id),
        start_date: Set(data.start_date),
        end_date: Set(data.end_date),
        reason: Set(reason),
        attachment_url: Set(data.attachment_url),
        status: Set(RequestStatus::Pending),
        reviewed_by: Set(None),
        reviewed_at: Set(None),
        review_notes: Set(None),
        submitted_by: Set(actor.user_id.clone()),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;

    activity::log_create(
        db,
        actor,
        ActivityEntity::AbsenceRequest,
        &request.id,
        &entity_name(&request),
        json!({ "studentId": request.student_id, "classId": request.class_id }),
    )
    .await;
    Ok(request)
}

/// Stores the attachment path of a request submitted by `submitted_by`.
pub async fn set_attachment<C>(db: &C, tenant_id: &str, id: &str, submitted_by: &str, path: &str) -> Result<absence_request::Model>
where
    C: ConnectionTrait,
{
    let existing = require_request(db, tenant_id, id).await?;
    if existing.submitted_by != submitted_by {
        return Err(Error::permission_denied("Solo quien envió la solicitud puede adjuntar archivos"));
    }
    let mut active: absence_request::ActiveModel = existing.into();
    active.attachment_url = Set(Some(path.to_string()));
    active.updated_at = Set(Utc::now());
    active.update(db).await.map_err(Into::into)
}

/// Approves or rejects a request as the acting reviewer.
pub async fn review_request<C>(
    db: &C,
    actor: &Actor,
    id: &str,
    decision: Decision,
    notes: Option<String>,
) -> Result<absence_request::Model>
where
    C: ConnectionTrait,
{
    let existing = require_request(db, &actor.tenant_id, id).await?;
    let status = match decision {
        Decision::Approve => RequestStatus::Approved,
        Decision::Reject => RequestStatus::Rejected,
    };

    let now = Utc::now();
    let mut active: absence_request::ActiveModel = existing.into();
    active.status = Set(status);
    active.reviewed_by = Set(Some(actor.user_id.clone()));
    active.reviewed_at = Set(Some(now));
    active.review_notes = Set(notes.filter(|n| !n.trim().is_empty()));
    active.updated_at = Set(now);
    let request = active.update(db).await?;

    let new_status = match status {
        RequestStatus::Approved => "approved",
        RequestStatus::Rejected => "rejected",
        RequestStatus::Pending => "pending",
    };
    activity::log_status_change(
        db,
        actor,
        ActivityEntity::AbsenceRequest,
        &request.id,
        &entity_name(&request),
        new_status,
        json!({ "studentId": request.student_id }),
    )
    .await;
    Ok(request)
}

/// Removes a request.
pub async fn delete_request<C>(db: &C, actor: &Actor, id: &str) -> Result<()>
where
    C: ConnectionTrait,
{
    let existing = require_request(db, &actor.tenant_id, id).await?;
    AbsenceRequest::delete_by_id(existing.id.as_str()).exec(db).await?;
    activity::log_delete(db, actor, ActivityEntity::AbsenceRequest, &existing.id, &entity_name(&existing), Value::Null).await;
    Ok(())
}
