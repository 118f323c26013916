//! Activity log business logic - The tenant-wide audit trail.
//!
//! Every mutating service records what happened through [`log_activity`] or one
//! of the `log_create`/`log_update`/`log_delete`/`log_status_change` helpers.
//! Logging is best effort: a failed write is reported with `tracing::warn!`
//! and never propagated to the caller.

use crate::{
    entities::{
        Activity,
        activity::{self, ActivityEntity, ActivityType},
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{Condition, QueryOrder, QuerySelect, Set, prelude::*};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::warn;

/// The user performing an action, as recorded in the audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    /// Acting user id
    pub user_id: String,
    /// Acting user's display name
    pub name: String,
    /// Acting user's email
    pub email: String,
    /// Tenant the action is scoped to
    pub tenant_id: String,
}

/// One entry to append to the audit log.
#[derive(Debug, Clone)]
pub struct ActivityRecord {
    /// Kind of action
    pub kind: ActivityType,
    /// Kind of record touched
    pub entity: ActivityEntity,
    /// Id of the record touched
    pub entity_id: String,
    /// Display name of the record touched
    pub entity_name: String,
    /// Human-readable description
    pub description: String,
    /// Extra structured details, a JSON object
    pub metadata: Value,
}

/// Filters for [`list_activities`]. All fields are optional and combine with AND.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityFilter {
    /// Only this kind of action
    #[serde(rename = "type")]
    pub kind: Option<ActivityType>,
    /// Only this kind of record
    pub entity: Option<ActivityEntity>,
    /// Not before this instant
    pub start_date: Option<DateTime<Utc>>,
    /// Not after this instant
    pub end_date: Option<DateTime<Utc>>,
    /// Substring of the description, record name or user name
    pub search: Option<String>,
}

/// A page of activities, newest first.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityPage {
    /// Entries on this page
    pub activities: Vec<activity::Model>,
    /// Pass as `cursor` to fetch the next page; `None` on the last page
    pub next_cursor: Option<String>,
}

/// Appends an entry to the audit log and returns it.
///
/// Most callers want [`log_activity`], which never fails.
pub async fn record_activity<C>(db: &C, actor: &Actor, record: ActivityRecord) -> Result<activity::Model>
where
    C: ConnectionTrait,
{
    let metadata = match record.metadata {
        Value::Null => Value::Object(Map::new()),
        other => other,
    };

    let entry = activity::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        tenant_id: Set(actor.tenant_id.clone()),
        user_id: Set(actor.user_id.clone()),
        user_name: Set(actor.name.clone()),
        user_email: Set(actor.email.clone()),
        kind: Set(record.kind),
        entity: Set(record.entity),
        entity_id: Set(record.entity_id),
        entity_name: Set(record.entity_name),
        description: Set(record.description),
        timestamp: Set(Utc::now()),
        metadata: Set(metadata),
    };

    entry.insert(db).await.map_err(Into::into)
}

/// Appends an entry to the audit log, swallowing any failure.
pub async fn log_activity<C>(db: &C, actor: &Actor, record: ActivityRecord)
where
    C: ConnectionTrait,
{
    let kind = record.kind;
    let entity = record.entity;
    if let Err(e) = record_activity(db, actor, record).await {
        warn!(
            tenant = %actor.tenant_id,
            ?kind,
            ?entity,
            "Failed to log activity: {}",
            e
        );
    }
}

fn create_description(entity: ActivityEntity, name: &str) -> String {
    match entity {
        ActivityEntity::Student => format!("Inscribió al estudiante \"{name}\""),
        ActivityEntity::Teacher => format!("Agregó al profesor \"{name}\""),
        ActivityEntity::Class => format!("Creó la clase \"{name}\""),
        ActivityEntity::GradeLevel => format!("Creó el nivel académico \"{name}\""),
        ActivityEntity::Subject => format!("Creó la asignatura \"{name}\""),
        ActivityEntity::User => format!("Creó el usuario \"{name}\""),
        ActivityEntity::Announcement => format!("Creó el anuncio \"{name}\""),
        ActivityEntity::Enrollment => format!("Inscripción: {name}"),
        ActivityEntity::Grade => format!("Publicó calificación \"{name}\""),
        ActivityEntity::Attendance => format!("Registró asistencia \"{name}\""),
        ActivityEntity::AbsenceRequest => format!("Creó solicitud de ausencia \"{name}\""),
        ActivityEntity::Finance => format!("Registró el movimiento financiero \"{name}\""),
    }
}

fn update_description(entity: ActivityEntity, name: &str) -> String {
    match entity {
        ActivityEntity::Student => format!("Actualizó los datos del estudiante \"{name}\""),
        ActivityEntity::Teacher => format!("Actualizó los datos del profesor \"{name}\""),
        ActivityEntity::Enrollment => format!("Actualizó inscripción: {name}"),
        ActivityEntity::Grade => format!("Actualizó calificación \"{name}\""),
        ActivityEntity::Attendance => format!("Actualizó asistencia \"{name}\""),
        ActivityEntity::AbsenceRequest => format!("Actualizó solicitud de ausencia \"{name}\""),
        other => format!("Actualizó {} \"{name}\"", noun(other)),
    }
}

fn delete_description(entity: ActivityEntity, name: &str) -> String {
    match entity {
        ActivityEntity::Enrollment => format!("Desinscripción: {name}"),
        ActivityEntity::Grade => format!("Eliminó calificación \"{name}\""),
        ActivityEntity::Attendance => format!("Eliminó asistencia \"{name}\""),
        ActivityEntity::AbsenceRequest => format!("Eliminó solicitud de ausencia \"{name}\""),
        other => format!("Eliminó {} \"{name}\"", noun(other)),
    }
}

fn status_description(entity: ActivityEntity, name: &str, new_status: &str) -> String {
    if entity == ActivityEntity::AbsenceRequest {
        let verb = match new_status {
            "approved" => "Aprobó",
            "rejected" => "Rechazó",
            _ => "Actualizó",
        };
        return format!("{verb} solicitud de ausencia \"{name}\"");
    }

    let verb = if new_status == "active" {
        "Activó"
    } else {
        "Desactivó"
    };
    match entity {
        ActivityEntity::Enrollment => format!("{verb} inscripción: {name}"),
        ActivityEntity::Grade => format!("{verb} calificación \"{name}\""),
        ActivityEntity::Attendance => format!("{verb} asistencia \"{name}\""),
        other => format!("{verb} {} \"{name}\"", noun(other)),
    }
}

/// Noun phrase (with article) used in generic descriptions.
const fn noun(entity: ActivityEntity) -> &'static str {
    match entity {
        ActivityEntity::Student => "al estudiante",
        ActivityEntity::Teacher => "al profesor",
        ActivityEntity::Class => "la clase",
        ActivityEntity::GradeLevel => "el nivel académico",
        ActivityEntity::Subject => "la asignatura",
        ActivityEntity::User => "el usuario",
        ActivityEntity::Announcement => "el anuncio",
        ActivityEntity::Enrollment => "la inscripción",
        ActivityEntity::Grade => "la calificación",
        ActivityEntity::Attendance => "la asistencia",
        ActivityEntity::AbsenceRequest => "la solicitud de ausencia",
        ActivityEntity::Finance => "el movimiento financiero",
    }
}

/// Logs the creation of a record.
pub async fn log_create<C>(
    db: &C,
    actor: &Actor,
    entity: ActivityEntity,
    entity_id: &str,
    entity_name: &str,
    metadata: Value,
) where
    C: ConnectionTrait,
{
    let record = ActivityRecord {
        kind: ActivityType::Create,
        entity,
        entity_id: entity_id.to_string(),
        entity_name: entity_name.to_string(),
        description: create_description(entity, entity_name),
        metadata,
    };
    log_activity(db, actor, record).await;
}

/// Logs a modification of a record.
pub async fn log_update<C>(
    db: &C,
    actor: &Actor,
    entity: ActivityEntity,
    entity_id: &str,
    entity_name: &str,
    metadata: Value,
) where
    C: ConnectionTrait,
{
    let record = ActivityRecord {
        kind: ActivityType::Update,
        entity,
        entity_id: entity_id.to_string(),
        entity_name: entity_name.to_string(),
        description: update_description(entity, entity_name),
        metadata,
    };
    log_activity(db, actor, record).await;
}

/// Logs the removal of a record.
pub async fn log_delete<C>(
    db: &C,
    actor: &Actor,
    entity: ActivityEntity,
    entity_id: &str,
    entity_name: &str,
    metadata: Value,
) where
    C: ConnectionTrait,
{
    let record = ActivityRecord {
        kind: ActivityType::Delete,
        entity,
        entity_id: entity_id.to_string(),
        entity_name: entity_name.to_string(),
        description: delete_description(entity, entity_name),
        metadata,
    };
    log_activity(db, actor, record).await;
}

/// Logs a status transition. `new_status` is merged into the metadata.
pub async fn log_status_change<C>(
    db: &C,
    actor: &Actor,
    entity: ActivityEntity,
    entity_id: &str,
    entity_name: &str,
    new_status: &str,
    metadata: Value,
) where
    C: ConnectionTrait,
{
    let mut metadata = match metadata {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    metadata.insert("newStatus".to_string(), json!(new_status));

    let record = ActivityRecord {
        kind: ActivityType::StatusChange,
        entity,
        entity_id: entity_id.to_string(),
        entity_name: entity_name.to_string(),
        description: status_description(entity, entity_name, new_status),
        metadata: Value::Object(metadata),
    };
    log_activity(db, actor, record).await;
}

/// Lists a tenant's activities, newest first, one page at a time.
///
/// # Arguments
/// * `cursor` - Id of the last activity of the previous page; an id that is
///   not one of the tenant's activities gives `invalid-argument`
/// * `limit` - Page size
pub async fn list_activities<C>(
    db: &C,
    tenant_id: &str,
    filter: &ActivityFilter,
    limit: u64,
    cursor: Option<&str>,
) -> Result<ActivityPage>
where
    C: ConnectionTrait,
{
    let mut query = Activity::find().filter(activity::Column::TenantId.eq(tenant_id));

    if let Some(kind) = filter.kind {
        query = query.filter(activity::Column::Kind.eq(kind));
    }
    if let Some(entity) = filter.entity {
        query = query.filter(activity::Column::Entity.eq(entity));
    }
    if let Some(start) = filter.start_date {
        query = query.filter(activity::Column::Timestamp.gte(start));
    }
    if let Some(end) = filter.end_date {
        query = query.filter(activity::Column::Timestamp.lte(end));
    }
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        query = query.filter(
            Condition::any()
                .add(activity::Column::Description.contains(search))
                .add(activity::Column::EntityName.contains(search))
                .add(activity::Column::UserName.contains(search)),
        );
    }

    if let Some(cursor_id) = cursor {
        let anchor = Activity::find_by_id(cursor_id)
            .filter(activity::Column::TenantId.eq(tenant_id))
            .one(db)
            .await?
            .ok_or_else(|| Error::invalid("Cursor de paginación inválido"))?;
        query = query.filter(
            Condition::any()
                .add(activity::Column::Timestamp.lt(anchor.timestamp))
                .add(
                    Condition::all()
                        .add(activity::Column::Timestamp.eq(anchor.timestamp))
                        .add(activity::Column::Id.lt(anchor.id)),
                ),
        );
    }

    let activities = query
        .order_by_desc(activity::Column::Timestamp)
        .order_by_desc(activity::Column::Id)
        .limit(limit)
        .all(db)
        .await?;

    let next_cursor = if limit > 0 && activities.len() as u64 == limit {
        activities.last().map(|a| a.id.clone())
    } else {
        None
    };

    Ok(ActivityPage {
        activities,
        next_cursor,
    })
}

/// The most recent activities of a tenant.
pub async fn recent_activities<C>(db: &C, tenant_id: &str, limit: u64) -> Result<Vec<activity::Model>>
where
    C: ConnectionTrait,
{
    Activity::find()
        .filter(activity::Column::TenantId.eq(tenant_id))
        .order_by_desc(activity::Column::Timestamp)
        .order_by_desc(activity::Column::Id)
        .limit(limit)
        .all(db)
        .await
        .map_err(Into::into)
}
