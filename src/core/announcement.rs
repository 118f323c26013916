//! Announcement business logic - Tenant news plus the public feed.

use crate::{
    core::activity::{self, Actor},
    entities::{
        Announcement,
        activity::ActivityEntity,
        announcement::{self, AnnouncementStatus, AnnouncementType, Audience},
    },
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{QueryOrder, QuerySelect, Set, prelude::*};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

/// Number of announcements on the public landing page.
pub const PUBLIC_LIMIT: u64 = 3;

/// Data for a new announcement.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAnnouncement {
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: AnnouncementType,
    pub target_audience: Audience,
    pub status: AnnouncementStatus,
}

/// Partial update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub date: Option<NaiveDate>,
    #[serde(rename = "type")]
    pub kind: Option<AnnouncementType>,
    pub target_audience: Option<Audience>,
    pub status: Option<AnnouncementStatus>,
}

/// All announcements of a tenant, newest first.
pub async fn list_announcements<C>(db: &C, tenant_id: &str) -> Result<Vec<announcement::Model>>
where
    C: ConnectionTrait,
{
    Announcement::find()
        .filter(announcement::Column::TenantId.eq(tenant_id))
        .order_by_desc(announcement::Column::Date)
        .order_by_desc(announcement::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// A tenant's announcements in one publication state.
pub async fn announcements_by_status<C>(
    db: &C,
    tenant_id: &str,
    status: AnnouncementStatus,
) -> Result<Vec<announcement::Model>>
where
    C: ConnectionTrait,
{
    Announcement::find()
        .filter(announcement::Column::TenantId.eq(tenant_id))
        .filter(announcement::Column::Status.eq(status))
        .order_by_desc(announcement::Column::Date)
        .order_by_desc(announcement::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// A tenant's announcements of one type.
pub async fn announcements_by_type<C>(
    db: &C,
    tenant_id: &str,
    kind: AnnouncementType,
) -> Result<Vec<announcement::Model>>
where
    C: ConnectionTrait,
{
    Announcement::find()
        .filter(announcement::Column::TenantId.eq(tenant_id))
        .filter(announcement::Column::Kind.eq(kind))
        .order_by_desc(announcement::Column::Date)
        .order_by_desc(announcement::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Published announcements from every school, newest first.
///
/// `limit` of `None` returns all of them.
pub async fn published_announcements<C>(db: &C, limit: Option<u64>) -> Result<Vec<announcement::Model>>
where
    C: ConnectionTrait,
{
    Announcement::find()
        .filter(announcement::Column::Status.eq(AnnouncementStatus::Published))
        .order_by_desc(announcement::Column::Date)
        .order_by_desc(announcement::Column::CreatedAt)
        .limit(limit)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds an announcement of the tenant by id.
pub async fn get_announcement<C>(db: &C, tenant_id: &str, id: &str) -> Result<Option<announcement::Model>>
where
    C: ConnectionTrait,
{
    Announcement::find_by_id(id)
        .filter(announcement::Column::TenantId.eq(tenant_id))
        .one(db)
        .await
        .map_err(Into::into)
}

async fn require_announcement<C>(db: &C, tenant_id: &str, id: &str) -> Result<announcement::Model>
where
    C: ConnectionTrait,
{
    get_announcement(db, tenant_id, id)
        .await?
        .ok_or_else(|| Error::not_found("Anuncio no encontrado"))
}

/// Publishes (or drafts) an announcement for the actor's school.
pub async fn create_announcement<C>(db: &C, actor: &Actor, data: NewAnnouncement) -> Result<announcement::Model>
where
    C: ConnectionTrait,
{
    let title = data.title.trim().to_string();
    if title.is_empty() {
        return Err(Error::invalid("El título es obligatorio"));
    }

    let now = Utc::now();
    let created = announcement::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        tenant_id: Set(actor.tenant_id.clone()),
        title: Set(title),
        content: Set(data.content),
        excerpt: Set(data.excerpt),
        date: Set(data.date),
        kind: Set(data.kind),
        target_audience: Set(data.target_audience),
        status: Set(data.status),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;

    activity::log_create(
        db,
        actor,
        ActivityEntity::Announcement,
        &created.id,
        &created.title,
        json!({ "type": created.kind, "status": created.status }),
    )
    .await;
    Ok(created)
}

/// Applies a partial update.
pub async fn update_announcement<C>(
    db: &C,
    actor: &Actor,
    id: &str,
    changes: AnnouncementUpdate,
) -> Result<announcement::Model>
where
    C: ConnectionTrait,
{
    let existing = require_announcement(db, &actor.tenant_id, id).await?;
    let mut active: announcement::ActiveModel = existing.into();

    if let Some(title) = changes.title {
        let title = title.trim().to_string();
        if title.is_empty() {
            return Err(Error::invalid("El título es obligatorio"));
        }
        active.title = Set(title);
    }
    if let Some(content) = changes.content {
        active.content = Set(content);
    }
    if let Some(excerpt) = changes.excerpt {
        active.excerpt = Set(excerpt);
    }
    if let Some(date) = changes.date {
        active.date = Set(date);
    }
    if let Some(kind) = changes.kind {
        active.kind = Set(kind);
    }
    if let Some(audience) = changes.target_audience {
        active.target_audience = Set(audience);
    }
    if let Some(status) = changes.status {
        active.status = Set(status);
    }
    active.updated_at = Set(Utc::now());

    let updated = active.update(db).await?;
    activity::log_update(db, actor, ActivityEntity::Announcement, &updated.id, &updated.title, Value::Null).await;
    Ok(updated)
}

/// Moves an announcement between draft, published and archived.
pub async fn update_announcement_status<C>(
    db: &C,
    actor: &Actor,
    id: &str,
    status: AnnouncementStatus,
) -> Result<announcement::Model>
where
    C: ConnectionTrait,
{
    let existing = require_announcement(db, &actor.tenant_id, id).await?;
    let mut active: announcement::ActiveModel = existing.into();
    active.status = Set(status);
    active.updated_at = Set(Utc::now());
    let updated = active.update(db).await?;

    let new_status = match status {
        AnnouncementStatus::Published => "active",
        AnnouncementStatus::Draft => "draft",
        AnnouncementStatus::Archived => "archived",
    };
    activity::log_status_change(
        db,
        actor,
        ActivityEntity::Announcement,
        &updated.id,
        &updated.title,
        new_status,
        json!({ "status": status }),
    )
    .await;
    Ok(updated)
}

/// Removes an announcement.
pub async fn delete_announcement<C>(db: &C, actor: &Actor, id: &str) -> Result<()>
where
    C: ConnectionTrait,
{
    let existing = require_announcement(db, &actor.tenant_id, id).await?;
    Announcement::delete_by_id(existing.id.as_str()).exec(db).await?;
    activity::log_delete(db, actor, ActivityEntity::Announcement, &existing.id, &existing.title, Value::Null).await;
    Ok(())
}
