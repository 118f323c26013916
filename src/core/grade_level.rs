//! Grade level business logic.

use crate::{
    core::activity::{self, Actor},
    entities::{GradeLevel, activity::ActivityEntity, grade_level::{self, Stage}},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

/// Data needed to create a grade level.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGradeLevel {
    pub name: String,
    pub level: i32,
    pub stage: Stage,
    pub order: i32,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

const fn default_active() -> bool {
    true
}

/// Partial update of a grade level.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeLevelUpdate {
    pub name: Option<String>,
    pub level: Option<i32>,
    pub stage: Option<Stage>,
    pub order: Option<i32>,
    pub is_active: Option<bool>,
}

/// All grade levels of a tenant in display order.
pub async fn list_grade_levels<C>(db: &C, tenant_id: &str) -> Result<Vec<grade_level::Model>>
where
    C: ConnectionTrait,
{
    GradeLevel::find()
        .filter(grade_level::Column::TenantId.eq(tenant_id))
        .order_by_asc(grade_level::Column::Order)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Grade levels in use, in display order.
pub async fn active_grade_levels<C>(db: &C, tenant_id: &str) -> Result<Vec<grade_level::Model>>
where
    C: ConnectionTrait,
{
    GradeLevel::find()
        .filter(grade_level::Column::TenantId.eq(tenant_id))
        .filter(grade_level::Column::IsActive.eq(true))
        .order_by_asc(grade_level::Column::Order)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Grade levels of one stage, in display order.
pub async fn grade_levels_by_stage<C>(db: &C, tenant_id: &str, stage: Stage) -> Result<Vec<grade_level::Model>>
where
    C: ConnectionTrait,
{
    GradeLevel::find()
        .filter(grade_level::Column::TenantId.eq(tenant_id))
        .filter(grade_level::Column::Stage.eq(stage))
        .order_by_asc(grade_level::Column::Order)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a grade level of the tenant by id.
pub async fn get_grade_level<C>(db: &C, tenant_id: &str, id: &str) -> Result<Option<grade_level::Model>>
where
    C: ConnectionTrait,
{
    GradeLevel::find_by_id(id)
        .filter(grade_level::Column::TenantId.eq(tenant_id))
        .one(db)
        .await
        .map_err(Into::into)
}

async fn require_grade_level<C>(db: &C, tenant_id: &str, id: &str) -> Result<grade_level::Model>
where
    C: ConnectionTrait,
{
    get_grade_level(db, tenant_id, id)
        .await?
        .ok_or_else(|| Error::not_found("Nivel académico no encontrado"))
}

/// Creates a grade level.
pub async fn create_grade_level<C>(db: &C, actor: &Actor, data: NewGradeLevel) -> Result<grade_level::Model>
where
    C: ConnectionTrait,
{
    if data.name.trim().is_empty() {
        return Err(Error::invalid("El nombre del nivel es obligatorio"));
    }

    let level = grade_level::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        tenant_id: Set(actor.tenant_id.clone()),
        name: Set(data.name.trim().to_string()),
        level: Set(data.level),
        stage: Set(data.stage),
        order: Set(data.order),
        is_active: Set(data.is_active),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await?;

    activity::log_create(db, actor, ActivityEntity::GradeLevel, &level.id, &level.name, json!({ "stage": level.stage })).await;
    Ok(level)
}

/// Applies a partial update.
pub async fn update_grade_level<C>(db: &C, actor: &Actor, id: &str, changes: GradeLevelUpdate) -> Result<grade_level::Model>
where
    C: ConnectionTrait,
{
    let existing = require_grade_level(db, &actor.tenant_id, id).await?;
    let mut active: grade_level::ActiveModel = existing.into();
    if let Some(name) = changes.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(level) = changes.level {
        active.level = Set(level);
    }
    if let Some(stage) = changes.stage {
        active.stage = Set(stage);
    }
    if let Some(order) = changes.order {
        active.order = Set(order);
    }
    if let Some(is_active) = changes.is_active {
        active.is_active = Set(is_active);
    }

    let level = active.update(db).await?;
    activity::log_update(db, actor, ActivityEntity::GradeLevel, &level.id, &level.name, Value::Null).await;
    Ok(level)
}

/// Flips `is_active`.
pub async fn toggle_grade_level<C>(db: &C, actor: &Actor, id: &str) -> Result<grade_level::Model>
where
    C: ConnectionTrait,
{
    let existing = require_grade_level(db, &actor.tenant_id, id).await?;
    let now_active = !existing.is_active;
    let mut active: grade_level::ActiveModel = existing.into();
    active.is_active = Set(now_active);
    let level = active.update(db).await?;

    let status = if now_active { "active" } else { "inactive" };
    activity::log_status_change(db, actor, ActivityEntity::GradeLevel, &level.id, &level.name, status, Value::Null).await;
    Ok(level)
}

/// Removes a grade level.
pub async fn delete_grade_level<C>(db: &C, actor: &Actor, id: &str) -> Result<()>
where
    C: ConnectionTrait,
{
    let existing = require_grade_level(db, &actor.tenant_id, id).await?;
    GradeLevel::delete_by_id(existing.id.as_str()).exec(db).await?;
    activity::log_delete(db, actor, ActivityEntity::GradeLevel, &existing.id, &existing.name, Value::Null).await;
    Ok(())
}
