//! Fee catalog.

use crate::{
    core::activity::{self, Actor},
    entities::{
        Fee,
        activity::ActivityEntity,
        fee::{self, BillingCycle, FeeCategory},
    },
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

/// Currency used when a fee does not name one.
pub const DEFAULT_CURRENCY: &str = "DOP";

fn default_true() -> bool {
    true
}

/// Data for a new fee definition.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFee {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: FeeCategory,
    pub amount: f64,
    #[serde(default)]
    pub currency: Option<String>,
    pub billing_cycle: BillingCycle,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Partial update of a fee. Tenant and id never change.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<FeeCategory>,
    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub billing_cycle: Option<BillingCycle>,
    pub is_active: Option<bool>,
}

fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::invalid("El nombre de la tarifa es obligatorio"));
    }
    Ok(name.to_string())
}

fn validate_amount(amount: f64) -> Result<f64> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::invalid("El monto debe ser mayor a cero"));
    }
    Ok(amount)
}

/// The tenant's fees, newest first.
pub async fn fee_catalog<C>(db: &C, tenant_id: &str) -> Result<Vec<fee::Model>>
where
    C: ConnectionTrait,
{
    Fee::find()
        .filter(fee::Column::TenantId.eq(tenant_id))
        .order_by_desc(fee::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a fee of the tenant by id.
pub async fn get_fee<C>(db: &C, tenant_id: &str, fee_id: &str) -> Result<Option<fee::Model>>
where
    C: ConnectionTrait,
{
    Fee::find_by_id(fee_id)
        .filter(fee::Column::TenantId.eq(tenant_id))
        .one(db)
        .await
        .map_err(Into::into)
}

pub(super) async fn require_fee<C>(db: &C, tenant_id: &str, fee_id: &str) -> Result<fee::Model>
where
    C: ConnectionTrait,
{
    get_fee(db, tenant_id, fee_id)
        .await?
        .ok_or_else(|| Error::not_found("Tarifa no encontrada"))
}

/// Adds a fee to the catalog.
pub async fn add_fee<C>(db: &C, actor: &Actor, data: NewFee) -> Result<fee::Model>
where
    C: ConnectionTrait,
{
    let name = validate_name(&data.name)?;
    let amount = validate_amount(data.amount)?;
    let now = Utc::now();

    let created = fee::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        tenant_id: Set(actor.tenant_id.clone()),
        name: Set(name),
        description: Set(data.description.trim().to_string()),
        category: Set(data.category),
        amount: Set(amount),
        currency: Set(data.currency.unwrap_or_else(|| DEFAULT_CURRENCY.to_string())),
        billing_cycle: Set(data.billing_cycle),
        is_active: Set(data.is_active),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;

    activity::log_create(
        db,
        actor,
        ActivityEntity::Finance,
        &created.id,
        &created.name,
        json!({ "amount": created.amount, "currency": created.currency }),
    )
    .await;
    Ok(created)
}

/// Applies a partial update to a fee.
pub async fn update_fee<C>(db: &C, actor: &Actor, fee_id: &str, changes: FeeUpdate) -> Result<fee::Model>
where
    C: ConnectionTrait,
{
    let existing = require_fee(db, &actor.tenant_id, fee_id).await?;
    let mut active: fee::ActiveModel = existing.into();

    if let Some(name) = changes.name {
        active.name = Set(validate_name(&name)?);
    }
    if let Some(description) = changes.description {
        active.description = Set(description.trim().to_string());
    }
    if let Some(category) = changes.category {
        active.category = Set(category);
    }
    if let Some(amount) = changes.amount {
        active.amount = Set(validate_amount(amount)?);
    }
    if let Some(currency) = changes.currency {
        active.currency = Set(currency);
    }
    if let Some(cycle) = changes.billing_cycle {
        active.billing_cycle = Set(cycle);
    }
    if let Some(is_active) = changes.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_at = Set(Utc::now());

    let updated = active.update(db).await?;
    activity::log_update(db, actor, ActivityEntity::Finance, &updated.id, &updated.name, Value::Null).await;
    Ok(updated)
}

/// Flips whether a fee is currently charged.
pub async fn toggle_fee<C>(db: &C, actor: &Actor, fee_id: &str) -> Result<fee::Model>
where
    C: ConnectionTrait,
{
    let existing = require_fee(db, &actor.tenant_id, fee_id).await?;
    let is_active = !existing.is_active;
    let mut active: fee::ActiveModel = existing.into();
    active.is_active = Set(is_active);
    active.updated_at = Set(Utc::now());

    let updated = active.update(db).await?;
    let new_status = if is_active { "active" } else { "inactive" };
    activity::log_status_change(db, actor, ActivityEntity::Finance, &updated.id, &updated.name, new_status, Value::Null)
        .await;
    Ok(updated)
}

/// Removes a fee from the catalog.
pub async fn delete_fee<C>(db: &C, actor: &Actor, fee_id: &str) -> Result<()>
where
    C: ConnectionTrait,
{
    let existing = require_fee(db, &actor.tenant_id, fee_id).await?;
    Fee::delete_by_id(existing.id.as_str()).exec(db).await?;
    activity::log_delete(db, actor, ActivityEntity::Finance, &existing.id, &existing.name, Value::Null).await;
    Ok(())
}
