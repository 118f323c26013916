//! Fee entity - Catalog of charges a school bills.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Fee category
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum FeeCategory {
    /// Tuition
    #[sea_orm(string_value = "colegiatura")]
    Colegiatura,
    /// Registration
    #[sea_orm(string_value = "inscripcion")]
    Inscripcion,
    /// Workshop
    #[sea_orm(string_value = "taller")]
    Taller,
    /// Event
    #[sea_orm(string_value = "evento")]
    Evento,
}

/// How often a fee is charged
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum BillingCycle {
    /// Monthly
    #[sea_orm(string_value = "mensual")]
    Mensual,
    /// Quarterly
    #[sea_orm(string_value = "trimestral")]
    Trimestral,
    /// Yearly
    #[sea_orm(string_value = "anual")]
    Anual,
    /// One-off
    #[sea_orm(string_value = "unico")]
    Unico,
}

/// Fee definition database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "financial_fees")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Owning tenant
    pub tenant_id: String,
    /// Fee name
    pub name: String,
    /// Description
    pub description: String,
    /// Category
    pub category: FeeCategory,
    /// Amount charged per cycle
    pub amount: f64,
    /// ISO currency code
    pub currency: String,
    /// Billing frequency
    pub billing_cycle: BillingCycle,
    /// Whether the fee is currently charged
    pub is_active: bool,
    /// Creation time
    pub created_at: DateTimeUtc,
    /// Last modification time
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
