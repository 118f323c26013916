//! School entity - One school profile per tenant.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// School database model, keyed by the owning tenant
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "schools")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Tenant (admin user id) owning the school
    #[sea_orm(primary_key, auto_increment = false)]
    pub tenant_id: String,
    /// Official school name
    pub school_name: String,
    /// Government registration number, unique across all tenants
    #[sea_orm(unique)]
    pub registration_number: String,
    /// Street name
    pub street: String,
    /// Street number
    pub number: String,
    /// Sector or neighbourhood
    pub sector: String,
    /// City
    pub city: String,
    /// Province
    pub province: String,
    /// Postal code, optional
    pub postal_code: Option<String>,
    /// When the school was registered
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
