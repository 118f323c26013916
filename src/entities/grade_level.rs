//! Grade level entity - Ordered school years grouped by stage.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Educational stage
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Primary school
    #[sea_orm(string_value = "primaria")]
    Primaria,
    /// Lower secondary
    #[sea_orm(string_value = "secundaria")]
    Secundaria,
    /// Upper secondary
    #[sea_orm(string_value = "bachillerato")]
    Bachillerato,
}

/// Grade level database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "grade_levels")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Owning tenant
    pub tenant_id: String,
    /// Display name (e.g., "Primero de Primaria")
    pub name: String,
    /// Year number within the stage
    pub level: i32,
    /// Stage the level belongs to
    pub stage: Stage,
    /// Sort position across all stages
    pub order: i32,
    /// Whether the level is in use
    pub is_active: bool,
    /// When the level was created
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
