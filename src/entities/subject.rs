//! Subject entity - Catalog of subjects offered by a school.

use super::shared::StringList;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Subject database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subjects")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Owning tenant
    pub tenant_id: String,
    /// Subject name
    pub name: String,
    /// Short code, unique within a tenant (e.g., "MAT")
    pub code: String,
    /// Free-form description
    pub description: String,
    /// Grade levels the subject is taught at
    pub grade_level_ids: StringList,
    /// UI colour, hex string
    pub color: String,
    /// Whether the subject is offered
    pub is_active: bool,
    /// When the subject was created
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
