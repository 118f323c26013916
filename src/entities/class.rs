//! Class entity - A section of a subject taught to one grade level.

use super::shared::Schedule;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a class
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum ClassStatus {
    /// Running this term
    #[sea_orm(string_value = "active")]
    Active,
    /// Finished
    #[sea_orm(string_value = "completed")]
    Completed,
    /// Will not run
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

/// Class database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "classes")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Owning tenant
    pub tenant_id: String,
    /// Display name (e.g., "Matemáticas 3A")
    pub class_name: String,
    /// Subject taught
    pub subject_id: String,
    /// Grade level the class is for
    pub grade_level_id: String,
    /// Section letter or label
    pub section: String,
    /// Assigned teacher, if any
    pub teacher_id: Option<String>,
    /// Weekly meetings
    pub schedule: Schedule,
    /// Capacity
    pub max_students: i32,
    /// Academic year, e.g. "2024-2025"
    pub academic_year: String,
    /// Semester label
    pub semester: String,
    /// Lifecycle state
    pub status: ClassStatus,
    /// When the class was created
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
