//! Enrollment entity - Membership of a student in a class.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// State of an enrollment
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    /// Currently attending
    #[sea_orm(string_value = "enrolled")]
    Enrolled,
    /// Left the class
    #[sea_orm(string_value = "dropped")]
    Dropped,
    /// Finished the class
    #[sea_orm(string_value = "completed")]
    Completed,
}

/// Enrollment database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "enrollments")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Owning tenant
    pub tenant_id: String,
    /// Class the student joined
    pub class_id: String,
    /// Enrolled student
    pub student_id: String,
    /// When the student was enrolled
    pub enrolled_at: DateTimeUtc,
    /// Current state
    pub status: EnrollmentStatus,
    /// Creation time
    pub created_at: DateTimeUtc,
    /// Last modification time
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
