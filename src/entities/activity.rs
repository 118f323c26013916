//! Activity entity - Append-only audit log of user actions per tenant.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of action recorded
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    /// A record was created
    #[sea_orm(string_value = "create")]
    Create,
    /// A record was modified
    #[sea_orm(string_value = "update")]
    Update,
    /// A record was removed
    #[sea_orm(string_value = "delete")]
    Delete,
    /// A record's status changed
    #[sea_orm(string_value = "status_change")]
    StatusChange,
    /// A student was enrolled in a class
    #[sea_orm(string_value = "enrollment")]
    Enrollment,
    /// A teacher was assigned to a class
    #[sea_orm(string_value = "assignment")]
    Assignment,
}

/// Kind of record an activity refers to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum ActivityEntity {
    /// Student
    #[sea_orm(string_value = "student")]
    Student,
    /// Teacher
    #[sea_orm(string_value = "teacher")]
    Teacher,
    /// Class
    #[sea_orm(string_value = "class")]
    Class,
    /// Grade level
    #[sea_orm(string_value = "grade_level")]
    GradeLevel,
    /// Subject
    #[sea_orm(string_value = "subject")]
    Subject,
    /// User account
    #[sea_orm(string_value = "user")]
    User,
    /// Announcement
    #[sea_orm(string_value = "announcement")]
    Announcement,
    /// Enrollment
    #[sea_orm(string_value = "enrollment")]
    Enrollment,
    /// Grade
    #[sea_orm(string_value = "grade")]
    Grade,
    /// Attendance
    #[sea_orm(string_value = "attendance")]
    Attendance,
    /// Absence request
    #[sea_orm(string_value = "absence_request")]
    AbsenceRequest,
    /// Fee, due date or payment
    #[sea_orm(string_value = "finance")]
    Finance,
}

/// Activity database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "activities")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Tenant the action happened in
    pub tenant_id: String,
    /// Acting user
    pub user_id: String,
    /// Acting user's name at the time
    pub user_name: String,
    /// Acting user's email at the time
    pub user_email: String,
    /// Kind of action
    #[sea_orm(column_name = "type")]
    #[serde(rename = "type")]
    pub kind: ActivityType,
    /// Kind of record touched
    pub entity: ActivityEntity,
    /// Id of the record touched
    pub entity_id: String,
    /// Name of the record touched, for display
    pub entity_name: String,
    /// Human-readable Spanish description
    pub description: String,
    /// When the action happened
    pub timestamp: DateTimeUtc,
    /// Extra structured details
    pub metadata: Json,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
