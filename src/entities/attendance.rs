//! Attendance entity - One student's presence in one class on one day.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Attendance mark
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    /// Present
    #[sea_orm(string_value = "present")]
    Present,
    /// Absent
    #[sea_orm(string_value = "absent")]
    Absent,
    /// Arrived late
    #[sea_orm(string_value = "late")]
    Late,
    /// Absent with justification
    #[sea_orm(string_value = "excused")]
    Excused,
}

impl AttendanceStatus {
    /// Spanish label shown to users.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Present => "Presente",
            Self::Absent => "Ausente",
            Self::Late => "Tarde",
            Self::Excused => "Justificado",
        }
    }
}

/// Attendance database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "attendance")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Owning tenant
    pub tenant_id: String,
    /// Class the attendance was taken in
    pub class_id: String,
    /// Student
    pub student_id: String,
    /// Teacher who recorded it
    pub teacher_id: String,
    /// School day
    pub date: Date,
    /// Mark
    pub status: AttendanceStatus,
    /// Optional remarks
    pub notes: Option<String>,
    /// Creation time
    pub created_at: DateTimeUtc,
    /// Last modification time
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
