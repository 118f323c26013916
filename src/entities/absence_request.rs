//! Absence request entity - A parent's request to excuse a student.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Review state of a request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    /// Awaiting review
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Accepted by the teacher
    #[sea_orm(string_value = "approved")]
    Approved,
    /// Declined by the teacher
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

/// Absence request database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "absence_requests")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Owning tenant
    pub tenant_id: String,
    /// Student who will be absent
    pub student_id: String,
    /// Teacher who reviews the request
    pub teacher_id: String,
    /// Class affected
    pub class_id: String,
    /// First day of absence
    pub start_date: Date,
    /// Last day of absence
    pub end_date: Date,
    /// Reason given by the parent
    pub reason: String,
    /// Storage path of a supporting document
    pub attachment_url: Option<String>,
    /// Review state
    pub status: RequestStatus,
    /// Reviewer user id
    pub reviewed_by: Option<String>,
    /// When the request was reviewed
    pub reviewed_at: Option<DateTimeUtc>,
    /// Reviewer notes
    pub review_notes: Option<String>,
    /// User id of the submitting parent
    pub submitted_by: String,
    /// Creation time
    pub created_at: DateTimeUtc,
    /// Last modification time
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
