//! Student entity - Enrolled pupils and their guardian contact details.

use super::shared::ActiveStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Student database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "students")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Owning tenant
    pub tenant_id: String,
    /// Student's full name
    pub full_name: String,
    /// Date of birth
    pub date_of_birth: Date,
    /// Student email, may be empty
    pub email: String,
    /// Student phone, may be empty
    pub phone: String,
    /// Home address
    pub address: String,
    /// Grade level id the student belongs to
    pub grade_level: String,
    /// Parent or guardian name
    pub parent_name: String,
    /// Parent email; links the student to a parent account
    pub parent_email: String,
    /// Parent phone
    pub parent_phone: String,
    /// Date the student joined the school
    pub enrollment_date: DateTimeUtc,
    /// Whether the student is currently active
    pub status: ActiveStatus,
    /// Emergency contact name
    pub emergency_contact: String,
    /// Emergency contact phone
    pub emergency_phone: String,
    /// Allergies, conditions or other medical notes
    pub medical_notes: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
