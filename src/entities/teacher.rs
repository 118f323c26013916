//! Teacher entity - Staff members of a school.
//!
//! A teacher record exists before (and independently of) a login account;
//! `user_id` is filled once an admin creates the account.

use super::shared::{ActiveStatus, StringList};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Teacher database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "teachers")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Owning tenant
    pub tenant_id: String,
    /// Display name
    pub full_name: String,
    /// Contact email, also used for the login account
    pub email: String,
    /// Contact phone
    pub phone_number: String,
    /// Subjects the teacher can teach (free-form names)
    pub subjects: StringList,
    /// Whether the teacher is currently active
    pub status: ActiveStatus,
    /// Linked login account, once created
    pub user_id: Option<String>,
    /// When the record was created
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
