//! User entity - Profile of anyone who can sign in.
//!
//! Admins own a tenant (their id is the tenant id), teachers belong to the
//! tenant that created their account, and parents are linked to students by
//! email rather than by tenant.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Role stored on a user profile
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// School administrator, owner of a tenant
    #[sea_orm(string_value = "admin")]
    Admin,
    /// Teacher with an account created by an admin
    #[sea_orm(string_value = "teacher")]
    Teacher,
    /// Parent or guardian
    #[sea_orm(string_value = "parent")]
    Parent,
}

impl Role {
    /// Wire name of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Teacher => "teacher",
            Self::Parent => "parent",
        }
    }
}

/// User profile database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier, shared with the credential record
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Display name
    pub full_name: String,
    /// Lowercased login email
    pub email: String,
    /// Contact phone, may be empty
    pub phone_number: String,
    /// Access role
    pub role: Role,
    /// Owning tenant; `None` for parents
    pub tenant_id: Option<String>,
    /// Storage path of the profile photo
    pub photo_url: Option<String>,
    /// When the profile was created
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
