//! Session entity - Bearer tokens issued at sign-in.

use sea_orm::entity::prelude::*;

/// Session database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "sessions")]
pub struct Model {
    /// Opaque bearer token
    #[sea_orm(primary_key, auto_increment = false)]
    pub token: String,
    /// Signed-in user
    pub user_id: String,
    /// Issue time
    pub created_at: DateTimeUtc,
    /// Token is rejected after this instant
    pub expires_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
