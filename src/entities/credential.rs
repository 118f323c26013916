//! Credential entity - Email and password hash for a user.

use sea_orm::entity::prelude::*;

/// Login credential database model.
///
/// Deliberately not `Serialize`: the hash must never leave the service.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "credentials")]
pub struct Model {
    /// Id of the user this credential belongs to
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,
    /// Lowercased email used to sign in
    #[sea_orm(unique)]
    pub email: String,
    /// Argon2 PHC string
    pub password_hash: String,
    /// When the credential was created
    pub created_at: DateTimeUtc,
    /// Last password change
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
