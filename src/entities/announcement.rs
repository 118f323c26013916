//! Announcement entity - School news for the community.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Announcement urgency
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum AnnouncementType {
    /// Needs immediate attention
    #[sea_orm(string_value = "urgent")]
    Urgent,
    /// General information
    #[sea_orm(string_value = "info")]
    Info,
    /// Upcoming event
    #[sea_orm(string_value = "event")]
    Event,
}

/// Who an announcement is for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    /// Everyone
    #[sea_orm(string_value = "all")]
    All,
    /// Teachers only
    #[sea_orm(string_value = "teachers")]
    Teachers,
    /// Parents only
    #[sea_orm(string_value = "parents")]
    Parents,
    /// Students only
    #[sea_orm(string_value = "students")]
    Students,
}

/// Publication state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum AnnouncementStatus {
    /// Not visible yet
    #[sea_orm(string_value = "draft")]
    Draft,
    /// Publicly visible
    #[sea_orm(string_value = "published")]
    Published,
    /// Hidden, kept for reference
    #[sea_orm(string_value = "archived")]
    Archived,
}

/// Announcement database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "announcements")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Owning tenant
    pub tenant_id: String,
    /// Headline
    pub title: String,
    /// Full body
    pub content: String,
    /// Short summary for cards
    pub excerpt: String,
    /// Date the announcement refers to
    pub date: Date,
    /// Urgency
    #[sea_orm(column_name = "type")]
    #[serde(rename = "type")]
    pub kind: AnnouncementType,
    /// Audience
    pub target_audience: Audience,
    /// Publication state
    pub status: AnnouncementStatus,
    /// Creation time
    pub created_at: DateTimeUtc,
    /// Last modification time
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
