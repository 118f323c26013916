//! Types shared by several entities.
//!
//! `SQLite` has no array type, so list-valued fields are stored as JSON text
//! through `FromJsonQueryResult`.

use sea_orm::FromJsonQueryResult;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A list of strings stored as a JSON array.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(transparent)]
pub struct StringList(pub Vec<String>);

impl StringList {
    /// Whether the list contains `value`.
    #[must_use]
    pub fn contains(&self, value: &str) -> bool {
        self.0.iter().any(|v| v == value)
    }
}

impl From<Vec<String>> for StringList {
    fn from(value: Vec<String>) -> Self {
        Self(value)
    }
}

/// Day of the school week.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    /// Monday
    Lunes,
    /// Tuesday
    Martes,
    /// Wednesday
    #[serde(rename = "miércoles", alias = "miercoles")]
    Miercoles,
    /// Thursday
    Jueves,
    /// Friday
    Viernes,
    /// Saturday
    #[serde(rename = "sábado", alias = "sabado")]
    Sabado,
}

/// One weekly meeting of a class.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSlot {
    /// Day of the week
    pub day: Weekday,
    /// Start time, `HH:MM`
    pub start_time: String,
    /// End time, `HH:MM`
    pub end_time: String,
    /// Room, if assigned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
}

/// A class's weekly schedule stored as a JSON array.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(transparent)]
pub struct Schedule(pub Vec<ScheduleSlot>);

/// Active/inactive flag used by students and teachers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum ActiveStatus {
    /// Currently active
    #[sea_orm(string_value = "active")]
    Active,
    /// Deactivated
    #[sea_orm(string_value = "inactive")]
    Inactive,
}
