//! Due date entity - When a fee is due and how late payment is penalised.
//!
//! The due date is either a fixed calendar date or a recurring rule stored as
//! `rule_kind` plus `rule_day`/`rule_month`; see
//! [`crate::core::financial::due_dates`] for how rules resolve to dates.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Stored kind of due-date rule
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "kebab-case")]
pub enum RuleKind {
    /// A single calendar date
    #[sea_orm(string_value = "fixed-date")]
    FixedDate,
    /// Same day every month
    #[sea_orm(string_value = "monthly-day")]
    MonthlyDay,
    /// Last day of every month
    #[sea_orm(string_value = "monthly-last")]
    MonthlyLast,
    /// Day of the first month of each quarter
    #[sea_orm(string_value = "quarterly-day")]
    QuarterlyDay,
    /// Same date every year
    #[sea_orm(string_value = "yearly-date")]
    YearlyDate,
}

/// How a late penalty is computed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum PenaltyType {
    /// Percentage of the amount due
    #[sea_orm(string_value = "porcentaje")]
    Porcentaje,
    /// Fixed amount
    #[sea_orm(string_value = "monto")]
    Monto,
}

/// Due date configuration database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "financial_due_dates")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Owning tenant
    pub tenant_id: String,
    /// Fee this configuration applies to
    pub fee_id: String,
    /// Fee name, denormalised for display
    pub fee_name: String,
    /// Kind of rule
    pub rule_kind: RuleKind,
    /// Calendar date for `fixed-date` rules
    pub due_date: Option<Date>,
    /// Day of month for day-based rules
    pub rule_day: Option<i32>,
    /// Month for `yearly-date` rules
    pub rule_month: Option<i32>,
    /// Days before the due date to start warning
    pub warning_days_before: i32,
    /// Days after the due date before penalties apply
    pub grace_period_days: i32,
    /// Penalty computation
    pub penalty_type: PenaltyType,
    /// Percentage or amount depending on `penalty_type`
    pub penalty_value: f64,
    /// Whether the penalty accrues per day late
    pub apply_daily_penalty: bool,
    /// Cap on the total penalty
    pub max_penalty_amount: Option<f64>,
    /// Free-form notes
    pub notes: Option<String>,
    /// Creation time
    pub created_at: DateTimeUtc,
    /// Last modification time
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
