//! Due dates - When fees fall due and what paying late costs.
//!
//! A configuration holds either a fixed calendar date or a recurring
//! [`DueDateRule`]. Recurring rules are resolved against a reference date
//! (usually today) into the due date of the reference period. Days that do
//! not exist in the target month are clamped to its last day, so a rule for
//! the 31st resolves to the 30th in April and to the 28th or 29th in February.

use crate::{
    core::{
        activity::{self, Actor},
        financial::fees,
    },
    entities::{
        DueDate,
        activity::ActivityEntity,
        due_date::{self, PenaltyType, RuleKind},
    },
    errors::{Error, Result},
};
use chrono::{Datelike, NaiveDate, Utc};
use sea_orm::{Set, prelude::*};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

/// Days of warning before a due date when none is configured.
pub const DEFAULT_WARNING_DAYS: i32 = 7;

/// Output format of resolved due dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// How a fee's due date is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum DueDateRule {
    /// A single calendar date
    FixedDate { date: NaiveDate },
    /// Day `day` of every month
    MonthlyDay { day: u32 },
    /// Last day of every month
    MonthlyLast,
    /// Day `day` of January, April, July and October
    QuarterlyDay { day: u32 },
    /// Month `month`, day `day` of every year
    YearlyDate { month: u32, day: u32 },
}

impl DueDateRule {
    /// Checks day and month ranges.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::FixedDate { .. } | Self::MonthlyLast => Ok(()),
            Self::MonthlyDay { day } | Self::QuarterlyDay { day } => check_day(day),
            Self::YearlyDate { month, day } => {
                check_month(month)?;
                check_day(day)
            }
        }
    }

    /// The due date this rule gives for the period containing `reference`.
    pub fn resolve(&self, reference: NaiveDate) -> Result<NaiveDate> {
        self.validate()?;
        let year = reference.year();
        match *self {
            Self::FixedDate { date } => Ok(date),
            Self::MonthlyDay { day } => clamped_date(year, reference.month(), day),
            Self::MonthlyLast => clamped_date(year, reference.month(), 31),
            Self::QuarterlyDay { day } => {
                let quarter_start = (reference.month0() / 3) * 3 + 1;
                clamped_date(year, quarter_start, day)
            }
            Self::YearlyDate { month, day } => clamped_date(year, month, day),
        }
    }

    /// Rebuilds the rule from its stored columns.
    pub fn from_config(config: &due_date::Model) -> Result<Self> {
        let day = || {
            config
                .rule_day
                .and_then(|d| u32::try_from(d).ok())
                .ok_or_else(|| Error::invalid("Especifica el día del mes (1-31)."))
        };

        let rule = match config.rule_kind {
            RuleKind::FixedDate => Self::FixedDate {
                date: config
                    .due_date
                    .ok_or_else(|| Error::invalid("Define una fecha limite."))?,
            },
            RuleKind::MonthlyDay => Self::MonthlyDay { day: day()? },
            RuleKind::MonthlyLast => Self::MonthlyLast,
            RuleKind::QuarterlyDay => Self::QuarterlyDay { day: day()? },
            RuleKind::YearlyDate => Self::YearlyDate {
                month: config
                    .rule_month
                    .and_then(|m| u32::try_from(m).ok())
                    .ok_or_else(|| Error::invalid("Especifica el mes y día para la fecha anual."))?,
                day: day()?,
            },
        };
        Ok(rule)
    }

    /// Stored representation: kind, fixed date, day and month columns.
    fn columns(&self) -> (RuleKind, Option<NaiveDate>, Option<i32>, Option<i32>) {
        let as_i32 = |v: u32| i32::try_from(v).ok();
        match *self {
            Self::FixedDate { date } => (RuleKind::FixedDate, Some(date), None, None),
            Self::MonthlyDay { day } => (RuleKind::MonthlyDay, None, as_i32(day), None),
            Self::MonthlyLast => (RuleKind::MonthlyLast, None, None, None),
            Self::QuarterlyDay { day } => (RuleKind::QuarterlyDay, None, as_i32(day), None),
            Self::YearlyDate { month, day } => (RuleKind::YearlyDate, None, as_i32(day), as_i32(month)),
        }
    }
}

fn check_day(day: u32) -> Result<()> {
    if (1..=31).contains(&day) {
        Ok(())
    } else {
        Err(Error::invalid("Especifica el día del mes (1-31)."))
    }
}

fn check_month(month: u32) -> Result<()> {
    if (1..=12).contains(&month) {
        Ok(())
    } else {
        Err(Error::invalid("El mes debe estar entre 1 y 12."))
    }
}

/// Number of days in a month.
pub fn days_in_month(year: i32, month: u32) -> Result<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| Error::invalid("Fecha inválida"))?;
    let next = first
        .checked_add_months(chrono::Months::new(1))
        .ok_or_else(|| Error::invalid("Fecha inválida"))?;
    let days = next.signed_duration_since(first).num_days();
    u32::try_from(days).map_err(|_| Error::invalid("Fecha inválida"))
}

fn clamped_date(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    let day = day.min(days_in_month(year, month)?);
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| Error::invalid("Fecha inválida"))
}

/// Resolves a rule against `reference` and formats it as `YYYY-MM-DD`.
///
/// ```
/// use chrono::NaiveDate;
/// use school_manager::core::financial::{DueDateRule, resolve};
///
/// let april = NaiveDate::from_ymd_opt(2024, 4, 10).unwrap();
/// assert_eq!(resolve(&DueDateRule::MonthlyDay { day: 31 }, april).unwrap(), "2024-04-30");
/// ```
pub fn resolve(rule: &DueDateRule, reference: NaiveDate) -> Result<String> {
    Ok(rule.resolve(reference)?.format(DATE_FORMAT).to_string())
}

/// Late penalty owed on `amount_due` as of `today`.
///
/// Nothing is owed until the grace period after `due_date` has passed. A
/// percentage penalty is taken from the amount due; a fixed one is taken as
/// is. Daily penalties multiply by the days late past grace, and the result
/// never exceeds `max_penalty_amount`.
pub fn penalty(config: &due_date::Model, amount_due: f64, due_date: NaiveDate, today: NaiveDate) -> f64 {
    let days_late = today.signed_duration_since(due_date).num_days() - i64::from(config.grace_period_days.max(0));
    if days_late <= 0 || amount_due <= 0.0 {
        return 0.0;
    }

    let base = match config.penalty_type {
        PenaltyType::Porcentaje => amount_due * config.penalty_value / 100.0,
        PenaltyType::Monto => config.penalty_value,
    };
    #[allow(clippy::cast_precision_loss)]
    let total = if config.apply_daily_penalty {
        base * days_late as f64
    } else {
        base
    };

    match config.max_penalty_amount {
        Some(cap) => total.min(cap),
        None => total,
    }
}

/// A configuration with its rule resolved against a reference date.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedDueDate {
    #[serde(flatten)]
    pub config: due_date::Model,
    /// Next due date in `YYYY-MM-DD`, `None` if the stored rule is malformed
    pub resolved_due_date: Option<String>,
}

/// Data for a new due-date configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDueDateConfig {
    pub fee_id: String,
    pub rule: DueDateRule,
    #[serde(default)]
    pub warning_days_before: Option<i32>,
    #[serde(default)]
    pub grace_period_days: i32,
    pub penalty_type: PenaltyType,
    #[serde(default)]
    pub penalty_value: f64,
    #[serde(default)]
    pub apply_daily_penalty: bool,
    #[serde(default)]
    pub max_penalty_amount: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Partial update of a configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DueDateConfigUpdate {
    pub rule: Option<DueDateRule>,
    pub warning_days_before: Option<i32>,
    pub grace_period_days: Option<i32>,
    pub penalty_type: Option<PenaltyType>,
    pub penalty_value: Option<f64>,
    pub apply_daily_penalty: Option<bool>,
    pub max_penalty_amount: Option<f64>,
    pub notes: Option<String>,
}

fn validate_penalty(penalty_value: f64, grace_period_days: i32, max_penalty: Option<f64>) -> Result<()> {
    if !penalty_value.is_finite() || penalty_value < 0.0 {
        return Err(Error::invalid("El recargo debe ser un numero valido."));
    }
    if grace_period_days < 0 {
        return Err(Error::invalid("El periodo de gracia debe ser un numero valido."));
    }
    if max_penalty.is_some_and(|m| !m.is_finite() || m < 0.0) {
        return Err(Error::invalid("El maximo de recargo debe ser un numero valido."));
    }
    Ok(())
}

/// The tenant's configurations, soonest due first relative to `today`.
///
/// Configurations whose stored rule cannot be resolved sort last.
pub async fn due_date_configs<C>(db: &C, tenant_id: &str, today: NaiveDate) -> Result<Vec<ResolvedDueDate>>
where
    C: ConnectionTrait,
{
    let configs = DueDate::find()
        .filter(due_date::Column::TenantId.eq(tenant_id))
        .all(db)
        .await?;

    let mut resolved: Vec<ResolvedDueDate> = configs
        .into_iter()
        .map(|config| {
            let resolved_due_date = DueDateRule::from_config(&config)
                .and_then(|rule| resolve(&rule, today))
                .ok();
            ResolvedDueDate {
                config,
                resolved_due_date,
            }
        })
        .collect();

    resolved.sort_by(|a, b| match (&a.resolved_due_date, &b.resolved_due_date) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    Ok(resolved)
}

/// The configuration attached to a fee, if any.
pub async fn config_for_fee<C>(db: &C, tenant_id: &str, fee_id: &str) -> Result<Option<due_date::Model>>
where
    C: ConnectionTrait,
{
    DueDate::find()
        .filter(due_date::Column::TenantId.eq(tenant_id))
        .filter(due_date::Column::FeeId.eq(fee_id))
        .one(db)
        .await
        .map_err(Into::into)
}

async fn require_config<C>(db: &C, tenant_id: &str, id: &str) -> Result<due_date::Model>
where
    C: ConnectionTrait,
{
    DueDate::find_by_id(id)
        .filter(due_date::Column::TenantId.eq(tenant_id))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Configuración de fecha límite no encontrada"))
}

/// Adds a due-date configuration for one of the tenant's fees.
pub async fn add_due_date_config<C>(db: &C, actor: &Actor, data: NewDueDateConfig) -> Result<due_date::Model>
where
    C: ConnectionTrait,
{
    data.rule.validate()?;
    validate_penalty(data.penalty_value, data.grace_period_days, data.max_penalty_amount)?;
    let fee = fees::require_fee(db, &actor.tenant_id, &data.fee_id).await?;

    let (rule_kind, fixed, rule_day, rule_month) = data.rule.columns();
    let now = Utc::now();
    let created = due_date::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        tenant_id: Set(actor.tenant_id.clone()),
        fee_id: Set(fee.id),
        fee_name: Set(fee.name),
        rule_kind: Set(rule_kind),
        due_date: Set(fixed),
        rule_day: Set(rule_day),
        rule_month: Set(rule_month),
        warning_days_before: Set(data.warning_days_before.unwrap_or(DEFAULT_WARNING_DAYS)),
        grace_period_days: Set(data.grace_period_days),
        penalty_type: Set(data.penalty_type),
        penalty_value: Set(data.penalty_value),
        apply_daily_penalty: Set(data.apply_daily_penalty),
        max_penalty_amount: Set(data.max_penalty_amount),
        notes: Set(data.notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;

    activity::log_create(
        db,
        actor,
        ActivityEntity::Finance,
        &created.id,
        &format!("Fecha límite: {}", created.fee_name),
        json!({ "feeId": created.fee_id, "rule": data.rule }),
    )
    .await;
    Ok(created)
}

/// Applies a partial update and re-validates the result.
pub async fn update_due_date_config<C>(
    db: &C,
    actor: &Actor,
    id: &str,
    changes: DueDateConfigUpdate,
) -> Result<due_date::Model>
where
    C: ConnectionTrait,
{
    let existing = require_config(db, &actor.tenant_id, id).await?;

    let penalty_value = changes.penalty_value.unwrap_or(existing.penalty_value);
    let grace = changes.grace_period_days.unwrap_or(existing.grace_period_days);
    let max_penalty = changes.max_penalty_amount.or(existing.max_penalty_amount);
    validate_penalty(penalty_value, grace, max_penalty)?;

    let mut active: due_date::ActiveModel = existing.into();
    if let Some(rule) = changes.rule {
        rule.validate()?;
        let (rule_kind, fixed, rule_day, rule_month) = rule.columns();
        active.rule_kind = Set(rule_kind);
        active.due_date = Set(fixed);
        active.rule_day = Set(rule_day);
        active.rule_month = Set(rule_month);
    }
    if let Some(days) = changes.warning_days_before {
        active.warning_days_before = Set(days);
    }
    if let Some(kind) = changes.penalty_type {
        active.penalty_type = Set(kind);
    }
    if let Some(daily) = changes.apply_daily_penalty {
        active.apply_daily_penalty = Set(daily);
    }
    if let Some(notes) = changes.notes {
        active.notes = Set(Some(notes.trim().to_string()).filter(|n| !n.is_empty()));
    }
    active.penalty_value = Set(penalty_value);
    active.grace_period_days = Set(grace);
    active.max_penalty_amount = Set(max_penalty);
    active.updated_at = Set(Utc::now());

    let updated = active.update(db).await?;
    activity::log_update(
        db,
        actor,
        ActivityEntity::Finance,
        &updated.id,
        &format!("Fecha límite: {}", updated.fee_name),
        Value::Null,
    )
    .await;
    Ok(updated)
}

/// Removes a configuration.
pub async fn delete_due_date_config<C>(db: &C, actor: &Actor, id: &str) -> Result<()>
where
    C: ConnectionTrait,
{
    let existing = require_config(db, &actor.tenant_id, id).await?;
    DueDate::delete_by_id(existing.id.as_str()).exec(db).await?;
    activity::log_delete(
        db,
        actor,
        ActivityEntity::Finance,
        &existing.id,
        &format!("Fecha límite: {}", existing.fee_name),
        Value::Null,
    )
    .await;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_monthly_day_clamps_to_month_end() {
        let rule = DueDateRule::MonthlyDay { day: 31 };
        assert_eq!(resolve(&rule, date(2024, 4, 2)).unwrap(), "2024-04-30");
        assert_eq!(resolve(&rule, date(2024, 2, 2)).unwrap(), "2024-02-29");
        assert_eq!(resolve(&rule, date(2023, 2, 2)).unwrap(), "2023-02-28");
        assert_eq!(resolve(&rule, date(2024, 1, 20)).unwrap(), "2024-01-31");
        assert_eq!(resolve(&DueDateRule::MonthlyDay { day: 5 }, date(2024, 9, 20)).unwrap(), "2024-09-05");
    }

    #[test]
    fn test_monthly_last_and_fixed() {
        assert_eq!(resolve(&DueDateRule::MonthlyLast, date(2024, 6, 15)).unwrap(), "2024-06-30");
        assert_eq!(resolve(&DueDateRule::MonthlyLast, date(2100, 2, 1)).unwrap(), "2100-02-28");
        let fixed = DueDateRule::FixedDate { date: date(2025, 1, 15) };
        assert_eq!(resolve(&fixed, date(2024, 6, 15)).unwrap(), "2025-01-15");
    }

    #[test]
    fn test_quarterly_uses_first_month_of_quarter() {
        let rule = DueDateRule::QuarterlyDay { day: 31 };
        assert_eq!(resolve(&rule, date(2024, 2, 10)).unwrap(), "2024-01-31");
        assert_eq!(resolve(&rule, date(2024, 6, 10)).unwrap(), "2024-04-30");
        assert_eq!(resolve(&rule, date(2024, 9, 30)).unwrap(), "2024-07-31");
        assert_eq!(resolve(&rule, date(2024, 12, 1)).unwrap(), "2024-10-31");
    }

    #[test]
    fn test_yearly_date_clamps_day() {
        let rule = DueDateRule::YearlyDate { month: 2, day: 30 };
        assert_eq!(resolve(&rule, date(2024, 8, 1)).unwrap(), "2024-02-29");
        assert_eq!(resolve(&rule, date(2025, 8, 1)).unwrap(), "2025-02-28");
    }

    #[test]
    fn test_malformed_rules_are_rejected() {
        let today = date(2024, 8, 1);
        assert!(matches!(resolve(&DueDateRule::MonthlyDay { day: 0 }, today), Err(Error::InvalidArgument { .. })));
        assert!(matches!(resolve(&DueDateRule::QuarterlyDay { day: 32 }, today), Err(Error::InvalidArgument { .. })));
        assert!(matches!(
            resolve(&DueDateRule::YearlyDate { month: 13, day: 1 }, today),
            Err(Error::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_rule_wire_format() {
        let rule: DueDateRule = serde_json::from_str(r#"{"type":"yearly-date","month":8,"day":15}"#).unwrap();
        assert_eq!(rule, DueDateRule::YearlyDate { month: 8, day: 15 });
        let rule: DueDateRule = serde_json::from_str(r#"{"type":"monthly-last"}"#).unwrap();
        assert_eq!(rule, DueDateRule::MonthlyLast);
    }

    fn config(penalty_type: PenaltyType, value: f64, daily: bool, cap: Option<f64>) -> due_date::Model {
        let now = Utc::now();
        due_date::Model {
            id: "d1".to_string(),
            tenant_id: "tenant-1".to_string(),
            fee_id: "f1".to_string(),
            fee_name: "Colegiatura".to_string(),
            rule_kind: RuleKind::MonthlyDay,
            due_date: None,
            rule_day: Some(5),
            rule_month: None,
            warning_days_before: 7,
            grace_period_days: 3,
            penalty_type,
            penalty_value: value,
            apply_daily_penalty: daily,
            max_penalty_amount: cap,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_penalty() {
        let due = date(2024, 9, 5);

        let pct = config(PenaltyType::Porcentaje, 10.0, false, None);
        assert_eq!(penalty(&pct, 1000.0, due, date(2024, 9, 8)), 0.0);
        assert_eq!(penalty(&pct, 1000.0, due, date(2024, 9, 9)), 100.0);

        let daily = config(PenaltyType::Monto, 50.0, true, None);
        assert_eq!(penalty(&daily, 1000.0, due, date(2024, 9, 12)), 200.0);

        let capped = config(PenaltyType::Monto, 50.0, true, Some(120.0));
        assert_eq!(penalty(&capped, 1000.0, due, date(2024, 9, 30)), 120.0);

        assert_eq!(penalty(&pct, 0.0, due, date(2024, 9, 30)), 0.0);
    }

    #[tokio::test]
    async fn test_configs_sorted_by_resolved_date() -> Result<()> {
        let db = setup_test_db().await?;
        let actor = test_actor("tenant-1");
        let fee = crate::core::financial::fees::add_fee(&db, &actor, new_fee("Colegiatura", 5000.0)).await?;

        let make = |rule| NewDueDateConfig {
            fee_id: fee.id.clone(),
            rule,
            warning_days_before: None,
            grace_period_days: 5,
            penalty_type: PenaltyType::Porcentaje,
            penalty_value: 5.0,
            apply_daily_penalty: false,
            max_penalty_amount: None,
            notes: None,
        };
        add_due_date_config(&db, &actor, make(DueDateRule::MonthlyLast)).await?;
        let early = add_due_date_config(&db, &actor, make(DueDateRule::MonthlyDay { day: 1 })).await?;
        assert_eq!(early.warning_days_before, DEFAULT_WARNING_DAYS);
        assert_eq!(early.fee_name, "Colegiatura");

        let configs = due_date_configs(&db, "tenant-1", date(2024, 9, 10)).await?;
        let dates: Vec<Option<&str>> = configs.iter().map(|c| c.resolved_due_date.as_deref()).collect();
        assert_eq!(dates, vec![Some("2024-09-01"), Some("2024-09-30")]);

        let mut bad = make(DueDateRule::MonthlyDay { day: 5 });
        bad.grace_period_days = -1;
        assert!(matches!(add_due_date_config(&db, &actor, bad).await, Err(Error::InvalidArgument { .. })));

        let mut missing = make(DueDateRule::MonthlyDay { day: 5 });
        missing.fee_id = "nope".to_string();
        assert!(matches!(add_due_date_config(&db, &actor, missing).await, Err(Error::NotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_and_delete_config() -> Result<()> {
        let db = setup_test_db().await?;
        let actor = test_actor("tenant-1");
        let fee = crate::core::financial::fees::add_fee(&db, &actor, new_fee("Inscripción", 3000.0)).await?;
        let created = add_due_date_config(
            &db,
            &actor,
            NewDueDateConfig {
                fee_id: fee.id.clone(),
                rule: DueDateRule::FixedDate { date: date(2024, 8, 15) },
                warning_days_before: Some(10),
                grace_period_days: 0,
                penalty_type: PenaltyType::Monto,
                penalty_value: 200.0,
                apply_daily_penalty: false,
                max_penalty_amount: None,
                notes: Some("  ".to_string()),
            },
        )
        .await?;
        assert!(created.notes.is_none());

        let updated = update_due_date_config(
            &db,
            &actor,
            &created.id,
            DueDateConfigUpdate {
                rule: Some(DueDateRule::YearlyDate { month: 8, day: 20 }),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(updated.rule_kind, RuleKind::YearlyDate);
        assert_eq!(updated.due_date, None);
        assert_eq!(updated.rule_month, Some(8));
        assert_eq!(DueDateRule::from_config(&updated)?, DueDateRule::YearlyDate { month: 8, day: 20 });

        let invalid = update_due_date_config(
            &db,
            &actor,
            &created.id,
            DueDateConfigUpdate {
                penalty_value: Some(-1.0),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(invalid, Err(Error::InvalidArgument { .. })));

        delete_due_date_config(&db, &actor, &created.id).await?;
        assert!(config_for_fee(&db, "tenant-1", &fee.id).await?.is_none());
        Ok(())
    }
}
