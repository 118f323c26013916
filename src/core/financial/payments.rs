//! Payment records and reconciliation.

use crate::{
    core::{
        activity::{self, Actor},
        financial::due_dates::{self, DueDateRule},
    },
    entities::{
        Payment,
        activity::ActivityEntity,
        payment::{self, PaymentStatus},
    },
    errors::{Error, Result},
};
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

/// Data for a new payment record.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPayment {
    pub student_id: String,
    pub student_name: String,
    pub fee_id: String,
    pub fee_name: String,
    pub payer_name: String,
    pub payer_email: String,
    pub due_date: NaiveDate,
    pub billing_period: String,
    pub amount_expected: f64,
    #[serde(default)]
    pub amount_paid: f64,
    pub currency: String,
    pub transaction_reference: String,
    /// Defaults to `pendiente`
    #[serde(default)]
    pub status: Option<PaymentStatus>,
    #[serde(default)]
    pub payment_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Partial update of a payment. Tenant and id never change.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentUpdate {
    pub payer_name: Option<String>,
    pub payer_email: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub billing_period: Option<String>,
    pub amount_expected: Option<f64>,
    pub amount_paid: Option<f64>,
    pub transaction_reference: Option<String>,
    pub payment_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

fn required(value: &str, message: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::invalid(message));
    }
    Ok(value.to_string())
}

fn check_expected(amount: f64) -> Result<f64> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::invalid("El monto esperado debe ser mayor a cero"));
    }
    Ok(amount)
}

fn check_paid(amount: f64) -> Result<f64> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(Error::invalid("El monto pagado no puede ser negativo"));
    }
    Ok(amount)
}

fn display_name(payment: &payment::Model) -> String {
    format!("{} - {} ({})", payment.fee_name, payment.student_name, payment.billing_period)
}

/// The tenant's payments, newest first.
pub async fn payment_records<C>(db: &C, tenant_id: &str) -> Result<Vec<payment::Model>>
where
    C: ConnectionTrait,
{
    Payment::find()
        .filter(payment::Column::TenantId.eq(tenant_id))
        .order_by_desc(payment::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a payment of the tenant by id.
pub async fn get_payment<C>(db: &C, tenant_id: &str, id: &str) -> Result<Option<payment::Model>>
where
    C: ConnectionTrait,
{
    Payment::find_by_id(id)
        .filter(payment::Column::TenantId.eq(tenant_id))
        .one(db)
        .await
        .map_err(Into::into)
}

async fn require_payment<C>(db: &C, tenant_id: &str, id: &str) -> Result<payment::Model>
where
    C: ConnectionTrait,
{
    get_payment(db, tenant_id, id)
        .await?
        .ok_or_else(|| Error::not_found("Pago no encontrado"))
}

/// Records a payment (or an expected one).
pub async fn add_payment<C>(db: &C, actor: &Actor, data: NewPayment) -> Result<payment::Model>
where
    C: ConnectionTrait,
{
    let payer_name = required(&data.payer_name, "El nombre del pagador es obligatorio")?;
    let payer_email = required(&data.payer_email, "El correo del pagador es obligatorio")?;
    let billing_period = required(&data.billing_period, "El periodo de facturación es obligatorio")?;
    let transaction_reference = required(&data.transaction_reference, "La referencia de la transacción es obligatoria")?;
    let amount_expected = check_expected(data.amount_expected)?;
    let amount_paid = check_paid(data.amount_paid)?;

    let now = Utc::now();
    let created = payment::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        tenant_id: Set(actor.tenant_id.clone()),
        student_id: Set(data.student_id),
        student_name: Set(data.student_name),
        fee_id: Set(data.fee_id),
        fee_name: Set(data.fee_name),
        payer_name: Set(payer_name),
        payer_email: Set(payer_email.to_lowercase()),
        due_date: Set(data.due_date),
        billing_period: Set(billing_period),
        amount_expected: Set(amount_expected),
        amount_paid: Set(amount_paid),
        currency: Set(data.currency),
        transaction_reference: Set(transaction_reference),
        status: Set(data.status.unwrap_or(PaymentStatus::Pendiente)),
        receipt_number: Set(None),
        payment_date: Set(data.payment_date),
        reconciled_at: Set(None),
        notes: Set(data.notes.filter(|n| !n.trim().is_empty())),
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
        &display_name(&created),
        json!({ "amountExpected": created.amount_expected, "amountPaid": created.amount_paid }),
    )
    .await;
    Ok(created)
}

/// Applies a partial update to a payment.
pub async fn update_payment<C>(db: &C, actor: &Actor, id: &str, changes: PaymentUpdate) -> Result<payment::Model>
where
    C: ConnectionTrait,
{
    let existing = require_payment(db, &actor.tenant_id, id).await?;
    let mut active: payment::ActiveModel = existing.into();

    if let Some(name) = changes.payer_name {
        active.payer_name = Set(required(&name, "El nombre del pagador es obligatorio")?);
    }
    if let Some(email) = changes.payer_email {
        active.payer_email = Set(required(&email, "El correo del pagador es obligatorio")?.to_lowercase());
    }
    if let Some(date) = changes.due_date {
        active.due_date = Set(date);
    }
    if let Some(period) = changes.billing_period {
        active.billing_period = Set(required(&period, "El periodo de facturación es obligatorio")?);
    }
    if let Some(amount) = changes.amount_expected {
        active.amount_expected = Set(check_expected(amount)?);
    }
    if let Some(amount) = changes.amount_paid {
        active.amount_paid = Set(check_paid(amount)?);
    }
    if let Some(reference) = changes.transaction_reference {
        active.transaction_reference = Set(required(&reference, "La referencia de la transacción es obligatoria")?);
    }
    if let Some(date) = changes.payment_date {
        active.payment_date = Set(Some(date));
    }
    if let Some(notes) = changes.notes {
        active.notes = Set(Some(notes).filter(|n| !n.trim().is_empty()));
    }
    active.updated_at = Set(Utc::now());

    let updated = active.update(db).await?;
    activity::log_update(db, actor, ActivityEntity::Finance, &updated.id, &display_name(&updated), serde_json::Value::Null)
        .await;
    Ok(updated)
}

/// Moves a payment to a new state. Reconciling stamps `reconciled_at`.
pub async fn update_payment_status<C>(db: &C, actor: &Actor, id: &str, status: PaymentStatus) -> Result<payment::Model>
where
    C: ConnectionTrait,
{
    let existing = require_payment(db, &actor.tenant_id, id).await?;
    let now = Utc::now();
    let mut active: payment::ActiveModel = existing.into();
    active.status = Set(status);
    if status == PaymentStatus::Conciliado {
        active.reconciled_at = Set(Some(now));
    }
    active.updated_at = Set(now);

    let updated = active.update(db).await?;
    activity::log_update(
        db,
        actor,
        ActivityEntity::Finance,
        &updated.id,
        &display_name(&updated),
        json!({ "status": status }),
    )
    .await;
    Ok(updated)
}

/// Issues a receipt number and reconciles the payment.
pub async fn generate_receipt<C>(db: &C, actor: &Actor, id: &str) -> Result<String>
where
    C: ConnectionTrait,
{
    let existing = require_payment(db, &actor.tenant_id, id).await?;
    let now = Utc::now();
    let receipt_number = format!("REC-{}", now.timestamp_millis());

    let mut active: payment::ActiveModel = existing.into();
    active.receipt_number = Set(Some(receipt_number.clone()));
    active.status = Set(PaymentStatus::Conciliado);
    active.reconciled_at = Set(Some(now));
    active.updated_at = Set(now);
    let updated = active.update(db).await?;

    info!(tenant = %actor.tenant_id, payment = %updated.id, "Issued receipt {}", receipt_number);
    activity::log_update(
        db,
        actor,
        ActivityEntity::Finance,
        &updated.id,
        &display_name(&updated),
        json!({ "receiptNumber": receipt_number }),
    )
    .await;
    Ok(receipt_number)
}

/// Removes a payment record.
pub async fn delete_payment<C>(db: &C, actor: &Actor, id: &str) -> Result<()>
where
    C: ConnectionTrait,
{
    let existing = require_payment(db, &actor.tenant_id, id).await?;
    Payment::delete_by_id(existing.id.as_str()).exec(db).await?;
    activity::log_delete(db, actor, ActivityEntity::Finance, &existing.id, &display_name(&existing), serde_json::Value::Null)
        .await;
    Ok(())
}

/// Due date of a fee for the period containing `today`, as `YYYY-MM-DD`.
///
/// Returns `None` when the fee has no due-date configuration.
pub async fn due_date_for_fee<C>(db: &C, tenant_id: &str, fee_id: &str, today: NaiveDate) -> Result<Option<String>>
where
    C: ConnectionTrait,
{
    let Some(config) = due_dates::config_for_fee(db, tenant_id, fee_id).await? else {
        return Ok(None);
    };
    let rule = DueDateRule::from_config(&config)?;
    due_dates::resolve(&rule, today).map(Some)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::{
        core::financial::{
            due_dates::{NewDueDateConfig, add_due_date_config},
            fees::add_fee,
        },
        entities::due_date::PenaltyType,
        test_utils::*,
    };

    #[tokio::test]
    async fn test_add_payment_defaults_and_validation() -> Result<()> {
        let db = setup_test_db().await?;
        let actor = test_actor("tenant-1");

        let created = add_payment(&db, &actor, new_payment(1000.0, 0.0)).await?;
        assert_eq!(created.status, PaymentStatus::Pendiente);
        assert!(created.receipt_number.is_none());

        let mut blank_payer = new_payment(1000.0, 0.0);
        blank_payer.payer_name = " ".to_string();
        assert!(matches!(add_payment(&db, &actor, blank_payer).await, Err(Error::InvalidArgument { .. })));

        assert!(matches!(
            add_payment(&db, &actor, new_payment(0.0, 0.0)).await,
            Err(Error::InvalidArgument { .. })
        ));
        assert!(matches!(
            add_payment(&db, &actor, new_payment(100.0, -1.0)).await,
            Err(Error::InvalidArgument { .. })
        ));

        let mut no_reference = new_payment(1000.0, 0.0);
        no_reference.transaction_reference = String::new();
        assert!(matches!(add_payment(&db, &actor, no_reference).await, Err(Error::InvalidArgument { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_status_and_receipt() -> Result<()> {
        let db = setup_test_db().await?;
        let actor = test_actor("tenant-1");
        let payment = add_payment(&db, &actor, new_payment(1000.0, 1000.0)).await?;

        let paid = update_payment_status(&db, &actor, &payment.id, PaymentStatus::Pagado).await?;
        assert_eq!(paid.status, PaymentStatus::Pagado);
        assert!(paid.reconciled_at.is_none());

        let receipt = generate_receipt(&db, &actor, &payment.id).await?;
        assert!(receipt.starts_with("REC-"));
        let reconciled = get_payment(&db, "tenant-1", &payment.id).await?.unwrap();
        assert_eq!(reconciled.status, PaymentStatus::Conciliado);
        assert_eq!(reconciled.receipt_number.as_deref(), Some(receipt.as_str()));
        assert!(reconciled.reconciled_at.is_some());

        let other = test_actor("tenant-2");
        assert!(matches!(generate_receipt(&db, &other, &payment.id).await, Err(Error::NotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_list_delete() -> Result<()> {
        let db = setup_test_db().await?;
        let actor = test_actor("tenant-1");
        let payment = add_payment(&db, &actor, new_payment(1000.0, 0.0)).await?;
        add_payment(&db, &actor, new_payment(500.0, 0.0)).await?;
        assert_eq!(payment_records(&db, "tenant-1").await?.len(), 2);

        let updated = update_payment(
            &db,
            &actor,
            &payment.id,
            PaymentUpdate {
                amount_paid: Some(400.0),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(updated.amount_paid, 400.0);

        delete_payment(&db, &actor, &payment.id).await?;
        assert_eq!(payment_records(&db, "tenant-1").await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_due_date_for_fee() -> Result<()> {
        let db = setup_test_db().await?;
        let actor = test_actor("tenant-1");
        let fee = add_fee(&db, &actor, new_fee("Colegiatura", 5000.0)).await?;
        let today = NaiveDate::from_ymd_opt(2024, 11, 12).unwrap();

        assert_eq!(due_date_for_fee(&db, "tenant-1", &fee.id, today).await?, None);

        add_due_date_config(
            &db,
            &actor,
            NewDueDateConfig {
                fee_id: fee.id.clone(),
                rule: DueDateRule::MonthlyDay { day: 31 },
                warning_days_before: None,
                grace_period_days: 0,
                penalty_type: PenaltyType::Porcentaje,
                penalty_value: 0.0,
                apply_daily_penalty: false,
                max_penalty_amount: None,
                notes: None,
            },
        )
        .await?;
        assert_eq!(due_date_for_fee(&db, "tenant-1", &fee.id, today).await?.as_deref(), Some("2024-11-30"));
        Ok(())
    }
}
