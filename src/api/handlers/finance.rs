//! Admin finance endpoints: fee catalog, due-date rules, payments and the
//! summary widget.

use super::{CreatedResult, EmptyResult, HandlerResult, found, today};
use crate::{
    api::{AppState, extract::AdminCaller},
    core::financial::{
        self, DueDateRule, FinancialSummary,
        due_dates::{self, DueDateConfigUpdate, NewDueDateConfig, ResolvedDueDate},
        fees::{self, FeeUpdate, NewFee},
        payments::{self, NewPayment, PaymentUpdate},
    },
    entities::{
        due_date as due_date_entity, fee as fee_entity,
        payment::{self as payment_entity, PaymentStatus},
    },
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Body of `POST /v1/admin/finance/due-dates/resolve`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveRequest {
    /// Rule to evaluate
    pub rule: DueDateRule,
    /// Date inside the period of interest, today when absent
    #[serde(default)]
    pub reference_date: Option<NaiveDate>,
}

/// A resolved due date.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveResponse {
    /// `YYYY-MM-DD`
    pub due_date: String,
}

/// The configured due date of one fee.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeDueDate {
    /// `None` when the fee has no configuration
    pub due_date: Option<String>,
}

/// Body of `PUT /v1/admin/finance/payments/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct PaymentStatusBody {
    /// New status
    pub status: PaymentStatus,
}

/// A freshly issued receipt.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    /// `REC-{epoch millis}`
    pub receipt_number: String,
}

/// Late fee owed on one payment as of today.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PenaltyResponse {
    /// Outstanding balance the penalty is computed on
    pub amount_due: f64,
    /// Penalty amount, 0 without a configuration or within grace
    pub penalty: f64,
}

// ---------------------------------------------------------------------------
// Fees
// ---------------------------------------------------------------------------

/// GET /v1/admin/finance/fees
pub async fn list_fees(State(state): State<AppState>, admin: AdminCaller) -> HandlerResult<Vec<fee_entity::Model>> {
    Ok(Json(fees::fee_catalog(&state.db, admin.tenant()).await?))
}

/// GET /v1/admin/finance/fees/{id}
pub async fn get_fee(
    State(state): State<AppState>,
    admin: AdminCaller,
    Path(id): Path<String>,
) -> HandlerResult<fee_entity::Model> {
    let record = fees::get_fee(&state.db, admin.tenant(), &id).await?;
    Ok(Json(found(record, "Tarifa no encontrada")?))
}

/// POST /v1/admin/finance/fees
pub async fn create_fee(
    State(state): State<AppState>,
    admin: AdminCaller,
    Json(data): Json<NewFee>,
) -> CreatedResult<fee_entity::Model> {
    let record = fees::add_fee(&state.db, &admin.actor, data).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// PUT /v1/admin/finance/fees/{id}
pub async fn update_fee(
    State(state): State<AppState>,
    admin: AdminCaller,
    Path(id): Path<String>,
    Json(changes): Json<FeeUpdate>,
) -> HandlerResult<fee_entity::Model> {
    Ok(Json(fees::update_fee(&state.db, &admin.actor, &id, changes).await?))
}

/// POST /v1/admin/finance/fees/{id}/toggle
pub async fn toggle_fee(
    State(state): State<AppState>,
    admin: AdminCaller,
    Path(id): Path<String>,
) -> HandlerResult<fee_entity::Model> {
    Ok(Json(fees::toggle_fee(&state.db, &admin.actor, &id).await?))
}

/// DELETE /v1/admin/finance/fees/{id}
pub async fn delete_fee(
    State(state): State<AppState>,
    admin: AdminCaller,
    Path(id): Path<String>,
) -> EmptyResult {
    fees::delete_fee(&state.db, &admin.actor, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/admin/finance/fees/{id}/due-date
pub async fn fee_due_date(
    State(state): State<AppState>,
    admin: AdminCaller,
    Path(id): Path<String>,
) -> HandlerResult<FeeDueDate> {
    let due_date = payments::due_date_for_fee(&state.db, admin.tenant(), &id, today()).await?;
    Ok(Json(FeeDueDate { due_date }))
}

// ---------------------------------------------------------------------------
// Due dates
// ---------------------------------------------------------------------------

/// GET /v1/admin/finance/due-dates
pub async fn list_due_dates(
    State(state): State<AppState>,
    admin: AdminCaller,
) -> HandlerResult<Vec<ResolvedDueDate>> {
    Ok(Json(due_dates::due_date_configs(&state.db, admin.tenant(), today()).await?))
}

/// POST /v1/admin/finance/due-dates
pub async fn create_due_date(
    State(state): State<AppState>,
    admin: AdminCaller,
    Json(data): Json<NewDueDateConfig>,
) -> CreatedResult<due_date_entity::Model> {
    let record = due_dates::add_due_date_config(&state.db, &admin.actor, data).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// PUT /v1/admin/finance/due-dates/{id}
pub async fn update_due_date(
    State(state): State<AppState>,
    admin: AdminCaller,
    Path(id): Path<String>,
    Json(changes): Json<DueDateConfigUpdate>,
) -> HandlerResult<due_date_entity::Model> {
    Ok(Json(due_dates::update_due_date_config(&state.db, &admin.actor, &id, changes).await?))
}

/// DELETE /v1/admin/finance/due-dates/{id}
pub async fn delete_due_date(
    State(state): State<AppState>,
    admin: AdminCaller,
    Path(id): Path<String>,
) -> EmptyResult {
    due_dates::delete_due_date_config(&state.db, &admin.actor, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /v1/admin/finance/due-dates/resolve
///
/// Previews a rule without saving it.
pub async fn resolve_due_date(_admin: AdminCaller, Json(request): Json<ResolveRequest>) -> HandlerResult<ResolveResponse> {
    let reference = request.reference_date.unwrap_or_else(today);
    let due_date = financial::resolve(&request.rule, reference)?;
    Ok(Json(ResolveResponse { due_date }))
}

// ---------------------------------------------------------------------------
// Payments
// ---------------------------------------------------------------------------

/// GET /v1/admin/finance/payments
pub async fn list_payments(
    State(state): State<AppState>,
    admin: AdminCaller,
) -> HandlerResult<Vec<payment_entity::Model>> {
    Ok(Json(payments::payment_records(&state.db, admin.tenant()).await?))
}

/// GET /v1/admin/finance/payments/{id}
pub async fn get_payment(
    State(state): State<AppState>,
    admin: AdminCaller,
    Path(id): Path<String>,
) -> HandlerResult<payment_entity::Model> {
    let record = payments::get_payment(&state.db, admin.tenant(), &id).await?;
    Ok(Json(found(record, "Pago no encontrado")?))
}

/// POST /v1/admin/finance/payments
pub async fn create_payment(
    State(state): State<AppState>,
    admin: AdminCaller,
    Json(data): Json<NewPayment>,
) -> CreatedResult<payment_entity::Model> {
    let record = payments::add_payment(&state.db, &admin.actor, data).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// PUT /v1/admin/finance/payments/{id}
pub async fn update_payment(
    State(state): State<AppState>,
    admin: AdminCaller,
    Path(id): Path<String>,
    Json(changes): Json<PaymentUpdate>,
) -> HandlerResult<payment_entity::Model> {
    Ok(Json(payments::update_payment(&state.db, &admin.actor, &id, changes).await?))
}

/// PUT /v1/admin/finance/payments/{id}/status
pub async fn update_payment_status(
    State(state): State<AppState>,
    admin: AdminCaller,
    Path(id): Path<String>,
    Json(body): Json<PaymentStatusBody>,
) -> HandlerResult<payment_entity::Model> {
    Ok(Json(payments::update_payment_status(&state.db, &admin.actor, &id, body.status).await?))
}

/// POST /v1/admin/finance/payments/{id}/receipt
pub async fn generate_receipt(
    State(state): State<AppState>,
    admin: AdminCaller,
    Path(id): Path<String>,
) -> HandlerResult<Receipt> {
    let receipt_number = payments::generate_receipt(&state.db, &admin.actor, &id).await?;
    Ok(Json(Receipt { receipt_number }))
}

/// GET /v1/admin/finance/payments/{id}/penalty
pub async fn payment_penalty(
    State(state): State<AppState>,
    admin: AdminCaller,
    Path(id): Path<String>,
) -> HandlerResult<PenaltyResponse> {
    let tenant = admin.tenant();
    let record = found(payments::get_payment(&state.db, tenant, &id).await?, "Pago no encontrado")?;
    let amount_due = (record.amount_expected - record.amount_paid).max(0.0);
    let penalty = due_dates::config_for_fee(&state.db, tenant, &record.fee_id)
        .await?
        .map_or(0.0, |config| financial::penalty(&config, amount_due, record.due_date, today()));
    Ok(Json(PenaltyResponse { amount_due, penalty }))
}

/// DELETE /v1/admin/finance/payments/{id}
pub async fn delete_payment(
    State(state): State<AppState>,
    admin: AdminCaller,
    Path(id): Path<String>,
) -> EmptyResult {
    payments::delete_payment(&state.db, &admin.actor, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/admin/finance/summary
pub async fn summary(State(state): State<AppState>, admin: AdminCaller) -> HandlerResult<FinancialSummary> {
    Ok(Json(financial::summary::financial_summary(&state.db, admin.tenant(), today()).await?))
}
