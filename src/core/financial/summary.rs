//! Payment totals shown on the finance dashboard.

use crate::{
    core::financial::payments,
    entities::payment::{self, PaymentStatus},
    errors::Result,
};
use chrono::NaiveDate;
use sea_orm::ConnectionTrait;
use serde::Serialize;

/// Aggregated view of a tenant's payments.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialSummary {
    /// Payments past due and not reconciled
    pub overdue_count: usize,
    /// Outstanding balance of the overdue payments
    pub total_pending: f64,
    /// Money received on paid or reconciled payments
    pub total_collected: f64,
    /// Everything ever billed
    pub total_scheduled: f64,
}

/// Payments whose due date is before `today` and that are not reconciled.
pub fn overdue(payments: &[payment::Model], today: NaiveDate) -> Vec<&payment::Model> {
    payments
        .iter()
        .filter(|p| p.due_date < today && p.status != PaymentStatus::Conciliado)
        .collect()
}

/// Sum of what is still owed on overdue payments. Overpayments count as zero.
pub fn total_pending(payments: &[payment::Model], today: NaiveDate) -> f64 {
    overdue(payments, today)
        .into_iter()
        .map(|p| (p.amount_expected - p.amount_paid).max(0.0))
        .sum()
}

/// Sum paid on payments marked paid or reconciled.
pub fn total_collected(payments: &[payment::Model]) -> f64 {
    payments
        .iter()
        .filter(|p| matches!(p.status, PaymentStatus::Pagado | PaymentStatus::Conciliado))
        .map(|p| p.amount_paid)
        .sum()
}

/// Sum expected across all payments.
pub fn total_scheduled(payments: &[payment::Model]) -> f64 {
    payments.iter().map(|p| p.amount_expected).sum()
}

/// Builds the summary from an in-memory list.
pub fn summarize(payments: &[payment::Model], today: NaiveDate) -> FinancialSummary {
    FinancialSummary {
        overdue_count: overdue(payments, today).len(),
        total_pending: total_pending(payments, today),
        total_collected: total_collected(payments),
        total_scheduled: total_scheduled(payments),
    }
}

/// Loads the tenant's payments and summarises them.
pub async fn financial_summary<C>(db: &C, tenant_id: &str, today: NaiveDate) -> Result<FinancialSummary>
where
    C: ConnectionTrait,
{
    let records = payments::payment_records(db, tenant_id).await?;
    Ok(summarize(&records, today))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use chrono::Utc;

    fn payment(due: NaiveDate, expected: f64, paid: f64, status: PaymentStatus) -> payment::Model {
        let now = Utc::now();
        payment::Model {
            id: uuid::Uuid::new_v4().to_string(),
            tenant_id: "tenant-1".to_string(),
            student_id: "s1".to_string(),
            student_name: "Ana".to_string(),
            fee_id: "f1".to_string(),
            fee_name: "Colegiatura".to_string(),
            payer_name: "María".to_string(),
            payer_email: "maria@correo.com".to_string(),
            due_date: due,
            billing_period: "2024-09".to_string(),
            amount_expected: expected,
            amount_paid: paid,
            currency: "DOP".to_string(),
            transaction_reference: "tx".to_string(),
            status,
            receipt_number: None,
            payment_date: None,
            reconciled_at: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_summary_totals() {
        let today = NaiveDate::from_ymd_opt(2024, 10, 1).unwrap();
        let past = NaiveDate::from_ymd_opt(2024, 9, 5).unwrap();
        let future = NaiveDate::from_ymd_opt(2024, 10, 5).unwrap();

        let payments = vec![
            payment(past, 1000.0, 400.0, PaymentStatus::Pendiente),
            payment(past, 1000.0, 1200.0, PaymentStatus::Pagado),
            payment(past, 1000.0, 1000.0, PaymentStatus::Conciliado),
            payment(future, 500.0, 0.0, PaymentStatus::Pendiente),
            payment(today, 300.0, 0.0, PaymentStatus::Fallido),
        ];

        let summary = summarize(&payments, today);
        assert_eq!(summary.overdue_count, 2);
        assert_eq!(summary.total_pending, 600.0);
        assert_eq!(summary.total_collected, 2200.0);
        assert_eq!(summary.total_scheduled, 3800.0);
    }

    #[test]
    fn test_empty_summary() {
        let today = NaiveDate::from_ymd_opt(2024, 10, 1).unwrap();
        let summary = summarize(&[], today);
        assert_eq!(summary.overdue_count, 0);
        assert_eq!(summary.total_scheduled, 0.0);
    }
}
