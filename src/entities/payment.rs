//! Payment entity - A payment made (or expected) against a fee.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Payment lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Not yet paid
    #[sea_orm(string_value = "pendiente")]
    Pendiente,
    /// Paid, not yet reconciled
    #[sea_orm(string_value = "pagado")]
    Pagado,
    /// Paid and reconciled against the bank
    #[sea_orm(string_value = "conciliado")]
    Conciliado,
    /// Payment attempt failed
    #[sea_orm(string_value = "fallido")]
    Fallido,
}

/// Payment record database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "financial_payments")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Owning tenant
    pub tenant_id: String,
    /// Student the payment is for
    pub student_id: String,
    /// Student name, denormalised
    pub student_name: String,
    /// Fee being paid
    pub fee_id: String,
    /// Fee name, denormalised
    pub fee_name: String,
    /// Who paid
    pub payer_name: String,
    /// Payer email
    pub payer_email: String,
    /// When the payment is due
    pub due_date: Date,
    /// Period covered (e.g., "2024-09")
    pub billing_period: String,
    /// Amount owed
    pub amount_expected: f64,
    /// Amount received so far
    pub amount_paid: f64,
    /// ISO currency code
    pub currency: String,
    /// Reference returned by the payment gateway
    pub transaction_reference: String,
    /// Lifecycle state
    pub status: PaymentStatus,
    /// Receipt number once issued
    pub receipt_number: Option<String>,
    /// When the money arrived
    pub payment_date: Option<DateTimeUtc>,
    /// When the payment was reconciled
    pub reconciled_at: Option<DateTimeUtc>,
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
