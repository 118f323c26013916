//! Financial business logic - Fees, due dates, payments and the totals built on them.
//!
//! All monetary amounts are plain `f64` in the fee's currency.

pub mod due_dates;
pub mod fees;
pub mod payments;
pub mod summary;

pub use due_dates::{DueDateRule, penalty, resolve};
pub use summary::FinancialSummary;
