//! Fee payments.
//!
//! Amounts are integer minor units (cents). A payment's status is never set
//! directly; it follows from `amount_paid` against `amount_due`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use schoolyard_core::query::{
    deserialize_optional_parsed, deserialize_optional_string, deserialize_optional_uuid,
};
use schoolyard_core::{PaginationMeta, PaginationParams};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::common::validate_academic_year;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, sqlx::Type,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
pub enum PaymentStatus {
    Paid,
    Unpaid,
    Partial,
}

impl PaymentStatus {
    pub fn from_amounts(amount_due: i64, amount_paid: i64) -> Self {
        if amount_paid >= amount_due {
            PaymentStatus::Paid
        } else if amount_paid > 0 {
            PaymentStatus::Partial
        } else {
            PaymentStatus::Unpaid
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Paid => "paid",
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Partial => "partial",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "paid" => Ok(PaymentStatus::Paid),
            "unpaid" => Ok(PaymentStatus::Unpaid),
            "partial" => Ok(PaymentStatus::Partial),
            other => Err(format!("invalid payment status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Payment {
    pub id: Uuid,
    pub student_id: Uuid,
    pub student_name: String,
    pub admission_number: String,
    pub academic_year: String,
    pub description: String,
    /// Minor units
    pub amount_due: i64,
    /// Minor units
    pub amount_paid: i64,
    pub status: PaymentStatus,
    pub due_date: Option<NaiveDate>,
    pub last_paid_on: Option<NaiveDate>,
    pub method: Option<String>,
    pub reference: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    pub fn outstanding(&self) -> i64 {
        (self.amount_due - self.amount_paid).max(0)
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_initial_amounts"))]
pub struct CreatePaymentDto {
    pub student_id: Uuid,
    #[validate(custom(function = "validate_academic_year"))]
    pub academic_year: String,
    #[validate(length(min = 1, max = 255))]
    pub description: String,
    #[validate(range(min = 1, message = "amount_due must be greater than zero"))]
    pub amount_due: i64,
    #[validate(range(min = 0, message = "amount_paid must not be negative"))]
    pub amount_paid: Option<i64>,
    pub due_date: Option<NaiveDate>,
    pub paid_on: Option<NaiveDate>,
    #[validate(length(max = 50))]
    pub method: Option<String>,
    #[validate(length(max = 100))]
    pub reference: Option<String>,
}

fn validate_initial_amounts(dto: &CreatePaymentDto) -> Result<(), ValidationError> {
    if dto.amount_paid.unwrap_or(0) > dto.amount_due {
        return Err(ValidationError::new("amount_paid")
            .with_message("amount_paid must not exceed amount_due".into()));
    }
    Ok(())
}

/// An installment added to an existing payment.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RecordPaymentDto {
    #[validate(range(min = 1, message = "amount must be greater than zero"))]
    pub amount: i64,
    #[validate(length(max = 50))]
    pub method: Option<String>,
    #[validate(length(max = 100))]
    pub reference: Option<String>,
    /// Defaults to today
    pub paid_on: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdatePaymentDto {
    #[validate(length(min = 1, max = 255))]
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    /// May not drop below the amount already paid
    #[validate(range(min = 1, message = "amount_due must be greater than zero"))]
    pub amount_due: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaymentFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub student_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_parsed")]
    pub status: Option<PaymentStatus>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub academic_year: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedPaymentsResponse {
    pub data: Vec<Payment>,
    pub meta: PaginationMeta,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PaymentSummary {
    pub count: i64,
    pub total_due: i64,
    pub total_paid: i64,
    pub outstanding: i64,
    pub paid_count: i64,
    pub partial_count: i64,
    pub unpaid_count: i64,
}

/// One `GROUP BY status` row: `(status, count, sum(amount_due), sum(amount_paid))`.
pub type PaymentStatusTotals = (PaymentStatus, i64, i64, i64);

impl PaymentSummary {
    pub fn from_totals<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = PaymentStatusTotals>,
    {
        let mut summary = Self::default();
        for (status, count, due, paid) in rows {
            summary.count += count;
            summary.total_due += due;
            summary.total_paid += paid;
            match status {
                PaymentStatus::Paid => summary.paid_count += count,
                PaymentStatus::Partial => summary.partial_count += count,
                PaymentStatus::Unpaid => summary.unpaid_count += count,
            }
        }
        summary.outstanding = (summary.total_due - summary.total_paid).max(0);
        summary
    }
}

/// Applies an installment, refusing to overpay.
///
/// Returns the new amount paid and status.
pub fn apply_installment(
    amount_due: i64,
    amount_paid: i64,
    amount: i64,
) -> Result<(i64, PaymentStatus), String> {
    let outstanding = amount_due - amount_paid;
    if amount > outstanding {
        return Err(format!(
            "Payment of {} exceeds the outstanding balance of {}",
            amount,
            outstanding.max(0)
        ));
    }
    let paid = amount_paid + amount;
    Ok((paid, PaymentStatus::from_amounts(amount_due, paid)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_amounts() {
        assert_eq!(PaymentStatus::from_amounts(50_000, 0), PaymentStatus::Unpaid);
        assert_eq!(PaymentStatus::from_amounts(50_000, 1), PaymentStatus::Partial);
        assert_eq!(PaymentStatus::from_amounts(50_000, 49_999), PaymentStatus::Partial);
        assert_eq!(PaymentStatus::from_amounts(50_000, 50_000), PaymentStatus::Paid);
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("partial".parse::<PaymentStatus>(), Ok(PaymentStatus::Partial));
        assert!("overdue".parse::<PaymentStatus>().is_err());
    }

    #[test]
    fn test_apply_installment() {
        assert_eq!(
            apply_installment(10_000, 2_500, 2_500),
            Ok((5_000, PaymentStatus::Partial))
        );
        assert_eq!(
            apply_installment(10_000, 5_000, 5_000),
            Ok((10_000, PaymentStatus::Paid))
        );
        assert!(apply_installment(10_000, 5_000, 5_001).is_err());
        assert!(apply_installment(10_000, 10_000, 1).is_err());
    }

    #[test]
    fn test_summary_from_totals() {
        let summary = PaymentSummary::from_totals([
            (PaymentStatus::Paid, 2, 100_000, 100_000),
            (PaymentStatus::Partial, 1, 50_000, 20_000),
            (PaymentStatus::Unpaid, 3, 90_000, 0),
        ]);
        assert_eq!(summary.count, 6);
        assert_eq!(summary.total_due, 240_000);
        assert_eq!(summary.total_paid, 120_000);
        assert_eq!(summary.outstanding, 120_000);
        assert_eq!(summary.paid_count, 2);
        assert_eq!(summary.partial_count, 1);
        assert_eq!(summary.unpaid_count, 3);
    }

    fn create_dto(amount_due: i64, amount_paid: Option<i64>) -> CreatePaymentDto {
        CreatePaymentDto {
            student_id: Uuid::new_v4(),
            academic_year: "2024-2025".to_string(),
            description: "First term tuition".to_string(),
            amount_due,
            amount_paid,
            due_date: None,
            paid_on: None,
            method: None,
            reference: None,
        }
    }

    #[test]
    fn test_create_payment_validation() {
        assert!(create_dto(150_000, None).validate().is_ok());
        assert!(create_dto(150_000, Some(150_000)).validate().is_ok());
        assert!(create_dto(0, None).validate().is_err());
        assert!(create_dto(150_000, Some(-5)).validate().is_err());
        assert!(create_dto(150_000, Some(150_001)).validate().is_err());
    }

    #[test]
    fn test_status_is_not_accepted_from_clients() {
        let json = format!(
            r#"{{"student_id":"{}","academic_year":"2024-2025","description":"Bus","amount_due":500,"status":"paid"}}"#,
            Uuid::new_v4()
        );
        // Unknown fields are ignored; status is derived later.
        let dto: CreatePaymentDto = serde_json::from_str(&json).unwrap();
        assert_eq!(dto.amount_paid, None);
    }
}
