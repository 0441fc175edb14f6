use anyhow::{Context, anyhow};
use schoolyard_core::{AppError, PaginationMeta};
use schoolyard_models::payments::{
    CreatePaymentDto, PaginatedPaymentsResponse, Payment, PaymentFilterParams, PaymentStatus,
    PaymentStatusTotals, PaymentSummary, RecordPaymentDto, UpdatePaymentDto, apply_installment,
};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::metrics::track_payment_recorded;
use crate::utils::db::{not_found, write_error};

const PAYMENT_SELECT: &str = r#"SELECT p.id, p.student_id,
       u.first_name || ' ' || u.last_name AS student_name, s.admission_number,
       p.academic_year, p.description, p.amount_due, p.amount_paid, p.status,
       p.due_date, p.last_paid_on, p.method, p.reference, p.created_at, p.updated_at
FROM payments p
JOIN students s ON s.id = p.student_id
JOIN users u ON u.id = s.user_id"#;

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filters: &PaymentFilterParams) {
    qb.push(" WHERE 1 = 1");
    if let Some(student_id) = filters.student_id {
        qb.push(" AND p.student_id = ").push_bind(student_id);
    }
    if let Some(status) = filters.status {
        qb.push(" AND p.status = ").push_bind(status);
    }
    if let Some(academic_year) = &filters.academic_year {
        qb.push(" AND p.academic_year = ")
            .push_bind(academic_year.clone());
    }
}

pub struct PaymentService;

impl PaymentService {
    /// Creates a fee. The status follows from the amounts.
    #[instrument(skip(db, dto), fields(student_id = %dto.student_id, amount_due = dto.amount_due))]
    pub async fn create_payment(db: &PgPool, dto: CreatePaymentDto) -> Result<Payment, AppError> {
        let amount_paid = dto.amount_paid.unwrap_or(0);
        let status = PaymentStatus::from_amounts(dto.amount_due, amount_paid);
        let last_paid_on = if amount_paid > 0 {
            Some(dto.paid_on.unwrap_or_else(|| chrono::Utc::now().date_naive()))
        } else {
            None
        };

        let id = sqlx::query_scalar::<_, Uuid>(
            r#"INSERT INTO payments
                   (student_id, academic_year, description, amount_due, amount_paid, status,
                    due_date, last_paid_on, method, reference)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
               RETURNING id"#,
        )
        .bind(dto.student_id)
        .bind(&dto.academic_year)
        .bind(dto.description.trim())
        .bind(dto.amount_due)
        .bind(amount_paid)
        .bind(status)
        .bind(dto.due_date)
        .bind(last_paid_on)
        .bind(&dto.method)
        .bind(&dto.reference)
        .fetch_one(db)
        .await
        .map_err(|e| write_error(e, "Payment already exists"))?;

        if amount_paid > 0 {
            track_payment_recorded(amount_paid);
        }
        info!(payment_id = %id, status = %status, "Payment created");

        Self::get_payment_by_id(db, id).await
    }

    /// Adds an installment. Paying more than the outstanding balance is
    /// rejected.
    #[instrument(skip(db, dto), fields(amount = dto.amount))]
    pub async fn record_installment(
        db: &PgPool,
        id: Uuid,
        dto: RecordPaymentDto,
    ) -> Result<Payment, AppError> {
        let mut tx = db.begin().await?;

        let (amount_due, amount_paid) = sqlx::query_as::<_, (i64, i64)>(
            "SELECT amount_due, amount_paid FROM payments WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| not_found("Payment"))?;

        let (new_paid, status) =
            apply_installment(amount_due, amount_paid, dto.amount).map_err(|message| {
                warn!(payment_id = %id, "Overpayment rejected");
                AppError::bad_request(anyhow!(message))
            })?;

        sqlx::query(
            r#"UPDATE payments SET
                   amount_paid = $1,
                   status = $2,
                   last_paid_on = $3,
                   method = COALESCE($4, method),
                   reference = COALESCE($5, reference)
               WHERE id = $6"#,
        )
        .bind(new_paid)
        .bind(status)
        .bind(dto.paid_on.unwrap_or_else(|| chrono::Utc::now().date_naive()))
        .bind(&dto.method)
        .bind(&dto.reference)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        track_payment_recorded(dto.amount);
        info!(payment_id = %id, status = %status, "Installment recorded");

        Self::get_payment_by_id(db, id).await
    }

    #[instrument(skip(db, dto))]
    pub async fn update_payment(
        db: &PgPool,
        id: Uuid,
        dto: UpdatePaymentDto,
    ) -> Result<Payment, AppError> {
        let mut tx = db.begin().await?;

        let (amount_due, amount_paid) = sqlx::query_as::<_, (i64, i64)>(
            "SELECT amount_due, amount_paid FROM payments WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| not_found("Payment"))?;

        let amount_due = dto.amount_due.unwrap_or(amount_due);
        if amount_due < amount_paid {
            return Err(AppError::bad_request(anyhow!(
                "amount_due must not be below the {} already paid",
                amount_paid
            )));
        }

        sqlx::query(
            r#"UPDATE payments SET
                   description = COALESCE($1, description),
                   due_date = COALESCE($2, due_date),
                   amount_due = $3,
                   status = $4
               WHERE id = $5"#,
        )
        .bind(dto.description.as_deref().map(str::trim))
        .bind(dto.due_date)
        .bind(amount_due)
        .bind(PaymentStatus::from_amounts(amount_due, amount_paid))
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Self::get_payment_by_id(db, id).await
    }

    #[instrument(skip(db))]
    pub async fn get_payments(
        db: &PgPool,
        filters: PaymentFilterParams,
    ) -> Result<PaginatedPaymentsResponse, AppError> {
        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM payments p");
        push_filters(&mut count_qb, &filters);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(db)
            .await
            .context("Failed to count payments")
            .map_err(AppError::database)?;

        let mut qb = QueryBuilder::<Postgres>::new(PAYMENT_SELECT);
        push_filters(&mut qb, &filters);
        qb.push(" ORDER BY p.created_at DESC LIMIT ")
            .push_bind(filters.pagination.limit())
            .push(" OFFSET ")
            .push_bind(filters.pagination.offset());

        let payments = qb
            .build_query_as::<Payment>()
            .fetch_all(db)
            .await
            .context("Failed to fetch payments")
            .map_err(AppError::database)?;

        Ok(PaginatedPaymentsResponse {
            data: payments,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    /// Every payment matching the filters, for export.
    #[instrument(skip(db))]
    pub async fn get_all_payments(
        db: &PgPool,
        filters: &PaymentFilterParams,
    ) -> Result<Vec<Payment>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(PAYMENT_SELECT);
        push_filters(&mut qb, filters);
        qb.push(" ORDER BY s.admission_number, p.created_at");

        let payments = qb.build_query_as::<Payment>().fetch_all(db).await?;
        Ok(payments)
    }

    #[instrument(skip(db))]
    pub async fn get_summary(
        db: &PgPool,
        filters: &PaymentFilterParams,
    ) -> Result<PaymentSummary, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(
            r#"SELECT p.status, COUNT(*),
                      COALESCE(SUM(p.amount_due), 0)::BIGINT,
                      COALESCE(SUM(p.amount_paid), 0)::BIGINT
               FROM payments p"#,
        );
        push_filters(&mut qb, filters);
        qb.push(" GROUP BY p.status");

        let rows = qb
            .build_query_as::<PaymentStatusTotals>()
            .fetch_all(db)
            .await
            .context("Failed to summarize payments")
            .map_err(AppError::database)?;

        Ok(PaymentSummary::from_totals(rows))
    }

    #[instrument(skip(db))]
    pub async fn get_payment_by_id(db: &PgPool, id: Uuid) -> Result<Payment, AppError> {
        sqlx::query_as::<_, Payment>(&format!("{} WHERE p.id = $1", PAYMENT_SELECT))
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| not_found("Payment"))
    }

    #[instrument(skip(db))]
    pub async fn delete_payment(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM payments WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(not_found("Payment"));
        }
        Ok(())
    }
}
