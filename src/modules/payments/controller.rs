use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
};
use schoolyard_core::AppError;
use schoolyard_models::payments::{
    CreatePaymentDto, PaginatedPaymentsResponse, Payment, PaymentFilterParams, PaymentSummary,
    RecordPaymentDto, UpdatePaymentDto,
};
use tracing::instrument;
use uuid::Uuid;

use super::service::PaymentService;
use crate::metrics::track_export;
use crate::state::AppState;
use crate::utils::export::{csv_response, to_csv_bytes, write_payments_csv};
use crate::validator::ValidatedJson;

#[utoipa::path(
    post,
    path = "/api/payments",
    request_body = CreatePaymentDto,
    responses(
        (status = 201, description = "Payment created", body = Payment),
        (status = 400, description = "Unknown student or academic year"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 422, description = "Invalid amounts")
    ),
    tag = "Payments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn create_payment(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<CreatePaymentDto>,
) -> Result<(StatusCode, Json<Payment>), AppError> {
    let payment = PaymentService::create_payment(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

#[utoipa::path(
    get,
    path = "/api/payments",
    params(PaymentFilterParams),
    responses(
        (status = 200, description = "Paginated payments", body = PaginatedPaymentsResponse),
        (status = 403, description = "Forbidden - admin only")
    ),
    tag = "Payments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_payments(
    State(state): State<AppState>,
    Query(filters): Query<PaymentFilterParams>,
) -> Result<Json<PaginatedPaymentsResponse>, AppError> {
    Ok(Json(PaymentService::get_payments(&state.db, filters).await?))
}

/// Totals due, paid and outstanding with counts per status
#[utoipa::path(
    get,
    path = "/api/payments/summary",
    params(PaymentFilterParams),
    responses(
        (status = 200, description = "Payment summary", body = PaymentSummary),
        (status = 403, description = "Forbidden - admin only")
    ),
    tag = "Payments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_payment_summary(
    State(state): State<AppState>,
    Query(filters): Query<PaymentFilterParams>,
) -> Result<Json<PaymentSummary>, AppError> {
    Ok(Json(PaymentService::get_summary(&state.db, &filters).await?))
}

#[utoipa::path(
    get,
    path = "/api/payments/export",
    params(PaymentFilterParams),
    responses(
        (status = 200, description = "CSV file", content_type = "text/csv"),
        (status = 403, description = "Forbidden - admin only")
    ),
    tag = "Payments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn export_payments(
    State(state): State<AppState>,
    Query(filters): Query<PaymentFilterParams>,
) -> Result<Response, AppError> {
    let payments = PaymentService::get_all_payments(&state.db, &filters).await?;
    let body = to_csv_bytes(|buf| write_payments_csv(buf, &payments))?;
    track_export("payments");
    Ok(csv_response("payments", body))
}

#[utoipa::path(
    get,
    path = "/api/payments/{id}",
    params(("id" = Uuid, Path, description = "Payment ID")),
    responses(
        (status = 200, description = "Payment details", body = Payment),
        (status = 404, description = "Payment not found")
    ),
    tag = "Payments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Payment>, AppError> {
    Ok(Json(PaymentService::get_payment_by_id(&state.db, id).await?))
}

#[utoipa::path(
    put,
    path = "/api/payments/{id}",
    params(("id" = Uuid, Path, description = "Payment ID")),
    request_body = UpdatePaymentDto,
    responses(
        (status = 200, description = "Payment updated", body = Payment),
        (status = 400, description = "amount_due below the amount paid"),
        (status = 404, description = "Payment not found")
    ),
    tag = "Payments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn update_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdatePaymentDto>,
) -> Result<Json<Payment>, AppError> {
    Ok(Json(PaymentService::update_payment(&state.db, id, dto).await?))
}

/// Add an installment to a payment
#[utoipa::path(
    post,
    path = "/api/payments/{id}/record",
    params(("id" = Uuid, Path, description = "Payment ID")),
    request_body = RecordPaymentDto,
    responses(
        (status = 200, description = "Installment recorded", body = Payment),
        (status = 400, description = "Overpayment"),
        (status = 404, description = "Payment not found")
    ),
    tag = "Payments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn record_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<RecordPaymentDto>,
) -> Result<Json<Payment>, AppError> {
    Ok(Json(
        PaymentService::record_installment(&state.db, id, dto).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/payments/{id}",
    params(("id" = Uuid, Path, description = "Payment ID")),
    responses(
        (status = 204, description = "Payment deleted"),
        (status = 404, description = "Payment not found")
    ),
    tag = "Payments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    PaymentService::delete_payment(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
