use axum::{
    extract::{Json, Path, State},
    middleware,
    routing::{get, post},
    Extension, Router,
};
use skybound_booking::PaymentRequest;
use skybound_core::Payment;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::{customer_auth_middleware, AuthUser};
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/v1/payments", post(process_payment))
        .route("/v1/payments/{payment_id}", get(get_payment))
        .route_layer(middleware::from_fn_with_state(state, customer_auth_middleware))
}

async fn process_payment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<PaymentRequest>,
) -> Result<Json<Payment>, AppError> {
    info!(
        "Payment from user {} for booking {}: {} {}",
        user.id, req.booking_id, req.amount, req.currency
    );
    let payment = state.bookings.process_payment(user.id, req).await?;
    Ok(Json(payment))
}

async fn get_payment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(payment_id): Path<Uuid>,
) -> Result<Json<Payment>, AppError> {
    let payment = state.bookings.get_payment(payment_id, user.id).await?;
    Ok(Json(payment))
}
