use axum::{
    extract::{Json, Path, State},
    middleware,
    routing::{get, post, put},
    Extension, Router,
};
use serde_json::{json, Value};
use skybound_booking::{CreateBookingRequest, UpdateBookingRequest};
use skybound_core::BookingDetail;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::{customer_auth_middleware, AuthUser};
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/v1/bookings", post(create_booking).get(list_bookings))
        .route("/v1/bookings/reference/generate", get(generate_reference))
        .route("/v1/bookings/{booking_id}", get(get_booking).put(update_booking))
        .route("/v1/bookings/{booking_id}/cancel", put(cancel_booking))
        .route_layer(middleware::from_fn_with_state(state, customer_auth_middleware))
}

async fn create_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<Json<BookingDetail>, AppError> {
    info!(
        "Booking request from user {}: {} with {} flights, {} passengers",
        user.id,
        req.trip_type,
        req.flights.len(),
        req.passengers.len()
    );
    let detail = state.bookings.create_booking(user.id, req).await?;
    Ok(Json(detail))
}

async fn list_bookings(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<BookingDetail>>, AppError> {
    let bookings = state.bookings.list_bookings(user.id).await?;
    Ok(Json(bookings))
}

async fn get_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<BookingDetail>, AppError> {
    let detail = state
        .bookings
        .get_booking_detail(booking_id, Some(user.id))
        .await?;
    Ok(Json(detail))
}

async fn update_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(booking_id): Path<Uuid>,
    Json(req): Json<UpdateBookingRequest>,
) -> Result<Json<BookingDetail>, AppError> {
    let detail = state
        .bookings
        .update_booking(booking_id, user.id, req)
        .await?;
    Ok(Json(detail))
}

async fn cancel_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<BookingDetail>, AppError> {
    let detail = state.bookings.cancel_booking(booking_id, user.id).await?;
    Ok(Json(detail))
}

async fn generate_reference(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "booking_reference": state.bookings.generate_reference() }))
}
