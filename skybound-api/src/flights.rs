use axum::{
    extract::{Json, Path, State},
    routing::get,
    Router,
};
use skybound_core::{FlightDetail, SeatAvailability};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

/// Public flight reads; no token needed.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/flights/{flight_id}", get(get_flight))
        .route("/v1/flights/{flight_id}/availability", get(get_availability))
}

async fn get_flight(
    State(state): State<AppState>,
    Path(flight_id): Path<Uuid>,
) -> Result<Json<FlightDetail>, AppError> {
    let detail = state.bookings.get_flight_detail(flight_id).await?;
    Ok(Json(detail))
}

async fn get_availability(
    State(state): State<AppState>,
    Path(flight_id): Path<Uuid>,
) -> Result<Json<SeatAvailability>, AppError> {
    let seats = state.bookings.get_flight_availability(flight_id).await?;
    Ok(Json(seats))
}
