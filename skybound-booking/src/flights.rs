use skybound_core::{BookingStore, FlightDetail, SeatAvailability};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::BookingError;

/// Read-only flight queries for callers choosing what to book.
pub struct FlightLookup {
    store: Arc<dyn BookingStore>,
}

impl FlightLookup {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }

    pub async fn get_flight_detail(&self, flight_id: Uuid) -> Result<FlightDetail, BookingError> {
        self.store
            .find_flight_detail(flight_id)
            .await
            .map_err(|e| BookingError::Server(format!("Database error: {}", e)))?
            .ok_or(BookingError::FlightNotFound(flight_id))
    }

    pub async fn get_availability(&self, flight_id: Uuid) -> Result<SeatAvailability, BookingError> {
        let flight = self
            .store
            .find_flight(flight_id)
            .await
            .map_err(|e| BookingError::Server(format!("Database error: {}", e)))?
            .ok_or(BookingError::FlightNotFound(flight_id))?;
        Ok(flight.seat_availability())
    }
}
