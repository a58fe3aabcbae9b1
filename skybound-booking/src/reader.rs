use skybound_core::{Booking, BookingDetail, BookingStore};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::error::BookingError;

/// Builds the joined booking view: booking row, flight legs with their
/// flight, airline and airports, and passengers.
pub struct BookingReader {
    store: Arc<dyn BookingStore>,
}

impl BookingReader {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }

    /// With `owner` set, bookings of other users are reported as not found.
    pub async fn get_booking_detail(
        &self,
        booking_id: Uuid,
        owner: Option<Uuid>,
    ) -> Result<BookingDetail, BookingError> {
        let booking = self
            .store
            .find_booking(booking_id, owner)
            .await
            .map_err(|e| BookingError::Server(format!("Failed to retrieve booking: {}", e)))?
            .ok_or(BookingError::NotFound(booking_id))?;

        Ok(self.compose(booking).await)
    }

    /// Every booking of a user, newest first.
    pub async fn list_bookings(&self, user_id: Uuid) -> Result<Vec<BookingDetail>, BookingError> {
        let bookings = self
            .store
            .list_bookings(user_id)
            .await
            .map_err(|e| BookingError::Server(format!("Failed to retrieve bookings: {}", e)))?;

        let mut details = Vec::with_capacity(bookings.len());
        for booking in bookings {
            details.push(self.compose(booking).await);
        }
        Ok(details)
    }

    // Legs and passengers degrade to empty lists when their fetch fails.
    async fn compose(&self, booking: Booking) -> BookingDetail {
        let flights = match self.store.find_booking_flights(booking.id).await {
            Ok(flights) => flights,
            Err(e) => {
                warn!("Could not load flights of booking {}: {}", booking.id, e);
                Vec::new()
            }
        };

        let passengers = match self.store.find_passengers(booking.id).await {
            Ok(passengers) => passengers,
            Err(e) => {
                warn!("Could not load passengers of booking {}: {}", booking.id, e);
                Vec::new()
            }
        };

        BookingDetail {
            booking,
            flights,
            passengers,
        }
    }
}
