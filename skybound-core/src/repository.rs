use async_trait::async_trait;
use uuid::Uuid;

use crate::booking::{
    Booking, BookingFlight, BookingFlightDetail, BookingStatus, NewBooking, NewBookingFlight,
    NewPassenger, Passenger, PassengerChanges,
};
use crate::flight::{CabinClass, Flight, FlightDetail};
use crate::payment::{NewPayment, Payment};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Record not found: {0}")]
    NotFound(String),
    /// A unique constraint rejected the write.
    #[error("Conflicting record: {0}")]
    Conflict(String),
    #[error("Data store error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Row-level access to flights, bookings and their owned rows.
///
/// Every method is an independent write or read; the trait offers no
/// cross-call atomicity. Callers that need all-or-nothing behaviour across
/// calls have to compensate themselves.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn find_flight(&self, flight_id: Uuid) -> StoreResult<Option<Flight>>;

    /// A flight joined with its airline and both airports.
    async fn find_flight_detail(&self, flight_id: Uuid) -> StoreResult<Option<FlightDetail>>;

    /// Overwrite the remaining seat count of one cabin and return the flight as stored.
    async fn set_available_seats(
        &self,
        flight_id: Uuid,
        cabin: CabinClass,
        count: i32,
    ) -> StoreResult<Flight>;

    /// Atomically take `seats` from a cabin if at least that many remain.
    ///
    /// Returns the new count, or `None` when the cabin has fewer than `seats`
    /// left (nothing is written in that case).
    async fn try_deduct_seats(
        &self,
        flight_id: Uuid,
        cabin: CabinClass,
        seats: i32,
    ) -> StoreResult<Option<i32>>;

    /// Atomically give `seats` back to a cabin and return the new count.
    async fn release_seats(&self, flight_id: Uuid, cabin: CabinClass, seats: i32)
        -> StoreResult<i32>;

    /// Insert a booking. A duplicate booking reference yields `StoreError::Conflict`.
    async fn insert_booking(&self, booking: &NewBooking) -> StoreResult<Booking>;

    async fn insert_booking_flights(
        &self,
        links: &[NewBookingFlight],
    ) -> StoreResult<Vec<BookingFlight>>;

    async fn insert_passengers(&self, passengers: &[NewPassenger]) -> StoreResult<Vec<Passenger>>;

    async fn delete_booking_flights(&self, booking_id: Uuid) -> StoreResult<()>;

    /// Delete a booking together with its flight links and passengers.
    async fn delete_booking(&self, booking_id: Uuid) -> StoreResult<()>;

    /// Find a booking by id, optionally restricted to one owner.
    async fn find_booking(
        &self,
        booking_id: Uuid,
        owner: Option<Uuid>,
    ) -> StoreResult<Option<Booking>>;

    /// All bookings of a user, newest first.
    async fn list_bookings(&self, user_id: Uuid) -> StoreResult<Vec<Booking>>;

    async fn find_booking_flights(&self, booking_id: Uuid)
        -> StoreResult<Vec<BookingFlightDetail>>;

    async fn find_passengers(&self, booking_id: Uuid) -> StoreResult<Vec<Passenger>>;

    /// Move an owned booking to `to` if its current status is one of `from`.
    ///
    /// The status check and the write happen as one atomic step. `None` means
    /// no booking of `owner` with that id is in any of the `from` statuses.
    async fn transition_booking_status(
        &self,
        booking_id: Uuid,
        owner: Uuid,
        from: &[BookingStatus],
        to: BookingStatus,
    ) -> StoreResult<Option<Booking>>;

    /// Apply edits to one passenger of a booking. `None` when the passenger
    /// does not belong to that booking.
    async fn update_passenger(
        &self,
        booking_id: Uuid,
        changes: &PassengerChanges,
    ) -> StoreResult<Option<Passenger>>;

    async fn insert_payment(&self, payment: &NewPayment) -> StoreResult<Payment>;

    /// Find a payment whose booking belongs to `owner`.
    async fn find_payment(&self, payment_id: Uuid, owner: Uuid) -> StoreResult<Option<Payment>>;

    /// Notification address from the user's profile, if one is on file.
    async fn find_user_email(&self, user_id: Uuid) -> StoreResult<Option<String>>;
}
