pub mod flight;
pub mod booking;
pub mod repository;
pub mod notify;
pub mod payment;
pub mod policy;

pub use booking::{
    Booking, BookingDetail, BookingFlight, BookingFlightDetail, BookingStatus, NewBooking,
    NewBookingFlight, NewPassenger, Passenger, PassengerChanges, PassengerType, TripType,
};
pub use flight::{
    Airline, Airport, CabinClass, Flight, FlightDetail, FlightStatus, SeatAvailability,
};
pub use notify::{EmailTemplate, LogNotifier, Notifier};
pub use payment::{mask_payment_details, NewPayment, Payment, PaymentMethod, PaymentStatus};
pub use policy::{BookingPolicy, InventoryGuard};
pub use repository::{BookingStore, StoreError, StoreResult};

/// Raised when a stored enum column holds a value this build does not know.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown {kind} value: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
