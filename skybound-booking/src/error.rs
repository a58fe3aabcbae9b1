use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookingError {
    /// The request cannot be honoured as sent. Nothing was written.
    #[error("{0}")]
    Rejected(String),

    /// Absent, or owned by someone else.
    #[error("Booking with ID {0} not found")]
    NotFound(Uuid),

    #[error("Booking is already cancelled.")]
    AlreadyCancelled,

    #[error("Flight not found")]
    FlightNotFound(Uuid),

    /// Absent, or paid against someone else's booking.
    #[error("Payment not found or not authorized to view")]
    PaymentNotFound(Uuid),

    #[error("{0}")]
    Server(String),
}
