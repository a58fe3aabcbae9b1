pub mod error;
pub mod request;
pub mod availability;
pub mod inventory;
pub mod reference;
pub mod reader;
pub mod orchestrator;
pub mod cancellation;
pub mod update;
pub mod flights;
pub mod payment;
pub mod service;
mod notification;

pub use availability::{AvailabilityError, AvailabilityValidator, SeatSnapshot};
pub use cancellation::CancellationHandler;
pub use error::BookingError;
pub use flights::FlightLookup;
pub use inventory::{FailedUpdate, InventoryMutator, MutationFailure, MutationReport, SeatDirection, SeatUpdate};
pub use orchestrator::{BookingOrchestrator, BookingPhase};
pub use payment::{PaymentProcessor, PaymentRequest};
pub use reader::BookingReader;
pub use reference::generate_reference;
pub use request::{
    CreateBookingRequest, FlightReservationRequest, FlightSelection, LegRole, PassengerInput,
    PassengerUpdate, UpdateBookingRequest,
};
pub use service::BookingService;
pub use update::BookingUpdater;

#[cfg(test)]
mod test_support;
