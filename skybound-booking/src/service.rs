use skybound_core::{
    BookingDetail, BookingPolicy, BookingStore, FlightDetail, Notifier, Payment, SeatAvailability,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::cancellation::CancellationHandler;
use crate::error::BookingError;
use crate::flights::FlightLookup;
use crate::orchestrator::BookingOrchestrator;
use crate::payment::{PaymentProcessor, PaymentRequest};
use crate::reader::BookingReader;
use crate::reference::generate_reference;
use crate::request::{CreateBookingRequest, UpdateBookingRequest};
use crate::update::BookingUpdater;

/// The booking operations exposed to the API layer, wired to one store and notifier.
pub struct BookingService {
    orchestrator: BookingOrchestrator,
    reader: BookingReader,
    cancellation: CancellationHandler,
    updater: BookingUpdater,
    flights: FlightLookup,
    payments: PaymentProcessor,
    reference_prefix: String,
}

impl BookingService {
    pub fn new(
        store: Arc<dyn BookingStore>,
        notifier: Arc<dyn Notifier>,
        policy: BookingPolicy,
    ) -> Self {
        Self {
            reader: BookingReader::new(store.clone()),
            cancellation: CancellationHandler::new(store.clone(), notifier.clone(), &policy),
            updater: BookingUpdater::new(store.clone(), notifier.clone(), &policy),
            flights: FlightLookup::new(store.clone()),
            payments: PaymentProcessor::new(store.clone()),
            reference_prefix: policy.reference_prefix.clone(),
            orchestrator: BookingOrchestrator::new(store, notifier, policy),
        }
    }

    pub async fn create_booking(
        &self,
        user_id: Uuid,
        request: CreateBookingRequest,
    ) -> Result<BookingDetail, BookingError> {
        self.orchestrator.create_booking(user_id, request).await
    }

    pub async fn get_booking_detail(
        &self,
        booking_id: Uuid,
        user_id: Option<Uuid>,
    ) -> Result<BookingDetail, BookingError> {
        self.reader.get_booking_detail(booking_id, user_id).await
    }

    pub async fn list_bookings(&self, user_id: Uuid) -> Result<Vec<BookingDetail>, BookingError> {
        self.reader.list_bookings(user_id).await
    }

    pub async fn cancel_booking(
        &self,
        booking_id: Uuid,
        user_id: Uuid,
    ) -> Result<BookingDetail, BookingError> {
        self.cancellation.cancel_booking(booking_id, user_id).await
    }

    pub async fn update_booking(
        &self,
        booking_id: Uuid,
        user_id: Uuid,
        request: UpdateBookingRequest,
    ) -> Result<BookingDetail, BookingError> {
        self.updater.update_booking(booking_id, user_id, request).await
    }

    pub async fn get_flight_detail(&self, flight_id: Uuid) -> Result<FlightDetail, BookingError> {
        self.flights.get_flight_detail(flight_id).await
    }

    pub async fn get_flight_availability(
        &self,
        flight_id: Uuid,
    ) -> Result<SeatAvailability, BookingError> {
        self.flights.get_availability(flight_id).await
    }

    pub async fn process_payment(
        &self,
        user_id: Uuid,
        request: PaymentRequest,
    ) -> Result<Payment, BookingError> {
        self.payments.process_payment(user_id, request).await
    }

    pub async fn get_payment(&self, payment_id: Uuid, user_id: Uuid) -> Result<Payment, BookingError> {
        self.payments.get_payment(payment_id, user_id).await
    }

    pub fn generate_reference(&self) -> String {
        generate_reference(&self.reference_prefix)
    }
}
