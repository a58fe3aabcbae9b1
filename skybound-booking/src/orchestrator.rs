use skybound_core::{
    Booking, BookingDetail, BookingPolicy, BookingStatus, BookingStore, CabinClass, EmailTemplate,
    NewBooking, NewBookingFlight, NewPassenger, Notifier, StoreError, StoreResult,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::availability::{AvailabilityError, AvailabilityValidator, SeatSnapshot};
use crate::error::BookingError;
use crate::inventory::{InventoryMutator, MutationFailure, SeatDirection};
use crate::notification::notify_owner;
use crate::reader::BookingReader;
use crate::reference::generate_reference;
use crate::request::CreateBookingRequest;

/// Phases of one booking attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingPhase {
    Validating,
    Reserving,
    Persisting,
    /// Every row is written and the seats stay taken; nothing is rolled back from here.
    Committed,
    RollingBack,
    Succeeded,
    Rejected,
    Failed,
}

impl BookingPhase {
    pub fn can_transition_to(self, next: BookingPhase) -> bool {
        use BookingPhase::*;
        matches!(
            (self, next),
            (Validating, Reserving)
                | (Validating, Rejected)
                | (Validating, Failed)
                | (Reserving, Persisting)
                | (Reserving, Rejected)
                | (Reserving, RollingBack)
                | (Persisting, Committed)
                | (Persisting, RollingBack)
                | (Committed, Succeeded)
                | (Committed, Failed)
                | (RollingBack, Rejected)
                | (RollingBack, Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            BookingPhase::Succeeded | BookingPhase::Rejected | BookingPhase::Failed
        )
    }
}

/// Tracks the phase of one `create_booking` call.
struct Attempt {
    user_id: Uuid,
    phase: BookingPhase,
}

impl Attempt {
    fn new(user_id: Uuid) -> Self {
        debug!("Booking for user {} entering {:?}", user_id, BookingPhase::Validating);
        Self {
            user_id,
            phase: BookingPhase::Validating,
        }
    }

    fn advance(&mut self, next: BookingPhase) {
        debug_assert!(
            self.phase.can_transition_to(next),
            "invalid booking transition {:?} -> {:?}",
            self.phase,
            next
        );
        debug!(
            "Booking for user {}: {:?} -> {:?}",
            self.user_id, self.phase, next
        );
        self.phase = next;
    }
}

/// Runs booking creation: validate, reserve seats, persist the booking with
/// its legs and passengers, then read it back and notify the owner.
///
/// Any failure after seats are reserved gives the seats back and removes
/// rows already written before the error is returned.
pub struct BookingOrchestrator {
    store: Arc<dyn BookingStore>,
    notifier: Arc<dyn Notifier>,
    validator: AvailabilityValidator,
    mutator: InventoryMutator,
    reader: BookingReader,
    policy: BookingPolicy,
}

impl BookingOrchestrator {
    pub fn new(
        store: Arc<dyn BookingStore>,
        notifier: Arc<dyn Notifier>,
        policy: BookingPolicy,
    ) -> Self {
        Self {
            validator: AvailabilityValidator::new(store.clone()),
            mutator: InventoryMutator::new(store.clone(), policy.inventory_guard),
            reader: BookingReader::new(store.clone()),
            store,
            notifier,
            policy,
        }
    }

    pub async fn create_booking(
        &self,
        user_id: Uuid,
        request: CreateBookingRequest,
    ) -> Result<BookingDetail, BookingError> {
        let mut attempt = Attempt::new(user_id);

        let cabin_class = match request.check() {
            Ok(cabin_class) => cabin_class,
            Err(message) => {
                attempt.advance(BookingPhase::Rejected);
                info!("Rejected booking for user {}: {}", user_id, message);
                return Err(BookingError::Rejected(message));
            }
        };

        let reservations = request.reservations(cabin_class);
        let snapshots = match self.validator.validate(&reservations).await {
            Ok(snapshots) => snapshots,
            Err(AvailabilityError::Store(e)) => {
                attempt.advance(BookingPhase::Failed);
                error!("Availability check failed for user {}: {}", user_id, e);
                return Err(BookingError::Server(format!("Failed to create booking: {}", e)));
            }
            Err(e) => {
                attempt.advance(BookingPhase::Rejected);
                info!("Rejected booking for user {}: {}", user_id, e);
                return Err(BookingError::Rejected(e.to_string()));
            }
        };

        attempt.advance(BookingPhase::Reserving);
        let report = self.mutator.apply(&snapshots, SeatDirection::Deduct).await;
        let reserved = report.reserved();

        if !report.is_complete() {
            if let Some(lost) = report.first_insufficient() {
                let message = format!(
                    "Not enough {} seats available on {} flight {}. Requested: {}",
                    lost.snapshot.cabin_class,
                    lost.snapshot.role,
                    lost.snapshot.flight_number,
                    lost.snapshot.passenger_count
                );
                if !reserved.is_empty() {
                    attempt.advance(BookingPhase::RollingBack);
                    self.restore_seats(&reserved).await;
                }
                attempt.advance(BookingPhase::Rejected);
                info!("Rejected booking for user {}: {}", user_id, message);
                return Err(BookingError::Rejected(message));
            }

            let cause = report
                .failed
                .iter()
                .map(|f| match &f.reason {
                    MutationFailure::Store(e) => e.to_string(),
                    MutationFailure::Insufficient => f.reason.to_string(),
                })
                .collect::<Vec<_>>()
                .join("; ");
            return Err(self
                .roll_back(&mut attempt, &reserved, format!("Failed to create booking: {}", cause))
                .await);
        }

        attempt.advance(BookingPhase::Persisting);

        let booking = match self.insert_booking(user_id, &request, cabin_class).await {
            Ok(booking) => booking,
            Err(e) => {
                return Err(self
                    .roll_back(&mut attempt, &reserved, format!("Failed to create booking: {}", e))
                    .await);
            }
        };

        let links: Vec<NewBookingFlight> = request
            .flights
            .iter()
            .map(|f| NewBookingFlight {
                booking_id: booking.id,
                flight_id: f.flight_id,
                is_return_flight: f.is_return_flight,
            })
            .collect();

        if let Err(e) = self.store.insert_booking_flights(&links).await {
            self.discard_booking(booking.id, false).await;
            return Err(self
                .roll_back(
                    &mut attempt,
                    &reserved,
                    format!("Failed to associate flights with booking: {}", e),
                )
                .await);
        }

        let passengers: Vec<NewPassenger> = request
            .passengers
            .iter()
            .map(|p| NewPassenger {
                booking_id: booking.id,
                passenger_type: p.passenger_type,
                first_name: p.first_name.clone(),
                last_name: p.last_name.clone(),
                date_of_birth: p.date_of_birth,
                passport_number: p.passport_number.clone(),
                nationality: p.nationality.clone(),
                cabin_class: p.cabin_class.unwrap_or(cabin_class),
            })
            .collect();

        if let Err(e) = self.store.insert_passengers(&passengers).await {
            self.discard_booking(booking.id, true).await;
            return Err(self
                .roll_back(
                    &mut attempt,
                    &reserved,
                    format!("Failed to create passengers: {}", e),
                )
                .await);
        }

        attempt.advance(BookingPhase::Committed);
        info!(
            "Booking {} committed for user {}: {} legs, {} passengers",
            booking.booking_reference,
            user_id,
            links.len(),
            passengers.len()
        );

        let detail = match self.reader.get_booking_detail(booking.id, None).await {
            Ok(detail) => detail,
            Err(e) => {
                attempt.advance(BookingPhase::Failed);
                error!(
                    "Booking {} is stored but its read-back failed, reporting an error: {}",
                    booking.booking_reference, e
                );
                return Err(BookingError::Server(format!("Failed to create booking: {}", e)));
            }
        };
        attempt.advance(BookingPhase::Succeeded);

        notify_owner(
            self.store.as_ref(),
            self.notifier.as_ref(),
            user_id,
            EmailTemplate::BookingConfirmation,
            &detail,
            None,
        )
        .await;

        Ok(detail)
    }

    /// Insert the booking row, drawing a new reference on each collision.
    async fn insert_booking(
        &self,
        user_id: Uuid,
        request: &CreateBookingRequest,
        cabin_class: CabinClass,
    ) -> StoreResult<Booking> {
        let attempts = self.policy.reference_attempts.max(1);
        let mut new_booking = NewBooking {
            user_id,
            booking_reference: generate_reference(&self.policy.reference_prefix),
            trip_type: request.trip_type,
            cabin_class,
            total_amount: request.total_amount,
            status: BookingStatus::Confirmed,
        };

        let mut tries = 1;
        loop {
            match self.store.insert_booking(&new_booking).await {
                Err(StoreError::Conflict(reason)) if tries < attempts => {
                    warn!(
                        "Booking reference {} taken ({}), retrying",
                        new_booking.booking_reference, reason
                    );
                    new_booking.booking_reference =
                        generate_reference(&self.policy.reference_prefix);
                    tries += 1;
                }
                result => return result,
            }
        }
    }

    /// Best-effort removal of a partially written booking.
    async fn discard_booking(&self, booking_id: Uuid, with_links: bool) {
        if with_links {
            if let Err(e) = self.store.delete_booking_flights(booking_id).await {
                error!("Failed to delete flight links of booking {}: {}", booking_id, e);
            }
        }
        if let Err(e) = self.store.delete_booking(booking_id).await {
            error!("Failed to delete booking {}: {}", booking_id, e);
        }
    }

    async fn roll_back(
        &self,
        attempt: &mut Attempt,
        reserved: &[SeatSnapshot],
        message: String,
    ) -> BookingError {
        attempt.advance(BookingPhase::RollingBack);
        error!("{}; rolling back {} reserved legs", message, reserved.len());
        self.restore_seats(reserved).await;
        attempt.advance(BookingPhase::Failed);
        BookingError::Server(message)
    }

    async fn restore_seats(&self, reserved: &[SeatSnapshot]) {
        let report = self.mutator.apply(reserved, SeatDirection::Restore).await;
        for failed in &report.failed {
            error!(
                "Could not restore {} {} seats on flight {}: {}",
                failed.snapshot.passenger_count,
                failed.snapshot.cabin_class,
                failed.snapshot.flight_number,
                failed.reason
            );
        }
    }
}
