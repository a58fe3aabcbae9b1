use skybound_core::{
    Booking, BookingDetail, BookingPolicy, BookingStatus, BookingStore, EmailTemplate, Notifier,
};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::availability::SeatSnapshot;
use crate::error::BookingError;
use crate::inventory::{InventoryMutator, SeatDirection};
use crate::notification::notify_owner;
use crate::reader::BookingReader;
use crate::request::LegRole;

/// Statuses a booking can be cancelled from.
const CANCELLABLE: [BookingStatus; 2] = [BookingStatus::Pending, BookingStatus::Confirmed];

/// Moves an owned booking to `cancelled`, optionally giving its seats back.
pub struct CancellationHandler {
    store: Arc<dyn BookingStore>,
    notifier: Arc<dyn Notifier>,
    mutator: InventoryMutator,
    reader: BookingReader,
    restore_inventory: bool,
}

impl CancellationHandler {
    pub fn new(
        store: Arc<dyn BookingStore>,
        notifier: Arc<dyn Notifier>,
        policy: &BookingPolicy,
    ) -> Self {
        Self {
            mutator: InventoryMutator::new(store.clone(), policy.inventory_guard),
            reader: BookingReader::new(store.clone()),
            store,
            notifier,
            restore_inventory: policy.restore_inventory_on_cancel,
        }
    }

    pub async fn cancel_booking(
        &self,
        booking_id: Uuid,
        user_id: Uuid,
    ) -> Result<BookingDetail, BookingError> {
        self.cancel(booking_id, user_id).await?;

        let detail = self
            .reader
            .get_booking_detail(booking_id, Some(user_id))
            .await
            .map_err(|e| {
                error!("Cancelled booking {} could not be read back: {}", booking_id, e);
                BookingError::Server(
                    "Failed to retrieve booking details after cancellation.".to_string(),
                )
            })?;

        notify_owner(
            self.store.as_ref(),
            self.notifier.as_ref(),
            user_id,
            EmailTemplate::BookingUpdate,
            &detail,
            Some("cancelled"),
        )
        .await;

        Ok(detail)
    }

    /// Cancel without reading back or emailing.
    ///
    /// Only the call that actually moves the booking out of a cancellable
    /// status gives seats back; a concurrent loser sees `AlreadyCancelled`.
    pub(crate) async fn cancel(
        &self,
        booking_id: Uuid,
        user_id: Uuid,
    ) -> Result<Booking, BookingError> {
        let booking = self
            .store
            .find_booking(booking_id, Some(user_id))
            .await
            .map_err(|e| BookingError::Server(format!("Failed to cancel booking: {}", e)))?
            .ok_or(BookingError::NotFound(booking_id))?;

        if booking.status == BookingStatus::Cancelled {
            return Err(BookingError::AlreadyCancelled);
        }

        let cancelled = self
            .store
            .transition_booking_status(booking_id, user_id, &CANCELLABLE, BookingStatus::Cancelled)
            .await
            .map_err(|e| BookingError::Server(format!("Failed to cancel booking: {}", e)))?;

        let Some(cancelled) = cancelled else {
            info!(
                "Booking {} was cancelled by a concurrent request",
                booking.booking_reference
            );
            return match self.store.find_booking(booking_id, Some(user_id)).await {
                Ok(None) => Err(BookingError::NotFound(booking_id)),
                _ => Err(BookingError::AlreadyCancelled),
            };
        };

        info!("Booking {} cancelled by user {}", cancelled.booking_reference, user_id);

        if self.restore_inventory {
            self.release_seats(&cancelled).await;
        }
        Ok(cancelled)
    }

    // Best-effort: every leg gets back one seat per passenger in the cabin the booking took them from.
    async fn release_seats(&self, booking: &Booking) {
        let legs = match self.store.find_booking_flights(booking.id).await {
            Ok(legs) => legs,
            Err(e) => {
                error!("Cannot restore seats of booking {}: {}", booking.id, e);
                return;
            }
        };
        let seats = match self.store.find_passengers(booking.id).await {
            Ok(passengers) => passengers.len() as i32,
            Err(e) => {
                error!("Cannot restore seats of booking {}: {}", booking.id, e);
                return;
            }
        };
        if seats == 0 {
            return;
        }

        let mut snapshots = Vec::with_capacity(legs.len());
        for leg in &legs {
            let Some(detail) = &leg.flight else {
                error!(
                    "Flight {} of booking {} no longer exists, its seats are not restored",
                    leg.link.flight_id, booking.id
                );
                continue;
            };
            snapshots.push(SeatSnapshot {
                flight_id: leg.link.flight_id,
                flight_number: detail.flight.flight_number.clone(),
                cabin_class: booking.cabin_class,
                passenger_count: seats,
                role: LegRole::from_return_flag(leg.link.is_return_flight),
                available: detail.flight.available_seats(booking.cabin_class),
            });
        }

        let report = self.mutator.apply(&snapshots, SeatDirection::Restore).await;
        info!(
            "Restored {} {} seats on {} of {} legs for cancelled booking {}",
            seats,
            booking.cabin_class,
            report.updated.len(),
            snapshots.len(),
            booking.booking_reference
        );
    }
}
