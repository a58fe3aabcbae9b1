use skybound_core::{BookingDetail, BookingPolicy, BookingStatus, BookingStore, EmailTemplate, Notifier};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::cancellation::CancellationHandler;
use crate::error::BookingError;
use crate::notification::notify_owner;
use crate::reader::BookingReader;
use crate::request::UpdateBookingRequest;

/// Applies passenger edits and status changes to an owned booking.
///
/// Cabin classes and the passenger list itself are fixed once seats are
/// taken; only personal details can be edited. A change to `cancelled` goes
/// through the same path as an explicit cancellation.
pub struct BookingUpdater {
    store: Arc<dyn BookingStore>,
    notifier: Arc<dyn Notifier>,
    cancellation: CancellationHandler,
    reader: BookingReader,
}

impl BookingUpdater {
    pub fn new(
        store: Arc<dyn BookingStore>,
        notifier: Arc<dyn Notifier>,
        policy: &BookingPolicy,
    ) -> Self {
        Self {
            cancellation: CancellationHandler::new(store.clone(), notifier.clone(), policy),
            reader: BookingReader::new(store.clone()),
            store,
            notifier,
        }
    }

    pub async fn update_booking(
        &self,
        booking_id: Uuid,
        user_id: Uuid,
        request: UpdateBookingRequest,
    ) -> Result<BookingDetail, BookingError> {
        let booking = self
            .store
            .find_booking(booking_id, Some(user_id))
            .await
            .map_err(|e| BookingError::Server(format!("Failed to update booking: {}", e)))?
            .ok_or(BookingError::NotFound(booking_id))?;

        let changes: Vec<_> = request
            .passengers
            .iter()
            .map(|p| p.changes())
            .filter(|c| !c.is_empty())
            .collect();

        match (request.status, booking.status) {
            (Some(BookingStatus::Pending), _) => {
                return Err(BookingError::Rejected(
                    "Booking status can only be changed to confirmed or cancelled.".to_string(),
                ));
            }
            (Some(BookingStatus::Cancelled), BookingStatus::Cancelled) => {
                return Err(BookingError::AlreadyCancelled);
            }
            (Some(BookingStatus::Confirmed), BookingStatus::Cancelled) => {
                return Err(cancelled_is_final());
            }
            (_, BookingStatus::Cancelled) if !changes.is_empty() => {
                return Err(cancelled_is_final());
            }
            _ => {}
        }

        // Every edited passenger must belong to this booking before anything is written.
        if !changes.is_empty() {
            let passengers = self.store.find_passengers(booking_id).await.map_err(|e| {
                BookingError::Server(format!("Failed to update booking: {}", e))
            })?;
            if let Some(stranger) = changes
                .iter()
                .find(|c| !passengers.iter().any(|p| p.id == c.passenger_id))
            {
                return Err(BookingError::Rejected(format!(
                    "Passenger {} is not part of booking {}",
                    stranger.passenger_id, booking.booking_reference
                )));
            }

            for change in &changes {
                match self.store.update_passenger(booking_id, change).await {
                    Ok(Some(_)) => {}
                    Ok(None) => {
                        return Err(BookingError::Server(format!(
                            "Failed to update passenger {}: passenger no longer exists",
                            change.passenger_id
                        )));
                    }
                    Err(e) => {
                        return Err(BookingError::Server(format!(
                            "Failed to update passenger {}: {}",
                            change.passenger_id, e
                        )));
                    }
                }
            }
        }

        let mut modified = !changes.is_empty();
        let mut update_type = "modified";
        match (request.status, booking.status) {
            (Some(BookingStatus::Cancelled), _) => {
                self.cancellation.cancel(booking_id, user_id).await?;
                modified = true;
                update_type = "cancelled";
            }
            (Some(BookingStatus::Confirmed), BookingStatus::Pending) => {
                self.confirm(booking_id, user_id).await?;
                modified = true;
            }
            _ => {}
        }

        let detail = self
            .reader
            .get_booking_detail(booking_id, Some(user_id))
            .await
            .map_err(|e| {
                error!("Updated booking {} could not be read back: {}", booking_id, e);
                BookingError::Server("Failed to retrieve booking details after update.".to_string())
            })?;

        if modified {
            info!(
                "Booking {} {} by user {} ({} passenger edits)",
                booking.booking_reference,
                update_type,
                user_id,
                changes.len()
            );
            notify_owner(
                self.store.as_ref(),
                self.notifier.as_ref(),
                user_id,
                EmailTemplate::BookingUpdate,
                &detail,
                Some(update_type),
            )
            .await;
        }

        Ok(detail)
    }

    async fn confirm(&self, booking_id: Uuid, user_id: Uuid) -> Result<(), BookingError> {
        let confirmed = self
            .store
            .transition_booking_status(
                booking_id,
                user_id,
                &[BookingStatus::Pending],
                BookingStatus::Confirmed,
            )
            .await
            .map_err(|e| BookingError::Server(format!("Failed to update booking status: {}", e)))?;
        if confirmed.is_some() {
            return Ok(());
        }

        // Lost a race: fine if someone else confirmed it, final if it was cancelled.
        match self.store.find_booking(booking_id, Some(user_id)).await {
            Ok(Some(current)) if current.status == BookingStatus::Confirmed => Ok(()),
            Ok(Some(_)) => Err(cancelled_is_final()),
            Ok(None) => Err(BookingError::NotFound(booking_id)),
            Err(e) => Err(BookingError::Server(format!(
                "Failed to update booking status: {}",
                e
            ))),
        }
    }
}

fn cancelled_is_final() -> BookingError {
    BookingError::Rejected("Cancelled bookings cannot be modified.".to_string())
}
