use skybound_core::{BookingStore, CabinClass, StoreError};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::request::{FlightReservationRequest, LegRole};

/// Seat count of one leg as read during validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatSnapshot {
    pub flight_id: Uuid,
    pub flight_number: String,
    pub cabin_class: CabinClass,
    pub passenger_count: i32,
    pub role: LegRole,
    pub available: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AvailabilityError {
    #[error("Flight {0} not found")]
    FlightNotFound(Uuid),

    #[error("Not enough {cabin_class} seats available on {role} flight {flight_number}. Available: {available}, Requested: {requested}")]
    InsufficientSeats {
        cabin_class: CabinClass,
        role: LegRole,
        flight_number: String,
        available: i32,
        requested: i32,
    },

    #[error("Failed to check seat availability: {0}")]
    Store(#[from] StoreError),
}

/// Read-only check that every requested leg has enough seats left.
///
/// Nothing is locked between this read and the later deduction; whether that
/// gap can oversell depends on the configured inventory guard.
pub struct AvailabilityValidator {
    store: Arc<dyn BookingStore>,
}

impl AvailabilityValidator {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }

    /// Check the legs in order and stop at the first one that cannot be served.
    pub async fn validate(
        &self,
        requests: &[FlightReservationRequest],
    ) -> Result<Vec<SeatSnapshot>, AvailabilityError> {
        let mut snapshots = Vec::with_capacity(requests.len());

        for request in requests {
            let flight = self
                .store
                .find_flight(request.flight_id)
                .await?
                .ok_or(AvailabilityError::FlightNotFound(request.flight_id))?;

            let available = flight.available_seats(request.cabin_class);
            if available < request.passenger_count {
                return Err(AvailabilityError::InsufficientSeats {
                    cabin_class: request.cabin_class,
                    role: request.role(),
                    flight_number: flight.flight_number,
                    available,
                    requested: request.passenger_count,
                });
            }

            debug!(
                "Flight {} has {} {} seats, {} requested",
                flight.flight_number, available, request.cabin_class, request.passenger_count
            );

            snapshots.push(SeatSnapshot {
                flight_id: flight.id,
                flight_number: flight.flight_number,
                cabin_class: request.cabin_class,
                passenger_count: request.passenger_count,
                role: request.role(),
                available,
            });
        }

        Ok(snapshots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skybound_store::InMemoryBookingStore;

    use crate::test_support::flight_with_economy;

    fn reservation(flight_id: Uuid, passengers: i32, is_return_flight: bool) -> FlightReservationRequest {
        FlightReservationRequest {
            flight_id,
            cabin_class: CabinClass::Economy,
            passenger_count: passengers,
            is_return_flight,
        }
    }

    #[tokio::test]
    async fn test_snapshots_carry_counts_read() {
        let store = Arc::new(InMemoryBookingStore::new());
        let outbound = flight_with_economy("SB200", 5);
        let inbound = flight_with_economy("SB201", 4);
        store.add_flight(outbound.clone()).await;
        store.add_flight(inbound.clone()).await;

        let validator = AvailabilityValidator::new(store.clone());
        let snapshots = validator
            .validate(&[reservation(outbound.id, 2, false), reservation(inbound.id, 2, true)])
            .await
            .unwrap();

        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].available, 5);
        assert_eq!(snapshots[0].role, LegRole::Outbound);
        assert_eq!(snapshots[1].available, 4);
        assert_eq!(snapshots[1].role, LegRole::Return);
        // Validation never writes.
        assert_eq!(store.flight(outbound.id).await.unwrap().economy_available, 5);
    }

    #[tokio::test]
    async fn test_insufficient_seats_message() {
        let store = Arc::new(InMemoryBookingStore::new());
        let inbound = flight_with_economy("SB301", 1);
        store.add_flight(inbound.clone()).await;

        let validator = AvailabilityValidator::new(store);
        let err = validator
            .validate(&[reservation(inbound.id, 2, true)])
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Not enough economy seats available on return flight SB301. Available: 1, Requested: 2"
        );
    }

    #[tokio::test]
    async fn test_missing_flight_named() {
        let store = Arc::new(InMemoryBookingStore::new());
        let validator = AvailabilityValidator::new(store);
        let missing = Uuid::new_v4();

        let err = validator.validate(&[reservation(missing, 1, false)]).await.unwrap_err();
        assert_eq!(err, AvailabilityError::FlightNotFound(missing));
        assert_eq!(err.to_string(), format!("Flight {} not found", missing));
    }
}
