use skybound_core::{BookingStore, InventoryGuard, StoreError};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::availability::SeatSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatDirection {
    /// Take seats for a new booking.
    Deduct,
    /// Give seats back.
    Restore,
}

/// A leg whose seat count was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatUpdate {
    pub snapshot: SeatSnapshot,
    pub new_available: i32,
}

impl SeatUpdate {
    /// The leg as it stands after this write, for a later inverse adjustment.
    pub fn after(&self) -> SeatSnapshot {
        SeatSnapshot {
            available: self.new_available,
            ..self.snapshot.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MutationFailure {
    /// The cabin no longer has the seats; another booking got there first.
    #[error("not enough seats left")]
    Insufficient,
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedUpdate {
    pub snapshot: SeatSnapshot,
    pub reason: MutationFailure,
}

/// Per-leg outcome of one inventory batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationReport {
    pub updated: Vec<SeatUpdate>,
    pub failed: Vec<FailedUpdate>,
}

impl MutationReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// First leg that failed for lack of seats, if any.
    pub fn first_insufficient(&self) -> Option<&FailedUpdate> {
        self.failed
            .iter()
            .find(|f| f.reason == MutationFailure::Insufficient)
    }

    /// Snapshots reflecting the counts written, ready to be handed back for restoration.
    pub fn reserved(&self) -> Vec<SeatSnapshot> {
        self.updated.iter().map(SeatUpdate::after).collect()
    }
}

/// Applies seat deltas to flights, one independent write per leg.
///
/// A failing leg never undoes the legs written before it; the report tells
/// the caller which legs went through.
pub struct InventoryMutator {
    store: Arc<dyn BookingStore>,
    guard: InventoryGuard,
}

impl InventoryMutator {
    pub fn new(store: Arc<dyn BookingStore>, guard: InventoryGuard) -> Self {
        Self { store, guard }
    }

    pub fn guard(&self) -> InventoryGuard {
        self.guard
    }

    pub async fn apply(&self, snapshots: &[SeatSnapshot], direction: SeatDirection) -> MutationReport {
        let mut report = MutationReport::default();

        for snapshot in snapshots {
            match self.apply_one(snapshot, direction).await {
                Ok(new_available) => {
                    info!(
                        "{:?} {} {} seats on flight {}: {} left",
                        direction,
                        snapshot.passenger_count,
                        snapshot.cabin_class,
                        snapshot.flight_number,
                        new_available
                    );
                    report.updated.push(SeatUpdate {
                        snapshot: snapshot.clone(),
                        new_available,
                    });
                }
                Err(reason) => {
                    error!(
                        "Failed to {:?} {} {} seats on flight {}: {}",
                        direction,
                        snapshot.passenger_count,
                        snapshot.cabin_class,
                        snapshot.flight_number,
                        reason
                    );
                    report.failed.push(FailedUpdate {
                        snapshot: snapshot.clone(),
                        reason,
                    });
                }
            }
        }

        report
    }

    async fn apply_one(
        &self,
        snapshot: &SeatSnapshot,
        direction: SeatDirection,
    ) -> Result<i32, MutationFailure> {
        match (self.guard, direction) {
            (InventoryGuard::Conditional, SeatDirection::Deduct) => self
                .store
                .try_deduct_seats(snapshot.flight_id, snapshot.cabin_class, snapshot.passenger_count)
                .await?
                .ok_or(MutationFailure::Insufficient),
            (InventoryGuard::Conditional, SeatDirection::Restore) => Ok(self
                .store
                .release_seats(snapshot.flight_id, snapshot.cabin_class, snapshot.passenger_count)
                .await?),
            (InventoryGuard::Legacy, _) => {
                let target = match direction {
                    SeatDirection::Deduct => snapshot.available - snapshot.passenger_count,
                    SeatDirection::Restore => snapshot.available + snapshot.passenger_count,
                };
                if target < 0 {
                    warn!(
                        "Seat count for {} on flight {} would drop to {}, clamping at 0",
                        snapshot.cabin_class, snapshot.flight_number, target
                    );
                }
                let flight = self
                    .store
                    .set_available_seats(snapshot.flight_id, snapshot.cabin_class, target.max(0))
                    .await?;
                Ok(flight.available_seats(snapshot.cabin_class))
            }
        }
    }
}
