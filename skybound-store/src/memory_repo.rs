use async_trait::async_trait;
use chrono::Utc;
use skybound_core::{
    Airline, Airport, Booking, BookingFlight, BookingFlightDetail, BookingStatus, BookingStore,
    CabinClass, Flight, FlightDetail, NewBooking, NewBookingFlight, NewPassenger, NewPayment,
    Passenger, PassengerChanges, Payment, StoreError, StoreResult,
};
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Operations of the in-memory store that can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    FindFlight,
    /// Any seat write (set, deduct or release) on this flight.
    UpdateFlight(Uuid),
    InsertBooking,
    InsertBookingFlights,
    InsertPassengers,
    DeleteBookingFlights,
    DeleteBooking,
    FindBooking,
    FindBookingFlights,
    FindPassengers,
    UpdateBookingStatus,
    UpdatePassenger,
    InsertPayment,
}

#[derive(Default)]
struct Tables {
    flights: HashMap<Uuid, Flight>,
    airlines: HashMap<Uuid, Airline>,
    airports: HashMap<Uuid, Airport>,
    // Insertion order is kept so listings are stable when timestamps tie.
    bookings: Vec<Booking>,
    booking_flights: Vec<BookingFlight>,
    passengers: Vec<Passenger>,
    payments: Vec<Payment>,
    profiles: HashMap<Uuid, String>,
    failures: HashSet<FailPoint>,
    reference_conflicts: u32,
}

impl Tables {
    fn check(&self, point: FailPoint) -> StoreResult<()> {
        if self.failures.contains(&point) {
            return Err(StoreError::Backend(format!("injected failure at {:?}", point)));
        }
        Ok(())
    }

    fn flight_mut(&mut self, flight_id: Uuid) -> StoreResult<&mut Flight> {
        self.check(FailPoint::UpdateFlight(flight_id))?;
        self.flights
            .get_mut(&flight_id)
            .ok_or_else(|| StoreError::NotFound(format!("flight {}", flight_id)))
    }

    fn flight_detail(&self, flight_id: Uuid) -> Option<FlightDetail> {
        let flight = self.flights.get(&flight_id)?.clone();
        Some(FlightDetail {
            airline: self.airlines.get(&flight.airline_id).cloned(),
            origin_airport: self.airports.get(&flight.origin_airport_id).cloned(),
            destination_airport: self.airports.get(&flight.destination_airport_id).cloned(),
            flight,
        })
    }
}

/// A `BookingStore` kept entirely in memory, with failure injection.
///
/// Used for local runs without Postgres and as the data store fake in tests.
/// Seat adjustments run under one write lock, so `try_deduct_seats` is atomic
/// in the same way the conditional SQL update is.
#[derive(Default)]
pub struct InMemoryBookingStore {
    tables: RwLock<Tables>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_flight(&self, flight: Flight) {
        self.tables.write().await.flights.insert(flight.id, flight);
    }

    pub async fn add_airline(&self, airline: Airline) {
        self.tables.write().await.airlines.insert(airline.id, airline);
    }

    pub async fn add_airport(&self, airport: Airport) {
        self.tables.write().await.airports.insert(airport.id, airport);
    }

    pub async fn set_user_email(&self, user_id: Uuid, email: &str) {
        self.tables.write().await.profiles.insert(user_id, email.to_string());
    }

    pub async fn flight(&self, flight_id: Uuid) -> Option<Flight> {
        self.tables.read().await.flights.get(&flight_id).cloned()
    }

    pub async fn booking_count(&self) -> usize {
        self.tables.read().await.bookings.len()
    }

    pub async fn booking_flight_count(&self, booking_id: Uuid) -> usize {
        let tables = self.tables.read().await;
        tables.booking_flights.iter().filter(|l| l.booking_id == booking_id).count()
    }

    pub async fn passenger_count(&self, booking_id: Uuid) -> usize {
        let tables = self.tables.read().await;
        tables.passengers.iter().filter(|p| p.booking_id == booking_id).count()
    }

    pub async fn fail_on(&self, point: FailPoint) {
        self.tables.write().await.failures.insert(point);
    }

    pub async fn clear_failures(&self) {
        self.tables.write().await.failures.clear();
    }

    /// Make the next `count` booking inserts fail with a reference conflict.
    pub async fn conflict_next_references(&self, count: u32) {
        self.tables.write().await.reference_conflicts = count;
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn find_flight(&self, flight_id: Uuid) -> StoreResult<Option<Flight>> {
        let tables = self.tables.read().await;
        tables.check(FailPoint::FindFlight)?;
        Ok(tables.flights.get(&flight_id).cloned())
    }

    async fn find_flight_detail(&self, flight_id: Uuid) -> StoreResult<Option<FlightDetail>> {
        let tables = self.tables.read().await;
        tables.check(FailPoint::FindFlight)?;
        Ok(tables.flight_detail(flight_id))
    }

    async fn set_available_seats(
        &self,
        flight_id: Uuid,
        cabin: CabinClass,
        count: i32,
    ) -> StoreResult<Flight> {
        let mut tables = self.tables.write().await;
        let flight = tables.flight_mut(flight_id)?;
        flight.set_available_seats(cabin, count);
        Ok(flight.clone())
    }

    async fn try_deduct_seats(
        &self,
        flight_id: Uuid,
        cabin: CabinClass,
        seats: i32,
    ) -> StoreResult<Option<i32>> {
        let mut tables = self.tables.write().await;
        let flight = tables.flight_mut(flight_id)?;
        let available = flight.available_seats(cabin);
        if available < seats {
            return Ok(None);
        }
        flight.set_available_seats(cabin, available - seats);
        Ok(Some(available - seats))
    }

    async fn release_seats(
        &self,
        flight_id: Uuid,
        cabin: CabinClass,
        seats: i32,
    ) -> StoreResult<i32> {
        let mut tables = self.tables.write().await;
        let flight = tables.flight_mut(flight_id)?;
        let restored = flight.available_seats(cabin) + seats;
        flight.set_available_seats(cabin, restored);
        Ok(flight.available_seats(cabin))
    }

    async fn insert_booking(&self, booking: &NewBooking) -> StoreResult<Booking> {
        let mut tables = self.tables.write().await;
        tables.check(FailPoint::InsertBooking)?;

        if tables.reference_conflicts > 0 {
            tables.reference_conflicts -= 1;
            return Err(StoreError::Conflict(format!(
                "booking_reference {} already exists",
                booking.booking_reference
            )));
        }
        if tables.bookings.iter().any(|b| b.booking_reference == booking.booking_reference) {
            return Err(StoreError::Conflict(format!(
                "booking_reference {} already exists",
                booking.booking_reference
            )));
        }

        let now = Utc::now();
        let row = Booking {
            id: Uuid::new_v4(),
            user_id: booking.user_id,
            booking_reference: booking.booking_reference.clone(),
            trip_type: booking.trip_type,
            cabin_class: booking.cabin_class,
            total_amount: booking.total_amount,
            status: booking.status,
            created_at: now,
            updated_at: now,
        };
        tables.bookings.push(row.clone());
        Ok(row)
    }

    async fn insert_booking_flights(
        &self,
        links: &[NewBookingFlight],
    ) -> StoreResult<Vec<BookingFlight>> {
        let mut tables = self.tables.write().await;
        tables.check(FailPoint::InsertBookingFlights)?;

        let mut seen = HashSet::new();
        for link in links {
            if !tables.bookings.iter().any(|b| b.id == link.booking_id) {
                return Err(StoreError::Backend(format!(
                    "booking {} does not exist",
                    link.booking_id
                )));
            }
            let key = (link.booking_id, link.flight_id, link.is_return_flight);
            let exists = tables.booking_flights.iter().any(|l| {
                (l.booking_id, l.flight_id, l.is_return_flight) == key
            });
            if exists || !seen.insert(key) {
                return Err(StoreError::Conflict(format!(
                    "flight {} already linked to booking {}",
                    link.flight_id, link.booking_id
                )));
            }
        }

        let now = Utc::now();
        let rows: Vec<BookingFlight> = links
            .iter()
            .map(|link| BookingFlight {
                id: Uuid::new_v4(),
                booking_id: link.booking_id,
                flight_id: link.flight_id,
                is_return_flight: link.is_return_flight,
                created_at: now,
            })
            .collect();
        tables.booking_flights.extend(rows.iter().cloned());
        Ok(rows)
    }

    async fn insert_passengers(&self, passengers: &[NewPassenger]) -> StoreResult<Vec<Passenger>> {
        let mut tables = self.tables.write().await;
        tables.check(FailPoint::InsertPassengers)?;

        if let Some(orphan) = passengers
            .iter()
            .find(|p| !tables.bookings.iter().any(|b| b.id == p.booking_id))
        {
            return Err(StoreError::Backend(format!(
                "booking {} does not exist",
                orphan.booking_id
            )));
        }

        let now = Utc::now();
        let rows: Vec<Passenger> = passengers
            .iter()
            .map(|p| Passenger {
                id: Uuid::new_v4(),
                booking_id: p.booking_id,
                passenger_type: p.passenger_type,
                first_name: p.first_name.clone(),
                last_name: p.last_name.clone(),
                date_of_birth: p.date_of_birth,
                passport_number: p.passport_number.clone(),
                nationality: p.nationality.clone(),
                cabin_class: p.cabin_class,
                created_at: now,
            })
            .collect();
        tables.passengers.extend(rows.iter().cloned());
        Ok(rows)
    }

    async fn delete_booking_flights(&self, booking_id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        tables.check(FailPoint::DeleteBookingFlights)?;
        tables.booking_flights.retain(|l| l.booking_id != booking_id);
        Ok(())
    }

    async fn delete_booking(&self, booking_id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        tables.check(FailPoint::DeleteBooking)?;
        tables.bookings.retain(|b| b.id != booking_id);
        tables.booking_flights.retain(|l| l.booking_id != booking_id);
        tables.passengers.retain(|p| p.booking_id != booking_id);
        Ok(())
    }

    async fn find_booking(
        &self,
        booking_id: Uuid,
        owner: Option<Uuid>,
    ) -> StoreResult<Option<Booking>> {
        let tables = self.tables.read().await;
        tables.check(FailPoint::FindBooking)?;
        Ok(tables
            .bookings
            .iter()
            .find(|b| b.id == booking_id && owner.map_or(true, |user| b.user_id == user))
            .cloned())
    }

    async fn list_bookings(&self, user_id: Uuid) -> StoreResult<Vec<Booking>> {
        let tables = self.tables.read().await;
        tables.check(FailPoint::FindBooking)?;
        let mut rows: Vec<Booking> = tables
            .bookings
            .iter()
            .rev()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn find_booking_flights(
        &self,
        booking_id: Uuid,
    ) -> StoreResult<Vec<BookingFlightDetail>> {
        let tables = self.tables.read().await;
        tables.check(FailPoint::FindBookingFlights)?;
        Ok(tables
            .booking_flights
            .iter()
            .filter(|l| l.booking_id == booking_id)
            .map(|link| BookingFlightDetail {
                flight: tables.flight_detail(link.flight_id),
                link: link.clone(),
            })
            .collect())
    }

    async fn find_passengers(&self, booking_id: Uuid) -> StoreResult<Vec<Passenger>> {
        let tables = self.tables.read().await;
        tables.check(FailPoint::FindPassengers)?;
        Ok(tables
            .passengers
            .iter()
            .filter(|p| p.booking_id == booking_id)
            .cloned()
            .collect())
    }

    async fn transition_booking_status(
        &self,
        booking_id: Uuid,
        owner: Uuid,
        from: &[BookingStatus],
        to: BookingStatus,
    ) -> StoreResult<Option<Booking>> {
        let mut tables = self.tables.write().await;
        tables.check(FailPoint::UpdateBookingStatus)?;
        Ok(tables
            .bookings
            .iter_mut()
            .find(|b| b.id == booking_id && b.user_id == owner && from.contains(&b.status))
            .map(|booking| {
                booking.status = to;
                booking.updated_at = Utc::now();
                booking.clone()
            }))
    }

    async fn update_passenger(
        &self,
        booking_id: Uuid,
        changes: &PassengerChanges,
    ) -> StoreResult<Option<Passenger>> {
        let mut tables = self.tables.write().await;
        tables.check(FailPoint::UpdatePassenger)?;
        Ok(tables
            .passengers
            .iter_mut()
            .find(|p| p.id == changes.passenger_id && p.booking_id == booking_id)
            .map(|passenger| {
                if let Some(first_name) = &changes.first_name {
                    passenger.first_name = first_name.clone();
                }
                if let Some(last_name) = &changes.last_name {
                    passenger.last_name = last_name.clone();
                }
                if changes.date_of_birth.is_some() {
                    passenger.date_of_birth = changes.date_of_birth;
                }
                if changes.passport_number.is_some() {
                    passenger.passport_number = changes.passport_number.clone();
                }
                if changes.nationality.is_some() {
                    passenger.nationality = changes.nationality.clone();
                }
                passenger.clone()
            }))
    }

    async fn insert_payment(&self, payment: &NewPayment) -> StoreResult<Payment> {
        let mut tables = self.tables.write().await;
        tables.check(FailPoint::InsertPayment)?;
        if !tables.bookings.iter().any(|b| b.id == payment.booking_id) {
            return Err(StoreError::Backend(format!(
                "booking {} does not exist",
                payment.booking_id
            )));
        }

        let now = Utc::now();
        let row = Payment {
            id: Uuid::new_v4(),
            booking_id: payment.booking_id,
            amount: payment.amount,
            currency: payment.currency.clone(),
            status: payment.status,
            payment_method: payment.payment_method,
            payment_details: payment.payment_details.clone(),
            transaction_id: None,
            created_at: now,
            updated_at: now,
        };
        tables.payments.push(row.clone());
        Ok(row)
    }

    async fn find_payment(&self, payment_id: Uuid, owner: Uuid) -> StoreResult<Option<Payment>> {
        let tables = self.tables.read().await;
        Ok(tables
            .payments
            .iter()
            .find(|p| {
                p.id == payment_id
                    && tables
                        .bookings
                        .iter()
                        .any(|b| b.id == p.booking_id && b.user_id == owner)
            })
            .cloned())
    }

    async fn find_user_email(&self, user_id: Uuid) -> StoreResult<Option<String>> {
        Ok(self.tables.read().await.profiles.get(&user_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skybound_core::{FlightStatus, TripType};

    fn flight(economy: i32) -> Flight {
        let departure = Utc::now();
        Flight {
            id: Uuid::new_v4(),
            flight_number: "SB202".to_string(),
            airline_id: Uuid::new_v4(),
            origin_airport_id: Uuid::new_v4(),
            destination_airport_id: Uuid::new_v4(),
            departure_time: departure,
            arrival_time: departure + chrono::Duration::hours(2),
            duration_minutes: 120,
            status: FlightStatus::Scheduled,
            economy_price: 99.0,
            premium_economy_price: None,
            business_price: None,
            first_price: None,
            economy_available: economy,
            premium_economy_available: 0,
            business_available: 0,
            first_available: 0,
            stops: 0,
        }
    }

    fn new_booking(user_id: Uuid, reference: &str) -> NewBooking {
        NewBooking {
            user_id,
            booking_reference: reference.to_string(),
            trip_type: TripType::OneWay,
            cabin_class: CabinClass::Economy,
            total_amount: 99.0,
            status: BookingStatus::Confirmed,
        }
    }

    #[tokio::test]
    async fn test_try_deduct_is_conditional() {
        let store = InMemoryBookingStore::new();
        let f = flight(3);
        let flight_id = f.id;
        store.add_flight(f).await;

        assert_eq!(store.try_deduct_seats(flight_id, CabinClass::Economy, 2).await.unwrap(), Some(1));
        assert_eq!(store.try_deduct_seats(flight_id, CabinClass::Economy, 2).await.unwrap(), None);
        assert_eq!(store.flight(flight_id).await.unwrap().economy_available, 1);

        assert_eq!(store.release_seats(flight_id, CabinClass::Economy, 2).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_duplicate_reference_conflicts() {
        let store = InMemoryBookingStore::new();
        let user = Uuid::new_v4();
        store.insert_booking(&new_booking(user, "SBJ-AAAAAA")).await.unwrap();

        let err = store.insert_booking(&new_booking(user, "SBJ-AAAAAA")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_delete_booking_cascades() {
        let store = InMemoryBookingStore::new();
        let f = flight(3);
        let flight_id = f.id;
        store.add_flight(f).await;

        let booking = store.insert_booking(&new_booking(Uuid::new_v4(), "SBJ-BBBBBB")).await.unwrap();
        store
            .insert_booking_flights(&[NewBookingFlight {
                booking_id: booking.id,
                flight_id,
                is_return_flight: false,
            }])
            .await
            .unwrap();
        assert_eq!(store.booking_flight_count(booking.id).await, 1);

        store.delete_booking(booking.id).await.unwrap();
        assert_eq!(store.booking_count().await, 0);
        assert_eq!(store.booking_flight_count(booking.id).await, 0);
    }

    #[tokio::test]
    async fn test_duplicate_flight_link_conflicts() {
        let store = InMemoryBookingStore::new();
        let booking = store.insert_booking(&new_booking(Uuid::new_v4(), "SBJ-CCCCCC")).await.unwrap();
        let link = NewBookingFlight {
            booking_id: booking.id,
            flight_id: Uuid::new_v4(),
            is_return_flight: false,
        };

        let err = store
            .insert_booking_flights(&[link.clone(), link])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(store.booking_flight_count(booking.id).await, 0);
    }

    #[tokio::test]
    async fn test_owner_filter() {
        let store = InMemoryBookingStore::new();
        let owner = Uuid::new_v4();
        let booking = store.insert_booking(&new_booking(owner, "SBJ-DDDDDD")).await.unwrap();

        assert!(store.find_booking(booking.id, None).await.unwrap().is_some());
        assert!(store.find_booking(booking.id, Some(owner)).await.unwrap().is_some());
        assert!(store.find_booking(booking.id, Some(Uuid::new_v4())).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_status_transition_is_conditional() {
        let store = InMemoryBookingStore::new();
        let owner = Uuid::new_v4();
        let booking = store.insert_booking(&new_booking(owner, "SBJ-FFFFFF")).await.unwrap();
        let live = [BookingStatus::Pending, BookingStatus::Confirmed];

        let cancelled = store
            .transition_booking_status(booking.id, owner, &live, BookingStatus::Cancelled)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);

        // Already cancelled, and a stranger never matches.
        assert!(store
            .transition_booking_status(booking.id, owner, &live, BookingStatus::Cancelled)
            .await
            .unwrap()
            .is_none());
        assert!(store
            .transition_booking_status(booking.id, Uuid::new_v4(), &[BookingStatus::Cancelled], BookingStatus::Confirmed)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let store = InMemoryBookingStore::new();
        store.fail_on(FailPoint::InsertBooking).await;

        let err = store.insert_booking(&new_booking(Uuid::new_v4(), "SBJ-EEEEEE")).await.unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));

        store.clear_failures().await;
        assert!(store.insert_booking(&new_booking(Uuid::new_v4(), "SBJ-EEEEEE")).await.is_ok());
    }
}
