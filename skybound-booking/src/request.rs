use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use skybound_core::{BookingStatus, CabinClass, PassengerChanges, PassengerType, TripType};
use skybound_shared::Masked;
use std::fmt;
use uuid::Uuid;

/// Direction of a leg within a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LegRole {
    Outbound,
    Return,
}

impl LegRole {
    pub fn from_return_flag(is_return_flight: bool) -> Self {
        if is_return_flight {
            LegRole::Return
        } else {
            LegRole::Outbound
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LegRole::Outbound => "outbound",
            LegRole::Return => "return",
        }
    }
}

impl fmt::Display for LegRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FlightSelection {
    pub flight_id: Uuid,
    #[serde(default)]
    pub is_return_flight: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PassengerInput {
    #[serde(rename = "type")]
    pub passenger_type: PassengerType,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub passport_number: Option<Masked<String>>,
    #[serde(default)]
    pub nationality: Option<String>,
    #[serde(default)]
    pub cabin_class: Option<CabinClass>,
}

/// Everything a caller supplies to book; the owner comes from the caller's identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateBookingRequest {
    pub trip_type: TripType,
    pub flights: Vec<FlightSelection>,
    pub passengers: Vec<PassengerInput>,
    pub total_amount: f64,
}

impl CreateBookingRequest {
    /// Check leg cardinality and passenger input, returning the cabin class
    /// the whole booking is reserved in.
    pub fn check(&self) -> Result<CabinClass, String> {
        let expected = self.trip_type.leg_count();
        if self.flights.len() != expected {
            let label = match self.trip_type {
                TripType::OneWay => "One-way",
                TripType::RoundTrip => "Round-trip",
            };
            return Err(format!(
                "{} bookings require exactly {} flight{}, got {}",
                label,
                expected,
                if expected == 1 { "" } else { "s" },
                self.flights.len()
            ));
        }

        let returns = self.flights.iter().filter(|f| f.is_return_flight).count();
        match self.trip_type {
            TripType::OneWay if returns > 0 => {
                return Err("One-way bookings cannot contain a return flight".to_string());
            }
            TripType::RoundTrip if returns != 1 => {
                return Err(
                    "Round-trip bookings require one outbound and one return flight".to_string(),
                );
            }
            _ => {}
        }

        if self.passengers.is_empty() {
            return Err("At least one passenger is required".to_string());
        }

        self.passengers
            .iter()
            .find_map(|p| p.cabin_class)
            .ok_or_else(|| "Cabin class is required for at least one passenger".to_string())
    }

    /// One reservation per leg, each covering every passenger.
    pub fn reservations(&self, cabin_class: CabinClass) -> Vec<FlightReservationRequest> {
        let passenger_count = self.passengers.len() as i32;
        self.flights
            .iter()
            .map(|f| FlightReservationRequest {
                flight_id: f.flight_id,
                cabin_class,
                passenger_count,
                is_return_flight: f.is_return_flight,
            })
            .collect()
    }
}

/// Edits to one passenger of an existing booking. Absent fields stay as they are.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PassengerUpdate {
    pub id: Uuid,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub passport_number: Option<Masked<String>>,
    #[serde(default)]
    pub nationality: Option<String>,
}

impl PassengerUpdate {
    pub fn changes(&self) -> PassengerChanges {
        PassengerChanges {
            passenger_id: self.id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            date_of_birth: self.date_of_birth,
            passport_number: self.passport_number.clone(),
            nationality: self.nationality.clone(),
        }
    }
}

/// Partial update of a booking: a new status, passenger edits, or both.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UpdateBookingRequest {
    #[serde(default)]
    pub status: Option<BookingStatus>,
    #[serde(default)]
    pub passengers: Vec<PassengerUpdate>,
}

/// Seats to hold on one leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlightReservationRequest {
    pub flight_id: Uuid,
    pub cabin_class: CabinClass,
    pub passenger_count: i32,
    pub is_return_flight: bool,
}

impl FlightReservationRequest {
    pub fn role(&self) -> LegRole {
        LegRole::from_return_flag(self.is_return_flight)
    }
}
