use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use skybound_shared::Masked;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::flight::{CabinClass, FlightDetail};
use crate::ParseEnumError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TripType {
    OneWay,
    RoundTrip,
}

impl TripType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripType::OneWay => "one-way",
            TripType::RoundTrip => "round-trip",
        }
    }

    /// Number of flight legs a booking of this type carries.
    pub fn leg_count(&self) -> usize {
        match self {
            TripType::OneWay => 1,
            TripType::RoundTrip => 2,
        }
    }
}

impl fmt::Display for TripType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TripType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "one-way" => Ok(TripType::OneWay),
            "round-trip" => Ok(TripType::RoundTrip),
            other => Err(ParseEnumError::new("trip type", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(ParseEnumError::new("booking status", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PassengerType {
    Adult,
    Child,
    Infant,
}

impl PassengerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PassengerType::Adult => "adult",
            PassengerType::Child => "child",
            PassengerType::Infant => "infant",
        }
    }
}

impl FromStr for PassengerType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "adult" => Ok(PassengerType::Adult),
            "child" => Ok(PassengerType::Child),
            "infant" => Ok(PassengerType::Infant),
            other => Err(ParseEnumError::new("passenger type", other)),
        }
    }
}

/// A persisted booking row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub booking_reference: String,
    pub trip_type: TripType,
    /// Cabin every leg's seats were taken from.
    pub cabin_class: CabinClass,
    pub total_amount: f64,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a booking; ids and timestamps are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub user_id: Uuid,
    pub booking_reference: String,
    pub trip_type: TripType,
    pub cabin_class: CabinClass,
    pub total_amount: f64,
    pub status: BookingStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingFlight {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub flight_id: Uuid,
    pub is_return_flight: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewBookingFlight {
    pub booking_id: Uuid,
    pub flight_id: Uuid,
    pub is_return_flight: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Passenger {
    pub id: Uuid,
    pub booking_id: Uuid,
    #[serde(rename = "type")]
    pub passenger_type: PassengerType,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub passport_number: Option<Masked<String>>,
    pub nationality: Option<String>,
    pub cabin_class: CabinClass,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPassenger {
    pub booking_id: Uuid,
    pub passenger_type: PassengerType,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub passport_number: Option<Masked<String>>,
    pub nationality: Option<String>,
    pub cabin_class: CabinClass,
}

/// Editable passenger fields; `None` keeps the stored value.
#[derive(Debug, Clone)]
pub struct PassengerChanges {
    pub passenger_id: Uuid,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub passport_number: Option<Masked<String>>,
    pub nationality: Option<String>,
}

impl PassengerChanges {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.date_of_birth.is_none()
            && self.passport_number.is_none()
            && self.nationality.is_none()
    }
}

/// A flight link joined with its flight (when the flight row still exists).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingFlightDetail {
    #[serde(flatten)]
    pub link: BookingFlight,
    pub flight: Option<FlightDetail>,
}

/// The composed booking view returned to callers and used for email content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingDetail {
    #[serde(flatten)]
    pub booking: Booking,
    pub flights: Vec<BookingFlightDetail>,
    pub passengers: Vec<Passenger>,
}

impl BookingDetail {
    pub fn outbound(&self) -> Option<&BookingFlightDetail> {
        self.flights.iter().find(|f| !f.link.is_return_flight)
    }

    pub fn inbound(&self) -> Option<&BookingFlightDetail> {
        self.flights.iter().find(|f| f.link.is_return_flight)
    }
}
