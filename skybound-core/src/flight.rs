use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::ParseEnumError;

/// Cabin class. Each class has its own price and seat inventory on a flight.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum CabinClass {
    Economy,
    PremiumEconomy,
    Business,
    First,
}

impl CabinClass {
    pub const ALL: [CabinClass; 4] = [
        CabinClass::Economy,
        CabinClass::PremiumEconomy,
        CabinClass::Business,
        CabinClass::First,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CabinClass::Economy => "economy",
            CabinClass::PremiumEconomy => "premium-economy",
            CabinClass::Business => "business",
            CabinClass::First => "first",
        }
    }

    /// Name of the `flights` column holding the remaining seats of this cabin.
    pub fn seat_column(&self) -> &'static str {
        match self {
            CabinClass::Economy => "economy_available",
            CabinClass::PremiumEconomy => "premium_economy_available",
            CabinClass::Business => "business_available",
            CabinClass::First => "first_available",
        }
    }
}

impl fmt::Display for CabinClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CabinClass {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "economy" => Ok(CabinClass::Economy),
            "premium-economy" => Ok(CabinClass::PremiumEconomy),
            "business" => Ok(CabinClass::Business),
            "first" => Ok(CabinClass::First),
            other => Err(ParseEnumError::new("cabin class", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FlightStatus {
    Scheduled,
    Delayed,
    Cancelled,
    InAir,
    Landed,
    Diverted,
}

impl FlightStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlightStatus::Scheduled => "scheduled",
            FlightStatus::Delayed => "delayed",
            FlightStatus::Cancelled => "cancelled",
            FlightStatus::InAir => "in_air",
            FlightStatus::Landed => "landed",
            FlightStatus::Diverted => "diverted",
        }
    }
}

impl FromStr for FlightStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(FlightStatus::Scheduled),
            "delayed" => Ok(FlightStatus::Delayed),
            "cancelled" => Ok(FlightStatus::Cancelled),
            "in_air" => Ok(FlightStatus::InAir),
            "landed" => Ok(FlightStatus::Landed),
            "diverted" => Ok(FlightStatus::Diverted),
            other => Err(ParseEnumError::new("flight status", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Flight {
    pub id: Uuid,
    pub flight_number: String,
    pub airline_id: Uuid,
    pub origin_airport_id: Uuid,
    pub destination_airport_id: Uuid,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub duration_minutes: i32,
    pub status: FlightStatus,
    pub economy_price: f64,
    pub premium_economy_price: Option<f64>,
    pub business_price: Option<f64>,
    pub first_price: Option<f64>,
    pub economy_available: i32,
    pub premium_economy_available: i32,
    pub business_available: i32,
    pub first_available: i32,
    pub stops: i32,
}

impl Flight {
    /// Remaining seats in the given cabin.
    pub fn available_seats(&self, cabin: CabinClass) -> i32 {
        match cabin {
            CabinClass::Economy => self.economy_available,
            CabinClass::PremiumEconomy => self.premium_economy_available,
            CabinClass::Business => self.business_available,
            CabinClass::First => self.first_available,
        }
    }

    /// Overwrite the remaining seats of a cabin. Negative counts are floored at zero.
    pub fn set_available_seats(&mut self, cabin: CabinClass, count: i32) {
        let count = count.max(0);
        match cabin {
            CabinClass::Economy => self.economy_available = count,
            CabinClass::PremiumEconomy => self.premium_economy_available = count,
            CabinClass::Business => self.business_available = count,
            CabinClass::First => self.first_available = count,
        }
    }

    pub fn seat_availability(&self) -> SeatAvailability {
        SeatAvailability {
            flight_id: self.id,
            economy_available: self.economy_available,
            premium_economy_available: self.premium_economy_available,
            business_available: self.business_available,
            first_available: self.first_available,
        }
    }
}

/// Remaining seats of every cabin on one flight.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeatAvailability {
    pub flight_id: Uuid,
    pub economy_available: i32,
    pub premium_economy_available: i32,
    pub business_available: i32,
    pub first_available: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Airline {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Airport {
    pub id: Uuid,
    pub iata_code: String,
    pub icao_code: Option<String>,
    pub name: String,
    pub city: String,
    pub country: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub timezone: Option<String>,
}

/// A flight joined with its airline and both airports, as shown in booking details.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlightDetail {
    #[serde(flatten)]
    pub flight: Flight,
    pub airline: Option<Airline>,
    pub origin_airport: Option<Airport>,
    pub destination_airport: Option<Airport>,
}
