use chrono::{Duration, Utc};
use skybound_core::{Flight, FlightStatus};
use uuid::Uuid;

pub(crate) fn flight_with_economy(flight_number: &str, economy_available: i32) -> Flight {
    let departure = Utc::now() + Duration::days(14);
    Flight {
        id: Uuid::new_v4(),
        flight_number: flight_number.to_string(),
        airline_id: Uuid::new_v4(),
        origin_airport_id: Uuid::new_v4(),
        destination_airport_id: Uuid::new_v4(),
        departure_time: departure,
        arrival_time: departure + Duration::minutes(135),
        duration_minutes: 135,
        status: FlightStatus::Scheduled,
        economy_price: 120.0,
        premium_economy_price: Some(240.0),
        business_price: Some(480.0),
        first_price: None,
        economy_available,
        premium_economy_available: 8,
        business_available: 4,
        first_available: 0,
        stops: 0,
    }
}
