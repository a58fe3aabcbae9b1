use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use skybound_core::{
    Airline, Airport, Booking, BookingFlight, BookingFlightDetail, BookingStatus, BookingStore,
    CabinClass, Flight, FlightDetail, NewBooking, NewBookingFlight, NewPassenger, NewPayment,
    ParseEnumError, Passenger, PassengerChanges, Payment, StoreError, StoreResult,
};
use serde_json::Value;
use skybound_shared::Masked;
use sqlx::PgPool;
use uuid::Uuid;

const FLIGHT_COLUMNS: &str = "id, flight_number, airline_id, origin_airport_id, destination_airport_id, \
    departure_time, arrival_time, duration_minutes, status, \
    economy_price::float8 AS economy_price, premium_economy_price::float8 AS premium_economy_price, \
    business_price::float8 AS business_price, first_price::float8 AS first_price, \
    economy_available, premium_economy_available, business_available, first_available, stops";

const BOOKING_COLUMNS: &str = "id, user_id, booking_reference, trip_type, cabin_class, \
    total_amount::float8 AS total_amount, status, created_at, updated_at";

const PASSENGER_COLUMNS: &str = "id, booking_id, type AS passenger_type, first_name, last_name, \
    date_of_birth, passport_number, nationality, cabin_class, created_at";

const PAYMENT_COLUMNS: &str = "id, booking_id, amount::float8 AS amount, currency, status, \
    payment_method, payment_details, transaction_id, created_at, updated_at";

/// `BookingStore` over the Postgres schema in `migrations/`.
pub struct PgBookingStore {
    pool: PgPool,
}

impl PgBookingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_airport(&self, airport_id: Uuid) -> StoreResult<Option<Airport>> {
        let row = sqlx::query_as::<_, AirportRow>(
            "SELECT id, iata_code, icao_code, name, city, country, latitude, longitude, timezone \
             FROM airports WHERE id = $1",
        )
        .bind(airport_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(row.map(Airport::from))
    }
}

fn db_err(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Conflict(db.message().to_string())
        }
        sqlx::Error::RowNotFound => StoreError::NotFound(err.to_string()),
        _ => StoreError::Backend(err.to_string()),
    }
}

fn enum_err(err: ParseEnumError) -> StoreError {
    StoreError::Backend(err.to_string())
}

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct FlightRow {
    id: Uuid,
    flight_number: String,
    airline_id: Uuid,
    origin_airport_id: Uuid,
    destination_airport_id: Uuid,
    departure_time: DateTime<Utc>,
    arrival_time: DateTime<Utc>,
    duration_minutes: i32,
    status: String,
    economy_price: f64,
    premium_economy_price: Option<f64>,
    business_price: Option<f64>,
    first_price: Option<f64>,
    economy_available: i32,
    premium_economy_available: i32,
    business_available: i32,
    first_available: i32,
    stops: i32,
}

impl TryFrom<FlightRow> for Flight {
    type Error = StoreError;

    fn try_from(row: FlightRow) -> Result<Self, Self::Error> {
        Ok(Flight {
            id: row.id,
            flight_number: row.flight_number,
            airline_id: row.airline_id,
            origin_airport_id: row.origin_airport_id,
            destination_airport_id: row.destination_airport_id,
            departure_time: row.departure_time,
            arrival_time: row.arrival_time,
            duration_minutes: row.duration_minutes,
            status: row.status.parse().map_err(enum_err)?,
            economy_price: row.economy_price,
            premium_economy_price: row.premium_economy_price,
            business_price: row.business_price,
            first_price: row.first_price,
            economy_available: row.economy_available,
            premium_economy_available: row.premium_economy_available,
            business_available: row.business_available,
            first_available: row.first_available,
            stops: row.stops,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AirlineRow {
    id: Uuid,
    code: String,
    name: String,
    logo_url: Option<String>,
}

impl From<AirlineRow> for Airline {
    fn from(row: AirlineRow) -> Self {
        Airline {
            id: row.id,
            code: row.code,
            name: row.name,
            logo_url: row.logo_url,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AirportRow {
    id: Uuid,
    iata_code: String,
    icao_code: Option<String>,
    name: String,
    city: String,
    country: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    timezone: Option<String>,
}

impl From<AirportRow> for Airport {
    fn from(row: AirportRow) -> Self {
        Airport {
            id: row.id,
            iata_code: row.iata_code,
            icao_code: row.icao_code,
            name: row.name,
            city: row.city,
            country: row.country,
            latitude: row.latitude,
            longitude: row.longitude,
            timezone: row.timezone,
        }
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    user_id: Uuid,
    booking_reference: String,
    trip_type: String,
    cabin_class: String,
    total_amount: f64,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = StoreError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        Ok(Booking {
            id: row.id,
            user_id: row.user_id,
            booking_reference: row.booking_reference,
            trip_type: row.trip_type.parse().map_err(enum_err)?,
            cabin_class: row.cabin_class.parse().map_err(enum_err)?,
            total_amount: row.total_amount,
            status: row.status.parse().map_err(enum_err)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct BookingFlightRow {
    id: Uuid,
    booking_id: Uuid,
    flight_id: Uuid,
    is_return_flight: bool,
    created_at: DateTime<Utc>,
}

impl From<BookingFlightRow> for BookingFlight {
    fn from(row: BookingFlightRow) -> Self {
        BookingFlight {
            id: row.id,
            booking_id: row.booking_id,
            flight_id: row.flight_id,
            is_return_flight: row.is_return_flight,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PassengerRow {
    id: Uuid,
    booking_id: Uuid,
    passenger_type: String,
    first_name: String,
    last_name: String,
    date_of_birth: Option<NaiveDate>,
    passport_number: Option<String>,
    nationality: Option<String>,
    cabin_class: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<PassengerRow> for Passenger {
    type Error = StoreError;

    fn try_from(row: PassengerRow) -> Result<Self, Self::Error> {
        Ok(Passenger {
            id: row.id,
            booking_id: row.booking_id,
            passenger_type: row.passenger_type.parse().map_err(enum_err)?,
            first_name: row.first_name,
            last_name: row.last_name,
            date_of_birth: row.date_of_birth,
            passport_number: row.passport_number.map(Masked::new),
            nationality: row.nationality,
            cabin_class: row.cabin_class.parse().map_err(enum_err)?,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    booking_id: Uuid,
    amount: f64,
    currency: String,
    status: String,
    payment_method: String,
    payment_details: Option<Value>,
    transaction_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = StoreError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        Ok(Payment {
            id: row.id,
            booking_id: row.booking_id,
            amount: row.amount,
            currency: row.currency,
            status: row.status.parse().map_err(enum_err)?,
            payment_method: row.payment_method.parse().map_err(enum_err)?,
            payment_details: row.payment_details,
            transaction_id: row.transaction_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl BookingStore for PgBookingStore {
    async fn find_flight(&self, flight_id: Uuid) -> StoreResult<Option<Flight>> {
        let sql = format!("SELECT {} FROM flights WHERE id = $1", FLIGHT_COLUMNS);
        let row = sqlx::query_as::<_, FlightRow>(&sql)
            .bind(flight_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.map(Flight::try_from).transpose()
    }

    async fn find_flight_detail(&self, flight_id: Uuid) -> StoreResult<Option<FlightDetail>> {
        let Some(flight) = self.find_flight(flight_id).await? else {
            return Ok(None);
        };

        let airline = sqlx::query_as::<_, AirlineRow>(
            "SELECT id, code, name, logo_url FROM airlines WHERE id = $1",
        )
        .bind(flight.airline_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .map(Airline::from);

        let origin_airport = self.find_airport(flight.origin_airport_id).await?;
        let destination_airport = self.find_airport(flight.destination_airport_id).await?;

        Ok(Some(FlightDetail {
            flight,
            airline,
            origin_airport,
            destination_airport,
        }))
    }

    async fn set_available_seats(
        &self,
        flight_id: Uuid,
        cabin: CabinClass,
        count: i32,
    ) -> StoreResult<Flight> {
        let sql = format!(
            "UPDATE flights SET {col} = $1, updated_at = NOW() WHERE id = $2 RETURNING {cols}",
            col = cabin.seat_column(),
            cols = FLIGHT_COLUMNS
        );
        let row = sqlx::query_as::<_, FlightRow>(&sql)
            .bind(count.max(0))
            .bind(flight_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .ok_or_else(|| StoreError::NotFound(format!("flight {}", flight_id)))?;
        Flight::try_from(row)
    }

    async fn try_deduct_seats(
        &self,
        flight_id: Uuid,
        cabin: CabinClass,
        seats: i32,
    ) -> StoreResult<Option<i32>> {
        let sql = format!(
            "UPDATE flights SET {col} = {col} - $1, updated_at = NOW() \
             WHERE id = $2 AND {col} >= $1 RETURNING {col}",
            col = cabin.seat_column()
        );
        let remaining: Option<(i32,)> = sqlx::query_as(&sql)
            .bind(seats)
            .bind(flight_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        if let Some((count,)) = remaining {
            return Ok(Some(count));
        }

        // No row updated: either the flight is gone or the cabin is short.
        let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM flights WHERE id = $1")
            .bind(flight_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        match exists {
            Some(_) => Ok(None),
            None => Err(StoreError::NotFound(format!("flight {}", flight_id))),
        }
    }

    async fn release_seats(
        &self,
        flight_id: Uuid,
        cabin: CabinClass,
        seats: i32,
    ) -> StoreResult<i32> {
        let sql = format!(
            "UPDATE flights SET {col} = {col} + $1, updated_at = NOW() WHERE id = $2 RETURNING {col}",
            col = cabin.seat_column()
        );
        let (count,): (i32,) = sqlx::query_as(&sql)
            .bind(seats)
            .bind(flight_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .ok_or_else(|| StoreError::NotFound(format!("flight {}", flight_id)))?;
        Ok(count)
    }

    async fn insert_booking(&self, booking: &NewBooking) -> StoreResult<Booking> {
        let sql = format!(
            "INSERT INTO bookings (id, user_id, booking_reference, trip_type, cabin_class, \
             total_amount, status) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            BOOKING_COLUMNS
        );
        let row = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(booking.user_id)
            .bind(&booking.booking_reference)
            .bind(booking.trip_type.as_str())
            .bind(booking.cabin_class.as_str())
            .bind(booking.total_amount)
            .bind(booking.status.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        Booking::try_from(row)
    }

    async fn insert_booking_flights(
        &self,
        links: &[NewBookingFlight],
    ) -> StoreResult<Vec<BookingFlight>> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let mut rows = Vec::with_capacity(links.len());

        for link in links {
            let row = sqlx::query_as::<_, BookingFlightRow>(
                r#"
                INSERT INTO booking_flights (id, booking_id, flight_id, is_return_flight)
                VALUES ($1, $2, $3, $4)
                RETURNING id, booking_id, flight_id, is_return_flight, created_at
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(link.booking_id)
            .bind(link.flight_id)
            .bind(link.is_return_flight)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_err)?;
            rows.push(BookingFlight::from(row));
        }

        tx.commit().await.map_err(db_err)?;
        Ok(rows)
    }

    async fn insert_passengers(&self, passengers: &[NewPassenger]) -> StoreResult<Vec<Passenger>> {
        let sql = format!(
            "INSERT INTO passengers (id, booking_id, type, first_name, last_name, date_of_birth, \
             passport_number, nationality, cabin_class) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {}",
            PASSENGER_COLUMNS
        );
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let mut rows = Vec::with_capacity(passengers.len());

        for p in passengers {
            let row = sqlx::query_as::<_, PassengerRow>(&sql)
                .bind(Uuid::new_v4())
                .bind(p.booking_id)
                .bind(p.passenger_type.as_str())
                .bind(&p.first_name)
                .bind(&p.last_name)
                .bind(p.date_of_birth)
                .bind(p.passport_number.as_ref().map(|n| n.expose().clone()))
                .bind(&p.nationality)
                .bind(p.cabin_class.as_str())
                .fetch_one(&mut *tx)
                .await
                .map_err(db_err)?;
            rows.push(Passenger::try_from(row)?);
        }

        tx.commit().await.map_err(db_err)?;
        Ok(rows)
    }

    async fn delete_booking_flights(&self, booking_id: Uuid) -> StoreResult<()> {
        sqlx::query("DELETE FROM booking_flights WHERE booking_id = $1")
            .bind(booking_id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn delete_booking(&self, booking_id: Uuid) -> StoreResult<()> {
        // booking_flights and passengers go with it (ON DELETE CASCADE)
        sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(booking_id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn find_booking(
        &self,
        booking_id: Uuid,
        owner: Option<Uuid>,
    ) -> StoreResult<Option<Booking>> {
        let sql = format!(
            "SELECT {} FROM bookings WHERE id = $1 AND ($2::uuid IS NULL OR user_id = $2)",
            BOOKING_COLUMNS
        );
        let row = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(booking_id)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.map(Booking::try_from).transpose()
    }

    async fn list_bookings(&self, user_id: Uuid) -> StoreResult<Vec<Booking>> {
        let sql = format!(
            "SELECT {} FROM bookings WHERE user_id = $1 ORDER BY created_at DESC",
            BOOKING_COLUMNS
        );
        let rows = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.into_iter().map(Booking::try_from).collect()
    }

    async fn find_booking_flights(
        &self,
        booking_id: Uuid,
    ) -> StoreResult<Vec<BookingFlightDetail>> {
        let rows = sqlx::query_as::<_, BookingFlightRow>(
            r#"
            SELECT id, booking_id, flight_id, is_return_flight, created_at
            FROM booking_flights
            WHERE booking_id = $1
            ORDER BY is_return_flight, created_at
            "#,
        )
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let mut details = Vec::with_capacity(rows.len());
        for row in rows {
            let link = BookingFlight::from(row);
            let flight = self.find_flight_detail(link.flight_id).await?;
            details.push(BookingFlightDetail { link, flight });
        }
        Ok(details)
    }

    async fn find_passengers(&self, booking_id: Uuid) -> StoreResult<Vec<Passenger>> {
        let sql = format!(
            "SELECT {} FROM passengers WHERE booking_id = $1 ORDER BY created_at",
            PASSENGER_COLUMNS
        );
        let rows = sqlx::query_as::<_, PassengerRow>(&sql)
            .bind(booking_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.into_iter().map(Passenger::try_from).collect()
    }

    async fn transition_booking_status(
        &self,
        booking_id: Uuid,
        owner: Uuid,
        from: &[BookingStatus],
        to: BookingStatus,
    ) -> StoreResult<Option<Booking>> {
        let sql = format!(
            "UPDATE bookings SET status = $1, updated_at = NOW() \
             WHERE id = $2 AND user_id = $3 AND status = ANY($4) RETURNING {}",
            BOOKING_COLUMNS
        );
        let from: Vec<String> = from.iter().map(|s| s.as_str().to_string()).collect();
        let row = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(to.as_str())
            .bind(booking_id)
            .bind(owner)
            .bind(from)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.map(Booking::try_from).transpose()
    }

    async fn update_passenger(
        &self,
        booking_id: Uuid,
        changes: &PassengerChanges,
    ) -> StoreResult<Option<Passenger>> {
        let sql = format!(
            "UPDATE passengers SET first_name = COALESCE($3, first_name), \
             last_name = COALESCE($4, last_name), date_of_birth = COALESCE($5, date_of_birth), \
             passport_number = COALESCE($6, passport_number), \
             nationality = COALESCE($7, nationality) \
             WHERE id = $1 AND booking_id = $2 RETURNING {}",
            PASSENGER_COLUMNS
        );
        let row = sqlx::query_as::<_, PassengerRow>(&sql)
            .bind(changes.passenger_id)
            .bind(booking_id)
            .bind(&changes.first_name)
            .bind(&changes.last_name)
            .bind(changes.date_of_birth)
            .bind(changes.passport_number.as_ref().map(|n| n.expose().clone()))
            .bind(&changes.nationality)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.map(Passenger::try_from).transpose()
    }

    async fn insert_payment(&self, payment: &NewPayment) -> StoreResult<Payment> {
        let sql = format!(
            "INSERT INTO payments (id, booking_id, amount, currency, status, payment_method, \
             payment_details) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            PAYMENT_COLUMNS
        );
        let row = sqlx::query_as::<_, PaymentRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(payment.booking_id)
            .bind(payment.amount)
            .bind(&payment.currency)
            .bind(payment.status.as_str())
            .bind(payment.payment_method.as_str())
            .bind(&payment.payment_details)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        Payment::try_from(row)
    }

    async fn find_payment(&self, payment_id: Uuid, owner: Uuid) -> StoreResult<Option<Payment>> {
        let row = sqlx::query_as::<_, PaymentRow>(
            r#"
            SELECT p.id, p.booking_id, p.amount::float8 AS amount, p.currency, p.status,
                   p.payment_method, p.payment_details, p.transaction_id, p.created_at, p.updated_at
            FROM payments p
            JOIN bookings b ON b.id = p.booking_id
            WHERE p.id = $1 AND b.user_id = $2
            "#,
        )
            .bind(payment_id)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.map(Payment::try_from).transpose()
    }

    async fn find_user_email(&self, user_id: Uuid) -> StoreResult<Option<String>> {
        let row: Option<(Option<String>,)> =
            sqlx::query_as("SELECT email FROM profiles WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;
        Ok(row.and_then(|(email,)| email))
    }
}
