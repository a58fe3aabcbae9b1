use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use skybound_api::{app, middleware::Claims, AppState, AuthConfig};
use skybound_booking::BookingService;
use skybound_core::{BookingPolicy, Flight, FlightStatus, LogNotifier};
use skybound_store::{FailPoint, InMemoryBookingStore};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

const SECRET: &str = "test-secret";

fn token_for(user_id: Uuid) -> String {
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (Utc::now() + Duration::hours(1)).timestamp() as usize,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
}

async fn setup(economy_available: i32) -> (Router, Arc<InMemoryBookingStore>, Flight) {
    let store = Arc::new(InMemoryBookingStore::new());
    let departure = Utc::now() + Duration::days(10);
    let flight = Flight {
        id: Uuid::new_v4(),
        flight_number: "SB500".to_string(),
        airline_id: Uuid::new_v4(),
        origin_airport_id: Uuid::new_v4(),
        destination_airport_id: Uuid::new_v4(),
        departure_time: departure,
        arrival_time: departure + Duration::minutes(95),
        duration_minutes: 95,
        status: FlightStatus::Scheduled,
        economy_price: 80.0,
        premium_economy_price: None,
        business_price: None,
        first_price: None,
        economy_available,
        premium_economy_available: 0,
        business_available: 0,
        first_available: 0,
        stops: 0,
    };
    store.add_flight(flight.clone()).await;

    let service = BookingService::new(store.clone(), Arc::new(LogNotifier), BookingPolicy::default());
    let state = AppState {
        bookings: Arc::new(service),
        auth: AuthConfig {
            secret: SECRET.to_string(),
            audience: None,
        },
    };
    (app(state), store, flight)
}

fn booking_body(flight: &Flight, passengers: usize) -> Value {
    let passengers: Vec<Value> = (0..passengers)
        .map(|i| {
            json!({
                "type": "adult",
                "first_name": format!("Guest{}", i),
                "last_name": "Das",
                "cabin_class": "economy"
            })
        })
        .collect();
    json!({
        "trip_type": "one-way",
        "flights": [{ "flight_id": flight.id, "is_return_flight": false }],
        "passengers": passengers,
        "total_amount": 160.0
    })
}

fn request(method: &str, uri: &str, user: Option<Uuid>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("Authorization", format!("Bearer {}", token_for(user)));
    }
    match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_needs_no_token() {
    let (app, _, _) = setup(5).await;
    let response = app.oneshot(request("GET", "/health", None, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_missing_or_bad_token_is_unauthorized() {
    let (app, _, _) = setup(5).await;

    let response = app
        .clone()
        .oneshot(request("GET", "/v1/bookings", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let forged = Request::builder()
        .uri("/v1/bookings")
        .header("Authorization", "Bearer not-a-jwt")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(forged).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_caller_is_the_token_subject_only() {
    let (app, _, _) = setup(5).await;
    let user = Uuid::new_v4();

    // Identity-provider tokens carry more claims than the subject; they are ignored.
    let claims = json!({
        "sub": user.to_string(),
        "exp": (Utc::now() + Duration::hours(1)).timestamp(),
        "email": "someone-else@example.com",
        "role": "authenticated",
    });
    let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/v1/bookings")
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!([]));
}

#[tokio::test]
async fn test_create_then_fetch_and_cancel() {
    let (app, store, flight) = setup(5).await;
    let user = Uuid::new_v4();

    let response = app
        .clone()
        .oneshot(request("POST", "/v1/bookings", Some(user), Some(booking_body(&flight, 2))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let created = json_body(response).await;
    assert_eq!(created["status"], "confirmed");
    assert_eq!(created["passengers"].as_array().unwrap().len(), 2);
    assert_eq!(store.flight(flight.id).await.unwrap().economy_available, 3);

    let booking_id = created["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(request("GET", &format!("/v1/bookings/{}", booking_id), Some(user), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let fetched = json_body(response).await;
    assert_eq!(fetched["booking_reference"], created["booking_reference"]);

    let response = app
        .clone()
        .oneshot(request("GET", "/v1/bookings", Some(user), None))
        .await
        .unwrap();
    assert_eq!(json_body(response).await.as_array().unwrap().len(), 1);

    let cancel_uri = format!("/v1/bookings/{}/cancel", booking_id);
    let response = app
        .clone()
        .oneshot(request("PUT", &cancel_uri, Some(user), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "cancelled");

    let response = app
        .oneshot(request("PUT", &cancel_uri, Some(user), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "Booking is already cancelled.");
}

#[tokio::test]
async fn test_other_users_booking_is_404() {
    let (app, _, flight) = setup(5).await;
    let owner = Uuid::new_v4();

    let response = app
        .clone()
        .oneshot(request("POST", "/v1/bookings", Some(owner), Some(booking_body(&flight, 1))))
        .await
        .unwrap();
    let booking_id = json_body(response).await["id"].as_str().unwrap().to_string();

    let stranger = Uuid::new_v4();
    let response = app
        .clone()
        .oneshot(request("GET", &format!("/v1/bookings/{}", booking_id), Some(stranger), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(request(
            "PUT",
            &format!("/v1/bookings/{}/cancel", booking_id),
            Some(stranger),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_insufficient_seats_is_400() {
    let (app, store, flight) = setup(1).await;

    let response = app
        .oneshot(request(
            "POST",
            "/v1/bookings",
            Some(Uuid::new_v4()),
            Some(booking_body(&flight, 2)),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(
        body["error"],
        "Not enough economy seats available on outbound flight SB500. Available: 1, Requested: 2"
    );
    assert_eq!(store.flight(flight.id).await.unwrap().economy_available, 1);
}

#[tokio::test]
async fn test_store_failure_is_500_and_seats_restored() {
    let (app, store, flight) = setup(5).await;
    store.fail_on(FailPoint::InsertBooking).await;

    let response = app
        .oneshot(request(
            "POST",
            "/v1/bookings",
            Some(Uuid::new_v4()),
            Some(booking_body(&flight, 3)),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().starts_with("Failed to create booking"));
    assert_eq!(store.flight(flight.id).await.unwrap().economy_available, 5);
}

#[tokio::test]
async fn test_generate_reference() {
    let (app, _, _) = setup(5).await;

    let response = app
        .oneshot(request(
            "GET",
            "/v1/bookings/reference/generate",
            Some(Uuid::new_v4()),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let reference = body["booking_reference"].as_str().unwrap();
    assert!(reference.starts_with("SBJ-"));
    assert_eq!(reference.len(), 10);
}

async fn create(app: &Router, user: Uuid, flight: &Flight, passengers: usize) -> Value {
    let response = app
        .clone()
        .oneshot(request("POST", "/v1/bookings", Some(user), Some(booking_body(flight, passengers))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    json_body(response).await
}

#[tokio::test]
async fn test_update_edits_passengers_and_cancels() {
    let (app, store, flight) = setup(5).await;
    let user = Uuid::new_v4();
    let created = create(&app, user, &flight, 2).await;
    let booking_uri = format!("/v1/bookings/{}", created["id"].as_str().unwrap());
    let passenger_id = created["passengers"][0]["id"].clone();

    let response = app
        .clone()
        .oneshot(request(
            "PUT",
            &booking_uri,
            Some(user),
            Some(json!({ "passengers": [{ "id": passenger_id, "first_name": "Kavya" }] })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = json_body(response).await;
    assert_eq!(updated["status"], "confirmed");
    let renamed = updated["passengers"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["id"] == passenger_id)
        .unwrap();
    assert_eq!(renamed["first_name"], "Kavya");

    let response = app
        .clone()
        .oneshot(request("PUT", &booking_uri, Some(user), Some(json!({ "status": "cancelled" }))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "cancelled");
    assert_eq!(store.flight(flight.id).await.unwrap().economy_available, 3);

    let response = app
        .oneshot(request("PUT", &booking_uri, Some(user), Some(json!({ "status": "confirmed" }))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "Cancelled bookings cannot be modified.");
}

#[tokio::test]
async fn test_flight_reads_are_public() {
    let (app, _, flight) = setup(5).await;

    let response = app
        .clone()
        .oneshot(request("GET", &format!("/v1/flights/{}", flight.id), None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["flight_number"], "SB500");

    let response = app
        .clone()
        .oneshot(request("GET", &format!("/v1/flights/{}/availability", flight.id), None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let seats = json_body(response).await;
    assert_eq!(seats["economy_available"], 5);
    assert_eq!(seats["business_available"], 0);

    let response = app
        .oneshot(request("GET", &format!("/v1/flights/{}", Uuid::new_v4()), None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["error"], "Flight not found");
}

#[tokio::test]
async fn test_payment_is_masked_and_owner_scoped() {
    let (app, _, flight) = setup(5).await;
    let user = Uuid::new_v4();
    let created = create(&app, user, &flight, 1).await;

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/v1/payments",
            Some(user),
            Some(json!({
                "booking_id": created["id"],
                "amount": 80.0,
                "payment_method": "credit_card",
                "payment_details": { "card_number": "4111111111114321", "cvv": "999" }
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let paid = json_body(response).await;
    assert_eq!(paid["status"], "completed");
    assert_eq!(paid["currency"], "USD");
    assert_eq!(paid["payment_details"]["card_number"], "****-****-****-4321");
    assert!(paid["payment_details"].get("cvv").is_none());

    let payment_uri = format!("/v1/payments/{}", paid["id"].as_str().unwrap());
    let response = app
        .clone()
        .oneshot(request("GET", &payment_uri, Some(user), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["payment_details"]["card_number"], "****-****-****-4321");

    let response = app
        .clone()
        .oneshot(request("GET", &payment_uri, Some(Uuid::new_v4()), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(request(
            "POST",
            "/v1/payments",
            Some(Uuid::new_v4()),
            Some(json!({
                "booking_id": created["id"],
                "amount": 80.0,
                "payment_method": "paypal",
                "payment_details": {}
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
