use skybound_booking::BookingService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    /// Expected `aud` claim; not checked when unset.
    pub audience: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub bookings: Arc<BookingService>,
    pub auth: AuthConfig,
}
