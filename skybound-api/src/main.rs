use anyhow::Context;
use skybound_api::{app, AppState, AuthConfig};
use skybound_booking::BookingService;
use skybound_core::{LogNotifier, Notifier};
use skybound_store::{app_config::Config, DbClient, PgBookingStore, SmtpNotifier};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "skybound_api=debug,skybound_booking=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting SkyBound API on port {}", config.server.port);

    // Database
    let db = DbClient::new(&config.database)
        .await
        .context("Failed to connect to Postgres")?;
    if config.database.migrate {
        db.migrate().await.context("Failed to run migrations")?;
    }
    let store = Arc::new(PgBookingStore::new(db.pool.clone()));

    // Mail
    let notifier: Arc<dyn Notifier> = match SmtpNotifier::from_config(&config.mail)
        .context("Failed to configure SMTP transport")?
    {
        Some(smtp) => Arc::new(smtp),
        None => {
            tracing::warn!("No mail server configured, booking emails will only be logged");
            Arc::new(LogNotifier)
        }
    };

    tracing::info!("Inventory guard: {:?}", config.booking.inventory_guard);
    let bookings = BookingService::new(store, notifier, config.booking.clone());

    let app_state = AppState {
        bookings: Arc::new(bookings),
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            audience: config.auth.audience.clone(),
        },
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
