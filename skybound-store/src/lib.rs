pub mod app_config;
pub mod database;
pub mod booking_repo;
pub mod memory_repo;
pub mod mailer;

pub use booking_repo::PgBookingStore;
pub use database::DbClient;
pub use mailer::SmtpNotifier;
pub use memory_repo::{FailPoint, InMemoryBookingStore};
