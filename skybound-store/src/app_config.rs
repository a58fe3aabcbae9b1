use serde::Deserialize;
use skybound_core::BookingPolicy;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub mail: MailConfig,
    #[serde(default)]
    pub booking: BookingPolicy,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Run pending migrations on startup.
    #[serde(default)]
    pub migrate: bool,
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// HS256 secret shared with the identity provider.
    pub jwt_secret: String,
    /// Expected `aud` claim; audience is not checked when unset.
    pub audience: Option<String>,
}

/// SMTP settings. Without a host, notifications are only logged.
#[derive(Debug, Deserialize, Clone)]
pub struct MailConfig {
    pub host: Option<String>,
    #[serde(default = "default_mail_port")]
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(default = "default_mail_from")]
    pub from_email: String,
    #[serde(default = "default_mail_from_name")]
    pub from_name: String,
    #[serde(default = "default_true")]
    pub starttls: bool,
}

fn default_mail_port() -> u16 {
    587
}

fn default_mail_from() -> String {
    "noreply@skyboundjourneys.com".to_string()
}

fn default_mail_from_name() -> String {
    "SkyBound Journeys".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: default_mail_port(),
            username: None,
            password: None,
            from_email: default_mail_from(),
            from_name: default_mail_from_name(),
            starttls: true,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Add in the current environment file
            // Note that this file is _optional_
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add in a local configuration file
            // This file shouldn't be checked in to git
            .add_source(config::File::with_name("config/local").required(false))
            // Eg.. `SKYBOUND_BOOKING__INVENTORY_GUARD=legacy` sets `booking.inventory_guard`
            .add_source(config::Environment::with_prefix("SKYBOUND").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
