use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox, Message},
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
    AsyncSmtpTransport, AsyncTransport, Tokio1Executor,
};
use serde_json::Value;
use skybound_core::{EmailTemplate, Notifier};
use tracing::{error, info};

use crate::app_config::MailConfig;

/// Notifier delivering plain-text booking emails over SMTP.
pub struct SmtpNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpNotifier {
    /// Build the transport from config. Returns `Ok(None)` when no SMTP host is set.
    pub fn from_config(config: &MailConfig) -> Result<Option<Self>, lettre::transport::smtp::Error> {
        let Some(host) = config.host.as_deref() else {
            return Ok(None);
        };

        let mut builder = if config.starttls {
            info!("Using STARTTLS for SMTP {}:{}", host, config.port);
            let tls = TlsParameters::new(host.to_string())?;
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)?.tls(Tls::Required(tls))
        } else {
            info!("Using plain SMTP for {}:{}", host, config.port);
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host).tls(Tls::None)
        };
        builder = builder.port(config.port);

        if let (Some(user), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
        }

        let from = match config.from_email.parse() {
            Ok(address) => Mailbox::new(Some(config.from_name.clone()), address),
            Err(e) => {
                error!("Invalid from address {}: {}", config.from_email, e);
                return Ok(None);
            }
        };

        Ok(Some(Self {
            mailer: builder.build(),
            from,
        }))
    }
}

/// Plain-text body for a booking email.
pub fn render_body(template: EmailTemplate, context: &Value) -> String {
    let booking = &context["booking"];
    let reference = booking["booking_reference"].as_str().unwrap_or_default();

    let mut body = match template {
        EmailTemplate::BookingConfirmation => {
            format!("Your booking {} is confirmed.\n\n", reference)
        }
        EmailTemplate::BookingUpdate => format!(
            "Your booking {} has been {}.\n\n",
            reference,
            context["update_type"].as_str().unwrap_or("modified")
        ),
    };

    if let Some(flights) = booking["flights"].as_array() {
        body.push_str("Flights:\n");
        for leg in flights {
            let role = if leg["is_return_flight"].as_bool().unwrap_or(false) {
                "Return"
            } else {
                "Outbound"
            };
            let flight = &leg["flight"];
            body.push_str(&format!(
                "  {}: {} {} -> {}, departs {}\n",
                role,
                flight["flight_number"].as_str().unwrap_or("?"),
                flight["origin_airport"]["iata_code"].as_str().unwrap_or("?"),
                flight["destination_airport"]["iata_code"].as_str().unwrap_or("?"),
                flight["departure_time"].as_str().unwrap_or("?"),
            ));
        }
    }

    if let Some(passengers) = booking["passengers"].as_array() {
        body.push_str("\nPassengers:\n");
        for p in passengers {
            body.push_str(&format!(
                "  {} {} ({}, {})\n",
                p["first_name"].as_str().unwrap_or_default(),
                p["last_name"].as_str().unwrap_or_default(),
                p["type"].as_str().unwrap_or_default(),
                p["cabin_class"].as_str().unwrap_or_default(),
            ));
        }
    }

    if let Some(total) = booking["total_amount"].as_f64() {
        body.push_str(&format!("\nTotal: {:.2}\n", total));
    }

    body.push_str("\nThank you for flying with SkyBound Journeys.\n");
    body
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, to: &str, template: EmailTemplate, context: &Value) -> bool {
        let recipient: Mailbox = match to.parse() {
            Ok(mailbox) => mailbox,
            Err(e) => {
                error!("Invalid recipient address {}: {}", to, e);
                return false;
            }
        };

        let email = match Message::builder()
            .from(self.from.clone())
            .to(recipient)
            .subject(template.subject(context))
            .header(ContentType::TEXT_PLAIN)
            .body(render_body(template, context))
        {
            Ok(email) => email,
            Err(e) => {
                error!("Failed to build {} email: {}", template.name(), e);
                return false;
            }
        };

        match self.mailer.send(email).await {
            Ok(_) => {
                info!("Email {} sent successfully to {}", template.name(), to);
                true
            }
            Err(e) => {
                error!("Failed to send {} email to {}: {}", template.name(), to, e);
                false
            }
        }
    }
}
