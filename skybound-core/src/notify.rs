use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EmailTemplate {
    BookingConfirmation,
    BookingUpdate,
}

impl EmailTemplate {
    pub fn name(&self) -> &'static str {
        match self {
            EmailTemplate::BookingConfirmation => "booking_confirmation",
            EmailTemplate::BookingUpdate => "booking_update",
        }
    }

    /// Subject line; `context["booking"]["booking_reference"]` and
    /// `context["update_type"]` are used when present.
    pub fn subject(&self, context: &Value) -> String {
        let reference = context["booking"]["booking_reference"].as_str().unwrap_or_default();
        match self {
            EmailTemplate::BookingConfirmation => format!("Booking Confirmation - {}", reference),
            EmailTemplate::BookingUpdate => {
                let update = context["update_type"].as_str().unwrap_or("modified");
                let mut chars = update.chars();
                let title = match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                };
                format!("Booking {} - {}", title, reference)
            }
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send one email. Returns whether delivery was accepted; implementations
    /// never return an error to the caller.
    async fn send(&self, to: &str, template: EmailTemplate, context: &Value) -> bool;
}

/// Notifier used when no mail server is configured: logs and reports success.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, to: &str, template: EmailTemplate, context: &Value) -> bool {
        tracing::info!(
            "Mail server not configured, skipping {} email to {}: {}",
            template.name(),
            to,
            template.subject(context)
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_subjects() {
        let context = json!({
            "booking": { "booking_reference": "SBJ-1A2B3C" },
            "update_type": "cancelled"
        });
        assert_eq!(
            EmailTemplate::BookingConfirmation.subject(&context),
            "Booking Confirmation - SBJ-1A2B3C"
        );
        assert_eq!(
            EmailTemplate::BookingUpdate.subject(&context),
            "Booking Cancelled - SBJ-1A2B3C"
        );
    }

    #[tokio::test]
    async fn test_log_notifier_accepts() {
        let sent = LogNotifier
            .send("traveller@example.com", EmailTemplate::BookingConfirmation, &json!({}))
            .await;
        assert!(sent);
    }
}
