use skybound_core::{BookingDetail, BookingStore, EmailTemplate, Notifier};
use tracing::{info, warn};
use uuid::Uuid;

/// Email the booking's owner at their profile address. Never fails the caller.
pub(crate) async fn notify_owner(
    store: &dyn BookingStore,
    notifier: &dyn Notifier,
    user_id: Uuid,
    template: EmailTemplate,
    detail: &BookingDetail,
    update_type: Option<&str>,
) {
    let email = match store.find_user_email(user_id).await {
        Ok(Some(email)) => email,
        Ok(None) => {
            info!("No email on file for user {}, skipping {}", user_id, template.name());
            return;
        }
        Err(e) => {
            warn!("Could not look up email for user {}: {}", user_id, e);
            return;
        }
    };

    let booking = match serde_json::to_value(detail) {
        Ok(value) => value,
        Err(e) => {
            warn!("Could not serialize booking {} for email: {}", detail.booking.id, e);
            return;
        }
    };

    let mut context = serde_json::json!({ "booking": booking });
    if let Some(update_type) = update_type {
        context["update_type"] = serde_json::Value::from(update_type);
    }

    if !notifier.send(&email, template, &context).await {
        warn!(
            "Failed to send {} email for booking {}",
            template.name(),
            detail.booking.booking_reference
        );
    }
}
