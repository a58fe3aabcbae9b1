use serde::{Deserialize, Serialize};
use serde_json::Value;
use skybound_core::{
    mask_payment_details, BookingStatus, BookingStore, NewPayment, Payment, PaymentMethod,
    PaymentStatus,
};
use skybound_shared::Masked;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::BookingError;

fn default_currency() -> String {
    "USD".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentRequest {
    pub booking_id: Uuid,
    pub amount: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub payment_method: PaymentMethod,
    /// Card or account data as sent by the client. Never logged.
    pub payment_details: Masked<Value>,
}

/// Records payments against a caller's own bookings.
///
/// There is no payment gateway behind this: a payment is recorded as
/// completed straight away and a pending booking becomes confirmed.
pub struct PaymentProcessor {
    store: Arc<dyn BookingStore>,
}

impl PaymentProcessor {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }

    pub async fn process_payment(
        &self,
        user_id: Uuid,
        request: PaymentRequest,
    ) -> Result<Payment, BookingError> {
        let booking = self
            .store
            .find_booking(request.booking_id, Some(user_id))
            .await
            .map_err(|e| BookingError::Server(format!("Failed to process payment: {}", e)))?
            .ok_or(BookingError::NotFound(request.booking_id))?;

        if booking.status == BookingStatus::Cancelled {
            return Err(BookingError::Rejected(
                "Cannot pay for a cancelled booking.".to_string(),
            ));
        }
        if request.amount.is_nan() || request.amount <= 0.0 {
            return Err(BookingError::Rejected(
                "Payment amount must be greater than zero".to_string(),
            ));
        }

        let mut details = request.payment_details.into_inner();
        mask_payment_details(&mut details);

        let payment = self
            .store
            .insert_payment(&NewPayment {
                booking_id: booking.id,
                amount: request.amount,
                currency: request.currency,
                status: PaymentStatus::Completed,
                payment_method: request.payment_method,
                payment_details: Some(details),
            })
            .await
            .map_err(|e| BookingError::Server(format!("Failed to process payment: {}", e)))?;

        info!(
            "Payment {} of {:.2} {} recorded for booking {}",
            payment.id, payment.amount, payment.currency, booking.booking_reference
        );

        if booking.status == BookingStatus::Pending {
            match self
                .store
                .transition_booking_status(
                    booking.id,
                    user_id,
                    &[BookingStatus::Pending],
                    BookingStatus::Confirmed,
                )
                .await
            {
                Ok(Some(_)) => info!("Booking {} confirmed by payment", booking.booking_reference),
                Ok(None) => warn!(
                    "Booking {} left pending after payment {}: status changed meanwhile",
                    booking.booking_reference, payment.id
                ),
                Err(e) => warn!(
                    "Could not confirm booking {} after payment {}: {}",
                    booking.booking_reference, payment.id, e
                ),
            }
        }

        Ok(payment)
    }

    pub async fn get_payment(&self, payment_id: Uuid, user_id: Uuid) -> Result<Payment, BookingError> {
        self.store
            .find_payment(payment_id, user_id)
            .await
            .map_err(|e| BookingError::Server(format!("Failed to retrieve payment: {}", e)))?
            .ok_or(BookingError::PaymentNotFound(payment_id))
    }
}
