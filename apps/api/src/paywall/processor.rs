use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use super::CardDetails;

/// Card number the simulated processor always declines, for exercising the failure path.
pub const DECLINED_TEST_CARD: &str = "4000000000000002";

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("The card was declined: {0}")]
    Declined(String),
}

#[derive(Debug, Clone)]
pub struct ChargeRequest {
    pub session_id: Uuid,
    pub order_number: Option<String>,
    pub amount: u32,
    pub currency: &'static str,
    pub card: CardDetails,
}

#[derive(Debug, Clone)]
pub struct ChargeHandle {
    pub charge_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct ChargeReceipt {
    pub charge_id: Uuid,
    pub settled_at: DateTime<Utc>,
}

/// Seam for a real payment provider. A charge is authorized first, then settled.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    async fn initiate_charge(&self, request: &ChargeRequest) -> Result<ChargeHandle, PaymentError>;
    async fn confirm_charge(&self, charge: &ChargeHandle) -> Result<ChargeReceipt, PaymentError>;
}

/// Stands in for a provider: waits out fixed delays and approves every card
/// except `DECLINED_TEST_CARD`.
pub struct SimulatedProcessor {
    processing_delay: Duration,
    success_delay: Duration,
}

impl SimulatedProcessor {
    pub fn new(processing_delay: Duration, success_delay: Duration) -> Self {
        Self {
            processing_delay,
            success_delay,
        }
    }
}

#[async_trait]
impl PaymentProcessor for SimulatedProcessor {
    async fn initiate_charge(&self, request: &ChargeRequest) -> Result<ChargeHandle, PaymentError> {
        tokio::time::sleep(self.processing_delay).await;
        if request.card.digits() == DECLINED_TEST_CARD {
            return Err(PaymentError::Declined("insufficient funds".to_string()));
        }
        let handle = ChargeHandle {
            charge_id: Uuid::new_v4(),
        };
        info!(
            "Authorized {} {} for session {} order {} (charge {})",
            request.amount,
            request.currency,
            request.session_id,
            request.order_number.as_deref().unwrap_or("-"),
            handle.charge_id
        );
        Ok(handle)
    }

    async fn confirm_charge(&self, charge: &ChargeHandle) -> Result<ChargeReceipt, PaymentError> {
        tokio::time::sleep(self.success_delay).await;
        Ok(ChargeReceipt {
            charge_id: charge.charge_id,
            settled_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(card_number: &str) -> ChargeRequest {
        ChargeRequest {
            session_id: Uuid::new_v4(),
            order_number: Some("ORD-000001AA".into()),
            amount: 39,
            currency: "SAR",
            card: CardDetails {
                card_number: card_number.into(),
                expiry: "12/30".into(),
                cvv: "123".into(),
                name: "Jane Doe".into(),
            },
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_charge_settles_after_delays() {
        let processor =
            SimulatedProcessor::new(Duration::from_millis(2500), Duration::from_millis(2000));
        let started = tokio::time::Instant::now();

        let handle = processor
            .initiate_charge(&request("4242 4242 4242 4242"))
            .await
            .unwrap();
        let receipt = processor.confirm_charge(&handle).await.unwrap();

        assert_eq!(receipt.charge_id, handle.charge_id);
        assert!(started.elapsed() >= Duration::from_millis(4500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_decline() {
        let processor = SimulatedProcessor::new(Duration::ZERO, Duration::ZERO);
        let result = processor
            .initiate_charge(&request("4000 0000 0000 0002"))
            .await;
        assert!(matches!(result, Err(PaymentError::Declined(_))));
    }
}
