//! Paywall Gate — per-document unlock state and the payment flow that flips it.
//!
//! Unlock is monotonic: nothing in this module (or anywhere else) ever moves
//! a document or a stored record from paid back to locked.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::pipeline::session::{PaymentStart, SessionView};
use crate::pipeline::sessions::SessionHandle;
use crate::store::RecordStore;

pub mod handlers;
pub mod processor;

pub use processor::{ChargeRequest, PaymentProcessor, SimulatedProcessor};

/// Price of unlocking one optimized document, in `CURRENCY`.
pub const PRICE: u32 = 39;
pub const CURRENCY: &str = "SAR";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStep {
    #[default]
    Details,
    Processing,
    Success,
}

/// Whether new documents start locked.
#[derive(Debug, Clone, Copy)]
pub struct PaywallPolicy {
    pub enabled: bool,
}

impl PaywallPolicy {
    pub fn is_unlocked(self, is_paid: bool) -> bool {
        is_paid || !self.enabled
    }

    /// Paid flag for a freshly created record.
    pub fn initial_paid(self) -> bool {
        !self.enabled
    }
}

#[derive(Clone, Deserialize)]
pub struct CardDetails {
    pub card_number: String,
    pub expiry: String,
    pub cvv: String,
    pub name: String,
}

impl CardDetails {
    /// All four fields must be filled in; nothing beyond that is checked.
    pub fn validate(&self) -> Result<(), AppError> {
        let fields = [
            ("card_number", &self.card_number),
            ("expiry", &self.expiry),
            ("cvv", &self.cvv),
            ("name", &self.name),
        ];
        for (field, value) in fields {
            if value.trim().is_empty() {
                return Err(AppError::Validation(format!("{field} is required")));
            }
        }
        Ok(())
    }

    pub fn digits(&self) -> String {
        self.card_number.chars().filter(char::is_ascii_digit).collect()
    }
}

// Card data never reaches the logs.
impl fmt::Debug for CardDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.digits();
        let last4 = &digits[digits.len().saturating_sub(4)..];
        f.debug_struct("CardDetails")
            .field("card_number", &format!("****{last4}"))
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Runs a charge for the session's document and unlocks it on success.
///
/// The session lock is released while the processor and the store are awaited.
/// The pending charge keeps the session busy until it settles or fails, so the
/// document it was started for is the one that gets unlocked and marked paid.
pub async fn confirm_payment(
    processor: &dyn PaymentProcessor,
    store: &dyn RecordStore,
    handle: &SessionHandle,
    card: CardDetails,
) -> Result<SessionView, AppError> {
    card.validate()?;

    let (ticket, record_id, request) = {
        let mut session = handle.lock().await;
        match session.begin_payment()? {
            PaymentStart::AlreadyUnlocked => return Ok(session.view()),
            PaymentStart::Started {
                ticket,
                record_id,
                order_number,
            } => (
                ticket,
                record_id,
                ChargeRequest {
                    session_id: session.id(),
                    order_number,
                    amount: PRICE,
                    currency: CURRENCY,
                    card,
                },
            ),
        }
    };

    let charge = match processor.initiate_charge(&request).await {
        Ok(charge) => charge,
        Err(e) => {
            warn!("Charge for session {} failed: {e}", request.session_id);
            handle.lock().await.payment_failed(ticket);
            return Err(AppError::Payment(e.to_string()));
        }
    };

    let receipt = match processor.confirm_charge(&charge).await {
        Ok(receipt) => receipt,
        Err(e) => {
            warn!("Settlement for session {} failed: {e}", request.session_id);
            handle.lock().await.payment_failed(ticket);
            return Err(AppError::Payment(e.to_string()));
        }
    };

    let view = {
        let mut session = handle.lock().await;
        if let Err(e) = session.payment_settled(ticket) {
            warn!("Session {} changed before settlement: {e}", request.session_id);
        }
        session.view()
    };
    info!(
        "Session {} unlocked (charge {} settled at {})",
        request.session_id, receipt.charge_id, receipt.settled_at
    );

    if let Some(id) = record_id {
        if let Err(e) = store.mark_paid(id).await {
            warn!("Could not persist paid flag for {id}: {e}");
        }
    }
    Ok(view)
}
