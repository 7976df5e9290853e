//! Interfaces to the outside world.
//!
//! The engine never talks to a payment processor, a VTU provider or a chat platform directly. It is handed
//! implementations of these traits instead. The server crate provides HTTP clients; tests provide mocks.
use serde::{Deserialize, Serialize};
use thiserror::Error;
use wally_common::Kobo;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedPayment {
    /// True if the payment processor reports the charge as successful.
    pub success: bool,
    pub amount: Kobo,
    pub provider_transaction_id: Option<String>,
    /// Free-text status message from the processor, e.g. "Approved" or "Declined".
    pub message: Option<String>,
}

#[allow(async_fn_in_trait)]
pub trait PaymentVerifier {
    /// Asks the payment processor for the current state of the charge identified by `reference`.
    async fn verify(&self, reference: &str) -> Result<VerifiedPayment, ProviderError>;

    /// Validates the signature the processor attached to a webhook body.
    fn check_signature(&self, payload: &[u8], signature: &str) -> bool;
}

#[allow(async_fn_in_trait)]
pub trait CheckoutProvider {
    /// Opens a hosted checkout for `amount` and returns the URL the user must visit to pay.
    async fn initialize(&self, reference: &str, email: &str, amount: Kobo) -> Result<String, ProviderError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentKind {
    Airtime,
    Data,
    AirtimeSharing,
    Bill,
    Transfer,
}

/// A purchase to be executed by a third-party provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FulfillmentOp {
    pub kind: FulfillmentKind,
    /// Network or biller, e.g. "mtn", "glo", "ikeja-electric".
    pub network: String,
    /// Phone number, meter number or account number of the beneficiary.
    pub phone: String,
    pub amount: Kobo,
    /// Data plan code, for `Data` purchases.
    #[serde(default)]
    pub plan: Option<String>,
    #[serde(default)]
    pub recipient_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FulfillmentReceipt {
    pub transaction_id: String,
}

#[allow(async_fn_in_trait)]
pub trait Fulfillment {
    async fn execute(&self, op: &FulfillmentOp) -> Result<FulfillmentReceipt, ProviderError>;
}

/// A button attached to an outbound chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub label: String,
    pub action: String,
}

impl NotificationAction {
    pub fn new<S: Into<String>>(label: S, action: S) -> Self {
        Self { label: label.into(), action: action.into() }
    }
}

/// Outbound chat messages. Delivery is fire-and-forget: callers log failures and move on.
#[allow(async_fn_in_trait)]
pub trait Notifier {
    async fn send(&self, chat_id: &str, text: &str, actions: &[NotificationAction]) -> Result<(), ProviderError>;
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Could not reach the provider: {0}")]
    Unreachable(String),
    #[error("The provider rejected the request: {0}")]
    Rejected(String),
    /// The charge exists but has not reached a final state (the user has not paid yet, or the bank is still
    /// processing it).
    #[error("The payment has not been completed yet: {0}")]
    Incomplete(String),
    #[error("The provider sent a response we could not understand: {0}")]
    InvalidResponse(String),
    #[error("The provider is not configured: {0}")]
    NotConfigured(String),
}
