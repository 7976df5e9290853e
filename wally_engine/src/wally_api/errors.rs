use thiserror::Error;
use wally_common::Kobo;

use crate::traits::{LedgerError, ProviderError};

#[derive(Debug, Clone, Error)]
pub enum SettlementError {
    #[error("No payment intent exists for reference {0}")]
    UnknownReference(String),
    #[error("The webhook signature is invalid")]
    SignatureInvalid,
    #[error("The webhook payload could not be read: {0}")]
    MalformedWebhook(String),
    #[error("The minimum funding amount is {minimum}. {requested} was requested")]
    AmountTooSmall { minimum: Kobo, requested: Kobo },
    #[error("User {0} does not exist")]
    UserNotFound(i64),
    #[error("Payment verification failed. {0}")]
    Verification(ProviderError),
    #[error("Could not open a checkout session. {0}")]
    Checkout(ProviderError),
    #[error("{0}")]
    Ledger(#[from] LedgerError),
}

#[derive(Debug, Clone, Error)]
pub enum PurchaseError {
    #[error("Insufficient funds. The balance is {balance}, but {requested} was requested")]
    InsufficientFunds { balance: Kobo, requested: Kobo },
    #[error("Purchase amounts must be positive. {0} is not allowed")]
    InvalidAmount(Kobo),
    #[error("The provider could not complete the purchase. {0}")]
    FulfillmentFailed(ProviderError),
    /// The provider delivered, but the wallet could not be debited. An operator must settle this by hand.
    #[error("Purchase {provider_transaction_id} was delivered but not charged: {reason}")]
    ReconciliationAlert { alert_id: Option<i64>, provider_transaction_id: String, reason: String },
    #[error("{0}")]
    Ledger(#[from] LedgerError),
}
