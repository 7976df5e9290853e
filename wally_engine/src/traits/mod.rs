//! # Backend and collaborator contracts
//!
//! This module defines the behaviour that the wallet APIs need from the outside world.
//!
//! ## Storage backends
//! * [`LedgerManagement`] owns users, wallets and the append-only transaction log. It is the only place a balance
//!   ever changes.
//! * [`SettlementDatabase`] stores payment intents and performs the atomic `pending -> completed` transition together
//!   with the wallet credit.
//! * [`ReminderManagement`] persists reminder settings and cooldown state for the scheduler.
//! * [`BeneficiaryManagement`] keeps each user's saved contacts.
//!
//! ## Collaborators
//! [`PaymentVerifier`], [`CheckoutProvider`], [`Fulfillment`] and [`Notifier`] are implemented by HTTP clients in the
//! server crate and by mocks in tests.
mod beneficiary_management;
mod collaborators;
mod ledger_management;
mod reminder_management;
mod settlement_database;

pub use beneficiary_management::{BeneficiaryError, BeneficiaryManagement};
pub use collaborators::{
    CheckoutProvider,
    Fulfillment,
    FulfillmentKind,
    FulfillmentOp,
    FulfillmentReceipt,
    NotificationAction,
    Notifier,
    PaymentVerifier,
    ProviderError,
    VerifiedPayment,
};
pub use ledger_management::{LedgerError, LedgerManagement};
pub use reminder_management::{ReminderError, ReminderManagement};
pub use settlement_database::SettlementDatabase;
