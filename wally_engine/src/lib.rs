//! Wally wallet engine
//!
//! Wally is a wallet that users drive from a chat app. They fund it through a hosted card checkout, spend it on
//! airtime, data and bills, and get nudged when their balance runs low. This library is the money-handling core of
//! that product. It knows nothing about chat platforms or HTTP.
//!
//! The library is divided into these sections:
//! 1. Storage ([`mod@traits`] and, with the `sqlite` feature, [`SqliteDatabase`]). Every balance change goes through
//!    the ledger, which keeps an append-only log of entries next to a single authoritative balance per wallet.
//! 2. The public API ([`mod@wally_api`]): ledger queries, settlement of card payments, the purchase debit flow and the
//!    reminder scans, and the user's saved beneficiaries.
//! 3. The [`mod@conversation`] guard, which keeps multi-step chat dialogs from interleaving.
//!
//! The engine also emits events that can be subscribed to, such as [`events::WalletCreditedEvent`] whenever a
//! settlement credits a wallet.
pub mod conversation;
pub mod db_types;
pub mod events;
pub mod helpers;
pub mod traits;
pub mod wally_api;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use sqlite::{db as sqlite_db, SqliteDatabase};
pub use traits::{
    BeneficiaryError,
    BeneficiaryManagement,
    LedgerError,
    LedgerManagement,
    ReminderError,
    ReminderManagement,
    SettlementDatabase,
};
pub use wally_api::{
    beneficiary_api::BeneficiaryApi,
    errors::{PurchaseError, SettlementError},
    ledger_api::LedgerApi,
    ledger_objects,
    purchase_api::PurchaseApi,
    purchase_objects,
    reminder_api::{ReminderApi, ScanReport},
    settlement_api::SettlementApi,
    settlement_objects,
};
