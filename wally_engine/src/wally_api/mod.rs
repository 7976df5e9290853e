//! # Wally wallet engine public API
//!
//! The `wally_api` module exposes the programmatic API of the wallet core. The API is split by concern, so a caller
//! only needs to supply the backend and collaborators that the part it uses actually requires.
//!
//! * [`ledger_api`] covers users, wallets, balances, transaction history and spending summaries.
//! * [`settlement_api`] opens funding requests and settles them, from the processor webhook or a manual verify.
//! * [`purchase_api`] runs the purchase debit flow and holds the operator's reconciliation queue.
//! * [`reminder_api`] runs the low-balance and milestone scans.
//! * [`beneficiary_api`] manages the contacts a user has saved for airtime sharing.
//!
//! # API usage
//!
//! ```rust,ignore
//! use wally_engine::{LedgerApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/wally.db", 5).await?;
//! let api = LedgerApi::new(db);
//! let balance = api.get_balance(user_id).await?;
//! ```
pub mod beneficiary_api;
pub mod errors;
pub mod ledger_api;
pub mod ledger_objects;
pub mod purchase_api;
pub mod purchase_objects;
pub mod reminder_api;
pub mod settlement_api;
pub mod settlement_objects;
