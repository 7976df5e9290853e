use chrono::{DateTime, Utc};
use thiserror::Error;
use wally_common::Kobo;

use crate::db_types::{
    DebitActivity,
    LedgerEntry,
    NewLedgerEntry,
    NewReconciliationAlert,
    NewUser,
    ReconciliationAlert,
    User,
    Wallet,
};

/// The ledger is the only component allowed to move money. Every backend implementing this trait must guarantee
/// that a balance change and its log row are committed together, and that a debit never takes a wallet below zero.
#[allow(async_fn_in_trait)]
pub trait LedgerManagement: Clone {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Creates the user, a zero-balance wallet and the default reminders in a single atomic transaction.
    async fn create_user(&self, user: NewUser) -> Result<User, LedgerError>;

    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, LedgerError>;

    async fn fetch_user_by_chat_id(&self, chat_id: &str) -> Result<Option<User>, LedgerError>;

    async fn fetch_wallet(&self, user_id: i64) -> Result<Option<Wallet>, LedgerError>;

    /// Adds `entry.amount` to the user's wallet and appends a `credit` row. If the entry carries a reference that has
    /// already been used, the whole operation fails with [`LedgerError::DuplicateReference`] and nothing changes.
    async fn credit(&self, entry: NewLedgerEntry) -> Result<LedgerEntry, LedgerError>;

    /// Removes `entry.amount` from the user's wallet and appends a `debit` row. Fails with
    /// [`LedgerError::InsufficientFunds`] if the balance at commit time is smaller than the amount.
    async fn debit(&self, entry: NewLedgerEntry) -> Result<LedgerEntry, LedgerError>;

    /// The most recent `limit` entries for the user, newest first.
    async fn fetch_history(&self, user_id: i64, limit: u32) -> Result<Vec<LedgerEntry>, LedgerError>;

    async fn fetch_entry_by_reference(&self, reference: &str) -> Result<Option<LedgerEntry>, LedgerError>;

    /// All successful debits for the user created at or after `since`, oldest first.
    async fn fetch_debits_since(&self, user_id: i64, since: DateTime<Utc>) -> Result<Vec<LedgerEntry>, LedgerError>;

    /// Count and total of successful debits created at or after `since`.
    async fn debit_activity_since(&self, user_id: i64, since: DateTime<Utc>) -> Result<DebitActivity, LedgerError>;

    async fn insert_reconciliation_alert(
        &self,
        alert: NewReconciliationAlert,
    ) -> Result<ReconciliationAlert, LedgerError>;

    async fn fetch_open_reconciliation_alerts(&self) -> Result<Vec<ReconciliationAlert>, LedgerError>;

    /// Marks the alert as resolved. Resolving an already resolved alert is a no-op that returns the alert.
    async fn resolve_reconciliation_alert(&self, id: i64) -> Result<ReconciliationAlert, LedgerError>;
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
    #[error("Insufficient funds. The balance is {balance}, but {requested} was requested")]
    InsufficientFunds { balance: Kobo, requested: Kobo },
    #[error("Amounts must be positive. {0} is not allowed")]
    InvalidAmount(Kobo),
    #[error("The requested user id {0} does not exist")]
    UserNotFound(i64),
    #[error("There is no wallet for user id {0}")]
    WalletNotFound(i64),
    #[error("A user with chat id {0} already exists")]
    UserAlreadyExists(String),
    #[error("A ledger entry with reference {0} already exists")]
    DuplicateReference(String),
    #[error("Reconciliation alert #{0} does not exist")]
    AlertNotFound(i64),
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        LedgerError::DatabaseError(e.to_string())
    }
}
