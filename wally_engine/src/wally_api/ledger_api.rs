use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use serde_json::Value;
use wally_common::Kobo;

use crate::{
    db_types::{Category, LedgerEntry, NewLedgerEntry, NewUser, User, Wallet},
    traits::{LedgerError, LedgerManagement},
    wally_api::ledger_objects::{SpendingPeriod, SpendingSummary},
};

/// `LedgerApi` is the front door to users, wallets and the transaction log.
///
/// Every balance change in the system ends up in [`LedgerApi::credit`] or [`LedgerApi::debit`] (or the equivalent
/// backend call made by settlement), so the wallet balance always equals the sum of its log rows.
pub struct LedgerApi<B> {
    db: B,
}

impl<B: Debug> Debug for LedgerApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LedgerApi ({:?})", self.db)
    }
}

impl<B> LedgerApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> LedgerApi<B>
where B: LedgerManagement
{
    /// Registers a new user. The wallet and the default reminders are created in the same transaction.
    pub async fn create_user(&self, user: NewUser) -> Result<User, LedgerError> {
        let user = self.db.create_user(user).await?;
        info!("💰️ New user #{} registered for chat {}", user.id, user.chat_id);
        Ok(user)
    }

    pub async fn user_by_chat_id(&self, chat_id: &str) -> Result<Option<User>, LedgerError> {
        self.db.fetch_user_by_chat_id(chat_id).await
    }

    pub async fn user_by_id(&self, user_id: i64) -> Result<Option<User>, LedgerError> {
        self.db.fetch_user(user_id).await
    }

    pub async fn get_wallet(&self, user_id: i64) -> Result<Wallet, LedgerError> {
        self.db.fetch_wallet(user_id).await?.ok_or(LedgerError::WalletNotFound(user_id))
    }

    pub async fn get_balance(&self, user_id: i64) -> Result<Kobo, LedgerError> {
        self.get_wallet(user_id).await.map(|w| w.balance)
    }

    pub async fn credit(
        &self,
        user_id: i64,
        amount: Kobo,
        category: Category,
        description: &str,
        metadata: Value,
    ) -> Result<LedgerEntry, LedgerError> {
        let entry = NewLedgerEntry::new(user_id, amount, category, description).with_metadata(metadata);
        let entry = self.db.credit(entry).await?;
        debug!("💰️ User #{user_id} credited {amount} for {category}. Balance is now {}", entry.balance_after);
        Ok(entry)
    }

    pub async fn debit(
        &self,
        user_id: i64,
        amount: Kobo,
        category: Category,
        description: &str,
        metadata: Value,
    ) -> Result<LedgerEntry, LedgerError> {
        let entry = NewLedgerEntry::new(user_id, amount, category, description).with_metadata(metadata);
        match self.db.debit(entry).await {
            Ok(entry) => {
                debug!("💰️ User #{user_id} debited {amount} for {category}. Balance is now {}", entry.balance_after);
                Ok(entry)
            },
            Err(e @ LedgerError::InsufficientFunds { .. }) => {
                info!("💰️ Debit of {amount} for user #{user_id} refused. {e}");
                Err(e)
            },
            Err(e) => Err(e),
        }
    }

    /// The most recent `limit` ledger entries, newest first.
    pub async fn get_history(&self, user_id: i64, limit: u32) -> Result<Vec<LedgerEntry>, LedgerError> {
        self.db.fetch_history(user_id, limit).await
    }

    pub async fn entry_by_reference(&self, reference: &str) -> Result<Option<LedgerEntry>, LedgerError> {
        self.db.fetch_entry_by_reference(reference).await
    }

    pub async fn spending_summary(
        &self,
        user_id: i64,
        period: SpendingPeriod,
        now: DateTime<Utc>,
    ) -> Result<SpendingSummary, LedgerError> {
        let since = now - period.duration();
        let debits = self.db.fetch_debits_since(user_id, since).await?;
        trace!("💰️ {} debits for user #{user_id} since {since}", debits.len());
        Ok(SpendingSummary::from_debits(period, now, &debits))
    }
}
