//! `SqliteDatabase` is a concrete implementation of a Wally wallet backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`traits`] module.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use sqlx::SqlitePool;
use wally_common::Kobo;

use super::db::{alerts, beneficiaries, db_url, intents, ledger, new_pool, reminders, users};
use crate::{
    db_types::{
        Beneficiary,
        BeneficiaryUpdate,
        DebitActivity,
        IntentStatus,
        LedgerEntry,
        LowBalanceCandidate,
        MilestoneCandidate,
        MilestoneCursors,
        NewBeneficiary,
        NewLedgerEntry,
        NewPaymentIntent,
        NewReconciliationAlert,
        NewUser,
        PaymentIntent,
        ReconciliationAlert,
        Reminder,
        ReminderType,
        User,
        Wallet,
    },
    traits::{
        BeneficiaryError,
        BeneficiaryManagement,
        LedgerError,
        LedgerManagement,
        ReminderError,
        ReminderManagement,
        SettlementDatabase,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl LedgerManagement for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn create_user(&self, user: NewUser) -> Result<User, LedgerError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let user = users::insert_user(user, now, &mut tx).await?;
        let wallet = users::insert_wallet(user.id, now, &mut tx).await?;
        reminders::insert_default_reminders(user.id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ User #{} ({}) created with wallet #{}", user.id, user.chat_id, wallet.id);
        Ok(user)
    }

    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        users::fetch_user(user_id, &mut conn).await
    }

    async fn fetch_user_by_chat_id(&self, chat_id: &str) -> Result<Option<User>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        users::fetch_user_by_chat_id(chat_id, &mut conn).await
    }

    async fn fetch_wallet(&self, user_id: i64) -> Result<Option<Wallet>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        users::fetch_wallet(user_id, &mut conn).await
    }

    async fn credit(&self, entry: NewLedgerEntry) -> Result<LedgerEntry, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let entry = ledger::credit(entry, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Credit {} [{}] applied to user #{}", entry.amount, entry.reference, entry.user_id);
        Ok(entry)
    }

    async fn debit(&self, entry: NewLedgerEntry) -> Result<LedgerEntry, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let entry = ledger::debit(entry, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Debit {} [{}] applied to user #{}", entry.amount, entry.reference, entry.user_id);
        Ok(entry)
    }

    async fn fetch_history(&self, user_id: i64, limit: u32) -> Result<Vec<LedgerEntry>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        ledger::fetch_history(user_id, limit, &mut conn).await
    }

    async fn fetch_entry_by_reference(&self, reference: &str) -> Result<Option<LedgerEntry>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        ledger::fetch_entry_by_reference(reference, &mut conn).await
    }

    async fn fetch_debits_since(&self, user_id: i64, since: DateTime<Utc>) -> Result<Vec<LedgerEntry>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        ledger::fetch_debits_since(user_id, since, &mut conn).await
    }

    async fn debit_activity_since(&self, user_id: i64, since: DateTime<Utc>) -> Result<DebitActivity, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        ledger::debit_activity_since(user_id, since, &mut conn).await
    }

    async fn insert_reconciliation_alert(
        &self,
        alert: NewReconciliationAlert,
    ) -> Result<ReconciliationAlert, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        alerts::insert_alert(alert, Utc::now(), &mut conn).await
    }

    async fn fetch_open_reconciliation_alerts(&self) -> Result<Vec<ReconciliationAlert>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        alerts::fetch_open_alerts(&mut conn).await
    }

    async fn resolve_reconciliation_alert(&self, id: i64) -> Result<ReconciliationAlert, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let alert = alerts::resolve_alert(id, Utc::now(), &mut tx).await?;
        tx.commit().await?;
        Ok(alert)
    }
}

impl SettlementDatabase for SqliteDatabase {
    async fn insert_payment_intent(&self, intent: NewPaymentIntent) -> Result<PaymentIntent, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let intent = intents::insert_intent(intent, Utc::now(), &mut conn).await?;
        debug!("🗃️ Payment intent [{}] for {} stored", intent.reference, intent.amount);
        Ok(intent)
    }

    async fn fetch_payment_intent(&self, reference: &str) -> Result<Option<PaymentIntent>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        intents::fetch_intent(reference, &mut conn).await
    }

    /// The status update is the first statement of the transaction, so concurrent callers queue on the SQLite write
    /// lock. The first one through flips the status and writes the credit. Everyone after it finds the intent is no
    /// longer `pending` and gets `None`.
    async fn complete_intent_with_credit(
        &self,
        reference: &str,
        credit: NewLedgerEntry,
    ) -> Result<Option<(PaymentIntent, LedgerEntry)>, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let intent =
            match intents::transition_from_pending(reference, IntentStatus::Completed, Utc::now(), &mut tx).await? {
                Some(intent) => intent,
                None => {
                    trace!("🗃️ Payment intent [{reference}] is not pending. Nothing to complete.");
                    return Ok(None);
                },
            };
        // Dropping `tx` on error rolls back the status change
        let entry = ledger::credit(credit, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Payment intent [{reference}] completed. Wallet of user #{} credited", entry.user_id);
        Ok(Some((intent, entry)))
    }

    async fn fail_intent(&self, reference: &str) -> Result<Option<PaymentIntent>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let intent = intents::transition_from_pending(reference, IntentStatus::Failed, Utc::now(), &mut conn).await?;
        if intent.is_some() {
            debug!("🗃️ Payment intent [{reference}] marked as failed");
        }
        Ok(intent)
    }
}

impl ReminderManagement for SqliteDatabase {
    async fn fetch_reminder(
        &self,
        user_id: i64,
        reminder_type: ReminderType,
    ) -> Result<Option<Reminder>, ReminderError> {
        let mut conn = self.pool.acquire().await?;
        reminders::fetch_reminder(user_id, reminder_type, &mut conn).await
    }

    async fn update_reminder_settings(
        &self,
        user_id: i64,
        reminder_type: ReminderType,
        threshold: Option<Kobo>,
        is_active: Option<bool>,
    ) -> Result<Reminder, ReminderError> {
        let mut conn = self.pool.acquire().await?;
        reminders::update_settings(user_id, reminder_type, threshold, is_active, &mut conn)
            .await?
            .ok_or(ReminderError::ReminderNotFound(user_id, reminder_type))
    }

    async fn fetch_low_balance_candidates(&self) -> Result<Vec<LowBalanceCandidate>, ReminderError> {
        let mut conn = self.pool.acquire().await?;
        reminders::fetch_low_balance_candidates(&mut conn).await
    }

    async fn claim_reminder(
        &self,
        reminder_id: i64,
        now: DateTime<Utc>,
        cutoff: DateTime<Utc>,
    ) -> Result<bool, ReminderError> {
        let mut conn = self.pool.acquire().await?;
        reminders::claim_reminder(reminder_id, now, cutoff, &mut conn).await
    }

    async fn fetch_milestone_candidates(&self) -> Result<Vec<MilestoneCandidate>, ReminderError> {
        let mut conn = self.pool.acquire().await?;
        reminders::fetch_milestone_candidates(&mut conn).await
    }

    async fn update_milestone_cursors(
        &self,
        reminder_id: i64,
        current: MilestoneCursors,
        next: MilestoneCursors,
        sent_at: Option<DateTime<Utc>>,
    ) -> Result<bool, ReminderError> {
        let mut conn = self.pool.acquire().await?;
        reminders::update_milestone_cursors(reminder_id, current, next, sent_at, &mut conn).await
    }
}

impl BeneficiaryManagement for SqliteDatabase {
    async fn insert_beneficiary(&self, beneficiary: NewBeneficiary) -> Result<Beneficiary, BeneficiaryError> {
        let mut conn = self.pool.acquire().await?;
        let beneficiary = beneficiaries::insert_beneficiary(beneficiary, Utc::now(), &mut conn).await?;
        debug!("🗃️ Beneficiary #{} saved for user #{}", beneficiary.id, beneficiary.user_id);
        Ok(beneficiary)
    }

    async fn fetch_beneficiaries(&self, user_id: i64) -> Result<Vec<Beneficiary>, BeneficiaryError> {
        let mut conn = self.pool.acquire().await?;
        beneficiaries::fetch_beneficiaries(user_id, &mut conn).await
    }

    async fn fetch_beneficiary_by_phone(
        &self,
        user_id: i64,
        phone_number: &str,
    ) -> Result<Option<Beneficiary>, BeneficiaryError> {
        let mut conn = self.pool.acquire().await?;
        beneficiaries::fetch_beneficiary_by_phone(user_id, phone_number, &mut conn).await
    }

    async fn update_beneficiary(
        &self,
        user_id: i64,
        id: i64,
        update: BeneficiaryUpdate,
    ) -> Result<Option<Beneficiary>, BeneficiaryError> {
        let mut conn = self.pool.acquire().await?;
        beneficiaries::update_beneficiary(user_id, id, update, Utc::now(), &mut conn).await
    }

    async fn delete_beneficiary(&self, user_id: i64, id: i64) -> Result<bool, BeneficiaryError> {
        let mut conn = self.pool.acquire().await?;
        let deleted = beneficiaries::delete_beneficiary(user_id, id, &mut conn).await?;
        if deleted {
            debug!("🗃️ Beneficiary #{id} deleted for user #{user_id}");
        }
        Ok(deleted)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object, using the URL in `WALLY_DATABASE_URL`
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Applies any outstanding schema migrations.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Closes every connection in the pool. Clones of this database share the pool and are closed too.
    pub async fn close(&self) {
        self.pool.close().await;
        debug!("🗃️ Database connection pool for {} closed", self.url);
    }
}
