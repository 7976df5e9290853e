use chrono::{DateTime, Utc};
use thiserror::Error;
use wally_common::Kobo;

use crate::{
    db_types::{LowBalanceCandidate, MilestoneCandidate, MilestoneCursors, Reminder, ReminderType},
    traits::{LedgerError, LedgerManagement},
};

/// Persistence for the reminder scheduler. All scan state lives in the database so that a restart neither loses nor
/// repeats reminders.
#[allow(async_fn_in_trait)]
pub trait ReminderManagement: LedgerManagement {
    async fn fetch_reminder(&self, user_id: i64, reminder_type: ReminderType)
        -> Result<Option<Reminder>, ReminderError>;

    async fn update_reminder_settings(
        &self,
        user_id: i64,
        reminder_type: ReminderType,
        threshold: Option<Kobo>,
        is_active: Option<bool>,
    ) -> Result<Reminder, ReminderError>;

    /// Active low-balance reminders whose wallet balance is strictly below the reminder threshold.
    async fn fetch_low_balance_candidates(&self) -> Result<Vec<LowBalanceCandidate>, ReminderError>;

    /// Claims the cooldown window for a reminder by setting `last_sent_at = now`, but only if the reminder has never
    /// been sent or was last sent at or before `cutoff`. Returns `true` if this caller won the claim.
    async fn claim_reminder(
        &self,
        reminder_id: i64,
        now: DateTime<Utc>,
        cutoff: DateTime<Utc>,
    ) -> Result<bool, ReminderError>;

    /// Active milestone reminders, along with the cursors of the last acknowledged milestones.
    async fn fetch_milestone_candidates(&self) -> Result<Vec<MilestoneCandidate>, ReminderError>;

    /// Moves the milestone cursors from `current` to `next`, but only if they still hold `current`. `sent_at` is
    /// recorded in `last_sent_at` when a notification is due. Returns `true` if this caller won the update; a scan
    /// must only send its messages when it did.
    async fn update_milestone_cursors(
        &self,
        reminder_id: i64,
        current: MilestoneCursors,
        next: MilestoneCursors,
        sent_at: Option<DateTime<Utc>>,
    ) -> Result<bool, ReminderError>;
}

#[derive(Debug, Clone, Error)]
pub enum ReminderError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("User {0} has no {1} reminder")]
    ReminderNotFound(i64, ReminderType),
    #[error("{0}")]
    LedgerError(#[from] LedgerError),
}

impl From<sqlx::Error> for ReminderError {
    fn from(e: sqlx::Error) -> Self {
        ReminderError::DatabaseError(e.to_string())
    }
}
