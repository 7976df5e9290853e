use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use wally_common::Kobo;

use crate::{
    db_types::{LowBalanceCandidate, MilestoneCandidate, MilestoneCursors, Reminder, ReminderType},
    traits::{LedgerError, ReminderError},
};

/// Balance below which a new user is reminded to top up.
pub const DEFAULT_LOW_BALANCE_THRESHOLD: Kobo = Kobo::from_naira(500);

/// Creates the low-balance and milestone reminders every new user starts with.
pub async fn insert_default_reminders(user_id: i64, conn: &mut SqliteConnection) -> Result<(), LedgerError> {
    sqlx::query(
        r#"
            INSERT INTO reminders (user_id, reminder_type, threshold, is_active) VALUES
            ($1, 'low_balance', $2, TRUE),
            ($1, 'milestone', 0, TRUE)
        "#,
    )
    .bind(user_id)
    .bind(DEFAULT_LOW_BALANCE_THRESHOLD)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn fetch_reminder(
    user_id: i64,
    reminder_type: ReminderType,
    conn: &mut SqliteConnection,
) -> Result<Option<Reminder>, ReminderError> {
    let reminder = sqlx::query_as("SELECT * FROM reminders WHERE user_id = $1 AND reminder_type = $2")
        .bind(user_id)
        .bind(reminder_type)
        .fetch_optional(conn)
        .await?;
    Ok(reminder)
}

pub async fn update_settings(
    user_id: i64,
    reminder_type: ReminderType,
    threshold: Option<Kobo>,
    is_active: Option<bool>,
    conn: &mut SqliteConnection,
) -> Result<Option<Reminder>, ReminderError> {
    let reminder = sqlx::query_as(
        r#"
            UPDATE reminders SET threshold = COALESCE($1, threshold), is_active = COALESCE($2, is_active)
            WHERE user_id = $3 AND reminder_type = $4
            RETURNING *;
        "#,
    )
    .bind(threshold)
    .bind(is_active)
    .bind(user_id)
    .bind(reminder_type)
    .fetch_optional(conn)
    .await?;
    Ok(reminder)
}

pub async fn fetch_low_balance_candidates(
    conn: &mut SqliteConnection,
) -> Result<Vec<LowBalanceCandidate>, ReminderError> {
    let candidates = sqlx::query_as(
        r#"
            SELECT r.id AS reminder_id, r.user_id, u.chat_id, u.full_name, w.balance, r.threshold, r.last_sent_at
            FROM reminders r
            JOIN users u ON u.id = r.user_id
            JOIN wallets w ON w.user_id = r.user_id
            WHERE r.reminder_type = 'low_balance' AND r.is_active = TRUE AND w.balance < r.threshold
            ORDER BY r.id ASC
        "#,
    )
    .fetch_all(conn)
    .await?;
    Ok(candidates)
}

/// Sets `last_sent_at = now` if the reminder has never fired or last fired at or before `cutoff`.
/// Only one of several concurrent callers can succeed for the same window.
pub async fn claim_reminder(
    reminder_id: i64,
    now: DateTime<Utc>,
    cutoff: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<bool, ReminderError> {
    let result = sqlx::query(
        r#"
            UPDATE reminders SET last_sent_at = $1
            WHERE id = $2 AND is_active = TRUE AND (last_sent_at IS NULL OR last_sent_at <= $3)
        "#,
    )
    .bind(now)
    .bind(reminder_id)
    .bind(cutoff)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn fetch_milestone_candidates(
    conn: &mut SqliteConnection,
) -> Result<Vec<MilestoneCandidate>, ReminderError> {
    let candidates = sqlx::query_as(
        r#"
            SELECT r.id AS reminder_id, r.user_id, u.chat_id, u.full_name, r.ack_tx_count, r.ack_spend
            FROM reminders r
            JOIN users u ON u.id = r.user_id
            WHERE r.reminder_type = 'milestone' AND r.is_active = TRUE
            ORDER BY r.id ASC
        "#,
    )
    .fetch_all(conn)
    .await?;
    Ok(candidates)
}

/// Compare-and-swap on the milestone cursors. Of several scans that read the same cursors, only one moves them.
pub async fn update_milestone_cursors(
    reminder_id: i64,
    current: MilestoneCursors,
    next: MilestoneCursors,
    sent_at: Option<DateTime<Utc>>,
    conn: &mut SqliteConnection,
) -> Result<bool, ReminderError> {
    let result = sqlx::query(
        r#"
            UPDATE reminders SET ack_tx_count = $1, ack_spend = $2, last_sent_at = COALESCE($3, last_sent_at)
            WHERE id = $4 AND ack_tx_count = $5 AND ack_spend = $6
        "#,
    )
    .bind(next.tx_count)
    .bind(next.spend)
    .bind(sent_at)
    .bind(reminder_id)
    .bind(current.tx_count)
    .bind(current.spend)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}
