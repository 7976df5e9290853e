use std::fmt::Debug;

use chrono::{DateTime, Duration, Utc};
use log::*;
use serde::{Deserialize, Serialize};
use wally_common::Kobo;

use crate::{
    db_types::{LowBalanceCandidate, MilestoneCandidate, MilestoneCursors, Reminder, ReminderType},
    traits::{NotificationAction, Notifier, ReminderError, ReminderManagement},
};

/// Minimum time between two low-balance reminders for the same user.
pub const LOW_BALANCE_COOLDOWN_HOURS: i64 = 24;
/// Milestones look at this many trailing days of activity.
pub const MILESTONE_WINDOW_DAYS: i64 = 30;
/// A transaction-count milestone is reached every this many debits.
pub const TX_COUNT_MILESTONE_STEP: i64 = 10;
/// A spend milestone is reached every time the trailing total passes a multiple of this.
pub const SPEND_MILESTONE_UNIT: Kobo = Kobo::from_naira(10_000);

/// What a scan did. Per-user failures are counted here rather than aborting the scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    pub examined: usize,
    pub notified: usize,
    pub skipped: usize,
    pub errors: usize,
}

/// `ReminderApi` runs the two periodic scans. Both are safe to trigger from a cron job, an in-process timer, or both:
/// the scan state lives in the database, not in memory.
pub struct ReminderApi<B, N> {
    db: B,
    notifier: N,
}

impl<B, N> Debug for ReminderApi<B, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReminderApi")
    }
}

impl<B, N> ReminderApi<B, N> {
    pub fn new(db: B, notifier: N) -> Self {
        Self { db, notifier }
    }
}

impl<B, N> ReminderApi<B, N>
where
    B: ReminderManagement,
    N: Notifier,
{
    pub async fn reminder(&self, user_id: i64, reminder_type: ReminderType) -> Result<Reminder, ReminderError> {
        self.db
            .fetch_reminder(user_id, reminder_type)
            .await?
            .ok_or(ReminderError::ReminderNotFound(user_id, reminder_type))
    }

    /// Changes a reminder's threshold and/or switches it on or off. Reminders are never deleted.
    pub async fn update_reminder_settings(
        &self,
        user_id: i64,
        reminder_type: ReminderType,
        threshold: Option<Kobo>,
        is_active: Option<bool>,
    ) -> Result<Reminder, ReminderError> {
        let reminder = self.db.update_reminder_settings(user_id, reminder_type, threshold, is_active).await?;
        debug!("⏰️ {reminder_type} reminder for user #{user_id} updated: {reminder:?}");
        Ok(reminder)
    }

    /// Notifies every user whose balance is below their threshold, at most once per cooldown window.
    ///
    /// The cooldown is claimed in the database before the message is sent, so two overlapping scans cannot both send.
    pub async fn run_low_balance_scan(&self, now: DateTime<Utc>) -> Result<ScanReport, ReminderError> {
        let candidates = self.db.fetch_low_balance_candidates().await?;
        let cutoff = now - Duration::hours(LOW_BALANCE_COOLDOWN_HOURS);
        let mut report = ScanReport::default();
        for candidate in candidates {
            report.examined += 1;
            if candidate.last_sent_at.map(|t| t > cutoff).unwrap_or(false) {
                trace!("⏰️ User #{} was reminded recently. Skipping.", candidate.user_id);
                report.skipped += 1;
                continue;
            }
            match self.db.claim_reminder(candidate.reminder_id, now, cutoff).await {
                Ok(true) => {},
                Ok(false) => {
                    trace!("⏰️ Low balance reminder #{} was claimed by another scan", candidate.reminder_id);
                    report.skipped += 1;
                    continue;
                },
                Err(e) => {
                    error!("⏰️ Could not claim low balance reminder #{}: {e}", candidate.reminder_id);
                    report.errors += 1;
                    continue;
                },
            }
            let text = low_balance_message(&candidate);
            let actions = [NotificationAction::new("💰 Fund Wallet", "fund_wallet")];
            match self.notifier.send(&candidate.chat_id, &text, &actions).await {
                Ok(()) => report.notified += 1,
                Err(e) => {
                    warn!("⏰️ Low balance reminder for user #{} was not delivered: {e}", candidate.user_id);
                    report.errors += 1;
                },
            }
        }
        info!("⏰️ Low balance scan complete: {report:?}");
        Ok(report)
    }

    /// Congratulates users that reached a new transaction-count or spend milestone over the trailing window.
    ///
    /// Each reminder remembers the highest milestone it has announced. A milestone is announced when the current
    /// level rises above that cursor. If activity drops out of the window and the level falls, the cursor follows it
    /// down silently, so reaching the same level again is announced again.
    pub async fn run_milestone_scan(&self, now: DateTime<Utc>) -> Result<ScanReport, ReminderError> {
        let candidates = self.db.fetch_milestone_candidates().await?;
        let since = now - Duration::days(MILESTONE_WINDOW_DAYS);
        let mut report = ScanReport::default();
        for candidate in candidates {
            report.examined += 1;
            let activity = match self.db.debit_activity_since(candidate.user_id, since).await {
                Ok(a) => a,
                Err(e) => {
                    error!("⏰️ Could not load activity for user #{}: {e}", candidate.user_id);
                    report.errors += 1;
                    continue;
                },
            };
            let check = MilestoneCheck::new(&candidate, activity.count, activity.total);
            if !check.cursors_changed() {
                report.skipped += 1;
                continue;
            }
            let messages = check.messages(&candidate, activity.total);
            let sent_at = if messages.is_empty() { None } else { Some(now) };
            match self.db.update_milestone_cursors(candidate.reminder_id, check.current, check.next, sent_at).await {
                Ok(true) => {},
                Ok(false) => {
                    trace!("⏰️ Milestone reminder #{} was handled by another scan", candidate.reminder_id);
                    report.skipped += 1;
                    continue;
                },
                Err(e) => {
                    error!("⏰️ Could not update milestone cursors for user #{}: {e}", candidate.user_id);
                    report.errors += 1;
                    continue;
                },
            }
            if messages.is_empty() {
                trace!("⏰️ Milestone cursors for user #{} lowered to {check:?}", candidate.user_id);
                report.skipped += 1;
                continue;
            }
            for text in messages {
                match self.notifier.send(&candidate.chat_id, &text, &[]).await {
                    Ok(()) => report.notified += 1,
                    Err(e) => {
                        warn!("⏰️ Milestone message for user #{} was not delivered: {e}", candidate.user_id);
                        report.errors += 1;
                    },
                }
            }
        }
        info!("⏰️ Milestone scan complete: {report:?}");
        Ok(report)
    }
}

/// The milestone levels a user has reached, compared against what they were last told.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MilestoneCheck {
    tx_level: i64,
    spend_level: Kobo,
    announce_tx: bool,
    announce_spend: bool,
    current: MilestoneCursors,
    // The cursors always track the current level, whether that is up (announce) or down (silently)
    next: MilestoneCursors,
}

impl MilestoneCheck {
    fn new(candidate: &MilestoneCandidate, count: i64, total: Kobo) -> Self {
        let tx_level = (count / TX_COUNT_MILESTONE_STEP) * TX_COUNT_MILESTONE_STEP;
        let unit = SPEND_MILESTONE_UNIT.value();
        let spend_level = Kobo::from((total.value() / unit) * unit);
        let announce_tx = tx_level > 0 && tx_level > candidate.ack_tx_count;
        let announce_spend = spend_level.is_positive() && spend_level > candidate.ack_spend;
        Self {
            tx_level,
            spend_level,
            announce_tx,
            announce_spend,
            current: candidate.cursors(),
            next: MilestoneCursors { tx_count: tx_level, spend: spend_level },
        }
    }

    fn cursors_changed(&self) -> bool {
        self.current != self.next
    }

    fn messages(&self, candidate: &MilestoneCandidate, total: Kobo) -> Vec<String> {
        let mut messages = Vec::with_capacity(2);
        if self.announce_tx {
            messages.push(format!(
                "🎉 Congratulations, {}! You've completed {} transactions in the last {MILESTONE_WINDOW_DAYS} days.\n\n\
                 Total value: {total}\n\nThank you for using Wally!",
                candidate.full_name, self.tx_level
            ));
        }
        if self.announce_spend {
            messages.push(format!(
                "🌟 Amazing milestone, {}! You've transacted over {} in the last {MILESTONE_WINDOW_DAYS} days.\n\n\
                 We appreciate your continued trust in Wally!",
                candidate.full_name, self.spend_level
            ));
        }
        messages
    }
}

fn low_balance_message(candidate: &LowBalanceCandidate) -> String {
    format!(
        "Hey {}! Your wallet balance is running low.\n\nCurrent balance: {}\n\nConsider topping up to keep enjoying \
         seamless transactions.",
        candidate.full_name, candidate.balance
    )
}
