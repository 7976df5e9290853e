use std::{fmt::Display, future::Future, sync::Arc, time::Duration};

use chrono::Utc;
use log::*;
use tokio::{
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use wally_engine::{conversation::ConversationGuard, ReminderApi, ScanReport, SqliteDatabase};

use crate::{config::ReminderWorkerConfig, integrations::TelegramNotifier};

/// Starts the reminder worker. Do not await the returned JoinHandles, as they will run indefinitely.
///
/// Each scan runs in its own task, once at startup and then on its own interval, so a slow scan never delays the other.
/// Scan state lives in the database, so this worker can run next to a cron job hitting the `/api/scheduler` routes.
pub fn start_reminder_worker(
    db: SqliteDatabase,
    notifier: TelegramNotifier,
    config: ReminderWorkerConfig,
) -> (JoinHandle<()>, JoinHandle<()>) {
    let api = Arc::new(ReminderApi::new(db, notifier));
    info!(
        "🕰️ Reminder worker started. Low-balance scan every {}s, milestone scan every {}s",
        config.low_balance_interval.as_secs(),
        config.milestone_interval.as_secs()
    );
    let low_balance_api = Arc::clone(&api);
    let low_balance = spawn_scan_loop("Low-balance", config.low_balance_interval, move || {
        let api = Arc::clone(&low_balance_api);
        async move { api.run_low_balance_scan(Utc::now()).await }
    });
    let milestones = spawn_scan_loop("Milestone", config.milestone_interval, move || {
        let api = Arc::clone(&api);
        async move { api.run_milestone_scan(Utc::now()).await }
    });
    (low_balance, milestones)
}

fn spawn_scan_loop<F, Fut, E>(name: &'static str, period: Duration, mut scan: F) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<ScanReport, E>> + Send,
    E: Display,
{
    tokio::spawn(async move {
        let mut timer = interval(period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            timer.tick().await;
            debug!("🕰️ Running the {name} reminder scan");
            log_report(name, scan().await);
        }
    })
}

/// Removes abandoned dialogs from the guard. Expired slots are also dropped lazily on access, so this only keeps
/// memory in check for chats that never come back.
pub fn start_guard_sweeper(guard: Arc<ConversationGuard>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = interval(guard.step_timeout());
        info!("🕰️ Conversation sweeper started");
        loop {
            timer.tick().await;
            let removed = guard.sweep_expired();
            if removed > 0 {
                debug!("🕰️ {removed} expired dialogs swept. {} still open", guard.len());
            }
        }
    })
}

fn log_report<E: Display>(name: &str, result: Result<ScanReport, E>) {
    match result {
        Ok(r) if r.errors > 0 => warn!(
            "🕰️ {name} scan finished with {} errors. {} examined, {} notified, {} skipped",
            r.errors, r.examined, r.notified, r.skipped
        ),
        Ok(r) => info!("🕰️ {name} scan finished. {} examined, {} notified, {} skipped", r.examined, r.notified, r.skipped),
        Err(e) => error!("🕰️ Error running the {name} scan: {e}"),
    }
}
