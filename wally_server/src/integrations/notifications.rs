//! Subscribers to engine events.
//!
//! A credited wallet is announced to the user in their chat. A reconciliation alert is logged at error level so that
//! it reaches whoever watches the logs. The alert has already been stored by the time the event fires.
use futures::future::BoxFuture;
use log::*;
use wally_common::Kobo;
use wally_engine::{
    events::{EventHandlers, EventHooks, ReconciliationAlertEvent},
    traits::{NotificationAction, Notifier},
    LedgerApi,
    SqliteDatabase,
};

use crate::integrations::TelegramNotifier;

pub const WALLET_EVENT_BUFFER_SIZE: usize = 25;

pub fn create_wallet_event_handlers(db: SqliteDatabase, notifier: TelegramNotifier) -> EventHandlers {
    let mut hooks = EventHooks::default();
    // --- On WalletCredited Handler ---
    hooks.on_wallet_credited(move |ev| {
        let entry = ev.entry;
        if entry.amount <= Kobo::default() {
            return no_op();
        }
        let api = LedgerApi::new(db.clone());
        let notifier = notifier.clone();
        Box::pin(async move {
            let user = match api.user_by_id(entry.user_id).await {
                Ok(Some(user)) => user,
                Ok(None) => {
                    warn!("⏰️ User #{} was credited, but does not exist.", entry.user_id);
                    return;
                },
                Err(e) => {
                    warn!("⏰️ Could not look up user #{} to announce a credit. {e}", entry.user_id);
                    return;
                },
            };
            let text = credited_message(entry.amount, entry.balance_after);
            let actions = [NotificationAction::new("💰 Check Balance", "check_balance")];
            match notifier.send(&user.chat_id, &text, &actions).await {
                Ok(()) => debug!("⏰️ Credit [{}] announced to chat {}", entry.reference, user.chat_id),
                Err(e) => warn!("⏰️ Could not announce credit [{}] to chat {}. {e}", entry.reference, user.chat_id),
            }
        })
    });
    // --- On ReconciliationAlert Handler ---
    hooks.on_reconciliation_alert(move |ev| {
        let ReconciliationAlertEvent { alert_id, alert } = ev;
        let id = alert_id.map(|id| format!("#{id}")).unwrap_or_else(|| "(not stored)".to_string());
        error!(
            "🛒️ RECONCILIATION ALERT {id}: {} for user #{} was delivered as [{}] but not charged. {}",
            alert.amount, alert.user_id, alert.provider_transaction_id, alert.reason
        );
        no_op()
    });
    EventHandlers::new(WALLET_EVENT_BUFFER_SIZE, hooks)
}

fn credited_message(amount: Kobo, balance: Kobo) -> String {
    format!("✅ Payment received! {amount} has been added to your wallet.\nYour new balance is {balance}.")
}

fn no_op() -> BoxFuture<'static, ()> {
    Box::pin(async {})
}
