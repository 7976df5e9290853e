use serde::{Deserialize, Serialize};

use crate::db_types::{LedgerEntry, NewReconciliationAlert, PaymentIntent};

/// Emitted once per payment intent, when settlement credits the wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletCreditedEvent {
    pub intent: PaymentIntent,
    pub entry: LedgerEntry,
}

impl WalletCreditedEvent {
    pub fn new(intent: PaymentIntent, entry: LedgerEntry) -> Self {
        Self { intent, entry }
    }
}

/// Emitted when a provider delivered goods but the debit for them could not be written.
#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationAlertEvent {
    /// The id of the stored alert, if it could be stored.
    pub alert_id: Option<i64>,
    pub alert: NewReconciliationAlert,
}

impl ReconciliationAlertEvent {
    pub fn new(alert_id: Option<i64>, alert: NewReconciliationAlert) -> Self {
        Self { alert_id, alert }
    }
}

#[derive(Debug, Clone)]
pub enum EventType {
    WalletCredited(WalletCreditedEvent),
    ReconciliationAlert(ReconciliationAlertEvent),
}
