use serde::{Deserialize, Serialize};
use wally_common::Kobo;

use crate::db_types::{IntentStatus, LedgerEntry};

/// The result of a call to `settle`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettleOutcome {
    pub reference: String,
    /// The intent was already `completed` before this call. Nothing was done.
    pub already_settled: bool,
    /// This call credited the wallet.
    pub credited: bool,
    pub status: IntentStatus,
    pub amount: Kobo,
    /// The credit written by this call, if any.
    pub entry: Option<LedgerEntry>,
}

impl SettleOutcome {
    pub fn already_settled(reference: &str, amount: Kobo) -> Self {
        Self {
            reference: reference.to_string(),
            already_settled: true,
            credited: false,
            status: IntentStatus::Completed,
            amount,
            entry: None,
        }
    }

    pub fn credited(reference: &str, entry: LedgerEntry) -> Self {
        Self {
            reference: reference.to_string(),
            already_settled: false,
            credited: true,
            status: IntentStatus::Completed,
            amount: entry.amount,
            entry: Some(entry),
        }
    }

    pub fn failed(reference: &str, amount: Kobo) -> Self {
        Self {
            reference: reference.to_string(),
            already_settled: false,
            credited: false,
            status: IntentStatus::Failed,
            amount,
            entry: None,
        }
    }
}

/// The subset of a payment processor webhook body that settlement cares about.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    pub data: WebhookData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookData {
    pub reference: String,
}

impl WebhookEvent {
    pub const CHARGE_SUCCESS: &'static str = "charge.success";

    pub fn is_charge_success(&self) -> bool {
        self.event == Self::CHARGE_SUCCESS
    }
}
