use serde::{Deserialize, Serialize};
use wally_common::Kobo;

use crate::db_types::LedgerEntry;

/// Proof of a completed purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    /// The debit written for the purchase.
    pub entry: LedgerEntry,
    pub provider_transaction_id: String,
    pub new_balance: Kobo,
}
