use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wally_common::Kobo;
use wally_engine::{
    conversation::{FieldValue, Progress, Step},
    db_types::{Category, PaymentIntent, Wallet},
    ledger_objects::SpendingPeriod,
    traits::{FulfillmentKind, FulfillmentOp},
};

pub const DEFAULT_HISTORY_LIMIT: u32 = 10;
pub const MAX_HISTORY_LIMIT: u32 = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyParams {
    pub reference: String,
}

/// Amounts are in kobo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializePaymentRequest {
    pub user_id: i64,
    pub email: String,
    pub amount: Kobo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializePaymentResponse {
    pub reference: String,
    pub authorization_url: String,
    pub amount: Kobo,
    pub expires_at: DateTime<Utc>,
}

impl From<PaymentIntent> for InitializePaymentResponse {
    fn from(intent: PaymentIntent) -> Self {
        Self {
            reference: intent.reference,
            authorization_url: intent.authorization_url,
            amount: intent.amount,
            expires_at: intent.expires_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub user_id: i64,
    pub balance: Kobo,
    /// The balance as shown to users, e.g. `₦1500.00`
    pub display: String,
    pub currency: String,
}

impl From<Wallet> for BalanceResponse {
    fn from(wallet: Wallet) -> Self {
        Self {
            user_id: wallet.user_id,
            balance: wallet.balance,
            display: wallet.balance.to_string(),
            currency: wallet.currency,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<u32>,
}

impl HistoryParams {
    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_HISTORY_LIMIT).clamp(1, MAX_HISTORY_LIMIT)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryParams {
    #[serde(default = "default_period")]
    pub period: SpendingPeriod,
}

fn default_period() -> SpendingPeriod {
    SpendingPeriod::Weekly
}

/// A purchase on behalf of a user. The ledger category follows from `kind`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseRequest {
    pub user_id: i64,
    pub amount: Kobo,
    pub kind: FulfillmentKind,
    pub network: String,
    pub phone: String,
    #[serde(default)]
    pub plan: Option<String>,
    #[serde(default)]
    pub recipient_name: Option<String>,
}

impl PurchaseRequest {
    pub fn category(&self) -> Category {
        match self.kind {
            FulfillmentKind::Airtime => Category::Airtime,
            FulfillmentKind::Data => Category::Data,
            FulfillmentKind::AirtimeSharing => Category::AirtimeSharing,
            FulfillmentKind::Bill => Category::Bill,
            FulfillmentKind::Transfer => Category::Transfer,
        }
    }

    pub fn operation(&self) -> FulfillmentOp {
        FulfillmentOp {
            kind: self.kind,
            network: self.network.clone(),
            phone: self.phone.clone(),
            amount: self.amount,
            plan: self.plan.clone(),
            recipient_name: self.recipient_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReminderSettingsRequest {
    pub threshold: Option<Kobo>,
    pub is_active: Option<bool>,
}

/// The network is matched case-insensitively, so `MTN` and `mtn` are both accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeneficiaryRequest {
    pub name: String,
    pub phone_number: String,
    pub network: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BeneficiaryUpdateRequest {
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub network: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogInput {
    pub input: String,
}

/// The state of a chat dialog after the last call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DialogResponse {
    NextStep { step: Step, prompt: String },
    Complete { values: Vec<FieldValue> },
}

impl From<Step> for DialogResponse {
    fn from(step: Step) -> Self {
        Self::NextStep { prompt: step.prompt(), step }
    }
}

impl From<Progress> for DialogResponse {
    fn from(progress: Progress) -> Self {
        match progress {
            Progress::NextStep(step) => step.into(),
            Progress::Complete(values) => Self::Complete { values },
        }
    }
}
