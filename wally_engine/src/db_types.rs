//! Data types shared between the wallet APIs and the database backends.
use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{types::Json, FromRow, Type};
use thiserror::Error;
pub use wally_common::Kobo;

#[derive(Debug, Clone, Error)]
#[error("Invalid value: {0}")]
pub struct ConversionError(String);

//--------------------------------------        User           ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    /// The chat identifier of the user on the messaging platform. Unique per user.
    pub chat_id: String,
    pub full_name: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub chat_id: String,
    pub full_name: String,
    pub email: Option<String>,
}

impl NewUser {
    pub fn new<S: Into<String>>(chat_id: S, full_name: S) -> Self {
        Self { chat_id: chat_id.into(), full_name: full_name.into(), email: None }
    }

    pub fn with_email<S: Into<String>>(mut self, email: S) -> Self {
        self.email = Some(email.into());
        self
    }
}

//--------------------------------------       Wallet          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Wallet {
    pub id: i64,
    pub user_id: i64,
    pub balance: Kobo,
    pub currency: String,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------      Direction        ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Credit,
    Debit,
}

impl Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Credit => write!(f, "credit"),
            Direction::Debit => write!(f, "debit"),
        }
    }
}

//--------------------------------------      Category         ---------------------------------------------------------
/// What a ledger entry paid for (or where the money came from).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Funding,
    Airtime,
    Data,
    AirtimeSharing,
    Bill,
    Transfer,
    Adjustment,
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Category::Funding => "funding",
            Category::Airtime => "airtime",
            Category::Data => "data",
            Category::AirtimeSharing => "airtime_sharing",
            Category::Bill => "bill",
            Category::Transfer => "transfer",
            Category::Adjustment => "adjustment",
        };
        f.write_str(s)
    }
}

impl FromStr for Category {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "funding" => Ok(Self::Funding),
            "airtime" => Ok(Self::Airtime),
            "data" => Ok(Self::Data),
            "airtime_sharing" => Ok(Self::AirtimeSharing),
            "bill" => Ok(Self::Bill),
            "transfer" => Ok(Self::Transfer),
            "adjustment" => Ok(Self::Adjustment),
            s => Err(ConversionError(format!("Invalid ledger category: {s}"))),
        }
    }
}

//--------------------------------------     EntryStatus       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Success,
    Failed,
}

//--------------------------------------     LedgerEntry       ---------------------------------------------------------
/// One immutable row of the wallet transaction log.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub wallet_id: i64,
    pub user_id: i64,
    pub direction: Direction,
    pub category: Category,
    /// Always positive. The sign is carried by `direction`.
    pub amount: Kobo,
    pub balance_before: Kobo,
    pub balance_after: Kobo,
    pub description: String,
    /// Globally unique. For settlement credits this is the payment reference.
    pub reference: String,
    pub status: EntryStatus,
    pub metadata: Json<Value>,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// The amount with its sign applied: positive for credits, negative for debits.
    pub fn signed_amount(&self) -> Kobo {
        match self.direction {
            Direction::Credit => self.amount,
            Direction::Debit => -self.amount,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewLedgerEntry {
    pub user_id: i64,
    pub amount: Kobo,
    pub category: Category,
    pub description: String,
    /// If `None`, the backend generates a `CR-`/`DB-` reference.
    pub reference: Option<String>,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
}

impl NewLedgerEntry {
    pub fn new<S: Into<String>>(user_id: i64, amount: Kobo, category: Category, description: S) -> Self {
        Self {
            user_id,
            amount,
            category,
            description: description.into(),
            reference: None,
            metadata: Value::Object(Default::default()),
            created_at: Utc::now(),
        }
    }

    pub fn with_reference<S: Into<String>>(mut self, reference: S) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// Overrides the entry timestamp. Only useful for back-filling history and for tests.
    pub fn with_timestamp(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

//--------------------------------------    IntentStatus       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
    Pending,
    Completed,
    Failed,
}

impl Display for IntentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntentStatus::Pending => write!(f, "pending"),
            IntentStatus::Completed => write!(f, "completed"),
            IntentStatus::Failed => write!(f, "failed"),
        }
    }
}

//--------------------------------------    PaymentIntent      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub reference: String,
    pub user_id: i64,
    pub amount: Kobo,
    pub authorization_url: String,
    pub status: IntentStatus,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPaymentIntent {
    pub reference: String,
    pub user_id: i64,
    pub amount: Kobo,
    pub authorization_url: String,
    pub expires_at: DateTime<Utc>,
}

//--------------------------------------    ReminderType       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReminderType {
    LowBalance,
    Milestone,
}

impl Display for ReminderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReminderType::LowBalance => write!(f, "low_balance"),
            ReminderType::Milestone => write!(f, "milestone"),
        }
    }
}

impl FromStr for ReminderType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low_balance" => Ok(Self::LowBalance),
            "milestone" => Ok(Self::Milestone),
            s => Err(ConversionError(format!("Invalid reminder type: {s}"))),
        }
    }
}

//--------------------------------------      Reminder         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Reminder {
    pub id: i64,
    pub user_id: i64,
    pub reminder_type: ReminderType,
    /// Balance threshold for low-balance reminders. Unused for milestones.
    pub threshold: Kobo,
    pub is_active: bool,
    pub last_sent_at: Option<DateTime<Utc>>,
    /// Highest transaction-count milestone already announced.
    pub ack_tx_count: i64,
    /// Highest spend milestone already announced.
    pub ack_spend: Kobo,
}

/// An active low-balance reminder whose wallet is currently below the reminder threshold.
#[derive(Debug, Clone, FromRow)]
pub struct LowBalanceCandidate {
    pub reminder_id: i64,
    pub user_id: i64,
    pub chat_id: String,
    pub full_name: String,
    pub balance: Kobo,
    pub threshold: Kobo,
    pub last_sent_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, FromRow)]
pub struct MilestoneCandidate {
    pub reminder_id: i64,
    pub user_id: i64,
    pub chat_id: String,
    pub full_name: String,
    pub ack_tx_count: i64,
    pub ack_spend: Kobo,
}

impl MilestoneCandidate {
    pub fn cursors(&self) -> MilestoneCursors {
        MilestoneCursors { tx_count: self.ack_tx_count, spend: self.ack_spend }
    }
}

/// The highest transaction-count and spend milestones a reminder has announced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneCursors {
    pub tx_count: i64,
    pub spend: Kobo,
}

/// Count and sum of successful debits over a window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct DebitActivity {
    pub count: i64,
    pub total: Kobo,
}

//--------------------------------------      Network          ---------------------------------------------------------
/// The mobile networks a beneficiary's number can be on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mtn,
    Airtel,
    Glo,
    #[sqlx(rename = "9mobile")]
    #[serde(rename = "9mobile")]
    NineMobile,
}

impl Network {
    pub const ALL: [Network; 4] = [Network::Mtn, Network::Airtel, Network::Glo, Network::NineMobile];
}

impl Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Network::Mtn => write!(f, "MTN"),
            Network::Airtel => write!(f, "Airtel"),
            Network::Glo => write!(f, "Glo"),
            Network::NineMobile => write!(f, "9mobile"),
        }
    }
}

/// Case-insensitive. Accepts the display names.
impl FromStr for Network {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mtn" => Ok(Self::Mtn),
            "airtel" => Ok(Self::Airtel),
            "glo" => Ok(Self::Glo),
            "9mobile" => Ok(Self::NineMobile),
            _ => Err(ConversionError(format!("Invalid network: {s}"))),
        }
    }
}

//--------------------------------------    Beneficiary        ---------------------------------------------------------
/// A saved contact that a user can send airtime to without typing the number again.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Beneficiary {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    /// Normalised to the 11-digit local form, e.g. `08031234567`. Unique per user.
    pub phone_number: String,
    pub network: Network,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBeneficiary {
    pub user_id: i64,
    pub name: String,
    pub phone_number: String,
    pub network: Network,
}

/// Fields to change on a beneficiary. `None` leaves the field as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeneficiaryUpdate {
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub network: Option<Network>,
}

impl BeneficiaryUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.phone_number.is_none() && self.network.is_none()
    }
}

//--------------------------------------  ReconciliationAlert  ---------------------------------------------------------
/// Raised when goods were delivered by a provider but the matching debit could not be written.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct ReconciliationAlert {
    pub id: i64,
    pub user_id: i64,
    pub amount: Kobo,
    pub category: Category,
    pub provider_transaction_id: String,
    pub reason: String,
    pub details: Json<Value>,
    pub resolved: bool,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewReconciliationAlert {
    pub user_id: i64,
    pub amount: Kobo,
    pub category: Category,
    pub provider_transaction_id: String,
    pub reason: String,
    pub details: Value,
}
