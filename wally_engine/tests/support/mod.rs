#![allow(dead_code)]
//! Shared set-up and test doubles for the engine integration tests.
use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
        Mutex,
    },
    time::Duration,
};

use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};
use wally_common::Kobo;
use wally_engine::{
    db_types::{Category, NewLedgerEntry, NewUser, User},
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    traits::{
        CheckoutProvider,
        Fulfillment,
        FulfillmentKind,
        FulfillmentOp,
        FulfillmentReceipt,
        NotificationAction,
        Notifier,
        PaymentVerifier,
        ProviderError,
        VerifiedPayment,
    },
    LedgerManagement,
    SqliteDatabase,
};

pub const VALID_SIGNATURE: &str = "valid-signature";

pub async fn setup() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database")
}

pub async fn tear_down(db: SqliteDatabase) {
    let url = db.url().to_string();
    db.close().await;
    if let Err(e) = Sqlite::drop_database(&url).await {
        warn!("🚀️ Could not remove test database {url}: {e}");
    }
}

pub async fn new_user(db: &SqliteDatabase, chat_id: &str, name: &str) -> User {
    db.create_user(NewUser::new(chat_id, name).with_email(format!("{chat_id}@example.com")))
        .await
        .expect("Error creating user")
}

pub async fn fund(db: &SqliteDatabase, user_id: i64, naira: i64) {
    let entry = NewLedgerEntry::new(user_id, Kobo::from_naira(naira), Category::Funding, "Test funding");
    db.credit(entry).await.expect("Error funding wallet");
}

pub fn paid_result(naira: i64) -> Result<VerifiedPayment, ProviderError> {
    Ok(VerifiedPayment {
        success: true,
        amount: Kobo::from_naira(naira),
        provider_transaction_id: Some("4099260516".into()),
        message: Some("Approved".into()),
    })
}

/// A payment processor that reports the same result for every reference, after an optional delay.
#[derive(Clone)]
pub struct MockVerifier {
    result: Arc<Mutex<Result<VerifiedPayment, ProviderError>>>,
    delay: Duration,
    calls: Arc<AtomicUsize>,
}

impl MockVerifier {
    pub fn paid(naira: i64) -> Self {
        Self::with_result(paid_result(naira))
    }

    pub fn declined(naira: i64) -> Self {
        Self::with_result(Ok(VerifiedPayment {
            success: false,
            amount: Kobo::from_naira(naira),
            provider_transaction_id: None,
            message: Some("Declined".into()),
        }))
    }

    pub fn with_result(result: Result<VerifiedPayment, ProviderError>) -> Self {
        Self { result: Arc::new(Mutex::new(result)), delay: Duration::ZERO, calls: Arc::new(AtomicUsize::new(0)) }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn set_result(&self, result: Result<VerifiedPayment, ProviderError>) {
        *self.result.lock().unwrap() = result;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PaymentVerifier for MockVerifier {
    async fn verify(&self, _reference: &str) -> Result<VerifiedPayment, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.result.lock().unwrap().clone()
    }

    fn check_signature(&self, _payload: &[u8], signature: &str) -> bool {
        signature == VALID_SIGNATURE
    }
}

#[derive(Clone, Default)]
pub struct MockCheckout;

impl CheckoutProvider for MockCheckout {
    async fn initialize(&self, reference: &str, _email: &str, _amount: Kobo) -> Result<String, ProviderError> {
        Ok(format!("https://checkout.test/{reference}"))
    }
}

/// A VTU provider. It can be told to fail, or to spend the user's money behind the wallet's back while it works.
#[derive(Clone, Default)]
pub struct MockFulfillment {
    fail: bool,
    drain: Option<(SqliteDatabase, i64)>,
    calls: Arc<AtomicUsize>,
}

impl MockFulfillment {
    pub fn failing() -> Self {
        Self { fail: true, ..Default::default() }
    }

    /// While the purchase is in flight, the user's whole balance is spent elsewhere.
    pub fn draining(db: SqliteDatabase, user_id: i64) -> Self {
        Self { drain: Some((db, user_id)), ..Default::default() }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Fulfillment for MockFulfillment {
    async fn execute(&self, op: &FulfillmentOp) -> Result<FulfillmentReceipt, ProviderError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ProviderError::Rejected("Service temporarily unavailable".into()));
        }
        if let Some((db, user_id)) = &self.drain {
            let balance = db.fetch_wallet(*user_id).await.unwrap().unwrap().balance;
            let entry = NewLedgerEntry::new(*user_id, balance, Category::Transfer, "Spent elsewhere");
            db.debit(entry).await.unwrap();
        }
        let prefix = match op.kind {
            FulfillmentKind::Data => "DATA",
            _ => "VTU",
        };
        Ok(FulfillmentReceipt { transaction_id: format!("{prefix}-{n:04}") })
    }
}

pub fn airtime(phone: &str, naira: i64) -> FulfillmentOp {
    FulfillmentOp {
        kind: FulfillmentKind::Airtime,
        network: "mtn".into(),
        phone: phone.into(),
        amount: Kobo::from_naira(naira),
        plan: None,
        recipient_name: None,
    }
}

/// A chat platform that records every message.
#[derive(Clone, Default)]
pub struct MockNotifier {
    pub sent: Arc<Mutex<Vec<(String, String, Vec<NotificationAction>)>>>,
    fail_for: Option<String>,
}

impl MockNotifier {
    pub fn failing_for(chat_id: &str) -> Self {
        Self { fail_for: Some(chat_id.to_string()), ..Default::default() }
    }

    pub fn messages(&self) -> Vec<(String, String, Vec<NotificationAction>)> {
        self.sent.lock().unwrap().clone()
    }
}

impl Notifier for MockNotifier {
    async fn send(&self, chat_id: &str, text: &str, actions: &[NotificationAction]) -> Result<(), ProviderError> {
        if self.fail_for.as_deref() == Some(chat_id) {
            return Err(ProviderError::Unreachable("chat platform is down".into()));
        }
        self.sent.lock().unwrap().push((chat_id.to_string(), text.to_string(), actions.to_vec()));
        Ok(())
    }
}
