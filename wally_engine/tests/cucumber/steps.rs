use std::time::Duration;

use chrono::Utc;
use cucumber::{given, then, when};
use futures_util::future::join_all;
use serde_json::json;
use wally_common::Kobo;
use wally_engine::{
    db_types::{Category, IntentStatus, NewPaymentIntent, NewUser},
    LedgerManagement,
    PurchaseError,
    SettlementDatabase,
};

use crate::{
    cucumber::WalletWorld,
    support::{airtime, fund, MockFulfillment, MockVerifier, VALID_SIGNATURE},
};

#[given(expr = "a user '{word}' with chat id {word}")]
async fn create_user(world: &mut WalletWorld, name: String, chat_id: String) {
    let sys = world.system();
    let user = sys.db.create_user(NewUser::new(chat_id, name.clone())).await.expect("Error creating user");
    sys.users.insert(name, user.id);
}

#[given(expr = "'{word}' has ₦{int} in their wallet")]
async fn fund_wallet(world: &mut WalletWorld, name: String, naira: i64) {
    let sys = world.system();
    fund(&sys.db, sys.user_id(&name), naira).await;
}

#[given(expr = "a pending funding request {word} from '{word}' for ₦{int}")]
async fn pending_request(world: &mut WalletWorld, reference: String, name: String, naira: i64) {
    let sys = world.system();
    let intent = NewPaymentIntent {
        authorization_url: format!("https://checkout.test/{reference}"),
        reference,
        user_id: sys.user_id(&name),
        amount: Kobo::from_naira(naira),
        expires_at: Utc::now() + chrono::Duration::hours(1),
    };
    sys.db.insert_payment_intent(intent).await.expect("Error inserting payment intent");
}

#[given(expr = "the processor reports a successful payment of ₦{int}")]
async fn processor_paid(world: &mut WalletWorld, naira: i64) {
    world.system().verifier = MockVerifier::paid(naira).with_delay(Duration::from_millis(50));
}

#[given("the processor reports a declined payment")]
async fn processor_declined(world: &mut WalletWorld) {
    world.system().verifier = MockVerifier::declined(0);
}

#[given("the airtime provider is down")]
async fn provider_down(world: &mut WalletWorld) {
    world.system().fulfillment = MockFulfillment::failing();
}

#[given(expr = "'{word}' spends their balance elsewhere while the provider works")]
async fn provider_drains(world: &mut WalletWorld, name: String) {
    let sys = world.system();
    sys.fulfillment = MockFulfillment::draining(sys.db.clone(), sys.user_id(&name));
}

#[when(expr = "the webhook for {word} arrives {int} times while the user presses verify {int} times")]
async fn concurrent_settlement(world: &mut WalletWorld, reference: String, webhooks: usize, verifies: usize) {
    let api = world.system().settlement();
    let payload = json!({ "event": "charge.success", "data": { "reference": reference } }).to_string();
    let (api, payload, reference) = (&api, payload.as_bytes(), reference.as_str());
    let hooks = (0..webhooks).map(move |_| async move {
        api.process_webhook(payload, VALID_SIGNATURE).await.map(|_| ())
    });
    let manual = (0..verifies).map(move |_| async move { api.settle(reference).await.map(|_| ()) });
    let (a, b) = futures_util::future::join(join_all(hooks), join_all(manual)).await;
    for result in a.into_iter().chain(b) {
        result.expect("Settlement failed");
    }
}

#[when(expr = "{word} is settled")]
async fn settle(world: &mut WalletWorld, reference: String) {
    let api = world.system().settlement();
    api.settle(&reference).await.expect("Settlement failed");
}

#[when(expr = "'{word}' buys ₦{int} airtime for {word}")]
async fn buy_airtime(world: &mut WalletWorld, name: String, naira: i64, phone: String) {
    let sys = world.system();
    let api = sys.purchases();
    let result = api.purchase(sys.user_id(&name), Kobo::from_naira(naira), Category::Airtime, airtime(&phone, naira)).await;
    sys.last_error = result.err().map(|e| error_name(&e).to_string());
}

#[then(expr = "the wallet of '{word}' holds ₦{int}")]
async fn check_balance(world: &mut WalletWorld, name: String, naira: i64) {
    let sys = world.system();
    let wallet = sys.db.fetch_wallet(sys.user_id(&name)).await.expect("Error fetching wallet").expect("No wallet");
    assert_eq!(wallet.balance, Kobo::from_naira(naira), "Balance is incorrect");
}

#[then(expr = "'{word}' has {int} ledger entries")]
async fn check_history(world: &mut WalletWorld, name: String, count: usize) {
    let sys = world.system();
    let history = sys.db.fetch_history(sys.user_id(&name), 100).await.expect("Error fetching history");
    assert_eq!(history.len(), count, "Ledger entry count is incorrect");
}

#[then(expr = "funding request {word} is {word}")]
async fn check_intent(world: &mut WalletWorld, reference: String, status: String) {
    let sys = world.system();
    let intent = sys.db.fetch_payment_intent(&reference).await.expect("Error fetching intent").expect("No intent");
    let expected = match status.as_str() {
        "pending" => IntentStatus::Pending,
        "completed" => IntentStatus::Completed,
        "failed" => IntentStatus::Failed,
        s => panic!("Unknown intent status {s}"),
    };
    assert_eq!(intent.status, expected);
}

#[then("the purchase succeeds")]
async fn purchase_succeeded(world: &mut WalletWorld) {
    let sys = world.system();
    assert!(sys.last_error.is_none(), "The purchase failed with {:?}", sys.last_error);
}

#[then(expr = "the purchase fails with {word}")]
async fn purchase_failed(world: &mut WalletWorld, error: String) {
    let sys = world.system();
    assert_eq!(sys.last_error.as_deref(), Some(error.as_str()));
}

#[then(expr = "there is/are {int} open reconciliation alert(s)")]
async fn open_alerts(world: &mut WalletWorld, count: usize) {
    let sys = world.system();
    let alerts = sys.db.fetch_open_reconciliation_alerts().await.expect("Error fetching alerts");
    assert_eq!(alerts.len(), count);
}

fn error_name(e: &PurchaseError) -> &'static str {
    match e {
        PurchaseError::InsufficientFunds { .. } => "InsufficientFunds",
        PurchaseError::InvalidAmount(_) => "InvalidAmount",
        PurchaseError::FulfillmentFailed(_) => "FulfillmentFailed",
        PurchaseError::ReconciliationAlert { .. } => "ReconciliationAlert",
        PurchaseError::Ledger(_) => "Ledger",
    }
}
