use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use serde_json::json;
use wally_engine::{
    events::EventProducers,
    traits::{FulfillmentKind, FulfillmentReceipt, ProviderError},
    LedgerError,
    PurchaseApi,
};

use super::{
    helpers::{send_request, wallet},
    mocks::{MockVtu, MockWalletDb},
};
use crate::routes::{PurchaseRoute, ResolveAlertRoute};

fn configure_with(db: MockWalletDb, vtu: MockVtu) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        let api = PurchaseApi::new(db, vtu, EventProducers::default());
        cfg.service(PurchaseRoute::<MockWalletDb, MockVtu>::new())
            .service(ResolveAlertRoute::<MockWalletDb, MockVtu>::new())
            .app_data(web::Data::new(api));
    }
}

fn airtime(amount: i64) -> TestRequest {
    TestRequest::post().uri("/purchase").set_json(json!({
        "user_id": 7,
        "amount": amount,
        "kind": "airtime",
        "network": "mtn",
        "phone": "08031234567"
    }))
}

#[actix_web::test]
async fn purchase_with_insufficient_funds() {
    let _ = env_logger::try_init().ok();
    let mut db = MockWalletDb::new();
    db.expect_fetch_wallet().returning(|_| Ok(Some(wallet(7, 100))));
    db.expect_debit().never();
    let mut vtu = MockVtu::new();
    vtu.expect_execute().never();
    let (status, body) = send_request(airtime(20_000), configure_with(db, vtu)).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(
        body,
        r#"{"error":"Insufficient funds. The balance is ₦100.00, but ₦200.00 was requested"}"#
    );
}

#[actix_web::test]
async fn purchase_rejected_by_the_provider() {
    let _ = env_logger::try_init().ok();
    let mut db = MockWalletDb::new();
    db.expect_fetch_wallet().returning(|_| Ok(Some(wallet(7, 1_000))));
    db.expect_debit().never();
    let mut vtu = MockVtu::new();
    vtu.expect_execute()
        .withf(|op| op.kind == FulfillmentKind::Airtime && op.phone == "08031234567")
        .returning(|_| Err(ProviderError::Rejected("Invalid number".into())));
    let (status, body) = send_request(airtime(20_000), configure_with(db, vtu)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body, r#"{"error":"The service provider is unavailable right now. No money was taken."}"#);
}

#[actix_web::test]
async fn delivered_but_not_charged() {
    let _ = env_logger::try_init().ok();
    let mut db = MockWalletDb::new();
    db.expect_fetch_wallet().returning(|_| Ok(Some(wallet(7, 1_000))));
    db.expect_debit().returning(|_| Err(LedgerError::DatabaseError("database is locked".into())));
    // Storing the alert fails too. The user must still be told that their purchase went through.
    db.expect_insert_reconciliation_alert()
        .times(1)
        .returning(|_| Err(LedgerError::DatabaseError("database is locked".into())));
    let mut vtu = MockVtu::new();
    vtu.expect_execute().returning(|_| Ok(FulfillmentReceipt { transaction_id: "TX-991".into() }));
    let (status, body) = send_request(airtime(20_000), configure_with(db, vtu)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("Your purchase was delivered"));
    assert!(!body.contains("database is locked"));
}

#[actix_web::test]
async fn non_positive_amounts_are_refused() {
    let _ = env_logger::try_init().ok();
    let mut db = MockWalletDb::new();
    db.expect_fetch_wallet().never();
    let (status, _) = send_request(airtime(0), configure_with(db, MockVtu::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn resolving_an_unknown_alert() {
    let _ = env_logger::try_init().ok();
    let mut db = MockWalletDb::new();
    db.expect_resolve_reconciliation_alert()
        .withf(|id| *id == 12)
        .returning(|id| Err(LedgerError::AlertNotFound(id)));
    let req = TestRequest::post().uri("/reconciliation/alerts/12/resolve");
    let (status, body) = send_request(req, configure_with(db, MockVtu::new())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("Reconciliation alert #12 does not exist"));
}
