use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use chrono::{Duration, TimeZone, Utc};
use wally_common::Kobo;
use wally_engine::{
    db_types::{IntentStatus, PaymentIntent},
    events::EventProducers,
    SettlementApi,
};

use super::{
    helpers::send_request,
    mocks::{MockCheckout, MockVerifier, MockWalletDb},
};
use crate::{
    config::ServerOptions,
    routes::{PaystackWebhookRoute, VerifyPaymentRoute},
};

const CHARGE_SUCCESS: &str = r#"{"event":"charge.success","data":{"reference":"WAL-REF-0001","amount":500000}}"#;

fn configure_with(db: MockWalletDb, verifier: MockVerifier) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        let api = SettlementApi::new(db, verifier, MockCheckout::new(), EventProducers::default());
        cfg.service(PaystackWebhookRoute::<MockWalletDb, MockVerifier, MockCheckout>::new())
            .service(VerifyPaymentRoute::<MockWalletDb, MockVerifier, MockCheckout>::new())
            .app_data(web::Data::new(api))
            .app_data(web::Data::new(ServerOptions::default()));
    }
}

fn intent(status: IntentStatus) -> PaymentIntent {
    let created_at = Utc.with_ymd_and_hms(2024, 10, 1, 12, 0, 0).unwrap();
    PaymentIntent {
        reference: "WAL-REF-0001".into(),
        user_id: 7,
        amount: Kobo::from_naira(5_000),
        authorization_url: "https://checkout.paystack.com/abc".into(),
        status,
        expires_at: created_at + Duration::hours(1),
        created_at,
        updated_at: created_at,
    }
}

fn signed_webhook(body: &'static str) -> TestRequest {
    TestRequest::post().uri("/webhook").insert_header(("x-paystack-signature", "abcd")).set_payload(body)
}

#[actix_web::test]
async fn webhook_without_signature_is_refused() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri("/webhook").set_payload(CHARGE_SUCCESS);
    let (status, body) = send_request(req, configure_with(MockWalletDb::new(), MockVerifier::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"error":"Invalid signature"}"#);
}

#[actix_web::test]
async fn webhook_with_bad_signature_is_refused() {
    let _ = env_logger::try_init().ok();
    let mut verifier = MockVerifier::new();
    verifier.expect_check_signature().times(1).returning(|_, _| false);
    // The backend must not be touched
    let db = MockWalletDb::new();
    let (status, _) = send_request(signed_webhook(CHARGE_SUCCESS), configure_with(db, verifier)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn other_webhook_events_are_acknowledged() {
    let _ = env_logger::try_init().ok();
    let mut verifier = MockVerifier::new();
    verifier.expect_check_signature().returning(|_, _| true);
    let body = r#"{"event":"transfer.success","data":{"reference":"TRF-1"}}"#;
    let (status, body) = send_request(signed_webhook(body), configure_with(MockWalletDb::new(), verifier)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true,"message":"Event ignored."}"#);
}

#[actix_web::test]
async fn replayed_webhooks_do_not_credit_twice() {
    let _ = env_logger::try_init().ok();
    let mut verifier = MockVerifier::new();
    verifier.expect_check_signature().returning(|_, _| true);
    verifier.expect_verify().never();
    let mut db = MockWalletDb::new();
    db.expect_fetch_payment_intent().returning(|_| Ok(Some(intent(IntentStatus::Completed))));
    db.expect_complete_intent_with_credit().never();
    let (status, body) = send_request(signed_webhook(CHARGE_SUCCESS), configure_with(db, verifier)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true,"message":"Payment already credited."}"#);
}

#[actix_web::test]
async fn processing_errors_still_return_200() {
    let _ = env_logger::try_init().ok();
    let mut verifier = MockVerifier::new();
    verifier.expect_check_signature().returning(|_, _| true);
    let mut db = MockWalletDb::new();
    db.expect_fetch_payment_intent().returning(|_| Ok(None));
    let (status, body) = send_request(signed_webhook(CHARGE_SUCCESS), configure_with(db, verifier)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":false,"message":"Event could not be processed."}"#);
}

#[actix_web::test]
async fn manual_verify_of_a_settled_payment() {
    let _ = env_logger::try_init().ok();
    let mut db = MockWalletDb::new();
    db.expect_fetch_payment_intent().returning(|_| Ok(Some(intent(IntentStatus::Completed))));
    let req = TestRequest::get().uri("/payment/verify?reference=WAL-REF-0001");
    let (status, body) = send_request(req, configure_with(db, MockVerifier::new())).await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["already_settled"], true);
    assert_eq!(json["credited"], false);
    assert_eq!(json["status"], "completed");
    assert_eq!(json["amount"], 500_000);
}

#[actix_web::test]
async fn manual_verify_of_an_unknown_reference() {
    let _ = env_logger::try_init().ok();
    let mut db = MockWalletDb::new();
    db.expect_fetch_payment_intent().returning(|_| Ok(None));
    let req = TestRequest::get().uri("/payment/verify?reference=NOPE");
    let (status, body) = send_request(req, configure_with(db, MockVerifier::new())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("No payment intent exists for reference NOPE"));
}
