use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use wally_common::Secret;
use wally_engine::{db_types::User, LedgerApi};

use super::{
    helpers::{bearer, send_request, wallet, API_TOKEN},
    mocks::MockWalletDb,
};
use crate::{
    middleware::ApiTokenMiddlewareFactory,
    routes::{BalanceRoute, CreateUserRoute, HistoryRoute, UserByChatIdRoute},
};

fn configure_with(db: MockWalletDb) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        cfg.service(
            web::scope("/api")
                .wrap(ApiTokenMiddlewareFactory::new(Secret::new(API_TOKEN.to_string())))
                .service(BalanceRoute::<MockWalletDb>::new())
                .service(HistoryRoute::<MockWalletDb>::new())
                .service(CreateUserRoute::<MockWalletDb>::new())
                .service(UserByChatIdRoute::<MockWalletDb>::new()),
        )
        .app_data(web::Data::new(LedgerApi::new(db)));
    }
}

fn user() -> User {
    let created_at = Utc.with_ymd_and_hms(2024, 10, 1, 12, 0, 0).unwrap();
    User {
        id: 7,
        chat_id: "4001".into(),
        full_name: "Ada Obi".into(),
        email: None,
        created_at,
        updated_at: created_at,
    }
}

#[actix_web::test]
async fn api_routes_need_a_token() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::get().uri("/api/wallet/7");
    let (status, body) = send_request(req, configure_with(MockWalletDb::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"error":"Authentication Error. An API token is required."}"#);

    let req = TestRequest::get().uri("/api/wallet/7").insert_header(bearer("not-the-token"));
    let (status, body) = send_request(req, configure_with(MockWalletDb::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"error":"Authentication Error. Invalid API token."}"#);
}

#[actix_web::test]
async fn fetch_balance() {
    let _ = env_logger::try_init().ok();
    let mut db = MockWalletDb::new();
    db.expect_fetch_wallet().withf(|user_id| *user_id == 7).returning(|_| Ok(Some(wallet(7, 1_500))));
    let req = TestRequest::get().uri("/api/wallet/7").insert_header(bearer(API_TOKEN));
    let (status, body) = send_request(req, configure_with(db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"user_id":7,"balance":150000,"display":"₦1500.00","currency":"NGN"}"#);
}

#[actix_web::test]
async fn fetch_balance_for_unknown_user() {
    let _ = env_logger::try_init().ok();
    let mut db = MockWalletDb::new();
    db.expect_fetch_wallet().returning(|_| Ok(None));
    let req = TestRequest::get().uri("/api/wallet/99").insert_header(bearer(API_TOKEN));
    let (status, body) = send_request(req, configure_with(db)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("There is no wallet for user id 99"));
}

#[actix_web::test]
async fn history_limit_is_capped() {
    let _ = env_logger::try_init().ok();
    let mut db = MockWalletDb::new();
    db.expect_fetch_history().withf(|user_id, limit| *user_id == 7 && *limit == 100).times(1).returning(|_, _| Ok(vec![]));
    let req = TestRequest::get().uri("/api/wallet/7/history?limit=5000").insert_header(bearer(API_TOKEN));
    let (status, body) = send_request(req, configure_with(db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "[]");
}

#[actix_web::test]
async fn backend_failures_are_not_leaked() {
    let _ = env_logger::try_init().ok();
    let mut db = MockWalletDb::new();
    db.expect_fetch_history()
        .withf(|_, limit| *limit == 10)
        .returning(|_, _| Err(wally_engine::LedgerError::DatabaseError("disk I/O error at /var/lib/wally".into())));
    let req = TestRequest::get().uri("/api/wallet/7/history").insert_header(bearer(API_TOKEN));
    let (status, body) = send_request(req, configure_with(db)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body.contains("/var/lib/wally"));
    assert_eq!(body, r#"{"error":"An internal error occurred. Please try again later."}"#);
}

#[actix_web::test]
async fn register_and_look_up_users() {
    let _ = env_logger::try_init().ok();
    let mut db = MockWalletDb::new();
    db.expect_create_user().returning(|_| Ok(user()));
    let req = TestRequest::post()
        .uri("/api/users")
        .insert_header(bearer(API_TOKEN))
        .set_json(serde_json::json!({"chat_id": "4001", "full_name": "Ada Obi", "email": null}));
    let (status, body) = send_request(req, configure_with(db)).await;
    assert_eq!(status, StatusCode::CREATED);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["id"], 7);

    let mut db = MockWalletDb::new();
    db.expect_fetch_user_by_chat_id().returning(|_| Ok(None));
    let req = TestRequest::get().uri("/api/users/5005").insert_header(bearer(API_TOKEN));
    let (status, body) = send_request(req, configure_with(db)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("No user is registered for chat 5005"));
}
