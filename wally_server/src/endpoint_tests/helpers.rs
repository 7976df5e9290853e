use actix_web::{
    body::MessageBody,
    http::StatusCode,
    test,
    test::TestRequest,
    web::ServiceConfig,
    App,
};
use chrono::{TimeZone, Utc};
use log::debug;
use wally_common::Kobo;
use wally_engine::db_types::Wallet;

pub const API_TOKEN: &str = "test-token-do-not-reuse";

/// Sends a single request to a fresh app and returns the status and body.
///
/// Middleware failures surface as service errors rather than responses. They are rendered here the way the server
/// would render them, so callers can check status codes uniformly.
pub async fn send_request<F>(req: TestRequest, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => {
            let (_, res) = res.into_parts();
            let status = res.status();
            let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
            (status, body)
        },
        Err(e) => {
            let res = e.error_response();
            let status = res.status();
            let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
            (status, body)
        },
    }
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {token}"))
}

pub fn wallet(user_id: i64, naira: i64) -> Wallet {
    Wallet {
        id: user_id + 100,
        user_id,
        balance: Kobo::from_naira(naira),
        currency: "NGN".to_string(),
        updated_at: Utc.with_ymd_and_hms(2024, 10, 1, 12, 0, 0).unwrap(),
    }
}
