use actix_web::{http::StatusCode, test, test::TestRequest, web, App};
use serde_json::{json, Value};
use wally_engine::conversation::ConversationGuard;

use crate::routes::{enter_dialog, leave_dialog, submit_dialog_input};

macro_rules! call {
    ($app:expr, $req:expr) => {{
        let res = test::call_service($app, $req.to_request()).await;
        let status = res.status();
        let body: Value = test::read_body_json(res).await;
        (status, body)
    }};
}

#[actix_web::test]
async fn airtime_dialog() {
    let _ = env_logger::try_init().ok();
    let guard = web::Data::new(ConversationGuard::default());
    let app = test::init_service(
        App::new().app_data(guard.clone()).service(enter_dialog).service(submit_dialog_input).service(leave_dialog),
    )
    .await;

    let (status, body) = call!(&app, TestRequest::post().uri("/conversation/4001/buy_airtime"));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "next_step");
    assert_eq!(body["step"], "Phone");

    // A second tap on the same button while the dialog is open
    let (status, _) = call!(&app, TestRequest::post().uri("/conversation/4001/buy_airtime"));
    assert_eq!(status, StatusCode::CONFLICT);

    let input = TestRequest::post().uri("/conversation/4001/buy_airtime/input").set_json(json!({"input": "08031234567"}));
    let (status, body) = call!(&app, input);
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["step"]["Amount"]["minimum"], 5_000);

    let input = TestRequest::post().uri("/conversation/4001/buy_airtime/input").set_json(json!({"input": "500"}));
    let (status, body) = call!(&app, input);
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "complete");
    assert_eq!(body["values"][0]["Phone"], "08031234567");
    assert_eq!(body["values"][1]["Amount"], 50_000);
    assert!(guard.is_empty());
}

#[actix_web::test]
async fn invalid_input_ends_the_dialog() {
    let _ = env_logger::try_init().ok();
    let guard = web::Data::new(ConversationGuard::default());
    let app = test::init_service(
        App::new().app_data(guard.clone()).service(enter_dialog).service(submit_dialog_input).service(leave_dialog),
    )
    .await;

    let (status, _) = call!(&app, TestRequest::post().uri("/conversation/4001/share_airtime"));
    assert_eq!(status, StatusCode::OK);
    let input = TestRequest::post().uri("/conversation/4001/share_airtime/input").set_json(json!({"input": "12345"}));
    let (status, body) = call!(&app, input);
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().ends_with("Please start again."));
    // No retry of a failed step
    let input = TestRequest::post().uri("/conversation/4001/share_airtime/input").set_json(json!({"input": "08031234567"}));
    let (status, _) = call!(&app, input);
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(guard.is_empty());
}

#[actix_web::test]
async fn leaving_a_dialog() {
    let _ = env_logger::try_init().ok();
    let guard = web::Data::new(ConversationGuard::default());
    let app = test::init_service(App::new().app_data(guard.clone()).service(enter_dialog).service(leave_dialog)).await;

    call!(&app, TestRequest::post().uri("/conversation/4001/fund_wallet"));
    assert_eq!(guard.len(), 1);
    let (status, body) = call!(&app, TestRequest::delete().uri("/conversation/4001/fund_wallet"));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "message": "The fund wallet request was cancelled."}));
    let (_, body) = call!(&app, TestRequest::delete().uri("/conversation/4001/fund_wallet"));
    assert_eq!(body["success"], false);
    assert!(guard.is_empty());
}
