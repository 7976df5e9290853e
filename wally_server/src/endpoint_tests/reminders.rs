use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use serde_json::json;
use wally_common::Kobo;
use wally_engine::{
    db_types::{Reminder, ReminderType},
    ReminderApi,
    ReminderError,
};

use super::{
    helpers::send_request,
    mocks::{MockChatNotifier, MockWalletDb},
};
use crate::routes::{LowBalanceScanRoute, MilestoneScanRoute, ReminderSettingsRoute, UpdateReminderSettingsRoute};

fn configure_with(db: MockWalletDb) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        let mut notifier = MockChatNotifier::new();
        notifier.expect_send().never();
        let api = ReminderApi::new(db, notifier);
        cfg.service(ReminderSettingsRoute::<MockWalletDb, MockChatNotifier>::new())
            .service(UpdateReminderSettingsRoute::<MockWalletDb, MockChatNotifier>::new())
            .service(LowBalanceScanRoute::<MockWalletDb, MockChatNotifier>::new())
            .service(MilestoneScanRoute::<MockWalletDb, MockChatNotifier>::new())
            .app_data(web::Data::new(api));
    }
}

fn low_balance_reminder(threshold: Kobo, is_active: bool) -> Reminder {
    Reminder {
        id: 3,
        user_id: 7,
        reminder_type: ReminderType::LowBalance,
        threshold,
        is_active,
        last_sent_at: None,
        ack_tx_count: 0,
        ack_spend: Kobo::default(),
    }
}

#[actix_web::test]
async fn update_low_balance_threshold() {
    let _ = env_logger::try_init().ok();
    let mut db = MockWalletDb::new();
    db.expect_update_reminder_settings()
        .withf(|user_id, rt, threshold, is_active| {
            *user_id == 7 &&
                *rt == ReminderType::LowBalance &&
                *threshold == Some(Kobo::from_naira(2_000)) &&
                is_active.is_none()
        })
        .returning(|_, _, threshold, _| Ok(low_balance_reminder(threshold.unwrap_or_default(), true)));
    let req = TestRequest::put().uri("/reminders/7/low_balance").set_json(json!({"threshold": 200_000}));
    let (status, body) = send_request(req, configure_with(db)).await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["threshold"], 200_000);
    assert_eq!(json["reminder_type"], "low_balance");
}

#[actix_web::test]
async fn negative_thresholds_are_refused() {
    let _ = env_logger::try_init().ok();
    let mut db = MockWalletDb::new();
    db.expect_update_reminder_settings().never();
    let req = TestRequest::put().uri("/reminders/7/low_balance").set_json(json!({"threshold": -100}));
    let (status, body) = send_request(req, configure_with(db)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("The threshold cannot be negative"));
}

#[actix_web::test]
async fn missing_reminder() {
    let _ = env_logger::try_init().ok();
    let mut db = MockWalletDb::new();
    db.expect_fetch_reminder().returning(|_, _| Ok(None));
    let req = TestRequest::get().uri("/reminders/7/milestone");
    let (status, body) = send_request(req, configure_with(db)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("User 7 has no milestone reminder"));
}

#[actix_web::test]
async fn unknown_reminder_types_are_bad_paths() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::get().uri("/reminders/7/weekly_digest");
    let (status, _) = send_request(req, configure_with(MockWalletDb::new())).await;
    assert!(status.is_client_error());
}

#[actix_web::test]
async fn scheduled_scans() {
    let _ = env_logger::try_init().ok();
    let mut db = MockWalletDb::new();
    db.expect_fetch_low_balance_candidates().times(1).returning(|| Ok(vec![]));
    let req = TestRequest::post().uri("/scheduler/low_balance");
    let (status, body) = send_request(req, configure_with(db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"examined":0,"notified":0,"skipped":0,"errors":0}"#);

    let mut db = MockWalletDb::new();
    db.expect_fetch_milestone_candidates().returning(|| Err(ReminderError::DatabaseError("no such table".into())));
    let req = TestRequest::post().uri("/scheduler/milestones");
    let (status, body) = send_request(req, configure_with(db)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body.contains("no such table"));
}
