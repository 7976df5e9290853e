use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use serde_json::json;
use wally_engine::{
    db_types::{Beneficiary, Network, User},
    BeneficiaryApi,
    BeneficiaryError,
};

use super::{helpers::send_request, mocks::MockWalletDb};
use crate::routes::{
    AddBeneficiaryRoute,
    BeneficiariesRoute,
    BeneficiaryByPhoneRoute,
    DeleteBeneficiaryRoute,
    UpdateBeneficiaryRoute,
};

fn configure_with(db: MockWalletDb) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        let api = BeneficiaryApi::new(db);
        cfg.service(BeneficiariesRoute::<MockWalletDb>::new())
            .service(AddBeneficiaryRoute::<MockWalletDb>::new())
            .service(BeneficiaryByPhoneRoute::<MockWalletDb>::new())
            .service(UpdateBeneficiaryRoute::<MockWalletDb>::new())
            .service(DeleteBeneficiaryRoute::<MockWalletDb>::new())
            .app_data(web::Data::new(api));
    }
}

fn user() -> User {
    let created_at = Utc.with_ymd_and_hms(2024, 10, 1, 12, 0, 0).unwrap();
    User { id: 7, chat_id: "4001".into(), full_name: "Ada Obi".into(), email: None, created_at, updated_at: created_at }
}

fn mum() -> Beneficiary {
    let created_at = Utc.with_ymd_and_hms(2024, 10, 2, 9, 30, 0).unwrap();
    Beneficiary {
        id: 11,
        user_id: 7,
        name: "Mum".into(),
        phone_number: "08031234567".into(),
        network: Network::Mtn,
        created_at,
        updated_at: created_at,
    }
}

#[actix_web::test]
async fn add_beneficiary() {
    let _ = env_logger::try_init().ok();
    let mut db = MockWalletDb::new();
    db.expect_fetch_user().returning(|_| Ok(Some(user())));
    db.expect_insert_beneficiary()
        .withf(|b| b.user_id == 7 && b.name == "Mum" && b.phone_number == "08031234567" && b.network == Network::Mtn)
        .times(1)
        .returning(|_| Ok(mum()));
    let body = json!({"name": " Mum ", "phone_number": "803 123 4567", "network": "MTN"});
    let req = TestRequest::post().uri("/beneficiaries/7").set_json(body);
    let (status, body) = send_request(req, configure_with(db)).await;
    assert_eq!(status, StatusCode::CREATED);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["id"], 11);
    assert_eq!(json["network"], "mtn");
}

#[actix_web::test]
async fn duplicate_beneficiaries_conflict() {
    let _ = env_logger::try_init().ok();
    let mut db = MockWalletDb::new();
    db.expect_fetch_user().returning(|_| Ok(Some(user())));
    db.expect_insert_beneficiary().returning(|b| Err(BeneficiaryError::AlreadyExists(b.phone_number)));
    let body = json!({"name": "Mum", "phone_number": "08031234567", "network": "mtn"});
    let req = TestRequest::post().uri("/beneficiaries/7").set_json(body);
    let (status, body) = send_request(req, configure_with(db)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("08031234567 is already saved as a beneficiary"));
}

#[actix_web::test]
async fn unknown_networks_are_refused() {
    let _ = env_logger::try_init().ok();
    let mut db = MockWalletDb::new();
    db.expect_insert_beneficiary().never();
    let body = json!({"name": "Mum", "phone_number": "08031234567", "network": "Visafone"});
    let req = TestRequest::post().uri("/beneficiaries/7").set_json(body);
    let (status, body) = send_request(req, configure_with(db)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Invalid network"));
}

#[actix_web::test]
async fn list_and_look_up_by_phone() {
    let _ = env_logger::try_init().ok();
    let mut db = MockWalletDb::new();
    db.expect_fetch_beneficiaries().withf(|user_id| *user_id == 7).returning(|_| Ok(vec![mum()]));
    let req = TestRequest::get().uri("/beneficiaries/7");
    let (status, body) = send_request(req, configure_with(db)).await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json[0]["name"], "Mum");

    let mut db = MockWalletDb::new();
    db.expect_fetch_beneficiary_by_phone()
        .withf(|user_id, phone| *user_id == 7 && phone == "08031234567")
        .returning(|_, _| Ok(Some(mum())));
    let req = TestRequest::get().uri("/beneficiaries/7/by_phone/8031234567");
    let (status, body) = send_request(req, configure_with(db)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"phone_number\":\"08031234567\""));

    let mut db = MockWalletDb::new();
    db.expect_fetch_beneficiary_by_phone().returning(|_, _| Ok(None));
    let req = TestRequest::get().uri("/beneficiaries/7/by_phone/09031234567");
    let (status, _) = send_request(req, configure_with(db)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn update_and_delete() {
    let _ = env_logger::try_init().ok();
    let mut db = MockWalletDb::new();
    db.expect_update_beneficiary()
        .withf(|user_id, id, u| {
            *user_id == 7 && *id == 11 && u.name.is_none() && u.phone_number.is_none() && u.network == Some(Network::Glo)
        })
        .returning(|_, _, _| Ok(Some(Beneficiary { network: Network::Glo, ..mum() })));
    let req = TestRequest::put().uri("/beneficiaries/7/11").set_json(json!({"network": "Glo"}));
    let (status, body) = send_request(req, configure_with(db)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"network\":\"glo\""));

    let mut db = MockWalletDb::new();
    db.expect_delete_beneficiary().returning(|_, id| Ok(id == 11));
    let req = TestRequest::delete().uri("/beneficiaries/7/12");
    let (status, body) = send_request(req, configure_with(db)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("User 7 has no beneficiary #12"));
}
