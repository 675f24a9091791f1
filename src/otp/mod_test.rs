//! Tests for OTP issue and verification.

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::post};
use chrono::Duration;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::db::{
    AdminUser, AdminUserRepository, Database, OtpRepository, OtpVerification, SqliteDatabase,
    utils::timestamp_after,
};
use crate::otp::{MAX_ATTEMPTS, OtpDelivery, OtpError, OtpService, generate_code};

const MOBILE: &str = "+919812345678";

fn init_crypto() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}

async fn setup(webhook_url: Option<String>) -> (Arc<SqliteDatabase>, OtpService<SqliteDatabase>) {
    init_crypto();
    let db = SqliteDatabase::in_memory().await.unwrap();
    db.migrate().await.unwrap();
    db.admin_users()
        .create(&AdminUser {
            id: String::new(),
            name: "Priya".to_string(),
            email: None,
            mobile: MOBILE.to_string(),
            role: String::new(),
            created_at: String::new(),
        })
        .await
        .unwrap();
    let db = Arc::new(db);
    let delivery = OtpDelivery::new(reqwest::Client::new(), webhook_url);
    (Arc::clone(&db), OtpService::new(db, delivery))
}

async fn pending_code(db: &SqliteDatabase) -> String {
    db.otps().latest_pending(MOBILE).await.unwrap().unwrap().otp
}

#[test]
fn generated_codes_are_four_digits() {
    for _ in 0..200 {
        let code = generate_code();
        assert_eq!(code.len(), 4);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn send_rejects_unknown_mobile() {
    let (_db, service) = setup(None).await;

    let err = service.send("+910000000000").await.unwrap_err();
    assert!(matches!(err, OtpError::UnknownMobile { .. }));
}

#[tokio::test(flavor = "multi_thread")]
async fn send_then_verify_issues_session() {
    let (db, service) = setup(None).await;

    let issued = service.send(MOBILE).await.unwrap();
    assert_eq!(issued.mobile, MOBILE);

    let code = pending_code(&db).await;
    let login = service.verify(MOBILE, &code).await.unwrap();

    assert_eq!(login.user.name, "Priya");
    assert_eq!(login.session.mobile, MOBILE);
    assert!(login.session.expires_at > login.session.issued_at);

    // The code is spent.
    assert!(db.otps().latest_pending(MOBILE).await.unwrap().is_none());
    assert!(matches!(
        service.verify(MOBILE, &code).await.unwrap_err(),
        OtpError::NotRequested
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn verify_without_request() {
    let (_db, service) = setup(None).await;

    assert!(matches!(
        service.verify(MOBILE, "1234").await.unwrap_err(),
        OtpError::NotRequested
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn expired_code_fails_even_when_correct() {
    let (db, service) = setup(None).await;
    db.otps()
        .create(&OtpVerification {
            id: String::new(),
            mobile: MOBILE.to_string(),
            otp: "4321".to_string(),
            expires_at: timestamp_after(Duration::minutes(-1)),
            verified: false,
            attempts: 0,
            created_at: String::new(),
        })
        .await
        .unwrap();

    let err = service.verify(MOBILE, "4321").await.unwrap_err();
    assert!(matches!(err, OtpError::Expired));
    assert_eq!(err.to_string(), "OTP expired");
}

#[tokio::test(flavor = "multi_thread")]
async fn wrong_guesses_lock_the_code() {
    let (db, service) = setup(None).await;
    service.send(MOBILE).await.unwrap();
    let code = pending_code(&db).await;
    let wrong = if code == "0000" { "1111" } else { "0000" };

    for _ in 0..MAX_ATTEMPTS {
        let err = service.verify(MOBILE, wrong).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid OTP");
    }

    let otp = db.otps().latest_pending(MOBILE).await.unwrap().unwrap();
    assert_eq!(otp.attempts, MAX_ATTEMPTS);

    // Locked now, even for the right code.
    assert!(matches!(
        service.verify(MOBILE, &code).await.unwrap_err(),
        OtpError::TooManyAttempts
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn newest_code_wins() {
    let (db, service) = setup(None).await;
    db.otps()
        .create(&OtpVerification {
            id: String::new(),
            mobile: MOBILE.to_string(),
            otp: "1111".to_string(),
            expires_at: timestamp_after(Duration::minutes(5)),
            verified: false,
            attempts: 0,
            created_at: String::new(),
        })
        .await
        .unwrap();
    service.send(MOBILE).await.unwrap();
    let newest = pending_code(&db).await;

    assert!(service.verify(MOBILE, &newest).await.is_ok());
}

#[tokio::test(flavor = "multi_thread")]
async fn code_is_posted_to_webhook() {
    let received: Arc<Mutex<Vec<Value>>> = Arc::default();

    async fn hook(State(received): State<Arc<Mutex<Vec<Value>>>>, Json(body): Json<Value>) {
        received.lock().await.push(body);
    }

    let app = Router::new()
        .route("/otp", post(hook))
        .with_state(Arc::clone(&received));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let (db, service) = setup(Some(format!("http://{}/otp", addr))).await;
    service.send(MOBILE).await.unwrap();

    let received = received.lock().await;
    assert_eq!(received.len(), 1);
    assert_eq!(received[0]["mobile"], MOBILE);
    assert_eq!(received[0]["otp"], pending_code(&db).await);
}

#[tokio::test(flavor = "multi_thread")]
async fn delivery_failure_still_issues_code() {
    let (db, service) = setup(Some("http://127.0.0.1:9/otp".to_string())).await;

    service.send(MOBILE).await.expect("send succeeds despite delivery failure");
    assert!(db.otps().latest_pending(MOBILE).await.unwrap().is_some());
}
