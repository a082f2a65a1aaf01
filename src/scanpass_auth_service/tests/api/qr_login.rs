use std::time::Duration as StdDuration;

use chrono::Duration;
use scanpass_auth_service::spawn_session_sweeper;
use serde_json::Value;

use crate::helpers::TestApp;

#[tokio::test]
async fn browser_receives_token_after_phone_confirms() {
    let app = TestApp::new().await;
    let generated = app.generate_qr().await;
    let session_id = generated["sessionId"].as_str().unwrap();
    assert!(
        generated["qrCodeImage"]
            .as_str()
            .unwrap()
            .starts_with("data:image/png;base64,")
    );
    let app_token = app.app_token().await;

    let response = app.post_qr_decision("confirm", session_id, &app_token).await;
    assert_eq!(response.status().as_u16(), 204);

    let response = app.get_qr_status(session_id).await;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "confirmed");
    assert_eq!(body["user"]["id"], app.user_id.as_i64());

    let browser_token = body["token"].as_str().unwrap();
    let response = app.post_refresh(Some(browser_token)).await;
    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn two_step_scan_then_confirm() {
    let app = TestApp::new().await;
    let generated = app.generate_qr().await;
    let session_id = generated["sessionId"].as_str().unwrap();
    let app_token = app.app_token().await;

    let response = app.post_qr_decision("scan", session_id, &app_token).await;
    assert_eq!(response.status().as_u16(), 204);

    let body: Value = app.get_qr_status(session_id).await.json().await.unwrap();
    assert_eq!(body["status"], "scanned");
    assert_eq!(body["message"], "QR code scanned, waiting for confirmation");
    assert!(body.get("token").is_none());

    let response = app.post_qr_decision("scan", session_id, &app_token).await;
    assert_eq!(response.status().as_u16(), 400);

    let response = app.post_qr_decision("confirm", session_id, &app_token).await;
    assert_eq!(response.status().as_u16(), 204);

    let body: Value = app.get_qr_status(session_id).await.json().await.unwrap();
    assert_eq!(body["status"], "confirmed");
}

#[tokio::test]
async fn rejected_session_never_yields_a_token() {
    let app = TestApp::new().await;
    let generated = app.generate_qr().await;
    let session_id = generated["sessionId"].as_str().unwrap();
    let app_token = app.app_token().await;

    let response = app.post_qr_decision("reject", session_id, &app_token).await;
    assert_eq!(response.status().as_u16(), 204);

    let response = app.post_qr_decision("confirm", session_id, &app_token).await;
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "INVALID_OR_EXPIRED_SESSION");

    let body: Value = app.get_qr_status(session_id).await.json().await.unwrap();
    assert_eq!(body["status"], "rejected");
    assert!(body.get("token").is_none());
}

#[tokio::test]
async fn session_expires_after_ttl() {
    let app = TestApp::new().await;
    let generated = app.generate_qr().await;
    let session_id = generated["sessionId"].as_str().unwrap();
    let app_token = app.app_token().await;

    app.clock.advance(Duration::minutes(5) + Duration::seconds(1));

    let response = app.post_qr_decision("confirm", session_id, &app_token).await;
    assert_eq!(response.status().as_u16(), 400);

    for _ in 0..2 {
        let body: Value = app.get_qr_status(session_id).await.json().await.unwrap();
        assert_eq!(body["status"], "expired");
    }
}

#[tokio::test]
async fn deactivated_phone_account_cannot_confirm() {
    let app = TestApp::new().await;
    let generated = app.generate_qr().await;
    let session_id = generated["sessionId"].as_str().unwrap();
    let app_token = app.app_token().await;
    app.deactivate_user().await;

    let response = app.post_qr_decision("confirm", session_id, &app_token).await;
    assert_eq!(response.status().as_u16(), 403);

    let body: Value = app.get_qr_status(session_id).await.json().await.unwrap();
    assert_eq!(body["status"], "pending");
}

#[tokio::test]
async fn status_of_unknown_session_is_404() {
    let app = TestApp::new().await;

    let response = app.get_qr_status("kubeUnknownSession0000").await;

    assert_eq!(response.status().as_u16(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "SESSION_NOT_FOUND");
}

#[tokio::test]
async fn sweeper_deletes_expired_sessions() {
    let app = TestApp::new().await;
    let generated = app.generate_qr().await;
    let session_id = generated["sessionId"].as_str().unwrap();
    assert_eq!(app.sessions.len(), 1);

    app.clock.advance(Duration::minutes(10));
    let sweeper = spawn_session_sweeper(app.orchestrator.clone(), StdDuration::from_millis(10));
    for _ in 0..200 {
        if app.sessions.is_empty() {
            break;
        }
        tokio::time::sleep(StdDuration::from_millis(10)).await;
    }
    sweeper.abort();

    assert!(app.sessions.is_empty());
    assert_eq!(app.get_qr_status(session_id).await.status().as_u16(), 404);
}
