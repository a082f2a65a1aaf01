use serde_json::{Value, json};

use crate::helpers::{EMAIL, PASSWORD, TestApp};

#[tokio::test]
async fn should_return_200_with_token_and_profile() {
    let app = TestApp::new().await;

    let response = app
        .post_login(&json!({ "email": EMAIL, "password": PASSWORD }))
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["user"]["email"], EMAIL);
    assert_eq!(body["user"]["username"], "phone-owner");
    assert_eq!(body["token"].as_str().unwrap().split('.').count(), 3);
}

#[tokio::test]
async fn should_return_401_for_bad_credentials() {
    let app = TestApp::new().await;

    let test_cases = [
        json!({ "email": EMAIL, "password": "wrong password" }),
        json!({ "email": "nobody@example.com", "password": PASSWORD }),
        json!({ "email": EMAIL, "password": "short" }),
    ];

    for test_case in test_cases {
        let response = app.post_login(&test_case).await;
        assert_eq!(
            response.status().as_u16(),
            401,
            "Failed for input: {:?}",
            test_case
        );
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["code"], "INVALID_CREDENTIALS");
    }
}

#[tokio::test]
async fn should_return_400_for_malformed_input() {
    let app = TestApp::new().await;

    let test_cases = [
        json!({ "email": EMAIL }),
        json!({ "password": PASSWORD }),
        json!({ "email": "not-an-email", "password": PASSWORD }),
    ];

    for test_case in test_cases {
        let response = app.post_login(&test_case).await;
        assert_eq!(
            response.status().as_u16(),
            400,
            "Failed for input: {:?}",
            test_case
        );
    }
}

#[tokio::test]
async fn should_return_403_for_deactivated_account() {
    let app = TestApp::new().await;
    app.deactivate_user().await;

    let response = app
        .post_login(&json!({ "email": EMAIL, "password": PASSWORD }))
        .await;

    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
async fn refresh_issues_a_new_token_for_the_bearer() {
    let app = TestApp::new().await;
    let token = app.app_token().await;

    let response = app.post_refresh(Some(&token)).await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["user"]["id"], app.user_id.as_i64());
}

#[tokio::test]
async fn refresh_without_bearer_is_unauthorized() {
    let app = TestApp::new().await;

    let response = app.post_refresh(None).await;

    assert_eq!(response.status().as_u16(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn change_password_then_logout() {
    let app = TestApp::new().await;
    let token = app.app_token().await;

    let response = app
        .post_change_password(
            &token,
            &json!({ "currentPassword": PASSWORD, "newPassword": "a much better secret" }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 204);

    let response = app
        .post_login(&json!({ "email": EMAIL, "password": PASSWORD }))
        .await;
    assert_eq!(response.status().as_u16(), 401);

    let response = app.post_logout(&token).await;
    assert_eq!(response.status().as_u16(), 204);
}
