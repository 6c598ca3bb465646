use serde_json::json;

use crate::common::{ADMIN_EMAIL, ADMIN_PASSWORD, TestApp, routes};

#[tokio::test]
async fn seeded_admin_can_log_in() {
    let app = TestApp::spawn().await;

    let res = app
        .post_without_token(
            routes::LOGIN,
            &json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }),
        )
        .await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert!(res.body["token"].as_str().is_some());
    assert_eq!(res.body["user"]["role"], "ADMIN");
    assert_eq!(res.body["user"]["name"], "Administrador");
    assert!(res.body["user"].get("password").is_none());
}

#[tokio::test]
async fn email_is_case_insensitive() {
    let app = TestApp::spawn().await;
    let token = app.login("Admin@Example.com", ADMIN_PASSWORD).await;
    assert!(!token.is_empty());
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let app = TestApp::spawn().await;

    let res = app
        .post_without_token(
            routes::LOGIN,
            &json!({ "email": ADMIN_EMAIL, "password": "nope-nope" }),
        )
        .await;

    assert_eq!(res.status, 401);
    assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn unknown_email_is_rejected_the_same_way() {
    let app = TestApp::spawn().await;

    let res = app
        .post_without_token(
            routes::LOGIN,
            &json!({ "email": "ghost@example.com", "password": ADMIN_PASSWORD }),
        )
        .await;

    assert_eq!(res.status, 401);
    assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn malformed_body_is_validation_error() {
    let app = TestApp::spawn().await;

    let res = app
        .post_without_token(routes::LOGIN, &json!({ "email": ADMIN_EMAIL }))
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn me_returns_current_user() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    let (id, token) = app.create_user(&admin, "Ana Tester", "TESTER").await;

    let res = app.get_with_token(routes::ME, &token).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["id"], id.as_str());
    assert_eq!(res.body["role"], "TESTER");
}

#[tokio::test]
async fn missing_and_invalid_tokens_are_distinguished() {
    let app = TestApp::spawn().await;

    let missing = app.get_without_token(routes::ME).await;
    assert_eq!(missing.status, 401);
    assert_eq!(missing.body["code"], "TOKEN_MISSING");

    let invalid = app.get_with_token(routes::ME, "not-a-jwt").await;
    assert_eq!(invalid.status, 401);
    assert_eq!(invalid.body["code"], "TOKEN_INVALID");
}
