//! # Account Handler Tests

use crate::handlers::test_support::*;
use axum::http::StatusCode;
use lib_auth::verify_password;
use lib_core::model::store::UserRepository;
use serde_json::{json, Value};

fn password_body(old: &str, new: &str, confirm: &str) -> Value {
    json!({ "oldPassword": old, "newPassword": new, "confirmNewPassword": confirm })
}

#[tokio::test]
async fn test_update_profile() {
    let app = TestApp::new().await;
    let cookie = app.signup("alice").await;

    let res = app
        .send(json_request(
            "PUT",
            "/api/account/profile",
            Some(&cookie),
            json!({ "email": "  new@example.com " }),
        ))
        .await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["message"], "Profile updated successfully");

    let user = UserRepository::find_by_username(&app.pool, "alice").await.unwrap().unwrap();
    assert_eq!(user.email, "new@example.com");
}

#[tokio::test]
async fn test_update_profile_keeps_own_email() {
    let app = TestApp::new().await;
    let cookie = app.signup("alice").await;

    let res = app
        .send(json_request(
            "PUT",
            "/api/account/profile",
            Some(&cookie),
            json!({ "email": "alice@example.com" }),
        ))
        .await;

    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_update_profile_rejects_bad_email() {
    let app = TestApp::new().await;
    let cookie = app.signup("alice").await;

    let res = app
        .send(json_request("PUT", "/api/account/profile", Some(&cookie), json!({})))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(res).await["error"], "Email is required");

    let long = format!("{}@example.com", "a".repeat(250));
    let res = app
        .send(json_request(
            "PUT",
            "/api/account/profile",
            Some(&cookie),
            json!({ "email": long }),
        ))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(res).await["error"], "Invalid email");
}

#[tokio::test]
async fn test_update_profile_email_in_use() {
    let app = TestApp::new().await;
    app.signup("bob").await;
    let cookie = app.signup("alice").await;

    let res = app
        .send(json_request(
            "PUT",
            "/api/account/profile",
            Some(&cookie),
            json!({ "email": "bob@example.com" }),
        ))
        .await;

    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(res).await["error"], "Email already in use");
}

#[tokio::test]
async fn test_reset_password() {
    // Arrange
    let app = TestApp::new().await;
    let cookie = app.signup("alice").await;

    // Act
    let res = app
        .send(json_request(
            "POST",
            "/api/account/password",
            Some(&cookie),
            password_body(TEST_PASSWORD, "N3w!passw0rd", "N3w!passw0rd"),
        ))
        .await;

    // Assert
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["message"], "Password reset successfully");

    let user = UserRepository::find_by_username(&app.pool, "alice").await.unwrap().unwrap();
    assert!(verify_password("N3w!passw0rd", &user.password_hash).unwrap());
    assert_eq!(
        UserRepository::password_history_len(&app.pool, &user.id).await.unwrap(),
        2
    );
}

#[tokio::test]
async fn test_reset_password_validation_order() {
    let app = TestApp::new().await;
    let cookie = app.signup("alice").await;

    let cases = [
        (
            password_body(TEST_PASSWORD, "N3w!passw0rd", "N3w!passw0rX"),
            "New passwords do not match",
        ),
        (
            password_body(TEST_PASSWORD, "short", "short"),
            "password must be at least 8 characters",
        ),
        (
            password_body(TEST_PASSWORD, TEST_PASSWORD, TEST_PASSWORD),
            "New password must be different from the old password",
        ),
    ];

    for (body, message) in cases {
        let res = app
            .send(json_request("POST", "/api/account/password", Some(&cookie), body))
            .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(res).await["error"], message);
    }
}

#[tokio::test]
async fn test_reset_password_wrong_old_password() {
    let app = TestApp::new().await;
    let cookie = app.signup("alice").await;

    let res = app
        .send(json_request(
            "POST",
            "/api/account/password",
            Some(&cookie),
            password_body("Wr0ng!pass", "N3w!passw0rd", "N3w!passw0rd"),
        ))
        .await;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(res).await;
    assert_eq!(body["code"], "INVALID_PASSWORD");
    assert_eq!(body["error"], "Current password is incorrect");
}

#[tokio::test]
async fn test_delete_account() {
    // Arrange
    let app = TestApp::new().await;
    let cookie = app.signup("alice").await;

    // Act
    let res = app
        .send(json_request("DELETE", "/api/account", Some(&cookie), json!({})))
        .await;

    // Assert
    assert_eq!(res.status(), StatusCode::OK);
    assert!(set_cookie_header(&res).unwrap().contains("Max-Age=0"));
    assert_eq!(body_json(res).await["message"], "Account deleted");

    let user = UserRepository::find_by_username(&app.pool, "alice").await.unwrap().unwrap();
    assert!(!user.is_active());

    // The old cookie no longer opens a session
    let res = app.send(get_request("/api/auth/me", Some(&cookie))).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(res).await["code"], "USER_INACTIVE");
}
