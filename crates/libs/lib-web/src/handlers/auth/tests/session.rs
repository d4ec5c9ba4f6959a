//! # Session Tests
//!
//! Cookie-authenticated routes: `me`, logout and security questions.

use super::*;
use lib_auth::{generate_jwt, verify_password};
use lib_core::model::store::UserRepository;

fn questions(answers: [&str; 3]) -> serde_json::Value {
    json!({
        "questions": [
            { "question": "First pet?", "answer": answers[0] },
            { "question": "Birth city?", "answer": answers[1] },
            { "question": "Favorite <b>pet</b>?", "answer": answers[2] }
        ]
    })
}

#[tokio::test]
async fn test_me_returns_current_user() {
    let app = TestApp::new().await;
    let cookie = app.signup("alice").await;

    let res = app.send(get_request("/api/auth/me", Some(&cookie))).await;

    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["username"], "alice");
    assert_eq!(body["email"], "alice@example.com");
    assert_eq!(body["securityQuestionsAnswered"], false);
    assert_eq!(body["inactiveAt"], serde_json::Value::Null);
    assert!(body.get("passwordHash").is_none());
}

#[tokio::test]
async fn test_me_without_cookie() {
    let app = TestApp::new().await;

    let res = app.send(get_request("/api/auth/me", None)).await;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(res).await;
    assert_eq!(body["code"], "UNAUTHORIZED");
    assert_eq!(body["ok"], false);
}

#[tokio::test]
async fn test_me_with_tampered_token() {
    let app = TestApp::new().await;
    let cookie = app.signup("alice").await;

    let res = app
        .send(get_request("/api/auth/me", Some(&format!("{cookie}x"))))
        .await;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(res).await["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn test_me_for_unknown_user() {
    let app = TestApp::new().await;
    let token = generate_jwt(
        "missing-user",
        &test_config().session_secret,
        chrono::Duration::hours(1),
    )
    .unwrap();

    let res = app
        .send(get_request("/api/auth/me", Some(&format!("jwt={token}"))))
        .await;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(res).await["code"], "USER_NOT_FOUND");
}

#[tokio::test]
async fn test_me_for_deleted_user() {
    let app = TestApp::new().await;
    let cookie = app.signup("alice").await;
    let user_id = app.user_id("alice").await;
    UserRepository::soft_delete(&app.pool, &user_id).await.unwrap();

    let res = app.send(get_request("/api/auth/me", Some(&cookie))).await;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(res).await["code"], "USER_INACTIVE");
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let app = TestApp::new().await;

    let res = app
        .send(json_request("POST", "/api/auth/logout", None, json!({})))
        .await;

    assert_eq!(res.status(), StatusCode::OK);
    let cookie = set_cookie_header(&res).unwrap();
    assert!(cookie.starts_with("jwt=;"));
    assert!(cookie.contains("Max-Age=0"));
    assert_eq!(body_json(res).await["message"], "Logged out successfully");
}

#[tokio::test]
async fn test_security_questions_saved_once() {
    // Arrange
    let app = TestApp::new().await;
    let cookie = app.signup("alice").await;

    // Act
    let res = app
        .send(json_request(
            "POST",
            "/api/auth/security-questions",
            Some(&cookie),
            questions(["  Rex ", "Paris", "Ms Smith"]),
        ))
        .await;

    // Assert
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["ok"], true);

    let user_id = app.user_id("alice").await;
    let user = UserRepository::find_by_id(&app.pool, &user_id).await.unwrap().unwrap();
    assert!(user.security_questions_answered);

    let (question3, answer1): (String, String) = sqlx::query_as(
        "SELECT question_3, answer_1 FROM security_questions WHERE user_id = ?",
    )
    .bind(&user_id)
    .fetch_one(&app.pool)
    .await
    .unwrap();
    assert_eq!(question3, "Favorite &lt;b&gt;pet&lt;/b&gt;?");
    assert!(verify_password("rex", &answer1).unwrap());

    let again = app
        .send(json_request(
            "POST",
            "/api/auth/security-questions",
            Some(&cookie),
            questions(["a", "b", "c"]),
        ))
        .await;
    assert_eq!(again.status(), StatusCode::CONFLICT);
    assert_eq!(
        body_json(again).await["error"],
        "Security questions already answered"
    );
}

#[tokio::test]
async fn test_security_questions_need_three_answers() {
    let app = TestApp::new().await;
    let cookie = app.signup("alice").await;

    let two = json!({
        "questions": [
            { "question": "First pet?", "answer": "Rex" },
            { "question": "Birth city?", "answer": "Paris" }
        ]
    });
    let res = app
        .send(json_request("POST", "/api/auth/security-questions", Some(&cookie), two))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app
        .send(json_request(
            "POST",
            "/api/auth/security-questions",
            Some(&cookie),
            questions(["Rex", "   ", "Ms Smith"]),
        ))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let user_id = app.user_id("alice").await;
    let user = UserRepository::find_by_id(&app.pool, &user_id).await.unwrap().unwrap();
    assert!(!user.security_questions_answered);
}
