mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{Duration, Utc};
use common::TestApp;

#[tokio::test]
async fn correct_token_confirms_exactly_once() {
    let t = TestApp::spawn().await;
    t.register("bob", "bob@example.com", "pw-123456").await;
    let (user_id, token) = t.last_confirmation();

    let resp = t.confirm(&user_id, &token).await;
    assert_eq!(resp.status, StatusCode::OK, "{}", resp.body);
    assert_eq!(resp.json()["message"], "Email successfully confirmed");

    let remaining = t
        .count(
            "SELECT COUNT(*) FROM email_verifications WHERE user_id = ?",
            &user_id,
        )
        .await;
    assert_eq!(remaining, 0);

    let again = t.confirm(&user_id, &token).await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
    assert_eq!(again.code(), "TOKEN_NOT_FOUND");
}

#[tokio::test]
async fn expired_token_is_rejected_and_user_stays_unconfirmed() {
    let t = TestApp::spawn().await;
    t.register("bob", "bob@example.com", "pw-123456").await;
    let (user_id, token) = t.last_confirmation();

    sqlx::query("UPDATE email_verifications SET expires_at = ? WHERE user_id = ?")
        .bind(Utc::now() - Duration::minutes(1))
        .bind(&user_id)
        .execute(t.storage.pool())
        .await
        .expect("expire token");

    let resp = t.confirm(&user_id, &token).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.code(), "TOKEN_EXPIRED");

    let login = t.login("bob", "pw-123456").await;
    assert_eq!(login.status, StatusCode::FORBIDDEN);
    assert_eq!(login.code(), "EMAIL_NOT_CONFIRMED");
}

#[tokio::test]
async fn input_checks_run_in_order() {
    let t = TestApp::spawn().await;

    let resp = t.confirm("not-a-uuid", "abc").await;
    assert_eq!(resp.code(), "INVALID_USER_ID");

    let unknown = "6f1c1c2e-1a2b-4c3d-8e9f-0a1b2c3d4e5f";
    let resp = t
        .request(
            "GET",
            &format!("/api/v1/user/{unknown}/confirm-email"),
            None,
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.code(), "INVALID_INPUT");
    assert_eq!(resp.json()["message"], "Token is required");

    let resp = t.confirm(unknown, "").await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.code(), "INVALID_INPUT");
    assert_eq!(resp.json()["message"], "Token is required");

    let resp = t.confirm(unknown, "%20").await;
    assert_eq!(resp.code(), "INVALID_TOKEN");
    assert_eq!(resp.json()["message"], "Token cannot be empty");

    let resp = t.confirm(unknown, "abc").await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.code(), "USER_NOT_FOUND");
}

#[tokio::test]
async fn wrong_token_is_invalid() {
    let t = TestApp::spawn().await;
    t.register("bob", "bob@example.com", "pw-123456").await;
    let (user_id, _) = t.last_confirmation();

    let resp = t.confirm(&user_id, "definitely-wrong").await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.code(), "INVALID_TOKEN");
}

#[tokio::test]
async fn browsers_receive_html_page() {
    let t = TestApp::spawn().await;
    t.register("bob", "bob@example.com", "pw-123456").await;
    let (user_id, token) = t.last_confirmation();

    let resp = t
        .send(
            Request::builder()
                .uri(format!(
                    "/api/v1/user/{user_id}/confirm-email?token={token}"
                ))
                .header("accept", "text/html,application/xhtml+xml;q=0.9")
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(
        resp.content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("text/html"))
    );
    assert!(resp.body.contains("Account confirmed"));
}

#[tokio::test]
async fn unacceptable_type_leaves_token_usable() {
    let t = TestApp::spawn().await;
    t.register("bob", "bob@example.com", "pw-123456").await;
    let (user_id, token) = t.last_confirmation();

    let resp = t
        .send(
            Request::builder()
                .uri(format!(
                    "/api/v1/user/{user_id}/confirm-email?token={token}"
                ))
                .header("accept", "image/png")
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await;
    assert_eq!(resp.status, StatusCode::NOT_ACCEPTABLE);
    assert_eq!(resp.code(), "NOT_ACCEPTABLE");

    let resp = t.confirm(&user_id, &token).await;
    assert_eq!(resp.status, StatusCode::OK);
}

#[tokio::test]
async fn sweeper_purges_only_expired_tokens() {
    let t = TestApp::spawn().await;
    t.register("bob", "bob@example.com", "pw-123456").await;
    t.register("carol", "carol@example.com", "pw-123456").await;
    let (carol_id, _) = t.last_confirmation();

    sqlx::query("UPDATE email_verifications SET expires_at = ? WHERE user_id = ?")
        .bind(Utc::now() - Duration::hours(1))
        .bind(&carol_id)
        .execute(t.storage.pool())
        .await
        .expect("expire token");

    let removed = salewallet::service::sweeper::sweep_expired(&t.storage)
        .await
        .expect("sweep");
    assert_eq!(removed, 1);

    let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(t.storage.pool())
        .await
        .expect("count");
    assert_eq!(users, 2);
    let tokens: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM email_verifications")
        .fetch_one(t.storage.pool())
        .await
        .expect("count");
    assert_eq!(tokens, 1);
}
