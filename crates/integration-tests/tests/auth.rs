//! Registration, login and the session guard.

use bazaar_client::ClientError;
use bazaar_integration_tests::{ADMIN_USERNAME, BUYER_PASSWORD, TestContext};
use bazaar_storefront::db::UserRepository;
use reqwest::StatusCode;
use serde_json::{Value, json};

#[tokio::test]
async fn test_register_then_me() {
    let ctx = TestContext::spawn().await;
    let http = ctx.http();

    let resp = http
        .post(ctx.url("/api/register"))
        .json(&json!({"username": "alice", "password": BUYER_PASSWORD}))
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), StatusCode::CREATED);

    let me: Value = http
        .get(ctx.url("/api/me"))
        .send()
        .await
        .expect("request")
        .json()
        .await
        .expect("json");
    assert_eq!(me["username"], "alice");
    assert_eq!(me["isAdmin"], false);
    assert!(me.get("password").is_none());
}

#[tokio::test]
async fn test_duplicate_username_rejected() {
    let ctx = TestContext::spawn().await;
    ctx.buyer("alice").await;
    let before = UserRepository::new(&ctx.db).count().await.expect("count");

    let err = ctx
        .anonymous()
        .register("alice", "another-password")
        .await
        .expect_err("duplicate must fail");
    match err {
        ClientError::Validation { field, message } => {
            assert_eq!(field.as_deref(), Some("username"));
            assert_eq!(message, "Username already exists");
        }
        other => panic!("expected validation error, got {other:?}"),
    }

    let after = UserRepository::new(&ctx.db).count().await.expect("count");
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_short_password_rejected() {
    let ctx = TestContext::spawn().await;
    let err = ctx
        .anonymous()
        .register("bob", "12345")
        .await
        .expect_err("short password");
    assert!(matches!(
        err,
        ClientError::Validation { field: Some(ref f), .. } if f == "password"
    ));
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let ctx = TestContext::spawn().await;
    let err = ctx
        .anonymous()
        .login(ADMIN_USERNAME, "not-the-password")
        .await
        .expect_err("bad password");
    assert!(err.is_unauthorized());
}

#[tokio::test]
async fn test_login_as_unknown_user() {
    let ctx = TestContext::spawn().await;
    let err = ctx
        .anonymous()
        .login("ghost", BUYER_PASSWORD)
        .await
        .expect_err("unknown user");
    assert!(err.is_unauthorized());
}

#[tokio::test]
async fn test_me_requires_session() {
    let ctx = TestContext::spawn().await;

    let resp = ctx.http().get(ctx.url("/api/me")).send().await.expect("request");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.expect("json");
    assert_eq!(body["message"], "Unauthorized");
}

#[tokio::test]
async fn test_login_sets_session() {
    let ctx = TestContext::spawn().await;
    let admin = ctx.admin_client().await;

    let me = admin.me().await.expect("me");
    assert_eq!(me.username.as_str(), ADMIN_USERNAME);
    assert!(me.is_admin);
}

#[tokio::test]
async fn test_logout_ends_session() {
    let ctx = TestContext::spawn().await;
    let (alice, _) = ctx.buyer("alice").await;
    alice.me().await.expect("logged in");

    let ack = alice.logout().await.expect("logout");
    assert_eq!(ack.message, "Logged out");
    assert!(alice.me().await.expect_err("logged out").is_unauthorized());
}

#[tokio::test]
async fn test_logout_without_session_succeeds() {
    let ctx = TestContext::spawn().await;
    ctx.anonymous().logout().await.expect("logout is idempotent");
}

#[tokio::test]
async fn test_session_cookie_is_http_only() {
    let ctx = TestContext::spawn().await;
    let resp = ctx
        .http()
        .post(ctx.url("/api/register"))
        .json(&json!({"username": "carol", "password": BUYER_PASSWORD}))
        .send()
        .await
        .expect("request");

    let cookie = resp
        .headers()
        .get(reqwest::header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .expect("session cookie");
    assert!(cookie.starts_with("bazaar_session="));
    assert!(cookie.contains("HttpOnly"));
}
