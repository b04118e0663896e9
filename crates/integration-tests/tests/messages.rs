//! Sending, visibility and conversation grouping.

use std::collections::HashSet;

use bazaar_client::ClientError;
use bazaar_core::{Projection, UserId};
use bazaar_integration_tests::TestContext;
use reqwest::StatusCode;
use serde_json::{Value, json};

#[tokio::test]
async fn test_buyer_hello_reaches_admin() {
    let ctx = TestContext::spawn().await;
    let (alice, alice_user) = ctx.buyer("alice").await;

    let sent = alice.send_message(None, "hello").await.expect("send");
    assert_eq!(sent.sender_id, alice_user.id);
    assert_eq!(sent.receiver_id, None);

    let admin = ctx.admin_client().await;
    let messages = admin.messages().await.expect("admin list");
    assert!(messages.iter().any(|m| m.sender_id == alice_user.id
        && m.receiver_id.is_none()
        && m.content == "hello"));

    let projection = Projection::build(&messages, ctx.admin.id);
    let conversation = projection
        .get(alice_user.id)
        .expect("filed under alice");
    assert_eq!(conversation.len(), 1);
}

#[tokio::test]
async fn test_admin_note_to_general_inbox_is_left_out_of_projection() {
    let ctx = TestContext::spawn().await;
    let (alice, alice_user) = ctx.buyer("alice").await;
    alice.send_message(None, "hello").await.expect("send");

    let admin = ctx.admin_client().await;
    let note = admin.send_message(None, "ghi chú kho").await.expect("send");
    assert_eq!(note.receiver_id, None);

    let messages = admin.messages().await.expect("admin list");
    assert!(messages.iter().any(|m| m.id == note.id));

    let projection = Projection::build(&messages, ctx.admin.id);
    assert_eq!(projection.len(), 1);
    let conversation = projection.get(alice_user.id).expect("filed under alice");
    assert!(conversation.messages().iter().all(|m| m.id != note.id));
}

#[tokio::test]
async fn test_send_returns_201_with_wire_shape() {
    let ctx = TestContext::spawn().await;
    let http = ctx.http();
    http.post(ctx.url("/api/register"))
        .json(&json!({"username": "alice", "password": "mua-sam-123"}))
        .send()
        .await
        .expect("register");

    let resp = http
        .post(ctx.url("/api/messages"))
        .json(&json!({"content": "hello"}))
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: Value = resp.json().await.expect("json");
    assert_eq!(body["receiverId"], Value::Null);
    assert_eq!(body["content"], "hello");
    assert!(body["createdAt"].is_string());
    assert!(body["senderId"].is_number());
}

#[tokio::test]
async fn test_every_message_visible_to_both_parties_once() {
    let ctx = TestContext::spawn().await;
    let (alice, alice_user) = ctx.buyer("alice").await;
    let (bob, bob_user) = ctx.buyer("bob").await;
    let admin = ctx.admin_client().await;

    alice.send_message(None, "hello").await.expect("send");
    admin
        .send_message(Some(alice_user.id), "chào bạn")
        .await
        .expect("reply");
    bob.send_message(None, "còn hàng không?").await.expect("send");
    admin
        .send_message(Some(bob_user.id), "còn bạn nhé")
        .await
        .expect("reply");

    let alice_view = alice.messages().await.expect("list");
    let bob_view = bob.messages().await.expect("list");
    let admin_view = admin.messages().await.expect("list");

    assert_eq!(alice_view.len(), 2);
    assert!(alice_view.iter().all(|m| m.involves(alice_user.id)));
    assert_eq!(bob_view.len(), 2);
    assert!(bob_view.iter().all(|m| m.involves(bob_user.id)));
    assert_eq!(admin_view.len(), 4);

    let ids: HashSet<_> = admin_view.iter().map(|m| m.id).collect();
    assert_eq!(ids.len(), admin_view.len(), "no duplicates");
}

#[tokio::test]
async fn test_admin_projection_orders_by_latest_activity() {
    let ctx = TestContext::spawn().await;
    let (alice, alice_user) = ctx.buyer("alice").await;
    let (bob, bob_user) = ctx.buyer("bob").await;
    let admin = ctx.admin_client().await;

    alice.send_message(None, "hello").await.expect("send");
    bob.send_message(None, "xin chào").await.expect("send");
    alice.send_message(None, "có ai không?").await.expect("send");

    let projection = Projection::build(&admin.messages().await.expect("list"), ctx.admin.id);
    let order: Vec<_> = projection
        .conversations()
        .iter()
        .map(bazaar_core::Conversation::counterparty)
        .collect();
    assert_eq!(
        order,
        vec![alice_user.id, bob_user.id]
    );
}

#[tokio::test]
async fn test_blank_message_rejected() {
    let ctx = TestContext::spawn().await;
    let (alice, _) = ctx.buyer("alice").await;

    let err = alice.send_message(None, "   ").await.expect_err("blank");
    assert!(matches!(
        err,
        ClientError::Validation { field: Some(ref f), .. } if f == "content"
    ));
    assert!(alice.messages().await.expect("list").is_empty());
}

#[tokio::test]
async fn test_unknown_receiver_rejected() {
    let ctx = TestContext::spawn().await;
    let admin = ctx.admin_client().await;

    let err = admin
        .send_message(Some(UserId::new(404)), "anyone there?")
        .await
        .expect_err("unknown receiver");
    assert!(matches!(
        err,
        ClientError::Validation { field: Some(ref f), .. } if f == "receiverId"
    ));
}

#[tokio::test]
async fn test_messages_require_session() {
    let ctx = TestContext::spawn().await;
    let anonymous = ctx.anonymous();

    assert!(anonymous.messages().await.expect_err("list").is_unauthorized());
    assert!(
        anonymous
            .send_message(None, "hello")
            .await
            .expect_err("send")
            .is_unauthorized()
    );
}
