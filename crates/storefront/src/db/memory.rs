//! In-process storage backend.
//!
//! Holds every table in one struct behind a `tokio::sync::Mutex`, so each
//! operation is atomic with respect to every other. IDs are allocated from
//! per-table counters starting at 1 and are never reused, even after a delete.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use bazaar_core::api::{NewMessage, NewProduct};
use bazaar_core::{Message, MessageId, Product, ProductId, User, UserId, Username};

use super::RepositoryError;
use crate::models::UserRecord;

/// Memory-backed store. Create one per test for isolation, or call
/// [`MemoryDb::reset`] between runs.
#[derive(Debug, Default)]
pub struct MemoryDb {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    users: Vec<UserRecord>,
    products: BTreeMap<ProductId, Product>,
    messages: Vec<Message>,
    last_user_id: i32,
    last_product_id: i32,
    last_message_id: i32,
}

fn next_id(counter: &mut i32) -> i32 {
    *counter += 1;
    *counter
}

impl MemoryDb {
    /// Remove every row and restart ID allocation.
    pub async fn reset(&self) {
        *self.state.lock().await = MemoryState::default();
    }

    pub(super) async fn user_by_username(&self, username: &Username) -> Option<UserRecord> {
        let state = self.state.lock().await;
        state
            .users
            .iter()
            .find(|r| r.user.username == *username)
            .cloned()
    }

    pub(super) async fn user_by_id(&self, id: UserId) -> Option<UserRecord> {
        let state = self.state.lock().await;
        state.users.iter().find(|r| r.user.id == id).cloned()
    }

    pub(super) async fn insert_user(
        &self,
        username: &Username,
        password_hash: &str,
        is_admin: bool,
    ) -> Result<UserRecord, RepositoryError> {
        let mut state = self.state.lock().await;
        if state.users.iter().any(|r| r.user.username == *username) {
            return Err(RepositoryError::Conflict(
                "username already exists".to_owned(),
            ));
        }

        let record = UserRecord {
            user: User {
                id: UserId::new(next_id(&mut state.last_user_id)),
                username: username.clone(),
                is_admin,
            },
            password_hash: password_hash.to_owned(),
            created_at: Utc::now(),
        };
        state.users.push(record.clone());
        Ok(record)
    }

    pub(super) async fn user_count(&self) -> usize {
        self.state.lock().await.users.len()
    }

    pub(super) async fn products(&self) -> Vec<Product> {
        self.state.lock().await.products.values().cloned().collect()
    }

    pub(super) async fn product_count(&self) -> usize {
        self.state.lock().await.products.len()
    }

    pub(super) async fn insert_product(&self, product: &NewProduct) -> Product {
        let mut state = self.state.lock().await;
        let id = ProductId::new(next_id(&mut state.last_product_id));
        let product = Product {
            id,
            name: product.name.as_str().to_owned(),
            description: product.description.clone(),
            price: product.price,
            image_url: product.image_url.clone(),
            external_link: product.external_link.clone(),
        };
        state.products.insert(id, product.clone());
        product
    }

    pub(super) async fn delete_product(&self, id: ProductId) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        state
            .products
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    pub(super) async fn insert_message(&self, sender: UserId, message: &NewMessage) -> Message {
        let mut state = self.state.lock().await;
        let id = MessageId::new(next_id(&mut state.last_message_id));
        let created_at = monotonic_now(state.messages.last().map(|m| m.created_at));
        let message = Message {
            id,
            sender_id: sender,
            receiver_id: message.receiver_id,
            content: message.content.as_str().to_owned(),
            created_at,
        };
        state.messages.push(message.clone());
        message
    }

    /// Messages in insertion order, optionally restricted to one participant.
    pub(super) async fn messages(&self, involving: Option<UserId>) -> Vec<Message> {
        let state = self.state.lock().await;
        state
            .messages
            .iter()
            .filter(|m| involving.is_none_or(|user| m.involves(user)))
            .cloned()
            .collect()
    }
}

/// Current time, clamped so the log never goes backwards.
fn monotonic_now(previous: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let now = Utc::now();
    previous.map_or(now, |prev| now.max(prev))
}
