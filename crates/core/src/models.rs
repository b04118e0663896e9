//! Domain models shared by the server and the client.
//!
//! These are the shapes exposed on the wire (camelCase JSON). Credentials never
//! appear here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::types::{MessageId, Price, ProductId, UserId, Username};

/// A shop account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Unique login name.
    pub username: Username,
    /// Whether this account manages the catalog and answers buyers.
    pub is_admin: bool,
}

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    /// Price in minor units (VND).
    pub price: Price,
    pub image_url: Option<Url>,
    /// Where the product can be bought off-site.
    pub external_link: Option<Url>,
}

/// A single chat message.
///
/// Messages are append-only. A `None` receiver addresses the shop's general
/// inbox rather than a specific account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub sender_id: UserId,
    pub receiver_id: Option<UserId>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Whether `user` sent or received this message.
    #[must_use]
    pub fn involves(&self, user: UserId) -> bool {
        self.sender_id == user || self.receiver_id == Some(user)
    }
}
