//! Bazaar Client - typed access to the storefront API.
//!
//! - [`ApiClient`] wraps every REST endpoint and keeps the session cookie
//! - [`MessageFeed`] polls `/api/messages` and publishes snapshots
//! - [`InboxView`] holds the admin's selected conversation and read markers

#![cfg_attr(not(test), forbid(unsafe_code))]

mod client;
mod error;
pub mod sync;
pub mod view;

pub use client::ApiClient;
pub use error::ClientError;
pub use sync::{MessageFeed, PollerHandle, Snapshot};
pub use view::{ConversationSummary, InboxView};
