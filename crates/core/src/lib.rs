//! Bazaar Core - Shared types library.
//!
//! This crate provides the pieces shared by every Bazaar component:
//! - `storefront` - The HTTP API server
//! - `client` - Typed API client and polling sync loop
//! - `cli` - Command-line tools for migrations, seeding and the terminal inbox
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows the server and
//! the client to agree on one definition of every wire shape.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, usernames, prices and text
//! - [`models`] - Users, products and messages as they travel over the wire
//! - [`api`] - Request and error bodies for the REST API
//! - [`conversation`] - Groups a flat message log into per-counterparty threads

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod conversation;
pub mod models;
pub mod types;

pub use conversation::{Conversation, Projection, TimelineEntry, counterparty_of};
pub use models::{Message, Product, User};
pub use types::*;
