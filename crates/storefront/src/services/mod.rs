//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Registration, login and admin provisioning
//! - `catalog` - Product listing (cached) and admin product management
//! - `messages` - Sending messages and listing what a principal may read
//! - `seed` - First-boot admin and demo catalog

pub mod auth;
pub mod catalog;
pub mod messages;
pub mod seed;
