//! Core types for Bazaar.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod price;
pub mod text;
pub mod username;

pub use id::*;
pub use price::{Price, PriceError};
pub use text::{NonEmptyText, TextError};
pub use username::{Username, UsernameError};
