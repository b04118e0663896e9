//! Server-side models that never leave the storefront.
//!
//! Wire shapes live in `bazaar_core::models`; the types here add the data
//! only the server may see (password hashes, session payloads).

pub mod session;
pub mod user;

pub use session::CurrentUser;
pub use user::UserRecord;
