//! User record storage.
//!
//! The service only ever talks to the `UserStore` trait; Postgres and the
//! in-memory test store both implement it.

pub mod models;
pub mod store;

pub use models::{PublicUser, User};
pub use store::{MemoryUserStore, PgUserStore, UserStore};
