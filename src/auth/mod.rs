//! Credential service: password hashing, token issuance and verification,
//! and the request guard protected handlers compose with.

pub mod clock;
pub mod guard;
pub mod handlers;
mod service;

pub use clock::{Clock, SystemClock};
pub use service::{AuthService, Claims, TokenCheck, TokenPair};
