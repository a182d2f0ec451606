//! Stateless session authentication.
//!
//! # Responsibility
//! - Sign and verify session tokens (`token`).
//! - Hash and verify account credentials (`password`).
//! - Decide whether a presented token still names the current session (`session`).
//!
//! # Invariants
//! - No server-side session store exists; the account epoch is the only
//!   invalidation mechanism.

pub mod password;
pub mod session;
pub mod token;
