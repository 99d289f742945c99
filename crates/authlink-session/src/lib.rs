//! Client sessions against the authlink authentication service.
//!
//! This crate drives the protocol from the client side:
//!
//! 1. **User login**: a one-shot exchange that yields a session token
//!    ([`ServerConnection::connect`])
//! 2. **Server login**: a long-lived channel for checking user tokens
//!    ([`ServerConnection::connect_as_server`], [`ServerConnection::refresh_token`])
//! 3. **Delivery**: bounded write retry with optional backoff ([`Courier`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Facade (above)  ← builds a ServerConnection from user configuration
//!     ↕
//! Session Layer (this crate)  ← login state machine, retry, timeouts
//!     ↕
//! Protocol Layer (below)  ← Message, Envelope, SessionToken, Codec
//!     ↕
//! Transport Layer (below)  ← framed TCP channels
//! ```

#![allow(async_fn_in_trait)]

mod connection;
mod courier;
mod credentials;
mod error;
mod session;

#[cfg(test)]
mod testing;

pub use connection::ServerConnection;
pub use courier::Courier;
pub use credentials::{Credentials, DigestAlgorithm, SecretEncoding};
pub use error::{FailureKind, SessionError};
pub use session::{Backoff, DEFAULT_MAX_ATTEMPTS, RetryPolicy, SessionConfig, SessionState};
