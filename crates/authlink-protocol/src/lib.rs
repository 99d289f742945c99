//! Wire protocol for authlink.
//!
//! This crate defines the "language" the client and the authentication
//! service speak:
//!
//! - **Types** ([`Message`], [`Envelope`], [`SessionToken`], [`ErrorCode`])
//!   are the closed message catalog that travels on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) converts envelopes to
//!   and from bytes.
//! - **Errors** ([`ProtocolError`]) describe what can go wrong while encoding,
//!   decoding, or matching an answer to its request.
//!
//! # Architecture
//!
//! ```text
//! Transport (frames) → Protocol (Envelope) → Session (login / refresh)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    Envelope, ErrorCode, Message, PROTOCOL_VERSION, RefreshResult,
    ServerLoginResult, SessionToken, WireSecret,
};
