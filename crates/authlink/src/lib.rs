//! # Authlink
//!
//! Client library for a centralized authentication service.
//!
//! Users log in once and receive a session token. Servers log in with
//! their own credentials, keep the channel open, and ask the service
//! whether the tokens their users present are still valid.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use authlink::prelude::*;
//!
//! # async fn run(user_token: SessionToken) -> Result<(), AuthlinkError> {
//! let mut server = ClientBuilder::new()
//!     .address("auth.internal")
//!     .port(7000)
//!     .username("game-server")
//!     .secret("s3rv3r")
//!     .build()?;
//!
//! server.connect_as_server().await?;
//! let valid = server.refresh_token(user_token).await?;
//! server.close().await;
//! # let _ = valid;
//! # Ok(())
//! # }
//! ```

mod builder;
mod error;

pub use builder::ClientBuilder;
pub use error::AuthlinkError;

pub use authlink_protocol as protocol;
pub use authlink_session as session;
pub use authlink_transport as transport;

pub mod prelude {
    pub use crate::{AuthlinkError, ClientBuilder};
    pub use authlink_protocol::{ErrorCode, SessionToken};
    pub use authlink_session::{
        Backoff, Credentials, DEFAULT_MAX_ATTEMPTS, DigestAlgorithm, FailureKind, RetryPolicy,
        SecretEncoding, ServerConnection, SessionConfig, SessionError, SessionState,
    };
}
