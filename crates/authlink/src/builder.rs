//! `ClientBuilder`: assembles a [`ServerConnection`] from loose settings.
//!
//! This is the entry point for most callers. It collects the endpoint,
//! the principal, and the tuning knobs, validates them once, and hands
//! back a ready-to-use connection over TCP with the JSON codec.

use std::time::Duration;

use authlink_protocol::JsonCodec;
use authlink_session::{
    Backoff, Credentials, DigestAlgorithm, RetryPolicy, SecretEncoding, ServerConnection,
    SessionConfig,
};
use authlink_transport::{DEFAULT_MAX_FRAME_LEN, TcpConnector};

use crate::AuthlinkError;

/// Builder for configuring an authlink client.
///
/// # Example
///
/// ```rust,no_run
/// use authlink::prelude::*;
///
/// # async fn run() -> Result<(), AuthlinkError> {
/// let client = ClientBuilder::new()
///     .address("auth.internal")
///     .port(7000)
///     .username("alice")
///     .secret("wonderland")
///     .build()?;
/// let token = client.connect().await?;
/// # let _ = token;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ClientBuilder {
    address: Option<String>,
    port: u16,
    username: Option<String>,
    secret: Option<String>,
    digest: Option<DigestAlgorithm>,
    config: SessionConfig,
    max_frame_len: usize,
}

impl ClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            address: None,
            port: 0,
            username: None,
            secret: None,
            digest: None,
            config: SessionConfig::default(),
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }

    /// Host name or IP address of the authentication service.
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    /// Whether to hash the secret before sending it, using the default
    /// [`DigestAlgorithm`].
    pub fn use_digest(mut self, enabled: bool) -> Self {
        self.digest = enabled.then(DigestAlgorithm::default);
        self
    }

    /// Hashes the secret with `algorithm` before sending it.
    pub fn digest(mut self, algorithm: DigestAlgorithm) -> Self {
        self.digest = Some(algorithm);
        self
    }

    /// Total write attempts per message, including the first.
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.config.retry.max_attempts = attempts;
        self
    }

    pub fn backoff(mut self, backoff: Backoff) -> Self {
        self.config.retry.backoff = backoff;
        self
    }

    /// Replaces the whole retry policy.
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.config.retry = retry;
        self
    }

    /// Deadline for opening a channel. `None` waits indefinitely.
    pub fn connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Deadline for each read or write. `None` waits indefinitely.
    pub fn io_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.io_timeout = timeout;
        self
    }

    /// Largest frame, in bytes, the client will send or accept.
    pub fn max_frame_len(mut self, max_frame_len: usize) -> Self {
        self.max_frame_len = max_frame_len;
        self
    }

    /// Validates the settings and builds the connection.
    ///
    /// Nothing touches the network here; the first round trip happens on
    /// [`connect`](ServerConnection::connect) or
    /// [`connect_as_server`](ServerConnection::connect_as_server).
    ///
    /// # Errors
    /// [`AuthlinkError::Config`] if the address, username, or secret is
    /// missing or empty, or if the port or frame limit is zero.
    pub fn build(self) -> Result<ServerConnection, AuthlinkError> {
        let address = required(self.address, "address")?;
        let username = required(self.username, "username")?;
        let secret = required(self.secret, "secret")?;
        if self.port == 0 {
            return Err(AuthlinkError::Config("port must not be 0".into()));
        }
        if self.max_frame_len == 0 {
            return Err(AuthlinkError::Config("max frame length must not be 0".into()));
        }

        let encoding = match self.digest {
            Some(algorithm) => SecretEncoding::Digest(algorithm),
            None => SecretEncoding::Plain,
        };
        tracing::debug!(%address, port = self.port, %username, ?encoding, "client configured");

        let credentials = Credentials::new(address, self.port, username, secret, encoding);
        let connector = TcpConnector::new().with_max_frame_len(self.max_frame_len);
        Ok(ServerConnection::with_parts(
            credentials,
            self.config,
            connector,
            JsonCodec,
        ))
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn required(value: Option<String>, name: &str) -> Result<String, AuthlinkError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AuthlinkError::Config(format!("{name} is required"))),
    }
}
