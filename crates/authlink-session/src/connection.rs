//! The client side of the authentication protocol.
//!
//! [`ServerConnection`] runs the two login handshakes, token refresh over
//! a kept-open server channel, and graceful close. Each operation
//! completes its whole round trip before returning; nothing runs in the
//! background.
//!
//! # Concurrency note
//!
//! A `ServerConnection` owns its channel exclusively and is not meant to
//! be shared: `connect_as_server`, `refresh_token` and `close` take
//! `&mut self`, and the protocol allows one outstanding request per
//! channel. Use one connection per task, or wrap it in a mutex at a
//! higher level.

use authlink_protocol::{
    Codec, ErrorCode, JsonCodec, Message, ProtocolError, RefreshResult, SessionToken,
};
use authlink_transport::{Connection, Connector, TcpConnector};

use crate::courier::with_deadline;
use crate::{Courier, Credentials, SessionConfig, SessionError, SessionState};

/// The server channel, when there is one. Holding the connection inside
/// the variant means "logged in as a server" and "has an open channel"
/// cannot disagree.
enum Link<T> {
    Unauthenticated,
    Open(T),
    Closed,
}

/// A principal's connection to the authentication service.
///
/// ## Lifecycle
///
/// ```text
/// connect() ─────────── one-shot: open → LoginRequest → LoginAnswer → close
///
/// connect_as_server() ─→ [AwaitingServerSession] ─→ refresh_token() …
///                                 │
///                              close() ─→ [Closed]
/// ```
///
/// Generic over the [`Connector`] (how channels are opened) and the
/// [`Codec`] (how envelopes are encoded). The defaults are TCP and JSON.
pub struct ServerConnection<C: Connector = TcpConnector, K: Codec = JsonCodec> {
    credentials: Credentials,
    config: SessionConfig,
    connector: C,
    codec: K,
    link: Link<C::Connection>,
}

impl ServerConnection {
    /// Creates a TCP/JSON connection with the default configuration.
    pub fn new(credentials: Credentials) -> Self {
        Self::with_config(credentials, SessionConfig::default())
    }

    /// Creates a TCP/JSON connection with a custom configuration.
    pub fn with_config(credentials: Credentials, config: SessionConfig) -> Self {
        Self::with_parts(credentials, config, TcpConnector::new(), JsonCodec)
    }
}

impl<C: Connector, K: Codec> ServerConnection<C, K> {
    /// Creates a connection from explicit parts.
    pub fn with_parts(
        credentials: Credentials,
        config: SessionConfig,
        connector: C,
        codec: K,
    ) -> Self {
        Self {
            credentials,
            config,
            connector,
            codec,
            link: Link::Unauthenticated,
        }
    }

    pub fn state(&self) -> SessionState {
        match self.link {
            Link::Unauthenticated => SessionState::Unauthenticated,
            Link::Open(_) => SessionState::AwaitingServerSession,
            Link::Closed => SessionState::Closed,
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Logs in as a user and returns the session token.
    ///
    /// Opens a fresh channel, exchanges one `LoginRequest`/`LoginAnswer`
    /// pair, and closes the channel again whatever the outcome. Failing to
    /// close is logged, never returned. The session state is untouched.
    ///
    /// # Errors
    /// - [`SessionError::AuthenticationFailed`] with
    ///   [`ErrorCode::BadUsernameOrPassword`] if the answer has no token
    /// - [`SessionError::Transport`] / [`SessionError::DeliveryFailed`] if
    ///   the channel cannot be opened, written, or read
    /// - [`SessionError::Protocol`] if the answer is undecodable or is not
    ///   a `LoginAnswer`
    pub async fn connect(&self) -> Result<SessionToken, SessionError> {
        let conn = self.open().await?;
        let result = self.login(&conn).await;
        self.release(&conn).await;

        let username = self.credentials.username();
        match &result {
            Ok(_) => tracing::info!(username, "user login succeeded"),
            Err(e) => tracing::info!(username, kind = ?e.kind(), error = %e, "user login failed"),
        }
        result
    }

    /// Logs in as a server and keeps the channel open for
    /// [`refresh_token`](Self::refresh_token).
    ///
    /// If a server channel is already open it is closed first (as by
    /// [`close`](Self::close)). On success the state becomes
    /// [`SessionState::AwaitingServerSession`]; on failure the new channel
    /// is closed and discarded.
    ///
    /// # Errors
    /// - [`SessionError::AuthenticationFailed`] with
    ///   [`ErrorCode::BadUsernameOrPassword`] or
    ///   [`ErrorCode::NotARecognizedServer`]
    /// - [`SessionError::Transport`] / [`SessionError::DeliveryFailed`] on
    ///   I/O failure
    /// - [`SessionError::Protocol`] if the answer is undecodable or is not
    ///   a `ServerLoginAnswer`
    pub async fn connect_as_server(&mut self) -> Result<(), SessionError> {
        if matches!(self.link, Link::Open(_)) {
            tracing::debug!("replacing existing server channel");
            self.close().await;
        }

        let conn = self.open().await?;
        let username = self.credentials.username();
        match self.server_login(&conn).await {
            Ok(()) => {
                tracing::info!(conn_id = %conn.id(), username, "server login succeeded");
                self.link = Link::Open(conn);
                Ok(())
            }
            Err(e) => {
                tracing::info!(username, kind = ?e.kind(), error = %e, "server login failed");
                self.release(&conn).await;
                Err(e)
            }
        }
    }

    /// Asks the service whether `token` is still valid.
    ///
    /// Returns `true` iff the service answered
    /// [`RefreshResult::Success`]; any other explicit verdict is `false`.
    ///
    /// Any failure after the request starts out leaves the channel out of
    /// step with the service (a late answer may still arrive), so the
    /// channel is closed and the state becomes [`SessionState::Closed`].
    /// Log in again with [`connect_as_server`](Self::connect_as_server)
    /// to continue.
    ///
    /// # Errors
    /// - [`SessionError::NotAuthorizedAsServer`] unless the state is
    ///   [`SessionState::AwaitingServerSession`]
    /// - [`SessionError::Transport`] / [`SessionError::DeliveryFailed`] on
    ///   I/O failure or deadline expiry
    /// - [`SessionError::Protocol`] if the answer is undecodable or is not
    ///   a `RefreshSessionAnswer`
    pub async fn refresh_token(&mut self, token: SessionToken) -> Result<bool, SessionError> {
        let Link::Open(conn) = &self.link else {
            tracing::warn!(state = %self.state(), "refresh attempted without a server login");
            return Err(SessionError::NotAuthorizedAsServer);
        };

        match self.refresh(conn, token).await {
            Ok(valid) => Ok(valid),
            Err(e) => {
                if let Link::Open(conn) = std::mem::replace(&mut self.link, Link::Closed) {
                    tracing::warn!(
                        conn_id = %conn.id(), kind = ?e.kind(), error = %e,
                        "refresh failed, dropping server channel"
                    );
                    self.release(&conn).await;
                }
                Err(e)
            }
        }
    }

    /// Ends the server session: sends `EndOfCommunication`, then closes
    /// the channel. Both steps are best-effort and never fail.
    ///
    /// Safe in any state. Without an open channel this does nothing.
    pub async fn close(&mut self) {
        match std::mem::replace(&mut self.link, Link::Closed) {
            Link::Open(conn) => {
                if let Err(e) = self
                    .courier()
                    .send(&conn, Message::EndOfCommunication)
                    .await
                {
                    tracing::debug!(conn_id = %conn.id(), error = %e, "end-of-communication not delivered");
                }
                self.release(&conn).await;
                tracing::info!(conn_id = %conn.id(), "server channel closed");
            }
            Link::Unauthenticated => {
                self.link = Link::Unauthenticated;
                tracing::debug!("close called without a server channel");
            }
            Link::Closed => tracing::debug!("close called on a closed session"),
        }
    }

    // -- internals --------------------------------------------------------

    fn courier(&self) -> Courier<'_, K> {
        Courier::new(&self.codec, &self.config)
    }

    async fn open(&self) -> Result<C::Connection, SessionError> {
        let address = self.credentials.address();
        let port = self.credentials.port();
        let conn = with_deadline(
            self.config.connect_timeout,
            "connect",
            self.connector.connect(address, port),
        )
        .await?;
        tracing::debug!(conn_id = %conn.id(), address, port, "channel opened");
        Ok(conn)
    }

    /// Closes a channel, logging instead of failing.
    async fn release(&self, conn: &C::Connection) {
        if let Err(e) = with_deadline(self.config.io_timeout, "close", conn.close()).await {
            tracing::warn!(conn_id = %conn.id(), error = %e, "failed to close channel");
        }
    }

    async fn login(&self, conn: &C::Connection) -> Result<SessionToken, SessionError> {
        let courier = self.courier();
        courier
            .send(
                conn,
                Message::LoginRequest {
                    username: self.credentials.username().to_owned(),
                    secret: self.credentials.wire_secret(),
                },
            )
            .await?;

        match courier.receive(conn).await? {
            Message::LoginAnswer { token: Some(token) } => Ok(token),
            Message::LoginAnswer { token: None } => Err(SessionError::AuthenticationFailed(
                ErrorCode::BadUsernameOrPassword,
            )),
            other => Err(unexpected("LoginAnswer", &other)),
        }
    }

    async fn refresh(
        &self,
        conn: &C::Connection,
        token: SessionToken,
    ) -> Result<bool, SessionError> {
        let courier = self.courier();
        courier
            .send(conn, Message::RefreshSessionRequest { token })
            .await?;

        match courier.receive(conn).await? {
            Message::RefreshSessionAnswer { result } => {
                tracing::debug!(conn_id = %conn.id(), ?result, "refresh answered");
                Ok(result == RefreshResult::Success)
            }
            other => Err(unexpected("RefreshSessionAnswer", &other)),
        }
    }

    async fn server_login(&self, conn: &C::Connection) -> Result<(), SessionError> {
        let courier = self.courier();
        courier
            .send(
                conn,
                Message::ServerLoginRequest {
                    username: self.credentials.username().to_owned(),
                    secret: self.credentials.wire_secret(),
                },
            )
            .await?;

        match courier.receive(conn).await? {
            Message::ServerLoginAnswer { result } => match result.error_code() {
                None => Ok(()),
                Some(code) => Err(SessionError::AuthenticationFailed(code)),
            },
            other => Err(unexpected("ServerLoginAnswer", &other)),
        }
    }
}

fn unexpected(expected: &'static str, found: &Message) -> SessionError {
    ProtocolError::UnexpectedMessage {
        expected,
        found: found.kind(),
    }
    .into()
}
