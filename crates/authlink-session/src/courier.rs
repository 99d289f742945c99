//! Message delivery over one channel: bounded retry on write, single
//! attempt on read.
//!
//! This is the only place in the crate that retries anything.

use std::future::Future;
use std::time::Duration;

use authlink_protocol::{Codec, Envelope, Message};
use authlink_transport::{Connection, TransportError};

use crate::{RetryPolicy, SessionConfig, SessionError};

/// Sends and receives whole protocol messages on a [`Connection`].
///
/// ```text
/// send:    encode ─→ write ─✗→ (backoff) ─→ write ─✗→ … ─→ DeliveryFailed
///                       └─✓→ Ok
/// receive: read one frame ─→ decode ─→ check version ─→ Message
/// ```
///
/// Reads are never retried: a partially consumed frame cannot be replayed,
/// so the next read would start mid-stream.
pub struct Courier<'a, K: Codec> {
    codec: &'a K,
    retry: RetryPolicy,
    io_timeout: Option<Duration>,
}

impl<'a, K: Codec> Courier<'a, K> {
    pub fn new(codec: &'a K, config: &SessionConfig) -> Self {
        Self {
            codec,
            retry: config.retry,
            io_timeout: config.io_timeout,
        }
    }

    /// Writes `message` as one frame, retrying per the [`RetryPolicy`].
    ///
    /// Encoding happens once, before the first attempt. Only plain write
    /// failures are retried: an encode error or an oversized frame fails
    /// the same way every time, and a write cut short by the deadline may
    /// already have put part of the frame on the wire.
    ///
    /// # Errors
    /// - [`SessionError::Protocol`] if the message cannot be encoded
    /// - [`SessionError::Transport`] with `FrameTooLarge`, `TimedOut` or
    ///   `ConnectionClosed`, after a single attempt
    /// - [`SessionError::DeliveryFailed`] once every attempt has failed,
    ///   carrying the last transport error
    pub async fn send<C: Connection>(
        &self,
        conn: &C,
        message: Message,
    ) -> Result<(), SessionError> {
        let kind = message.kind();
        let frame = self.codec.encode(&Envelope::new(message))?;
        let attempts = self.retry.attempts();
        let conn_id = conn.id();

        let mut attempt = 1;
        loop {
            match with_deadline(self.io_timeout, "send", conn.send(&frame)).await {
                Ok(()) => {
                    tracing::debug!(%conn_id, kind, attempt, "message sent");
                    return Ok(());
                }
                Err(e) if !is_retryable(&e) => {
                    tracing::warn!(
                        %conn_id, kind, attempt, error = %e,
                        "send failed, not retrying"
                    );
                    return Err(e.into());
                }
                Err(e) if attempt >= attempts => {
                    tracing::warn!(
                        %conn_id, kind, attempts, error = %e,
                        "giving up on message delivery"
                    );
                    return Err(SessionError::DeliveryFailed {
                        attempts,
                        source: e,
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        %conn_id, kind, attempt, error = %e,
                        "send attempt failed, retrying"
                    );
                    if let Some(delay) = self.retry.backoff.delay_after(attempt) {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
            }
        }
    }

    /// Reads exactly one message.
    ///
    /// # Errors
    /// - [`SessionError::Transport`] on I/O failure, deadline expiry, or
    ///   if the peer closed the channel instead of answering
    /// - [`SessionError::Protocol`] if the frame is not a valid envelope
    ///   of the current version
    pub async fn receive<C: Connection>(&self, conn: &C) -> Result<Message, SessionError> {
        let frame = with_deadline(self.io_timeout, "receive", conn.recv())
            .await?
            .ok_or_else(|| {
                TransportError::ConnectionClosed("peer closed before answering".into())
            })?;

        let envelope: Envelope = self.codec.decode(&frame)?;
        let message = envelope.into_message()?;
        tracing::debug!(conn_id = %conn.id(), kind = message.kind(), "message received");
        Ok(message)
    }
}

/// Whether a failed write can be repeated on the same channel.
fn is_retryable(err: &TransportError) -> bool {
    matches!(err, TransportError::SendFailed(_))
}

/// Runs a transport future under an optional deadline.
pub(crate) async fn with_deadline<T>(
    deadline: Option<Duration>,
    operation: &'static str,
    fut: impl Future<Output = Result<T, TransportError>>,
) -> Result<T, TransportError> {
    match deadline {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| TransportError::TimedOut { operation })?,
        None => fut.await,
    }
}
