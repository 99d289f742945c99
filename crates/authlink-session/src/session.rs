//! Session configuration and lifecycle state.

use std::fmt;
use std::time::Duration;

use rand::Rng;

/// Default number of write attempts per message.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

// ---------------------------------------------------------------------------
// Backoff
// ---------------------------------------------------------------------------

/// Pause inserted between failed write attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backoff {
    /// Retry immediately. Channels are freshly opened and short-lived, so
    /// a transient write failure is retried without waiting.
    #[default]
    None,

    /// Wait the same amount after every failure.
    Fixed(Duration),

    /// Double the wait after every failure, starting at `initial` and
    /// capped at `max`. With `jitter`, each wait is drawn uniformly from
    /// the upper half of that window.
    Exponential {
        initial: Duration,
        max: Duration,
        jitter: bool,
    },
}

impl Backoff {
    /// The pause to take after the `failed_attempt`-th failure
    /// (1-based), or `None` to retry at once.
    pub fn delay_after(&self, failed_attempt: u32) -> Option<Duration> {
        match *self {
            Self::None => None,
            Self::Fixed(delay) => Some(delay),
            Self::Exponential {
                initial,
                max,
                jitter,
            } => {
                let factor = 2u32.saturating_pow(failed_attempt.saturating_sub(1));
                let delay = initial.saturating_mul(factor).min(max);
                if !jitter {
                    return Some(delay);
                }
                let ceiling = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
                let millis = rand::rng().random_range(ceiling / 2..=ceiling);
                Some(Duration::from_millis(millis))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// RetryPolicy
// ---------------------------------------------------------------------------

/// How hard [`Courier::send`](crate::Courier::send) tries before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total write attempts per message, including the first.
    /// Values below 1 are treated as 1.
    pub max_attempts: u32,

    /// Pause between attempts.
    pub backoff: Backoff,
}

impl RetryPolicy {
    /// A policy that writes once and never retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            backoff: Backoff::None,
        }
    }

    /// The effective number of attempts (at least one).
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: Backoff::None,
        }
    }
}

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for a [`ServerConnection`](crate::ServerConnection).
///
/// Create one with `SessionConfig::default()` and override the fields
/// you care about.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Write retry policy.
    pub retry: RetryPolicy,

    /// Deadline for opening a channel. `None` waits indefinitely.
    pub connect_timeout: Option<Duration>,

    /// Deadline for each individual read or write. `None` waits
    /// indefinitely.
    pub io_timeout: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            connect_timeout: Some(Duration::from_secs(10)),
            io_timeout: Some(Duration::from_secs(30)),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Where a [`ServerConnection`](crate::ServerConnection) is in its
/// lifecycle.
///
/// ```text
///   Unauthenticated ──(connect_as_server)──→ AwaitingServerSession
///          ↑                                      │
///          │                                   (close)
///          │                                      ▼
///          └─────────(connect_as_server)────── Closed
/// ```
///
/// The one-shot [`connect`](crate::ServerConnection::connect) never
/// changes the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No server channel has been established.
    Unauthenticated,

    /// A server login succeeded and its channel is open for refreshes.
    AwaitingServerSession,

    /// The server channel was closed.
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unauthenticated => "unauthenticated",
            Self::AwaitingServerSession => "awaiting-server-session",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}
