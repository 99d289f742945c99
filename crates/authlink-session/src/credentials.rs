//! Credentials and the secret digest applied before any wire use.

use authlink_protocol::WireSecret;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};

/// One-way hash applied to a plaintext secret.
///
/// The output is always lowercase hexadecimal of a fixed length, so the
/// service can store and compare digests without ever seeing the
/// plaintext.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DigestAlgorithm {
    /// SHA-1, 40 hex characters. What the authentication service stores.
    #[default]
    Sha1,
    /// SHA-256, 64 hex characters.
    Sha256,
}

impl DigestAlgorithm {
    /// Hashes the UTF-8 bytes of `plaintext` and hex-encodes the result.
    pub fn hash(&self, plaintext: &str) -> String {
        match self {
            Self::Sha1 => hex::encode(sha1::Sha1::digest(plaintext.as_bytes())),
            Self::Sha256 => hex::encode(Sha256::digest(plaintext.as_bytes())),
        }
    }

    /// Length of [`hash`](Self::hash) output, in characters.
    pub fn digest_len(&self) -> usize {
        match self {
            Self::Sha1 => 40,
            Self::Sha256 => 64,
        }
    }
}

/// How the secret handed to [`Credentials::new`] should go on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SecretEncoding {
    /// Sent as given (the caller may already have hashed it).
    #[default]
    Plain,
    /// Hashed once, at construction.
    Digest(DigestAlgorithm),
}

/// Endpoint and principal a session authenticates with.
///
/// Immutable once built. The secret is kept in a [`SecretString`] so it
/// never shows up in `Debug` output or logs.
#[derive(Debug)]
pub struct Credentials {
    address: String,
    port: u16,
    username: String,
    secret: SecretString,
}

impl Credentials {
    /// Collects what is needed to reach and log into the service.
    ///
    /// With [`SecretEncoding::Digest`] the plaintext is hashed here and
    /// dropped; only the digest is kept.
    pub fn new(
        address: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        secret: impl Into<String>,
        encoding: SecretEncoding,
    ) -> Self {
        let secret = secret.into();
        let secret = match encoding {
            SecretEncoding::Plain => secret,
            SecretEncoding::Digest(algorithm) => algorithm.hash(&secret),
        };

        Self {
            address: address.into(),
            port,
            username: username.into(),
            secret: SecretString::from(secret),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// The secret as it will be sent in login requests.
    pub(crate) fn wire_secret(&self) -> WireSecret {
        WireSecret::new(self.secret.expose_secret())
    }
}
