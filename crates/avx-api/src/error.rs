use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the `avx-api` crate.
///
/// Covers every failure mode of a controller call: session login,
/// transport, the `{return, reason}` envelope, and response decoding.
/// `avx-core` maps these into caller-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login failed or the controller rejected the session (HTTP 401).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Controller ──────────────────────────────────────────────────
    /// The controller answered `return: false`. `reason` is passed through verbatim.
    #[error("rest API {action} failed: {reason}")]
    Api { action: String, reason: String },

    /// Lookup miss. Only raised by read operations.
    #[error("{name} not found")]
    NotFound { name: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx status that is not an authentication failure.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// Request parameters could not be encoded as form fields.
    #[error("Could not encode request parameters: {0}")]
    Encoding(String),

    /// The private key file for a device registration could not be read.
    #[error("Could not read key file {}: {source}", path.display())]
    KeyFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Returns `true` if this is a lookup miss.
    ///
    /// Only a controller-confirmed miss counts. An HTTP 404 means the
    /// endpoint itself was not reached and stays a transport failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if this is a transient error worth retrying.
    ///
    /// Nothing in this crate retries; the flag is for callers.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// The controller-supplied rejection reason, if any.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Api { reason, .. } => Some(reason),
            _ => None,
        }
    }
}
