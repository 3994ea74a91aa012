// ── Core error types ──
//
// Caller-facing errors from avx-core. Consumers never see HTTP status
// codes or JSON parse failures directly; the `From<avx_api::Error>` impl
// translates transport-layer errors into domain-appropriate variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to controller at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Controller request timed out")]
    Timeout,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Operation rejected by controller: {reason}")]
    Rejected { action: String, reason: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("'software_version' can only be updated for managed CloudN (CaaG) devices: {device}")]
    SoftwareVersionNotUpgradable { device: String },

    #[error("'{field}' cannot be changed on an existing device ({from} -> {to})")]
    ImmutableField {
        field: &'static str,
        from: String,
        to: String,
    },

    #[error("Gateway upgrade of {gateway} to {version} failed after the device update: {reason}")]
    UpgradeFailed {
        gateway: String,
        version: String,
        reason: String,
    },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<avx_api::Error> for CoreError {
    fn from(err: avx_api::Error) -> Self {
        match err {
            avx_api::Error::Authentication { message } => CoreError::AuthenticationFailed { message },
            avx_api::Error::Api { action, reason } => CoreError::Rejected { action, reason },
            avx_api::Error::NotFound { name } => CoreError::NotFound {
                entity_type: "device".into(),
                identifier: name,
            },
            avx_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            avx_api::Error::Http { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            avx_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            avx_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            avx_api::Error::Deserialization { message, body: _ } => CoreError::Api {
                message: format!("Deserialization error: {message}"),
                status: None,
            },
            avx_api::Error::Encoding(message) => CoreError::ValidationFailed { message },
            e @ avx_api::Error::KeyFile { .. } => CoreError::ValidationFailed {
                message: e.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_not_found_maps_to_core_not_found() {
        let err = CoreError::from(avx_api::Error::NotFound {
            name: "dev1".into(),
        });
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "device not found: dev1");
    }

    #[test]
    fn rejection_keeps_reason() {
        let err = CoreError::from(avx_api::Error::Api {
            action: "update_resource_tags".into(),
            reason: "tag key too long".into(),
        });
        match err {
            CoreError::Rejected { action, reason } => {
                assert_eq!(action, "update_resource_tags");
                assert_eq!(reason, "tag key too long");
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
    }
}
