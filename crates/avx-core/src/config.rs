// ── Runtime connection configuration ──
//
// These types describe *how* to reach a controller. They carry credential
// data and connection tuning, but never touch disk. The CLI builds a
// `ConnectionConfig` and hands it in.

use std::time::Duration;

use secrecy::SecretString;
use tracing::info;
use url::Url;

use avx_api::{ControllerClient, TlsMode, TransportConfig};

use crate::error::CoreError;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed certs).
    DangerAcceptInvalid,
}

impl From<&TlsVerification> for TlsMode {
    fn from(tls: &TlsVerification) -> Self {
        match tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        }
    }
}

/// Configuration for connecting to a single controller.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Controller URL (e.g., `https://controller.example.com`).
    pub url: Url,
    pub username: String,
    pub password: SecretString,
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: Duration,
}

impl ConnectionConfig {
    pub fn transport(&self) -> TransportConfig {
        TransportConfig::default()
            .with_tls(TlsMode::from(&self.tls))
            .with_timeout(self.timeout)
    }
}

/// Log in once and return a client bound to the new session.
pub async fn connect(config: &ConnectionConfig) -> Result<ControllerClient, CoreError> {
    info!(controller = %config.url, username = %config.username, "connecting to controller");
    let client = ControllerClient::login(
        config.url.clone(),
        &config.username,
        &config.password,
        &config.transport(),
    )
    .await
    .map_err(|e| match e {
        avx_api::Error::Transport(ref inner) if inner.is_connect() => {
            CoreError::ConnectionFailed {
                url: config.url.to_string(),
                reason: inner.to_string(),
            }
        }
        other => CoreError::from(other),
    })?;
    info!("controller session established");
    Ok(client)
}
