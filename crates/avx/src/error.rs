//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use avx_config::ConfigError;
use avx_core::CoreError;

/// Process exit codes. Success is 0.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to controller at {url}")]
    #[diagnostic(
        code(avx::connection_failed),
        help(
            "Check that the controller is running and reachable.\n\
             For self-signed certificates try --insecure (-k) or set ca_cert in the profile."
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Request timed out")]
    #[diagnostic(
        code(avx::timeout),
        help("Increase the timeout with --timeout or check controller responsiveness.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(avx::auth_failed),
        help(
            "Verify the username and password.\n\
             Store a new password with: avx config set-password"
        )
    )]
    AuthFailed { message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(avx::no_credentials),
        help(
            "Configure credentials with: avx config init\n\
             Or set AVX_USERNAME and AVX_PASSWORD."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(code(avx::not_found))]
    NotFound {
        resource_type: String,
        identifier: String,
    },

    #[error("Controller rejected {action}: {reason}")]
    #[diagnostic(code(avx::rejected))]
    Rejected { action: String, reason: String },

    #[error("Device '{device}' is not a CaaG device; its software version cannot be changed")]
    #[diagnostic(
        code(avx::not_caag),
        help("Only controller-managed (CaaG) devices are upgraded through their gateway.")
    )]
    NotUpgradable { device: String },

    #[error("'{field}' cannot be changed on an existing device ({from} -> {to})")]
    #[diagnostic(
        code(avx::immutable_field),
        help("Deregister the device and register it again with the new value.")
    )]
    ImmutableField {
        field: String,
        from: String,
        to: String,
    },

    #[error("Device updated, but upgrading gateway {gateway} to {version} failed: {reason}")]
    #[diagnostic(
        code(avx::upgrade_failed),
        help("The device record was updated. Retry the update to re-issue the upgrade.")
    )]
    UpgradeFailed {
        gateway: String,
        version: String,
        reason: String,
    },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error: {message}")]
    #[diagnostic(code(avx::api_error))]
    ApiError { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(avx::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(avx::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: avx config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No controller configured")]
    #[diagnostic(
        code(avx::no_config),
        help(
            "Create a profile with: avx config init\n\
             Or pass --controller. Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(avx::config))]
    Config(ConfigError),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(avx::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. }
            | Self::NonInteractiveRequiresYes { .. }
            | Self::NotUpgradable { .. }
            | Self::ImmutableField { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed {
                url,
                source: reason.into(),
            },
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },
            CoreError::Timeout => CliError::Timeout,
            CoreError::NotFound {
                entity_type,
                identifier,
            } => CliError::NotFound {
                resource_type: entity_type,
                identifier,
            },
            CoreError::Rejected { action, reason } => CliError::Rejected { action, reason },
            CoreError::ValidationFailed { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },
            CoreError::SoftwareVersionNotUpgradable { device } => {
                CliError::NotUpgradable { device }
            }
            CoreError::ImmutableField { field, from, to } => CliError::ImmutableField {
                field: field.into(),
                from,
                to,
            },
            CoreError::UpgradeFailed {
                gateway,
                version,
                reason,
            } => CliError::UpgradeFailed {
                gateway,
                version,
                reason,
            },
            CoreError::Api {
                message,
                status: Some(status),
            } => CliError::ApiError {
                message: format!("HTTP {status}: {message}"),
            },
            CoreError::Api {
                message,
                status: None,
            } => CliError::ApiError { message },
            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::ProfileNotFound { name, available } => {
                CliError::ProfileNotFound { name, available }
            }
            other => CliError::Config(other),
        }
    }
}
