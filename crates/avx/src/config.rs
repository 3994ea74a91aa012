//! CLI configuration: thin wrapper around `avx_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--controller, --username, etc.).

use std::time::Duration;

use avx_core::{ConnectionConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use avx_config::{
    Config, Profile, config_path, load_config_or_default, parse_controller_url, save_config,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .unwrap_or_else(|| config.default_profile_name().to_owned())
}

/// Build a `ConnectionConfig` from the config file, profile, and CLI overrides.
///
/// Flag values take priority over profile values, which take priority over
/// `[defaults]`. Without a matching profile, `--controller` is required and
/// credentials come from flags and the environment alone.
pub fn resolve_connection(global: &GlobalOpts) -> Result<ConnectionConfig, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    let fallback = Profile::default();
    // An explicitly requested profile must exist.
    let profile = if global.profile.is_some() {
        cfg.profile(&profile_name)?
    } else {
        cfg.profiles.get(&profile_name).unwrap_or(&fallback)
    };

    // 1. Controller URL (flag > env > profile)
    let url_str = global
        .controller
        .as_deref()
        .filter(|c| !c.is_empty())
        .or_else(|| Some(profile.controller.as_str()).filter(|c| !c.is_empty()))
        .ok_or_else(|| CliError::NoConfig {
            path: config_path().display().to_string(),
        })?;
    let url = parse_controller_url(url_str)?;

    // 2. Credentials (flag > env > profile chain)
    let username = match global.username.clone() {
        Some(username) => username,
        None => avx_config::resolve_username(profile, &profile_name)?,
    };
    let password = avx_config::resolve_password(profile, &profile_name)?;

    // 3. TLS verification
    let tls = if global.insecure {
        TlsVerification::DangerAcceptInvalid
    } else {
        avx_config::profile_tls(profile, cfg.defaults.insecure)
    };

    // 4. Timeout
    let timeout = global
        .timeout
        .or(profile.timeout)
        .unwrap_or(cfg.defaults.timeout);

    Ok(ConnectionConfig {
        url,
        username,
        password,
        tls,
        timeout: Duration::from_secs(timeout),
    })
}
