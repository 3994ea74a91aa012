//! Shared configuration for avx tools.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `avx_core::ConnectionConfig`. The CLI layers its
//! `GlobalOpts` overrides on top of what this crate resolves.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use avx_core::{ConnectionConfig, TlsVerification};

/// Keyring service name under which passwords are stored.
pub const KEYRING_SERVICE: &str = "avx";

/// Prefix of every environment override.
pub const ENV_PREFIX: &str = "AVX_";

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{name}' not found (available: {available})")]
    ProfileNotFound { name: String, available: String },

    #[error("keyring error: {0}")]
    Keyring(String),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl From<keyring::Error> for ConfigError {
    fn from(err: keyring::Error) -> Self {
        Self::Keyring(err.to_string())
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named controller profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Name of the profile to use when none is given explicitly.
    pub fn default_profile_name(&self) -> &str {
        self.default_profile.as_deref().unwrap_or("default")
    }

    /// Look up a profile, listing what exists when it is missing.
    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::ProfileNotFound {
                name: name.into(),
                available: self.available_profiles(),
            })
    }

    fn available_profiles(&self) -> String {
        if self.profiles.is_empty() {
            return "(none)".into();
        }
        let mut names: Vec<&str> = self.profiles.keys().map(String::as_str).collect();
        names.sort_unstable();
        names.join(", ")
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// A named controller profile.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Controller base URL (e.g., "https://controller.example.com").
    pub controller: String,

    /// Controller login name.
    pub username: Option<String>,

    /// Password (plaintext, prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout (seconds).
    pub timeout: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "avx", "avx").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("avx");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config from `path`, then apply `AVX_` overrides.
///
/// Nested keys use `__`: `AVX_DEFAULTS__TIMEOUT=5` sets `defaults.timeout`.
/// A missing file is not an error.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if it cannot be read.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, keyring::Error> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password"))
}

/// Store a profile's password in the system keyring.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?.set_password(password)?;
    Ok(())
}

/// Resolve the controller username for a profile (profile, then `AVX_USERNAME`).
pub fn resolve_username(profile: &Profile, profile_name: &str) -> Result<String, ConfigError> {
    profile
        .username
        .clone()
        .filter(|u| !u.is_empty())
        .or_else(|| std::env::var("AVX_USERNAME").ok())
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })
}

/// Resolve the controller password from the credential chain.
pub fn resolve_password(
    profile: &Profile,
    profile_name: &str,
) -> Result<SecretString, ConfigError> {
    // 1. Profile's password_env → env var lookup
    if let Some(ref env_name) = profile.password_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. AVX_PASSWORD
    if let Ok(pw) = std::env::var("AVX_PASSWORD") {
        return Ok(SecretString::from(pw));
    }

    // 3. System keyring
    if let Ok(entry) = keyring_entry(profile_name) {
        if let Ok(pw) = entry.get_password() {
            return Ok(SecretString::from(pw));
        }
    }

    // 4. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Resolve username + password without CLI flags.
pub fn resolve_credentials(
    profile: &Profile,
    profile_name: &str,
) -> Result<(String, SecretString), ConfigError> {
    let username = resolve_username(profile, profile_name)?;
    let password = resolve_password(profile, profile_name)?;
    Ok((username, password))
}

/// TLS strategy for a profile. `insecure` wins over a CA file.
pub fn profile_tls(profile: &Profile, insecure_default: bool) -> TlsVerification {
    if profile.insecure.unwrap_or(insecure_default) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    }
}

/// Parse a controller URL, naming the field on failure.
pub fn parse_controller_url(raw: &str) -> Result<url::Url, ConfigError> {
    let url: url::Url = raw.parse().map_err(|_| ConfigError::Validation {
        field: "controller".into(),
        reason: format!("invalid URL: {raw}"),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "controller".into(),
            reason: format!("expected an http(s) URL, got '{raw}'"),
        });
    }
    Ok(url)
}

/// Build a `ConnectionConfig` from a profile. No CLI flag overrides.
pub fn profile_to_connection_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<ConnectionConfig, ConfigError> {
    let url = parse_controller_url(&profile.controller)?;
    let (username, password) = resolve_credentials(profile, profile_name)?;

    Ok(ConnectionConfig {
        url,
        username,
        password,
        tls: profile_tls(profile, defaults.insecure),
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
    })
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    fn jail_err(e: impl std::fmt::Display) -> figment::Error {
        figment::Error::from(e.to_string())
    }

    #[test]
    fn missing_file_yields_defaults() {
        figment::Jail::expect_with(|_jail| {
            let cfg = load_config_from(Path::new("absent.toml")).map_err(jail_err)?;
            assert_eq!(cfg.default_profile_name(), "default");
            assert_eq!(cfg.defaults.timeout, DEFAULT_TIMEOUT_SECS);
            assert_eq!(cfg.defaults.output, "table");
            assert!(cfg.profiles.is_empty());
            Ok(())
        });
    }

    #[test]
    fn file_profiles_and_env_overrides_merge() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                default_profile = "lab"

                [defaults]
                timeout = 10

                [profiles.lab]
                controller = "https://ctrl.lab.example"
                username = "admin"
                insecure = true
                "#,
            )?;
            jail.set_env("AVX_DEFAULTS__TIMEOUT", "5");
            jail.set_env("AVX_PROFILES__LAB__USERNAME", "ops");

            let cfg = load_config_from(Path::new("config.toml")).map_err(jail_err)?;
            assert_eq!(cfg.default_profile_name(), "lab");
            assert_eq!(cfg.defaults.timeout, 5);

            let lab = cfg.profile("lab").map_err(jail_err)?;
            assert_eq!(lab.controller, "https://ctrl.lab.example");
            assert_eq!(lab.username.as_deref(), Some("ops"));
            assert_eq!(profile_tls(lab, false), TlsVerification::DangerAcceptInvalid);
            Ok(())
        });
    }

    #[test]
    fn unknown_profile_lists_available() {
        let mut cfg = Config::default();
        cfg.profiles.insert("prod".into(), Profile::default());
        cfg.profiles.insert("lab".into(), Profile::default());

        match cfg.profile("staging") {
            Err(ConfigError::ProfileNotFound { available, .. }) => {
                assert_eq!(available, "lab, prod");
            }
            other => panic!("expected ProfileNotFound, got {other:?}"),
        }
    }

    #[test]
    fn password_env_wins_over_plaintext() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("LAB_CTRL_PASSWORD", "from-env");
            let profile = Profile {
                controller: "https://ctrl.example".into(),
                username: Some("admin".into()),
                password: Some("plaintext".into()),
                password_env: Some("LAB_CTRL_PASSWORD".into()),
                ..Profile::default()
            };
            let (user, pw) = resolve_credentials(&profile, "lab").map_err(jail_err)?;
            assert_eq!(user, "admin");
            assert_eq!(pw.expose_secret(), "from-env");
            Ok(())
        });
    }

    #[test]
    fn avx_password_env_is_used() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("AVX_PASSWORD", "generic");
            let profile = Profile {
                username: Some("admin".into()),
                ..Profile::default()
            };
            let pw = resolve_password(&profile, "lab").map_err(jail_err)?;
            assert_eq!(pw.expose_secret(), "generic");
            Ok(())
        });
    }

    #[test]
    fn missing_username_is_no_credentials() {
        figment::Jail::expect_with(|_jail| {
            let profile = Profile::default();
            assert!(matches!(
                resolve_username(&profile, "lab"),
                Err(ConfigError::NoCredentials { .. })
            ));
            Ok(())
        });
    }

    #[test]
    fn connection_config_uses_profile_and_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("AVX_PASSWORD", "pw");
            let profile = Profile {
                controller: "https://ctrl.example".into(),
                username: Some("admin".into()),
                ca_cert: Some("/etc/avx/ca.pem".into()),
                ..Profile::default()
            };
            let defaults = Defaults {
                timeout: 12,
                ..Defaults::default()
            };
            let cc = profile_to_connection_config(&profile, "lab", &defaults).map_err(jail_err)?;
            assert_eq!(cc.url.as_str(), "https://ctrl.example/");
            assert_eq!(cc.timeout, Duration::from_secs(12));
            assert_eq!(cc.tls, TlsVerification::CustomCa("/etc/avx/ca.pem".into()));
            Ok(())
        });
    }

    #[test]
    fn controller_url_must_be_http() {
        assert!(parse_controller_url("https://ctrl.example").is_ok());
        assert!(parse_controller_url("ftp://ctrl.example").is_err());
        assert!(parse_controller_url("not a url").is_err());
    }

    #[test]
    fn save_then_load_keeps_profiles() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("{e}"));
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.profiles.insert(
            "lab".into(),
            Profile {
                controller: "https://ctrl.example".into(),
                username: Some("admin".into()),
                ..Profile::default()
            },
        );
        save_config_to(&cfg, &path).unwrap_or_else(|e| panic!("{e}"));

        let text = std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("{e}"));
        let loaded: Config = toml::from_str(&text).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(
            loaded.profiles.get("lab").map(|p| p.controller.as_str()),
            Some("https://ctrl.example")
        );
    }
}
