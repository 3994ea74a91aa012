//! Shared helpers for command handlers.

use std::io::IsTerminal;

use avx_core::CloudType;

use crate::error::CliError;

/// Parse a `--cloud-type` value (name or numeric code).
pub fn parse_cloud_type(raw: &str) -> Result<CloudType, CliError> {
    raw.parse().map_err(|_| CliError::Validation {
        field: "cloud-type".into(),
        reason: format!(
            "unknown cloud type '{raw}'; expected one of: {}",
            CloudType::ALL
                .iter()
                .map(|ct| format!("{ct} ({})", ct.code()))
                .collect::<Vec<_>>()
                .join(", ")
        ),
    })
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Without a terminal there is nobody to ask, so `--yes` is required.
pub fn confirm(message: &str, action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}
