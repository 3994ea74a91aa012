//! Device registration command handlers.

use std::io::IsTerminal;

use secrecy::SecretString;

use avx_core::{ControllerClient, Device, DeviceRegistrations, DeviceSpec, HostOs};

use crate::cli::{DeviceArgs, DevicesArgs, DevicesCommand, GlobalOpts, HostOsArg};
use crate::error::CliError;
use crate::output;

use super::util;

/// Environment fallback for the device SSH password.
const DEVICE_PASSWORD_ENV: &str = "AVX_DEVICE_PASSWORD";

fn detail(d: &Device) -> String {
    let or_dash = |s: &str| if s.is_empty() { "-".to_owned() } else { s.to_owned() };
    let address = [&d.address_1, &d.address_2, &d.city, &d.state, &d.zip_code, &d.country]
        .iter()
        .filter(|part| !part.is_empty())
        .map(|part| part.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    [
        format!("Name:        {}", d.name),
        format!("Public IP:   {}", or_dash(&d.public_ip)),
        format!("Username:    {}", or_dash(&d.username)),
        format!("Host OS:     {}", d.host_os),
        format!("SSH Port:    {}", d.ssh_port),
        format!("Address:     {}", or_dash(&address)),
        format!("Description: {}", or_dash(&d.description)),
        format!(
            "Software:    {}",
            d.software_version.as_deref().unwrap_or("-")
        ),
        format!("CaaG:        {}", if d.is_caag { "yes" } else { "no" }),
    ]
    .join("\n")
}

fn host_os(arg: HostOsArg) -> HostOs {
    match arg {
        HostOsArg::Ios => HostOs::Ios,
        HostOsArg::Aviatrix => HostOs::Aviatrix,
    }
}

/// Device password: flag, then `AVX_DEVICE_PASSWORD`, then an interactive prompt.
///
/// A key file suppresses the fallbacks so only one credential is sent.
fn device_password(args: &DeviceArgs) -> Result<Option<SecretString>, CliError> {
    if let Some(ref pw) = args.password {
        return Ok(Some(SecretString::from(pw.clone())));
    }
    if args.key_file.is_some() {
        return Ok(None);
    }
    if let Ok(pw) = std::env::var(DEVICE_PASSWORD_ENV) {
        return Ok(Some(SecretString::from(pw)));
    }
    if std::io::stdin().is_terminal() {
        let pw = rpassword::prompt_password(format!("SSH password for {}: ", args.name))?;
        return Ok(Some(SecretString::from(pw)));
    }
    Ok(None)
}

fn device_spec(args: DeviceArgs) -> Result<DeviceSpec, CliError> {
    let password = device_password(&args)?;
    Ok(DeviceSpec {
        name: args.name,
        public_ip: args.public_ip,
        username: args.username,
        key_file: args.key_file,
        password,
        host_os: host_os(args.host_os),
        ssh_port: args.ssh_port,
        address_1: args.address_1,
        address_2: args.address_2,
        city: args.city,
        state: args.state,
        country: args.country,
        zip_code: args.zip_code,
        description: args.description,
        software_version: args.software_version,
    })
}

fn not_found(name: String) -> CliError {
    CliError::NotFound {
        resource_type: "device".into(),
        identifier: name,
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    client: &ControllerClient,
    args: DevicesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let devices = DeviceRegistrations::new(client);

    match args.command {
        DevicesCommand::Get { name } => {
            let device = devices.read(&name).await?.ok_or_else(|| not_found(name))?;
            let out = output::render_single(&global.output, &device, detail, |d| d.name.clone());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Register(args) => {
            let spec = device_spec(args)?;
            let name = devices.create(&spec).await?;
            output::status(&format!("Device '{name}' registered"), global.quiet);
            Ok(())
        }

        DevicesCommand::Update(args) => {
            let prior = devices
                .read(&args.name)
                .await?
                .ok_or_else(|| not_found(args.name.clone()))?;
            let spec = device_spec(args)?;
            devices.update(&prior, &spec).await?;
            output::status(&format!("Device '{}' updated", spec.name), global.quiet);
            if let Some(version) = spec
                .software_version
                .as_deref()
                .filter(|v| !v.is_empty() && prior.software_version.as_deref() != Some(*v))
            {
                output::status(
                    &format!("Upgrade to {version} requested on gateway '{}'", spec.name),
                    global.quiet,
                );
            }
            Ok(())
        }

        DevicesCommand::Deregister { name } => {
            if !util::confirm(
                &format!("Deregister device {name}?"),
                "devices deregister",
                global.yes,
            )? {
                return Ok(());
            }
            devices.delete(&name).await?;
            output::status(&format!("Device '{name}' deregistered"), global.quiet);
            Ok(())
        }
    }
}
