// ── Device registration lifecycle ──
//
// The caller-side contract around `DeviceClient`: input validation,
// not-found-as-absent reads, idempotent deletes, and the two-step
// CaaG software upgrade (device update, then a gateway-scoped upgrade).

use std::net::IpAddr;
use std::path::PathBuf;

use secrecy::SecretString;
use tracing::{debug, info, warn};

use avx_api::{
    ControllerClient, DEFAULT_SSH_PORT, Device, DeviceClient, DeviceCredential, Gateway,
    GatewayClient, HostOs,
};

use crate::error::CoreError;

/// Desired state of a device registration, as supplied by the caller.
#[derive(Debug, Clone)]
pub struct DeviceSpec {
    pub name: String,
    pub public_ip: String,
    pub username: String,
    pub key_file: Option<PathBuf>,
    pub password: Option<SecretString>,
    pub host_os: HostOs,
    pub ssh_port: u16,
    pub address_1: String,
    pub address_2: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub zip_code: String,
    pub description: String,
    /// Desired CaaG software version. `None` leaves the version alone.
    pub software_version: Option<String>,
}

impl Default for DeviceSpec {
    fn default() -> Self {
        Self {
            name: String::new(),
            public_ip: String::new(),
            username: String::new(),
            key_file: None,
            password: None,
            host_os: HostOs::default(),
            ssh_port: DEFAULT_SSH_PORT,
            address_1: String::new(),
            address_2: String::new(),
            city: String::new(),
            state: String::new(),
            country: String::new(),
            zip_code: String::new(),
            description: String::new(),
            software_version: None,
        }
    }
}

impl DeviceSpec {
    /// Check the fields and build the wire-level `Device`.
    ///
    /// Requires a name, a username, a valid IP address, a non-zero port, and
    /// exactly one of key file or password.
    pub fn validate(&self) -> Result<Device, CoreError> {
        if self.name.trim().is_empty() {
            return Err(invalid("device name must not be empty"));
        }
        if self.username.trim().is_empty() {
            return Err(invalid("username must not be empty"));
        }
        if self.public_ip.parse::<IpAddr>().is_err() {
            return Err(invalid(format!(
                "public_ip '{}' is not a valid IP address",
                self.public_ip
            )));
        }
        if self.ssh_port == 0 {
            return Err(invalid("ssh_port must be between 1 and 65535"));
        }

        let credential = match (&self.key_file, &self.password) {
            (Some(path), None) => DeviceCredential::KeyFile(path.clone()),
            (None, Some(password)) => DeviceCredential::Password(password.clone()),
            (Some(_), Some(_)) => {
                return Err(invalid("only one of key_file or password may be set"));
            }
            (None, None) => return Err(invalid("one of key_file or password is required")),
        };

        Ok(Device {
            name: self.name.clone(),
            public_ip: self.public_ip.clone(),
            username: self.username.clone(),
            credential: Some(credential),
            host_os: self.host_os,
            ssh_port: self.ssh_port,
            address_1: self.address_1.clone(),
            address_2: self.address_2.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            country: self.country.clone(),
            zip_code: self.zip_code.clone(),
            description: self.description.clone(),
            software_version: self.software_version.clone(),
            is_caag: false,
        })
    }

    /// The requested version, if it differs from what the controller reports.
    fn version_change<'a>(&'a self, prior: &Device) -> Option<&'a str> {
        let desired = self.software_version.as_deref().filter(|v| !v.is_empty())?;
        (prior.software_version.as_deref() != Some(desired)).then_some(desired)
    }
}

fn invalid(message: impl Into<String>) -> CoreError {
    CoreError::ValidationFailed {
        message: message.into(),
    }
}

/// Create/read/update/delete of device registrations.
pub struct DeviceRegistrations<'c> {
    devices: DeviceClient<'c>,
    gateways: GatewayClient<'c>,
}

impl<'c> DeviceRegistrations<'c> {
    pub fn new(controller: &'c ControllerClient) -> Self {
        Self {
            devices: controller.devices(),
            gateways: controller.gateways(),
        }
    }

    /// Register a device and return its identifier (the name).
    ///
    /// `software_version` is not part of a registration; the controller
    /// reports the version the device actually runs.
    pub async fn create(&self, spec: &DeviceSpec) -> Result<String, CoreError> {
        let mut device = spec.validate()?;
        device.software_version = None;
        self.devices.register(&device).await?;
        info!(name = %device.name, "device registered");
        Ok(device.name)
    }

    /// Read a device. `None` means the controller no longer has it.
    pub async fn read(&self, name: &str) -> Result<Option<Device>, CoreError> {
        match self.devices.get(name).await {
            Ok(device) => Ok(Some(device)),
            Err(e) if e.is_not_found() => {
                debug!(name, "device absent");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Bring an existing registration to `spec`.
    ///
    /// `prior` is the last state read from the controller. A software version
    /// change is only accepted for CaaG devices and is rejected before any
    /// request is sent. The device update goes first, then the upgrade is
    /// issued against the gateway of the same name.
    pub async fn update(&self, prior: &Device, spec: &DeviceSpec) -> Result<(), CoreError> {
        let mut device = spec.validate()?;
        check_immutable("name", &prior.name, &device.name)?;
        check_immutable("public_ip", &prior.public_ip, &device.public_ip)?;
        check_immutable("host_os", prior.host_os.as_ref(), device.host_os.as_ref())?;

        let upgrade = spec.version_change(prior);
        if upgrade.is_some() && !prior.is_caag {
            return Err(CoreError::SoftwareVersionNotUpgradable {
                device: prior.name.clone(),
            });
        }

        // Versions move through the gateway upgrade, not the device record.
        device.software_version = None;
        self.devices.update(&device).await?;
        info!(name = %device.name, "device registration updated");

        if let Some(version) = upgrade {
            let gateway = Gateway {
                gw_name: device.name.clone(),
                software_version: version.to_owned(),
            };
            self.gateways.upgrade(&gateway).await.map_err(|e| {
                warn!(gateway = %gateway.gw_name, error = %e, "CaaG upgrade failed");
                CoreError::UpgradeFailed {
                    gateway: gateway.gw_name.clone(),
                    version: gateway.software_version.clone(),
                    reason: e.to_string(),
                }
            })?;
            info!(gateway = %gateway.gw_name, version, "CaaG upgrade requested");
        }

        Ok(())
    }

    /// Deregister a device. Already absent counts as success.
    pub async fn delete(&self, name: &str) -> Result<(), CoreError> {
        if self.read(name).await?.is_none() {
            info!(name, "device already deregistered");
            return Ok(());
        }
        self.devices.deregister(name).await?;
        info!(name, "device deregistered");
        Ok(())
    }
}

fn check_immutable(field: &'static str, from: &str, to: &str) -> Result<(), CoreError> {
    if from == to {
        Ok(())
    } else {
        Err(CoreError::ImmutableField {
            field,
            from: from.to_owned(),
            to: to.to_owned(),
        })
    }
}
