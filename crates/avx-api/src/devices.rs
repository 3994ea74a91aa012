// Device registration endpoints
//
// Register, read, update, and deregister network devices. Registration
// and update send every field; a key-file credential switches the request
// to multipart so the key travels as a file part.

use secrecy::ExposeSecret;
use serde::Serialize;
use tracing::debug;

use crate::client::ControllerClient;
use crate::error::Error;
use crate::models::{Device, DeviceCredential, HostOs};

pub const REGISTER_DEVICE_ACTION: &str = "register_cloudwan_device";
pub const GET_DEVICE_ACTION: &str = "get_cloudwan_device_details";
pub const UPDATE_DEVICE_ACTION: &str = "update_cloudwan_device_info";
pub const DEREGISTER_DEVICE_ACTION: &str = "deregister_cloudwan_device";

/// Multipart field carrying the private key file.
pub const KEY_FILE_FIELD: &str = "key_file";

/// Rejection reasons the controller uses for an unknown device.
const NOT_FOUND_REASONS: [&str; 3] = ["does not exist", "not found", "no device"];

#[derive(Serialize)]
struct DeviceForm<'a> {
    name: &'a str,
    public_ip: &'a str,
    username: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<&'a str>,
    host_os: HostOs,
    ssh_port: u16,
    address_1: &'a str,
    address_2: &'a str,
    city: &'a str,
    state: &'a str,
    country: &'a str,
    zip_code: &'a str,
    description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    software_version: Option<&'a str>,
}

impl<'a> From<&'a Device> for DeviceForm<'a> {
    fn from(d: &'a Device) -> Self {
        let password = match &d.credential {
            Some(DeviceCredential::Password(pw)) => Some(pw.expose_secret()),
            _ => None,
        };
        Self {
            name: &d.name,
            public_ip: &d.public_ip,
            username: &d.username,
            password,
            host_os: d.host_os,
            ssh_port: d.ssh_port,
            address_1: &d.address_1,
            address_2: &d.address_2,
            city: &d.city,
            state: &d.state,
            country: &d.country,
            zip_code: &d.zip_code,
            description: &d.description,
            software_version: d.software_version.as_deref(),
        }
    }
}

#[derive(Serialize)]
struct NameQuery<'a> {
    name: &'a str,
}

/// Device registration operations against one controller session.
pub struct DeviceClient<'c> {
    controller: &'c ControllerClient,
}

impl<'c> DeviceClient<'c> {
    pub fn new(controller: &'c ControllerClient) -> Self {
        Self { controller }
    }

    /// Register a device.
    ///
    /// `POST action=register_cloudwan_device`. Name collisions are the
    /// controller's call; nothing is checked locally.
    pub async fn register(&self, device: &Device) -> Result<(), Error> {
        debug!(name = %device.name, public_ip = %device.public_ip, "registering device");
        self.send(REGISTER_DEVICE_ACTION, device).await
    }

    /// Fetch a device by name.
    ///
    /// `GET action=get_cloudwan_device_details`. Every returned field comes
    /// from the controller. An unknown name yields `Error::NotFound`.
    pub async fn get(&self, name: &str) -> Result<Device, Error> {
        debug!(name, "fetching device");
        let result = self
            .controller
            .get::<Device, _>(GET_DEVICE_ACTION, &NameQuery { name })
            .await;

        match result {
            Ok(Some(device)) => Ok(device),
            Ok(None) => Err(Error::NotFound { name: name.into() }),
            Err(Error::Api { reason, .. }) if is_not_found_reason(&reason) => {
                debug!(name, %reason, "device not found");
                Err(Error::NotFound { name: name.into() })
            }
            Err(e) => Err(e),
        }
    }

    /// Overwrite a device's registration with every field of `device`.
    ///
    /// `POST action=update_cloudwan_device_info`. Name, public IP and host OS
    /// are sent as-is; the controller decides what to do with changes to them.
    pub async fn update(&self, device: &Device) -> Result<(), Error> {
        debug!(name = %device.name, "updating device");
        self.send(UPDATE_DEVICE_ACTION, device).await
    }

    /// Remove a device registration.
    ///
    /// `POST action=deregister_cloudwan_device`
    pub async fn deregister(&self, name: &str) -> Result<(), Error> {
        debug!(name, "deregistering device");
        self.controller
            .post(DEREGISTER_DEVICE_ACTION, &NameQuery { name })
            .await
    }

    async fn send(&self, action: &str, device: &Device) -> Result<(), Error> {
        let form = DeviceForm::from(device);
        match &device.credential {
            Some(DeviceCredential::KeyFile(path)) => {
                self.controller
                    .post_multipart(action, &form, KEY_FILE_FIELD, path)
                    .await
            }
            _ => self.controller.post(action, &form).await,
        }
    }
}

fn is_not_found_reason(reason: &str) -> bool {
    let reason = reason.to_ascii_lowercase();
    NOT_FOUND_REASONS.iter().any(|needle| reason.contains(needle))
}
