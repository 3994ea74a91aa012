// Controller API request and response types
//
// Every response is wrapped in the `{ return, results, reason }` envelope.
// Fields use `#[serde(default)]` liberally because the controller omits
// empty values rather than sending them.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use secrecy::SecretString;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::{AsRefStr, Display, EnumString};

// ── Response Envelope ────────────────────────────────────────────────

/// Standard controller response envelope.
///
/// ```json
/// { "return": true, "results": ..., "reason": "optional" }
/// ```
///
/// Unknown sibling keys are ignored.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(rename = "return")]
    pub ok: bool,
    #[serde(default = "Option::default")]
    pub results: Option<T>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Login response. The session token arrives as a top-level `CID` key.
#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    #[serde(rename = "return")]
    pub ok: bool,
    #[serde(default, rename = "CID")]
    pub cid: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

// ── Cloud type ───────────────────────────────────────────────────────

/// Cloud provider identifier, carried as a numeric code on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloudType {
    Aws,
    Gcp,
    Azure,
    Oci,
    AzureGov,
    AwsGov,
    AwsChina,
    AzureChina,
    AliCloud,
    AwsTopSecret,
    AwsSecret,
    Edge,
}

impl CloudType {
    pub const ALL: [Self; 12] = [
        Self::Aws,
        Self::Gcp,
        Self::Azure,
        Self::Oci,
        Self::AzureGov,
        Self::AwsGov,
        Self::AwsChina,
        Self::AzureChina,
        Self::AliCloud,
        Self::AwsTopSecret,
        Self::AwsSecret,
        Self::Edge,
    ];

    /// The numeric code the controller uses.
    pub fn code(self) -> u32 {
        match self {
            Self::Aws => 1,
            Self::Gcp => 4,
            Self::Azure => 8,
            Self::Oci => 16,
            Self::AzureGov => 32,
            Self::AwsGov => 256,
            Self::AwsChina => 1024,
            Self::AzureChina => 2048,
            Self::AliCloud => 8192,
            Self::AwsTopSecret => 16384,
            Self::AwsSecret => 32768,
            Self::Edge => 262_144,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.code() == code)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Aws => "aws",
            Self::Gcp => "gcp",
            Self::Azure => "azure",
            Self::Oci => "oci",
            Self::AzureGov => "azure-gov",
            Self::AwsGov => "aws-gov",
            Self::AwsChina => "aws-china",
            Self::AzureChina => "azure-china",
            Self::AliCloud => "alicloud",
            Self::AwsTopSecret => "aws-top-secret",
            Self::AwsSecret => "aws-secret",
            Self::Edge => "edge",
        }
    }
}

impl fmt::Display for CloudType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parses either the numeric code (`"1"`) or a case-insensitive name (`"AWS"`).
impl FromStr for CloudType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(code) = s.parse::<u32>() {
            return Self::from_code(code).ok_or_else(|| format!("unknown cloud type code {code}"));
        }
        let wanted = s.to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|c| c.name() == wanted)
            .ok_or_else(|| format!("unknown cloud type '{s}'"))
    }
}

impl Serialize for CloudType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.code())
    }
}

impl<'de> Deserialize<'de> for CloudType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = u32::deserialize(deserializer)?;
        Self::from_code(code)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown cloud type code {code}")))
    }
}

// ── Tags ─────────────────────────────────────────────────────────────

/// Category key holding user-defined tags in a `list_resource_tags` result.
pub const USER_TAGS: &str = "usr_tags";

/// Tags attached to one cloud resource.
///
/// The resource is identified by `(cloud_type, resource_type, resource_name)`.
/// `tags` is only filled in by a successful list; nothing here persists
/// between calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSet {
    pub cloud_type: CloudType,
    pub resource_type: String,
    pub resource_name: String,
    /// Delimiter-joined tag list. Sent as `del_tag_list` on delete and as
    /// `new_tag_list` on add/update when non-empty.
    pub tag_list: String,
    pub tags: HashMap<String, String>,
    /// JSON-encoded tag mapping for bulk add/update.
    pub tag_json: String,
}

impl TagSet {
    pub fn new(
        cloud_type: CloudType,
        resource_type: impl Into<String>,
        resource_name: impl Into<String>,
    ) -> Self {
        Self {
            cloud_type,
            resource_type: resource_type.into(),
            resource_name: resource_name.into(),
            tag_list: String::new(),
            tags: HashMap::new(),
            tag_json: String::new(),
        }
    }

    /// Set the tag mapping and its JSON payload together.
    pub fn with_tags(mut self, tags: HashMap<String, String>) -> Self {
        let payload: serde_json::Map<String, serde_json::Value> = tags
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect();
        self.tag_json = serde_json::Value::Object(payload).to_string();
        self.tags = tags;
        self
    }

    /// Set `tag_list` by joining the given entries with `,`.
    pub fn with_tag_list<I, S>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tag_list = entries
            .into_iter()
            .map(|e| e.as_ref().to_owned())
            .collect::<Vec<_>>()
            .join(",");
        self
    }
}

/// `results` of `list_resource_tags`: category name to tag mapping.
///
/// Only `usr_tags` is modelled; other categories are skipped unread.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct TagResults {
    #[serde(default, rename = "usr_tags")]
    pub user_tags: Option<HashMap<String, String>>,
}

// ── Device ───────────────────────────────────────────────────────────

/// Operating system of a registered device.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum HostOs {
    /// Generic network OS.
    #[default]
    Ios,
    /// Controller-managed OS; devices running it may be CaaG.
    Aviatrix,
}

/// How the controller authenticates to the device. Exactly one is sent.
#[derive(Debug, Clone)]
pub enum DeviceCredential {
    /// Path to a private key file, uploaded with the request.
    KeyFile(PathBuf),
    Password(SecretString),
}

pub const DEFAULT_SSH_PORT: u16 = 22;

fn default_ssh_port() -> u16 {
    DEFAULT_SSH_PORT
}

/// A registered network device.
///
/// `name` is the stable identifier. `software_version` and `is_caag` are
/// server-authoritative; the credential is write-only and never comes back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub public_ip: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub username: String,
    #[serde(skip)]
    pub credential: Option<DeviceCredential>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub host_os: HostOs,
    #[serde(default = "default_ssh_port", deserialize_with = "de_port")]
    pub ssh_port: u16,
    #[serde(default, deserialize_with = "null_as_default")]
    pub address_1: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub address_2: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub city: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub state: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub country: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub zip_code: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub software_version: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_caag: bool,
}

impl Device {
    /// A device with only its identifier set, as used for lookups.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            public_ip: String::new(),
            username: String::new(),
            credential: None,
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
            is_caag: false,
        }
    }
}

/// Empty fields sometimes arrive as `null` rather than being omitted.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// The controller reports `ssh_port` as a number on some versions and a
/// string on others.
fn de_port<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u16, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Number(u16),
        Text(String),
    }

    match Option::<Port>::deserialize(deserializer)? {
        None => Ok(DEFAULT_SSH_PORT),
        Some(Port::Number(n)) => Ok(n),
        Some(Port::Text(s)) if s.trim().is_empty() => Ok(DEFAULT_SSH_PORT),
        Some(Port::Text(s)) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid ssh_port '{s}'"))),
    }
}

// ── Gateway ──────────────────────────────────────────────────────────

/// Target of a gateway-scoped software upgrade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Gateway {
    #[serde(rename = "gateway_name")]
    pub gw_name: String,
    pub software_version: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn cloud_type_parses_codes_and_names() {
        assert_eq!("1".parse::<CloudType>().unwrap(), CloudType::Aws);
        assert_eq!("AZURE".parse::<CloudType>().unwrap(), CloudType::Azure);
        assert_eq!("aws_gov".parse::<CloudType>().unwrap(), CloudType::AwsGov);
        assert!("3".parse::<CloudType>().is_err());
        assert!("mainframe".parse::<CloudType>().is_err());
    }

    #[test]
    fn cloud_type_serializes_as_code() {
        assert_eq!(serde_json::to_string(&CloudType::Gcp).unwrap(), "4");
        let parsed: CloudType = serde_json::from_str("262144").unwrap();
        assert_eq!(parsed, CloudType::Edge);
    }

    #[test]
    fn tag_set_builds_json_payload() {
        let tags = HashMap::from([("env".to_owned(), "prod".to_owned())]);
        let set = TagSet::new(CloudType::Aws, "vpc", "vpc-1").with_tags(tags);
        assert_eq!(set.tag_json, r#"{"env":"prod"}"#);
        assert_eq!(set.tags.get("env").map(String::as_str), Some("prod"));
    }

    #[test]
    fn tag_list_is_comma_joined() {
        let set = TagSet::new(CloudType::Aws, "vpc", "vpc-1").with_tag_list(["a", "b"]);
        assert_eq!(set.tag_list, "a,b");
    }

    #[test]
    fn device_tolerates_string_port_and_missing_fields() {
        let device: Device = serde_json::from_value(serde_json::json!({
            "name": "dev1",
            "public_ip": "1.2.3.4",
            "ssh_port": "2222",
            "host_os": "aviatrix",
            "is_caag": true,
            "unexpected": {"nested": 1}
        }))
        .unwrap();
        assert_eq!(device.ssh_port, 2222);
        assert_eq!(device.host_os, HostOs::Aviatrix);
        assert!(device.is_caag);
        assert!(device.city.is_empty());
        assert!(device.credential.is_none());
    }

    #[test]
    fn device_tolerates_null_fields() {
        let device: Device = serde_json::from_value(serde_json::json!({
            "name": "dev1",
            "public_ip": "1.2.3.4",
            "ssh_port": null,
            "city": null,
            "host_os": null,
            "software_version": null,
            "is_caag": null
        }))
        .unwrap();
        assert_eq!(device.ssh_port, DEFAULT_SSH_PORT);
        assert!(device.city.is_empty());
        assert_eq!(device.host_os, HostOs::Ios);
        assert!(device.software_version.is_none());
        assert!(!device.is_caag);
    }

    #[test]
    fn device_defaults_port_when_absent() {
        let device: Device = serde_json::from_str(r#"{"name":"dev1"}"#).unwrap();
        assert_eq!(device.ssh_port, DEFAULT_SSH_PORT);
        assert_eq!(device.host_os, HostOs::Ios);
    }

    #[test]
    fn host_os_round_trips_through_strum() {
        assert_eq!(HostOs::Aviatrix.as_ref(), "aviatrix");
        assert_eq!("IOS".parse::<HostOs>().unwrap(), HostOs::Ios);
    }
}
