// avx-api: Async Rust client for the controller's tag and device registration APIs

pub mod auth;
pub mod client;
pub mod devices;
pub mod error;
pub mod gateways;
pub mod models;
pub mod tags;
pub mod transport;

pub use auth::Session;
pub use client::ControllerClient;
pub use devices::DeviceClient;
pub use error::Error;
pub use gateways::GatewayClient;
pub use models::{
    CloudType, DEFAULT_SSH_PORT, Device, DeviceCredential, Gateway, HostOs, TagSet, USER_TAGS,
};
pub use tags::TagClient;
pub use transport::{TlsMode, TransportConfig};
