// avx-core: Resource lifecycle layer between avx-api and consumers (CLI, automation).

pub mod config;
pub mod device;
pub mod error;
pub mod tags;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{ConnectionConfig, TlsVerification, connect};
pub use device::{DeviceRegistrations, DeviceSpec};
pub use error::CoreError;
pub use tags::{ResourceRef, ResourceTags};

// Wire types callers need alongside the lifecycle API.
pub use avx_api::{CloudType, ControllerClient, Device, HostOs};
