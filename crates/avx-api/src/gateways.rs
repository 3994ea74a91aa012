// Gateway endpoints
//
// Only the software upgrade is modelled. A CaaG device's version is
// changed through its gateway, keyed by the device name.

use tracing::debug;

use crate::client::ControllerClient;
use crate::error::Error;
use crate::models::Gateway;

pub const UPGRADE_GATEWAY_ACTION: &str = "upgrade_gateway";

pub struct GatewayClient<'c> {
    controller: &'c ControllerClient,
}

impl<'c> GatewayClient<'c> {
    pub fn new(controller: &'c ControllerClient) -> Self {
        Self { controller }
    }

    /// Upgrade a gateway to `software_version`.
    ///
    /// `POST action=upgrade_gateway` with `gateway_name` and `software_version`.
    /// The controller runs the upgrade asynchronously; this returns once it is accepted.
    pub async fn upgrade(&self, gateway: &Gateway) -> Result<(), Error> {
        debug!(
            gateway = %gateway.gw_name,
            version = %gateway.software_version,
            "upgrading gateway"
        );
        self.controller.post(UPGRADE_GATEWAY_ACTION, gateway).await
    }
}
