//! Command dispatch: bridges CLI args -> core lifecycle calls -> output formatting.

pub mod config_cmd;
pub mod devices;
pub mod tags;
pub mod util;

use avx_core::ControllerClient;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a controller-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    client: &ControllerClient,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Tags(args) => tags::handle(client, args, global).await,
        Command::Devices(args) => devices::handle(client, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
