//! Defaults command - Print the default checkpoint configuration.

use anyhow::Result;
use spoke_checkpoint::CheckpointConfig;

use crate::Format;

pub fn execute(format: Format) -> Result<()> {
    super::print_config("defaults", &CheckpointConfig::default(), format)
}
