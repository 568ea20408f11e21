//! Validate command - Check checkpoint options before a job is submitted.

use anyhow::{Context, Result};
use spoke_api::environment::StreamEnvironment;
use std::path::Path;
use tracing::{info, warn};

use crate::options_file;
use crate::Format;

pub fn execute(file: &Path, name: String, format: Format) -> Result<()> {
    let options = options_file::load(file)?;
    info!(file = %file.display(), options = options.len(), "Loaded checkpoint options");

    let env = StreamEnvironment::builder(name)
        .options(options)
        .build()
        .with_context(|| format!("Invalid checkpoint options in {}", file.display()))?;

    let config = env.checkpoint_config();
    if !config.is_checkpointing_enabled() {
        warn!("Checkpointing is disabled; set execution.checkpointing.interval to enable it");
    }

    let job = env.build();
    super::print_config(job.name(), job.checkpoint_config(), format)
}
