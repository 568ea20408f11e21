//! CLI subcommands.

pub mod defaults;
pub mod validate;

use anyhow::Result;
use spoke_checkpoint::CheckpointConfig;

use crate::Format;

pub(crate) fn print_config(name: &str, config: &CheckpointConfig, format: Format) -> Result<()> {
    match format {
        Format::Json => print_json(name, config),
        Format::Table => {
            print_table(name, config);
            Ok(())
        }
    }
}

fn print_table(name: &str, config: &CheckpointConfig) {
    let options = config.to_options();
    let width = options.keys().map(|k| k.len()).max().unwrap_or(0);

    println!("Checkpoint configuration for {}", name);
    println!("{}", "=".repeat(width + 30));
    println!("{:<width$}  {}", "Option", "Value", width = width);
    println!("{}", "-".repeat(width + 30));
    for (key, value) in &options {
        println!("{:<width$}  {}", key, value, width = width);
    }
    println!("{}", "-".repeat(width + 30));
    println!(
        "checkpointing: {}   externalized: {}   effective tolerable failures: {}",
        if config.is_checkpointing_enabled() { "enabled" } else { "disabled" },
        config.is_externalized_checkpoints_enabled(),
        config.effective_tolerable_failure_number(),
    );
}

fn print_json(name: &str, config: &CheckpointConfig) -> Result<()> {
    let json = serde_json::json!({
        "job": name,
        "checkpointing_enabled": config.is_checkpointing_enabled(),
        "externalized_checkpoints_enabled": config.is_externalized_checkpoints_enabled(),
        "effective_tolerable_failure_number": config.effective_tolerable_failure_number(),
        "checkpoint_config": config,
    });
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
