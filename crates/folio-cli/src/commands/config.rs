//! Config command handlers

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use folio_core::Config;

use crate::output::{Output, OutputFormat};

/// Show current configuration
pub fn show(config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "max_content_length": config.max_content_length,
                    "log_level": config.log_level,
                    "hasher": {
                        "memory_kib": config.hasher.memory_kib,
                        "iterations": config.hasher.iterations,
                        "parallelism": config.hasher.parallelism
                    }
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            println!("Configuration:");
            println!("  data_dir:            {}", config.data_dir.display());
            println!("  max_content_length:  {}", config.max_content_length);
            println!(
                "  log_level:           {}",
                config.log_level.as_deref().unwrap_or("(not set)")
            );
            println!("  hasher.memory_kib:   {}", config.hasher.memory_kib);
            println!("  hasher.iterations:   {}", config.hasher.iterations);
            println!("  hasher.parallelism:  {}", config.hasher.parallelism);
            println!();
            println!("Database:    {}", config.database_path().display());
            println!("Config file: {}", effective_path.display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(
    key: String,
    value: String,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    let mut config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    apply(&mut config, &key, &value)?;

    // Save to the CLI-specified path or default
    let save_path = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);
    config
        .save_to_path(&save_path)
        .context("Failed to save configuration")?;

    output.success(&format!("Set {} = {}", key, value));

    Ok(())
}

fn apply(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "data_dir" => {
            config.data_dir = value.into();
        }
        "max_content_length" => {
            config.max_content_length = value
                .parse()
                .context("Invalid value for max_content_length. Use a positive number.")?;
        }
        "log_level" => {
            config.log_level = if value.is_empty() || value == "none" {
                None
            } else {
                Some(value.to_string())
            };
        }
        "hasher.memory_kib" => {
            config.hasher.memory_kib = value.parse().context("Invalid value for memory_kib")?;
        }
        "hasher.iterations" => {
            config.hasher.iterations = value.parse().context("Invalid value for iterations")?;
        }
        "hasher.parallelism" => {
            config.hasher.parallelism = value.parse().context("Invalid value for parallelism")?;
        }
        _ => {
            bail!(
                "Unknown configuration key: '{}'\n\
                 Valid keys: data_dir, max_content_length, log_level, \
                 hasher.memory_kib, hasher.iterations, hasher.parallelism",
                key
            );
        }
    }
    Ok(())
}
