use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;
use serde_json::Value as JsonValue;
use tokio::fs;
use tracing::info;
use tsp_solver_client::ConfigurationError;

use crate::app_settings::Config;
use crate::cli::context::CliContext;
use crate::cli::output::emit;

#[derive(Args, Clone, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Clone, Debug)]
pub enum ConfigAction {
    /// Show the configuration file, defaults filled in
    Show,

    /// Set one setting, e.g. `playback.genetic_cadence_ms 250`
    Set {
        /// `section.field`, where section is solver, playback, genetic or dataset
        key: String,

        /// New value; an empty value clears optional settings
        value: String,
    },

    /// Print one setting
    Get {
        key: String,
    },

    /// Overwrite the configuration file with defaults
    Reset,

    /// Check the configuration file parses and holds valid settings
    Validate,
}

/// One setting as printed by `config get`.
#[derive(Debug, Serialize)]
struct Setting<'a> {
    key: &'a str,
    value: JsonValue,
}

pub async fn cmd_config(args: ConfigArgs, ctx: &CliContext) -> Result<()> {
    let path = ctx.config_path().to_path_buf();
    match args.action {
        ConfigAction::Show => {
            let config = load_config_file(&path).await?;
            emit(ctx.output(), &config, |config| {
                let yaml = serde_yaml::to_string(config).unwrap_or_default();
                format!("# {}\n{}", path.display(), yaml.trim_end())
            })?;
        }
        ConfigAction::Set { key, value } => {
            let mut config = load_config_file(&path).await?;
            apply_setting(&mut config, &key, &value)
                .with_context(|| format!("cannot set {key} to {value:?}"))?;
            save_config_file(&path, &config).await?;
            info!(key = %key, path = %path.display(), "configuration updated");
            println!("Saved configuration to {}", path.display());
        }
        ConfigAction::Get { key } => {
            let config = load_config_file(&path).await?;
            let value = get_setting(&config, &key)?;
            emit(ctx.output(), &Setting { key: &key, value }, |setting| {
                match &setting.value {
                    JsonValue::String(text) => text.clone(),
                    other => other.to_string(),
                }
            })?;
        }
        ConfigAction::Reset => {
            save_config_file(&path, &Config::default()).await?;
            println!("Configuration reset to defaults in {}", path.display());
        }
        ConfigAction::Validate => {
            if fs::try_exists(&path).await? {
                let config = load_config_file(&path).await?;
                config
                    .validate()
                    .with_context(|| format!("validating {}", path.display()))?;
                println!("Configuration file {} is valid", path.display());
            } else {
                println!(
                    "No configuration file at {}; defaults are valid",
                    path.display()
                );
            }
        }
    }

    Ok(())
}

fn split_key(key: &str) -> Result<(&str, &str)> {
    match key.split_once('.') {
        Some((section, field)) if !section.is_empty() && !field.is_empty() => {
            Ok((section, field))
        }
        _ => bail!("configuration keys look like section.field, got {key:?}"),
    }
}

/// Parses `value` into the typed field named by `key`, then validates the
/// whole configuration.
fn apply_setting(config: &mut Config, key: &str, value: &str) -> Result<()> {
    let (section, field) = split_key(key)?;
    match (section, field) {
        ("genetic", field) => config.genetic.set(field, value)?,
        ("solver", "base_url") => config.solver.base_url = value.trim().to_string(),
        ("solver", "connect_timeout_ms") => {
            config.solver.connect_timeout_ms = millis("connect_timeout_ms", value)?
        }
        ("solver", "request_timeout_ms") => {
            config.solver.request_timeout_ms = millis("request_timeout_ms", value)?
        }
        ("solver", "stall_timeout_ms") => {
            config.solver.stall_timeout_ms = millis("stall_timeout_ms", value)?
        }
        ("playback", "genetic_cadence_ms") => {
            config.playback.genetic_cadence_ms = millis("genetic_cadence_ms", value)?
        }
        ("playback", "search_cadence_ms") => {
            config.playback.search_cadence_ms = millis("search_cadence_ms", value)?
        }
        ("playback", "brute_force_cadence_ms") => {
            config.playback.brute_force_cadence_ms = millis("brute_force_cadence_ms", value)?
        }
        ("dataset", "locations") => config.dataset.locations = optional_path(value),
        ("dataset", "distances") => config.dataset.distances = optional_path(value),
        _ => bail!("unknown configuration key {key:?}"),
    }
    config.validate()?;
    Ok(())
}

fn get_setting(config: &Config, key: &str) -> Result<JsonValue> {
    let (section, field) = split_key(key)?;
    let doc = serde_json::to_value(config)?;
    doc.get(section)
        .and_then(|section| section.get(field))
        .cloned()
        .ok_or_else(|| anyhow!("unknown configuration key {key:?}"))
}

fn millis(field: &'static str, value: &str) -> Result<u64, ConfigurationError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigurationError::NotANumber {
            field,
            value: value.to_string(),
        })
}

fn optional_path(value: &str) -> Option<PathBuf> {
    match value.trim() {
        "" | "none" | "null" => None,
        path => Some(PathBuf::from(path)),
    }
}

async fn load_config_file(path: &Path) -> Result<Config> {
    if !fs::try_exists(path).await? {
        return Ok(Config::default());
    }
    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    serde_yaml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

async fn save_config_file(path: &Path, config: &Config) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    fs::write(path, serde_yaml::to_string(config)?)
        .await
        .with_context(|| format!("writing {}", path.display()))
}
