use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    /// One JSON document per line.
    Json,
    Yaml,
}

/// Prints `value` in the selected format; `human` renders the plain-text form.
pub fn emit<T, F>(format: OutputFormat, value: &T, human: F) -> Result<()>
where
    T: Serialize,
    F: FnOnce(&T) -> String,
{
    let text = match format {
        OutputFormat::Human => human(value),
        OutputFormat::Json => serde_json::to_string(value)?,
        OutputFormat::Yaml => format!("---\n{}", serde_yaml::to_string(value)?.trim_end()),
    };
    println!("{text}");
    Ok(())
}
