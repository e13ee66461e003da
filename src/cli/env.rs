use clap::Parser;
use std::path::PathBuf;

use super::commands::Commands;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct CliArgs {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    /// Enable debug mode
    #[arg(short, long)]
    pub debug: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "human")]
    pub output: crate::cli::output::OutputFormat,

    /// Metrics server port (0 disables it)
    #[arg(long, default_value_t = 0)]
    pub metrics_port: u16,

    #[command(subcommand)]
    pub command: Commands,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::output::OutputFormat;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        CliArgs::command().debug_assert();
    }

    #[test]
    fn global_flags_precede_the_subcommand() {
        let args = CliArgs::try_parse_from([
            "tsp-visualizer",
            "--output",
            "json",
            "--metrics-port",
            "9191",
            "ga",
            "--param",
            "pop_size=50",
        ])
        .unwrap();
        assert_eq!(args.output, OutputFormat::Json);
        assert_eq!(args.metrics_port, 9191);
        match args.command {
            Commands::Ga(ga) => assert_eq!(ga.params, vec!["pop_size=50".to_string()]),
            _ => panic!("expected ga"),
        }
    }
}
