use anyhow::Result;

use super::config::cmd_config;
use super::dataset::cmd_dataset;
use super::env::CliArgs;
use super::info::cmd_info;
use super::replay::cmd_replay;
use super::route::cmd_route;
use super::solve::{cmd_brute, cmd_ga, cmd_search};
use crate::cli::commands::Commands;
use crate::cli::context::CliContext;

pub async fn dispatch(cli: &CliArgs, ctx: &CliContext) -> Result<()> {
    match cli.command.clone() {
        Commands::Ga(args) => cmd_ga(args, ctx).await,
        Commands::Search(args) => cmd_search(args, ctx).await,
        Commands::Brute(args) => cmd_brute(args, ctx).await,
        Commands::Replay(args) => cmd_replay(args, ctx).await,
        Commands::Route(args) => cmd_route(args, ctx),
        Commands::Dataset(args) => cmd_dataset(args, ctx),
        Commands::Config(args) => cmd_config(args, ctx).await,
        Commands::Info => cmd_info(ctx),
    }
}
