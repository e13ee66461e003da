use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use tsp_core_types::{Dataset, SolverMode};
use tsp_geometry::GeometryResolver;
use tsp_playback::PlaybackConfig;
use tsp_solver_client::{SolverRequest, SolverTransport};

use super::commands::DataArgs;
use super::context::CliContext;
use super::session;

#[derive(Args, Clone, Debug, Default)]
pub struct PlaybackArgs {
    /// Milliseconds between displayed solutions (overrides the configured cadence)
    #[arg(long, value_name = "MS")]
    pub cadence_ms: Option<u64>,
}

impl PlaybackArgs {
    pub fn apply(&self, mode: SolverMode, config: &PlaybackConfig) -> PlaybackConfig {
        let mut config = config.clone();
        if let Some(ms) = self.cadence_ms {
            match mode {
                SolverMode::Genetic => config.genetic_cadence_ms = ms,
                SolverMode::BestFirst => config.search_cadence_ms = ms,
                SolverMode::BruteForce => config.brute_force_cadence_ms = ms,
            }
        }
        config
    }
}

#[derive(Args, Clone, Debug)]
pub struct GaArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub playback: PlaybackArgs,

    /// Genetic parameter override, repeatable (e.g. `-p pop_size=200`)
    #[arg(short = 'p', long = "param", value_name = "KEY=VALUE")]
    pub params: Vec<String>,
}

#[derive(Args, Clone, Debug)]
pub struct SearchArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub playback: PlaybackArgs,
}

#[derive(Args, Clone, Debug)]
pub struct BruteArgs {
    #[command(flatten)]
    pub data: DataArgs,
}

pub async fn cmd_ga(args: GaArgs, ctx: &CliContext) -> Result<()> {
    let params = ctx.config().genetic.clone().with_overrides(&args.params)?;
    let dataset = ctx.dataset(&args.data)?;
    let request = SolverRequest::genetic(params, Arc::clone(&dataset.distances));
    solve(ctx, dataset, request, &args.playback).await
}

pub async fn cmd_search(args: SearchArgs, ctx: &CliContext) -> Result<()> {
    let dataset = ctx.dataset(&args.data)?;
    let request = SolverRequest::best_first(Arc::clone(&dataset.distances));
    solve(ctx, dataset, request, &args.playback).await
}

pub async fn cmd_brute(args: BruteArgs, ctx: &CliContext) -> Result<()> {
    let dataset = ctx.dataset(&args.data)?;
    let request = SolverRequest::brute_force(Arc::clone(&dataset.distances));
    solve(ctx, dataset, request, &PlaybackArgs::default()).await
}

async fn solve(
    ctx: &CliContext,
    dataset: Dataset,
    request: SolverRequest,
    playback: &PlaybackArgs,
) -> Result<()> {
    let transport: Arc<dyn SolverTransport> = ctx.http_transport()?;
    let playback = playback.apply(request.mode, &ctx.config().playback);
    session::play(
        ctx,
        transport,
        request,
        GeometryResolver::new(dataset),
        playback,
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cadence_override_only_touches_the_run_mode() {
        let args = PlaybackArgs { cadence_ms: Some(5) };
        let config = args.apply(SolverMode::BestFirst, &PlaybackConfig::default());
        assert_eq!(config.search_cadence_ms, 5);
        assert_eq!(config.genetic_cadence_ms, PlaybackConfig::default().genetic_cadence_ms);

        let untouched = PlaybackArgs::default().apply(SolverMode::Genetic, &config);
        assert_eq!(untouched, config);
    }
}
