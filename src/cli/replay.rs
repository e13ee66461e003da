use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use clap::Args;
use tsp_core_types::SolverMode;
use tsp_geometry::GeometryResolver;
use tsp_solver_client::{FileTransport, SolverRequest};

use super::commands::DataArgs;
use super::context::CliContext;
use super::session;
use super::solve::PlaybackArgs;

#[derive(Args, Clone, Debug)]
pub struct ReplayArgs {
    /// Captured solver response (a frame stream, or a brute-force JSON body)
    pub recording: PathBuf,

    /// Solver mode that produced the recording
    #[arg(short, long, default_value = "genetic")]
    pub mode: SolverMode,

    /// Bytes handed to the decoder per read
    #[arg(long, default_value_t = FileTransport::DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub playback: PlaybackArgs,
}

pub async fn cmd_replay(args: ReplayArgs, ctx: &CliContext) -> Result<()> {
    if !args.recording.is_file() {
        bail!("recording {} not found", args.recording.display());
    }
    if args.chunk_size == 0 {
        bail!("--chunk-size must be at least 1");
    }
    let dataset = ctx.dataset(&args.data)?;
    let transport = FileTransport::with_chunk_size(&args.recording, args.chunk_size);
    let request = SolverRequest::new(args.mode, Arc::clone(&dataset.distances));
    let playback = args.playback.apply(args.mode, &ctx.config().playback);
    session::play(
        ctx,
        Arc::new(transport),
        request,
        GeometryResolver::new(dataset),
        playback,
    )
    .await
}
