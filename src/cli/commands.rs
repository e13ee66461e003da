use std::path::PathBuf;

use clap::{Args, Subcommand};

use super::config::ConfigArgs;
use super::dataset::DatasetArgs;
use super::replay::ReplayArgs;
use super::route::RouteArgs;
use super::solve::{BruteArgs, GaArgs, SearchArgs};

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Stream a genetic-algorithm run and play it back
    Ga(GaArgs),

    /// Stream a best-first search run and play it back
    Search(SearchArgs),

    /// Ask for the exhaustive optimum of the distance table
    Brute(BruteArgs),

    /// Play back a recorded solver frame stream from disk
    Replay(ReplayArgs),

    /// Resolve a route into coordinates and leg distances
    Route(RouteArgs),

    /// Show the loaded location and distance tables
    Dataset(DatasetArgs),

    /// Manage tsp-visualizer configuration
    Config(ConfigArgs),

    /// Show version and effective settings
    Info,
}

/// Table overrides shared by every command that needs the dataset.
#[derive(Args, Clone, Debug, Default)]
pub struct DataArgs {
    /// Distance table CSV (header row of names, then `name,d1,..,dn` rows, meters)
    #[arg(long, value_name = "FILE")]
    pub matrix: Option<PathBuf>,

    /// Location table CSV (`name,latitude,longitude`)
    #[arg(long, value_name = "FILE")]
    pub locations: Option<PathBuf>,
}
