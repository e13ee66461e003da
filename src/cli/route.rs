use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tsp_core_types::Coordinate;
use tsp_geometry::GeometryResolver;

use super::commands::DataArgs;
use super::context::CliContext;
use super::output::emit;
use crate::render::LegView;

#[derive(Args, Clone, Debug)]
pub struct RouteArgs {
    /// Location indices in visiting order, comma or space separated
    #[arg(required = true, value_delimiter = ',', num_args = 1..)]
    pub stops: Vec<usize>,

    #[command(flatten)]
    pub data: DataArgs,
}

#[derive(Debug, Serialize)]
struct RouteReport {
    route: Vec<usize>,
    stops: Vec<String>,
    coordinates: Vec<Coordinate>,
    legs: Vec<LegView>,
    total_km: f64,
}

pub fn cmd_route(args: RouteArgs, ctx: &CliContext) -> Result<()> {
    let resolver = GeometryResolver::new(ctx.dataset(&args.data)?);
    let geometry = resolver
        .resolve(&args.stops)
        .context("Cannot resolve route")?;
    let locations = &resolver.dataset().locations;
    let name = |index: usize| locations.name(index).unwrap_or("?").to_string();

    let report = RouteReport {
        stops: args.stops.iter().map(|&index| name(index)).collect(),
        legs: geometry
            .edges
            .iter()
            .map(|edge| LegView {
                from: name(edge.from),
                to: name(edge.to),
                km: edge.kilometers(),
            })
            .collect(),
        total_km: geometry.total_kilometers(),
        coordinates: geometry.coordinates,
        route: args.stops,
    };

    emit(ctx.output(), &report, |report| {
        let mut text = String::new();
        for leg in &report.legs {
            text.push_str(&format!("{:>16} -> {:<16} {:>9.1} km\n", leg.from, leg.to, leg.km));
        }
        text.push_str(&format!("{:>36} {:>9.1} km", "total", report.total_km));
        text
    })
}
