use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tsp_core_types::Coordinate;

use super::commands::DataArgs;
use super::context::CliContext;
use super::output::emit;

#[derive(Args, Clone, Debug)]
pub struct DatasetArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Also print the full distance table
    #[arg(long)]
    pub matrix_rows: bool,
}

#[derive(Debug, Serialize)]
struct LocationEntry {
    index: usize,
    name: String,
    coordinate: Option<Coordinate>,
}

#[derive(Debug, Serialize)]
struct AsymmetricPair {
    from: String,
    to: String,
    forward: f64,
    backward: f64,
}

#[derive(Debug, Serialize)]
struct DatasetReport {
    locations: Vec<LocationEntry>,
    brute_force_search_space: u64,
    asymmetric_pairs: Vec<AsymmetricPair>,
    #[serde(skip_serializing_if = "Option::is_none")]
    distances: Option<Vec<Vec<f64>>>,
}

pub fn cmd_dataset(args: DatasetArgs, ctx: &CliContext) -> Result<()> {
    let dataset = ctx.dataset(&args.data)?;
    let locations = &dataset.locations;
    let distances = &dataset.distances;
    let name = |index: usize| locations.name(index).unwrap_or("?").to_string();

    let report = DatasetReport {
        locations: locations
            .names()
            .iter()
            .enumerate()
            .map(|(index, location)| LocationEntry {
                index,
                name: location.clone(),
                coordinate: locations.coordinate(index),
            })
            .collect(),
        brute_force_search_space: distances.exhaustive_search_space(),
        asymmetric_pairs: distances
            .asymmetries()
            .into_iter()
            .map(|pair| AsymmetricPair {
                from: name(pair.from),
                to: name(pair.to),
                forward: pair.forward,
                backward: pair.backward,
            })
            .collect(),
        distances: args.matrix_rows.then(|| distances.rows().to_vec()),
    };

    emit(ctx.output(), &report, |report| {
        let mut text = format!("{} locations\n", report.locations.len());
        for entry in &report.locations {
            match entry.coordinate {
                Some(coordinate) => text.push_str(&format!(
                    "{:>3}  {:<16} {:>10.5} {:>10.5}\n",
                    entry.index, entry.name, coordinate.latitude, coordinate.longitude
                )),
                None => text.push_str(&format!("{:>3}  {}\n", entry.index, entry.name)),
            }
        }
        text.push_str(&format!(
            "brute-force search space: {}\n",
            report.brute_force_search_space
        ));
        if report.asymmetric_pairs.is_empty() {
            text.push_str("distance table is symmetric");
        } else {
            text.push_str(&format!(
                "{} asymmetric pairs (kept as loaded):",
                report.asymmetric_pairs.len()
            ));
            for pair in &report.asymmetric_pairs {
                text.push_str(&format!(
                    "\n  {} -> {}: {} m, back {} m",
                    pair.from, pair.to, pair.forward, pair.backward
                ));
            }
        }
        if let Some(rows) = &report.distances {
            for (entry, row) in report.locations.iter().zip(rows) {
                let cells: Vec<String> = row.iter().map(|value| format!("{value:.0}")).collect();
                text.push_str(&format!("\n{:<16} {}", entry.name, cells.join(" ")));
            }
        }
        text
    })
}
