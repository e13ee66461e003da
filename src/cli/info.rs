use anyhow::Result;
use serde::Serialize;

use super::commands::DataArgs;
use super::context::CliContext;
use super::output::emit;
use crate::app_settings::SOLVER_URL_ENV;

#[derive(Debug, Serialize)]
struct InfoReport {
    version: &'static str,
    build_date: &'static str,
    git_commit: &'static str,
    git_branch: &'static str,
    config_path: String,
    solver_url: String,
    stall_timeout_ms: u64,
    genetic_cadence_ms: u64,
    search_cadence_ms: u64,
    brute_force_cadence_ms: u64,
    metrics_port: Option<u16>,
    locations: Option<usize>,
    dataset_error: Option<String>,
}

pub fn cmd_info(ctx: &CliContext) -> Result<()> {
    let config = ctx.config();
    let (locations, dataset_error) = match ctx.dataset(&DataArgs::default()) {
        Ok(dataset) => (Some(dataset.len()), None),
        Err(err) => (None, Some(format!("{err:#}"))),
    };

    let report = InfoReport {
        version: env!("CARGO_PKG_VERSION"),
        build_date: option_env!("BUILD_DATE").unwrap_or("unknown"),
        git_commit: option_env!("GIT_HASH").unwrap_or("unknown"),
        git_branch: option_env!("GIT_BRANCH").unwrap_or("unknown"),
        config_path: ctx.config_path().display().to_string(),
        solver_url: config.solver.base_url.clone(),
        stall_timeout_ms: config.solver.stall_timeout_ms,
        genetic_cadence_ms: config.playback.genetic_cadence_ms,
        search_cadence_ms: config.playback.search_cadence_ms,
        brute_force_cadence_ms: config.playback.brute_force_cadence_ms,
        metrics_port: (ctx.metrics_port() != 0).then_some(ctx.metrics_port()),
        locations,
        dataset_error,
    };

    emit(ctx.output(), &report, |report| {
        let mut lines = vec![
            "TSP Visualizer".to_string(),
            "==============".to_string(),
            format!("Version: {}", report.version),
            format!("Build Date: {}", report.build_date),
            format!("Git Commit: {} ({})", report.git_commit, report.git_branch),
            String::new(),
            "Configuration:".to_string(),
            format!("- Config File: {}", report.config_path),
            format!("- Solver URL: {} (env {})", report.solver_url, SOLVER_URL_ENV),
            format!("- Stall Timeout: {} ms", report.stall_timeout_ms),
            format!(
                "- Playback Cadence: genetic {} ms, search {} ms, brute-force {} ms",
                report.genetic_cadence_ms, report.search_cadence_ms, report.brute_force_cadence_ms
            ),
        ];
        match report.metrics_port {
            Some(port) => lines.push(format!("- Metrics: http://127.0.0.1:{port}/metrics")),
            None => lines.push("- Metrics: disabled".to_string()),
        }
        match (&report.locations, &report.dataset_error) {
            (Some(count), _) => lines.push(format!("- Dataset: {count} locations")),
            (None, Some(err)) => lines.push(format!("- Dataset: unavailable ({err})")),
            (None, None) => {}
        }
        lines.join("\n")
    })
}
