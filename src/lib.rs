//! Command-line client that streams travelling-salesman solver runs and plays
//! back the evolving best route.
//!
//! The engine lives in the workspace crates; this crate wires it to a config
//! file, a Prometheus endpoint and a terminal renderer.

pub mod app_settings;
pub mod cli;
pub mod metrics;
pub mod render;

pub use app_settings::Config;
