pub mod app;
pub mod commands;
pub mod config;
pub mod context;
pub mod dataset;
pub mod dispatch;
pub mod env;
pub mod info;
pub mod output;
pub mod replay;
pub mod route;
pub mod runtime;
pub mod session;
pub mod solve;

pub use app::run;
pub use output::OutputFormat;
