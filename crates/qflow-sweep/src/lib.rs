//! `Qin` sweeps over corridor trajectory logs
//!
//! Drives the `qflow` estimators across prefix-named run families, prints
//! the per-`Qin` report lines, and writes CSV sidecars, error-bar plots
//! and a JSON summary into an output directory.

pub mod config;
pub mod output;
pub mod pipeline;
pub mod plot;

pub use config::SweepConfig;
pub use output::SweepSummary;
pub use pipeline::run_sweep;
