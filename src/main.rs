//! # Hydroculture
//!
//! Entry point for the herb environment controller.
//!
//! ## Commands
//!
//! - `run` seeds the in-memory store and sensors from a manifest and runs
//!   the controller until Ctrl+C
//! - `reconcile` runs a single pass for one object and prints the outcome
//! - `plants` lists the supported plants
//!
//! Logging is controlled through `RUST_LOG` and defaults to `info`.

#![forbid(unsafe_code)]
#![forbid(clippy::unwrap_used)]
#![forbid(clippy::panic)]
#![deny(clippy::expect_used)]

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    commands::execute_command(cli.command).await
}

/// Initialize tracing subscriber with environment filter.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
