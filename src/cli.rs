//! CLI command definitions using clap.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use hydroculture_core::NamespacedName;

/// Hydroculture - herb environment controller
#[derive(Parser, Debug)]
#[command(name = "hydroculture")]
#[command(version)]
#[command(about = "Keeps herb growing environments at their ideal temperature")]
#[command(
    long_about = "Reconciles Herbs objects against namespace temperature sensors, recording TempReady and Ready conditions on each object."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the controller until Ctrl+C
    Run {
        /// YAML manifest declaring objects and sensor records
        #[arg(short, long)]
        manifest: PathBuf,

        /// TOML controller configuration
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Run a single reconcile pass and print the result
    Reconcile {
        /// YAML manifest declaring objects and sensor records
        #[arg(short, long)]
        manifest: PathBuf,

        /// Object to reconcile, as `namespace/name` or a bare `name` in the
        /// default namespace
        object: NamespacedName,

        /// TOML controller configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print the object as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// List supported plants and their ideal temperatures
    Plants,
}
