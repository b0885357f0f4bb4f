//! CLI command handlers.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use hydroculture_core::{Herbs, NamespacedName, Plant, PrintRow};
use hydroculture_reconciler::{
    Controller, ControllerConfig, HerbsReconciler, ReconcileContext, ReconcilerBuilder,
};
use hydroculture_store::{HerbsStore, InMemoryHerbsStore, InMemorySensorSource, Manifest};
use tokio::signal;
use tracing::{error, info};

use crate::cli::Commands;

/// Execute a CLI command.
pub async fn execute_command(command: Commands) -> Result<()> {
    match command {
        Commands::Run { manifest, config } => cmd_run(&manifest, config.as_deref()).await,

        Commands::Reconcile {
            manifest,
            object,
            config,
            json,
        } => cmd_reconcile(&manifest, config.as_deref(), &object, json).await,

        Commands::Plants => {
            print!("{}", render_plants());
            Ok(())
        }
    }
}

/// Run the controller until Ctrl+C.
async fn cmd_run(manifest: &Path, config: Option<&Path>) -> Result<()> {
    let config = load_config(config)?;
    let (store, sensors) = seed(manifest).await?;

    let reconciler = Arc::new(build_reconciler(&store, sensors, &config)?);
    let controller = Controller::new(reconciler, store.clone(), config);
    let stopper = controller.stopper();
    let handle = tokio::spawn(async move { controller.run().await });

    info!("Controller is running. Press Ctrl+C to stop.");
    wait_for_shutdown().await;

    stopper.stop();
    handle.await.context("Controller task failed")??;

    let rows: Vec<PrintRow> = store.objects().await.iter().map(Herbs::print_row).collect();
    print!("{}", render_table(&rows));
    Ok(())
}

/// Outcome of a single pass run from the command line.
#[derive(Debug)]
pub struct PassReport {
    pub requeue_after: Duration,
    pub error: Option<String>,
    pub herbs: Option<Herbs>,
}

async fn cmd_reconcile(
    manifest: &Path,
    config: Option<&Path>,
    key: &NamespacedName,
    json: bool,
) -> Result<()> {
    let report = reconcile_once(manifest, config, key).await?;

    println!("requeue after: {}s", report.requeue_after.as_secs());
    if let Some(e) = &report.error {
        println!("error: {e}");
    }

    match (&report.herbs, json) {
        (Some(herbs), true) => println!("{}", serde_json::to_string_pretty(herbs)?),
        (Some(herbs), false) => print!("{}", render_table(&[herbs.print_row()])),
        (None, _) => println!("{key} not found"),
    }
    Ok(())
}

/// Seed collaborators from `manifest` and run exactly one pass for `key`.
///
/// # Errors
///
/// Returns error if the manifest or configuration cannot be loaded. A
/// failed pass is reported in [`PassReport::error`] instead.
pub async fn reconcile_once(
    manifest: &Path,
    config: Option<&Path>,
    key: &NamespacedName,
) -> Result<PassReport> {
    let config = load_config(config)?;
    let (store, sensors) = seed(manifest).await?;

    let reconciler = build_reconciler(&store, sensors, &config)?;
    let reconciled = reconciler
        .reconcile(&ReconcileContext::background(), key)
        .await;

    Ok(PassReport {
        requeue_after: reconciled.result.requeue_after,
        error: reconciled.error.map(|e| e.to_string()),
        herbs: store.get(key).await.ok(),
    })
}

fn build_reconciler(
    store: &Arc<InMemoryHerbsStore>,
    sensors: Arc<InMemorySensorSource>,
    config: &ControllerConfig,
) -> Result<HerbsReconciler> {
    ReconcilerBuilder::new()
        .with_store(store.clone())
        .with_sensors(sensors)
        .with_config(config.reconciler.clone())
        .build()
        .context("Failed to build reconciler")
}

fn load_config(path: Option<&Path>) -> Result<ControllerConfig> {
    path.map_or_else(
        || Ok(ControllerConfig::default()),
        |p| ControllerConfig::load(p).context("Failed to load configuration"),
    )
}

async fn seed(manifest: &Path) -> Result<(Arc<InMemoryHerbsStore>, Arc<InMemorySensorSource>)> {
    let manifest = Manifest::load(manifest)
        .with_context(|| format!("Failed to load manifest '{}'", manifest.display()))?;

    let store = Arc::new(InMemoryHerbsStore::new());
    let sensors = Arc::new(InMemorySensorSource::new());
    manifest
        .apply(&store, &sensors)
        .await
        .context("Failed to apply manifest")?;

    Ok((store, sensors))
}

/// Render print rows as an aligned table.
fn render_table(rows: &[PrintRow]) -> String {
    let cells: Vec<[String; 5]> = rows.iter().map(PrintRow::cells).collect();
    let widths: Vec<usize> = PrintRow::HEADERS
        .iter()
        .enumerate()
        .map(|(i, header)| {
            cells
                .iter()
                .filter_map(|row| row.get(i).map(String::len))
                .chain(std::iter::once(header.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let header: Vec<String> = PrintRow::HEADERS.iter().map(ToString::to_string).collect();
    std::iter::once(header)
        .chain(cells.into_iter().map(Vec::from))
        .map(|row| {
            let line = row
                .iter()
                .zip(&widths)
                .map(|(cell, width)| format!("{cell:<width$}"))
                .collect::<Vec<_>>()
                .join("   ");
            format!("{}\n", line.trim_end())
        })
        .collect()
}

fn render_plants() -> String {
    Plant::ALL
        .iter()
        .map(|plant| format!("{:<10}{}°C\n", plant.as_str(), plant.ideal_temperature()))
        .collect()
}

/// Wait for shutdown signal (Ctrl+C).
async fn wait_for_shutdown() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, initiating graceful shutdown"),
        Err(err) => error!("Failed to listen for shutdown signal: {}", err),
    }
}
