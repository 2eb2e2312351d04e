//! Binary entrypoint for the storefront slideshow.
//!
//! Delegates all logic to the library crate; no local modules here.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt};

use storefront_slideshow::catalog::Catalog;
use storefront_slideshow::config::Configuration;
use storefront_slideshow::events::{PlayerCommand, StageFailed, StageImage};
use storefront_slideshow::player::PlayerSm;
use storefront_slideshow::scan;
use storefront_slideshow::slot::{LogTarget, SlotPair};
use storefront_slideshow::tasks::{loader, player};

/// Simple CLI
#[derive(Debug, Parser)]
#[command(name = "storefront-slideshow", about = "Storefront product slideshow")]
struct Cli {
    /// Path to YAML config file
    #[arg(short, long, value_name = "FILE", default_value = "config.yaml")]
    config: PathBuf,

    /// Override rotation period (ms)
    #[arg(long, value_name = "MILLIS")]
    period_ms: Option<u64>,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbosity: u8) -> Result<()> {
    // map -v to log level
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("storefront_slideshow={}", level).parse().unwrap());
    fmt().with_env_filter(filter).with_target(true).init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let mut cfg = Configuration::from_yaml_file(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?
        .validated()
        .context("validating configuration")?;
    if let Some(ms) = cli.period_ms {
        cfg.rotation_period = Duration::from_millis(ms);
    }

    let references = if cfg.catalog.is_empty() {
        match &cfg.product_dir {
            Some(dir) => scan::scan_references(&cfg.asset_root, dir)
                .context("scanning product directory")?,
            None => Vec::new(),
        }
    } else {
        cfg.catalog.clone()
    };
    info!(count = references.len(), "catalog ready");
    let catalog = Catalog::new(references);

    let (cmd_tx, cmd_rx) = mpsc::channel::<PlayerCommand>(8);
    let (stage_tx, stage_rx) = mpsc::channel::<StageImage>(16);
    let (failed_tx, failed_rx) = mpsc::channel::<StageFailed>(16);
    let cancel = CancellationToken::new();

    if cfg.prefetch && !catalog.is_empty() {
        let root = cfg.asset_root.clone();
        let references = catalog.as_slice().to_vec();
        let max = cfg.loader_max_concurrent_decodes;
        tokio::spawn(async move { loader::prefetch(&root, &references, max).await });
    }

    let loader_handle = tokio::spawn(loader::run(
        cfg.asset_root.clone(),
        stage_rx,
        failed_tx,
        cancel.clone(),
        cfg.loader_max_concurrent_decodes,
    ));

    let slots = SlotPair::new(LogTarget::new("slot-1"), LogTarget::new("slot-2"));
    let options = player::PlayerOptions {
        rotation_period: cfg.rotation_period,
        retry_delay: cfg.retry_delay,
        fallback: cfg.fallback.clone(),
        seed: None,
    };
    let player_handle = tokio::spawn(player::run(
        PlayerSm::new(catalog),
        slots,
        options,
        cmd_rx,
        failed_rx,
        stage_tx,
        cancel.clone(),
    ));

    tokio::signal::ctrl_c().await.context("waiting for ctrl-c")?;
    info!("shutting down");
    let _ = cmd_tx.send(PlayerCommand::Stop).await;
    cancel.cancel();
    let _ = player_handle.await;
    let _ = loader_handle.await;
    Ok(())
}
