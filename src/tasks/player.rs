use std::time::Duration;

use anyhow::Result;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::select;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio::time::{Instant, interval_at, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::FallbackAsset;
use crate::events::{PlayerCommand, StageFailed, StageImage};
use crate::player::{Advance, InitEffect, PlayerSm};
use crate::slot::{RenderTarget, SlotId, SlotPair};

/// Tuning knobs for the player task, taken from the configuration.
#[derive(Debug, Clone)]
pub struct PlayerOptions {
    pub rotation_period: Duration,
    pub retry_delay: Duration,
    pub fallback: FallbackAsset,
    /// Deterministic RNG seed for the starting index (useful for tests).
    pub seed: Option<u64>,
}

/// Drives the playback state machine against the slot pair.
///
/// Sole owner of all playback state: timer ticks, staging failures and
/// control commands are processed strictly in arrival order. The
/// failure-recovery delay is a deadline polled from `select!`, so the loop
/// never blocks.
pub async fn run<T: RenderTarget>(
    mut sm: PlayerSm,
    mut slots: SlotPair<T>,
    opts: PlayerOptions,
    mut cmd_rx: Receiver<PlayerCommand>,
    mut failed_rx: Receiver<StageFailed>,
    to_loader: Sender<StageImage>,
    cancel: CancellationToken,
) -> Result<()> {
    let mut rng = match opts.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    match sm.initialize(&mut rng) {
        InitEffect::Fallback => {
            warn!(source = %opts.fallback.source, "catalog is empty; pinning fallback asset");
            slots.pin_first(&opts.fallback.source, &opts.fallback.label);
            idle(cmd_rx, failed_rx, cancel).await;
            return Ok(());
        }
        InitEffect::Initial { index, reference } => {
            info!(index, reference = %reference, "starting slideshow");
            slots.pin_first(&reference, &product_label(index));
            stage(&to_loader, SlotId::First, reference).await;
        }
    }

    let mut ticker = interval_at(Instant::now() + opts.rotation_period, opts.rotation_period);
    let mut playing = true;
    let mut recovery_at: Option<Instant> = None;

    loop {
        select! {
            _ = cancel.cancelled() => break,

            _ = ticker.tick(), if playing => {
                if let Some(advance) = sm.step() {
                    apply(&mut slots, &to_loader, advance).await;
                }
            }

            // Failure recovery fires even after stop; only the periodic
            // timer is gated on `playing`.
            _ = async move {
                if let Some(at) = recovery_at {
                    sleep_until(at).await;
                }
            }, if recovery_at.is_some() => {
                recovery_at = None;
                if let Some(advance) = sm.step() {
                    apply(&mut slots, &to_loader, advance).await;
                }
                // The skip replaces the next tick instead of stacking on it.
                ticker.reset();
            }

            Some(StageFailed { slot, reference }) = failed_rx.recv() => {
                error!(?slot, reference = %reference, "failed to load image; skipping ahead");
                recovery_at = Some(Instant::now() + opts.retry_delay);
            }

            Some(cmd) = cmd_rx.recv() => match cmd {
                PlayerCommand::Start => {
                    ticker = interval_at(
                        Instant::now() + opts.rotation_period,
                        opts.rotation_period,
                    );
                    sm.resume();
                    playing = true;
                    debug!("playback started");
                }
                PlayerCommand::Stop => {
                    if playing {
                        sm.stop();
                        playing = false;
                        info!("playback stopped");
                    }
                }
                PlayerCommand::Show(raw) => {
                    if let Some(advance) = sm.show_index(raw) {
                        apply(&mut slots, &to_loader, advance).await;
                    }
                }
            }
        }
    }

    Ok(())
}

/// Terminal fallback state: keep peers unblocked but never advance.
async fn idle(
    mut cmd_rx: Receiver<PlayerCommand>,
    mut failed_rx: Receiver<StageFailed>,
    cancel: CancellationToken,
) {
    loop {
        select! {
            _ = cancel.cancelled() => break,
            maybe_cmd = cmd_rx.recv() => match maybe_cmd {
                Some(cmd) => debug!(?cmd, "command ignored without a catalog"),
                None => break,
            },
            Some(_failed) = failed_rx.recv() => {}
        }
    }
}

async fn apply<T: RenderTarget>(
    slots: &mut SlotPair<T>,
    to_loader: &Sender<StageImage>,
    advance: Advance,
) {
    let slot = slots.show(&advance.reference, &product_label(advance.index));
    debug!(index = advance.index, ?slot, reference = %advance.reference, "advanced");
    stage(to_loader, slot, advance.reference).await;
}

async fn stage(to_loader: &Sender<StageImage>, slot: SlotId, reference: String) {
    if to_loader.send(StageImage { slot, reference }).await.is_err() {
        warn!("loader channel closed; staging skipped");
    }
}

fn product_label(index: usize) -> String {
    format!("Product {}", index + 1)
}
