use std::path::{Path, PathBuf};

use anyhow::Result;
use tokio::select;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::events::{StageFailed, StageImage};

// Opens and fully decodes the reference to prove it renders. The decoded
// pixels are discarded; presentation happens in the render target.
fn decode_probe(path: &Path) -> anyhow::Result<()> {
    let img = image::ImageReader::open(path)?
        .with_guessed_format()? // sniff based on content/extension
        .decode()?;
    debug!(width = img.width(), height = img.height(), path = %path.display(), "decoded");
    Ok(())
}

/// Stages images off-thread and reports failures back to the player.
///
/// Decodes run on the blocking pool, bounded by `max_in_flight`. A failed
/// decode (missing file, truncated bytes, unsupported codec) comes back as
/// a `StageFailed` event; success needs no notification since the target
/// already holds the reference.
pub async fn run(
    asset_root: PathBuf,
    mut stage_rx: Receiver<StageImage>,
    failed_tx: Sender<StageFailed>,
    cancel: CancellationToken,
    max_in_flight: usize,
) -> Result<()> {
    let mut tasks: JoinSet<(StageImage, anyhow::Result<()>)> = JoinSet::new();

    loop {
        select! {
            _ = cancel.cancelled() => break,

            Some(request) = stage_rx.recv(), if tasks.len() < max_in_flight => {
                let path = asset_root.join(&request.reference);
                tasks.spawn(async move {
                    let res = tokio::task::spawn_blocking(move || decode_probe(&path))
                        .await
                        .unwrap_or_else(|e| Err(anyhow::anyhow!(e)));
                    (request, res)
                });
            }

            Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                match joined {
                    Ok((request, Ok(()))) => {
                        debug!(reference = %request.reference, "staged");
                    }
                    Ok((request, Err(err))) => {
                        warn!(reference = %request.reference, %err, "stage failed");
                        let send = failed_tx
                            .send(StageFailed {
                                slot: request.slot,
                                reference: request.reference,
                            })
                            .await;
                        if send.is_err() {
                            warn!("player channel closed");
                            break;
                        }
                    }
                    Err(join_err) => warn!(%join_err, "decode task panicked"),
                }
            }
        }
    }
    Ok(())
}

/// Eagerly decode every catalog entry once so later transitions hit warm
/// caches. Failures are logged and otherwise ignored; playback recovery
/// deals with them when the reference actually comes up.
pub async fn prefetch(asset_root: &Path, references: &[String], max_in_flight: usize) {
    let mut tasks: JoinSet<(String, anyhow::Result<()>)> = JoinSet::new();

    for reference in references {
        while tasks.len() >= max_in_flight {
            if let Some(Ok((done, res))) = tasks.join_next().await
                && let Err(err) = res
            {
                warn!(reference = %done, %err, "prefetch failed");
            }
        }
        let path = asset_root.join(reference);
        let reference = reference.clone();
        tasks.spawn(async move {
            let res = tokio::task::spawn_blocking(move || decode_probe(&path))
                .await
                .unwrap_or_else(|e| Err(anyhow::anyhow!(e)));
            (reference, res)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        if let Ok((done, Err(err))) = joined {
            warn!(reference = %done, %err, "prefetch failed");
        }
    }
    debug!(count = references.len(), "prefetch complete");
}
