use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use storefront_slideshow::catalog::Catalog;
use storefront_slideshow::config::FallbackAsset;
use storefront_slideshow::events::{PlayerCommand, StageFailed, StageImage};
use storefront_slideshow::player::PlayerSm;
use storefront_slideshow::slot::{RenderTarget, SlotId, SlotPair};
use storefront_slideshow::tasks::player::{self, PlayerOptions};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Default)]
struct SlotState {
    source: Option<String>,
    visible: bool,
}

/// Shared view of the two render targets, plus a channel of every source
/// that became visible, in order. Every advance ends by hiding the
/// outgoing slot, so the visible-slot count sampled at each hide is the
/// settled count after that advance.
#[derive(Clone, Default)]
struct Stage {
    slots: Arc<Mutex<[SlotState; 2]>>,
    counts_after_hide: Arc<Mutex<Vec<usize>>>,
}

struct StageTarget {
    stage: Stage,
    index: usize,
    shown_tx: mpsc::UnboundedSender<String>,
}

impl RenderTarget for StageTarget {
    fn set_source(&mut self, reference: &str) {
        self.stage.slots.lock().unwrap()[self.index].source = Some(reference.to_string());
    }

    fn set_label(&mut self, _label: &str) {}

    fn set_visible(&mut self, visible: bool) {
        let mut slots = self.stage.slots.lock().unwrap();
        let was = slots[self.index].visible;
        slots[self.index].visible = visible;
        if visible && !was
            && let Some(source) = &slots[self.index].source
        {
            let _ = self.shown_tx.send(source.clone());
        }
        if !visible {
            let count = slots.iter().filter(|s| s.visible).count();
            self.stage.counts_after_hide.lock().unwrap().push(count);
        }
    }
}

struct Harness {
    cmd_tx: mpsc::Sender<PlayerCommand>,
    failed_tx: mpsc::Sender<StageFailed>,
    // Held open so staging sends never hit a closed channel.
    _stage_rx: mpsc::Receiver<StageImage>,
    shown_rx: mpsc::UnboundedReceiver<String>,
    stage: Stage,
    cancel: CancellationToken,
    handle: tokio::task::JoinHandle<anyhow::Result<()>>,
}

fn spawn_player(references: &[&str], period_ms: u64, retry_ms: u64) -> Harness {
    let stage = Stage::default();
    let (shown_tx, shown_rx) = mpsc::unbounded_channel();
    let pair = SlotPair::new(
        StageTarget {
            stage: stage.clone(),
            index: 0,
            shown_tx: shown_tx.clone(),
        },
        StageTarget {
            stage: stage.clone(),
            index: 1,
            shown_tx,
        },
    );

    let (cmd_tx, cmd_rx) = mpsc::channel::<PlayerCommand>(8);
    let (stage_tx, stage_rx) = mpsc::channel::<StageImage>(32);
    let (failed_tx, failed_rx) = mpsc::channel::<StageFailed>(8);
    let cancel = CancellationToken::new();

    let catalog = Catalog::new(references.iter().map(|s| (*s).to_string()).collect());
    let options = PlayerOptions {
        rotation_period: Duration::from_millis(period_ms),
        retry_delay: Duration::from_millis(retry_ms),
        fallback: FallbackAsset::default(),
        seed: Some(11),
    };
    let handle = tokio::spawn(player::run(
        PlayerSm::new(catalog),
        pair,
        options,
        cmd_rx,
        failed_rx,
        stage_tx,
        cancel.clone(),
    ));

    Harness {
        cmd_tx,
        failed_tx,
        _stage_rx: stage_rx,
        shown_rx,
        stage,
        cancel,
        handle,
    }
}

async fn next_shown(harness: &mut Harness) -> String {
    tokio::time::timeout(Duration::from_secs(2), harness.shown_rx.recv())
        .await
        .expect("timeout waiting for display")
        .expect("stage channel closed")
}

/// Every settled advance must leave exactly one slot visible.
fn assert_one_visible_throughout(stage: &Stage) {
    let counts = stage.counts_after_hide.lock().unwrap();
    assert!(!counts.is_empty());
    assert!(counts.iter().all(|&c| c == 1), "visible counts: {counts:?}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn ticks_visit_successors_and_wrap() {
    let mut harness = spawn_player(&["a", "b", "c"], 300, 5_000);

    // The starting image is random; pin the logical counter afterwards.
    let _initial = next_shown(&mut harness).await;
    harness.cmd_tx.send(PlayerCommand::Show(0)).await.unwrap();
    assert_eq!(next_shown(&mut harness).await, "a");

    for expected in ["b", "c", "a"] {
        assert_eq!(next_shown(&mut harness).await, expected);
    }

    harness.cancel.cancel();
    let _ = harness.handle.await;
    assert_one_visible_throughout(&harness.stage);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failure_skips_to_next_index_after_delay() {
    // Rotation period far out so only the recovery path can advance.
    let mut harness = spawn_player(&["p0", "p1", "p2", "p3"], 60_000, 100);

    let _initial = next_shown(&mut harness).await;
    harness.cmd_tx.send(PlayerCommand::Show(2)).await.unwrap();
    assert_eq!(next_shown(&mut harness).await, "p2");

    let reported = Instant::now();
    harness
        .failed_tx
        .send(StageFailed {
            slot: SlotId::First,
            reference: "p2".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(next_shown(&mut harness).await, "p3");
    assert!(
        reported.elapsed() >= Duration::from_millis(80),
        "skip must wait out the retry delay"
    );

    harness.cancel.cancel();
    let _ = harness.handle.await;
    assert_one_visible_throughout(&harness.stage);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stop_halts_rotation_until_restarted() {
    let mut harness = spawn_player(&["a", "b", "c"], 100, 5_000);

    let _initial = next_shown(&mut harness).await;
    let _first_tick = next_shown(&mut harness).await;
    harness.cmd_tx.send(PlayerCommand::Stop).await.unwrap();

    // Drain anything that raced the stop command.
    while tokio::time::timeout(Duration::from_millis(250), harness.shown_rx.recv())
        .await
        .is_ok()
    {}

    // Several rotation periods pass with no further index changes.
    let idle = tokio::time::timeout(Duration::from_millis(450), harness.shown_rx.recv()).await;
    assert!(idle.is_err(), "no advance may land after stop");

    harness.cmd_tx.send(PlayerCommand::Start).await.unwrap();
    let resumed = next_shown(&mut harness).await;
    assert!(["a", "b", "c"].contains(&resumed.as_str()));

    harness.cancel.cancel();
    let _ = harness.handle.await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn empty_catalog_pins_fallback_and_never_rotates() {
    let mut harness = spawn_player(&[], 100, 100);

    let fallback = FallbackAsset::default();
    assert_eq!(next_shown(&mut harness).await, fallback.source);
    {
        let slots = harness.stage.slots.lock().unwrap();
        assert!(slots[0].visible);
        assert!(!slots[1].visible);
    }

    // Commands are ignored and simulated time passes without a transition.
    harness.cmd_tx.send(PlayerCommand::Show(1)).await.unwrap();
    let idle = tokio::time::timeout(Duration::from_millis(450), harness.shown_rx.recv()).await;
    assert!(idle.is_err(), "fallback display is terminal");

    harness.cancel.cancel();
    let _ = harness.handle.await;
}
