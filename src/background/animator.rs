//! Cooperative frame loop for the background scene.
//!
//! One task owns the scene. It renders a frame per tick into an SVG canvas
//! and publishes it on a `watch` channel; resizes arrive on another `watch`.
//! Stopping (or dropping) the handle cancels the pending frame and detaches
//! the resize receiver.

use metrics::counter;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::canvas::SvgCanvas;
use super::particle::Viewport;
use super::scene::{FrameStats, Scene, SceneConfig};

/// The most recently rendered frame.
#[derive(Debug, Clone)]
pub struct Frame {
    pub seq: u64,
    pub viewport: Viewport,
    pub stats: FrameStats,
    pub svg: Arc<String>,
}

pub struct BackgroundHandle {
    resize_tx: watch::Sender<Viewport>,
    frame_rx: watch::Receiver<Frame>,
    task: Option<JoinHandle<()>>,
}

impl BackgroundHandle {
    /// Publish a new surface size. Returns false once the loop has stopped.
    pub fn resize(&self, vp: Viewport) -> bool {
        self.resize_tx.send(vp).is_ok()
    }

    pub fn latest(&self) -> Frame {
        self.frame_rx.borrow().clone()
    }

    pub fn frames(&self) -> watch::Receiver<Frame> {
        self.frame_rx.clone()
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Cancel the loop and wait for it to finish.
    pub async fn stop(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
        }
    }
}

impl Drop for BackgroundHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Start the frame loop on the current runtime.
pub fn spawn_background(
    cfg: SceneConfig,
    vp: Viewport,
    frame_interval: Duration,
    seed: Option<u64>,
) -> BackgroundHandle {
    let rng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_os_rng(),
    };
    let mut scene = Scene::new(cfg, vp, rng);

    let (resize_tx, mut resize_rx) = watch::channel(vp);
    let (frame_tx, frame_rx) = watch::channel(Frame {
        seq: 0,
        viewport: vp,
        stats: FrameStats::default(),
        svg: Arc::new(SvgCanvas::new(vp).finish()),
    });

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(frame_interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut seq = 0u64;
        loop {
            tokio::select! {
                changed = resize_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let next = *resize_rx.borrow_and_update();
                    if next != scene.viewport() {
                        tracing::debug!(width = next.width, height = next.height, "background resized");
                        scene.resize(next);
                    }
                }
                _ = ticker.tick() => {
                    let vp = scene.viewport();
                    let mut canvas = SvgCanvas::new(vp);
                    let stats = scene.step(&mut canvas);
                    seq += 1;
                    counter!("background_frames_total").increment(1);
                    let frame = Frame { seq, viewport: vp, stats, svg: Arc::new(canvas.finish()) };
                    if frame_tx.send(frame).is_err() {
                        break;
                    }
                }
            }
        }
        tracing::debug!(frames = seq, "background loop stopped");
    });

    BackgroundHandle {
        resize_tx,
        frame_rx,
        task: Some(task),
    }
}
